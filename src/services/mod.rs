//! Domain services behind the HTTP handlers.

mod chat;
mod games;
pub mod knowledge;
pub mod planning;

pub use chat::*;
pub use games::*;
