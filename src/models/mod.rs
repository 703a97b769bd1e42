//! Data models for the Pfadi assistant.
//!
//! Game records use the camelCase field names the web client expects; chat,
//! planning and status payloads are snake_case.

mod chat;
mod game;
mod planning;
mod status;

pub use chat::*;
pub use game::*;
pub use planning::*;
pub use status::*;
