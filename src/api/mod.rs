//! REST API module.
//!
//! Contains the `/api/v1` handlers. Bodies are plain JSON; failures use the
//! error envelope from `crate::errors`.

mod chat;
mod config;
mod games;
mod health;
mod planning;

pub use chat::*;
pub use config::*;
pub use games::*;
pub use health::*;
pub use planning::*;

use crate::errors::AppError;

/// Fail with 501 when a feature is switched off.
fn ensure_enabled(enabled: bool, feature: &str) -> Result<(), AppError> {
    if enabled {
        Ok(())
    } else {
        Err(AppError::FeatureDisabled(format!(
            "{} feature is disabled",
            feature
        )))
    }
}

/// Resolve an optional pagination limit against its default and upper bound.
fn bounded_limit(limit: Option<u32>, default: u32, max: u32) -> Result<u32, AppError> {
    let limit = limit.unwrap_or(default);
    if (1..=max).contains(&limit) {
        Ok(limit)
    } else {
        Err(AppError::Validation(format!(
            "limit must be between 1 and {}",
            max
        )))
    }
}
