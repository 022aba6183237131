//! Shared types for the Thali POS core
//!
//! Document models, the unified error system, the print bridge protocol
//! and small utilities used by `thali-core` and the UI shells.

pub mod error;
pub mod models;
pub mod print;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
