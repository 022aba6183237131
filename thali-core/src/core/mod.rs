//! Core: configuration, session state, background tasks and the service facade

pub mod config;
pub mod session;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use session::{PlaceGuard, SessionContext};
pub use state::{CoreState, SessionViews};
pub use tasks::BackgroundTasks;
