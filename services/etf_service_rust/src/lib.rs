//! HTTP facade over `etf_core`.

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use app::create_app;
pub use config::ServiceConfig;
pub use error::{AppError, AppResult};
pub use state::AppState;
