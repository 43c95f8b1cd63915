//! Route handlers.
//!
//! - [`etfs`]: listing, details, performance, history and comparison
//! - [`health`]: liveness

pub mod etfs;
pub mod health;
