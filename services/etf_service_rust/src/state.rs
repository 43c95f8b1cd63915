//! Shared handler state.

use etf_core::EtfService;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EtfService>,
    started_at: Instant,
}

impl AppState {
    pub fn new(service: EtfService) -> Self {
        Self {
            service: Arc::new(service),
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
