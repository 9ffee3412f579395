//! Runtime configuration shared by the store, the sweeper and the HTTP layer.

use crate::action::MAX_ACTIONS;
use crate::session::DEFAULT_SESSION_TTL_SECS;
use std::time::Duration;

/// Pause between two sweep cycles (3 minutes).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 180;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub session_ttl: Duration,
    pub sweep_interval: Duration,
    pub max_actions: usize,
}

impl Config {
    pub fn ttl_secs(&self) -> u64 {
        self.session_ttl.as_secs()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            max_actions: MAX_ACTIONS,
        }
    }
}
