//! Tally - per-session arithmetic accumulators with replayable history.
//!
//! Each anonymous client gets an isolated accumulator addressed by an opaque
//! token. Operations are validated before they touch state, every successful
//! mutation is recorded in a bounded log, the log can be replayed to recompute
//! the value, and a background sweeper reclaims sessions past their TTL.

pub mod action;
pub mod calculator;
pub mod clock;
pub mod config;
pub mod error;
pub mod http_server;
pub mod replay;
pub mod session;
pub mod state;
pub mod store;
pub mod sweeper;

pub use action::{Action, ActionKind, ActionLog, MAX_ACTIONS};
pub use calculator::Calculator;
pub use config::Config;
pub use error::{Error, Result};
pub use session::Session;
pub use state::AppState;
pub use store::{SessionHandle, SessionStore};
pub use sweeper::{sweep_expired, SweepReport, Sweeper, SweeperHandle};
