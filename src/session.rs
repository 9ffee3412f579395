//! Session entity: identifier, lifetime and the state it owns.

use crate::action::ActionLog;
use crate::calculator::Calculator;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

/// Session TTL in seconds (10 minutes)
pub const DEFAULT_SESSION_TTL_SECS: u64 = 600;

/// Random bytes behind each session identifier (256 bits).
const SESSION_ID_BYTES: usize = 32;

/// Server-held state bound to one opaque client token.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub ttl_secs: u64,
    calculator: Calculator,
    actions: ActionLog,
    /// Set by the sweeper once the session has left the store.
    pub(crate) retired: bool,
}

impl Session {
    pub fn new(id: String, created_at: DateTime<Utc>, ttl_secs: u64, max_actions: usize) -> Self {
        Self {
            id,
            created_at,
            ttl_secs,
            calculator: Calculator::new(),
            actions: ActionLog::with_capacity(max_actions),
            retired: false,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        let ttl = i64::try_from(self.ttl_secs).unwrap_or(i64::MAX);
        Duration::try_seconds(ttl)
            .and_then(|ttl| self.created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Expired strictly after `created_at + ttl`; at the boundary it is still live.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }

    pub fn value(&self) -> f64 {
        self.calculator.value()
    }

    pub fn actions(&self) -> &ActionLog {
        &self.actions
    }

    pub(crate) fn calculator_mut(&mut self) -> &mut Calculator {
        &mut self.calculator
    }

    pub(crate) fn actions_mut(&mut self) -> &mut ActionLog {
        &mut self.actions
    }
}

/// Mints an unguessable, URL- and cookie-safe session token.
pub fn new_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
