//! Concurrent session store and the operations the boundary layer calls.
//!
//! The map itself sits behind an async `RwLock`; each session sits behind its
//! own `Mutex`, so requests for different sessions never serialize on each
//! other and requests for the same session run one at a time. The map lock is
//! never awaited while a request holds a session lock.

use crate::action::{Action, ActionKind};
use crate::calculator::{parse_operand, Calculator};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::replay;
use crate::session::{new_session_id, Session};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info};

/// Shared, lockable handle to one session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Thread-safe session storage.
type Sessions = Arc<RwLock<HashMap<String, SessionHandle>>>;

#[derive(Clone)]
pub struct SessionStore {
    sessions: Sessions,
    clock: Arc<dyn Clock>,
    config: Config,
}

impl SessionStore {
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Returns the session for `id`, creating a fresh one when `id` is absent
    /// or unknown. The flag is true when a new session was minted, in which
    /// case the caller must hand the new identifier back to the client.
    ///
    /// Lookups never extend the session's lifetime.
    pub async fn resolve(&self, id: Option<&str>) -> (SessionHandle, bool) {
        if let Some(id) = id {
            if let Some(handle) = self.sessions.read().await.get(id) {
                return (handle.clone(), false);
            }
        }

        let id = new_session_id();
        let session = Session::new(
            id.clone(),
            self.clock.now(),
            self.config.ttl_secs(),
            self.config.max_actions,
        );
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id.clone(), handle.clone());
        info!(session_id = %id, "Created session");
        (handle, true)
    }

    pub async fn get(&self, id: &str) -> Result<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    pub async fn remove(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Direct arithmetic path: applies the operation to the live accumulator
    /// and logs it once it has succeeded. `GetCurrentValue` is a read and is
    /// not logged.
    ///
    /// The operation is refused, leaving both accumulator and log untouched,
    /// if logging it would leave a log that no longer replays.
    pub async fn apply_operation(&self, handle: &SessionHandle, kind: ActionKind, operand: &str) -> Result<f64> {
        let mut session = lock_live(handle).await?;
        if kind == ActionKind::GetCurrentValue {
            return Ok(session.value());
        }

        let x = operand_for(kind, operand)?;
        let mut live = Calculator::with_value(session.value());
        let value = live.apply(kind, x)?;
        replay::project(session.actions(), kind, x)?;

        *session.calculator_mut() = live;
        let now = self.clock.now();
        session.actions_mut().append(kind, x.to_string(), now);
        debug!(session_id = %session.id, action = %kind, operand = x, value, "Applied operation");
        Ok(value)
    }

    /// Validate-before-log path: records the action only if the log, once
    /// appended and trimmed to capacity, still replays cleanly. The live
    /// accumulator is not touched.
    pub async fn log_action(&self, handle: &SessionHandle, kind: ActionKind, operand: &str) -> Result<()> {
        let mut session = lock_live(handle).await?;
        if !kind.is_mutating() {
            return Err(Error::UnknownAction(kind.to_string()));
        }

        let x = operand_for(kind, operand)?;
        replay::project(session.actions(), kind, x)?;
        let now = self.clock.now();
        session.actions_mut().append(kind, x.to_string(), now);
        debug!(session_id = %session.id, action = %kind, operand = x, "Logged action");
        Ok(())
    }

    pub async fn history(&self, handle: &SessionHandle) -> Result<Vec<Action>> {
        Ok(lock_live(handle).await?.actions().to_vec())
    }

    pub async fn current_value(&self, handle: &SessionHandle) -> Result<f64> {
        Ok(lock_live(handle).await?.value())
    }

    /// Replays the session's log; see [`replay::compute`].
    pub async fn compute(&self, handle: &SessionHandle) -> Result<f64> {
        replay::compute(&*lock_live(handle).await?)
    }

    pub(crate) async fn snapshot(&self) -> Vec<(String, SessionHandle)> {
        self.sessions
            .read()
            .await
            .iter()
            .map(|(id, handle)| (id.clone(), handle.clone()))
            .collect()
    }

    /// Removes `id` only if it still maps to `handle`. Callers hold the
    /// session lock across this call.
    pub(crate) async fn detach(&self, id: &str, handle: &SessionHandle) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(id) {
            Some(current) if Arc::ptr_eq(current, handle) => {
                sessions.remove(id);
                Ok(())
            }
            _ => Err(Error::SessionNotFound(id.to_string())),
        }
    }
}

/// Locks a session, refusing one the sweeper has already retired.
async fn lock_live(handle: &SessionHandle) -> Result<MutexGuard<'_, Session>> {
    let session = handle.lock().await;
    if session.retired {
        return Err(Error::SessionNotFound(session.id.clone()));
    }
    Ok(session)
}

fn operand_for(kind: ActionKind, operand: &str) -> Result<f64> {
    match kind {
        ActionKind::Clear => Ok(0.0),
        _ => parse_operand(operand),
    }
}
