//! Error taxonomy for the accumulator core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Operand is not a finite number (or not a number at all).
    #[error("invalid number: {0}")]
    InvalidOperand(String),

    #[error("Division cannot be done with 0")]
    DivisionByZero,

    #[error("Result would overflow")]
    Overflow,

    /// Action kind outside the recognized mutating kinds.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Replay hit an error that validated logging should have made impossible.
    #[error("action log is inconsistent at entry {index}: {source}")]
    InconsistentLog {
        index: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// True for errors caused by the caller's input rather than by server state.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidOperand(_) | Self::DivisionByZero | Self::Overflow | Self::UnknownAction(_)
        )
    }
}
