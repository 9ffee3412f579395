//! Logged actions and the bounded per-session action log.

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// Maximum number of actions a session remembers.
pub const MAX_ACTIONS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Add,
    Subtract,
    Multiply,
    Divide,
    Clear,
    GetCurrentValue,
}

impl ActionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
            Self::Clear => "clear",
            Self::GetCurrentValue => "get_current_value",
        }
    }

    /// Whether the action changes the accumulator. Only these can be replayed.
    pub const fn is_mutating(&self) -> bool {
        !matches!(self, Self::GetCurrentValue)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "subtract" | "sub" => Ok(Self::Subtract),
            "multiply" => Ok(Self::Multiply),
            "divide" => Ok(Self::Divide),
            "clear" => Ok(Self::Clear),
            "get_current_value" => Ok(Self::GetCurrentValue),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}

/// A recorded operation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub operand: String,
    pub timestamp: DateTime<Utc>,
}

/// Insertion-ordered log that evicts its oldest entry once over capacity.
#[derive(Debug, Clone)]
pub struct ActionLog {
    entries: VecDeque<Action>,
    capacity: usize,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::with_capacity(MAX_ACTIONS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends a new action stamped `at`, returning the entry evicted to stay
    /// within capacity, if any.
    pub fn append(&mut self, kind: ActionKind, operand: impl Into<String>, at: DateTime<Utc>) -> Option<Action> {
        self.entries.push_back(Action {
            kind,
            operand: operand.into(),
            timestamp: at,
        });
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.entries.iter()
    }

    /// Entries that survive the next append's eviction.
    pub fn retained_after_append(&self) -> impl Iterator<Item = &Action> {
        let evicted = (self.entries.len() + 1).saturating_sub(self.capacity);
        self.entries.iter().skip(evicted)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<Action> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new()
    }
}
