//! Recomputes a session's value by folding its action log from zero.
//!
//! The live accumulator is never consulted. Any failure here means the log
//! holds an entry that validated logging should have rejected, so errors are
//! wrapped in [`Error::InconsistentLog`] with the offending index.

use crate::action::{Action, ActionKind, ActionLog};
use crate::calculator::{parse_operand, Calculator};
use crate::error::{Error, Result};
use crate::session::Session;

pub fn compute(session: &Session) -> Result<f64> {
    fold(session.actions().iter())
}

/// Folds `actions` in order through a fresh [`Calculator`].
pub fn fold<'a>(actions: impl IntoIterator<Item = &'a Action>) -> Result<f64> {
    let mut calc = Calculator::new();
    for (index, action) in actions.into_iter().enumerate() {
        replay_one(&mut calc, action).map_err(|source| Error::InconsistentLog {
            index,
            source: Box::new(source),
        })?;
    }
    Ok(calc.value())
}

/// Value the log would replay to once `kind` with `operand` is appended and
/// the oldest entry evicted if the log is full.
///
/// Every suffix of the resulting window must fold from zero, not just the
/// whole window. Eviction only ever drops a prefix, so a log built through
/// this check stays replayable however many entries it later loses, and a
/// `Clear` is always accepted. Errors are returned as-is: they mean the append
/// must be refused.
pub fn project(log: &ActionLog, kind: ActionKind, operand: f64) -> Result<f64> {
    let window: Vec<&Action> = log.retained_after_append().collect();
    let mut value = 0.0;
    for start in (0..=window.len()).rev() {
        let mut calc = Calculator::new();
        for action in &window[start..] {
            replay_one(&mut calc, action)?;
        }
        value = calc.apply(kind, operand)?;
    }
    Ok(value)
}

fn replay_one(calc: &mut Calculator, action: &Action) -> Result<f64> {
    match action.kind {
        ActionKind::Clear => Ok(calc.clear()),
        kind if kind.is_mutating() => calc.apply(kind, parse_operand(&action.operand)?),
        kind => Err(Error::UnknownAction(kind.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn log_of(entries: &[(ActionKind, &str)]) -> ActionLog {
        let mut log = ActionLog::new();
        for (kind, operand) in entries {
            log.append(*kind, *operand, Utc::now());
        }
        log
    }

    #[test]
    fn test_empty_log_computes_zero() {
        assert_eq!(fold(ActionLog::new().iter()).unwrap(), 0.0);
    }

    #[test]
    fn test_sequence_of_actions() {
        let log = log_of(&[
            (ActionKind::Add, "5"),
            (ActionKind::Multiply, "3"),
            (ActionKind::Subtract, "2"),
        ]);
        assert_eq!(fold(log.iter()).unwrap(), 13.0);
    }

    #[test]
    fn test_clear_resets_mid_fold() {
        let log = log_of(&[
            (ActionKind::Add, "100"),
            (ActionKind::Clear, "0"),
            (ActionKind::Add, "7"),
            (ActionKind::Divide, "2"),
        ]);
        assert_eq!(fold(log.iter()).unwrap(), 3.5);
    }

    #[test]
    fn test_non_mutating_entry_is_reported_as_inconsistency() {
        let log = log_of(&[(ActionKind::Add, "1"), (ActionKind::GetCurrentValue, "0")]);
        let err = fold(log.iter()).unwrap_err();
        assert!(!err.is_client_error());
        match err {
            Error::InconsistentLog { index, source } => {
                assert_eq!(index, 1);
                assert_eq!(*source, Error::UnknownAction("get_current_value".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_logged_divisor_is_reported_as_inconsistency() {
        let log = log_of(&[(ActionKind::Add, "1"), (ActionKind::Divide, "0")]);
        assert!(matches!(
            fold(log.iter()),
            Err(Error::InconsistentLog { index: 1, source }) if *source == Error::DivisionByZero
        ));
    }

    #[test]
    fn test_replay_matches_live_application() {
        let ops = [
            (ActionKind::Add, 10.0),
            (ActionKind::Multiply, 2.0),
            (ActionKind::Subtract, 5.0),
            (ActionKind::Divide, 3.0),
            (ActionKind::Add, 0.1),
            (ActionKind::Multiply, -7.25),
            (ActionKind::Divide, 1e-3),
        ];
        let mut live = Calculator::new();
        let mut log = ActionLog::new();
        for (kind, x) in ops {
            live.apply(kind, x).unwrap();
            log.append(kind, x.to_string(), Utc::now());
        }
        assert_eq!(fold(log.iter()).unwrap(), live.value());
    }

    #[test]
    fn test_project_folds_window_after_eviction() {
        let max = f64::MAX.to_string();
        let mut log = ActionLog::with_capacity(3);
        log.append(ActionKind::Add, format!("-{max}"), Utc::now());
        log.append(ActionKind::Add, max.as_str(), Utc::now());
        log.append(ActionKind::Add, "0", Utc::now());
        assert_eq!(fold(log.iter()).unwrap(), 0.0);

        // the -MAX entry drops out, leaving MAX + MAX
        assert_eq!(project(&log, ActionKind::Add, f64::MAX), Err(Error::Overflow));
        assert_eq!(project(&log, ActionKind::Subtract, f64::MAX).unwrap(), 0.0);
        assert_eq!(project(&log, ActionKind::Clear, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_project_checks_every_suffix() {
        let max = f64::MAX.to_string();
        let neg_max = format!("-{max}");
        let log = log_of(&[(ActionKind::Add, neg_max.as_str()), (ActionKind::Add, max.as_str())]);
        // the whole window folds to MAX, but the suffix MAX + MAX does not
        assert_eq!(project(&log, ActionKind::Add, f64::MAX), Err(Error::Overflow));
        assert_eq!(project(&log, ActionKind::Add, 1.0).unwrap(), 1.0);
        assert_eq!(project(&log, ActionKind::Clear, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_compute_ignores_live_accumulator() {
        let mut session = Session::new("s".to_string(), Utc::now(), 600, 50);
        session.calculator_mut().add(42.0).unwrap();
        session.actions_mut().append(ActionKind::Add, "1", Utc::now());
        assert_eq!(compute(&session).unwrap(), 1.0);
    }
}
