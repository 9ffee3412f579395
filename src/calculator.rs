//! Validated arithmetic over a single floating-point accumulator.
//!
//! Every mutating operation checks its operand, computes the prospective
//! result and only then commits it. A failed operation leaves the
//! accumulator untouched.

use crate::action::ActionKind;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Calculator {
    value: f64,
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: f64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn add(&mut self, x: f64) -> Result<f64> {
        check_operand(x)?;
        self.commit(self.value + x)
    }

    pub fn subtract(&mut self, x: f64) -> Result<f64> {
        self.add(-x)
    }

    pub fn multiply(&mut self, x: f64) -> Result<f64> {
        check_operand(x)?;
        self.commit(self.value * x)
    }

    pub fn divide(&mut self, x: f64) -> Result<f64> {
        check_operand(x)?;
        if x == 0.0 {
            return Err(Error::DivisionByZero);
        }
        self.commit(self.value / x)
    }

    pub fn clear(&mut self) -> f64 {
        self.value = 0.0;
        self.value
    }

    /// Dispatches a mutating action kind. `operand` is ignored for `Clear`.
    pub fn apply(&mut self, kind: ActionKind, operand: f64) -> Result<f64> {
        match kind {
            ActionKind::Add => self.add(operand),
            ActionKind::Subtract => self.subtract(operand),
            ActionKind::Multiply => self.multiply(operand),
            ActionKind::Divide => self.divide(operand),
            ActionKind::Clear => Ok(self.clear()),
            ActionKind::GetCurrentValue => Err(Error::UnknownAction(kind.to_string())),
        }
    }

    fn commit(&mut self, candidate: f64) -> Result<f64> {
        if !candidate.is_finite() {
            return Err(Error::Overflow);
        }
        self.value = candidate;
        Ok(candidate)
    }
}

fn check_operand(x: f64) -> Result<()> {
    if x.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidOperand(x.to_string()))
    }
}

/// Parses a decimal operand string, rejecting anything that is not a finite number.
pub fn parse_operand(raw: &str) -> Result<f64> {
    let x: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::InvalidOperand(raw.to_string()))?;
    if !x.is_finite() {
        return Err(Error::InvalidOperand(raw.to_string()));
    }
    Ok(x)
}
