//! Arithmetic core shared by the calculator session and the CLI.
//!
//! Operands arrive as raw form text. They are parsed and checked here, and the
//! result is computed with plain IEEE-754 `f64` semantics: overflow to infinity
//! is a legitimate result, only an exactly-zero divisor is refused up front.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod signature;

pub use signature::{
    explorer_url, generate_placeholder_signature, is_base58, placeholder_signature_with,
    BASE58_ALPHABET, SIGNATURE_LENGTH,
};

/// Operations offered by the calculator form
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[default]
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub const ALL: [Self; 4] = [Self::Add, Self::Subtract, Self::Multiply, Self::Divide];

    /// Form key used by the operation selector
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }

    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "−",
            Self::Multiply => "×",
            Self::Divide => "÷",
        }
    }

    /// Apply the operation to two already-validated operands.
    #[must_use]
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b,
            Self::Divide => a / b,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Operation {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.key() == s)
            .ok_or_else(|| CalcError::UnknownOperation(s.to_string()))
    }
}

/// Errors raised while checking or computing a calculation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    #[error("Please connect your wallet first")]
    NotConnected,

    #[error("Please enter both operands")]
    MissingOperand,

    #[error("Please enter valid numbers")]
    InvalidNumber,

    #[error("Division by zero is not allowed")]
    DivideByZero,

    /// The operation key did not name a known operation
    #[error("Invalid operation")]
    UnknownOperation(String),
}

impl CalcError {
    /// Validation failures are caught before any state-changing side effect
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::UnknownOperation(_))
    }

    /// Get error code for logging
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotConnected => "NOT_CONNECTED",
            Self::MissingOperand => "MISSING_OPERAND",
            Self::InvalidNumber => "INVALID_NUMBER",
            Self::DivideByZero => "DIVIDE_BY_ZERO",
            Self::UnknownOperation(_) => "UNKNOWN_OPERATION",
        }
    }
}

/// Parse a single operand as a finite decimal number.
pub fn parse_decimal(raw: &str) -> Result<f64, CalcError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or(CalcError::InvalidNumber)
}

/// Validate both raw operands in form order: presence first, then parsing.
pub fn parse_operands(raw_a: &str, raw_b: &str) -> Result<(f64, f64), CalcError> {
    if raw_a.is_empty() || raw_b.is_empty() {
        return Err(CalcError::MissingOperand);
    }

    Ok((parse_decimal(raw_a)?, parse_decimal(raw_b)?))
}

/// Refuse an exactly-zero divisor. `-0.0` compares equal to zero and is refused too.
pub fn check_divisor(operation: Operation, b: f64) -> Result<(), CalcError> {
    if operation == Operation::Divide && b == 0.0 {
        return Err(CalcError::DivideByZero);
    }
    Ok(())
}

/// Compute the result for an operation given by its form key.
pub fn compute(operation_key: &str, a: f64, b: f64) -> Result<f64, CalcError> {
    let operation: Operation = operation_key.parse()?;
    Ok(operation.apply(a, b))
}
