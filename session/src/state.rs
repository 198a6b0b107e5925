//! State owned by a calculator session.

use calculator_lib::Operation;
use serde::Serialize;

/// Wallet connection as seen by the session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WalletConnection {
    pub is_connected: bool,
    pub address: Option<String>,
    /// Balance in SOL
    pub balance: f64,
}

/// Which operand a keystroke belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperandSlot {
    First,
    Second,
}

/// Raw form input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationInput {
    pub operand1: String,
    pub operand2: String,
    /// Selector key; unrecognised keys are reported when the result is computed
    pub operation: String,
}

impl Default for CalculationInput {
    fn default() -> Self {
        Self {
            operand1: String::new(),
            operand2: String::new(),
            operation: Operation::default().key().to_string(),
        }
    }
}

impl CalculationInput {
    #[must_use]
    pub fn operand(&self, slot: OperandSlot) -> &str {
        match slot {
            OperandSlot::First => &self.operand1,
            OperandSlot::Second => &self.operand2,
        }
    }

    pub fn set_operand(&mut self, slot: OperandSlot, raw: String) {
        match slot {
            OperandSlot::First => self.operand1 = raw,
            OperandSlot::Second => self.operand2 = raw,
        }
    }

    /// The selected operation, if its key is recognised
    #[must_use]
    pub fn parsed_operation(&self) -> Option<Operation> {
        self.operation.parse().ok()
    }

    #[must_use]
    pub fn has_both_operands(&self) -> bool {
        !self.operand1.is_empty() && !self.operand2.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Processing,
    Pending,
    Confirmed,
    Failed,
}

impl Phase {
    /// A submission is outstanding
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(self, Self::Processing | Self::Pending)
    }
}

/// Lifecycle of the latest submission attempt.
///
/// `result` is only set when confirmed, `signature` from pending onwards, and
/// `error_message` only when failed or when validation rejected the attempt
/// (phase stays idle).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmissionState {
    pub phase: Phase,
    pub signature: Option<String>,
    pub error_message: Option<String>,
    pub result: Option<f64>,
}

impl SubmissionState {
    /// Idle state carrying a validation message
    #[must_use]
    pub fn rejected(message: String) -> Self {
        Self {
            error_message: Some(message),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn pending(signature: String) -> Self {
        Self {
            phase: Phase::Pending,
            signature: Some(signature),
            ..Self::default()
        }
    }

    pub fn confirm(&mut self, result: f64) {
        self.phase = Phase::Confirmed;
        self.result = Some(result);
        self.error_message = None;
    }

    pub fn fail(&mut self, message: String) {
        self.phase = Phase::Failed;
        self.result = None;
        self.error_message = Some(message);
    }
}

/// Everything a session owns
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub wallet: WalletConnection,
    pub input: CalculationInput,
    pub submission: SubmissionState,
    /// A user-initiated connect is outstanding
    pub connecting: bool,
    /// Last wallet-level failure shown to the user
    pub wallet_error: Option<String>,
}

impl SessionState {
    /// Reset the form; the operation selection survives.
    pub fn clear(&mut self) {
        self.input.operand1.clear();
        self.input.operand2.clear();
        self.submission = SubmissionState::default();
    }

    pub fn reset_wallet(&mut self) {
        self.wallet = WalletConnection::default();
    }
}
