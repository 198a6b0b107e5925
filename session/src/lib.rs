#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod controller;
pub mod error;
mod events;
pub mod state;
pub mod view;

pub use controller::{
    CalculatorSession, SessionBuilder, SubmissionReceipt, CONNECT_FAILED_MESSAGE,
    SUBMISSION_INTERRUPTED_MESSAGE,
};
pub use error::{SessionError, SessionResult};
pub use state::{CalculationInput, OperandSlot, Phase, SessionState, SubmissionState, WalletConnection};
pub use view::SessionView;

#[cfg(test)]
mod tests;
