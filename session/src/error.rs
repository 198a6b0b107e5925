use calculator_lib::CalcError;
use thiserror::Error;
use wallet_client::WalletError;

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Input was rejected or the result could not be computed
    #[error(transparent)]
    Calc(#[from] CalcError),

    /// Wallet provider or balance query failure
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("A wallet connection is already in progress")]
    ConnectInProgress,

    #[error("A calculation is already being processed")]
    SubmissionInFlight,

    /// The form was cleared or the wallet disconnected before confirmation
    #[error("Submission was superseded before confirmation")]
    Superseded,

    #[error("Session was shut down")]
    Cancelled,
}

impl SessionError {
    /// Validation failures never leave the idle phase
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        match self {
            Self::Calc(err) => err.is_validation(),
            _ => false,
        }
    }

    /// Get error code for logging
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Calc(err) => err.error_code(),
            Self::Wallet(err) => err.error_code(),
            Self::ConnectInProgress => "CONNECT_IN_PROGRESS",
            Self::SubmissionInFlight => "SUBMISSION_IN_FLIGHT",
            Self::Superseded => "SUPERSEDED",
            Self::Cancelled => "CANCELLED",
        }
    }
}
