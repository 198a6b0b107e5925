use thiserror::Error;

pub type Result<T> = std::result::Result<T, WalletError>;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wallet provider not found. Please install a wallet extension.")]
    ProviderUnavailable,

    #[error("Connection rejected: {0}")]
    ConnectRejected(String),

    /// Silent reconnect refused because the site was never approved
    #[error("Connection not trusted")]
    NotTrusted,

    #[error("Disconnect failed: {0}")]
    DisconnectFailed(String),

    #[error("Balance query failed: {0}")]
    Balance(String),

    #[error("RPC error: {code} - {message}")]
    Rpc { code: i64, message: String },

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WalletError {
    /// Get error code for logging
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            Self::ConnectRejected(_) => "CONNECT_REJECTED",
            Self::NotTrusted => "NOT_TRUSTED",
            Self::DisconnectFailed(_) => "DISCONNECT_FAILED",
            Self::Balance(_) => "BALANCE_ERROR",
            Self::Rpc { .. } => "RPC_ERROR",
            Self::Clipboard(_) => "CLIPBOARD_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}
