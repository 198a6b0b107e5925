use crate::error::{Result, WalletError};
use calculator_lib::SIGNATURE_LENGTH;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

pub const DEFAULT_NETWORK: &str = "devnet";
pub const DEFAULT_PROGRAM_ID: &str = "YourProgramIdHere";
pub const DEFAULT_EXPLORER_URL: &str = "https://explorer.solana.com";
pub const DEFAULT_CONFIRMATION_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub submission: SubmissionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Cluster name, passed verbatim to the explorer link
    pub name: String,
    pub program_id: String,
    pub explorer_url: Url,
    /// JSON-RPC endpoint for live balance queries; the stub balance is used when absent
    pub rpc_url: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionConfig {
    pub confirmation_delay_ms: u64,
    pub signature_length: usize,
}

impl SubmissionConfig {
    #[must_use]
    pub const fn confirmation_delay(&self) -> Duration {
        Duration::from_millis(self.confirmation_delay_ms)
    }
}

impl Config {
    /// Default configuration for another cluster
    #[must_use]
    pub fn for_network(name: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.network.name = name.into();
        config
    }

    pub fn from_env() -> Result<Self> {
        let name = env::var("CALCULATOR_NETWORK").unwrap_or_else(|_| DEFAULT_NETWORK.to_string());
        let program_id =
            env::var("CALCULATOR_PROGRAM_ID").unwrap_or_else(|_| DEFAULT_PROGRAM_ID.to_string());

        let explorer_url = env::var("EXPLORER_URL")
            .unwrap_or_else(|_| DEFAULT_EXPLORER_URL.to_string());
        let explorer_url = Url::parse(&explorer_url)
            .map_err(|e| WalletError::Config(format!("Invalid EXPLORER_URL: {e}")))?;

        let rpc_url = env::var("SOLANA_RPC_URL")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| Url::parse(&raw))
            .transpose()
            .map_err(|e| WalletError::Config(format!("Invalid SOLANA_RPC_URL: {e}")))?;

        let confirmation_delay_ms = env::var("CONFIRMATION_DELAY_MS")
            .ok()
            .map(|raw| raw.parse::<u64>())
            .transpose()
            .map_err(|e| WalletError::Config(format!("Invalid CONFIRMATION_DELAY_MS: {e}")))?
            .unwrap_or(DEFAULT_CONFIRMATION_DELAY_MS);

        let config = Self {
            network: NetworkConfig {
                name,
                program_id,
                explorer_url,
                rpc_url,
            },
            submission: SubmissionConfig {
                confirmation_delay_ms,
                signature_length: SIGNATURE_LENGTH,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.network.name.trim().is_empty() {
            return Err(WalletError::Config("Network name is required".to_string()));
        }

        if self.network.program_id.trim().is_empty() {
            return Err(WalletError::Config("Program ID is required".to_string()));
        }

        if !matches!(self.network.explorer_url.scheme(), "http" | "https") {
            return Err(WalletError::Config(format!(
                "Unsupported explorer URL scheme: {}",
                self.network.explorer_url.scheme()
            )));
        }

        if self.submission.signature_length == 0 {
            return Err(WalletError::Config(
                "Signature length must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Explorer link for a transaction on the configured cluster
    #[must_use]
    pub fn explorer_link(&self, signature: &str) -> String {
        calculator_lib::explorer_url(
            self.network.explorer_url.as_str(),
            signature,
            &self.network.name,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                name: DEFAULT_NETWORK.to_string(),
                program_id: DEFAULT_PROGRAM_ID.to_string(),
                explorer_url: Url::parse(DEFAULT_EXPLORER_URL)
                    .expect("default explorer URL is valid"),
                rpc_url: None,
            },
            submission: SubmissionConfig {
                confirmation_delay_ms: DEFAULT_CONFIRMATION_DELAY_MS,
                signature_length: SIGNATURE_LENGTH,
            },
        }
    }
}
