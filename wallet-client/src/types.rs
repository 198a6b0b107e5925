use serde::{Deserialize, Serialize};

pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// Options for a provider connect request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    /// Only connect if the user approved this site before; never prompt
    pub only_if_trusted: bool,
}

impl ConnectOptions {
    #[must_use]
    pub const fn trusted_only() -> Self {
        Self {
            only_if_trusted: true,
        }
    }
}

/// Unsolicited notifications pushed by the wallet provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderEvent {
    Connect { address: String },
    Disconnect,
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL
}
