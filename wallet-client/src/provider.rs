use crate::{error::Result, types::{ConnectOptions, ProviderEvent}};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Capability exposed by an injected wallet extension.
///
/// The session only depends on whether a provider is present and on these
/// three calls; key management and signing stay inside the wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Human readable wallet name for logs
    fn name(&self) -> &str;

    /// Request a connection and return the wallet's public address (Base58).
    ///
    /// With `only_if_trusted` the provider must fail instead of prompting when
    /// the user has not approved this site before.
    async fn connect(&self, options: ConnectOptions) -> Result<String>;

    async fn disconnect(&self) -> Result<()>;

    /// Subscribe to unsolicited connect/disconnect notifications
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}
