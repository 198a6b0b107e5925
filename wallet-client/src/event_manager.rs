use crate::{provider::WalletProvider, types::ProviderEvent};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Receiver side of provider notifications
#[async_trait]
pub trait ProviderEventHandler: Send + Sync {
    async fn handle_connect(&self, address: String);

    async fn handle_disconnect(&self);
}

/// Fans provider notifications out to registered handlers until cancelled
pub struct EventManager {
    receiver: broadcast::Receiver<ProviderEvent>,
    event_handlers: Vec<Arc<dyn ProviderEventHandler>>,
}

impl EventManager {
    /// Subscribe to a provider's notification stream
    #[must_use]
    pub fn new(provider: &dyn WalletProvider) -> Self {
        Self {
            receiver: provider.subscribe(),
            event_handlers: Vec::new(),
        }
    }

    pub fn register_handler(&mut self, handler: Arc<dyn ProviderEventHandler>) {
        self.event_handlers.push(handler);
        debug!("Registered provider event handler");
    }

    pub async fn dispatch(&self, event: ProviderEvent) {
        for handler in &self.event_handlers {
            match &event {
                ProviderEvent::Connect { address } => {
                    handler.handle_connect(address.clone()).await;
                }
                ProviderEvent::Disconnect => handler.handle_disconnect().await,
            }
        }
    }

    /// Process notifications until `cancel` fires or the provider goes away
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("Listening for wallet provider events");

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Provider event listener cancelled");
                    break;
                }

                received = self.receiver.recv() => match received {
                    Ok(event) => {
                        debug!(?event, "Provider event received");
                        self.dispatch(event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Provider event listener lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => {
                        debug!("Provider event stream closed");
                        break;
                    }
                },
            }
        }

        info!("Provider event listener stopped");
    }

    #[must_use]
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
