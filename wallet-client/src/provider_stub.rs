// In-process stand-in for a browser wallet extension
use crate::{
    error::{Result, WalletError},
    provider::WalletProvider,
    types::{ConnectOptions, ProviderEvent},
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CAPACITY: usize = 16;

/// Length of a Base58-encoded 32-byte public key
const ADDRESS_LENGTH: usize = 44;

pub struct StubWalletProvider {
    address: String,
    trusted: AtomicBool,
    connected: AtomicBool,
    fail_connect: AtomicBool,
    fail_disconnect: AtomicBool,
    connect_calls: AtomicUsize,
    /// Time the approval prompt stays open, in milliseconds
    connect_delay_ms: AtomicU64,
    events: broadcast::Sender<ProviderEvent>,
}

impl StubWalletProvider {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            address: address.into(),
            trusted: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            fail_disconnect: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            connect_delay_ms: AtomicU64::new(0),
            events,
        }
    }

    /// Stub wallet with a freshly generated address
    #[must_use]
    pub fn with_random_address() -> Self {
        Self::new(calculator_lib::placeholder_signature_with(
            &mut rand::thread_rng(),
            ADDRESS_LENGTH,
        ))
    }

    /// Mark the site as previously approved so silent reconnects succeed
    #[must_use]
    pub fn trusted(self, trusted: bool) -> Self {
        self.trusted.store(trusted, Ordering::SeqCst);
        self
    }

    /// Make `connect` suspend for `delay` before answering
    pub fn set_connect_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.connect_delay_ms.store(millis, Ordering::SeqCst);
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_disconnect(&self, fail: bool) {
        self.fail_disconnect.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// Push a notification as if the extension changed state on its own.
    /// Returns the number of subscribers that received it.
    pub fn emit(&self, event: ProviderEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }
}

#[async_trait]
impl WalletProvider for StubWalletProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn connect(&self, options: ConnectOptions) -> Result<String> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);

        let delay_ms = self.connect_delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(WalletError::ConnectRejected(
                "User rejected the request".to_string(),
            ));
        }

        if options.only_if_trusted && !self.trusted.load(Ordering::SeqCst) {
            return Err(WalletError::NotTrusted);
        }

        self.trusted.store(true, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        debug!(address = %self.address, "stub wallet connected");
        self.emit(ProviderEvent::Connect {
            address: self.address.clone(),
        });

        Ok(self.address.clone())
    }

    async fn disconnect(&self) -> Result<()> {
        if self.fail_disconnect.load(Ordering::SeqCst) {
            return Err(WalletError::DisconnectFailed(
                "extension did not respond".to_string(),
            ));
        }

        self.connected.store(false, Ordering::SeqCst);
        debug!("stub wallet disconnected");
        self.emit(ProviderEvent::Disconnect);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
