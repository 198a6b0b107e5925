//! The calculator session controller.
//!
//! A session owns the wallet connection, the form input and the latest
//! submission. All state sits behind one `parking_lot::RwLock` that is never
//! held across an `.await`; the only long suspension is the simulated
//! confirmation delay inside [`CalculatorSession::submit`].

use crate::error::{SessionError, SessionResult};
use crate::events::SessionEventHandler;
use crate::state::{OperandSlot, Phase, SessionState, SubmissionState};
use crate::view::SessionView;
use calculator_lib::{check_divisor, compute, parse_operands, placeholder_signature_with, CalcError, Operation};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use wallet_client::{
    BalanceQuery, Clipboard, Config, ConnectOptions, EventManager, MemoryClipboard,
    StubBalanceClient, WalletError, WalletProvider,
};

pub const CONNECT_FAILED_MESSAGE: &str = "Failed to connect wallet. Please try again.";

/// Recorded when a pending submission is dropped by its caller
pub const SUBMISSION_INTERRUPTED_MESSAGE: &str = "Submission was interrupted before confirmation";

/// Outcome of a confirmed submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub signature: String,
    pub result: f64,
}

/// Builder for [`CalculatorSession`]
pub struct SessionBuilder {
    config: Config,
    provider: Option<Arc<dyn WalletProvider>>,
    balances: Option<Arc<dyn BalanceQuery>>,
    clipboard: Option<Arc<dyn Clipboard>>,
}

impl SessionBuilder {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            provider: None,
            balances: None,
            clipboard: None,
        }
    }

    /// Wallet provider found in the host environment
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn WalletProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn balance_query(mut self, balances: Arc<dyn BalanceQuery>) -> Self {
        self.balances = Some(balances);
        self
    }

    #[must_use]
    pub fn clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    /// Build a session without subscribing to the provider or reconnecting
    #[must_use]
    pub fn build(self) -> CalculatorSession {
        CalculatorSession {
            id: Uuid::new_v4(),
            config: self.config,
            provider: self.provider,
            balances: self
                .balances
                .unwrap_or_else(|| Arc::new(StubBalanceClient::default())),
            clipboard: self
                .clipboard
                .unwrap_or_else(|| Arc::new(MemoryClipboard::default())),
            state: Arc::new(RwLock::new(SessionState::default())),
            in_flight: Mutex::new(None),
            shutdown: CancellationToken::new(),
            listener: Mutex::new(None),
        }
    }

    /// Build the session, listen for provider notifications and try a
    /// silent reconnect for a previously trusted site.
    pub async fn start(self) -> CalculatorSession {
        let session = self.build();
        session.start_listening();
        session.try_silent_reconnect().await;
        session
    }
}

pub struct CalculatorSession {
    id: Uuid,
    config: Config,
    provider: Option<Arc<dyn WalletProvider>>,
    balances: Arc<dyn BalanceQuery>,
    clipboard: Arc<dyn Clipboard>,
    state: Arc<RwLock<SessionState>>,
    /// Cancels the outstanding submission when the form is reset
    in_flight: Mutex<Option<CancellationToken>>,
    shutdown: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl CalculatorSession {
    #[must_use]
    pub fn builder(config: Config) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView::new(&self.state.read(), &self.config)
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn start_listening(&self) {
        let Some(provider) = &self.provider else {
            return;
        };

        let mut manager = EventManager::new(provider.as_ref());
        manager.register_handler(Arc::new(SessionEventHandler::new(
            self.state.clone(),
            self.balances.clone(),
        )));
        *self.listener.lock() = Some(manager.spawn(self.shutdown.child_token()));
    }

    #[instrument(skip(self), fields(session = %self.id))]
    async fn try_silent_reconnect(&self) {
        let Some(provider) = &self.provider else {
            return;
        };

        match provider.connect(ConnectOptions::trusted_only()).await {
            Ok(address) => {
                {
                    let mut state = self.state.write();
                    mark_connected(&mut state, address.clone());
                }
                info!(%address, "Reconnected to previously trusted wallet");
                let _ = self.refresh_balance(&address).await;
            }
            Err(err) => {
                // Site not approved before; stay disconnected without surfacing anything
                debug!("Silent reconnect skipped: {err}");
            }
        }
    }

    /// Connect the wallet provider and load the balance.
    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn connect(&self) -> SessionResult<String> {
        if self.is_shut_down() {
            return Err(SessionError::Cancelled);
        }

        let Some(provider) = self.provider.clone() else {
            let err = WalletError::ProviderUnavailable;
            warn!("No wallet provider available");
            self.state.write().wallet_error = Some(err.to_string());
            return Err(err.into());
        };

        {
            let mut state = self.state.write();
            if state.connecting {
                return Err(SessionError::ConnectInProgress);
            }
            state.connecting = true;
            state.wallet_error = None;
        }
        let connecting = ConnectingGuard::new(&self.state);

        let outcome = provider.connect(ConnectOptions::default()).await;

        let address = {
            let mut state = self.state.write();
            state.connecting = false;
            connecting.disarm();
            match outcome {
                Ok(address) => {
                    mark_connected(&mut state, address.clone());
                    address
                }
                Err(err) => {
                    error!("Failed to connect wallet: {err}");
                    state.wallet_error = Some(CONNECT_FAILED_MESSAGE.to_string());
                    return Err(err.into());
                }
            }
        };

        info!(%address, wallet = provider.name(), "Wallet connected");
        let _ = self.refresh_balance(&address).await;

        Ok(address)
    }

    /// Disconnect the wallet and reset the form. Always ends disconnected.
    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn disconnect(&self) {
        if let Some(provider) = &self.provider {
            if let Err(err) = provider.disconnect().await {
                error!("Error disconnecting: {err}");
            }
        }

        let mut state = self.state.write();
        state.reset_wallet();
        state.wallet_error = None;
        self.clear_locked(&mut state);
        info!("Wallet disconnected");
    }

    /// Query the balance for `address`. A failed query leaves the balance untouched.
    pub async fn refresh_balance(&self, address: &str) -> SessionResult<f64> {
        refresh_balance_into(&self.state, self.balances.as_ref(), address)
            .await
            .map_err(|err| {
                warn!("Failed to get balance: {err}");
                SessionError::from(err)
            })
    }

    pub fn set_operand(&self, slot: OperandSlot, raw: impl Into<String>) {
        self.state.write().input.set_operand(slot, raw.into());
    }

    pub fn set_operation(&self, operation: Operation) {
        self.set_operation_key(operation.key());
    }

    /// Store a selector key verbatim; unknown keys fail at computation time
    pub fn set_operation_key(&self, key: impl Into<String>) {
        self.state.write().input.operation = key.into();
    }

    /// Validate the form, issue a placeholder signature and confirm after
    /// the configured delay.
    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn submit(&self) -> SessionResult<SubmissionReceipt> {
        if self.is_shut_down() {
            return Err(SessionError::Cancelled);
        }

        let ((a, b), operation_key, cancel) = {
            let mut state = self.state.write();
            if state.submission.phase.is_in_flight() {
                debug!("Submission rejected, one is already in flight");
                return Err(SessionError::SubmissionInFlight);
            }

            let operands = match validate(&state) {
                Ok(operands) => operands,
                Err(err) => {
                    debug!(code = err.error_code(), "Calculation rejected: {err}");
                    state.submission = SubmissionState::rejected(err.to_string());
                    return Err(err.into());
                }
            };

            state.submission = SubmissionState {
                phase: Phase::Processing,
                ..SubmissionState::default()
            };

            let cancel = self.shutdown.child_token();
            *self.in_flight.lock() = Some(cancel.clone());

            (operands, state.input.operation.clone(), cancel)
        };
        let in_flight = SubmissionGuard::new(self, cancel.clone());

        // Signing runs outside the lock, so `processing` is observable meanwhile
        let signature = placeholder_signature_with(
            &mut rand::thread_rng(),
            self.config.submission.signature_length,
        );
        {
            let mut state = self.state.write();
            if cancel.is_cancelled() {
                return Err(self.cancellation_reason());
            }
            state.submission = SubmissionState::pending(signature.clone());
        }

        info!(%signature, operation = %operation_key, "Calculation submitted, awaiting confirmation");

        tokio::select! {
            () = cancel.cancelled() => return Err(self.cancellation_reason()),
            () = tokio::time::sleep(self.config.submission.confirmation_delay()) => {}
        }

        let mut state = self.state.write();
        // A clear or disconnect may have landed between the timer and the lock
        if cancel.is_cancelled() {
            return Err(self.cancellation_reason());
        }
        self.in_flight.lock().take();
        in_flight.disarm();

        match compute(&operation_key, a, b) {
            Ok(result) => {
                state.submission.confirm(result);
                info!(result, "Calculation confirmed");
                Ok(SubmissionReceipt { signature, result })
            }
            Err(err) => {
                error!("Calculation failed: {err}");
                state.submission.fail(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Empty both operands and reset the submission. The wallet is untouched.
    pub fn clear(&self) {
        let mut state = self.state.write();
        self.clear_locked(&mut state);
        debug!("Form cleared");
    }

    fn clear_locked(&self, state: &mut SessionState) {
        if let Some(token) = self.in_flight.lock().take() {
            token.cancel();
            debug!("Outstanding submission superseded");
        }
        state.clear();
    }

    fn cancellation_reason(&self) -> SessionError {
        if self.is_shut_down() {
            SessionError::Cancelled
        } else {
            SessionError::Superseded
        }
    }

    /// Explorer link for the current signature, if any
    #[must_use]
    pub fn explorer_url(&self) -> Option<String> {
        self.state
            .read()
            .submission
            .signature
            .as_deref()
            .map(|signature| self.config.explorer_link(signature))
    }

    /// Fire-and-forget clipboard write
    pub fn copy_to_clipboard(&self, text: &str) {
        if let Err(err) = self.clipboard.write_text(text) {
            debug!("Clipboard write failed: {err}");
        }
    }

    pub fn copy_signature(&self) {
        let signature = self.state.read().submission.signature.clone();
        if let Some(signature) = signature {
            self.copy_to_clipboard(&signature);
        }
    }

    /// Tear the session down. The listener stops and an outstanding
    /// submission ends with [`SessionError::Cancelled`] without touching state.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let listener = self.listener.lock().take();
        if let Some(handle) = listener {
            if let Err(err) = handle.await {
                warn!("Provider event listener ended abnormally: {err}");
            }
        }

        info!(session = %self.id, "Session shut down");
    }
}

impl Drop for CalculatorSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Resets `connecting` when a connect future is dropped before the provider answers
struct ConnectingGuard<'a> {
    state: &'a RwLock<SessionState>,
    armed: bool,
}

impl<'a> ConnectingGuard<'a> {
    const fn new(state: &'a RwLock<SessionState>) -> Self {
        Self { state, armed: true }
    }

    /// The caller cleared `connecting` itself
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.write().connecting = false;
            debug!("Wallet connect abandoned before the provider answered");
        }
    }
}

/// Settles a submission whose future is dropped before it completes.
///
/// A cancelled token means `clear`, `disconnect` or `shutdown` already took
/// over, so nothing is written in that case.
struct SubmissionGuard<'a> {
    session: &'a CalculatorSession,
    cancel: CancellationToken,
    armed: bool,
}

impl<'a> SubmissionGuard<'a> {
    const fn new(session: &'a CalculatorSession, cancel: CancellationToken) -> Self {
        Self {
            session,
            cancel,
            armed: true,
        }
    }

    /// The submission reached its completion write
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        if !self.armed || self.cancel.is_cancelled() {
            return;
        }

        let mut state = self.session.state.write();
        // clear() cancels under the state lock, so this check is final
        if self.cancel.is_cancelled() {
            return;
        }
        self.session.in_flight.lock().take();
        self.cancel.cancel();
        state.submission.fail(SUBMISSION_INTERRUPTED_MESSAGE.to_string());
        warn!(session = %self.session.id, "Submission dropped before confirmation");
    }
}

/// Checks run before a submission, in order
fn validate(state: &SessionState) -> Result<(f64, f64), CalcError> {
    if !state.wallet.is_connected {
        return Err(CalcError::NotConnected);
    }

    let (a, b) = parse_operands(&state.input.operand1, &state.input.operand2)?;

    if let Some(operation) = state.input.parsed_operation() {
        check_divisor(operation, b)?;
    }

    Ok((a, b))
}

/// Record a connected wallet. Last write wins; the balance resets when the address changes.
pub(crate) fn mark_connected(state: &mut SessionState, address: String) {
    if state.wallet.address.as_deref() != Some(address.as_str()) {
        state.wallet.balance = 0.0;
    }
    state.wallet.is_connected = true;
    state.wallet.address = Some(address);
}

/// Fetch a balance and store it if `address` is still the connected wallet
pub(crate) async fn refresh_balance_into(
    state: &RwLock<SessionState>,
    balances: &dyn BalanceQuery,
    address: &str,
) -> wallet_client::Result<f64> {
    let balance = balances.balance(address).await?;

    let mut state = state.write();
    if state.wallet.address.as_deref() == Some(address) {
        state.wallet.balance = balance;
    } else {
        debug!("Discarding balance for a wallet that is no longer connected");
    }

    Ok(balance)
}
