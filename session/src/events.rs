use crate::controller::{mark_connected, refresh_balance_into};
use crate::state::SessionState;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};
use wallet_client::{BalanceQuery, ProviderEventHandler};

/// Applies unsolicited provider notifications to the session state.
///
/// These race with user-initiated connects; every update is last-write-wins.
/// A provider-side disconnect only resets the wallet, the form is kept.
pub(crate) struct SessionEventHandler {
    state: Arc<RwLock<SessionState>>,
    balances: Arc<dyn BalanceQuery>,
}

impl SessionEventHandler {
    pub(crate) fn new(state: Arc<RwLock<SessionState>>, balances: Arc<dyn BalanceQuery>) -> Self {
        Self { state, balances }
    }
}

#[async_trait]
impl ProviderEventHandler for SessionEventHandler {
    async fn handle_connect(&self, address: String) {
        {
            let mut state = self.state.write();
            mark_connected(&mut state, address.clone());
        }
        debug!(%address, "Provider reported connect");

        if let Err(err) = refresh_balance_into(&self.state, self.balances.as_ref(), &address).await {
            warn!("Failed to get balance: {err}");
        }
    }

    async fn handle_disconnect(&self) {
        self.state.write().reset_wallet();
        debug!("Provider reported disconnect");
    }
}
