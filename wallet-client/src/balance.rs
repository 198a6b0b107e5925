//! Balance queries for a connected wallet address.
//!
//! [`StubBalanceClient`] returns a fixed stand-in value and is what the session
//! uses unless an RPC endpoint is configured. [`RpcBalanceClient`] performs a
//! real `getBalance` JSON-RPC call.

use crate::{
    error::{Result, WalletError},
    types::lamports_to_sol,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Stand-in balance shown while no ledger connection exists
pub const STUB_BALANCE_SOL: f64 = 1.5432;

#[async_trait]
pub trait BalanceQuery: Send + Sync {
    /// Balance of `address` in the ledger's native unit (SOL)
    async fn balance(&self, address: &str) -> Result<f64>;
}

#[derive(Debug, Clone)]
pub struct StubBalanceClient {
    balance: f64,
}

impl StubBalanceClient {
    #[must_use]
    pub const fn new(balance: f64) -> Self {
        Self { balance }
    }
}

impl Default for StubBalanceClient {
    fn default() -> Self {
        Self::new(STUB_BALANCE_SOL)
    }
}

#[async_trait]
impl BalanceQuery for StubBalanceClient {
    async fn balance(&self, _address: &str) -> Result<f64> {
        Ok(self.balance)
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResult {
    value: u64,
}

/// JSON-RPC balance client for a Solana cluster
#[derive(Debug, Clone)]
pub struct RpcBalanceClient {
    client: Client,
    rpc_url: Url,
}

impl RpcBalanceClient {
    pub fn new(rpc_url: Url) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, rpc_url })
    }

    #[must_use]
    pub const fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    /// Extract the balance in SOL from a raw `getBalance` response body
    pub fn parse_balance_response(body: &str) -> Result<f64> {
        let response: RpcResponse<BalanceResult> = serde_json::from_str(body)?;

        if let Some(error) = response.error {
            return Err(WalletError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        response
            .result
            .map(|result| lamports_to_sol(result.value))
            .ok_or_else(|| WalletError::Balance("response carried no result".to_string()))
    }
}

#[async_trait]
impl BalanceQuery for RpcBalanceClient {
    #[instrument(skip(self), fields(rpc = %self.rpc_url))]
    async fn balance(&self, address: &str) -> Result<f64> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getBalance",
            "params": [address, { "commitment": "confirmed" }],
        });

        let response = self
            .client
            .post(self.rpc_url.clone())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WalletError::Balance(format!(
                "RPC endpoint returned {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let balance = Self::parse_balance_response(&body)?;
        debug!(balance, "fetched balance");
        Ok(balance)
    }
}
