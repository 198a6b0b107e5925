#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod balance;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod event_manager;
pub mod provider;
pub mod provider_stub;
pub mod types;

pub use balance::{BalanceQuery, RpcBalanceClient, StubBalanceClient};
pub use clipboard::{Clipboard, MemoryClipboard};
pub use config::{Config, NetworkConfig, SubmissionConfig};
pub use error::{Result, WalletError};
pub use event_manager::{EventManager, ProviderEventHandler};
pub use provider::WalletProvider;
pub use provider_stub::StubWalletProvider;
pub use types::*;
