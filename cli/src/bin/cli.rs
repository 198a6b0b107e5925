//! Command line front-end for the calculator session
//!
//! Drives a full session against the stub wallet provider, so the whole
//! connect / validate / submit / confirm cycle can be exercised from a shell.
//!
//! Usage examples:
//! ```shell
//! # Divide two numbers and print the resulting view
//! cli calculate --a 10 --b 4 --operation divide
//!
//! # Same, as JSON, with a shorter confirmation delay
//! cli --confirmation-delay-ms 100 calculate --a 2 --b 3 --json
//!
//! # Print a placeholder signature and its explorer link
//! cli signature
//! cli explorer-url --signature <SIGNATURE>
//!
//! # Query a balance over JSON-RPC
//! cli --rpc-url https://api.devnet.solana.com balance --address <ADDRESS>
//! ```

use calculator_lib::{generate_placeholder_signature, Operation};
use calculator_session::{CalculatorSession, OperandSlot, SessionView};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::{Result, WrapErr};
use std::env;
use std::sync::Arc;
use tracing::{error, info};
use url::Url;
use wallet_client::{BalanceQuery, Config, RpcBalanceClient, StubBalanceClient, StubWalletProvider};

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Calculator session driven against a stub wallet")]
#[command(version)]
struct Cli {
    /// Cluster shown in the network badge and explorer links
    #[arg(long, global = true, env = "CALCULATOR_NETWORK")]
    network: Option<String>,

    /// Program the calculation is nominally submitted to
    #[arg(long, global = true, env = "CALCULATOR_PROGRAM_ID")]
    program_id: Option<String>,

    /// JSON-RPC endpoint for balance queries; a fixed stub balance is used when unset
    #[arg(long, global = true, env = "SOLANA_RPC_URL")]
    rpc_url: Option<String>,

    /// Simulated confirmation delay
    #[arg(long, global = true, env = "CONFIRMATION_DELAY_MS")]
    confirmation_delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect, submit a calculation and wait for confirmation
    Calculate {
        /// First operand, as typed into the form
        #[arg(short, long, allow_hyphen_values = true)]
        a: String,
        /// Second operand, as typed into the form
        #[arg(short, long, allow_hyphen_values = true)]
        b: String,
        #[arg(short, long, value_enum, default_value_t = Operation::Add)]
        operation: Operation,
        /// Wallet address reported by the stub provider
        #[arg(long)]
        address: Option<String>,
        /// Print the final view as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
    /// Print a fresh placeholder signature
    Signature,
    /// Print the explorer link for a signature
    ExplorerUrl {
        #[arg(short, long)]
        signature: String,
    },
    /// Query the balance of an address
    Balance {
        #[arg(long)]
        address: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            env::var("RUST_LOG").unwrap_or_else(|_| "cli=info,calculator_session=info".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let balances = balance_source(&config)?;

    match cli.command {
        Commands::Calculate {
            a,
            b,
            operation,
            address,
            json,
        } => {
            calculate(config, balances, a, b, operation, address, json).await?;
        }
        Commands::Signature => {
            println!("{}", generate_placeholder_signature());
        }
        Commands::ExplorerUrl { signature } => {
            println!("{}", config.explorer_link(&signature));
        }
        Commands::Balance { address } => {
            let balance = balances
                .balance(&address)
                .await
                .wrap_err("Failed to get balance")?;
            info!("💰 Balance of {}: {:.4} SOL", address, balance);
        }
    }

    Ok(())
}

/// Environment configuration with command line overrides applied
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env().wrap_err("Invalid configuration")?;

    if let Some(network) = &cli.network {
        config.network.name.clone_from(network);
    }
    if let Some(program_id) = &cli.program_id {
        config.network.program_id.clone_from(program_id);
    }
    if let Some(rpc_url) = &cli.rpc_url {
        config.network.rpc_url = Some(Url::parse(rpc_url).wrap_err("Invalid --rpc-url")?);
    }
    if let Some(delay) = cli.confirmation_delay_ms {
        config.submission.confirmation_delay_ms = delay;
    }

    config.validate()?;
    Ok(config)
}

fn balance_source(config: &Config) -> Result<Arc<dyn BalanceQuery>> {
    Ok(match &config.network.rpc_url {
        Some(rpc_url) => Arc::new(RpcBalanceClient::new(rpc_url.clone())?),
        None => Arc::new(StubBalanceClient::default()),
    })
}

/// Run one calculation through a full session
async fn calculate(
    config: Config,
    balances: Arc<dyn BalanceQuery>,
    a: String,
    b: String,
    operation: Operation,
    address: Option<String>,
    json: bool,
) -> Result<()> {
    let provider = address.map_or_else(StubWalletProvider::with_random_address, StubWalletProvider::new);

    let session = CalculatorSession::builder(config)
        .provider(Arc::new(provider))
        .balance_query(balances)
        .start()
        .await;

    let address = session.connect().await?;
    info!("🔗 Connected wallet {}", address);

    session.set_operand(OperandSlot::First, a);
    session.set_operand(OperandSlot::Second, b);
    session.set_operation(operation);

    let outcome = session.submit().await;
    let view = session.view();
    session.shutdown().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_view(&view);
    }

    match outcome {
        Ok(receipt) => {
            info!("✅ Calculation confirmed: {}", receipt.result);
            Ok(())
        }
        Err(err) => {
            error!("❌ Calculation failed: {}", err);
            Err(err.into())
        }
    }
}

fn print_view(view: &SessionView) {
    info!("🌐 Network: {} (program {})", view.network, view.program_id);
    if let (Some(address), Some(balance)) = (&view.short_address, &view.balance) {
        info!("   Wallet: {} ({})", address, balance);
    }
    if let Some(expression) = &view.expression {
        info!("   {}", expression);
    }
    if let Some(status) = view.status {
        info!("   Status: {}", status);
    }
    if let Some(signature) = &view.signature {
        info!("   Signature: {}", signature);
    }
    if let Some(url) = &view.explorer_url {
        info!("   Explorer: {}", url);
    }
    if let Some(message) = &view.error_message {
        error!("   {}", message);
    }
}
