//! ChainProbe CLI — runs the EVM chain metrics exporter.
//!
//! # Commands
//! ```text
//! chainprobe run     --config <path> --listen-address <addr> --chain-name <name> --rpc-url <url>
//! chainprobe check   --config <path> --chain-name <name> --rpc-url <url>
//! chainprobe version
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod cmd_check;
mod cmd_run;
mod settings;

#[derive(Parser)]
#[command(
    name = "chainprobe",
    about = "Prometheus exporter for EVM chain metrics — ChainProbe CLI",
    long_about = "
ChainProbe polls an EVM JSON-RPC endpoint for account balances, nonces,
ERC-20 balances and arbitrary read-only contract calls, and compares block
fingerprints across replica endpoints. Values are served on /metrics.

ENVIRONMENT VARIABLES:
  CHAINPROBE_CONFIG          Path to the YAML configuration file
  CHAINPROBE_LISTEN_ADDRESS  Address of the /metrics server
  CHAINPROBE_CHAIN_NAME      Value of the chainName label
  CHAINPROBE_RPC_URL         Main JSON-RPC endpoint
",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by `run` and `check`.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Path to the YAML configuration file
    #[arg(long, env = "CHAINPROBE_CONFIG", default_value = "./config.yaml")]
    pub config: PathBuf,
    /// Chain name used as the chainName label
    #[arg(long, env = "CHAINPROBE_CHAIN_NAME", default_value = "eth-goerli")]
    pub chain_name: String,
    /// Main JSON-RPC endpoint
    #[arg(long, env = "CHAINPROBE_RPC_URL", default_value = "https://rpc.ankr.com/eth_goerli")]
    pub rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the collectors and serve /metrics until interrupted
    Run {
        #[command(flatten)]
        target: Target,
        /// Address to serve /metrics on (":9060" binds every interface)
        #[arg(long, env = "CHAINPROBE_LISTEN_ADDRESS", default_value = ":9060")]
        listen_address: String,
        /// Override the configured log level
        #[arg(long)]
        log_level: Option<String>,
        /// Emit JSON log lines
        #[arg(long)]
        json_logs: bool,
    },

    /// Load the configuration and build every task without starting any
    Check {
        #[command(flatten)]
        target: Target,
    },

    /// Print the version
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { target, listen_address, log_level, json_logs } => {
            cmd_run::run(&target, &listen_address, log_level, json_logs).await
        }

        Commands::Check { target } => cmd_check::run(&target),

        Commands::Version => {
            println!("chainprobe {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
