use std::path::PathBuf;

use arena_deploy::{ARENA_CONFIG_FILENAME, DEFAULT_NETWORK, REPORT_FILENAME};
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use url::Url;

/// How reports and plans are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "arena")]
#[command(
    author,
    version,
    about = "Deploy and wire the Theta Arena NFT factory, token and marketplace"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "ARENA_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to the configuration file, or to the directory containing it.
    #[arg(long, alias = "conf", env = "ARENA_CONFIG", default_value = ARENA_CONFIG_FILENAME)]
    pub config: PathBuf,

    /// The network to deploy to, as declared under `[networks.<name>]`.
    #[arg(short, long, env = "ARENA_NETWORK", default_value = DEFAULT_NETWORK)]
    pub network: String,

    /// Overrides the RPC URL of the selected network.
    #[arg(long, alias = "rpc", env = "ARENA_RPC_URL")]
    pub rpc_url: Option<Url>,

    /// Output format of plans and reports.
    #[arg(long, env = "ARENA_FORMAT", default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Deploy the factory, token and marketplace, then wire them together.
    Deploy {
        /// Directory the run report is written to.
        #[arg(long, env = "ARENA_OUTDATA", default_value = ".")]
        outdata: PathBuf,
    },

    /// Retry the initialization steps that failed in a previous run.
    Rewire {
        /// The run report of the previous run.
        #[arg(long, default_value = REPORT_FILENAME)]
        report: PathBuf,
    },

    /// Deploy the configured ERC20 payment tokens (development networks).
    #[command(name = "deploy-erc20")]
    DeployErc20,

    /// List the accounts of the node.
    Accounts,

    /// Print the deployment plan without sending any transaction.
    Plan,
}
