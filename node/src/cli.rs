//! # CLI Interface
//!
//! Defines the command-line argument structure for `sealed-auction-node`
//! using `clap` derive. Supports four subcommands: `blind`, `deploy`,
//! `simulate`, and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sealed-bid auction tooling.
///
/// Seals bids, deploys auctions with their descriptor artifacts, and replays
/// scripted auction scenarios against a simulated clock.
#[derive(Parser, Debug)]
#[command(
    name = "sealed-auction-node",
    about = "Sealed-bid auction tooling",
    version,
    propagate_version = true
)]
pub struct SealedAuctionCli {
    /// Log output format: "pretty" or "json".
    #[arg(long, global = true, env = "SEALED_AUCTION_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the commitment for a bid value.
    Blind(BlindArgs),
    /// Create an auction and write its address and descriptor artifacts.
    Deploy(DeployArgs),
    /// Run a scripted auction scenario and print the outcome as JSON.
    Simulate(SimulateArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `blind` subcommand.
#[derive(Parser, Debug)]
pub struct BlindArgs {
    /// Bid value in whole units, e.g. "5" or "0.25".
    #[arg(long)]
    pub amount: String,

    /// Mark the bid as a decoy.
    #[arg(long)]
    pub fake: bool,
}

/// Arguments for the `deploy` subcommand.
#[derive(Parser, Debug)]
pub struct DeployArgs {
    /// JSON auction config. Flags below override its fields.
    #[arg(long, short = 'c', env = "SEALED_AUCTION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Recipient of the winning bid.
    #[arg(long, env = "SEALED_AUCTION_BENEFICIARY")]
    pub beneficiary: Option<String>,

    /// Bidding window length in seconds (default 60).
    #[arg(long)]
    pub bidding_duration: Option<u64>,

    /// Reveal window length in seconds (default 60).
    #[arg(long)]
    pub reveal_duration: Option<u64>,

    /// Directory receiving the artifacts. Created if missing.
    #[arg(long, short = 'o', env = "SEALED_AUCTION_OUT_DIR", default_value = "deployments")]
    pub out_dir: PathBuf,
}

/// Arguments for the `simulate` subcommand.
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Path to the JSON scenario file.
    #[arg(long, short = 's')]
    pub scenario: PathBuf,
}
