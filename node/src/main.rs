// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Sealed Auction Node
//!
//! Entry point for the `sealed-auction-node` binary. Parses CLI arguments,
//! initializes logging, and dispatches to a subcommand:
//!
//! - `blind`    : print the commitment for a bid value
//! - `deploy`   : create an auction and write its artifacts
//! - `simulate` : replay a scenario file and print the report
//! - `version`  : print build version information
//!
//! Results go to stdout as JSON; logs go to stderr.

mod cli;
mod deploy;
mod logging;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use sealed_auction::units::parse_units;
use sealed_auction::{blind, Amount, Commitment};

use cli::{Commands, SealedAuctionCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = SealedAuctionCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, LogFormat::from_str_lossy(&cli.log_format));

    match cli.command {
        Commands::Blind(args) => blind_bid(args),
        Commands::Deploy(args) => deploy_auction(args),
        Commands::Simulate(args) => simulate(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct BlindOutput {
    amount: Amount,
    fake: bool,
    commitment: Commitment,
}

/// Seals a bid value the same way the auction checks it at reveal time.
fn blind_bid(args: cli::BlindArgs) -> Result<()> {
    let amount = parse_units(&args.amount)
        .with_context(|| format!("invalid amount '{}'", args.amount))?;
    let output = BlindOutput {
        amount,
        fake: args.fake,
        commitment: blind(amount, args.fake),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn deploy_auction(args: cli::DeployArgs) -> Result<()> {
    let config = deploy::resolve_config(
        args.config.as_deref(),
        args.beneficiary,
        args.bidding_duration,
        args.reveal_duration,
    )?;

    let deployment = deploy::deploy(config, &args.out_dir)?;

    println!("Auction deployed");
    println!("  id:           {}", deployment.descriptor.id);
    println!("  beneficiary:  {}", deployment.descriptor.config.beneficiary);
    println!("  bidding ends: {}", deployment.descriptor.bidding_end);
    println!("  reveal ends:  {}", deployment.descriptor.reveal_end);
    println!("  address:      {}", deployment.address_path.display());
    println!("  descriptor:   {}", deployment.descriptor_path.display());
    Ok(())
}

async fn simulate(args: cli::SimulateArgs) -> Result<()> {
    let scenario = scenario::Scenario::from_file(&args.scenario)?;
    tracing::info!(
        path = %args.scenario.display(),
        steps = scenario.steps.len(),
        "running scenario"
    );

    let report = scenario::run(scenario).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_version() {
    println!("sealed-auction-node {}", env!("CARGO_PKG_VERSION"));
    println!("rustc               {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
