//! # Scenario Runner
//!
//! Replays a scripted auction from a JSON file against a [`ManualClock`], so
//! a whole bidding/reveal/settlement cycle runs in milliseconds and always
//! produces the same result.
//!
//! ```json
//! {
//!   "config": { "beneficiary": "carol", "bidding_duration_secs": 60 },
//!   "wallets": { "alice": "10", "bob": "10" },
//!   "steps": [
//!     { "at": 0,   "action": "bid", "bidder": "alice", "value": "5" },
//!     { "at": 70,  "action": "reveal", "bidder": "alice", "values": ["5"], "fake": [false] },
//!     { "at": 130, "action": "end" }
//!   ]
//! }
//! ```
//!
//! Amounts are whole units. `at` is seconds after `start`. A bid debits its
//! deposit from the bidder's wallet and every payout credits one, so the
//! final wallets plus the auction's outstanding balances always add up to
//! the starting wallets.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;

use sealed_auction::units::{format_units, parse_units};
use sealed_auction::{
    blind, Address, Amount, AuctionConfig, AuctionEvent, AuctionSnapshot, Ledger, ManualClock,
    SharedAuction, Timestamp,
};

/// Clock reading at `at = 0` when a scenario does not set `start`.
pub const DEFAULT_START: Timestamp = 1_700_000_000;

// ---------------------------------------------------------------------------
// Scenario format
// ---------------------------------------------------------------------------

/// A scripted auction.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub config: AuctionConfig,
    #[serde(default = "default_start")]
    pub start: Timestamp,
    /// Opening balance of every participant, in whole units.
    #[serde(default)]
    pub wallets: BTreeMap<Address, String>,
    pub steps: Vec<Step>,
}

fn default_start() -> Timestamp {
    DEFAULT_START
}

/// One action at one point in time.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Seconds after the scenario start.
    pub at: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Seal `value` and submit it with `deposit` (defaults to `value`).
    Bid {
        bidder: Address,
        value: String,
        #[serde(default)]
        fake: bool,
        #[serde(default)]
        deposit: Option<String>,
    },
    Reveal {
        bidder: Address,
        values: Vec<String>,
        fake: Vec<bool>,
    },
    Withdraw {
        bidder: Address,
    },
    End,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Bid { .. } => "bid",
            Action::Reveal { .. } => "reveal",
            Action::Withdraw { .. } => "withdraw",
            Action::End => "end",
        }
    }
}

impl Scenario {
    /// Reads and validates a scenario file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        let scenario: Scenario = serde_json::from_str(&raw)
            .with_context(|| format!("invalid scenario {}", path.display()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Steps must be in time order; the clock never runs backwards.
    pub fn validate(&self) -> Result<()> {
        self.config.validate().context("invalid auction config")?;
        for pair in self.steps.windows(2) {
            if pair[1].at < pair[0].at {
                bail!(
                    "steps out of order: {} at {}s follows {} at {}s",
                    pair[1].action.name(),
                    pair[1].at,
                    pair[0].action.name(),
                    pair[0].at
                );
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// What a single step did.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub at: Timestamp,
    pub action: &'static str,
    pub ok: bool,
    pub detail: String,
}

/// Outcome of a full run. Amounts outside `snapshot` and `events` are whole
/// units.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub winner: Option<Address>,
    pub highest_bid: String,
    pub pending_returns: BTreeMap<Address, String>,
    pub wallets: BTreeMap<Address, String>,
    pub steps: Vec<StepRecord>,
    pub events: Vec<AuctionEvent>,
    pub snapshot: AuctionSnapshot,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Runs every step in order and collects the broadcast events.
///
/// A step that the auction rejects is recorded and the run continues, the
/// same way a reverted transaction does not stop the chain.
pub async fn run(scenario: Scenario) -> Result<SimulationReport> {
    scenario.validate()?;

    let mut wallets = Ledger::new();
    for (owner, balance) in &scenario.wallets {
        let amount = parse_units(balance)
            .with_context(|| format!("invalid wallet balance for {owner}"))?;
        wallets.credit(owner, amount)?;
    }

    let clock = ManualClock::new(scenario.start);
    let auction = SharedAuction::new(scenario.config.clone(), clock.clone())
        .context("failed to construct auction")?;

    let mut rx = auction.subscribe();
    let collector = tokio::spawn(async move {
        let mut events = Vec::new();
        loop {
            match rx.recv().await {
                Ok(event) => {
                    tracing::info!(%event, "auction event");
                    events.push(event);
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "event collector lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        events
    });

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let target = scenario
            .start
            .checked_add(step.at)
            .with_context(|| format!("step {index}: time offset {} overflows", step.at))?;
        let at = clock.increase_to(target);

        let outcome = apply(&auction, &mut wallets, &step.action);
        let record = match outcome {
            Ok(detail) => {
                tracing::info!(index, at, action = step.action.name(), %detail, "step applied");
                StepRecord {
                    index,
                    at,
                    action: step.action.name(),
                    ok: true,
                    detail,
                }
            }
            Err(err) => {
                tracing::warn!(index, at, action = step.action.name(), error = %err, "step rejected");
                StepRecord {
                    index,
                    at,
                    action: step.action.name(),
                    ok: false,
                    detail: err.to_string(),
                }
            }
        };
        steps.push(record);
    }

    let snapshot = auction.snapshot();
    // Closing the channel ends the collector once it has drained the backlog.
    drop(auction);
    let events = collector.await.context("event collector task failed")?;

    Ok(SimulationReport {
        winner: snapshot.highest_bidder.clone(),
        highest_bid: format_units(snapshot.highest_bid),
        pending_returns: snapshot
            .pending_returns
            .iter()
            .map(|(owner, amount)| (owner.clone(), format_units(*amount)))
            .collect(),
        wallets: wallets
            .balances()
            .map(|(owner, amount)| (owner.clone(), format_units(amount)))
            .collect(),
        steps,
        events,
        snapshot,
    })
}

fn apply(
    auction: &SharedAuction<ManualClock>,
    wallets: &mut Ledger,
    action: &Action,
) -> Result<String> {
    match action {
        Action::Bid {
            bidder,
            value,
            fake,
            deposit,
        } => {
            let value = parse_units(value)?;
            let deposit = match deposit {
                Some(deposit) => parse_units(deposit)?,
                None => value,
            };
            let commitment = blind(value, *fake);

            wallets.debit(bidder, deposit)?;
            match auction.place_bid(bidder, deposit, commitment) {
                Ok(index) => Ok(format!("slot {index} sealed as {commitment}")),
                Err(err) => {
                    // The deposit never left the wallet.
                    wallets.credit(bidder, deposit)?;
                    Err(err.into())
                }
            }
        }
        Action::Reveal {
            bidder,
            values,
            fake,
        } => {
            let amounts = values
                .iter()
                .map(|v| parse_units(v))
                .collect::<Result<Vec<Amount>, _>>()?;
            let report = auction.reveal(bidder, &amounts, fake)?;
            Ok(format!(
                "{} of {} slots revealed, refund {}",
                report.revealed(),
                report.outcomes.len(),
                format_units(report.refund)
            ))
        }
        Action::Withdraw { bidder } => {
            let amount = auction.withdraw(bidder, wallets)?;
            Ok(format!("withdrew {}", format_units(amount)))
        }
        Action::End => {
            let settlement = auction.auction_end(wallets)?;
            Ok(match settlement.winner {
                Some(winner) => format!("{winner} wins at {}", format_units(settlement.amount)),
                None => "ended without a winner".to_string(),
            })
        }
    }
}
