//! # Auction Configuration & Constants
//!
//! Every magic number of the auction lives here, next to the per-auction
//! parameters a deployer chooses.

use serde::{Deserialize, Serialize};

use crate::error::AuctionError;
use crate::types::Address;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Default length of the bidding window, in seconds.
pub const DEFAULT_BIDDING_DURATION_SECS: u64 = 60;

/// Default length of the reveal window, in seconds.
pub const DEFAULT_REVEAL_DURATION_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// Denomination
// ---------------------------------------------------------------------------

/// Decimal places between a whole unit and a base unit.
pub const UNIT_DECIMALS: u32 = 18;

/// Base units in one whole unit (10^18).
pub const BASE_UNITS_PER_UNIT: u128 = 1_000_000_000_000_000_000;

// ---------------------------------------------------------------------------
// Commitments
// ---------------------------------------------------------------------------

/// Byte length of a commitment (Keccak-256 output).
pub const COMMITMENT_LENGTH: usize = 32;

/// Byte width of the amount in the commitment preimage. Amounts are
/// left-padded to a full 256-bit big-endian word.
pub const COMMITMENT_AMOUNT_WIDTH: usize = 32;

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// Capacity of the event broadcast channel in [`crate::shared::SharedAuction`].
/// Slow subscribers that fall further behind than this lose the oldest events.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Deployment artifacts
// ---------------------------------------------------------------------------

/// File holding `{ "Auction": "<id>" }` after a deployment.
pub const ADDRESS_ARTIFACT_FILE: &str = "Auction-address.json";

/// File holding the full auction descriptor after a deployment.
pub const DESCRIPTOR_ARTIFACT_FILE: &str = "Auction.json";

// ---------------------------------------------------------------------------
// AuctionConfig
// ---------------------------------------------------------------------------

/// Parameters fixed at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionConfig {
    /// Length of the bidding window, starting at construction.
    #[serde(default = "default_bidding_duration")]
    pub bidding_duration_secs: u64,
    /// Length of the reveal window, starting when bidding ends.
    #[serde(default = "default_reveal_duration")]
    pub reveal_duration_secs: u64,
    /// Recipient of the winning bid.
    pub beneficiary: Address,
}

fn default_bidding_duration() -> u64 {
    DEFAULT_BIDDING_DURATION_SECS
}

fn default_reveal_duration() -> u64 {
    DEFAULT_REVEAL_DURATION_SECS
}

impl AuctionConfig {
    /// Config with the default 60 s / 60 s windows.
    pub fn new(beneficiary: impl Into<Address>) -> Self {
        Self {
            bidding_duration_secs: DEFAULT_BIDDING_DURATION_SECS,
            reveal_duration_secs: DEFAULT_REVEAL_DURATION_SECS,
            beneficiary: beneficiary.into(),
        }
    }

    /// Overrides both window lengths.
    pub fn with_durations(mut self, bidding_secs: u64, reveal_secs: u64) -> Self {
        self.bidding_duration_secs = bidding_secs;
        self.reveal_duration_secs = reveal_secs;
        self
    }

    /// Checks the parameters. Zero-length windows are allowed; an empty
    /// beneficiary is not, since `auction_end` would have nowhere to pay.
    pub fn validate(&self) -> Result<(), AuctionError> {
        if self.beneficiary.is_empty() {
            return Err(AuctionError::InvalidConfig(
                "beneficiary must not be empty".into(),
            ));
        }
        Ok(())
    }
}
