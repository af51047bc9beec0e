// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Sealed-Bid Auction Engine
//!
//! A blind auction in three acts:
//!
//! 1. **Bidding**: bidders submit a [`Commitment`] (the hash of their true
//!    bid and a "fake" flag) together with a deposit. Nobody, the engine
//!    included, learns the real amount yet.
//! 2. **Reveal**: bidders disclose the `(amount, fake)` pairs behind their
//!    commitments. Matching, honest, sufficiently funded bids compete for the
//!    top spot; everything else is refunded through the pull-payment ledger.
//! 3. **End**: once the reveal window closes, anyone may call
//!    [`Auction::auction_end`] exactly once to pay the beneficiary.
//!
//! ## Modules
//!
//! - **commitment**: `blind(amount, fake)`, the Keccak-256 commitment.
//! - **clock**: where "now" comes from. The engine reads it, never moves it.
//! - **engine**: the auction state machine and its bid/refund ledgers.
//! - **shared**: a lock-guarded handle that serializes every operation and
//!   broadcasts the resulting events.
//! - **payout**: the destination of every transfer the engine performs.
//! - **config** / **units** / **types**: parameters, denomination, identities.
//!
//! ## Ground rules
//!
//! 1. Money arithmetic is checked. Always.
//! 2. A failed operation changes nothing. Not a field, not a balance.
//! 3. Refunds are pulled by their owner, never pushed, and the ledger entry
//!    is zeroed before the transfer goes out.

pub mod clock;
pub mod commitment;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod payout;
pub mod shared;
pub mod types;
pub mod units;

pub use clock::{Clock, ManualClock, SystemClock};
pub use commitment::{blind, Commitment};
pub use config::AuctionConfig;
pub use engine::{Auction, AuctionSnapshot, Bid, Phase, RevealOutcome, RevealReport, Settlement};
pub use error::AuctionError;
pub use events::AuctionEvent;
pub use payout::{Ledger, Payout, PayoutError};
pub use shared::SharedAuction;
pub use types::{Address, Amount, Timestamp};
