//! Errors raised by auction operations.
//!
//! Every variant fails the operation atomically: when an `AuctionError` is
//! returned, the auction is exactly as it was before the call.

use thiserror::Error;

use crate::payout::PayoutError;
use crate::types::Timestamp;

/// Errors that can occur while operating an auction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    /// The operation's window has not opened yet.
    #[error("too early: operation not allowed before {not_before}")]
    TooEarly {
        /// The earliest timestamp at which the call can succeed.
        not_before: Timestamp,
    },

    /// The operation's window has already closed.
    #[error("too late: operation not allowed at or after {deadline}")]
    TooLate {
        /// The timestamp the call had to precede.
        deadline: Timestamp,
    },

    /// `auction_end` was already called successfully.
    #[error("auction_end has already been called")]
    AuctionEndAlreadyCalled,

    /// Adding to a balance would overflow.
    #[error("amount overflow: operation would exceed allowed limits")]
    AmountOverflow,

    /// A window boundary does not fit in a timestamp.
    #[error("timestamp overflow: {base} + {duration}s does not fit")]
    TimestampOverflow {
        /// Start of the window.
        base: Timestamp,
        /// Requested length of the window.
        duration: u64,
    },

    /// Construction parameters were rejected.
    #[error("invalid auction config: {0}")]
    InvalidConfig(String),

    /// The payout sink refused a transfer; the operation was rolled back.
    #[error("payout failed: {0}")]
    Payout(#[from] PayoutError),
}
