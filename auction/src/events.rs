//! Events emitted by the auction.
//!
//! The engine queues events as operations commit; [`crate::shared::SharedAuction`]
//! drains the queue after every call and broadcasts it to subscribers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::commitment::Commitment;
use crate::types::{Address, Amount};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionEvent {
    /// A sealed bid was accepted during bidding.
    BidPlaced {
        bidder: Address,
        index: usize,
        commitment: Commitment,
        deposit: Amount,
    },
    /// A `reveal` call finished. `refund` is what it credited to the
    /// bidder's pending returns.
    BidRevealed {
        bidder: Address,
        revealed: usize,
        refund: Amount,
    },
    /// A revealed bid took the lead.
    HighestBidIncreased { bidder: Address, amount: Amount },
    /// Pending returns were paid out.
    Withdrawn { bidder: Address, amount: Amount },
    /// The auction closed. `winner` is `None` when nobody revealed a valid bid.
    AuctionEnded {
        winner: Option<Address>,
        amount: Amount,
    },
}

impl fmt::Display for AuctionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuctionEvent::BidPlaced { bidder, index, deposit, .. } => {
                write!(f, "BidPlaced({bidder}, #{index}, deposit={deposit})")
            }
            AuctionEvent::BidRevealed { bidder, revealed, refund } => {
                write!(f, "BidRevealed({bidder}, revealed={revealed}, refund={refund})")
            }
            AuctionEvent::HighestBidIncreased { bidder, amount } => {
                write!(f, "HighestBidIncreased({bidder}, {amount})")
            }
            AuctionEvent::Withdrawn { bidder, amount } => {
                write!(f, "Withdrawn({bidder}, {amount})")
            }
            AuctionEvent::AuctionEnded { winner, amount } => match winner {
                Some(w) => write!(f, "AuctionEnded({w}, {amount})"),
                None => write!(f, "AuctionEnded(none, {amount})"),
            },
        }
    }
}
