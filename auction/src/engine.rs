//! # Auction Engine
//!
//! The sealed-bid state machine. One [`Auction`] value is one auction: it is
//! created with its windows and beneficiary, mutated by [`place_bid`],
//! [`reveal`], [`withdraw`] and [`auction_end`], and stays queryable after
//! it ends.
//!
//! ## Phases
//!
//! There is no stored phase field. The phase is derived from the clock, the
//! two window boundaries and the one-shot `ended` latch:
//!
//! ```text
//! Bidding    : now <  bidding_end
//! Reveal     : bidding_end <= now < reveal_end
//! PostReveal : now >= reveal_end, not ended     (auction_end callable)
//! Ended      : ended                            (terminal)
//! ```
//!
//! ## Money flow
//!
//! Deposits enter custody at `place_bid`. From there a unit of value either
//! backs the highest bid (paid to the beneficiary at `auction_end`), sits in
//! `pending_returns` until its owner withdraws it, or stays locked in a bid
//! slot that was never successfully revealed.
//!
//! [`place_bid`]: Auction::place_bid
//! [`reveal`]: Auction::reveal
//! [`withdraw`]: Auction::withdraw
//! [`auction_end`]: Auction::auction_end

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::clock::{Clock, SystemClock};
use crate::commitment::{blind, Commitment};
use crate::config::AuctionConfig;
use crate::error::AuctionError;
use crate::events::AuctionEvent;
use crate::payout::Payout;
use crate::types::{Address, Amount, Timestamp};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One sealed bid slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    /// The sealed value, or [`Commitment::EMPTY`] once revealed.
    pub commitment: Commitment,
    /// Value escrowed with the bid. Never changes.
    pub deposit: Amount,
}

impl Bid {
    /// Returns `true` once the slot has been successfully revealed.
    pub fn is_consumed(&self) -> bool {
        self.commitment.is_empty()
    }
}

/// Where the auction is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Bidding,
    Reveal,
    PostReveal,
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Bidding => write!(f, "Bidding"),
            Phase::Reveal => write!(f, "Reveal"),
            Phase::PostReveal => write!(f, "PostReveal"),
            Phase::Ended => write!(f, "Ended"),
        }
    }
}

/// What happened to a single slot during `reveal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealOutcome {
    /// The disclosed values do not hash to the stored commitment. Nothing is
    /// refunded and the slot is left untouched.
    Mismatch,
    /// Honest reveal of a decoy bid; the full deposit is refunded.
    Fake,
    /// The deposit was smaller than the disclosed amount; the full deposit is
    /// refunded and the bid does not compete.
    Underfunded,
    /// Valid bid that did not beat the current highest bid; the full deposit
    /// is refunded.
    Outbid,
    /// Valid bid that became the highest bid; only the excess over the bid
    /// amount is refunded.
    Leading,
}

/// Result of a [`Auction::reveal`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealReport {
    /// Outcome per processed slot, in slot order.
    pub outcomes: Vec<RevealOutcome>,
    /// Total credited to the caller's pending returns by this call.
    pub refund: Amount,
}

impl RevealReport {
    /// Number of slots whose commitment matched and was consumed.
    pub fn revealed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| **o != RevealOutcome::Mismatch)
            .count()
    }
}

/// Winner and price, as reported by [`Auction::auction_end`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub winner: Option<Address>,
    pub amount: Amount,
}

/// Serializable point-in-time view of an auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSnapshot {
    pub now: Timestamp,
    pub phase: Phase,
    pub bidding_end: Timestamp,
    pub reveal_end: Timestamp,
    pub beneficiary: Address,
    pub ended: bool,
    pub highest_bid: Amount,
    pub highest_bidder: Option<Address>,
    pub custody: Amount,
    pub bids: BTreeMap<Address, Vec<Bid>>,
    pub pending_returns: BTreeMap<Address, Amount>,
}

// ---------------------------------------------------------------------------
// Auction
// ---------------------------------------------------------------------------

/// A single sealed-bid auction.
///
/// All operations take `&mut self`, so at most one runs at a time. Wrap the
/// auction in [`crate::shared::SharedAuction`] to share it between callers.
pub struct Auction<C: Clock = SystemClock> {
    clock: C,
    bidding_end: Timestamp,
    reveal_end: Timestamp,
    beneficiary: Address,
    ended: bool,
    highest_bid: Amount,
    highest_bidder: Option<Address>,
    bids: BTreeMap<Address, Vec<Bid>>,
    pending_returns: BTreeMap<Address, Amount>,
    /// Value currently escrowed: deposits in, payouts out.
    custody: Amount,
    events: Vec<AuctionEvent>,
}

impl<C: Clock> fmt::Debug for Auction<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auction")
            .field("bidding_end", &self.bidding_end)
            .field("reveal_end", &self.reveal_end)
            .field("beneficiary", &self.beneficiary)
            .field("ended", &self.ended)
            .field("highest_bid", &self.highest_bid)
            .field("highest_bidder", &self.highest_bidder)
            .field("custody", &self.custody)
            .finish_non_exhaustive()
    }
}

impl<C: Clock> Auction<C> {
    /// Opens a new auction. Bidding starts immediately and lasts
    /// `config.bidding_duration_secs`; the reveal window follows for
    /// `config.reveal_duration_secs`.
    ///
    /// # Errors
    ///
    /// [`AuctionError::InvalidConfig`] for an empty beneficiary,
    /// [`AuctionError::TimestampOverflow`] if a window end does not fit.
    pub fn new(config: AuctionConfig, clock: C) -> Result<Self, AuctionError> {
        config.validate()?;

        let now = clock.now();
        let bidding_end = now.checked_add(config.bidding_duration_secs).ok_or(
            AuctionError::TimestampOverflow {
                base: now,
                duration: config.bidding_duration_secs,
            },
        )?;
        let reveal_end = bidding_end
            .checked_add(config.reveal_duration_secs)
            .ok_or(AuctionError::TimestampOverflow {
                base: bidding_end,
                duration: config.reveal_duration_secs,
            })?;

        tracing::info!(
            beneficiary = %config.beneficiary,
            bidding_end,
            reveal_end,
            "auction created"
        );

        Ok(Self {
            clock,
            bidding_end,
            reveal_end,
            beneficiary: config.beneficiary,
            ended: false,
            highest_bid: 0,
            highest_bidder: None,
            bids: BTreeMap::new(),
            pending_returns: BTreeMap::new(),
            custody: 0,
            events: Vec::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Records a sealed bid with `deposit` escrowed alongside it. Returns the
    /// slot index of the new bid.
    ///
    /// The deposit is not checked against anything: the true amount is
    /// hidden, and overpaying is how a bidder disguises it.
    ///
    /// # Errors
    ///
    /// [`AuctionError::TooLate`] once bidding has ended.
    pub fn place_bid(
        &mut self,
        sender: &Address,
        deposit: Amount,
        commitment: Commitment,
    ) -> Result<usize, AuctionError> {
        let now = self.clock.now();
        if now >= self.bidding_end {
            tracing::warn!(bidder = %sender, now, bidding_end = self.bidding_end, "bid rejected: bidding closed");
            return Err(AuctionError::TooLate {
                deadline: self.bidding_end,
            });
        }

        let custody = self
            .custody
            .checked_add(deposit)
            .ok_or(AuctionError::AmountOverflow)?;

        let slots = self.bids.entry(sender.clone()).or_default();
        slots.push(Bid {
            commitment,
            deposit,
        });
        let index = slots.len() - 1;
        self.custody = custody;

        tracing::debug!(bidder = %sender, index, deposit, "bid placed");
        self.events.push(AuctionEvent::BidPlaced {
            bidder: sender.clone(),
            index,
            commitment,
            deposit,
        });
        Ok(index)
    }

    /// Discloses the `(amount, fake)` pairs behind the caller's bids, slot by
    /// slot in placement order.
    ///
    /// Only `min(amounts.len(), fake.len(), bid count)` leading slots are
    /// processed. A slot whose commitment does not match is skipped without a
    /// refund; a matching slot is consumed and its refund credited to the
    /// caller's pending returns. Revealing a consumed slot again never
    /// matches, so repeat calls credit nothing.
    ///
    /// # Errors
    ///
    /// [`AuctionError::TooEarly`] before bidding ends,
    /// [`AuctionError::TooLate`] once the reveal window has closed.
    pub fn reveal(
        &mut self,
        sender: &Address,
        amounts: &[Amount],
        fake: &[bool],
    ) -> Result<RevealReport, AuctionError> {
        let now = self.clock.now();
        if now < self.bidding_end {
            tracing::warn!(bidder = %sender, now, bidding_end = self.bidding_end, "reveal rejected: bidding still open");
            return Err(AuctionError::TooEarly {
                not_before: self.bidding_end,
            });
        }
        if now >= self.reveal_end {
            tracing::warn!(bidder = %sender, now, reveal_end = self.reveal_end, "reveal rejected: reveal closed");
            return Err(AuctionError::TooLate {
                deadline: self.reveal_end,
            });
        }

        let slots: &[Bid] = self.bids.get(sender).map(Vec::as_slice).unwrap_or(&[]);
        let count = slots.len().min(amounts.len()).min(fake.len());

        // Work on local copies and commit only once every checked step has
        // passed, so an overflow leaves the auction untouched.
        let mut highest_bid = self.highest_bid;
        let mut highest_bidder = self.highest_bidder.clone();
        let mut credits: BTreeMap<Address, Amount> = BTreeMap::new();
        let mut leader_changes = Vec::new();
        let mut consumed = Vec::with_capacity(count);
        let mut report = RevealReport::default();

        for (index, slot) in slots.iter().enumerate().take(count) {
            let (value, is_fake) = (amounts[index], fake[index]);
            if blind(value, is_fake) != slot.commitment {
                report.outcomes.push(RevealOutcome::Mismatch);
                continue;
            }

            let mut refund = slot.deposit;
            let outcome = if is_fake {
                RevealOutcome::Fake
            } else if slot.deposit < value {
                RevealOutcome::Underfunded
            } else if value > highest_bid {
                if let Some(previous) = highest_bidder.take() {
                    stage_credit(&self.pending_returns, &mut credits, &previous, highest_bid)?;
                }
                highest_bid = value;
                highest_bidder = Some(sender.clone());
                leader_changes.push(value);
                refund = slot.deposit - value;
                RevealOutcome::Leading
            } else {
                RevealOutcome::Outbid
            };

            report.refund = report
                .refund
                .checked_add(refund)
                .ok_or(AuctionError::AmountOverflow)?;
            report.outcomes.push(outcome);
            consumed.push(index);
        }
        stage_credit(&self.pending_returns, &mut credits, sender, report.refund)?;

        // Commit.
        if let Some(slots) = self.bids.get_mut(sender) {
            for index in &consumed {
                slots[*index].commitment = Commitment::EMPTY;
            }
        }
        self.pending_returns.extend(credits);
        self.highest_bid = highest_bid;
        self.highest_bidder = highest_bidder;

        for amount in leader_changes {
            tracing::info!(bidder = %sender, amount, "new highest bid");
            self.events.push(AuctionEvent::HighestBidIncreased {
                bidder: sender.clone(),
                amount,
            });
        }
        if count > 0 {
            tracing::debug!(
                bidder = %sender,
                processed = count,
                revealed = report.revealed(),
                refund = report.refund,
                "bids revealed"
            );
            self.events.push(AuctionEvent::BidRevealed {
                bidder: sender.clone(),
                revealed: report.revealed(),
                refund: report.refund,
            });
        }

        Ok(report)
    }

    /// Pays out the caller's pending returns. Returns the amount paid, `0`
    /// when nothing was owed.
    ///
    /// The ledger entry is zeroed *before* the transfer is attempted. If the
    /// sink rejects the transfer, the entry is restored and the error
    /// returned, as if the call never happened.
    pub fn withdraw<P: Payout + ?Sized>(
        &mut self,
        sender: &Address,
        payout: &mut P,
    ) -> Result<Amount, AuctionError> {
        let amount = self.pending_return(sender);
        if amount == 0 {
            return Ok(0);
        }

        self.pending_returns.insert(sender.clone(), 0);
        if let Err(err) = payout.transfer(sender, amount) {
            self.pending_returns.insert(sender.clone(), amount);
            tracing::warn!(bidder = %sender, amount, error = %err, "withdrawal rolled back");
            return Err(err.into());
        }

        debug_assert!(self.custody >= amount, "pending returns exceed custody");
        self.custody = self.custody.saturating_sub(amount);

        tracing::info!(bidder = %sender, amount, "pending returns withdrawn");
        self.events.push(AuctionEvent::Withdrawn {
            bidder: sender.clone(),
            amount,
        });
        Ok(amount)
    }

    /// Closes the auction and pays the highest bid to the beneficiary.
    ///
    /// Callable by anyone, once, after the reveal window. With no valid
    /// reveals the payment is zero and is skipped.
    ///
    /// # Errors
    ///
    /// [`AuctionError::TooEarly`] before the reveal window closes,
    /// [`AuctionError::AuctionEndAlreadyCalled`] on every call after the
    /// first successful one.
    pub fn auction_end<P: Payout + ?Sized>(
        &mut self,
        payout: &mut P,
    ) -> Result<Settlement, AuctionError> {
        let now = self.clock.now();
        if now < self.reveal_end {
            return Err(AuctionError::TooEarly {
                not_before: self.reveal_end,
            });
        }
        if self.ended {
            return Err(AuctionError::AuctionEndAlreadyCalled);
        }

        let settlement = Settlement {
            winner: self.highest_bidder.clone(),
            amount: self.highest_bid,
        };
        if settlement.amount > 0 {
            payout.transfer(&self.beneficiary, settlement.amount)?;
        }

        self.ended = true;
        debug_assert!(self.custody >= settlement.amount, "highest bid exceeds custody");
        self.custody = self.custody.saturating_sub(settlement.amount);

        tracing::info!(
            winner = ?settlement.winner,
            amount = settlement.amount,
            beneficiary = %self.beneficiary,
            "auction ended"
        );
        self.events.push(AuctionEvent::AuctionEnded {
            winner: settlement.winner.clone(),
            amount: settlement.amount,
        });
        Ok(settlement)
    }

    /// Takes every event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<AuctionEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Current time according to the auction's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Phase at the current time.
    pub fn phase(&self) -> Phase {
        self.phase_at(self.clock.now())
    }

    /// Phase the auction would be in at `now`, given its current latch.
    pub fn phase_at(&self, now: Timestamp) -> Phase {
        if self.ended {
            Phase::Ended
        } else if now < self.bidding_end {
            Phase::Bidding
        } else if now < self.reveal_end {
            Phase::Reveal
        } else {
            Phase::PostReveal
        }
    }

    /// Seconds until the current window closes; `0` once reveal is over.
    pub fn time_remaining(&self) -> u64 {
        let now = self.clock.now();
        match self.phase_at(now) {
            Phase::Bidding => self.bidding_end - now,
            Phase::Reveal => self.reveal_end - now,
            Phase::PostReveal | Phase::Ended => 0,
        }
    }

    pub fn bidding_end(&self) -> Timestamp {
        self.bidding_end
    }

    pub fn reveal_end(&self) -> Timestamp {
        self.reveal_end
    }

    pub fn beneficiary(&self) -> &Address {
        &self.beneficiary
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn highest_bid(&self) -> Amount {
        self.highest_bid
    }

    pub fn highest_bidder(&self) -> Option<&Address> {
        self.highest_bidder.as_ref()
    }

    /// The `index`-th bid placed by `bidder`.
    pub fn bid(&self, bidder: &Address, index: usize) -> Option<&Bid> {
        self.bids.get(bidder).and_then(|slots| slots.get(index))
    }

    /// Every bid placed by `bidder`, in placement order.
    pub fn bids(&self, bidder: &Address) -> &[Bid] {
        self.bids.get(bidder).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Amount `bidder` could withdraw right now.
    pub fn pending_return(&self, bidder: &Address) -> Amount {
        self.pending_returns.get(bidder).copied().unwrap_or(0)
    }

    /// Total value held by the auction.
    pub fn custody(&self) -> Amount {
        self.custody
    }

    /// Deposits sitting in slots that have not been successfully revealed.
    /// After the reveal window these are locked for good.
    pub fn unrevealed_deposits(&self) -> Amount {
        self.bids
            .values()
            .flatten()
            .filter(|bid| !bid.is_consumed())
            .fold(0u128, |acc, bid| acc.saturating_add(bid.deposit))
    }

    /// Full state at the current time.
    pub fn snapshot(&self) -> AuctionSnapshot {
        let now = self.clock.now();
        AuctionSnapshot {
            now,
            phase: self.phase_at(now),
            bidding_end: self.bidding_end,
            reveal_end: self.reveal_end,
            beneficiary: self.beneficiary.clone(),
            ended: self.ended,
            highest_bid: self.highest_bid,
            highest_bidder: self.highest_bidder.clone(),
            custody: self.custody,
            bids: self.bids.clone(),
            pending_returns: self.pending_returns.clone(),
        }
    }
}

/// Adds `amount` to `address`'s staged pending return, starting from the
/// committed value the first time the address is seen.
fn stage_credit(
    committed: &BTreeMap<Address, Amount>,
    staged: &mut BTreeMap<Address, Amount>,
    address: &Address,
    amount: Amount,
) -> Result<(), AuctionError> {
    if amount == 0 {
        return Ok(());
    }
    let current = staged
        .get(address)
        .or_else(|| committed.get(address))
        .copied()
        .unwrap_or(0);
    let updated = current
        .checked_add(amount)
        .ok_or(AuctionError::AmountOverflow)?;
    staged.insert(address.clone(), updated);
    Ok(())
}
