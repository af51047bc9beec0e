//! # Shared Auction Handle
//!
//! The engine is a plain `&mut self` state machine. [`SharedAuction`] is how
//! several callers (threads, tasks, request handlers) use one auction:
//!
//! - One coarse `parking_lot::Mutex` serializes every operation. A call holds
//!   the lock from its first clock read to its last ledger write, so it sees
//!   one consistent snapshot of time and balances and either commits fully
//!   or not at all.
//! - Events are drained while the lock is still held and published on a
//!   `tokio::sync::broadcast` channel, so subscribers observe them in commit
//!   order. Nobody listening is fine; lagging subscribers lose the oldest
//!   events (see [`EVENT_CHANNEL_CAPACITY`]).

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::clock::{Clock, SystemClock};
use crate::commitment::Commitment;
use crate::config::{AuctionConfig, EVENT_CHANNEL_CAPACITY};
use crate::engine::{Auction, AuctionSnapshot, Phase, RevealReport, Settlement};
use crate::error::AuctionError;
use crate::events::AuctionEvent;
use crate::payout::Payout;
use crate::types::{Address, Amount};

/// Cloneable, thread-safe handle to one auction.
pub struct SharedAuction<C: Clock = SystemClock> {
    inner: Arc<Mutex<Auction<C>>>,
    event_tx: broadcast::Sender<AuctionEvent>,
}

impl<C: Clock> Clone for SharedAuction<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            event_tx: self.event_tx.clone(),
        }
    }
}

impl<C: Clock> SharedAuction<C> {
    /// Creates the auction and its event channel.
    pub fn new(config: AuctionConfig, clock: C) -> Result<Self, AuctionError> {
        Ok(Self::from_auction(Auction::new(config, clock)?))
    }

    /// Wraps an existing auction. Events it queued before this call are
    /// discarded.
    pub fn from_auction(mut auction: Auction<C>) -> Self {
        auction.drain_events();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(auction)),
            event_tx,
        }
    }

    /// Receives every event committed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AuctionEvent> {
        self.event_tx.subscribe()
    }

    pub fn place_bid(
        &self,
        sender: &Address,
        deposit: Amount,
        commitment: Commitment,
    ) -> Result<usize, AuctionError> {
        self.exclusive(|auction| auction.place_bid(sender, deposit, commitment))
    }

    pub fn reveal(
        &self,
        sender: &Address,
        amounts: &[Amount],
        fake: &[bool],
    ) -> Result<RevealReport, AuctionError> {
        self.exclusive(|auction| auction.reveal(sender, amounts, fake))
    }

    pub fn withdraw<P: Payout + ?Sized>(
        &self,
        sender: &Address,
        payout: &mut P,
    ) -> Result<Amount, AuctionError> {
        self.exclusive(|auction| auction.withdraw(sender, payout))
    }

    pub fn auction_end<P: Payout + ?Sized>(&self, payout: &mut P) -> Result<Settlement, AuctionError> {
        self.exclusive(|auction| auction.auction_end(payout))
    }

    /// Runs a read-only query under the lock.
    pub fn read<T>(&self, query: impl FnOnce(&Auction<C>) -> T) -> T {
        let auction = self.inner.lock();
        query(&*auction)
    }

    pub fn snapshot(&self) -> AuctionSnapshot {
        self.read(|auction| auction.snapshot())
    }

    pub fn phase(&self) -> Phase {
        self.read(|auction| auction.phase())
    }

    fn exclusive<T>(
        &self,
        op: impl FnOnce(&mut Auction<C>) -> Result<T, AuctionError>,
    ) -> Result<T, AuctionError> {
        let mut auction = self.inner.lock();
        let result = op(&mut *auction);
        for event in auction.drain_events() {
            tracing::trace!(%event, "publishing auction event");
            // No subscribers is not an error.
            let _ = self.event_tx.send(event);
        }
        result
    }
}
