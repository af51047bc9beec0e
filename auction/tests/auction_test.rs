//! Integration tests for the sealed-bid auction.
//!
//! Each test builds its own auction on a hand-cranked clock and moves time
//! forward explicitly, the way a bidder would experience the windows. Bid
//! values are written in whole units and converted with `parse_units`.

use sealed_auction::commitment::blind;
use sealed_auction::units::parse_units;
use sealed_auction::{
    Address, Amount, Auction, AuctionConfig, AuctionError, AuctionEvent, Clock, Ledger,
    ManualClock, Phase,
};

/// Seconds into a window used when a test wants to be "inside" it.
const TIME_IN: u64 = 10;

fn units(s: &str) -> Amount {
    parse_units(s).unwrap()
}

struct Fixture {
    auction: Auction<ManualClock>,
    clock: ManualClock,
    beneficiary: Address,
    alice: Address,
    bob: Address,
    ledger: Ledger,
}

/// 60 s bidding, 60 s reveal.
fn deploy() -> Fixture {
    let clock = ManualClock::new(1_700_000_000);
    let beneficiary = Address::new("0xbeneficiary");
    let auction = Auction::new(AuctionConfig::new(beneficiary.clone()), clock.clone()).unwrap();
    Fixture {
        auction,
        clock,
        beneficiary,
        alice: Address::new("0xa11ce"),
        bob: Address::new("0xb0b"),
        ledger: Ledger::new(),
    }
}

impl Fixture {
    fn into_reveal(&self) {
        self.clock.increase_to(self.auction.bidding_end() + TIME_IN);
    }

    fn after_reveal(&self) {
        self.clock.increase_to(self.auction.reveal_end() + TIME_IN);
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn constructor_sets_windows_and_beneficiary() {
    let f = deploy();
    assert_eq!(f.auction.bidding_end(), f.clock.now() + 60);
    assert_eq!(f.auction.reveal_end(), f.auction.bidding_end() + 60);
    assert_eq!(f.auction.beneficiary(), &f.beneficiary);
    assert_eq!(f.auction.highest_bid(), 0);
    assert_eq!(f.auction.highest_bidder(), None);
    assert!(!f.auction.ended());
}

// ---------------------------------------------------------------------------
// Bidding
// ---------------------------------------------------------------------------

#[test]
fn bid_is_stored_with_commitment_and_deposit() {
    let mut f = deploy();
    let sealed = blind(units("5"), false);
    f.auction.place_bid(&f.alice, units("5"), sealed).unwrap();

    let stored = f.auction.bid(&f.alice, 0).unwrap();
    assert_eq!(stored.commitment, sealed);
    assert_eq!(stored.deposit, units("5"));
}

#[test]
fn bid_after_bidding_end_fails_without_side_effects() {
    let mut f = deploy();
    f.clock.increase_to(f.auction.bidding_end());

    let err = f
        .auction
        .place_bid(&f.alice, units("5"), blind(units("5"), false))
        .unwrap_err();
    assert!(matches!(err, AuctionError::TooLate { .. }));
    assert!(f.auction.bids(&f.alice).is_empty());
    assert_eq!(f.auction.custody(), 0);
}

// ---------------------------------------------------------------------------
// Reveal
// ---------------------------------------------------------------------------

#[test]
fn reveal_before_bidding_end_is_too_early() {
    let mut f = deploy();
    f.auction
        .place_bid(&f.alice, units("5"), blind(units("5"), false))
        .unwrap();

    let err = f.auction.reveal(&f.alice, &[units("5")], &[false]).unwrap_err();
    assert_eq!(
        err,
        AuctionError::TooEarly {
            not_before: f.auction.bidding_end()
        }
    );
}

#[test]
fn reveal_after_reveal_end_is_too_late() {
    let mut f = deploy();
    f.auction
        .place_bid(&f.alice, units("5"), blind(units("5"), false))
        .unwrap();
    f.clock.increase_to(f.auction.reveal_end());

    let err = f.auction.reveal(&f.alice, &[units("5")], &[false]).unwrap_err();
    assert_eq!(
        err,
        AuctionError::TooLate {
            deadline: f.auction.reveal_end()
        }
    );
}

#[test]
fn revealed_commitment_is_cleared() {
    let mut f = deploy();
    f.auction
        .place_bid(&f.alice, units("5"), blind(units("5"), false))
        .unwrap();
    f.into_reveal();

    f.auction.reveal(&f.alice, &[units("5")], &[false]).unwrap();
    assert!(f.auction.bid(&f.alice, 0).unwrap().commitment.is_empty());

    let again = f.auction.reveal(&f.alice, &[units("5")], &[false]).unwrap();
    assert_eq!(again.refund, 0);
}

#[test]
fn sole_bidder_excess_is_credited_at_reveal() {
    let mut f = deploy();
    f.auction
        .place_bid(&f.alice, units("8"), blind(units("5"), false))
        .unwrap();
    f.into_reveal();

    f.auction.reveal(&f.alice, &[units("5")], &[false]).unwrap();
    // Credited before any withdraw call.
    assert_eq!(f.auction.pending_return(&f.alice), units("3"));
    assert_eq!(f.ledger.balance(&f.alice), 0);
}

// ---------------------------------------------------------------------------
// Withdraw
// ---------------------------------------------------------------------------

#[test]
fn two_bidder_scenario() {
    let mut f = deploy();
    f.auction
        .place_bid(&f.alice, units("8"), blind(units("5"), false))
        .unwrap();
    f.auction
        .place_bid(&f.bob, units("7"), blind(units("7"), false))
        .unwrap();
    f.into_reveal();

    f.auction.reveal(&f.alice, &[units("5")], &[false]).unwrap();
    f.auction.reveal(&f.bob, &[units("7")], &[false]).unwrap();

    assert_eq!(f.auction.highest_bid(), units("7"));
    assert_eq!(f.auction.highest_bidder(), Some(&f.bob));
    assert_eq!(f.auction.pending_return(&f.alice), units("8"));
    assert_eq!(f.auction.pending_return(&f.bob), 0);

    assert_eq!(f.auction.withdraw(&f.alice, &mut f.ledger).unwrap(), units("8"));
    assert_eq!(f.auction.withdraw(&f.bob, &mut f.ledger).unwrap(), 0);
    assert_eq!(f.ledger.balance(&f.alice), units("8"));
    assert_eq!(f.ledger.balance(&f.bob), 0);

    f.after_reveal();
    let settlement = f.auction.auction_end(&mut f.ledger).unwrap();
    assert_eq!(settlement.winner.as_ref(), Some(&f.bob));
    assert_eq!(f.ledger.balance(&f.beneficiary), units("7"));

    let ended = f
        .auction
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, AuctionEvent::AuctionEnded { .. }))
        .collect::<Vec<_>>();
    assert_eq!(
        ended,
        vec![AuctionEvent::AuctionEnded {
            winner: Some(f.bob.clone()),
            amount: units("7"),
        }]
    );
}

#[test]
fn reveal_order_does_not_change_refunds() {
    // Same bids as the two-bidder scenario, revealed in the opposite order.
    let mut f = deploy();
    f.auction
        .place_bid(&f.alice, units("8"), blind(units("5"), false))
        .unwrap();
    f.auction
        .place_bid(&f.bob, units("7"), blind(units("7"), false))
        .unwrap();
    f.into_reveal();

    f.auction.reveal(&f.bob, &[units("7")], &[false]).unwrap();
    f.auction.reveal(&f.alice, &[units("5")], &[false]).unwrap();

    assert_eq!(f.auction.highest_bidder(), Some(&f.bob));
    assert_eq!(f.auction.pending_return(&f.alice), units("8"));
    assert_eq!(f.auction.pending_return(&f.bob), 0);
}

#[test]
fn second_withdraw_pays_nothing() {
    let mut f = deploy();
    f.auction
        .place_bid(&f.alice, units("8"), blind(units("5"), false))
        .unwrap();
    f.into_reveal();
    f.auction.reveal(&f.alice, &[units("5")], &[false]).unwrap();

    assert_eq!(f.auction.withdraw(&f.alice, &mut f.ledger).unwrap(), units("3"));
    assert_eq!(f.auction.withdraw(&f.alice, &mut f.ledger).unwrap(), 0);
    assert_eq!(f.ledger.balance(&f.alice), units("3"));
}

#[test]
fn withdraw_works_after_auction_end() {
    let mut f = deploy();
    f.auction
        .place_bid(&f.alice, units("8"), blind(units("5"), false))
        .unwrap();
    f.into_reveal();
    f.auction.reveal(&f.alice, &[units("5")], &[false]).unwrap();
    f.after_reveal();
    f.auction.auction_end(&mut f.ledger).unwrap();

    assert_eq!(f.auction.withdraw(&f.alice, &mut f.ledger).unwrap(), units("3"));
    assert_eq!(f.auction.custody(), 0);
}

// ---------------------------------------------------------------------------
// Auction end
// ---------------------------------------------------------------------------

#[test]
fn auction_end_before_reveal_end_is_too_early() {
    let mut f = deploy();
    let err = f.auction.auction_end(&mut f.ledger).unwrap_err();
    assert!(matches!(err, AuctionError::TooEarly { .. }));
}

#[test]
fn auction_end_succeeds_once() {
    let mut f = deploy();
    f.clock.increase_to(f.auction.reveal_end());

    assert!(f.auction.auction_end(&mut f.ledger).is_ok());
    assert_eq!(f.auction.phase(), Phase::Ended);
    assert_eq!(
        f.auction.auction_end(&mut f.ledger).unwrap_err(),
        AuctionError::AuctionEndAlreadyCalled
    );
}

#[test]
fn beneficiary_receives_winning_bid() {
    let mut f = deploy();
    f.auction
        .place_bid(&f.alice, units("5"), blind(units("5"), false))
        .unwrap();
    f.into_reveal();
    f.auction.reveal(&f.alice, &[units("5")], &[false]).unwrap();
    f.after_reveal();

    let settlement = f.auction.auction_end(&mut f.ledger).unwrap();
    assert_eq!(settlement.winner.as_ref(), Some(&f.alice));
    assert_eq!(settlement.amount, units("5"));
    assert_eq!(f.ledger.balance(&f.beneficiary), units("5"));
}

// ---------------------------------------------------------------------------
// Conservation of value
// ---------------------------------------------------------------------------

#[test]
fn value_is_neither_created_nor_destroyed() {
    let mut f = deploy();
    let carol = Address::new("0xca401");

    // alice: one real bid, one decoy. bob: one real bid, one underfunded.
    // carol: commits and then reveals the wrong values.
    let bids: [(&Address, &str, &str, bool); 5] = [
        (&f.alice, "10", "6", false),
        (&f.alice, "1", "0.5", true),
        (&f.bob, "9", "9", false),
        (&f.bob, "2", "4", false),
        (&carol, "3", "3", false),
    ];
    let mut deposited: Amount = 0;
    for (bidder, deposit, value, fake) in bids {
        f.auction
            .place_bid(bidder, units(deposit), blind(units(value), fake))
            .unwrap();
        deposited += units(deposit);
    }
    f.into_reveal();

    f.auction
        .reveal(&f.alice, &[units("6"), units("0.5")], &[false, true])
        .unwrap();
    f.auction
        .reveal(&f.bob, &[units("9"), units("4")], &[false, false])
        .unwrap();
    f.auction.reveal(&carol, &[units("2")], &[false]).unwrap();

    let pending: Amount = [&f.alice, &f.bob, &carol]
        .iter()
        .map(|a| f.auction.pending_return(a))
        .sum();
    assert_eq!(
        f.auction.custody(),
        pending + f.auction.highest_bid() + f.auction.unrevealed_deposits()
    );
    assert_eq!(f.auction.custody(), deposited);

    // alice: 10 + 1 back (outbid, decoy). bob: 9 - 9 + 2 (leading, underfunded).
    assert_eq!(f.auction.pending_return(&f.alice), units("11"));
    assert_eq!(f.auction.pending_return(&f.bob), units("2"));
    assert_eq!(f.auction.pending_return(&carol), 0);
    assert_eq!(f.auction.unrevealed_deposits(), units("3"));

    f.after_reveal();
    f.auction.auction_end(&mut f.ledger).unwrap();
    for bidder in [&f.alice, &f.bob, &carol] {
        f.auction.withdraw(bidder, &mut f.ledger).unwrap();
    }

    let paid_out = f.ledger.total().unwrap();
    assert_eq!(paid_out + f.auction.custody(), deposited);
    // Only carol's mismatched deposit stays behind.
    assert_eq!(f.auction.custody(), units("3"));
}
