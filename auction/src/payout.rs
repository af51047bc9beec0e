//! # Payouts
//!
//! Every value the auction sends out (withdrawn refunds and the final
//! payment to the beneficiary) goes through a [`Payout`] sink. The engine
//! decides *what* to pay; the sink decides what "paying" means: crediting a
//! wallet, queueing a bank transfer, or recording the amount in a test.
//!
//! [`Ledger`] is the in-memory sink: a per-address balance sheet with
//! checked credits and debits.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::types::{Address, Amount};

/// Errors raised by a payout sink or a [`Ledger`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayoutError {
    /// The recipient's balance would overflow.
    #[error("balance overflow: {address} holds {current}, credit of {credit} does not fit")]
    Overflow {
        /// Recipient address.
        address: Address,
        /// Balance before the credit.
        current: Amount,
        /// Amount being credited.
        credit: Amount,
    },

    /// A debit exceeded the available balance.
    #[error("insufficient balance: {address} holds {balance}, tried to debit {amount}")]
    InsufficientBalance {
        /// Account being debited.
        address: Address,
        /// Balance available.
        balance: Amount,
        /// Amount requested.
        amount: Amount,
    },

    /// The sink refused the transfer for its own reasons.
    #[error("transfer to {address} rejected: {reason}")]
    Rejected {
        /// Intended recipient.
        address: Address,
        /// Sink-specific explanation.
        reason: String,
    },
}

/// Destination of outgoing transfers.
pub trait Payout {
    /// Sends `amount` to `to`. An error aborts the calling auction operation,
    /// which then rolls back every change it made.
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), PayoutError>;
}

impl<P: Payout + ?Sized> Payout for &mut P {
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), PayoutError> {
        (**self).transfer(to, amount)
    }
}

/// In-memory balance sheet.
///
/// Absent addresses have a zero balance; zero balances are kept once an
/// address has been touched so a report lists everyone who took part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    balances: BTreeMap<Address, Amount>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance of `address`.
    pub fn balance(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Adds `amount` to `address`, returning the new balance.
    pub fn credit(&mut self, address: &Address, amount: Amount) -> Result<Amount, PayoutError> {
        let entry = self.balances.entry(address.clone()).or_insert(0);
        let updated = entry.checked_add(amount).ok_or_else(|| PayoutError::Overflow {
            address: address.clone(),
            current: *entry,
            credit: amount,
        })?;
        *entry = updated;
        Ok(updated)
    }

    /// Removes `amount` from `address`, returning the new balance.
    pub fn debit(&mut self, address: &Address, amount: Amount) -> Result<Amount, PayoutError> {
        let balance = self.balance(address);
        let updated = balance
            .checked_sub(amount)
            .ok_or_else(|| PayoutError::InsufficientBalance {
                address: address.clone(),
                balance,
                amount,
            })?;
        self.balances.insert(address.clone(), updated);
        Ok(updated)
    }

    /// Every touched address with its balance, in address order.
    pub fn balances(&self) -> impl Iterator<Item = (&Address, Amount)> {
        self.balances.iter().map(|(a, b)| (a, *b))
    }

    /// Sum of all balances, or `None` if it overflows.
    pub fn total(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(0u128, |acc, b| acc.checked_add(*b))
    }
}

impl Payout for Ledger {
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), PayoutError> {
        self.credit(to, amount).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    #[test]
    fn credit_accumulates() {
        let mut ledger = Ledger::new();
        ledger.credit(&addr("a"), 5).unwrap();
        assert_eq!(ledger.credit(&addr("a"), 3).unwrap(), 8);
        assert_eq!(ledger.balance(&addr("a")), 8);
    }

    #[test]
    fn credit_overflow_rejected_without_change() {
        let mut ledger = Ledger::new();
        ledger.credit(&addr("a"), u128::MAX).unwrap();
        let err = ledger.credit(&addr("a"), 1).unwrap_err();
        assert!(matches!(err, PayoutError::Overflow { credit: 1, .. }));
        assert_eq!(ledger.balance(&addr("a")), u128::MAX);
    }

    #[test]
    fn debit_to_zero_keeps_entry() {
        let mut ledger = Ledger::new();
        ledger.credit(&addr("a"), 10).unwrap();
        assert_eq!(ledger.debit(&addr("a"), 10).unwrap(), 0);
        assert_eq!(ledger.balances().count(), 1);
    }

    #[test]
    fn debit_insufficient_rejected() {
        let mut ledger = Ledger::new();
        ledger.credit(&addr("a"), 2).unwrap();
        let err = ledger.debit(&addr("a"), 3).unwrap_err();
        assert_eq!(
            err,
            PayoutError::InsufficientBalance {
                address: addr("a"),
                balance: 2,
                amount: 3,
            }
        );
    }

    #[test]
    fn transfer_credits_recipient() {
        let mut ledger = Ledger::new();
        ledger.transfer(&addr("bene"), 7).unwrap();
        assert_eq!(ledger.balance(&addr("bene")), 7);
        assert_eq!(ledger.total(), Some(7));
    }
}
