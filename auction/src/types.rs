//! Primitive types shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value in base units (the smallest denomination, 10^-18 of a whole unit).
///
/// `u128` comfortably holds every realistic auction amount; all arithmetic
/// on it is checked.
pub type Amount = u128;

/// Seconds since the UNIX epoch.
pub type Timestamp = u64;

/// Identity of a participant: bidder, beneficiary, or withdrawal recipient.
///
/// The engine treats addresses as opaque strings. It never parses them, it
/// only compares them.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wraps an address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty address, which is never a valid
    /// beneficiary.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::str::FromStr for Address {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_address_is_empty() {
        assert!(Address::new("").is_empty());
        assert!(Address::new("   ").is_empty());
        assert!(!Address::new("0xbeef").is_empty());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Address::from("alice")).unwrap();
        assert_eq!(json, "\"alice\"");
    }
}
