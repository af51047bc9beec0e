//! # Bid Commitments
//!
//! A commitment is `Keccak-256(amount || fake)` where `amount` is the bid in
//! base units as a 256-bit big-endian word and `fake` is a single byte
//! (`0x01` or `0x00`). That is the packed encoding of `(uint256, bool)`, so a
//! commitment computed by any tool following that convention matches ours.
//!
//! There is no secret nonce in the preimage. Anyone holding a commitment can
//! enumerate plausible amounts and recover the bid before it is revealed.
//! Bidders who care should hide behind fake bids and oversized deposits.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use thiserror::Error;

use crate::config::{COMMITMENT_AMOUNT_WIDTH, COMMITMENT_LENGTH};
use crate::types::Amount;

/// A sealed bid: 32 opaque bytes.
///
/// The all-zero value is reserved as [`Commitment::EMPTY`], the marker the
/// engine writes into a bid slot once it has been revealed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Commitment([u8; COMMITMENT_LENGTH]);

/// Failure to parse a hex-encoded commitment.
#[derive(Debug, Error)]
pub enum CommitmentParseError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("expected 32 bytes, got {0}")]
    Length(usize),
}

impl Commitment {
    /// The consumed-slot sentinel.
    pub const EMPTY: Commitment = Commitment([0u8; COMMITMENT_LENGTH]);

    /// Wraps raw bytes.
    pub fn from_bytes(bytes: [u8; COMMITMENT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; COMMITMENT_LENGTH] {
        &self.0
    }

    /// Returns `true` for the consumed-slot sentinel.
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parses hex, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CommitmentParseError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed)?;
        if bytes.len() != COMMITMENT_LENGTH {
            return Err(CommitmentParseError::Length(bytes.len()));
        }
        let mut arr = [0u8; COMMITMENT_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({}...)", &self.to_hex()[..14])
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for Commitment {
    type Err = CommitmentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// JSON carries commitments as hex strings, not 32-element arrays.
impl Serialize for Commitment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Commitment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Builds the commitment preimage: 32-byte big-endian amount, then the flag.
pub fn encode_packed(amount: Amount, fake: bool) -> [u8; COMMITMENT_AMOUNT_WIDTH + 1] {
    let mut preimage = [0u8; COMMITMENT_AMOUNT_WIDTH + 1];
    let amount_bytes = amount.to_be_bytes();
    let offset = COMMITMENT_AMOUNT_WIDTH - amount_bytes.len();
    preimage[offset..COMMITMENT_AMOUNT_WIDTH].copy_from_slice(&amount_bytes);
    preimage[COMMITMENT_AMOUNT_WIDTH] = u8::from(fake);
    preimage
}

/// Seals a bid.
///
/// Deterministic: the same `(amount, fake)` always yields the same
/// commitment, for every caller.
///
/// # Example
///
/// ```
/// use sealed_auction::commitment::blind;
///
/// let sealed = blind(5, false);
/// assert_eq!(sealed, blind(5, false));
/// assert_ne!(sealed, blind(5, true));
/// ```
pub fn blind(amount: Amount, fake: bool) -> Commitment {
    let digest = Keccak256::digest(encode_packed(amount, fake));
    let mut out = [0u8; COMMITMENT_LENGTH];
    out.copy_from_slice(&digest);
    Commitment(out)
}
