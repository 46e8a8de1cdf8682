use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RedeemerError;

/// Token amount in base units of either asset. Conversion math widens to u128.
pub type Amount = u64;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Monotonic position of an event in the global event log.
pub type EventSeq = u64;

fn decode_b58_32(s: &str) -> Result<[u8; 32], RedeemerError> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| RedeemerError::InvalidId(format!("{s}: {e}")))?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| RedeemerError::InvalidId(format!("{s}: expected 32 bytes, got {}", bytes.len())))
}

// ── AccountId ────────────────────────────────────────────────────────────────

/// 32-byte account identifier.
///
/// Externally owned accounts are BLAKE3(public_key); protocol-controlled
/// accounts come from the sub-account deriver in `redeemer-crypto`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Base-58 encoded string representation.
    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_b58(s: &str) -> Result<Self, RedeemerError> {
        decode_b58_32(s).map(Self)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.to_b58();
        write!(f, "AccountId({})", &s[..s.len().min(8)])
    }
}

/// A protocol version is addressed by the account id of its program.
pub type ProgramId = AccountId;

// ── AssetId ──────────────────────────────────────────────────────────────────

/// 32-byte fungible asset (mint) identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub [u8; 32]);

impl AssetId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_b58(s: &str) -> Result<Self, RedeemerError> {
        decode_b58_32(s).map(Self)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.to_b58();
        write!(f, "AssetId({})", &s[..s.len().min(8)])
    }
}

// ── Dilithium key material ───────────────────────────────────────────────────

/// Dilithium2 public key (1312 bytes).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DilithiumPublicKey(pub Vec<u8>);

impl fmt::Debug for DilithiumPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DilithiumPublicKey({}b)", self.0.len())
    }
}

/// Detached Dilithium2 signature (2420 bytes).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DilithiumSignature(pub Vec<u8>);

impl fmt::Debug for DilithiumSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DilithiumSignature({}b)", self.0.len())
    }
}

// ── Ledger records ───────────────────────────────────────────────────────────

/// Mint-level state of a fungible asset as held by the ledger.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AssetInfo {
    pub asset_id: AssetId,
    pub decimals: u8,
    pub supply: u128,
    /// `None` once minting has been permanently revoked.
    pub mint_authority: Option<AccountId>,
    pub freeze_authority: Option<AccountId>,
}

/// One owner's balance of one asset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenAccount {
    pub asset_id: AssetId,
    pub owner: AccountId,
    pub amount: Amount,
    pub frozen: bool,
}

impl TokenAccount {
    pub fn new(asset_id: AssetId, owner: AccountId) -> Self {
        Self { asset_id, owner, amount: 0, frozen: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn b58_round_trip_preserves_id() {
        let id = AccountId::from_bytes(rand::random());
        assert_eq!(AccountId::from_b58(&id.to_b58()).unwrap(), id);
    }

    #[test]
    fn short_b58_is_rejected_not_panicking() {
        let short = bs58::encode([7u8; 5]).into_string();
        assert!(matches!(AssetId::from_b58(&short), Err(RedeemerError::InvalidId(_))));
        assert!(matches!(AccountId::from_b58("0OIl"), Err(RedeemerError::InvalidId(_))));
    }
}
