use redeemer_core::types::{AccountId, AssetId};

/// Compute BLAKE3 hash of arbitrary bytes → 32-byte array.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Derive an externally owned AccountId from raw public key bytes.
pub fn account_id_from_pubkey(pubkey_bytes: &[u8]) -> AccountId {
    AccountId::from_bytes(blake3_hash(pubkey_bytes))
}

/// Deterministic AssetId for a human-readable label (deployment tooling, tests).
pub fn asset_id_from_label(label: &str) -> AssetId {
    let mut input = b"redeemer/asset/".to_vec();
    input.extend_from_slice(label.as_bytes());
    AssetId::from_bytes(blake3_hash(&input))
}
