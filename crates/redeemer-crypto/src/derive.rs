//! Deterministic sub-account derivation.
//!
//! address = BLAKE3( DOMAIN ‖ program ‖ len(namespace) ‖ namespace ‖ successor_asset )
//!
//! The domain prefix keeps derived addresses disjoint from externally owned
//! ids (plain BLAKE3 of a public key): producing a key for a derived address
//! would need a BLAKE3 preimage. Acting *as* a derived address is only
//! possible through the engine's `ProgramSigner` capability.

use serde::{Deserialize, Serialize};

use redeemer_core::constants::{CONFIG_SEED, LIQUIDITY_SEED, MINT_AUTH_SEED, UPGRADE_ESCROW_SEED};
use redeemer_core::types::{AccountId, AssetId, ProgramId};

const DOMAIN: &[u8] = b"redeemer/derived-address/v1";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    Config,
    MintAuthority,
    Liquidity,
    UpgradeEscrow,
}

impl Namespace {
    pub fn seed(self) -> &'static [u8] {
        match self {
            Namespace::Config => CONFIG_SEED,
            Namespace::MintAuthority => MINT_AUTH_SEED,
            Namespace::Liquidity => LIQUIDITY_SEED,
            Namespace::UpgradeEscrow => UPGRADE_ESCROW_SEED,
        }
    }
}

/// Pure, collision-free mapping (program, namespace, successor asset) → address.
pub fn derive_address(program: &ProgramId, namespace: Namespace, successor: &AssetId) -> AccountId {
    let seed = namespace.seed();
    let mut hasher = blake3::Hasher::new();
    hasher.update(DOMAIN);
    hasher.update(program.as_bytes());
    hasher.update(&(seed.len() as u32).to_le_bytes());
    hasher.update(seed);
    hasher.update(successor.as_bytes());
    AccountId::from_bytes(*hasher.finalize().as_bytes())
}

pub fn config_address(program: &ProgramId, successor: &AssetId) -> AccountId {
    derive_address(program, Namespace::Config, successor)
}

pub fn mint_authority_address(program: &ProgramId, successor: &AssetId) -> AccountId {
    derive_address(program, Namespace::MintAuthority, successor)
}

pub fn liquidity_vault_address(program: &ProgramId, successor: &AssetId) -> AccountId {
    derive_address(program, Namespace::Liquidity, successor)
}

pub fn upgrade_escrow_address(program: &ProgramId, successor: &AssetId) -> AccountId {
    derive_address(program, Namespace::UpgradeEscrow, successor)
}
