pub mod derive;
pub mod hash;
pub mod signature;

pub use derive::{
    config_address, derive_address, liquidity_vault_address, mint_authority_address,
    upgrade_escrow_address, Namespace,
};
pub use hash::{account_id_from_pubkey, asset_id_from_label, blake3_hash};
pub use signature::{sign, verify_request, verify_signature, KeyPair};
