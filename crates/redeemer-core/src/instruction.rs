use serde::{Deserialize, Serialize};

use crate::config::InitializeParams;
use crate::error::RedeemerError;
use crate::types::{
    AccountId, Amount, AssetId, DilithiumPublicKey, DilithiumSignature, ProgramId, Timestamp,
};

// ── Instruction ───────────────────────────────────────────────────────────────

/// Every state-changing operation against a configuration record is one of these.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Instruction {
    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Create the record, mint the fixed allocations. One time only.
    Initialize(InitializeParams),

    /// Permanently close the record to redemption and revoke minting.
    Finalize,

    // ── Redemption ───────────────────────────────────────────────────────────

    /// Burn `legacy_amount` from the caller, mint the converted amount back.
    Redeem {
        legacy_amount: Amount,
        min_successor_out: Amount,
    },

    // ── Administration ───────────────────────────────────────────────────────

    SetPause { paused: bool },

    UpdateWindow { start_ts: Timestamp, end_ts: Timestamp },

    /// Freeze or thaw `owner`'s successor-asset account (freeze authority).
    SetFrozen { owner: AccountId, frozen: bool },

    // ── Governance ───────────────────────────────────────────────────────────

    ProposeUpgrade { target: ProgramId, timelock_days: u32 },

    ExecuteUpgrade,

    CancelUpgrade,

    /// Move caller-held successor units to the proposed version's escrow.
    MigrateTokens { amount: Amount },

    /// Move protocol-held liquidity to the proposed version's vault.
    MigrateLiquidity { amount: Amount },
}

impl Instruction {
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::Initialize(_) => "initialize",
            Instruction::Finalize => "finalize",
            Instruction::Redeem { .. } => "redeem",
            Instruction::SetPause { .. } => "set_pause",
            Instruction::UpdateWindow { .. } => "update_window",
            Instruction::SetFrozen { .. } => "set_frozen",
            Instruction::ProposeUpgrade { .. } => "propose_upgrade",
            Instruction::ExecuteUpgrade => "execute_upgrade",
            Instruction::CancelUpgrade => "cancel_upgrade",
            Instruction::MigrateTokens { .. } => "migrate_tokens",
            Instruction::MigrateLiquidity { .. } => "migrate_liquidity",
        }
    }
}

// ── Request ───────────────────────────────────────────────────────────────────

/// An instruction on behalf of `caller`.
///
/// The engine trusts `caller` and only checks roles; anything arriving from
/// outside the process comes wrapped in a `SignedRequest`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub caller: AccountId,
    /// Key of the configuration record this request targets.
    pub successor_asset: AssetId,
    pub instruction: Instruction,
}

impl Request {
    /// Canonical bytes covered by the caller's signature (bincode).
    pub fn body_bytes(&self) -> Result<Vec<u8>, RedeemerError> {
        bincode::serialize(self).map_err(|e| RedeemerError::Serialization(e.to_string()))
    }
}

/// A request plus proof that `request.caller` authorized it.
///
/// Valid when `caller == BLAKE3(public_key)` and `signature` is a Dilithium2
/// signature over `request.body_bytes()` under `public_key`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SignedRequest {
    pub request: Request,
    pub public_key: DilithiumPublicKey,
    pub signature: DilithiumSignature,
}
