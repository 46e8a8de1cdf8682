use thiserror::Error;

use crate::types::{Amount, Timestamp};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RedeemerError {
    // ── Initialization ───────────────────────────────────────────────────────
    #[error("a configuration record already exists for this successor asset")]
    AlreadyInitialized,

    #[error("allocation sum mismatch: migration cap + fixed allocations = {got}, total cap = {expected}")]
    InvalidAllocationSum { expected: u128, got: u128 },

    #[error("invalid redemption window: start {start} must be before end {end}")]
    InvalidWindow { start: Timestamp, end: Timestamp },

    #[error("ratio numerator and denominator must both be positive")]
    InvalidRatio,

    #[error("migration cap exceeds total cap")]
    InvalidCap,

    #[error("legacy and successor asset must differ")]
    InvalidAsset,

    #[error("asset decimals {decimals} exceed the supported maximum of {max}")]
    InvalidDecimals { decimals: u8, max: u8 },

    #[error("successor mint authority is not the derived mint-authority account")]
    WrongMintAuthority,

    #[error("successor freeze authority is not the admin")]
    WrongFreezeAuthority,

    // ── Redemption gating ────────────────────────────────────────────────────
    #[error("migration is paused")]
    MigrationPaused,

    #[error("outside redemption window [{start}, {end}] at {now}")]
    OutsideWindow { now: Timestamp, start: Timestamp, end: Timestamp },

    #[error("migration already finalized")]
    AlreadyFinalized,

    #[error("mint authority has been handed to a newer protocol version")]
    MintAuthorityRetired,

    #[error("migration cap exceeded: requested {requested}, remaining {remaining}")]
    CapExceeded { requested: Amount, remaining: Amount },

    #[error("output {out} below caller minimum {min}")]
    SlippageExceeded { out: Amount, min: Amount },

    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: Amount, have: Amount },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("converted amount rounds down to zero")]
    DustTooSmall,

    #[error("arithmetic overflow")]
    MathOverflow,

    #[error("finalize called before the window closed or the cap was exhausted")]
    TooEarly,

    // ── Authorization ────────────────────────────────────────────────────────
    #[error("caller is not authorized for this operation")]
    Unauthorized,

    #[error("request signature does not verify")]
    InvalidSignature,

    // ── Governance ───────────────────────────────────────────────────────────
    #[error("no upgrade is pending")]
    NoUpgradePending,

    #[error("an upgrade is already pending")]
    UpgradeAlreadyPending,

    #[error("upgrade timelock not expired (executable at {unlock_at})")]
    TimelockNotExpired { unlock_at: Timestamp },

    #[error("timelock must be between 1 and {max} days, got {days}")]
    InvalidTimelock { days: u32, max: u32 },

    #[error("upgrade target must be a different protocol version")]
    InvalidUpgradeTarget,

    // ── Ledger ───────────────────────────────────────────────────────────────
    #[error("token account is frozen: {0}")]
    AccountFrozen(String),

    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    #[error("asset already exists: {0}")]
    AssetExists(String),

    #[error("no configuration record for successor asset {0}")]
    ConfigNotFound(String),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl RedeemerError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "AlreadyInitialized",
            Self::InvalidAllocationSum { .. } => "InvalidAllocationSum",
            Self::InvalidWindow { .. } => "InvalidWindow",
            Self::InvalidRatio => "InvalidRatio",
            Self::InvalidCap => "InvalidCap",
            Self::InvalidAsset => "InvalidAsset",
            Self::InvalidDecimals { .. } => "InvalidDecimals",
            Self::WrongMintAuthority => "WrongMintAuthority",
            Self::WrongFreezeAuthority => "WrongFreezeAuthority",
            Self::MigrationPaused => "MigrationPaused",
            Self::OutsideWindow { .. } => "OutsideWindow",
            Self::AlreadyFinalized => "AlreadyFinalized",
            Self::MintAuthorityRetired => "MintAuthorityRetired",
            Self::CapExceeded { .. } => "CapExceeded",
            Self::SlippageExceeded { .. } => "SlippageExceeded",
            Self::InsufficientBalance { .. } => "InsufficientBalance",
            Self::ZeroAmount => "ZeroAmount",
            Self::DustTooSmall => "DustTooSmall",
            Self::MathOverflow => "MathOverflow",
            Self::TooEarly => "TooEarly",
            Self::Unauthorized => "Unauthorized",
            Self::InvalidSignature => "InvalidSignature",
            Self::NoUpgradePending => "NoUpgradePending",
            Self::UpgradeAlreadyPending => "UpgradeAlreadyPending",
            Self::TimelockNotExpired { .. } => "TimelockNotExpired",
            Self::InvalidTimelock { .. } => "InvalidTimelock",
            Self::InvalidUpgradeTarget => "InvalidUpgradeTarget",
            Self::AccountFrozen(_) => "AccountFrozen",
            Self::UnknownAsset(_) => "UnknownAsset",
            Self::AssetExists(_) => "AssetExists",
            Self::ConfigNotFound(_) => "ConfigNotFound",
            Self::InvalidId(_) => "InvalidId",
            Self::Serialization(_) => "Serialization",
            Self::Storage(_) => "Storage",
        }
    }

    /// True for gating failures a caller can clear by simply retrying later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::MigrationPaused
                | Self::OutsideWindow { .. }
                | Self::TimelockNotExpired { .. }
                | Self::Storage(_)
        )
    }
}
