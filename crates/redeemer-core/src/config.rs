use serde::{Deserialize, Serialize};

use crate::constants::CONFIG_VERSION;
use crate::error::RedeemerError;
use crate::math;
use crate::types::{AccountId, Amount, AssetId, ProgramId, Timestamp};

// ── InitializeParams ─────────────────────────────────────────────────────────

/// Caller-supplied parameters of the one-time `initialize` operation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InitializeParams {
    pub admin: AccountId,
    pub upgrade_authority: AccountId,
    pub legacy_asset: AssetId,
    pub successor_asset: AssetId,
    /// e.g. 1 …
    pub ratio_numerator: u64,
    /// … and 10 → ten legacy units per successor unit.
    pub ratio_denominator: u64,
    pub total_cap: Amount,
    pub migration_cap: Amount,
    pub treasury_amount: Amount,
    pub liquidity_amount: Amount,
    pub contributors_amount: Amount,
    /// Owner of the successor account that receives the treasury allocation.
    pub treasury_owner: AccountId,
    /// Owner of the successor account that receives the contributors allocation.
    pub contributors_owner: AccountId,
    pub start_ts: Timestamp,
    pub end_ts: Timestamp,
}

impl InitializeParams {
    /// Pure parameter checks, in the order their errors are reported.
    pub fn validate(&self) -> Result<(), RedeemerError> {
        if self.ratio_numerator == 0 || self.ratio_denominator == 0 {
            return Err(RedeemerError::InvalidRatio);
        }
        if self.migration_cap > self.total_cap {
            return Err(RedeemerError::InvalidCap);
        }
        let got = self.migration_cap as u128
            + self.treasury_amount as u128
            + self.liquidity_amount as u128
            + self.contributors_amount as u128;
        if got != self.total_cap as u128 {
            return Err(RedeemerError::InvalidAllocationSum {
                expected: self.total_cap as u128,
                got,
            });
        }
        validate_window(self.start_ts, self.end_ts)?;
        if self.legacy_asset == self.successor_asset {
            return Err(RedeemerError::InvalidAsset);
        }
        Ok(())
    }
}

pub fn validate_window(start: Timestamp, end: Timestamp) -> Result<(), RedeemerError> {
    if start >= end {
        return Err(RedeemerError::InvalidWindow { start, end });
    }
    Ok(())
}

// ── MigrationConfig ──────────────────────────────────────────────────────────

/// The single authoritative record of one migration, keyed by successor asset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MigrationConfig {
    pub version: u16,
    /// Protocol version that owns this record and its capability accounts.
    pub program_id: ProgramId,
    pub admin: AccountId,
    pub upgrade_authority: AccountId,
    pub legacy_asset: AssetId,
    pub successor_asset: AssetId,
    pub legacy_decimals: u8,
    pub successor_decimals: u8,
    pub ratio_numerator: u64,
    pub ratio_denominator: u64,
    pub total_cap: Amount,
    pub migration_cap: Amount,
    pub treasury_amount: Amount,
    pub liquidity_amount: Amount,
    pub contributors_amount: Amount,
    pub start_ts: Timestamp,
    pub end_ts: Timestamp,
    pub paused: bool,
    pub finalized: bool,
    pub cumulative_redeemed_legacy: u128,
    pub cumulative_minted_successor: Amount,

    // ── Governance ───────────────────────────────────────────────────────────
    pub upgrade_pending: bool,
    pub upgrade_target: Option<ProgramId>,
    pub upgrade_timelock: Timestamp,
    /// Set once an upgrade executes; minting through this version is retired.
    #[serde(default)]
    pub superseded_by: Option<ProgramId>,

    pub created_at: Timestamp,
}

impl MigrationConfig {
    pub fn new(
        program_id: ProgramId,
        params: &InitializeParams,
        legacy_decimals: u8,
        successor_decimals: u8,
        now: Timestamp,
    ) -> Self {
        Self {
            version: CONFIG_VERSION,
            program_id,
            admin: params.admin.clone(),
            upgrade_authority: params.upgrade_authority.clone(),
            legacy_asset: params.legacy_asset.clone(),
            successor_asset: params.successor_asset.clone(),
            legacy_decimals,
            successor_decimals,
            ratio_numerator: params.ratio_numerator,
            ratio_denominator: params.ratio_denominator,
            total_cap: params.total_cap,
            migration_cap: params.migration_cap,
            treasury_amount: params.treasury_amount,
            liquidity_amount: params.liquidity_amount,
            contributors_amount: params.contributors_amount,
            start_ts: params.start_ts,
            end_ts: params.end_ts,
            paused: false,
            finalized: false,
            cumulative_redeemed_legacy: 0,
            cumulative_minted_successor: 0,
            upgrade_pending: false,
            upgrade_target: None,
            upgrade_timelock: 0,
            superseded_by: None,
            created_at: now,
        }
    }

    /// Successor units still mintable through redemption.
    pub fn remaining_cap(&self) -> Amount {
        self.migration_cap.saturating_sub(self.cumulative_minted_successor)
    }

    pub fn window_open(&self, now: Timestamp) -> bool {
        self.start_ts <= now && now <= self.end_ts
    }

    /// Successor units produced by redeeming `legacy_in` under this record.
    pub fn convert(&self, legacy_in: Amount) -> Result<Amount, RedeemerError> {
        math::convert(
            legacy_in,
            self.ratio_numerator,
            self.ratio_denominator,
            self.legacy_decimals,
            self.successor_decimals,
        )
    }

    /// The gating checks of `redeem`, in their observable order. Balance and
    /// cap checks need ledger state and live in the engine.
    pub fn check_redeemable(&self, legacy_in: Amount, now: Timestamp) -> Result<(), RedeemerError> {
        if self.finalized {
            return Err(RedeemerError::AlreadyFinalized);
        }
        if self.superseded_by.is_some() {
            return Err(RedeemerError::MintAuthorityRetired);
        }
        if self.paused {
            return Err(RedeemerError::MigrationPaused);
        }
        if !self.window_open(now) {
            return Err(RedeemerError::OutsideWindow {
                now,
                start: self.start_ts,
                end: self.end_ts,
            });
        }
        if legacy_in == 0 {
            return Err(RedeemerError::ZeroAmount);
        }
        Ok(())
    }

    /// Record a successful redemption. Both counters move together or not at all.
    pub fn record_redemption(&mut self, legacy_in: Amount, successor_out: Amount) -> Result<(), RedeemerError> {
        let minted = self
            .cumulative_minted_successor
            .checked_add(successor_out)
            .ok_or(RedeemerError::MathOverflow)?;
        if minted > self.migration_cap {
            return Err(RedeemerError::CapExceeded {
                requested: successor_out,
                remaining: self.remaining_cap(),
            });
        }
        let redeemed = self
            .cumulative_redeemed_legacy
            .checked_add(legacy_in as u128)
            .ok_or(RedeemerError::MathOverflow)?;
        self.cumulative_minted_successor = minted;
        self.cumulative_redeemed_legacy = redeemed;
        Ok(())
    }

    pub fn require_admin(&self, caller: &AccountId) -> Result<(), RedeemerError> {
        if *caller != self.admin {
            return Err(RedeemerError::Unauthorized);
        }
        Ok(())
    }

    pub fn require_upgrade_authority(&self, caller: &AccountId) -> Result<(), RedeemerError> {
        if *caller != self.upgrade_authority {
            return Err(RedeemerError::Unauthorized);
        }
        Ok(())
    }

    /// Invariants that must hold after every committed mutation.
    pub fn check_invariants(&self) -> Result<(), RedeemerError> {
        if self.ratio_numerator == 0 || self.ratio_denominator == 0 {
            return Err(RedeemerError::InvalidRatio);
        }
        if self.cumulative_minted_successor > self.migration_cap {
            return Err(RedeemerError::CapExceeded {
                requested: self.cumulative_minted_successor,
                remaining: 0,
            });
        }
        if self.upgrade_pending && self.upgrade_target.is_none() {
            return Err(RedeemerError::NoUpgradePending);
        }
        Ok(())
    }
}
