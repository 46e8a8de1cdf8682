use redeemer_core::config::InitializeParams;
use redeemer_core::error::RedeemerError;
use redeemer_core::types::{AccountId, Amount, AssetId, Timestamp};
use redeemer_crypto::hash::asset_id_from_label;
use serde::{Deserialize, Serialize};

/// An asset created at deployment. Its id is derived from `label`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AssetSpec {
    pub label: String,
    pub decimals: u8,
}

impl AssetSpec {
    pub fn asset_id(&self) -> AssetId {
        asset_id_from_label(&self.label)
    }
}

/// Legacy balance credited to a holder before the window opens.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HolderSeed {
    /// Base-58 account id.
    pub owner: String,
    pub amount: Amount,
}

/// Everything needed to stand up one migration on a fresh store.
///
/// Account ids are base-58 strings so the file can be written by hand.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeploymentParams {
    pub legacy: AssetSpec,
    pub successor: AssetSpec,
    /// Mint authority of the legacy asset; seeds holder balances.
    pub legacy_mint_authority: String,
    pub admin: String,
    pub upgrade_authority: String,
    pub treasury_owner: String,
    pub contributors_owner: String,
    pub ratio_numerator: u64,
    pub ratio_denominator: u64,
    pub total_cap: Amount,
    pub migration_cap: Amount,
    pub treasury_amount: Amount,
    pub liquidity_amount: Amount,
    pub contributors_amount: Amount,
    pub start_ts: Timestamp,
    pub end_ts: Timestamp,
    #[serde(default)]
    pub holders: Vec<HolderSeed>,
}

impl DeploymentParams {
    pub fn from_json(s: &str) -> Result<Self, RedeemerError> {
        serde_json::from_str(s).map_err(|e| RedeemerError::Serialization(e.to_string()))
    }

    /// Development deployment: 1 successor per 10 legacy, 6 → 9 decimals,
    /// window opening at `now` and lasting 30 days.
    pub fn dev(now: Timestamp, admin: &AccountId, holders: &[AccountId]) -> Self {
        let unit = 1_000_000_000; // one successor token at 9 dp
        Self {
            legacy: AssetSpec { label: "legacy".into(), decimals: 6 },
            successor: AssetSpec { label: "successor".into(), decimals: 9 },
            legacy_mint_authority: admin.to_b58(),
            admin: admin.to_b58(),
            upgrade_authority: admin.to_b58(),
            treasury_owner: admin.to_b58(),
            contributors_owner: admin.to_b58(),
            ratio_numerator: 1,
            ratio_denominator: 10,
            total_cap: 1_000_000 * unit,
            migration_cap: 600_000 * unit,
            treasury_amount: 200_000 * unit,
            liquidity_amount: 100_000 * unit,
            contributors_amount: 100_000 * unit,
            start_ts: now,
            end_ts: now + 30 * redeemer_core::constants::SECONDS_PER_DAY,
            holders: holders
                .iter()
                .map(|h| HolderSeed { owner: h.to_b58(), amount: 1_000 * 1_000_000 })
                .collect(),
        }
    }

    pub fn legacy_mint_authority(&self) -> Result<AccountId, RedeemerError> {
        AccountId::from_b58(&self.legacy_mint_authority)
    }

    pub fn admin(&self) -> Result<AccountId, RedeemerError> {
        AccountId::from_b58(&self.admin)
    }

    pub fn holders(&self) -> Result<Vec<(AccountId, Amount)>, RedeemerError> {
        self.holders
            .iter()
            .map(|h| Ok((AccountId::from_b58(&h.owner)?, h.amount)))
            .collect()
    }

    pub fn initialize_params(&self) -> Result<InitializeParams, RedeemerError> {
        Ok(InitializeParams {
            admin: self.admin()?,
            upgrade_authority: AccountId::from_b58(&self.upgrade_authority)?,
            legacy_asset: self.legacy.asset_id(),
            successor_asset: self.successor.asset_id(),
            ratio_numerator: self.ratio_numerator,
            ratio_denominator: self.ratio_denominator,
            total_cap: self.total_cap,
            migration_cap: self.migration_cap,
            treasury_amount: self.treasury_amount,
            liquidity_amount: self.liquidity_amount,
            contributors_amount: self.contributors_amount,
            treasury_owner: AccountId::from_b58(&self.treasury_owner)?,
            contributors_owner: AccountId::from_b58(&self.contributors_owner)?,
            start_ts: self.start_ts,
            end_ts: self.end_ts,
        })
    }
}
