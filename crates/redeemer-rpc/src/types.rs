use redeemer_core::config::MigrationConfig;
use redeemer_core::event::{EventRecord, MigrationEvent};
use redeemer_observer::{MigrationStats, UpgradeRecord};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// JSON view of a configuration record returned by `redeemer_getConfig`.
/// Amounts are decimal strings; ids are base-58.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub version: u16,
    pub program_id: String,
    pub admin: String,
    pub upgrade_authority: String,
    pub legacy_asset: String,
    pub successor_asset: String,
    pub legacy_decimals: u8,
    pub successor_decimals: u8,
    pub ratio_numerator: u64,
    pub ratio_denominator: u64,
    pub total_cap: String,
    pub migration_cap: String,
    pub remaining_cap: String,
    pub treasury_amount: String,
    pub liquidity_amount: String,
    pub contributors_amount: String,
    pub start_ts: i64,
    pub end_ts: i64,
    pub paused: bool,
    pub finalized: bool,
    pub cumulative_redeemed_legacy: String,
    pub cumulative_minted_successor: String,
    pub upgrade_pending: bool,
    pub upgrade_target: Option<String>,
    pub upgrade_timelock: i64,
    pub superseded_by: Option<String>,
    pub created_at: i64,
}

impl From<&MigrationConfig> for RpcConfig {
    fn from(c: &MigrationConfig) -> Self {
        Self {
            version: c.version,
            program_id: c.program_id.to_b58(),
            admin: c.admin.to_b58(),
            upgrade_authority: c.upgrade_authority.to_b58(),
            legacy_asset: c.legacy_asset.to_b58(),
            successor_asset: c.successor_asset.to_b58(),
            legacy_decimals: c.legacy_decimals,
            successor_decimals: c.successor_decimals,
            ratio_numerator: c.ratio_numerator,
            ratio_denominator: c.ratio_denominator,
            total_cap: c.total_cap.to_string(),
            migration_cap: c.migration_cap.to_string(),
            remaining_cap: c.remaining_cap().to_string(),
            treasury_amount: c.treasury_amount.to_string(),
            liquidity_amount: c.liquidity_amount.to_string(),
            contributors_amount: c.contributors_amount.to_string(),
            start_ts: c.start_ts,
            end_ts: c.end_ts,
            paused: c.paused,
            finalized: c.finalized,
            cumulative_redeemed_legacy: c.cumulative_redeemed_legacy.to_string(),
            cumulative_minted_successor: c.cumulative_minted_successor.to_string(),
            upgrade_pending: c.upgrade_pending,
            upgrade_target: c.upgrade_target.as_ref().map(|t| t.to_b58()),
            upgrade_timelock: c.upgrade_timelock,
            superseded_by: c.superseded_by.as_ref().map(|t| t.to_b58()),
            created_at: c.created_at,
        }
    }
}

/// One entry of the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcEvent {
    pub seq: u64,
    pub schema_version: u16,
    pub successor_asset: String,
    pub at: i64,
    /// Event name, e.g. "Redeemed".
    pub kind: String,
    pub data: serde_json::Value,
}

impl From<&EventRecord> for RpcEvent {
    fn from(r: &EventRecord) -> Self {
        let (kind, data) = match &r.event {
            MigrationEvent::Initialized {
                admin,
                legacy_asset,
                successor_asset,
                total_cap,
                migration_cap,
                start_ts,
                end_ts,
            } => (
                "Initialized",
                json!({
                    "admin": admin.to_b58(),
                    "legacy_asset": legacy_asset.to_b58(),
                    "successor_asset": successor_asset.to_b58(),
                    "total_cap": total_cap.to_string(),
                    "migration_cap": migration_cap.to_string(),
                    "start_ts": start_ts,
                    "end_ts": end_ts,
                }),
            ),
            MigrationEvent::Redeemed { caller, legacy_amount_burned, successor_amount_minted } => (
                "Redeemed",
                json!({
                    "caller": caller.to_b58(),
                    "legacy_amount_burned": legacy_amount_burned.to_string(),
                    "successor_amount_minted": successor_amount_minted.to_string(),
                }),
            ),
            MigrationEvent::PauseSet { new_value } => ("PauseSet", json!({ "new_value": new_value })),
            MigrationEvent::WindowUpdated { new_start, new_end } => (
                "WindowUpdated",
                json!({ "new_start": new_start, "new_end": new_end }),
            ),
            MigrationEvent::Finalized => ("Finalized", json!({})),
            MigrationEvent::UpgradeProposed { target, executable_at } => (
                "UpgradeProposed",
                json!({ "target": target.to_b58(), "executable_at": executable_at }),
            ),
            MigrationEvent::UpgradeExecuted { target } => {
                ("UpgradeExecuted", json!({ "target": target.to_b58() }))
            }
            MigrationEvent::UpgradeCancelled { target } => {
                ("UpgradeCancelled", json!({ "target": target.to_b58() }))
            }
            MigrationEvent::TokensMigrated { holder, amount, target } => (
                "TokensMigrated",
                json!({
                    "holder": holder.to_b58(),
                    "amount": amount.to_string(),
                    "target": target.to_b58(),
                }),
            ),
            MigrationEvent::LiquidityMigrated { amount, target } => (
                "LiquidityMigrated",
                json!({ "amount": amount.to_string(), "target": target.to_b58() }),
            ),
            MigrationEvent::FreezeSet { owner, frozen } => (
                "FreezeSet",
                json!({ "owner": owner.to_b58(), "frozen": frozen }),
            ),
        };
        Self {
            seq: r.seq,
            schema_version: r.schema_version,
            successor_asset: r.successor_asset.to_b58(),
            at: r.at,
            kind: kind.to_string(),
            data,
        }
    }
}

/// Aggregates returned by `redeemer_getStats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcStats {
    pub redemptions: u64,
    pub unique_redeemers: u64,
    pub total_legacy_burned: String,
    pub total_successor_minted: String,
    /// "successor:legacy" in base units, reduced; null before any redemption.
    pub effective_ratio: Option<String>,
    pub paused: bool,
    pub window_start: Option<i64>,
    pub window_end: Option<i64>,
    pub finalized: bool,
    pub upgrades_proposed: u64,
    pub upgrades_executed: u64,
    pub upgrades_cancelled: u64,
    pub tokens_migrated: String,
    pub liquidity_migrated: String,
    pub last_seq: Option<u64>,
}

impl From<&MigrationStats> for RpcStats {
    fn from(s: &MigrationStats) -> Self {
        let count = |f: fn(&UpgradeRecord) -> bool| s.upgrades.iter().filter(|u| f(u)).count() as u64;
        Self {
            redemptions: s.redemptions,
            unique_redeemers: s.unique_redeemers,
            total_legacy_burned: s.total_legacy_burned.to_string(),
            total_successor_minted: s.total_successor_minted.to_string(),
            effective_ratio: s.effective_ratio().map(|(n, d)| format!("{n}:{d}")),
            paused: s.paused,
            window_start: s.window.map(|w| w.0),
            window_end: s.window.map(|w| w.1),
            finalized: s.finalized,
            upgrades_proposed: count(|u| matches!(u, UpgradeRecord::Proposed { .. })),
            upgrades_executed: count(|u| matches!(u, UpgradeRecord::Executed { .. })),
            upgrades_cancelled: count(|u| matches!(u, UpgradeRecord::Cancelled { .. })),
            tokens_migrated: s.tokens_migrated.to_string(),
            liquidity_migrated: s.liquidity_migrated.to_string(),
            last_seq: s.last_seq,
        }
    }
}

/// Node / protocol version information returned by `redeemer_getVersion`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcVersionInfo {
    pub node_version: String,
    pub program_id: String,
    pub config_version: u16,
    pub event_schema_version: u16,
    pub api_version: String,
}
