use std::collections::BTreeSet;

use redeemer_core::constants::EVENT_SCHEMA_VERSION;
use redeemer_core::event::{EventRecord, MigrationEvent};
use redeemer_core::types::{AccountId, AssetId, EventSeq, ProgramId, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One governance transition seen in the log.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum UpgradeRecord {
    Proposed { target: ProgramId, executable_at: Timestamp, at: Timestamp },
    Executed { target: ProgramId, at: Timestamp },
    Cancelled { target: ProgramId, at: Timestamp },
}

/// Aggregate activity of one migration, rebuilt purely from its events.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MigrationStats {
    pub successor_asset: Option<AssetId>,
    pub redemptions: u64,
    pub unique_redeemers: u64,
    pub total_legacy_burned: u128,
    pub total_successor_minted: u128,
    pub paused: bool,
    pub window: Option<(Timestamp, Timestamp)>,
    pub finalized: bool,
    pub upgrades: Vec<UpgradeRecord>,
    pub tokens_migrated: u128,
    pub liquidity_migrated: u128,
    /// Highest sequence number folded in; resume replay from here + 1.
    pub last_seq: Option<EventSeq>,
    /// Persisted with the counters so a restored snapshot keeps deduplicating.
    redeemers: BTreeSet<AccountId>,
}

impl MigrationStats {
    /// Fold `events` for one successor asset, in log order.
    pub fn replay<'a, I>(successor: &AssetId, events: I) -> Self
    where
        I: IntoIterator<Item = &'a EventRecord>,
    {
        let mut stats = Self {
            successor_asset: Some(successor.clone()),
            ..Self::default()
        };
        for record in events {
            if &record.successor_asset == successor {
                stats.apply(record);
            }
        }
        stats
    }

    /// Fold one record. Records from a newer schema are skipped.
    pub fn apply(&mut self, record: &EventRecord) {
        if record.schema_version > EVENT_SCHEMA_VERSION {
            warn!(seq = record.seq, version = record.schema_version, "skipping event with unknown schema");
            return;
        }
        match &record.event {
            MigrationEvent::Initialized { start_ts, end_ts, .. } => {
                self.window = Some((*start_ts, *end_ts));
            }
            MigrationEvent::Redeemed { caller, legacy_amount_burned, successor_amount_minted } => {
                self.redemptions += 1;
                self.total_legacy_burned += *legacy_amount_burned as u128;
                self.total_successor_minted += *successor_amount_minted as u128;
                if self.redeemers.insert(caller.clone()) {
                    self.unique_redeemers += 1;
                }
            }
            MigrationEvent::PauseSet { new_value } => self.paused = *new_value,
            MigrationEvent::WindowUpdated { new_start, new_end } => {
                self.window = Some((*new_start, *new_end));
            }
            MigrationEvent::Finalized => self.finalized = true,
            MigrationEvent::UpgradeProposed { target, executable_at } => {
                self.upgrades.push(UpgradeRecord::Proposed {
                    target: target.clone(),
                    executable_at: *executable_at,
                    at: record.at,
                });
            }
            MigrationEvent::UpgradeExecuted { target } => {
                self.upgrades.push(UpgradeRecord::Executed { target: target.clone(), at: record.at });
            }
            MigrationEvent::UpgradeCancelled { target } => {
                self.upgrades.push(UpgradeRecord::Cancelled { target: target.clone(), at: record.at });
            }
            MigrationEvent::TokensMigrated { amount, .. } => self.tokens_migrated += *amount as u128,
            MigrationEvent::LiquidityMigrated { amount, .. } => self.liquidity_migrated += *amount as u128,
            MigrationEvent::FreezeSet { .. } => {}
        }
        self.last_seq = Some(record.seq);
    }

    /// Observed conversion as a reduced (successor, legacy) pair, in base units.
    pub fn effective_ratio(&self) -> Option<(u128, u128)> {
        if self.total_legacy_burned == 0 {
            return None;
        }
        let g = gcd(self.total_successor_minted, self.total_legacy_burned);
        Some((self.total_successor_minted / g, self.total_legacy_burned / g))
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}
