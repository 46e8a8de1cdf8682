use serde::{Deserialize, Serialize};

use crate::constants::EVENT_SCHEMA_VERSION;
use crate::types::{AccountId, Amount, AssetId, EventSeq, ProgramId, Timestamp};

/// Typed events emitted exactly once per successful operation, in commit order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum MigrationEvent {
    Initialized {
        admin: AccountId,
        legacy_asset: AssetId,
        successor_asset: AssetId,
        total_cap: Amount,
        migration_cap: Amount,
        start_ts: Timestamp,
        end_ts: Timestamp,
    },
    Redeemed {
        caller: AccountId,
        legacy_amount_burned: Amount,
        successor_amount_minted: Amount,
    },
    PauseSet {
        new_value: bool,
    },
    WindowUpdated {
        new_start: Timestamp,
        new_end: Timestamp,
    },
    Finalized,
    UpgradeProposed {
        target: ProgramId,
        executable_at: Timestamp,
    },
    UpgradeExecuted {
        target: ProgramId,
    },
    UpgradeCancelled {
        target: ProgramId,
    },
    TokensMigrated {
        holder: AccountId,
        amount: Amount,
        target: ProgramId,
    },
    LiquidityMigrated {
        amount: Amount,
        target: ProgramId,
    },
    FreezeSet {
        owner: AccountId,
        frozen: bool,
    },
}

/// Versioned envelope stored in the event log.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub schema_version: u16,
    /// Global position in the log; strictly increasing in commit order.
    pub seq: EventSeq,
    pub successor_asset: AssetId,
    pub at: Timestamp,
    pub event: MigrationEvent,
}

impl EventRecord {
    pub fn new(seq: EventSeq, successor_asset: AssetId, at: Timestamp, event: MigrationEvent) -> Self {
        Self {
            schema_version: EVENT_SCHEMA_VERSION,
            seq,
            successor_asset,
            at,
            event,
        }
    }
}
