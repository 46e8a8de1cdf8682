use redeemer_core::config::MigrationConfig;
use redeemer_core::error::RedeemerError;
use redeemer_core::event::{EventRecord, MigrationEvent};
use redeemer_core::types::{AccountId, AssetId, AssetInfo, EventSeq, Timestamp, TokenAccount};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use std::path::Path;

use crate::ledger::StagedLedger;

const EVENT_SEQ_KEY: &[u8] = b"event_seq";

/// Persistent state database backed by sled.
///
/// Named trees:
///   configs   — successor AssetId bytes        → bincode(MigrationConfig)
///   assets    — AssetId bytes                  → bincode(AssetInfo)
///   balances  — AssetId bytes ‖ owner bytes    → bincode(TokenAccount)
///   events    — seq (u64 big-endian)           → bincode(EventRecord)
///   meta      — "event_seq"                    → next event seq (u64 big-endian)
pub struct StateDb {
    _db: sled::Db,
    configs: sled::Tree,
    assets: sled::Tree,
    balances: sled::Tree,
    events: sled::Tree,
    meta: sled::Tree,
}

fn storage(e: sled::Error) -> RedeemerError {
    RedeemerError::Storage(e.to_string())
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, RedeemerError> {
    bincode::deserialize(bytes).map_err(|e| RedeemerError::Serialization(e.to_string()))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, RedeemerError> {
    bincode::serialize(value).map_err(|e| RedeemerError::Serialization(e.to_string()))
}

fn balance_key(asset: &AssetId, owner: &AccountId) -> Vec<u8> {
    let mut key = Vec::with_capacity(64);
    key.extend_from_slice(asset.as_bytes());
    key.extend_from_slice(owner.as_bytes());
    key
}

fn seq_from_bytes(bytes: &[u8]) -> EventSeq {
    let mut arr = [0u8; 8];
    let n = bytes.len().min(8);
    arr[..n].copy_from_slice(&bytes[..n]);
    u64::from_be_bytes(arr)
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RedeemerError> {
        let db = sled::open(path).map_err(storage)?;
        Self::from_db(db)
    }

    /// In-memory database removed on drop. Used by tests and dry runs.
    pub fn open_temporary() -> Result<Self, RedeemerError> {
        let db = sled::Config::new().temporary(true).open().map_err(storage)?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, RedeemerError> {
        let configs  = db.open_tree("configs").map_err(storage)?;
        let assets   = db.open_tree("assets").map_err(storage)?;
        let balances = db.open_tree("balances").map_err(storage)?;
        let events   = db.open_tree("events").map_err(storage)?;
        let meta     = db.open_tree("meta").map_err(storage)?;
        Ok(Self { _db: db, configs, assets, balances, events, meta })
    }

    // ── Configuration records ────────────────────────────────────────────────

    pub fn get_config(&self, successor: &AssetId) -> Result<Option<MigrationConfig>, RedeemerError> {
        match self.configs.get(successor.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn config_exists(&self, successor: &AssetId) -> Result<bool, RedeemerError> {
        self.configs.contains_key(successor.as_bytes()).map_err(storage)
    }

    pub fn iter_configs(&self) -> Result<Vec<MigrationConfig>, RedeemerError> {
        let mut out = Vec::new();
        for item in self.configs.iter() {
            let (_, bytes) = item.map_err(storage)?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }

    // ── Ledger ───────────────────────────────────────────────────────────────

    pub fn get_asset(&self, asset: &AssetId) -> Result<Option<AssetInfo>, RedeemerError> {
        match self.assets.get(asset.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_token_account(
        &self,
        asset: &AssetId,
        owner: &AccountId,
    ) -> Result<Option<TokenAccount>, RedeemerError> {
        match self.balances.get(balance_key(asset, owner)).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    // ── Events ───────────────────────────────────────────────────────────────

    /// Up to `limit` events with `seq >= from`, in commit order.
    pub fn events_from(&self, from: EventSeq, limit: usize) -> Result<Vec<EventRecord>, RedeemerError> {
        let mut out = Vec::new();
        for item in self.events.range(from.to_be_bytes()..).take(limit) {
            let (_, bytes) = item.map_err(storage)?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }

    /// Every event emitted for one configuration record, in commit order.
    pub fn events_for(&self, successor: &AssetId) -> Result<Vec<EventRecord>, RedeemerError> {
        let mut out = Vec::new();
        for item in self.events.iter() {
            let (_, bytes) = item.map_err(storage)?;
            let record: EventRecord = decode(&bytes)?;
            if &record.successor_asset == successor {
                out.push(record);
            }
        }
        Ok(out)
    }

    // ── Commit ───────────────────────────────────────────────────────────────

    /// Atomically write a record update, its ledger effects and its events.
    ///
    /// Events are stamped with consecutive sequence numbers inside the same
    /// transaction, so a reader never sees a record change without its events
    /// or the reverse. Events require `config`.
    pub fn commit(
        &self,
        config: Option<&MigrationConfig>,
        ledger: &StagedLedger,
        events: &[MigrationEvent],
        now: Timestamp,
    ) -> Result<Vec<EventRecord>, RedeemerError> {
        if config.is_none() && !events.is_empty() {
            return Err(RedeemerError::ConfigNotFound("events without a record".into()));
        }
        let config_entry = match config {
            Some(cfg) => Some((cfg.successor_asset.as_bytes().to_vec(), encode(cfg)?)),
            None => None,
        };
        let asset_entries = ledger
            .assets
            .iter()
            .map(|(id, info)| Ok((id.as_bytes().to_vec(), encode(info)?)))
            .collect::<Result<Vec<_>, RedeemerError>>()?;
        let balance_entries = ledger
            .accounts
            .iter()
            .map(|((asset, owner), acc)| Ok((balance_key(asset, owner), encode(acc)?)))
            .collect::<Result<Vec<_>, RedeemerError>>()?;

        let result = (&self.configs, &self.assets, &self.balances, &self.events, &self.meta).transaction(
            |(configs, assets, balances, event_log, meta)| {
                let mut seq = meta
                    .get(EVENT_SEQ_KEY)?
                    .map(|v| seq_from_bytes(&v))
                    .unwrap_or(0);

                if let Some((key, value)) = &config_entry {
                    configs.insert(key.as_slice(), value.as_slice())?;
                }
                for (key, value) in &asset_entries {
                    assets.insert(key.as_slice(), value.as_slice())?;
                }
                for (key, value) in &balance_entries {
                    balances.insert(key.as_slice(), value.as_slice())?;
                }

                let mut records = Vec::with_capacity(events.len());
                if let Some(cfg) = config {
                    for event in events {
                        let record = EventRecord::new(seq, cfg.successor_asset.clone(), now, event.clone());
                        let bytes = encode(&record).map_err(ConflictableTransactionError::Abort)?;
                        event_log.insert(&seq.to_be_bytes()[..], bytes)?;
                        records.push(record);
                        seq += 1;
                    }
                }
                meta.insert(EVENT_SEQ_KEY, &seq.to_be_bytes()[..])?;
                Ok(records)
            },
        );

        result.map_err(|e| match e {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => storage(e),
        })
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), RedeemerError> {
        self._db.flush().map_err(storage)?;
        Ok(())
    }
}
