use redeemer_core::config::MigrationConfig;
use redeemer_core::error::RedeemerError;
use redeemer_core::types::{AccountId, Amount, AssetId, Timestamp};
use redeemer_state::{Ledger, StateDb, TokenLedger};

use crate::stats::MigrationStats;

/// Read-only helpers over configuration records.
pub struct ConfigQuery<'a> {
    db: &'a StateDb,
}

impl<'a> ConfigQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    pub fn config(&self, successor: &AssetId) -> Result<MigrationConfig, RedeemerError> {
        self.db
            .get_config(successor)?
            .ok_or_else(|| RedeemerError::ConfigNotFound(successor.to_b58()))
    }

    pub fn stats(&self, successor: &AssetId) -> Result<MigrationStats, RedeemerError> {
        let events = self.db.events_for(successor)?;
        Ok(MigrationStats::replay(successor, &events))
    }

    /// Dry run of `redeem` against committed state. Returns the successor
    /// amount the call would mint, or the error it would fail with first.
    ///
    /// Another caller may commit in between, so this is advisory only.
    pub fn quote_redeem(
        &self,
        successor: &AssetId,
        caller: &AccountId,
        legacy_amount: Amount,
        now: Timestamp,
    ) -> Result<Amount, RedeemerError> {
        let mut cfg = self.config(successor)?;
        cfg.check_redeemable(legacy_amount, now)?;
        let have = TokenLedger::new(self.db).balance(&cfg.legacy_asset, caller)?;
        if have < legacy_amount {
            return Err(RedeemerError::InsufficientBalance { need: legacy_amount, have });
        }
        let out = cfg.convert(legacy_amount)?;
        if out == 0 {
            return Err(RedeemerError::DustTooSmall);
        }
        cfg.record_redemption(legacy_amount, out)?;
        Ok(out)
    }

    /// One-line status for operators.
    pub fn describe(&self, successor: &AssetId, now: Timestamp) -> Result<String, RedeemerError> {
        let cfg = self.config(successor)?;

        let phase = if cfg.finalized {
            "FINALIZED".to_string()
        } else if let Some(next) = &cfg.superseded_by {
            format!("SUPERSEDED by {next}")
        } else if cfg.paused {
            "PAUSED".to_string()
        } else if now < cfg.start_ts {
            format!("opens in {}s", cfg.start_ts - now)
        } else if now > cfg.end_ts {
            "window closed".to_string()
        } else {
            format!("open, {}s left", cfg.end_ts - now)
        };

        let upgrade = match (&cfg.upgrade_target, cfg.upgrade_pending) {
            (Some(target), true) if now >= cfg.upgrade_timelock => format!(" | upgrade to {target} executable"),
            (Some(target), true) => format!(
                " | upgrade to {target} in {}s",
                cfg.upgrade_timelock - now
            ),
            _ => String::new(),
        };

        Ok(format!(
            "Migration {} ← {} — {} | minted {}/{} ({} left) | ratio {}:{}{}",
            cfg.successor_asset,
            cfg.legacy_asset,
            phase,
            cfg.cumulative_minted_successor,
            cfg.migration_cap,
            cfg.remaining_cap(),
            cfg.ratio_numerator,
            cfg.ratio_denominator,
            upgrade
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redeemer_core::config::InitializeParams;
    use redeemer_core::types::ProgramId;
    use redeemer_crypto::derive::mint_authority_address;
    use redeemer_state::{Authority, MigrationEngine};
    use std::sync::Arc;

    fn id(b: u8) -> AccountId {
        AccountId::from_bytes([b; 32])
    }

    fn legacy() -> AssetId {
        AssetId::from_bytes([10; 32])
    }

    fn successor() -> AssetId {
        AssetId::from_bytes([11; 32])
    }

    fn setup() -> MigrationEngine {
        let program = ProgramId::from_bytes([9; 32]);
        let db = Arc::new(StateDb::open_temporary().unwrap());
        let engine = MigrationEngine::new(db, program.clone());
        let mint_auth = mint_authority_address(&program, &successor());
        engine
            .ledger_setup(|ledger| {
                ledger.create_asset(legacy(), 6, Some(id(100)), None)?;
                ledger.create_asset(successor(), 6, Some(mint_auth), Some(id(1)))?;
                ledger.mint(&legacy(), Authority::Owner(&id(100)), &id(5), 1_000)
            })
            .unwrap();
        let params = InitializeParams {
            admin: id(1),
            upgrade_authority: id(2),
            legacy_asset: legacy(),
            successor_asset: successor(),
            ratio_numerator: 1,
            ratio_denominator: 2,
            total_cap: 400,
            migration_cap: 400,
            treasury_amount: 0,
            liquidity_amount: 0,
            contributors_amount: 0,
            treasury_owner: id(3),
            contributors_owner: id(4),
            start_ts: 100,
            end_ts: 200,
        };
        engine.initialize(&id(1), &params, 50).unwrap();
        engine
    }

    #[test]
    fn quote_matches_redeem() {
        let engine = setup();
        let query = ConfigQuery::new(&engine.db);
        let quoted = query.quote_redeem(&successor(), &id(5), 101, 150).unwrap();
        let minted = engine.redeem(&id(5), &successor(), 101, 0, 150).unwrap().value;
        assert_eq!(quoted, minted);
        assert_eq!(quoted, 50);
    }

    #[test]
    fn quote_reports_first_failure() {
        let engine = setup();
        let query = ConfigQuery::new(&engine.db);
        assert!(matches!(
            query.quote_redeem(&successor(), &id(5), 10, 99),
            Err(RedeemerError::OutsideWindow { .. })
        ));
        assert_eq!(query.quote_redeem(&successor(), &id(5), 1, 150), Err(RedeemerError::DustTooSmall));
        assert_eq!(
            query.quote_redeem(&successor(), &id(6), 10, 150),
            Err(RedeemerError::InsufficientBalance { need: 10, have: 0 })
        );
        assert!(matches!(
            query.quote_redeem(&legacy(), &id(5), 10, 150),
            Err(RedeemerError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn stats_follow_committed_events() {
        let engine = setup();
        engine.redeem(&id(5), &successor(), 100, 0, 150).unwrap();
        engine.redeem(&id(5), &successor(), 200, 0, 150).unwrap();
        engine.set_pause(&id(1), &successor(), true, 150).unwrap();

        let stats = ConfigQuery::new(&engine.db).stats(&successor()).unwrap();
        assert_eq!(stats.redemptions, 2);
        assert_eq!(stats.unique_redeemers, 1);
        assert_eq!(stats.total_successor_minted, 150);
        assert_eq!(stats.window, Some((100, 200)));
        assert!(stats.paused);

        let cfg = engine.get_config(&successor()).unwrap();
        assert_eq!(stats.total_successor_minted, cfg.cumulative_minted_successor as u128);
        assert_eq!(stats.total_legacy_burned, cfg.cumulative_redeemed_legacy);
    }

    #[test]
    fn describe_reflects_phase() {
        let engine = setup();
        let query = ConfigQuery::new(&engine.db);
        assert!(query.describe(&successor(), 50).unwrap().contains("opens in 50s"));
        assert!(query.describe(&successor(), 150).unwrap().contains("open, 50s left"));
        engine.set_pause(&id(1), &successor(), true, 150).unwrap();
        assert!(query.describe(&successor(), 150).unwrap().contains("PAUSED"));
        engine.finalize(&id(9), &successor(), 201).unwrap();
        assert!(query.describe(&successor(), 250).unwrap().contains("FINALIZED"));
    }
}
