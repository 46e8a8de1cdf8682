//! Concurrent operations against one configuration record.

use std::sync::Arc;
use std::thread;

use redeemer_core::config::InitializeParams;
use redeemer_core::error::RedeemerError;
use redeemer_core::event::MigrationEvent;
use redeemer_core::types::{AccountId, AssetId, ProgramId};
use redeemer_crypto::derive::mint_authority_address;
use redeemer_state::{Authority, Ledger, MigrationEngine, StateDb};

fn id(b: u8) -> AccountId {
    AccountId::from_bytes([b; 32])
}

fn legacy() -> AssetId {
    AssetId::from_bytes([10; 32])
}

fn successor() -> AssetId {
    AssetId::from_bytes([11; 32])
}

fn program() -> ProgramId {
    ProgramId::from_bytes([9; 32])
}

const HOLDERS: u8 = 8;
const MIGRATION_CAP: u64 = 1_000;

/// 1:1 with equal decimals; every holder owns enough to exhaust the cap alone.
fn setup() -> MigrationEngine {
    let db = Arc::new(StateDb::open_temporary().unwrap());
    let engine = MigrationEngine::new(db, program());
    let mint_auth = mint_authority_address(&program(), &successor());
    engine
        .ledger_setup(|ledger| {
            ledger.create_asset(legacy(), 6, Some(id(200)), None)?;
            ledger.create_asset(successor(), 6, Some(mint_auth), Some(id(1)))?;
            for h in 0..HOLDERS {
                ledger.mint(&legacy(), Authority::Owner(&id(200)), &id(100 + h), MIGRATION_CAP)?;
            }
            Ok(())
        })
        .unwrap();
    let params = InitializeParams {
        admin: id(1),
        upgrade_authority: id(2),
        legacy_asset: legacy(),
        successor_asset: successor(),
        ratio_numerator: 1,
        ratio_denominator: 1,
        total_cap: MIGRATION_CAP,
        migration_cap: MIGRATION_CAP,
        treasury_amount: 0,
        liquidity_amount: 0,
        contributors_amount: 0,
        treasury_owner: id(3),
        contributors_owner: id(4),
        start_ts: 0,
        end_ts: 10_000,
    };
    engine.initialize(&id(1), &params, 0).unwrap();
    engine
}

#[test]
fn concurrent_redemptions_never_exceed_cap() {
    let engine = setup();

    let minted: u64 = thread::scope(|s| {
        let handles: Vec<_> = (0..HOLDERS)
            .map(|h| {
                let engine = &engine;
                s.spawn(move || {
                    let mut total = 0u64;
                    for _ in 0..20 {
                        match engine.redeem(&id(100 + h), &successor(), 13, 0, 100) {
                            Ok(r) => total += r.value,
                            Err(RedeemerError::CapExceeded { .. }) => {}
                            Err(e) => panic!("unexpected error: {e}"),
                        }
                    }
                    total
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    let cfg = engine.get_config(&successor()).unwrap();
    assert!(cfg.cumulative_minted_successor <= MIGRATION_CAP);
    assert_eq!(cfg.cumulative_minted_successor, minted);
    assert_eq!(cfg.cumulative_redeemed_legacy, minted as u128);

    let supply = engine.db.get_asset(&successor()).unwrap().unwrap().supply;
    assert_eq!(supply, minted as u128);

    let redeemed_events = engine
        .db
        .events_for(&successor())
        .unwrap()
        .into_iter()
        .filter(|r| matches!(r.event, MigrationEvent::Redeemed { .. }))
        .count() as u64;
    assert_eq!(redeemed_events * 13, minted);
}

#[test]
fn event_sequence_is_gapless_under_contention() {
    let engine = setup();
    thread::scope(|s| {
        for h in 0..HOLDERS {
            let engine = &engine;
            s.spawn(move || {
                for _ in 0..5 {
                    let _ = engine.redeem(&id(100 + h), &successor(), 1, 0, 100);
                }
            });
        }
    });
    let seqs: Vec<u64> = engine.db.events_from(0, 1_000).unwrap().iter().map(|r| r.seq).collect();
    let expected: Vec<u64> = (0..seqs.len() as u64).collect();
    assert_eq!(seqs, expected);
}

#[test]
fn execute_and_cancel_race_has_one_winner() {
    for _ in 0..10 {
        let engine = setup();
        let at = engine
            .propose_upgrade(&id(2), &successor(), id(50), 1, 0)
            .unwrap()
            .value;

        let (executed, cancelled) = thread::scope(|s| {
            let exec = s.spawn(|| engine.execute_upgrade(&id(2), &successor(), at));
            let cancel = s.spawn(|| engine.cancel_upgrade(&id(2), &successor(), at));
            (exec.join().unwrap(), cancel.join().unwrap())
        });

        let exec_won = executed.is_ok();
        assert!(exec_won != cancelled.is_ok(), "exactly one transition must win");
        let loser = if exec_won { cancelled.err() } else { executed.err() };
        assert_eq!(loser, Some(RedeemerError::NoUpgradePending));

        let cfg = engine.get_config(&successor()).unwrap();
        assert!(!cfg.upgrade_pending);
        assert_eq!(cfg.superseded_by.is_some(), exec_won);
    }
}

#[test]
fn ledger_balance_matches_committed_state() {
    let engine = setup();
    engine.redeem(&id(100), &successor(), 250, 250, 100).unwrap();
    assert_eq!(engine.balance(&successor(), &id(100)).unwrap(), 250);
    assert_eq!(engine.balance(&legacy(), &id(100)).unwrap(), MIGRATION_CAP - 250);
}
