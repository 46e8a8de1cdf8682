//! redeemer-genesis
//!
//! Stands up a migration on a fresh store: creates the legacy and successor
//! assets, seeds legacy holder balances, then runs the one-time
//! `initialize` operation through the engine so the fixed allocations are
//! minted exactly the way any other deployment would mint them.
//!
//! Asset creation and seeding are deployment tooling concerns; the engine
//! only ever sees the resulting ledger.

pub mod params;

pub use params::{AssetSpec, DeploymentParams, HolderSeed};

use redeemer_core::constants::MAX_DECIMALS;
use redeemer_core::error::RedeemerError;
use redeemer_core::types::{AccountId, AssetId, Timestamp};
use redeemer_crypto::derive::{config_address, liquidity_vault_address, mint_authority_address};
use redeemer_state::{Authority, Ledger, MigrationEngine};
use tracing::info;

/// Addresses of a completed deployment.
#[derive(Clone, Debug, PartialEq)]
pub struct Deployment {
    pub legacy_asset: AssetId,
    pub successor_asset: AssetId,
    pub config_address: AccountId,
    pub mint_authority: AccountId,
    pub liquidity_vault: AccountId,
}

/// Apply `params` to the engine's store.
///
/// Fails with `AlreadyInitialized` if a record for the successor asset
/// exists and with `AssetExists` if either asset was created before.
pub fn apply_deployment(
    engine: &MigrationEngine,
    params: &DeploymentParams,
    now: Timestamp,
) -> Result<Deployment, RedeemerError> {
    let init = params.initialize_params()?;
    let successor = init.successor_asset.clone();
    if engine.db.config_exists(&successor)? {
        return Err(RedeemerError::AlreadyInitialized);
    }
    // Reject bad parameters before any asset is created.
    init.validate()?;
    for decimals in [params.legacy.decimals, params.successor.decimals] {
        if decimals > MAX_DECIMALS {
            return Err(RedeemerError::InvalidDecimals { decimals, max: MAX_DECIMALS });
        }
    }

    let program = engine.program_id().clone();
    let deployment = Deployment {
        legacy_asset: init.legacy_asset.clone(),
        successor_asset: successor.clone(),
        config_address: config_address(&program, &successor),
        mint_authority: mint_authority_address(&program, &successor),
        liquidity_vault: liquidity_vault_address(&program, &successor),
    };
    info!(
        program = %program,
        legacy = %deployment.legacy_asset,
        successor = %deployment.successor_asset,
        "applying deployment"
    );

    // ── 1. Assets and holder balances ────────────────────────────────────────
    let legacy_authority = params.legacy_mint_authority()?;
    let holders = params.holders()?;
    engine.ledger_setup(|ledger| {
        ledger.create_asset(
            init.legacy_asset.clone(),
            params.legacy.decimals,
            Some(legacy_authority.clone()),
            None,
        )?;
        ledger.create_asset(
            successor.clone(),
            params.successor.decimals,
            Some(deployment.mint_authority.clone()),
            Some(init.admin.clone()),
        )?;
        for (owner, amount) in &holders {
            ledger.mint(&init.legacy_asset, Authority::Owner(&legacy_authority), owner, *amount)?;
        }
        Ok(())
    })?;
    info!(holders = holders.len(), "deployment: assets created");

    // ── 2. Record and fixed allocations ──────────────────────────────────────
    engine.initialize(&init.admin, &init, now)?;
    info!(
        treasury = init.treasury_amount,
        liquidity = init.liquidity_amount,
        contributors = init.contributors_amount,
        "deployment: allocations minted"
    );

    verify_allocations(engine, &deployment, params)?;
    engine.db.flush()?;
    info!("deployment committed to disk");
    Ok(deployment)
}

/// Successor supply after deployment must equal the fixed allocations exactly.
fn verify_allocations(
    engine: &MigrationEngine,
    deployment: &Deployment,
    params: &DeploymentParams,
) -> Result<(), RedeemerError> {
    let supply = engine
        .db
        .get_asset(&deployment.successor_asset)?
        .map(|a| a.supply)
        .unwrap_or(0);
    let expected = params.treasury_amount as u128
        + params.liquidity_amount as u128
        + params.contributors_amount as u128;
    if supply != expected {
        return Err(RedeemerError::InvalidAllocationSum { expected, got: supply });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use redeemer_core::event::MigrationEvent;
    use redeemer_core::types::ProgramId;
    use redeemer_state::StateDb;
    use std::sync::Arc;

    fn id(b: u8) -> AccountId {
        AccountId::from_bytes([b; 32])
    }

    fn engine() -> MigrationEngine {
        let db = Arc::new(StateDb::open_temporary().unwrap());
        MigrationEngine::new(db, ProgramId::from_bytes([9; 32]))
    }

    #[test]
    fn dev_deployment_initializes_and_seeds_holders() {
        let engine = engine();
        let params = DeploymentParams::dev(1_000, &id(1), &[id(5), id(6)]);
        let deployment = apply_deployment(&engine, &params, 1_000).unwrap();

        let cfg = engine.get_config(&deployment.successor_asset).unwrap();
        assert_eq!(cfg.admin, id(1));
        assert_eq!(cfg.legacy_decimals, 6);
        assert_eq!(cfg.successor_decimals, 9);
        assert_eq!(engine.balance(&deployment.legacy_asset, &id(5)).unwrap(), 1_000_000_000);
        assert_eq!(
            engine.balance(&deployment.successor_asset, &deployment.liquidity_vault).unwrap(),
            params.liquidity_amount
        );

        let events = engine.db.events_for(&deployment.successor_asset).unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].event, MigrationEvent::Initialized { .. }));

        // Holders can redeem right away.
        let out = engine
            .redeem(&id(5), &deployment.successor_asset, 1_000_000, 0, 1_000)
            .unwrap()
            .value;
        assert_eq!(out, 100_000_000);
    }

    #[test]
    fn second_deployment_is_rejected() {
        let engine = engine();
        let params = DeploymentParams::dev(0, &id(1), &[]);
        apply_deployment(&engine, &params, 0).unwrap();
        assert_eq!(
            apply_deployment(&engine, &params, 0),
            Err(RedeemerError::AlreadyInitialized)
        );
    }

    #[test]
    fn invalid_params_create_nothing() {
        let engine = engine();
        let mut params = DeploymentParams::dev(0, &id(1), &[id(5)]);
        params.treasury_amount += 1;
        assert!(matches!(
            apply_deployment(&engine, &params, 0),
            Err(RedeemerError::InvalidAllocationSum { .. })
        ));
        assert!(engine.db.get_asset(&params.legacy.asset_id()).unwrap().is_none());
    }

    #[test]
    fn oversized_decimals_create_nothing_and_can_be_retried() {
        let engine = engine();
        let mut params = DeploymentParams::dev(0, &id(1), &[id(5)]);
        params.successor.decimals = MAX_DECIMALS + 1;
        assert_eq!(
            apply_deployment(&engine, &params, 0),
            Err(RedeemerError::InvalidDecimals { decimals: MAX_DECIMALS + 1, max: MAX_DECIMALS })
        );
        assert!(engine.db.get_asset(&params.legacy.asset_id()).unwrap().is_none());
        assert!(engine.db.get_asset(&params.successor.asset_id()).unwrap().is_none());

        params.successor.decimals = 9;
        apply_deployment(&engine, &params, 0).unwrap();
    }

    #[test]
    fn params_parse_from_json() {
        let params = DeploymentParams::dev(0, &id(1), &[id(5)]);
        let json = serde_json::to_string_pretty(&params).unwrap();
        assert_eq!(DeploymentParams::from_json(&json).unwrap(), params);
        assert!(matches!(
            DeploymentParams::from_json("{\"legacy\": 1}"),
            Err(RedeemerError::Serialization(_))
        ));
    }

    #[test]
    fn bad_account_id_is_reported() {
        let mut params = DeploymentParams::dev(0, &id(1), &[]);
        params.admin = "not-base58-0OIl".into();
        assert!(matches!(params.initialize_params(), Err(RedeemerError::InvalidId(_))));
    }
}
