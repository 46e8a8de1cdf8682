use std::sync::{Arc, Mutex, MutexGuard};

use redeemer_core::config::{validate_window, InitializeParams, MigrationConfig};
use redeemer_core::constants::MAX_DECIMALS;
use redeemer_core::error::RedeemerError;
use redeemer_core::event::{EventRecord, MigrationEvent};
use redeemer_core::instruction::{Instruction, Request};
use redeemer_core::types::{AccountId, Amount, AssetId, ProgramId, Timestamp};
use redeemer_crypto::derive::{
    derive_address, liquidity_vault_address, mint_authority_address, upgrade_escrow_address,
    Namespace,
};
use tracing::{debug, info, warn};

use crate::db::StateDb;
use crate::ledger::{Authority, Ledger, ProgramSigner, TokenLedger};

// ── Receipt ───────────────────────────────────────────────────────────────────

/// Result of a committed operation together with the events it emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt<T> {
    pub value: T,
    pub events: Vec<EventRecord>,
}

// ── MigrationEngine ───────────────────────────────────────────────────────────

/// The state transition engine for configuration records.
///
/// Every operation reads the record, validates, stages record and ledger
/// changes, and commits them with their events in one sled transaction.
/// Operations are serialized by `write_lock`, so a cap check and the
/// increment that follows it can never interleave with another redemption.
pub struct MigrationEngine {
    pub db: Arc<StateDb>,
    program_id: ProgramId,
    write_lock: Mutex<()>,
}

impl MigrationEngine {
    pub fn new(db: Arc<StateDb>, program_id: ProgramId) -> Self {
        Self { db, program_id, write_lock: Mutex::new(()) }
    }

    pub fn program_id(&self) -> &ProgramId {
        &self.program_id
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Dispatch a request. Returns the events it emitted.
    pub fn apply(&self, request: &Request, now: Timestamp) -> Result<Vec<EventRecord>, RedeemerError> {
        let caller = &request.caller;
        let successor = &request.successor_asset;
        let result = match &request.instruction {
            Instruction::Initialize(params) => {
                if &params.successor_asset != successor {
                    return Err(RedeemerError::InvalidAsset);
                }
                self.initialize(caller, params, now).map(|r| r.events)
            }
            Instruction::Finalize => self.finalize(caller, successor, now).map(|r| r.events),
            Instruction::Redeem { legacy_amount, min_successor_out } => self
                .redeem(caller, successor, *legacy_amount, *min_successor_out, now)
                .map(|r| r.events),
            Instruction::SetPause { paused } => {
                self.set_pause(caller, successor, *paused, now).map(|r| r.events)
            }
            Instruction::UpdateWindow { start_ts, end_ts } => self
                .update_window(caller, successor, *start_ts, *end_ts, now)
                .map(|r| r.events),
            Instruction::SetFrozen { owner, frozen } => self
                .set_frozen(caller, successor, owner, *frozen, now)
                .map(|r| r.events),
            Instruction::ProposeUpgrade { target, timelock_days } => self
                .propose_upgrade(caller, successor, target.clone(), *timelock_days, now)
                .map(|r| r.events),
            Instruction::ExecuteUpgrade => {
                self.execute_upgrade(caller, successor, now).map(|r| r.events)
            }
            Instruction::CancelUpgrade => {
                self.cancel_upgrade(caller, successor, now).map(|r| r.events)
            }
            Instruction::MigrateTokens { amount } => self
                .migrate_tokens(caller, successor, *amount, now)
                .map(|r| r.events),
            Instruction::MigrateLiquidity { amount } => self
                .migrate_liquidity(caller, successor, *amount, now)
                .map(|r| r.events),
        };
        if let Err(e) = &result {
            warn!(
                op = request.instruction.name(),
                caller = %caller,
                successor = %successor,
                error = e.kind(),
                "request rejected"
            );
        }
        result
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn get_config(&self, successor: &AssetId) -> Result<MigrationConfig, RedeemerError> {
        self.db
            .get_config(successor)?
            .ok_or_else(|| RedeemerError::ConfigNotFound(successor.to_b58()))
    }

    pub fn balance(&self, asset: &AssetId, owner: &AccountId) -> Result<Amount, RedeemerError> {
        TokenLedger::new(&self.db).balance(asset, owner)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Create the record for `params.successor_asset` and mint the fixed
    /// allocations. Callable by anyone, exactly once per successor asset.
    pub fn initialize(
        &self,
        caller: &AccountId,
        params: &InitializeParams,
        now: Timestamp,
    ) -> Result<Receipt<()>, RedeemerError> {
        let _guard = self.lock();
        let successor = &params.successor_asset;
        self.reject_capability_caller(caller, &self.program_id, successor, None)?;

        if self.db.config_exists(successor)? {
            return Err(RedeemerError::AlreadyInitialized);
        }
        params.validate()?;

        let mut ledger = TokenLedger::new(&self.db);
        let legacy = ledger.asset(&params.legacy_asset)?;
        let succ = ledger.asset(successor)?;
        for decimals in [legacy.decimals, succ.decimals] {
            if decimals > MAX_DECIMALS {
                return Err(RedeemerError::InvalidDecimals { decimals, max: MAX_DECIMALS });
            }
        }
        let mint_auth = mint_authority_address(&self.program_id, successor);
        if succ.mint_authority.as_ref() != Some(&mint_auth) {
            return Err(RedeemerError::WrongMintAuthority);
        }
        if succ.freeze_authority.as_ref() != Some(&params.admin) {
            return Err(RedeemerError::WrongFreezeAuthority);
        }

        let config = MigrationConfig::new(
            self.program_id.clone(),
            params,
            legacy.decimals,
            succ.decimals,
            now,
        );

        let signer = ProgramSigner::new(mint_auth);
        let vault = liquidity_vault_address(&self.program_id, successor);
        for (owner, amount) in [
            (&params.treasury_owner, params.treasury_amount),
            (&params.contributors_owner, params.contributors_amount),
            (&vault, params.liquidity_amount),
        ] {
            ledger.create_account(successor, owner)?;
            if amount > 0 {
                ledger.mint(successor, Authority::Program(&signer), owner, amount)?;
            }
        }
        config.check_invariants()?;

        let event = MigrationEvent::Initialized {
            admin: config.admin.clone(),
            legacy_asset: config.legacy_asset.clone(),
            successor_asset: config.successor_asset.clone(),
            total_cap: config.total_cap,
            migration_cap: config.migration_cap,
            start_ts: config.start_ts,
            end_ts: config.end_ts,
        };
        let events = self.db.commit(Some(&config), ledger.staged(), &[event], now)?;
        info!(
            successor = %successor,
            legacy = %config.legacy_asset,
            migration_cap = config.migration_cap,
            start_ts = config.start_ts,
            end_ts = config.end_ts,
            "migration initialized"
        );
        Ok(Receipt { value: (), events })
    }

    /// Close the record permanently and revoke the successor mint authority.
    ///
    /// Permissionless once the window has ended or the migration cap is
    /// exhausted; `TooEarly` otherwise.
    pub fn finalize(
        &self,
        caller: &AccountId,
        successor: &AssetId,
        now: Timestamp,
    ) -> Result<Receipt<()>, RedeemerError> {
        self.transact("finalize", caller, successor, now, |cfg, ledger, events| {
            if cfg.finalized {
                return Err(RedeemerError::AlreadyFinalized);
            }
            if now <= cfg.end_ts && cfg.remaining_cap() > 0 {
                return Err(RedeemerError::TooEarly);
            }
            // After a handover the mint authority belongs to the target version.
            if cfg.superseded_by.is_none() {
                let signer = mint_signer(cfg);
                ledger.set_mint_authority(&cfg.successor_asset, Authority::Program(&signer), None)?;
            }
            cfg.finalized = true;
            events.push(MigrationEvent::Finalized);
            Ok(())
        })
    }

    // ── Redemption ────────────────────────────────────────────────────────────

    /// Burn `legacy_amount` of the caller's legacy units and mint the converted
    /// successor amount to the caller. Returns the amount minted.
    pub fn redeem(
        &self,
        caller: &AccountId,
        successor: &AssetId,
        legacy_amount: Amount,
        min_successor_out: Amount,
        now: Timestamp,
    ) -> Result<Receipt<Amount>, RedeemerError> {
        self.transact("redeem", caller, successor, now, |cfg, ledger, events| {
            cfg.check_redeemable(legacy_amount, now)?;

            let have = ledger.balance(&cfg.legacy_asset, caller)?;
            if have < legacy_amount {
                return Err(RedeemerError::InsufficientBalance { need: legacy_amount, have });
            }
            let out = cfg.convert(legacy_amount)?;
            if out == 0 {
                return Err(RedeemerError::DustTooSmall);
            }
            cfg.record_redemption(legacy_amount, out)?;
            if out < min_successor_out {
                return Err(RedeemerError::SlippageExceeded { out, min: min_successor_out });
            }
            debug!(legacy_in = legacy_amount, successor_out = out, "conversion");

            let legacy_asset = cfg.legacy_asset.clone();
            ledger.burn(&legacy_asset, Authority::Owner(caller), caller, legacy_amount)?;
            ledger.create_account(&cfg.successor_asset, caller)?;
            let signer = mint_signer(cfg);
            ledger.mint(&cfg.successor_asset, Authority::Program(&signer), caller, out)?;

            events.push(MigrationEvent::Redeemed {
                caller: caller.clone(),
                legacy_amount_burned: legacy_amount,
                successor_amount_minted: out,
            });
            Ok(out)
        })
    }

    // ── Administration ────────────────────────────────────────────────────────

    pub fn set_pause(
        &self,
        caller: &AccountId,
        successor: &AssetId,
        paused: bool,
        now: Timestamp,
    ) -> Result<Receipt<()>, RedeemerError> {
        self.transact("set_pause", caller, successor, now, |cfg, _, events| {
            cfg.require_admin(caller)?;
            cfg.paused = paused;
            events.push(MigrationEvent::PauseSet { new_value: paused });
            Ok(())
        })
    }

    pub fn update_window(
        &self,
        caller: &AccountId,
        successor: &AssetId,
        start_ts: Timestamp,
        end_ts: Timestamp,
        now: Timestamp,
    ) -> Result<Receipt<()>, RedeemerError> {
        self.transact("update_window", caller, successor, now, |cfg, _, events| {
            cfg.require_admin(caller)?;
            if cfg.finalized {
                return Err(RedeemerError::AlreadyFinalized);
            }
            validate_window(start_ts, end_ts)?;
            cfg.start_ts = start_ts;
            cfg.end_ts = end_ts;
            events.push(MigrationEvent::WindowUpdated { new_start: start_ts, new_end: end_ts });
            Ok(())
        })
    }

    /// Freeze or thaw a successor-asset account. The admin is the asset's
    /// freeze authority; the ledger enforces it.
    pub fn set_frozen(
        &self,
        caller: &AccountId,
        successor: &AssetId,
        owner: &AccountId,
        frozen: bool,
        now: Timestamp,
    ) -> Result<Receipt<()>, RedeemerError> {
        self.transact("set_frozen", caller, successor, now, |cfg, ledger, events| {
            cfg.require_admin(caller)?;
            ledger.set_frozen(&cfg.successor_asset, Authority::Owner(caller), owner, frozen)?;
            events.push(MigrationEvent::FreezeSet { owner: owner.clone(), frozen });
            Ok(())
        })
    }

    // ── Governance ────────────────────────────────────────────────────────────

    /// Returns the timestamp from which the upgrade may execute.
    pub fn propose_upgrade(
        &self,
        caller: &AccountId,
        successor: &AssetId,
        target: ProgramId,
        timelock_days: u32,
        now: Timestamp,
    ) -> Result<Receipt<Timestamp>, RedeemerError> {
        self.transact("propose_upgrade", caller, successor, now, |cfg, _, events| {
            let executable_at = cfg.propose_upgrade(caller, target.clone(), timelock_days, now)?;
            events.push(MigrationEvent::UpgradeProposed { target: target.clone(), executable_at });
            Ok(executable_at)
        })
    }

    /// Hand the successor mint authority to the proposed version.
    pub fn execute_upgrade(
        &self,
        caller: &AccountId,
        successor: &AssetId,
        now: Timestamp,
    ) -> Result<Receipt<ProgramId>, RedeemerError> {
        self.transact("execute_upgrade", caller, successor, now, |cfg, ledger, events| {
            let target = cfg.execute_upgrade(caller, now)?;
            // A finalized record has no mint authority left to hand over.
            if !cfg.finalized {
                let signer = mint_signer(cfg);
                let next = mint_authority_address(&target, &cfg.successor_asset);
                ledger.set_mint_authority(&cfg.successor_asset, Authority::Program(&signer), Some(next))?;
            }
            events.push(MigrationEvent::UpgradeExecuted { target: target.clone() });
            Ok(target)
        })
    }

    pub fn cancel_upgrade(
        &self,
        caller: &AccountId,
        successor: &AssetId,
        now: Timestamp,
    ) -> Result<Receipt<ProgramId>, RedeemerError> {
        self.transact("cancel_upgrade", caller, successor, now, |cfg, _, events| {
            let target = cfg.cancel_upgrade(caller)?;
            events.push(MigrationEvent::UpgradeCancelled { target: target.clone() });
            Ok(target)
        })
    }

    /// Move the caller's successor units into the pending target's escrow.
    pub fn migrate_tokens(
        &self,
        caller: &AccountId,
        successor: &AssetId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Receipt<()>, RedeemerError> {
        self.transact("migrate_tokens", caller, successor, now, |cfg, ledger, events| {
            let target = cfg.pending_target()?.clone();
            if amount == 0 {
                return Err(RedeemerError::ZeroAmount);
            }
            let escrow = upgrade_escrow_address(&target, &cfg.successor_asset);
            ledger.create_account(&cfg.successor_asset, &escrow)?;
            ledger.transfer(&cfg.successor_asset, Authority::Owner(caller), caller, &escrow, amount)?;
            events.push(MigrationEvent::TokensMigrated { holder: caller.clone(), amount, target });
            Ok(())
        })
    }

    /// Move protocol-held liquidity into the pending target's vault.
    pub fn migrate_liquidity(
        &self,
        caller: &AccountId,
        successor: &AssetId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Receipt<()>, RedeemerError> {
        self.transact("migrate_liquidity", caller, successor, now, |cfg, ledger, events| {
            cfg.require_upgrade_authority(caller)?;
            let target = cfg.pending_target()?.clone();
            if amount == 0 {
                return Err(RedeemerError::ZeroAmount);
            }
            let vault = ProgramSigner::new(liquidity_vault_address(&cfg.program_id, &cfg.successor_asset));
            let dest = liquidity_vault_address(&target, &cfg.successor_asset);
            ledger.create_account(&cfg.successor_asset, &dest)?;
            ledger.transfer(
                &cfg.successor_asset,
                Authority::Program(&vault),
                vault.address(),
                &dest,
                amount,
            )?;
            events.push(MigrationEvent::LiquidityMigrated { amount, target });
            Ok(())
        })
    }

    // ── Ledger setup ──────────────────────────────────────────────────────────

    /// Run ledger-only writes (asset creation, seeding balances) under the
    /// engine lock and commit them atomically. Used by deployment tooling.
    pub fn ledger_setup<T, F>(&self, f: F) -> Result<T, RedeemerError>
    where
        F: FnOnce(&mut TokenLedger<'_>) -> Result<T, RedeemerError>,
    {
        let _guard = self.lock();
        let mut ledger = TokenLedger::new(&self.db);
        let value = f(&mut ledger)?;
        self.db.commit(None, ledger.staged(), &[], 0)?;
        Ok(value)
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    /// Load → mutate a copy → check invariants → commit. Nothing is written if
    /// `f` or any later step fails.
    fn transact<T, F>(
        &self,
        op: &'static str,
        caller: &AccountId,
        successor: &AssetId,
        now: Timestamp,
        f: F,
    ) -> Result<Receipt<T>, RedeemerError>
    where
        F: FnOnce(&mut MigrationConfig, &mut TokenLedger<'_>, &mut Vec<MigrationEvent>) -> Result<T, RedeemerError>,
    {
        let _guard = self.lock();
        let mut cfg = self.get_config(successor)?;
        if cfg.program_id != self.program_id {
            return Err(RedeemerError::Unauthorized);
        }
        self.reject_capability_caller(caller, &cfg.program_id, successor, Some(&cfg))?;

        let mut ledger = TokenLedger::new(&self.db);
        let mut pending = Vec::new();
        let value = f(&mut cfg, &mut ledger, &mut pending)?;
        cfg.check_invariants()?;

        let events = self.db.commit(Some(&cfg), ledger.staged(), &pending, now)?;
        info!(op, caller = %caller, successor = %successor, events = events.len(), "committed");
        Ok(Receipt { value, events })
    }

    /// Derived capability addresses never act as external callers.
    fn reject_capability_caller(
        &self,
        caller: &AccountId,
        program: &ProgramId,
        successor: &AssetId,
        cfg: Option<&MigrationConfig>,
    ) -> Result<(), RedeemerError> {
        let mut programs = vec![program];
        if let Some(cfg) = cfg {
            programs.extend(cfg.upgrade_target.as_ref());
            programs.extend(cfg.superseded_by.as_ref());
        }
        let namespaces = [
            Namespace::Config,
            Namespace::MintAuthority,
            Namespace::Liquidity,
            Namespace::UpgradeEscrow,
        ];
        for p in programs {
            if namespaces.iter().any(|ns| &derive_address(p, *ns, successor) == caller) {
                return Err(RedeemerError::Unauthorized);
            }
        }
        Ok(())
    }
}

fn mint_signer(cfg: &MigrationConfig) -> ProgramSigner {
    ProgramSigner::new(mint_authority_address(&cfg.program_id, &cfg.successor_asset))
}
