//! Ledger primitive boundary.
//!
//! The custody ledger (assets, balances, mint/burn, freeze/thaw) is an
//! external collaborator. `Ledger` is the capability interface the engine
//! consumes; `TokenLedger` implements it over `StateDb`, staging every write
//! so the engine can commit ledger effects and record changes atomically.

use std::collections::BTreeMap;

use redeemer_core::error::RedeemerError;
use redeemer_core::types::{AccountId, Amount, AssetId, AssetInfo, TokenAccount};

use crate::db::StateDb;

// ── Authority ─────────────────────────────────────────────────────────────────

/// Proof that protocol logic is acting as a derived capability address.
///
/// Only this crate can construct one, so no external party (the admin
/// included) can authorize as a derived address.
#[derive(Debug)]
pub struct ProgramSigner {
    address: AccountId,
}

impl ProgramSigner {
    pub(crate) fn new(address: AccountId) -> Self {
        Self { address }
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }
}

/// Who is authorizing a ledger operation.
#[derive(Debug, Clone, Copy)]
pub enum Authority<'a> {
    /// An authenticated external principal.
    Owner(&'a AccountId),
    /// Protocol logic acting as one of its derived accounts.
    Program(&'a ProgramSigner),
}

impl Authority<'_> {
    pub fn address(&self) -> &AccountId {
        match self {
            Authority::Owner(id) => id,
            Authority::Program(signer) => signer.address(),
        }
    }
}

// ── Ledger ────────────────────────────────────────────────────────────────────

/// Capability operations the migration core invokes but does not own.
pub trait Ledger {
    fn asset(&self, asset: &AssetId) -> Result<AssetInfo, RedeemerError>;

    fn balance(&self, asset: &AssetId, owner: &AccountId) -> Result<Amount, RedeemerError>;

    /// Open `owner`'s account for `asset`; a no-op if it already exists.
    fn create_account(&mut self, asset: &AssetId, owner: &AccountId) -> Result<(), RedeemerError>;

    fn mint(
        &mut self,
        asset: &AssetId,
        authority: Authority<'_>,
        destination: &AccountId,
        amount: Amount,
    ) -> Result<(), RedeemerError>;

    fn burn(
        &mut self,
        asset: &AssetId,
        authority: Authority<'_>,
        source: &AccountId,
        amount: Amount,
    ) -> Result<(), RedeemerError>;

    fn transfer(
        &mut self,
        asset: &AssetId,
        authority: Authority<'_>,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), RedeemerError>;

    /// Replace (or with `None`, permanently revoke) the asset's mint authority.
    fn set_mint_authority(
        &mut self,
        asset: &AssetId,
        authority: Authority<'_>,
        new_authority: Option<AccountId>,
    ) -> Result<(), RedeemerError>;

    fn set_frozen(
        &mut self,
        asset: &AssetId,
        authority: Authority<'_>,
        owner: &AccountId,
        frozen: bool,
    ) -> Result<(), RedeemerError>;
}

// ── TokenLedger ───────────────────────────────────────────────────────────────

/// Ledger writes staged on top of the database, not yet committed.
#[derive(Default, Debug)]
pub struct StagedLedger {
    pub assets: BTreeMap<AssetId, AssetInfo>,
    pub accounts: BTreeMap<(AssetId, AccountId), TokenAccount>,
}

/// `Ledger` over `StateDb` with a write overlay.
pub struct TokenLedger<'a> {
    db: &'a StateDb,
    staged: StagedLedger,
}

impl<'a> TokenLedger<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db, staged: StagedLedger::default() }
    }

    pub fn staged(&self) -> &StagedLedger {
        &self.staged
    }

    /// Register a new asset. Asset creation belongs to deployment tooling,
    /// not to the migration core.
    pub fn create_asset(
        &mut self,
        asset_id: AssetId,
        decimals: u8,
        mint_authority: Option<AccountId>,
        freeze_authority: Option<AccountId>,
    ) -> Result<(), RedeemerError> {
        if self.find_asset(&asset_id)?.is_some() {
            return Err(RedeemerError::AssetExists(asset_id.to_b58()));
        }
        let info = AssetInfo {
            asset_id: asset_id.clone(),
            decimals,
            supply: 0,
            mint_authority,
            freeze_authority,
        };
        self.staged.assets.insert(asset_id, info);
        Ok(())
    }

    fn find_asset(&self, asset: &AssetId) -> Result<Option<AssetInfo>, RedeemerError> {
        if let Some(info) = self.staged.assets.get(asset) {
            return Ok(Some(info.clone()));
        }
        self.db.get_asset(asset)
    }

    fn find_account(&self, asset: &AssetId, owner: &AccountId) -> Result<Option<TokenAccount>, RedeemerError> {
        if let Some(acc) = self.staged.accounts.get(&(asset.clone(), owner.clone())) {
            return Ok(Some(acc.clone()));
        }
        self.db.get_token_account(asset, owner)
    }

    fn account_or_new(&self, asset: &AssetId, owner: &AccountId) -> Result<TokenAccount, RedeemerError> {
        Ok(self
            .find_account(asset, owner)?
            .unwrap_or_else(|| TokenAccount::new(asset.clone(), owner.clone())))
    }

    fn stage_account(&mut self, account: TokenAccount) {
        self.staged
            .accounts
            .insert((account.asset_id.clone(), account.owner.clone()), account);
    }

    fn stage_asset(&mut self, info: AssetInfo) {
        self.staged.assets.insert(info.asset_id.clone(), info);
    }
}

fn ensure_not_frozen(account: &TokenAccount) -> Result<(), RedeemerError> {
    if account.frozen {
        return Err(RedeemerError::AccountFrozen(account.owner.to_b58()));
    }
    Ok(())
}

impl Ledger for TokenLedger<'_> {
    fn asset(&self, asset: &AssetId) -> Result<AssetInfo, RedeemerError> {
        self.find_asset(asset)?
            .ok_or_else(|| RedeemerError::UnknownAsset(asset.to_b58()))
    }

    fn balance(&self, asset: &AssetId, owner: &AccountId) -> Result<Amount, RedeemerError> {
        Ok(self.find_account(asset, owner)?.map(|a| a.amount).unwrap_or(0))
    }

    fn create_account(&mut self, asset: &AssetId, owner: &AccountId) -> Result<(), RedeemerError> {
        self.asset(asset)?;
        if self.find_account(asset, owner)?.is_none() {
            self.stage_account(TokenAccount::new(asset.clone(), owner.clone()));
        }
        Ok(())
    }

    fn mint(
        &mut self,
        asset: &AssetId,
        authority: Authority<'_>,
        destination: &AccountId,
        amount: Amount,
    ) -> Result<(), RedeemerError> {
        let mut info = self.asset(asset)?;
        if info.mint_authority.as_ref() != Some(authority.address()) {
            return Err(RedeemerError::Unauthorized);
        }
        let mut account = self.account_or_new(asset, destination)?;
        ensure_not_frozen(&account)?;
        account.amount = account
            .amount
            .checked_add(amount)
            .ok_or(RedeemerError::MathOverflow)?;
        info.supply = info
            .supply
            .checked_add(amount as u128)
            .ok_or(RedeemerError::MathOverflow)?;
        self.stage_account(account);
        self.stage_asset(info);
        Ok(())
    }

    fn burn(
        &mut self,
        asset: &AssetId,
        authority: Authority<'_>,
        source: &AccountId,
        amount: Amount,
    ) -> Result<(), RedeemerError> {
        let mut info = self.asset(asset)?;
        if authority.address() != source {
            return Err(RedeemerError::Unauthorized);
        }
        let mut account = self.account_or_new(asset, source)?;
        ensure_not_frozen(&account)?;
        if account.amount < amount {
            return Err(RedeemerError::InsufficientBalance { need: amount, have: account.amount });
        }
        account.amount -= amount;
        info.supply = info.supply.saturating_sub(amount as u128);
        self.stage_account(account);
        self.stage_asset(info);
        Ok(())
    }

    fn transfer(
        &mut self,
        asset: &AssetId,
        authority: Authority<'_>,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), RedeemerError> {
        self.asset(asset)?;
        if authority.address() != from {
            return Err(RedeemerError::Unauthorized);
        }
        let mut source = self.account_or_new(asset, from)?;
        ensure_not_frozen(&source)?;
        if source.amount < amount {
            return Err(RedeemerError::InsufficientBalance { need: amount, have: source.amount });
        }
        if from == to {
            return Ok(());
        }
        let mut dest = self.account_or_new(asset, to)?;
        ensure_not_frozen(&dest)?;
        source.amount -= amount;
        dest.amount = dest.amount.checked_add(amount).ok_or(RedeemerError::MathOverflow)?;
        self.stage_account(source);
        self.stage_account(dest);
        Ok(())
    }

    fn set_mint_authority(
        &mut self,
        asset: &AssetId,
        authority: Authority<'_>,
        new_authority: Option<AccountId>,
    ) -> Result<(), RedeemerError> {
        let mut info = self.asset(asset)?;
        if info.mint_authority.as_ref() != Some(authority.address()) {
            return Err(RedeemerError::Unauthorized);
        }
        info.mint_authority = new_authority;
        self.stage_asset(info);
        Ok(())
    }

    fn set_frozen(
        &mut self,
        asset: &AssetId,
        authority: Authority<'_>,
        owner: &AccountId,
        frozen: bool,
    ) -> Result<(), RedeemerError> {
        let info = self.asset(asset)?;
        if info.freeze_authority.as_ref() != Some(authority.address()) {
            return Err(RedeemerError::Unauthorized);
        }
        let mut account = self.account_or_new(asset, owner)?;
        account.frozen = frozen;
        self.stage_account(account);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(b: u8) -> AccountId {
        AccountId::from_bytes([b; 32])
    }

    fn asset(b: u8) -> AssetId {
        AssetId::from_bytes([b; 32])
    }

    #[test]
    fn mint_requires_mint_authority() {
        let db = StateDb::open_temporary().unwrap();
        let mut ledger = TokenLedger::new(&db);
        ledger.create_asset(asset(1), 6, Some(id(1)), None).unwrap();

        assert_eq!(
            ledger.mint(&asset(1), Authority::Owner(&id(2)), &id(3), 10),
            Err(RedeemerError::Unauthorized)
        );
        ledger.mint(&asset(1), Authority::Owner(&id(1)), &id(3), 10).unwrap();
        assert_eq!(ledger.balance(&asset(1), &id(3)).unwrap(), 10);
        assert_eq!(ledger.asset(&asset(1)).unwrap().supply, 10);
    }

    #[test]
    fn program_signer_acts_only_as_its_own_address() {
        let db = StateDb::open_temporary().unwrap();
        let mut ledger = TokenLedger::new(&db);
        ledger.create_asset(asset(1), 6, Some(id(7)), None).unwrap();

        let wrong = ProgramSigner::new(id(8));
        assert_eq!(
            ledger.mint(&asset(1), Authority::Program(&wrong), &id(3), 1),
            Err(RedeemerError::Unauthorized)
        );
        let right = ProgramSigner::new(id(7));
        ledger.mint(&asset(1), Authority::Program(&right), &id(3), 1).unwrap();
    }

    #[test]
    fn burn_only_by_owner_and_within_balance() {
        let db = StateDb::open_temporary().unwrap();
        let mut ledger = TokenLedger::new(&db);
        ledger.create_asset(asset(1), 6, Some(id(1)), None).unwrap();
        ledger.mint(&asset(1), Authority::Owner(&id(1)), &id(3), 10).unwrap();

        assert_eq!(
            ledger.burn(&asset(1), Authority::Owner(&id(1)), &id(3), 5),
            Err(RedeemerError::Unauthorized)
        );
        assert_eq!(
            ledger.burn(&asset(1), Authority::Owner(&id(3)), &id(3), 11),
            Err(RedeemerError::InsufficientBalance { need: 11, have: 10 })
        );
        ledger.burn(&asset(1), Authority::Owner(&id(3)), &id(3), 4).unwrap();
        assert_eq!(ledger.balance(&asset(1), &id(3)).unwrap(), 6);
        assert_eq!(ledger.asset(&asset(1)).unwrap().supply, 6);
    }

    #[test]
    fn frozen_accounts_reject_movement() {
        let db = StateDb::open_temporary().unwrap();
        let mut ledger = TokenLedger::new(&db);
        ledger.create_asset(asset(1), 6, Some(id(1)), Some(id(2))).unwrap();
        ledger.mint(&asset(1), Authority::Owner(&id(1)), &id(3), 10).unwrap();

        assert_eq!(
            ledger.set_frozen(&asset(1), Authority::Owner(&id(1)), &id(3), true),
            Err(RedeemerError::Unauthorized)
        );
        ledger.set_frozen(&asset(1), Authority::Owner(&id(2)), &id(3), true).unwrap();
        assert!(matches!(
            ledger.transfer(&asset(1), Authority::Owner(&id(3)), &id(3), &id(4), 1),
            Err(RedeemerError::AccountFrozen(_))
        ));
        assert!(matches!(
            ledger.mint(&asset(1), Authority::Owner(&id(1)), &id(3), 1),
            Err(RedeemerError::AccountFrozen(_))
        ));
        ledger.set_frozen(&asset(1), Authority::Owner(&id(2)), &id(3), false).unwrap();
        ledger.transfer(&asset(1), Authority::Owner(&id(3)), &id(3), &id(4), 1).unwrap();
        assert_eq!(ledger.balance(&asset(1), &id(4)).unwrap(), 1);
    }

    #[test]
    fn revoked_mint_authority_blocks_minting() {
        let db = StateDb::open_temporary().unwrap();
        let mut ledger = TokenLedger::new(&db);
        ledger.create_asset(asset(1), 6, Some(id(1)), None).unwrap();
        ledger.set_mint_authority(&asset(1), Authority::Owner(&id(1)), None).unwrap();
        assert_eq!(
            ledger.mint(&asset(1), Authority::Owner(&id(1)), &id(3), 1),
            Err(RedeemerError::Unauthorized)
        );
    }

    #[test]
    fn staged_writes_are_invisible_until_committed() {
        let db = StateDb::open_temporary().unwrap();
        let mut ledger = TokenLedger::new(&db);
        ledger.create_asset(asset(1), 6, Some(id(1)), None).unwrap();
        ledger.mint(&asset(1), Authority::Owner(&id(1)), &id(3), 10).unwrap();
        assert!(db.get_asset(&asset(1)).unwrap().is_none());

        db.commit(None, ledger.staged(), &[], 0).unwrap();
        assert_eq!(db.get_token_account(&asset(1), &id(3)).unwrap().unwrap().amount, 10);
    }

    #[test]
    fn duplicate_asset_is_rejected() {
        let db = StateDb::open_temporary().unwrap();
        let mut ledger = TokenLedger::new(&db);
        ledger.create_asset(asset(1), 6, None, None).unwrap();
        assert!(matches!(
            ledger.create_asset(asset(1), 9, None, None),
            Err(RedeemerError::AssetExists(_))
        ));
    }
}
