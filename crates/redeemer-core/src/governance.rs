//! Upgrade handover state machine.
//!
//!   Idle ──propose──▶ Pending ──execute (now ≥ timelock)──▶ Idle (superseded)
//!                        │
//!                        └──cancel (any time)──────────▶ Idle
//!
//! Transitions here touch only the governance fields of `MigrationConfig`.
//! Moving the mint-authority capability on the ledger is the engine's job and
//! is committed in the same atomic step.

use serde::{Deserialize, Serialize};

use crate::config::MigrationConfig;
use crate::constants::{MAX_UPGRADE_TIMELOCK_DAYS, SECONDS_PER_DAY};
use crate::error::RedeemerError;
use crate::types::{AccountId, ProgramId, Timestamp};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum UpgradeState {
    Idle,
    Pending { target: ProgramId, executable_at: Timestamp },
}

impl MigrationConfig {
    pub fn upgrade_state(&self) -> UpgradeState {
        match (&self.upgrade_target, self.upgrade_pending) {
            (Some(target), true) => UpgradeState::Pending {
                target: target.clone(),
                executable_at: self.upgrade_timelock,
            },
            _ => UpgradeState::Idle,
        }
    }

    /// Target of the pending proposal, or `NoUpgradePending`.
    pub fn pending_target(&self) -> Result<&ProgramId, RedeemerError> {
        match (&self.upgrade_target, self.upgrade_pending) {
            (Some(target), true) => Ok(target),
            _ => Err(RedeemerError::NoUpgradePending),
        }
    }

    /// Idle → Pending. Returns the timestamp from which execution is allowed.
    pub fn propose_upgrade(
        &mut self,
        caller: &AccountId,
        target: ProgramId,
        timelock_days: u32,
        now: Timestamp,
    ) -> Result<Timestamp, RedeemerError> {
        self.require_upgrade_authority(caller)?;
        if self.superseded_by.is_some() {
            return Err(RedeemerError::MintAuthorityRetired);
        }
        if self.upgrade_pending {
            return Err(RedeemerError::UpgradeAlreadyPending);
        }
        if timelock_days == 0 || timelock_days > MAX_UPGRADE_TIMELOCK_DAYS {
            return Err(RedeemerError::InvalidTimelock {
                days: timelock_days,
                max: MAX_UPGRADE_TIMELOCK_DAYS,
            });
        }
        if target == self.program_id {
            return Err(RedeemerError::InvalidUpgradeTarget);
        }
        let executable_at = (timelock_days as i64)
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|d| now.checked_add(d))
            .ok_or(RedeemerError::MathOverflow)?;

        self.upgrade_pending = true;
        self.upgrade_target = Some(target);
        self.upgrade_timelock = executable_at;
        Ok(executable_at)
    }

    /// Pending → Idle, recording the target as this record's successor version.
    pub fn execute_upgrade(&mut self, caller: &AccountId, now: Timestamp) -> Result<ProgramId, RedeemerError> {
        self.require_upgrade_authority(caller)?;
        let target = self.pending_target()?.clone();
        if now < self.upgrade_timelock {
            return Err(RedeemerError::TimelockNotExpired {
                unlock_at: self.upgrade_timelock,
            });
        }
        self.clear_upgrade();
        self.superseded_by = Some(target.clone());
        Ok(target)
    }

    /// Pending → Idle. Not time-gated.
    pub fn cancel_upgrade(&mut self, caller: &AccountId) -> Result<ProgramId, RedeemerError> {
        self.require_upgrade_authority(caller)?;
        let target = self.pending_target()?.clone();
        self.clear_upgrade();
        Ok(target)
    }

    fn clear_upgrade(&mut self) {
        self.upgrade_pending = false;
        self.upgrade_target = None;
        self.upgrade_timelock = 0;
    }
}
