//! Manual Override
//!
//! The only way out of an accounting pause. A strategist supplies bounded
//! corrections to the counters plus an amount to push to the vault, and the
//! strategy resumes only if reconciliation then succeeds.
//!
//! ## Key Features
//!
//! - **Bounded**: every correction is capped by the accounting config
//! - **Rate limited**: fixes are spaced by `min_fix_cadence` blocks
//! - **All or nothing**: the correction is simulated first; a fix that would
//!   still fail accounting is rejected with `FuseStillBlown` and changes nothing

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use stratos_common::{
    check,
    config::AccountingConfig,
    errors::{StratosError, StratosResult},
    events::{EventLog, StratosEvent},
    interfaces::WrappedNativeAsset,
    math::apply_delta,
};

use crate::accountant::{plan_accounting, reconcile, send_to_vault, AccountingPlan, AccountingState, ReconcileAccounts};

/// Corrections applied by a manual fix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ManualFix {
    /// Signed change to the active validator count
    pub validators_delta: i32,
    /// Signed change to the tracked consensus rewards
    pub consensus_rewards_delta: i128,
    /// Native balance to wrap and send to the vault before re-validating
    pub eth_to_vault: u128,
}

impl ManualFix {
    pub fn new(validators_delta: i32, consensus_rewards_delta: i128, eth_to_vault: u128) -> Self {
        Self {
            validators_delta,
            consensus_rewards_delta,
            eth_to_vault,
        }
    }

    /// Check every correction against the configured bounds
    pub fn check_bounds(&self, config: &AccountingConfig) -> StratosResult<()> {
        check!(
            self.validators_delta.unsigned_abs() <= config.max_validators_delta,
            StratosError::ManualFixOutOfBounds { param: "validators_delta" }
        );
        check!(
            self.consensus_rewards_delta.unsigned_abs() <= config.max_consensus_rewards_delta,
            StratosError::ManualFixOutOfBounds { param: "consensus_rewards_delta" }
        );
        check!(
            self.eth_to_vault <= config.max_eth_to_vault,
            StratosError::ManualFixOutOfBounds { param: "eth_to_vault" }
        );
        Ok(())
    }

    /// Counters after applying the deltas to `state`
    fn adjusted(&self, state: &AccountingState) -> StratosResult<AccountingState> {
        let active = apply_delta(
            u128::from(state.active_deposited_validators),
            i128::from(self.validators_delta),
        )
        .map_err(|_| StratosError::ManualFixOutOfBounds { param: "validators_delta" })?;
        let consensus_rewards = apply_delta(state.consensus_rewards, self.consensus_rewards_delta)
            .map_err(|_| StratosError::ManualFixOutOfBounds { param: "consensus_rewards_delta" })?;

        Ok(AccountingState {
            active_deposited_validators: u64::try_from(active)
                .map_err(|_| StratosError::ManualFixOutOfBounds { param: "validators_delta" })?,
            consensus_rewards,
            ..state.clone()
        })
    }
}

/// Apply a manual fix to a paused strategy
///
/// Rejected without mutation when the strategy is running, the previous fix
/// is too recent, a correction is out of bounds, or the corrected state would
/// still fail accounting. On success the strategy is running again.
pub fn manually_fix<W: WrappedNativeAsset>(
    state: &mut AccountingState,
    config: &AccountingConfig,
    fix: ManualFix,
    ledger: &mut W,
    accounts: ReconcileAccounts<'_>,
    block_height: u64,
    events: &mut EventLog,
) -> StratosResult<AccountingPlan> {
    state.pause.ensure_paused()?;

    if let Some(last_fix_block) = state.last_fix_block {
        let next_allowed = last_fix_block.saturating_add(config.min_fix_cadence);
        check!(
            block_height >= next_allowed,
            StratosError::ManualFixTooSoon {
                last_fix_block,
                current_block: block_height,
            }
        );
    }

    fix.check_bounds(config)?;

    let balance = ledger.native_balance(accounts.strategy);
    check!(
        fix.eth_to_vault <= balance,
        StratosError::InsufficientBalance {
            available: balance,
            requested: fix.eth_to_vault,
        }
    );

    let candidate = fix.adjusted(state)?;
    let simulated = plan_accounting(&candidate, config.stake_unit, balance - fix.eth_to_vault)?;
    if !simulated.is_valid() {
        tracing::warn!(
            classification = ?simulated.classification,
            validators_delta = fix.validators_delta,
            eth_to_vault = fix.eth_to_vault,
            "manual fix rejected"
        );
        return Err(StratosError::FuseStillBlown);
    }

    send_to_vault(ledger, accounts.strategy, accounts.vault, fix.eth_to_vault)?;

    state.active_deposited_validators = candidate.active_deposited_validators;
    state.consensus_rewards = candidate.consensus_rewards;
    state.last_fix_block = Some(block_height);

    tracing::info!(
        validators_delta = fix.validators_delta,
        consensus_rewards_delta = fix.consensus_rewards_delta,
        eth_to_vault = fix.eth_to_vault,
        "accounting manually fixed"
    );
    events.emit(StratosEvent::AccountingManuallyFixed {
        validators_delta: fix.validators_delta,
        consensus_rewards_delta: fix.consensus_rewards_delta,
        eth_to_vault: fix.eth_to_vault,
        block_height,
    });

    let plan = reconcile(state, config, ledger, accounts, false, block_height, events)?;
    if plan.is_valid() {
        state.pause.clear();
        tracing::info!(block = block_height, "strategy unpaused");
        events.emit(StratosEvent::StrategyUnpaused { block_height });
    }

    Ok(plan)
}
