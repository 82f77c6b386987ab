//! Accounting Engine
//!
//! Reconciles the strategy's raw native balance against what the strategy
//! believes it is owed. Beacon chain sweeps arrive without metadata, so the
//! balance is decomposed into:
//!
//! 1. full withdrawals: whole multiples of the stake unit
//! 2. a remainder that is classified against the fuse window:
//!    - below the window: consensus rewards
//!    - above the window: a slashed validator's partial stake
//!    - inside the window: ambiguous, the fuse blows and the strategy pauses
//!
//! ## Flow
//!
//! `plan_accounting` is pure and decides everything. `reconcile` performs the
//! vault transfer first and only then commits the counters, so an error
//! from a collaborator leaves the state untouched.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use stratos_common::{
    check,
    config::AccountingConfig,
    emergency::{PauseCause, PauseState},
    errors::{StratosError, StratosResult},
    events::{EventLog, StratosEvent},
    interfaces::WrappedNativeAsset,
    types::{AccountingClassification, Address},
};

// ============ State ============

/// Mutable accounting counters of a native staking strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AccountingState {
    /// Validators that received a deposit and were not yet withdrawn or slashed
    pub active_deposited_validators: u64,
    /// Partial-withdrawal rewards received but not yet harvested
    pub consensus_rewards: u128,
    /// Lower bound of the fuse window
    pub fuse_interval_start: u128,
    /// Upper bound of the fuse window
    pub fuse_interval_end: u128,
    /// Circuit breaker
    pub pause: PauseState,
    /// Block of the last successful manual fix
    pub last_fix_block: Option<u64>,
}

impl AccountingState {
    /// Fresh state using the config's fuse window
    pub fn new(config: &AccountingConfig) -> Self {
        Self {
            active_deposited_validators: 0,
            consensus_rewards: 0,
            fuse_interval_start: config.fuse_interval_start,
            fuse_interval_end: config.fuse_interval_end,
            pause: PauseState::Running,
            last_fix_block: None,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }
}

// ============ Plan ============

/// Outcome of classifying a native balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AccountingPlan {
    pub classification: AccountingClassification,
    /// Validators recognised as fully withdrawn
    pub withdrawn_validators: u64,
    /// `withdrawn_validators * stake_unit`
    pub full_withdrawal_eth: u128,
    /// Remainder attributed to a slashed validator
    pub slashed_eth: u128,
    /// Remainder attributed to consensus rewards
    pub rewards_accrued: u128,
}

impl AccountingPlan {
    fn invalid() -> Self {
        Self {
            classification: AccountingClassification::Invalid,
            withdrawn_validators: 0,
            full_withdrawal_eth: 0,
            slashed_eth: 0,
            rewards_accrued: 0,
        }
    }

    /// Clean, RewardsAccrued or SlashDetected
    pub fn is_valid(&self) -> bool {
        self.classification.is_valid()
    }

    /// Total amount this plan sends to the vault
    pub fn eth_to_vault(&self) -> u128 {
        self.full_withdrawal_eth.saturating_add(self.slashed_eth)
    }

    /// Validators this plan removes from the active count
    pub fn validators_removed(&self) -> u64 {
        let slashed = u64::from(self.classification == AccountingClassification::SlashDetected);
        self.withdrawn_validators + slashed
    }
}

/// Classify `balance` against `state` without touching anything
///
/// Fails with `DivisionByZero` for a zero `stake_unit`.
///
/// # Panics
///
/// If the remainder left after extracting full withdrawals is not below one
/// stake unit. That can only happen through a defect in this function.
pub fn plan_accounting(state: &AccountingState, stake_unit: u128, balance: u128) -> StratosResult<AccountingPlan> {
    check!(stake_unit > 0, StratosError::DivisionByZero);
    if balance < state.consensus_rewards {
        return Ok(AccountingPlan::invalid());
    }

    let new_swept = balance - state.consensus_rewards;
    let active = u128::from(state.active_deposited_validators);

    let withdrawn = new_swept / stake_unit;
    if withdrawn > active {
        return Ok(AccountingPlan::invalid());
    }
    // withdrawn <= active <= u64::MAX
    let withdrawn_validators = withdrawn as u64;
    let full_withdrawal_eth = withdrawn * stake_unit;

    let remaining = balance - full_withdrawal_eth - state.consensus_rewards;
    assert!(
        remaining < stake_unit,
        "accounting remainder {remaining} not below stake unit {stake_unit}"
    );

    let mut plan = AccountingPlan {
        classification: AccountingClassification::Clean,
        withdrawn_validators,
        full_withdrawal_eth,
        slashed_eth: 0,
        rewards_accrued: 0,
    };

    if remaining == 0 {
        return Ok(plan);
    }

    if remaining < state.fuse_interval_start {
        plan.classification = AccountingClassification::RewardsAccrued;
        plan.rewards_accrued = remaining;
    } else if remaining > state.fuse_interval_end {
        // A slash needs a validator left to attribute it to
        if active - withdrawn == 0 {
            plan.classification = AccountingClassification::Invalid;
        } else {
            plan.classification = AccountingClassification::SlashDetected;
            plan.slashed_eth = remaining;
        }
    } else {
        plan.classification = AccountingClassification::FuseBlown;
    }

    Ok(plan)
}

// ============ Reconcile ============

/// Wrap `amount` of the strategy's native balance and send it to the vault
pub(crate) fn send_to_vault<W: WrappedNativeAsset>(
    ledger: &mut W,
    strategy: &Address,
    vault: &Address,
    amount: u128,
) -> StratosResult<()> {
    if amount == 0 {
        return Ok(());
    }
    ledger.wrap(strategy, amount)?;
    ledger.transfer(strategy, vault, amount)
}

/// Where a reconciliation moves funds
#[derive(Debug, Clone, Copy)]
pub struct ReconcileAccounts<'a> {
    pub strategy: &'a Address,
    pub vault: &'a Address,
}

/// Run accounting against the strategy's current native balance
///
/// Returns the applied plan; `plan.is_valid()` is the accounting-valid flag.
/// Invalid and FuseBlown outcomes are not errors: they trip the pause when
/// `pause_on_fail` is set. Full withdrawals recognised before a fuse blows
/// are still sent to the vault.
pub fn reconcile<W: WrappedNativeAsset>(
    state: &mut AccountingState,
    config: &AccountingConfig,
    ledger: &mut W,
    accounts: ReconcileAccounts<'_>,
    pause_on_fail: bool,
    block_height: u64,
    events: &mut EventLog,
) -> StratosResult<AccountingPlan> {
    let balance = ledger.native_balance(accounts.strategy);
    let plan = plan_accounting(state, config.stake_unit, balance)?;

    let active_after = state
        .active_deposited_validators
        .checked_sub(plan.validators_removed())
        .ok_or(StratosError::Underflow)?;
    let rewards_after = state
        .consensus_rewards
        .checked_add(plan.rewards_accrued)
        .ok_or(StratosError::Overflow)?;

    send_to_vault(ledger, accounts.strategy, accounts.vault, plan.eth_to_vault())?;

    state.active_deposited_validators = active_after;
    state.consensus_rewards = rewards_after;

    match plan.classification {
        AccountingClassification::Clean | AccountingClassification::RewardsAccrued => {
            tracing::debug!(
                classification = ?plan.classification,
                withdrawn = plan.withdrawn_validators,
                rewards = state.consensus_rewards,
                "accounting reconciled"
            );
        }
        AccountingClassification::SlashDetected => {
            tracing::warn!(
                slashed = plan.slashed_eth,
                active = state.active_deposited_validators,
                "slashed validator detected"
            );
        }
        AccountingClassification::FuseBlown | AccountingClassification::Invalid => {
            tracing::warn!(
                classification = ?plan.classification,
                balance,
                consensus_rewards = state.consensus_rewards,
                "accounting failed"
            );
        }
    }

    events.emit(StratosEvent::AccountingOutcome {
        classification: plan.classification,
        withdrawn_validators: plan.withdrawn_validators,
        eth_to_vault: plan.eth_to_vault(),
        active_validators: state.active_deposited_validators,
        consensus_rewards: state.consensus_rewards,
        block_height,
    });

    if !plan.is_valid() && pause_on_fail {
        let cause = match plan.classification {
            AccountingClassification::FuseBlown => PauseCause::FuseBlown,
            _ => PauseCause::Invalid,
        };
        trip(state, cause, block_height, events);
    }

    Ok(plan)
}

/// Pause with `cause`, emitting an event only on a Running -> Paused edge
pub(crate) fn trip(state: &mut AccountingState, cause: PauseCause, block_height: u64, events: &mut EventLog) {
    if state.pause.is_paused() {
        return;
    }
    state.pause.trip(cause);
    tracing::info!(?cause, block = block_height, "strategy paused");
    events.emit(StratosEvent::StrategyPaused { cause, block_height });
}

// ============ Fuse Window ============

/// Replace the fuse window after validating it against `config`
pub fn set_fuse_interval(
    state: &mut AccountingState,
    config: &AccountingConfig,
    start: u128,
    end: u128,
    block_height: u64,
    events: &mut EventLog,
) -> StratosResult<()> {
    config.validate_fuse_interval(start, end)?;

    state.fuse_interval_start = start;
    state.fuse_interval_end = end;

    tracing::info!(start, end, "fuse interval updated");
    events.emit(StratosEvent::FuseIntervalUpdated { start, end, block_height });
    Ok(())
}

/// Fail unless `balance` covers the tracked rewards
pub fn ensure_rewards_covered(state: &AccountingState, balance: u128) -> StratosResult<()> {
    check!(
        balance >= state.consensus_rewards,
        StratosError::InsufficientBalance {
            available: balance,
            requested: state.consensus_rewards,
        }
    );
    Ok(())
}
