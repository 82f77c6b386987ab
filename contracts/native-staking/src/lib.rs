//! Native Staking Strategy
//!
//! Stakes vault collateral (wrapped native asset) into beacon chain
//! validators and accounts for the unstructured sweeps that come back.
//!
//! ## Core Operations
//!
//! - **Validator lifecycle**: register, stake (batched), exit, remove
//! - **Reconcile**: classify the native balance into full withdrawals,
//!   consensus rewards and slashes; pause when the fuse blows
//! - **Manual fix**: bounded operator correction that clears an accounting pause
//! - **Funds**: vault deposits and withdrawals, reward harvest
//! - **Staking monitor**: a cap on ETH staked between monitor resets
//!
//! ## Roles
//!
//! Every entry point takes an [`AuthContext`] and checks the caller's role
//! before touching state:
//!
//! | Operation                                      | Role                   |
//! |------------------------------------------------|------------------------|
//! | register / stake / exit / remove / reconcile   | Registrator            |
//! | manually_fix                                   | Strategist             |
//! | set_fuse_interval / set_stake_eth_threshold    | Governor               |
//! | deposit / deposit_all / withdraw               | Vault                  |
//! | withdraw_all                                   | Vault or Governor      |
//! | collect_rewards                                | Harvester              |
//! | reset_stake_eth_tally                          | StakingMonitor         |
//! | pause                                          | Strategist or Governor |
//! | unpause                                        | Governor               |

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

pub mod accountant;
pub mod manual_fix;
pub mod registry;


pub use accountant::{plan_accounting, AccountingPlan, AccountingState, ReconcileAccounts};
pub use manual_fix::ManualFix;
pub use registry::{hash_pubkey, ValidatorRegistry};

use std::collections::BTreeSet;

use stratos_common::{
    access_control::{Role, RoleBook},
    check,
    config::AccountingConfig,
    emergency::PauseCause,
    errors::{StratosError, StratosResult},
    events::{EventLog, StratosEvent},
    interfaces::{DepositContract, WrappedNativeAsset},
    types::{Address, AuthContext, PubkeyHash},
    validation::{require_non_zero, require_signature},
};

// ============ Addresses ============

/// Accounts the strategy moves funds between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct StrategyAddresses {
    /// The strategy's own account (receives beacon chain sweeps)
    pub strategy: Address,
    /// Vault that owns the deposited collateral
    pub vault: Address,
    /// Recipient of harvested consensus rewards
    pub harvester: Address,
    /// Withdrawal credentials sent with every validator deposit
    pub withdrawal_credentials: [u8; 32],
}

impl StrategyAddresses {
    fn validate(&self) -> StratosResult<()> {
        check!(
            self.strategy != [0u8; 32],
            StratosError::InvalidInput { param: "strategy", reason: "zero address" }
        );
        check!(
            self.vault != [0u8; 32],
            StratosError::InvalidInput { param: "vault", reason: "zero address" }
        );
        check!(
            self.harvester != [0u8; 32],
            StratosError::InvalidInput { param: "harvester", reason: "zero address" }
        );
        Ok(())
    }

    fn reconcile_accounts(&self) -> ReconcileAccounts<'_> {
        ReconcileAccounts {
            strategy: &self.strategy,
            vault: &self.vault,
        }
    }
}

/// Deposit data for one validator in a `stake_eth` batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ValidatorStakeData {
    pub pubkey: Vec<u8>,
    pub signature: Vec<u8>,
    pub deposit_data_root: [u8; 32],
}

// ============ Strategy ============

/// Native staking strategy state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct NativeStakingStrategy {
    pub config: AccountingConfig,
    pub addresses: StrategyAddresses,
    pub roles: RoleBook,
    pub registry: ValidatorRegistry,
    pub accounting: AccountingState,
    /// Wrapped collateral the strategy has recognised as deposited
    pub deposited_weth_accounted_for: u128,
    /// ETH staked since the monitor last reset the tally
    pub stake_eth_tally: u128,
    /// Cap on `stake_eth_tally`
    pub stake_eth_threshold: u128,
    pub events: EventLog,
}

impl NativeStakingStrategy {
    /// Build a strategy from a validated config
    pub fn new(config: AccountingConfig, addresses: StrategyAddresses, roles: RoleBook) -> StratosResult<Self> {
        config.validate()?;
        addresses.validate()?;

        Ok(Self {
            accounting: AccountingState::new(&config),
            stake_eth_threshold: config.stake_eth_threshold,
            config,
            addresses,
            roles,
            registry: ValidatorRegistry::new(),
            deposited_weth_accounted_for: 0,
            stake_eth_tally: 0,
            events: EventLog::new(),
        })
    }

    pub fn is_paused(&self) -> bool {
        self.accounting.is_paused()
    }

    // ============ Validator Lifecycle ============

    /// Register a validator public key
    pub fn register_validator(&mut self, ctx: &AuthContext, pubkey: &[u8]) -> StratosResult<PubkeyHash> {
        self.roles.require(ctx, Role::Registrator)?;
        self.accounting.pause.ensure_running()?;

        self.registry.register(pubkey, ctx.block_height, &mut self.events)
    }

    /// Stake one stake unit into each validator in `batch`
    ///
    /// Every entry is validated before any funds move: registered state, no
    /// duplicates, enough wrapped balance, and the staking threshold. If the
    /// ledger or the deposit contract fails part way, the strategy's registry
    /// and counters are left untouched.
    pub fn stake_eth<W, D>(
        &mut self,
        ctx: &AuthContext,
        ledger: &mut W,
        deposit_contract: &mut D,
        batch: &[ValidatorStakeData],
    ) -> StratosResult<()>
    where
        W: WrappedNativeAsset,
        D: DepositContract,
    {
        self.roles.require(ctx, Role::Registrator)?;
        self.accounting.pause.ensure_running()?;

        check!(
            !batch.is_empty(),
            StratosError::InvalidInput { param: "batch", reason: "empty" }
        );
        let max_per_call = self.config.max_validators_per_call as usize;
        check!(
            batch.len() <= max_per_call,
            StratosError::ExceedsMaximum {
                amount: batch.len() as u128,
                maximum: max_per_call as u128,
            }
        );

        let stake_unit = self.config.stake_unit;
        let total = (batch.len() as u128)
            .checked_mul(stake_unit)
            .ok_or(StratosError::Overflow)?;

        let available = ledger.balance_of(&self.addresses.strategy);
        check!(
            available >= total,
            StratosError::InsufficientBalance { available, requested: total }
        );

        let tally = self.stake_eth_tally.checked_add(total).ok_or(StratosError::Overflow)?;
        check!(
            tally <= self.stake_eth_threshold,
            StratosError::StakingThresholdExceeded {
                tally,
                threshold: self.stake_eth_threshold,
            }
        );

        let mut seen = BTreeSet::new();
        let mut pubkey_hashes = Vec::with_capacity(batch.len());
        for data in batch {
            let pubkey_hash = self.registry.ensure_stakeable(&data.pubkey)?;
            require_signature(&data.signature)?;
            check!(
                seen.insert(pubkey_hash),
                StratosError::DuplicateValidator { pubkey_hash }
            );
            pubkey_hashes.push(pubkey_hash);
        }

        let active = self
            .accounting
            .active_deposited_validators
            .checked_add(batch.len() as u64)
            .ok_or(StratosError::Overflow)?;

        // Every external call completes before any internal state changes
        let deposit_address = deposit_contract.address();
        for data in batch {
            ledger.unwrap(&self.addresses.strategy, stake_unit)?;
            ledger.send_native(&self.addresses.strategy, &deposit_address, stake_unit)?;
            deposit_contract.deposit(
                &data.pubkey,
                &self.addresses.withdrawal_credentials,
                &data.signature,
                &data.deposit_data_root,
                stake_unit,
            )?;
        }

        for pubkey_hash in pubkey_hashes {
            self.registry.mark_staked(pubkey_hash, ctx.block_height, &mut self.events);
            self.events.emit(StratosEvent::EthStaked {
                pubkey_hash,
                amount: stake_unit,
                block_height: ctx.block_height,
            });
        }
        self.accounting.active_deposited_validators = active;
        self.stake_eth_tally = tally;
        self.deposited_weth_accounted_for = self.deposited_weth_accounted_for.saturating_sub(total);

        tracing::info!(
            validators = batch.len(),
            amount = total,
            active = self.accounting.active_deposited_validators,
            "eth staked"
        );
        Ok(())
    }

    /// Mark a staked validator as exiting
    pub fn exit_validator(&mut self, ctx: &AuthContext, pubkey: &[u8]) -> StratosResult<PubkeyHash> {
        self.roles.require(ctx, Role::Registrator)?;
        self.accounting.pause.ensure_running()?;

        self.registry.initiate_exit(pubkey, ctx.block_height, &mut self.events)
    }

    /// Mark an exiting validator as removed
    pub fn remove_validator(&mut self, ctx: &AuthContext, pubkey: &[u8]) -> StratosResult<PubkeyHash> {
        self.roles.require(ctx, Role::Registrator)?;

        self.registry.complete_removal(pubkey, ctx.block_height, &mut self.events)
    }

    // ============ Accounting ============

    /// Reconcile the native balance, pausing on Invalid or FuseBlown
    pub fn reconcile<W: WrappedNativeAsset>(&mut self, ctx: &AuthContext, ledger: &mut W) -> StratosResult<AccountingPlan> {
        self.roles.require(ctx, Role::Registrator)?;
        self.accounting.pause.ensure_running()?;

        accountant::reconcile(
            &mut self.accounting,
            &self.config,
            ledger,
            self.addresses.reconcile_accounts(),
            true,
            ctx.block_height,
            &mut self.events,
        )
    }

    /// Apply a bounded correction while paused
    pub fn manually_fix<W: WrappedNativeAsset>(
        &mut self,
        ctx: &AuthContext,
        ledger: &mut W,
        fix: ManualFix,
    ) -> StratosResult<AccountingPlan> {
        self.roles.require(ctx, Role::Strategist)?;

        manual_fix::manually_fix(
            &mut self.accounting,
            &self.config,
            fix,
            ledger,
            self.addresses.reconcile_accounts(),
            ctx.block_height,
            &mut self.events,
        )
    }

    /// Replace the fuse window
    pub fn set_fuse_interval(&mut self, ctx: &AuthContext, start: u128, end: u128) -> StratosResult<()> {
        self.roles.require(ctx, Role::Governor)?;

        accountant::set_fuse_interval(
            &mut self.accounting,
            &self.config,
            start,
            end,
            ctx.block_height,
            &mut self.events,
        )
    }

    // ============ Pause ============

    /// Pause manually
    pub fn pause(&mut self, ctx: &AuthContext) -> StratosResult<()> {
        self.roles.require_any(ctx, &[Role::Strategist, Role::Governor])?;
        self.accounting.pause.ensure_running()?;

        accountant::trip(&mut self.accounting, PauseCause::Manual, ctx.block_height, &mut self.events);
        Ok(())
    }

    /// Lift a manual pause; accounting pauses need a manual fix
    pub fn unpause(&mut self, ctx: &AuthContext) -> StratosResult<()> {
        self.roles.require(ctx, Role::Governor)?;

        self.accounting.pause.lift_manual()?;
        tracing::info!(block = ctx.block_height, "strategy unpaused");
        self.events.emit(StratosEvent::StrategyUnpaused {
            block_height: ctx.block_height,
        });
        Ok(())
    }

    // ============ Funds ============

    /// Recognise `amount` of wrapped collateral the vault just transferred in
    pub fn deposit<W: WrappedNativeAsset>(&mut self, ctx: &AuthContext, ledger: &W, amount: u128) -> StratosResult<()> {
        self.roles.require(ctx, Role::Vault)?;
        require_non_zero(amount)?;

        let balance = ledger.balance_of(&self.addresses.strategy);
        let accounted = self
            .deposited_weth_accounted_for
            .checked_add(amount)
            .ok_or(StratosError::Overflow)?;
        check!(
            accounted <= balance,
            StratosError::InsufficientBalance { available: balance, requested: accounted }
        );

        self.record_deposit(accounted, amount, ctx.block_height);
        Ok(())
    }

    /// Recognise every unaccounted wrapped token held by the strategy
    ///
    /// Returns the newly recognised amount (zero is not an error).
    pub fn deposit_all<W: WrappedNativeAsset>(&mut self, ctx: &AuthContext, ledger: &W) -> StratosResult<u128> {
        self.roles.require(ctx, Role::Vault)?;

        let balance = ledger.balance_of(&self.addresses.strategy);
        let new_amount = balance.saturating_sub(self.deposited_weth_accounted_for);
        if new_amount > 0 {
            self.record_deposit(balance, new_amount, ctx.block_height);
        }
        Ok(new_amount)
    }

    fn record_deposit(&mut self, accounted: u128, amount: u128, block_height: u64) {
        self.deposited_weth_accounted_for = accounted;
        tracing::debug!(amount, "collateral deposited");
        self.events.emit(StratosEvent::Deposit { amount, block_height });
    }

    /// Send `amount` of wrapped collateral to `recipient`
    pub fn withdraw<W: WrappedNativeAsset>(
        &mut self,
        ctx: &AuthContext,
        ledger: &mut W,
        recipient: Address,
        amount: u128,
    ) -> StratosResult<()> {
        self.roles.require(ctx, Role::Vault)?;
        require_non_zero(amount)?;

        self.transfer_out(ledger, recipient, amount, ctx.block_height)
    }

    /// Return the whole wrapped balance to the vault
    ///
    /// Funds still staked in validators come back through reconciliation.
    pub fn withdraw_all<W: WrappedNativeAsset>(&mut self, ctx: &AuthContext, ledger: &mut W) -> StratosResult<u128> {
        self.roles.require_vault_or_governor(ctx)?;

        let amount = ledger.balance_of(&self.addresses.strategy);
        if amount > 0 {
            self.transfer_out(ledger, self.addresses.vault, amount, ctx.block_height)?;
        }
        Ok(amount)
    }

    fn transfer_out<W: WrappedNativeAsset>(
        &mut self,
        ledger: &mut W,
        recipient: Address,
        amount: u128,
        block_height: u64,
    ) -> StratosResult<()> {
        ledger.transfer(&self.addresses.strategy, &recipient, amount)?;

        self.deposited_weth_accounted_for = self.deposited_weth_accounted_for.saturating_sub(amount);
        tracing::debug!(amount, "collateral withdrawn");
        self.events.emit(StratosEvent::Withdrawal {
            recipient,
            amount,
            block_height,
        });
        Ok(())
    }

    /// Harvest accrued consensus rewards to the harvester
    pub fn collect_rewards<W: WrappedNativeAsset>(&mut self, ctx: &AuthContext, ledger: &mut W) -> StratosResult<u128> {
        self.roles.require(ctx, Role::Harvester)?;
        self.accounting.pause.ensure_running()?;

        let amount = self.accounting.consensus_rewards;
        if amount == 0 {
            return Ok(0);
        }
        accountant::ensure_rewards_covered(&self.accounting, ledger.native_balance(&self.addresses.strategy))?;

        ledger.wrap(&self.addresses.strategy, amount)?;
        ledger.transfer(&self.addresses.strategy, &self.addresses.harvester, amount)?;
        self.accounting.consensus_rewards = 0;

        tracing::info!(amount, "consensus rewards collected");
        self.events.emit(StratosEvent::RewardsCollected {
            recipient: self.addresses.harvester,
            amount,
            block_height: ctx.block_height,
        });
        Ok(amount)
    }

    /// Collateral attributable to the strategy: wrapped balance plus staked units
    pub fn check_balance<W: WrappedNativeAsset>(&self, ledger: &W) -> StratosResult<u128> {
        let staked = u128::from(self.accounting.active_deposited_validators)
            .checked_mul(self.config.stake_unit)
            .ok_or(StratosError::Overflow)?;
        ledger
            .balance_of(&self.addresses.strategy)
            .checked_add(staked)
            .ok_or(StratosError::Overflow)
    }

    // ============ Staking Monitor ============

    /// Zero the staked tally so staking can resume
    pub fn reset_stake_eth_tally(&mut self, ctx: &AuthContext) -> StratosResult<()> {
        self.roles.require(ctx, Role::StakingMonitor)?;

        self.stake_eth_tally = 0;
        tracing::info!(block = ctx.block_height, "stake eth tally reset");
        self.events.emit(StratosEvent::StakeEthTallyReset {
            block_height: ctx.block_height,
        });
        Ok(())
    }

    /// Change the staking threshold
    pub fn set_stake_eth_threshold(&mut self, ctx: &AuthContext, threshold: u128) -> StratosResult<()> {
        self.roles.require(ctx, Role::Governor)?;

        self.stake_eth_threshold = threshold;
        tracing::info!(threshold, "stake eth threshold changed");
        self.events.emit(StratosEvent::StakeEthThresholdChanged {
            threshold,
            block_height: ctx.block_height,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratos_common::interfaces::{InMemoryNativeLedger, RecordingDepositContract};
    use stratos_common::types::ValidatorState;

    const GOVERNOR: Address = [1u8; 32];
    const STRATEGIST: Address = [2u8; 32];
    const REGISTRATOR: Address = [3u8; 32];
    const VAULT: Address = [4u8; 32];
    const HARVESTER: Address = [5u8; 32];
    const MONITOR: Address = [6u8; 32];
    const STRATEGY: Address = [7u8; 32];
    const DEPOSIT_CONTRACT: Address = [8u8; 32];
    const STRANGER: Address = [9u8; 32];

    fn config() -> AccountingConfig {
        AccountingConfig {
            stake_unit: 32,
            fuse_interval_start: 4,
            fuse_interval_end: 28,
            min_fuse_gap: 4,
            max_validators_delta: 3,
            max_consensus_rewards_delta: 32 * 332,
            max_eth_to_vault: 32,
            min_fix_cadence: 10,
            stake_eth_threshold: 32 * 4,
            max_validators_per_call: 3,
        }
    }

    fn strategy() -> NativeStakingStrategy {
        let roles = RoleBook::new(GOVERNOR)
            .with_role(Role::Strategist, STRATEGIST)
            .with_role(Role::Registrator, REGISTRATOR)
            .with_role(Role::Vault, VAULT)
            .with_role(Role::Harvester, HARVESTER)
            .with_role(Role::StakingMonitor, MONITOR);
        let addresses = StrategyAddresses {
            strategy: STRATEGY,
            vault: VAULT,
            harvester: HARVESTER,
            withdrawal_credentials: [0xAA; 32],
        };
        NativeStakingStrategy::new(config(), addresses, roles).unwrap()
    }

    fn ctx(caller: Address) -> AuthContext {
        AuthContext::new(caller, 100)
    }

    fn stake_data(seed: u8) -> ValidatorStakeData {
        ValidatorStakeData {
            pubkey: vec![seed; 48],
            signature: vec![seed; 96],
            deposit_data_root: [seed; 32],
        }
    }

    fn funded(amount: u128) -> InMemoryNativeLedger {
        let mut ledger = InMemoryNativeLedger::new();
        ledger.credit_wrapped(&STRATEGY, amount);
        ledger
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let bad = AccountingConfig {
            stake_unit: 0,
            ..config()
        };
        let addresses = strategy().addresses;
        assert!(NativeStakingStrategy::new(bad, addresses, RoleBook::new(GOVERNOR)).is_err());
    }

    #[test]
    fn test_role_checks() {
        let mut s = strategy();
        let mut ledger = InMemoryNativeLedger::new();

        assert_eq!(
            s.register_validator(&ctx(STRANGER), &[1u8; 48]),
            Err(StratosError::NotAuthorized { required: Role::Registrator, caller: STRANGER })
        );
        assert!(s.reconcile(&ctx(STRATEGIST), &mut ledger).is_err());
        assert!(s.set_fuse_interval(&ctx(REGISTRATOR), 4, 28).is_err());
        assert!(s.manually_fix(&ctx(GOVERNOR), &mut ledger, ManualFix::default()).is_err());
        assert!(s.reset_stake_eth_tally(&ctx(GOVERNOR)).is_err());
        assert!(s.events.is_empty());
    }

    #[test]
    fn test_stake_eth_batch() {
        let mut s = strategy();
        let mut ledger = funded(64);
        let mut deposits = RecordingDepositContract::new(DEPOSIT_CONTRACT);

        s.register_validator(&ctx(REGISTRATOR), &[1u8; 48]).unwrap();
        s.register_validator(&ctx(REGISTRATOR), &[2u8; 48]).unwrap();
        s.stake_eth(&ctx(REGISTRATOR), &mut ledger, &mut deposits, &[stake_data(1), stake_data(2)])
            .unwrap();

        assert_eq!(s.accounting.active_deposited_validators, 2);
        assert_eq!(s.stake_eth_tally, 64);
        assert_eq!(s.registry.state_of(&[1u8; 48]), ValidatorState::Staked);
        assert_eq!(deposits.deposits().len(), 2);
        assert_eq!(deposits.deposits()[0].withdrawal_credentials, [0xAA; 32]);
        assert_eq!(ledger.native_balance(&DEPOSIT_CONTRACT), 64);
        assert_eq!(ledger.balance_of(&STRATEGY), 0);
        assert_eq!(s.check_balance(&ledger).unwrap(), 64);
    }

    #[test]
    fn test_stake_eth_validates_whole_batch_first() {
        let mut s = strategy();
        let mut ledger = funded(96);
        let mut deposits = RecordingDepositContract::new(DEPOSIT_CONTRACT);

        s.register_validator(&ctx(REGISTRATOR), &[1u8; 48]).unwrap();
        // second entry not registered
        let result = s.stake_eth(&ctx(REGISTRATOR), &mut ledger, &mut deposits, &[stake_data(1), stake_data(2)]);
        assert!(matches!(result, Err(StratosError::NotRegistered { .. })));

        // duplicate entry
        let result = s.stake_eth(&ctx(REGISTRATOR), &mut ledger, &mut deposits, &[stake_data(1), stake_data(1)]);
        assert!(matches!(result, Err(StratosError::DuplicateValidator { .. })));

        assert!(deposits.deposits().is_empty());
        assert_eq!(s.accounting.active_deposited_validators, 0);
        assert_eq!(ledger.balance_of(&STRATEGY), 96);
    }

    #[test]
    fn test_stake_eth_limits() {
        let mut s = strategy();
        let mut ledger = funded(32 * 4);
        let mut deposits = RecordingDepositContract::new(DEPOSIT_CONTRACT);

        for seed in 1..=5u8 {
            s.register_validator(&ctx(REGISTRATOR), &[seed; 48]).unwrap();
        }

        let too_many: Vec<_> = (1..=4u8).map(stake_data).collect();
        assert!(matches!(
            s.stake_eth(&ctx(REGISTRATOR), &mut ledger, &mut deposits, &too_many),
            Err(StratosError::ExceedsMaximum { .. })
        ));

        let three: Vec<_> = (1..=3u8).map(stake_data).collect();
        s.stake_eth(&ctx(REGISTRATOR), &mut ledger, &mut deposits, &three).unwrap();

        // threshold of four units leaves room for exactly one more
        ledger.credit_wrapped(&STRATEGY, 32);
        s.stake_eth(&ctx(REGISTRATOR), &mut ledger, &mut deposits, &[stake_data(4)]).unwrap();
        ledger.credit_wrapped(&STRATEGY, 32);
        assert_eq!(
            s.stake_eth(&ctx(REGISTRATOR), &mut ledger, &mut deposits, &[stake_data(5)]),
            Err(StratosError::StakingThresholdExceeded { tally: 32 * 5, threshold: 32 * 4 })
        );

        s.reset_stake_eth_tally(&ctx(MONITOR)).unwrap();
        s.stake_eth(&ctx(REGISTRATOR), &mut ledger, &mut deposits, &[stake_data(5)]).unwrap();
        assert_eq!(s.accounting.active_deposited_validators, 5);
    }

    #[test]
    fn test_deposit_and_withdraw() {
        let mut s = strategy();
        let mut ledger = funded(100);

        s.deposit(&ctx(VAULT), &ledger, 60).unwrap();
        assert_eq!(s.deposited_weth_accounted_for, 60);
        assert!(matches!(
            s.deposit(&ctx(VAULT), &ledger, 41),
            Err(StratosError::InsufficientBalance { .. })
        ));
        assert_eq!(s.deposit_all(&ctx(VAULT), &ledger).unwrap(), 40);
        assert_eq!(s.deposit_all(&ctx(VAULT), &ledger).unwrap(), 0);

        let recipient = [42u8; 32];
        s.withdraw(&ctx(VAULT), &mut ledger, recipient, 30).unwrap();
        assert_eq!(ledger.balance_of(&recipient), 30);
        assert_eq!(s.deposited_weth_accounted_for, 70);

        assert!(s.withdraw_all(&ctx(REGISTRATOR), &mut ledger).is_err());
        assert_eq!(s.withdraw_all(&ctx(GOVERNOR), &mut ledger).unwrap(), 70);
        assert_eq!(ledger.balance_of(&VAULT), 70);
        assert_eq!(s.deposited_weth_accounted_for, 0);
    }

    #[test]
    fn test_collect_rewards() {
        let mut s = strategy();
        let mut ledger = InMemoryNativeLedger::new();
        s.accounting.active_deposited_validators = 1;
        ledger.credit_native(&STRATEGY, 3);

        s.reconcile(&ctx(REGISTRATOR), &mut ledger).unwrap();
        assert_eq!(s.accounting.consensus_rewards, 3);

        assert_eq!(s.collect_rewards(&ctx(HARVESTER), &mut ledger).unwrap(), 3);
        assert_eq!(s.accounting.consensus_rewards, 0);
        assert_eq!(ledger.balance_of(&HARVESTER), 3);
        assert_eq!(s.collect_rewards(&ctx(HARVESTER), &mut ledger).unwrap(), 0);
    }

    #[test]
    fn test_manual_pause_cycle() {
        let mut s = strategy();
        let mut ledger = InMemoryNativeLedger::new();

        s.pause(&ctx(STRATEGIST)).unwrap();
        assert!(s.is_paused());
        assert_eq!(s.reconcile(&ctx(REGISTRATOR), &mut ledger), Err(StratosError::StrategyPaused));
        assert!(s.register_validator(&ctx(REGISTRATOR), &[1u8; 48]).is_err());

        assert!(s.unpause(&ctx(STRATEGIST)).is_err());
        s.unpause(&ctx(GOVERNOR)).unwrap();
        assert!(!s.is_paused());
        assert_eq!(s.unpause(&ctx(GOVERNOR)), Err(StratosError::NotPaused));
    }

    #[test]
    fn test_set_stake_eth_threshold() {
        let mut s = strategy();
        s.set_stake_eth_threshold(&ctx(GOVERNOR), 32).unwrap();
        assert_eq!(s.stake_eth_threshold, 32);
        assert!(s.set_stake_eth_threshold(&ctx(MONITOR), 64).is_err());
    }
}
