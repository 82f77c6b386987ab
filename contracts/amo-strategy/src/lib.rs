//! AMO Strategy
//!
//! Keeps an OToken/collateral pool near parity by adding and removing
//! single sided liquidity instead of trading.
//!
//! ## Core Operations
//!
//! - **mint_and_add_otokens**: mint OTokens and add them when the pool is
//!   collateral heavy
//! - **remove_and_burn_otokens**: pull OTokens out and burn them when the
//!   pool is OToken heavy
//! - **remove_only_assets**: pull collateral out for the vault when the pool
//!   is collateral heavy
//! - **deposit / withdraw**: vault-facing flows that pair collateral with
//!   newly minted OTokens
//!
//! ## Safety Rails
//!
//! - Every rebalance must improve the pool balance without crossing parity
//!   (see [`balance`])
//! - Every rebalance keeps the vault's backing per OToken above the
//!   configured solvency threshold
//! - LP minted, LP burned and amounts received are bounded by
//!   `max_slippage`
//! - Slippage, balance and solvency are all checked against quotes before
//!   the vault or the pool is touched, and the balance rule is checked again
//!   on the pool's actual balances before the strategy records anything

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

pub mod balance;
pub mod pool;
pub mod vault;

#[cfg(test)]
mod integration_tests;

pub use balance::ensure_balance_improved;
pub use pool::{ConstantSumPool, PoolAdapter};
pub use vault::{ensure_solvent, InMemoryVault, OTokenVault};

use stratos_common::{
    access_control::{Role, RoleBook},
    check,
    config::AmoConfig,
    emergency::PauseState,
    errors::{StratosError, StratosResult},
    events::{EventLog, StratosEvent},
    math::{apply_slippage_down, apply_slippage_up, div_precisely, mul_div, mul_div_up, mul_truncate},
    precision::SCALE,
    types::{Address, AuthContext, Coin, PoolAmounts},
    validation::require_non_zero,
};

// ============ Strategy ============

/// AMO strategy state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AmoStrategy {
    pub config: AmoConfig,
    pub roles: RoleBook,
    /// Vault that owns the strategy's collateral
    pub vault_address: Address,
    /// Collateral transferred in by the vault and not yet deployed
    pub idle_collateral: u128,
    /// LP tokens held by the strategy
    pub lp_held: u128,
    pub events: EventLog,
}

impl AmoStrategy {
    pub fn new(config: AmoConfig, vault_address: Address, roles: RoleBook) -> StratosResult<Self> {
        config.validate()?;
        check!(
            vault_address != [0u8; 32],
            StratosError::InvalidInput { param: "vault", reason: "zero address" }
        );

        Ok(Self {
            config,
            roles,
            vault_address,
            idle_collateral: 0,
            lp_held: 0,
            events: EventLog::new(),
        })
    }

    // ============ Strategist Rebalancing ============

    /// Mint `amount` OTokens and add them to the pool single sided
    pub fn mint_and_add_otokens<P, V>(
        &mut self,
        ctx: &AuthContext,
        pool: &mut P,
        vault: &mut V,
        amount: u128,
    ) -> StratosResult<u128>
    where
        P: PoolAdapter,
        V: OTokenVault,
    {
        self.roles.require(ctx, Role::Strategist)?;
        require_non_zero(amount)?;

        let amounts = PoolAmounts::single(Coin::OToken, amount);
        let min_lp = self.quote_add(pool, amounts)?;

        let before = pool.balances();
        let after = PoolAmounts::new(
            before.collateral,
            before.otoken.checked_add(amount).ok_or(StratosError::Overflow)?,
        );
        ensure_balance_improved(&before, &after)?;

        let supply_after = vault.otoken_supply().checked_add(amount).ok_or(StratosError::Overflow)?;
        ensure_solvent(vault.total_value(), supply_after, self.config.solvency_threshold)?;

        self.add_otokens(pool, vault, amount, min_lp, Some(&before), ctx.block_height)
    }

    /// Remove `lp_amount` LP from the pool as OTokens and burn them
    pub fn remove_and_burn_otokens<P, V>(
        &mut self,
        ctx: &AuthContext,
        pool: &mut P,
        vault: &mut V,
        lp_amount: u128,
    ) -> StratosResult<u128>
    where
        P: PoolAdapter,
        V: OTokenVault,
    {
        self.roles.require(ctx, Role::Strategist)?;
        let (out, min_out) = self.quote_remove_one_coin(pool, lp_amount, Coin::OToken)?;

        let before = pool.balances();
        let after = PoolAmounts::new(
            before.collateral,
            before.otoken.checked_sub(out).ok_or(StratosError::Underflow)?,
        );
        ensure_balance_improved(&before, &after)?;

        let supply_after = vault.otoken_supply().checked_sub(out).ok_or(StratosError::Underflow)?;
        ensure_solvent(vault.total_value(), supply_after, self.config.solvency_threshold)?;

        self.remove_otokens(pool, vault, lp_amount, min_out, Some(&before), ctx.block_height)
    }

    /// Remove `lp_amount` LP from the pool as collateral and send it to the vault
    pub fn remove_only_assets<P, V>(
        &mut self,
        ctx: &AuthContext,
        pool: &mut P,
        vault: &mut V,
        lp_amount: u128,
    ) -> StratosResult<u128>
    where
        P: PoolAdapter,
        V: OTokenVault,
    {
        self.roles.require(ctx, Role::Strategist)?;
        let (out, min_out) = self.quote_remove_one_coin(pool, lp_amount, Coin::Collateral)?;

        let before = pool.balances();
        let after = PoolAmounts::new(
            before.collateral.checked_sub(out).ok_or(StratosError::Underflow)?,
            before.otoken,
        );
        ensure_balance_improved(&before, &after)?;
        ensure_solvent(vault.total_value(), vault.otoken_supply(), self.config.solvency_threshold)?;

        let received = pool.remove_liquidity_one_coin(lp_amount, Coin::Collateral, min_out)?;
        ensure_balance_improved(&before, &pool.balances())?;
        vault.receive_collateral(received)?;
        self.lp_held = self.lp_held.checked_sub(lp_amount).ok_or(StratosError::Underflow)?;

        tracing::info!(lp = lp_amount, collateral = received, "assets removed from pool");
        self.emit_removal(PoolAmounts::single(Coin::Collateral, received), lp_amount, ctx.block_height);
        Ok(received)
    }

    // ============ Vault Flows ============

    /// Record collateral the vault transferred to the strategy
    pub fn credit_collateral(&mut self, ctx: &AuthContext, amount: u128) -> StratosResult<()> {
        self.roles.require(ctx, Role::Vault)?;
        require_non_zero(amount)?;

        self.idle_collateral = self.idle_collateral.checked_add(amount).ok_or(StratosError::Overflow)?;
        tracing::debug!(amount, idle = self.idle_collateral, "collateral credited");
        Ok(())
    }

    /// Deploy `amount` of idle collateral, paired with newly minted OTokens
    ///
    /// OTokens minted move the pool toward parity:
    /// `clamp(pool_collateral + amount - pool_otoken, amount, multiplier * amount)`.
    pub fn deposit<P, V>(
        &mut self,
        ctx: &AuthContext,
        staking_pause: &PauseState,
        pool: &mut P,
        vault: &mut V,
        amount: u128,
    ) -> StratosResult<u128>
    where
        P: PoolAdapter,
        V: OTokenVault,
    {
        self.roles.require(ctx, Role::Vault)?;
        staking_pause.ensure_running()?;
        require_non_zero(amount)?;
        check!(
            amount <= self.idle_collateral,
            StratosError::InsufficientBalance {
                available: self.idle_collateral,
                requested: amount,
            }
        );

        let otokens = self.otokens_for_deposit(&pool.balances(), amount)?;
        let amounts = PoolAmounts::new(amount, otokens);
        let min_lp = self.quote_add(pool, amounts)?;

        vault.mint_for_strategy(otokens)?;
        let lp = pool.add_liquidity(amounts, min_lp)?;

        self.idle_collateral -= amount;
        self.lp_held = self.lp_held.checked_add(lp).ok_or(StratosError::Overflow)?;

        tracing::info!(collateral = amount, otokens, lp, "deposited to pool");
        self.events.emit(StratosEvent::Deposit {
            amount,
            block_height: ctx.block_height,
        });
        self.events.emit(StratosEvent::OTokensMinted {
            amount: otokens,
            block_height: ctx.block_height,
        });
        self.events.emit(StratosEvent::LiquidityAdded {
            collateral: amount,
            otoken: otokens,
            lp_minted: lp,
            block_height: ctx.block_height,
        });
        Ok(lp)
    }

    /// Deploy all idle collateral; a no-op when there is none
    pub fn deposit_all<P, V>(
        &mut self,
        ctx: &AuthContext,
        staking_pause: &PauseState,
        pool: &mut P,
        vault: &mut V,
    ) -> StratosResult<u128>
    where
        P: PoolAdapter,
        V: OTokenVault,
    {
        self.roles.require(ctx, Role::Vault)?;
        if self.idle_collateral == 0 {
            return Ok(0);
        }
        let amount = self.idle_collateral;
        self.deposit(ctx, staking_pause, pool, vault, amount)
    }

    /// Withdraw exactly `amount` collateral to the vault
    ///
    /// The proportional OToken side comes out with it and is burned. LP
    /// burned is bounded by `max_slippage` over the fair LP amount.
    pub fn withdraw<P, V>(
        &mut self,
        ctx: &AuthContext,
        staking_pause: &PauseState,
        pool: &mut P,
        vault: &mut V,
        recipient: Address,
        amount: u128,
    ) -> StratosResult<u128>
    where
        P: PoolAdapter,
        V: OTokenVault,
    {
        self.roles.require(ctx, Role::Vault)?;
        staking_pause.ensure_running()?;
        require_non_zero(amount)?;
        check!(
            recipient == self.vault_address,
            StratosError::InvalidInput { param: "recipient", reason: "must be the vault" }
        );

        let reserves = pool.balances();
        check!(
            amount <= reserves.collateral,
            StratosError::InsufficientBalance {
                available: reserves.collateral,
                requested: amount,
            }
        );
        let otoken_out = mul_div(amount, reserves.otoken, reserves.collateral)?;
        let amounts_out = PoolAmounts::new(amount, otoken_out);

        let value = amounts_out.total().ok_or(StratosError::Overflow)?;
        let fair_lp = mul_div_up(value, SCALE, pool.virtual_price())?;
        let max_lp = apply_slippage_up(fair_lp, self.config.max_slippage)?;
        let lp_needed = pool.calc_token_amount(amounts_out, false)?;
        check!(
            lp_needed <= max_lp,
            StratosError::SlippageExceeded { expected: max_lp, actual: lp_needed }
        );
        check!(
            lp_needed <= self.lp_held,
            StratosError::InsufficientBalance {
                available: self.lp_held,
                requested: lp_needed,
            }
        );

        let burned = pool.remove_liquidity_exact(amounts_out, max_lp.min(self.lp_held))?;
        if otoken_out > 0 {
            vault.burn_for_strategy(otoken_out)?;
        }
        vault.receive_collateral(amount)?;
        self.lp_held = self.lp_held.checked_sub(burned).ok_or(StratosError::Underflow)?;

        tracing::info!(collateral = amount, otokens = otoken_out, lp = burned, "withdrawn from pool");
        self.emit_removal(amounts_out, burned, ctx.block_height);
        Ok(burned)
    }

    /// Remove all liquidity proportionally and return every bit of
    /// collateral to the vault
    ///
    /// Available to the governor as an emergency exit, and not gated on the
    /// staking pause.
    pub fn withdraw_all<P, V>(&mut self, ctx: &AuthContext, pool: &mut P, vault: &mut V) -> StratosResult<PoolAmounts>
    where
        P: PoolAdapter,
        V: OTokenVault,
    {
        self.roles.require_vault_or_governor(ctx)?;

        let mut removed = PoolAmounts::default();
        if self.lp_held > 0 {
            let reserves = pool.balances();
            let supply = pool.total_supply();
            let min_amounts = PoolAmounts::new(
                apply_slippage_down(mul_div(self.lp_held, reserves.collateral, supply)?, self.config.max_slippage)?,
                apply_slippage_down(mul_div(self.lp_held, reserves.otoken, supply)?, self.config.max_slippage)?,
            );

            removed = pool.remove_liquidity_proportional(self.lp_held, min_amounts)?;
            if removed.otoken > 0 {
                vault.burn_for_strategy(removed.otoken)?;
            }
            let burned = self.lp_held;
            self.lp_held = 0;
            self.emit_removal(removed, burned, ctx.block_height);
        }

        let collateral = removed
            .collateral
            .checked_add(self.idle_collateral)
            .ok_or(StratosError::Overflow)?;
        if collateral > 0 {
            vault.receive_collateral(collateral)?;
            self.idle_collateral = 0;
        }

        tracing::info!(collateral, otokens = removed.otoken, "withdrew all");
        Ok(PoolAmounts::new(collateral, removed.otoken))
    }

    /// Value of the strategy's LP position plus idle collateral
    pub fn check_balance<P: PoolAdapter>(&self, pool: &P) -> StratosResult<u128> {
        mul_truncate(self.lp_held, pool.virtual_price())?
            .checked_add(self.idle_collateral)
            .ok_or(StratosError::Overflow)
    }

    // ============ Internals ============

    /// OTokens to pair with a collateral deposit
    fn otokens_for_deposit(&self, reserves: &PoolAmounts, amount: u128) -> StratosResult<u128> {
        let cap = amount
            .checked_mul(self.config.max_otoken_deposit_multiplier)
            .ok_or(StratosError::Overflow)?;
        let toward_parity = reserves
            .collateral
            .saturating_add(amount)
            .saturating_sub(reserves.otoken);
        Ok(toward_parity.max(amount).min(cap))
    }

    /// Minimum LP for adding `amounts`, checked against the pool's quote
    fn quote_add<P: PoolAdapter>(&self, pool: &P, amounts: PoolAmounts) -> StratosResult<u128> {
        let value = amounts.total().ok_or(StratosError::Overflow)?;
        let fair_lp = div_precisely(value, pool.virtual_price())?;
        let min_lp = apply_slippage_down(fair_lp, self.config.max_slippage)?;

        let quoted = pool.calc_token_amount(amounts, true)?;
        check!(
            quoted >= min_lp,
            StratosError::SlippageExceeded { expected: min_lp, actual: quoted }
        );
        Ok(min_lp)
    }

    /// Quoted single coin output for `lp_amount` and its slippage floor
    fn quote_remove_one_coin<P: PoolAdapter>(
        &self,
        pool: &P,
        lp_amount: u128,
        coin: Coin,
    ) -> StratosResult<(u128, u128)> {
        require_non_zero(lp_amount)?;
        check!(
            lp_amount <= self.lp_held,
            StratosError::InsufficientBalance {
                available: self.lp_held,
                requested: lp_amount,
            }
        );

        let fair_out = mul_truncate(lp_amount, pool.virtual_price())?;
        let min_out = apply_slippage_down(fair_out, self.config.max_slippage)?;
        let out = pool.calc_withdraw_one_coin(lp_amount, coin)?;
        check!(
            out >= min_out,
            StratosError::SlippageExceeded { expected: min_out, actual: out }
        );
        Ok((out, min_out))
    }

    /// Mint and add OTokens once every check has passed
    ///
    /// With `before`, the pool's actual balances after the add must improve
    /// on it, measured after the pool call returns.
    fn add_otokens<P, V>(
        &mut self,
        pool: &mut P,
        vault: &mut V,
        amount: u128,
        min_lp: u128,
        before: Option<&PoolAmounts>,
        block_height: u64,
    ) -> StratosResult<u128>
    where
        P: PoolAdapter,
        V: OTokenVault,
    {
        vault.mint_for_strategy(amount)?;
        let lp = pool.add_liquidity(PoolAmounts::single(Coin::OToken, amount), min_lp)?;
        if let Some(before) = before {
            ensure_balance_improved(before, &pool.balances())?;
        }
        self.lp_held = self.lp_held.checked_add(lp).ok_or(StratosError::Overflow)?;

        tracing::info!(otokens = amount, lp, "otokens minted into pool");
        self.events.emit(StratosEvent::OTokensMinted { amount, block_height });
        self.events.emit(StratosEvent::LiquidityAdded {
            collateral: 0,
            otoken: amount,
            lp_minted: lp,
            block_height,
        });
        Ok(lp)
    }

    /// Remove and burn OTokens once every check has passed
    ///
    /// `before` works as in [`Self::add_otokens`].
    fn remove_otokens<P, V>(
        &mut self,
        pool: &mut P,
        vault: &mut V,
        lp_amount: u128,
        min_out: u128,
        before: Option<&PoolAmounts>,
        block_height: u64,
    ) -> StratosResult<u128>
    where
        P: PoolAdapter,
        V: OTokenVault,
    {
        let burned = pool.remove_liquidity_one_coin(lp_amount, Coin::OToken, min_out)?;
        if let Some(before) = before {
            ensure_balance_improved(before, &pool.balances())?;
        }
        vault.burn_for_strategy(burned)?;
        self.lp_held = self.lp_held.checked_sub(lp_amount).ok_or(StratosError::Underflow)?;

        tracing::info!(otokens = burned, lp = lp_amount, "otokens removed and burned");
        self.emit_removal(PoolAmounts::single(Coin::OToken, burned), lp_amount, block_height);
        Ok(burned)
    }

    fn emit_removal(&mut self, amounts: PoolAmounts, lp_burned: u128, block_height: u64) {
        self.events.emit(StratosEvent::LiquidityRemoved {
            collateral: amounts.collateral,
            otoken: amounts.otoken,
            lp_burned,
            block_height,
        });
        if amounts.otoken > 0 {
            self.events.emit(StratosEvent::OTokensBurned {
                amount: amounts.otoken,
                block_height,
            });
        }
        if amounts.collateral > 0 {
            self.events.emit(StratosEvent::Withdrawal {
                recipient: self.vault_address,
                amount: amounts.collateral,
                block_height,
            });
        }
    }
}
