//! Pool Adapter
//!
//! The AMO's handle on a two asset (collateral, OToken) liquidity pool. The
//! quote functions let the strategy check slippage and the pool balance
//! effect of an operation before anything moves.

use stratos_common::{
    check,
    errors::{StratosError, StratosResult},
    math::{div_precisely, mul_div, mul_div_up},
    precision::SCALE,
    types::{Coin, PoolAmounts},
};

/// Two asset liquidity pool
pub trait PoolAdapter {
    /// Pool reserves
    fn balances(&self) -> PoolAmounts;

    /// Outstanding LP tokens
    fn total_supply(&self) -> u128;

    /// Value of one LP token in pool units (18 decimals)
    fn virtual_price(&self) -> u128;

    /// LP minted for a deposit of `amounts`, or burned for a withdrawal of
    /// exactly `amounts` when `is_deposit` is false
    fn calc_token_amount(&self, amounts: PoolAmounts, is_deposit: bool) -> StratosResult<u128>;

    /// Amount of `coin` received for burning `lp_in`
    fn calc_withdraw_one_coin(&self, lp_in: u128, coin: Coin) -> StratosResult<u128>;

    /// Deposit `amounts`, minting at least `min_lp_out`
    fn add_liquidity(&mut self, amounts: PoolAmounts, min_lp_out: u128) -> StratosResult<u128>;

    /// Withdraw exactly `amounts_out`, burning at most `max_lp_in`
    fn remove_liquidity_exact(&mut self, amounts_out: PoolAmounts, max_lp_in: u128) -> StratosResult<u128>;

    /// Burn `lp_in` for a proportional share of both reserves
    fn remove_liquidity_proportional(&mut self, lp_in: u128, min_amounts_out: PoolAmounts) -> StratosResult<PoolAmounts>;

    /// Burn `lp_in` for a single coin
    fn remove_liquidity_one_coin(&mut self, lp_in: u128, coin: Coin, min_out: u128) -> StratosResult<u128>;
}

// ============================================================================
// Constant-sum pool
// ============================================================================

/// In-memory pool pricing both coins at exactly one unit each
///
/// LP tokens are a pro-rata claim on the summed reserves. Used to simulate
/// a strategy off-chain and in tests; it has no fees and no amplification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstantSumPool {
    reserves: PoolAmounts,
    supply: u128,
}

impl ConstantSumPool {
    /// Pool seeded by a first depositor, who receives `sum` LP
    pub fn seeded(collateral: u128, otoken: u128) -> Self {
        Self {
            reserves: PoolAmounts::new(collateral, otoken),
            supply: collateral.saturating_add(otoken),
        }
    }

    /// Outside trade that swaps one coin for the other at par
    pub fn swap(&mut self, coin_in: Coin, amount: u128) -> StratosResult<()> {
        let coin_out = match coin_in {
            Coin::Collateral => Coin::OToken,
            Coin::OToken => Coin::Collateral,
        };
        let available = self.reserves.get(coin_out);
        check!(
            available >= amount,
            StratosError::InsufficientBalance { available, requested: amount }
        );
        self.credit(coin_in, amount)?;
        self.debit(coin_out, amount)
    }

    fn total(&self) -> StratosResult<u128> {
        self.reserves.total().ok_or(StratosError::Overflow)
    }

    fn credit(&mut self, coin: Coin, amount: u128) -> StratosResult<()> {
        let slot = self.slot(coin);
        *slot = slot.checked_add(amount).ok_or(StratosError::Overflow)?;
        Ok(())
    }

    fn debit(&mut self, coin: Coin, amount: u128) -> StratosResult<()> {
        let slot = self.slot(coin);
        *slot = slot.checked_sub(amount).ok_or(StratosError::InsufficientBalance {
            available: *slot,
            requested: amount,
        })?;
        Ok(())
    }

    fn slot(&mut self, coin: Coin) -> &mut u128 {
        match coin {
            Coin::Collateral => &mut self.reserves.collateral,
            Coin::OToken => &mut self.reserves.otoken,
        }
    }

    fn burn(&mut self, lp_in: u128) -> StratosResult<()> {
        check!(lp_in > 0, StratosError::ZeroAmount);
        self.supply = self.supply.checked_sub(lp_in).ok_or(StratosError::InsufficientBalance {
            available: self.supply,
            requested: lp_in,
        })?;
        Ok(())
    }

    fn ensure_reserves(&self, amounts: &PoolAmounts) -> StratosResult<()> {
        for coin in [Coin::Collateral, Coin::OToken] {
            let available = self.reserves.get(coin);
            let requested = amounts.get(coin);
            check!(
                available >= requested,
                StratosError::InsufficientBalance { available, requested }
            );
        }
        Ok(())
    }
}

impl PoolAdapter for ConstantSumPool {
    fn balances(&self) -> PoolAmounts {
        self.reserves
    }

    fn total_supply(&self) -> u128 {
        self.supply
    }

    fn virtual_price(&self) -> u128 {
        match self.total() {
            Ok(total) if self.supply > 0 => div_precisely(total, self.supply).unwrap_or(SCALE),
            _ => SCALE,
        }
    }

    fn calc_token_amount(&self, amounts: PoolAmounts, is_deposit: bool) -> StratosResult<u128> {
        let value = amounts.total().ok_or(StratosError::Overflow)?;
        let total = self.total()?;
        if self.supply == 0 || total == 0 {
            return Ok(value);
        }
        if is_deposit {
            mul_div(value, self.supply, total)
        } else {
            mul_div_up(value, self.supply, total)
        }
    }

    fn calc_withdraw_one_coin(&self, lp_in: u128, coin: Coin) -> StratosResult<u128> {
        check!(lp_in <= self.supply, StratosError::InsufficientBalance {
            available: self.supply,
            requested: lp_in,
        });
        let out = mul_div(lp_in, self.total()?, self.supply)?;
        let available = self.reserves.get(coin);
        check!(
            out <= available,
            StratosError::InsufficientBalance { available, requested: out }
        );
        Ok(out)
    }

    fn add_liquidity(&mut self, amounts: PoolAmounts, min_lp_out: u128) -> StratosResult<u128> {
        let lp = self.calc_token_amount(amounts, true)?;
        check!(lp > 0, StratosError::ZeroAmount);
        check!(
            lp >= min_lp_out,
            StratosError::SlippageExceeded { expected: min_lp_out, actual: lp }
        );

        self.credit(Coin::Collateral, amounts.collateral)?;
        self.credit(Coin::OToken, amounts.otoken)?;
        self.supply = self.supply.checked_add(lp).ok_or(StratosError::Overflow)?;
        Ok(lp)
    }

    fn remove_liquidity_exact(&mut self, amounts_out: PoolAmounts, max_lp_in: u128) -> StratosResult<u128> {
        self.ensure_reserves(&amounts_out)?;
        let lp = self.calc_token_amount(amounts_out, false)?;
        check!(
            lp <= max_lp_in,
            StratosError::SlippageExceeded { expected: max_lp_in, actual: lp }
        );

        self.burn(lp)?;
        self.debit(Coin::Collateral, amounts_out.collateral)?;
        self.debit(Coin::OToken, amounts_out.otoken)?;
        Ok(lp)
    }

    fn remove_liquidity_proportional(&mut self, lp_in: u128, min_amounts_out: PoolAmounts) -> StratosResult<PoolAmounts> {
        check!(lp_in <= self.supply, StratosError::InsufficientBalance {
            available: self.supply,
            requested: lp_in,
        });
        let out = PoolAmounts::new(
            mul_div(lp_in, self.reserves.collateral, self.supply)?,
            mul_div(lp_in, self.reserves.otoken, self.supply)?,
        );
        for coin in [Coin::Collateral, Coin::OToken] {
            check!(
                out.get(coin) >= min_amounts_out.get(coin),
                StratosError::SlippageExceeded {
                    expected: min_amounts_out.get(coin),
                    actual: out.get(coin),
                }
            );
        }

        self.burn(lp_in)?;
        self.debit(Coin::Collateral, out.collateral)?;
        self.debit(Coin::OToken, out.otoken)?;
        Ok(out)
    }

    fn remove_liquidity_one_coin(&mut self, lp_in: u128, coin: Coin, min_out: u128) -> StratosResult<u128> {
        let out = self.calc_withdraw_one_coin(lp_in, coin)?;
        check!(
            out >= min_out,
            StratosError::SlippageExceeded { expected: min_out, actual: out }
        );

        self.burn(lp_in)?;
        self.debit(coin, out)?;
        Ok(out)
    }
}
