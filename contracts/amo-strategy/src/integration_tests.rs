//! Integration Tests
//!
//! AMO scenarios against the in-memory constant-sum pool and vault.

#[cfg(test)]
mod tests {
    use crate::*;
    use proptest::prelude::*;
    use stratos_common::emergency::PauseCause;
    use stratos_common::events::EventType;

    const GOVERNOR: Address = [1u8; 32];
    const STRATEGIST: Address = [2u8; 32];
    const VAULT: Address = [4u8; 32];

    fn strategy() -> AmoStrategy {
        let roles = RoleBook::new(GOVERNOR)
            .with_role(Role::Strategist, STRATEGIST)
            .with_role(Role::Vault, VAULT);
        AmoStrategy::new(AmoConfig::default(), VAULT, roles).unwrap()
    }

    fn strategist() -> AuthContext {
        AuthContext::new(STRATEGIST, 10)
    }

    fn vault_ctx() -> AuthContext {
        AuthContext::new(VAULT, 10)
    }

    fn rich_vault() -> InMemoryVault {
        InMemoryVault::new(1_000_000_000, 1_000_000_000)
    }

    /// Pool that quotes like a constant-sum pool but, on every add or
    /// single coin removal, also trades `skim` OTokens in for collateral
    struct SkimmingPool {
        inner: ConstantSumPool,
        skim: u128,
    }

    impl PoolAdapter for SkimmingPool {
        fn balances(&self) -> PoolAmounts {
            self.inner.balances()
        }

        fn total_supply(&self) -> u128 {
            self.inner.total_supply()
        }

        fn virtual_price(&self) -> u128 {
            self.inner.virtual_price()
        }

        fn calc_token_amount(&self, amounts: PoolAmounts, is_deposit: bool) -> StratosResult<u128> {
            self.inner.calc_token_amount(amounts, is_deposit)
        }

        fn calc_withdraw_one_coin(&self, lp_in: u128, coin: Coin) -> StratosResult<u128> {
            self.inner.calc_withdraw_one_coin(lp_in, coin)
        }

        fn add_liquidity(&mut self, amounts: PoolAmounts, min_lp_out: u128) -> StratosResult<u128> {
            let lp = self.inner.add_liquidity(amounts, min_lp_out)?;
            self.inner.swap(Coin::OToken, self.skim)?;
            Ok(lp)
        }

        fn remove_liquidity_exact(&mut self, amounts_out: PoolAmounts, max_lp_in: u128) -> StratosResult<u128> {
            self.inner.remove_liquidity_exact(amounts_out, max_lp_in)
        }

        fn remove_liquidity_proportional(&mut self, lp_in: u128, min_amounts_out: PoolAmounts) -> StratosResult<PoolAmounts> {
            self.inner.remove_liquidity_proportional(lp_in, min_amounts_out)
        }

        fn remove_liquidity_one_coin(&mut self, lp_in: u128, coin: Coin, min_out: u128) -> StratosResult<u128> {
            let out = self.inner.remove_liquidity_one_coin(lp_in, coin, min_out)?;
            self.inner.swap(Coin::OToken, self.skim)?;
            Ok(out)
        }
    }

    // ============================================================================
    // Rebalancing
    // ============================================================================

    #[test]
    fn test_overshoot_at_parity_rejected() {
        let mut s = strategy();
        let mut pool = ConstantSumPool::seeded(1_000, 1_000);
        let mut vault = rich_vault();

        let result = s.mint_and_add_otokens(&strategist(), &mut pool, &mut vault, 600);

        assert_eq!(
            result,
            Err(StratosError::OTokensBalanceWorse { diff_before: 0, diff_after: -600 })
        );
        assert_eq!(pool.balances(), PoolAmounts::new(1_000, 1_000));
        assert_eq!(pool.total_supply(), 2_000);
        assert_eq!(vault, rich_vault());
        assert_eq!(s.lp_held, 0);
        assert!(s.events.is_empty());
    }

    #[test]
    fn test_mint_into_collateral_heavy_pool() {
        let mut s = strategy();
        let mut pool = ConstantSumPool::seeded(1_300, 1_000);
        let mut vault = rich_vault();

        let lp = s.mint_and_add_otokens(&strategist(), &mut pool, &mut vault, 200).unwrap();

        assert_eq!(lp, 200);
        assert_eq!(s.lp_held, 200);
        assert_eq!(pool.balances(), PoolAmounts::new(1_300, 1_200));
        assert_eq!(vault.otoken_supply(), 1_000_000_200);
        assert_eq!(s.events.filter_by_type(EventType::OTokensMinted).len(), 1);
        assert_eq!(s.events.filter_by_type(EventType::LiquidityAdded).len(), 1);

        // Crossing parity is refused
        assert_eq!(
            s.mint_and_add_otokens(&strategist(), &mut pool, &mut vault, 200),
            Err(StratosError::AssetsOvershotPeg { diff_before: 100, diff_after: -100 })
        );
    }

    #[test]
    fn test_remove_and_burn_from_otoken_heavy_pool() {
        let mut s = strategy();
        let mut pool = ConstantSumPool::seeded(1_000, 1_300);
        let mut vault = rich_vault();
        s.lp_held = 500;

        let burned = s.remove_and_burn_otokens(&strategist(), &mut pool, &mut vault, 200).unwrap();

        assert_eq!(burned, 200);
        assert_eq!(s.lp_held, 300);
        assert_eq!(pool.balances(), PoolAmounts::new(1_000, 1_100));
        assert_eq!(vault.otoken_supply(), 1_000_000_000 - 200);

        // Removing more OTokens would overshoot
        assert_eq!(
            s.remove_and_burn_otokens(&strategist(), &mut pool, &mut vault, 200),
            Err(StratosError::OTokensOvershotPeg { diff_before: -100, diff_after: 100 })
        );
        assert_eq!(s.lp_held, 300);
    }

    #[test]
    fn test_remove_only_assets() {
        let mut s = strategy();
        let mut pool = ConstantSumPool::seeded(1_500, 1_000);
        let mut vault = rich_vault();
        s.lp_held = 400;

        let received = s.remove_only_assets(&strategist(), &mut pool, &mut vault, 300).unwrap();

        assert_eq!(received, 300);
        assert_eq!(vault.collateral_received, 300);
        assert_eq!(pool.balances(), PoolAmounts::new(1_200, 1_000));

        // The pool is still collateral heavy: removing collateral is fine,
        // removing OTokens is not
        assert!(matches!(
            s.remove_and_burn_otokens(&strategist(), &mut pool, &mut vault, 50),
            Err(StratosError::AssetsBalanceWorse { .. })
        ));
    }

    #[test]
    fn test_actual_overshoot_after_add_rejected() {
        let mut s = strategy();
        let mut pool = SkimmingPool { inner: ConstantSumPool::seeded(1_300, 1_000), skim: 100 };
        let mut vault = rich_vault();

        // Quoted: 1300 / 1200, still collateral heavy. Executed: 1200 / 1300.
        assert_eq!(
            s.mint_and_add_otokens(&strategist(), &mut pool, &mut vault, 200),
            Err(StratosError::AssetsOvershotPeg { diff_before: 300, diff_after: -100 })
        );
        assert_eq!(s.lp_held, 0);
        assert!(s.events.is_empty());

        // Without the skim the same rebalance goes through
        let mut pool = SkimmingPool { inner: ConstantSumPool::seeded(1_300, 1_000), skim: 0 };
        assert_eq!(s.mint_and_add_otokens(&strategist(), &mut pool, &mut vault, 200), Ok(200));
    }

    #[test]
    fn test_actual_overshoot_after_removal_rejected() {
        let mut s = strategy();
        let mut pool = SkimmingPool { inner: ConstantSumPool::seeded(1_500, 1_000), skim: 250 };
        let mut vault = rich_vault();
        s.lp_held = 400;

        // Quoted: 1200 / 1000. Executed: 950 / 1250.
        assert_eq!(
            s.remove_only_assets(&strategist(), &mut pool, &mut vault, 300),
            Err(StratosError::AssetsOvershotPeg { diff_before: 500, diff_after: -300 })
        );
        assert_eq!(s.lp_held, 400);
        assert_eq!(vault.collateral_received, 0);
        assert!(s.events.is_empty());
    }

    // ============================================================================
    // Vault Flows
    // ============================================================================

    #[test]
    fn test_deposit_withdraw_cycle() {
        let mut s = strategy();
        let mut pool = ConstantSumPool::seeded(1_000, 1_000);
        let mut vault = rich_vault();
        let running = PauseState::Running;

        s.credit_collateral(&vault_ctx(), 100).unwrap();
        let lp = s.deposit_all(&vault_ctx(), &running, &mut pool, &mut vault).unwrap();

        assert_eq!(lp, 200);
        assert_eq!(s.idle_collateral, 0);
        assert_eq!(pool.balances(), PoolAmounts::new(1_100, 1_100));
        assert_eq!(vault.otoken_supply(), 1_000_000_100);
        assert_eq!(s.check_balance(&pool).unwrap(), 200);

        let burned = s.withdraw(&vault_ctx(), &running, &mut pool, &mut vault, VAULT, 50).unwrap();
        assert_eq!(burned, 100);
        assert_eq!(s.lp_held, 100);
        assert_eq!(vault.collateral_received, 50);
        assert_eq!(vault.otoken_supply(), 1_000_000_050);

        let removed = s.withdraw_all(&AuthContext::new(GOVERNOR, 11), &mut pool, &mut vault).unwrap();
        assert_eq!(removed, PoolAmounts::new(50, 50));
        assert_eq!(s.lp_held, 0);
        assert_eq!(vault.collateral_received, 100);
        assert_eq!(vault.otoken_supply(), 1_000_000_000);
        assert_eq!(pool.balances(), PoolAmounts::new(1_000, 1_000));
    }

    #[test]
    fn test_deposit_mints_toward_parity() {
        let mut s = strategy();
        let mut pool = ConstantSumPool::seeded(1_150, 1_000);
        let mut vault = rich_vault();

        s.credit_collateral(&vault_ctx(), 100).unwrap();
        s.deposit(&vault_ctx(), &PauseState::Running, &mut pool, &mut vault, 100).unwrap();

        // 1150 + 100 - 1000 = 250, capped at twice the deposit
        assert_eq!(pool.balances(), PoolAmounts::new(1_250, 1_200));
    }

    #[test]
    fn test_vault_flows_respect_staking_pause() {
        let mut s = strategy();
        let mut pool = ConstantSumPool::seeded(1_000, 1_000);
        let mut vault = rich_vault();
        let paused = PauseState::Paused(PauseCause::FuseBlown);

        s.credit_collateral(&vault_ctx(), 100).unwrap();
        assert_eq!(
            s.deposit(&vault_ctx(), &paused, &mut pool, &mut vault, 100),
            Err(StratosError::StrategyPaused)
        );

        s.deposit(&vault_ctx(), &PauseState::Running, &mut pool, &mut vault, 100).unwrap();
        assert_eq!(
            s.withdraw(&vault_ctx(), &paused, &mut pool, &mut vault, VAULT, 10),
            Err(StratosError::StrategyPaused)
        );

        // Emergency exit still works
        s.withdraw_all(&vault_ctx(), &mut pool, &mut vault).unwrap();
        assert_eq!(s.lp_held, 0);
    }

    #[test]
    fn test_withdraw_only_to_vault() {
        let mut s = strategy();
        let mut pool = ConstantSumPool::seeded(1_000, 1_000);
        let mut vault = rich_vault();
        s.lp_held = 100;

        assert!(matches!(
            s.withdraw(&vault_ctx(), &PauseState::Running, &mut pool, &mut vault, [9u8; 32], 10),
            Err(StratosError::InvalidInput { param: "recipient", .. })
        ));
        assert!(s.withdraw_all(&strategist(), &mut pool, &mut vault).is_err());
    }

    // ============================================================================
    // Properties
    // ============================================================================

    proptest! {
        /// Any successful rebalance shrinks the imbalance without flipping it
        #[test]
        fn prop_rebalance_never_worsens_pool(
            collateral in 1_000u128..1_000_000,
            otoken in 1_000u128..1_000_000,
            op in 0u8..3,
            amount in 1u128..10_000,
        ) {
            let mut s = strategy();
            let mut pool = ConstantSumPool::seeded(collateral, otoken);
            let mut vault = rich_vault();
            s.lp_held = pool.total_supply() / 2;

            let before = pool.balances().imbalance();
            let result = match op {
                0 => s.mint_and_add_otokens(&strategist(), &mut pool, &mut vault, amount),
                1 => s.remove_and_burn_otokens(&strategist(), &mut pool, &mut vault, amount),
                _ => s.remove_only_assets(&strategist(), &mut pool, &mut vault, amount),
            };
            let after = pool.balances().imbalance();

            if result.is_ok() {
                prop_assert!(after.abs() < before.abs());
                prop_assert!(before.signum() * after.signum() >= 0);
            } else {
                prop_assert_eq!(after, before);
                prop_assert!(s.events.is_empty());
            }
        }

        /// Minting X into the pool and burning the LP it produced returns
        /// the pool to its starting balances within the slippage bound.
        #[test]
        fn prop_mint_then_burn_round_trip(
            collateral in 1_000u128..1_000_000,
            otoken in 1_000u128..1_000_000,
            amount in 1u128..100_000,
        ) {
            let mut s = strategy();
            let mut pool = ConstantSumPool::seeded(collateral, otoken);
            let mut vault = rich_vault();
            let before = pool.balances();

            let lp = s.add_otokens(&mut pool, &mut vault, amount, 0, None, 1).unwrap();
            let burned = s.remove_otokens(&mut pool, &mut vault, lp, 0, None, 2).unwrap();

            let after = pool.balances();
            let tolerance = apply_slippage_up(amount, s.config.max_slippage).unwrap() - amount + 1;

            prop_assert_eq!(after.collateral, before.collateral);
            prop_assert!(burned <= amount);
            prop_assert!(after.otoken >= before.otoken);
            prop_assert!(after.otoken - before.otoken <= tolerance);
            prop_assert_eq!(s.lp_held, 0);
        }
    }
}
