//! Pool Balance Check
//!
//! Every strategist rebalance must move the pool toward parity without
//! crossing it. With `diff = collateral - otoken`:
//!
//! - OToken heavy (`diff <= 0`): `diff` must rise and stay `<= 0`
//! - collateral heavy (`diff >= 0`): `diff` must fall and stay `>= 0`
//!
//! A pool exactly at parity satisfies both sides, so any change is rejected.

use stratos_common::{
    check,
    errors::{StratosError, StratosResult},
    types::PoolAmounts,
};

/// Check that moving from `before` to `after` improves the pool balance
pub fn ensure_balance_improved(before: &PoolAmounts, after: &PoolAmounts) -> StratosResult<()> {
    let diff_before = before.imbalance();
    let diff_after = after.imbalance();

    if diff_before <= 0 {
        check!(
            diff_after <= 0,
            StratosError::OTokensOvershotPeg { diff_before, diff_after }
        );
        check!(
            diff_before < diff_after,
            StratosError::OTokensBalanceWorse { diff_before, diff_after }
        );
    }

    if diff_before >= 0 {
        check!(
            diff_after >= 0,
            StratosError::AssetsOvershotPeg { diff_before, diff_after }
        );
        check!(
            diff_after < diff_before,
            StratosError::AssetsBalanceWorse { diff_before, diff_after }
        );
    }

    Ok(())
}
