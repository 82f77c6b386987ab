//! OToken Vault
//!
//! The vault side of the AMO: it mints and burns OTokens on behalf of the
//! strategy and takes collateral back.

use stratos_common::{
    check,
    errors::{StratosError, StratosResult},
    math::div_precisely,
};

/// Vault operations available to the AMO strategy
pub trait OTokenVault {
    /// Mint `amount` OTokens to the strategy
    fn mint_for_strategy(&mut self, amount: u128) -> StratosResult<()>;

    /// Burn `amount` OTokens held by the strategy
    fn burn_for_strategy(&mut self, amount: u128) -> StratosResult<()>;

    /// Accept `amount` collateral from the strategy
    fn receive_collateral(&mut self, amount: u128) -> StratosResult<()>;

    /// Value backing all OTokens
    fn total_value(&self) -> u128;

    /// OTokens outstanding
    fn otoken_supply(&self) -> u128;
}

/// Value per OToken after `supply` changes to `supply_after`, 18 decimals
///
/// An empty supply is fully backed.
pub fn backing_ratio(total_value: u128, supply_after: u128) -> StratosResult<u128> {
    if supply_after == 0 {
        return Ok(u128::MAX);
    }
    div_precisely(total_value, supply_after)
}

/// Fail with `Insolvent` unless the backing ratio meets `threshold`
pub fn ensure_solvent(total_value: u128, supply_after: u128, threshold: u128) -> StratosResult<()> {
    let ratio = backing_ratio(total_value, supply_after)?;
    check!(ratio >= threshold, StratosError::Insolvent { ratio, threshold });
    Ok(())
}

/// Vault kept in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryVault {
    /// Value backing the OTokens
    pub total_value: u128,
    /// OTokens outstanding
    pub otoken_supply: u128,
    /// Collateral received back from the strategy
    pub collateral_received: u128,
}

impl InMemoryVault {
    pub fn new(total_value: u128, otoken_supply: u128) -> Self {
        Self {
            total_value,
            otoken_supply,
            collateral_received: 0,
        }
    }
}

impl OTokenVault for InMemoryVault {
    fn mint_for_strategy(&mut self, amount: u128) -> StratosResult<()> {
        self.otoken_supply = self.otoken_supply.checked_add(amount).ok_or(StratosError::Overflow)?;
        Ok(())
    }

    fn burn_for_strategy(&mut self, amount: u128) -> StratosResult<()> {
        self.otoken_supply = self.otoken_supply.checked_sub(amount).ok_or(StratosError::Underflow)?;
        Ok(())
    }

    fn receive_collateral(&mut self, amount: u128) -> StratosResult<()> {
        self.collateral_received = self
            .collateral_received
            .checked_add(amount)
            .ok_or(StratosError::Overflow)?;
        Ok(())
    }

    fn total_value(&self) -> u128 {
        self.total_value
    }

    fn otoken_supply(&self) -> u128 {
        self.otoken_supply
    }
}
