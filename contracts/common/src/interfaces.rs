//! Collaborator Interfaces
//!
//! Call contracts of the external systems a strategy talks to. The core
//! never assumes anything beyond these signatures.
//!
//! In-memory implementations are provided for schedulers that simulate a
//! strategy off-chain and for tests.

use crate::errors::{StratosError, StratosResult};
use crate::types::Address;
use crate::Vec;

#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::BTreeMap;

// ============================================================================
// Traits
// ============================================================================

/// Wrapped native asset (WETH-like) plus the raw native balance ledger
pub trait WrappedNativeAsset {
    /// Raw native balance held by `holder`
    fn native_balance(&self, holder: &Address) -> u128;

    /// Wrapped token balance held by `holder`
    fn balance_of(&self, holder: &Address) -> u128;

    /// Convert `amount` of `holder`'s native balance into wrapped tokens
    fn wrap(&mut self, holder: &Address, amount: u128) -> StratosResult<()>;

    /// Convert `amount` of `holder`'s wrapped tokens back to native
    fn unwrap(&mut self, holder: &Address, amount: u128) -> StratosResult<()>;

    /// Transfer wrapped tokens
    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> StratosResult<()>;

    /// Transfer raw native balance
    fn send_native(&mut self, from: &Address, to: &Address, amount: u128) -> StratosResult<()>;
}

/// Beacon chain deposit contract
///
/// One-way: a deposit can never be reverted by the strategy.
pub trait DepositContract {
    /// Address that receives the native asset being deposited
    fn address(&self) -> Address;

    /// Register a validator deposit of `amount`
    fn deposit(
        &mut self,
        pubkey: &[u8],
        withdrawal_credentials: &[u8; 32],
        signature: &[u8],
        deposit_data_root: &[u8; 32],
        amount: u128,
    ) -> StratosResult<()>;
}

// ============================================================================
// In-memory implementations
// ============================================================================

/// Native and wrapped balances kept in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryNativeLedger {
    native: BTreeMap<Address, u128>,
    wrapped: BTreeMap<Address, u128>,
}

impl InMemoryNativeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit raw native balance (e.g. a beacon chain sweep arriving)
    pub fn credit_native(&mut self, holder: &Address, amount: u128) {
        let entry = self.native.entry(*holder).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Credit wrapped balance (e.g. the vault funding a strategy)
    pub fn credit_wrapped(&mut self, holder: &Address, amount: u128) {
        let entry = self.wrapped.entry(*holder).or_insert(0);
        *entry = entry.saturating_add(amount);
    }
}

fn debit(map: &mut BTreeMap<Address, u128>, holder: &Address, amount: u128) -> StratosResult<()> {
    let available = map.get(holder).copied().unwrap_or(0);
    if available < amount {
        return Err(StratosError::InsufficientBalance {
            available,
            requested: amount,
        });
    }
    map.insert(*holder, available - amount);
    Ok(())
}

fn credit(map: &mut BTreeMap<Address, u128>, holder: &Address, amount: u128) -> StratosResult<()> {
    let entry = map.entry(*holder).or_insert(0);
    *entry = entry.checked_add(amount).ok_or(StratosError::Overflow)?;
    Ok(())
}

impl WrappedNativeAsset for InMemoryNativeLedger {
    fn native_balance(&self, holder: &Address) -> u128 {
        self.native.get(holder).copied().unwrap_or(0)
    }

    fn balance_of(&self, holder: &Address) -> u128 {
        self.wrapped.get(holder).copied().unwrap_or(0)
    }

    fn wrap(&mut self, holder: &Address, amount: u128) -> StratosResult<()> {
        debit(&mut self.native, holder, amount)?;
        credit(&mut self.wrapped, holder, amount)
    }

    fn unwrap(&mut self, holder: &Address, amount: u128) -> StratosResult<()> {
        debit(&mut self.wrapped, holder, amount)?;
        credit(&mut self.native, holder, amount)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> StratosResult<()> {
        debit(&mut self.wrapped, from, amount)?;
        credit(&mut self.wrapped, to, amount)
    }

    fn send_native(&mut self, from: &Address, to: &Address, amount: u128) -> StratosResult<()> {
        debit(&mut self.native, from, amount)?;
        credit(&mut self.native, to, amount)
    }
}

/// A deposit seen by [`RecordingDepositContract`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRecord {
    pub pubkey: Vec<u8>,
    pub withdrawal_credentials: [u8; 32],
    pub amount: u128,
}

/// Deposit contract that records every deposit
#[derive(Debug, Clone)]
pub struct RecordingDepositContract {
    address: Address,
    deposits: Vec<DepositRecord>,
}

impl RecordingDepositContract {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            deposits: Vec::new(),
        }
    }

    /// All deposits in call order
    pub fn deposits(&self) -> &[DepositRecord] {
        &self.deposits
    }
}

impl DepositContract for RecordingDepositContract {
    fn address(&self) -> Address {
        self.address
    }

    fn deposit(
        &mut self,
        pubkey: &[u8],
        withdrawal_credentials: &[u8; 32],
        _signature: &[u8],
        _deposit_data_root: &[u8; 32],
        amount: u128,
    ) -> StratosResult<()> {
        self.deposits.push(DepositRecord {
            pubkey: pubkey.to_vec(),
            withdrawal_credentials: *withdrawal_credentials,
            amount,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: Address = [1u8; 32];
    const BOB: Address = [2u8; 32];

    #[test]
    fn test_wrap_unwrap() {
        let mut ledger = InMemoryNativeLedger::new();
        ledger.credit_native(&ALICE, 100);

        ledger.wrap(&ALICE, 60).unwrap();
        assert_eq!(ledger.native_balance(&ALICE), 40);
        assert_eq!(ledger.balance_of(&ALICE), 60);

        ledger.unwrap(&ALICE, 10).unwrap();
        assert_eq!(ledger.native_balance(&ALICE), 50);
        assert_eq!(ledger.balance_of(&ALICE), 50);
    }

    #[test]
    fn test_transfer_insufficient() {
        let mut ledger = InMemoryNativeLedger::new();
        ledger.credit_wrapped(&ALICE, 5);

        assert_eq!(
            ledger.transfer(&ALICE, &BOB, 6),
            Err(StratosError::InsufficientBalance { available: 5, requested: 6 })
        );
        ledger.transfer(&ALICE, &BOB, 5).unwrap();
        assert_eq!(ledger.balance_of(&BOB), 5);
    }

    #[test]
    fn test_recording_deposit_contract() {
        let mut contract = RecordingDepositContract::new(BOB);
        contract
            .deposit(&[7u8; 48], &[9u8; 32], &[0u8; 96], &[0u8; 32], 32)
            .unwrap();

        assert_eq!(contract.address(), BOB);
        assert_eq!(contract.deposits().len(), 1);
        assert_eq!(contract.deposits()[0].amount, 32);
    }
}
