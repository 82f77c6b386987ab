//! Core Types for Stratos Strategies
//!
//! Identifiers and small value types shared by every strategy crate.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Type alias for account addresses (32-byte identifier)
pub type Address = [u8; 32];

/// SHA-256 of a validator's BLS public key
pub type PubkeyHash = [u8; 32];

// ============ Authorization Context ============

/// Who is calling an entry point, and at which block.
///
/// Passed explicitly into every mutating operation instead of reading an
/// ambient "current caller".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AuthContext {
    /// Caller address
    pub caller: Address,
    /// Current block height
    pub block_height: u64,
}

impl AuthContext {
    pub fn new(caller: Address, block_height: u64) -> Self {
        Self { caller, block_height }
    }
}

// ============ Validator Types ============

/// Lifecycle state of a validator
///
/// Transitions only move forward:
/// `NonRegistered -> Registered -> Staked -> Exiting -> ExitComplete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum ValidatorState {
    /// Never seen
    #[default]
    NonRegistered,
    /// Registered with the operator set, not yet funded
    Registered,
    /// Deposit made to the beacon chain deposit contract
    Staked,
    /// Voluntary exit requested
    Exiting,
    /// Removed from the operator set, record kept for history
    ExitComplete,
}

// ============ Accounting Types ============

/// Outcome of classifying a beacon chain sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum AccountingClassification {
    /// Nothing left to attribute
    Clean,
    /// Remainder below the fuse window, booked as consensus rewards
    RewardsAccrued,
    /// Remainder above the fuse window, one validator slashed
    SlashDetected,
    /// Remainder inside the fuse window, cannot be attributed
    FuseBlown,
    /// Balance below liabilities, or more withdrawals than active validators
    Invalid,
}

impl AccountingClassification {
    /// Whether the accounting reconciled
    pub fn is_valid(&self) -> bool {
        matches!(
            self,
            AccountingClassification::Clean
                | AccountingClassification::RewardsAccrued
                | AccountingClassification::SlashDetected
        )
    }
}

// ============ Pool Types ============

/// The two coins of an AMO pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum Coin {
    /// Native collateral (ETH / wrapped ETH)
    Collateral,
    /// The protocol's own token
    OToken,
}

/// A pair of amounts indexed by [`Coin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolAmounts {
    /// Collateral side
    pub collateral: u128,
    /// OToken side
    pub otoken: u128,
}

impl PoolAmounts {
    pub fn new(collateral: u128, otoken: u128) -> Self {
        Self { collateral, otoken }
    }

    /// Amounts with only one side set
    pub fn single(coin: Coin, amount: u128) -> Self {
        match coin {
            Coin::Collateral => Self::new(amount, 0),
            Coin::OToken => Self::new(0, amount),
        }
    }

    /// Amount of a given coin
    pub fn get(&self, coin: Coin) -> u128 {
        match coin {
            Coin::Collateral => self.collateral,
            Coin::OToken => self.otoken,
        }
    }

    /// Sum of both sides, `None` on overflow
    pub fn total(&self) -> Option<u128> {
        self.collateral.checked_add(self.otoken)
    }

    /// Signed imbalance `collateral - otoken`.
    ///
    /// Positive when the pool holds more collateral than OTokens.
    pub fn imbalance(&self) -> i128 {
        let collateral = i128::try_from(self.collateral).unwrap_or(i128::MAX);
        let otoken = i128::try_from(self.otoken).unwrap_or(i128::MAX);
        collateral.saturating_sub(otoken)
    }
}
