//! Strategy Configuration
//!
//! Deployment-specific thresholds. Defaults come from [`crate::constants`];
//! operators may override any field (e.g. from a JSON or TOML document via
//! serde) and must call `validate()` before handing the config to a strategy.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::{amo, eth, fuse, manual_fix, precision, staking};
use crate::errors::{StratosError, StratosResult};

// ============ Native Staking Accounting ============

/// Configuration of the native staking accountant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(default)]
pub struct AccountingConfig {
    /// Native amount that activates one validator
    pub stake_unit: u128,
    /// Initial lower bound of the fuse window
    pub fuse_interval_start: u128,
    /// Initial upper bound of the fuse window
    pub fuse_interval_end: u128,
    /// Minimum width of the fuse window
    pub min_fuse_gap: u128,
    /// Largest |validators delta| a manual fix may apply
    pub max_validators_delta: u32,
    /// Largest |consensus rewards delta| a manual fix may apply
    pub max_consensus_rewards_delta: u128,
    /// Largest amount a manual fix may send to the vault
    pub max_eth_to_vault: u128,
    /// Blocks between two manual fixes
    pub min_fix_cadence: u64,
    /// ETH that may be staked before the monitor must reset the tally
    pub stake_eth_threshold: u128,
    /// Maximum validators staked per call
    pub max_validators_per_call: u32,
}

impl Default for AccountingConfig {
    fn default() -> Self {
        Self {
            stake_unit: eth::STAKE_UNIT,
            fuse_interval_start: fuse::DEFAULT_START,
            fuse_interval_end: fuse::DEFAULT_END,
            min_fuse_gap: fuse::MIN_GAP,
            max_validators_delta: manual_fix::MAX_VALIDATORS_DELTA,
            max_consensus_rewards_delta: manual_fix::MAX_CONSENSUS_REWARDS_DELTA,
            max_eth_to_vault: manual_fix::MAX_ETH_TO_VAULT,
            min_fix_cadence: manual_fix::MIN_FIX_CADENCE,
            stake_eth_threshold: staking::DEFAULT_STAKE_ETH_THRESHOLD,
            max_validators_per_call: staking::MAX_VALIDATORS_PER_CALL as u32,
        }
    }
}

impl AccountingConfig {
    /// Check a fuse window against this config:
    /// `start < end`, `end < stake_unit`, `end - start >= min_fuse_gap`.
    pub fn validate_fuse_interval(&self, start: u128, end: u128) -> StratosResult<()> {
        let ordered = start < end && end < self.stake_unit;
        if !ordered || end - start < self.min_fuse_gap {
            return Err(StratosError::InvalidFuseInterval { start, end });
        }
        Ok(())
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> StratosResult<()> {
        if self.stake_unit == 0 {
            return Err(StratosError::InvalidConfig {
                param: "stake_unit",
                reason: "must be positive",
            });
        }
        if self.min_fuse_gap == 0 || self.min_fuse_gap >= self.stake_unit {
            return Err(StratosError::InvalidConfig {
                param: "min_fuse_gap",
                reason: "must be positive and below the stake unit",
            });
        }
        if self.max_eth_to_vault > self.stake_unit {
            return Err(StratosError::InvalidConfig {
                param: "max_eth_to_vault",
                reason: "must not exceed one stake unit",
            });
        }
        if self.max_validators_per_call == 0 {
            return Err(StratosError::InvalidConfig {
                param: "max_validators_per_call",
                reason: "must be positive",
            });
        }
        self.validate_fuse_interval(self.fuse_interval_start, self.fuse_interval_end)
    }
}

// ============ AMO ============

/// Configuration of the AMO strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(default)]
pub struct AmoConfig {
    /// Tolerated slippage on liquidity operations (18 decimals, 1e16 = 1%)
    pub max_slippage: u128,
    /// Minimum vault value per OToken after mint/burn (18 decimals)
    pub solvency_threshold: u128,
    /// Cap on OTokens minted per unit of deposited collateral
    pub max_otoken_deposit_multiplier: u128,
}

impl Default for AmoConfig {
    fn default() -> Self {
        Self {
            max_slippage: amo::MAX_SLIPPAGE,
            solvency_threshold: amo::SOLVENCY_THRESHOLD,
            max_otoken_deposit_multiplier: amo::MAX_OTOKEN_DEPOSIT_MULTIPLIER,
        }
    }
}

impl AmoConfig {
    /// Validate the configuration
    pub fn validate(&self) -> StratosResult<()> {
        if self.max_slippage >= precision::SCALE {
            return Err(StratosError::InvalidConfig {
                param: "max_slippage",
                reason: "must be below 100%",
            });
        }
        if self.solvency_threshold == 0 || self.solvency_threshold > precision::SCALE {
            return Err(StratosError::InvalidConfig {
                param: "solvency_threshold",
                reason: "must be in (0, 1]",
            });
        }
        if self.max_otoken_deposit_multiplier == 0 {
            return Err(StratosError::InvalidConfig {
                param: "max_otoken_deposit_multiplier",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}
