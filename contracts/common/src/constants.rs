//! Protocol Constants
//!
//! Default values for strategy configuration. Anything an operator may want to
//! tune at deployment time is mirrored in [`crate::config`]; the values here
//! only seed the `Default` implementations.
//!
//! # Network Configuration
//!
//! Use feature flags to compile for different networks:
//! - `mainnet` - Production values (long manual fix cadence)
//! - Default (no feature) - Testnet values (short cadence for testing)
//!
//! ```toml
//! # For mainnet deployment:
//! stratos-common = { path = "...", features = ["mainnet"] }
//! ```

/// Native asset units
pub mod eth {
    /// One unit with decimals (1 ETH = 1e18 wei)
    pub const ONE: u128 = 1_000_000_000_000_000_000;
    /// Full deposit required to activate one validator (32 ETH)
    pub const STAKE_UNIT: u128 = 32 * ONE;
    /// Length of a BLS12-381 validator public key
    pub const PUBKEY_LENGTH: usize = 48;
    /// Length of a BLS12-381 deposit signature
    pub const SIGNATURE_LENGTH: usize = 96;
}

/// Fixed point precision
pub mod precision {
    /// 18 decimal fixed point scale (1.0)
    pub const SCALE: u128 = 1_000_000_000_000_000_000;
}

/// Fuse interval defaults
///
/// The fuse window classifies a sub-stake-unit balance delta as rewards
/// (below start), a slash (above end) or ambiguous (inside).
pub mod fuse {
    use super::eth::ONE;

    /// Default lower bound of the ambiguous window (21.6 ETH)
    pub const DEFAULT_START: u128 = 21_600_000_000_000_000_000;

    /// Default upper bound of the ambiguous window (25.6 ETH)
    pub const DEFAULT_END: u128 = 25_600_000_000_000_000_000;

    /// Minimum width of the window, prevents a zero width fuse
    pub const MIN_GAP: u128 = 4 * ONE;
}

/// Manual accounting fix bounds
pub mod manual_fix {
    use super::eth::STAKE_UNIT;

    /// Maximum absolute change of the active validator count per fix
    pub const MAX_VALIDATORS_DELTA: u32 = 3;

    /// Maximum absolute change of tracked consensus rewards per fix
    pub const MAX_CONSENSUS_REWARDS_DELTA: u128 = 332 * STAKE_UNIT;

    /// Maximum amount of native asset sent to the vault per fix
    pub const MAX_ETH_TO_VAULT: u128 = STAKE_UNIT;

    /// Blocks that must pass between two manual fixes
    /// - Mainnet: ~1 day of 12 second blocks
    /// - Testnet: 10 blocks
    #[cfg(feature = "mainnet")]
    pub const MIN_FIX_CADENCE: u64 = 7_200;
    #[cfg(not(feature = "mainnet"))]
    pub const MIN_FIX_CADENCE: u64 = 10;
}

/// Staking limits
pub mod staking {
    use super::eth::STAKE_UNIT;

    /// Default amount of ETH that may be staked before the monitor resets the tally
    pub const DEFAULT_STAKE_ETH_THRESHOLD: u128 = 64 * STAKE_UNIT;

    /// Maximum validators staked in a single call
    pub const MAX_VALIDATORS_PER_CALL: usize = 50;
}

/// AMO strategy defaults
pub mod amo {
    use super::precision::SCALE;

    /// Maximum tolerated slippage on liquidity operations (1%)
    pub const MAX_SLIPPAGE: u128 = SCALE / 100;

    /// Minimum vault value per OToken after mint/burn operations (0.998)
    pub const SOLVENCY_THRESHOLD: u128 = SCALE / 1_000 * 998;

    /// Upper bound on OTokens minted per unit of deposited collateral
    pub const MAX_OTOKEN_DEPOSIT_MULTIPLIER: u128 = 2;
}
