//! Error Types for Stratos Strategies
//!
//! Precondition and solvency failures are returned synchronously and never
//! leave partial state behind. Accounting ambiguity is *not* an error: the
//! accountant reports it through its outcome and pauses instead.

use crate::access_control::Role;
use crate::types::{Address, PubkeyHash};

/// Result type alias for strategy operations
pub type StratosResult<T> = Result<T, StratosError>;

/// Main error enum for all strategy errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StratosError {
    // ============ Authorization Errors ============
    /// Caller does not hold the role required by the entry point
    NotAuthorized { required: Role, caller: Address },

    // ============ Validator Registry Errors ============
    /// Validator is already registered (or further along its lifecycle)
    AlreadyRegistered { pubkey_hash: PubkeyHash },

    /// Validator is not in the Registered state
    NotRegistered { pubkey_hash: PubkeyHash },

    /// Validator is not in the Staked state
    NotStaked { pubkey_hash: PubkeyHash },

    /// Validator is not in the Exiting state
    NotExiting { pubkey_hash: PubkeyHash },

    /// Same validator appears twice in one batch
    DuplicateValidator { pubkey_hash: PubkeyHash },

    // ============ Accounting Errors ============
    /// Fuse interval violates `start < end < STAKE_UNIT` or the minimum gap
    InvalidFuseInterval { start: u128, end: u128 },

    /// Operation requires the accountant to be paused
    NotPaused,

    /// Operation refused while the strategy is paused
    StrategyPaused,

    /// Manual fix delta outside its configured bound
    ManualFixOutOfBounds { param: &'static str },

    /// Manual fix attempted before the cadence elapsed
    ManualFixTooSoon { last_fix_block: u64, current_block: u64 },

    /// Accounting still does not reconcile after the manual fix
    FuseStillBlown,

    /// Staking would exceed the threshold set by the staking monitor
    StakingThresholdExceeded { tally: u128, threshold: u128 },

    // ============ Pool Balance Errors ============
    /// Pool favoured OTokens and the operation made it worse
    OTokensBalanceWorse { diff_before: i128, diff_after: i128 },

    /// Pool favoured OTokens and the operation pushed it past parity
    OTokensOvershotPeg { diff_before: i128, diff_after: i128 },

    /// Pool favoured assets and the operation made it worse
    AssetsBalanceWorse { diff_before: i128, diff_after: i128 },

    /// Pool favoured assets and the operation pushed it past parity
    AssetsOvershotPeg { diff_before: i128, diff_after: i128 },

    /// Vault backing per OToken fell below the solvency threshold
    Insolvent { ratio: u128, threshold: u128 },

    /// Liquidity operation returned less than the slippage bound allows
    SlippageExceeded { expected: u128, actual: u128 },

    // ============ Amount Errors ============
    /// Zero amount not allowed
    ZeroAmount,

    /// Insufficient balance for operation
    InsufficientBalance { available: u128, requested: u128 },

    /// Amount exceeds maximum allowed
    ExceedsMaximum { amount: u128, maximum: u128 },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Arithmetic underflow occurred
    Underflow,

    /// Division by zero
    DivisionByZero,

    // ============ Input Validation Errors ============
    /// Invalid input parameter
    InvalidInput { param: &'static str, reason: &'static str },

    /// Invalid configuration value
    InvalidConfig { param: &'static str, reason: &'static str },
}

impl StratosError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAuthorized { .. } => "E001_NOT_AUTHORIZED",
            Self::AlreadyRegistered { .. } => "E010_ALREADY_REGISTERED",
            Self::NotRegistered { .. } => "E011_NOT_REGISTERED",
            Self::NotStaked { .. } => "E012_NOT_STAKED",
            Self::NotExiting { .. } => "E013_NOT_EXITING",
            Self::DuplicateValidator { .. } => "E014_DUPLICATE_VALIDATOR",
            Self::InvalidFuseInterval { .. } => "E020_INVALID_FUSE",
            Self::NotPaused => "E021_NOT_PAUSED",
            Self::StrategyPaused => "E022_PAUSED",
            Self::ManualFixOutOfBounds { .. } => "E023_FIX_OUT_OF_BOUNDS",
            Self::ManualFixTooSoon { .. } => "E024_FIX_TOO_SOON",
            Self::FuseStillBlown => "E025_FUSE_STILL_BLOWN",
            Self::StakingThresholdExceeded { .. } => "E026_STAKE_THRESHOLD",
            Self::OTokensBalanceWorse { .. } => "E030_OTOKENS_BALANCE_WORSE",
            Self::OTokensOvershotPeg { .. } => "E031_OTOKENS_OVERSHOT_PEG",
            Self::AssetsBalanceWorse { .. } => "E032_ASSETS_BALANCE_WORSE",
            Self::AssetsOvershotPeg { .. } => "E033_ASSETS_OVERSHOT_PEG",
            Self::Insolvent { .. } => "E034_INSOLVENT",
            Self::SlippageExceeded { .. } => "E035_SLIPPAGE",
            Self::ZeroAmount => "E040_ZERO_AMOUNT",
            Self::InsufficientBalance { .. } => "E041_INSUFFICIENT_BALANCE",
            Self::ExceedsMaximum { .. } => "E042_EXCEEDS_MAXIMUM",
            Self::Overflow => "E050_OVERFLOW",
            Self::Underflow => "E051_UNDERFLOW",
            Self::DivisionByZero => "E052_DIV_ZERO",
            Self::InvalidInput { .. } => "E060_INVALID_INPUT",
            Self::InvalidConfig { .. } => "E061_INVALID_CONFIG",
        }
    }

    /// Returns true if the caller can fix this by adjusting parameters and resubmitting
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::OTokensBalanceWorse { .. }
            | Self::OTokensOvershotPeg { .. }
            | Self::AssetsBalanceWorse { .. }
            | Self::AssetsOvershotPeg { .. } => true, // Pick a smaller amount
            Self::SlippageExceeded { .. } => true, // Retry after the pool settles
            Self::ManualFixTooSoon { .. } => true, // Wait for the cadence
            Self::InsufficientBalance { .. } => true,
            _ => false,
        }
    }
}
