//! Validation Helpers
//!
//! Guard-clause macro and small reusable input checks.
//!
//! ```rust,ignore
//! use stratos_common::check;
//!
//! check!(amount > 0, StratosError::ZeroAmount);
//! ```

use crate::constants::eth::{PUBKEY_LENGTH, SIGNATURE_LENGTH};
use crate::errors::{StratosError, StratosResult};

/// Check a condition and return an error if it fails.
///
/// # Examples
///
/// ```rust,ignore
/// check!(
///     balance >= amount,
///     StratosError::InsufficientBalance { available: balance, requested: amount }
/// );
/// ```
#[macro_export]
macro_rules! check {
    ($condition:expr, $error:expr) => {
        if !($condition) {
            return Err($error);
        }
    };
}

pub use check;

/// Reject zero amounts
pub fn require_non_zero(amount: u128) -> StratosResult<()> {
    check!(amount > 0, StratosError::ZeroAmount);
    Ok(())
}

/// Reject anything that is not a 48 byte BLS public key
pub fn require_pubkey(pubkey: &[u8]) -> StratosResult<()> {
    check!(
        pubkey.len() == PUBKEY_LENGTH,
        StratosError::InvalidInput {
            param: "pubkey",
            reason: "must be 48 bytes",
        }
    );
    Ok(())
}

/// Reject anything that is not a 96 byte BLS signature
pub fn require_signature(signature: &[u8]) -> StratosResult<()> {
    check!(
        signature.len() == SIGNATURE_LENGTH,
        StratosError::InvalidInput {
            param: "signature",
            reason: "must be 96 bytes",
        }
    );
    Ok(())
}
