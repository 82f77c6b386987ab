//! Fixed Point Math for Stratos Strategies
//!
//! 18-decimal fixed point helpers. Every helper truncates (rounds toward
//! zero) unless its name says otherwise, so results never over-credit the
//! caller. Intermediate products are computed at 256 bits so that wei
//! amounts multiplied by an 18-decimal scale cannot overflow.

use crate::constants::precision::SCALE;
use crate::errors::{StratosError, StratosResult};

/// Full 256-bit product of two `u128` values as `(high, low)`.
fn full_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = u64::MAX as u128;

    let (a_hi, a_lo) = (a >> 64, a & MASK);
    let (b_hi, b_lo) = (b >> 64, b & MASK);

    let lo_lo = a_lo * b_lo;
    let hi_lo = a_hi * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_hi = a_hi * b_hi;

    let cross = (lo_lo >> 64) + (hi_lo & MASK) + (lo_hi & MASK);
    let low = (lo_lo & MASK) | (cross << 64);
    let high = hi_hi + (hi_lo >> 64) + (lo_hi >> 64) + (cross >> 64);

    (high, low)
}

/// Divide the 256-bit value `(high, low)` by `divisor`.
///
/// Returns `(quotient, remainder)`; the quotient must fit in `u128`.
fn div_256(high: u128, low: u128, divisor: u128) -> StratosResult<(u128, u128)> {
    if divisor == 0 {
        return Err(StratosError::DivisionByZero);
    }
    if high >= divisor {
        return Err(StratosError::Overflow);
    }
    if high == 0 {
        return Ok((low / divisor, low % divisor));
    }

    // Shift-subtract long division over the low word
    let mut remainder = high;
    let mut quotient = 0u128;
    for i in (0..128).rev() {
        let carry = remainder >> 127;
        remainder = (remainder << 1) | ((low >> i) & 1);
        if carry == 1 || remainder >= divisor {
            remainder = remainder.wrapping_sub(divisor);
            quotient |= 1u128 << i;
        }
    }

    Ok((quotient, remainder))
}

/// `floor(a * b / denominator)` with a 256-bit intermediate
pub fn mul_div(a: u128, b: u128, denominator: u128) -> StratosResult<u128> {
    let (high, low) = full_mul(a, b);
    div_256(high, low, denominator).map(|(q, _)| q)
}

/// `ceil(a * b / denominator)` with a 256-bit intermediate
pub fn mul_div_up(a: u128, b: u128, denominator: u128) -> StratosResult<u128> {
    let (high, low) = full_mul(a, b);
    let (quotient, remainder) = div_256(high, low, denominator)?;
    if remainder == 0 {
        Ok(quotient)
    } else {
        quotient.checked_add(1).ok_or(StratosError::Overflow)
    }
}

/// Multiply two fixed point values and truncate: `a * b / 1e18`
///
/// Used for "expected value" computations (LP amount × price).
pub fn mul_truncate(a: u128, b: u128) -> StratosResult<u128> {
    mul_div(a, b, SCALE)
}

/// Divide keeping 18 decimals of precision: `a * 1e18 / b`
///
/// Used for "amount owed" computations; truncates.
pub fn div_precisely(a: u128, b: u128) -> StratosResult<u128> {
    mul_div(a, SCALE, b)
}

/// Reduce `amount` by a fixed point fraction: `amount * (1 - fraction)`
///
/// Used for minimum-out slippage bounds.
pub fn apply_slippage_down(amount: u128, fraction: u128) -> StratosResult<u128> {
    let keep = SCALE.checked_sub(fraction).ok_or(StratosError::Underflow)?;
    mul_truncate(amount, keep)
}

/// Increase `amount` by a fixed point fraction, rounding up: `amount * (1 + fraction)`
///
/// Used for maximum-in slippage bounds.
pub fn apply_slippage_up(amount: u128, fraction: u128) -> StratosResult<u128> {
    let grow = SCALE.checked_add(fraction).ok_or(StratosError::Overflow)?;
    mul_div_up(amount, grow, SCALE)
}

/// Apply a signed delta to an unsigned counter, failing instead of wrapping
pub fn apply_delta(value: u128, delta: i128) -> StratosResult<u128> {
    if delta >= 0 {
        value
            .checked_add(delta.unsigned_abs())
            .ok_or(StratosError::Overflow)
    } else {
        value
            .checked_sub(delta.unsigned_abs())
            .ok_or(StratosError::Underflow)
    }
}
