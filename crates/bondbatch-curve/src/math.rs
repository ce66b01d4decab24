//! Checked fixed-point helpers.

use bondbatch_types::{BondbatchError, Result};

/// `floor(a * b / d)` with every step checked.
///
/// `op` names the computation in the resulting [`BondbatchError::Arithmetic`].
pub fn mul_div(a: u128, b: u128, d: u128, op: &'static str) -> Result<u128> {
    a.checked_mul(b)
        .and_then(|n| n.checked_div(d))
        .ok_or(BondbatchError::Arithmetic { op })
}

/// `a - b`, failing instead of wrapping.
pub fn sub(a: u128, b: u128, op: &'static str) -> Result<u128> {
    a.checked_sub(b).ok_or(BondbatchError::Arithmetic { op })
}

/// `a + b`, failing instead of wrapping.
pub fn add(a: u128, b: u128, op: &'static str) -> Result<u128> {
    a.checked_add(b).ok_or(BondbatchError::Arithmetic { op })
}
