//! Bonding-curve formula oracle.
//!
//! The pricing engine only needs two questions answered against a frozen
//! snapshot: how many tokens does a deposit buy, and how much collateral
//! does a sale return. [`CurveFormula`] is that seam; [`BancorFormula`] is
//! the continuous-reserve-ratio implementation.
//!
//! ```text
//! purchase_return = supply  * ((1 + deposit / balance) ^ (ratio / PPM) - 1)
//! sale_return     = balance * (1 - (1 - amount / supply) ^ (PPM / ratio))
//! ```
//!
//! Results are floored to whole units.

use bondbatch_types::{BondbatchError, Result, constants::PPM};
use rust_decimal::prelude::*;

use crate::math::mul_div;

/// Curve oracle evaluated against a batch snapshot.
pub trait CurveFormula {
    /// Bonded tokens received for depositing `deposit` collateral.
    fn purchase_return(
        &self,
        supply: u128,
        balance: u128,
        reserve_ratio: u32,
        deposit: u128,
    ) -> Result<u128>;

    /// Collateral received for selling `amount` bonded tokens.
    fn sale_return(
        &self,
        supply: u128,
        balance: u128,
        reserve_ratio: u32,
        amount: u128,
    ) -> Result<u128>;
}

/// Bancor continuous-token formula.
///
/// Non-linear ratios are evaluated in `rust_decimal`, so every supply,
/// balance and amount must fit in [`BancorFormula::MAX_INPUT`] (`2^96 - 1`,
/// about 7.9e28). At 18 decimals that is roughly 79 billion whole tokens.
/// Larger inputs, or results that overflow on the way, fail with
/// `CurveFormula`. A ratio of exactly `PPM` stays in `u128` and has no such
/// limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct BancorFormula;

impl BancorFormula {
    /// Largest amount accepted by the non-linear curve.
    pub const MAX_INPUT: u128 = 79_228_162_514_264_337_593_543_950_335;

    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CurveFormula for BancorFormula {
    fn purchase_return(
        &self,
        supply: u128,
        balance: u128,
        reserve_ratio: u32,
        deposit: u128,
    ) -> Result<u128> {
        check_domain(supply, reserve_ratio)?;
        if balance == 0 {
            return Err(curve_error("purchase against a zero balance"));
        }
        if deposit == 0 {
            return Ok(0);
        }
        if reserve_ratio == PPM {
            return mul_div(supply, deposit, balance, "linear purchase return");
        }

        let s = to_decimal(supply)?;
        let b = to_decimal(balance)?;
        let d = to_decimal(deposit)?;
        let exponent = Decimal::from(reserve_ratio) / Decimal::from(PPM);

        let base = d
            .checked_div(b)
            .and_then(|q| q.checked_add(Decimal::ONE))
            .ok_or_else(|| curve_error("purchase base overflow"))?;
        let growth = base
            .checked_powd(exponent)
            .ok_or_else(|| curve_error("purchase power overflow"))?;
        let tokens = s
            .checked_mul(growth - Decimal::ONE)
            .ok_or_else(|| curve_error("purchase return overflow"))?;
        from_decimal(tokens)
    }

    fn sale_return(
        &self,
        supply: u128,
        balance: u128,
        reserve_ratio: u32,
        amount: u128,
    ) -> Result<u128> {
        check_domain(supply, reserve_ratio)?;
        if amount > supply {
            return Err(curve_error("sale exceeds supply"));
        }
        if amount == 0 {
            return Ok(0);
        }
        if amount == supply {
            return Ok(balance);
        }
        if reserve_ratio == PPM {
            return mul_div(balance, amount, supply, "linear sale return");
        }

        let s = to_decimal(supply)?;
        let b = to_decimal(balance)?;
        let a = to_decimal(amount)?;
        let exponent = Decimal::from(PPM) / Decimal::from(reserve_ratio);

        let base = a
            .checked_div(s)
            .map(|q| Decimal::ONE - q)
            .ok_or_else(|| curve_error("sale base overflow"))?;
        let remaining = base
            .checked_powd(exponent)
            .ok_or_else(|| curve_error("sale power overflow"))?;
        let collateral = b
            .checked_mul(Decimal::ONE - remaining)
            .ok_or_else(|| curve_error("sale return overflow"))?;
        from_decimal(collateral)
    }
}

fn check_domain(supply: u128, reserve_ratio: u32) -> Result<()> {
    if supply == 0 {
        return Err(curve_error("zero supply"));
    }
    if reserve_ratio == 0 || reserve_ratio > PPM {
        return Err(BondbatchError::InvalidReserveRatio(reserve_ratio));
    }
    Ok(())
}

fn to_decimal(value: u128) -> Result<Decimal> {
    Decimal::from_u128(value).ok_or_else(|| curve_error("amount exceeds decimal range"))
}

fn from_decimal(value: Decimal) -> Result<u128> {
    if value.is_sign_negative() {
        return Ok(0);
    }
    value
        .floor()
        .to_u128()
        .ok_or_else(|| curve_error("result exceeds integer range"))
}

fn curve_error(reason: &str) -> BondbatchError {
    BondbatchError::CurveFormula {
        reason: reason.to_string(),
    }
}
