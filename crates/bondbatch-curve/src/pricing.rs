//! Batch pricing engine.
//!
//! Given a batch's frozen snapshot and its aggregate totals, computes what
//! buyers and sellers are owed. Opposing demand is matched peer-to-peer at
//! the **static price** (the price implied by the snapshot alone); only the
//! net imbalance goes through the curve.
//!
//! ```text
//! P              = PPM * PPM * balance / (supply * ratio)     (static price, PPM)
//! sell_at_static = sell_spend * P / PPM
//!
//! sell-heavy (sell_at_static > buy_spend):
//!     buy_return  = buy_spend * PPM / P
//!     sell_return = buy_spend + sale_return(sell_spend - buy_return)
//!
//! buy-heavy (otherwise):
//!     sell_return = sell_at_static
//!     buy_return  = sell_spend + purchase_return(buy_spend - sell_at_static)
//! ```

use bondbatch_types::{Batch, BatchSnapshot, BondbatchError, Result, constants::PPM};

use crate::{
    CurveFormula,
    math::{add, mul_div, sub},
};

/// Which side of the batch had to go through the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingBranch {
    /// No orders yet.
    Idle,
    /// Sells outweigh buys: buys fill at the static price, surplus sells hit the curve.
    SellHeavy,
    /// Buys outweigh (or equal) sells: sells fill at the static price, surplus buys hit the curve.
    BuyHeavy,
}

/// Summary of one repricing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingOutcome {
    pub branch: MatchingBranch,
    pub static_price_ppm: u128,
    /// Volume routed through the curve: bonded tokens when sell-heavy,
    /// collateral when buy-heavy.
    pub curve_volume: u128,
}

/// Static price of a snapshot in PPM. A zero supply has no price and yields zero.
pub fn static_price_ppm(snapshot: &BatchSnapshot) -> Result<u128> {
    if snapshot.supply == 0 {
        return Ok(0);
    }
    if snapshot.reserve_ratio == 0 {
        return Err(BondbatchError::InvalidReserveRatio(0));
    }
    let ppm = u128::from(PPM);
    let denominator = snapshot
        .supply
        .checked_mul(u128::from(snapshot.reserve_ratio))
        .ok_or(BondbatchError::Arithmetic {
            op: "static price denominator",
        })?;
    let numerator = ppm
        .checked_mul(ppm)
        .and_then(|p| p.checked_mul(snapshot.balance))
        .ok_or(BondbatchError::Arithmetic {
            op: "static price numerator",
        })?;
    Ok(numerator / denominator)
}

/// Recompute `buy_return` and `sell_return` from the batch's current spends.
///
/// Only the return fields of `batch.totals` are written, and only on success.
pub fn reprice<F: CurveFormula + ?Sized>(batch: &mut Batch, formula: &F) -> Result<PricingOutcome> {
    let snapshot = batch.snapshot();
    let static_price = static_price_ppm(&snapshot)?;
    let totals = batch.totals;

    if totals.is_empty() {
        return Ok(PricingOutcome {
            branch: MatchingBranch::Idle,
            static_price_ppm: static_price,
            curve_volume: 0,
        });
    }

    let ppm = u128::from(PPM);
    let sell_at_static = mul_div(totals.sell_spend, static_price, ppm, "sell value at static price")?;

    let (branch, buy_return, sell_return, curve_volume) = if sell_at_static > totals.buy_spend {
        // sell_at_static > 0 here, so the static price is non-zero.
        let buy_return = mul_div(totals.buy_spend, ppm, static_price, "matched buy return")?;
        let remaining_sell = sub(totals.sell_spend, buy_return, "remaining sell volume")?;
        let remaining_sell_return = formula.sale_return(
            snapshot.supply,
            snapshot.balance,
            snapshot.reserve_ratio,
            remaining_sell,
        )?;
        let sell_return = add(totals.buy_spend, remaining_sell_return, "sell return")?;
        (MatchingBranch::SellHeavy, buy_return, sell_return, remaining_sell)
    } else {
        let remaining_buy = sub(totals.buy_spend, sell_at_static, "remaining buy spend")?;
        let remaining_buy_return = if remaining_buy == 0 {
            0
        } else {
            formula.purchase_return(
                snapshot.supply,
                snapshot.balance,
                snapshot.reserve_ratio,
                remaining_buy,
            )?
        };
        // Matched sell tokens only flow to buyers if there are any.
        let buy_return = if totals.buy_spend == 0 {
            0
        } else {
            add(totals.sell_spend, remaining_buy_return, "buy return")?
        };
        (MatchingBranch::BuyHeavy, buy_return, sell_at_static, remaining_buy)
    };

    batch.totals.buy_return = buy_return;
    batch.totals.sell_return = sell_return;

    tracing::debug!(
        branch = ?branch,
        static_price_ppm = static_price,
        buy_spend = totals.buy_spend,
        buy_return,
        sell_spend = totals.sell_spend,
        sell_return,
        curve_volume,
        "Batch repriced"
    );

    Ok(PricingOutcome {
        branch,
        static_price_ppm: static_price,
        curve_volume,
    })
}

#[cfg(test)]
mod tests {
    use bondbatch_types::BatchTotals;

    use super::*;
    use crate::BancorFormula;

    fn batch(supply: u128, balance: u128, reserve_ratio: u32) -> Batch {
        Batch::new(BatchSnapshot {
            supply,
            balance,
            reserve_ratio,
        })
    }

    fn with_spends(mut b: Batch, buy_spend: u128, sell_spend: u128) -> Batch {
        b.totals.buy_spend = buy_spend;
        b.totals.sell_spend = sell_spend;
        b
    }

    #[test]
    fn static_price_of_reference_snapshot() {
        // 100 / (1000 * 0.5) = 0.2
        let b = batch(1_000, 100, 500_000);
        assert_eq!(static_price_ppm(&b.snapshot()).unwrap(), 200_000);
    }

    #[test]
    fn static_price_of_degenerate_snapshots() {
        assert_eq!(static_price_ppm(&batch(0, 100, 500_000).snapshot()).unwrap(), 0);
        assert_eq!(static_price_ppm(&batch(1_000, 0, 500_000).snapshot()).unwrap(), 0);
    }

    #[test]
    fn idle_batch_is_untouched() {
        let mut b = batch(1_000, 100, 500_000);
        let outcome = reprice(&mut b, &BancorFormula).unwrap();
        assert_eq!(outcome.branch, MatchingBranch::Idle);
        assert_eq!(b.totals, BatchTotals::default());
    }

    #[test]
    fn buy_heavy_matches_sells_at_static_price() {
        // Sells worth 100 * 0.2 = 20 collateral are matched against 50 of buy spend.
        let mut b = with_spends(batch(1_000, 100, 500_000), 50, 100);
        let outcome = reprice(&mut b, &BancorFormula).unwrap();
        assert_eq!(outcome.branch, MatchingBranch::BuyHeavy);
        assert_eq!(outcome.curve_volume, 30);
        assert_eq!(b.totals.sell_return, 20);
        // 100 matched tokens + 1000 * (sqrt(1.3) - 1) = 100 + 140
        assert_eq!(b.totals.buy_return, 240);
    }

    #[test]
    fn sell_heavy_matches_buys_at_static_price() {
        // 10 collateral of buys buys 10 / 0.2 = 50 tokens from the 100 sold.
        let mut b = with_spends(batch(1_000, 100, 500_000), 10, 100);
        let outcome = reprice(&mut b, &BancorFormula).unwrap();
        assert_eq!(outcome.branch, MatchingBranch::SellHeavy);
        assert_eq!(b.totals.buy_return, 50);
        assert_eq!(outcome.curve_volume, 50);
        // 10 matched collateral + 100 * (1 - 0.95^2) = 10 + 9
        assert_eq!(b.totals.sell_return, 19);
    }

    #[test]
    fn sell_heavy_buy_return_never_exceeds_sell_spend() {
        for buy_spend in 0..=19 {
            let mut b = with_spends(batch(1_000, 100, 500_000), buy_spend, 100);
            let outcome = reprice(&mut b, &BancorFormula).unwrap();
            assert_eq!(outcome.branch, MatchingBranch::SellHeavy);
            assert!(b.totals.buy_return <= b.totals.sell_spend);
        }
    }

    #[test]
    fn balanced_demand_needs_no_curve() {
        // Exactly 100 tokens worth 20 collateral on each side.
        let mut b = with_spends(batch(1_000, 100, 500_000), 20, 100);
        let outcome = reprice(&mut b, &BancorFormula).unwrap();
        assert_eq!(outcome.branch, MatchingBranch::BuyHeavy);
        assert_eq!(outcome.curve_volume, 0);
        assert_eq!(b.totals.buy_return, 100);
        assert_eq!(b.totals.sell_return, 20);
    }

    #[test]
    fn buys_only_go_through_curve() {
        let mut b = with_spends(batch(1_000, 100, 500_000), 100, 0);
        reprice(&mut b, &BancorFormula).unwrap();
        assert_eq!(b.totals.buy_return, 414);
        assert_eq!(b.totals.sell_return, 0);
    }

    #[test]
    fn sells_only_go_through_curve() {
        let mut b = with_spends(batch(1_000, 100, 500_000), 0, 100);
        let outcome = reprice(&mut b, &BancorFormula).unwrap();
        assert_eq!(outcome.branch, MatchingBranch::SellHeavy);
        assert_eq!(b.totals.buy_return, 0);
        assert_eq!(b.totals.sell_return, 19);
    }

    #[test]
    fn zero_price_sells_promise_no_tokens() {
        let mut b = with_spends(batch(1_000, 0, 500_000), 0, 100);
        let outcome = reprice(&mut b, &BancorFormula).unwrap();
        assert_eq!(outcome.static_price_ppm, 0);
        assert_eq!(b.totals.buy_return, 0);
        assert_eq!(b.totals.sell_return, 0);
    }

    #[test]
    fn curve_failure_leaves_returns_untouched() {
        // Zero balance: the curve cannot price a purchase.
        let mut b = with_spends(batch(1_000, 0, 500_000), 10, 0);
        let err = reprice(&mut b, &BancorFormula).unwrap_err();
        assert!(matches!(err, BondbatchError::CurveFormula { .. }));
        assert_eq!(b.totals.buy_return, 0);
        assert_eq!(b.totals.sell_return, 0);
    }
}
