//! Slippage guard.
//!
//! A batch is valid when neither side's realized price strays from the
//! static price by more than the configured maximum, in the direction that
//! hurts that side. Buyers may always pay less, sellers may always receive
//! more. A batch with a zero static price has no reference and is always valid.

use bondbatch_types::{Batch, BatchKey, BondbatchError, OrderSide, Result, constants};

use crate::{math::mul_div, pricing::static_price_ppm};

/// Bounds each side's realized price relative to the static price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlippageGuard {
    /// Maximum relative deviation in `PCT_BASE` units.
    maximum_slippage: u64,
}

impl SlippageGuard {
    #[must_use]
    pub fn new(maximum_slippage: u64) -> Self {
        Self { maximum_slippage }
    }

    /// Whether both sides of the batch are within bounds.
    #[must_use]
    pub fn is_valid(&self, key: &BatchKey, batch: &Batch) -> bool {
        self.check(key, batch).is_ok()
    }

    /// Validate both sides independently.
    ///
    /// # Errors
    /// [`BondbatchError::SlippageExceeded`] naming the failing side.
    pub fn check(&self, key: &BatchKey, batch: &Batch) -> Result<()> {
        let static_price = static_price_ppm(&batch.snapshot())?;
        if static_price == 0 {
            return Ok(());
        }
        self.check_buy_side(key, batch, static_price)?;
        self.check_sell_side(key, batch, static_price)
    }

    fn check_buy_side(&self, key: &BatchKey, batch: &Batch, static_price: u128) -> Result<()> {
        let totals = batch.totals;
        if totals.buy_spend == 0 {
            return Ok(());
        }
        if totals.buy_return == 0 {
            // Demand priced out entirely.
            return Err(self.exceeded(key, OrderSide::Buy, u128::MAX));
        }
        let ppm = u128::from(constants::PPM);
        let buy_price = mul_div(totals.buy_spend, ppm, totals.buy_return, "buy price")?;
        if buy_price <= static_price {
            return Ok(());
        }
        let deviation = relative_deviation(buy_price - static_price, static_price)?;
        if deviation > u128::from(self.maximum_slippage) {
            return Err(self.exceeded(key, OrderSide::Buy, deviation));
        }
        Ok(())
    }

    fn check_sell_side(&self, key: &BatchKey, batch: &Batch, static_price: u128) -> Result<()> {
        let totals = batch.totals;
        if totals.sell_spend == 0 {
            return Ok(());
        }
        let ppm = u128::from(constants::PPM);
        let sell_price = mul_div(totals.sell_return, ppm, totals.sell_spend, "sell price")?;
        if sell_price >= static_price {
            return Ok(());
        }
        let deviation = relative_deviation(static_price - sell_price, static_price)?;
        if deviation > u128::from(self.maximum_slippage) {
            return Err(self.exceeded(key, OrderSide::Sell, deviation));
        }
        Ok(())
    }

    fn exceeded(&self, key: &BatchKey, side: OrderSide, deviation: u128) -> BondbatchError {
        BondbatchError::SlippageExceeded {
            key: key.clone(),
            side,
            deviation,
            maximum: self.maximum_slippage,
        }
    }
}

fn relative_deviation(difference: u128, static_price: u128) -> Result<u128> {
    mul_div(
        difference,
        u128::from(constants::PCT_BASE),
        static_price,
        "price deviation",
    )
}

#[cfg(test)]
mod tests {
    use bondbatch_types::{BatchSnapshot, CollateralAsset, WindowId, constants::PCT_BASE};

    use super::*;
    use crate::{BancorFormula, reprice};

    const TEN_PCT: u64 = PCT_BASE / 10;

    fn key() -> BatchKey {
        BatchKey::new(WindowId(0), CollateralAsset::token("DAI"))
    }

    fn priced(balance: u128, buy_spend: u128, sell_spend: u128) -> Batch {
        let mut b = Batch::new(BatchSnapshot {
            supply: 1_000,
            balance,
            reserve_ratio: 500_000,
        });
        b.totals.buy_spend = buy_spend;
        b.totals.sell_spend = sell_spend;
        reprice(&mut b, &BancorFormula).unwrap();
        b
    }

    #[test]
    fn empty_batch_is_valid() {
        let guard = SlippageGuard::new(TEN_PCT);
        assert!(guard.is_valid(&key(), &priced(100, 0, 0)));
    }

    #[test]
    fn small_buy_within_bounds() {
        // 10 collateral buys 48 tokens: price 0.2083 vs 0.2 static, +4.2%.
        let guard = SlippageGuard::new(TEN_PCT);
        assert!(guard.is_valid(&key(), &priced(100, 10, 0)));
    }

    #[test]
    fn large_buy_exceeds_bounds() {
        // 100 collateral buys 414 tokens: price 0.2415, +20.8%.
        let guard = SlippageGuard::new(TEN_PCT);
        let err = guard.check(&key(), &priced(100, 100, 0)).unwrap_err();
        assert!(matches!(
            err,
            BondbatchError::SlippageExceeded {
                side: OrderSide::Buy,
                ..
            }
        ));
        assert!(SlippageGuard::new(PCT_BASE / 4).is_valid(&key(), &priced(100, 100, 0)));
    }

    #[test]
    fn large_sell_exceeds_bounds() {
        // 100 tokens return 19 collateral: price 0.19 vs 0.2, -5%.
        let batch = priced(100, 0, 100);
        assert!(SlippageGuard::new(TEN_PCT).is_valid(&key(), &batch));
        let err = SlippageGuard::new(PCT_BASE / 50)
            .check(&key(), &batch)
            .unwrap_err();
        assert!(matches!(
            err,
            BondbatchError::SlippageExceeded {
                side: OrderSide::Sell,
                ..
            }
        ));
    }

    #[test]
    fn buy_priced_out_entirely_is_invalid() {
        let mut b = Batch::new(BatchSnapshot {
            supply: 1_000,
            balance: 100,
            reserve_ratio: 500_000,
        });
        b.totals.buy_spend = 10;
        let err = SlippageGuard::new(TEN_PCT).check(&key(), &b).unwrap_err();
        assert!(matches!(
            err,
            BondbatchError::SlippageExceeded {
                deviation: u128::MAX,
                ..
            }
        ));
    }

    #[test]
    fn matched_volume_has_no_slippage() {
        // Each side fills exactly at the static price.
        let guard = SlippageGuard::new(1);
        assert!(guard.is_valid(&key(), &priced(100, 20, 100)));
    }

    #[test]
    fn zero_static_price_is_unconstrained() {
        let guard = SlippageGuard::new(1);
        assert!(guard.is_valid(&key(), &priced(0, 0, 100)));
    }
}
