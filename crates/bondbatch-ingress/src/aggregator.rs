//! Order aggregator: folds buy and sell intents into the current batch.
//!
//! Each order runs to completion or leaves no trace:
//!
//! 1. Input checks (amount, whitelist, balance)
//! 2. Stage the order on a private copy of its batch
//! 3. Reprice the copy
//! 4. Slippage guard, pooled-balance sufficiency
//! 5. Ledger effects (fee, collateral, burn)
//! 6. Commit to the store and emit events
//!
//! Any failure before step 6 drops the staged copy. Ledger effects that
//! partially applied are compensated before the error is returned.

use bondbatch_curve::{CurveFormula, SlippageGuard, math, mul_div, reprice};
use bondbatch_types::{
    AccountId, BatchKey, BondbatchError, CollateralAsset, MarketConfig, MarketEvent,
    OrderReceipt, OrderSide, Result, constants::PCT_BASE,
};

use crate::{
    batch_store::{BatchStore, CounterProjection, StagedBatch},
    event_log::EventLog,
    ledger::AssetLedger,
    registry::CollateralRegistry,
};

/// Borrowed view of the market state an order needs.
pub struct OrderAggregator<'a, L: AssetLedger + ?Sized, F: CurveFormula + ?Sized> {
    store: &'a mut BatchStore,
    registry: &'a CollateralRegistry,
    ledger: &'a mut L,
    formula: &'a F,
    config: &'a MarketConfig,
    events: &'a mut EventLog,
    height: u64,
}

impl<'a, L: AssetLedger + ?Sized, F: CurveFormula + ?Sized> OrderAggregator<'a, L, F> {
    #[must_use]
    pub fn new(
        store: &'a mut BatchStore,
        registry: &'a CollateralRegistry,
        ledger: &'a mut L,
        formula: &'a F,
        config: &'a MarketConfig,
        events: &'a mut EventLog,
        height: u64,
    ) -> Self {
        Self {
            store,
            registry,
            ledger,
            formula,
            config,
            events,
            height,
        }
    }

    /// Spend `value` collateral on bonded tokens in the current batch.
    ///
    /// The buy fee is withheld up front; only the net value joins the batch.
    ///
    /// # Errors
    /// - `ZeroAmount`, `CollateralNotWhitelisted`, `InsufficientBalance`
    /// - `SlippageExceeded`, `InsufficientPoolBalance` (order rolled back)
    /// - ledger or curve failures
    pub fn open_buy_order(
        &mut self,
        buyer: AccountId,
        asset: &CollateralAsset,
        value: u128,
    ) -> Result<OrderReceipt> {
        if value == 0 {
            return Err(BondbatchError::ZeroAmount);
        }
        let collateral = self.registry.get(asset)?;
        let available = self.ledger.balance_of(buyer, asset);
        if available < value {
            return Err(BondbatchError::InsufficientBalance {
                needed: value,
                available,
            });
        }

        let fee = mul_div(
            value,
            u128::from(self.config.buy_fee_pct),
            u128::from(PCT_BASE),
            "buy fee",
        )?;
        let net = math::sub(value, fee, "buy value after fee")?;

        let window = self.store.current_window(self.height);
        let mut staged = self.store.stage(
            &*self.ledger,
            self.config.reserve,
            window,
            asset,
            collateral,
            OrderSide::Buy,
            buyer,
            net,
        )?;
        // The net value lands in the reserve before any sell claim can draw on it.
        let projection = self.price_and_validate(&mut staged, net)?;

        self.transfer_buy_funds(buyer, asset, fee, net)?;

        let totals = staged.batch.totals;
        let mut emitted = self.store.commit(staged, projection);
        emitted.push(MarketEvent::BuyOrderOpened {
            buyer,
            window,
            asset: asset.clone(),
            fee,
            value: net,
        });
        emitted.push(MarketEvent::PricingUpdated {
            window,
            asset: asset.clone(),
            totals,
        });
        self.events.extend(emitted);

        tracing::info!(
            buyer = %buyer,
            window = %window,
            asset = %asset,
            value,
            fee,
            "Buy order opened"
        );

        Ok(OrderReceipt {
            key: BatchKey::new(window, asset.clone()),
            side: OrderSide::Buy,
            account: buyer,
            gross: value,
            fee,
            net,
        })
    }

    /// Sell `amount` bonded tokens for collateral in the current batch.
    ///
    /// The tokens are burned when the order commits; the seller claims
    /// collateral after the window closes.
    ///
    /// # Errors
    /// - `ZeroAmount`, `CollateralNotWhitelisted`, `InsufficientBalance`
    /// - `SlippageExceeded`, `InsufficientPoolBalance` (order rolled back)
    /// - ledger or curve failures
    pub fn open_sell_order(
        &mut self,
        seller: AccountId,
        asset: &CollateralAsset,
        amount: u128,
    ) -> Result<OrderReceipt> {
        if amount == 0 {
            return Err(BondbatchError::ZeroAmount);
        }
        let collateral = self.registry.get(asset)?;
        let spendable = self.ledger.spendable_balance_of(seller);
        if spendable < amount {
            return Err(BondbatchError::InsufficientBalance {
                needed: amount,
                available: spendable,
            });
        }

        let window = self.store.current_window(self.height);
        let mut staged = self.store.stage(
            &*self.ledger,
            self.config.reserve,
            window,
            asset,
            collateral,
            OrderSide::Sell,
            seller,
            amount,
        )?;
        let projection = self.price_and_validate(&mut staged, 0)?;

        self.ledger.burn(seller, amount)?;

        let totals = staged.batch.totals;
        let mut emitted = self.store.commit(staged, projection);
        emitted.push(MarketEvent::SellOrderOpened {
            seller,
            window,
            asset: asset.clone(),
            amount,
        });
        emitted.push(MarketEvent::PricingUpdated {
            window,
            asset: asset.clone(),
            totals,
        });
        self.events.extend(emitted);

        tracing::info!(
            seller = %seller,
            window = %window,
            asset = %asset,
            amount,
            "Sell order opened"
        );

        Ok(OrderReceipt {
            key: BatchKey::new(window, asset.clone()),
            side: OrderSide::Sell,
            account: seller,
            gross: amount,
            fee: 0,
            net: amount,
        })
    }

    /// Reprice the staged batch, then enforce slippage and pool sufficiency.
    ///
    /// `incoming` is collateral the order itself will add to the reserve.
    fn price_and_validate(
        &self,
        staged: &mut StagedBatch,
        incoming: u128,
    ) -> Result<CounterProjection> {
        reprice(&mut staged.batch, self.formula)?;

        let guard = SlippageGuard::new(self.config.maximum_slippage);
        if let Err(err) = guard.check(&staged.key, &staged.batch) {
            tracing::warn!(
                batch = %staged.key,
                side = %staged.side,
                account = %staged.account,
                amount = staged.amount,
                error = %err,
                "Order rejected: slippage"
            );
            return Err(err);
        }

        let projection = self.store.project(staged)?;
        let pooled = math::add(
            self.ledger
                .pooled_balance_of(self.config.reserve, &staged.key.asset),
            incoming,
            "pooled balance after order",
        )?;
        if projection.collaterals_to_be_claimed > pooled {
            tracing::warn!(
                batch = %staged.key,
                side = %staged.side,
                account = %staged.account,
                needed = projection.collaterals_to_be_claimed,
                available = pooled,
                "Order rejected: pooled balance cannot cover claimable collateral"
            );
            return Err(BondbatchError::InsufficientPoolBalance {
                asset: staged.key.asset.clone(),
                needed: projection.collaterals_to_be_claimed,
                available: pooled,
            });
        }
        Ok(projection)
    }

    /// Fee to the beneficiary, net value to the reserve. A failed second leg
    /// reverses the first.
    fn transfer_buy_funds(
        &mut self,
        buyer: AccountId,
        asset: &CollateralAsset,
        fee: u128,
        net: u128,
    ) -> Result<()> {
        let beneficiary = self.config.beneficiary;
        if fee > 0 {
            self.ledger.transfer(buyer, beneficiary, asset, fee)?;
        }
        if let Err(err) = self.ledger.transfer(buyer, self.config.reserve, asset, net) {
            let undo = if fee > 0 {
                self.ledger.transfer(beneficiary, buyer, asset, fee)
            } else {
                Ok(())
            };
            if let Err(undo) = undo {
                tracing::warn!(
                    buyer = %buyer,
                    asset = %asset,
                    fee,
                    error = %undo,
                    "Failed to return buy fee after aborted order"
                );
            }
            return Err(err);
        }
        Ok(())
    }
}
