//! Claim settlement for closed batches.
//!
//! A claim either completes (ledger effect applied, contribution marked
//! claimed, counters released, event emitted) or leaves everything as it
//! was. Ledger legs that ran before a later failure are reversed.

use bondbatch_curve::{math, mul_div};
use bondbatch_ingress::{AssetLedger, BatchStore, ClaimPlan, EventLog};
use bondbatch_types::{
    AccountId, BatchKey, ClaimReceipt, CollateralAsset, MarketConfig, MarketEvent, OrderSide,
    Result, WindowId, constants::PCT_BASE,
};
use chrono::Utc;

/// Borrowed view of the market state a claim needs.
pub struct ClaimSettler<'a, L: AssetLedger + ?Sized> {
    store: &'a mut BatchStore,
    ledger: &'a mut L,
    config: &'a MarketConfig,
    events: &'a mut EventLog,
    height: u64,
}

impl<'a, L: AssetLedger + ?Sized> ClaimSettler<'a, L> {
    #[must_use]
    pub fn new(
        store: &'a mut BatchStore,
        ledger: &'a mut L,
        config: &'a MarketConfig,
        events: &'a mut EventLog,
        height: u64,
    ) -> Self {
        Self {
            store,
            ledger,
            config,
            events,
            height,
        }
    }

    /// Mint the buyer's share of the batch's bonded-token return.
    ///
    /// # Errors
    /// - `WindowStillOpen`, `NothingToClaim`, `AlreadyClaimed`
    /// - ledger failures (nothing is marked claimed)
    pub fn claim_buy(
        &mut self,
        buyer: AccountId,
        window: WindowId,
        asset: &CollateralAsset,
    ) -> Result<ClaimReceipt> {
        let key = BatchKey::new(window, asset.clone());
        let plan = self
            .store
            .prepare_claim(&key, OrderSide::Buy, buyer, self.height)?;

        if plan.share > 0 {
            self.ledger.mint(buyer, plan.share)?;
        }
        if let Err(err) = self.store.apply_claim(&plan) {
            if plan.share > 0 {
                log_failed_reversal(self.ledger.burn(buyer, plan.share), &plan);
            }
            return Err(err);
        }

        self.events.emit(MarketEvent::BuyOrderReturned {
            buyer,
            window,
            asset: asset.clone(),
            amount: plan.share,
        });
        tracing::info!(
            buyer = %buyer,
            batch = %key,
            amount = plan.share,
            "Buy order claimed"
        );

        Ok(ClaimReceipt {
            key,
            side: OrderSide::Buy,
            account: buyer,
            share: plan.share,
            fee: 0,
            payout: plan.share,
            claimed_at: Utc::now(),
        })
    }

    /// Pay the seller's share of the batch's collateral return, minus the
    /// sell fee, out of the reserve. The fee goes to the beneficiary.
    ///
    /// # Errors
    /// - `WindowStillOpen`, `NothingToClaim`, `AlreadyClaimed`
    /// - ledger failures (nothing is marked claimed)
    pub fn claim_sell(
        &mut self,
        seller: AccountId,
        window: WindowId,
        asset: &CollateralAsset,
    ) -> Result<ClaimReceipt> {
        let key = BatchKey::new(window, asset.clone());
        let plan = self
            .store
            .prepare_claim(&key, OrderSide::Sell, seller, self.height)?;

        let fee = mul_div(
            plan.share,
            u128::from(self.config.sell_fee_pct),
            u128::from(PCT_BASE),
            "sell fee",
        )?;
        let payout = math::sub(plan.share, fee, "sell payout after fee")?;
        let reserve = self.config.reserve;
        let beneficiary = self.config.beneficiary;

        if payout > 0 {
            self.ledger.transfer(reserve, seller, asset, payout)?;
        }
        let fee_leg = if fee > 0 {
            self.ledger.transfer(reserve, beneficiary, asset, fee)
        } else {
            Ok(())
        };
        if let Err(err) = fee_leg {
            if payout > 0 {
                let undo = self.ledger.transfer(seller, reserve, asset, payout);
                log_failed_reversal(undo, &plan);
            }
            return Err(err);
        }
        if let Err(err) = self.store.apply_claim(&plan) {
            if payout > 0 {
                let undo = self.ledger.transfer(seller, reserve, asset, payout);
                log_failed_reversal(undo, &plan);
            }
            if fee > 0 {
                let undo = self.ledger.transfer(beneficiary, reserve, asset, fee);
                log_failed_reversal(undo, &plan);
            }
            return Err(err);
        }

        self.events.emit(MarketEvent::SellOrderReturned {
            seller,
            window,
            asset: asset.clone(),
            fee,
            value: payout,
        });
        tracing::info!(
            seller = %seller,
            batch = %key,
            share = plan.share,
            fee,
            payout,
            "Sell order claimed"
        );

        Ok(ClaimReceipt {
            key,
            side: OrderSide::Sell,
            account: seller,
            share: plan.share,
            fee,
            payout,
            claimed_at: Utc::now(),
        })
    }
}

fn log_failed_reversal(outcome: Result<()>, plan: &ClaimPlan) {
    if let Err(err) = outcome {
        tracing::warn!(
            batch = %plan.key,
            side = %plan.side,
            account = %plan.account,
            share = plan.share,
            error = %err,
            "Failed to reverse ledger effect of aborted claim"
        );
    }
}
