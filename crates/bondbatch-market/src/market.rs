//! The market maker façade.
//!
//! Owns every piece of state (registry, batch store, event log) plus the
//! injected collaborators (ledger, curve formula, host clock) and exposes
//! the admin, order, claim and query surface.

use bondbatch_curve::{CurveFormula, static_price_ppm};
use bondbatch_ingress::{
    AssetLedger, BatchStore, CollateralRegistry, EventLog, HostClock, OrderAggregator,
};
use bondbatch_settlement::{ClaimSettler, ConservationAudit};
use bondbatch_types::{
    AccountId, BatchKey, BatchRecord, BondbatchError, ClaimReceipt, CollateralAsset,
    CollateralConfig, MarketConfig, MarketEvent, MetaBatch, OrderReceipt, Result, WindowId,
    config::validate_fee_pct, constants,
};

/// Batched bonding-curve market maker.
pub struct BatchedMarketMaker<L, F, C> {
    config: MarketConfig,
    registry: CollateralRegistry,
    store: BatchStore,
    events: EventLog,
    ledger: L,
    formula: F,
    clock: C,
    open: bool,
}

impl<L: AssetLedger, F: CurveFormula, C: HostClock> BatchedMarketMaker<L, F, C> {
    /// Build a closed market. Call [`Self::open`] to start trading.
    ///
    /// # Errors
    /// Any [`MarketConfig::validate`] failure.
    pub fn new(config: MarketConfig, ledger: L, formula: F, clock: C) -> Result<Self> {
        config.validate()?;
        let store = BatchStore::new(config.window_size)?;
        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            window_size = config.window_size,
            buy_fee_pct = config.buy_fee_pct,
            sell_fee_pct = config.sell_fee_pct,
            maximum_slippage = config.maximum_slippage,
            reserve = %config.reserve,
            beneficiary = %config.beneficiary,
            "Market maker initialized"
        );
        Ok(Self {
            config,
            registry: CollateralRegistry::new(),
            store,
            events: EventLog::new(),
            ledger,
            formula,
            clock,
            open: false,
        })
    }

    /// Build from a JSON-encoded [`MarketConfig`].
    pub fn from_json_config(json: &str, ledger: L, formula: F, clock: C) -> Result<Self> {
        Self::new(MarketConfig::from_json(json)?, ledger, formula, clock)
    }

    // ------------------------------------------------------------------
    // Admin
    // ------------------------------------------------------------------

    /// Enable trading.
    ///
    /// # Errors
    /// `MarketAlreadyOpen` on the second call.
    pub fn open(&mut self) -> Result<()> {
        if self.open {
            return Err(BondbatchError::MarketAlreadyOpen);
        }
        self.open = true;
        tracing::info!("Market opened");
        self.events.emit(MarketEvent::MarketOpened);
        Ok(())
    }

    pub fn add_collateral(&mut self, asset: CollateralAsset, config: CollateralConfig) -> Result<()> {
        let event = self.registry.add(&self.ledger, asset, config)?;
        self.events.emit(event);
        Ok(())
    }

    pub fn update_collateral(
        &mut self,
        asset: CollateralAsset,
        config: CollateralConfig,
    ) -> Result<()> {
        let event = self.registry.update(asset, config)?;
        self.events.emit(event);
        Ok(())
    }

    pub fn remove_collateral(&mut self, asset: CollateralAsset) -> Result<()> {
        let event = self.registry.remove(asset)?;
        self.events.emit(event);
        Ok(())
    }

    /// Change both fees. Orders and claims after the change use the new values.
    ///
    /// # Errors
    /// `InvalidFeePct` if either is at or above 100%; neither fee changes.
    pub fn update_fees(&mut self, buy_fee_pct: u64, sell_fee_pct: u64) -> Result<()> {
        validate_fee_pct(buy_fee_pct)?;
        validate_fee_pct(sell_fee_pct)?;
        self.config.buy_fee_pct = buy_fee_pct;
        self.config.sell_fee_pct = sell_fee_pct;
        tracing::info!(buy_fee_pct, sell_fee_pct, "Fees updated");
        self.events.emit(MarketEvent::FeesUpdated {
            buy_fee_pct,
            sell_fee_pct,
        });
        Ok(())
    }

    pub fn update_beneficiary(&mut self, beneficiary: AccountId) {
        self.config.beneficiary = beneficiary;
        tracing::info!(beneficiary = %beneficiary, "Beneficiary updated");
        self.events
            .emit(MarketEvent::BeneficiaryUpdated { beneficiary });
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    /// Spend `value` of `asset` on bonded tokens in the current window.
    ///
    /// # Errors
    /// `MarketNotOpen`, plus everything [`OrderAggregator::open_buy_order`] returns.
    pub fn open_buy_order(
        &mut self,
        buyer: AccountId,
        asset: &CollateralAsset,
        value: u128,
    ) -> Result<OrderReceipt> {
        self.ensure_open()?;
        self.aggregator().open_buy_order(buyer, asset, value)
    }

    /// Sell `amount` bonded tokens for `asset` in the current window.
    ///
    /// # Errors
    /// `MarketNotOpen`, plus everything [`OrderAggregator::open_sell_order`] returns.
    pub fn open_sell_order(
        &mut self,
        seller: AccountId,
        asset: &CollateralAsset,
        amount: u128,
    ) -> Result<OrderReceipt> {
        self.ensure_open()?;
        self.aggregator().open_sell_order(seller, asset, amount)
    }

    // ------------------------------------------------------------------
    // Claims
    // ------------------------------------------------------------------

    pub fn claim_buy_order(
        &mut self,
        buyer: AccountId,
        window: WindowId,
        asset: &CollateralAsset,
    ) -> Result<ClaimReceipt> {
        self.settler().claim_buy(buyer, window, asset)
    }

    pub fn claim_sell_order(
        &mut self,
        seller: AccountId,
        window: WindowId,
        asset: &CollateralAsset,
    ) -> Result<ClaimReceipt> {
        self.settler().claim_sell(seller, window, asset)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    #[must_use]
    pub fn current_window_id(&self) -> WindowId {
        self.store.current_window(self.clock.height())
    }

    #[must_use]
    pub fn is_closed(&self, window: WindowId) -> bool {
        self.store.is_closed(window, self.clock.height())
    }

    /// Full record of a batch, if any order ever touched it.
    #[must_use]
    pub fn batch(&self, window: WindowId, asset: &CollateralAsset) -> Option<BatchRecord> {
        self.store.record(&BatchKey::new(window, asset.clone()))
    }

    #[must_use]
    pub fn meta_batch(&self, window: WindowId) -> Option<MetaBatch> {
        self.store.meta(window)
    }

    pub fn collateral(&self, asset: &CollateralAsset) -> Result<CollateralConfig> {
        self.registry.get(asset)
    }

    #[must_use]
    pub fn is_whitelisted(&self, asset: &CollateralAsset) -> bool {
        self.registry.is_whitelisted(asset)
    }

    /// Whitelisted collaterals in key order.
    pub fn collaterals(&self) -> impl Iterator<Item = &CollateralAsset> {
        self.registry.assets()
    }

    /// Static price of an initialized batch, in PPM.
    pub fn static_price_ppm(&self, window: WindowId, asset: &CollateralAsset) -> Result<Option<u128>> {
        self.store
            .batch(&BatchKey::new(window, asset.clone()))
            .map(|batch| static_price_ppm(&batch.snapshot()))
            .transpose()
    }

    #[must_use]
    pub fn tokens_to_be_minted(&self) -> u128 {
        self.store.tokens_to_be_minted()
    }

    #[must_use]
    pub fn collaterals_to_be_claimed(&self, asset: &CollateralAsset) -> u128 {
        self.store.collaterals_to_be_claimed(asset)
    }

    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Recompute every counter and check the reserve covers claimable collateral.
    pub fn audit(&self) -> Result<()> {
        ConservationAudit::verify(&self.store)?;
        ConservationAudit::verify_pool(&self.store, &self.ledger, self.config.reserve)
    }

    /// Take all events committed since the last drain.
    pub fn drain_events(&mut self) -> Vec<MarketEvent> {
        self.events.drain()
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct ledger access, for deposits and other activity outside the market.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(BondbatchError::MarketNotOpen)
        }
    }

    fn aggregator(&mut self) -> OrderAggregator<'_, L, F> {
        let height = self.clock.height();
        OrderAggregator::new(
            &mut self.store,
            &self.registry,
            &mut self.ledger,
            &self.formula,
            &self.config,
            &mut self.events,
            height,
        )
    }

    fn settler(&mut self) -> ClaimSettler<'_, L> {
        let height = self.clock.height();
        ClaimSettler::new(
            &mut self.store,
            &mut self.ledger,
            &self.config,
            &mut self.events,
            height,
        )
    }
}
