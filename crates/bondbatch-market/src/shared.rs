//! Thread-safe handle to a market maker.
//!
//! Every order and claim runs under one exclusive lock. A single writer
//! serializes operations on the same batch, and the global counters span
//! all batches, so finer-grained locking would not buy parallel writes.

use std::sync::{Arc, Mutex, MutexGuard};

use bondbatch_curve::CurveFormula;
use bondbatch_ingress::{AssetLedger, HostClock};
use bondbatch_types::{
    AccountId, BondbatchError, ClaimReceipt, CollateralAsset, MarketEvent, OrderReceipt, Result,
    WindowId,
};

use crate::market::BatchedMarketMaker;

/// Cloneable, lock-protected [`BatchedMarketMaker`].
pub struct SharedMarket<L, F, C> {
    inner: Arc<Mutex<BatchedMarketMaker<L, F, C>>>,
}

impl<L, F, C> Clone for SharedMarket<L, F, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: AssetLedger, F: CurveFormula, C: HostClock> SharedMarket<L, F, C> {
    #[must_use]
    pub fn new(market: BatchedMarketMaker<L, F, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(market)),
        }
    }

    /// Run `f` with exclusive access to the market.
    ///
    /// # Errors
    /// `Internal` if a previous holder panicked, otherwise whatever `f` returns.
    pub fn with<R>(
        &self,
        f: impl FnOnce(&mut BatchedMarketMaker<L, F, C>) -> Result<R>,
    ) -> Result<R> {
        let mut guard = self.lock()?;
        f(&mut guard)
    }

    pub fn open_buy_order(
        &self,
        buyer: AccountId,
        asset: &CollateralAsset,
        value: u128,
    ) -> Result<OrderReceipt> {
        self.lock()?.open_buy_order(buyer, asset, value)
    }

    pub fn open_sell_order(
        &self,
        seller: AccountId,
        asset: &CollateralAsset,
        amount: u128,
    ) -> Result<OrderReceipt> {
        self.lock()?.open_sell_order(seller, asset, amount)
    }

    pub fn claim_buy_order(
        &self,
        buyer: AccountId,
        window: WindowId,
        asset: &CollateralAsset,
    ) -> Result<ClaimReceipt> {
        self.lock()?.claim_buy_order(buyer, window, asset)
    }

    pub fn claim_sell_order(
        &self,
        seller: AccountId,
        window: WindowId,
        asset: &CollateralAsset,
    ) -> Result<ClaimReceipt> {
        self.lock()?.claim_sell_order(seller, window, asset)
    }

    pub fn drain_events(&self) -> Result<Vec<MarketEvent>> {
        Ok(self.lock()?.drain_events())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BatchedMarketMaker<L, F, C>>> {
        self.inner
            .lock()
            .map_err(|_| BondbatchError::Internal("market lock poisoned".to_string()))
    }
}
