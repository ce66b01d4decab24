//! Conservation audit over the batch store.
//!
//! Invariants recomputed from scratch:
//! ```text
//! tokens_to_be_minted          == Σ batches      (buy_return  - claimed buy_return)
//! collaterals_to_be_claimed[a] == Σ batches of a (sell_return - claimed sell_return)
//! ∀ batch: Σ buyers == buy_spend,  Σ sellers == sell_spend
//! ∀ asset: collaterals_to_be_claimed[a] <= pooled balance of a
//! ```
//!
//! Drift in any of them means bookkeeping went wrong somewhere upstream.

use std::collections::BTreeMap;

use bondbatch_ingress::{AssetLedger, BatchStore};
use bondbatch_types::{
    AccountId, BatchKey, BondbatchError, CollateralAsset, OrderSide, Result,
};

/// Recomputes the store's derived counters and compares.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConservationAudit;

impl ConservationAudit {
    /// Check both running counters and every batch's per-account sums.
    ///
    /// # Errors
    /// [`BondbatchError::InvariantViolation`] describing the first drift found.
    pub fn verify(store: &BatchStore) -> Result<()> {
        let mut unminted: u128 = 0;
        let mut claimable: BTreeMap<&CollateralAsset, u128> = BTreeMap::new();

        for (key, batch) in store.batches() {
            if batch.claimed.buy_return > batch.totals.buy_return
                || batch.claimed.sell_return > batch.totals.sell_return
            {
                return Err(violation(format!("{key}: claimed more than returned")));
            }
            unminted = unminted
                .checked_add(batch.unclaimed_buy_return())
                .ok_or_else(|| violation("unminted total overflows".to_string()))?;
            let slot = claimable.entry(&key.asset).or_default();
            *slot = slot
                .checked_add(batch.unclaimed_sell_return())
                .ok_or_else(|| violation("claimable total overflows".to_string()))?;
        }

        if unminted != store.tokens_to_be_minted() {
            return Err(violation(format!(
                "tokens to be minted {} != unclaimed buy returns {unminted}",
                store.tokens_to_be_minted()
            )));
        }
        for (asset, counter) in store.claimable_assets() {
            let expected = claimable.get(asset).copied().unwrap_or_default();
            if counter != expected {
                return Err(violation(format!(
                    "collaterals to be claimed for {asset}: {counter} != unclaimed sell returns {expected}"
                )));
            }
        }
        for (asset, expected) in &claimable {
            if *expected != store.collaterals_to_be_claimed(asset) {
                return Err(violation(format!(
                    "unclaimed sell returns for {asset} ({expected}) missing from counter"
                )));
            }
        }

        Self::verify_contributions(store)
    }

    /// Check `collaterals_to_be_claimed[a] <= pooled(reserve, a)` for every asset.
    ///
    /// # Errors
    /// [`BondbatchError::InsufficientPoolBalance`] for the first short asset.
    pub fn verify_pool<L: AssetLedger + ?Sized>(
        store: &BatchStore,
        ledger: &L,
        reserve: AccountId,
    ) -> Result<()> {
        for (asset, needed) in store.claimable_assets() {
            let available = ledger.pooled_balance_of(reserve, asset);
            if needed > available {
                return Err(BondbatchError::InsufficientPoolBalance {
                    asset: asset.clone(),
                    needed,
                    available,
                });
            }
        }
        Ok(())
    }

    fn verify_contributions(store: &BatchStore) -> Result<()> {
        let mut sums: BTreeMap<(&BatchKey, OrderSide), u128> = BTreeMap::new();
        for (key, contribution) in store.contributions() {
            let slot = sums.entry((&key.batch, key.side)).or_default();
            *slot = slot
                .checked_add(contribution.amount)
                .ok_or_else(|| violation(format!("{} contributions overflow", key.batch)))?;
        }

        for (key, batch) in store.batches() {
            for (side, spend) in [
                (OrderSide::Buy, batch.totals.buy_spend),
                (OrderSide::Sell, batch.totals.sell_spend),
            ] {
                let sum = sums.remove(&(key, side)).unwrap_or_default();
                if sum != spend {
                    return Err(violation(format!(
                        "{key}: {side} contributions {sum} != total spend {spend}"
                    )));
                }
            }
        }
        if let Some(((key, side), _)) = sums.into_iter().next() {
            return Err(violation(format!("{key}: {side} contributions without a batch")));
        }
        Ok(())
    }
}

fn violation(reason: String) -> BondbatchError {
    tracing::warn!(reason = %reason, "Conservation audit failed");
    BondbatchError::InvariantViolation { reason }
}

#[cfg(test)]
mod tests {
    use bondbatch_curve::BancorFormula;
    use bondbatch_ingress::{
        CollateralRegistry, EventLog, InMemoryLedger, OrderAggregator,
    };
    use bondbatch_types::{CollateralConfig, MarketConfig, WindowId, constants::PPM};

    use super::*;
    use crate::ClaimSettler;

    fn dai() -> CollateralAsset {
        CollateralAsset::token("DAI")
    }

    #[test]
    fn empty_store_conserves() {
        let store = BatchStore::new(1).unwrap();
        assert!(ConservationAudit::verify(&store).is_ok());
        assert!(
            ConservationAudit::verify_pool(&store, &InMemoryLedger::new(), AccountId::new())
                .is_ok()
        );
    }

    #[test]
    fn orders_and_claims_conserve() {
        let mut ledger = InMemoryLedger::new();
        ledger.register_token("DAI");
        let config = MarketConfig::new(AccountId::new(), AccountId::new());
        ledger.deposit(config.reserve, &dai(), 100).unwrap();
        let mut registry = CollateralRegistry::new();
        registry
            .add(&ledger, dai(), CollateralConfig::new(1_000, 0, PPM / 2))
            .unwrap();
        let mut store = BatchStore::new(1).unwrap();
        let mut events = EventLog::new();

        let (buyer, seller) = (AccountId::new(), AccountId::new());
        ledger.deposit(buyer, &dai(), 10).unwrap();
        ledger.mint(seller, 100).unwrap();
        {
            let mut agg = OrderAggregator::new(
                &mut store,
                &registry,
                &mut ledger,
                &BancorFormula,
                &config,
                &mut events,
                0,
            );
            agg.open_buy_order(buyer, &dai(), 10).unwrap();
            agg.open_sell_order(seller, &dai(), 100).unwrap();
        }
        ConservationAudit::verify(&store).unwrap();
        ConservationAudit::verify_pool(&store, &ledger, config.reserve).unwrap();

        let mut settler = ClaimSettler::new(&mut store, &mut ledger, &config, &mut events, 1);
        settler.claim_buy(buyer, WindowId(0), &dai()).unwrap();
        settler.claim_sell(seller, WindowId(0), &dai()).unwrap();
        ConservationAudit::verify(&store).unwrap();
        ConservationAudit::verify_pool(&store, &ledger, config.reserve).unwrap();
    }

    #[test]
    fn pool_shortfall_detected() {
        let mut ledger = InMemoryLedger::new();
        ledger.register_token("DAI");
        let config = MarketConfig::new(AccountId::new(), AccountId::new());
        ledger.deposit(config.reserve, &dai(), 100).unwrap();
        let mut registry = CollateralRegistry::new();
        registry
            .add(&ledger, dai(), CollateralConfig::new(1_000, 0, PPM / 2))
            .unwrap();
        let mut store = BatchStore::new(1).unwrap();
        let mut events = EventLog::new();
        let seller = AccountId::new();
        ledger.mint(seller, 100).unwrap();
        OrderAggregator::new(
            &mut store,
            &registry,
            &mut ledger,
            &BancorFormula,
            &config,
            &mut events,
            0,
        )
        .open_sell_order(seller, &dai(), 100)
        .unwrap();

        ledger
            .transfer(config.reserve, AccountId::new(), &dai(), 95)
            .unwrap();
        let err = ConservationAudit::verify_pool(&store, &ledger, config.reserve).unwrap_err();
        assert!(matches!(err, BondbatchError::InsufficientPoolBalance { .. }));
    }
}
