//! Collateral registry: the whitelist and its virtual-liquidity parameters.
//!
//! Edits only affect batches initialized afterwards. A batch copies what it
//! needs from the registry into its snapshot at first touch.

use std::collections::BTreeMap;

use bondbatch_types::{BondbatchError, CollateralAsset, CollateralConfig, MarketEvent, Result};

use crate::ledger::AssetLedger;

/// Whitelisted collaterals and their curve parameters.
#[derive(Debug, Default)]
pub struct CollateralRegistry {
    collaterals: BTreeMap<CollateralAsset, CollateralConfig>,
}

impl CollateralRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whitelist a collateral.
    ///
    /// # Errors
    /// - `CollateralAlreadyWhitelisted` if present
    /// - `UnrecognizedAsset` if neither native nor a token the ledger knows
    /// - `InvalidReserveRatio` if the ratio is outside `(0, PPM]`
    pub fn add<L: AssetLedger + ?Sized>(
        &mut self,
        ledger: &L,
        asset: CollateralAsset,
        config: CollateralConfig,
    ) -> Result<MarketEvent> {
        if self.collaterals.contains_key(&asset) {
            return Err(BondbatchError::CollateralAlreadyWhitelisted(asset));
        }
        if !ledger.is_recognized(&asset) {
            return Err(BondbatchError::UnrecognizedAsset(asset));
        }
        config.validate()?;

        tracing::info!(
            asset = %asset,
            virtual_supply = config.virtual_supply,
            virtual_balance = config.virtual_balance,
            reserve_ratio = config.reserve_ratio,
            "Collateral added"
        );
        self.collaterals.insert(asset.clone(), config);
        Ok(MarketEvent::CollateralAdded { asset, config })
    }

    /// Replace a whitelisted collateral's parameters.
    ///
    /// # Errors
    /// `CollateralNotWhitelisted` or `InvalidReserveRatio`.
    pub fn update(&mut self, asset: CollateralAsset, config: CollateralConfig) -> Result<MarketEvent> {
        let slot = self
            .collaterals
            .get_mut(&asset)
            .ok_or_else(|| BondbatchError::CollateralNotWhitelisted(asset.clone()))?;
        config.validate()?;
        *slot = config;

        tracing::info!(
            asset = %asset,
            virtual_supply = config.virtual_supply,
            virtual_balance = config.virtual_balance,
            reserve_ratio = config.reserve_ratio,
            "Collateral updated"
        );
        Ok(MarketEvent::CollateralUpdated { asset, config })
    }

    /// Remove a collateral from the whitelist. Existing batches stay claimable.
    pub fn remove(&mut self, asset: CollateralAsset) -> Result<MarketEvent> {
        if self.collaterals.remove(&asset).is_none() {
            return Err(BondbatchError::CollateralNotWhitelisted(asset));
        }
        tracing::info!(asset = %asset, "Collateral removed");
        Ok(MarketEvent::CollateralRemoved { asset })
    }

    /// Config of a whitelisted collateral.
    pub fn get(&self, asset: &CollateralAsset) -> Result<CollateralConfig> {
        self.collaterals
            .get(asset)
            .copied()
            .ok_or_else(|| BondbatchError::CollateralNotWhitelisted(asset.clone()))
    }

    #[must_use]
    pub fn is_whitelisted(&self, asset: &CollateralAsset) -> bool {
        self.collaterals.contains_key(asset)
    }

    /// Whitelisted collaterals in key order.
    pub fn assets(&self) -> impl Iterator<Item = &CollateralAsset> {
        self.collaterals.keys()
    }
}

#[cfg(test)]
mod tests {
    use bondbatch_types::constants::PPM;

    use super::*;
    use crate::ledger::InMemoryLedger;

    fn ledger() -> InMemoryLedger {
        let mut ledger = InMemoryLedger::new();
        ledger.register_token("DAI");
        ledger
    }

    fn dai() -> CollateralAsset {
        CollateralAsset::token("DAI")
    }

    #[test]
    fn add_then_get() {
        let mut registry = CollateralRegistry::new();
        let config = CollateralConfig::new(10, 1, PPM / 2);
        let event = registry.add(&ledger(), dai(), config).unwrap();
        assert!(matches!(event, MarketEvent::CollateralAdded { .. }));
        assert_eq!(registry.get(&dai()).unwrap(), config);
        assert!(registry.is_whitelisted(&dai()));
        assert_eq!(registry.assets().collect::<Vec<_>>(), [&dai()]);
    }

    #[test]
    fn add_twice_rejected() {
        let mut registry = CollateralRegistry::new();
        let config = CollateralConfig::new(0, 0, PPM);
        registry.add(&ledger(), dai(), config).unwrap();
        let err = registry.add(&ledger(), dai(), config).unwrap_err();
        assert!(matches!(err, BondbatchError::CollateralAlreadyWhitelisted(_)));
    }

    #[test]
    fn unknown_token_rejected_native_accepted() {
        let mut registry = CollateralRegistry::new();
        let config = CollateralConfig::new(0, 0, PPM);
        let err = registry
            .add(&ledger(), CollateralAsset::token("XYZ"), config)
            .unwrap_err();
        assert!(matches!(err, BondbatchError::UnrecognizedAsset(_)));
        registry
            .add(&ledger(), CollateralAsset::Native, config)
            .unwrap();
    }

    #[test]
    fn bad_ratio_rejected() {
        let mut registry = CollateralRegistry::new();
        let err = registry
            .add(&ledger(), dai(), CollateralConfig::new(0, 0, PPM + 1))
            .unwrap_err();
        assert!(matches!(err, BondbatchError::InvalidReserveRatio(_)));
        assert_eq!(registry.assets().count(), 0);
    }

    #[test]
    fn update_requires_whitelist() {
        let mut registry = CollateralRegistry::new();
        let config = CollateralConfig::new(0, 0, PPM);
        let err = registry.update(dai(), config).unwrap_err();
        assert!(matches!(err, BondbatchError::CollateralNotWhitelisted(_)));

        registry.add(&ledger(), dai(), config).unwrap();
        let changed = CollateralConfig::new(5, 5, PPM / 4);
        registry.update(dai(), changed).unwrap();
        assert_eq!(registry.get(&dai()).unwrap(), changed);
    }

    #[test]
    fn update_checks_whitelist_before_ratio() {
        let mut registry = CollateralRegistry::new();
        let bad = CollateralConfig::new(0, 0, 0);
        let err = registry.update(dai(), bad).unwrap_err();
        assert!(matches!(err, BondbatchError::CollateralNotWhitelisted(_)));

        let config = CollateralConfig::new(0, 0, PPM);
        registry.add(&ledger(), dai(), config).unwrap();
        let err = registry.update(dai(), bad).unwrap_err();
        assert!(matches!(err, BondbatchError::InvalidReserveRatio(0)));
        assert_eq!(registry.get(&dai()).unwrap(), config);
    }

    #[test]
    fn remove_delists() {
        let mut registry = CollateralRegistry::new();
        registry
            .add(&ledger(), dai(), CollateralConfig::new(0, 0, PPM))
            .unwrap();
        registry.remove(dai()).unwrap();
        assert!(!registry.is_whitelisted(&dai()));
        assert!(matches!(
            registry.remove(dai()).unwrap_err(),
            BondbatchError::CollateralNotWhitelisted(_)
        ));
    }
}
