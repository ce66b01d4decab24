//! Configuration for a Bondbatch market.

use serde::{Deserialize, Serialize};

use crate::{AccountId, BondbatchError, Result, constants};

/// Market-wide parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Number of host-clock heights per batching window.
    pub window_size: u64,
    /// Fee withheld from buy orders, in `PCT_BASE` units.
    pub buy_fee_pct: u64,
    /// Fee withheld from sell claims, in `PCT_BASE` units.
    pub sell_fee_pct: u64,
    /// Largest tolerated relative deviation from the static price, in `PCT_BASE` units.
    pub maximum_slippage: u64,
    /// Vault holding the pooled collateral.
    pub reserve: AccountId,
    /// Recipient of buy and sell fees.
    pub beneficiary: AccountId,
}

impl MarketConfig {
    /// Config with default window, fees and slippage for the given vault and beneficiary.
    #[must_use]
    pub fn new(reserve: AccountId, beneficiary: AccountId) -> Self {
        Self {
            window_size: constants::DEFAULT_WINDOW_SIZE,
            buy_fee_pct: constants::DEFAULT_BUY_FEE_PCT,
            sell_fee_pct: constants::DEFAULT_SELL_FEE_PCT,
            maximum_slippage: constants::DEFAULT_MAXIMUM_SLIPPAGE,
            reserve,
            beneficiary,
        }
    }

    /// Parse a config from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| BondbatchError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject a zero window, fees at or above 100%, and a zero slippage bound.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(BondbatchError::ZeroWindowSize);
        }
        validate_fee_pct(self.buy_fee_pct)?;
        validate_fee_pct(self.sell_fee_pct)?;
        if self.maximum_slippage == 0 {
            return Err(BondbatchError::InvalidSlippage(self.maximum_slippage));
        }
        Ok(())
    }
}

/// Fees must stay strictly below `PCT_BASE`.
pub fn validate_fee_pct(pct: u64) -> Result<()> {
    if pct >= constants::PCT_BASE {
        return Err(BondbatchError::InvalidFeePct(pct));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> MarketConfig {
        MarketConfig::new(AccountId::from_bytes([1; 16]), AccountId::from_bytes([2; 16]))
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = cfg();
        assert_eq!(cfg.window_size, 1);
        assert_eq!(cfg.maximum_slippage, constants::PCT_BASE / 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_window_rejected() {
        let mut cfg = cfg();
        cfg.window_size = 0;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            BondbatchError::ZeroWindowSize
        ));
    }

    #[test]
    fn full_fee_rejected() {
        let mut cfg = cfg();
        cfg.sell_fee_pct = constants::PCT_BASE;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            BondbatchError::InvalidFeePct(_)
        ));
        cfg.sell_fee_pct = constants::PCT_BASE - 1;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_slippage_rejected() {
        let mut cfg = cfg();
        cfg.maximum_slippage = 0;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            BondbatchError::InvalidSlippage(0)
        ));
    }

    #[test]
    fn from_json_validates() {
        let mut cfg = cfg();
        cfg.window_size = 10;
        let json = serde_json::to_string(&cfg).unwrap();
        let back = MarketConfig::from_json(&json).unwrap();
        assert_eq!(back, cfg);

        cfg.window_size = 0;
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(matches!(
            MarketConfig::from_json(&json).unwrap_err(),
            BondbatchError::ZeroWindowSize
        ));
    }

    #[test]
    fn malformed_json_is_configuration_error() {
        let err = MarketConfig::from_json("{ \"window_size\": ").unwrap_err();
        assert!(matches!(err, BondbatchError::Configuration(_)));
    }
}
