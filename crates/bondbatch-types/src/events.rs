//! Notifications emitted by the market maker.
//!
//! Events are only produced by operations that commit; a rejected order or
//! claim leaves no trace in the event stream.

use serde::{Deserialize, Serialize};

use crate::{AccountId, BatchTotals, CollateralAsset, CollateralConfig, WindowId};

/// Everything an observer can see happen in the market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketEvent {
    /// Trading was enabled.
    MarketOpened,
    /// A collateral was whitelisted.
    CollateralAdded {
        asset: CollateralAsset,
        config: CollateralConfig,
    },
    /// A whitelisted collateral's parameters changed.
    CollateralUpdated {
        asset: CollateralAsset,
        config: CollateralConfig,
    },
    /// A collateral was removed from the whitelist.
    CollateralRemoved { asset: CollateralAsset },
    /// Fee percentages changed.
    FeesUpdated { buy_fee_pct: u64, sell_fee_pct: u64 },
    /// Fee recipient changed.
    BeneficiaryUpdated { beneficiary: AccountId },
    /// First order of a window: the shared supply snapshot was taken.
    NewWindow { window: WindowId, real_supply: u128 },
    /// First order of a collateral in a window: the pricing snapshot was taken.
    NewBatch {
        window: WindowId,
        asset: CollateralAsset,
        supply: u128,
        balance: u128,
        reserve_ratio: u32,
    },
    /// A buy order was aggregated into a batch.
    BuyOrderOpened {
        buyer: AccountId,
        window: WindowId,
        asset: CollateralAsset,
        fee: u128,
        value: u128,
    },
    /// A sell order was aggregated into a batch.
    SellOrderOpened {
        seller: AccountId,
        window: WindowId,
        asset: CollateralAsset,
        amount: u128,
    },
    /// A buyer claimed their bonded tokens.
    BuyOrderReturned {
        buyer: AccountId,
        window: WindowId,
        asset: CollateralAsset,
        amount: u128,
    },
    /// A seller claimed their collateral.
    SellOrderReturned {
        seller: AccountId,
        window: WindowId,
        asset: CollateralAsset,
        fee: u128,
        value: u128,
    },
    /// A batch's aggregates were repriced.
    PricingUpdated {
        window: WindowId,
        asset: CollateralAsset,
        totals: BatchTotals,
    },
}

impl MarketEvent {
    /// Short upper-case tag for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MarketOpened => "MARKET_OPENED",
            Self::CollateralAdded { .. } => "COLLATERAL_ADDED",
            Self::CollateralUpdated { .. } => "COLLATERAL_UPDATED",
            Self::CollateralRemoved { .. } => "COLLATERAL_REMOVED",
            Self::FeesUpdated { .. } => "FEES_UPDATED",
            Self::BeneficiaryUpdated { .. } => "BENEFICIARY_UPDATED",
            Self::NewWindow { .. } => "NEW_WINDOW",
            Self::NewBatch { .. } => "NEW_BATCH",
            Self::BuyOrderOpened { .. } => "BUY_ORDER_OPENED",
            Self::SellOrderOpened { .. } => "SELL_ORDER_OPENED",
            Self::BuyOrderReturned { .. } => "BUY_ORDER_RETURNED",
            Self::SellOrderReturned { .. } => "SELL_ORDER_RETURNED",
            Self::PricingUpdated { .. } => "PRICING_UPDATED",
        }
    }
}

impl std::fmt::Display for MarketEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}
