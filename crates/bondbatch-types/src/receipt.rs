//! Receipts returned to callers of orders and claims.
//!
//! Receipts form the caller-facing audit trail: what was aggregated into
//! which batch, and what a claim actually paid out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, BatchKey, OrderSide};

/// Proof that an order was aggregated into a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    /// The batch the order landed in.
    pub key: BatchKey,
    pub side: OrderSide,
    pub account: AccountId,
    /// Collateral value (buy) or bonded-token amount (sell) as submitted.
    pub gross: u128,
    /// Fee withheld at order time (buy side only).
    pub fee: u128,
    /// Amount credited to the batch aggregates.
    pub net: u128,
}

/// Proof that a claim paid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub key: BatchKey,
    pub side: OrderSide,
    pub account: AccountId,
    /// Pro-rata share of the batch return.
    pub share: u128,
    /// Fee withheld at claim time (sell side only).
    pub fee: u128,
    /// Amount delivered to the account: `share - fee`.
    pub payout: u128,
    pub claimed_at: DateTime<Utc>,
}

impl std::fmt::Display for ClaimReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Claim[{}] {} {} share={} fee={} payout={}",
            self.key, self.side, self.account, self.share, self.fee, self.payout,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CollateralAsset, WindowId};

    #[test]
    fn claim_receipt_display() {
        let receipt = ClaimReceipt {
            key: BatchKey::new(WindowId(20), CollateralAsset::token("DAI")),
            side: OrderSide::Sell,
            account: AccountId::from_bytes([7; 16]),
            share: 100,
            fee: 3,
            payout: 97,
            claimed_at: Utc::now(),
        };
        let s = format!("{receipt}");
        assert!(s.contains("window:20/DAI"));
        assert!(s.contains("SELL"));
        assert!(s.contains("payout=97"));
    }

    #[test]
    fn order_receipt_serde_roundtrip() {
        let receipt = OrderReceipt {
            key: BatchKey::new(WindowId(0), CollateralAsset::Native),
            side: OrderSide::Buy,
            account: AccountId::new(),
            gross: 100,
            fee: 1,
            net: 99,
        };
        let json = serde_json::to_string(&receipt).unwrap();
        let back: OrderReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(receipt, back);
    }
}
