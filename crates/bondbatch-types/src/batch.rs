//! Batch data model.
//!
//! Each window has one [`MetaBatch`] (the frozen bonded-token supply shared
//! by every collateral) and one [`Batch`] per collateral touched in that
//! window. A batch's [`BatchSnapshot`] is fixed at creation; its
//! [`BatchTotals`] move with every order until the window closes.

use serde::{Deserialize, Serialize};

use crate::{AccountId, BatchKey, OrderSide};

/// Per-window record shared by all collateral assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaBatch {
    /// Bonded-token total supply plus tokens promised but not yet minted,
    /// captured at the first order of the window.
    pub real_supply: u128,
}

/// Pricing snapshot frozen at the first order touching a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSnapshot {
    /// Real supply of the window plus the collateral's virtual supply.
    pub supply: u128,
    /// Uncommitted pooled balance plus the collateral's virtual balance.
    pub balance: u128,
    /// Reserve ratio in PPM at snapshot time.
    pub reserve_ratio: u32,
}

/// Running order aggregates of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTotals {
    /// Collateral committed by buyers (net of fees).
    pub buy_spend: u128,
    /// Bonded tokens owed to buyers.
    pub buy_return: u128,
    /// Bonded tokens committed by sellers.
    pub sell_spend: u128,
    /// Collateral owed to sellers (before sell fees).
    pub sell_return: u128,
}

impl BatchTotals {
    /// Whether no order has been aggregated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buy_spend == 0 && self.sell_spend == 0
    }
}

/// Cumulative shares already paid out of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedTotals {
    pub buy_return: u128,
    pub sell_return: u128,
}

/// A per-window, per-collateral aggregation record.
///
/// The snapshot is only settable through [`Batch::new`]; there is no way to
/// change it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    snapshot: BatchSnapshot,
    pub totals: BatchTotals,
    pub claimed: ClaimedTotals,
}

impl Batch {
    #[must_use]
    pub fn new(snapshot: BatchSnapshot) -> Self {
        Self {
            snapshot,
            totals: BatchTotals::default(),
            claimed: ClaimedTotals::default(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> BatchSnapshot {
        self.snapshot
    }

    /// Bonded tokens still to be minted for this batch.
    #[must_use]
    pub fn unclaimed_buy_return(&self) -> u128 {
        self.totals.buy_return.saturating_sub(self.claimed.buy_return)
    }

    /// Collateral still to be paid out for this batch.
    #[must_use]
    pub fn unclaimed_sell_return(&self) -> u128 {
        self.totals
            .sell_return
            .saturating_sub(self.claimed.sell_return)
    }
}

/// One account's cumulative contribution to one side of a batch.
///
/// `claimed` is the idempotency guard: once set, the outstanding amount is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub amount: u128,
    pub claimed: bool,
}

impl Contribution {
    /// Amount still eligible for a claim.
    #[must_use]
    pub fn outstanding(&self) -> u128 {
        if self.claimed { 0 } else { self.amount }
    }
}

/// Full read-only view of a batch for queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub key: BatchKey,
    pub batch: Batch,
    pub buyers: Vec<(AccountId, Contribution)>,
    pub sellers: Vec<(AccountId, Contribution)>,
}

impl BatchRecord {
    /// Contributions on one side.
    #[must_use]
    pub fn side(&self, side: OrderSide) -> &[(AccountId, Contribution)] {
        match side {
            OrderSide::Buy => &self.buyers,
            OrderSide::Sell => &self.sellers,
        }
    }
}
