//! Batch store: meta-batches, batches, per-account contributions, and the
//! process-wide counters that must always equal the live sums over them.
//!
//! ## Lifecycle
//!
//! ```text
//! first order in window   → MetaBatch snapshot  (real_supply)
//! first order for asset   → Batch snapshot      (supply, balance, ratio)
//! every order             → stage → reprice → validate → project → commit
//! window closed           → prepare_claim → ledger effects → apply_claim
//! ```
//!
//! Nothing is written until [`BatchStore::commit`]. A rejected order drops
//! its [`StagedBatch`] and the store is exactly as it was.

use std::collections::BTreeMap;

use bondbatch_curve::{math, mul_div};
use bondbatch_types::{
    AccountId, Batch, BatchKey, BatchRecord, BatchSnapshot, BatchTotals, BondbatchError,
    CollateralAsset, CollateralConfig, Contribution, ContributionKey, MarketEvent, MetaBatch,
    OrderSide, Result, WindowId,
};

use crate::ledger::AssetLedger;

/// An order applied to a private copy of its batch, not yet visible.
#[derive(Debug, Clone)]
pub struct StagedBatch {
    pub key: BatchKey,
    pub side: OrderSide,
    pub account: AccountId,
    pub amount: u128,
    /// Tentative batch with the order's spend added. Pricing runs on this copy.
    pub batch: Batch,
    /// Totals before the order, for backing out the old returns.
    pub prior: BatchTotals,
    contribution: Contribution,
    new_meta: Option<MetaBatch>,
    is_new_batch: bool,
}

impl StagedBatch {
    /// The meta-batch this order would create, if it opens the window.
    #[must_use]
    pub fn new_meta(&self) -> Option<MetaBatch> {
        self.new_meta
    }

    #[must_use]
    pub fn is_new_batch(&self) -> bool {
        self.is_new_batch
    }
}

/// Counter values after a staged order commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterProjection {
    pub tokens_to_be_minted: u128,
    /// For the staged batch's collateral.
    pub collaterals_to_be_claimed: u128,
}

/// A validated claim awaiting its ledger effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimPlan {
    pub key: BatchKey,
    pub side: OrderSide,
    pub account: AccountId,
    /// Pro-rata share of the side's return, floored.
    pub share: u128,
}

/// Authoritative storage for batches and the counters derived from them.
#[derive(Debug)]
pub struct BatchStore {
    window_size: u64,
    metas: BTreeMap<WindowId, MetaBatch>,
    batches: BTreeMap<BatchKey, Batch>,
    contributions: BTreeMap<ContributionKey, Contribution>,
    tokens_to_be_minted: u128,
    collaterals_to_be_claimed: BTreeMap<CollateralAsset, u128>,
}

impl BatchStore {
    /// # Errors
    /// `ZeroWindowSize` if `window_size == 0`.
    pub fn new(window_size: u64) -> Result<Self> {
        if window_size == 0 {
            return Err(BondbatchError::ZeroWindowSize);
        }
        Ok(Self {
            window_size,
            metas: BTreeMap::new(),
            batches: BTreeMap::new(),
            contributions: BTreeMap::new(),
            tokens_to_be_minted: 0,
            collaterals_to_be_claimed: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn window_size(&self) -> u64 {
        self.window_size
    }

    /// Window containing `height`.
    #[must_use]
    pub fn current_window(&self, height: u64) -> WindowId {
        WindowId::containing(height, self.window_size)
    }

    /// A window is closed once the clock has moved into a later window.
    #[must_use]
    pub fn is_closed(&self, window: WindowId, height: u64) -> bool {
        window < self.current_window(height)
    }

    // ------------------------------------------------------------------
    // Order path
    // ------------------------------------------------------------------

    /// Resolve `window`'s batch for `asset` (snapshotting lazily) and add
    /// `amount` to `side` for `account`, all on a private copy.
    ///
    /// The meta-batch snapshot is taken before the batch snapshot. Both read
    /// the ledger as it stands before the order's own transfers.
    #[allow(clippy::too_many_arguments)]
    pub fn stage<L: AssetLedger + ?Sized>(
        &self,
        ledger: &L,
        reserve: AccountId,
        window: WindowId,
        asset: &CollateralAsset,
        collateral: CollateralConfig,
        side: OrderSide,
        account: AccountId,
        amount: u128,
    ) -> Result<StagedBatch> {
        let key = BatchKey::new(window, asset.clone());

        let (meta, new_meta) = match self.metas.get(&window) {
            Some(meta) => (*meta, None),
            None => {
                let real_supply = math::add(
                    ledger.total_supply(),
                    self.tokens_to_be_minted,
                    "real supply snapshot",
                )?;
                let meta = MetaBatch { real_supply };
                (meta, Some(meta))
            }
        };

        let (mut batch, is_new_batch) = match self.batches.get(&key) {
            Some(batch) => (batch.clone(), false),
            None => {
                let supply = math::add(
                    meta.real_supply,
                    collateral.virtual_supply,
                    "supply snapshot",
                )?;
                let available = ledger.pooled_balance_of(reserve, asset);
                let owed = self.collaterals_to_be_claimed(asset);
                // The reserve was drained below what sellers are already owed.
                let pooled = available.checked_sub(owed).ok_or_else(|| {
                    BondbatchError::InsufficientPoolBalance {
                        asset: asset.clone(),
                        needed: owed,
                        available,
                    }
                })?;
                let balance = math::add(pooled, collateral.virtual_balance, "balance snapshot")?;
                let snapshot = BatchSnapshot {
                    supply,
                    balance,
                    reserve_ratio: collateral.reserve_ratio,
                };
                (Batch::new(snapshot), true)
            }
        };

        let prior = batch.totals;
        let contribution_key = ContributionKey::new(key.clone(), side, account);
        let mut contribution = self
            .contributions
            .get(&contribution_key)
            .copied()
            .unwrap_or_default();
        contribution.amount = math::add(contribution.amount, amount, "account contribution")?;

        match side {
            OrderSide::Buy => {
                batch.totals.buy_spend =
                    math::add(batch.totals.buy_spend, amount, "total buy spend")?;
            }
            OrderSide::Sell => {
                batch.totals.sell_spend =
                    math::add(batch.totals.sell_spend, amount, "total sell spend")?;
            }
        }

        Ok(StagedBatch {
            key,
            side,
            account,
            amount,
            batch,
            prior,
            contribution,
            new_meta,
            is_new_batch,
        })
    }

    /// Counters after backing out the staged batch's prior returns and
    /// adding its repriced ones.
    pub fn project(&self, staged: &StagedBatch) -> Result<CounterProjection> {
        let tokens_to_be_minted = math::add(
            math::sub(
                self.tokens_to_be_minted,
                staged.prior.buy_return,
                "back out buy return",
            )?,
            staged.batch.totals.buy_return,
            "tokens to be minted",
        )?;
        let collaterals_to_be_claimed = math::add(
            math::sub(
                self.collaterals_to_be_claimed(&staged.key.asset),
                staged.prior.sell_return,
                "back out sell return",
            )?,
            staged.batch.totals.sell_return,
            "collaterals to be claimed",
        )?;
        Ok(CounterProjection {
            tokens_to_be_minted,
            collaterals_to_be_claimed,
        })
    }

    /// Publish a staged order. Returns the lifecycle events it triggered.
    pub fn commit(&mut self, staged: StagedBatch, projection: CounterProjection) -> Vec<MarketEvent> {
        let StagedBatch {
            key,
            side,
            account,
            batch,
            contribution,
            new_meta,
            is_new_batch,
            ..
        } = staged;
        let mut events = Vec::new();

        if let Some(meta) = new_meta {
            tracing::info!(
                window = %key.window,
                real_supply = meta.real_supply,
                "New window"
            );
            self.metas.insert(key.window, meta);
            events.push(MarketEvent::NewWindow {
                window: key.window,
                real_supply: meta.real_supply,
            });
        }
        if is_new_batch {
            let snapshot = batch.snapshot();
            tracing::info!(
                batch = %key,
                supply = snapshot.supply,
                balance = snapshot.balance,
                reserve_ratio = snapshot.reserve_ratio,
                "New batch"
            );
            events.push(MarketEvent::NewBatch {
                window: key.window,
                asset: key.asset.clone(),
                supply: snapshot.supply,
                balance: snapshot.balance,
                reserve_ratio: snapshot.reserve_ratio,
            });
        }

        self.tokens_to_be_minted = projection.tokens_to_be_minted;
        self.collaterals_to_be_claimed
            .insert(key.asset.clone(), projection.collaterals_to_be_claimed);
        self.contributions
            .insert(ContributionKey::new(key.clone(), side, account), contribution);
        self.batches.insert(key, batch);
        events
    }

    // ------------------------------------------------------------------
    // Claim path
    // ------------------------------------------------------------------

    /// Check claim preconditions and compute the account's share.
    ///
    /// # Errors
    /// - `WindowStillOpen` while the clock is inside the batch's window
    /// - `NothingToClaim` if the account never contributed to that side
    /// - `AlreadyClaimed` if it already claimed
    pub fn prepare_claim(
        &self,
        key: &BatchKey,
        side: OrderSide,
        account: AccountId,
        height: u64,
    ) -> Result<ClaimPlan> {
        if !self.is_closed(key.window, height) {
            return Err(BondbatchError::WindowStillOpen(key.window));
        }
        let contribution = self
            .contribution(&ContributionKey::new(key.clone(), side, account))
            .ok_or_else(|| BondbatchError::NothingToClaim {
                key: key.clone(),
                side,
                account,
            })?;
        if contribution.claimed {
            return Err(BondbatchError::AlreadyClaimed {
                key: key.clone(),
                side,
                account,
            });
        }
        let batch = self.batches.get(key).ok_or_else(|| BondbatchError::InvariantViolation {
            reason: format!("contribution without batch {key}"),
        })?;

        let totals = batch.totals;
        let share = match side {
            OrderSide::Buy => mul_div(
                contribution.amount,
                totals.buy_return,
                totals.buy_spend,
                "buy claim share",
            )?,
            OrderSide::Sell => mul_div(
                contribution.amount,
                totals.sell_return,
                totals.sell_spend,
                "sell claim share",
            )?,
        };
        Ok(ClaimPlan {
            key: key.clone(),
            side,
            account,
            share,
        })
    }

    /// Mark the contribution claimed and release its share from the counters.
    ///
    /// All checks run before any field is written.
    pub fn apply_claim(&mut self, plan: &ClaimPlan) -> Result<()> {
        let contribution_key = ContributionKey::new(plan.key.clone(), plan.side, plan.account);
        match self.contributions.get(&contribution_key) {
            Some(c) if c.claimed => {
                return Err(BondbatchError::AlreadyClaimed {
                    key: plan.key.clone(),
                    side: plan.side,
                    account: plan.account,
                });
            }
            Some(_) => {}
            None => {
                return Err(BondbatchError::NothingToClaim {
                    key: plan.key.clone(),
                    side: plan.side,
                    account: plan.account,
                });
            }
        }
        let batch = self
            .batches
            .get(&plan.key)
            .ok_or_else(|| BondbatchError::InvariantViolation {
                reason: format!("claim against missing batch {}", plan.key),
            })?;

        let mut claimed = batch.claimed;
        let (tokens, collaterals) = match plan.side {
            OrderSide::Buy => {
                claimed.buy_return = math::add(claimed.buy_return, plan.share, "claimed buy return")?;
                if claimed.buy_return > batch.totals.buy_return {
                    return Err(BondbatchError::InvariantViolation {
                        reason: format!("buy claims on {} exceed total return", plan.key),
                    });
                }
                (
                    math::sub(self.tokens_to_be_minted, plan.share, "release tokens to be minted")?,
                    self.collaterals_to_be_claimed(&plan.key.asset),
                )
            }
            OrderSide::Sell => {
                claimed.sell_return =
                    math::add(claimed.sell_return, plan.share, "claimed sell return")?;
                if claimed.sell_return > batch.totals.sell_return {
                    return Err(BondbatchError::InvariantViolation {
                        reason: format!("sell claims on {} exceed total return", plan.key),
                    });
                }
                (
                    self.tokens_to_be_minted,
                    math::sub(
                        self.collaterals_to_be_claimed(&plan.key.asset),
                        plan.share,
                        "release collaterals to be claimed",
                    )?,
                )
            }
        };

        self.tokens_to_be_minted = tokens;
        self.collaterals_to_be_claimed
            .insert(plan.key.asset.clone(), collaterals);
        if let Some(batch) = self.batches.get_mut(&plan.key) {
            batch.claimed = claimed;
        }
        if let Some(contribution) = self.contributions.get_mut(&contribution_key) {
            contribution.claimed = true;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    #[must_use]
    pub fn meta(&self, window: WindowId) -> Option<MetaBatch> {
        self.metas.get(&window).copied()
    }

    #[must_use]
    pub fn batch(&self, key: &BatchKey) -> Option<&Batch> {
        self.batches.get(key)
    }

    #[must_use]
    pub fn contribution(&self, key: &ContributionKey) -> Option<Contribution> {
        self.contributions.get(key).copied()
    }

    /// Full record of a batch: snapshot, totals, and every contributor.
    #[must_use]
    pub fn record(&self, key: &BatchKey) -> Option<BatchRecord> {
        let batch = self.batches.get(key)?.clone();
        let mut buyers = Vec::new();
        let mut sellers = Vec::new();
        for (k, c) in self.contributions.iter().filter(|(k, _)| &k.batch == key) {
            match k.side {
                OrderSide::Buy => buyers.push((k.account, *c)),
                OrderSide::Sell => sellers.push((k.account, *c)),
            }
        }
        Some(BatchRecord {
            key: key.clone(),
            batch,
            buyers,
            sellers,
        })
    }

    pub fn batches(&self) -> impl Iterator<Item = (&BatchKey, &Batch)> {
        self.batches.iter()
    }

    pub fn contributions(&self) -> impl Iterator<Item = (&ContributionKey, &Contribution)> {
        self.contributions.iter()
    }

    #[must_use]
    pub fn tokens_to_be_minted(&self) -> u128 {
        self.tokens_to_be_minted
    }

    #[must_use]
    pub fn collaterals_to_be_claimed(&self, asset: &CollateralAsset) -> u128 {
        self.collaterals_to_be_claimed
            .get(asset)
            .copied()
            .unwrap_or_default()
    }

    /// Every collateral with a claimable counter entry.
    pub fn claimable_assets(&self) -> impl Iterator<Item = (&CollateralAsset, u128)> {
        self.collaterals_to_be_claimed.iter().map(|(a, v)| (a, *v))
    }
}
