//! Asset ledger collaborator.
//!
//! Custody, transfers and the bonded token's mint/burn bookkeeping live
//! outside the market maker. [`AssetLedger`] is the capability the market
//! is handed; [`InMemoryLedger`] is a self-contained implementation with
//! available/locked accounting per (account, holding).

use std::collections::{BTreeSet, HashMap};

use bondbatch_types::{AccountId, BondbatchError, CollateralAsset, Result};

/// Ledger operations the market maker depends on.
pub trait AssetLedger {
    /// Whether `symbol` names a token contract the ledger knows about.
    fn is_token(&self, symbol: &str) -> bool;

    /// Total bonded-token supply, spendable or not.
    fn total_supply(&self) -> u128;

    /// Collateral held by `account`.
    fn balance_of(&self, account: AccountId, asset: &CollateralAsset) -> u128;

    /// Collateral pooled in `vault`.
    fn pooled_balance_of(&self, vault: AccountId, asset: &CollateralAsset) -> u128 {
        self.balance_of(vault, asset)
    }

    /// Bonded tokens `account` may sell right now.
    fn spendable_balance_of(&self, account: AccountId) -> u128;

    /// Create `amount` bonded tokens for `account`.
    fn mint(&mut self, account: AccountId, amount: u128) -> Result<()>;

    /// Destroy `amount` of `account`'s spendable bonded tokens.
    fn burn(&mut self, account: AccountId, amount: u128) -> Result<()>;

    /// Move collateral between accounts.
    fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        asset: &CollateralAsset,
        amount: u128,
    ) -> Result<()>;

    /// Whether `asset` can be whitelisted: the native asset or a known token.
    fn is_recognized(&self, asset: &CollateralAsset) -> bool {
        match asset {
            CollateralAsset::Native => true,
            CollateralAsset::Token(symbol) => self.is_token(symbol),
        }
    }
}

/// What an account holds: bonded tokens or one collateral.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Holding {
    Bonded,
    Collateral(CollateralAsset),
}

/// Balance of one (account, holding) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoldingEntry {
    /// Spendable.
    pub available: u128,
    /// Held but not spendable (vesting, escrow).
    pub locked: u128,
}

impl HoldingEntry {
    #[must_use]
    pub fn total(&self) -> u128 {
        self.available.saturating_add(self.locked)
    }
}

/// In-memory [`AssetLedger`].
///
/// Every mutation either applies fully or leaves the ledger unchanged.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    holdings: HashMap<(AccountId, Holding), HoldingEntry>,
    tokens: BTreeSet<String>,
    bonded_supply: u128,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a token contract known to the ledger.
    pub fn register_token(&mut self, symbol: impl Into<String>) {
        self.tokens.insert(symbol.into());
    }

    /// Credit collateral to an account (faucet / external deposit).
    pub fn deposit(&mut self, account: AccountId, asset: &CollateralAsset, amount: u128) -> Result<()> {
        let entry = self
            .holdings
            .entry((account, Holding::Collateral(asset.clone())))
            .or_default();
        entry.available = checked_credit(entry.available, amount)?;
        Ok(())
    }

    /// Move spendable bonded tokens into the locked bucket.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if available < amount.
    pub fn lock_bonded(&mut self, account: AccountId, amount: u128) -> Result<()> {
        let entry = self.entry_mut(account, Holding::Bonded, amount)?;
        entry.available -= amount;
        entry.locked += amount;
        Ok(())
    }

    /// Release locked bonded tokens back to spendable.
    pub fn unlock_bonded(&mut self, account: AccountId, amount: u128) -> Result<()> {
        let entry = self
            .holdings
            .get_mut(&(account, Holding::Bonded))
            .filter(|e| e.locked >= amount)
            .ok_or_else(|| BondbatchError::Ledger {
                reason: format!("{account} has fewer than {amount} locked tokens"),
            })?;
        entry.locked -= amount;
        entry.available += amount;
        Ok(())
    }

    /// Balance for an (account, holding) pair; zero if never touched.
    #[must_use]
    pub fn holding(&self, account: AccountId, holding: &Holding) -> HoldingEntry {
        self.holdings
            .get(&(account, holding.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// All bonded tokens of `account`, locked included.
    #[must_use]
    pub fn bonded_balance_of(&self, account: AccountId) -> u128 {
        self.holding(account, &Holding::Bonded).total()
    }

    fn entry_mut(
        &mut self,
        account: AccountId,
        holding: Holding,
        amount: u128,
    ) -> Result<&mut HoldingEntry> {
        let entry = self.holdings.get_mut(&(account, holding)).ok_or(
            BondbatchError::InsufficientBalance {
                needed: amount,
                available: 0,
            },
        )?;
        if entry.available < amount {
            return Err(BondbatchError::InsufficientBalance {
                needed: amount,
                available: entry.available,
            });
        }
        Ok(entry)
    }
}

impl AssetLedger for InMemoryLedger {
    fn is_token(&self, symbol: &str) -> bool {
        self.tokens.contains(symbol)
    }

    fn total_supply(&self) -> u128 {
        self.bonded_supply
    }

    fn balance_of(&self, account: AccountId, asset: &CollateralAsset) -> u128 {
        self.holding(account, &Holding::Collateral(asset.clone()))
            .available
    }

    fn spendable_balance_of(&self, account: AccountId) -> u128 {
        self.holding(account, &Holding::Bonded).available
    }

    fn mint(&mut self, account: AccountId, amount: u128) -> Result<()> {
        let supply = checked_credit(self.bonded_supply, amount)?;
        let entry = self.holdings.entry((account, Holding::Bonded)).or_default();
        entry.available = checked_credit(entry.available, amount)?;
        self.bonded_supply = supply;
        Ok(())
    }

    fn burn(&mut self, account: AccountId, amount: u128) -> Result<()> {
        let entry = self.entry_mut(account, Holding::Bonded, amount)?;
        entry.available -= amount;
        self.bonded_supply -= amount;
        Ok(())
    }

    fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        asset: &CollateralAsset,
        amount: u128,
    ) -> Result<()> {
        if amount == 0 || from == to {
            return Ok(());
        }
        let to_key = (to, Holding::Collateral(asset.clone()));
        let credited = checked_credit(
            self.holdings.get(&to_key).map_or(0, |e| e.available),
            amount,
        )?;
        let from_entry = self.entry_mut(from, Holding::Collateral(asset.clone()), amount)?;
        from_entry.available -= amount;
        self.holdings.entry(to_key).or_default().available = credited;
        Ok(())
    }
}

fn checked_credit(balance: u128, amount: u128) -> Result<u128> {
    balance
        .checked_add(amount)
        .ok_or(BondbatchError::Arithmetic { op: "ledger credit" })
}
