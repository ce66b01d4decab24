//! Identifiers used throughout Bondbatch.
//!
//! Accounts use UUIDv7 for time-ordered lexicographic sorting. Windows are
//! host-clock heights quantized to the window size.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Unique identifier for a participant, the reserve vault, or the fee beneficiary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// WindowId
// ---------------------------------------------------------------------------

/// Identifier of a batching window: the first host-clock height of the window.
///
/// Always a multiple of the window size it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl WindowId {
    /// The window containing `height`: `floor(height / window_size) * window_size`.
    ///
    /// `window_size` must be non-zero; [`crate::MarketConfig::validate`] enforces it.
    #[must_use]
    pub fn containing(height: u64, window_size: u64) -> Self {
        Self((height / window_size) * window_size)
    }

    /// The window that follows this one.
    #[must_use]
    pub fn next(self, window_size: u64) -> Self {
        Self(self.0.saturating_add(window_size))
    }

    /// Height value of this window.
    #[must_use]
    pub fn height(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// CollateralAsset
// ---------------------------------------------------------------------------

/// An asset that can be whitelisted as collateral: the host ledger's
/// native asset, or a token identified by its symbol/contract name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum CollateralAsset {
    Native,
    Token(String),
}

impl CollateralAsset {
    #[must_use]
    pub fn token(symbol: impl Into<String>) -> Self {
        Self::Token(symbol.into())
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }
}

impl fmt::Display for CollateralAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "NATIVE"),
            Self::Token(symbol) => write!(f, "{symbol}"),
        }
    }
}

// ---------------------------------------------------------------------------
// BatchKey
// ---------------------------------------------------------------------------

/// Key of a per-window, per-collateral batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BatchKey {
    pub window: WindowId,
    pub asset: CollateralAsset,
}

impl BatchKey {
    #[must_use]
    pub fn new(window: WindowId, asset: CollateralAsset) -> Self {
        Self { window, asset }
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.window, self.asset)
    }
}

// ---------------------------------------------------------------------------
// OrderSide
// ---------------------------------------------------------------------------

/// Which side of the batch an order or claim is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

// ---------------------------------------------------------------------------
// ContributionKey
// ---------------------------------------------------------------------------

/// Flattened key of one account's contribution to one side of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ContributionKey {
    pub batch: BatchKey,
    pub side: OrderSide,
    pub account: AccountId,
}

impl ContributionKey {
    #[must_use]
    pub fn new(batch: BatchKey, side: OrderSide, account: AccountId) -> Self {
        Self {
            batch,
            side,
            account,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
