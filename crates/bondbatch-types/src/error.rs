//! Error types for the Bondbatch market maker.
//!
//! All errors use the `BB_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by failure class:
//! - 1xx: Configuration errors (rejected at admin-operation time)
//! - 2xx: Input errors (rejected before any aggregate mutation)
//! - 3xx: Invariant violations (tentative mutation rolled back)
//! - 4xx: State errors (claim preconditions)
//! - 5xx: Curve formula errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{AccountId, BatchKey, CollateralAsset, OrderSide, WindowId};

/// Central error enum for all Bondbatch operations.
#[derive(Debug, Error)]
pub enum BondbatchError {
    // =================================================================
    // Configuration Errors (1xx)
    // =================================================================
    /// The asset is not whitelisted as collateral.
    #[error("BB_ERR_100: Collateral not whitelisted: {0}")]
    CollateralNotWhitelisted(CollateralAsset),

    /// The asset is already whitelisted.
    #[error("BB_ERR_101: Collateral already whitelisted: {0}")]
    CollateralAlreadyWhitelisted(CollateralAsset),

    /// The asset is neither the native asset nor a token the ledger recognizes.
    #[error("BB_ERR_102: Unrecognized asset: {0}")]
    UnrecognizedAsset(CollateralAsset),

    /// Reserve ratio outside `(0, PPM]`.
    #[error("BB_ERR_103: Invalid reserve ratio: {0} ppm")]
    InvalidReserveRatio(u32),

    /// Fee percentage at or above 100%.
    #[error("BB_ERR_104: Invalid fee percentage: {0}")]
    InvalidFeePct(u64),

    /// Maximum slippage must be positive.
    #[error("BB_ERR_105: Invalid maximum slippage: {0}")]
    InvalidSlippage(u64),

    /// Window size must be positive.
    #[error("BB_ERR_106: Window size must be non-zero")]
    ZeroWindowSize,

    /// Orders are rejected until the market is opened.
    #[error("BB_ERR_107: Market is not open")]
    MarketNotOpen,

    /// The market was already opened.
    #[error("BB_ERR_108: Market already open")]
    MarketAlreadyOpen,

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("BB_ERR_109: Configuration error: {0}")]
    Configuration(String),

    // =================================================================
    // Input Errors (2xx)
    // =================================================================
    /// Orders must carry a non-zero value or amount.
    #[error("BB_ERR_200: Order amount must be non-zero")]
    ZeroAmount,

    /// Not enough spendable balance to place the order.
    #[error("BB_ERR_201: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    // =================================================================
    // Invariant Violations (3xx)
    // =================================================================
    /// The batch's realized price deviates too far from its static price.
    #[error("BB_ERR_300: Slippage exceeded on {side} side of {key}: deviation {deviation} > maximum {maximum}")]
    SlippageExceeded {
        key: BatchKey,
        side: OrderSide,
        deviation: u128,
        maximum: u64,
    },

    /// The reserve cannot cover every claimable sell return for this asset.
    #[error("BB_ERR_301: Insufficient pool balance for {asset}: need {needed}, have {available}")]
    InsufficientPoolBalance {
        asset: CollateralAsset,
        needed: u128,
        available: u128,
    },

    /// Checked arithmetic failed (overflow, underflow or division by zero).
    #[error("BB_ERR_302: Arithmetic error in {op}")]
    Arithmetic { op: &'static str },

    /// A bookkeeping invariant no longer holds. Critical safety alert.
    #[error("BB_ERR_303: Invariant violation: {reason}")]
    InvariantViolation { reason: String },

    // =================================================================
    // State Errors (4xx)
    // =================================================================
    /// Claims are only possible once the window has closed.
    #[error("BB_ERR_400: Window still open: {0}")]
    WindowStillOpen(WindowId),

    /// The account has no contribution on this side of the batch.
    #[error("BB_ERR_401: Nothing to claim for {account} on {side} side of {key}")]
    NothingToClaim {
        key: BatchKey,
        side: OrderSide,
        account: AccountId,
    },

    /// The contribution was already paid out.
    #[error("BB_ERR_402: Already claimed by {account} on {side} side of {key}")]
    AlreadyClaimed {
        key: BatchKey,
        side: OrderSide,
        account: AccountId,
    },

    // =================================================================
    // Curve Errors (5xx)
    // =================================================================
    /// The curve formula was evaluated outside its domain.
    #[error("BB_ERR_500: Curve formula error: {reason}")]
    CurveFormula { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// The asset ledger rejected a side effect.
    #[error("BB_ERR_900: Ledger error: {reason}")]
    Ledger { reason: String },

    /// Unrecoverable internal error.
    #[error("BB_ERR_901: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("BB_ERR_902: Serialization error: {0}")]
    Serialization(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, BondbatchError>;

impl From<serde_json::Error> for BondbatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
