//! # bondbatch-types
//!
//! Shared types, errors, and configuration for the **Bondbatch** batched
//! bonding-curve market maker.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`WindowId`], [`CollateralAsset`], [`BatchKey`], [`OrderSide`]
//! - **Collateral model**: [`CollateralConfig`]
//! - **Batch model**: [`MetaBatch`], [`Batch`], [`BatchSnapshot`], [`BatchTotals`], [`Contribution`]
//! - **Events**: [`MarketEvent`]
//! - **Receipts**: [`OrderReceipt`], [`ClaimReceipt`]
//! - **Configuration**: [`MarketConfig`]
//! - **Errors**: [`BondbatchError`] with `BB_ERR_` prefix codes
//! - **Constants**: ratio bases and defaults

pub mod batch;
pub mod collateral;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod ids;
pub mod receipt;

// Re-export all primary types at crate root for ergonomic imports:
//   use bondbatch_types::{Batch, CollateralAsset, WindowId, ...};

pub use batch::*;
pub use collateral::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use ids::*;
pub use receipt::*;

// Constants are accessed via `bondbatch_types::constants::FOO`
// (not re-exported to avoid name collisions).
