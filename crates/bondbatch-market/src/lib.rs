//! # bondbatch-market
//!
//! The **Bondbatch** batched bonding-curve market maker.
//!
//! Participants buy and sell a bonded token against whitelisted collateral.
//! Orders are pooled into fixed-size windows of host-clock height and cleared
//! together: every order in a window sees the same entry price, opposing
//! demand is matched at the static price, and only the net imbalance moves
//! along the curve.
//!
//! - [`BatchedMarketMaker`]: admin operations, orders, claims, queries
//! - [`SharedMarket`]: lock-protected handle for concurrent callers
//!
//! ## Window Lifecycle
//!
//! ```text
//!  window W open                    clock moves past W
//! ┌─────────────────────────────┐   ┌──────────────────────────────┐
//! │ first order: snapshot       │──▶│ batch frozen                 │
//! │ every order: reprice,       │   │ each contributor claims once │
//! │   validate slippage + pool  │   │   (mint / collateral payout) │
//! └─────────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! The building blocks live in `bondbatch-types`, `bondbatch-curve`,
//! `bondbatch-ingress` and `bondbatch-settlement`.

pub mod market;
pub mod shared;

pub use market::BatchedMarketMaker;
pub use shared::SharedMarket;
