//! # bondbatch-settlement
//!
//! **Claim plane**: pays out closed batches and audits the bookkeeping.
//!
//! ## Architecture
//!
//! Once the host clock moves past a window, each contributor claims their
//! pro-rata share of that window's batch exactly once:
//! 1. Check the window is closed and the contribution unclaimed
//! 2. Compute `share = contribution * side_return / side_spend` (floored)
//! 3. Execute the ledger effect (mint bonded tokens, or pay collateral minus the sell fee)
//! 4. Mark the contribution claimed and release the share from the global counters
//!
//! [`ConservationAudit`] recomputes every counter from the stored batches
//! and reports drift.

pub mod claims;
pub mod conservation;

pub use claims::ClaimSettler;
pub use conservation::ConservationAudit;
