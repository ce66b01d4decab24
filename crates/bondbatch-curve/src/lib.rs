//! # bondbatch-curve
//!
//! **Pure pricing plane for Bondbatch.**
//!
//! Everything here is a function of a batch's frozen snapshot and its
//! aggregate order totals:
//!
//! - **Curve formula**: the [`CurveFormula`] oracle and the [`BancorFormula`] implementation
//! - **Pricing engine**: [`reprice`] matches buys against sells at the static
//!   price and routes only the net imbalance through the curve
//! - **Slippage guard**: [`SlippageGuard`] bounds the realized price of each side
//!
//! No ledger access, no storage, no clock.

pub mod formula;
pub mod math;
pub mod pricing;
pub mod slippage;

pub use formula::{BancorFormula, CurveFormula};
pub use math::mul_div;
pub use pricing::{MatchingBranch, PricingOutcome, reprice, static_price_ppm};
pub use slippage::SlippageGuard;
