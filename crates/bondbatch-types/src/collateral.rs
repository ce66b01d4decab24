//! Per-collateral curve parameters.
//!
//! A collateral is whitelisted exactly when the registry holds a
//! [`CollateralConfig`] for it. Changes only reach batches initialized
//! after the change; open batches keep their frozen snapshot.

use serde::{Deserialize, Serialize};

use crate::{BondbatchError, Result, constants};

/// Curve-shaping parameters for one collateral asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralConfig {
    /// Offset added to the real bonded-token supply when snapshotting.
    pub virtual_supply: u128,
    /// Offset added to the real pooled balance when snapshotting.
    pub virtual_balance: u128,
    /// Curve steepness in parts-per-million, within `(0, PPM]`.
    pub reserve_ratio: u32,
}

impl CollateralConfig {
    #[must_use]
    pub fn new(virtual_supply: u128, virtual_balance: u128, reserve_ratio: u32) -> Self {
        Self {
            virtual_supply,
            virtual_balance,
            reserve_ratio,
        }
    }

    /// Reject reserve ratios outside `(0, PPM]`.
    pub fn validate(&self) -> Result<()> {
        if self.reserve_ratio == 0 || self.reserve_ratio > constants::PPM {
            return Err(BondbatchError::InvalidReserveRatio(self.reserve_ratio));
        }
        Ok(())
    }
}
