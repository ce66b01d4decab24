//! System-wide constants for the Bondbatch market maker.

/// Parts-per-million base. Reserve ratios and static prices are expressed in PPM.
pub const PPM: u32 = 1_000_000;

/// Percentage base for fees and slippage: `PCT_BASE` is 100%.
pub const PCT_BASE: u64 = 1_000_000_000_000_000_000;

/// Default number of host-clock heights per batching window.
pub const DEFAULT_WINDOW_SIZE: u64 = 1;

/// Default buy fee (0%).
pub const DEFAULT_BUY_FEE_PCT: u64 = 0;

/// Default sell fee (0%).
pub const DEFAULT_SELL_FEE_PCT: u64 = 0;

/// Default maximum slippage (10%).
pub const DEFAULT_MAXIMUM_SLIPPAGE: u64 = PCT_BASE / 10;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Bondbatch";
