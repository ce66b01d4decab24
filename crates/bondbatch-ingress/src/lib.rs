//! # bondbatch-ingress
//!
//! **Order ingress plane**: collateral whitelist, batch storage, and order
//! aggregation, plus the ledger and clock collaborators they run against.
//!
//! ## Architecture
//!
//! 1. **AssetLedger**: custody, transfers, bonded-token mint/burn (injected)
//! 2. **HostClock**: block height that closes windows (injected)
//! 3. **CollateralRegistry**: whitelist and virtual-liquidity parameters
//! 4. **BatchStore**: lazy snapshots, aggregates, contributions, global counters
//! 5. **OrderAggregator**: stage → reprice → validate → ledger effects → commit
//! 6. **EventLog**: events of committed operations
//!
//! ## Order Flow
//!
//! ```text
//! open_*_order → CollateralRegistry.get() → BatchStore.stage()
//!     → reprice() → SlippageGuard.check() → pool check
//!     → AssetLedger effects → BatchStore.commit() → EventLog
//! ```

pub mod aggregator;
pub mod batch_store;
pub mod clock;
pub mod event_log;
pub mod ledger;
pub mod registry;

pub use aggregator::OrderAggregator;
pub use batch_store::{BatchStore, ClaimPlan, CounterProjection, StagedBatch};
pub use clock::{HostClock, ManualClock};
pub use event_log::EventLog;
pub use ledger::{AssetLedger, Holding, HoldingEntry, InMemoryLedger};
pub use registry::CollateralRegistry;
