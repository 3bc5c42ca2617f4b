//! Trade Router Library
//!
//! Routes single-input single-output trades through pluggable swap executors,
//! extracting protocol and marketplace fees, enforcing slippage bounds and
//! verifying signed authorizations. Every trade settles atomically against
//! an in-memory ledger.
//!
//! Created: 2026-10-15

pub mod auth;
pub mod config;
pub mod errors;
pub mod executor;
pub mod fees;
pub mod ledger;
pub mod router;
pub mod scenario;
pub mod types;
pub mod venues;

// Re-export commonly used types
pub use config::{load_config, AppConfig};
pub use errors::{AuthFailure, RouterError};
pub use executor::{SwapExecutor, UniswapCaller};
pub use fees::{FeeDescriptor, FeeEngine, Share};
pub use ledger::Ledger;
pub use router::{Router, RouterSettings};
pub use types::{
    AmountMode, AmountType, Asset, CallContext, ExecutionReceipt, SwapDescription, TradeInput,
    TradeOutput,
};
