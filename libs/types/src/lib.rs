//! Types library for the arbitrage execution simulator
//!
//! Shared definitions consumed by the simulation engine and by the
//! planners and trackers that feed it.
//!
//! # Modules
//! - `ids`: Unique identifiers (OrderId, PlanId, OpportunityId)
//! - `order`: Order side and the executable order leg
//! - `plan`: Execution plans and their lifecycle
//! - `market`: Market data points pushed into the simulator
//! - `opportunity`: Detected and ranked arbitrage opportunities
//! - `errors`: Error taxonomy

pub mod ids;
pub mod order;
pub mod plan;
pub mod market;
pub mod opportunity;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::order::*;
    pub use crate::plan::*;
    pub use crate::market::*;
    pub use crate::opportunity::*;
    pub use crate::errors::*;
}
