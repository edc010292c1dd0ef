//! Error types for the simulation engine
//!
//! Order-level failures never surface here; they are recorded on the
//! execution as `ExecutionFailure`s. These errors cover the API boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Rejected null or empty execution plan")]
    NullPlanSubmission,

    #[error("Market model is owned by the running worker; stop the simulator first")]
    WorkerActive,

    #[error("Invalid simulation parameter {name}: {reason}")]
    InvalidParameters { name: &'static str, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
