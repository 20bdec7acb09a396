use crate::model::NodeId;
use thiserror::Error;

/// Global error type for the simulation core.
///
/// Validation no-ops (blank comments, unknown ids, already resolved comments)
/// never surface here; they are logged and ignored.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// Fault injection was requested without a target node.
    #[error("Please select a node to inject fault")]
    NoFaultTarget,

    /// The log collaborator answered with an error or an unreadable body.
    #[error("Log fetch failed for node {node}: {reason}")]
    LogFetch { node: NodeId, reason: String },

    /// Transport failure talking to the log collaborator.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to load or deserialize configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Login was attempted with unusable credentials.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
}

/// A specialized Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimulationError>;
