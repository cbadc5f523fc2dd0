use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the coordination pipeline
#[derive(Error, Debug)]
pub enum CoordinatorError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Optimistic concurrency errors
    #[error("State conflict: expected version {expected}, found {found}")]
    Conflict { expected: String, found: String },

    #[error("Invalid candidate state: {0}")]
    InvalidState(String),

    // Queue transport errors
    #[error("Queue '{queue}' is disconnected")]
    QueueClosed { queue: String },

    #[error("Malformed payload on queue '{queue}': {reason}")]
    MalformedPayload { queue: String, reason: String },

    // External collaborator errors
    #[error("Collaborator failure in {collaborator}: {reason}")]
    Collaborator {
        collaborator: String,
        reason: String,
    },

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CoordinatorError {
    /// Conflicts are the only retryable failure class: the caller re-snapshots
    /// and redoes its read-modify-commit cycle.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoordinatorError::Conflict { .. })
    }
}

/// Result type alias for CoordinatorError
pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Specific error types for budget governance
#[derive(Error, Debug, Clone)]
pub enum GovernanceError {
    #[error(
        "Transaction would exceed daily budget limit ({total} > {limit} {currency}, \
         current spend {current}, requested {requested})"
    )]
    BudgetExceeded {
        currency: String,
        current: Decimal,
        requested: Decimal,
        limit: Decimal,
        total: Decimal,
    },

    #[error("Large transaction amount ({amount} {currency} > {threshold} {currency})")]
    SuspiciousAmount {
        currency: String,
        amount: Decimal,
        threshold: Decimal,
    },

    #[error("Suspicious or unknown recipient address '{recipient}'")]
    InvalidRecipient { recipient: String },
}

impl From<GovernanceError> for CoordinatorError {
    fn from(err: GovernanceError) -> Self {
        CoordinatorError::Internal(err.to_string())
    }
}
