//! Structured error types for the claimer
//!
//! Every fallible operation in the library returns [`ClaimerResult`]. The
//! variants carry enough context for the workflow to decide whether a failure
//! ends an account, retries an attempt, or stops the whole run.

use thiserror::Error;

/// Claimer error types with proper context
#[derive(Error, Debug)]
pub enum ClaimerError {
    // Configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to load config from {path}: {reason}")]
    ConfigLoadFailed { path: String, reason: String },

    // Account file
    #[error("Failed to load accounts from {path}: {reason}")]
    AccountsLoadFailed { path: String, reason: String },

    #[error("Unknown account columns: {}", .0.join(", "))]
    UnknownColumns(Vec<String>),

    #[error("Missing {field} on row {row}")]
    MissingField { row: usize, field: String },

    #[error("Invalid private key \"{key}\" on row {row}")]
    InvalidPrivateKey { row: usize, key: String },

    #[error("Invalid proxy \"{proxy}\" on row {row}")]
    InvalidProxy { row: usize, proxy: String },

    // Progress documents
    #[error("Progress store error at {path}: {reason}")]
    StoreError { path: String, reason: String },

    // HTTP collaborators
    #[error("API call to {endpoint} failed: {status} - {reason}")]
    ApiCallFailed { endpoint: String, status: u16, reason: String },

    #[error("Unexpected response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("Failed to get proof for {address}: {reason}")]
    ProofUnavailable { address: String, reason: String },

    #[error("Commission address request rejected: {0}")]
    CommissionRejected(String),

    #[error("No gas fee suggestion available for chain {chain_id}")]
    GasUnavailable { chain_id: u64 },

    // Chain
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("{step} transaction {tx_hash} failed or was not confirmed")]
    TransactionFailed { step: String, tx_hash: String },

    #[error("Claiming is not supported on {network}")]
    ClaimUnsupported { network: String },

    // I/O operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // Serialization
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    // HTTP/Network
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl ClaimerError {
    /// Whether this failure permanently ends an account's workflow.
    ///
    /// Everything else restarts the attempt loop from the balance check.
    pub fn is_fatal_for_account(&self) -> bool {
        matches!(
            self,
            ClaimerError::InsufficientFunds(_)
                | ClaimerError::ClaimUnsupported { .. }
                | ClaimerError::ProofUnavailable { .. }
        )
    }
}

impl From<String> for ClaimerError {
    fn from(s: String) -> Self {
        ClaimerError::Other(s)
    }
}

impl From<&str> for ClaimerError {
    fn from(s: &str) -> Self {
        ClaimerError::Other(s.to_string())
    }
}

/// Result type for claimer operations
pub type ClaimerResult<T> = Result<T, ClaimerError>;
