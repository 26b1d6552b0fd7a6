//! ZRO Claimer Library
//!
//! Claims a token airdrop for many accounts, pays a commission share to a
//! commission recipient and forwards the rest to each account's deposit
//! address.
//!
//! ## Architecture
//!
//! Same split as a functional core with an imperative shell:
//!
//! - **Functional Core** (`logic/` module): amounts, commission waterfall,
//!   account-row validation, prompt parsing
//! - **Imperative Shell**: progress store, HTTP services, chain client,
//!   per-account workflow and the dispatch loop
//! - **Error Handling** (`error` module): one structured error type
//! - **Output Abstraction** (`output` module): testable prompt I/O

// Core modules
pub mod accounts;
pub mod config;
pub mod networks;
pub mod store;

// Collaborators
pub mod chain;
pub mod services;

// Run orchestration
pub mod claim;
pub mod dispatch;
pub mod eligibility;
pub mod pacing;
pub mod runner;
pub mod workflow;

// Architecture modules
pub mod error;
pub mod logging;
pub mod logic;
pub mod output;

pub mod testing;

pub use accounts::Account;
pub use config::{load_config, ClaimerConfig};
pub use dispatch::{DispatchSummary, Dispatcher};
pub use error::{ClaimerError, ClaimerResult};
pub use output::Output;
pub use runner::run_claimer;
pub use workflow::{AccountOutcome, ClaimContext, ClaimWorkflow, WorkflowSettings};

/// Claimer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
