//! Pure functional business logic
//!
//! This module contains pure functions that implement the claimer's rules
//! without side effects: unit conversion, the commission waterfall and ledger
//! walk, account-row validation and the network prompt parser. The imperative
//! shell (store, services, workflow, dispatch) composes them.

pub mod amounts;
pub mod commission;
pub mod accounts;
pub mod selection;

// Re-export commonly used types
pub use amounts::{format_token_amount, parse_gwei, fixed_donation, TOKEN_DECIMALS};
pub use commission::{CommissionRate, CommissionAllocator, LedgerEntry, total_commission_target, settle_commission_ledger};
pub use accounts::{elide_private_key, normalize_column, normalize_proxy, validate_private_key};
pub use selection::parse_network_index;
