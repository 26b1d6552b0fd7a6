//! Account records and the account-file loader
//!
//! The account file is either a spreadsheet (`.xlsx`, `.xls`, `.ods`) whose
//! first sheet has a header row, or a JSON array of rows keyed by the same
//! human column headers:
//!
//! ```json
//! [
//!   { "Private key": "0x…", "Proxy": "user:pass@1.2.3.4:8080", "Deposit address": "0x…" }
//! ]
//! ```
//!
//! Headers are normalised before validation, so `"Deposit address"` and
//! `"deposit_address"` are the same column. Any other column fails the load.

use crate::error::{ClaimerError, ClaimerResult};
use crate::logic::accounts::{
    elide_private_key, normalize_column, normalize_proxy, validate_private_key, KNOWN_COLUMNS,
};
use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use calamine::{open_workbook_auto, Data, Reader};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// One claiming account
#[derive(Clone)]
pub struct Account {
    signer: PrivateKeySigner,
    short_private_key: String,
    proxy: Option<String>,
    deposit_address: Address,
    allocation: Option<U256>,
}

impl Account {
    /// Build an account from a hex private key
    pub fn new(private_key: &str, proxy: Option<String>, deposit_address: Address) -> ClaimerResult<Self> {
        let invalid = || ClaimerError::InvalidPrivateKey {
            row: 0,
            key: elide_private_key(private_key),
        };
        let digits = private_key.strip_prefix("0x").unwrap_or(private_key);
        let signer = PrivateKeySigner::from_str(digits).map_err(|_| invalid())?;

        Ok(Self {
            signer,
            short_private_key: elide_private_key(private_key),
            proxy,
            deposit_address,
            allocation: None,
        })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    pub fn short_private_key(&self) -> &str {
        &self.short_private_key
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    pub fn deposit_address(&self) -> Address {
        self.deposit_address
    }

    /// Resolved allocation, zero until the eligibility resolver has run
    pub fn allocation(&self) -> U256 {
        self.allocation.unwrap_or(U256::ZERO)
    }

    pub fn has_allocation(&self) -> bool {
        self.allocation.is_some()
    }

    /// Record the allocation; it can only be set once per process
    pub fn set_allocation(&mut self, amount: U256) -> ClaimerResult<()> {
        if self.allocation.is_some() {
            return Err(ClaimerError::Other(format!(
                "Allocation for {} is already resolved",
                self.address()
            )));
        }
        self.allocation = Some(amount);
        Ok(())
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address())
            .field("private_key", &self.short_private_key)
            .field("proxy", &self.proxy)
            .field("deposit_address", &self.deposit_address)
            .field("allocation", &self.allocation)
            .finish()
    }
}

/// Load and validate every account in `path`
pub fn load_accounts(path: &Path) -> ClaimerResult<Vec<Account>> {
    info!("[Account Loader] Loading accounts from {}", path.display());

    let load_failed = |reason: String| ClaimerError::AccountsLoadFailed {
        path: path.display().to_string(),
        reason,
    };

    let rows = if is_spreadsheet(path) {
        let mut workbook = open_workbook_auto(path).map_err(|e| load_failed(e.to_string()))?;
        let sheet = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| load_failed("workbook has no sheets".to_string()))?
            .map_err(|e| load_failed(e.to_string()))?;
        let cells: Vec<Vec<Data>> = sheet.rows().map(<[Data]>::to_vec).collect();
        sheet_rows(&cells)
    } else {
        let raw = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        serde_json::from_str::<Vec<Map<String, Value>>>(&raw).map_err(|e| load_failed(e.to_string()))?
    };

    let accounts = parse_rows(&rows)?;
    info!("[Account Loader] Loaded {} accounts", accounts.len());
    Ok(accounts)
}

/// Validate raw rows into accounts
pub fn parse_rows(rows: &[Map<String, Value>]) -> ClaimerResult<Vec<Account>> {
    let normalized: Vec<Map<String, Value>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|(header, value)| (normalize_column(header), value.clone()))
                .collect()
        })
        .collect();

    let unknown: BTreeSet<String> = normalized
        .iter()
        .flat_map(|row| row.keys())
        .filter(|column| !KNOWN_COLUMNS.contains(&column.as_str()))
        .cloned()
        .collect();

    if !unknown.is_empty() {
        return Err(ClaimerError::UnknownColumns(unknown.into_iter().collect()));
    }

    let mut accounts = Vec::with_capacity(normalized.len());

    for (index, row) in normalized.iter().enumerate() {
        let row_number = index + 1;

        let private_key = cell(row, "private_key");
        if private_key.is_empty() {
            continue;
        }

        let deposit = cell(row, "deposit_address");
        if deposit.is_empty() {
            return Err(ClaimerError::MissingField {
                row: row_number,
                field: "deposit address".to_string(),
            });
        }

        validate_private_key(row_number, &private_key)?;
        let proxy = normalize_proxy(row_number, &cell(row, "proxy"))?;

        let deposit_address = Address::from_str(&deposit).map_err(|e| ClaimerError::AccountsLoadFailed {
            path: format!("row {}", row_number),
            reason: format!("invalid deposit address '{}': {}", deposit, e),
        })?;

        let account = Account::new(&private_key, proxy, deposit_address).map_err(|_| {
            ClaimerError::InvalidPrivateKey {
                row: row_number,
                key: elide_private_key(&private_key),
            }
        })?;

        accounts.push(account);
    }

    Ok(accounts)
}

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ["xlsx", "xlsm", "xls", "xlsb", "ods"].contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Sheet cells to rows keyed by the header row; blank header cells are dropped
pub fn sheet_rows(cells: &[Vec<Data>]) -> Vec<Map<String, Value>> {
    let Some((header, body)) = cells.split_first() else {
        return Vec::new();
    };

    body.iter()
        .map(|row| {
            header
                .iter()
                .enumerate()
                .filter_map(|(column, name)| {
                    let name = name.to_string().trim().to_string();
                    (!name.is_empty()).then(|| (name, sheet_value(row.get(column))))
                })
                .collect()
        })
        .collect()
}

fn sheet_value(cell: Option<&Data>) -> Value {
    match cell {
        None | Some(Data::Empty) => Value::Null,
        Some(Data::String(s)) => Value::String(s.clone()),
        Some(other) => Value::String(other.to_string()),
    }
}

fn cell(row: &Map<String, Value>, column: &str) -> String {
    match row.get(column) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const DEPOSIT: &str = "0x00000000000000000000000000000000000000aa";

    fn rows(value: Value) -> Vec<Map<String, Value>> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_valid_rows() {
        let accounts = parse_rows(&rows(json!([
            { "Private key": KEY, "Proxy": "u:p@1.2.3.4:8080", "Deposit address": DEPOSIT },
            { "Private key": null, "Proxy": null, "Deposit address": null },
        ])))
        .unwrap();

        assert_eq!(accounts.len(), 1);
        let account = &accounts[0];
        assert_eq!(account.proxy(), Some("http://u:p@1.2.3.4:8080"));
        assert_eq!(account.deposit_address(), Address::from_str(DEPOSIT).unwrap());
        assert_eq!(account.allocation(), U256::ZERO);
        assert!(!format!("{:?}", account).contains("69102937"));
    }

    #[test]
    fn test_unknown_columns_rejected() {
        let err = parse_rows(&rows(json!([
            { "Private key": KEY, "Deposit address": DEPOSIT, "Wallet name": "main" }
        ])))
        .unwrap_err();

        assert!(matches!(err, ClaimerError::UnknownColumns(ref cols) if cols == &vec!["wallet_name".to_string()]));
    }

    #[test]
    fn test_missing_deposit_address() {
        let err = parse_rows(&rows(json!([
            { "Private key": KEY, "Deposit address": "" }
        ])))
        .unwrap_err();

        assert!(matches!(err, ClaimerError::MissingField { row: 1, .. }));
    }

    #[test]
    fn test_sheet_rows_feed_the_same_validation() {
        let text = |s: &str| Data::String(s.to_string());
        let cells = vec![
            vec![text("Private key"), text("Proxy"), text("Deposit address"), Data::Empty],
            vec![text(KEY), Data::Empty, text(DEPOSIT)],
            vec![Data::Empty, Data::Empty, Data::Empty, Data::Empty],
        ];

        let rows = sheet_rows(&cells);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Proxy"), Some(&Value::Null));

        let accounts = parse_rows(&rows).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].deposit_address(), Address::from_str(DEPOSIT).unwrap());
        assert_eq!(accounts[0].proxy(), None);
    }

    #[test]
    fn test_sheet_without_header_is_empty() {
        assert!(sheet_rows(&[]).is_empty());
    }

    #[test]
    fn test_non_ascii_private_key_is_rejected() {
        let err = parse_rows(&rows(json!([
            { "Private key": "0x12345ключключключ", "Deposit address": DEPOSIT }
        ])))
        .unwrap_err();

        assert!(matches!(err, ClaimerError::InvalidPrivateKey { row: 1, .. }));
    }

    #[test]
    fn test_invalid_private_key() {
        let err = parse_rows(&rows(json!([
            { "Private key": "zzzz", "Deposit address": DEPOSIT }
        ])))
        .unwrap_err();

        assert!(matches!(err, ClaimerError::InvalidPrivateKey { row: 1, .. }));
    }

    #[test]
    fn test_allocation_set_once() {
        let mut account = Account::new(KEY, None, Address::ZERO).unwrap();
        account.set_allocation(U256::from(5u64)).unwrap();
        assert!(account.set_allocation(U256::from(6u64)).is_err());
        assert_eq!(account.allocation(), U256::from(5u64));
    }

    #[test]
    fn test_load_accounts_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(
            &path,
            json!([{ "private_key": KEY, "deposit_address": DEPOSIT }]).to_string(),
        )
        .unwrap();

        let accounts = load_accounts(&path).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].proxy(), None);
    }
}
