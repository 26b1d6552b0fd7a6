//! Persisted progress documents
//!
//! Three JSON documents make the run resumable:
//!
//! - `eligibilities.json`: object, address -> allocation (decimal string)
//! - `claimed.json`: array of addresses whose claim step completed
//! - `paid_commission.json`: array of addresses whose commission has been
//!   accounted for, in the order they were checked off
//!
//! Every write replaces the whole document through a temp file and rename.
//! Read-modify-write of `claimed` and `paid_commission` happens under a
//! per-document mutex so concurrent workflows never lose each other's update.

use crate::config::PathsConfig;
use crate::error::{ClaimerError, ClaimerResult};
use crate::logic::commission::{settle_commission_ledger, CommissionRate, LedgerEntry};
use alloy::primitives::{Address, U256};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::sync::Mutex;
use tracing::debug;

/// Atomic write helper - writes to temp file then renames (blocking I/O)
fn atomic_write_sync(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let tmp = path.with_extension("json.tmp");
    {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path)
}

/// Async atomic write - moves blocking I/O to spawn_blocking
async fn atomic_write_async(path: PathBuf, bytes: Vec<u8>) -> std::io::Result<()> {
    tokio::task::spawn_blocking(move || atomic_write_sync(&path, &bytes))
        .await
        .map_err(|e| std::io::Error::other(format!("spawn_blocking failed: {}", e)))?
}

fn store_error(path: &Path, reason: impl ToString) -> ClaimerError {
    ClaimerError::StoreError {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn parse_address(path: &Path, raw: &str) -> ClaimerResult<Address> {
    Address::from_str(raw).map_err(|e| store_error(path, format!("invalid address '{}': {}", raw, e)))
}

fn parse_amount(path: &Path, value: &Value) -> ClaimerResult<U256> {
    let digits = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => return Err(store_error(path, format!("invalid amount {}", other))),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(store_error(path, format!("invalid amount '{}'", digits)));
    }
    U256::from_str(&digits).map_err(|e| store_error(path, format!("invalid amount '{}': {}", digits, e)))
}

async fn read_json(path: &Path) -> ClaimerResult<Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| store_error(path, e))?;
    serde_json::from_str(&raw).map_err(|e| store_error(path, e))
}

async fn read_address_list(path: &Path) -> ClaimerResult<Vec<Address>> {
    match read_json(path).await? {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => parse_address(path, s),
                other => Err(store_error(path, format!("expected address string, got {}", other))),
            })
            .collect(),
        _ => Err(store_error(path, "expected a JSON array")),
    }
}

async fn write_address_list(path: &Path, addresses: &[Address]) -> ClaimerResult<()> {
    let list: Vec<String> = addresses.iter().map(|a| a.to_checksum(None)).collect();
    let bytes = serde_json::to_vec_pretty(&list)?;
    atomic_write_async(path.to_path_buf(), bytes)
        .await
        .map_err(|e| store_error(path, e))
}

/// Handle on the three progress documents, shared by every workflow
#[derive(Debug)]
pub struct ProgressStore {
    eligibilities_path: PathBuf,
    claimed_path: PathBuf,
    paid_commission_path: PathBuf,
    eligibilities: Mutex<HashMap<Address, U256>>,
    claimed_lock: Mutex<()>,
    paid_commission_lock: Mutex<()>,
}

impl ProgressStore {
    /// Open the documents; all three must already exist as valid JSON
    pub async fn open(paths: &PathsConfig) -> ClaimerResult<Self> {
        let eligibilities = Self::read_eligibilities(&paths.eligibilities).await?;
        read_address_list(&paths.claimed).await?;
        read_address_list(&paths.paid_commission).await?;

        debug!(
            "Opened progress store ({} known eligibilities)",
            eligibilities.len()
        );

        Ok(Self {
            eligibilities_path: paths.eligibilities.clone(),
            claimed_path: paths.claimed.clone(),
            paid_commission_path: paths.paid_commission.clone(),
            eligibilities: Mutex::new(eligibilities),
            claimed_lock: Mutex::new(()),
            paid_commission_lock: Mutex::new(()),
        })
    }

    /// Write empty containers for any document that does not exist yet
    pub async fn initialize_missing(paths: &PathsConfig) -> ClaimerResult<()> {
        if !paths.eligibilities.exists() {
            atomic_write_async(paths.eligibilities.clone(), b"{}".to_vec())
                .await
                .map_err(|e| store_error(&paths.eligibilities, e))?;
        }
        for path in [&paths.claimed, &paths.paid_commission] {
            if !path.exists() {
                write_address_list(path, &[]).await?;
            }
        }
        Ok(())
    }

    async fn read_eligibilities(path: &Path) -> ClaimerResult<HashMap<Address, U256>> {
        match read_json(path).await? {
            Value::Object(map) => map
                .iter()
                .map(|(address, amount)| Ok((parse_address(path, address)?, parse_amount(path, amount)?)))
                .collect(),
            _ => Err(store_error(path, "expected a JSON object")),
        }
    }

    /// Previously resolved allocation for `address`, if any
    pub async fn eligibility(&self, address: Address) -> Option<U256> {
        self.eligibilities.lock().await.get(&address).copied()
    }

    /// Record a freshly resolved allocation and persist the whole document
    pub async fn record_eligibility(&self, address: Address, amount: U256) -> ClaimerResult<()> {
        let mut eligibilities = self.eligibilities.lock().await;
        eligibilities.insert(address, amount);

        let document: BTreeMap<String, String> = eligibilities
            .iter()
            .map(|(address, amount)| (address.to_checksum(None), amount.to_string()))
            .collect();
        let bytes = serde_json::to_vec_pretty(&document)?;

        atomic_write_async(self.eligibilities_path.clone(), bytes)
            .await
            .map_err(|e| store_error(&self.eligibilities_path, e))
    }

    /// Addresses whose claim step has completed
    pub async fn claimed(&self) -> ClaimerResult<Vec<Address>> {
        let _guard = self.claimed_lock.lock().await;
        read_address_list(&self.claimed_path).await
    }

    pub async fn is_claimed(&self, address: Address) -> ClaimerResult<bool> {
        Ok(self.claimed().await?.contains(&address))
    }

    /// Append `address` to the claimed document (no duplicates)
    pub async fn mark_claimed(&self, address: Address) -> ClaimerResult<()> {
        let _guard = self.claimed_lock.lock().await;
        let mut claimed = read_address_list(&self.claimed_path).await?;
        if claimed.contains(&address) {
            return Ok(());
        }
        claimed.push(address);
        write_address_list(&self.claimed_path, &claimed).await
    }

    /// Addresses already accounted for in the commission ledger
    pub async fn paid_commission(&self) -> ClaimerResult<Vec<Address>> {
        let _guard = self.paid_commission_lock.lock().await;
        read_address_list(&self.paid_commission_path).await
    }

    /// Check off enough of the commission backlog to cover `transferred`
    ///
    /// Single critical section: re-read the document, walk `entries` in
    /// order, write the result. Returns the addresses that were appended.
    pub async fn settle_commission(
        &self,
        entries: &[LedgerEntry],
        transferred: U256,
        rate: CommissionRate,
    ) -> ClaimerResult<Vec<Address>> {
        let _guard = self.paid_commission_lock.lock().await;

        let mut paid = read_address_list(&self.paid_commission_path).await?;
        let appended = settle_commission_ledger(entries, &mut paid, transferred, rate);
        write_address_list(&self.paid_commission_path, &paid).await?;

        Ok(appended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn paths(dir: &Path) -> PathsConfig {
        PathsConfig {
            accounts: dir.join("accounts.json"),
            eligibilities: dir.join("eligibilities.json"),
            claimed: dir.join("claimed.json"),
            paid_commission: dir.join("paid_commission.json"),
            log_file: None,
        }
    }

    #[tokio::test]
    async fn test_open_requires_existing_documents() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProgressStore::open(&paths(dir.path())).await;
        assert!(matches!(result, Err(ClaimerError::StoreError { .. })));
    }

    #[tokio::test]
    async fn test_reads_large_numeric_eligibilities() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        ProgressStore::initialize_missing(&paths).await.unwrap();
        std::fs::write(
            &paths.eligibilities,
            r#"{"0x00000000000000000000000000000000000000aa": 1234567890123456789012345}"#,
        )
        .unwrap();

        let store = ProgressStore::open(&paths).await.unwrap();
        let address = Address::from_str("0x00000000000000000000000000000000000000aa").unwrap();
        let amount = store.eligibility(address).await;
        assert_eq!(amount, Some(U256::from_str("1234567890123456789012345").unwrap()));
    }

    #[tokio::test]
    async fn test_record_eligibility_persists() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        ProgressStore::initialize_missing(&paths).await.unwrap();

        let store = ProgressStore::open(&paths).await.unwrap();
        store
            .record_eligibility(Address::repeat_byte(7), U256::from(42u64))
            .await
            .unwrap();

        let reopened = ProgressStore::open(&paths).await.unwrap();
        assert_eq!(reopened.eligibility(Address::repeat_byte(7)).await, Some(U256::from(42u64)));
    }

    #[tokio::test]
    async fn test_mark_claimed_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        ProgressStore::initialize_missing(&paths).await.unwrap();
        let store = ProgressStore::open(&paths).await.unwrap();

        store.mark_claimed(Address::repeat_byte(1)).await.unwrap();
        store.mark_claimed(Address::repeat_byte(1)).await.unwrap();

        assert_eq!(store.claimed().await.unwrap(), vec![Address::repeat_byte(1)]);
        assert!(store.is_claimed(Address::repeat_byte(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_settlements_do_not_lose_writes() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        ProgressStore::initialize_missing(&paths).await.unwrap();
        let store = Arc::new(ProgressStore::open(&paths).await.unwrap());

        // 3 % of 100 = 3 per address
        let entries: Arc<Vec<LedgerEntry>> = Arc::new(
            (1..=6u8)
                .map(|n| LedgerEntry {
                    address: Address::repeat_byte(n),
                    allocation: U256::from(100u64),
                })
                .collect(),
        );

        let a = {
            let store = store.clone();
            let entries = entries.clone();
            tokio::spawn(async move {
                store
                    .settle_commission(&entries, U256::from(5u64), CommissionRate::default())
                    .await
            })
        };
        let b = {
            let store = store.clone();
            let entries = entries.clone();
            tokio::spawn(async move {
                store
                    .settle_commission(&entries, U256::from(7u64), CommissionRate::default())
                    .await
            })
        };

        let appended_a = a.await.unwrap().unwrap();
        let appended_b = b.await.unwrap().unwrap();

        // 5 needs two addresses, 7 needs three
        assert_eq!(appended_a.len() + appended_b.len(), 5);

        let paid = store.paid_commission().await.unwrap();
        assert_eq!(paid.len(), 5);
        let expected: Vec<Address> = (1..=5u8).map(Address::repeat_byte).collect();
        assert_eq!(paid, expected);
    }
}
