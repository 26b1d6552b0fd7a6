//! Pure account-row validation
//!
//! Header normalisation, proxy normalisation and private-key checks used by
//! the account loader. No I/O.

use crate::error::{ClaimerError, ClaimerResult};

/// Columns an account row may carry, after normalisation
pub const KNOWN_COLUMNS: [&str; 3] = ["private_key", "proxy", "deposit_address"];

/// `"Deposit address"` -> `"deposit_address"`
pub fn normalize_column(header: &str) -> String {
    header
        .split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Shorten a private key for logs: first and last eight characters
pub fn elide_private_key(private_key: &str) -> String {
    let chars: Vec<char> = private_key.chars().collect();
    if chars.len() <= 16 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 8..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check that a private key is hex, with or without `0x`
pub fn validate_private_key(row: usize, private_key: &str) -> ClaimerResult<()> {
    let digits = private_key.strip_prefix("0x").unwrap_or(private_key);
    if digits.is_empty() || hex::decode(pad_even(digits)).is_err() {
        return Err(ClaimerError::InvalidPrivateKey {
            row,
            key: elide_private_key(private_key),
        });
    }
    Ok(())
}

fn pad_even(digits: &str) -> String {
    if digits.len() % 2 == 1 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    }
}

/// Normalise a proxy cell
///
/// - empty -> no proxy
/// - `http://…` or `socks5://…` -> kept as is
/// - `user:pass@host:port` -> `http://` prepended
/// - anything else with a `/` -> rejected
pub fn normalize_proxy(row: usize, raw: &str) -> ClaimerResult<Option<String>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if raw.starts_with("http://") || raw.starts_with("socks5://") {
        return Ok(Some(raw.to_string()));
    }

    if !raw.contains('/') {
        return Ok(Some(format!("http://{}", raw)));
    }

    Err(ClaimerError::InvalidProxy {
        row,
        proxy: raw.to_string(),
    })
}
