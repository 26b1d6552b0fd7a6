//! Pure unit-conversion logic
//!
//! Token amounts travel as integers in the smallest on-chain unit. These
//! helpers convert between that representation and the human-readable or
//! gwei-denominated strings used by logs and the gas API.

use crate::error::{ClaimerError, ClaimerResult};
use alloy::primitives::U256;

/// Decimals of the airdropped token
pub const TOKEN_DECIMALS: u8 = 18;

const GWEI_DECIMALS: usize = 9;

/// USD cents donated per whole token on the fixed-fraction claim route
const DONATION_CENTS_PER_TOKEN: u64 = 10;

/// Render a smallest-unit amount as a decimal string (trailing zeros trimmed)
pub fn format_token_amount(value: U256) -> String {
    format_units(value, TOKEN_DECIMALS)
}

/// Render `value / 10^decimals` without floating point
pub fn format_units(value: U256, decimals: u8) -> String {
    let unit = U256::from(10u64).pow(U256::from(decimals));
    let whole = value / unit;
    let fraction = value % unit;

    if fraction.is_zero() {
        return whole.to_string();
    }

    let digits = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Convert a decimal gwei string (e.g. `"12.5"`) to wei
///
/// Digits beyond nine decimal places are truncated.
pub fn parse_gwei(value: &str) -> ClaimerResult<u128> {
    let value = value.trim();
    let invalid = || ClaimerError::InvalidResponse {
        endpoint: "suggestedGasFees".to_string(),
        reason: format!("Invalid gwei value: '{}'", value),
    };

    if value.is_empty() {
        return Err(invalid());
    }

    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (value, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };

    let mut fraction: String = fraction.chars().take(GWEI_DECIMALS).collect();
    while fraction.len() < GWEI_DECIMALS {
        fraction.push('0');
    }
    let fraction: u128 = fraction.parse().map_err(|_| invalid())?;

    whole
        .checked_mul(1_000_000_000)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(invalid)
}

/// Native-currency donation for the fixed-fraction claim route
///
/// Ten cents per whole token converted at `eth_price_usd`. Both the token and
/// the native currency have 18 decimals, so the scale cancels out.
pub fn fixed_donation(allocation: U256, eth_price_usd: u64) -> U256 {
    if eth_price_usd == 0 {
        return U256::ZERO;
    }
    allocation * U256::from(DONATION_CENTS_PER_TOKEN) / U256::from(100u64 * eth_price_usd)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    #[test]
    fn test_format_whole_tokens() {
        assert_eq!(format_token_amount(tokens(1500)), "1500");
        assert_eq!(format_token_amount(U256::ZERO), "0");
    }

    #[test]
    fn test_format_fractional_tokens() {
        let value = tokens(3) + tokens(1) / U256::from(4u64);
        assert_eq!(format_token_amount(value), "3.25");
        assert_eq!(format_token_amount(U256::from(1u64)), "0.000000000000000001");
    }

    #[test]
    fn test_parse_gwei_integer_and_fraction() {
        assert_eq!(parse_gwei("1").unwrap(), 1_000_000_000);
        assert_eq!(parse_gwei("0.01").unwrap(), 10_000_000);
        assert_eq!(parse_gwei("12.345678912345").unwrap(), 12_345_678_912);
        assert_eq!(parse_gwei(" 2.5 ").unwrap(), 2_500_000_000);
    }

    #[test]
    fn test_parse_gwei_rejects_garbage() {
        assert!(parse_gwei("").is_err());
        assert!(parse_gwei(".").is_err());
        assert!(parse_gwei("-1").is_err());
        assert!(parse_gwei("1e9").is_err());
    }

    #[test]
    fn test_fixed_donation_matches_price() {
        // 3500 tokens at 0.10 USD each = 350 USD = 0.1 ETH at 3500 USD/ETH
        let donation = fixed_donation(tokens(3500), 3500);
        assert_eq!(donation, tokens(1) / U256::from(10u64));
        assert_eq!(fixed_donation(tokens(1), 0), U256::ZERO);
    }
}
