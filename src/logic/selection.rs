//! Network prompt parsing

/// Parse a 1-based menu choice into a 0-based index
///
/// Returns `None` for non-numeric input or an out-of-range choice.
pub fn parse_network_index(input: &str, count: usize) -> Option<usize> {
    let choice: usize = input.trim().parse().ok()?;
    if (1..=count).contains(&choice) {
        Some(choice - 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_network_index() {
        assert_eq!(parse_network_index("1", 7), Some(0));
        assert_eq!(parse_network_index(" 7\n", 7), Some(6));
        assert_eq!(parse_network_index("0", 7), None);
        assert_eq!(parse_network_index("8", 7), None);
        assert_eq!(parse_network_index("arbitrum", 7), None);
    }
}
