//! Pure commission accounting
//!
//! Two halves of the same bookkeeping:
//!
//! - **Waterfall allocation**: before dispatch, every account is asked for a
//!   contribution towards the global commission target, highest allocation
//!   first, until the target is met.
//! - **Ledger walk**: after a commission transfer lands, enough unaccounted
//!   addresses are checked off (in account-list order) to cover the amount
//!   that was actually transferred, regardless of who sent it.

use alloy::primitives::{Address, U256};
use std::collections::HashSet;

const BPS_DENOMINATOR: u64 = 10_000;

/// Commission fraction expressed in basis points (300 = 3 %)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionRate {
    bps: u32,
}

impl CommissionRate {
    pub const fn from_bps(bps: u32) -> Self {
        Self { bps }
    }

    pub fn bps(&self) -> u32 {
        self.bps
    }

    /// `amount × rate`, rounded down
    pub fn apply(&self, amount: U256) -> U256 {
        self.scaled(amount) / U256::from(BPS_DENOMINATOR)
    }

    /// `amount × bps`, i.e. the commission scaled by the bps denominator
    fn scaled(&self, amount: U256) -> U256 {
        amount * U256::from(self.bps)
    }
}

impl Default for CommissionRate {
    fn default() -> Self {
        Self::from_bps(300)
    }
}

/// One row of the account list as seen by the commission ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    pub address: Address,
    pub allocation: U256,
}

/// `rate × Σ allocation` over every account not already in the paid ledger
pub fn total_commission_target(entries: &[LedgerEntry], paid: &[Address], rate: CommissionRate) -> U256 {
    let paid: HashSet<&Address> = paid.iter().collect();
    let unpaid = entries
        .iter()
        .filter(|entry| !paid.contains(&entry.address))
        .fold(U256::ZERO, |acc, entry| acc + entry.allocation);
    rate.apply(unpaid)
}

/// Running waterfall over the commission target
///
/// Callers must feed accounts in descending allocation order; the allocator
/// itself only tracks the running total.
#[derive(Debug, Clone)]
pub struct CommissionAllocator {
    target: U256,
    allocated: U256,
}

impl CommissionAllocator {
    pub fn new(target: U256) -> Self {
        Self {
            target,
            allocated: U256::ZERO,
        }
    }

    /// Contribution of the next account: `clamp(allocation, 0, target - allocated)`
    pub fn next_contribution(&mut self, allocation: U256) -> U256 {
        let contribution = allocation.min(self.remaining());
        self.allocated += contribution;
        contribution
    }

    pub fn target(&self) -> U256 {
        self.target
    }

    pub fn allocated(&self) -> U256 {
        self.allocated
    }

    pub fn remaining(&self) -> U256 {
        self.target.saturating_sub(self.allocated)
    }
}

/// Check off addresses in list order until `transferred` is covered
///
/// Appends every newly accounted address to `paid` and returns them. The
/// comparison runs in bps-scaled integers so the appended prefix is exactly
/// the shortest one whose commission sum reaches `transferred`. If the whole
/// backlog is smaller than `transferred`, every remaining address is appended.
pub fn settle_commission_ledger(
    entries: &[LedgerEntry],
    paid: &mut Vec<Address>,
    transferred: U256,
    rate: CommissionRate,
) -> Vec<Address> {
    let already: HashSet<Address> = paid.iter().copied().collect();
    let goal = transferred * U256::from(BPS_DENOMINATOR);
    let mut covered = U256::ZERO;
    let mut appended = Vec::new();

    for entry in entries.iter().filter(|entry| !already.contains(&entry.address)) {
        covered += rate.scaled(entry.allocation);
        paid.push(entry.address);
        appended.push(entry.address);
        if covered >= goal {
            break;
        }
    }

    appended
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    fn entry(n: u8, allocation: u64) -> LedgerEntry {
        LedgerEntry {
            address: addr(n),
            allocation: U256::from(allocation),
        }
    }

    #[test]
    fn test_single_account_target_and_contribution() {
        let entries = vec![entry(1, 100)];
        let target = total_commission_target(&entries, &[], CommissionRate::from_bps(300));
        assert_eq!(target, U256::from(3u64));

        let mut allocator = CommissionAllocator::new(target);
        assert_eq!(allocator.next_contribution(U256::from(100u64)), U256::from(3u64));
    }

    #[test]
    fn test_target_ignores_paid_addresses() {
        let entries = vec![entry(1, 1000), entry(2, 1000)];
        let target = total_commission_target(&entries, &[addr(1)], CommissionRate::from_bps(300));
        assert_eq!(target, U256::from(30u64));
    }

    #[test]
    fn test_waterfall_charges_highest_first() {
        let mut allocator = CommissionAllocator::new(U256::from(150u64));
        let contributions: Vec<U256> = [100u64, 80, 60, 10]
            .iter()
            .map(|a| allocator.next_contribution(U256::from(*a)))
            .collect();

        assert_eq!(
            contributions,
            vec![U256::from(100u64), U256::from(50u64), U256::ZERO, U256::ZERO]
        );
        assert_eq!(allocator.allocated(), allocator.target());
        assert_eq!(allocator.remaining(), U256::ZERO);
    }

    #[test]
    fn test_ledger_walk_appends_shortest_covering_prefix() {
        // 3 % of 100 = 3 per account
        let entries = vec![entry(1, 100), entry(2, 100), entry(3, 100), entry(4, 100)];
        let mut paid = vec![addr(2)];

        let appended = settle_commission_ledger(&entries, &mut paid, U256::from(5u64), CommissionRate::default());

        assert_eq!(appended, vec![addr(1), addr(3)]);
        assert_eq!(paid, vec![addr(2), addr(1), addr(3)]);
    }

    #[test]
    fn test_ledger_walk_exact_cover_stops() {
        let entries = vec![entry(1, 100), entry(2, 100)];
        let mut paid = Vec::new();

        let appended = settle_commission_ledger(&entries, &mut paid, U256::from(3u64), CommissionRate::default());

        assert_eq!(appended, vec![addr(1)]);
    }

    #[test]
    fn test_ledger_walk_fractional_commission() {
        // 3 % of 50 = 1.5 each; covering 3 needs exactly two accounts
        let entries = vec![entry(1, 50), entry(2, 50), entry(3, 50)];
        let mut paid = Vec::new();

        let appended = settle_commission_ledger(&entries, &mut paid, U256::from(3u64), CommissionRate::default());

        assert_eq!(appended, vec![addr(1), addr(2)]);
    }

    #[test]
    fn test_ledger_walk_exhausts_backlog() {
        let entries = vec![entry(1, 100)];
        let mut paid = Vec::new();

        let appended = settle_commission_ledger(&entries, &mut paid, U256::from(1_000u64), CommissionRate::default());

        assert_eq!(appended, vec![addr(1)]);
        let again = settle_commission_ledger(&entries, &mut paid, U256::from(1u64), CommissionRate::default());
        assert!(again.is_empty());
    }
}
