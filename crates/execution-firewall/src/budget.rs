use chrono::NaiveDate;
use dashmap::DashMap;
use payguard_core_types::Amount;

/// Cumulative spend per (UTC day, caller). A new day starts from zero.
pub trait BudgetLedger: Send + Sync {
    fn spent(&self, day: NaiveDate, caller: &str) -> Amount;

    /// Adds `value` to the day's total and returns the new total.
    fn book(&self, day: NaiveDate, caller: &str, value: Amount) -> Amount;

    /// Drops entries for days before `keep_from`.
    fn prune_before(&self, keep_from: NaiveDate) -> usize;
}

#[derive(Debug, Default)]
pub struct MemoryBudgetLedger {
    totals: DashMap<(NaiveDate, String), Amount>,
}

impl MemoryBudgetLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BudgetLedger for MemoryBudgetLedger {
    fn spent(&self, day: NaiveDate, caller: &str) -> Amount {
        self.totals
            .get(&(day, caller.to_string()))
            .map(|total| *total)
            .unwrap_or(Amount::ZERO)
    }

    fn book(&self, day: NaiveDate, caller: &str, value: Amount) -> Amount {
        let mut total = self.totals.entry((day, caller.to_string())).or_default();
        *total = total.saturating_add(value);
        *total
    }

    fn prune_before(&self, keep_from: NaiveDate) -> usize {
        let before = self.totals.len();
        self.totals.retain(|(day, _), _| *day >= keep_from);
        before.saturating_sub(self.totals.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn bookings_accumulate_per_day_and_caller() {
        let ledger = MemoryBudgetLedger::new();
        assert_eq!(ledger.book(day(1), "0xa", Amount::new(10)), Amount::new(10));
        assert_eq!(ledger.book(day(1), "0xa", Amount::new(5)), Amount::new(15));
        assert_eq!(ledger.spent(day(2), "0xa"), Amount::ZERO);
        assert_eq!(ledger.spent(day(1), "0xb"), Amount::ZERO);
    }

    #[test]
    fn old_days_can_be_pruned() {
        let ledger = MemoryBudgetLedger::new();
        ledger.book(day(1), "0xa", Amount::new(1));
        ledger.book(day(2), "0xa", Amount::new(1));
        assert_eq!(ledger.prune_before(day(2)), 1);
        assert_eq!(ledger.spent(day(2), "0xa"), Amount::new(1));
    }
}
