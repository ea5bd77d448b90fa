use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tracker_core::finance::{category_breakdown, LedgerEntry};
use tracker_core::habits::{current_streak, longest_streak, HabitStats};
use tracker_core::study::{next_bucket, MAX_BUCKET};
use tracker_core::{ReviewOutcome, TransactionKind};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

// Offsets (days before today) of completed logs
fn arb_offsets() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..120, 0..80)
}

fn arb_outcome() -> impl Strategy<Value = ReviewOutcome> {
    prop_oneof![
        Just(ReviewOutcome::Again),
        Just(ReviewOutcome::Hard),
        Just(ReviewOutcome::Good),
        Just(ReviewOutcome::Easy),
    ]
}

struct Line {
    category: String,
    cents: i64,
}

impl LedgerEntry for Line {
    fn kind(&self) -> TransactionKind {
        TransactionKind::Expense
    }
    fn amount(&self) -> Decimal {
        Decimal::new(self.cents, 2)
    }
    fn category(&self) -> &str {
        &self.category
    }
    fn occurred_on(&self) -> NaiveDate {
        today()
    }
}

proptest! {
    /// Property: a run of N consecutive days ending today has streak N
    #[test]
    fn prop_consecutive_run_ending_today(len in 1u64..400) {
        let dates: Vec<_> = (0..len).map(|i| today() - Days::new(i)).collect();
        prop_assert_eq!(current_streak(&dates, today()), len as u32);
        prop_assert_eq!(longest_streak(&dates), len as u32);
    }

    /// Property: input order and duplicates never change the result
    #[test]
    fn prop_order_insensitive(offsets in arb_offsets()) {
        let dates: Vec<_> = offsets.iter().map(|o| today() - Days::new(*o)).collect();
        let mut shuffled = dates.clone();
        shuffled.reverse();
        shuffled.extend(dates.iter().copied());

        prop_assert_eq!(current_streak(&dates, today()), current_streak(&shuffled, today()));
        prop_assert_eq!(longest_streak(&dates), longest_streak(&shuffled));
    }

    /// Property: current streak never exceeds longest or total completions
    #[test]
    fn prop_streak_bounds(offsets in arb_offsets()) {
        let dates: Vec<_> = offsets.iter().map(|o| today() - Days::new(*o)).collect();
        let stats = HabitStats::compute(&dates, today());

        prop_assert!(stats.current_streak <= stats.longest_streak);
        prop_assert!(stats.longest_streak <= stats.total_completions);
        prop_assert!((0.0..=100.0).contains(&stats.completion_rate));
    }

    /// Property: bucket stays in range for any outcome sequence
    #[test]
    fn prop_bucket_in_range(start in -5i16..10, outcomes in prop::collection::vec(arb_outcome(), 0..30)) {
        let mut bucket = start;
        for outcome in outcomes {
            bucket = next_bucket(bucket, outcome);
            prop_assert!((0..=MAX_BUCKET).contains(&bucket));
        }
    }

    /// Property: category totals add up to the exact grand total
    #[test]
    fn prop_breakdown_preserves_total(
        lines in prop::collection::vec(("[a-d]", 1i64..1_000_000), 0..60)
    ) {
        let entries: Vec<Line> = lines
            .iter()
            .map(|(category, cents)| Line { category: category.clone(), cents: *cents })
            .collect();
        let expected: Decimal = entries.iter().map(|l| l.amount()).sum();

        let breakdown = category_breakdown(&entries, TransactionKind::Expense);
        let total: Decimal = breakdown.iter().map(|c| c.total).sum();
        let count: usize = breakdown.iter().map(|c| c.count).sum();

        prop_assert_eq!(total, expected);
        prop_assert_eq!(count, entries.len());
    }
}
