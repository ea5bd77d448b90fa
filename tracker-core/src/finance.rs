//! Financial aggregation: monthly totals, category breakdowns, budget
//! progress, portfolio valuation and debt payments.
//!
//! Amounts are `rust_decimal::Decimal` throughout so sums are exact.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::dates::MonthKey;
use crate::error::{Result, TrackerError};
use crate::kinds::TransactionKind;

/// Budget usage at or above this percentage is reported as `near`.
const NEAR_LIMIT_PERCENT: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Anything that can be aggregated as a ledger line.
pub trait LedgerEntry {
    fn kind(&self) -> TransactionKind;
    fn amount(&self) -> Decimal;
    fn category(&self) -> &str;
    fn occurred_on(&self) -> NaiveDate;
}

/// Income, expense and net for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub month: MonthKey,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
    /// `net / income * 100`, zero when there is no income.
    pub savings_rate: Decimal,
    pub transaction_count: usize,
}

impl MonthlySummary {
    /// Summarize the entries falling inside `month`; others are ignored.
    pub fn from_entries<E: LedgerEntry>(month: MonthKey, entries: &[E]) -> Self {
        let mut income = Decimal::ZERO;
        let mut expense = Decimal::ZERO;
        let mut count = 0;

        for entry in entries.iter().filter(|e| month.contains(e.occurred_on())) {
            match entry.kind() {
                TransactionKind::Income => income += entry.amount(),
                TransactionKind::Expense => expense += entry.amount(),
            }
            count += 1;
        }

        let net = income - expense;
        Self {
            month,
            income,
            expense,
            net,
            savings_rate: percent_of(net, income),
            transaction_count: count,
        }
    }
}

/// Total for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    /// Share of the total across all categories of the same kind.
    pub share: Decimal,
    pub count: usize,
}

/// Sum amounts of the given kind by exact category name.
///
/// Sorted by total descending, then category name.
pub fn category_breakdown<E: LedgerEntry>(entries: &[E], kind: TransactionKind) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.kind() == kind) {
        let slot = totals.entry(entry.category()).or_insert((Decimal::ZERO, 0));
        slot.0 += entry.amount();
        slot.1 += 1;
    }

    let grand_total: Decimal = totals.values().map(|(t, _)| *t).sum();
    let mut out: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.to_owned(),
            total,
            share: percent_of(total, grand_total),
            count,
        })
        .collect();

    out.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    out
}

/// Expense totals keyed by category, used to evaluate budgets.
pub fn spent_by_category<E: LedgerEntry>(entries: &[E]) -> BTreeMap<String, Decimal> {
    let mut spent = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.kind() == TransactionKind::Expense) {
        *spent.entry(entry.category().to_owned()).or_insert(Decimal::ZERO) += entry.amount();
    }
    spent
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Under,
    Near,
    Over,
}

/// How much of a budget has been used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetProgress {
    pub limit: Decimal,
    pub spent: Decimal,
    /// May be negative when the budget is exceeded.
    pub remaining: Decimal,
    pub percent_used: Decimal,
    pub status: BudgetStatus,
}

impl BudgetProgress {
    pub fn new(limit: Decimal, spent: Decimal) -> Self {
        let percent_used = percent_of(spent, limit);
        let status = if spent > limit {
            BudgetStatus::Over
        } else if percent_used >= NEAR_LIMIT_PERCENT {
            BudgetStatus::Near
        } else {
            BudgetStatus::Under
        };

        Self {
            limit,
            spent,
            remaining: limit - spent,
            percent_used,
            status,
        }
    }
}

/// Income/expense/net for one month of a trend series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotals {
    pub month: MonthKey,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// Totals for the `months` months ending at `end` (oldest first).
///
/// Months without entries are zero-filled.
pub fn monthly_trend<E: LedgerEntry>(entries: &[E], end: MonthKey, months: u32) -> Vec<MonthTotals> {
    let mut keys = Vec::with_capacity(months as usize);
    let mut cursor = end;
    for _ in 0..months {
        keys.push(cursor);
        cursor = cursor.prev();
    }
    keys.reverse();

    let mut buckets: BTreeMap<MonthKey, (Decimal, Decimal)> =
        keys.iter().map(|k| (*k, (Decimal::ZERO, Decimal::ZERO))).collect();
    for entry in entries {
        if let Some(slot) = buckets.get_mut(&MonthKey::of(entry.occurred_on())) {
            match entry.kind() {
                TransactionKind::Income => slot.0 += entry.amount(),
                TransactionKind::Expense => slot.1 += entry.amount(),
            }
        }
    }

    buckets
        .into_iter()
        .map(|(month, (income, expense))| MonthTotals {
            month,
            income,
            expense,
            net: income - expense,
        })
        .collect()
}

/// Market valuation of one holding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Valuation {
    pub cost_basis: Decimal,
    pub market_value: Decimal,
    pub gain: Decimal,
    pub gain_percent: Decimal,
}

impl Valuation {
    pub fn of(quantity: Decimal, purchase_price: Decimal, current_price: Decimal) -> Self {
        let cost_basis = quantity * purchase_price;
        let market_value = quantity * current_price;
        Self::from_totals(cost_basis, market_value)
    }

    fn from_totals(cost_basis: Decimal, market_value: Decimal) -> Self {
        let gain = market_value - cost_basis;
        Self {
            cost_basis,
            market_value,
            gain,
            gain_percent: percent_of(gain, cost_basis),
        }
    }
}

/// Portfolio totals across holdings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub holdings: usize,
    #[serde(flatten)]
    pub totals: Valuation,
}

impl PortfolioSummary {
    pub fn from_valuations<'a>(valuations: impl IntoIterator<Item = &'a Valuation>) -> Self {
        let mut holdings = 0;
        let mut cost = Decimal::ZERO;
        let mut value = Decimal::ZERO;
        for v in valuations {
            holdings += 1;
            cost += v.cost_basis;
            value += v.market_value;
        }
        Self {
            holdings,
            totals: Valuation::from_totals(cost, value),
        }
    }
}

/// Apply a payment to an outstanding balance. The balance never goes below
/// zero; overpayment simply settles the debt.
pub fn apply_debt_payment(remaining: Decimal, payment: Decimal) -> Result<Decimal> {
    if payment <= Decimal::ZERO {
        return Err(TrackerError::NonPositiveAmount { field: "payment" });
    }
    Ok((remaining - payment).max(Decimal::ZERO))
}

/// `part / whole * 100` rounded to two places; zero when `whole` is zero.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part / whole * HUNDRED).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct Line {
        kind: TransactionKind,
        amount: Decimal,
        category: &'static str,
        on: NaiveDate,
    }

    impl LedgerEntry for Line {
        fn kind(&self) -> TransactionKind {
            self.kind
        }
        fn amount(&self) -> Decimal {
            self.amount
        }
        fn category(&self) -> &str {
            self.category
        }
        fn occurred_on(&self) -> NaiveDate {
            self.on
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn expense(amount: Decimal, category: &'static str, on: NaiveDate) -> Line {
        Line { kind: TransactionKind::Expense, amount, category, on }
    }

    fn income(amount: Decimal, category: &'static str, on: NaiveDate) -> Line {
        Line { kind: TransactionKind::Income, amount, category, on }
    }

    #[test]
    fn breakdown_sums_exactly_by_category() {
        let lines = vec![
            expense(dec!(0.10), "food", d(2024, 3, 1)),
            expense(dec!(0.20), "food", d(2024, 3, 2)),
            expense(dec!(12.50), "rent", d(2024, 3, 3)),
            expense(dec!(0.30), "Food", d(2024, 3, 4)),
            income(dec!(1000), "salary", d(2024, 3, 5)),
        ];

        let breakdown = category_breakdown(&lines, TransactionKind::Expense);
        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown[0].category, "rent");
        assert_eq!(breakdown[0].total, dec!(12.50));

        let food = breakdown.iter().find(|c| c.category == "food").unwrap();
        assert_eq!(food.total, dec!(0.30));
        assert_eq!(food.count, 2);

        let total: Decimal = breakdown.iter().map(|c| c.total).sum();
        assert_eq!(total, dec!(13.10));
    }

    #[test]
    fn breakdown_ties_sorted_by_name() {
        let lines = vec![
            expense(dec!(5), "b", d(2024, 3, 1)),
            expense(dec!(5), "a", d(2024, 3, 1)),
        ];
        let breakdown = category_breakdown(&lines, TransactionKind::Expense);
        assert_eq!(breakdown[0].category, "a");
        assert_eq!(breakdown[0].share, dec!(50));
    }

    #[test]
    fn monthly_summary_filters_by_month() {
        let month = MonthKey::new(2024, 3).unwrap();
        let lines = vec![
            income(dec!(2000), "salary", d(2024, 3, 1)),
            expense(dec!(500), "rent", d(2024, 3, 2)),
            expense(dec!(999), "rent", d(2024, 4, 1)),
        ];

        let summary = MonthlySummary::from_entries(month, &lines);
        assert_eq!(summary.income, dec!(2000));
        assert_eq!(summary.expense, dec!(500));
        assert_eq!(summary.net, dec!(1500));
        assert_eq!(summary.savings_rate, dec!(75));
        assert_eq!(summary.transaction_count, 2);
    }

    #[test]
    fn monthly_summary_without_income() {
        let month = MonthKey::new(2024, 3).unwrap();
        let lines = vec![expense(dec!(10), "food", d(2024, 3, 2))];
        let summary = MonthlySummary::from_entries(month, &lines);
        assert_eq!(summary.savings_rate, Decimal::ZERO);
        assert_eq!(summary.net, dec!(-10));
    }

    #[test]
    fn budget_status_thresholds() {
        assert_eq!(BudgetProgress::new(dec!(100), dec!(50)).status, BudgetStatus::Under);
        assert_eq!(BudgetProgress::new(dec!(100), dec!(80)).status, BudgetStatus::Near);
        assert_eq!(BudgetProgress::new(dec!(100), dec!(100)).status, BudgetStatus::Near);

        let over = BudgetProgress::new(dec!(100), dec!(125.50));
        assert_eq!(over.status, BudgetStatus::Over);
        assert_eq!(over.remaining, dec!(-25.50));
        assert_eq!(over.percent_used, dec!(125.50));
    }

    #[test]
    fn spent_by_category_ignores_income() {
        let lines = vec![
            expense(dec!(3), "food", d(2024, 3, 1)),
            income(dec!(50), "food", d(2024, 3, 1)),
        ];
        let spent = spent_by_category(&lines);
        assert_eq!(spent.get("food"), Some(&dec!(3)));
    }

    #[test]
    fn trend_is_zero_filled_and_ordered() {
        let end = MonthKey::new(2024, 2).unwrap();
        let lines = vec![
            income(dec!(100), "salary", d(2023, 12, 15)),
            expense(dec!(40), "food", d(2024, 2, 3)),
            expense(dec!(1), "food", d(2023, 10, 3)),
        ];

        let trend = monthly_trend(&lines, end, 3);
        let months: Vec<String> = trend.iter().map(|t| t.month.to_string()).collect();
        assert_eq!(months, vec!["2023-12", "2024-01", "2024-02"]);
        assert_eq!(trend[0].net, dec!(100));
        assert_eq!(trend[1].net, Decimal::ZERO);
        assert_eq!(trend[2].expense, dec!(40));
    }

    #[test]
    fn valuation_and_portfolio() {
        let a = Valuation::of(dec!(10), dec!(100), dec!(110));
        assert_eq!(a.gain, dec!(100));
        assert_eq!(a.gain_percent, dec!(10));

        let b = Valuation::of(dec!(2), dec!(50), dec!(25));
        let summary = PortfolioSummary::from_valuations([&a, &b]);
        assert_eq!(summary.holdings, 2);
        assert_eq!(summary.totals.cost_basis, dec!(1100));
        assert_eq!(summary.totals.market_value, dec!(1150));
        assert_eq!(summary.totals.gain, dec!(50));
    }

    #[test]
    fn debt_payment_never_goes_negative() {
        assert_eq!(apply_debt_payment(dec!(100), dec!(30)).unwrap(), dec!(70));
        assert_eq!(apply_debt_payment(dec!(100), dec!(130)).unwrap(), Decimal::ZERO);
        assert!(apply_debt_payment(dec!(100), Decimal::ZERO).is_err());
    }
}
