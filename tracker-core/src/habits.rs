//! Habit streaks and completion statistics.
//!
//! All functions take the dates of *completed* log rows. Order and
//! duplicates do not matter; inputs are normalized into a sorted set.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use serde::Serialize;

/// Window used for the completion rate.
pub const COMPLETION_WINDOW_DAYS: u32 = 30;

/// Summary statistics for a single habit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completions: u32,
    pub completed_today: bool,
    /// Percentage of the trailing 30 days (including today) with a completion.
    pub completion_rate: f64,
}

impl HabitStats {
    pub fn compute(completed: &[NaiveDate], today: NaiveDate) -> Self {
        let days = distinct(completed);
        let window_start = today - Days::new(u64::from(COMPLETION_WINDOW_DAYS - 1));
        let in_window = days.range(window_start..=today).count() as f64;
        let rate = in_window / f64::from(COMPLETION_WINDOW_DAYS) * 100.0;

        Self {
            current_streak: streak_in(&days, today),
            longest_streak: longest_in(&days),
            total_completions: days.len() as u32,
            completed_today: days.contains(&today),
            completion_rate: (rate * 10.0).round() / 10.0,
        }
    }
}

/// Consecutive completed days ending today or yesterday.
///
/// A habit not yet done today keeps yesterday's streak alive; anything older
/// than yesterday resets it to zero.
pub fn current_streak(completed: &[NaiveDate], today: NaiveDate) -> u32 {
    streak_in(&distinct(completed), today)
}

/// Longest run of consecutive completed days anywhere in the history.
pub fn longest_streak(completed: &[NaiveDate]) -> u32 {
    longest_in(&distinct(completed))
}

fn distinct(completed: &[NaiveDate]) -> BTreeSet<NaiveDate> {
    completed.iter().copied().collect()
}

fn streak_in(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let Some(yesterday) = today.pred_opt() else {
        return u32::from(days.contains(&today));
    };

    let start = if days.contains(&today) {
        today
    } else if days.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    // Dates after `start` (future logs) are ignored.
    let mut streak = 0;
    let mut expected = Some(start);
    for day in days.range(..=start).rev() {
        if Some(*day) != expected {
            break;
        }
        streak += 1;
        expected = day.pred_opt();
    }
    streak
}

fn longest_in(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    for day in days {
        run = match prev {
            Some(p) if p.succ_opt() == Some(*day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(*day);
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn run_ending(end: NaiveDate, len: u64) -> Vec<NaiveDate> {
        (0..len).map(|i| end - Days::new(i)).collect()
    }

    #[test]
    fn consecutive_days_ending_today() {
        let today = d(2024, 6, 15);
        assert_eq!(current_streak(&run_ending(today, 5), today), 5);
    }

    #[test]
    fn streak_ending_yesterday_still_counts() {
        let today = d(2024, 6, 15);
        let dates = run_ending(d(2024, 6, 14), 3);
        assert_eq!(current_streak(&dates, today), 3);
    }

    #[test]
    fn gap_before_yesterday_breaks_streak() {
        let today = d(2024, 6, 15);
        let dates = run_ending(d(2024, 6, 13), 4);
        assert_eq!(current_streak(&dates, today), 0);
    }

    #[test]
    fn gap_inside_history_stops_count() {
        let today = d(2024, 6, 15);
        let dates = vec![d(2024, 6, 15), d(2024, 6, 14), d(2024, 6, 12), d(2024, 6, 11)];
        assert_eq!(current_streak(&dates, today), 2);
    }

    #[test]
    fn unsorted_duplicates_are_normalized() {
        let today = d(2024, 6, 15);
        let dates = vec![d(2024, 6, 14), d(2024, 6, 15), d(2024, 6, 14), d(2024, 6, 13)];
        assert_eq!(current_streak(&dates, today), 3);
        assert_eq!(longest_streak(&dates), 3);
    }

    #[test]
    fn future_logs_do_not_extend_streak() {
        let today = d(2024, 6, 15);
        let dates = vec![d(2024, 6, 17), d(2024, 6, 16), d(2024, 6, 15)];
        assert_eq!(current_streak(&dates, today), 1);
    }

    #[test]
    fn empty_history() {
        let today = d(2024, 6, 15);
        assert_eq!(current_streak(&[], today), 0);
        assert_eq!(longest_streak(&[]), 0);
        let stats = HabitStats::compute(&[], today);
        assert_eq!(stats.total_completions, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert!(!stats.completed_today);
    }

    #[test]
    fn longest_streak_across_month_boundary() {
        let dates = vec![
            d(2024, 1, 30),
            d(2024, 1, 31),
            d(2024, 2, 1),
            d(2024, 2, 2),
            d(2024, 2, 10),
        ];
        assert_eq!(longest_streak(&dates), 4);
    }

    #[test]
    fn stats_summary() {
        let today = d(2024, 6, 30);
        let mut dates = run_ending(today, 3);
        dates.extend(run_ending(d(2024, 6, 20), 6));
        // Outside the 30-day window.
        dates.push(d(2024, 5, 1));

        let stats = HabitStats::compute(&dates, today);
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 6);
        assert_eq!(stats.total_completions, 10);
        assert!(stats.completed_today);
        assert_eq!(stats.completion_rate, 30.0);
    }
}
