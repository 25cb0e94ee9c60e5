//! Streak, success-rate and analytics bookkeeping.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use habit_core::model::{Analytics, Frequency, Habit};

/// Index of the frequency period containing `at`, counted from the habit's
/// creation day (UTC calendar days).
fn period_index(frequency: Frequency, created_at: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
    let days = (at.date_naive() - created_at.date_naive()).num_days();
    days.div_euclid(frequency.period_days())
}

/// Fraction of elapsed periods with a completion, capped at 1.0.
pub fn success_rate(habit: &Habit, as_of: DateTime<Utc>, total_completions: usize) -> f64 {
    let periods = (period_index(habit.frequency, habit.created_at, as_of) + 1).max(1);
    (total_completions as f64 / periods as f64).min(1.0)
}

/// Fold a new completion into the habit's statistics.
///
/// `total_completions` includes the completion being applied. A completion
/// older than `last_completed` is a backfill and leaves the streak alone.
pub fn apply_completion(habit: &mut Habit, completed_at: DateTime<Utc>, total_completions: usize) {
    let at = period_index(habit.frequency, habit.created_at, completed_at);
    match habit.last_completed {
        None => {
            habit.streak = 1;
            habit.last_completed = Some(completed_at);
        }
        Some(last) if completed_at < last => {}
        Some(last) => {
            let prev = period_index(habit.frequency, habit.created_at, last);
            habit.streak = match at - prev {
                0 => habit.streak.max(1),
                1 => habit.streak + 1,
                _ => 1,
            };
            habit.last_completed = Some(completed_at);
        }
    }
    let as_of = habit.last_completed.unwrap_or(completed_at);
    habit.success_rate = success_rate(habit, as_of, total_completions);
}

/// Aggregate a user's active habits.
pub fn analytics(user_id: &str, habits: &[Habit]) -> Analytics {
    let active: Vec<&Habit> = habits.iter().filter(|h| h.is_active).collect();

    let mut habits_by_category = BTreeMap::new();
    for h in &active {
        *habits_by_category.entry(h.category.clone()).or_insert(0) += 1;
    }

    let average_success_rate = if active.is_empty() {
        0.0
    } else {
        active.iter().map(|h| h.success_rate).sum::<f64>() / active.len() as f64
    };

    Analytics {
        user_id: user_id.to_string(),
        total_habits: active.len(),
        average_success_rate,
        total_streaks: active.iter().map(|h| u64::from(h.streak)).sum(),
        habits_by_category,
    }
}
