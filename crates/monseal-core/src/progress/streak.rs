//! Consecutive-activity streak evaluation.
//!
//! The streak counts runs of contribution activity with at most 24 hours
//! between the previous reflection time and the latest qualifying event.
//! Evaluated only for reconciliations that credit new contributions --
//! a quiet run neither extends nor breaks the streak.

use chrono::{DateTime, Duration, Utc};

use super::{end_of_day, ContributionEvent, UserStreak};

/// Gap bound for the streak to continue.
pub const STREAK_WINDOW_HOURS: i64 = 24;

/// Cutoff fallback for a streak that has never been reflected: look back
/// this many days so the first evaluation starts the streak at 1.
pub const FIRST_RUN_LOOKBACK_DAYS: i64 = 2;

/// Latest event instant strictly after `cutoff`, if any.
///
/// Events with unparsable timestamps are skipped.
pub fn latest_qualifying_time(
    events: &[ContributionEvent],
    cutoff: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    events
        .iter()
        .filter_map(|e| e.occurred_at_utc())
        .filter(|t| *t > cutoff)
        .max()
}

/// Evaluate the next streak state from the prior one and the event batch.
///
/// Gap = latest qualifying event minus the prior reflection time. Within
/// the 24h window the streak increments; past it, the streak resets to 1.
/// When no event qualifies, the gap is taken against `now` instead --
/// that fallback omits the `gap > 0` guard of the main branch, an
/// inherited quirk that is preserved as-is.
///
/// `last_reflected_at` always advances to end of day, whichever branch
/// was taken, so the same day cannot be counted twice by a later run.
pub fn evaluate_streak(
    prior: &UserStreak,
    events: &[ContributionEvent],
    now: DateTime<Utc>,
) -> UserStreak {
    let cutoff = prior
        .last_reflected_at
        .unwrap_or_else(|| now - Duration::days(FIRST_RUN_LOOKBACK_DAYS));

    let window = Duration::hours(STREAK_WINDOW_HOURS);
    let within_window = match latest_qualifying_time(events, cutoff) {
        Some(latest) => {
            let gap = latest - cutoff;
            gap > Duration::zero() && gap <= window
        }
        None => now - cutoff <= window,
    };

    let continuous_seal_record = if within_window {
        prior.continuous_seal_record + 1
    } else {
        1
    };

    UserStreak {
        continuous_seal_record,
        max_seal_record: prior.max_seal_record.max(continuous_seal_record),
        last_reflected_at: Some(end_of_day(now)),
    }
}
