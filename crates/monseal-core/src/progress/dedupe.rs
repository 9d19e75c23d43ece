//! Event deduplication and new-progress accumulation.
//!
//! Raw contribution events collapse to **at most one counted event per
//! (repository, UTC calendar day)** -- the first event wins, later events
//! on the same repository and day are discarded regardless of their commit
//! count. The accumulator then sums counted events whose day is strictly
//! after the cutoff date.
//!
//! Collapsing same-day multi-commit activity undercounts relative to
//! "count every new commit"; the rule is kept for compatibility with the
//! stored progression data.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashSet;

use super::ContributionEvent;

/// Cutoff fallback for a record that has never been reflected: look back
/// this many days from the reconciliation time.
pub const FIRST_RUN_LOOKBACK_DAYS: i64 = 30;

/// One deduplicated, countable unit of contribution activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountedEvent {
    /// `owner/name` repository key.
    pub repository: String,
    /// UTC calendar day the activity occurred on.
    pub day: NaiveDate,
    pub commit_count: u32,
}

/// Collapse events to one counted event per (repository, day).
///
/// Events keep their input order; within a (repository, day) group the
/// first event survives. Events with unparsable timestamps are skipped.
pub fn dedupe_events(events: &[ContributionEvent]) -> Vec<CountedEvent> {
    let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();
    let mut counted = Vec::new();

    for event in events {
        let Some(day) = event.occurred_day() else {
            continue;
        };
        let repository = event.repository();
        if !seen.insert((repository.clone(), day)) {
            continue;
        }
        counted.push(CountedEvent {
            repository,
            day,
            commit_count: event.commit_count,
        });
    }

    counted
}

/// Cutoff day for progress accumulation.
///
/// The date component of the record's `last_reflected_at`, or
/// `now - 30 days` when the record has never been reflected.
pub fn progress_cutoff_day(
    last_reflected_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> NaiveDate {
    last_reflected_at
        .unwrap_or_else(|| now - Duration::days(FIRST_RUN_LOOKBACK_DAYS))
        .date_naive()
}

/// Sum commit counts over counted events strictly after the cutoff day.
pub fn accumulate_after(counted: &[CountedEvent], cutoff: NaiveDate) -> u32 {
    counted
        .iter()
        .filter(|c| c.day > cutoff)
        .map(|c| c.commit_count)
        .sum()
}

/// Deduplicate and accumulate in one step.
pub fn new_contributions(
    events: &[ContributionEvent],
    last_reflected_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> u32 {
    accumulate_after(
        &dedupe_events(events),
        progress_cutoff_day(last_reflected_at, now),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn event(owner: &str, repo: &str, occurred_at: &str, commits: u32) -> ContributionEvent {
        ContributionEvent {
            repository_owner: owner.to_string(),
            repository_name: repo.to_string(),
            occurred_at: occurred_at.to_string(),
            commit_count: commits,
        }
    }

    #[test]
    fn test_same_repo_same_day_counts_once() {
        let events = vec![
            event("o", "r", "2026-03-02T09:00:00Z", 4),
            event("o", "r", "2026-03-02T18:00:00Z", 9),
            event("o", "r", "2026-03-02T23:00:00Z", 1),
        ];
        let counted = dedupe_events(&events);
        assert_eq!(counted.len(), 1);
        // First event wins, regardless of which carries more commits.
        assert_eq!(counted[0].commit_count, 4);
    }

    #[test]
    fn test_different_repos_same_day_both_count() {
        let events = vec![
            event("o", "a", "2026-03-02T09:00:00Z", 2),
            event("o", "b", "2026-03-02T09:00:00Z", 3),
        ];
        let counted = dedupe_events(&events);
        assert_eq!(counted.len(), 2);
    }

    #[test]
    fn test_same_repo_different_days_both_count() {
        let events = vec![
            event("o", "r", "2026-03-01T09:00:00Z", 2),
            event("o", "r", "2026-03-02T09:00:00Z", 3),
        ];
        assert_eq!(dedupe_events(&events).len(), 2);
    }

    #[test]
    fn test_unparsable_timestamp_skipped_without_failing_batch() {
        let events = vec![
            event("o", "r", "garbage", 100),
            event("o", "r", "2026-03-02T09:00:00Z", 3),
        ];
        let counted = dedupe_events(&events);
        assert_eq!(counted.len(), 1);
        assert_eq!(counted[0].commit_count, 3);
    }

    #[test]
    fn test_cutoff_is_strictly_after() {
        let cutoff = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let counted = dedupe_events(&[
            event("o", "r", "2026-03-01T09:00:00Z", 1),
            event("o", "r", "2026-03-02T23:59:59Z", 2),
            event("o", "r", "2026-03-03T00:00:00Z", 4),
        ]);
        // Only the day strictly after the cutoff counts.
        assert_eq!(accumulate_after(&counted, cutoff), 4);
    }

    #[test]
    fn test_first_run_cutoff_looks_back_30_days() {
        let now = Utc.with_ymd_and_hms(2026, 3, 31, 12, 0, 0).unwrap();
        let cutoff = progress_cutoff_day(None, now);
        assert_eq!(cutoff, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn test_reflected_cutoff_uses_date_component() {
        let reflected = Utc.with_ymd_and_hms(2026, 3, 5, 23, 59, 59).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        let cutoff = progress_cutoff_day(Some(reflected), now);
        assert_eq!(cutoff, NaiveDate::from_ymd_opt(2026, 3, 5).unwrap());
    }

    #[test]
    fn test_new_contributions_composed() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let reflected = Utc.with_ymd_and_hms(2026, 3, 8, 9, 0, 0).unwrap();
        let events = vec![
            event("o", "r", "2026-03-08T20:00:00Z", 7), // on cutoff day: excluded
            event("o", "r", "2026-03-09T08:00:00Z", 2),
            event("o", "r", "2026-03-09T21:00:00Z", 5), // same repo+day: dropped
            event("o", "x", "2026-03-09T21:00:00Z", 3),
        ];
        assert_eq!(new_contributions(&events, Some(reflected), now), 5);
    }

    proptest! {
        /// Dedup never yields two counted events for the same key.
        #[test]
        fn prop_at_most_one_per_repo_day(
            commits in proptest::collection::vec(0u32..50, 1..20),
            days in proptest::collection::vec(1u32..6, 1..20),
        ) {
            let events: Vec<_> = commits
                .iter()
                .zip(days.iter().cycle())
                .map(|(&c, &d)| event("o", "r", &format!("2026-03-0{d}T10:00:00Z"), c))
                .collect();
            let counted = dedupe_events(&events);
            let mut keys: Vec<_> = counted
                .iter()
                .map(|c| (c.repository.clone(), c.day))
                .collect();
            keys.sort();
            keys.dedup();
            prop_assert_eq!(keys.len(), counted.len());
        }

        /// The accumulated sum never exceeds the raw event sum.
        #[test]
        fn prop_sum_bounded_by_raw_sum(
            commits in proptest::collection::vec(0u32..50, 0..20),
        ) {
            let events: Vec<_> = commits
                .iter()
                .enumerate()
                .map(|(i, &c)| {
                    event("o", "r", &format!("2026-03-{:02}T10:00:00Z", (i % 27) + 1), c)
                })
                .collect();
            let raw: u32 = commits.iter().sum();
            let total = accumulate_after(
                &dedupe_events(&events),
                NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            );
            prop_assert!(total <= raw);
        }
    }
}
