//! Contribution progression records and the reconciliation pipeline.
//!
//! The pipeline is composed of small, separately testable stages:
//!
//! - [`dedupe`]: collapse raw contribution events to one counted event per
//!   (repository, calendar day) and sum the counts past a cutoff date
//! - [`transition`]: decide whether accumulated progress seals the current
//!   monster and advances to the next catalog entry
//! - [`streak`]: maintain the consecutive-activity streak and its maximum
//! - [`reconcile`]: orchestrate the stages against the document store
//!
//! All calendar arithmetic uses the UTC date component of event timestamps.

pub mod dedupe;
pub mod reconcile;
pub mod streak;
pub mod transition;

pub use dedupe::{accumulate_after, dedupe_events, progress_cutoff_day, CountedEvent};
pub use reconcile::Reconciler;
pub use streak::evaluate_streak;
pub use transition::{apply_new_contributions, TransitionOutcome};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single raw contribution event from the contribution source.
///
/// Immutable input to one reconciliation call; never persisted.
/// `occurred_at` is kept as the raw RFC3339 string the source delivered --
/// parsing happens lazily and an unparsable timestamp drops the event
/// instead of failing the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionEvent {
    pub repository_owner: String,
    pub repository_name: String,
    pub occurred_at: String,
    pub commit_count: u32,
}

impl ContributionEvent {
    /// `owner/name` form used as the deduplication key.
    pub fn repository(&self) -> String {
        format!("{}/{}", self.repository_owner, self.repository_name)
    }

    /// Parsed event instant, `None` when the timestamp is unparsable.
    pub fn occurred_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.occurred_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// UTC calendar day of the event, `None` when the timestamp is unparsable.
    pub fn occurred_day(&self) -> Option<NaiveDate> {
        self.occurred_at_utc().map(|t| t.date_naive())
    }
}

/// The single active monster record for a user.
///
/// Replaced wholesale on a monster transition: the identity changes
/// (`monster_id`), so an advance is a retire-and-create, not an edit.
/// After every reconciliation `progress_contributions` is back under
/// `required_contributions` via carry-over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterProgress {
    pub monster_id: String,
    pub progress_contributions: u32,
    pub required_contributions: u32,
    /// Last time contributions were reflected into this record.
    /// `None` before the first reconciliation.
    pub last_reflected_at: Option<DateTime<Utc>>,
    pub assigned_at: DateTime<Utc>,
}

/// Append-only history entry created once per seal. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedMonster {
    pub monster_id: String,
    pub monster_name: String,
    pub sealed_at: DateTime<Utc>,
}

/// Consecutive-activity streak counters for a user.
///
/// `max_seal_record >= continuous_seal_record` always holds; both are
/// mutated only when a reconciliation credits new contributions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStreak {
    pub continuous_seal_record: u32,
    pub max_seal_record: u32,
    /// Last time streak state was reflected. `None` before the first
    /// contribution-bearing reconciliation.
    pub last_reflected_at: Option<DateTime<Utc>>,
}

/// Last instant of `now`'s UTC calendar day (23:59:59.999999999).
///
/// Stamped into `last_reflected_at` to suppress re-counting the same
/// day's activity on a later run.
pub fn end_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_nano_opt(23, 59, 59, 999_999_999)
        .map(|t| t.and_utc())
        .unwrap_or(now)
}
