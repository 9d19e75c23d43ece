//! Monster transition state machine.
//!
//! Given the current monster and the freshly credited contribution sum,
//! either stay on the current monster or seal it and advance:
//!
//! ```text
//! InProgress(id, progress, required)
//!     -- progress + new < required -->  InProgress(id, progress + new, required)
//!     -- progress + new >= required --> Sealed(id) + InProgress(next_id, carry, next_required)
//! ```
//!
//! Surplus progress past the threshold carries over as the next monster's
//! starting progress. The caller short-circuits a zero sum before reaching
//! this module; no transition can occur from zero new progress.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::{end_of_day, MonsterProgress, SealedMonster};
use crate::catalog::{next_monster_id, MonsterCatalog};

/// Result of applying new contributions to the current monster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Threshold not reached; same monster with updated progress.
    Stay { progress: MonsterProgress },
    /// Threshold reached: the retiring monster's history entry plus the
    /// next monster record to install.
    Advance {
        sealed: SealedMonster,
        next: MonsterProgress,
    },
}

impl TransitionOutcome {
    /// The current-monster record to persist, whichever branch was taken.
    pub fn progress(&self) -> &MonsterProgress {
        match self {
            TransitionOutcome::Stay { progress } => progress,
            TransitionOutcome::Advance { next, .. } => next,
        }
    }
}

/// Display-name fallback when the catalog has no entry for a retiring
/// monster. A missing name never blocks a seal.
pub fn fallback_monster_name(monster_id: &str) -> String {
    format!("モンスター{monster_id}")
}

/// Apply `new_contributions` (> 0) to `current` and decide stay/advance.
///
/// On advance, the next identifier is the numeric increment of the
/// current one under the catalog's zero-padded convention, wrapping to
/// the catalog's first entry when the incremented identifier is absent
/// (or the current identifier is not numeric). The new record starts at
/// the carry-over and is stamped reflected through end of day so the same
/// day's activity is not credited twice by a later run.
pub fn apply_new_contributions(
    current: &MonsterProgress,
    new_contributions: u32,
    catalog: &dyn MonsterCatalog,
    now: DateTime<Utc>,
) -> TransitionOutcome {
    let updated = current.progress_contributions + new_contributions;

    if updated < current.required_contributions {
        return TransitionOutcome::Stay {
            progress: MonsterProgress {
                progress_contributions: updated,
                last_reflected_at: Some(now),
                ..current.clone()
            },
        };
    }

    let monster_name = catalog
        .lookup(&current.monster_id)
        .map(|e| e.name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| {
            warn!(
                monster_id = %current.monster_id,
                "no catalog name for retiring monster, using fallback"
            );
            fallback_monster_name(&current.monster_id)
        });

    let sealed = SealedMonster {
        monster_id: current.monster_id.clone(),
        monster_name,
        sealed_at: now,
    };

    let next_entry = next_monster_id(&current.monster_id, catalog.id_width())
        .and_then(|id| catalog.lookup(&id))
        .unwrap_or_else(|| catalog.first());

    if next_entry.required_contributions == 0 {
        warn!(
            monster_id = %next_entry.monster_id,
            "next monster requires 0 contributions, roster data looks wrong"
        );
    }

    let carry_over = updated - current.required_contributions;
    let next = MonsterProgress {
        monster_id: next_entry.monster_id,
        progress_contributions: carry_over,
        required_contributions: next_entry.required_contributions,
        last_reflected_at: Some(end_of_day(now)),
        assigned_at: now,
    };

    TransitionOutcome::Advance { sealed, next }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, StaticCatalog};
    use chrono::TimeZone;

    fn monster(id: &str, progress: u32, required: u32) -> MonsterProgress {
        MonsterProgress {
            monster_id: id.to_string(),
            progress_contributions: progress,
            required_contributions: required,
            last_reflected_at: Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()),
            assigned_at: Utc.with_ymd_and_hms(2026, 2, 20, 0, 0, 0).unwrap(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 5, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_below_threshold_stays() {
        let catalog = StaticCatalog::default_roster();
        let outcome = apply_new_contributions(&monster("001", 25, 30), 4, &catalog, now());
        match outcome {
            TransitionOutcome::Stay { progress } => {
                assert_eq!(progress.monster_id, "001");
                assert_eq!(progress.progress_contributions, 29);
                assert_eq!(progress.required_contributions, 30);
                // Reflected to the reconciliation instant, not end of day.
                assert_eq!(progress.last_reflected_at, Some(now()));
            }
            other => panic!("expected stay, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_threshold_advances_with_zero_carry() {
        let catalog = StaticCatalog::default_roster();
        let outcome = apply_new_contributions(&monster("001", 25, 30), 5, &catalog, now());
        match outcome {
            TransitionOutcome::Advance { sealed, next } => {
                assert_eq!(sealed.monster_id, "001");
                assert_eq!(sealed.monster_name, "スライム");
                assert_eq!(sealed.sealed_at, now());
                assert_eq!(next.monster_id, "002");
                assert_eq!(next.progress_contributions, 0);
                assert_eq!(next.required_contributions, 50);
                assert_eq!(next.assigned_at, now());
            }
            other => panic!("expected advance, got {other:?}"),
        }
    }

    #[test]
    fn test_surplus_carries_over() {
        let catalog = StaticCatalog::default_roster();
        let outcome = apply_new_contributions(&monster("001", 25, 30), 12, &catalog, now());
        match outcome {
            TransitionOutcome::Advance { next, .. } => {
                assert_eq!(next.progress_contributions, 7);
            }
            other => panic!("expected advance, got {other:?}"),
        }
    }

    #[test]
    fn test_advance_reflects_through_end_of_day() {
        let catalog = StaticCatalog::default_roster();
        let outcome = apply_new_contributions(&monster("001", 25, 30), 5, &catalog, now());
        let reflected = outcome.progress().last_reflected_at.unwrap();
        assert_eq!(reflected.date_naive(), now().date_naive());
        assert_eq!(reflected.format("%H:%M:%S").to_string(), "23:59:59");
    }

    #[test]
    fn test_highest_id_wraps_to_first() {
        let catalog = StaticCatalog::default_roster();
        let outcome = apply_new_contributions(&monster("008", 370, 380), 10, &catalog, now());
        match outcome {
            TransitionOutcome::Advance { next, .. } => {
                assert_eq!(next.monster_id, "001");
                assert_eq!(next.required_contributions, 30);
            }
            other => panic!("expected advance, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_id_wraps_to_first() {
        let catalog = StaticCatalog::default_roster();
        let outcome = apply_new_contributions(&monster("slime", 9, 10), 1, &catalog, now());
        match outcome {
            TransitionOutcome::Advance { next, .. } => assert_eq!(next.monster_id, "001"),
            other => panic!("expected advance, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_catalog_name_uses_fallback() {
        // Roster without an entry for the retiring monster.
        let catalog = StaticCatalog::new(vec![CatalogEntry {
            monster_id: "001".to_string(),
            name: "スライム".to_string(),
            required_contributions: 30,
        }])
        .unwrap();
        let outcome = apply_new_contributions(&monster("042", 9, 10), 1, &catalog, now());
        match outcome {
            TransitionOutcome::Advance { sealed, .. } => {
                assert_eq!(sealed.monster_name, "モンスター042");
            }
            other => panic!("expected advance, got {other:?}"),
        }
    }
}
