//! Reconciliation orchestrator.
//!
//! One reconciliation = one user + one batch of contribution events:
//!
//! 1. Load the current-monster record and the user's streak fields
//! 2. Deduplicate the batch and accumulate new contributions
//! 3. Zero new contributions: refresh `last_reflected_at` only and return
//! 4. Otherwise run the transition state machine and persist the result
//!    (on advance: append the sealed entry, then swap the current-monster
//!    record in one guarded update)
//! 5. Evaluate the streak and persist it -- a failure here is logged and
//!    swallowed, because monster progress is already durably committed
//! 6. Return the persisted current-monster record
//!
//! Reconciliations for the same user are serialized through a per-user
//! lock; different users proceed in parallel. The orchestrator keeps no
//! state between calls beyond that lock table.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

use super::dedupe::{accumulate_after, dedupe_events, progress_cutoff_day};
use super::streak::evaluate_streak;
use super::transition::{apply_new_contributions, TransitionOutcome};
use super::{ContributionEvent, MonsterProgress};
use crate::catalog::MonsterCatalog;
use crate::error::ReconcileError;
use crate::storage::DocumentStore;

/// Composes the progression pipeline against injected collaborators.
pub struct Reconciler<S, C> {
    store: S,
    catalog: C,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: DocumentStore, C: MonsterCatalog> Reconciler<S, C> {
    pub fn new(store: S, catalog: C) -> Self {
        Self {
            store,
            catalog,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Reconcile `events` into `user_id`'s progression state.
    pub fn reconcile(
        &self,
        user_id: &str,
        events: &[ContributionEvent],
    ) -> Result<MonsterProgress, ReconcileError> {
        self.reconcile_at(user_id, events, Utc::now())
    }

    /// [`reconcile`](Self::reconcile) with an explicit reconciliation time.
    pub fn reconcile_at(
        &self,
        user_id: &str,
        events: &[ContributionEvent],
        now: DateTime<Utc>,
    ) -> Result<MonsterProgress, ReconcileError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let user = self.store.get_user(user_id)?;
        let current = self.store.get_current_monster(user_id)?;

        let counted = dedupe_events(events);
        let cutoff = progress_cutoff_day(current.last_reflected_at, now);
        let new_contributions = accumulate_after(&counted, cutoff);
        debug!(
            user = user_id,
            new_contributions,
            counted = counted.len(),
            %cutoff,
            "accumulated new contributions"
        );

        if new_contributions == 0 {
            let refreshed = MonsterProgress {
                last_reflected_at: Some(now),
                ..current
            };
            self.store.set_current_monster(user_id, &refreshed)?;
            return Ok(refreshed);
        }

        let persisted =
            match apply_new_contributions(&current, new_contributions, &self.catalog, now) {
                TransitionOutcome::Stay { progress } => {
                    self.store.set_current_monster(user_id, &progress)?;
                    progress
                }
                TransitionOutcome::Advance { sealed, next } => {
                    debug!(
                        user = user_id,
                        sealed = %sealed.monster_id,
                        next = %next.monster_id,
                        carry_over = next.progress_contributions,
                        "monster sealed"
                    );
                    self.store.append_sealed_monster(user_id, &sealed)?;
                    self.store
                        .replace_current_monster(user_id, &current.monster_id, &next)?;
                    next
                }
            };

        // Monster progress is committed; a streak failure must not undo it.
        let streak = evaluate_streak(&user.streak, events, now);
        if let Err(e) = self.store.update_user_streak(user_id, &streak) {
            warn!(
                user = user_id,
                error = %e,
                "streak update failed after progress commit, continuing"
            );
        }

        Ok(persisted)
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
