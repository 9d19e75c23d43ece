//! Document store abstraction.
//!
//! Every durable collaborator the engine talks to sits behind
//! [`DocumentStore`], injected at construction -- no global client
//! handles. [`MemoryStore`] is a full in-process implementation used as a
//! substitute in tests (including a failure-injection knob for the
//! swallowed streak-write path).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::progress::{MonsterProgress, SealedMonster, UserStreak};
use crate::user::UserProfile;

/// Durable storage operations the engine needs.
///
/// One user owns at most one current-monster record and an append-only
/// sealed-monster history. Implementations report a missing record as
/// [`StoreError::NotFound`] and anything transient as
/// [`StoreError::Unavailable`].
pub trait DocumentStore: Send + Sync {
    /// Create a user record. Fails if the user already exists.
    fn create_user(&self, profile: &UserProfile) -> Result<(), StoreError>;

    /// Load a user's profile including streak fields.
    fn get_user(&self, user_id: &str) -> Result<UserProfile, StoreError>;

    /// Load the user's current-monster record.
    fn get_current_monster(&self, user_id: &str) -> Result<MonsterProgress, StoreError>;

    /// Upsert the user's current-monster record in place.
    fn set_current_monster(
        &self,
        user_id: &str,
        progress: &MonsterProgress,
    ) -> Result<(), StoreError>;

    /// Retire `retiring_monster_id` and install `next` as one atomic
    /// update. Fails with `NotFound` when the stored record no longer
    /// carries the retiring identity.
    fn replace_current_monster(
        &self,
        user_id: &str,
        retiring_monster_id: &str,
        next: &MonsterProgress,
    ) -> Result<(), StoreError>;

    /// Remove the user's current-monster record if it carries
    /// `monster_id`.
    fn delete_current_monster(&self, user_id: &str, monster_id: &str) -> Result<(), StoreError>;

    /// Append one entry to the user's sealed-monster history.
    fn append_sealed_monster(&self, user_id: &str, sealed: &SealedMonster)
        -> Result<(), StoreError>;

    /// The user's sealed-monster history in creation order.
    fn list_sealed_monsters(&self, user_id: &str) -> Result<Vec<SealedMonster>, StoreError>;

    /// Persist the user's streak fields.
    fn update_user_streak(&self, user_id: &str, streak: &UserStreak) -> Result<(), StoreError>;
}

#[derive(Default)]
struct MemoryInner {
    users: HashMap<String, UserProfile>,
    monsters: HashMap<String, MonsterProgress>,
    sealed: HashMap<String, Vec<SealedMonster>>,
}

/// In-memory [`DocumentStore`] for tests and offline experiments.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    fail_streak_updates: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `update_user_streak` fail with
    /// `Unavailable`. Used to exercise the swallowed-failure path.
    pub fn fail_streak_updates(&self, fail: bool) {
        self.fail_streak_updates.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl DocumentStore for MemoryStore {
    fn create_user(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.users.contains_key(&profile.user_id) {
            return Err(StoreError::QueryFailed(format!(
                "user '{}' already exists",
                profile.user_id
            )));
        }
        inner.users.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    fn get_user(&self, user_id: &str) -> Result<UserProfile, StoreError> {
        self.lock()
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user '{user_id}'")))
    }

    fn get_current_monster(&self, user_id: &str) -> Result<MonsterProgress, StoreError> {
        self.lock()
            .monsters
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("current monster for user '{user_id}'")))
    }

    fn set_current_monster(
        &self,
        user_id: &str,
        progress: &MonsterProgress,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.users.contains_key(user_id) {
            return Err(StoreError::NotFound(format!("user '{user_id}'")));
        }
        inner.monsters.insert(user_id.to_string(), progress.clone());
        Ok(())
    }

    fn replace_current_monster(
        &self,
        user_id: &str,
        retiring_monster_id: &str,
        next: &MonsterProgress,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let retiring_matches = inner
            .monsters
            .get(user_id)
            .is_some_and(|current| current.monster_id == retiring_monster_id);
        if !retiring_matches {
            return Err(StoreError::NotFound(format!(
                "current monster '{retiring_monster_id}' for user '{user_id}'"
            )));
        }
        inner.monsters.insert(user_id.to_string(), next.clone());
        Ok(())
    }

    fn delete_current_monster(&self, user_id: &str, monster_id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let matches = inner
            .monsters
            .get(user_id)
            .is_some_and(|current| current.monster_id == monster_id);
        if !matches {
            return Err(StoreError::NotFound(format!(
                "current monster '{monster_id}' for user '{user_id}'"
            )));
        }
        inner.monsters.remove(user_id);
        Ok(())
    }

    fn append_sealed_monster(
        &self,
        user_id: &str,
        sealed: &SealedMonster,
    ) -> Result<(), StoreError> {
        self.lock()
            .sealed
            .entry(user_id.to_string())
            .or_default()
            .push(sealed.clone());
        Ok(())
    }

    fn list_sealed_monsters(&self, user_id: &str) -> Result<Vec<SealedMonster>, StoreError> {
        Ok(self.lock().sealed.get(user_id).cloned().unwrap_or_default())
    }

    fn update_user_streak(&self, user_id: &str, streak: &UserStreak) -> Result<(), StoreError> {
        if self.fail_streak_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "streak update failure injected".to_string(),
            ));
        }
        let mut inner = self.lock();
        let user = inner
            .users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user '{user_id}'")))?;
        user.streak = streak.clone();
        Ok(())
    }
}
