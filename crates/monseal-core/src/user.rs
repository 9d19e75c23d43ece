//! User profiles, onboarding, and the combined user view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::MonsterCatalog;
use crate::error::StoreError;
use crate::progress::{MonsterProgress, SealedMonster, UserStreak};
use crate::storage::DocumentStore;

/// A registered user and their streak counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub github_login: String,
    #[serde(default)]
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub streak: UserStreak,
}

/// Profile plus progression state, as returned to callers in one piece.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub current_monster: Option<MonsterProgress>,
    pub sealed_monsters: Vec<SealedMonster>,
}

/// Register a user and assign their first monster.
///
/// The first monster comes from the catalog's first entry, starting at
/// zero progress with both timestamps set to the registration instant.
pub fn onboard_user(
    store: &dyn DocumentStore,
    catalog: &dyn MonsterCatalog,
    user_id: &str,
    github_login: &str,
    photo_url: &str,
    now: DateTime<Utc>,
) -> Result<UserProfile, StoreError> {
    let profile = UserProfile {
        user_id: user_id.to_string(),
        github_login: github_login.to_string(),
        photo_url: photo_url.to_string(),
        created_at: now,
        streak: UserStreak::default(),
    };
    store.create_user(&profile)?;

    let first = catalog.first();
    store.set_current_monster(
        user_id,
        &MonsterProgress {
            monster_id: first.monster_id,
            progress_contributions: 0,
            required_contributions: first.required_contributions,
            last_reflected_at: Some(now),
            assigned_at: now,
        },
    )?;

    Ok(profile)
}

/// Load profile, current monster, and sealed history in one call.
///
/// A user without a current monster yields `None` there rather than an
/// error; a missing user is `NotFound`.
pub fn fetch_user_view(store: &dyn DocumentStore, user_id: &str) -> Result<UserView, StoreError> {
    let profile = store.get_user(user_id)?;
    let current_monster = match store.get_current_monster(user_id) {
        Ok(m) => Some(m),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e),
    };
    let sealed_monsters = store.list_sealed_monsters(user_id)?;
    Ok(UserView {
        profile,
        current_monster,
        sealed_monsters,
    })
}
