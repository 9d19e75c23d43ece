//! Monster catalog -- read-only roster of monsters and their thresholds.
//!
//! Identifiers follow a fixed-width zero-padded numeric convention
//! (`"001"`, `"002"`, ...). Advancing past the highest identifier wraps
//! back to the roster's first entry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::CatalogError;

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub monster_id: String,
    pub name: String,
    pub required_contributions: u32,
}

/// Lookup collaborator for monster reference data.
///
/// Implementations are never empty: `first()` must return an entry that
/// `lookup()` also resolves, which keeps the advance state machine total.
pub trait MonsterCatalog: Send + Sync {
    /// Entry for `monster_id`, or `None` when the roster has no such id.
    fn lookup(&self, monster_id: &str) -> Option<CatalogEntry>;

    /// The roster's designated first entry (wraparound target).
    fn first(&self) -> CatalogEntry;

    /// Width of the zero-padded identifier convention.
    fn id_width(&self) -> usize;
}

/// Identifier following `current` under the zero-padded convention.
///
/// `None` when `current` is not numeric -- the caller falls back to the
/// roster's first identifier, same as for an identifier past the end.
pub fn next_monster_id(current: &str, width: usize) -> Option<String> {
    let n: u64 = current.parse().ok()?;
    Some(format!("{:0width$}", n + 1, width = width))
}

/// In-memory roster, either the embedded default or loaded from TOML.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    entries: BTreeMap<String, CatalogEntry>,
    id_width: usize,
}

/// Default roster. The opening monster asks for 30 contributions; later
/// entries ramp the threshold up.
const DEFAULT_ROSTER: &[(&str, &str, u32)] = &[
    ("001", "スライム", 30),
    ("002", "ゴブリン", 50),
    ("003", "コボルト", 80),
    ("004", "オーク", 120),
    ("005", "リザードマン", 170),
    ("006", "オーガ", 230),
    ("007", "キメラ", 300),
    ("008", "ドラゴン", 380),
];

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    monsters: Vec<RosterEntry>,
}

#[derive(Debug, Deserialize)]
struct RosterEntry {
    id: String,
    name: String,
    required: u32,
}

impl StaticCatalog {
    /// Build a catalog from explicit entries. Fails on an empty roster.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        let id_width = entries.iter().map(|e| e.monster_id.len()).max().unwrap_or(3);
        let entries = entries
            .into_iter()
            .map(|e| (e.monster_id.clone(), e))
            .collect();
        Ok(Self { entries, id_width })
    }

    /// The embedded default roster.
    pub fn default_roster() -> Self {
        let entries = DEFAULT_ROSTER
            .iter()
            .map(|&(id, name, required)| {
                (
                    id.to_string(),
                    CatalogEntry {
                        monster_id: id.to_string(),
                        name: name.to_string(),
                        required_contributions: required,
                    },
                )
            })
            .collect();
        Self {
            entries,
            id_width: 3,
        }
    }

    /// Parse a roster from TOML text.
    ///
    /// ```toml
    /// [[monsters]]
    /// id = "001"
    /// name = "スライム"
    /// required = 30
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let file: RosterFile =
            toml::from_str(text).map_err(|e| CatalogError::ParseFailed(e.to_string()))?;
        Self::new(
            file.monsters
                .into_iter()
                .map(|m| CatalogEntry {
                    monster_id: m.id,
                    name: m.name,
                    required_contributions: m.required,
                })
                .collect(),
        )
    }

    /// Load a roster from a TOML file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|e| CatalogError::ReadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// All entries in identifier order.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.entries.values().cloned().collect()
    }
}

impl MonsterCatalog for StaticCatalog {
    fn lookup(&self, monster_id: &str) -> Option<CatalogEntry> {
        self.entries.get(monster_id).cloned()
    }

    fn first(&self) -> CatalogEntry {
        // Non-empty by construction; identifier order makes the lowest
        // id the designated first entry.
        self.entries
            .values()
            .next()
            .cloned()
            .unwrap_or_else(|| CatalogEntry {
                monster_id: "001".to_string(),
                name: String::new(),
                required_contributions: 0,
            })
    }

    fn id_width(&self) -> usize {
        self.id_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_monster_id_zero_padded() {
        assert_eq!(next_monster_id("001", 3), Some("002".to_string()));
        assert_eq!(next_monster_id("009", 3), Some("010".to_string()));
        assert_eq!(next_monster_id("099", 3), Some("100".to_string()));
    }

    #[test]
    fn test_next_monster_id_overflows_width() {
        // Width is a minimum, not a cap; the roster simply has no such
        // entry and the caller wraps.
        assert_eq!(next_monster_id("999", 3), Some("1000".to_string()));
    }

    #[test]
    fn test_next_monster_id_non_numeric() {
        assert_eq!(next_monster_id("slime", 3), None);
    }

    #[test]
    fn test_default_roster_first() {
        let catalog = StaticCatalog::default_roster();
        let first = catalog.first();
        assert_eq!(first.monster_id, "001");
        assert_eq!(first.required_contributions, 30);
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let catalog = StaticCatalog::default_roster();
        assert!(catalog.lookup("002").is_some());
        assert!(catalog.lookup("999").is_none());
    }

    #[test]
    fn test_empty_roster_rejected() {
        assert!(matches!(
            StaticCatalog::new(Vec::new()),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn test_from_toml_str() {
        let catalog = StaticCatalog::from_toml_str(
            r#"
            [[monsters]]
            id = "001"
            name = "ワイバーン"
            required = 10

            [[monsters]]
            id = "002"
            name = "グリフォン"
            required = 20
            "#,
        )
        .unwrap();
        assert_eq!(catalog.entries().len(), 2);
        assert_eq!(catalog.lookup("001").unwrap().name, "ワイバーン");
        assert_eq!(catalog.lookup("002").unwrap().required_contributions, 20);
    }

    #[test]
    fn test_from_toml_str_rejects_garbage() {
        assert!(matches!(
            StaticCatalog::from_toml_str("monsters = 3"),
            Err(CatalogError::ParseFailed(_))
        ));
    }
}
