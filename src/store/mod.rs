// 🗄️ Group Store - Saved payment history
//
// Two interchangeable backends behind one trait:
// - JsonStore:   flat JSON document ({"groups": [...], "templates": [...]})
// - SqliteStore: groups + members tables (WAL mode)
//
// The fairness and settlement engines never touch storage; callers save the
// members they analyzed together with the score and total.

pub mod json;
pub mod sqlite;

pub use json::JsonStore;
pub use sqlite::SqliteStore;

use crate::analysis::Analysis;
use crate::config::Config;
use crate::contribution::Contribution;
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// GROUP CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupCategory {
    #[default]
    General,
    Trip,
    Dinner,
    #[serde(rename = "Monthly Bills")]
    MonthlyBills,
    Event,
    Other,
}

impl GroupCategory {
    pub const ALL: [GroupCategory; 6] = [
        GroupCategory::General,
        GroupCategory::Trip,
        GroupCategory::Dinner,
        GroupCategory::MonthlyBills,
        GroupCategory::Event,
        GroupCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupCategory::General => "General",
            GroupCategory::Trip => "Trip",
            GroupCategory::Dinner => "Dinner",
            GroupCategory::MonthlyBills => "Monthly Bills",
            GroupCategory::Event => "Event",
            GroupCategory::Other => "Other",
        }
    }

    /// Case-insensitive; unknown names map to None
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// A group to be saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
    pub category: GroupCategory,
    pub members: Vec<Contribution>,
    pub fairness_score: f64,
    pub total_amount: f64,
}

impl NewGroup {
    /// Build a group from an analysis. Name is trimmed and must not be
    /// empty; a blank description is stored as None.
    pub fn from_analysis(
        name: &str,
        description: Option<&str>,
        category: GroupCategory,
        analysis: &Analysis,
    ) -> Result<Self> {
        let group = NewGroup {
            name: name.trim().to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            category,
            members: analysis.members.clone(),
            fairness_score: analysis.report.score,
            total_amount: analysis.total,
        };
        group.validate()?;
        Ok(group)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Please enter a group name");
        }
        Ok(())
    }
}

/// History entry without members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: GroupCategory,
    pub created_at: DateTime<Utc>,
    pub fairness_score: f64,
    pub total_amount: f64,
}

impl GroupSummary {
    pub fn summary(&self) -> String {
        format!(
            "#{} {} [{}] total {:.2}, fairness {:.0}%, {}",
            self.id,
            self.name,
            self.category.as_str(),
            self.total_amount,
            self.fairness_score,
            self.created_at.format("%Y-%m-%d")
        )
    }
}

/// Full saved group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    #[serde(flatten)]
    pub summary: GroupSummary,
    pub members: Vec<Contribution>,
}

// ============================================================================
// STORE TRAIT
// ============================================================================

pub trait GroupStore {
    /// Persist a group, returning its id
    fn save_group(&self, group: &NewGroup) -> Result<i64>;

    /// All saved groups, newest first
    fn list_groups(&self) -> Result<Vec<GroupSummary>>;

    /// A saved group with its members
    fn get_group(&self, id: i64) -> Result<Option<GroupRecord>>;

    /// Remove a group; false if it did not exist
    fn delete_group(&self, id: i64) -> Result<bool>;

    /// Members of a saved group
    fn load_group(&self, id: i64) -> Result<Option<Vec<Contribution>>> {
        Ok(self.get_group(id)?.map(|g| g.members))
    }
}

/// Pick the backend from configuration: SQLite when a database path is
/// set, the JSON document otherwise.
pub fn open_store(config: &Config) -> Result<Box<dyn GroupStore + Send>> {
    match &config.database_path {
        Some(path) => {
            info!(path = %path.display(), "using SQLite group store");
            Ok(Box::new(SqliteStore::open(path)?))
        }
        None => {
            info!(path = %config.json_path.display(), "using JSON group store");
            Ok(Box::new(JsonStore::open(&config.json_path)))
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

/// Behaviour every backend must share
#[cfg(test)]
pub(crate) mod contract {
    use super::*;

    pub fn sample_group(name: &str, amounts: &[(&str, f64)]) -> NewGroup {
        let members: Vec<Contribution> = amounts
            .iter()
            .map(|(n, a)| Contribution::new(n, *a).unwrap())
            .collect();
        let analysis = crate::analysis::analyze(&members).unwrap();
        NewGroup::from_analysis(name, Some("notes"), GroupCategory::Trip, &analysis).unwrap()
    }

    pub fn save_list_load_delete(store: &dyn GroupStore) {
        let first = sample_group("Weekend Trip", &[("Alice", 30.0), ("Bob", 10.0)]);
        let second = sample_group("Dinner", &[("Carol", 12.5), ("Dan", 12.5), ("Eve", 0.0)]);

        let id1 = store.save_group(&first).unwrap();
        let id2 = store.save_group(&second).unwrap();
        assert_ne!(id1, id2);

        let groups = store.list_groups().unwrap();
        assert_eq!(groups.len(), 2);
        // Newest first
        assert_eq!(groups[0].id, id2);
        assert_eq!(groups[1].id, id1);
        assert_eq!(groups[1].name, "Weekend Trip");
        assert_eq!(groups[1].category, GroupCategory::Trip);
        assert_eq!(groups[1].description.as_deref(), Some("notes"));
        assert_eq!(groups[1].total_amount, 40.0);

        let members = store.load_group(id2).unwrap().unwrap();
        let names: Vec<&str> = members.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["Carol", "Dan", "Eve"]);
        assert_eq!(members[0].amount(), 12.5);

        let record = store.get_group(id1).unwrap().unwrap();
        assert_eq!(record.summary.name, "Weekend Trip");
        assert_eq!(record.members.len(), 2);

        assert!(store.load_group(9999).unwrap().is_none());

        assert!(store.delete_group(id1).unwrap());
        assert!(!store.delete_group(id1).unwrap());
        assert!(store.get_group(id1).unwrap().is_none());
        assert_eq!(store.list_groups().unwrap().len(), 1);

        // New ids stay unique after a delete
        let id3 = store.save_group(&first).unwrap();
        assert!(id3 != id2 && id3 != id1);
    }
}

#[cfg(test)]
mod tests {
    use super::contract::sample_group;
    use super::*;

    #[test]
    fn test_summary_line_has_no_currency_symbol() {
        let summary = GroupSummary {
            id: 7,
            name: "Lisbon".to_string(),
            description: None,
            category: GroupCategory::Trip,
            created_at: chrono::TimeZone::with_ymd_and_hms(&Utc, 2025, 5, 4, 10, 0, 0).unwrap(),
            fairness_score: 82.4,
            total_amount: 1250.5,
        };

        assert_eq!(
            summary.summary(),
            "#7 Lisbon [Trip] total 1250.50, fairness 82%, 2025-05-04"
        );
    }

    #[test]
    fn test_group_category_names() {
        assert_eq!(GroupCategory::MonthlyBills.as_str(), "Monthly Bills");
        assert_eq!(
            GroupCategory::parse("monthly bills"),
            Some(GroupCategory::MonthlyBills)
        );
        assert_eq!(GroupCategory::parse("Groceries"), None);

        let json = serde_json::to_string(&GroupCategory::MonthlyBills).unwrap();
        assert_eq!(json, "\"Monthly Bills\"");
    }

    #[test]
    fn test_new_group_from_analysis() {
        let group = sample_group("  Trip  ", &[("A", 30.0), ("B", 10.0)]);

        assert_eq!(group.name, "Trip");
        assert_eq!(group.total_amount, 40.0);
        assert_eq!(group.fairness_score, 0.0);
        assert_eq!(group.members.len(), 2);
    }

    #[test]
    fn test_new_group_requires_name() {
        let members = vec![Contribution::new("A", 1.0).unwrap()];
        let analysis = crate::analysis::analyze(&members).unwrap();

        let err = NewGroup::from_analysis("   ", None, GroupCategory::General, &analysis);
        assert!(err.is_err());

        let ok = NewGroup::from_analysis("Ok", Some("  "), GroupCategory::General, &analysis)
            .unwrap();
        assert!(ok.description.is_none());
    }

    #[test]
    fn test_open_store_picks_backend() {
        let dir = std::env::temp_dir().join(format!("fair-split-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let json_config = Config {
            json_path: dir.join("groups.json"),
            ..Config::default()
        };
        let store = open_store(&json_config).unwrap();
        store.save_group(&sample_group("J", &[("A", 1.0)])).unwrap();
        assert!(dir.join("groups.json").exists());

        let sqlite_config = Config {
            database_path: Some(dir.join("groups.db")),
            ..Config::default()
        };
        let store = open_store(&sqlite_config).unwrap();
        store.save_group(&sample_group("S", &[("A", 1.0)])).unwrap();
        assert!(dir.join("groups.db").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
