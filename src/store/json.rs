// 📄 JSON Group Store - Local flat-file history
//
// Document shape (pretty-printed):
//   { "groups": [ {id, name, description, category, created_at,
//                  fairness_score, total_amount, members}, ... ],
//     "templates": [] }
//
// A missing file reads as an empty document. Every write rewrites the whole
// file through a temp file + rename.

use super::{GroupRecord, GroupStore, GroupSummary, NewGroup};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    groups: Vec<GroupRecord>,
    #[serde(default)]
    templates: Vec<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn open(path: &Path) -> Self {
        JsonStore {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Document> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "JSON store missing, starting empty");
            return Ok(Document::default());
        }

        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn write(&self, doc: &Document) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(doc)?;
        std::fs::write(&tmp, text)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }
}

impl GroupStore for JsonStore {
    fn save_group(&self, group: &NewGroup) -> Result<i64> {
        group.validate()?;

        let mut doc = self.read()?;
        let id = doc.groups.iter().map(|g| g.summary.id).max().unwrap_or(0) + 1;

        doc.groups.push(GroupRecord {
            summary: GroupSummary {
                id,
                name: group.name.clone(),
                description: group.description.clone(),
                category: group.category,
                created_at: Utc::now(),
                fairness_score: group.fairness_score,
                total_amount: group.total_amount,
            },
            members: group.members.clone(),
        });
        self.write(&doc)?;

        info!(id, name = %group.name, members = group.members.len(), "saved group to JSON store");
        Ok(id)
    }

    fn list_groups(&self) -> Result<Vec<GroupSummary>> {
        let mut groups: Vec<GroupSummary> = self
            .read()?
            .groups
            .into_iter()
            .map(|g| g.summary)
            .collect();

        groups.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(groups)
    }

    fn get_group(&self, id: i64) -> Result<Option<GroupRecord>> {
        Ok(self
            .read()?
            .groups
            .into_iter()
            .find(|g| g.summary.id == id))
    }

    fn delete_group(&self, id: i64) -> Result<bool> {
        let mut doc = self.read()?;
        let before = doc.groups.len();
        doc.groups.retain(|g| g.summary.id != id);

        if doc.groups.len() == before {
            return Ok(false);
        }

        self.write(&doc)?;
        info!(id, "deleted group from JSON store");
        Ok(true)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("fair-split-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_json_store_contract() {
        let path = temp_path();
        let store = JsonStore::open(&path);

        contract::save_list_load_delete(&store);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_empty() {
        let store = JsonStore::open(&temp_path());

        assert!(store.list_groups().unwrap().is_empty());
        assert!(store.get_group(1).unwrap().is_none());
        assert!(!store.delete_group(1).unwrap());
    }

    #[test]
    fn test_document_shape_and_templates_preserved() {
        let path = temp_path();
        std::fs::write(
            &path,
            r#"{"groups": [], "templates": [{"name": "Rent split"}]}"#,
        )
        .unwrap();

        let store = JsonStore::open(&path);
        let id = store
            .save_group(&contract::sample_group("Trip", &[("A", 3.0), ("B", 1.0)]))
            .unwrap();
        assert_eq!(id, 1);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["templates"][0]["name"], "Rent split");
        assert_eq!(raw["groups"][0]["id"], 1);
        assert_eq!(raw["groups"][0]["name"], "Trip");
        assert_eq!(raw["groups"][0]["category"], "Trip");
        assert_eq!(raw["groups"][0]["total_amount"], 4.0);
        assert_eq!(raw["groups"][0]["members"][0]["name"], "A");
        assert_eq!(raw["groups"][0]["members"][0]["amount"], 3.0);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = temp_path();
        std::fs::write(&path, "not json").unwrap();

        let store = JsonStore::open(&path);
        assert!(store.list_groups().is_err());

        std::fs::remove_file(&path).unwrap();
    }
}
