// 🗃️ SQLite Group Store - Relational history backend
//
// Tables:
//   expense_groups (id, name, description, category, created_at, fairness_score, total_amount)
//   group_members  (id, group_id → expense_groups.id ON DELETE CASCADE, position, name, amount, currency)

use super::{GroupCategory, GroupRecord, GroupStore, GroupSummary, NewGroup};
use crate::contribution::Contribution;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::info;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn count_groups(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM expense_groups", [], |row| row.get(0))?;
        Ok(count)
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL for crash recovery; in-memory databases stay in "memory" mode
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS expense_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            category TEXT,
            created_at TEXT NOT NULL,
            fairness_score REAL,
            total_amount REAL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS group_members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL REFERENCES expense_groups(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            amount REAL NOT NULL,
            currency TEXT NOT NULL DEFAULT '$'
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_group_members_group ON group_members(group_id, position)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_groups_created_at ON expense_groups(created_at)",
        [],
    )?;

    Ok(())
}

fn summary_from_row(row: &Row) -> rusqlite::Result<GroupSummary> {
    let category: Option<String> = row.get(3)?;
    let created_at_str: String = row.get(4)?;
    let fairness_score: Option<f64> = row.get(5)?;
    let total_amount: Option<f64> = row.get(6)?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(GroupSummary {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: category
            .as_deref()
            .and_then(GroupCategory::parse)
            .unwrap_or_default(),
        created_at,
        fairness_score: fairness_score.unwrap_or(0.0),
        total_amount: total_amount.unwrap_or(0.0),
    })
}

impl GroupStore for SqliteStore {
    fn save_group(&self, group: &NewGroup) -> Result<i64> {
        group.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        tx.execute(
            "INSERT INTO expense_groups (name, description, category, created_at, fairness_score, total_amount)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                group.name,
                group.description,
                group.category.as_str(),
                created_at,
                group.fairness_score,
                group.total_amount,
            ],
        )?;
        let group_id = tx.last_insert_rowid();

        for (position, member) in group.members.iter().enumerate() {
            tx.execute(
                "INSERT INTO group_members (group_id, position, name, amount, currency)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    group_id,
                    position as i64,
                    member.name(),
                    member.amount(),
                    member.currency(),
                ],
            )?;
        }

        tx.commit()?;

        info!(id = group_id, name = %group.name, members = group.members.len(), "saved group to SQLite store");
        Ok(group_id)
    }

    fn list_groups(&self) -> Result<Vec<GroupSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, category, created_at, fairness_score, total_amount
             FROM expense_groups
             ORDER BY created_at DESC, id DESC",
        )?;

        let groups = stmt
            .query_map([], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(groups)
    }

    fn get_group(&self, id: i64) -> Result<Option<GroupRecord>> {
        let summary = self
            .conn
            .query_row(
                "SELECT id, name, description, category, created_at, fairness_score, total_amount
                 FROM expense_groups
                 WHERE id = ?1",
                [id],
                summary_from_row,
            )
            .optional()?;

        let summary = match summary {
            Some(summary) => summary,
            None => return Ok(None),
        };

        let mut stmt = self.conn.prepare(
            "SELECT name, amount, currency
             FROM group_members
             WHERE group_id = ?1
             ORDER BY position",
        )?;

        let rows = stmt
            .query_map([id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let members = rows
            .iter()
            .map(|(name, amount, currency)| Contribution::with_currency(name, *amount, currency))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Group {} has an invalid member row", id))?;

        Ok(Some(GroupRecord { summary, members }))
    }

    fn delete_group(&self, id: i64) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM expense_groups WHERE id = ?1", [id])?;

        if deleted > 0 {
            info!(id, "deleted group from SQLite store");
        }
        Ok(deleted > 0)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;

    #[test]
    fn test_sqlite_store_contract() {
        let store = SqliteStore::open_in_memory().unwrap();

        contract::save_list_load_delete(&store);
    }

    #[test]
    fn test_delete_cascades_to_members() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store
            .save_group(&contract::sample_group("Trip", &[("A", 3.0), ("B", 1.0)]))
            .unwrap();

        store.delete_group(id).unwrap();

        let remaining: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM group_members", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
        assert_eq!(store.count_groups().unwrap(), 0);
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();
    }

    #[test]
    fn test_rejects_unnamed_group() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut group = contract::sample_group("Trip", &[("A", 3.0)]);
        group.name = "  ".to_string();

        assert!(store.save_group(&group).is_err());
        assert_eq!(store.count_groups().unwrap(), 0);
    }

    #[test]
    fn test_unknown_category_reads_as_general() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO expense_groups (name, description, category, created_at, fairness_score, total_amount)
                 VALUES ('Legacy', NULL, NULL, '2024-06-01T12:00:00Z', NULL, NULL)",
                [],
            )
            .unwrap();

        let groups = store.list_groups().unwrap();
        assert_eq!(groups[0].category, GroupCategory::General);
        assert_eq!(groups[0].fairness_score, 0.0);
        assert!(store.load_group(groups[0].id).unwrap().unwrap().is_empty());
    }
}
