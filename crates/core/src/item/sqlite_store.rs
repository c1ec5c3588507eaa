//! SQLite-backed item store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::store::{ItemFilter, ItemStore, OwnerCount, StateCount, StoreError};
use super::types::{ItemState, NewItem, WorkItem};

const ITEM_COLUMNS: &str = "id, original_name, title, description, state, source_path, \
     staging_ref, published_url, error, owner, created_at, updated_at";

/// SQLite-backed item store.
pub struct SqliteItemStore {
    conn: Mutex<Connection>,
}

impl SqliteItemStore {
    /// Create a new SQLite item store, creating the database file and
    /// tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite item store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                original_name TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                state TEXT NOT NULL,
                source_path TEXT,
                staging_ref TEXT,
                published_url TEXT,
                error TEXT,
                owner TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_items_state ON items(state);
            CREATE INDEX IF NOT EXISTS idx_items_owner ON items(owner);
            CREATE INDEX IF NOT EXISTS idx_items_created_at ON items(created_at);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn build_where_clause(filter: &ItemFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(state) = filter.state {
            conditions.push("state = ?");
            params.push(Box::new(state.as_str().to_string()));
        }

        if let Some(ref owner) = filter.owner {
            conditions.push("owner = ?");
            params.push(Box::new(owner.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<WorkItem> {
        let state_str: String = row.get(4)?;
        let created_at_str: String = row.get(10)?;
        let updated_at_str: String = row.get(11)?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(WorkItem {
            id: row.get(0)?,
            original_name: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            state: ItemState::parse(&state_str).unwrap_or(ItemState::Failed),
            source_path: row.get(5)?,
            staging_ref: row.get(6)?,
            published_url: row.get(7)?,
            error: row.get(8)?,
            owner: row.get(9)?,
            created_at,
            updated_at,
        })
    }

    fn get_locked(conn: &Connection, id: &str) -> Result<WorkItem, StoreError> {
        let sql = format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS);
        conn.query_row(&sql, params![id], Self::row_to_item)
            .optional()
            .map_err(|e| StoreError::Database(e.to_string()))?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Applies a single-column patch and returns the updated record.
    fn patch_column(&self, id: &str, column: &str, value: &str) -> Result<WorkItem, StoreError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        let sql = format!("UPDATE items SET {} = ?, updated_at = ? WHERE id = ?", column);
        let changed = conn
            .execute(&sql, params![value, now.to_rfc3339(), id])
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Self::get_locked(&conn, id)
    }
}

impl ItemStore for SqliteItemStore {
    fn create(&self, request: NewItem) -> Result<WorkItem, StoreError> {
        let conn = self.conn.lock().unwrap();

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let state = ItemState::Pending;

        conn.execute(
            "INSERT INTO items (id, original_name, title, description, state, source_path, \
             staging_ref, published_url, error, owner, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, NULL, NULL, NULL, ?, ?, ?)",
            params![
                id,
                request.original_name,
                request.title,
                request.description,
                state.as_str(),
                request.source_path,
                request.owner,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(WorkItem {
            id,
            original_name: request.original_name,
            title: request.title,
            description: request.description,
            state,
            source_path: Some(request.source_path),
            staging_ref: None,
            published_url: None,
            error: None,
            owner: request.owner,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<WorkItem>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS);
        conn.query_row(&sql, params![id], Self::row_to_item)
            .optional()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn list(&self, filter: &ItemFilter) -> Result<Vec<WorkItem>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM items {} ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?",
            ITEM_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_item)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut items = Vec::new();
        for row_result in rows {
            let item = row_result.map_err(|e| StoreError::Database(e.to_string()))?;
            items.push(item);
        }

        Ok(items)
    }

    fn count(&self, filter: &ItemFilter) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM items {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn update_state(&self, id: &str, new_state: ItemState) -> Result<WorkItem, StoreError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::get_locked(&conn, id)?;
        if current.state.is_terminal() {
            return Err(StoreError::InvalidState {
                item_id: id.to_string(),
                current_state: current.state.to_string(),
                operation: format!("move to {}", new_state),
            });
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE items SET state = ?, updated_at = ? WHERE id = ?",
            params![new_state.as_str(), now.to_rfc3339(), id],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(WorkItem {
            state: new_state,
            updated_at: now,
            ..current
        })
    }

    fn set_staging_ref(&self, id: &str, staging_ref: &str) -> Result<WorkItem, StoreError> {
        self.patch_column(id, "staging_ref", staging_ref)
    }

    fn set_published_url(&self, id: &str, url: &str) -> Result<WorkItem, StoreError> {
        self.patch_column(id, "published_url", url)
    }

    fn clear_source_path(&self, id: &str) -> Result<WorkItem, StoreError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        let changed = conn
            .execute(
                "UPDATE items SET source_path = NULL, updated_at = ? WHERE id = ?",
                params![now.to_rfc3339(), id],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Self::get_locked(&conn, id)
    }

    fn mark_failed(&self, id: &str, reason: &str) -> Result<WorkItem, StoreError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::get_locked(&conn, id)?;
        if current.state.is_terminal() {
            return Err(StoreError::InvalidState {
                item_id: id.to_string(),
                current_state: current.state.to_string(),
                operation: "fail".to_string(),
            });
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE items SET state = ?, error = ?, updated_at = ? WHERE id = ?",
            params![ItemState::Failed.as_str(), reason, now.to_rfc3339(), id],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(WorkItem {
            state: ItemState::Failed,
            error: Some(reason.to_string()),
            updated_at: now,
            ..current
        })
    }

    fn claim_next_edited(&self) -> Result<Option<WorkItem>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        // Single indivisible read-modify-write: selection and reservation
        // happen in one statement, so concurrent triggers (including other
        // process instances sharing the database file) cannot both claim
        // the same item. A separate read-then-write would race here.
        let sql = format!(
            "UPDATE items SET state = ?1, updated_at = ?2 \
             WHERE id = (SELECT id FROM items WHERE state = ?3 \
                         ORDER BY created_at ASC, id ASC LIMIT 1) \
               AND state = ?3 \
             RETURNING {}",
            ITEM_COLUMNS
        );

        conn.query_row(
            &sql,
            params![
                ItemState::ProcessingPublish.as_str(),
                now.to_rfc3339(),
                ItemState::Edited.as_str(),
            ],
            Self::row_to_item,
        )
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn counts_by_state(&self) -> Result<Vec<StateCount>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT state, COUNT(*) FROM items GROUP BY state ORDER BY state")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let state_str: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((state_str, count))
            })
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut counts = Vec::new();
        for row_result in rows {
            let (state_str, count) = row_result.map_err(|e| StoreError::Database(e.to_string()))?;
            if let Some(state) = ItemState::parse(&state_str) {
                counts.push(StateCount { state, count });
            }
        }

        Ok(counts)
    }

    fn uploaded_counts_by_owner(&self) -> Result<Vec<OwnerCount>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT owner, COUNT(*) FROM items WHERE state = ? \
                 GROUP BY owner ORDER BY owner",
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![ItemState::Uploaded.as_str()], |row| {
                Ok(OwnerCount {
                    owner: row.get(0)?,
                    count: row.get(1)?,
                })
            })
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut counts = Vec::new();
        for row_result in rows {
            counts.push(row_result.map_err(|e| StoreError::Database(e.to_string()))?);
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteItemStore {
        SqliteItemStore::in_memory().unwrap()
    }

    fn create_test_request() -> NewItem {
        NewItem {
            original_name: "clip.mp4".to_string(),
            title: "clip".to_string(),
            description: "Follow me!".to_string(),
            source_path: "/tmp/uploads/clip.mp4".to_string(),
            owner: "test-user".to_string(),
        }
    }

    #[test]
    fn test_create_item() {
        let store = create_test_store();
        let item = store.create(create_test_request()).unwrap();

        assert!(!item.id.is_empty());
        assert_eq!(item.state, ItemState::Pending);
        assert_eq!(item.title, "clip");
        assert!(item.staging_ref.is_none());
        assert!(item.published_url.is_none());
    }

    #[test]
    fn test_get_nonexistent_item() {
        let store = create_test_store();
        assert!(store.get("nonexistent-id").unwrap().is_none());
    }

    #[test]
    fn test_list_fifo_order() {
        let store = create_test_store();

        // Same-instant submissions must keep a stable, deterministic
        // order: the id tie-breaker removes any ambiguity.
        let first = store.create(create_test_request()).unwrap();
        let second = store.create(create_test_request()).unwrap();
        let third = store.create(create_test_request()).unwrap();

        assert_ne!(first.id, second.id);
        assert_ne!(second.id, third.id);

        let items = store.list(&ItemFilter::new()).unwrap();
        assert_eq!(items.len(), 3);
        for window in items.windows(2) {
            assert!(
                (window[0].created_at, &window[0].id) <= (window[1].created_at, &window[1].id)
            );
        }
    }

    #[test]
    fn test_list_with_state_filter() {
        let store = create_test_store();

        store.create(create_test_request()).unwrap();
        let second = store.create(create_test_request()).unwrap();
        store.update_state(&second.id, ItemState::Editing).unwrap();

        let pending = store
            .list(&ItemFilter::new().with_state(ItemState::Pending))
            .unwrap();
        assert_eq!(pending.len(), 1);

        let editing = store
            .list(&ItemFilter::new().with_state(ItemState::Editing))
            .unwrap();
        assert_eq!(editing.len(), 1);
    }

    #[test]
    fn test_count_with_filter() {
        let store = create_test_store();

        for _ in 0..3 {
            store.create(create_test_request()).unwrap();
        }

        assert_eq!(store.count(&ItemFilter::new()).unwrap(), 3);
        assert_eq!(
            store
                .count(&ItemFilter::new().with_state(ItemState::Edited))
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_update_state_persists() {
        let store = create_test_store();
        let item = store.create(create_test_request()).unwrap();

        let updated = store.update_state(&item.id, ItemState::Editing).unwrap();
        assert_eq!(updated.state, ItemState::Editing);

        let fetched = store.get(&item.id).unwrap().unwrap();
        assert_eq!(fetched.state, ItemState::Editing);
    }

    #[test]
    fn test_terminal_states_are_never_exited() {
        let store = create_test_store();
        let item = store.create(create_test_request()).unwrap();

        store.mark_failed(&item.id, "edit crashed").unwrap();

        let result = store.update_state(&item.id, ItemState::Editing);
        assert!(matches!(result, Err(StoreError::InvalidState { .. })));

        let result = store.mark_failed(&item.id, "again");
        assert!(matches!(result, Err(StoreError::InvalidState { .. })));
    }

    #[test]
    fn test_mark_failed_records_reason() {
        let store = create_test_store();
        let item = store.create(create_test_request()).unwrap();

        let failed = store.mark_failed(&item.id, "input too short").unwrap();
        assert_eq!(failed.state, ItemState::Failed);
        assert_eq!(failed.error.as_deref(), Some("input too short"));
    }

    #[test]
    fn test_staging_ref_and_published_url() {
        let store = create_test_store();
        let item = store.create(create_test_request()).unwrap();

        let updated = store.set_staging_ref(&item.id, "stage-abc123").unwrap();
        assert_eq!(updated.staging_ref.as_deref(), Some("stage-abc123"));

        let updated = store
            .set_published_url(&item.id, "https://video.example/watch?v=xyz")
            .unwrap();
        assert_eq!(
            updated.published_url.as_deref(),
            Some("https://video.example/watch?v=xyz")
        );
    }

    #[test]
    fn test_clear_source_path() {
        let store = create_test_store();
        let item = store.create(create_test_request()).unwrap();
        assert!(item.source_path.is_some());

        let updated = store.clear_source_path(&item.id).unwrap();
        assert!(updated.source_path.is_none());
    }

    #[test]
    fn test_claim_with_nothing_eligible() {
        let store = create_test_store();
        store.create(create_test_request()).unwrap();

        // Only a pending item exists; nothing is claimable.
        assert!(store.claim_next_edited().unwrap().is_none());
    }

    #[test]
    fn test_claim_takes_oldest_edited() {
        let store = create_test_store();

        let first = store.create(create_test_request()).unwrap();
        let second = store.create(create_test_request()).unwrap();
        for id in [&first.id, &second.id] {
            store.update_state(id, ItemState::Editing).unwrap();
            store.update_state(id, ItemState::Edited).unwrap();
        }

        let claimed = store.claim_next_edited().unwrap().unwrap();
        assert_eq!(claimed.id, first.id);
        assert_eq!(claimed.state, ItemState::ProcessingPublish);

        // Second claim takes the next item, not the same one again.
        let claimed = store.claim_next_edited().unwrap().unwrap();
        assert_eq!(claimed.id, second.id);

        assert!(store.claim_next_edited().unwrap().is_none());
    }

    #[test]
    fn test_counts_by_state() {
        let store = create_test_store();

        let first = store.create(create_test_request()).unwrap();
        store.create(create_test_request()).unwrap();
        store.update_state(&first.id, ItemState::Editing).unwrap();

        let counts = store.counts_by_state().unwrap();
        let get = |s: ItemState| {
            counts
                .iter()
                .find(|c| c.state == s)
                .map(|c| c.count)
                .unwrap_or(0)
        };
        assert_eq!(get(ItemState::Pending), 1);
        assert_eq!(get(ItemState::Editing), 1);
    }

    #[test]
    fn test_uploaded_counts_by_owner() {
        let store = create_test_store();

        let mut request = create_test_request();
        request.owner = "alice".to_string();
        let item = store.create(request).unwrap();
        for state in [
            ItemState::Editing,
            ItemState::Edited,
            ItemState::ProcessingPublish,
            ItemState::Uploaded,
        ] {
            store.update_state(&item.id, state).unwrap();
        }

        let mut request = create_test_request();
        request.owner = "bob".to_string();
        store.create(request).unwrap();

        let counts = store.uploaded_counts_by_owner().unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].owner, "alice");
        assert_eq!(counts[0].count, 1);
    }

    #[test]
    fn test_file_based_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("items.db");

        let store = SqliteItemStore::new(&db_path).unwrap();
        let item = store.create(create_test_request()).unwrap();

        assert!(db_path.exists());
        assert!(store.get(&item.id).unwrap().is_some());
    }
}
