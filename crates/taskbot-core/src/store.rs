//! SQLite persistence for tasks.
//!
//! `TaskStore` is the only owner of the database connection and of the
//! `tasks` table. It holds at most one connection for the process lifetime;
//! every operation takes the lock for a single short request/response.

use std::path::{Path, PathBuf};

use chrono::Local;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;
use tracing::{debug, info, Span};

use crate::{
    domain::UserId,
    errors::Error,
    task::{normalize_text, Task},
    Result,
};

const SCHEMA_TASKS: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    user_id INTEGER NOT NULL,
    created_at TEXT NOT NULL
);";
const INSERT_TASK: &str = "INSERT INTO tasks (text, user_id, created_at) VALUES (?1, ?2, ?3)";
const SELECT_USER_TASKS: &str = "SELECT id, text, user_id, created_at FROM tasks
    WHERE user_id = ?1
    ORDER BY created_at ASC, id ASC";

pub struct TaskStore {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
    span: Span,
}

impl TaskStore {
    /// Create a store for the database file at `path` (`:memory:` is accepted).
    ///
    /// No connection is opened until [`TaskStore::connect`] or the first query.
    pub fn new(path: impl Into<PathBuf>, span: Span) -> Self {
        Self {
            path: path.into(),
            conn: Mutex::new(None),
            span,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Open the connection if none is open. Repeated calls are no-ops.
    pub async fn connect(&self) -> Result<()> {
        let mut guard = self.conn.lock().await;
        self.open_locked(&mut guard)?;
        Ok(())
    }

    /// Ensure the `tasks` table exists.
    pub async fn create_schema(&self) -> Result<()> {
        let mut guard = self.conn.lock().await;
        let conn = self.open_locked(&mut guard)?;
        conn.execute_batch(SCHEMA_TASKS)?;
        self.span.in_scope(|| info!("tasks table checked/created"));
        Ok(())
    }

    /// Insert a task for `user_id` and return the id assigned by SQLite.
    ///
    /// Blank text is rejected with [`Error::Validation`] before the database
    /// is touched.
    pub async fn add_task(&self, text: &str, user_id: UserId) -> Result<i64> {
        let text = normalize_text(text)?;
        let created_at = now_iso();

        let mut guard = self.conn.lock().await;
        let conn = self.open_locked(&mut guard)?;
        conn.execute(INSERT_TASK, params![text, user_id.0, created_at])?;
        let task_id = conn.last_insert_rowid();

        self.span.in_scope(|| info!(task_id, user_id = user_id.0, "task added"));
        Ok(task_id)
    }

    /// All tasks owned by `user_id`, oldest first. Empty when the user has none.
    pub async fn user_tasks(&self, user_id: UserId) -> Result<Vec<Task>> {
        let mut guard = self.conn.lock().await;
        let conn = self.open_locked(&mut guard)?;

        let mut stmt = conn.prepare(SELECT_USER_TASKS)?;
        let rows = stmt.query_map(params![user_id.0], |row| {
            Ok(Task::new(
                row.get(0)?,
                row.get(1)?,
                UserId(row.get(2)?),
                row.get(3)?,
            ))
        })?;
        let tasks = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        self.span.in_scope(|| {
            info!(
                count = tasks.len(),
                user_id = user_id.0,
                "loaded user tasks"
            )
        });
        Ok(tasks)
    }

    /// Release the connection if one is open. Repeated calls are no-ops.
    pub async fn close(&self) -> Result<()> {
        let mut guard = self.conn.lock().await;
        let Some(conn) = guard.take() else {
            return Ok(());
        };
        conn.close().map_err(|(_, e)| Error::Database(e))?;
        self.span.in_scope(|| info!("database connection closed"));
        Ok(())
    }

    fn open_locked<'a>(&self, slot: &'a mut Option<Connection>) -> Result<&'a Connection> {
        if slot.is_none() {
            let conn = Connection::open(&self.path)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            *slot = Some(conn);
            self.span.in_scope(|| {
                info!(path = %self.path.display(), "database connection established")
            });
        } else {
            self.span.in_scope(|| debug!("reusing open database connection"));
        }
        slot.as_ref()
            .ok_or_else(|| Error::External("database connection unavailable".to_string()))
    }
}

/// Creation timestamp: local wall clock, ISO-8601 with microseconds.
fn now_iso() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> TaskStore {
        let store = TaskStore::new(":memory:", Span::none());
        store.create_schema().await.unwrap();
        store
    }

    fn temp_db(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("taskbot-store-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{name}.db"));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[tokio::test]
    async fn added_task_is_listed_trimmed_for_its_owner() {
        let store = memory_store().await;
        let id = store.add_task("  buy milk  ", UserId(42)).await.unwrap();
        assert!(id > 0);

        let tasks = store.user_tasks(UserId(42)).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id(), id);
        assert_eq!(tasks[0].text(), "buy milk");
        assert_eq!(tasks[0].user_id(), UserId(42));
        assert!(!tasks[0].created_at().is_empty());
    }

    #[tokio::test]
    async fn blank_text_is_rejected_without_creating_rows() {
        let store = memory_store().await;
        assert!(store.add_task("", UserId(1)).await.unwrap_err().is_validation());
        assert!(store
            .add_task("   ", UserId(1))
            .await
            .unwrap_err()
            .is_validation());
        assert!(store.user_tasks(UserId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_text_does_not_open_a_connection() {
        let store = TaskStore::new(":memory:", Span::none());
        let err = store.add_task(" \n", UserId(1)).await.unwrap_err();
        assert!(err.is_validation());
        assert!(!store.is_connected().await);
    }

    #[tokio::test]
    async fn user_without_tasks_gets_empty_list() {
        let store = memory_store().await;
        store.add_task("someone else's", UserId(2)).await.unwrap();
        assert!(store.user_tasks(UserId(99)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn tasks_come_back_in_insertion_order() {
        let store = memory_store().await;
        for text in ["A", "B", "C"] {
            store.add_task(text, UserId(5)).await.unwrap();
        }
        store.add_task("other", UserId(6)).await.unwrap();

        let texts: Vec<String> = store
            .user_tasks(UserId(5))
            .await
            .unwrap()
            .iter()
            .map(|t| t.text().to_string())
            .collect();
        assert_eq!(texts, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn ids_increase_across_users() {
        let store = memory_store().await;
        let a = store.add_task("one", UserId(1)).await.unwrap();
        let b = store.add_task("two", UserId(2)).await.unwrap();
        let c = store.add_task("three", UserId(1)).await.unwrap();
        assert!(a < b && b < c);
    }

    #[tokio::test]
    async fn negative_and_large_user_ids_are_accepted() {
        let store = memory_store().await;
        store.add_task("group chat", UserId(-100_123)).await.unwrap();
        store.add_task("big", UserId(i64::MAX)).await.unwrap();
        assert_eq!(store.user_tasks(UserId(-100_123)).await.unwrap().len(), 1);
        assert_eq!(store.user_tasks(UserId(i64::MAX)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn connect_twice_keeps_the_same_connection() {
        let store = memory_store().await;
        store.add_task("kept", UserId(3)).await.unwrap();

        // A second connection to `:memory:` would be a fresh, empty database.
        store.connect().await.unwrap();
        store.connect().await.unwrap();

        let tasks = store.user_tasks(UserId(3)).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text(), "kept");
    }

    #[tokio::test]
    async fn create_schema_is_idempotent() {
        let store = memory_store().await;
        store.add_task("survives", UserId(4)).await.unwrap();
        store.create_schema().await.unwrap();
        assert_eq!(store.user_tasks(UserId(4)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn close_is_idempotent_and_queries_reconnect() {
        let path = temp_db("reconnect");
        let store = TaskStore::new(&path, Span::none());
        store.create_schema().await.unwrap();
        store.add_task("persisted", UserId(8)).await.unwrap();

        store.close().await.unwrap();
        store.close().await.unwrap();
        assert!(!store.is_connected().await);

        let tasks = store.user_tasks(UserId(8)).await.unwrap();
        assert!(store.is_connected().await);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text(), "persisted");

        store.close().await.unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn unopenable_path_is_a_storage_error() {
        let path = std::env::temp_dir()
            .join(format!("taskbot-missing-{}", std::process::id()))
            .join("nested")
            .join("tasks.db");
        let store = TaskStore::new(&path, Span::none());
        let err = store.connect().await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn timestamps_are_iso_with_microseconds() {
        let ts = now_iso();
        assert_eq!(ts.len(), "2024-01-01T00:00:00.000000".len());
        assert_eq!(&ts[10..11], "T");
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
    }
}
