use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection};

use super::models::*;

/// Async-safe handle to the board database.
///
/// Wraps `BoardDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, preventing synchronous SQLite
/// I/O from tying up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<BoardDb>>,
}

impl DbHandle {
    pub fn new(db: BoardDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&BoardDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

pub struct BoardDb {
    conn: Connection,
}

impl BoardDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        // tasks.project_id carries no FOREIGN KEY clause on purpose: the
        // reference is only validated when a task is created, and a cascade
        // delete interrupted between its two statements leaves orphaned tasks.
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS projects (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    project_id INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    status TEXT NOT NULL DEFAULT 'To Do',
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    fn now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    // ── Project CRUD ──────────────────────────────────────────────────

    pub fn create_project(&self, name: &str, description: &str) -> Result<Project> {
        self.conn
            .execute(
                "INSERT INTO projects (name, description, created_at) VALUES (?1, ?2, ?3)",
                params![name, description, Self::now()],
            )
            .context("Failed to insert project")?;
        let id = self.conn.last_insert_rowid();
        self.get_project(id)?
            .context("Project not found after insert")
    }

    /// All projects, newest first.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, description, created_at FROM projects
                 ORDER BY created_at DESC, id DESC",
            )
            .context("Failed to prepare list_projects")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Project {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })
            .context("Failed to query projects")?;
        let mut projects = Vec::new();
        for row in rows {
            projects.push(row.context("Failed to read project row")?);
        }
        Ok(projects)
    }

    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, created_at FROM projects WHERE id = ?1")
            .context("Failed to prepare get_project")?;
        let mut rows = stmt
            .query_map(params![id], |row| {
                Ok(Project {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })
            .context("Failed to query project")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("Failed to read project row")?)),
            None => Ok(None),
        }
    }

    /// Update whichever of `name`/`description` are supplied. Returns `None`
    /// when the project does not exist.
    pub fn update_project(
        &self,
        id: i64,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Project>> {
        if self.get_project(id)?.is_none() {
            return Ok(None);
        }

        // unchecked_transaction is safe here: DbHandle's Mutex already
        // guarantees single-threaded access to the connection.
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;

        if let Some(n) = name {
            tx.execute(
                "UPDATE projects SET name = ?1 WHERE id = ?2",
                params![n, id],
            )
            .context("Failed to update project name")?;
        }
        if let Some(d) = description {
            tx.execute(
                "UPDATE projects SET description = ?1 WHERE id = ?2",
                params![d, id],
            )
            .context("Failed to update project description")?;
        }

        tx.commit().context("Failed to commit project update")?;
        self.get_project(id)
    }

    /// Delete a project and every task referencing it. Returns `false` when
    /// the project does not exist.
    ///
    /// The two deletes are intentionally NOT wrapped in a transaction: the
    /// cascade is a best-effort sequence (tasks first, then the project), and
    /// a failure between the steps leaves orphaned tasks behind.
    pub fn delete_project_with_tasks(&self, id: i64) -> Result<bool> {
        if self.get_project(id)?.is_none() {
            return Ok(false);
        }
        self.conn
            .execute("DELETE FROM tasks WHERE project_id = ?1", params![id])
            .context("Failed to delete project tasks")?;
        self.conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])
            .context("Failed to delete project")?;
        Ok(true)
    }

    // ── Task CRUD ─────────────────────────────────────────────────────

    pub fn create_task(
        &self,
        project_id: i64,
        title: &str,
        description: &str,
        status: TaskStatus,
    ) -> Result<Task> {
        self.conn
            .execute(
                "INSERT INTO tasks (project_id, title, description, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![project_id, title, description, status.as_str(), Self::now()],
            )
            .context("Failed to insert task")?;
        let id = self.conn.last_insert_rowid();
        self.get_task(id)?.context("Task not found after insert")
    }

    /// Tasks for a project in insertion order. An unknown project id simply
    /// yields an empty list.
    pub fn list_tasks(&self, project_id: i64) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, project_id, title, description, status, created_at
                 FROM tasks WHERE project_id = ?1 ORDER BY id",
            )
            .context("Failed to prepare list_tasks")?;
        let rows = stmt
            .query_map(params![project_id], Self::task_row)
            .context("Failed to query tasks")?;
        let mut tasks = Vec::new();
        for row in rows {
            let r = row.context("Failed to read task row")?;
            tasks.push(r.into_task()?);
        }
        Ok(tasks)
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, project_id, title, description, status, created_at
                 FROM tasks WHERE id = ?1",
            )
            .context("Failed to prepare get_task")?;
        let mut rows = stmt
            .query_map(params![id], Self::task_row)
            .context("Failed to query task")?;
        match rows.next() {
            Some(row) => {
                let r = row.context("Failed to read task row")?;
                Ok(Some(r.into_task()?))
            }
            None => Ok(None),
        }
    }

    /// Direct status set — the sole operation drag-and-drop invokes.
    /// Idempotent: moving to the current status is a no-op update.
    pub fn set_task_status(&self, id: i64, status: TaskStatus) -> Result<Option<Task>> {
        if self.get_task(id)?.is_none() {
            return Ok(None);
        }
        self.conn
            .execute(
                "UPDATE tasks SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id],
            )
            .context("Failed to move task")?;
        self.get_task(id)
    }

    /// Update whichever of `title`/`description` are supplied; absent fields
    /// are no-ops, and supplying neither returns the task unmodified.
    pub fn update_task(
        &self,
        id: i64,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Task>> {
        if self.get_task(id)?.is_none() {
            return Ok(None);
        }

        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;

        if let Some(t) = title {
            tx.execute("UPDATE tasks SET title = ?1 WHERE id = ?2", params![t, id])
                .context("Failed to update task title")?;
        }
        if let Some(d) = description {
            tx.execute(
                "UPDATE tasks SET description = ?1 WHERE id = ?2",
                params![d, id],
            )
            .context("Failed to update task description")?;
        }

        tx.commit().context("Failed to commit task update")?;
        self.get_task(id)
    }

    pub fn delete_task(&self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .context("Failed to delete task")?;
        Ok(count > 0)
    }

    fn task_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRow> {
        Ok(TaskRow {
            id: row.get(0)?,
            project_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            status: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

/// Raw task row with the status still as TEXT.
struct TaskRow {
    id: i64,
    project_id: i64,
    title: String,
    description: String,
    status: String,
    created_at: String,
}

impl TaskRow {
    fn into_task(self) -> Result<Task> {
        let status = TaskStatus::from_str(&self.status)
            .map_err(|e| anyhow::anyhow!(e))
            .context("Corrupt status in tasks table")?;
        Ok(Task {
            id: self.id,
            title: self.title,
            description: self.description,
            status,
            project_id: self.project_id,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> BoardDb {
        BoardDb::new_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_list_projects_newest_first() {
        let db = db();
        let a = db.create_project("Alpha", "first").unwrap();
        let b = db.create_project("Beta", "second").unwrap();
        let projects = db.list_projects().unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].id, b.id);
        assert_eq!(projects[1].id, a.id);
    }

    #[test]
    fn test_update_project_partial_fields() {
        let db = db();
        let p = db.create_project("Website", "Relaunch").unwrap();
        let updated = db.update_project(p.id, Some("Site"), None).unwrap().unwrap();
        assert_eq!(updated.name, "Site");
        assert_eq!(updated.description, "Relaunch");
        assert!(db.update_project(999, Some("x"), None).unwrap().is_none());
    }

    #[test]
    fn test_delete_project_cascades_to_tasks() {
        let db = db();
        let p = db.create_project("Website", "Relaunch").unwrap();
        db.create_task(p.id, "a", "", TaskStatus::ToDo).unwrap();
        db.create_task(p.id, "b", "", TaskStatus::Done).unwrap();
        assert!(db.delete_project_with_tasks(p.id).unwrap());
        assert!(db.list_tasks(p.id).unwrap().is_empty());
        assert!(db.get_project(p.id).unwrap().is_none());
        assert!(!db.delete_project_with_tasks(p.id).unwrap());
    }

    #[test]
    fn test_task_defaults_and_insertion_order() {
        let db = db();
        let p = db.create_project("P", "d").unwrap();
        let t1 = db.create_task(p.id, "one", "", TaskStatus::ToDo).unwrap();
        let t2 = db.create_task(p.id, "two", "notes", TaskStatus::InProgress).unwrap();
        assert_eq!(t1.status, TaskStatus::ToDo);
        assert_eq!(t1.description, "");
        let tasks = db.list_tasks(p.id).unwrap();
        assert_eq!(tasks[0].id, t1.id);
        assert_eq!(tasks[1].id, t2.id);
        assert_eq!(tasks[1].status, TaskStatus::InProgress);
    }

    #[test]
    fn test_list_tasks_unknown_project_is_empty() {
        let db = db();
        assert!(db.list_tasks(12345).unwrap().is_empty());
    }

    #[test]
    fn test_set_task_status_is_idempotent() {
        let db = db();
        let p = db.create_project("P", "d").unwrap();
        let t = db.create_task(p.id, "move me", "", TaskStatus::ToDo).unwrap();
        let moved = db.set_task_status(t.id, TaskStatus::Done).unwrap().unwrap();
        assert_eq!(moved.status, TaskStatus::Done);
        let again = db.set_task_status(t.id, TaskStatus::Done).unwrap().unwrap();
        assert_eq!(again.status, TaskStatus::Done);
        assert!(db.set_task_status(999, TaskStatus::Done).unwrap().is_none());
    }

    #[test]
    fn test_update_task_title_only_keeps_description() {
        let db = db();
        let p = db.create_project("P", "d").unwrap();
        let t = db.create_task(p.id, "old", "keep me", TaskStatus::ToDo).unwrap();
        let updated = db.update_task(t.id, Some("new"), None).unwrap().unwrap();
        assert_eq!(updated.title, "new");
        assert_eq!(updated.description, "keep me");

        // No fields supplied is a valid no-op.
        let same = db.update_task(t.id, None, None).unwrap().unwrap();
        assert_eq!(same.title, "new");
        assert_eq!(same.description, "keep me");
    }

    #[test]
    fn test_delete_task() {
        let db = db();
        let p = db.create_project("P", "d").unwrap();
        let t = db.create_task(p.id, "x", "", TaskStatus::ToDo).unwrap();
        assert!(db.delete_task(t.id).unwrap());
        assert!(!db.delete_task(t.id).unwrap());
        assert!(db.get_task(t.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_db_handle_call() {
        let handle = DbHandle::new(db());
        let project = handle
            .call(|db| db.create_project("Async", "via handle"))
            .await
            .unwrap();
        let listed = handle.call(|db| db.list_projects()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, project.id);
    }
}
