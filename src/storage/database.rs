//! SQLite persistence for lifecycle records and ingested datasets
//!
//! One database backs all four store traits; handlers only ever see the
//! trait objects.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::providers::{DatasetStore, NotificationStore, SearchStore, TaskStore};
use crate::types::{
    DatasetRow, NotificationPriority, NotificationRecord, NotificationStatus, SearchKind,
    SearchRecord, SearchStatus, TaskRecord, TaskStatus,
};

/// SQLite-backed record and dataset store
pub struct ScreeningDb {
    conn: Arc<Mutex<Connection>>,
}

impl ScreeningDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::Storage(format!("failed to open database: {}", e)))?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Storage(format!("failed to open in-memory database: {}", e)))?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
        "#,
        )
        .map_err(|e| Error::Storage(format!("failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                task_id TEXT PRIMARY KEY,
                source_ref TEXT NOT NULL,
                status TEXT NOT NULL,
                is_done INTEGER NOT NULL DEFAULT 0,
                column_names TEXT NOT NULL DEFAULT '[]',
                total_rows INTEGER NOT NULL DEFAULT 0,
                processing_time_ms INTEGER,
                error_message TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);

            CREATE TABLE IF NOT EXISTS searches (
                search_id TEXT PRIMARY KEY,
                task_ref TEXT NOT NULL,
                kind TEXT NOT NULL,
                query_names TEXT NOT NULL,
                columns TEXT NOT NULL,
                threshold REAL NOT NULL,
                watchlist_ref TEXT,
                status TEXT NOT NULL,
                total_rows INTEGER NOT NULL DEFAULT 0,
                execution_time_ms INTEGER,
                matched_records TEXT,
                summary TEXT,
                error_message TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_searches_status ON searches(status);
            CREATE INDEX IF NOT EXISTS idx_searches_task_ref ON searches(task_ref);

            CREATE TABLE IF NOT EXISTS notifications (
                notification_id TEXT PRIMARY KEY,
                recipients TEXT NOT NULL,
                subject TEXT NOT NULL,
                body TEXT NOT NULL,
                priority INTEGER NOT NULL,
                status TEXT NOT NULL,
                retry_count INTEGER NOT NULL DEFAULT 0,
                max_retries INTEGER NOT NULL,
                scheduled_at TEXT,
                sent_at TEXT,
                error_message TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notifications_status ON notifications(status);

            CREATE TABLE IF NOT EXISTS dataset_rows (
                task_id TEXT NOT NULL,
                entity_ref INTEGER NOT NULL,
                fields TEXT NOT NULL,
                PRIMARY KEY (task_id, entity_ref)
            );
        "#,
        )
        .map_err(|e| Error::Storage(format!("migration failed: {}", e)))?;

        Ok(())
    }

    /// Remove a task together with its dataset rows and child searches
    pub fn delete_task_cascade(&self, task_id: Uuid) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let id = task_id.to_string();
        tx.execute("DELETE FROM dataset_rows WHERE task_id = ?1", params![id])?;
        tx.execute("DELETE FROM searches WHERE task_ref = ?1", params![id])?;
        tx.execute("DELETE FROM tasks WHERE task_id = ?1", params![id])?;
        tx.commit()?;
        tracing::info!(%task_id, "task deleted with cascade");
        Ok(())
    }
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_uuid(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap_or_else(|_| Uuid::nil())
}

fn task_status_str(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Completed => "completed",
    }
}

fn parse_task_status(raw: &str) -> TaskStatus {
    match raw {
        "completed" => TaskStatus::Completed,
        _ => TaskStatus::Pending,
    }
}

fn search_status_str(status: SearchStatus) -> &'static str {
    match status {
        SearchStatus::Pending => "pending",
        SearchStatus::Processing => "processing",
        SearchStatus::Completed => "completed",
        SearchStatus::Failed => "failed",
    }
}

fn parse_search_status(raw: &str) -> SearchStatus {
    match raw {
        "processing" => SearchStatus::Processing,
        "completed" => SearchStatus::Completed,
        "failed" => SearchStatus::Failed,
        _ => SearchStatus::Pending,
    }
}

fn search_kind_str(kind: SearchKind) -> &'static str {
    match kind {
        SearchKind::Single => "single",
        SearchKind::Bulk => "bulk",
    }
}

fn parse_search_kind(raw: &str) -> SearchKind {
    match raw {
        "bulk" => SearchKind::Bulk,
        _ => SearchKind::Single,
    }
}

fn notification_status_str(status: NotificationStatus) -> &'static str {
    match status {
        NotificationStatus::Pending => "pending",
        NotificationStatus::Processing => "processing",
        NotificationStatus::Sent => "sent",
        NotificationStatus::Retry => "retry",
        NotificationStatus::Failed => "failed",
    }
}

fn parse_notification_status(raw: &str) -> NotificationStatus {
    match raw {
        "processing" => NotificationStatus::Processing,
        "sent" => NotificationStatus::Sent,
        "retry" => NotificationStatus::Retry,
        "failed" => NotificationStatus::Failed,
        _ => NotificationStatus::Pending,
    }
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
    let task_id: String = row.get(0)?;
    let source_ref: String = row.get(1)?;
    let status: String = row.get(2)?;
    let is_done: bool = row.get(3)?;
    let column_names: String = row.get(4)?;
    let total_rows: i64 = row.get(5)?;
    let processing_time_ms: Option<i64> = row.get(6)?;
    let error_message: Option<String> = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    Ok(TaskRecord {
        task_id: parse_uuid(&task_id),
        source_ref,
        status: parse_task_status(&status),
        is_done,
        column_names: serde_json::from_str(&column_names).unwrap_or_default(),
        total_rows: total_rows as u64,
        processing_time_ms: processing_time_ms.map(|v| v as u64),
        error_message,
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

fn row_to_search(row: &Row<'_>) -> rusqlite::Result<SearchRecord> {
    let search_id: String = row.get(0)?;
    let task_ref: String = row.get(1)?;
    let kind: String = row.get(2)?;
    let query_names: String = row.get(3)?;
    let columns: String = row.get(4)?;
    let threshold: f64 = row.get(5)?;
    let watchlist_ref: Option<String> = row.get(6)?;
    let status: String = row.get(7)?;
    let total_rows: i64 = row.get(8)?;
    let execution_time_ms: Option<i64> = row.get(9)?;
    let matched_records: Option<String> = row.get(10)?;
    let summary: Option<String> = row.get(11)?;
    let error_message: Option<String> = row.get(12)?;
    let created_at: String = row.get(13)?;
    let updated_at: String = row.get(14)?;

    Ok(SearchRecord {
        search_id: parse_uuid(&search_id),
        task_ref: parse_uuid(&task_ref),
        kind: parse_search_kind(&kind),
        query_names: serde_json::from_str(&query_names).unwrap_or_default(),
        columns: serde_json::from_str(&columns).unwrap_or_default(),
        threshold,
        watchlist_ref,
        status: parse_search_status(&status),
        total_rows: total_rows as u64,
        execution_time_ms: execution_time_ms.map(|v| v as u64),
        matched_records: matched_records.and_then(|j| serde_json::from_str(&j).ok()),
        summary: summary.and_then(|j| serde_json::from_str(&j).ok()),
        error_message,
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

fn row_to_notification(row: &Row<'_>) -> rusqlite::Result<NotificationRecord> {
    let notification_id: String = row.get(0)?;
    let recipients: String = row.get(1)?;
    let subject: String = row.get(2)?;
    let body: String = row.get(3)?;
    let priority: i64 = row.get(4)?;
    let status: String = row.get(5)?;
    let retry_count: i64 = row.get(6)?;
    let max_retries: i64 = row.get(7)?;
    let scheduled_at: Option<String> = row.get(8)?;
    let sent_at: Option<String> = row.get(9)?;
    let error_message: Option<String> = row.get(10)?;
    let created_at: String = row.get(11)?;
    let updated_at: String = row.get(12)?;

    Ok(NotificationRecord {
        notification_id: parse_uuid(&notification_id),
        recipients: serde_json::from_str(&recipients).unwrap_or_default(),
        subject,
        body,
        priority: NotificationPriority::from_rank(priority as u8),
        status: parse_notification_status(&status),
        retry_count: retry_count as u32,
        max_retries: max_retries as u32,
        scheduled_at: scheduled_at.map(|s| parse_ts(&s)),
        sent_at: sent_at.map(|s| parse_ts(&s)),
        error_message,
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

const TASK_COLUMNS: &str = "task_id, source_ref, status, is_done, column_names, total_rows, \
     processing_time_ms, error_message, created_at, updated_at";

const SEARCH_COLUMNS: &str = "search_id, task_ref, kind, query_names, columns, threshold, \
     watchlist_ref, status, total_rows, execution_time_ms, matched_records, summary, \
     error_message, created_at, updated_at";

const NOTIFICATION_COLUMNS: &str = "notification_id, recipients, subject, body, priority, \
     status, retry_count, max_retries, scheduled_at, sent_at, error_message, created_at, \
     updated_at";

#[async_trait]
impl TaskStore for ScreeningDb {
    async fn read(&self, task_id: Uuid) -> Result<Option<TaskRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE task_id = ?1", TASK_COLUMNS),
                params![task_id.to_string()],
                row_to_task,
            )
            .optional()?;
        Ok(record)
    }

    async fn write(&self, record: &TaskRecord) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO tasks
                (task_id, source_ref, status, is_done, column_names, total_rows,
                 processing_time_ms, error_message, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.task_id.to_string(),
                record.source_ref,
                task_status_str(record.status),
                record.is_done,
                serde_json::to_string(&record.column_names)?,
                record.total_rows as i64,
                record.processing_time_ms.map(|v| v as i64),
                record.error_message,
                format_ts(record.created_at),
                format_ts(record.updated_at),
            ],
        )?;
        Ok(())
    }

    async fn list_non_terminal(&self) -> Result<Vec<TaskRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE status != 'completed' ORDER BY created_at ASC",
            TASK_COLUMNS
        ))?;
        let records = stmt
            .query_map([], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

#[async_trait]
impl SearchStore for ScreeningDb {
    async fn read(&self, search_id: Uuid) -> Result<Option<SearchRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                &format!("SELECT {} FROM searches WHERE search_id = ?1", SEARCH_COLUMNS),
                params![search_id.to_string()],
                row_to_search,
            )
            .optional()?;
        Ok(record)
    }

    async fn write(&self, record: &SearchRecord) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO searches
                (search_id, task_ref, kind, query_names, columns, threshold,
                 watchlist_ref, status, total_rows, execution_time_ms,
                 matched_records, summary, error_message, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                record.search_id.to_string(),
                record.task_ref.to_string(),
                search_kind_str(record.kind),
                serde_json::to_string(&record.query_names)?,
                serde_json::to_string(&record.columns)?,
                record.threshold,
                record.watchlist_ref,
                search_status_str(record.status),
                record.total_rows as i64,
                record.execution_time_ms.map(|v| v as i64),
                record
                    .matched_records
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                record.summary.as_ref().map(serde_json::to_string).transpose()?,
                record.error_message,
                format_ts(record.created_at),
                format_ts(record.updated_at),
            ],
        )?;
        Ok(())
    }

    async fn list_non_terminal(&self) -> Result<Vec<SearchRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM searches WHERE status IN ('pending', 'processing') \
             ORDER BY created_at ASC",
            SEARCH_COLUMNS
        ))?;
        let records = stmt
            .query_map([], row_to_search)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

#[async_trait]
impl NotificationStore for ScreeningDb {
    async fn read(&self, notification_id: Uuid) -> Result<Option<NotificationRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM notifications WHERE notification_id = ?1",
                    NOTIFICATION_COLUMNS
                ),
                params![notification_id.to_string()],
                row_to_notification,
            )
            .optional()?;
        Ok(record)
    }

    async fn write(&self, record: &NotificationRecord) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO notifications
                (notification_id, recipients, subject, body, priority, status,
                 retry_count, max_retries, scheduled_at, sent_at, error_message,
                 created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                record.notification_id.to_string(),
                serde_json::to_string(&record.recipients)?,
                record.subject,
                record.body,
                record.priority.rank() as i64,
                notification_status_str(record.status),
                record.retry_count as i64,
                record.max_retries as i64,
                record.scheduled_at.map(format_ts),
                record.sent_at.map(format_ts),
                record.error_message,
                format_ts(record.created_at),
                format_ts(record.updated_at),
            ],
        )?;
        Ok(())
    }

    async fn list_non_terminal(&self) -> Result<Vec<NotificationRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notifications \
             WHERE status IN ('pending', 'processing', 'retry') ORDER BY created_at ASC",
            NOTIFICATION_COLUMNS
        ))?;
        let records = stmt
            .query_map([], row_to_notification)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    async fn next_due(&self, now: DateTime<Utc>) -> Result<Option<NotificationRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM notifications \
                     WHERE status IN ('pending', 'retry') \
                       AND (scheduled_at IS NULL OR scheduled_at <= ?1) \
                       AND sent_at IS NULL \
                     ORDER BY priority DESC, created_at ASC LIMIT 1",
                    NOTIFICATION_COLUMNS
                ),
                params![format_ts(now)],
                row_to_notification,
            )
            .optional()?;
        Ok(record)
    }
}

#[async_trait]
impl DatasetStore for ScreeningDb {
    async fn insert_batch(&self, task_id: Uuid, rows: &[DatasetRow]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO dataset_rows (task_id, entity_ref, fields) \
                 VALUES (?1, ?2, ?3)",
            )?;
            let id = task_id.to_string();
            for row in rows {
                stmt.execute(params![
                    id,
                    row.entity_ref,
                    serde_json::to_string(&row.fields)?
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn query_rows(&self, task_id: Uuid, _columns: &[String]) -> Result<Vec<DatasetRow>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT entity_ref, fields FROM dataset_rows WHERE task_id = ?1 \
             ORDER BY entity_ref ASC",
        )?;
        let rows = stmt
            .query_map(params![task_id.to_string()], |row| {
                let entity_ref: i64 = row.get(0)?;
                let fields: String = row.get(1)?;
                Ok(DatasetRow {
                    entity_ref,
                    fields: serde_json::from_str(&fields).unwrap_or_default(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    async fn delete_rows(&self, task_id: Uuid) -> Result<usize> {
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM dataset_rows WHERE task_id = ?1",
            params![task_id.to_string()],
        )?;
        Ok(removed)
    }

    async fn count_rows(&self, task_id: Uuid) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM dataset_rows WHERE task_id = ?1",
            params![task_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchOutcome;

    #[tokio::test]
    async fn test_task_round_trip() {
        let db = ScreeningDb::in_memory().unwrap();
        let mut record = TaskRecord::new(Uuid::new_v4(), "upload.csv".to_string());
        TaskStore::write(&db, &record).await.unwrap();

        let loaded = TaskStore::read(&db, record.task_id).await.unwrap().unwrap();
        assert_eq!(loaded.status, TaskStatus::Pending);
        assert_eq!(loaded.source_ref, "upload.csv");

        record.mark_completed(vec!["name".to_string()], 42, 17);
        TaskStore::write(&db, &record).await.unwrap();

        let loaded = TaskStore::read(&db, record.task_id).await.unwrap().unwrap();
        assert_eq!(loaded.status, TaskStatus::Completed);
        assert!(loaded.is_done);
        assert_eq!(loaded.total_rows, 42);
        assert_eq!(loaded.column_names, vec!["name".to_string()]);
        assert!(TaskStore::list_non_terminal(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_round_trip() {
        let db = ScreeningDb::in_memory().unwrap();
        let mut record = SearchRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            SearchKind::Single,
            vec!["John Smith".to_string()],
            vec!["name".to_string()],
            70.0,
            None,
        );
        SearchStore::write(&db, &record).await.unwrap();
        assert_eq!(SearchStore::list_non_terminal(&db).await.unwrap().len(), 1);

        record.mark_completed(MatchOutcome::Single { matches: vec![] }, None, 10, 5);
        SearchStore::write(&db, &record).await.unwrap();

        let loaded = SearchStore::read(&db, record.search_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.status, SearchStatus::Completed);
        assert_eq!(loaded.kind, SearchKind::Single);
        assert_eq!(loaded.threshold, 70.0);
        assert!(matches!(
            loaded.matched_records,
            Some(MatchOutcome::Single { .. })
        ));
        assert!(SearchStore::list_non_terminal(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_next_due_ordering() {
        let db = ScreeningDb::in_memory().unwrap();

        let mut low = NotificationRecord::new(
            Uuid::new_v4(),
            vec!["a@example.com".to_string()],
            "low".to_string(),
            "body".to_string(),
            NotificationPriority::Low,
            3,
        );
        low.created_at = Utc::now() - chrono::Duration::seconds(30);
        let mut old_normal = NotificationRecord::new(
            Uuid::new_v4(),
            vec!["b@example.com".to_string()],
            "old normal".to_string(),
            "body".to_string(),
            NotificationPriority::Normal,
            3,
        );
        old_normal.created_at = Utc::now() - chrono::Duration::seconds(20);
        let new_normal = NotificationRecord::new(
            Uuid::new_v4(),
            vec!["c@example.com".to_string()],
            "new normal".to_string(),
            "body".to_string(),
            NotificationPriority::Normal,
            3,
        );
        let mut high = NotificationRecord::new(
            Uuid::new_v4(),
            vec!["d@example.com".to_string()],
            "high".to_string(),
            "body".to_string(),
            NotificationPriority::High,
            3,
        );
        // Scheduled in the future: not eligible despite the priority.
        high.scheduled_at = Some(Utc::now() + chrono::Duration::seconds(60));

        for record in [&low, &old_normal, &new_normal, &high] {
            NotificationStore::write(&db, record).await.unwrap();
        }

        // Highest eligible priority first, then oldest created_at.
        let due = db.next_due(Utc::now()).await.unwrap().unwrap();
        assert_eq!(due.notification_id, old_normal.notification_id);

        old_normal.mark_sent();
        NotificationStore::write(&db, &old_normal).await.unwrap();
        let due = db.next_due(Utc::now()).await.unwrap().unwrap();
        assert_eq!(due.notification_id, new_normal.notification_id);
    }

    #[tokio::test]
    async fn test_dataset_rows_round_trip_and_cascade() {
        let db = ScreeningDb::in_memory().unwrap();
        let task_id = Uuid::new_v4();

        let rows: Vec<DatasetRow> = (0..3)
            .map(|i| {
                let mut fields = serde_json::Map::new();
                fields.insert(
                    "name".to_string(),
                    serde_json::Value::String(format!("person {}", i)),
                );
                DatasetRow {
                    entity_ref: i,
                    fields,
                }
            })
            .collect();
        db.insert_batch(task_id, &rows).await.unwrap();
        assert_eq!(db.count_rows(task_id).await.unwrap(), 3);

        // Replaying the same batch overwrites instead of duplicating.
        db.insert_batch(task_id, &rows).await.unwrap();
        assert_eq!(db.count_rows(task_id).await.unwrap(), 3);

        let loaded = db.query_rows(task_id, &[]).await.unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].entity_ref, 0);
        assert_eq!(loaded[2].value("name"), Some("person 2"));

        let task = TaskRecord::new(task_id, "upload.csv".to_string());
        TaskStore::write(&db, &task).await.unwrap();
        db.delete_task_cascade(task_id).unwrap();
        assert_eq!(db.count_rows(task_id).await.unwrap(), 0);
        assert!(TaskStore::read(&db, task_id).await.unwrap().is_none());
    }
}
