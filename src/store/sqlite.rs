use crate::analytics::AnalyticsSnapshot;
use crate::store::error::StoreError;
use crate::store::models::{
    ChangeBatch, ChangeType, InspectionRecord, InspectionUpdate, NewInspection, RecordChange,
};
use crate::store::record_store::RecordStore;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::task;
use tracing::{debug, error, info};
use uuid::Uuid;

const RECORD_COLUMNS: &str =
    "id, part_type, status, timestamp, image_url, location, condition, notes";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS inspections (
        id TEXT PRIMARY KEY,
        part_type TEXT,
        status TEXT,
        timestamp TEXT,
        image_url TEXT,
        location TEXT,
        condition TEXT,
        notes TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_inspections_timestamp ON inspections(timestamp)",
    "CREATE TABLE IF NOT EXISTS analytics_cache (
        id TEXT PRIMARY KEY,
        generated_at TEXT NOT NULL,
        snapshot TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_analytics_cache_generated_at
     ON analytics_cache(generated_at)",
];

// Raw row tuple as read from the inspections table
type RecordRow = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// A SQLite implementation of the RecordStore trait
///
/// Documents live in an `inspections` table; cached analytics snapshots in
/// `analytics_cache`. Change batches are published while the connection lock
/// is held, so subscribers observe batches in commit order.
pub struct SqliteRecordStore {
    connection: Arc<Mutex<Connection>>,
    changes: broadcast::Sender<ChangeBatch>,
}

impl SqliteRecordStore {
    /// Create a new SqliteRecordStore with the given database path
    pub fn new(db_path: &str) -> Result<Self, StoreError> {
        info!("Creating SQLite record store at path: {db_path}");

        let open_error = |reason: String| {
            error!("Failed to open record store at {db_path}: {reason}");
            StoreError::Open {
                path: db_path.to_string(),
                reason,
            }
        };

        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.exists() && !parent.as_os_str().is_empty() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).map_err(|e| open_error(e.to_string()))?;
            }
        }

        let connection = Connection::open(db_path).map_err(|e| open_error(e.to_string()))?;

        for statement in SCHEMA {
            connection
                .execute(statement, [])
                .map_err(|e| open_error(e.to_string()))?;
        }

        let (changes, _) = broadcast::channel(256);

        info!("SQLite record store initialized successfully at: {db_path}");
        Ok(SqliteRecordStore {
            connection: Arc::new(Mutex::new(connection)),
            changes,
        })
    }

    // Timestamps are stored as fixed-width RFC 3339 text so that SQLite's
    // lexicographic comparison matches chronological order.
    fn datetime_to_string(dt: DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn string_to_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::Corrupt(format!("bad timestamp {s:?}: {e}")))
    }

    fn query_error(op: &'static str) -> impl Fn(rusqlite::Error) -> StoreError {
        move |e| {
            error!("Record store {op} failed: {e}");
            StoreError::Query {
                op,
                reason: e.to_string(),
            }
        }
    }

    fn join_error(op: &'static str) -> impl Fn(task::JoinError) -> StoreError {
        move |e| {
            error!("Record store {op} task panicked: {e}");
            StoreError::Query {
                op,
                reason: format!("task panic: {e}"),
            }
        }
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<RecordRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
        ))
    }

    fn parse_record(
        (id_str, part_type, status, timestamp_str, image_url, location, condition, notes): RecordRow,
    ) -> Result<InspectionRecord, StoreError> {
        let id = Uuid::parse_str(&id_str)
            .map_err(|e| StoreError::Corrupt(format!("bad record id {id_str:?}: {e}")))?;
        let timestamp = timestamp_str
            .map(|s| Self::string_to_datetime(&s))
            .transpose()?;

        Ok(InspectionRecord {
            id,
            part_type,
            status,
            timestamp,
            image_url,
            location,
            condition,
            notes,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    fn subscribe(&self) -> broadcast::Receiver<ChangeBatch> {
        self.changes.subscribe()
    }

    async fn insert(&self, new: NewInspection) -> Result<InspectionRecord, StoreError> {
        let record = InspectionRecord {
            id: Uuid::new_v4(),
            part_type: new.part_type,
            status: new.status,
            timestamp: Some(Utc::now()),
            image_url: new.image_url,
            location: new.location,
            condition: new.condition,
            notes: new.notes,
        };
        debug!("Inserting inspection: id={}", record.id);

        let connection = Arc::clone(&self.connection);
        let changes = self.changes.clone();
        let row = record.clone();

        task::spawn_blocking(move || {
            let conn = connection.lock().map_err(|_| StoreError::Poisoned)?;

            conn.execute(
                "INSERT INTO inspections (id, part_type, status, timestamp, image_url, location, condition, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    row.id.to_string(),
                    row.part_type,
                    row.status,
                    row.timestamp.map(Self::datetime_to_string),
                    row.image_url,
                    row.location,
                    row.condition,
                    row.notes,
                ],
            )
            .map_err(Self::query_error("insert"))?;

            // Published under the connection lock so batches leave in commit order.
            let _ = changes.send(ChangeBatch::single(ChangeType::Added, row.clone()));

            debug!("Successfully inserted inspection: {}", row.id);
            Ok(row)
        })
        .await
        .map_err(Self::join_error("insert"))?
    }

    async fn update(
        &self,
        id: Uuid,
        update: InspectionUpdate,
    ) -> Result<InspectionRecord, StoreError> {
        debug!("Updating inspection: id={id}");

        let connection = Arc::clone(&self.connection);
        let changes = self.changes.clone();

        task::spawn_blocking(move || {
            let conn = connection.lock().map_err(|_| StoreError::Poisoned)?;

            let existing = conn
                .query_row(
                    &format!("SELECT {RECORD_COLUMNS} FROM inspections WHERE id = ?1"),
                    params![id.to_string()],
                    Self::row_to_record,
                )
                .optional()
                .map_err(Self::query_error("update"))?;

            let Some(existing) = existing else {
                return Err(StoreError::NotFound(id));
            };
            let mut record = Self::parse_record(existing)?;

            if let Some(status) = update.status {
                record.status = Some(status);
            }
            if let Some(condition) = update.condition {
                record.condition = Some(condition);
            }
            if let Some(notes) = update.notes {
                record.notes = Some(notes);
            }

            conn.execute(
                "UPDATE inspections SET status = ?1, condition = ?2, notes = ?3 WHERE id = ?4",
                params![
                    record.status,
                    record.condition,
                    record.notes,
                    id.to_string()
                ],
            )
            .map_err(Self::query_error("update"))?;

            let _ = changes.send(ChangeBatch::single(ChangeType::Modified, record.clone()));

            debug!("Successfully updated inspection: {id}");
            Ok(record)
        })
        .await
        .map_err(Self::join_error("update"))?
    }

    async fn get_all(&self) -> Result<Vec<InspectionRecord>, StoreError> {
        let connection = Arc::clone(&self.connection);

        task::spawn_blocking(move || {
            let conn = connection.lock().map_err(|_| StoreError::Poisoned)?;

            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {RECORD_COLUMNS} FROM inspections ORDER BY timestamp"
                ))
                .map_err(Self::query_error("read"))?;

            let rows = stmt
                .query_map([], Self::row_to_record)
                .map_err(Self::query_error("read"))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(Self::query_error("read"))?;

            rows.into_iter().map(Self::parse_record).collect()
        })
        .await
        .map_err(Self::join_error("read"))?
    }

    async fn query_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<InspectionRecord>, StoreError> {
        debug!("Querying inspections older than {cutoff}");

        let connection = Arc::clone(&self.connection);
        let cutoff_str = Self::datetime_to_string(cutoff);

        task::spawn_blocking(move || {
            let conn = connection.lock().map_err(|_| StoreError::Poisoned)?;

            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {RECORD_COLUMNS} FROM inspections
                     WHERE timestamp IS NOT NULL AND timestamp < ?1
                     ORDER BY timestamp"
                ))
                .map_err(Self::query_error("age query"))?;

            let rows = stmt
                .query_map(params![cutoff_str], Self::row_to_record)
                .map_err(Self::query_error("age query"))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(Self::query_error("age query"))?;

            rows.into_iter().map(Self::parse_record).collect()
        })
        .await
        .map_err(Self::join_error("age query"))?
    }

    async fn delete_batch(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        debug!("Deleting batch of {} inspections", ids.len());

        let connection = Arc::clone(&self.connection);
        let changes = self.changes.clone();
        let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();

        task::spawn_blocking(move || {
            let mut conn = connection.lock().map_err(|_| StoreError::Poisoned)?;

            let tx = conn.transaction().map_err(Self::query_error("delete"))?;

            let mut removed = Vec::new();
            for id in &ids {
                let existing = tx
                    .query_row(
                        &format!("SELECT {RECORD_COLUMNS} FROM inspections WHERE id = ?1"),
                        params![id],
                        Self::row_to_record,
                    )
                    .optional()
                    .map_err(Self::query_error("delete"))?;

                let Some(existing) = existing else {
                    debug!("Skipping delete of missing inspection: {id}");
                    continue;
                };

                tx.execute("DELETE FROM inspections WHERE id = ?1", params![id])
                    .map_err(Self::query_error("delete"))?;

                removed.push(RecordChange {
                    change_type: ChangeType::Removed,
                    record: Self::parse_record(existing)?,
                });
            }

            tx.commit().map_err(Self::query_error("delete"))?;

            if !removed.is_empty() {
                let _ = changes.send(ChangeBatch { changes: removed });
            }

            Ok(())
        })
        .await
        .map_err(Self::join_error("delete"))?
    }

    async fn put_analytics(&self, snapshot: &AnalyticsSnapshot) -> Result<(), StoreError> {
        let connection = Arc::clone(&self.connection);
        let generated_at = Self::datetime_to_string(snapshot.generated_at);
        let body = serde_json::to_string(snapshot).map_err(|e| StoreError::Query {
            op: "snapshot cache",
            reason: e.to_string(),
        })?;

        task::spawn_blocking(move || {
            let conn = connection.lock().map_err(|_| StoreError::Poisoned)?;

            conn.execute(
                "INSERT INTO analytics_cache (id, generated_at, snapshot) VALUES (?1, ?2, ?3)",
                params![Uuid::new_v4().to_string(), generated_at, body],
            )
            .map_err(Self::query_error("snapshot cache"))?;

            Ok(())
        })
        .await
        .map_err(Self::join_error("snapshot cache"))?
    }

    async fn delete_analytics_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        debug!("Expiring cached analytics older than {cutoff}");

        let connection = Arc::clone(&self.connection);
        let cutoff_str = Self::datetime_to_string(cutoff);

        task::spawn_blocking(move || {
            let conn = connection.lock().map_err(|_| StoreError::Poisoned)?;

            let deleted = conn
                .execute(
                    "DELETE FROM analytics_cache WHERE generated_at < ?1",
                    params![cutoff_str],
                )
                .map_err(Self::query_error("snapshot expiry"))?;

            debug!("Expired {deleted} cached analytics snapshots");
            Ok(deleted)
        })
        .await
        .map_err(Self::join_error("snapshot expiry"))?
    }

    #[cfg(test)]
    async fn add_record(&self, record: InspectionRecord) -> Result<(), StoreError> {
        let connection = Arc::clone(&self.connection);

        task::spawn_blocking(move || {
            let conn = connection.lock().map_err(|_| StoreError::Poisoned)?;

            conn.execute(
                "INSERT OR REPLACE INTO inspections (id, part_type, status, timestamp, image_url, location, condition, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id.to_string(),
                    record.part_type,
                    record.status,
                    record.timestamp.map(Self::datetime_to_string),
                    record.image_url,
                    record.location,
                    record.condition,
                    record.notes,
                ],
            )
            .map_err(Self::query_error("seed"))?;

            Ok(())
        })
        .await
        .map_err(Self::join_error("seed"))?
    }
}
