//! SQLite-backed analysis store implementation.

use super::models::{AffectPrediction, AffectRow, AnalysisRecord};
use super::schema::ANALYSIS_VERSIONED_SCHEMAS;
use super::trait_def::AnalysisStore;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const RECORD_COLUMNS: &str = "song_id, analysis, embeddings, valence, arousal, va";

/// SQLite-backed analysis store.
#[derive(Clone)]
pub struct SqliteAnalysisStore {
    read_conn: Arc<Mutex<Connection>>,
    write_conn: Arc<Mutex<Connection>>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    let latest_version = ANALYSIS_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &ANALYSIS_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        info!("Creating analysis db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    let mut current_version = if db_version < BASE_DB_VERSION as i64 {
        0
    } else {
        (db_version - BASE_DB_VERSION as i64) as usize
    };

    if current_version < latest_version {
        let tx = conn.transaction()?;
        for schema in ANALYSIS_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating analysis db from version {} to {}",
                    current_version, schema.version
                );
                migration_fn(&tx)?;
                current_version = schema.version;
            }
        }
        tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
        tx.commit()?;
    }

    latest_schema
        .validate(conn)
        .context("Analysis db schema does not match the expected layout")
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| anyhow!("Analysis db connection mutex poisoned"))
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// song_id, analysis, embeddings, valence, arousal, va
type RawRecordRow = (String, String, String, Option<f64>, Option<f64>, String);

fn row_to_record(row: &Row) -> rusqlite::Result<RawRecordRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

/// Decodes the JSON columns of a raw row.
///
/// A NULL valence/arousal column falls back to the averages stored in `va`.
fn decode_record(
    (song_id, analysis, embeddings, valence, arousal, va): RawRecordRow,
) -> Result<AnalysisRecord> {
    let affect: AffectPrediction = serde_json::from_str(&va)
        .with_context(|| format!("Malformed va column for song {}", song_id))?;
    Ok(AnalysisRecord {
        descriptors: serde_json::from_str(&analysis)
            .with_context(|| format!("Malformed analysis column for song {}", song_id))?,
        embedding: serde_json::from_str(&embeddings)
            .with_context(|| format!("Malformed embeddings column for song {}", song_id))?,
        valence: valence.unwrap_or(affect.valence_average),
        arousal: arousal.unwrap_or(affect.arousal_average),
        affect,
        song_id,
    })
}

impl SqliteAnalysisStore {
    /// Open (or create) the analysis database at `db_path`.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open analysis database")?;

        migrate_if_needed(&mut write_conn)?;

        write_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on analysis write connection")?;

        let read_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open analysis database for reading")?;

        let count: usize = read_conn.query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))?;
        info!("Analysis store ready: {} records", count);

        Ok(Self {
            read_conn: Arc::new(Mutex::new(read_conn)),
            write_conn: Arc::new(Mutex::new(write_conn)),
        })
    }

    /// In-memory store sharing a single connection for reads and writes.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migrate_if_needed(&mut conn)?;
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self {
            read_conn: conn.clone(),
            write_conn: conn,
        })
    }

    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<()> {
        lock(&self.write_conn)?.execute_batch(sql)?;
        Ok(())
    }
}

impl AnalysisStore for SqliteAnalysisStore {
    fn get_record(&self, song_id: &str) -> Result<Option<AnalysisRecord>> {
        let conn = lock(&self.read_conn)?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM songs WHERE song_id = ?1 ORDER BY row_id ASC LIMIT 1",
            RECORD_COLUMNS
        ))?;
        let raw = stmt.query_row(params![song_id], row_to_record).optional()?;
        raw.map(decode_record).transpose()
    }

    fn get_affect_by_ids(&self, song_ids: &[String]) -> Result<Vec<AffectRow>> {
        if song_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = lock(&self.read_conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT song_id, valence, arousal FROM songs WHERE song_id IN ({}) ORDER BY row_id ASC",
            placeholders(song_ids.len())
        ))?;
        let rows = stmt
            .query_map(params_from_iter(song_ids.iter()), |row| {
                Ok(AffectRow {
                    song_id: row.get(0)?,
                    valence: row.get(1)?,
                    arousal: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(
            "Fetched {} affect rows for {} song ids",
            rows.len(),
            song_ids.len()
        );
        Ok(rows)
    }

    fn insert_record(&self, record: &AnalysisRecord) -> Result<()> {
        let analysis = serde_json::to_string(&record.descriptors)?;
        let embeddings = serde_json::to_string(&record.embedding)?;
        let va = serde_json::to_string(&record.affect)?;

        let mut conn = lock(&self.write_conn)?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO songs (song_id, analysis, embeddings, valence, arousal, va)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.song_id,
                analysis,
                embeddings,
                record.valence,
                record.arousal,
                va
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn count_records(&self) -> Result<usize> {
        let conn = lock(&self.read_conn)?;
        Ok(conn.query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))?)
    }
}
