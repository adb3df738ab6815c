//! Versioned local document store on top of SQLite.
//!
//! Each collection is a table of JSON documents keyed by an auto-assigned
//! integer id. Secondary indexes are plain indexed columns written next to
//! the document on every `put`.

use crate::errors::{AppError, AppResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Params};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub struct IndexSchema {
    pub name: &'static str,
    pub column: &'static str,
}

#[derive(Debug)]
pub struct CollectionSchema {
    pub name: &'static str,
    pub indexes: &'static [IndexSchema],
}

impl CollectionSchema {
    pub fn index(&self, name: &str) -> Option<&'static IndexSchema> {
        self.indexes.iter().find(|index| index.name == name)
    }
}

pub static SUBJECTS: CollectionSchema = CollectionSchema {
    name: "subjects",
    indexes: &[],
};

pub static TASKS: CollectionSchema = CollectionSchema {
    name: "tasks",
    indexes: &[IndexSchema {
        name: "subjectId",
        column: "subject_id",
    }],
};

static COLLECTIONS: [&CollectionSchema; 2] = [&SUBJECTS, &TASKS];

/// A document that lives in one collection of the store.
pub trait Record: Serialize + DeserializeOwned + Send + 'static {
    fn schema() -> &'static CollectionSchema;
    fn id(&self) -> Option<i64>;
    fn set_id(&mut self, id: i64);

    fn index_value(&self, _index: &str) -> Option<i64> {
        None
    }
}

#[derive(Clone, Debug)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl Store {
    /// Opens (or creates) the store and provisions collections when
    /// `version` is newer than what the file was last opened with.
    pub async fn open(path: &Path, version: u32) -> AppResult<Store> {
        let owned = path.to_path_buf();
        let conn = match tokio::task::spawn_blocking(move || open_blocking(&owned, version)).await
        {
            Ok(result) => result?,
            Err(err) => return Err(AppError::DatabaseUnavailable(err.to_string())),
        };
        tracing::info!(path = %path.display(), version, "store opened");
        Ok(Store {
            conn: Arc::new(Mutex::new(conn)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn stored_version(&self) -> AppResult<u32> {
        self.with_conn(|conn| Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?))
            .await
    }

    pub async fn get_all<R: Record>(&self) -> AppResult<Vec<R>> {
        let schema = R::schema();
        self.with_conn(move |conn| {
            let sql = format!("SELECT id, doc FROM {} ORDER BY id", schema.name);
            collect_records(conn, &sql, [])
        })
        .await
    }

    /// Inserts when the record has no id, otherwise replaces the whole
    /// document stored under that id. Returns the key.
    pub async fn put<R: Record>(&self, record: &R) -> AppResult<i64> {
        let schema = R::schema();
        let doc = serde_json::to_string(record)?;
        let mut values: Vec<Value> = Vec::with_capacity(schema.indexes.len() + 2);
        values.push(integer_or_null(record.id()));
        for index in schema.indexes {
            values.push(integer_or_null(record.index_value(index.name)));
        }
        values.push(Value::Text(doc));

        let key = self
            .with_conn(move |conn| {
                let columns: Vec<&str> = std::iter::once("id")
                    .chain(schema.indexes.iter().map(|index| index.column))
                    .chain(std::iter::once("doc"))
                    .collect();
                let placeholders: Vec<String> =
                    (1..=columns.len()).map(|n| format!("?{}", n)).collect();
                let sql = format!(
                    "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
                    schema.name,
                    columns.join(", "),
                    placeholders.join(", ")
                );
                conn.execute(&sql, params_from_iter(values.iter()))?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        tracing::debug!(collection = schema.name, key, "record stored");
        Ok(key)
    }

    pub async fn get_by_index<R: Record>(&self, index_name: &str, value: i64) -> AppResult<Vec<R>> {
        let schema = R::schema();
        let index = schema.index(index_name).ok_or_else(|| {
            AppError::Transaction(format!(
                "collection {} has no index named {}",
                schema.name, index_name
            ))
        })?;
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT id, doc FROM {} WHERE {} = ?1 ORDER BY id",
                schema.name, index.column
            );
            collect_records(conn, &sql, [value])
        })
        .await
    }

    async fn with_conn<T, F>(&self, f: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> AppResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| AppError::Transaction("store mutex poisoned".to_string()))?;
            f(&*guard)
        })
        .await?
    }
}

fn integer_or_null(value: Option<i64>) -> Value {
    value.map(Value::Integer).unwrap_or(Value::Null)
}

fn collect_records<R: Record, P: Params>(conn: &Connection, sql: &str, params: P) -> AppResult<Vec<R>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (id, doc) = row?;
        let mut record: R = serde_json::from_str(&doc)?;
        record.set_id(id);
        records.push(record);
    }
    Ok(records)
}

fn unavailable(path: &Path, err: impl Display) -> AppError {
    AppError::DatabaseUnavailable(format!("{}: {}", path.display(), err))
}

fn open_blocking(path: &Path, version: u32) -> AppResult<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| unavailable(path, err))?;
    }
    let mut conn = Connection::open(path).map_err(|err| unavailable(path, err))?;
    let stored: u32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|err| unavailable(path, err))?;

    if stored > version {
        return Err(unavailable(
            path,
            format!(
                "stored schema version {} is newer than requested version {}",
                stored, version
            ),
        ));
    }
    if stored < version {
        tracing::info!(from = stored, to = version, "upgrading store schema");
        upgrade(&mut conn, version).map_err(|err| unavailable(path, err))?;
    }
    Ok(conn)
}

// Provisions missing tables, index columns and indexes. Existing rows are
// left as they are.
fn upgrade(conn: &mut Connection, version: u32) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    for schema in COLLECTIONS.iter() {
        let index_columns: String = schema
            .indexes
            .iter()
            .map(|index| format!("{} INTEGER, ", index.column))
            .collect();
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY AUTOINCREMENT, {}doc TEXT NOT NULL);",
            schema.name, index_columns
        ))?;

        let existing = table_columns(&tx, schema.name)?;
        for index in schema.indexes {
            if !existing.iter().any(|column| column == index.column) {
                tx.execute_batch(&format!(
                    "ALTER TABLE {} ADD COLUMN {} INTEGER;",
                    schema.name, index.column
                ))?;
            }
            tx.execute_batch(&format!(
                "CREATE INDEX IF NOT EXISTS {0}_{1} ON {0} ({1});",
                schema.name, index.column
            ))?;
        }
    }
    tx.pragma_update(None, "user_version", version)?;
    tx.commit()
}

fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let columns = rows.collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(columns)
}
