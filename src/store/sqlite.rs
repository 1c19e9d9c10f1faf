//! SQLite-backed document store.

use super::{DocumentStore, Filter};
use crate::document::ConfigDocument;
use crate::error::StoreError;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params, params_from_iter};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Document store wrapping a SQLite connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // WAL so other nodes' writers don't block our reads
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;",
        )?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        embedded::migrations::runner().run(&mut *conn)?;
        Ok(())
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }

    /// Append a document to `collection`, returning its row id.
    pub fn insert(&self, collection: &str, document: &ConfigDocument) -> Result<i64, StoreError> {
        let body = serde_json::to_string(document)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (collection, body, created_at) VALUES (?1, ?2, ?3)",
                params![collection, body, now_ms()],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Number of documents in `collection`, regardless of content.
    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![collection],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        })
    }
}

impl DocumentStore for SqliteStore {
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<ConfigDocument>, StoreError> {
        let (sql, args) = build_query(collection, filter)?;
        debug!(%collection, %sql, "Querying document store");

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(args), |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut documents = Vec::with_capacity(rows.len());
            for (id, body) in rows {
                let doc: ConfigDocument =
                    serde_json::from_str(&body).map_err(|e| StoreError::Corrupt {
                        id,
                        reason: e.to_string(),
                    })?;
                if matches_composite(&doc, filter) {
                    documents.push(doc);
                }
            }
            Ok(documents)
        })
    }
}

/// Translate a filter into a SELECT over `documents`.
///
/// Array and object predicates only narrow by JSON type here; their
/// contents are compared by [`matches_composite`] after decoding, since
/// stored key order is not canonical.
fn build_query(collection: &str, filter: &Filter) -> Result<(String, Vec<SqlValue>), StoreError> {
    let mut sql = String::from("SELECT id, body FROM documents WHERE collection = ?");
    let mut args = vec![SqlValue::Text(collection.to_string())];

    for (field, value) in filter.predicates() {
        let path = json_path(field)?;
        match value {
            Value::Null => {
                sql.push_str(" AND json_type(body, ?) = 'null'");
                args.push(SqlValue::Text(path));
            }
            Value::Bool(b) => {
                sql.push_str(" AND json_type(body, ?) = ?");
                args.push(SqlValue::Text(path));
                args.push(SqlValue::Text(if *b { "true" } else { "false" }.to_string()));
            }
            Value::String(s) => {
                sql.push_str(" AND json_type(body, ?) = 'text' AND json_extract(body, ?) = ?");
                args.push(SqlValue::Text(path.clone()));
                args.push(SqlValue::Text(path));
                args.push(SqlValue::Text(s.clone()));
            }
            Value::Number(n) => {
                sql.push_str(
                    " AND json_type(body, ?) IN ('integer', 'real') AND json_extract(body, ?) = ?",
                );
                args.push(SqlValue::Text(path.clone()));
                args.push(SqlValue::Text(path));
                args.push(match n.as_i64() {
                    Some(i) => SqlValue::Integer(i),
                    None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
                });
            }
            Value::Array(_) => {
                sql.push_str(" AND json_type(body, ?) = 'array'");
                args.push(SqlValue::Text(path));
            }
            Value::Object(_) => {
                sql.push_str(" AND json_type(body, ?) = 'object'");
                args.push(SqlValue::Text(path));
            }
        }
    }

    sql.push_str(" ORDER BY id");
    Ok((sql, args))
}

/// Check the array and object predicates SQL could not compare.
///
/// Object equality ignores key order.
fn matches_composite(doc: &ConfigDocument, filter: &Filter) -> bool {
    filter
        .predicates()
        .iter()
        .filter(|(_, value)| value.is_array() || value.is_object())
        .all(|(field, value)| doc.get(field) == Some(value))
}

/// JSON path for a top-level field, quoted so dots and spaces are literal.
///
/// SQLite has no escape for `"` inside a quoted label, so such names are rejected.
fn json_path(field: &str) -> Result<String, StoreError> {
    if field.contains('"') {
        return Err(StoreError::InvalidFilter(format!(
            "field name {:?} contains a double quote",
            field
        )));
    }
    Ok(format!("$.\"{}\"", field))
}

/// Get the current timestamp in milliseconds.
fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
