use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use deadpool_postgres::{Config, Pool, Runtime};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{json, Value};
use tokio_postgres::types::Type;
use tokio_postgres::NoTls;
use url::Url;

use crate::config::DataSource;
use crate::error::DataAccessError;

/// One result row, cells in column order.
pub type Row = Vec<Value>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Runs a complete statement and returns every row, or nothing at all on
    /// failure.
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>, DataAccessError>;

    async fn ping(&self) -> Result<(), DataAccessError> {
        self.fetch_rows("SELECT 1").await.map(|_| ())
    }
}

pub fn connect(source: &DataSource) -> Result<Arc<dyn QueryExecutor>, DataAccessError> {
    match source {
        DataSource::Sqlite(path) => Ok(Arc::new(SqliteExecutor::new(path))),
        DataSource::Postgres(url) => Ok(Arc::new(PostgresExecutor::from_url(url)?)),
    }
}

/// Read-only SQLite file. Each query opens its own connection and closes it
/// before returning.
pub struct SqliteExecutor {
    path: PathBuf,
}

impl SqliteExecutor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(path: &Path) -> Result<Connection, DataAccessError> {
        Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| DataAccessError::Connection(format!("{}: {e}", path.display())))
    }

    fn run(path: &Path, sql: &str) -> Result<Vec<Row>, DataAccessError> {
        let query_error = |e: rusqlite::Error| DataAccessError::Query {
            sql: sql.to_string(),
            cause: e.to_string(),
        };

        let conn = Self::open(path)?;
        let mut stmt = conn.prepare(sql).map_err(query_error)?;
        let column_count = stmt.column_count();
        let mut rows = stmt.query([]).map_err(query_error)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(query_error)? {
            let mut cells = Vec::with_capacity(column_count);
            for i in 0..column_count {
                cells.push(sqlite_cell_to_json(row.get_ref(i).map_err(query_error)?));
            }
            out.push(cells);
        }
        Ok(out)
    }
}

fn sqlite_cell_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => json!(i),
        ValueRef::Real(f) => json!(f),
        ValueRef::Text(bytes) => json!(String::from_utf8_lossy(bytes)),
        ValueRef::Blob(_) => {
            log::warn!("Unhandled BLOB column in result set");
            Value::Null
        }
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>, DataAccessError> {
        let path = self.path.clone();
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || Self::run(&path, &sql))
            .await
            .map_err(|e| DataAccessError::Task(e.to_string()))?
    }
}

/// Postgres via a `deadpool` pool; a checked-out client goes back to the
/// pool when it is dropped.
pub struct PostgresExecutor {
    pool: Pool,
}

impl PostgresExecutor {
    pub fn from_url(url: &Url) -> Result<Self, DataAccessError> {
        let pool = pool_config(url)
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| DataAccessError::Pool(e.to_string()))?;
        Ok(Self { pool })
    }
}

fn pool_config(url: &Url) -> Config {
    let mut config = Config::new();
    config.host = url.host_str().map(ToOwned::to_owned);
    config.port = url.port();
    config.user = Some(url.username().to_owned()).filter(|u| !u.is_empty());
    config.password = url.password().map(ToOwned::to_owned);
    config.dbname = url
        .path()
        .strip_prefix('/')
        .filter(|name| !name.is_empty())
        .map(ToOwned::to_owned);
    config
}

fn pg_cell_to_json(row: &tokio_postgres::Row, i: usize) -> Value {
    let column = &row.columns()[i];
    let value = match *column.type_() {
        Type::INT2 => row.try_get::<_, Option<i16>>(i).map(|v| json!(v)),
        Type::INT4 => row.try_get::<_, Option<i32>>(i).map(|v| json!(v)),
        Type::INT8 => row.try_get::<_, Option<i64>>(i).map(|v| json!(v)),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(i).map(|v| json!(v)),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(i).map(|v| json!(v)),
        Type::BOOL => row.try_get::<_, Option<bool>>(i).map(|v| json!(v)),
        Type::VARCHAR | Type::TEXT | Type::BPCHAR | Type::NAME => {
            row.try_get::<_, Option<String>>(i).map(|v| json!(v))
        }
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(i)
            .map(|v| json!(v.map(|d| d.to_string()))),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(i)
            .map(|v| json!(v.map(|ts| ts.to_string()))),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(i)
            .map(|v| json!(v.map(|ts| ts.to_rfc3339()))),
        Type::JSON | Type::JSONB => row.try_get::<_, Option<Value>>(i).map(|v| json!(v)),
        ref other => {
            log::warn!("Unhandled column type: {other:?}");
            return Value::Null;
        }
    };
    value.unwrap_or_else(|e| {
        log::error!("Failed to get value for column {}: {e}", column.name());
        Value::Null
    })
}

#[async_trait]
impl QueryExecutor for PostgresExecutor {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>, DataAccessError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DataAccessError::Pool(e.to_string()))?;
        let rows = client
            .query(sql, &[])
            .await
            .map_err(|e| DataAccessError::Query {
                sql: sql.to_string(),
                cause: e.to_string(),
            })?;

        Ok(rows
            .iter()
            .map(|row| (0..row.len()).map(|i| pg_cell_to_json(row, i)).collect())
            .collect())
    }
}
