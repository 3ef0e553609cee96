//! Read-only execution of validated ad-hoc SQL.

use std::time::Duration;

use patrimoni_core::sql_guard::ValidatedSql;
use patrimoni_core::types::REGISTRY_SCHEMA;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, PgPool, Row, TypeInfo};

/// Rows of an ad-hoc query, each an object keyed by column name.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Value>,
}

/// Failure of [`RegistryQueryRepo::fetch_read_only`], split by whether the
/// statement itself ran.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Opening, configuring or closing the read-only transaction failed.
    #[error("Failed to prepare read-only transaction: {0}")]
    Setup(#[source] sqlx::Error),

    /// The validated statement was sent and the database refused it.
    #[error("{0}")]
    Statement(#[source] sqlx::Error),
}

/// Runs validated statements against the registry schema.
pub struct RegistryQueryRepo;

impl RegistryQueryRepo {
    /// Execute `sql` in a read-only transaction that is always rolled back.
    ///
    /// The transaction pins `search_path` to the registry schema and bounds
    /// the statement with `statement_timeout`.
    pub async fn fetch_read_only(
        pool: &PgPool,
        sql: &ValidatedSql,
        statement_timeout: Duration,
    ) -> Result<QueryRows, QueryError> {
        let mut tx = pool.begin().await.map_err(QueryError::Setup)?;
        let settings = [
            "SET TRANSACTION READ ONLY".to_string(),
            format!("SET LOCAL search_path TO {REGISTRY_SCHEMA}"),
            format!(
                "SET LOCAL statement_timeout = {}",
                statement_timeout.as_millis()
            ),
        ];
        for setting in &settings {
            sqlx::query(setting)
                .execute(&mut *tx)
                .await
                .map_err(QueryError::Setup)?;
        }

        let rows = sqlx::query(sql.as_str())
            .persistent(false)
            .fetch_all(&mut *tx)
            .await
            .map_err(QueryError::Statement)?;
        tx.rollback().await.map_err(QueryError::Setup)?;

        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        Ok(QueryRows {
            columns,
            rows: rows.iter().map(row_to_json).collect(),
        })
    }
}

/// Convert a row into a JSON object, column by column.
pub(crate) fn row_to_json(row: &PgRow) -> Value {
    let mut map = Map::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, column.type_info().name());
        map.insert(column.name().to_string(), value);
    }
    Value::Object(map)
}

fn float(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> Value {
    fn get<'r, T>(row: &'r PgRow, idx: usize) -> Option<T>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        row.try_get::<Option<T>, _>(idx).ok().flatten()
    }

    let value = match type_name {
        "BOOL" => get::<bool>(row, idx).map(Value::Bool),
        "INT2" => get::<i16>(row, idx).map(Value::from),
        "INT4" => get::<i32>(row, idx).map(Value::from),
        // 64-bit integers can exceed what JSON consumers represent exactly.
        "INT8" => get::<i64>(row, idx).map(|v| Value::String(v.to_string())),
        "FLOAT4" => get::<f32>(row, idx).map(|v| float(f64::from(v))),
        "FLOAT8" => get::<f64>(row, idx).map(float),
        "NUMERIC" => get::<rust_decimal::Decimal>(row, idx).map(|d| Value::String(d.to_string())),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "UNKNOWN" => {
            get::<String>(row, idx).map(Value::String)
        }
        "UUID" => get::<uuid::Uuid>(row, idx).map(|u| Value::String(u.to_string())),
        "DATE" => get::<chrono::NaiveDate>(row, idx).map(|d| Value::String(d.to_string())),
        "TIME" => get::<chrono::NaiveTime>(row, idx).map(|t| Value::String(t.to_string())),
        "TIMESTAMP" => get::<chrono::NaiveDateTime>(row, idx)
            .map(|ts| Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "TIMESTAMPTZ" => get::<chrono::DateTime<chrono::Utc>>(row, idx)
            .map(|ts| Value::String(ts.to_rfc3339())),
        "JSON" | "JSONB" => get::<Value>(row, idx),
        "TEXT[]" | "VARCHAR[]" => get::<Vec<String>>(row, idx)
            .map(|items| Value::Array(items.into_iter().map(Value::String).collect())),
        "INT4[]" => get::<Vec<i32>>(row, idx)
            .map(|items| Value::Array(items.into_iter().map(Value::from).collect())),
        "INT8[]" => get::<Vec<i64>>(row, idx).map(|items| {
            Value::Array(items.into_iter().map(|v| Value::String(v.to_string())).collect())
        }),
        _ => row
            .try_get_unchecked::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(Value::String),
    };
    value.unwrap_or(Value::Null)
}
