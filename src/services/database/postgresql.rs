// PostgreSQL data store backed by the shared connection pool
use crate::api::middleware::AppError;
use crate::services::database::adapter::{DataStore, Row, SqlParam};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use deadpool_postgres::Pool;
use serde_json::{json, Value};
use std::time::Instant;
use tokio_postgres::types::{ToSql, Type};

pub struct PostgresStore {
    pool: Pool,
    debug_sql: bool,
}

impl PostgresStore {
    pub fn new(pool: Pool, debug_sql: bool) -> Self {
        Self { pool, debug_sql }
    }

    fn describe_error(e: &tokio_postgres::Error) -> String {
        if let Some(db_error) = e.as_db_error() {
            format!(
                "Code: {}, Message: {}, Detail: {}, Hint: {}",
                db_error.code().code(),
                db_error.message(),
                db_error.detail().unwrap_or(""),
                db_error.hint().unwrap_or("")
            )
        } else {
            e.to_string()
        }
    }

    fn is_explainable(sql: &str) -> bool {
        sql.trim_start().to_ascii_uppercase().starts_with("SELECT")
    }

    async fn log_query_plan(
        client: &tokio_postgres::Client,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) {
        let explain_sql = format!("EXPLAIN (ANALYZE, FORMAT JSON) {}", sql);
        match client.query(explain_sql.as_str(), params).await {
            Ok(rows) => {
                let plan = rows
                    .first()
                    .and_then(|row| row.try_get::<_, Value>(0).ok())
                    .unwrap_or(Value::Null);
                let plan = plan.get(0).cloned().unwrap_or(plan);
                tracing::debug!(
                    "Query plan info: {}",
                    serde_json::to_string_pretty(&plan).unwrap_or_default()
                );
            }
            Err(e) => {
                tracing::warn!("Failed to explain query: {}", Self::describe_error(&e));
            }
        }
    }

    /// Convert PostgreSQL rows to JSON objects keyed by column name
    fn rows_to_json(rows: &[tokio_postgres::Row]) -> Vec<Row> {
        rows.iter()
            .map(|row| {
                let mut row_obj = Row::new();
                for (idx, column) in row.columns().iter().enumerate() {
                    let value = Self::column_to_json(row, idx, column.type_());
                    row_obj.insert(column.name().to_string(), value);
                }
                row_obj
            })
            .collect()
    }

    fn column_to_json(row: &tokio_postgres::Row, idx: usize, pg_type: &Type) -> Value {
        match *pg_type {
            Type::INT2 => Self::optional(row.try_get::<_, Option<i16>>(idx)),
            Type::INT4 => Self::optional(row.try_get::<_, Option<i32>>(idx)),
            Type::INT8 => Self::optional(row.try_get::<_, Option<i64>>(idx)),
            Type::FLOAT4 => Self::optional(row.try_get::<_, Option<f32>>(idx)),
            Type::FLOAT8 => Self::optional(row.try_get::<_, Option<f64>>(idx)),
            Type::BOOL => Self::optional(row.try_get::<_, Option<bool>>(idx)),
            Type::DATE => Self::optional(
                row.try_get::<_, Option<NaiveDate>>(idx)
                    .map(|v| v.map(|date| date.format("%Y-%m-%d").to_string())),
            ),
            Type::TIMESTAMP => Self::optional(
                row.try_get::<_, Option<NaiveDateTime>>(idx)
                    .map(|v| v.map(|ts| ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
            ),
            Type::TIMESTAMPTZ => Self::optional(
                row.try_get::<_, Option<DateTime<Utc>>>(idx)
                    .map(|v| v.map(|ts| ts.to_rfc3339())),
            ),
            Type::JSON | Type::JSONB => row
                .try_get::<_, Option<Value>>(idx)
                .ok()
                .flatten()
                .unwrap_or(Value::Null),
            _ => match row.try_get::<_, Option<String>>(idx) {
                Ok(Some(v)) => json!(v),
                Ok(None) => Value::Null,
                Err(_) => {
                    tracing::warn!(
                        "Unsupported column type {} for column {}, using NULL",
                        pg_type.name(),
                        row.columns()[idx].name()
                    );
                    Value::Null
                }
            },
        }
    }

    fn optional<T: serde::Serialize, E>(value: Result<Option<T>, E>) -> Value {
        match value {
            Ok(Some(v)) => json!(v),
            _ => Value::Null,
        }
    }
}

#[async_trait::async_trait]
impl DataStore for PostgresStore {
    async fn query(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>, AppError> {
        // Get a connection from the pool
        let client = self.pool.get().await.map_err(|e| {
            AppError::ConnectionUnavailable(format!("Failed to get connection from pool: {}", e))
        })?;

        let params_refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p.as_tosql()).collect();

        if self.debug_sql && Self::is_explainable(sql) {
            tracing::debug!("Running DB query in debug mode");
            Self::log_query_plan(&client, sql, &params_refs).await;
        }

        let start_time = Instant::now();
        let rows = client.query(sql, &params_refs).await.map_err(|e| {
            let details = Self::describe_error(&e);
            tracing::error!("Query execution error: {}", details);
            AppError::Database(format!("Query execution failed: {}", details))
        })?;

        tracing::debug!(
            "Query returned {} rows in {}ms",
            rows.len(),
            start_time.elapsed().as_millis()
        );

        Ok(Self::rows_to_json(&rows))
    }
}
