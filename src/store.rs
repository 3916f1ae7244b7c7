//! PostgreSQL-backed repository and database bootstrap.

use crate::entity::EntityRecord;
use crate::error::AppError;
use crate::mapper::RowMapper;
use crate::page::Pageable;
use crate::repository::{EntityRepository, EntityStream, STREAM_BUFFER};
use crate::schema::{EntityRegistry, EntitySchema, FieldKind};
use crate::sql::{self, ColumnEq, PgParam, ENTITY_ALIAS};
use futures::StreamExt;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, ConnectOptions, PgPool, Row};
use std::str::FromStr;
use std::sync::Arc;

/// Repository over an `sqlx` Postgres pool for one entity kind.
///
/// Holds no cross-call state; each operation is a single statement. Cloning
/// shares the pool and schema.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
    schema: Arc<EntitySchema>,
}

impl PgRepository {
    pub fn new(pool: PgPool, schema: Arc<EntitySchema>) -> Self {
        Self { pool, schema }
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    /// Bind values for a write, in schema field order (identity excluded).
    fn write_params(&self, record: &EntityRecord) -> Vec<PgParam> {
        self.schema
            .data_fields()
            .iter()
            .map(|f| PgParam::from(record.value(&f.name)))
            .collect()
    }

    async fn fetch_optional_mapped(
        &self,
        stmt: &str,
        params: Vec<PgParam>,
    ) -> Result<Option<EntityRecord>, AppError> {
        tracing::debug!(sql = %stmt, "query");
        let mut query = sqlx::query(stmt);
        for p in params {
            query = query.bind(p);
        }
        match query.fetch_optional(&self.pool).await? {
            Some(row) => {
                let decoded = row_to_values(&row);
                RowMapper::new(&self.schema)
                    .to_entity(&decoded, ENTITY_ALIAS)
                    .map(Some)
            }
            None => Ok(None),
        }
    }
}

impl EntityRepository for PgRepository {
    fn find_all(&self, pageable: Option<&Pageable>) -> EntityStream {
        let stmt = sql::select(&self.schema, ENTITY_ALIAS, None, pageable);
        let pool = self.pool.clone();
        let schema = self.schema.clone();
        let (tx, stream) = EntityStream::channel(STREAM_BUFFER);
        tokio::spawn(async move {
            tracing::debug!(sql = %stmt, "stream query");
            let mut rows = sqlx::query(&stmt).fetch(&pool);
            while let Some(next) = rows.next().await {
                let item = next.map_err(AppError::from).and_then(|row| {
                    let decoded = row_to_values(&row);
                    RowMapper::new(&schema).to_entity(&decoded, ENTITY_ALIAS)
                });
                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    break;
                }
            }
        });
        stream
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<EntityRecord>, AppError> {
        let stmt = sql::select(&self.schema, ENTITY_ALIAS, Some(&ColumnEq::id(id)), None);
        self.fetch_optional_mapped(&stmt, Vec::new()).await
    }

    async fn save(&self, record: &EntityRecord) -> Result<Option<EntityRecord>, AppError> {
        match record.id {
            None => {
                let stmt = sql::insert(&self.schema, ENTITY_ALIAS);
                self.fetch_optional_mapped(&stmt, self.write_params(record))
                    .await
            }
            Some(id) => {
                let stmt = sql::update(&self.schema, ENTITY_ALIAS);
                let mut params = self.write_params(record);
                params.push(PgParam::Int(id));
                self.fetch_optional_mapped(&stmt, params).await
            }
        }
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool, AppError> {
        let stmt = sql::exists(&self.schema);
        tracing::debug!(sql = %stmt, "query");
        let row = sqlx::query(&stmt)
            .bind(PgParam::Int(id))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("present")?)
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), AppError> {
        let stmt = sql::delete(&self.schema);
        tracing::debug!(sql = %stmt, "query");
        let result = sqlx::query(&stmt)
            .bind(PgParam::Int(id))
            .execute(&self.pool)
            .await?;
        tracing::debug!(rows = result.rows_affected(), "delete");
        Ok(())
    }
}

/// Decode a fetched row into a JSON map keyed by the aliased column names.
fn row_to_values(row: &PgRow) -> Map<String, Value> {
    let mut map = Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    Value::Null
}

/// Create the backing table for every registered schema if missing.
/// Identity columns are store-assigned (`GENERATED BY DEFAULT AS IDENTITY`).
pub async fn ensure_entity_tables(
    pool: &PgPool,
    registry: &EntityRegistry,
) -> Result<(), AppError> {
    for schema in registry.entities() {
        let mut columns = vec![format!(
            "{} BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY",
            sql::quoted("id")
        )];
        for field in schema.data_fields() {
            let pg_type = match field.kind {
                FieldKind::Text => "TEXT",
                FieldKind::Date => "DATE",
                FieldKind::Identity => "BIGINT",
            };
            columns.push(format!("{} {}", sql::quoted(&field.column), pg_type));
        }
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            sql::quoted(schema.table()),
            columns.join(", ")
        );
        tracing::debug!(sql = %ddl, "ddl");
        sqlx::query(&ddl).execute(pool).await?;
    }
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects
/// to the default `postgres` database to run CREATE DATABASE. Call before
/// creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {e}")))?;
    let mut conn: sqlx::PgConnection = opts.connect().await.map_err(AppError::Db)?;
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&db_name)
            .fetch_one(&mut conn)
            .await
            .map_err(AppError::Db)?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", sql::quoted(&db_name)))
            .execute(&mut conn)
            .await
            .map_err(AppError::Db)?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{base}postgres");
    Ok((admin_url, db_name.to_string()))
}
