use super::model::{
    DatasetId, DatasetVariableRow, EditionId, EditionRecord, Keyword, KeywordId, NewDataset,
    NewEdition, VariableRow,
};
use super::store::{CatalogIndex, CatalogStore, CatalogTransaction};
use crate::error::{CatalogError, Result, StoreResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

const CATALOG_TABLES: &str = include_str!("../../migrations/0001_catalog_tables.sql");

const SELECT_KEYWORDS: &str = "SELECT id, content FROM keywords ORDER BY id";

const SELECT_DATASET_VARIABLES: &str = "SELECT d.id, d.table_name, v.variable_name \
     FROM datasets d JOIN variables v ON d.id = v.dataset_id \
     ORDER BY d.id, v.id";

fn keywords_from(rows: Vec<(KeywordId, String)>) -> Vec<Keyword> {
    rows.into_iter()
        .map(|(id, content)| Keyword { id, content })
        .collect()
}

fn dataset_variables_from(rows: Vec<(DatasetId, String, String)>) -> Vec<DatasetVariableRow> {
    rows.into_iter()
        .map(|(dataset_id, table_name, variable_name)| DatasetVariableRow {
            dataset_id,
            table_name,
            variable_name,
        })
        .collect()
}

/// Postgres-backed catalog.
#[derive(Clone)]
pub struct PgCatalog {
    pool: Pool<Postgres>,
}

impl PgCatalog {
    /// Connects to the catalog database.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::CatalogUnavailable`] when no connection can be
    /// established within 10 seconds.
    pub async fn connect(options: PgConnectOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(std::time::Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| {
                CatalogError::CatalogUnavailable(format!(
                    "Failed to connect to PostgreSQL (timeout after 10s): {e}"
                ))
            })?;
        Ok(Self { pool })
    }

    /// Creates the metadata schema and the catalog tables if they are missing.
    ///
    /// The tables land in the connection's `search_path`, which
    /// [`DbSettings`](crate::config::DbSettings) points at `schema_name`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Other`] if either statement fails.
    pub async fn init_schema(&self, schema_name: &str) -> Result<()> {
        let quoted = format!("\"{}\"", schema_name.replace('"', "\"\""));
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {quoted}"))
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::Other(format!("Failed to create schema {quoted}: {e}")))?;

        sqlx::raw_sql(CATALOG_TABLES)
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::Other(format!("Failed to create catalog tables: {e}")))?;

        tracing::info!("Catalog tables ready in schema {quoted}");
        Ok(())
    }
}

type EditionRow = (
    EditionId,
    DatasetId,
    i64,
    String,
    NaiveDate,
    NaiveDate,
    NaiveDate,
    NaiveDate,
);

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn load_index(&self) -> StoreResult<CatalogIndex> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        let keywords = sqlx::query_as(SELECT_KEYWORDS)
            .fetch_all(&mut *tx)
            .await?;
        let dataset_variables = sqlx::query_as(SELECT_DATASET_VARIABLES)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(CatalogIndex {
            keywords: keywords_from(keywords),
            dataset_variables: dataset_variables_from(dataset_variables),
        })
    }

    async fn load_keywords(&self) -> StoreResult<Vec<Keyword>> {
        let rows = sqlx::query_as(SELECT_KEYWORDS)
            .fetch_all(&self.pool)
            .await?;
        Ok(keywords_from(rows))
    }

    async fn load_dataset_variables(&self) -> StoreResult<Vec<DatasetVariableRow>> {
        let rows = sqlx::query_as(SELECT_DATASET_VARIABLES)
            .fetch_all(&self.pool)
            .await?;
        Ok(dataset_variables_from(rows))
    }

    async fn load_editions(&self, dataset_id: DatasetId) -> StoreResult<Vec<EditionRecord>> {
        let rows: Vec<EditionRow> = sqlx::query_as(
            "SELECT id, dataset_id, num_records, notes, publish_date, collection_start, \
                    collection_end, acquisition_date \
             FROM editions WHERE dataset_id = $1 ORDER BY id",
        )
        .bind(dataset_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(
                |(id, dataset_id, num_records, notes, publish, start, end, acquired)| {
                    EditionRecord {
                        id,
                        dataset_id,
                        edition: NewEdition {
                            num_records,
                            notes,
                            publish_date: publish,
                            collection_start: start,
                            collection_end: end,
                            acquisition_date: acquired,
                        },
                    }
                },
            )
            .collect())
    }

    async fn begin(&self) -> StoreResult<Box<dyn CatalogTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }
}

struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CatalogTransaction for PgTransaction {
    async fn insert_dataset(&mut self, dataset: &NewDataset) -> StoreResult<DatasetId> {
        let id = sqlx::query_scalar(
            "INSERT INTO datasets (table_name, description, unit_of_analysis, universe, owner, \
                                   collector, collection_method, collection_reason, source_url, \
                                   notes, use_conditions, cadence, topic) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING id",
        )
        .bind(&dataset.table_name)
        .bind(&dataset.description)
        .bind(&dataset.unit_of_analysis)
        .bind(&dataset.universe)
        .bind(&dataset.owner)
        .bind(&dataset.collector)
        .bind(&dataset.collection_method)
        .bind(&dataset.collection_reason)
        .bind(&dataset.source_url)
        .bind(&dataset.notes)
        .bind(&dataset.use_conditions)
        .bind(dataset.cadence.as_str())
        .bind(&dataset.topic)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn insert_variables(
        &mut self,
        dataset_id: DatasetId,
        variables: &[VariableRow<'_>],
    ) -> StoreResult<()> {
        if variables.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO variables (dataset_id, variable_name, description, data_type, \
                                    parent_variable, suppression_threshold, standard_id) ",
        );
        builder.push_values(variables, |mut row, v| {
            row.push_bind(dataset_id)
                .push_bind(v.variable.variable_name.clone())
                .push_bind(v.variable.description.clone())
                .push_bind(v.variable.data_type.as_str())
                .push_bind(v.variable.parent_variable.clone())
                .push_bind(v.variable.suppression_threshold)
                .push_bind(v.standard_id);
        });
        builder.build().execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn keyword_ids(&mut self, contents: &[String]) -> StoreResult<Vec<Keyword>> {
        let rows: Vec<(KeywordId, String)> =
            sqlx::query_as("SELECT id, content FROM keywords WHERE content = ANY($1)")
                .bind(contents.to_vec())
                .fetch_all(&mut *self.tx)
                .await?;
        Ok(keywords_from(rows))
    }

    async fn insert_keywords(&mut self, contents: &[String]) -> StoreResult<Vec<Keyword>> {
        if contents.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO keywords (content) ");
        builder.push_values(contents, |mut row, content| {
            row.push_bind(content.clone());
        });
        builder.push(" RETURNING id, content");
        let rows: Vec<(KeywordId, String)> = builder
            .build_query_as()
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(keywords_from(rows))
    }

    async fn insert_tags(
        &mut self,
        dataset_id: DatasetId,
        keyword_ids: &[KeywordId],
    ) -> StoreResult<()> {
        if keyword_ids.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO tags (dataset_id, kw_id) ");
        builder.push_values(keyword_ids, |mut row, kw_id| {
            row.push_bind(dataset_id).push_bind(*kw_id);
        });
        builder.build().execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn insert_edition(
        &mut self,
        dataset_id: DatasetId,
        edition: &NewEdition,
    ) -> StoreResult<EditionId> {
        let id = sqlx::query_scalar(
            "INSERT INTO editions (dataset_id, num_records, notes, publish_date, \
                                   collection_start, collection_end, acquisition_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(dataset_id)
        .bind(edition.num_records)
        .bind(&edition.notes)
        .bind(edition.publish_date)
        .bind(edition.collection_start)
        .bind(edition.collection_end)
        .bind(edition.acquisition_date)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
