//! DataFusion-backed catalog store.

use super::{batches_to_rows, RowSource};
use crate::config::{CatalogConfig, StoreConfig};
use crate::error::{ComponetError, Result};
use crate::log_data_op;
use crate::logging::{truncate_field, LogConfig};
use crate::rows::RawRow;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::datasource::{MemTable, TableProvider};
use datafusion::execution::context::{SessionConfig, SessionContext};
use datafusion::execution::memory_pool::{FairSpillPool, MemoryPool};
use datafusion::execution::runtime_env::RuntimeEnvBuilder;
use datafusion::prelude::CsvReadOptions;
use std::sync::Arc;
use tracing::instrument;

/// Execution settings for the store's session.
#[derive(Debug, Clone)]
pub struct CatalogStoreConfig {
    /// Batch size for query execution
    pub batch_size: usize,
    /// Target number of partitions for parallel execution
    pub target_partitions: usize,
    /// Maximum memory for query execution (in bytes)
    pub max_memory: usize,
}

impl Default for CatalogStoreConfig {
    fn default() -> Self {
        Self {
            batch_size: 8192,
            target_partitions: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4),
            max_memory: 512 * 1024 * 1024, // 512MB
        }
    }
}

/// The catalog table inside a DataFusion session.
///
/// The table is registered under the configured (possibly schema-qualified)
/// name, so the SQL the query builder emits runs unchanged against memory,
/// CSV and PostgreSQL backends.
///
/// # Examples
///
/// ```rust,ignore
/// use componet::sources::CatalogStore;
///
/// # async fn example() -> componet::error::Result<()> {
/// let store = CatalogStore::from_csv("public.final", &["data/final.csv".to_string()]).await?;
/// assert!(store.has_table());
/// # Ok(())
/// # }
/// ```
pub struct CatalogStore {
    inner: SessionContext,
    table: String,
    source_type: &'static str,
    config: CatalogStoreConfig,
    log: LogConfig,
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("table", &self.table)
            .field("source_type", &self.source_type)
            .field("config", &self.config)
            .finish()
    }
}

impl CatalogStore {
    /// Creates an empty store; register a table before querying.
    pub fn new(table: impl Into<String>) -> Result<Self> {
        Self::with_config(table, CatalogStoreConfig::default())
    }

    /// Creates an empty store with custom execution settings.
    #[instrument(skip(table, config))]
    pub fn with_config(table: impl Into<String>, config: CatalogStoreConfig) -> Result<Self> {
        let session_config = SessionConfig::new()
            .with_batch_size(config.batch_size)
            .with_target_partitions(config.target_partitions)
            .with_information_schema(true);

        let memory_pool = Arc::new(FairSpillPool::new(config.max_memory)) as Arc<dyn MemoryPool>;

        let runtime_env = RuntimeEnvBuilder::new()
            .with_memory_pool(memory_pool)
            .build()
            .map(Arc::new)?;

        Ok(Self {
            inner: SessionContext::new_with_config_rt(session_config, runtime_env),
            table: table.into(),
            source_type: "Empty",
            config,
            log: LogConfig::default(),
        })
    }

    /// Store over in-memory batches.
    pub fn from_batches(table: impl Into<String>, batches: Vec<RecordBatch>) -> Result<Self> {
        let mut store = Self::new(table)?;
        store.register_batches(batches)?;
        Ok(store)
    }

    /// Store over one or more CSV snapshots sharing a header.
    pub async fn from_csv(table: impl Into<String>, paths: &[String]) -> Result<Self> {
        let mut store = Self::new(table)?;
        store.register_csv(paths).await?;
        Ok(store)
    }

    /// Store over a live PostgreSQL table of the same name.
    #[cfg(feature = "postgres")]
    pub async fn from_postgres(
        table: impl Into<String>,
        config: &super::PostgresConfig,
    ) -> Result<Self> {
        let mut store = Self::new(table)?;
        let provider = super::postgres::table_provider(config, &store.table).await?;
        store.register_provider(provider, "PostgreSQL")?;
        Ok(store)
    }

    /// Store for the backend named in the service configuration.
    pub async fn from_config(catalog: &CatalogConfig, store: &StoreConfig) -> Result<Self> {
        match store {
            StoreConfig::Csv { paths } => Self::from_csv(catalog.table.as_str(), paths).await,
            #[cfg(feature = "postgres")]
            StoreConfig::Postgres { .. } => {
                let config = super::PostgresConfig::from_store_config(store)?;
                Self::from_postgres(catalog.table.as_str(), &config).await
            }
            #[cfg(not(feature = "postgres"))]
            StoreConfig::Postgres { .. } => Err(ComponetError::Configuration(
                "PostgreSQL store requires the 'postgres' feature".to_string(),
            )),
        }
    }

    /// Sets the logging configuration for query execution.
    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Registers in-memory batches as the catalog table.
    #[instrument(skip(self, batches), fields(table = %self.table, batches = batches.len()))]
    pub fn register_batches(&mut self, batches: Vec<RecordBatch>) -> Result<()> {
        let schema = batches
            .first()
            .map(RecordBatch::schema)
            .ok_or_else(|| ComponetError::data_source("Memory", "no batches to register"))?;
        let table = MemTable::try_new(schema, vec![batches])?;
        self.register_provider(Arc::new(table), "Memory")
    }

    /// Registers CSV files as the catalog table.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn register_csv(&mut self, paths: &[String]) -> Result<()> {
        let first = paths.first().ok_or_else(|| {
            ComponetError::Configuration("at least one CSV path must be provided".to_string())
        })?;
        let extension = std::path::Path::new(first)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let options = CsvReadOptions::new().file_extension(&extension);
        let frame = self
            .inner
            .read_csv(paths.to_vec(), options)
            .await
            .map_err(|e| {
                ComponetError::data_source_with_source(
                    "CSV",
                    format!("failed to read {}", paths.join(", ")),
                    Box::new(e),
                )
            })?;
        self.register_provider(frame.into_view(), "CSV")
    }

    fn register_provider(
        &mut self,
        provider: Arc<dyn TableProvider>,
        source_type: &'static str,
    ) -> Result<()> {
        self.inner.register_table(self.table.as_str(), provider)?;
        self.source_type = source_type;
        log_data_op!(self.log, table = %self.table, source_type, "Registered catalog table");
        Ok(())
    }

    /// Whether the catalog table is registered.
    pub fn has_table(&self) -> bool {
        self.inner.table_exist(self.table.as_str()).unwrap_or(false)
    }

    /// Registered table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Execution settings.
    pub fn config(&self) -> &CatalogStoreConfig {
        &self.config
    }

    /// The underlying DataFusion session.
    pub fn inner(&self) -> &SessionContext {
        &self.inner
    }
}

#[async_trait]
impl RowSource for CatalogStore {
    #[instrument(skip(self, sql), fields(table = %self.table, source_type = self.source_type))]
    async fn query(&self, sql: &str) -> Result<Vec<RawRow>> {
        let frame = self.inner.sql(sql).await?;
        let batches = frame.collect().await?;
        let rows = batches_to_rows(&batches)?;
        log_data_op!(
            self.log,
            rows = rows.len(),
            sql = %truncate_field(sql, self.log.max_field_length),
            "Executed catalog query"
        );
        Ok(rows)
    }

    fn description(&self) -> String {
        format!("{} catalog table '{}'", self.source_type, self.table)
    }
}
