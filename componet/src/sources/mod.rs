//! Row sources the fetcher executes catalog queries against.
//!
//! [`RowSource`] is the seam: the fetcher only needs "run this SQL, give me
//! rows". [`CatalogStore`] implements it on top of DataFusion, with the
//! catalog table registered from memory, CSV snapshots or (feature
//! `postgres`) a live PostgreSQL table.

use crate::error::Result;
use crate::rows::RawRow;
use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

mod store;

#[cfg(feature = "postgres")]
mod postgres;

pub use store::{CatalogStore, CatalogStoreConfig};

#[cfg(feature = "postgres")]
pub use postgres::PostgresConfig;

/// Something that can execute a catalog query.
///
/// # Examples
///
/// ```rust,ignore
/// use componet::sources::{CatalogStore, RowSource};
///
/// # async fn example() -> componet::error::Result<()> {
/// let store = CatalogStore::from_csv("public.final", &["data/final.csv".to_string()]).await?;
/// let rows = store.query(r#"SELECT "part_mpn" FROM "public"."final""#).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait RowSource: Debug + Send + Sync {
    /// Executes `sql` and returns every row as text cells.
    async fn query(&self, sql: &str) -> Result<Vec<RawRow>>;

    /// Returns a human-readable description of this source.
    fn description(&self) -> String;
}

#[async_trait]
impl<T: RowSource + ?Sized> RowSource for Arc<T> {
    async fn query(&self, sql: &str) -> Result<Vec<RawRow>> {
        (**self).query(sql).await
    }

    fn description(&self) -> String {
        (**self).description()
    }
}

/// Converts Arrow batches into text rows.
///
/// Null cells become `None`; everything else is rendered with Arrow's display
/// formatting, so numbers come out as `"3.5"` and strings verbatim.
pub fn batches_to_rows(batches: &[RecordBatch]) -> Result<Vec<RawRow>> {
    let total = batches.iter().map(RecordBatch::num_rows).sum();
    let mut rows = Vec::with_capacity(total);
    for batch in batches {
        let schema = batch.schema();
        for row_index in 0..batch.num_rows() {
            let mut row = RawRow::new();
            for (field, column) in schema.fields().iter().zip(batch.columns()) {
                let value = if column.is_null(row_index) {
                    None
                } else {
                    Some(array_value_to_string(column, row_index)?)
                };
                row.insert(field.name().as_str(), value);
            }
            rows.push(row);
        }
    }
    Ok(rows)
}
