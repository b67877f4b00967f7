//! SQL generation for one category and a list of attributes.
//!
//! Every identifier placed in the query comes from the registry or the
//! catalog configuration and is validated and double-quoted; every literal is
//! single-quoted with embedded quotes doubled. Caller text never reaches the
//! SQL without going through the registry first.

use crate::config::CatalogConfig;
use crate::error::Result;
use crate::metadata::{AttributeMetadata, MetadataRegistry};
use crate::security::SqlSecurity;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Builds catalog queries.
///
/// # Examples
///
/// ```rust
/// use componet::config::CatalogConfig;
/// use componet::metadata::MetadataRegistry;
/// use componet::query::QueryBuilder;
/// use std::sync::Arc;
///
/// let builder = QueryBuilder::new(
///     Arc::new(MetadataRegistry::builtin().unwrap()),
///     CatalogConfig::default(),
/// );
/// let sql = builder.build("6331", &["Capacitance"]).unwrap();
/// assert!(sql.contains(r#""part_specs_capacitance_display_value" IS NOT NULL"#));
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    registry: Arc<MetadataRegistry>,
    catalog: CatalogConfig,
}

impl QueryBuilder {
    pub fn new(registry: Arc<MetadataRegistry>, catalog: CatalogConfig) -> Self {
        Self { registry, catalog }
    }

    pub fn catalog(&self) -> &CatalogConfig {
        &self.catalog
    }

    /// Query for every row of a category, whatever its year.
    pub fn build<S: AsRef<str>>(&self, category: &str, attributes: &[S]) -> Result<String> {
        let (category, attributes) = self.resolve(category, attributes)?;
        self.build_resolved(&category, None, &attributes)
    }

    /// Query restricted to one year label.
    pub fn build_for_year<S: AsRef<str>>(
        &self,
        category: &str,
        year: &str,
        attributes: &[S],
    ) -> Result<String> {
        let (category, attributes) = self.resolve(category, attributes)?;
        self.build_resolved(&category, Some(year), &attributes)
    }

    fn resolve<S: AsRef<str>>(
        &self,
        category: &str,
        attributes: &[S],
    ) -> Result<(AttributeMetadata, Vec<AttributeMetadata>)> {
        let category = self.registry.resolve_category(category)?.clone();
        let attributes = attributes
            .iter()
            .map(|a| self.registry.resolve_attribute(a.as_ref()).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok((category, attributes))
    }

    /// Storage columns a query for `attributes` selects, in select order.
    pub fn selected_columns(&self, attributes: &[AttributeMetadata]) -> Vec<String> {
        let mut columns = Vec::with_capacity(attributes.len() + 2);
        columns.push(self.catalog.mpn_column.clone());
        columns.push(self.catalog.manufacturer_column.clone());
        columns.extend(attributes.iter().map(|a| self.catalog.attribute_column(a)));
        columns
    }

    /// Query for already-resolved metadata.
    #[instrument(skip_all, fields(category = %category.column, year = ?year, attributes = attributes.len()))]
    pub fn build_resolved(
        &self,
        category: &AttributeMetadata,
        year: Option<&str>,
        attributes: &[AttributeMetadata],
    ) -> Result<String> {
        let columns = self.selected_columns(attributes);
        let quoted = columns
            .iter()
            .map(|c| SqlSecurity::escape_identifier(c))
            .collect::<Result<Vec<_>>>()?;

        let mut sql = format!(
            "SELECT {} FROM {} WHERE {} = {}",
            quoted.join(", "),
            SqlSecurity::escape_qualified_name(&self.catalog.table)?,
            SqlSecurity::escape_identifier(&self.catalog.category_column)?,
            SqlSecurity::escape_literal(&category.column)?,
        );

        let placeholder = SqlSecurity::escape_literal(&self.catalog.placeholder)?;
        for column in &quoted[2..] {
            sql.push_str(&format!(
                " AND {column} IS NOT NULL AND {column} != {placeholder}"
            ));
        }

        if let Some(year) = year {
            sql.push_str(&format!(
                " AND {} = {}",
                SqlSecurity::escape_identifier(&self.catalog.year_column)?,
                SqlSecurity::escape_literal(year)?
            ));
        }

        debug!(sql = %sql, "Built catalog query");
        Ok(sql)
    }
}
