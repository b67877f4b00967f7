//! Configuration for the catalog layout and the query service.
//!
//! [`CatalogConfig`] describes the single wide table the catalog lives in:
//! where the identity columns are, how attribute shortnames map to column
//! names, and which placeholder marks missing values. [`ServiceConfig`] adds
//! the runtime knobs of the service around it.

use crate::error::{ComponetError, ErrorContext, Result};
use crate::metadata::AttributeMetadata;
use crate::normalize::MixedUnitPolicy;
use crate::security::SqlSecurity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Layout of the catalog table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Possibly schema-qualified table name
    pub table: String,
    /// Manufacturer part number column
    pub mpn_column: String,
    /// Manufacturer name column
    pub manufacturer_column: String,
    /// Column holding the category key
    pub category_column: String,
    /// Column holding the year label; also the row field the fetcher tags
    pub year_column: String,
    /// Whether per-year queries filter on `year_column`. When off, the year
    /// is only a label and every year sees the whole category.
    pub filter_by_year: bool,
    /// Prefix of the display-value column naming convention
    pub attribute_prefix: String,
    /// Suffix of the display-value column naming convention
    pub attribute_suffix: String,
    /// Literal the upstream catalog stores for missing values
    pub placeholder: String,
    /// Years offered for selection
    pub years: Vec<String>,
    /// Label for rows that carry no year field
    pub default_year: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            table: "public.final".to_string(),
            mpn_column: "part_mpn".to_string(),
            manufacturer_column: "part_manufacturer_name".to_string(),
            category_column: "part_category_id".to_string(),
            year_column: "year".to_string(),
            filter_by_year: false,
            attribute_prefix: "part_specs_".to_string(),
            attribute_suffix: "_display_value".to_string(),
            placeholder: "nan".to_string(),
            years: vec!["2022".to_string(), "2023".to_string()],
            default_year: "2023".to_string(),
        }
    }
}

impl CatalogConfig {
    /// Sets the catalog table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Sets the identity column names.
    pub fn with_identity_columns(
        mut self,
        mpn: impl Into<String>,
        manufacturer: impl Into<String>,
    ) -> Self {
        self.mpn_column = mpn.into();
        self.manufacturer_column = manufacturer.into();
        self
    }

    /// Sets the years offered for selection; the last one becomes the default.
    pub fn with_years<I, S>(mut self, years: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.years = years.into_iter().map(Into::into).collect();
        if let Some(last) = self.years.last() {
            self.default_year = last.clone();
        }
        self
    }

    /// Turns year filtering on or off.
    pub fn with_year_filter(mut self, enabled: bool) -> Self {
        self.filter_by_year = enabled;
        self
    }

    /// Storage column for an attribute.
    ///
    /// Custom attributes (negative id) are stored under their column as-is;
    /// everything else follows the display-value convention.
    pub fn attribute_column(&self, attribute: &AttributeMetadata) -> String {
        if attribute.is_custom() {
            attribute.column.clone()
        } else {
            format!(
                "{}{}{}",
                self.attribute_prefix, attribute.column, self.attribute_suffix
            )
        }
    }

    /// Checks that every configured identifier is safe to place in SQL.
    pub fn validate(&self) -> Result<()> {
        SqlSecurity::escape_qualified_name(&self.table)?;
        for column in [
            &self.mpn_column,
            &self.manufacturer_column,
            &self.category_column,
            &self.year_column,
        ] {
            SqlSecurity::validate_identifier(column)?;
        }
        if self.years.is_empty() {
            return Err(ComponetError::Configuration(
                "catalog must offer at least one year".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the catalog rows come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// CSV snapshot(s) of the catalog table, loaded into DataFusion
    Csv { paths: Vec<String> },
    /// Live PostgreSQL table; the password is read from
    /// `COMPONET_PG_PASSWORD` at connect time
    Postgres {
        host: String,
        port: u16,
        database: String,
        username: String,
        #[serde(default)]
        sslmode: Option<String>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Csv {
            paths: vec!["data/final.csv".to_string()],
        }
    }
}

/// Runtime configuration of the query service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Catalog table layout
    pub catalog: CatalogConfig,
    /// Metadata table; `None` uses the bundled table
    pub metadata_path: Option<PathBuf>,
    /// Upper bound on concurrently executing per-pair queries
    pub max_concurrent_queries: usize,
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Row store
    pub store: StoreConfig,
    /// How mixed units inside one group are handled
    pub mixed_unit_policy: MixedUnitPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            metadata_path: None,
            max_concurrent_queries: 20,
            bind_address: "0.0.0.0:5555".to_string(),
            store: StoreConfig::default(),
            mixed_unit_policy: MixedUnitPolicy::default(),
        }
    }
}

impl ServiceConfig {
    /// Configuration suitable for tests and local exploration.
    pub fn development() -> Self {
        Self {
            bind_address: "127.0.0.1:5555".to_string(),
            max_concurrent_queries: 4,
            ..Self::default()
        }
    }

    /// Loads configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Reading service config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| ComponetError::Configuration(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from `COMPONET_CONFIG` (or defaults) and applies
    /// the `COMPONET_BIND`, `COMPONET_METADATA` and
    /// `COMPONET_MAX_CONCURRENCY` overrides.
    pub fn from_env() -> Result<Self> {
        let base = match std::env::var("COMPONET_CONFIG") {
            Ok(path) => Self::from_path(path)?,
            Err(_) => Self::default(),
        };
        base.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("COMPONET_BIND") {
            self.bind_address = bind;
        }
        if let Some(path) = lookup("COMPONET_METADATA") {
            self.metadata_path = Some(PathBuf::from(path));
        }
        if let Some(limit) = lookup("COMPONET_MAX_CONCURRENCY") {
            self.max_concurrent_queries = limit.parse().map_err(|_| {
                ComponetError::Configuration(format!(
                    "COMPONET_MAX_CONCURRENCY must be a positive integer, got '{limit}'"
                ))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Sets the concurrency bound.
    pub fn with_max_concurrent_queries(mut self, limit: usize) -> Self {
        self.max_concurrent_queries = limit;
        self
    }

    /// Sets the catalog layout.
    pub fn with_catalog(mut self, catalog: CatalogConfig) -> Self {
        self.catalog = catalog;
        self
    }

    /// Sets the mixed-unit policy.
    pub fn with_mixed_unit_policy(mut self, policy: MixedUnitPolicy) -> Self {
        self.mixed_unit_policy = policy;
        self
    }

    /// Validates the whole configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_queries == 0 {
            return Err(ComponetError::Configuration(
                "max_concurrent_queries must be at least 1".to_string(),
            ));
        }
        self.catalog.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ColumnType;
    use std::collections::HashMap;

    fn attribute(column: &str, id: Option<i64>) -> AttributeMetadata {
        AttributeMetadata {
            name: "Test".to_string(),
            column: column.to_string(),
            column_type: ColumnType::Attribute,
            unit: Some("F".to_string()),
            affix: None,
            id,
            computed: None,
            included: true,
        }
    }

    #[test]
    fn test_attribute_column_convention() {
        let config = CatalogConfig::default();
        assert_eq!(
            config.attribute_column(&attribute("capacitance", Some(12))),
            "part_specs_capacitance_display_value"
        );
        assert_eq!(
            config.attribute_column(&attribute("capacitance", None)),
            "part_specs_capacitance_display_value"
        );
        assert_eq!(config.attribute_column(&attribute("volume", Some(-1))), "volume");
    }

    #[test]
    fn test_default_catalog_is_valid() {
        assert!(CatalogConfig::default().validate().is_ok());
        assert!(ServiceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_catalog_identifiers() {
        let config = CatalogConfig::default().with_table("public.final; DROP TABLE x");
        assert!(config.validate().is_err());

        let config = CatalogConfig::default().with_identity_columns("part mpn", "m");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_years_sets_default() {
        let config = CatalogConfig::default().with_years(["2021", "2024"]);
        assert_eq!(config.default_year, "2024");
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("COMPONET_BIND", "127.0.0.1:8080"),
            ("COMPONET_MAX_CONCURRENCY", "3"),
        ]
        .into_iter()
        .collect();

        let config = ServiceConfig::default()
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.max_concurrent_queries, 3);

        let bad = ServiceConfig::default()
            .apply_overrides(|k| (k == "COMPONET_MAX_CONCURRENCY").then(|| "0".to_string()));
        assert!(bad.is_err());
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.json");
        std::fs::write(
            &path,
            r#"{
                "max_concurrent_queries": 8,
                "store": { "kind": "csv", "paths": ["parts.csv"] },
                "mixed_unit_policy": "reject"
            }"#,
        )
        .unwrap();

        let config = ServiceConfig::from_path(&path).unwrap();
        assert_eq!(config.max_concurrent_queries, 8);
        assert_eq!(config.catalog, CatalogConfig::default());
        assert_eq!(config.mixed_unit_policy, MixedUnitPolicy::Reject);
        assert_eq!(
            config.store,
            StoreConfig::Csv {
                paths: vec!["parts.csv".to_string()]
            }
        );
    }
}
