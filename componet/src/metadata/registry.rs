use super::{AttributeMetadata, ColumnType};
use crate::error::{ComponetError, ErrorContext, ResolutionKind, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument};

/// Version of the metadata document this build understands.
pub const SUPPORTED_METADATA_VERSION: u32 = 1;

const BUILTIN_METADATA: &str = include_str!("../../data/metadata.json");

/// On-disk shape of the metadata table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    pub version: u32,
    pub columns: Vec<AttributeMetadata>,
}

/// Immutable lookup table of categories and attributes.
///
/// Built once at startup and shared (usually behind an `Arc`) with the query
/// builder and the normalization engine. Nothing mutates it after load.
///
/// # Examples
///
/// ```rust
/// use componet::metadata::{ColumnType, MetadataRegistry};
///
/// let registry = MetadataRegistry::builtin().unwrap();
/// let capacitance = registry.resolve_attribute("Capacitance").unwrap();
/// assert_eq!(capacitance.column, "capacitance");
/// assert!(!registry.list_by_type(ColumnType::Category).is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct MetadataRegistry {
    version: u32,
    fingerprint: String,
    entries: Vec<AttributeMetadata>,
}

impl MetadataRegistry {
    /// Loads the table bundled with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_METADATA).context("Loading bundled metadata")
    }

    /// Loads a table from a JSON file.
    #[instrument]
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Reading metadata table {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("Loading {}", path.display()))
    }

    /// Parses and validates a metadata document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let document: MetadataDocument = serde_json::from_str(text)
            .map_err(|e| ComponetError::Configuration(format!("invalid metadata JSON: {e}")))?;
        let fingerprint = hex::encode(Sha256::digest(text.as_bytes()));
        let registry = Self::from_document(document, fingerprint)?;

        info!(
            version = registry.version,
            fingerprint = %&registry.fingerprint[..12],
            categories = registry.list_by_type(ColumnType::Category).len(),
            attributes = registry.list_by_type(ColumnType::Attribute).len(),
            "Loaded metadata registry"
        );
        Ok(registry)
    }

    /// Builds a registry from already-constructed entries.
    pub fn from_entries(entries: Vec<AttributeMetadata>) -> Result<Self> {
        let document = MetadataDocument {
            version: SUPPORTED_METADATA_VERSION,
            columns: entries,
        };
        let text = serde_json::to_string(&document)?;
        let fingerprint = hex::encode(Sha256::digest(text.as_bytes()));
        Self::from_document(document, fingerprint)
    }

    fn from_document(document: MetadataDocument, fingerprint: String) -> Result<Self> {
        if document.version != SUPPORTED_METADATA_VERSION {
            return Err(ComponetError::Configuration(format!(
                "unsupported metadata version {} (expected {SUPPORTED_METADATA_VERSION})",
                document.version
            )));
        }

        let mut seen = HashSet::new();
        for entry in &document.columns {
            if entry.name.trim().is_empty() {
                return Err(ComponetError::Configuration(
                    "metadata entry with empty name".to_string(),
                ));
            }
            if !seen.insert((entry.column_type, entry.name.as_str())) {
                return Err(ComponetError::Configuration(format!(
                    "duplicate {} name '{}'",
                    entry.column_type, entry.name
                )));
            }
            if entry.column.trim().is_empty() {
                return Err(ComponetError::Configuration(format!(
                    "{} '{}' has no storage key",
                    entry.column_type, entry.name
                )));
            }
            if entry.column_type == ColumnType::Attribute
                && entry.unit.as_deref().map_or(true, str::is_empty)
            {
                return Err(ComponetError::Configuration(format!(
                    "attribute '{}' has no unit",
                    entry.name
                )));
            }
        }

        Ok(Self {
            version: document.version,
            fingerprint,
            entries: document.columns,
        })
    }

    /// Document version the registry was loaded from.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// SHA-256 of the source document, hex encoded.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Resolves any entry by name, storage key or id.
    ///
    /// Display names win over storage keys, which win over ids, so a
    /// category key that happens to equal another entry's name cannot
    /// shadow it.
    pub fn resolve(&self, name: &str) -> Result<&AttributeMetadata> {
        self.find(name, |_| true)
            .ok_or_else(|| ComponetError::resolution(ResolutionKind::Any, name))
    }

    /// Resolves a category by name, key or id.
    pub fn resolve_category(&self, key: &str) -> Result<&AttributeMetadata> {
        self.find(key, |e| e.column_type == ColumnType::Category)
            .ok_or_else(|| ComponetError::resolution(ResolutionKind::Category, key))
    }

    /// Resolves a plottable attribute by name, shortname or id.
    pub fn resolve_attribute(&self, key: &str) -> Result<&AttributeMetadata> {
        self.find(key, |e| e.column_type == ColumnType::Attribute)
            .ok_or_else(|| ComponetError::resolution(ResolutionKind::Attribute, key))
    }

    /// Display name for a category key, if registered.
    pub fn category_name(&self, key: &str) -> Option<&str> {
        self.resolve_category(key).ok().map(|e| e.name.as_str())
    }

    /// Entries of one type offered for selection, in table order.
    pub fn list_by_type(&self, column_type: ColumnType) -> Vec<&AttributeMetadata> {
        self.entries
            .iter()
            .filter(|e| e.column_type == column_type && e.included)
            .collect()
    }

    /// Every entry, including excluded ones.
    pub fn entries(&self) -> &[AttributeMetadata] {
        &self.entries
    }

    fn find<P>(&self, key: &str, filter: P) -> Option<&AttributeMetadata>
    where
        P: Fn(&AttributeMetadata) -> bool,
    {
        let candidates = || self.entries.iter().filter(|e| filter(e));
        candidates()
            .find(|e| e.name == key)
            .or_else(|| candidates().find(|e| e.column == key))
            .or_else(|| candidates().find(|e| e.id.is_some_and(|id| id.to_string() == key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Affix;

    const SMALL: &str = r#"{
        "version": 1,
        "columns": [
            { "name": "Ceramic Capacitors", "column": "6332", "type": "Category", "id": 6332 },
            { "name": "Capacitance", "column": "capacitance", "type": "Attribute", "unit": "F", "affix": "SUFFIX" },
            { "name": "Volume", "column": "volume", "type": "Attribute", "unit": "m³", "id": -1, "computed": true, "included": false },
            { "name": "Manufacturer", "column": "part_manufacturer_name", "type": "Other" }
        ]
    }"#;

    #[test]
    fn test_resolve_by_name_key_and_id() {
        let registry = MetadataRegistry::from_json_str(SMALL).unwrap();

        assert_eq!(registry.resolve_category("Ceramic Capacitors").unwrap().column, "6332");
        assert_eq!(registry.resolve_category("6332").unwrap().name, "Ceramic Capacitors");
        assert_eq!(registry.resolve("Capacitance").unwrap().affix, Some(Affix::Suffix));
        assert_eq!(registry.resolve_attribute("capacitance").unwrap().name, "Capacitance");
        assert_eq!(registry.resolve_attribute("-1").unwrap().name, "Volume");
    }

    #[test]
    fn test_resolution_errors_are_typed() {
        let registry = MetadataRegistry::from_json_str(SMALL).unwrap();

        let err = registry.resolve_category("Capacitance").unwrap_err();
        assert!(matches!(
            err,
            ComponetError::Resolution {
                kind: ResolutionKind::Category,
                ..
            }
        ));
        assert!(registry.resolve("Flux").is_err());
        assert_eq!(registry.category_name("9999"), None);
    }

    #[test]
    fn test_list_by_type_skips_excluded() {
        let registry = MetadataRegistry::from_json_str(SMALL).unwrap();
        let attributes = registry.list_by_type(ColumnType::Attribute);
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].name, "Capacitance");
        // Excluded entries still resolve.
        assert!(registry.resolve_attribute("Volume").is_ok());
    }

    #[test]
    fn test_load_validation() {
        let wrong_version = SMALL.replace("\"version\": 1", "\"version\": 2");
        assert!(MetadataRegistry::from_json_str(&wrong_version).is_err());

        let no_unit = r#"{ "version": 1, "columns": [
            { "name": "Height", "column": "height", "type": "Attribute" } ] }"#;
        assert!(MetadataRegistry::from_json_str(no_unit).is_err());

        let duplicate = r#"{ "version": 1, "columns": [
            { "name": "Inductors", "column": "4190", "type": "Category" },
            { "name": "Inductors", "column": "4193", "type": "Category" } ] }"#;
        assert!(MetadataRegistry::from_json_str(duplicate).is_err());

        let no_key = r#"{ "version": 1, "columns": [
            { "name": "Inductors", "column": " ", "type": "Category" } ] }"#;
        assert!(MetadataRegistry::from_json_str(no_key).is_err());

        assert!(MetadataRegistry::from_json_str("not json").is_err());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = MetadataRegistry::from_json_str(SMALL).unwrap();
        let b = MetadataRegistry::from_json_str(&SMALL.replace("6332", "6331")).unwrap();
        assert_eq!(a.fingerprint().len(), 64);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.version(), SUPPORTED_METADATA_VERSION);
    }

    #[test]
    fn test_builtin_table_loads() {
        let registry = MetadataRegistry::builtin().unwrap();
        assert!(registry.resolve_category("Aluminum Electrolytic Capacitors").is_ok());
        assert!(registry.resolve_attribute("Capacitance").is_ok());
        for attribute in registry.list_by_type(ColumnType::Attribute) {
            assert!(attribute.unit.is_some(), "{} has no unit", attribute.name);
        }
    }
}
