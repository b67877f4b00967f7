//! Category and attribute metadata.
//!
//! The catalog stores one wide table whose columns are named after attribute
//! shortnames and whose rows are keyed by a numeric category id. This module
//! maps the human-readable names the UI shows onto those storage identifiers,
//! together with the display unit and its placement.

mod registry;

pub use registry::{MetadataDocument, MetadataRegistry, SUPPORTED_METADATA_VERSION};

use crate::model::Affix;
use serde::{Deserialize, Serialize};

/// Kind of registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// A component category; `column` holds the category key.
    Category,
    /// A plottable numeric attribute; `column` holds the shortname.
    Attribute,
    /// Any other column (identity fields, free text).
    Other,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Category => write!(f, "Category"),
            ColumnType::Attribute => write!(f, "Attribute"),
            ColumnType::Other => write!(f, "Other"),
        }
    }
}

/// One selectable attribute or category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMetadata {
    /// Human-readable label, unique within its type
    pub name: String,
    /// Storage identifier: category key or column shortname
    pub column: String,
    /// Entry kind
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Default display unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Default unit placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affix: Option<Affix>,
    /// External identifier; negative values mark custom attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Derived rather than stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed: Option<bool>,
    /// Offered for selection
    #[serde(default = "default_included")]
    pub included: bool,
}

fn default_included() -> bool {
    true
}

impl AttributeMetadata {
    /// Creates a category entry keyed by `key`.
    pub fn category(name: impl Into<String>, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            name: name.into(),
            id: key.parse().ok(),
            column: key,
            column_type: ColumnType::Category,
            unit: None,
            affix: None,
            computed: None,
            included: true,
        }
    }

    /// Creates an attribute entry with a suffix unit.
    pub fn attribute(
        name: impl Into<String>,
        shortname: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            column: shortname.into(),
            column_type: ColumnType::Attribute,
            unit: Some(unit.into()),
            affix: Some(Affix::Suffix),
            id: None,
            computed: None,
            included: true,
        }
    }

    /// Sets the external id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the default affix.
    pub fn with_affix(mut self, affix: Affix) -> Self {
        self.affix = Some(affix);
        self
    }

    /// Marks the entry as derived.
    pub fn with_computed(mut self, computed: bool) -> Self {
        self.computed = Some(computed);
        self
    }

    /// Custom attributes bypass the display-value column convention.
    pub fn is_custom(&self) -> bool {
        self.id.is_some_and(|id| id < 0)
    }

    pub fn is_computed(&self) -> bool {
        self.computed.unwrap_or(false)
    }

    /// Whether values of this attribute are prices.
    pub fn is_currency(&self) -> bool {
        self.unit.as_deref() == Some("$")
            || self.name.to_lowercase().contains("price")
            || self.column.to_lowercase().contains("price")
    }

    /// Whether `key` names this entry by label, storage key or id.
    pub fn matches(&self, key: &str) -> bool {
        self.name == key
            || self.column == key
            || self.id.is_some_and(|id| id.to_string() == key)
    }
}
