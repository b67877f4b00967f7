//! Immutable selection requests.
//!
//! A [`Selection`] is what a user picked: (category, year) pairs plus the
//! attributes to plot. It is never mutated; a new user action builds a new
//! selection. Resolving it against the registry turns names into metadata
//! once, up front, so every later stage works with typed entries.

use crate::error::{ComponetError, Result};
use crate::metadata::{AttributeMetadata, MetadataRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One requested (category, year) combination, by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionPair {
    /// Category display name, storage key or id
    pub category: String,
    /// Year label
    pub year: String,
}

impl SelectionPair {
    pub fn new(category: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            year: year.into(),
        }
    }
}

/// A user's selection, in request order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Selection {
    pairs: Vec<SelectionPair>,
    attributes: Vec<String>,
}

impl Selection {
    pub fn new<A, S>(pairs: Vec<SelectionPair>, attributes: A) -> Self
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pairs,
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a selection from parallel category and year lists, matched by
    /// position, as the query endpoint receives them.
    pub fn from_parallel<A, S>(categories: &[String], years: &[String], attributes: A) -> Result<Self>
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if categories.len() != years.len() {
            return Err(ComponetError::InvalidRequest(format!(
                "{} categories but {} years; they are matched by position",
                categories.len(),
                years.len()
            )));
        }
        let pairs = categories
            .iter()
            .zip(years)
            .map(|(c, y)| SelectionPair::new(c.as_str(), y.as_str()))
            .collect();
        Ok(Self::new(pairs, attributes))
    }

    pub fn pairs(&self) -> &[SelectionPair] {
        &self.pairs
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Resolves every name against the registry.
    ///
    /// Unknown names are `Resolution` errors. The same pair requested twice
    /// is an `InvalidRequest`: it would plot the same trace twice.
    pub fn resolve(&self, registry: &MetadataRegistry) -> Result<ResolvedSelection> {
        let mut seen = HashSet::new();
        let mut pairs = Vec::with_capacity(self.pairs.len());
        for pair in &self.pairs {
            let category = registry.resolve_category(&pair.category)?.clone();
            if !seen.insert((category.column.clone(), pair.year.clone())) {
                return Err(ComponetError::InvalidRequest(format!(
                    "'{}' ({}) is already selected",
                    category.name, pair.year
                )));
            }
            pairs.push(ResolvedPair {
                category,
                year: pair.year.clone(),
            });
        }

        let attributes = self
            .attributes
            .iter()
            .map(|name| registry.resolve_attribute(name).cloned())
            .collect::<Result<Vec<_>>>()?;

        Ok(ResolvedSelection { pairs, attributes })
    }
}

/// A selection pair with its category metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPair {
    pub category: AttributeMetadata,
    pub year: String,
}

impl ResolvedPair {
    /// Storage key of the category.
    pub fn category_key(&self) -> &str {
        &self.category.column
    }
}

/// A selection with every name resolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedSelection {
    pub pairs: Vec<ResolvedPair>,
    pub attributes: Vec<AttributeMetadata>,
}
