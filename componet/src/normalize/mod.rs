//! Normalization of raw catalog rows into the [`Components`] model.
//!
//! For every (category, year) group the engine copies the identity columns
//! verbatim and turns each requested attribute column into an [`Axis`]:
//! the numeric magnitude of each cell is parsed, scaled by any SI prefix in
//! its unit text, and the axis unit and affix are taken from the first
//! well-formed row.
//!
//! Cell problems never fail a batch. A cell with no parseable number becomes
//! `0.0`. A group that yields no rows is omitted and reported as skipped.
//!
//! # Example
//!
//! ```rust
//! use componet::metadata::{AttributeMetadata, MetadataRegistry};
//! use componet::normalize::NormalizationEngine;
//! use componet::rows::{RawResponse, RawRow};
//! use componet::config::CatalogConfig;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(MetadataRegistry::from_entries(vec![
//!     AttributeMetadata::category("Ceramic Capacitors", "6332"),
//!     AttributeMetadata::attribute("Capacitance", "capacitance", "F"),
//! ]).unwrap());
//! let engine = NormalizationEngine::new(registry.clone(), CatalogConfig::default());
//!
//! let mut raw = RawResponse::new();
//! raw.extend("6332", vec![RawRow::from_pairs([
//!     ("part_mpn", Some("GRM188".to_string())),
//!     ("part_manufacturer_name", Some("Murata".to_string())),
//!     ("part_specs_capacitance_display_value", Some("100 nF".to_string())),
//! ])]);
//!
//! let capacitance = registry.resolve_attribute("Capacitance").unwrap().clone();
//! let components = engine.normalize(&raw, &[capacitance]).into_components().unwrap();
//! assert_eq!(components.components[0].axes[0].data, vec![1e-7]);
//! ```

pub mod si;
pub mod value;

use crate::config::CatalogConfig;
use crate::logging::LogConfig;
use crate::metadata::{AttributeMetadata, MetadataRegistry};
use crate::model::{Affix, Axis, Component, Components};
use crate::rows::{RawResponse, RawRow};
use crate::selection::ResolvedSelection;
use crate::{log_cell, perf_debug};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};

/// Category label used when a raw key has no registry entry.
pub const UNDEFINED_CATEGORY: &str = "Undefined";

/// How an attribute whose rows disagree on the base unit is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixedUnitPolicy {
    /// Keep the first row's unit for the whole axis and record a warning.
    #[default]
    Coerce,
    /// Drop the whole group and report it as skipped.
    Reject,
}

/// Engine options.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    pub mixed_unit_policy: MixedUnitPolicy,
    pub log: LogConfig,
}

/// Identifies one (category, year) group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroupKey {
    /// Category display name
    pub category: String,
    pub year: String,
}

impl GroupKey {
    pub fn new(category: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            year: year.into(),
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.category, self.year)
    }
}

/// Why a group produced no component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The store returned no rows for the group.
    NoRows,
    /// An attribute mixed base units under [`MixedUnitPolicy::Reject`].
    MixedUnits {
        attribute: String,
        expected: String,
        found: String,
    },
}

/// A requested group that was omitted from the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedGroup {
    pub group: GroupKey,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Rows of one axis whose base unit differs from the axis unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityWarning {
    pub group: GroupKey,
    /// Attribute display name
    pub attribute: String,
    /// Unit kept for the axis
    pub expected: String,
    /// First conflicting unit seen
    pub found: String,
    /// Number of conflicting rows
    pub rows: usize,
}

impl std::fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: '{}' mixes units, kept '{}' but {} row(s) use '{}'",
            self.group, self.attribute, self.expected, self.rows, self.found
        )
    }
}

/// Output of a run that emitted at least one component.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedBatch {
    pub components: Components,
    pub skipped: Vec<SkippedGroup>,
    pub warnings: Vec<DataQualityWarning>,
    /// Cells that had no parseable number and became `0.0`
    pub malformed_cells: usize,
}

/// Result of a normalization run.
///
/// `NoData` is a distinct condition, not an empty success: callers use it to
/// tell the user that the selection matched nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeOutcome {
    Data(NormalizedBatch),
    NoData { skipped: Vec<SkippedGroup> },
}

impl NormalizeOutcome {
    pub fn is_no_data(&self) -> bool {
        matches!(self, NormalizeOutcome::NoData { .. })
    }

    pub fn components(&self) -> Option<&Components> {
        match self {
            NormalizeOutcome::Data(batch) => Some(&batch.components),
            NormalizeOutcome::NoData { .. } => None,
        }
    }

    pub fn into_components(self) -> Option<Components> {
        match self {
            NormalizeOutcome::Data(batch) => Some(batch.components),
            NormalizeOutcome::NoData { .. } => None,
        }
    }

    /// Groups that were requested but omitted.
    pub fn skipped(&self) -> &[SkippedGroup] {
        match self {
            NormalizeOutcome::Data(batch) => &batch.skipped,
            NormalizeOutcome::NoData { skipped } => skipped,
        }
    }
}

/// One cell after parsing.
#[derive(Debug, Clone, PartialEq)]
struct ParsedCell {
    value: f64,
    /// Base unit after removing the SI prefix; empty when the cell has none
    unit: String,
    affix: Option<Affix>,
    well_formed: bool,
}

/// Per-run accumulator.
#[derive(Default)]
struct Collector {
    components: Vec<Component>,
    skipped: Vec<SkippedGroup>,
    warnings: Vec<DataQualityWarning>,
    malformed_cells: usize,
}

impl Collector {
    fn finish(self) -> NormalizeOutcome {
        if self.components.is_empty() {
            NormalizeOutcome::NoData {
                skipped: self.skipped,
            }
        } else {
            NormalizeOutcome::Data(NormalizedBatch {
                components: Components::new(self.components),
                skipped: self.skipped,
                warnings: self.warnings,
                malformed_cells: self.malformed_cells,
            })
        }
    }
}

struct MixedUnits {
    expected: String,
    found: String,
    rows: usize,
}

/// Converts raw rows into [`Components`].
///
/// Holds no mutable state; one engine can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct NormalizationEngine {
    registry: Arc<MetadataRegistry>,
    catalog: CatalogConfig,
    options: NormalizeOptions,
}

impl NormalizationEngine {
    pub fn new(registry: Arc<MetadataRegistry>, catalog: CatalogConfig) -> Self {
        Self {
            registry,
            catalog,
            options: NormalizeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_mixed_unit_policy(mut self, policy: MixedUnitPolicy) -> Self {
        self.options.mixed_unit_policy = policy;
        self
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Normalizes every group present in `raw`.
    ///
    /// Groups are formed per category key and, within it, per year label in
    /// order of first appearance. Rows without a year field fall under the
    /// catalog's default year.
    #[instrument(skip_all, fields(categories = raw.category_keys().count(), attributes = attributes.len()))]
    pub fn normalize(&self, raw: &RawResponse, attributes: &[AttributeMetadata]) -> NormalizeOutcome {
        let mut collector = Collector::default();
        for (key, rows) in raw.iter() {
            let category = self
                .registry
                .category_name(key)
                .unwrap_or(UNDEFINED_CATEGORY)
                .to_string();

            if rows.is_empty() {
                let group = GroupKey::new(category, self.catalog.default_year.as_str());
                collector.skipped.push(SkippedGroup {
                    group,
                    reason: SkipReason::NoRows,
                });
                continue;
            }

            let mut years: Vec<&str> = Vec::new();
            for row in rows {
                let year = self.row_year(row);
                if !years.contains(&year) {
                    years.push(year);
                }
            }
            for year in years {
                let group_rows: Vec<&RawRow> =
                    rows.iter().filter(|r| self.row_year(r) == year).collect();
                self.build_group(GroupKey::new(category.as_str(), year), &group_rows, attributes, &mut collector);
            }
        }
        collector.finish()
    }

    /// Normalizes exactly the requested pairs, in request order.
    ///
    /// Every pair yields at most one component, labelled with the category's
    /// display name and the pair's year.
    #[instrument(skip_all, fields(pairs = selection.pairs.len(), attributes = selection.attributes.len()))]
    pub fn normalize_selection(&self, raw: &RawResponse, selection: &ResolvedSelection) -> NormalizeOutcome {
        let mut collector = Collector::default();
        for pair in &selection.pairs {
            let group_rows: Vec<&RawRow> = raw
                .rows(pair.category_key())
                .iter()
                .filter(|r| self.row_year(r) == pair.year)
                .collect();
            let group = GroupKey::new(pair.category.name.as_str(), pair.year.as_str());
            self.build_group(group, &group_rows, &selection.attributes, &mut collector);
        }
        collector.finish()
    }

    fn row_year<'a>(&'a self, row: &'a RawRow) -> &'a str {
        row.get(&self.catalog.year_column)
            .unwrap_or(self.catalog.default_year.as_str())
    }

    fn build_group(
        &self,
        group: GroupKey,
        rows: &[&RawRow],
        attributes: &[AttributeMetadata],
        collector: &mut Collector,
    ) {
        if rows.is_empty() {
            perf_debug!(self.options.log, group = %group, "Skipping group without rows");
            collector.skipped.push(SkippedGroup {
                group,
                reason: SkipReason::NoRows,
            });
            return;
        }

        let mut axes = Vec::with_capacity(attributes.len());
        let mut warnings = Vec::new();
        let mut malformed = 0;
        for attribute in attributes {
            let (axis, bad_cells, mixed) = self.build_axis(&group, attribute, rows);
            malformed += bad_cells;
            if let Some(mixed) = mixed {
                warn!(
                    group = %group,
                    attribute = %attribute.name,
                    expected = %mixed.expected,
                    found = %mixed.found,
                    rows = mixed.rows,
                    policy = ?self.options.mixed_unit_policy,
                    "Attribute mixes units within one group"
                );
                match self.options.mixed_unit_policy {
                    MixedUnitPolicy::Coerce => warnings.push(DataQualityWarning {
                        group: group.clone(),
                        attribute: attribute.name.clone(),
                        expected: mixed.expected,
                        found: mixed.found,
                        rows: mixed.rows,
                    }),
                    MixedUnitPolicy::Reject => {
                        collector.skipped.push(SkippedGroup {
                            group,
                            reason: SkipReason::MixedUnits {
                                attribute: attribute.name.clone(),
                                expected: mixed.expected,
                                found: mixed.found,
                            },
                        });
                        return;
                    }
                }
            }
            axes.push(axis);
        }

        let mpns = rows
            .iter()
            .map(|r| r.get(&self.catalog.mpn_column).unwrap_or_default().to_string())
            .collect();
        let manufacturers = rows
            .iter()
            .map(|r| {
                r.get(&self.catalog.manufacturer_column)
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();

        perf_debug!(
            self.options.log,
            group = %group,
            rows = rows.len(),
            axes = axes.len(),
            malformed,
            "Built component"
        );

        collector.components.push(Component {
            category: group.category,
            year: group.year,
            mpns,
            manufacturers,
            axes,
        });
        collector.warnings.extend(warnings);
        collector.malformed_cells += malformed;
    }

    fn build_axis(
        &self,
        group: &GroupKey,
        attribute: &AttributeMetadata,
        rows: &[&RawRow],
    ) -> (Axis, usize, Option<MixedUnits>) {
        let column = self.catalog.attribute_column(attribute);
        let currency = attribute.is_currency();
        let cells: Vec<ParsedCell> = rows
            .iter()
            .map(|r| self.parse_cell(r.get(&column).unwrap_or_default(), attribute, currency))
            .collect();

        let malformed = cells.iter().filter(|c| !c.well_formed).count();
        let first = cells.iter().find(|c| c.well_formed);

        let (unit, affix) = if currency {
            (Some("$".to_string()), Some(Affix::Prefix))
        } else {
            match first {
                Some(cell) if !cell.unit.is_empty() => (Some(cell.unit.clone()), cell.affix),
                _ => (attribute.unit.clone(), attribute.affix),
            }
        };

        let mut mixed: Option<MixedUnits> = None;
        if !currency {
            if let Some(expected) = unit.as_deref() {
                for cell in cells.iter().filter(|c| c.well_formed && !c.unit.is_empty()) {
                    if cell.unit != expected {
                        let entry = mixed.get_or_insert_with(|| MixedUnits {
                            expected: expected.to_string(),
                            found: cell.unit.clone(),
                            rows: 0,
                        });
                        entry.rows += 1;
                    }
                }
            }
        }

        log_cell!(
            self.options.log,
            group = %group,
            attribute = %attribute.name,
            column = %column,
            unit = ?unit,
            affix = ?affix,
            "Resolved axis unit"
        );

        let axis = Axis {
            name: attribute.name.clone(),
            shortname: attribute.column.clone(),
            data: cells.iter().map(|c| c.value).collect(),
            unit,
            affix,
            computed: attribute.computed,
        };
        (axis, malformed, mixed)
    }

    fn parse_cell(&self, raw: &str, attribute: &AttributeMetadata, currency: bool) -> ParsedCell {
        let cell = value::CellText::parse(raw);
        let Some(magnitude) = cell.magnitude else {
            log_cell!(self.options.log, raw, attribute = %attribute.name, "Malformed cell, using 0");
            return ParsedCell {
                value: 0.0,
                unit: String::new(),
                affix: None,
                well_formed: false,
            };
        };

        let leftover = cell.leftover();
        if currency {
            return ParsedCell {
                value: magnitude,
                unit: leftover,
                affix: Some(Affix::Prefix),
                well_formed: true,
            };
        }

        let (prefix, base) = si::split_unit(&leftover, attribute.unit.as_deref());
        let value = prefix.map_or(magnitude, |p| p.apply(magnitude));
        ParsedCell {
            value,
            unit: base.to_string(),
            affix: cell.position(),
            well_formed: true,
        }
    }
}
