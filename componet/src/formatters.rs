//! Display formatting for axis values and normalized batches.
//!
//! [`format_value`] turns a base-unit value back into what a person expects
//! to read (`1e-7` on a farad axis is `100 nF`). The [`ComponentsFormatter`]
//! implementations summarize a [`NormalizedBatch`] for consoles, documents and
//! tooling.
//!
//! # Examples
//!
//! ```rust
//! use componet::formatters::format_value;
//! use componet::model::{Affix, Axis};
//!
//! let axis = Axis {
//!     name: "Capacitance".to_string(),
//!     shortname: "capacitance".to_string(),
//!     unit: Some("F".to_string()),
//!     affix: Some(Affix::Suffix),
//!     ..Default::default()
//! };
//! assert_eq!(format_value(&axis, 4.7e-6), "4.7 µF");
//! ```

use crate::error::{ComponetError, Result};
use crate::model::{Affix, Axis};
use crate::normalize::{si, DataQualityWarning, NormalizedBatch, SkippedGroup};
use serde::Serialize;
use std::fmt::Write;

/// Units shown without an SI prefix.
const PLAIN_UNITS: &[&str] = &["%", "°C", "°F", "h", "$", "V AC", "V DC"];

/// Renders a number with at most three decimals and no trailing zeros.
/// `value` rounded the way `trim_number` prints it.
fn rounded(value: f64) -> f64 {
    format!("{value:.3}").parse().unwrap_or(value)
}

fn trim_number(value: f64) -> String {
    let text = format!("{value:.3}");
    let text = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text.as_str()
    };
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn with_affix(number: &str, unit: &str, affix: Option<Affix>) -> String {
    if unit.is_empty() {
        return number.to_string();
    }
    match affix {
        Some(Affix::Prefix) => format!("{unit}{number}"),
        _ => format!("{number} {unit}"),
    }
}

/// Formats one axis value for display.
///
/// Computed axes use exponent notation. Prices keep two decimals. Other
/// values get the SI prefix that leaves a mantissa in `[1, 1000)`.
pub fn format_value(axis: &Axis, value: f64) -> String {
    let unit = axis.unit.as_deref().unwrap_or("");

    if axis.is_computed() {
        return with_affix(&format!("{value:.3e}"), unit, axis.affix);
    }
    if unit == "$" {
        return with_affix(&format!("{value:.2}"), unit, Some(Affix::Prefix));
    }
    if value == 0.0
        || !value.is_finite()
        || unit.is_empty()
        || PLAIN_UNITS.contains(&unit)
        || si::UNPREFIXED_UNITS.contains(&unit)
    {
        return with_affix(&trim_number(value), unit, axis.affix);
    }

    let mut exponent = ((value.abs().log10() / 3.0).floor() as i32 * 3).clamp(-24, 24);
    // Rounding can carry the mantissa up to 1000.
    if exponent < 24 && rounded(value / 10f64.powi(exponent)).abs() >= 1000.0 {
        exponent += 3;
    }
    match si::for_exponent(exponent).filter(|_| exponent != 0) {
        Some(prefix) => {
            let mantissa = value / 10f64.powi(exponent);
            let unit = format!("{}{unit}", prefix.display_token());
            with_affix(&trim_number(mantissa), &unit, axis.affix)
        }
        None => with_affix(&trim_number(value), unit, axis.affix),
    }
}

/// Options controlling summary output.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include per-axis min/max
    pub include_ranges: bool,
    /// Include data-quality warnings
    pub include_warnings: bool,
    /// Include groups that produced no component
    pub include_skipped: bool,
    /// Whether to use colorized output (human formatter)
    pub use_colors: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_ranges: true,
            include_warnings: true,
            include_skipped: true,
            use_colors: true,
        }
    }
}

impl FormatterConfig {
    /// Group names and row counts only.
    pub fn minimal() -> Self {
        Self {
            include_ranges: false,
            include_warnings: false,
            include_skipped: false,
            use_colors: false,
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_ranges(mut self, include: bool) -> Self {
        self.include_ranges = include;
        self
    }
}

/// Per-axis summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// `min` and `max` as display strings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_range: Option<String>,
}

/// Per-component summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub label: String,
    pub rows: usize,
    pub axes: Vec<AxisSummary>,
}

/// Serializable digest of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub groups: Vec<GroupSummary>,
    pub total_rows: usize,
    pub malformed_cells: usize,
    pub skipped: Vec<SkippedGroup>,
    pub warnings: Vec<DataQualityWarning>,
}

impl BatchSummary {
    /// Digests a batch, keeping what `config` asks for.
    pub fn from_batch(batch: &NormalizedBatch, config: &FormatterConfig) -> Self {
        let groups = batch
            .components
            .iter()
            .map(|component| GroupSummary {
                label: component.label(),
                rows: component.row_count(),
                axes: component
                    .axes
                    .iter()
                    .map(|axis| {
                        let range = config.include_ranges.then(|| axis.range()).flatten();
                        AxisSummary {
                            name: axis.name.clone(),
                            unit: axis.unit.clone(),
                            min: range.map(|r| r.0),
                            max: range.map(|r| r.1),
                            display_range: range.map(|(lo, hi)| {
                                format!("{} .. {}", format_value(axis, lo), format_value(axis, hi))
                            }),
                        }
                    })
                    .collect(),
            })
            .collect();

        Self {
            groups,
            total_rows: batch.components.total_rows(),
            malformed_cells: batch.malformed_cells,
            skipped: if config.include_skipped {
                batch.skipped.clone()
            } else {
                Vec::new()
            },
            warnings: if config.include_warnings {
                batch.warnings.clone()
            } else {
                Vec::new()
            },
        }
    }
}

/// Renders a normalized batch.
pub trait ComponentsFormatter {
    /// Formats with the formatter's own configuration.
    fn format(&self, batch: &NormalizedBatch) -> Result<String>;
}

fn fmt_error(e: std::fmt::Error) -> ComponetError {
    ComponetError::Internal(format!("Failed to format summary: {e}"))
}

/// Structured JSON summary.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentsFormatter for JsonFormatter {
    fn format(&self, batch: &NormalizedBatch) -> Result<String> {
        let summary = BatchSummary::from_batch(batch, &self.config);
        let json = if self.pretty {
            serde_json::to_string_pretty(&summary)
        } else {
            serde_json::to_string(&summary)
        };
        json.map_err(|e| ComponetError::Internal(format!("Failed to serialize summary: {e}")))
    }
}

/// Console output.
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn render(&self, summary: &BatchSummary, out: &mut String) -> std::fmt::Result {
        let (bold, yellow, reset) = if self.config.use_colors {
            ("\x1b[1m", "\x1b[33m", "\x1b[0m")
        } else {
            ("", "", "")
        };

        writeln!(
            out,
            "{bold}{} component(s), {} row(s){reset}",
            summary.groups.len(),
            summary.total_rows
        )?;
        for group in &summary.groups {
            writeln!(out, "  {} - {} row(s)", group.label, group.rows)?;
            for axis in &group.axes {
                match &axis.display_range {
                    Some(range) => writeln!(out, "    {}: {range}", axis.name)?,
                    None => writeln!(out, "    {}", axis.name)?,
                }
            }
        }
        if summary.malformed_cells > 0 {
            writeln!(out, "  {} unparseable cell(s) read as 0", summary.malformed_cells)?;
        }
        for skipped in &summary.skipped {
            writeln!(out, "  skipped {}", skipped.group)?;
        }
        for warning in &summary.warnings {
            writeln!(out, "  {yellow}warning{reset}: {warning}")?;
        }
        Ok(())
    }
}

impl ComponentsFormatter for HumanFormatter {
    fn format(&self, batch: &NormalizedBatch) -> Result<String> {
        let summary = BatchSummary::from_batch(batch, &self.config);
        let mut out = String::new();
        self.render(&summary, &mut out).map_err(fmt_error)?;
        Ok(out)
    }
}

/// Markdown table, one row per component.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    heading_level: u8,
}

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default().with_colors(false),
            heading_level: 2,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            heading_level: 2,
        }
    }

    /// Sets the heading level (1-6).
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 6);
        self
    }

    fn render(&self, summary: &BatchSummary, out: &mut String) -> std::fmt::Result {
        let hashes = "#".repeat(self.heading_level as usize);
        writeln!(out, "{hashes} Components")?;
        writeln!(out)?;
        writeln!(out, "| Group | Rows | Axes |")?;
        writeln!(out, "|---|---:|---|")?;
        for group in &summary.groups {
            let axes = group
                .axes
                .iter()
                .map(|a| match &a.display_range {
                    Some(range) => format!("{} ({range})", a.name),
                    None => a.name.clone(),
                })
                .collect::<Vec<_>>()
                .join("<br>");
            writeln!(out, "| {} | {} | {axes} |", group.label, group.rows)?;
        }

        if !summary.warnings.is_empty() {
            writeln!(out)?;
            writeln!(out, "{hashes}# Warnings")?;
            writeln!(out)?;
            for warning in &summary.warnings {
                writeln!(out, "- {warning}")?;
            }
        }
        if !summary.skipped.is_empty() {
            writeln!(out)?;
            writeln!(out, "{hashes}# Skipped")?;
            writeln!(out)?;
            for skipped in &summary.skipped {
                writeln!(out, "- {}", skipped.group)?;
            }
        }
        Ok(())
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentsFormatter for MarkdownFormatter {
    fn format(&self, batch: &NormalizedBatch) -> Result<String> {
        let summary = BatchSummary::from_batch(batch, &self.config);
        let mut out = String::new();
        self.render(&summary, &mut out).map_err(fmt_error)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, Components};
    use crate::normalize::{GroupKey, SkipReason};

    fn axis(unit: &str, affix: Affix, computed: Option<bool>) -> Axis {
        Axis {
            name: "Test".to_string(),
            shortname: "test".to_string(),
            data: vec![],
            unit: Some(unit.to_string()),
            affix: Some(affix),
            computed,
        }
    }

    #[test]
    fn test_si_display() {
        let farads = axis("F", Affix::Suffix, None);
        assert_eq!(format_value(&farads, 1e-7), "100 nF");
        assert_eq!(format_value(&farads, 4.7e-6), "4.7 µF");
        assert_eq!(format_value(&farads, 0.0), "0 F");

        let ohms = axis("Ω", Affix::Suffix, None);
        assert_eq!(format_value(&ohms, 1e6), "1 MΩ");
        assert_eq!(format_value(&ohms, 470.0), "470 Ω");
    }

    #[test]
    fn test_si_display_rounding_carries_prefix() {
        let farads = axis("F", Affix::Suffix, None);
        assert_eq!(format_value(&farads, 999.9996e-9), "1 µF");
        assert_eq!(format_value(&farads, -999.9996e-9), "-1 µF");
        assert_eq!(format_value(&farads, 999.9996), "1 kF");
        assert_eq!(format_value(&farads, 999.4e-9), "999.4 nF");
    }

    #[test]
    fn test_price_and_plain_units() {
        assert_eq!(format_value(&axis("$", Affix::Prefix, None), 3.5), "$3.50");
        assert_eq!(format_value(&axis("%", Affix::Suffix, None), 20.0), "20 %");
        assert_eq!(format_value(&axis("°C", Affix::Suffix, None), -55.0), "-55 °C");
    }

    #[test]
    fn test_computed_uses_exponent() {
        let axis = axis("F/m³", Affix::Suffix, Some(true));
        assert_eq!(format_value(&axis, 12340.0), "1.234e4 F/m³");
    }

    #[test]
    fn test_no_unit() {
        let mut axis = axis("F", Affix::Suffix, None);
        axis.unit = None;
        assert_eq!(format_value(&axis, 2.5), "2.5");
    }

    fn batch() -> NormalizedBatch {
        let mut capacitance = axis("F", Affix::Suffix, None);
        capacitance.name = "Capacitance".to_string();
        capacitance.data = vec![1e-7, 4.7e-6];
        NormalizedBatch {
            components: Components::new(vec![Component {
                category: "Ceramic Capacitors".to_string(),
                year: "2023".to_string(),
                mpns: vec!["A".into(), "B".into()],
                manufacturers: vec!["KEMET".into(), "TDK".into()],
                axes: vec![capacitance],
            }]),
            skipped: vec![SkippedGroup {
                group: GroupKey::new("Tantalum Capacitors", "2022"),
                reason: SkipReason::NoRows,
            }],
            warnings: vec![],
            malformed_cells: 1,
        }
    }

    #[test]
    fn test_human_formatter() {
        let output = HumanFormatter::with_config(FormatterConfig::default().with_colors(false))
            .format(&batch())
            .unwrap();
        assert!(output.contains("1 component(s), 2 row(s)"));
        assert!(output.contains("Ceramic Capacitors (2023) - 2 row(s)"));
        assert!(output.contains("Capacitance: 100 nF .. 4.7 µF"));
        assert!(output.contains("skipped Tantalum Capacitors (2022)"));
        assert!(output.contains("1 unparseable cell(s)"));
    }

    #[test]
    fn test_markdown_formatter() {
        let output = MarkdownFormatter::new()
            .with_heading_level(3)
            .format(&batch())
            .unwrap();
        assert!(output.starts_with("### Components"));
        assert!(output.contains("| Ceramic Capacitors (2023) | 2 | Capacitance (100 nF .. 4.7 µF) |"));
        assert!(output.contains("#### Skipped"));
    }

    #[test]
    fn test_json_formatter() {
        let output = JsonFormatter::with_config(FormatterConfig::minimal())
            .with_pretty(false)
            .format(&batch())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["total_rows"], 2);
        assert_eq!(value["groups"][0]["label"], "Ceramic Capacitors (2023)");
        assert!(value["groups"][0]["axes"][0].get("min").is_none());
        assert_eq!(value["skipped"].as_array().unwrap().len(), 0);
    }
}
