//! The unit-normalized graph model handed to the visualization layer.
//!
//! A [`Components`] batch holds one [`Component`] per (category, year) group.
//! Each component carries parallel per-row arrays (`mpns`, `manufacturers`)
//! and one [`Axis`] per requested attribute, all aligned to the same row
//! order.

use serde::{Deserialize, Serialize};

/// Whether a unit is displayed before or after its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Affix {
    /// `$3.50`
    #[serde(alias = "Prefix")]
    Prefix,
    /// `100 nF`
    #[serde(alias = "Suffix")]
    Suffix,
}

impl Affix {
    /// Name used in JSON and log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Affix::Prefix => "PREFIX",
            Affix::Suffix => "SUFFIX",
        }
    }
}

impl std::fmt::Display for Affix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One standardized numeric series for one attribute within a component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Axis {
    /// Attribute display name.
    pub name: String,
    /// Attribute storage shortname.
    pub shortname: String,
    /// Base-unit values, one per row of the owning component.
    #[serde(default)]
    pub data: Vec<f64>,
    /// Resolved display unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Where `unit` is displayed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affix: Option<Affix>,
    /// Marks a derived attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed: Option<bool>,
}

impl Axis {
    /// Number of values on the axis.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the axis holds no values.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the axis should be rendered in exponent notation.
    pub fn is_computed(&self) -> bool {
        self.computed.unwrap_or(false)
    }

    /// Smallest and largest value on the axis, `None` when empty.
    pub fn range(&self) -> Option<(f64, f64)> {
        let mut iter = self.data.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// The matched parts for one (category, year) selection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Component {
    /// Category display name.
    pub category: String,
    /// Year label the rows were retrieved under.
    #[serde(default)]
    pub year: String,
    /// Manufacturer part numbers, one per row.
    #[serde(default)]
    pub mpns: Vec<String>,
    /// Manufacturer names, same order as `mpns`.
    #[serde(default)]
    pub manufacturers: Vec<String>,
    /// One axis per requested attribute.
    #[serde(default)]
    pub axes: Vec<Axis>,
}

impl Component {
    /// Number of matched rows.
    pub fn row_count(&self) -> usize {
        self.mpns.len()
    }

    /// `"<category> (<year>)"`, the trace label used by the plot.
    pub fn label(&self) -> String {
        format!("{} ({})", self.category, self.year)
    }

    /// Checks that every per-row array has the same length.
    pub fn is_consistent(&self) -> bool {
        let rows = self.mpns.len();
        self.manufacturers.len() == rows && self.axes.iter().all(|a| a.data.len() == rows)
    }

    /// Looks up an axis by attribute display name.
    pub fn axis(&self, name: &str) -> Option<&Axis> {
        self.axes.iter().find(|a| a.name == name)
    }
}

/// Top-level container, one component per non-empty requested group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub components: Vec<Component>,
}

impl Components {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Total rows across every component.
    pub fn total_rows(&self) -> usize {
        self.components.iter().map(Component::row_count).sum()
    }

    /// Finds the component for a category display name and year label.
    pub fn find(&self, category: &str, year: &str) -> Option<&Component> {
        self.components
            .iter()
            .find(|c| c.category == category && c.year == year)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }
}

impl<'a> IntoIterator for &'a Components {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(data: Vec<f64>) -> Axis {
        Axis {
            name: "Capacitance".to_string(),
            shortname: "capacitance".to_string(),
            data,
            unit: Some("F".to_string()),
            affix: Some(Affix::Suffix),
            computed: None,
        }
    }

    #[test]
    fn test_axis_range() {
        assert_eq!(axis(vec![]).range(), None);
        assert_eq!(axis(vec![3.0, -1.0, 2.0]).range(), Some((-1.0, 3.0)));
    }

    #[test]
    fn test_component_consistency() {
        let mut component = Component {
            category: "Ceramic Capacitors".to_string(),
            year: "2023".to_string(),
            mpns: vec!["A".to_string(), "B".to_string()],
            manufacturers: vec!["KEMET".to_string(), "TDK".to_string()],
            axes: vec![axis(vec![1.0, 2.0])],
        };
        assert!(component.is_consistent());
        assert_eq!(component.label(), "Ceramic Capacitors (2023)");

        component.axes[0].data.pop();
        assert!(!component.is_consistent());
    }

    #[test]
    fn test_affix_json_names() {
        assert_eq!(serde_json::to_string(&Affix::Prefix).unwrap(), "\"PREFIX\"");
        let parsed: Affix = serde_json::from_str("\"Suffix\"").unwrap();
        assert_eq!(parsed, Affix::Suffix);
    }
}
