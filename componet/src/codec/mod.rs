//! Binary and JSON encodings of [`Components`].
//!
//! The binary form is protobuf (see [`wire`]); the JSON form is the serde
//! rendering of the model types and uses the same field names. Both keep
//! optional fields absent rather than defaulted, so `unit: None` and
//! `unit: Some("")` survive a round trip as different values.
//!
//! # Examples
//!
//! ```rust
//! use componet::codec;
//! use componet::model::{Affix, Axis, Component, Components};
//!
//! let components = Components::new(vec![Component {
//!     category: "Ceramic Capacitors".to_string(),
//!     year: "2023".to_string(),
//!     mpns: vec!["GRM188".to_string()],
//!     manufacturers: vec!["Murata".to_string()],
//!     axes: vec![Axis {
//!         name: "Capacitance".to_string(),
//!         shortname: "capacitance".to_string(),
//!         data: vec![1e-7],
//!         unit: Some("F".to_string()),
//!         affix: Some(Affix::Suffix),
//!         computed: None,
//!     }],
//! }]);
//!
//! let bytes = codec::encode(&components);
//! assert_eq!(codec::decode(&bytes).unwrap(), components);
//! ```

pub mod wire;

use crate::error::{ComponetError, Result};
use crate::model::{Affix, Axis, Component, Components};
use prost::Message;
use tracing::instrument;
use wire::{WireAffix, WireAxis, WireComponent, WireComponents};

/// MIME type of the binary encoding.
pub const BINARY_CONTENT_TYPE: &str = "application/x-protobuf";

/// MIME type of the JSON encoding.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Transport encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    #[default]
    Binary,
    Json,
}

impl WireFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            WireFormat::Binary => BINARY_CONTENT_TYPE,
            WireFormat::Json => JSON_CONTENT_TYPE,
        }
    }
}

impl std::str::FromStr for WireFormat {
    type Err = ComponetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "protobuf" | "proto" => Ok(WireFormat::Binary),
            "json" => Ok(WireFormat::Json),
            other => Err(ComponetError::InvalidRequest(format!(
                "unknown format '{other}', expected 'binary' or 'json'"
            ))),
        }
    }
}

/// Encodes to protobuf. Encoding the same value always yields the same bytes.
#[instrument(skip_all, fields(components = components.len(), rows = components.total_rows()))]
pub fn encode(components: &Components) -> Vec<u8> {
    WireComponents::from(components).encode_to_vec()
}

/// Decodes protobuf bytes.
///
/// Truncated input and affix values outside the enum are `Codec` errors.
#[instrument(skip_all, fields(bytes = bytes.len()))]
pub fn decode(bytes: &[u8]) -> Result<Components> {
    let wire = WireComponents::decode(bytes)?;
    Components::try_from(wire)
}

/// Encodes in the requested format.
pub fn encode_as(components: &Components, format: WireFormat) -> Result<Vec<u8>> {
    match format {
        WireFormat::Binary => Ok(encode(components)),
        WireFormat::Json => Ok(to_json(components)?.into_bytes()),
    }
}

/// Compact JSON.
pub fn to_json(components: &Components) -> Result<String> {
    Ok(serde_json::to_string(components)?)
}

/// Indented JSON, for debugging.
pub fn to_json_pretty(components: &Components) -> Result<String> {
    Ok(serde_json::to_string_pretty(components)?)
}

pub fn from_json(json: &str) -> Result<Components> {
    Ok(serde_json::from_str(json)?)
}

impl From<Affix> for WireAffix {
    fn from(affix: Affix) -> Self {
        match affix {
            Affix::Prefix => WireAffix::Prefix,
            Affix::Suffix => WireAffix::Suffix,
        }
    }
}

impl From<WireAffix> for Affix {
    fn from(affix: WireAffix) -> Self {
        match affix {
            WireAffix::Prefix => Affix::Prefix,
            WireAffix::Suffix => Affix::Suffix,
        }
    }
}

impl From<&Axis> for WireAxis {
    fn from(axis: &Axis) -> Self {
        Self {
            data: axis.data.clone(),
            affix: axis.affix.map(|a| WireAffix::from(a) as i32),
            unit: axis.unit.clone(),
            name: axis.name.clone(),
            shortname: axis.shortname.clone(),
            computed: axis.computed,
        }
    }
}

impl From<&Component> for WireComponent {
    fn from(component: &Component) -> Self {
        Self {
            category: component.category.clone(),
            axes: component.axes.iter().map(WireAxis::from).collect(),
            mpns: component.mpns.clone(),
            manufacturers: component.manufacturers.clone(),
            year: component.year.clone(),
        }
    }
}

impl From<&Components> for WireComponents {
    fn from(components: &Components) -> Self {
        Self {
            components: components.iter().map(WireComponent::from).collect(),
        }
    }
}

impl TryFrom<WireAxis> for Axis {
    type Error = ComponetError;

    fn try_from(wire: WireAxis) -> Result<Self> {
        let affix = wire
            .affix
            .map(|value| {
                WireAffix::try_from(value)
                    .map(Affix::from)
                    .map_err(|_| ComponetError::Codec(format!("unknown affix value {value} on axis '{}'", wire.name)))
            })
            .transpose()?;
        Ok(Self {
            name: wire.name,
            shortname: wire.shortname,
            data: wire.data,
            unit: wire.unit,
            affix,
            computed: wire.computed,
        })
    }
}

impl TryFrom<WireComponent> for Component {
    type Error = ComponetError;

    fn try_from(wire: WireComponent) -> Result<Self> {
        Ok(Self {
            category: wire.category,
            year: wire.year,
            mpns: wire.mpns,
            manufacturers: wire.manufacturers,
            axes: wire
                .axes
                .into_iter()
                .map(Axis::try_from)
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

impl TryFrom<WireComponents> for Components {
    type Error = ComponetError;

    fn try_from(wire: WireComponents) -> Result<Self> {
        Ok(Components::new(
            wire.components
                .into_iter()
                .map(Component::try_from)
                .collect::<Result<Vec<_>>>()?,
        ))
    }
}
