//! Prelude for commonly used types and traits in componet.

pub use crate::codec::WireFormat;
pub use crate::config::{CatalogConfig, ServiceConfig, StoreConfig};
pub use crate::error::{ComponetError, ErrorContext, Result};
pub use crate::formatters::{format_value, ComponentsFormatter, FormatterConfig};
pub use crate::logging::LogConfig;
pub use crate::metadata::{AttributeMetadata, ColumnType, MetadataRegistry};
pub use crate::model::{Affix, Axis, Component, Components};
pub use crate::normalize::{
    MixedUnitPolicy, NormalizationEngine, NormalizeOutcome, NormalizedBatch,
};
pub use crate::pipeline::{PipelineOutcome, QueryPipeline, RequestTicket, RequestTracker};
pub use crate::rows::{RawResponse, RawRow};
pub use crate::selection::{Selection, SelectionPair};
pub use crate::sources::{CatalogStore, RowSource};
