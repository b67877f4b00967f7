//! # componet - component catalog normalization
//!
//! Componet turns rows from an electronic-component catalog into a
//! unit-normalized graph model. Display strings such as `"100 nF"` or
//! `"$3.50"` become base-unit numbers with their unit and affix, grouped per
//! (category, year) selection and ready for a plot or a wire.
//!
//! ## Overview
//!
//! A request flows through five stages:
//!
//! 1. [`metadata`]: the registry maps category and attribute names to their
//!    storage keys and default units.
//! 2. [`query`]: builds one parameter-safe SQL statement per
//!    (category, year) pair.
//! 3. [`fetch`]: runs those statements concurrently against a
//!    [`sources::RowSource`], keeping request order.
//! 4. [`normalize`]: parses magnitudes, strips SI prefixes and infers units
//!    into [`model::Components`].
//! 5. [`codec`]: encodes the model as protobuf or JSON.
//!
//! [`pipeline::QueryPipeline`] wires them together and discards the results
//! of requests superseded by a newer one.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use componet::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> componet::error::Result<()> {
//! let config = ServiceConfig::development();
//! let registry = Arc::new(MetadataRegistry::builtin()?);
//! let store = CatalogStore::from_config(&config.catalog, &config.store).await?;
//! let pipeline = QueryPipeline::new(registry, Arc::new(store), &config);
//!
//! let selection = Selection::new(
//!     vec![SelectionPair::new("Ceramic Capacitors", "2023")],
//!     ["Capacitance", "Voltage Rating (DC)"],
//! );
//! match pipeline.submit(&selection).await? {
//!     PipelineOutcome::Ready(result) => {
//!         let bytes = componet::codec::encode(&result.batch.components);
//!         println!("{} bytes", bytes.len());
//!     }
//!     PipelineOutcome::NoData { .. } => println!("nothing matched"),
//!     PipelineOutcome::Superseded { .. } => {}
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `postgres`: read the catalog table from PostgreSQL.
//! - `server`: the `/api` HTTP endpoints and the `componet-server` binary.

pub mod codec;
pub mod config;
pub mod error;
pub mod fetch;
pub mod formatters;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod prelude;
pub mod query;
pub mod rows;
pub mod security;
pub mod selection;
#[cfg(feature = "server")]
pub mod server;
pub mod sources;
