//! Error types for the componet library.
//!
//! All fallible operations return [`ComponetError`] through the crate-wide
//! [`Result`] alias. Per-cell problems never surface here: malformed values are
//! absorbed by the normalization engine and become `0.0`.

use thiserror::Error;

/// Which registry table a failed lookup was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    /// A component category (e.g. "Ceramic Capacitors").
    Category,
    /// A numeric attribute (e.g. "Capacitance").
    Attribute,
    /// Any registry entry regardless of type.
    Any,
}

impl std::fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionKind::Category => write!(f, "category"),
            ResolutionKind::Attribute => write!(f, "attribute"),
            ResolutionKind::Any => write!(f, "entry"),
        }
    }
}

/// The main error type for the componet library.
#[derive(Error, Debug)]
pub enum ComponetError {
    /// A requested category or attribute has no registry entry.
    ///
    /// This is a request-validation failure, never a crash.
    #[error("Unknown {kind} '{name}'")]
    Resolution {
        /// Which table was searched
        kind: ResolutionKind,
        /// The name as supplied by the caller
        name: String,
    },

    /// Executing the query for one (category, year) pair failed.
    #[error("Fetch failed for category '{category}' ({year}): {message}")]
    Fetch {
        /// Category storage key
        category: String,
        /// Year label of the failed pair
        year: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error from the row store.
    #[error("Data source error: {message}")]
    DataSource {
        /// Type of data source (e.g. "Memory", "CSV", "PostgreSQL")
        source_type: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error related to configuration or the metadata table.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error decoding the binary wire format.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Error from JSON serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A malformed request at the service boundary.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Security-related error.
    #[error("Security error: {0}")]
    SecurityError(String),
}

/// A type alias for `Result<T, ComponetError>`.
pub type Result<T> = std::result::Result<T, ComponetError>;

impl ComponetError {
    /// Creates a resolution error.
    pub fn resolution(kind: ResolutionKind, name: impl Into<String>) -> Self {
        Self::Resolution {
            kind,
            name: name.into(),
        }
    }

    /// Creates a fetch error for one (category, year) pair.
    pub fn fetch(
        category: impl Into<String>,
        year: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Fetch {
            category: category.into(),
            year: year.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a fetch error that keeps the underlying cause.
    pub fn fetch_with_source(
        category: impl Into<String>,
        year: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Fetch {
            category: category.into(),
            year: year.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates a new data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new data source error with a source error.
    pub fn data_source_with_source(
        source_type: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Whether the error was caused by caller input rather than the system.
    ///
    /// The HTTP boundary maps these to a client-error status.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Resolution { .. } | Self::InvalidRequest(_) | Self::SecurityError(_)
        )
    }
}

impl From<serde_json::Error> for ComponetError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<prost::DecodeError> for ComponetError {
    fn from(e: prost::DecodeError) -> Self {
        Self::Codec(e.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<ComponetError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| wrap(msg, e.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let msg = f();
            wrap(&msg, e.into())
        })
    }
}

fn wrap(msg: &str, base: ComponetError) -> ComponetError {
    match base {
        ComponetError::Configuration(inner) => {
            ComponetError::Configuration(format!("{msg}: {inner}"))
        }
        ComponetError::Internal(inner) => ComponetError::Internal(format!("{msg}: {inner}")),
        // Keep the variant of caller-facing errors so status mapping still works.
        other if other.is_client_error() => other,
        other => ComponetError::Internal(format!("{msg}: {other}")),
    }
}
