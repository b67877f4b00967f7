//! HTTP query endpoints.
//!
//! - `GET /api` returns the raw rows of a selection as JSON, keyed by
//!   category.
//! - `GET /api/components` runs the whole pipeline and returns the encoded
//!   [`Components`](crate::model::Components), binary by default or JSON with
//!   `format=json`.
//!
//! Both take `categories` and `years` as parallel repeated parameters (matched
//! by position) and two or three `attributes`. Array-style names such as
//! `categories[]` are accepted too.

use crate::codec::{self, WireFormat};
use crate::error::{ComponetError, Result};
use crate::pipeline::{PipelineOutcome, QueryPipeline};
use crate::selection::Selection;
use axum::{
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Fewest attributes a plot request may name.
pub const MIN_ATTRIBUTES: usize = 2;
/// Most attributes a plot request may name.
pub const MAX_ATTRIBUTES: usize = 3;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: QueryPipeline,
}

/// Builds the router with request tracing.
pub fn router(pipeline: QueryPipeline) -> Router {
    Router::new()
        .route("/api", get(raw_rows))
        .route("/api/components", get(components))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { pipeline })
}

/// Binds `addr` and serves until the process ends.
pub async fn serve(addr: &str, pipeline: QueryPipeline) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Listening");
    axum::serve(listener, router(pipeline)).await?;
    Ok(())
}

/// Parsed query string of both endpoints.
#[derive(Debug, Default, PartialEq)]
struct ApiQuery {
    categories: Vec<String>,
    years: Vec<String>,
    attributes: Vec<String>,
    format: Option<String>,
}

impl ApiQuery {
    fn parse(query: Option<&str>) -> Self {
        let mut parsed = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.unwrap_or("").as_bytes()) {
            let value = value.into_owned();
            match key.trim_end_matches("[]") {
                "categories" => parsed.categories.push(value),
                "years" => parsed.years.push(value),
                "attributes" => parsed.attributes.push(value),
                "format" => parsed.format = Some(value),
                _ => {}
            }
        }
        parsed
    }

    fn selection(&self) -> Result<Selection> {
        if self.categories.is_empty() {
            return Err(ComponetError::InvalidRequest(
                "at least one category is required".to_string(),
            ));
        }
        if !(MIN_ATTRIBUTES..=MAX_ATTRIBUTES).contains(&self.attributes.len()) {
            return Err(ComponetError::InvalidRequest(format!(
                "expected {MIN_ATTRIBUTES} or {MAX_ATTRIBUTES} attributes, got {}",
                self.attributes.len()
            )));
        }
        Selection::from_parallel(&self.categories, &self.years, self.attributes.iter().cloned())
    }

    fn wire_format(&self) -> Result<WireFormat> {
        self.format
            .as_deref()
            .map(str::parse::<WireFormat>)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

/// Error body `{ "error": "..." }`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn no_data() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "no data for the selected components".to_string(),
        }
    }
}

impl From<ComponetError> for ApiError {
    fn from(e: ComponetError) -> Self {
        if e.is_client_error() {
            warn!(error = %e, "Rejected request");
        } else {
            warn!(error = %e, "Request failed");
        }
        Self {
            status: StatusCode::BAD_REQUEST,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn raw_rows(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> std::result::Result<Response, ApiError> {
    let selection = ApiQuery::parse(query.as_deref()).selection()?;
    let report = state.pipeline.fetch_raw(&selection).await?;
    if report.all_failed() {
        if let Some(e) = report.into_first_failure() {
            return Err(e.into());
        }
    }
    let body = report.response.to_json()?;
    Ok(([(header::CONTENT_TYPE, codec::JSON_CONTENT_TYPE)], body).into_response())
}

async fn components(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> std::result::Result<Response, ApiError> {
    let query = ApiQuery::parse(query.as_deref());
    let format = query.wire_format()?;
    let selection = query.selection()?;

    match state.pipeline.execute(&selection).await? {
        PipelineOutcome::Ready(result) => {
            let body = codec::encode_as(&result.batch.components, format)?;
            Ok(([(header::CONTENT_TYPE, format.content_type())], body).into_response())
        }
        PipelineOutcome::NoData { .. } => Err(ApiError::no_data()),
        PipelineOutcome::Superseded { ticket } => Err(ApiError {
            status: StatusCode::CONFLICT,
            message: format!("request {} was superseded", ticket.generation()),
        }),
    }
}
