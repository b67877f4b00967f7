//! HTTP endpoint tests against an in-memory catalog.
#![cfg(feature = "server")]

use arrow::array::StringArray;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use componet::codec;
use componet::config::ServiceConfig;
use componet::metadata::MetadataRegistry;
use componet::pipeline::QueryPipeline;
use componet::rows::RawResponse;
use componet::server;
use componet::sources::CatalogStore;
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> axum::Router {
    let schema = Arc::new(Schema::new(vec![
        Field::new("part_mpn", DataType::Utf8, false),
        Field::new("part_manufacturer_name", DataType::Utf8, false),
        Field::new("part_category_id", DataType::Utf8, false),
        Field::new("part_specs_capacitance_display_value", DataType::Utf8, true),
        Field::new("part_specs_voltagerating_dc__display_value", DataType::Utf8, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["GRM1", "EEE-1"])),
            Arc::new(StringArray::from(vec!["Murata", "Panasonic"])),
            Arc::new(StringArray::from(vec!["6332", "6331"])),
            Arc::new(StringArray::from(vec!["100 nF", "47 µF"])),
            Arc::new(StringArray::from(vec!["50 V", "16 V"])),
        ],
    )
    .unwrap();

    let store = CatalogStore::from_batches("public.final", vec![batch]).unwrap();
    let registry = Arc::new(MetadataRegistry::builtin().unwrap());
    server::router(QueryPipeline::new(
        registry,
        Arc::new(store),
        &ServiceConfig::development(),
    ))
}

const SELECTION: &str =
    "categories=6332&years=2023&attributes=Capacitance&attributes=Voltage%20Rating%20(DC)";

async fn get(uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, body.to_vec())
}

#[tokio::test]
async fn test_raw_rows_endpoint() {
    let (status, content_type, body) = get(&format!("/api?{SELECTION}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(codec::JSON_CONTENT_TYPE));

    let raw = RawResponse::from_json(std::str::from_utf8(&body).unwrap()).unwrap();
    let rows = raw.rows("6332");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("part_mpn"), Some("GRM1"));
    assert_eq!(rows[0].get("year"), Some("2023"));
}

#[tokio::test]
async fn test_components_binary_and_json() {
    let (status, content_type, body) = get(&format!("/api/components?{SELECTION}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(codec::BINARY_CONTENT_TYPE));
    let components = codec::decode(&body).unwrap();
    assert_eq!(components.components[0].axes[0].data, vec![1e-7]);

    let (status, content_type, body) =
        get(&format!("/api/components?{SELECTION}&format=json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(codec::JSON_CONTENT_TYPE));
    assert_eq!(
        codec::from_json(std::str::from_utf8(&body).unwrap()).unwrap(),
        components
    );
}

#[tokio::test]
async fn test_raw_rows_nothing_matched() {
    let (status, _, body) = get(
        "/api?categories=6336&years=2023&attributes=Capacitance&attributes=Voltage%20Rating%20(DC)",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"{}");
}

#[tokio::test]
async fn test_no_data_is_not_found() {
    let (status, _, body) = get(
        "/api/components?categories=6336&years=2023&attributes=Capacitance&attributes=Voltage%20Rating%20(DC)",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(value["error"].is_string());
}

#[tokio::test]
async fn test_bad_requests() {
    for uri in [
        "/api?categories=6332&years=2023&attributes=Capacitance",
        "/api?categories=6332&categories=6331&years=2023&attributes=Capacitance&attributes=Resistance",
        "/api?categories=nope&years=2023&attributes=Capacitance&attributes=Resistance",
        "/api/components?categories=6332&years=2023&attributes=Capacitance&attributes=Resistance&format=xml",
    ] {
        let (status, _, body) = get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(value["error"].as_str().is_some_and(|e| !e.is_empty()), "{uri}");
    }
}
