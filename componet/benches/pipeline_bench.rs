//! Benchmarks for normalization and the wire codec.

use componet::codec;
use componet::config::CatalogConfig;
use componet::metadata::{AttributeMetadata, MetadataRegistry};
use componet::normalize::NormalizationEngine;
use componet::rows::{RawResponse, RawRow};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

const UNITS: [&str; 6] = ["pF", "nF", "µF", "uF", "mF", "F"];

fn raw_response(rows: usize) -> RawResponse {
    let mut raw = RawResponse::new();
    for key in ["6331", "6332", "6336"] {
        let rows = (0..rows)
            .map(|i| {
                RawRow::from_pairs([
                    ("part_mpn", Some(format!("P{key}-{i}"))),
                    ("part_manufacturer_name", Some("Murata".to_string())),
                    (
                        "part_specs_capacitance_display_value",
                        Some(format!("{} {}", i % 1000, UNITS[i % UNITS.len()])),
                    ),
                    (
                        "part_specs_voltagerating_dc__display_value",
                        Some(format!("{} V", (i % 100) as f64 * 0.5)),
                    ),
                    (
                        "part_median_price_1000_converted_price",
                        if i % 7 == 0 { None } else { Some(format!("${}.{:02}", i % 10, i % 100)) },
                    ),
                ])
            })
            .collect();
        raw.extend(key, rows);
    }
    raw
}

fn setup() -> (NormalizationEngine, Vec<AttributeMetadata>) {
    let registry = Arc::new(MetadataRegistry::builtin().unwrap());
    let attributes = ["Capacitance", "Voltage Rating (DC)", "Price @ 1000"]
        .iter()
        .map(|n| registry.resolve_attribute(n).unwrap().clone())
        .collect();
    (
        NormalizationEngine::new(registry, CatalogConfig::default()),
        attributes,
    )
}

fn bench_normalize(c: &mut Criterion) {
    let (engine, attributes) = setup();
    let mut group = c.benchmark_group("normalize");

    for rows in [100, 1_000, 10_000] {
        let raw = raw_response(rows);
        group.throughput(Throughput::Elements((rows * 3) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &raw, |b, raw| {
            b.iter(|| engine.normalize(black_box(raw), black_box(&attributes)))
        });
    }
    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let (engine, attributes) = setup();
    let mut group = c.benchmark_group("codec");

    for rows in [1_000, 10_000] {
        let components = engine
            .normalize(&raw_response(rows), &attributes)
            .into_components()
            .unwrap();
        let bytes = codec::encode(&components);
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", rows), &components, |b, c| {
            b.iter(|| codec::encode(black_box(c)))
        });
        group.bench_with_input(BenchmarkId::new("decode", rows), &bytes, |b, bytes| {
            b.iter(|| codec::decode(black_box(bytes)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("to_json", rows), &components, |b, c| {
            b.iter(|| codec::to_json(black_box(c)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_normalize, bench_codec);
criterion_main!(benches);
