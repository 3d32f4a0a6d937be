//! Cleaning-stage throughput benchmark.
//!
//! Measures the per-batch cost of normalization, dimension lifting,
//! imputation, and projection over a synthetic department export.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use vitrine::ingest::{lift_dimensions, normalize, ImputationPolicy, Record, RecordBatch};
use vitrine::pipeline::clean_objects;
use vitrine::projection::project_batch;

/// A department export shaped like real harvested data: most fields
/// present, some blank, some missing, a third of records with raw
/// measurement blocks.
fn synthetic_batch(rows: usize) -> RecordBatch {
    let records: Vec<Record> = (0..rows)
        .map(|i| {
            let mut value = json!({
                "objectID": i as i64,
                "department_id": 6,
                "title": format!("Object {i}"),
                "culture": if i % 7 == 0 { "" } else { "Attic" },
                "classification": "Vases",
                "medium": "Terracotta",
                "isHighlight": i % 13 == 0,
                "isPublicDomain": true,
                "creditLine": "Rogers Fund, 1903",
                "objectBeginDate": -550 + (i % 60) as i64,
                "objectEndDate": -500 + (i % 60) as i64
            });
            let record = value.as_object_mut().unwrap();
            if i % 3 == 0 {
                record.insert(
                    "measurements".to_string(),
                    json!([{
                        "elementName": "Overall",
                        "elementMeasurements": {"Height": 10.0 + i as f64, "Width": 8.5}
                    }]),
                );
            }
            if i % 5 == 0 {
                record.insert("artistAlphaSort".to_string(), json!("Painter, Amasis"));
            }
            record.clone()
        })
        .collect();
    RecordBatch::new(records)
}

fn bench_cleaning_stages(c: &mut Criterion) {
    let batch = synthetic_batch(1000);
    let mut group = c.benchmark_group("cleaning");

    group.bench_function("normalize_1k", |b| {
        b.iter(|| black_box(normalize(black_box(&batch))));
    });

    group.bench_function("lift_dimensions_1k", |b| {
        let normalized = normalize(&batch);
        b.iter(|| black_box(lift_dimensions(black_box(&normalized))));
    });

    group.bench_function("impute_1k", |b| {
        let lifted = lift_dimensions(&normalize(&batch));
        let policy = ImputationPolicy::objects();
        b.iter(|| black_box(policy.apply(black_box(&lifted))));
    });

    group.bench_function("full_clean_1k", |b| {
        b.iter(|| black_box(clean_objects(black_box(&batch))));
    });

    group.bench_function("project_1k", |b| {
        let cleaned = clean_objects(&batch);
        let artists = RecordBatch::default();
        b.iter(|| black_box(project_batch(6, black_box(&cleaned), &artists)));
    });

    group.finish();
}

criterion_group!(benches, bench_cleaning_stages);
criterion_main!(benches);
