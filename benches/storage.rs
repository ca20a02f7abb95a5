//! History store benchmark: record and read encrypted scorings.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use tempfile::tempdir;
use urlguard::model::{LinearSpec, LogisticRegression, ModelBundle};
use urlguard::predict::{Prediction, PredictionAdapter};
use urlguard::storage::HistoryStore;
use uuid::Uuid;

fn sample_prediction() -> Prediction {
    let lr = LogisticRegression::from_spec(LinearSpec {
        classes: vec![0, 1],
        coef: vec![vec![0.1; 30]],
        intercept: vec![0.0],
    })
    .unwrap();
    let bundle = ModelBundle::new(Box::new(lr), None, None).unwrap();
    PredictionAdapter::new(Arc::new(bundle))
        .predict("http://192.168.1.1:8080/secure-login/verify?acct=1")
        .unwrap()
}

fn bench_record(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(&dir.path().join("history.db"), b"bench-secret").unwrap();
    let mut p = sample_prediction();

    c.bench_function("history_record", |b| {
        b.iter(|| {
            p.scan_id = Uuid::new_v4();
            black_box(store.record(&p)).unwrap()
        })
    });
}

fn bench_get(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(&dir.path().join("history.db"), b"bench-secret").unwrap();
    let id = store.record(&sample_prediction()).unwrap();

    c.bench_function("history_get", |b| {
        b.iter(|| black_box(store.get(black_box(id))).unwrap())
    });
}

fn bench_page(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(&dir.path().join("history.db"), b"bench-secret").unwrap();
    let mut p = sample_prediction();
    for _ in 0..100 {
        p.scan_id = Uuid::new_v4();
        store.record(&p).unwrap();
    }

    c.bench_function("history_page_10", |b| {
        b.iter(|| black_box(store.page(black_box(5), 10)).unwrap())
    });
}

criterion_group!(benches, bench_record, bench_get, bench_page);
criterion_main!(benches);
