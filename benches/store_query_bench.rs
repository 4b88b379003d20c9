//! Query and classification throughput over synthetic embeddings.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tempfile::TempDir;
use tokio::runtime::Runtime;
use vecroute::{
    ClassifierConfig, Dimension, Embedding, Route, RouteClassifier, RouteCorpus, StoreOptions,
    StoredItem, VectorStore,
};

const DIM: usize = 384;

/// Deterministic pseudo-random vector; avoids pulling in an RNG crate.
fn synthetic(seed: usize) -> Embedding {
    let values = (0..DIM)
        .map(|i| (((seed * 31 + i * 17) % 97) as f32 / 97.0) - 0.5)
        .collect();
    Embedding::new(values).unwrap()
}

fn populated_store(rt: &Runtime, dir: &TempDir, rows: usize) -> VectorStore {
    let options = StoreOptions::new(Dimension::new(DIM).unwrap()).with_sync_writes(false);
    let store = VectorStore::open(dir.path(), options).unwrap();
    let items = (0..rows)
        .map(|i| StoredItem::new(format!("item_{i}"), synthetic(i)))
        .collect();
    rt.block_on(store.upsert(items)).unwrap();
    store
}

fn bench_store_query(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("store_query_top5");

    for rows in [1_000, 10_000] {
        let dir = TempDir::new().unwrap();
        let store = populated_store(&rt, &dir, rows);
        let query = synthetic(rows + 1);

        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                let matches = rt.block_on(store.query(black_box(&query), 5)).unwrap();
                black_box(matches);
            });
        });
    }
    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let routes = (0..12)
        .map(|r| {
            let exemplars = (0..10).map(|e| synthetic(r * 100 + e)).collect();
            Route::new(format!("route_{r}"), exemplars)
        })
        .collect();
    let corpus = RouteCorpus::new(routes).unwrap();
    let classifier = RouteClassifier::new(corpus, ClassifierConfig::default()).unwrap();
    let query = synthetic(4242);

    c.bench_function("classify_12_routes_120_exemplars", |b| {
        b.iter(|| {
            let result = classifier.classify(black_box(&query)).unwrap();
            black_box(result);
        });
    });
}

criterion_group!(benches, bench_store_query, bench_classify);
criterion_main!(benches);
