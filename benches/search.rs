use std::sync::Arc;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use persona::{
    build_index, Entity, EntityIndex, HashingEmbedder, IndexHandle, NameParts, Resolver,
    SearchRequest, SearchRuntime, SearchRuntimeConfig,
};

const FIRST: &[&str] = &[
    "John", "Jane", "Ada", "Grace", "Alan", "Linus", "Barbara", "Edsger", "Donald", "Margaret",
];
const MIDDLE: &[&str] = &["", "Michael", "M.", "Paul", "Ann"];
const LAST: &[&str] = &[
    "Smith", "Doe", "Lovelace", "Hopper", "Turing", "Torvalds", "Liskov", "Dijkstra", "Knuth",
    "Hamilton",
];
const ROLES: &[&str] = &[
    "Software Engineer at Google",
    "Professor at MIT",
    "Product Manager",
    "Data Analyst at Acme",
];

fn catalog(size: usize) -> Vec<Entity> {
    (0..size)
        .map(|i| {
            let first = FIRST[i % FIRST.len()];
            let middle = MIDDLE[(i / FIRST.len()) % MIDDLE.len()];
            let last = LAST[(i / 7) % LAST.len()];
            let role = ROLES[i % ROLES.len()];
            let name = if middle.is_empty() {
                format!("{first} {last}")
            } else {
                format!("{first} {middle} {last}")
            };
            Entity::keyed(&i.to_string(), format!("{name} - {role}"))
        })
        .collect()
}

fn setup(size: usize) -> (Resolver, EntityIndex<NameParts>) {
    let resolver = Resolver::new(Arc::new(HashingEmbedder::default()));
    let index = resolver.build_index(catalog(size)).unwrap();
    (resolver, index)
}

fn bench_build_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_index");
    for size in [100usize, 1_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let embedder = HashingEmbedder::default();
            let entities = catalog(size);
            b.iter(|| build_index(entities.clone(), &embedder).unwrap());
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.throughput(Throughput::Elements(1));

    let (resolver, index) = setup(1_000);
    for (label, query) in [
        ("full_name", "John Smith"),
        ("initial", "J"),
        ("typo", "Jhon Smith"),
        ("middle_initial", "john m smith"),
        ("semantic", "software engineer working at google"),
    ] {
        group.bench_function(label, |b| {
            b.iter(|| resolver.search_str(&index, query, None).unwrap());
        });
    }
    group.finish();
}

fn bench_runtime_round_trip(c: &mut Criterion) {
    c.bench_function("runtime/lexical_round_trip", |b| {
        // Fresh runtime per sample, setup excluded from timing.
        b.iter_custom(|iters| {
            let embedder = Arc::new(HashingEmbedder::default());
            let index = Arc::new(IndexHandle::new(
                build_index(catalog(1_000), embedder.as_ref()).unwrap(),
            ));
            let runtime = SearchRuntime::new(
                Resolver::new(embedder),
                index,
                &SearchRuntimeConfig {
                    lexical_workers: 1,
                    semantic_workers: 1,
                    queue_capacity: 1024,
                },
            )
            .unwrap();

            let request = SearchRequest::new("Grace Hopper");
            let start = Instant::now();
            for _ in 0..iters {
                let _ = runtime.search(request.clone()).unwrap();
            }
            start.elapsed()
        });
    });
}

criterion_group!(search, bench_build_index, bench_search, bench_runtime_round_trip);
criterion_main!(search);
