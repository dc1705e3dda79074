//! Criterion benchmarks for command throughput.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use port_registry::{Command, MemoryStore, PortAllocator, Registry, RegistryConfig};

fn populated(records: usize) -> Registry<MemoryStore> {
    let registry = Registry::new(
        MemoryStore::new(),
        Arc::new(PortAllocator::with_defaults()),
        RegistryConfig::new().with_silent(true),
    );
    for i in 0..records {
        let command = Command::parse(&format!("register /bench/{i} tcp 10.0.0.1 ...")).unwrap();
        registry.apply(&command, None).unwrap();
    }
    registry
}

/// Benchmark: command text decoding
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    let test_cases = [
        ("query", "query /cam"),
        ("register", "register /cam tcp 192.168.1.5 10002"),
        ("structured", "bot set /cam ips 10.0.0.2 192.168.1.5 (format json)"),
    ];

    for (name, line) in test_cases {
        group.throughput(Throughput::Bytes(line.len() as u64));
        group.bench_with_input(BenchmarkId::new("command", name), &line, |b, line| {
            b.iter(|| Command::parse(black_box(line)).map(|c| c.interpret()));
        });
    }

    group.finish();
}

/// Benchmark: query against registries of increasing size
fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    for records in [10, 100, 1000] {
        let registry = populated(records);
        let name = format!("/bench/{}", records / 2);
        group.bench_with_input(BenchmarkId::new("records", records), &name, |b, name| {
            b.iter(|| registry.query(black_box(name)));
        });
    }

    group.finish();
}

/// Benchmark: register/unregister cycle
fn bench_register_cycle(c: &mut Criterion) {
    let registry = populated(100);
    let register = Command::parse("register /cycle tcp 10.0.0.2 ...").unwrap();
    let unregister = Command::parse("unregister /cycle").unwrap();

    c.bench_function("register_unregister", |b| {
        b.iter(|| {
            registry.apply(&register, None).unwrap();
            registry.apply(&unregister, None).unwrap();
        });
    });
}

/// Benchmark: prefix listing
fn bench_list(c: &mut Criterion) {
    let registry = populated(1000);

    c.bench_function("list_prefix", |b| {
        b.iter(|| registry.list(black_box(Some("/bench"))));
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_query,
    bench_register_cycle,
    bench_list
);
criterion_main!(benches);
