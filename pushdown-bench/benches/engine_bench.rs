//! Engine benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pushdown_core::builtin::{anbn, anbn_input, anbn_raw};
use pushdown_core::{Engine, MachineDefinition, Recorder};
use pushdown_render::{Charset, TableRenderer};
use std::sync::Arc;

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("definition_validate");

    let raw = anbn_raw();
    group.bench_function("anbn_from_raw", |b| {
        b.iter(|| black_box(MachineDefinition::from_raw(raw.clone()).unwrap()))
    });

    let json = serde_json::to_value(&raw).unwrap();
    group.bench_function("anbn_from_json", |b| {
        b.iter(|| black_box(MachineDefinition::from_json(&json).unwrap()))
    });

    group.finish();
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_process");
    let definition = Arc::new(anbn().unwrap());

    for n in [1usize, 10, 100, 1000] {
        let input = anbn_input(n);
        group.throughput(Throughput::Elements(input.len() as u64));

        group.bench_with_input(BenchmarkId::new("no_trace", n), &input, |b, input| {
            let mut engine = Engine::new(definition.clone());
            b.iter(|| black_box(engine.process(input, None).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("recorder", n), &input, |b, input| {
            let mut engine = Engine::new(definition.clone());
            b.iter(|| {
                let mut recorder = Recorder::new();
                black_box(engine.process(input, Some(&mut recorder)).unwrap())
            })
        });

        group.bench_with_input(BenchmarkId::new("ascii_table", n), &input, |b, input| {
            let mut engine = Engine::new(definition.clone());
            b.iter(|| {
                let mut renderer = TableRenderer::new(Vec::new(), Charset::ASCII);
                black_box(engine.process(input, Some(&mut renderer)).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validate, bench_process);
criterion_main!(benches);
