//! Criterion micro-benchmarks for parsing, measuring, and cloning.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use strata_arena::PageArena;
use strata_bench::{string_table, vector_table};
use strata_core::TypeDescriptor;
use strata_layout::{Variable, VariableCloner};

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_A4MVA3O", |b| {
        b.iter(|| Variable::new(black_box("A4MVA3O"), TypeDescriptor::float64()).unwrap())
    });
}

fn bench_clone_vectors(c: &mut Criterion) {
    let w = vector_table(64, 256);
    let mut arena = PageArena::with_defaults().unwrap();
    c.bench_function("clone_64x256_vectors", |b| {
        b.iter(|| {
            arena.reset();
            // SAFETY: the workload fixture outlives the benchmark.
            let out = unsafe { VariableCloner::new(&w.variable, &mut arena).clone_from(w.root) };
            black_box(out.unwrap());
        })
    });
}

fn bench_clone_strings(c: &mut Criterion) {
    let w = string_table(512, 24);
    let mut arena = PageArena::with_defaults().unwrap();
    c.bench_function("clone_512_strings", |b| {
        b.iter(|| {
            arena.reset();
            // SAFETY: the workload fixture outlives the benchmark.
            let out = unsafe { VariableCloner::new(&w.variable, &mut arena).clone_from(w.root) };
            black_box(out.unwrap());
        })
    });
}

fn bench_footprint(c: &mut Criterion) {
    let w = vector_table(64, 256);
    c.bench_function("footprint_64x256_vectors", |b| {
        // SAFETY: the workload fixture outlives the benchmark.
        b.iter(|| black_box(unsafe { w.variable.footprint(w.root) }.unwrap()))
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_clone_vectors,
    bench_clone_strings,
    bench_footprint
);
criterion_main!(benches);
