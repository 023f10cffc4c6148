//! Performance benchmarks for module analysis.
//!
//! - Collections: literal evaluation around the collection cap
//! - Specialization: generic instantiation, cached and uncached
//! - Modules: whole-module analysis of growing numbers of functions
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use bumpalo::Bump;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pyinfer::ast::{BinaryOp, Stmt};
use pyinfer::{Analyzer, AstBuilder, Module};
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// Print how many frames the profiler recorded.
#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    let Some(frame_view) = FRAME_VIEW.get() else {
        println!("Profiler not initialized");
        return;
    };
    let view = frame_view.lock();
    println!("\n=== Profiling: {} frames recorded ===\n", view.recent_frames().count());
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

/// `x = [0, 1, ..., n - 1]`
fn list_module<'ast>(b: &AstBuilder<'ast>, n: i64) -> &'ast Module<'ast> {
    b.module([b.assign(b.name("x"), b.list((0..n).map(|i| b.int(i))))])
}

/// A generic `Box` instantiated with `distinct` different argument types,
/// each `repeats` times.
fn generic_module<'ast>(b: &AstBuilder<'ast>, distinct: usize, repeats: usize) -> &'ast Module<'ast> {
    let samples = [b.int(1), b.str("s"), b.float(1.0), b.bool(true), b.none()];
    let mut body = vec![
        b.assign(b.name("T"), b.call(b.name("TypeVar"), [b.str("T")])),
        b.class("Box")
            .base(b.index(b.name("Generic"), b.name("T")))
            .body([
                b.def("__init__")
                    .param("self")
                    .param_typed("value", b.name("T"))
                    .body([b.assign(b.attr(b.name("self"), "value"), b.name("value"))]),
                b.def("get")
                    .param("self")
                    .returns(b.name("T"))
                    .body([b.ret(Some(b.attr(b.name("self"), "value")))]),
            ]),
    ];
    for i in 0..repeats {
        for (j, sample) in samples.iter().take(distinct).enumerate() {
            let name = format!("b_{i}_{j}");
            body.push(b.assign(b.name(&name), b.call(b.name("Box"), [*sample])));
            body.push(b.expr_stmt(b.call(b.attr(b.name(&name), "get"), [])));
        }
    }
    b.module(body)
}

/// `count` functions, each calling the previous one.
fn chained_functions<'ast>(b: &AstBuilder<'ast>, count: usize) -> &'ast Module<'ast> {
    let mut body: Vec<Stmt<'ast>> = Vec::with_capacity(count + 1);
    body.push(b.def("f0").param("x").body([b.ret(Some(b.binary(
        b.name("x"),
        BinaryOp::Add,
        b.int(1),
    )))]));
    for i in 1..count {
        let previous = format!("f{}", i - 1);
        body.push(b.def(&format!("f{i}")).param("x").body([b.ret(Some(b.call(
            b.name(&previous),
            [b.name("x")],
        )))]));
    }
    body.push(b.assign(
        b.name("result"),
        b.call(b.name(&format!("f{}", count - 1)), [b.int(0)]),
    ));
    b.module(body)
}

fn collection_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let analyzer = Analyzer::new();
    let mut group = c.benchmark_group("analysis/collections");

    for n in [10_i64, 1000, 5000] {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let module = list_module(&b, n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("list_literal", n), module, |bench, module| {
            bench.iter(|| {
                let analysis = analyzer.analyze(black_box(module)).unwrap();
                end_profiling_frame();
                black_box(analysis.globals().len())
            });
        });
    }

    group.finish();
    print_profiling_stats();
}

fn specialization_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let analyzer = Analyzer::new();
    let mut group = c.benchmark_group("analysis/specialization");

    for (distinct, repeats) in [(1, 50), (5, 10)] {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let module = generic_module(&b, distinct, repeats);
        let id = format!("{distinct}x{repeats}");
        group.throughput(Throughput::Elements((distinct * repeats) as u64));
        group.bench_with_input(BenchmarkId::new("box", id), module, |bench, module| {
            bench.iter(|| {
                let analysis = analyzer.analyze(black_box(module)).unwrap();
                end_profiling_frame();
                black_box(analysis.globals().len())
            });
        });
    }

    group.finish();
    print_profiling_stats();
}

fn module_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let analyzer = Analyzer::new();
    let mut group = c.benchmark_group("analysis/modules");

    for count in [10, 100] {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let module = chained_functions(&b, count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("chained_functions", count), module, |bench, module| {
            bench.iter(|| {
                let analysis = analyzer.analyze(black_box(module)).unwrap();
                end_profiling_frame();
                black_box(analysis.diagnostics().len())
            });
        });
    }

    group.finish();
    print_profiling_stats();
}

criterion_group!(
    benches,
    collection_benchmarks,
    specialization_benchmarks,
    module_benchmarks
);
criterion_main!(benches);
