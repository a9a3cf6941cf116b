use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use data_processing::{
    BoxedTransform, CustomTransform, Data, DataError, MapConfig, Transform, TransformIterExt,
};

/// Benchmarks for the custom transform stage.
///
/// This measures:
/// 1. Call overhead: direct call vs. `process` (static dispatch) vs. a boxed stage
///    vs. `dyn Transform`
/// 2. Map driver: inline vs. parallel application over a stream
///
/// To run these, use:
/// ```bash
/// cargo bench
/// ```

/// Stream lengths for the map driver benchmarks.
const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

fn increment(d: Data) -> Result<Data, DataError> {
    Ok(Data::Int(d.as_int()? + 1))
}

/// Measure per-call overhead of the stage
fn bench_call_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("Call Overhead");

    let stage = CustomTransform::new(increment);
    let boxed: BoxedTransform<Data> = CustomTransform::boxed(|d| Ok(increment(d)?));
    let erased: Box<dyn Transform<Data, Data>> = Box::new(CustomTransform::new(increment));

    group.bench_function("direct", |b| {
        b.iter(|| black_box(increment(black_box(Data::Int(1)))))
    });
    group.bench_function("process", |b| {
        b.iter(|| black_box(stage.process(black_box(Data::Int(1)))))
    });
    group.bench_function("boxed", |b| {
        b.iter(|| black_box(boxed.process(black_box(Data::Int(1)))))
    });
    group.bench_function("dyn_transform", |b| {
        b.iter(|| black_box(erased.apply(black_box(Data::Int(1)))))
    });
    group.finish();
}

/// Measure the map driver over streams of ints.
fn bench_map_driver(c: &mut Criterion) {
    let mut group = c.benchmark_group("Map Driver");

    for &size in &SIZES {
        group.throughput(Throughput::Elements(size as u64));

        for calls in [1, 4] {
            let config = MapConfig::builder().num_parallel_calls(calls).build();

            group.bench_with_input(
                BenchmarkId::new(format!("calls={}", calls), size),
                &size,
                |b, &size| {
                    b.iter(|| {
                        (0..size as i64)
                            .map(Data::Int)
                            .map_transform(CustomTransform::new(increment), config.clone())
                            .unwrap()
                            .map(|r| r.unwrap())
                            .count()
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(2))
        .measurement_time(std::time::Duration::from_secs(5))
        .sample_size(50);
    targets = bench_call_overhead, bench_map_driver
);
criterion_main!(benches);
