use crate::util::movies_csv;
use crate::SCENARIOS;
use criterion::{criterion_group, BatchSize, BenchmarkId, Criterion};
use dataset_processor::processor::DataProcessor;
use dataset_processor::processors::csv::CsvDataProcessor;

fn bench_csv_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("CsvDataProcessor::run");
    for (name, num_elements) in SCENARIOS {
        let buffer = movies_csv(num_elements);
        group.throughput(criterion::Throughput::Elements(num_elements));
        group.bench_with_input(BenchmarkId::from_parameter(name), &buffer, |b, buffer| {
            b.iter_batched(
                || {
                    let mut processor = CsvDataProcessor::new("movies.csv").with_focus_printing(false);
                    processor.load(buffer.as_slice()).expect("Benchmark setup: unable to load");
                    processor
                },
                |mut processor| processor.run().expect("Benchmark: run failed"),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_csv_pipeline);
