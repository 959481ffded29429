use crate::util::movies_csv;
use crate::SCENARIOS;
use criterion::{black_box, criterion_group, BenchmarkId, Criterion};
use dataset_processor::processors::csv::reader::CsvReader;

fn bench_loading(c: &mut Criterion) {
    let mut group = c.benchmark_group("CsvReader::read_dataset");
    for (_, num_elements) in SCENARIOS {
        let buffer = movies_csv(num_elements);
        group.throughput(criterion::Throughput::Elements(num_elements));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_elements), &buffer,
            |b, buffer| b.iter(|| {
                CsvReader::new(black_box(buffer.as_slice()))
                    .read_dataset()
                    .expect("Benchmark: unable to load dataset")
            }),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_loading);
