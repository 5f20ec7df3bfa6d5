// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Benchmarks for the flat-file queue driver.
//!
//! Measures:
//! - Push latency at different payload sizes
//! - Pop + acknowledge latency
//! - Peek over a populated queue

use std::hint::black_box;
use std::time::Duration;

use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use flatfile_queue::{DriverBuilder, FlatFileDriver};
use tempfile::TempDir;

/// Payload sizes to benchmark (bytes)
const PAYLOAD_SIZES: &[usize] = &[64, 256, 1024, 4096];

fn create_driver(temp_dir: &TempDir) -> FlatFileDriver {
    DriverBuilder::new(temp_dir.path())
        .build()
        .expect("Failed to create driver")
}

fn generate_payload(size: usize) -> Bytes { Bytes::from(vec![0xABu8; size]) }

fn bench_push_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_latency");

    for &size in PAYLOAD_SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let temp_dir = TempDir::new().unwrap();
            let driver = create_driver(&temp_dir);
            driver.create_queue("bench").unwrap();
            let payload = generate_payload(size);

            b.iter(|| {
                driver
                    .push_message("bench", black_box(payload.clone()))
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn bench_pop_acknowledge(c: &mut Criterion) {
    let mut group = c.benchmark_group("pop_acknowledge");

    group.bench_function("pop_ack_1k", |b| {
        let temp_dir = TempDir::new().unwrap();
        let driver = create_driver(&temp_dir);
        driver.create_queue("bench").unwrap();
        let payload = generate_payload(1024);

        b.iter_batched(
            || driver.push_message("bench", payload.clone()).unwrap(),
            |()| {
                let message = driver
                    .pop_message("bench", Duration::ZERO)
                    .unwrap()
                    .unwrap();
                driver
                    .acknowledge_message("bench", &message.receipt)
                    .unwrap();
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_peek(c: &mut Criterion) {
    let mut group = c.benchmark_group("peek");

    group.bench_function("peek_10_of_1000", |b| {
        let temp_dir = TempDir::new().unwrap();
        let driver = create_driver(&temp_dir);
        driver.create_queue("bench").unwrap();
        for _ in 0..1000 {
            driver.push_message("bench", generate_payload(256)).unwrap();
        }

        b.iter(|| {
            let peeked = driver.peek_queue("bench", black_box(0), 10).unwrap();
            assert_eq!(peeked.len(), 10);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_push_latency, bench_pop_acknowledge, bench_peek);
criterion_main!(benches);
