//! BoundedBuffer throughput: one producer, N consumers, small capacity.
//!
//!     cargo bench -p torero-core

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;
use torero_core::BoundedBuffer;

const ITEMS: u64 = 10_000;

fn handoff(capacity: usize, consumers: usize) {
    let buffer = Arc::new(BoundedBuffer::new(capacity));

    let handles: Vec<_> = (0..consumers)
        .map(|_| {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                let mut count = 0u64;
                while buffer.get().is_some() {
                    count += 1;
                }
                count
            })
        })
        .collect();

    for i in 0..ITEMS {
        if buffer.put(i).is_err() {
            break;
        }
    }
    buffer.close();

    let received: u64 = handles.into_iter().map(|h| h.join().unwrap_or(0)).sum();
    assert_eq!(received, ITEMS);
}

fn bench_handoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounded_buffer_handoff");
    group.throughput(Throughput::Elements(ITEMS));

    for &(capacity, consumers) in &[(1, 1), (10, 1), (10, 8), (64, 8)] {
        let id = BenchmarkId::from_parameter(format!("cap{}_consumers{}", capacity, consumers));
        group.bench_with_input(id, &(capacity, consumers), |b, &(cap, n)| {
            b.iter(|| handoff(cap, n));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_handoff);
criterion_main!(benches);
