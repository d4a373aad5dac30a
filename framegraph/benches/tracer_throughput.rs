// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Throughput benchmarks for the lock-free tracer hot path: single-threaded
//! push cost and push cost under concurrent writers, plus the `get_trace`
//! replay scan that downstream profiling relies on.

use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use framegraph::infrastructure::profiler::Tracer;
use framegraph_domain::record_key::{RecordKey, TraceEventType, TraceLevel};

fn bench_single_threaded_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracer_push_single_thread");
    for capacity in [1_000usize, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("capacity", capacity), &capacity, |b, &capacity| {
            let tracer = Tracer::new(capacity);
            let mut pts = 0i64;
            b.iter(|| {
                let key = RecordKey::new("stream-0", pts);
                tracer.record_raw(black_box(key), "decode", "PROCESS", pts, TraceLevel::Module, TraceEventType::Start);
                pts += 1;
            });
        });
    }
    group.finish();
}

fn bench_concurrent_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracer_push_concurrent");
    for writers in [2usize, 4, 8] {
        group.bench_with_input(BenchmarkId::new("writers", writers), &writers, |b, &writers| {
            let tracer = Arc::new(Tracer::new(100_000));
            b.iter(|| {
                thread::scope(|s| {
                    for w in 0..writers {
                        let tracer = tracer.clone();
                        s.spawn(move || {
                            for pts in 0..200i64 {
                                let key = RecordKey::new(format!("stream-{w}"), pts);
                                tracer.record_raw(key, "decode", "PROCESS", pts, TraceLevel::Module, TraceEventType::Start);
                            }
                        });
                    }
                });
            });
        });
    }
    group.finish();
}

fn bench_get_trace_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracer_get_trace_replay");
    let tracer = Tracer::new(50_000);
    for pts in 0..40_000i64 {
        let key = RecordKey::new("stream-0", pts);
        tracer.record_raw(key.clone(), "decode", "PROCESS", pts, TraceLevel::Module, TraceEventType::Start);
        tracer.record_raw(key, "decode", "PROCESS", pts + 1, TraceLevel::Module, TraceEventType::End);
    }
    group.bench_function("full_window", |b| {
        b.iter(|| black_box(tracer.get_trace(0, i64::MAX)));
    });
    group.finish();
}

criterion_group!(benches, bench_single_threaded_push, bench_concurrent_push, bench_get_trace_replay);
criterion_main!(benches);
