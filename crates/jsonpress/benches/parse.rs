//! Benchmark – `jsonpress::parse` and `jsonpress::serialize`, with
//! `serde_json` alongside for scale.
#![allow(missing_docs)]

use std::{fmt::Write, time::Duration};

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// `{"data":"aaaa…"}`: one long string, mostly bulk copying.
fn long_string(target_len: usize) -> String {
    let overhead = "{\"data\":\"\"}".len();
    let mut s = String::with_capacity(target_len);
    s.push_str("{\"data\":\"");
    s.extend(std::iter::repeat_n('a', target_len.saturating_sub(overhead)));
    s.push_str("\"}");
    s
}

/// A flat array of mixed integers and fractions.
fn numbers(count: usize) -> String {
    let mut s = String::from("[");
    for i in 0..count {
        if i > 0 {
            s.push(',');
        }
        if i % 2 == 0 {
            write!(s, "{i}").unwrap();
        } else {
            write!(s, "-{i}.{:03}e-2", i % 1000).unwrap();
        }
    }
    s.push(']');
    s
}

/// An array of small records, each an object with a handful of members.
fn records(count: usize) -> String {
    let mut s = String::from("[");
    for i in 0..count {
        if i > 0 {
            s.push(',');
        }
        write!(
            s,
            r#"{{"id":{i},"name":"record é {i}","active":{},"tags":["a","b"],"parent":null}}"#,
            i % 3 == 0
        )
        .unwrap();
    }
    s.push(']');
    s
}

fn payloads() -> Vec<(&'static str, String)> {
    vec![
        ("long_string", long_string(100_000)),
        ("numbers", numbers(10_000)),
        ("records", records(2_000)),
    ]
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, payload) in payloads() {
        group.bench_with_input(BenchmarkId::new("jsonpress", name), &payload, |b, p| {
            b.iter(|| black_box(jsonpress::parse(black_box(p.as_bytes())).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("serde_json", name), &payload, |b, p| {
            b.iter(|| {
                black_box(serde_json::from_slice::<serde_json::Value>(black_box(p.as_bytes())).unwrap())
            });
        });
    }
    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");
    for (name, payload) in payloads() {
        let value = jsonpress::parse(&payload).unwrap();
        group.bench_with_input(BenchmarkId::new("jsonpress", name), &value, |b, v| {
            let mut out = Vec::with_capacity(payload.len() * 2);
            b.iter(|| {
                out.clear();
                jsonpress::serialize::write(black_box(v), &mut out);
                black_box(out.len())
            });
        });
    }
    group.finish();
}

fn criterion() -> Criterion {
    let mut c = Criterion::default();
    if cfg!(feature = "bench-fast") {
        c = c
            .warm_up_time(Duration::from_millis(10))
            .measurement_time(Duration::from_millis(100))
            .sample_size(10);
    } else {
        c = c
            .warm_up_time(Duration::from_secs(3))
            .measurement_time(Duration::from_secs(5));
    }
    c
}

criterion_group! { name = benches; config = criterion(); targets = bench_parse, bench_serialize }
criterion_main!(benches);
