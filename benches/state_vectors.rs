use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use keplerian_transit::{OrbitalState, StateVectors, GRAVITATIONAL_CONSTANT};
use std::{f64::consts::TAU, hint::black_box};

const POLL_ITERS: u64 = 1024;
const MULTIPLIER: f64 = TAU / POLL_ITERS as f64;
const EARTH_MASS: f64 = 5.972e24;

#[inline(always)]
fn poll_sv_time(orbit: &OrbitalState) {
    for i in 0..POLL_ITERS {
        let time = i as f64 * MULTIPLIER * 100.0;
        black_box(orbit.state_vectors_at_time(black_box(time)));
    }
}

#[inline(always)]
fn poll_to_orbit(samples: &[StateVectors]) {
    for &sv in samples {
        black_box(black_box(sv).to_orbit(EARTH_MASS, 0.0, GRAVITATIONAL_CONSTANT)).ok();
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let orbit = OrbitalState::new(EARTH_MASS, 2.4e7, 0.3, 0.5, 1.0, 2.0, 0.0, 0.0);

    let samples = (0..POLL_ITERS)
        .map(|i| orbit.state_vectors_at_time(i as f64 * 60.0))
        .collect::<Box<_>>();

    let mut group = c.benchmark_group("state_vectors");
    group.throughput(Throughput::Elements(POLL_ITERS));

    group.bench_function("at time", |b| b.iter(|| poll_sv_time(black_box(&orbit))));
    group.bench_function("to orbit", |b| {
        b.iter(|| poll_to_orbit(black_box(&samples)))
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
