use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use glam::DVec3;
use keplerian_transit::{body_presets, SimConfig, SystemPath};
use std::hint::black_box;

const POLL_ITERS: u64 = 1024;

fn criterion_benchmark(c: &mut Criterion) {
    let space = body_presets::sol(SystemPath::new(0, 0, 0, 0), 0.0, SimConfig::default())
        .expect("preset system should build");
    let root = space.root();
    let moon = space
        .body_id_with_name("The Moon")
        .map(|moon| space.frames_owned_by(moon)[0])
        .expect("the Moon exists");
    let surface = space
        .body_id_with_name("Earth")
        .map(|earth| space.frames_owned_by(earth)[1])
        .expect("Earth exists");

    let points = (0..POLL_ITERS)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * (i as f64) / (POLL_ITERS as f64);
            DVec3::new(angle.cos(), angle.sin(), 0.1) * 1.0e7
        })
        .collect::<Box<_>>();
    let points = black_box(points);

    let mut group = c.benchmark_group("frame_transformation");
    group.throughput(Throughput::Elements(POLL_ITERS));

    group.bench_function("surface to root", |b| {
        b.iter(|| {
            for &point in points.iter() {
                black_box(space.transform_state(point, DVec3::ZERO, surface, root)).ok();
            }
        })
    });
    group.bench_function("surface to moon", |b| {
        b.iter(|| {
            for &point in points.iter() {
                black_box(space.transform_state(point, DVec3::ZERO, surface, moon)).ok();
            }
        })
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
