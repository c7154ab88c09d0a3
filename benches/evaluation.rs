//! Benchmarks for basis, point, batch and grid evaluation.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use nurbs_kernel::geom::{KnotVector, NurbsSurface, Point3, uniform_knot_vector};

fn wavy_surface(n: usize, degree: usize) -> NurbsSurface {
    let mut points = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let (x, y) = (i as f64 / (n - 1) as f64, j as f64 / (n - 1) as f64);
            points.push(Point3::new(x, y, (x * 6.0).sin() * (y * 4.0).cos() * 0.1));
        }
    }
    let knots = uniform_knot_vector(n, degree).unwrap();
    let weights = (0..n * n).map(|k| 1.0 + (k % 3) as f64 * 0.25).collect();
    NurbsSurface::new(degree, degree, n, n, points, knots.clone(), knots, Some(weights)).unwrap()
}

fn params(count: usize) -> Vec<(f64, f64)> {
    (0..count)
        .map(|k| {
            let t = k as f64 / count as f64;
            (t, (t * 7.0).fract())
        })
        .collect()
}

fn bench_basis(c: &mut Criterion) {
    let knots = KnotVector::clamped_uniform(32, 3).unwrap();
    c.bench_function("basis_cubic_32", |b| b.iter(|| knots.basis(black_box(0.4321)).unwrap()));
    c.bench_function("basis_derivatives_cubic_32", |b| {
        b.iter(|| knots.basis_derivatives(black_box(0.4321), 2).unwrap())
    });
}

fn bench_point(c: &mut Criterion) {
    let surface = wavy_surface(16, 3);
    c.bench_function("evaluate_point_16x16", |b| {
        b.iter(|| surface.evaluate(black_box(0.37), black_box(0.61)).unwrap())
    });
    c.bench_function("curvature_point_16x16", |b| {
        b.iter(|| surface.curvature(black_box(0.37), black_box(0.61)).unwrap())
    });
}

fn bench_batch(c: &mut Criterion) {
    let surface = wavy_surface(16, 3);
    let uv = params(10_000);
    c.bench_function("evaluate_batch_10k", |b| b.iter(|| surface.evaluate_batch(black_box(&uv)).unwrap()));
}

fn bench_grid(c: &mut Criterion) {
    let surface = wavy_surface(16, 3);
    c.bench_function("evaluate_grid_100x100", |b| b.iter(|| surface.evaluate_grid(100, 100).unwrap()));
}

criterion_group!(benches, bench_basis, bench_point, bench_batch, bench_grid);
criterion_main!(benches);
