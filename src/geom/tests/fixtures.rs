//! Shared surfaces for the geometry tests.

use std::f64::consts::FRAC_1_SQRT_2;

use crate::geom::{NurbsSurface, Point3};

pub const CUBIC_KNOTS: [f64; 9] = [0.0, 0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0, 1.0];

/// Degree 3, 5x5 grid with `P[i][j] = (i/4, j/4, 0)`, unit weights.
pub fn flat_cubic() -> NurbsSurface {
    let points = (0..5)
        .flat_map(|i| (0..5).map(move |j| Point3::new(f64::from(i) / 4.0, f64::from(j) / 4.0, 0.0)))
        .collect();
    NurbsSurface::new(3, 3, 5, 5, points, CUBIC_KNOTS.to_vec(), CUBIC_KNOTS.to_vec(), None)
        .expect("flat cubic surface")
}

/// Same net as [`flat_cubic`] with a bump lifted at the centre.
pub fn bumped_cubic() -> NurbsSurface {
    let points = (0..5)
        .flat_map(|i| {
            (0..5).map(move |j| {
                let z = if i == 2 && j == 2 { 0.5 } else { 0.0 };
                Point3::new(f64::from(i) / 4.0, f64::from(j) / 4.0, z)
            })
        })
        .collect();
    let weights = (0..25).map(|k| if k == 12 { 2.0 } else { 1.0 }).collect();
    NurbsSurface::new(3, 3, 5, 5, points, CUBIC_KNOTS.to_vec(), CUBIC_KNOTS.to_vec(), Some(weights))
        .expect("bumped cubic surface")
}

/// Quarter cylinder of `radius` around the z axis, height 1.
///
/// `u` runs along an exact rational quadratic arc from `(r, 0)` to `(0, r)`;
/// `v` is linear in `z`.
pub fn quarter_cylinder(radius: f64) -> NurbsSurface {
    let arc = [(radius, 0.0), (radius, radius), (0.0, radius)];
    let arc_weights = [1.0, FRAC_1_SQRT_2, 1.0];

    let mut points = Vec::with_capacity(6);
    let mut weights = Vec::with_capacity(6);
    for (&(x, y), &w) in arc.iter().zip(arc_weights.iter()) {
        for z in [0.0, 1.0] {
            points.push(Point3::new(x, y, z));
            weights.push(w);
        }
    }

    NurbsSurface::new(
        2,
        1,
        3,
        2,
        points,
        vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        vec![0.0, 0.0, 1.0, 1.0],
        Some(weights),
    )
    .expect("quarter cylinder")
}
