//! Batch and grid evaluation.
//!
//! Every call validates all of its parameters before evaluating anything, so
//! a batch either succeeds as a whole or reports the first offending pair.
//! Results keep input order; with the `parallel` feature, work is split
//! across the rayon pool once it reaches [`BatchOptions::parallel_threshold`].

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::core::{Point3, Vec3};
use super::error::{Direction, KernelError, KernelResult};
use super::surface::{NurbsSurface, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Below this many evaluations the batch runs on the calling thread.
    pub parallel_threshold: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel_threshold: 256,
        }
    }
}

#[cfg(feature = "parallel")]
fn map_ordered<T, R, F>(items: &[T], options: &BatchOptions, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    if items.len() >= options.parallel_threshold {
        log::debug!("batch of {} on the rayon pool", items.len());
        items.par_iter().map(f).collect()
    } else {
        items.iter().map(f).collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn map_ordered<T, R, F>(items: &[T], _options: &BatchOptions, f: F) -> Vec<R>
where
    F: Fn(&T) -> R,
{
    items.iter().map(f).collect()
}

fn check_all<S: Surface + ?Sized>(surface: &S, params: &[(f64, f64)]) -> KernelResult<()> {
    params.iter().try_for_each(|&(u, v)| surface.check_domain(u, v))
}

/// Points for each `(u, v)` in `params`, in input order.
pub fn evaluate_batch<S>(surface: &S, params: &[(f64, f64)]) -> KernelResult<Vec<Point3>>
where
    S: Surface + Sync + ?Sized,
{
    evaluate_batch_with(surface, params, &BatchOptions::default())
}

pub fn evaluate_batch_with<S>(surface: &S, params: &[(f64, f64)], options: &BatchOptions) -> KernelResult<Vec<Point3>>
where
    S: Surface + Sync + ?Sized,
{
    check_all(surface, params)?;
    log::debug!("evaluating batch of {} points", params.len());
    Ok(map_ordered(params, options, |&(u, v)| surface.point_at(u, v)))
}

/// Unit normals for each `(u, v)` in `params`; fails on the first degenerate point.
pub fn normals_batch<S>(surface: &S, params: &[(f64, f64)]) -> KernelResult<Vec<Vec3>>
where
    S: Surface + Sync + ?Sized,
{
    check_all(surface, params)?;
    map_ordered(params, &BatchOptions::default(), |&(u, v)| {
        super::differential::normal(surface, u, v)
    })
    .into_iter()
    .collect()
}

/// Principal curvatures `(k1, k2)` for each `(u, v)` in `params`.
pub fn curvatures_batch<S>(surface: &S, params: &[(f64, f64)]) -> KernelResult<Vec<(f64, f64)>>
where
    S: Surface + Sync + ?Sized,
{
    check_all(surface, params)?;
    map_ordered(params, &BatchOptions::default(), |&(u, v)| {
        super::differential::principal_curvatures(surface, u, v)
    })
    .into_iter()
    .collect()
}

/// `count` evenly spaced values from `start` to `end`; the last is exactly `end`.
#[must_use]
pub fn grid_parameters(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let last = count - 1;
            let step = (end - start) / last as f64;
            (0..count)
                .map(|i| if i == last { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Points sampled on a regular `u_samples x v_samples` parameter grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceGrid {
    pub u_samples: usize,
    pub v_samples: usize,
    pub u_params: Vec<f64>,
    pub v_params: Vec<f64>,
    /// Row-major `[i][j]` with `i` along `u`.
    pub points: Vec<Point3>,
}

impl SurfaceGrid {
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<Point3> {
        (i < self.u_samples && j < self.v_samples).then(|| self.points[i * self.v_samples + j])
    }

    /// Flat `[x, y, z, x, y, z, ...]` in row-major order.
    #[must_use]
    pub fn to_flat(&self) -> Vec<f64> {
        self.points.iter().flat_map(|p| p.to_array()).collect()
    }
}

fn check_samples(u_samples: usize, v_samples: usize) -> KernelResult<()> {
    if u_samples < 2 {
        return Err(KernelError::InvalidSampleCount {
            direction: Direction::U,
            count: u_samples,
        });
    }
    if v_samples < 2 {
        return Err(KernelError::InvalidSampleCount {
            direction: Direction::V,
            count: v_samples,
        });
    }
    Ok(())
}

/// Samples the whole domain on a `u_samples x v_samples` grid, edges included.
pub fn evaluate_grid<S>(surface: &S, u_samples: usize, v_samples: usize) -> KernelResult<SurfaceGrid>
where
    S: Surface + Sync + ?Sized,
{
    evaluate_grid_with(surface, u_samples, v_samples, &BatchOptions::default())
}

pub fn evaluate_grid_with<S>(
    surface: &S,
    u_samples: usize,
    v_samples: usize,
    options: &BatchOptions,
) -> KernelResult<SurfaceGrid>
where
    S: Surface + Sync + ?Sized,
{
    check_samples(u_samples, v_samples)?;
    let too_large = KernelError::GridTooLarge { u_samples, v_samples };
    let count = u_samples.checked_mul(v_samples).ok_or_else(|| too_large.clone())?;
    let mut points = Vec::new();
    points.try_reserve_exact(count).map_err(|_| too_large)?;
    points.resize(count, Point3::ORIGIN);

    let (u0, u1) = surface.domain_u();
    let (v0, v1) = surface.domain_v();
    let u_params = grid_parameters(u0, u1, u_samples);
    let v_params = grid_parameters(v0, v1, v_samples);

    log::debug!("evaluating {u_samples}x{v_samples} grid");
    fill_rows(surface, &u_params, &v_params, &mut points, options);

    Ok(SurfaceGrid {
        u_samples,
        v_samples,
        u_params,
        v_params,
        points,
    })
}

fn fill_row<S: Surface + ?Sized>(surface: &S, u: f64, v_params: &[f64], row: &mut [Point3]) {
    for (slot, &v) in row.iter_mut().zip(v_params) {
        *slot = surface.point_at(u, v);
    }
}

#[cfg(feature = "parallel")]
fn fill_rows<S>(surface: &S, u_params: &[f64], v_params: &[f64], points: &mut [Point3], options: &BatchOptions)
where
    S: Surface + Sync + ?Sized,
{
    if points.len() >= options.parallel_threshold {
        log::debug!("grid of {} rows on the rayon pool", u_params.len());
        points
            .par_chunks_mut(v_params.len())
            .zip(u_params.par_iter())
            .for_each(|(row, &u)| fill_row(surface, u, v_params, row));
    } else {
        for (row, &u) in points.chunks_mut(v_params.len()).zip(u_params) {
            fill_row(surface, u, v_params, row);
        }
    }
}

#[cfg(not(feature = "parallel"))]
fn fill_rows<S>(surface: &S, u_params: &[f64], v_params: &[f64], points: &mut [Point3], _options: &BatchOptions)
where
    S: Surface + ?Sized,
{
    for (row, &u) in points.chunks_mut(v_params.len()).zip(u_params) {
        fill_row(surface, u, v_params, row);
    }
}

impl NurbsSurface {
    pub fn evaluate_batch(&self, params: &[(f64, f64)]) -> KernelResult<Vec<Point3>> {
        evaluate_batch(self, params)
    }

    pub fn evaluate_grid(&self, u_samples: usize, v_samples: usize) -> KernelResult<SurfaceGrid> {
        evaluate_grid(self, u_samples, v_samples)
    }
}
