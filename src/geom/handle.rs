//! Owning surface handle used by the C and wasm boundaries.
//!
//! Results are written into caller-provided slices whose lengths are checked
//! before anything is evaluated. A failed call leaves the output untouched.

use super::batch::{self, BatchOptions};
use super::core::Point3;
use super::differential::{self, DifferentialFrame, DifferentiationOptions};
use super::error::{KernelError, KernelResult};
use super::surface::{NurbsSurface, Surface, SurfaceBuffers};

/// A validated surface owned by a boundary caller.
///
/// Not `Clone`: each handle is created once and destroyed once.
#[derive(Debug)]
pub struct SurfaceHandle {
    surface: NurbsSurface,
    options: BatchOptions,
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> KernelResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(KernelError::BufferLength { what, expected, actual })
    }
}

fn write_point(out: &mut [f64], point: Point3) {
    out.copy_from_slice(&point.to_array());
}

impl SurfaceHandle {
    /// Copies and validates the buffers into a new surface.
    pub fn create(buffers: &SurfaceBuffers<'_>) -> KernelResult<Self> {
        NurbsSurface::from_buffers(buffers).map(Self::from_surface)
    }

    #[must_use]
    pub fn from_surface(surface: NurbsSurface) -> Self {
        Self {
            surface,
            options: BatchOptions::default(),
        }
    }

    #[must_use]
    pub fn surface(&self) -> &NurbsSurface {
        &self.surface
    }

    /// Writes the point at `(u, v)` into `out[0..3]`.
    pub fn evaluate_into(&self, u: f64, v: f64, out: &mut [f64]) -> KernelResult<()> {
        check_len("point", 3, out.len())?;
        write_point(out, self.surface.evaluate(u, v)?);
        Ok(())
    }

    /// `uv` holds interleaved `[u0, v0, u1, v1, ...]`; `out` receives one
    /// `xyz` triple per pair.
    pub fn evaluate_batch_into(&self, uv: &[f64], out: &mut [f64]) -> KernelResult<()> {
        if uv.len() % 2 != 0 {
            return Err(KernelError::BufferLength {
                what: "parameter",
                expected: uv.len() + 1,
                actual: uv.len(),
            });
        }
        let count = uv.len() / 2;
        check_len("batch output", count * 3, out.len())?;

        let params: Vec<(f64, f64)> = uv.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect();
        let points = batch::evaluate_batch_with(&self.surface, &params, &self.options)?;
        for (slot, point) in out.chunks_exact_mut(3).zip(points) {
            write_point(slot, point);
        }
        Ok(())
    }

    /// Writes a `u_samples x v_samples` grid, row-major with `u` outer.
    pub fn evaluate_grid_into(&self, u_samples: usize, v_samples: usize, out: &mut [f64]) -> KernelResult<()> {
        let expected = u_samples.saturating_mul(v_samples).saturating_mul(3);
        check_len("grid output", expected, out.len())?;
        let grid = batch::evaluate_grid_with(&self.surface, u_samples, v_samples, &self.options)?;
        for (slot, point) in out.chunks_exact_mut(3).zip(grid.points) {
            write_point(slot, point);
        }
        Ok(())
    }

    /// Writes the unit normal at `(u, v)` into `out[0..3]`.
    pub fn normal_into(&self, u: f64, v: f64, out: &mut [f64]) -> KernelResult<()> {
        check_len("normal", 3, out.len())?;
        let normal = differential::normal(&self.surface, u, v)?;
        out.copy_from_slice(&normal.to_array());
        Ok(())
    }

    /// Writes `[k1, k2]` with `k1 >= k2` into `out[0..2]`.
    pub fn curvature_into(&self, u: f64, v: f64, out: &mut [f64]) -> KernelResult<()> {
        check_len("curvature", 2, out.len())?;
        let (k1, k2) = differential::principal_curvatures(&self.surface, u, v)?;
        out[0] = k1;
        out[1] = k2;
        Ok(())
    }

    pub fn frame(&self, u: f64, v: f64, options: &DifferentiationOptions) -> KernelResult<DifferentialFrame> {
        differential::differential_frame(&self.surface, u, v, options)
    }

    /// `(u_count, v_count)`.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        self.surface.dimensions()
    }

    /// `[u_start, u_end, v_start, v_end]`.
    #[must_use]
    pub fn domain(&self) -> [f64; 4] {
        let (u0, u1) = self.surface.domain_u();
        let (v0, v1) = self.surface.domain_v();
        [u0, u1, v0, v1]
    }

    /// Releases the surface. Consuming `self` rules out reuse.
    pub fn destroy(self) {
        log::debug!("destroying surface handle {:?}", self.surface.dimensions());
    }
}
