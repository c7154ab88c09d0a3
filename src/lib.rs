//! NURBS surface evaluation kernel.
//!
//! [`geom`] holds the math: knot vectors and B-spline basis evaluation,
//! rational tensor-product surfaces, differential geometry and the batch
//! driver. Two boundaries sit on top of [`geom::SurfaceHandle`]: a C ABI in
//! [`ffi`] and the wasm-bindgen class [`WasmNurbsSurface`].

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod ffi;
pub mod geom;

pub use geom::{
    DifferentialFrame, DifferentiationOptions, KernelError, KernelResult, NurbsSurface, Point3, SurfaceBuffers,
    SurfaceHandle, Vec3,
};

use geom::DerivativeMethod;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    // A host that already installed a logger keeps it.
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

/// JS `initThreadPool(workers)`: starts the rayon pool behind batch and
/// grid evaluation. Must resolve before the first parallel call.
#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
pub use wasm_bindgen_rayon::init_thread_pool;

fn js_error(err: &KernelError) -> JsValue {
    JsError::new(&err.to_string()).into()
}

fn js_count(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// JavaScript view of a validated surface.
///
/// Results come back as freshly allocated `Float64Array`s. Call `free()`
/// to release the surface.
#[wasm_bindgen(js_name = NurbsSurface)]
pub struct WasmNurbsSurface {
    handle: SurfaceHandle,
}

#[wasm_bindgen(js_class = NurbsSurface)]
impl WasmNurbsSurface {
    /// Copies the buffers into a new surface; throws on invalid input.
    #[wasm_bindgen(constructor)]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        u_count: usize,
        v_count: usize,
        control_points: &[f64],
        weights: &[f64],
        knots_u: &[f64],
        knots_v: &[f64],
    ) -> Result<WasmNurbsSurface, JsValue> {
        let handle = SurfaceHandle::create(&SurfaceBuffers {
            degree_u,
            degree_v,
            u_count,
            v_count,
            control_points,
            weights,
            knots_u,
            knots_v,
        })
        .map_err(|err| js_error(&err))?;
        Ok(Self { handle })
    }

    pub fn evaluate(&self, u: f64, v: f64) -> Result<Vec<f64>, JsValue> {
        let mut out = vec![0.0; 3];
        self.handle.evaluate_into(u, v, &mut out).map_err(|err| js_error(&err))?;
        Ok(out)
    }

    /// `uv` is interleaved `[u0, v0, u1, v1, ...]`.
    #[wasm_bindgen(js_name = evaluateBatch)]
    pub fn evaluate_batch(&self, uv: &[f64]) -> Result<Vec<f64>, JsValue> {
        let mut out = vec![0.0; uv.len() / 2 * 3];
        self.handle
            .evaluate_batch_into(uv, &mut out)
            .map_err(|err| js_error(&err))?;
        Ok(out)
    }

    #[wasm_bindgen(js_name = evaluateGrid)]
    pub fn evaluate_grid(&self, u_samples: usize, v_samples: usize) -> Result<Vec<f64>, JsValue> {
        let mut out = vec![0.0; u_samples.saturating_mul(v_samples).saturating_mul(3)];
        self.handle
            .evaluate_grid_into(u_samples, v_samples, &mut out)
            .map_err(|err| js_error(&err))?;
        Ok(out)
    }

    pub fn normal(&self, u: f64, v: f64) -> Result<Vec<f64>, JsValue> {
        let mut out = vec![0.0; 3];
        self.handle.normal_into(u, v, &mut out).map_err(|err| js_error(&err))?;
        Ok(out)
    }

    /// `[k1, k2]` with `k1 >= k2`.
    pub fn curvature(&self, u: f64, v: f64) -> Result<Vec<f64>, JsValue> {
        let mut out = vec![0.0; 2];
        self.handle.curvature_into(u, v, &mut out).map_err(|err| js_error(&err))?;
        Ok(out)
    }

    /// Full differential frame as a plain object.
    pub fn frame(&self, u: f64, v: f64, analytic: bool) -> Result<JsValue, JsValue> {
        let options = DifferentiationOptions {
            method: if analytic {
                DerivativeMethod::Analytic
            } else {
                DerivativeMethod::CentralDifference
            },
            ..DifferentiationOptions::default()
        };
        let frame = self.handle.frame(u, v, &options).map_err(|err| js_error(&err))?;
        serde_wasm_bindgen::to_value(&frame).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// `[u_count, v_count]`.
    pub fn dimensions(&self) -> Vec<u32> {
        let (u, v) = self.handle.dimensions();
        vec![js_count(u), js_count(v)]
    }

    /// `[u_start, u_end, v_start, v_end]`.
    pub fn domain(&self) -> Vec<f64> {
        self.handle.domain().to_vec()
    }
}
