//! C ABI over [`SurfaceHandle`].
//!
//! `nurbs_create` copies its inputs into a boxed handle and returns it, or
//! null when the configuration is invalid. Every other call returns a
//! [`NurbsStatus`] and writes into a caller-allocated output buffer whose
//! length is fixed by the call (`3` for a point or normal, `2` for
//! curvatures, `n * 3` for a batch, `u_samples * v_samples * 3` for a grid).
//! Nothing is written when a call fails.
//!
//! The handle is owned by the caller until `nurbs_destroy`. Passing a
//! destroyed handle, destroying twice, or destroying while another thread is
//! still evaluating is undefined behaviour.

use std::ffi::{c_double, c_int};
use std::{ptr, slice};

use crate::geom::{ErrorKind, KernelError, KernelResult, SurfaceBuffers, SurfaceHandle};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NurbsStatus {
    Ok = 0,
    NullPointer = 1,
    InvalidConfiguration = 2,
    OutOfDomain = 3,
    Degenerate = 4,
    BufferMismatch = 5,
}

impl From<&KernelError> for NurbsStatus {
    fn from(err: &KernelError) -> Self {
        match err.kind() {
            ErrorKind::Configuration => Self::InvalidConfiguration,
            ErrorKind::Domain => Self::OutOfDomain,
            ErrorKind::Degenerate => Self::Degenerate,
            ErrorKind::Buffer => Self::BufferMismatch,
        }
    }
}

fn status(result: KernelResult<()>) -> NurbsStatus {
    match result {
        Ok(()) => NurbsStatus::Ok,
        Err(err) => NurbsStatus::from(&err),
    }
}

/// Borrows `len` values at `data`; a zero length never dereferences.
///
/// # Safety
/// A non-null `data` must be valid for `len` reads.
unsafe fn input<'a>(data: *const c_double, len: usize) -> Option<&'a [f64]> {
    if len == 0 {
        Some(&[])
    } else if data.is_null() {
        None
    } else {
        Some(unsafe { slice::from_raw_parts(data, len) })
    }
}

/// # Safety
/// A non-null `data` must be valid for `len` writes.
unsafe fn output<'a>(data: *mut c_double, len: usize) -> Option<&'a mut [f64]> {
    if len == 0 {
        Some(&mut [])
    } else if data.is_null() {
        None
    } else {
        Some(unsafe { slice::from_raw_parts_mut(data, len) })
    }
}

fn count(value: c_int) -> Option<usize> {
    usize::try_from(value).ok()
}

/// Builds a surface from flat buffers and returns an owning handle.
///
/// `control_points` holds `u_count * v_count * 3` values in `[u][v][xyz]`
/// order, `weights` holds `u_count * v_count`. Returns null on any invalid
/// input.
///
/// # Safety
/// Each pointer must be valid for reads of the length implied by the counts.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn nurbs_create(
    degree_u: c_int,
    degree_v: c_int,
    control_points: *const c_double,
    weights: *const c_double,
    knots_u: *const c_double,
    knots_v: *const c_double,
    u_count: c_int,
    v_count: c_int,
    knot_u_len: c_int,
    knot_v_len: c_int,
) -> *mut SurfaceHandle {
    let (Some(degree_u), Some(degree_v), Some(u_count), Some(v_count), Some(knot_u_len), Some(knot_v_len)) = (
        count(degree_u),
        count(degree_v),
        count(u_count),
        count(v_count),
        count(knot_u_len),
        count(knot_v_len),
    ) else {
        log::warn!("nurbs_create: negative degree, count or length");
        return ptr::null_mut();
    };

    let Some(net_len) = u_count.checked_mul(v_count) else {
        log::warn!("nurbs_create: control net {u_count}x{v_count} overflows");
        return ptr::null_mut();
    };
    let Some(coord_len) = net_len.checked_mul(3) else {
        log::warn!("nurbs_create: control net {u_count}x{v_count} overflows");
        return ptr::null_mut();
    };

    let buffers = unsafe {
        (
            input(control_points, coord_len),
            input(weights, net_len),
            input(knots_u, knot_u_len),
            input(knots_v, knot_v_len),
        )
    };
    let (Some(control_points), Some(weights), Some(knots_u), Some(knots_v)) = buffers else {
        log::warn!("nurbs_create: null input buffer");
        return ptr::null_mut();
    };

    match SurfaceHandle::create(&SurfaceBuffers {
        degree_u,
        degree_v,
        u_count,
        v_count,
        control_points,
        weights,
        knots_u,
        knots_v,
    }) {
        Ok(handle) => Box::into_raw(Box::new(handle)),
        Err(err) => {
            log::warn!("nurbs_create: {err}");
            ptr::null_mut()
        }
    }
}

/// Writes the point at `(u, v)` into `out[0..3]`.
///
/// # Safety
/// `handle` must come from [`nurbs_create`] and not be destroyed; `out` must
/// be valid for 3 writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nurbs_evaluate(
    handle: *const SurfaceHandle,
    u: c_double,
    v: c_double,
    out: *mut c_double,
) -> NurbsStatus {
    let (Some(handle), Some(out)) = (unsafe { handle.as_ref() }, unsafe { output(out, 3) }) else {
        return NurbsStatus::NullPointer;
    };
    status(handle.evaluate_into(u, v, out))
}

/// Evaluates `n` interleaved `(u, v)` pairs into `out[0..n * 3]`, in order.
///
/// # Safety
/// `uv` must be valid for `n * 2` reads and `out` for `n * 3` writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nurbs_evaluate_batch(
    handle: *const SurfaceHandle,
    uv: *const c_double,
    n: c_int,
    out: *mut c_double,
) -> NurbsStatus {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return NurbsStatus::NullPointer;
    };
    let Some(n) = count(n) else {
        log::warn!("nurbs_evaluate_batch: negative count");
        return NurbsStatus::BufferMismatch;
    };
    if n == 0 {
        return NurbsStatus::Ok;
    }
    let (Some(uv_len), Some(out_len)) = (n.checked_mul(2), n.checked_mul(3)) else {
        return NurbsStatus::BufferMismatch;
    };
    let (Some(uv), Some(out)) = (unsafe { input(uv, uv_len) }, unsafe { output(out, out_len) }) else {
        return NurbsStatus::NullPointer;
    };
    status(handle.evaluate_batch_into(uv, out))
}

/// Samples a `u_samples x v_samples` grid into `out`, row-major `[u][v][xyz]`.
///
/// # Safety
/// `out` must be valid for `u_samples * v_samples * 3` writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nurbs_evaluate_grid(
    handle: *const SurfaceHandle,
    u_samples: c_int,
    v_samples: c_int,
    out: *mut c_double,
) -> NurbsStatus {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return NurbsStatus::NullPointer;
    };
    let (Some(u_samples), Some(v_samples)) = (count(u_samples), count(v_samples)) else {
        return NurbsStatus::OutOfDomain;
    };
    if u_samples < 2 || v_samples < 2 {
        log::warn!("nurbs_evaluate_grid: {u_samples}x{v_samples} grid needs at least 2 samples per side");
        return NurbsStatus::OutOfDomain;
    }
    let Some(len) = u_samples.checked_mul(v_samples).and_then(|n| n.checked_mul(3)) else {
        return NurbsStatus::BufferMismatch;
    };
    let Some(out) = (unsafe { output(out, len) }) else {
        return NurbsStatus::NullPointer;
    };
    status(handle.evaluate_grid_into(u_samples, v_samples, out))
}

/// Writes the unit normal at `(u, v)` into `out[0..3]`.
///
/// # Safety
/// Same contract as [`nurbs_evaluate`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nurbs_normal(
    handle: *const SurfaceHandle,
    u: c_double,
    v: c_double,
    out: *mut c_double,
) -> NurbsStatus {
    let (Some(handle), Some(out)) = (unsafe { handle.as_ref() }, unsafe { output(out, 3) }) else {
        return NurbsStatus::NullPointer;
    };
    status(handle.normal_into(u, v, out))
}

/// Writes `[k1, k2]` (`k1 >= k2`) into `out[0..2]`.
///
/// # Safety
/// `handle` must be live; `out` must be valid for 2 writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nurbs_curvature(
    handle: *const SurfaceHandle,
    u: c_double,
    v: c_double,
    out: *mut c_double,
) -> NurbsStatus {
    let (Some(handle), Some(out)) = (unsafe { handle.as_ref() }, unsafe { output(out, 2) }) else {
        return NurbsStatus::NullPointer;
    };
    status(handle.curvature_into(u, v, out))
}

/// # Safety
/// `handle` must be live; `u_count` and `v_count` must be valid for a write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nurbs_dimensions(
    handle: *const SurfaceHandle,
    u_count: *mut c_int,
    v_count: *mut c_int,
) -> NurbsStatus {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return NurbsStatus::NullPointer;
    };
    if u_count.is_null() || v_count.is_null() {
        return NurbsStatus::NullPointer;
    }
    let (u, v) = handle.dimensions();
    // Counts entered through `nurbs_create` as `c_int`.
    unsafe {
        *u_count = c_int::try_from(u).unwrap_or(c_int::MAX);
        *v_count = c_int::try_from(v).unwrap_or(c_int::MAX);
    }
    NurbsStatus::Ok
}

/// Writes `[u_start, u_end, v_start, v_end]` into `out[0..4]`.
///
/// # Safety
/// `handle` must be live; `out` must be valid for 4 writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nurbs_domain(handle: *const SurfaceHandle, out: *mut c_double) -> NurbsStatus {
    let (Some(handle), Some(out)) = (unsafe { handle.as_ref() }, unsafe { output(out, 4) }) else {
        return NurbsStatus::NullPointer;
    };
    out.copy_from_slice(&handle.domain());
    NurbsStatus::Ok
}

/// Releases a handle. Null is ignored.
///
/// # Safety
/// `handle` must come from [`nurbs_create`] and must not be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nurbs_destroy(handle: *mut SurfaceHandle) {
    if handle.is_null() {
        return;
    }
    let handle = *unsafe { Box::from_raw(handle) };
    handle.destroy();
}
