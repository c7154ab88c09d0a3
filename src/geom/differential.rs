//! Tangents, normals and principal curvatures of parametric surfaces.
//!
//! Derivatives come from central finite differences of [`Surface::point_at`]
//! by default. Steps are fractions of the domain width and sample points are
//! clamped into the domain, so differences become one-sided at the edges.
//! Second derivatives are differences of first-derivative estimates taken
//! with the larger `second_step`.
//!
//! Finite-difference curvature depends on the step sizes and loses accuracy
//! on strongly curved or coarsely parameterised surfaces.
//! [`DerivativeMethod::Analytic`] uses exact basis derivatives instead where
//! the surface provides them.

use serde::{Deserialize, Serialize};

use super::core::{Mat2, Point3, Tolerance, Vec3};
use super::error::{KernelError, KernelResult};
use super::surface::{NurbsSurface, Surface, SurfaceDerivatives};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivativeMethod {
    #[default]
    CentralDifference,
    Analytic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifferentiationOptions {
    pub method: DerivativeMethod,
    /// First-derivative step as a fraction of the domain width.
    pub first_step: f64,
    /// Second-derivative step as a fraction of the domain width.
    pub second_step: f64,
}

impl Default for DifferentiationOptions {
    fn default() -> Self {
        Self {
            method: DerivativeMethod::CentralDifference,
            first_step: Tolerance::DERIVATIVE.eps,
            second_step: Tolerance::SECOND_DERIVATIVE.eps,
        }
    }
}

/// Tangents, unit normal and principal curvatures at one parameter pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifferentialFrame {
    pub point: Point3,
    pub su: Vec3,
    pub sv: Vec3,
    /// `normalize(su × sv)`; orientation is not canonicalised.
    pub normal: Vec3,
    /// Larger principal curvature.
    pub k1: f64,
    /// Smaller principal curvature.
    pub k2: f64,
    pub k1_direction: Vec3,
    pub k2_direction: Vec3,
    /// `k1 · k2`.
    pub gaussian: f64,
    /// `(k1 + k2) / 2`.
    pub mean: f64,
}

/// Sample pair around `x` with step `h`, kept inside `[lo, hi]`.
fn clamped_pair(x: f64, h: f64, (lo, hi): (f64, f64)) -> (f64, f64) {
    ((x - h).max(lo), (x + h).min(hi))
}

fn step_for(fraction: f64, (lo, hi): (f64, f64)) -> f64 {
    Tolerance::new(fraction).relative_to(hi - lo)
}

/// Finite-difference `(Su, Sv)` at an in-domain point.
fn difference_tangents<S: Surface + ?Sized>(surface: &S, u: f64, v: f64, step: f64) -> (Vec3, Vec3) {
    let domain_u = surface.domain_u();
    let domain_v = surface.domain_v();

    let (ua, ub) = clamped_pair(u, step_for(step, domain_u), domain_u);
    let su = if ub > ua {
        surface.point_at(ub, v).sub_point(surface.point_at(ua, v)).div_scalar(ub - ua)
    } else {
        Vec3::ZERO
    };

    let (va, vb) = clamped_pair(v, step_for(step, domain_v), domain_v);
    let sv = if vb > va {
        surface.point_at(u, vb).sub_point(surface.point_at(u, va)).div_scalar(vb - va)
    } else {
        Vec3::ZERO
    };

    (su, sv)
}

fn difference_derivatives<S: Surface + ?Sized>(
    surface: &S,
    u: f64,
    v: f64,
    options: &DifferentiationOptions,
) -> SurfaceDerivatives {
    let domain_u = surface.domain_u();
    let domain_v = surface.domain_v();
    let (su, sv) = difference_tangents(surface, u, v, options.first_step);

    let (ua, ub) = clamped_pair(u, step_for(options.second_step, domain_u), domain_u);
    let (suu, suv) = if ub > ua {
        let (su_a, sv_a) = difference_tangents(surface, ua, v, options.first_step);
        let (su_b, sv_b) = difference_tangents(surface, ub, v, options.first_step);
        let inv = 1.0 / (ub - ua);
        (su_b.sub(su_a).mul_scalar(inv), sv_b.sub(sv_a).mul_scalar(inv))
    } else {
        (Vec3::ZERO, Vec3::ZERO)
    };

    let (va, vb) = clamped_pair(v, step_for(options.second_step, domain_v), domain_v);
    let svv = if vb > va {
        let (_, sv_a) = difference_tangents(surface, u, va, options.first_step);
        let (_, sv_b) = difference_tangents(surface, u, vb, options.first_step);
        sv_b.sub(sv_a).div_scalar(vb - va)
    } else {
        Vec3::ZERO
    };

    SurfaceDerivatives {
        point: surface.point_at(u, v),
        su,
        sv,
        suu,
        suv,
        svv,
    }
}

/// First and second derivatives at `(u, v)` using `options.method`.
///
/// Falls back to central differences when the analytic method is requested
/// for a surface without exact derivatives.
pub fn surface_derivatives<S: Surface + ?Sized>(
    surface: &S,
    u: f64,
    v: f64,
    options: &DifferentiationOptions,
) -> KernelResult<SurfaceDerivatives> {
    surface.check_domain(u, v)?;
    let exact = match options.method {
        DerivativeMethod::Analytic => surface.analytic_derivatives(u, v),
        DerivativeMethod::CentralDifference => None,
    };
    Ok(exact.unwrap_or_else(|| difference_derivatives(surface, u, v, options)))
}

/// `(Su, Sv)` at `(u, v)` by central differences.
pub fn tangents<S: Surface + ?Sized>(surface: &S, u: f64, v: f64) -> KernelResult<(Vec3, Vec3)> {
    surface.check_domain(u, v)?;
    Ok(difference_tangents(surface, u, v, Tolerance::DERIVATIVE.eps))
}

/// Unit normal `normalize(Su × Sv)` at `(u, v)`.
pub fn normal<S: Surface + ?Sized>(surface: &S, u: f64, v: f64) -> KernelResult<Vec3> {
    let (su, sv) = tangents(surface, u, v)?;
    su.cross(sv).normalized().ok_or(KernelError::Degenerate {
        u,
        v,
        reason: "tangents are parallel",
    })
}

/// Principal curvatures `(k1, k2)` with `k1 >= k2`.
pub fn principal_curvatures<S: Surface + ?Sized>(surface: &S, u: f64, v: f64) -> KernelResult<(f64, f64)> {
    let frame = differential_frame(surface, u, v, &DifferentiationOptions::default())?;
    Ok((frame.k1, frame.k2))
}

/// Full differential frame at `(u, v)`.
pub fn differential_frame<S: Surface + ?Sized>(
    surface: &S,
    u: f64,
    v: f64,
    options: &DifferentiationOptions,
) -> KernelResult<DifferentialFrame> {
    let d = surface_derivatives(surface, u, v, options)?;
    frame_from_derivatives(&d, u, v)
}

/// Shape-operator analysis of precomputed derivatives.
///
/// `I = [[E, F], [F, G]]`, `II = [[L, M], [M, N]]`; the principal
/// curvatures are the eigenvalues of `II · I⁻¹`.
pub fn frame_from_derivatives(d: &SurfaceDerivatives, u: f64, v: f64) -> KernelResult<DifferentialFrame> {
    let normal = d.su.cross(d.sv).normalized().ok_or(KernelError::Degenerate {
        u,
        v,
        reason: "tangents are parallel",
    })?;

    let first = Mat2::symmetric(d.su.dot(d.su), d.su.dot(d.sv), d.sv.dot(d.sv));
    let second = Mat2::symmetric(normal.dot(d.suu), normal.dot(d.suv), normal.dot(d.svv));
    let first_inv = first.inverse().ok_or(KernelError::Degenerate {
        u,
        v,
        reason: "first fundamental form is singular",
    })?;

    let shape = second.mul(first_inv);
    let (k1, k2) = shape.real_eigenvalues();
    let (k1_direction, k2_direction) = principal_directions(first, second, k1, k2, d.su, d.sv, normal);

    Ok(DifferentialFrame {
        point: d.point,
        su: d.su,
        sv: d.sv,
        normal,
        k1,
        k2,
        k1_direction,
        k2_direction,
        gaussian: shape.determinant(),
        mean: 0.5 * shape.trace(),
    })
}

/// Tangent-plane directions for `k1` and `k2`, from `(II - κ·I)(α, β) = 0`.
fn principal_directions(
    first: Mat2,
    second: Mat2,
    k1: f64,
    k2: f64,
    su: Vec3,
    sv: Vec3,
    normal: Vec3,
) -> (Vec3, Vec3) {
    let fallback = su.normalized().unwrap_or(Vec3::X);
    let direction_for = |kappa: f64| -> Option<Vec3> {
        let rows = [
            (second.m[0][0] - kappa * first.m[0][0], second.m[0][1] - kappa * first.m[0][1]),
            (second.m[1][0] - kappa * first.m[1][0], second.m[1][1] - kappa * first.m[1][1]),
        ];
        // The row with the larger norm is the better conditioned equation.
        let (a, b) = if rows[0].0.hypot(rows[0].1) >= rows[1].0.hypot(rows[1].1) {
            rows[0]
        } else {
            rows[1]
        };
        if a.hypot(b) <= Tolerance::ZERO_LENGTH.eps {
            return None;
        }
        su.mul_scalar(-b).add(sv.mul_scalar(a)).normalized()
    };

    let dir1 = if (k1 - k2).abs() <= Tolerance::ZERO_LENGTH.eps {
        fallback
    } else {
        direction_for(k1).unwrap_or(fallback)
    };
    let orthogonal = normal.cross(dir1).normalized().unwrap_or(Vec3::Y);
    let dir2 = match direction_for(k2) {
        Some(dir) if dir.dot(dir1).abs() <= 0.1 => dir,
        _ => orthogonal,
    };
    (dir1, dir2)
}

impl NurbsSurface {
    /// Unit normal at `(u, v)` by central differences.
    pub fn normal(&self, u: f64, v: f64) -> KernelResult<Vec3> {
        normal(self, u, v)
    }

    /// Principal curvatures `(k1, k2)` at `(u, v)` by central differences.
    pub fn curvature(&self, u: f64, v: f64) -> KernelResult<(f64, f64)> {
        principal_curvatures(self, u, v)
    }

    pub fn frame(&self, u: f64, v: f64, options: &DifferentiationOptions) -> KernelResult<DifferentialFrame> {
        differential_frame(self, u, v, options)
    }
}
