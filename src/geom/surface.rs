use super::basis::KnotVector;
use super::core::{Point3, Vec3};
use super::error::{Direction, KernelError, KernelResult};

/// A parametric surface over a rectangular domain.
///
/// `point_at` assumes its parameters are inside the domain; the checked
/// entry points validate with [`Surface::check_domain`] first.
pub trait Surface {
    fn domain_u(&self) -> (f64, f64);

    fn domain_v(&self) -> (f64, f64);

    fn point_at(&self, u: f64, v: f64) -> Point3;

    /// Exact derivatives, for surfaces that can provide them.
    #[must_use]
    fn analytic_derivatives(&self, _u: f64, _v: f64) -> Option<SurfaceDerivatives> {
        None
    }

    /// Rejects parameters outside the closed domain (NaN included).
    fn check_domain(&self, u: f64, v: f64) -> KernelResult<()> {
        check_parameter(Direction::U, u, self.domain_u())?;
        check_parameter(Direction::V, v, self.domain_v())
    }
}

fn check_parameter(direction: Direction, value: f64, (start, end): (f64, f64)) -> KernelResult<()> {
    if value >= start && value <= end {
        Ok(())
    } else {
        Err(KernelError::OutOfDomain {
            direction,
            value,
            start,
            end,
        })
    }
}

/// Point and first/second partial derivatives at one parameter pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDerivatives {
    pub point: Point3,
    pub su: Vec3,
    pub sv: Vec3,
    pub suu: Vec3,
    pub suv: Vec3,
    pub svv: Vec3,
}

/// Homogeneous accumulator `(w·x, w·y, w·z, w)`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HPoint4 {
    x: f64,
    y: f64,
    z: f64,
    w: f64,
}

impl HPoint4 {
    const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 0.0,
    };

    fn accumulate(&mut self, point: Point3, weight: f64, basis: f64) {
        let bw = basis * weight;
        self.x += bw * point.x;
        self.y += bw * point.y;
        self.z += bw * point.z;
        self.w += bw;
    }

    const fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    fn project(self) -> Point3 {
        Point3::new(self.x / self.w, self.y / self.w, self.z / self.w)
    }
}

/// Flat, caller-owned description of a surface, as it crosses a boundary.
///
/// `control_points` is row-major `[u][v][xyz]`, `weights` is row-major
/// `[u][v]`. Counts are explicit and never inferred from buffer sizes.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceBuffers<'a> {
    pub degree_u: usize,
    pub degree_v: usize,
    pub u_count: usize,
    pub v_count: usize,
    pub control_points: &'a [f64],
    pub weights: &'a [f64],
    pub knots_u: &'a [f64],
    pub knots_v: &'a [f64],
}

/// Rational tensor-product B-spline surface. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct NurbsSurface {
    degree_u: usize,
    degree_v: usize,
    u_count: usize,
    v_count: usize,
    /// Row-major `[u][v]`.
    control_points: Vec<Point3>,
    weights: Vec<f64>,
    knots_u: KnotVector,
    knots_v: KnotVector,
    rational: bool,
}

impl NurbsSurface {
    /// Validates and takes ownership of a control net.
    ///
    /// `control_points` (and `weights`, when given) are row-major `[u][v]`.
    /// `None` weights build a non-rational surface (all weights `1`).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        u_count: usize,
        v_count: usize,
        control_points: Vec<Point3>,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        weights: Option<Vec<f64>>,
    ) -> KernelResult<Self> {
        if u_count == 0 || v_count == 0 {
            return Err(KernelError::EmptyControlNet { u_count, v_count });
        }
        if degree_u >= u_count {
            return Err(KernelError::DegreeTooHigh {
                direction: Direction::U,
                degree: degree_u,
                count: u_count,
            });
        }
        if degree_v >= v_count {
            return Err(KernelError::DegreeTooHigh {
                direction: Direction::V,
                degree: degree_v,
                count: v_count,
            });
        }

        let net_len = u_count
            .checked_mul(v_count)
            .ok_or(KernelError::ControlNetTooLarge { u_count, v_count })?;
        if control_points.len() != net_len {
            return Err(KernelError::InputLength {
                what: "control points",
                expected: net_len,
                actual: control_points.len(),
            });
        }

        let expected_u_knots = u_count + degree_u + 1;
        if knots_u.len() != expected_u_knots {
            return Err(KernelError::KnotCountMismatch {
                direction: Direction::U,
                expected: expected_u_knots,
                actual: knots_u.len(),
            });
        }
        let expected_v_knots = v_count + degree_v + 1;
        if knots_v.len() != expected_v_knots {
            return Err(KernelError::KnotCountMismatch {
                direction: Direction::V,
                expected: expected_v_knots,
                actual: knots_v.len(),
            });
        }

        if let Some(index) = control_points.iter().position(|p| !p.is_finite()) {
            return Err(KernelError::NonFiniteValue {
                what: "control point",
                index,
            });
        }

        let rational = weights.is_some();
        let weights = weights.unwrap_or_else(|| vec![1.0; net_len]);
        if weights.len() != net_len {
            return Err(KernelError::InputLength {
                what: "weights",
                expected: net_len,
                actual: weights.len(),
            });
        }
        if let Some(index) = weights.iter().position(|w| !w.is_finite()) {
            return Err(KernelError::NonFiniteValue { what: "weight", index });
        }
        if let Some(index) = weights.iter().position(|&w| w <= 0.0) {
            return Err(KernelError::NonPositiveWeight {
                index,
                weight: weights[index],
            });
        }

        let knots_u = KnotVector::for_direction(Direction::U, knots_u, degree_u)?;
        let knots_v = KnotVector::for_direction(Direction::V, knots_v, degree_v)?;

        log::debug!(
            "nurbs surface {}x{} (degree {}x{}), domain u {:?} v {:?}",
            u_count,
            v_count,
            degree_u,
            degree_v,
            knots_u.domain(),
            knots_v.domain()
        );

        Ok(Self {
            degree_u,
            degree_v,
            u_count,
            v_count,
            control_points,
            weights,
            knots_u,
            knots_v,
            rational,
        })
    }

    /// Builds a surface from flat buffers, copying everything it keeps.
    pub fn from_buffers(buffers: &SurfaceBuffers<'_>) -> KernelResult<Self> {
        let buffer_len = buffers
            .u_count
            .checked_mul(buffers.v_count)
            .and_then(|net_len| net_len.checked_mul(3))
            .ok_or(KernelError::ControlNetTooLarge {
                u_count: buffers.u_count,
                v_count: buffers.v_count,
            })?;
        if buffers.control_points.len() != buffer_len {
            return Err(KernelError::InputLength {
                what: "control point buffer",
                expected: buffer_len,
                actual: buffers.control_points.len(),
            });
        }

        let control_points = buffers
            .control_points
            .chunks_exact(3)
            .map(|xyz| Point3::new(xyz[0], xyz[1], xyz[2]))
            .collect();

        Self::new(
            buffers.degree_u,
            buffers.degree_v,
            buffers.u_count,
            buffers.v_count,
            control_points,
            buffers.knots_u.to_vec(),
            buffers.knots_v.to_vec(),
            Some(buffers.weights.to_vec()),
        )
    }

    /// Point at `(u, v)`; fails when either parameter is outside the domain.
    pub fn evaluate(&self, u: f64, v: f64) -> KernelResult<Point3> {
        self.check_domain(u, v)?;
        Ok(self.point_at(u, v))
    }

    /// Exact point and partial derivatives up to second order at `(u, v)`.
    pub fn derivatives(&self, u: f64, v: f64) -> KernelResult<SurfaceDerivatives> {
        self.check_domain(u, v)?;
        Ok(self.derivatives_unchecked(u, v))
    }

    fn derivatives_unchecked(&self, u: f64, v: f64) -> SurfaceDerivatives {
        let du = self.knots_u.basis_derivatives_unchecked(u, 2);
        let dv = self.knots_v.basis_derivatives_unchecked(v, 2);
        let (iu, iv) = (du.first_index(), dv.first_index());

        // Homogeneous sums A^(k,l) for (k,l) = 00, 10, 01, 20, 11, 02.
        const ORDERS: [(usize, usize); 6] = [(0, 0), (1, 0), (0, 1), (2, 0), (1, 1), (0, 2)];
        let mut sums = [HPoint4::ZERO; 6];
        for a in 0..=self.degree_u {
            let row = (iu + a) * self.v_count;
            for b in 0..=self.degree_v {
                let idx = row + iv + b;
                let point = self.control_points[idx];
                let weight = self.weights[idx];
                for (sum, &(k, l)) in sums.iter_mut().zip(ORDERS.iter()) {
                    sum.accumulate(point, weight, du.ders[k][a] * dv.ders[l][b]);
                }
            }
        }

        let [h, hu, hv, huu, huv, hvv] = sums;
        let w = h.w;
        let s = h.xyz().div_scalar(w);
        let su = hu.xyz().sub(s.mul_scalar(hu.w)).div_scalar(w);
        let sv = hv.xyz().sub(s.mul_scalar(hv.w)).div_scalar(w);
        let suu = huu
            .xyz()
            .sub(su.mul_scalar(2.0 * hu.w))
            .sub(s.mul_scalar(huu.w))
            .div_scalar(w);
        let suv = huv
            .xyz()
            .sub(su.mul_scalar(hv.w))
            .sub(sv.mul_scalar(hu.w))
            .sub(s.mul_scalar(huv.w))
            .div_scalar(w);
        let svv = hvv
            .xyz()
            .sub(sv.mul_scalar(2.0 * hv.w))
            .sub(s.mul_scalar(hvv.w))
            .div_scalar(w);

        SurfaceDerivatives {
            point: h.project(),
            su,
            sv,
            suu,
            suv,
            svv,
        }
    }

    /// `(u_count, v_count)`.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.u_count, self.v_count)
    }

    /// `(degree_u, degree_v)`.
    #[must_use]
    pub fn degrees(&self) -> (usize, usize) {
        (self.degree_u, self.degree_v)
    }

    #[must_use]
    pub fn knots_u(&self) -> &KnotVector {
        &self.knots_u
    }

    #[must_use]
    pub fn knots_v(&self) -> &KnotVector {
        &self.knots_v
    }

    #[must_use]
    pub fn control_point(&self, i: usize, j: usize) -> Option<Point3> {
        (i < self.u_count && j < self.v_count).then(|| self.control_points[i * self.v_count + j])
    }

    #[must_use]
    pub fn weight(&self, i: usize, j: usize) -> Option<f64> {
        (i < self.u_count && j < self.v_count).then(|| self.weights[i * self.v_count + j])
    }

    /// `false` when the surface was built without explicit weights.
    #[must_use]
    pub fn is_rational(&self) -> bool {
        self.rational
    }
}

impl Surface for NurbsSurface {
    fn domain_u(&self) -> (f64, f64) {
        self.knots_u.domain()
    }

    fn domain_v(&self) -> (f64, f64) {
        self.knots_v.domain()
    }

    /// Σ N_i(u)·N_j(v)·w_ij·P_ij / Σ N_i(u)·N_j(v)·w_ij over the
    /// `(p+1)x(q+1)` window anchored at the two spans.
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        let bu = self.knots_u.basis_unchecked(u);
        let bv = self.knots_v.basis_unchecked(v);
        let (iu, iv) = (bu.first_index(), bv.first_index());

        let mut acc = HPoint4::ZERO;
        for (a, nu) in bu.values.iter().enumerate() {
            let row = (iu + a) * self.v_count;
            for (b, nv) in bv.values.iter().enumerate() {
                let idx = row + iv + b;
                acc.accumulate(self.control_points[idx], self.weights[idx], nu * nv);
            }
        }
        acc.project()
    }

    fn analytic_derivatives(&self, u: f64, v: f64) -> Option<SurfaceDerivatives> {
        Some(self.derivatives_unchecked(u, v))
    }
}
