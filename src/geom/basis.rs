//! B-spline basis evaluation on validated knot vectors.
//!
//! All routines work on the `degree + 1` basis functions that are non-zero
//! on one knot span and fill the Cox-de Boor triangle bottom-up (degree 0
//! to `degree`), so cost is `O(p²)` per parameter and no recursion is
//! involved. Quotients whose denominator is a zero-length knot interval are
//! taken as `0`.

use super::error::{Direction, KernelError, KernelResult};

/// `num / den`, with the B-spline convention that `x / 0 == 0`.
#[inline]
fn knot_ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

/// A non-decreasing knot sequence paired with the degree it serves.
#[derive(Debug, Clone, PartialEq)]
pub struct KnotVector {
    knots: Vec<f64>,
    degree: usize,
    direction: Direction,
    last_span: usize,
}

impl KnotVector {
    /// Validates `knots` for `degree`, reporting errors against the `u` direction.
    pub fn new(knots: Vec<f64>, degree: usize) -> KernelResult<Self> {
        Self::for_direction(Direction::U, knots, degree)
    }

    /// Validates `knots` for `degree`; errors name `direction`.
    pub fn for_direction(direction: Direction, knots: Vec<f64>, degree: usize) -> KernelResult<Self> {
        let minimum = 2 * (degree + 1);
        if knots.len() < minimum {
            return Err(KernelError::KnotVectorTooShort {
                direction,
                degree,
                minimum,
                actual: knots.len(),
            });
        }

        if let Some(index) = knots.iter().position(|k| !k.is_finite()) {
            return Err(KernelError::NonFiniteValue {
                what: match direction {
                    Direction::U => "u knot",
                    Direction::V => "v knot",
                },
                index,
            });
        }

        if let Some(index) = knots.windows(2).position(|w| w[0] > w[1]) {
            return Err(KernelError::NonMonotonicKnots {
                direction,
                index: index + 1,
            });
        }

        let count = knots.len() - degree - 1;
        let start = knots[degree];
        let end = knots[count];
        if start >= end {
            return Err(KernelError::EmptyDomain { direction, start, end });
        }

        // Last span with positive length that ends on the domain end; the
        // upper domain bound is evaluated on it instead of the empty span
        // past the end.
        let last_span = (degree..count)
            .rev()
            .find(|&i| knots[i] < end)
            .unwrap_or(degree);

        Ok(Self {
            knots,
            degree,
            direction,
            last_span,
        })
    }

    /// Clamped uniform knot vector on `[0, 1]`; see [`uniform_knot_vector`].
    pub fn clamped_uniform(count: usize, degree: usize) -> KernelResult<Self> {
        Self::new(uniform_knot_vector(count, degree)?, degree)
    }

    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.knots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.knots
    }

    /// Number of basis functions (control points) this vector supports.
    #[must_use]
    pub fn count(&self) -> usize {
        self.knots.len() - self.degree - 1
    }

    /// Evaluation domain `[knots[p], knots[n]]`.
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[self.degree], self.knots[self.count()])
    }

    /// `true` when `t` lies in the closed domain. NaN is never contained.
    #[must_use]
    pub fn contains(&self, t: f64) -> bool {
        let (start, end) = self.domain();
        t >= start && t <= end
    }

    /// Index `i` of the knot span with `knots[i] <= t < knots[i + 1]`.
    ///
    /// `t` equal to the domain end maps to the last non-empty span.
    /// Parameters outside the domain are clamped to the first or last span;
    /// callers validate the domain before evaluating.
    #[must_use]
    pub fn find_span(&self, t: f64) -> usize {
        let (start, end) = self.domain();
        if t >= end {
            return self.last_span;
        }
        if t <= start {
            return self.degree;
        }
        let above = self.knots.partition_point(|&k| k <= t);
        above.saturating_sub(1).clamp(self.degree, self.last_span)
    }

    pub(crate) fn check_domain(&self, t: f64) -> KernelResult<()> {
        if self.contains(t) {
            Ok(())
        } else {
            let (start, end) = self.domain();
            Err(KernelError::OutOfDomain {
                direction: self.direction,
                value: t,
                start,
                end,
            })
        }
    }

    /// Non-zero basis values at `t`.
    pub fn basis(&self, t: f64) -> KernelResult<BasisResult> {
        self.check_domain(t)?;
        Ok(self.basis_unchecked(t))
    }

    /// Non-zero basis values at a `t` already known to be in the domain.
    #[must_use]
    pub(crate) fn basis_unchecked(&self, t: f64) -> BasisResult {
        let span = self.find_span(t);
        let mut values = vec![0.0; self.degree + 1];
        basis_functions_into(span, t, self.degree, &self.knots, &mut values);
        BasisResult {
            span,
            degree: self.degree,
            values,
        }
    }

    /// All `count()` basis values at `t`, zero outside the non-zero window.
    pub fn basis_dense(&self, t: f64) -> KernelResult<Vec<f64>> {
        let local = self.basis(t)?;
        let mut dense = vec![0.0; self.count()];
        let first = local.first_index();
        dense[first..first + local.values.len()].copy_from_slice(&local.values);
        Ok(dense)
    }

    /// Basis values and their derivatives up to `order` at `t`.
    pub fn basis_derivatives(&self, t: f64, order: usize) -> KernelResult<BasisDerivatives> {
        self.check_domain(t)?;
        Ok(self.basis_derivatives_unchecked(t, order))
    }

    #[must_use]
    pub(crate) fn basis_derivatives_unchecked(&self, t: f64, order: usize) -> BasisDerivatives {
        let span = self.find_span(t);
        let ders = basis_function_derivatives(span, t, self.degree, order, &self.knots);
        BasisDerivatives {
            span,
            degree: self.degree,
            ders,
        }
    }
}

/// The `degree + 1` non-zero basis values at a parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisResult {
    /// Knot span index `i` with `knots[i] <= t < knots[i + 1]`.
    pub span: usize,
    pub degree: usize,
    /// `values[k]` weights control point `first_index() + k`.
    pub values: Vec<f64>,
}

impl BasisResult {
    /// Index of the first control point affected by `values`.
    #[must_use]
    pub fn first_index(&self) -> usize {
        self.span - self.degree
    }
}

/// Basis values (`ders[0]`) and derivatives (`ders[k]`, k-th derivative).
#[derive(Debug, Clone, PartialEq)]
pub struct BasisDerivatives {
    pub span: usize,
    pub degree: usize,
    pub ders: Vec<Vec<f64>>,
}

impl BasisDerivatives {
    #[must_use]
    pub fn first_index(&self) -> usize {
        self.span - self.degree
    }

    /// Derivative of order `k`; all zeros when `k` exceeds the requested order.
    #[must_use]
    pub fn order(&self, k: usize) -> Vec<f64> {
        self.ders
            .get(k)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.degree + 1])
    }
}

/// Fills `out[0..=p]` with the non-zero basis values on `span`.
pub(crate) fn basis_functions_into(span: usize, t: f64, p: usize, knots: &[f64], out: &mut [f64]) {
    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];

    out[0] = 1.0;
    for j in 1..=p {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;

        let mut saved = 0.0;
        for r in 0..j {
            let temp = knot_ratio(out[r], right[r + 1] + left[j - r]);
            out[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        out[j] = saved;
    }
}

/// Basis values and derivatives up to `order` on `span`.
///
/// Builds the full triangle `ndu` (basis values above the diagonal, knot
/// differences below it) and differentiates it in place. Rows above the
/// degree are zero.
fn basis_function_derivatives(
    span: usize,
    t: f64,
    p: usize,
    order: usize,
    knots: &[f64],
) -> Vec<Vec<f64>> {
    let mut ders = vec![vec![0.0; p + 1]; order + 1];
    let mut ndu = vec![vec![0.0; p + 1]; p + 1];
    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];

    ndu[0][0] = 1.0;
    for j in 1..=p {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;

        let mut saved = 0.0;
        for r in 0..j {
            ndu[j][r] = right[r + 1] + left[j - r];
            let temp = knot_ratio(ndu[r][j - 1], ndu[j][r]);
            ndu[r][j] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        ndu[j][j] = saved;
    }

    for j in 0..=p {
        ders[0][j] = ndu[j][p];
    }

    let top = order.min(p);
    let mut a = vec![vec![0.0; p + 1]; 2];
    for r in 0..=p {
        let (mut s1, mut s2) = (0, 1);
        a[0][0] = 1.0;

        for k in 1..=top {
            let mut d = 0.0;
            let rk = r as isize - k as isize;
            let pk = p - k;

            if rk >= 0 {
                let rk = rk as usize;
                a[s2][0] = knot_ratio(a[s1][0], ndu[pk + 1][rk]);
                d = a[s2][0] * ndu[rk][pk];
            }

            let j1 = if rk >= -1 { 1 } else { (-rk) as usize };
            let j2 = if r <= pk + 1 { k - 1 } else { p - r };
            for j in j1..=j2 {
                let idx = (rk + j as isize) as usize;
                a[s2][j] = knot_ratio(a[s1][j] - a[s1][j - 1], ndu[pk + 1][idx]);
                d += a[s2][j] * ndu[idx][pk];
            }

            if r <= pk {
                a[s2][k] = knot_ratio(-a[s1][k - 1], ndu[pk + 1][r]);
                d += a[s2][k] * ndu[r][pk];
            }

            ders[k][r] = d;
            std::mem::swap(&mut s1, &mut s2);
        }
    }

    let mut factor = p as f64;
    for k in 1..=top {
        for value in &mut ders[k] {
            *value *= factor;
        }
        factor *= (p - k) as f64;
    }

    ders
}

/// Clamped uniform knot vector on `[0, 1]` for `count` control points.
///
/// The first and last `degree + 1` knots are `0` and `1`; interior knots
/// are spaced `1 / (count - degree)` apart. The length is
/// `count + degree + 1`.
pub fn uniform_knot_vector(count: usize, degree: usize) -> KernelResult<Vec<f64>> {
    if count <= degree {
        return Err(KernelError::InvalidKnotRequest { count, degree });
    }

    let spans = count - degree;
    let mut knots = Vec::with_capacity(count + degree + 1);
    knots.extend(std::iter::repeat_n(0.0, degree + 1));
    knots.extend((1..spans).map(|k| k as f64 / spans as f64));
    knots.extend(std::iter::repeat_n(1.0, degree + 1));
    Ok(knots)
}
