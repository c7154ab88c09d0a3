use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::fixtures::{CUBIC_KNOTS, bumped_cubic, flat_cubic, quarter_cylinder};
use crate::geom::{
    Direction, ErrorKind, KernelError, NurbsSurface, Point3, Surface, SurfaceBuffers, Tolerance,
};

fn assert_point(actual: Point3, expected: [f64; 3]) {
    assert!(
        Tolerance::new(1e-9).approx_eq_point3(actual, Point3::from_array(expected)),
        "expected {expected:?}, got {actual:?}"
    );
}

#[test]
fn flat_cubic_centre_and_corners() {
    let surface = flat_cubic();
    assert_point(surface.evaluate(0.5, 0.5).unwrap(), [0.5, 0.5, 0.0]);
    assert_point(surface.evaluate(0.0, 0.0).unwrap(), [0.0, 0.0, 0.0]);
    assert_point(surface.evaluate(1.0, 1.0).unwrap(), [1.0, 1.0, 0.0]);
    assert_point(surface.evaluate(1.0, 0.0).unwrap(), [1.0, 0.0, 0.0]);
    assert_point(surface.evaluate(0.0, 1.0).unwrap(), [0.0, 1.0, 0.0]);
}

#[test]
fn planar_net_stays_planar() {
    let surface = flat_cubic();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..100 {
        let (u, v) = (rng.random_range(0.0..=1.0), rng.random_range(0.0..=1.0));
        let p = surface.evaluate(u, v).unwrap();
        assert_abs_diff_eq!(p.z, 0.0, epsilon = 1e-12);
        assert!((-1e-12..=1.0 + 1e-12).contains(&p.x));
        assert!((-1e-12..=1.0 + 1e-12).contains(&p.y));
    }
}

#[test]
fn uniform_weights_match_non_rational() {
    let plain = flat_cubic();
    let points: Vec<Point3> = (0..25).map(|k| plain.control_point(k / 5, k % 5).unwrap()).collect();
    let weighted = NurbsSurface::new(
        3,
        3,
        5,
        5,
        points,
        CUBIC_KNOTS.to_vec(),
        CUBIC_KNOTS.to_vec(),
        Some(vec![3.5; 25]),
    )
    .unwrap();

    assert!(weighted.is_rational());
    assert!(!plain.is_rational());
    for (u, v) in [(0.1, 0.9), (0.5, 0.25), (0.77, 0.33)] {
        let a = plain.evaluate(u, v).unwrap();
        let b = weighted.evaluate(u, v).unwrap();
        assert!(a.distance_to(b) < 1e-12);
    }
}

#[test]
fn heavier_weight_pulls_towards_control_point() {
    let bumped = bumped_cubic();
    let centre = bumped.evaluate(0.5, 0.5).unwrap();
    assert!(centre.z > 0.0);

    let points: Vec<Point3> = (0..25).map(|k| bumped.control_point(k / 5, k % 5).unwrap()).collect();
    let unweighted = NurbsSurface::new(3, 3, 5, 5, points, CUBIC_KNOTS.to_vec(), CUBIC_KNOTS.to_vec(), None).unwrap();
    assert!(centre.z > unweighted.evaluate(0.5, 0.5).unwrap().z);
}

#[test]
fn quarter_cylinder_points_lie_on_circle() {
    let radius = 2.0;
    let surface = quarter_cylinder(radius);
    for i in 0..=10 {
        let u = f64::from(i) / 10.0;
        for v in [0.0, 0.4, 1.0] {
            let p = surface.evaluate(u, v).unwrap();
            assert_abs_diff_eq!(p.x.hypot(p.y), radius, epsilon = 1e-12);
            assert_abs_diff_eq!(p.z, v, epsilon = 1e-12);
        }
    }
}

#[test]
fn analytic_derivatives_match_differences() {
    let surface = bumped_cubic();
    let h = 1e-6;
    for (u, v) in [(0.3, 0.6), (0.5, 0.5), (0.8, 0.2)] {
        let d = surface.derivatives(u, v).unwrap();
        let su = surface
            .evaluate(u + h, v)
            .unwrap()
            .sub_point(surface.evaluate(u - h, v).unwrap())
            .div_scalar(2.0 * h);
        let sv = surface
            .evaluate(u, v + h)
            .unwrap()
            .sub_point(surface.evaluate(u, v - h).unwrap())
            .div_scalar(2.0 * h);
        assert!(d.su.sub(su).length() < 1e-5, "su {:?} vs {su:?}", d.su);
        assert!(d.sv.sub(sv).length() < 1e-5, "sv {:?} vs {sv:?}", d.sv);
        assert!(d.point.distance_to(surface.evaluate(u, v).unwrap()) < 1e-12);
    }
}

#[test]
fn queries_report_construction_data() {
    let surface = flat_cubic();
    assert_eq!(surface.dimensions(), (5, 5));
    assert_eq!(surface.degrees(), (3, 3));
    assert_eq!(surface.domain_u(), (0.0, 1.0));
    assert_eq!(surface.domain_v(), (0.0, 1.0));
    assert_eq!(surface.knots_u().as_slice(), &CUBIC_KNOTS);
    assert_eq!(surface.control_point(4, 2), Some(Point3::new(1.0, 0.5, 0.0)));
    assert_eq!(surface.control_point(5, 0), None);
    assert_eq!(surface.weight(0, 0), Some(1.0));
}

#[test]
fn from_buffers_copies_input() {
    let control: Vec<f64> = (0..4)
        .flat_map(|k| {
            let (i, j) = (k / 2, k % 2);
            [f64::from(i), f64::from(j), 0.0]
        })
        .collect();
    let weights = vec![1.0; 4];
    let knots = vec![0.0, 0.0, 1.0, 1.0];
    let surface = NurbsSurface::from_buffers(&SurfaceBuffers {
        degree_u: 1,
        degree_v: 1,
        u_count: 2,
        v_count: 2,
        control_points: &control,
        weights: &weights,
        knots_u: &knots,
        knots_v: &knots,
    })
    .unwrap();
    drop(control);
    assert_point(surface.evaluate(0.25, 0.75).unwrap(), [0.25, 0.75, 0.0]);
}

fn build(
    degree: (usize, usize),
    counts: (usize, usize),
    knots_u: Vec<f64>,
    knots_v: Vec<f64>,
    weights: Option<Vec<f64>>,
) -> Result<NurbsSurface, KernelError> {
    let points = vec![Point3::ORIGIN; counts.0 * counts.1];
    NurbsSurface::new(degree.0, degree.1, counts.0, counts.1, points, knots_u, knots_v, weights)
}

#[test]
fn construction_rejects_invalid_configurations() {
    let linear = vec![0.0, 0.0, 1.0, 1.0];

    assert!(matches!(
        build((1, 1), (0, 2), linear.clone(), linear.clone(), None),
        Err(KernelError::EmptyControlNet { .. })
    ));
    assert!(matches!(
        build((2, 1), (2, 2), linear.clone(), linear.clone(), None),
        Err(KernelError::DegreeTooHigh { direction: Direction::U, .. })
    ));
    assert!(matches!(
        build((1, 1), (2, 2), vec![0.0, 0.0, 1.0], linear.clone(), None),
        Err(KernelError::KnotCountMismatch { direction: Direction::U, expected: 4, actual: 3 })
    ));
    assert!(matches!(
        build((1, 1), (2, 2), linear.clone(), vec![0.0, 1.0, 0.5, 1.0], None),
        Err(KernelError::NonMonotonicKnots { direction: Direction::V, .. })
    ));
    assert!(matches!(
        build((1, 1), (2, 2), linear.clone(), linear.clone(), Some(vec![1.0, 0.0, 1.0, 1.0])),
        Err(KernelError::NonPositiveWeight { index: 1, .. })
    ));
    assert!(matches!(
        build((1, 1), (2, 2), linear.clone(), linear.clone(), Some(vec![1.0; 3])),
        Err(KernelError::InputLength { what: "weights", .. })
    ));
    assert!(matches!(
        build((1, 1), (2, 2), linear.clone(), vec![0.0, 1.0, 1.0, 1.0], None),
        Err(KernelError::EmptyDomain { direction: Direction::V, .. })
    ));
}

#[test]
fn construction_rejects_oversized_control_net() {
    let huge = usize::MAX / 2;
    let err = NurbsSurface::new(1, 1, huge, huge, Vec::new(), Vec::new(), Vec::new(), None).unwrap_err();
    assert_eq!(err, KernelError::ControlNetTooLarge { u_count: huge, v_count: huge });
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let err = NurbsSurface::from_buffers(&SurfaceBuffers {
        degree_u: 1,
        degree_v: 1,
        u_count: huge,
        v_count: 3,
        control_points: &[],
        weights: &[],
        knots_u: &[],
        knots_v: &[],
    })
    .unwrap_err();
    assert_eq!(err, KernelError::ControlNetTooLarge { u_count: huge, v_count: 3 });
}

#[test]
fn construction_rejects_non_finite_values() {
    let linear = vec![0.0, 0.0, 1.0, 1.0];
    let mut points = vec![Point3::ORIGIN; 4];
    points[3] = Point3::new(0.0, f64::INFINITY, 0.0);
    let err = NurbsSurface::new(1, 1, 2, 2, points, linear.clone(), linear.clone(), None).unwrap_err();
    assert_eq!(err, KernelError::NonFiniteValue { what: "control point", index: 3 });
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let err = build((1, 1), (2, 2), linear.clone(), linear, Some(vec![1.0, f64::NAN, 1.0, 1.0])).unwrap_err();
    assert_eq!(err, KernelError::NonFiniteValue { what: "weight", index: 1 });
}

#[test]
fn evaluate_rejects_out_of_domain() {
    let surface = flat_cubic();
    let err = surface.evaluate(1.5, 0.5).unwrap_err();
    assert!(matches!(err, KernelError::OutOfDomain { direction: Direction::U, .. }));
    assert_eq!(err.kind(), ErrorKind::Domain);

    assert!(matches!(
        surface.evaluate(0.5, -1e-9),
        Err(KernelError::OutOfDomain { direction: Direction::V, .. })
    ));
    assert!(surface.evaluate(f64::NAN, 0.5).is_err());
    assert!(surface.derivatives(0.5, f64::NAN).is_err());
}
