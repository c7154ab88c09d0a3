use std::ptr;

use nurbs_kernel::ffi::{
    NurbsStatus, nurbs_create, nurbs_curvature, nurbs_destroy, nurbs_dimensions, nurbs_domain, nurbs_evaluate,
    nurbs_evaluate_batch, nurbs_evaluate_grid, nurbs_normal,
};
use nurbs_kernel::geom::{ErrorKind, KernelError, SurfaceBuffers, SurfaceHandle, uniform_knot_vector};

const KNOTS: [f64; 9] = [0.0, 0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0, 1.0];

fn flat_net() -> (Vec<f64>, Vec<f64>) {
    let mut control = Vec::with_capacity(75);
    for i in 0..5 {
        for j in 0..5 {
            control.extend([f64::from(i) / 4.0, f64::from(j) / 4.0, 0.0]);
        }
    }
    (control, vec![1.0; 25])
}

fn close(actual: &[f64], expected: &[f64], eps: f64) -> bool {
    actual.len() == expected.len() && actual.iter().zip(expected).all(|(a, b)| (a - b).abs() <= eps)
}

#[test]
fn uniform_knots_build_the_reference_surface() {
    let knots = uniform_knot_vector(5, 3).expect("knots");
    assert_eq!(knots, KNOTS);

    let (control, weights) = flat_net();
    let handle = SurfaceHandle::create(&SurfaceBuffers {
        degree_u: 3,
        degree_v: 3,
        u_count: 5,
        v_count: 5,
        control_points: &control,
        weights: &weights,
        knots_u: &knots,
        knots_v: &knots,
    })
    .expect("valid surface");

    let mut out = [0.0; 9];
    handle
        .evaluate_batch_into(&[0.0, 0.0, 0.5, 0.5, 1.0, 1.0], &mut out)
        .expect("batch");
    assert!(close(&out, &[0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 1.0, 1.0, 0.0], 1e-9), "{out:?}");
    handle.destroy();
}

#[test]
fn safe_handle_reports_error_classes() {
    let (control, weights) = flat_net();
    let bad_weights = {
        let mut w = weights.clone();
        w[7] = -1.0;
        w
    };
    let err = SurfaceHandle::create(&SurfaceBuffers {
        degree_u: 3,
        degree_v: 3,
        u_count: 5,
        v_count: 5,
        control_points: &control,
        weights: &bad_weights,
        knots_u: &KNOTS,
        knots_v: &KNOTS,
    })
    .expect_err("negative weight");
    assert_eq!(err, KernelError::NonPositiveWeight { index: 7, weight: -1.0 });
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn c_abi_round_trip() {
    let (control, weights) = flat_net();
    let handle = unsafe {
        nurbs_create(
            3,
            3,
            control.as_ptr(),
            weights.as_ptr(),
            KNOTS.as_ptr(),
            KNOTS.as_ptr(),
            5,
            5,
            9,
            9,
        )
    };
    assert!(!handle.is_null());
    // The kernel owns copies; the caller's buffers can go.
    drop(control);
    drop(weights);

    let mut point = [f64::NAN; 3];
    assert_eq!(unsafe { nurbs_evaluate(handle, 0.5, 0.5, point.as_mut_ptr()) }, NurbsStatus::Ok);
    assert!(close(&point, &[0.5, 0.5, 0.0], 1e-9));

    let uv = [0.0, 0.0, 0.5, 0.5, 1.0, 1.0];
    let mut batch = [f64::NAN; 9];
    assert_eq!(
        unsafe { nurbs_evaluate_batch(handle, uv.as_ptr(), 3, batch.as_mut_ptr()) },
        NurbsStatus::Ok
    );
    assert!(close(&batch, &[0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 1.0, 1.0, 0.0], 1e-9));

    let mut grid = vec![f64::NAN; 3 * 3 * 3];
    assert_eq!(
        unsafe { nurbs_evaluate_grid(handle, 3, 3, grid.as_mut_ptr()) },
        NurbsStatus::Ok
    );
    assert!(close(&grid[12..15], &[0.5, 0.5, 0.0], 1e-9));
    assert!(close(&grid[24..27], &[1.0, 1.0, 0.0], 1e-12));

    let mut normal = [0.0; 3];
    assert_eq!(unsafe { nurbs_normal(handle, 0.3, 0.6, normal.as_mut_ptr()) }, NurbsStatus::Ok);
    assert!(close(&normal, &[0.0, 0.0, 1.0], 1e-9));

    let mut curvature = [f64::NAN; 2];
    assert_eq!(
        unsafe { nurbs_curvature(handle, 0.3, 0.6, curvature.as_mut_ptr()) },
        NurbsStatus::Ok
    );
    assert!(curvature.iter().all(|k| k.abs() < 1e-2));

    let (mut u_count, mut v_count) = (0, 0);
    assert_eq!(
        unsafe { nurbs_dimensions(handle, &mut u_count, &mut v_count) },
        NurbsStatus::Ok
    );
    assert_eq!((u_count, v_count), (5, 5));

    let mut domain = [f64::NAN; 4];
    assert_eq!(unsafe { nurbs_domain(handle, domain.as_mut_ptr()) }, NurbsStatus::Ok);
    assert_eq!(domain, [0.0, 1.0, 0.0, 1.0]);

    unsafe { nurbs_destroy(handle) };
}

#[test]
fn c_abi_rejects_invalid_configuration() {
    let (control, weights) = flat_net();

    // Knot length does not match count + degree + 1.
    let handle = unsafe {
        nurbs_create(3, 3, control.as_ptr(), weights.as_ptr(), KNOTS.as_ptr(), KNOTS.as_ptr(), 5, 5, 8, 9)
    };
    assert!(handle.is_null());

    // Degree too high for the control count.
    let handle = unsafe {
        nurbs_create(5, 3, control.as_ptr(), weights.as_ptr(), KNOTS.as_ptr(), KNOTS.as_ptr(), 5, 5, 9, 9)
    };
    assert!(handle.is_null());

    let handle = unsafe {
        nurbs_create(-1, 3, control.as_ptr(), weights.as_ptr(), KNOTS.as_ptr(), KNOTS.as_ptr(), 5, 5, 9, 9)
    };
    assert!(handle.is_null());

    let handle = unsafe { nurbs_create(3, 3, ptr::null(), weights.as_ptr(), KNOTS.as_ptr(), KNOTS.as_ptr(), 5, 5, 9, 9) };
    assert!(handle.is_null());

    let descending = [1.0, 1.0, 1.0, 1.0, 0.5, 0.0, 0.0, 0.0, 0.0];
    let handle = unsafe {
        nurbs_create(3, 3, control.as_ptr(), weights.as_ptr(), descending.as_ptr(), KNOTS.as_ptr(), 5, 5, 9, 9)
    };
    assert!(handle.is_null());
}

#[test]
fn c_abi_reports_call_errors() {
    let (control, weights) = flat_net();
    let handle = unsafe {
        nurbs_create(3, 3, control.as_ptr(), weights.as_ptr(), KNOTS.as_ptr(), KNOTS.as_ptr(), 5, 5, 9, 9)
    };
    assert!(!handle.is_null());

    let mut out = [7.0; 3];
    assert_eq!(
        unsafe { nurbs_evaluate(handle, 1.5, 0.5, out.as_mut_ptr()) },
        NurbsStatus::OutOfDomain
    );
    assert_eq!(
        unsafe { nurbs_evaluate(handle, 0.5, f64::NAN, out.as_mut_ptr()) },
        NurbsStatus::OutOfDomain
    );
    assert_eq!(out, [7.0; 3]);

    assert_eq!(
        unsafe { nurbs_evaluate(handle, 0.5, 0.5, ptr::null_mut()) },
        NurbsStatus::NullPointer
    );
    assert_eq!(
        unsafe { nurbs_evaluate(ptr::null(), 0.5, 0.5, out.as_mut_ptr()) },
        NurbsStatus::NullPointer
    );

    let uv = [0.2, 0.2, 0.4, 1.4];
    let mut batch = [0.0; 6];
    assert_eq!(
        unsafe { nurbs_evaluate_batch(handle, uv.as_ptr(), 2, batch.as_mut_ptr()) },
        NurbsStatus::OutOfDomain
    );
    assert_eq!(
        unsafe { nurbs_evaluate_batch(handle, ptr::null(), 0, ptr::null_mut()) },
        NurbsStatus::Ok
    );

    let mut grid = [0.0; 3];
    assert_eq!(
        unsafe { nurbs_evaluate_grid(handle, 1, 1, grid.as_mut_ptr()) },
        NurbsStatus::OutOfDomain
    );

    unsafe { nurbs_destroy(handle) };
    unsafe { nurbs_destroy(ptr::null_mut()) };
}
