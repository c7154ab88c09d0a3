mod basis;
mod batch;
mod core;
mod differential;
mod error;
mod handle;
mod surface;

pub use basis::{BasisDerivatives, BasisResult, KnotVector, uniform_knot_vector};
pub use batch::{
    BatchOptions, SurfaceGrid, curvatures_batch, evaluate_batch, evaluate_batch_with, evaluate_grid,
    evaluate_grid_with, grid_parameters, normals_batch,
};
pub use self::core::{Mat2, Point3, Tolerance, Vec3};
pub use differential::{
    DerivativeMethod, DifferentialFrame, DifferentiationOptions, differential_frame, frame_from_derivatives,
    normal, principal_curvatures, surface_derivatives, tangents,
};
pub use error::{Direction, ErrorKind, KernelError, KernelResult};
pub use handle::SurfaceHandle;
pub use surface::{NurbsSurface, Surface, SurfaceBuffers, SurfaceDerivatives};

#[cfg(test)]
mod tests;
