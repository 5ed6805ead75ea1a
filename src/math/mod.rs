pub mod intersect_3d;
pub mod polygon_2d;
pub mod triangle;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Distance below which a point is considered to lie on a plane or edge.
pub const PLANE_TOLERANCE: f64 = 1e-8;

/// Distance below which two mesh vertices are merged into one.
pub const WELD_TOLERANCE: f64 = 1e-7;

/// Distance below which boolean cut points and fragment corners are
/// treated as the same point.
pub const SNAP_TOLERANCE: f64 = 1e-4;
