use super::{Point2, Point3, Vector3, TOLERANCE};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Smallest box containing all points, or `None` for an empty set.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut aabb = Self {
            min: first,
            max: first,
        };
        for p in iter {
            aabb.min = aabb.min.inf(p);
            aabb.max = aabb.max.sup(p);
        }
        Some(aabb)
    }

    /// Returns `true` if the boxes overlap after both are padded by `tol`.
    #[must_use]
    pub fn overlaps(&self, other: &Self, tol: f64) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] + tol && other.min[i] <= self.max[i] + tol)
    }

    /// Returns `true` if the point lies in the box padded by `tol`.
    #[must_use]
    pub fn contains(&self, p: &Point3, tol: f64) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] - tol && p[i] <= self.max[i] + tol)
    }

    /// Length of the box diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        (self.max - self.min).norm()
    }
}

/// A non-degenerate triangle together with its supporting plane.
///
/// The plane is `normal · p = offset` with a unit normal following the
/// right-hand rule over the corner order.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub corners: [Point3; 3],
    pub normal: Vector3,
    pub offset: f64,
}

impl Triangle {
    /// Builds a triangle, or `None` if the corners are (nearly) collinear.
    #[must_use]
    pub fn new(a: Point3, b: Point3, c: Point3) -> Option<Self> {
        let cross = (b - a).cross(&(c - a));
        let len = cross.norm();
        if len < TOLERANCE {
            return None;
        }
        let normal = cross / len;
        Some(Self {
            corners: [a, b, c],
            normal,
            offset: normal.dot(&a.coords),
        })
    }

    /// Signed distance from a point to the supporting plane.
    #[must_use]
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    /// Area of the triangle.
    #[must_use]
    pub fn area(&self) -> f64 {
        let [a, b, c] = self.corners;
        (b - a).cross(&(c - a)).norm() * 0.5
    }

    #[must_use]
    pub fn centroid(&self) -> Point3 {
        let [a, b, c] = self.corners;
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }

    #[must_use]
    pub fn aabb(&self) -> Aabb {
        let [a, b, c] = self.corners;
        Aabb {
            min: a.inf(&b).inf(&c),
            max: a.sup(&b).sup(&c),
        }
    }

    /// Index of the coordinate axis most aligned with the normal.
    ///
    /// Dropping this axis gives the best-conditioned 2D projection.
    #[must_use]
    pub fn dominant_axis(&self) -> usize {
        let n = self.normal.abs();
        if n.x >= n.y && n.x >= n.z {
            0
        } else if n.y >= n.z {
            1
        } else {
            2
        }
    }

    /// Projects the corners by dropping `axis`.
    #[must_use]
    pub fn projected(&self, axis: usize) -> [Point2; 3] {
        self.corners.map(|p| project(&p, axis))
    }

    /// Barycentric coordinates of a coplanar point, computed in the projection
    /// that drops `axis`.
    #[must_use]
    pub fn barycentric(&self, p: &Point3, axis: usize) -> [f64; 3] {
        let [a, b, c] = self.projected(axis);
        let q = project(p, axis);
        let area = cross_2d(&a, &b, &c);
        if area.abs() < TOLERANCE * TOLERANCE {
            return [1.0, 0.0, 0.0];
        }
        let l0 = cross_2d(&q, &b, &c) / area;
        let l1 = cross_2d(&a, &q, &c) / area;
        [l0, l1, 1.0 - l0 - l1]
    }

    /// Point with the given barycentric coordinates.
    #[must_use]
    pub fn point_at(&self, weights: [f64; 3]) -> Point3 {
        let [a, b, c] = self.corners;
        Point3::from(a.coords * weights[0] + b.coords * weights[1] + c.coords * weights[2])
    }

    /// Distance from corner `i` to the line through the other two corners.
    #[must_use]
    pub fn altitude(&self, i: usize) -> f64 {
        let p = self.corners[(i + 1) % 3];
        let q = self.corners[(i + 2) % 3];
        let base = (q - p).norm();
        if base < TOLERANCE {
            return 0.0;
        }
        2.0 * self.area() / base
    }

    /// Returns `true` if a point on (or within `tol` of) the plane lies inside
    /// the triangle, edges included within `tol`.
    #[must_use]
    pub fn contains_coplanar(&self, p: &Point3, tol: f64) -> bool {
        if self.signed_distance(p).abs() > tol {
            return false;
        }
        let weights = self.barycentric(p, self.dominant_axis());
        (0..3).all(|i| weights[i] * self.altitude(i) >= -tol)
    }
}

/// Drops one coordinate axis.
#[must_use]
pub fn project(p: &Point3, axis: usize) -> Point2 {
    match axis {
        0 => Point2::new(p.y, p.z),
        1 => Point2::new(p.z, p.x),
        _ => Point2::new(p.x, p.y),
    }
}

/// Twice the signed area of the 2D triangle `abc`.
#[must_use]
pub fn cross_2d(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}
