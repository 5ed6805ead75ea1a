use super::triangle::{cross_2d, project, Triangle};
use super::{Point3, Vector3, PLANE_TOLERANCE, TOLERANCE};

/// Outcome of casting a ray against a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayHit {
    /// The ray misses the triangle.
    Miss,
    /// The ray crosses the triangle interior at parameter `t > 0`.
    Hit { t: f64 },
    /// The ray grazes an edge or vertex, starts on the triangle, or runs
    /// inside its plane; the crossing count is unreliable.
    Degenerate,
}

/// Intersects the ray `origin + t * dir` (t > 0) with a triangle.
///
/// Möller–Trumbore with explicit detection of edge grazes so callers can
/// retry with another direction.
#[must_use]
pub fn ray_triangle(origin: &Point3, dir: &Vector3, tri: &Triangle) -> RayHit {
    let [a, b, c] = tri.corners;
    let e1 = b - a;
    let e2 = c - a;
    let pvec = dir.cross(&e2);
    let det = e1.dot(&pvec);

    if det.abs() < TOLERANCE {
        // Ray parallel to the plane
        if tri.signed_distance(origin).abs() < PLANE_TOLERANCE {
            return RayHit::Degenerate;
        }
        return RayHit::Miss;
    }

    let inv_det = 1.0 / det;
    let tvec = origin - a;
    let u = tvec.dot(&pvec) * inv_det;
    let qvec = tvec.cross(&e1);
    let v = dir.dot(&qvec) * inv_det;
    let t = e2.dot(&qvec) * inv_det;

    let edge_tol = 1e-9;
    let w = 1.0 - u - v;
    if u < -edge_tol || v < -edge_tol || w < -edge_tol {
        return RayHit::Miss;
    }
    if t < -PLANE_TOLERANCE {
        return RayHit::Miss;
    }
    if t <= PLANE_TOLERANCE {
        return RayHit::Degenerate;
    }
    if u < edge_tol || v < edge_tol || w < edge_tol {
        return RayHit::Degenerate;
    }
    RayHit::Hit { t }
}

/// How two triangles meet.
#[derive(Debug, Clone, PartialEq)]
pub enum TriangleIntersection {
    /// No contact.
    None,
    /// The triangles cross or touch along a segment (possibly a single point).
    Segment { start: Point3, end: Point3 },
    /// The triangles share a plane and overlap or touch.
    ///
    /// `on_first` holds the second triangle's edges clipped to the first,
    /// `on_second` the first triangle's edges clipped to the second.
    Coplanar {
        on_first: Vec<(Point3, Point3)>,
        on_second: Vec<(Point3, Point3)>,
    },
}

/// Computes the contact between two triangles.
///
/// Distances within [`PLANE_TOLERANCE`] of a plane are snapped to zero, so
/// touching and coplanar configurations are reported as contact rather than
/// lost to rounding.
#[must_use]
pub fn intersect_triangles(a: &Triangle, b: &Triangle) -> TriangleIntersection {
    let to_a = b.corners.map(|p| snap(a.signed_distance(&p)));
    if same_strict_sign(&to_a) {
        return TriangleIntersection::None;
    }
    let to_b = a.corners.map(|p| snap(b.signed_distance(&p)));
    if same_strict_sign(&to_b) {
        return TriangleIntersection::None;
    }

    if to_a.iter().all(|d| *d == 0.0) || to_b.iter().all(|d| *d == 0.0) {
        return coplanar_contact(a, b);
    }

    let dir = a.normal.cross(&b.normal);
    if dir.norm() < TOLERANCE {
        return TriangleIntersection::None;
    }

    let on_b_plane = plane_crossings(&a.corners, &to_b);
    let on_a_plane = plane_crossings(&b.corners, &to_a);
    let (Some((a_lo, a_hi)), Some((b_lo, b_hi))) =
        (extent_along(&on_b_plane, &dir), extent_along(&on_a_plane, &dir))
    else {
        return TriangleIntersection::None;
    };

    let lo = if a_lo.0 >= b_lo.0 { a_lo } else { b_lo };
    let hi = if a_hi.0 <= b_hi.0 { a_hi } else { b_hi };
    if lo.0 > hi.0 + PLANE_TOLERANCE {
        return TriangleIntersection::None;
    }
    TriangleIntersection::Segment {
        start: lo.1,
        end: hi.1,
    }
}

fn snap(d: f64) -> f64 {
    if d.abs() < PLANE_TOLERANCE {
        0.0
    } else {
        d
    }
}

fn same_strict_sign(d: &[f64; 3]) -> bool {
    d.iter().all(|x| *x > 0.0) || d.iter().all(|x| *x < 0.0)
}

/// Points where a triangle's boundary meets a plane, given signed corner distances.
fn plane_crossings(corners: &[Point3; 3], dist: &[f64; 3]) -> Vec<Point3> {
    let mut points = Vec::with_capacity(3);
    for i in 0..3 {
        let j = (i + 1) % 3;
        if dist[i] == 0.0 {
            points.push(corners[i]);
        }
        if dist[i] * dist[j] < 0.0 {
            let s = dist[i] / (dist[i] - dist[j]);
            points.push(corners[i] + (corners[j] - corners[i]) * s);
        }
    }
    points
}

/// Lowest and highest point along `dir`, each paired with its parameter.
fn extent_along(points: &[Point3], dir: &Vector3) -> Option<((f64, Point3), (f64, Point3))> {
    let mut iter = points.iter().map(|p| (dir.dot(&p.coords), *p));
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), cur| {
        (
            if cur.0 < lo.0 { cur } else { lo },
            if cur.0 > hi.0 { cur } else { hi },
        )
    }))
}

fn coplanar_contact(a: &Triangle, b: &Triangle) -> TriangleIntersection {
    let on_first = clip_edges(b, a);
    let on_second = clip_edges(a, b);
    if on_first.is_empty() && on_second.is_empty() {
        return TriangleIntersection::None;
    }
    TriangleIntersection::Coplanar {
        on_first,
        on_second,
    }
}

/// Clips each edge of `source` to the coplanar triangle `target`.
fn clip_edges(source: &Triangle, target: &Triangle) -> Vec<(Point3, Point3)> {
    (0..3)
        .filter_map(|i| {
            let p = source.corners[i];
            let q = source.corners[(i + 1) % 3];
            clip_segment_to_triangle(&p, &q, target)
        })
        .collect()
}

/// Clips a segment lying in a triangle's plane to that triangle.
///
/// Liang–Barsky against the three edge half-planes of the projection that
/// drops the dominant normal axis. Returns `None` if nothing remains.
#[must_use]
pub fn clip_segment_to_triangle(p: &Point3, q: &Point3, tri: &Triangle) -> Option<(Point3, Point3)> {
    let axis = tri.dominant_axis();
    let mut c = tri.projected(axis);
    if cross_2d(&c[0], &c[1], &c[2]) < 0.0 {
        c.swap(1, 2);
    }
    let p2 = project(p, axis);
    let q2 = project(q, axis);
    let d = q2 - p2;

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for i in 0..3 {
        let from = c[i];
        let to = c[(i + 1) % 3];
        let edge = to - from;
        let slack = PLANE_TOLERANCE * edge.norm();
        let num = edge.x * (p2.y - from.y) - edge.y * (p2.x - from.x) + slack;
        let den = edge.x * d.y - edge.y * d.x;
        if den.abs() < TOLERANCE * TOLERANCE {
            if num < 0.0 {
                return None;
            }
            continue;
        }
        let t = -num / den;
        if den > 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    let seg = q - p;
    Some((p + seg * t0, p + seg * t1))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn tri(a: Point3, b: Point3, c: Point3) -> Triangle {
        Triangle::new(a, b, c).unwrap()
    }

    #[test]
    fn ray_hits_interior() {
        let t = tri(p(0.0, 0.0, 1.0), p(2.0, 0.0, 1.0), p(0.0, 2.0, 1.0));
        let hit = ray_triangle(&p(0.5, 0.5, 0.0), &Vector3::z(), &t);
        match hit {
            RayHit::Hit { t } => assert_relative_eq!(t, 1.0),
            other => panic!("expected hit, got {other:?}"),
        }
    }

    #[test]
    fn ray_misses_outside() {
        let t = tri(p(0.0, 0.0, 1.0), p(2.0, 0.0, 1.0), p(0.0, 2.0, 1.0));
        assert_eq!(ray_triangle(&p(3.0, 3.0, 0.0), &Vector3::z(), &t), RayHit::Miss);
        assert_eq!(ray_triangle(&p(0.5, 0.5, 2.0), &Vector3::z(), &t), RayHit::Miss);
    }

    #[test]
    fn ray_through_edge_is_degenerate() {
        let t = tri(p(0.0, 0.0, 1.0), p(2.0, 0.0, 1.0), p(0.0, 2.0, 1.0));
        assert_eq!(ray_triangle(&p(1.0, 0.0, 0.0), &Vector3::z(), &t), RayHit::Degenerate);
    }

    #[test]
    fn crossing_triangles_meet_in_segment() {
        let a = tri(p(-1.0, -1.0, 0.0), p(2.0, -1.0, 0.0), p(-1.0, 2.0, 0.0));
        let b = tri(p(0.0, 0.0, -1.0), p(0.0, 0.0, 1.0), p(0.0, 1.0, 0.0));
        let TriangleIntersection::Segment { start, end } = intersect_triangles(&a, &b) else {
            panic!("expected a segment");
        };
        assert_relative_eq!(start.z, 0.0);
        assert_relative_eq!(end.z, 0.0);
        assert_relative_eq!(start.x, 0.0);
        assert_relative_eq!((end - start).norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn separated_triangles_do_not_meet() {
        let a = tri(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0));
        let b = tri(p(0.0, 0.0, 1.0), p(1.0, 0.0, 2.0), p(0.0, 1.0, 1.5));
        assert_eq!(intersect_triangles(&a, &b), TriangleIntersection::None);
    }

    #[test]
    fn touching_edge_is_reported() {
        // Wall standing on the floor triangle, touching it along its bottom edge.
        let floor = tri(p(-1.0, -1.0, 0.0), p(3.0, -1.0, 0.0), p(-1.0, 3.0, 0.0));
        let wall = tri(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 0.0, 1.0));
        let TriangleIntersection::Segment { start, end } = intersect_triangles(&floor, &wall) else {
            panic!("expected a segment");
        };
        assert_relative_eq!((end - start).norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn coplanar_overlap_clips_edges_both_ways() {
        let a = tri(p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(0.0, 2.0, 0.0));
        let b = tri(p(1.0, -1.0, 0.0), p(3.0, 1.0, 0.0), p(1.0, 1.0, 0.0));
        let TriangleIntersection::Coplanar {
            on_first,
            on_second,
        } = intersect_triangles(&a, &b)
        else {
            panic!("expected coplanar contact");
        };
        assert!(!on_first.is_empty());
        assert!(!on_second.is_empty());
        for (s, e) in on_first.iter().chain(on_second.iter()) {
            assert!(s.z.abs() < 1e-12 && e.z.abs() < 1e-12);
        }
    }

    #[test]
    fn clip_keeps_inside_portion() {
        let t = tri(p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(0.0, 4.0, 0.0));
        let (s, e) = clip_segment_to_triangle(&p(-1.0, 1.0, 0.0), &p(5.0, 1.0, 0.0), &t).unwrap();
        assert_relative_eq!(s.x, 0.0, epsilon = 1e-7);
        assert_relative_eq!(e.x, 3.0, epsilon = 1e-7);
        assert!(clip_segment_to_triangle(&p(5.0, 5.0, 0.0), &p(6.0, 5.0, 0.0), &t).is_none());
    }
}
