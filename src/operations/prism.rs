use geo::algorithm::buffer::{Buffer, BufferStyle, LineCap, LineJoin};
use geo::algorithm::orient::{Direction, Orient};
use geo::{Area, MultiPolygon, Polygon, Simplify, Validation};
use tracing::debug;

use crate::config::PrismParams;
use crate::error::MeshError;
use crate::footprint::{FootprintEntry, FootprintId};
use crate::math::{Vector3, TOLERANCE};
use crate::mesh::{MeshKernel, TriangleMesh};

/// An extruded footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Prism {
    pub footprint: FootprintId,
    pub mesh: TriangleMesh,
}

/// Builds the prism of one footprint.
///
/// The footprint is grown by the buffer tolerance with bevelled corners and
/// flat caps, simplified, rebuilt as one polygon with holes, extruded to its
/// height and lifted by its vertical offset. A simplification that leaves
/// the polygon invalid (rings crossing each other or themselves) is
/// discarded in favour of the grown boundary.
pub struct BuildPrism<'a, K: MeshKernel> {
    entry: &'a FootprintEntry,
    params: PrismParams,
    kernel: &'a K,
}

impl<'a, K: MeshKernel> BuildPrism<'a, K> {
    #[must_use]
    pub fn new(entry: &'a FootprintEntry, params: PrismParams, kernel: &'a K) -> Self {
        Self {
            entry,
            params,
            kernel,
        }
    }

    /// Executes the build.
    ///
    /// Returns `Ok(None)` if the cleaned footprint encloses no area.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel cannot triangulate the cleaned polygon.
    pub fn execute(&self) -> Result<Option<Prism>, MeshError> {
        let Some(cleaned) = self.clean() else {
            return Ok(None);
        };
        let Some(mut mesh) = self.kernel.extrude(&cleaned, self.entry.attributes.height)? else {
            return Ok(None);
        };
        let z = self.entry.attributes.z_offset;
        if z != 0.0 {
            mesh.translate(&Vector3::new(0.0, 0.0, z));
        }
        Ok(Some(Prism {
            footprint: self.entry.id,
            mesh,
        }))
    }

    /// Grown and simplified footprint, or `None` if nothing is left.
    fn clean(&self) -> Option<Polygon<f64>> {
        let oriented = self.entry.polygon.orient(Direction::Default);
        let tolerance = self.params.buffer_tolerance;
        let grown = if tolerance > 0.0 {
            let style = BufferStyle::new(tolerance)
                .line_join(LineJoin::Bevel)
                .line_cap(LineCap::Butt);
            oriented.buffer_with_style(style)
        } else {
            MultiPolygon::new(vec![oriented])
        };
        let epsilon = self.params.simplify_tolerance;
        if epsilon <= 0.0 {
            return rebuild_with_holes(&grown);
        }
        let simplified = rebuild_with_holes(&grown.simplify(epsilon))?;
        if simplified.is_valid() {
            return Some(simplified);
        }
        debug!(
            footprint = self.entry.id.0,
            "simplified boundary is invalid, keeping it unsimplified"
        );
        rebuild_with_holes(&grown)
    }
}

/// Rebuilds one polygon with holes from a cleaned boundary.
///
/// The first ring of the largest part is the outer boundary and its other
/// rings become holes. Rings that collapsed during simplification are
/// dropped.
fn rebuild_with_holes(boundary: &MultiPolygon<f64>) -> Option<Polygon<f64>> {
    let largest = boundary
        .iter()
        .filter(|p| p.exterior().0.len() >= 4)
        .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))?;
    if largest.unsigned_area() < TOLERANCE {
        return None;
    }
    let holes = largest
        .interiors()
        .iter()
        .filter(|ring| ring.0.len() >= 4)
        .cloned()
        .collect();
    Some(Polygon::new(largest.exterior().clone(), holes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::footprint::FootprintAttributes;
    use crate::mesh::{is_volume, NativeKernel};
    use approx::assert_relative_eq;
    use geo::polygon;

    fn entry(polygon: Polygon<f64>, height: f64, z_offset: f64) -> FootprintEntry {
        FootprintEntry {
            id: FootprintId(7),
            polygon,
            attributes: FootprintAttributes { height, z_offset },
            source: (7, 0),
        }
    }

    fn params(buffer_tolerance: f64, simplify_tolerance: f64) -> PrismParams {
        PrismParams {
            buffer_tolerance,
            simplify_tolerance,
        }
    }

    fn square(size: f64) -> Polygon<f64> {
        polygon![(x: 0.0, y: 0.0), (x: 0.0, y: size), (x: size, y: size), (x: size, y: 0.0)]
    }

    #[test]
    fn unbuffered_square_extrudes_to_exact_volume() {
        let e = entry(square(2.0), 10.0, 0.0);
        let prism = BuildPrism::new(&e, params(0.0, 0.0), &NativeKernel).execute().unwrap().unwrap();
        assert_eq!(prism.footprint, FootprintId(7));
        assert!(is_volume(&prism.mesh));
        assert_relative_eq!(prism.mesh.volume(), 40.0, epsilon = 1e-9);
    }

    #[test]
    fn buffer_grows_the_footprint() {
        let e = entry(square(2.0), 1.0, 0.0);
        let prism = BuildPrism::new(&e, params(0.1, 0.0), &NativeKernel).execute().unwrap().unwrap();
        // Bevelled corners: 2.2 x 2.2 minus four corner triangles of 0.1 x 0.1 / 2.
        let expected = 2.2 * 2.2 - 4.0 * 0.005;
        assert_relative_eq!(prism.mesh.volume(), expected, epsilon = 1e-6);
        assert!(is_volume(&prism.mesh));
    }

    #[test]
    fn z_offset_lifts_the_prism() {
        let e = entry(square(1.0), 2.0, 5.0);
        let prism = BuildPrism::new(&e, params(0.0, 0.0), &NativeKernel).execute().unwrap().unwrap();
        let aabb = prism.mesh.aabb().unwrap();
        assert_relative_eq!(aabb.min.z, 5.0);
        assert_relative_eq!(aabb.max.z, 7.0);
    }

    #[test]
    fn holes_survive_cleaning() {
        let courtyard = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 0.0, y: 10.0), (x: 10.0, y: 10.0), (x: 10.0, y: 0.0)],
            interiors: [[(x: 3.0, y: 3.0), (x: 7.0, y: 3.0), (x: 7.0, y: 7.0), (x: 3.0, y: 7.0)]],
        );
        let e = entry(courtyard, 1.0, 0.0);
        let prism = BuildPrism::new(&e, params(0.0, 0.1), &NativeKernel).execute().unwrap().unwrap();
        assert_relative_eq!(prism.mesh.volume(), 84.0, epsilon = 1e-9);
    }

    #[test]
    fn simplification_that_crosses_a_hole_is_discarded() {
        // Dropping the shallow bottom vertex would run the outer edge
        // through the hole.
        let courtyard = polygon!(
            exterior: [(x: 0.0, y: 0.09), (x: 5.0, y: 0.0), (x: 10.0, y: 0.09), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 4.0, y: 0.03), (x: 4.0, y: 1.0), (x: 6.0, y: 1.0), (x: 6.0, y: 0.03)]],
        );
        let e = entry(courtyard, 1.0, 0.0);
        let prism = BuildPrism::new(&e, params(0.0, 0.1), &NativeKernel).execute().unwrap().unwrap();
        assert!(is_volume(&prism.mesh));
        // 10 x 9.91 plus the bottom wedge, minus the 2 x 0.97 hole.
        assert_relative_eq!(prism.mesh.volume(), 99.1 + 0.45 - 1.94, epsilon = 1e-6);
    }

    #[test]
    fn sliver_collapses_to_nothing() {
        let sliver = polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 1e-12)];
        let e = entry(sliver, 3.0, 0.0);
        assert!(BuildPrism::new(&e, params(0.0, 0.1), &NativeKernel).execute().unwrap().is_none());
    }
}
