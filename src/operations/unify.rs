use std::borrow::Cow;

use tracing::{debug, warn};

use crate::math::Vector3;
use crate::mesh::{MeshKernel, TriangleMesh};

use super::prism::Prism;

/// Outcome of trying to union one prism into the accumulator.
#[derive(Debug, Clone, PartialEq)]
pub enum UnionAttempt {
    /// A nudge produced a valid volume.
    Merged {
        mesh: TriangleMesh,
        /// Index of the successful nudge.
        attempt: usize,
    },
    /// Every nudge failed.
    Exhausted,
}

/// The unified solid of one cluster and the prisms that could not join it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifiedCluster {
    pub solid: Option<TriangleMesh>,
    /// Prisms at their original position, in input order.
    pub quarantined: Vec<Prism>,
}

/// Folds the prisms of one cluster into a single solid.
///
/// Each prism is unioned with the running accumulator. When the result is
/// not a valid volume the prism is moved by the next nudge and the union
/// retried. Nudges accumulate, so each attempt starts where the previous one
/// left the prism. A prism that fails every nudge is quarantined at its
/// original position and the accumulator is kept.
pub struct UnifyPrisms<'a, K: MeshKernel> {
    kernel: &'a K,
    nudges: &'a [Vector3],
}

impl<'a, K: MeshKernel> UnifyPrisms<'a, K> {
    #[must_use]
    pub fn new(kernel: &'a K, nudges: &'a [Vector3]) -> Self {
        Self { kernel, nudges }
    }

    #[must_use]
    pub fn execute(&self, prisms: Vec<Prism>) -> UnifiedCluster {
        let mut solid: Option<TriangleMesh> = None;
        let mut quarantined = Vec::new();

        for prism in prisms {
            let Some(current) = solid.take() else {
                if self.kernel.is_volume(&prism.mesh) {
                    solid = Some(prism.mesh);
                } else {
                    warn!(footprint = prism.footprint.0, "prism is not a closed volume, quarantined");
                    quarantined.push(prism);
                }
                continue;
            };

            match self.attempt(&current, &prism.mesh) {
                UnionAttempt::Merged { mesh, attempt } => {
                    debug!(footprint = prism.footprint.0, attempt, "merged prism");
                    solid = Some(mesh);
                }
                UnionAttempt::Exhausted => {
                    warn!(
                        footprint = prism.footprint.0,
                        nudges = self.nudges.len(),
                        "union failed for every nudge, quarantined"
                    );
                    quarantined.push(prism);
                    solid = Some(current);
                }
            }
        }

        UnifiedCluster { solid, quarantined }
    }

    /// Tries each nudge in order, stopping at the first valid union.
    #[must_use]
    pub fn attempt(&self, accumulator: &TriangleMesh, candidate: &TriangleMesh) -> UnionAttempt {
        let mut offset = Vector3::zeros();
        for (attempt, nudge) in self.nudges.iter().enumerate() {
            offset += nudge;
            let moved = if offset.norm() == 0.0 {
                Cow::Borrowed(candidate)
            } else {
                Cow::Owned(candidate.translated(&offset))
            };
            match self.kernel.union(accumulator, &moved) {
                Ok(mesh) if self.kernel.is_volume(&mesh) => {
                    return UnionAttempt::Merged { mesh, attempt };
                }
                Ok(_) => debug!(attempt, "union is not a valid volume"),
                Err(e) => debug!(attempt, error = %e, "union failed"),
            }
        }
        UnionAttempt::Exhausted
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::default_nudges;
    use crate::error::MeshError;
    use crate::footprint::FootprintId;
    use crate::mesh::test_support::cube;
    use crate::mesh::{is_volume, NativeKernel};
    use crate::math::Point3;
    use approx::assert_relative_eq;
    use geo::Polygon;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn prism(id: usize, mesh: TriangleMesh) -> Prism {
        Prism {
            footprint: FootprintId(id),
            mesh,
        }
    }

    /// Kernel whose unions never form a valid volume.
    struct BrokenUnionKernel {
        unions: AtomicUsize,
    }

    impl MeshKernel for BrokenUnionKernel {
        fn extrude(&self, polygon: &Polygon<f64>, height: f64) -> Result<Option<TriangleMesh>, MeshError> {
            NativeKernel.extrude(polygon, height)
        }

        fn union(&self, _a: &TriangleMesh, _b: &TriangleMesh) -> Result<TriangleMesh, MeshError> {
            self.unions.fetch_add(1, Ordering::SeqCst);
            Err(MeshError::Boolean("coincident faces".into()))
        }

        fn is_volume(&self, mesh: &TriangleMesh) -> bool {
            is_volume(mesh)
        }
    }

    /// Kernel whose unions only succeed once the candidate has been moved.
    struct NeedsNudgeKernel;

    impl MeshKernel for NeedsNudgeKernel {
        fn extrude(&self, polygon: &Polygon<f64>, height: f64) -> Result<Option<TriangleMesh>, MeshError> {
            NativeKernel.extrude(polygon, height)
        }

        fn union(&self, a: &TriangleMesh, b: &TriangleMesh) -> Result<TriangleMesh, MeshError> {
            let aabb = b.aabb().unwrap();
            if aabb.min.x.fract().abs() < 1e-12 {
                return Ok(TriangleMesh::default());
            }
            NativeKernel.union(a, b)
        }

        fn is_volume(&self, mesh: &TriangleMesh) -> bool {
            is_volume(mesh)
        }
    }

    /// Kernel that records where each candidate was placed and never merges.
    #[derive(Default)]
    struct RecordingKernel {
        placements: Mutex<Vec<Point3>>,
    }

    impl MeshKernel for RecordingKernel {
        fn extrude(&self, polygon: &Polygon<f64>, height: f64) -> Result<Option<TriangleMesh>, MeshError> {
            NativeKernel.extrude(polygon, height)
        }

        fn union(&self, _a: &TriangleMesh, b: &TriangleMesh) -> Result<TriangleMesh, MeshError> {
            self.placements.lock().unwrap().push(b.aabb().unwrap().min);
            Err(MeshError::Boolean("rejected".into()))
        }

        fn is_volume(&self, mesh: &TriangleMesh) -> bool {
            is_volume(mesh)
        }
    }

    #[test]
    fn overlapping_prisms_fold_into_one_solid() {
        let nudges = default_nudges();
        let unify = UnifyPrisms::new(&NativeKernel, &nudges);
        let result = unify.execute(vec![
            prism(0, cube([0.0, 0.0, 0.0], [2.0, 1.0, 1.0])),
            prism(1, cube([1.5, 0.0, 0.0], [3.0, 1.0, 1.0])),
            prism(2, cube([10.0, 0.0, 0.0], [11.0, 1.0, 1.0])),
        ]);
        assert!(result.quarantined.is_empty());
        let solid = result.solid.unwrap();
        assert!(is_volume(&solid));
        assert_relative_eq!(solid.volume(), 4.0, epsilon = 1e-6);
    }

    #[test]
    fn failed_union_quarantines_after_every_nudge() {
        let kernel = BrokenUnionKernel {
            unions: AtomicUsize::new(0),
        };
        let nudges = default_nudges();
        let first = cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let second = cube([1.0, 0.0, 0.0], [2.0, 1.0, 1.0]);
        let result = UnifyPrisms::new(&kernel, &nudges).execute(vec![prism(0, first.clone()), prism(1, second.clone())]);

        assert_eq!(kernel.unions.load(Ordering::SeqCst), nudges.len());
        assert_eq!(result.solid, Some(first));
        assert_eq!(result.quarantined, vec![prism(1, second)]);
    }

    #[test]
    fn quarantine_does_not_block_later_prisms() {
        let kernel = BrokenUnionKernel {
            unions: AtomicUsize::new(0),
        };
        let nudges = default_nudges();
        let result = UnifyPrisms::new(&kernel, &nudges).execute(vec![
            prism(0, cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])),
            prism(1, cube([0.5, 0.0, 0.0], [1.5, 1.0, 1.0])),
            prism(2, cube([0.8, 0.0, 0.0], [1.8, 1.0, 1.0])),
        ]);
        assert_eq!(kernel.unions.load(Ordering::SeqCst), 2 * nudges.len());
        assert_eq!(result.quarantined.len(), 2);
        assert!(result.solid.is_some());
    }

    #[test]
    fn nudge_rescues_union() {
        let nudges = default_nudges();
        let unify = UnifyPrisms::new(&NeedsNudgeKernel, &nudges);
        let acc = cube([0.0, 0.0, 0.0], [2.0, 1.0, 1.0]);
        let candidate = cube([1.0, 0.25, 0.25], [3.0, 0.75, 0.75]);
        match unify.attempt(&acc, &candidate) {
            UnionAttempt::Merged { mesh, attempt } => {
                assert_eq!(attempt, 1);
                assert!(is_volume(&mesh));
            }
            UnionAttempt::Exhausted => panic!("expected the second nudge to succeed"),
        }
    }

    #[test]
    fn nudges_move_the_candidate_cumulatively() {
        let kernel = RecordingKernel::default();
        let nudges = default_nudges();
        let acc = cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let candidate = cube([1.0, 0.0, 0.0], [2.0, 1.0, 1.0]);
        assert_eq!(UnifyPrisms::new(&kernel, &nudges).attempt(&acc, &candidate), UnionAttempt::Exhausted);

        let placements = kernel.placements.lock().unwrap();
        let expected = [[1.0, 0.0], [1.1, 0.0], [1.0, 0.1], [0.9, 0.1], [1.0, 0.0]];
        assert_eq!(placements.len(), expected.len());
        for (min, [x, y]) in placements.iter().zip(expected) {
            assert_relative_eq!(min.x, x, epsilon = 1e-12);
            assert_relative_eq!(min.y, y, epsilon = 1e-12);
            assert_relative_eq!(min.z, 0.0);
        }
    }

    #[test]
    fn face_sharing_prisms_fuse() {
        let nudges = default_nudges();
        let result = UnifyPrisms::new(&NativeKernel, &nudges).execute(vec![
            prism(0, cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])),
            prism(1, cube([1.0, 0.0, 0.0], [2.0, 1.0, 1.0])),
        ]);
        assert!(result.quarantined.is_empty());
        let solid = result.solid.unwrap();
        assert!(is_volume(&solid));
        assert_relative_eq!(solid.volume(), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn invalid_first_prism_is_quarantined() {
        let nudges = default_nudges();
        let mut open = cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        open.indices.pop();
        let closed = cube([3.0, 0.0, 0.0], [4.0, 1.0, 1.0]);
        let result = UnifyPrisms::new(&NativeKernel, &nudges).execute(vec![prism(0, open), prism(1, closed.clone())]);
        assert_eq!(result.quarantined.len(), 1);
        assert_eq!(result.quarantined[0].footprint, FootprintId(0));
        assert_eq!(result.solid, Some(closed));
    }
}
