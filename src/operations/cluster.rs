use std::collections::BTreeSet;

use geo::algorithm::buffer::{Buffer, BufferStyle, LineCap, LineJoin};
use geo::algorithm::orient::{Direction, Orient};
use geo::{unary_union, Intersects, MultiPolygon, Polygon};
use tracing::{info, warn};

use crate::config::{ClusterParams, MITRE_LIMIT};
use crate::footprint::{FootprintId, FootprintTable};

/// A connected region of the closed footprint union and the footprints touching it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub region: Polygon<f64>,
    /// Member footprints in table order.
    pub members: Vec<FootprintId>,
}

/// Result of partitioning a footprint table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterPartition {
    pub clusters: Vec<Cluster>,
    /// Footprints that intersect no cluster region.
    pub uncovered: Vec<FootprintId>,
}

/// Groups footprints that touch or nearly touch into independent clusters.
///
/// Unions all footprints, grows the union by the buffer tolerance with
/// mitred corners and square caps, re-unions the grown pieces, and shrinks
/// the result back by the same tolerance. Each polygon of the result is one
/// cluster; its members are the footprints whose geometry intersects it.
pub struct ClusterFootprints<'a> {
    table: &'a FootprintTable,
    params: ClusterParams,
}

impl<'a> ClusterFootprints<'a> {
    #[must_use]
    pub fn new(table: &'a FootprintTable, params: ClusterParams) -> Self {
        Self { table, params }
    }

    #[must_use]
    pub fn execute(&self) -> ClusterPartition {
        let merged = unary_union(self.table.polygons()).orient(Direction::Default);
        let regions = close_gaps(merged, self.params.buffer_tolerance);

        let mut covered = BTreeSet::new();
        let mut clusters = Vec::with_capacity(regions.0.len());
        for region in regions {
            let members: Vec<FootprintId> = self
                .table
                .iter()
                .filter(|entry| entry.polygon.intersects(&region))
                .map(|entry| entry.id)
                .collect();
            if members.is_empty() {
                continue;
            }
            covered.extend(members.iter().copied());
            clusters.push(Cluster { region, members });
        }

        let uncovered: Vec<FootprintId> = self
            .table
            .iter()
            .map(|entry| entry.id)
            .filter(|id| !covered.contains(id))
            .collect();
        if !uncovered.is_empty() {
            warn!(count = uncovered.len(), "footprints outside every cluster");
        }
        info!(clusters = clusters.len(), "clustered footprints");

        ClusterPartition {
            clusters,
            uncovered,
        }
    }
}

fn closing_style(distance: f64) -> BufferStyle<f64> {
    BufferStyle::new(distance)
        .line_join(LineJoin::Miter(MITRE_LIMIT))
        .line_cap(LineCap::Square)
}

/// Grows then shrinks a region by `tolerance`, fusing gaps narrower than
/// twice the tolerance.
fn close_gaps(region: MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
    if tolerance <= 0.0 || region.0.is_empty() {
        return region;
    }
    let grown = region.buffer_with_style(closing_style(tolerance));
    let grown = if grown.0.len() > 1 {
        unary_union(&grown)
    } else {
        grown
    };
    grown.buffer_with_style(closing_style(-tolerance))
}
