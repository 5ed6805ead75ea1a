//! End-to-end conversion of a footprint layer into a CAD document.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::config::{default_nudges, PipelineConfig};
use crate::error::Result;
use crate::export::{CadDocument, DxfDocument, ExportSolids};
use crate::footprint::{BuildFootprintTable, FootprintTable};
use crate::input::ReadLayer;
use crate::math::Vector3;
use crate::mesh::{MeshKernel, NativeKernel, TriangleMesh};
use crate::operations::{BuildPrism, Cluster, ClusterFootprints, ClusterPartition, UnifiedCluster, UnifyPrisms};

/// Summary of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub footprints: usize,
    pub clusters: usize,
    /// Fused solids written to the main layer.
    pub solids: usize,
    /// Prisms written to the error layer.
    pub quarantined: usize,
    /// Footprints whose prism was empty or could not be built.
    pub dropped_footprints: usize,
    /// Footprints outside every cluster region.
    pub uncovered_footprints: usize,
    pub output_path: PathBuf,
}

/// Meshes produced for a whole partition, in cluster order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolidSet {
    pub main: Vec<TriangleMesh>,
    pub errors: Vec<TriangleMesh>,
    pub dropped: usize,
}

/// Default output path: the input path with a `.dxf` extension.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("dxf")
}

/// The conversion pipeline, generic over the mesh kernel.
pub struct Pipeline<K: MeshKernel = NativeKernel> {
    config: PipelineConfig,
    kernel: K,
    nudges: Vec<Vector3>,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_kernel(config, NativeKernel)
    }
}

impl<K: MeshKernel> Pipeline<K> {
    #[must_use]
    pub fn with_kernel(config: PipelineConfig, kernel: K) -> Self {
        Self {
            config,
            kernel,
            nudges: default_nudges(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Converts `input` and writes the document to `output`, or next to the
    /// input when `output` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid configuration, an unreadable or
    /// malformed layer, a degenerate footprint ring, an unparsable attribute,
    /// or a failure to write the document. Failed unions are not errors;
    /// they end up on the error layer.
    #[instrument(skip_all, fields(input = %input.display()))]
    pub fn run(&self, input: &Path, output: Option<&Path>) -> Result<PipelineReport> {
        self.config.validate()?;

        let layer = ReadLayer::new(input).execute()?;
        let table = BuildFootprintTable::new(&layer, &self.config.attribute_fields(), self.config.normalize).execute()?;
        let partition = ClusterFootprints::new(&table, self.config.cluster_params()).execute();
        let solids = self.build_solids(&table, &partition);

        let output_path = output.map_or_else(|| default_output_path(input), Path::to_path_buf);
        let mut document = DxfDocument::new();
        self.export(&solids, &mut document, &output_path)?;

        let report = PipelineReport {
            footprints: table.len(),
            clusters: partition.clusters.len(),
            solids: solids.main.len(),
            quarantined: solids.errors.len(),
            dropped_footprints: solids.dropped,
            uncovered_footprints: partition.uncovered.len(),
            output_path,
        };
        info!(
            solids = report.solids,
            quarantined = report.quarantined,
            dropped = report.dropped_footprints,
            output = %report.output_path.display(),
            "conversion finished"
        );
        Ok(report)
    }

    /// Writes the solids into `document` and saves it to `path`.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the document.
    pub fn export(&self, solids: &SolidSet, document: &mut impl CadDocument, path: &Path) -> Result<()> {
        ExportSolids::new(&solids.main, &solids.errors, self.config.output_kind).execute(document)?;
        document.save(path)?;
        Ok(())
    }

    /// Builds and unifies the prisms of every cluster.
    ///
    /// Clusters run on the rayon pool when the configuration allows it;
    /// the output keeps cluster order either way.
    #[must_use]
    #[instrument(skip_all, fields(clusters = partition.clusters.len(), parallel = self.config.parallel))]
    pub fn build_solids(&self, table: &FootprintTable, partition: &ClusterPartition) -> SolidSet {
        let outcomes: Vec<(UnifiedCluster, usize)> = if self.config.parallel {
            partition
                .clusters
                .par_iter()
                .map(|cluster| self.process_cluster(table, cluster))
                .collect()
        } else {
            partition
                .clusters
                .iter()
                .map(|cluster| self.process_cluster(table, cluster))
                .collect()
        };

        let mut set = SolidSet::default();
        for (unified, dropped) in outcomes {
            set.main.extend(unified.solid);
            set.errors.extend(unified.quarantined.into_iter().map(|prism| prism.mesh));
            set.dropped += dropped;
        }
        set
    }

    fn process_cluster(&self, table: &FootprintTable, cluster: &Cluster) -> (UnifiedCluster, usize) {
        let params = self.config.prism_params();
        let mut prisms = Vec::with_capacity(cluster.members.len());
        let mut dropped = 0;
        for &id in &cluster.members {
            let Some(entry) = table.get(id) else {
                continue;
            };
            let (feature, part) = entry.source;
            match BuildPrism::new(entry, params, &self.kernel).execute() {
                Ok(Some(prism)) => prisms.push(prism),
                Ok(None) => {
                    dropped += 1;
                    warn!(feature, part, "footprint has no area left after cleaning, dropped");
                }
                Err(e) => {
                    dropped += 1;
                    warn!(feature, part, error = %e, "cannot extrude footprint, dropped");
                }
            }
        }
        debug!(members = cluster.members.len(), prisms = prisms.len(), "unifying cluster");
        let unified = UnifyPrisms::new(&self.kernel, &self.nudges).execute(prisms);
        (unified, dropped)
    }
}
