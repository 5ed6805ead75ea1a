//! Pipeline stages: clustering, prism building and robust unification.

mod cluster;
mod prism;
mod unify;

pub use cluster::{Cluster, ClusterFootprints, ClusterPartition};
pub use prism::{BuildPrism, Prism};
pub use unify::{UnifiedCluster, UnifyPrisms, UnionAttempt};
