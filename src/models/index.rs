//! Vector index descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::config::{DEFAULT_DIMENSION, VectorIndexConfig};

/// Distance metric used by an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    #[serde(rename = "dotproduct")]
    DotProduct,
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Cosine => write!(f, "cosine"),
            DistanceMetric::Euclidean => write!(f, "euclidean"),
            DistanceMetric::DotProduct => write!(f, "dotproduct"),
        }
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" | "euclid" => Ok(DistanceMetric::Euclidean),
            "dotproduct" | "dot" => Ok(DistanceMetric::DotProduct),
            _ => Err(format!("unknown distance metric: {}", s)),
        }
    }
}

/// Where a serverless index is hosted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerlessSpec {
    pub cloud: String,
    pub region: String,
}

impl Default for ServerlessSpec {
    fn default() -> Self {
        Self {
            cloud: "aws".to_string(),
            region: "us-west-2".to_string(),
        }
    }
}

/// Everything needed to create (or look up) an index.
///
/// Fixed once the index exists; a different dimension needs a new index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub dimension: u32,
    pub metric: DistanceMetric,
    pub spec: ServerlessSpec,
}

impl IndexDescriptor {
    pub fn new(name: impl Into<String>, dimension: u32) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric: DistanceMetric::default(),
            spec: ServerlessSpec::default(),
        }
    }

    #[must_use]
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    #[must_use]
    pub fn with_spec(mut self, cloud: impl Into<String>, region: impl Into<String>) -> Self {
        self.spec = ServerlessSpec {
            cloud: cloud.into(),
            region: region.into(),
        };
        self
    }

    pub fn from_config(config: &VectorIndexConfig) -> Self {
        Self::new(&config.index_name, config.dimension)
            .with_metric(config.metric)
            .with_spec(&config.cloud, &config.region)
    }
}

impl Default for IndexDescriptor {
    fn default() -> Self {
        Self::new(super::config::DEFAULT_INDEX_NAME, DEFAULT_DIMENSION)
    }
}
