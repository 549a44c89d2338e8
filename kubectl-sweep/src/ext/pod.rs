use std::fmt;

use k8s_openapi::{Metadata, api::core::v1::Pod};
use serde::{Deserialize, Serialize};

/// Lifecycle phase reported in `status.phase` of a pod.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[derive(clap::ValueEnum)]
#[value(rename_all = "PascalCase")]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl From<&str> for PodPhase {
    // The API server may report phases this client does not know yet.
    fn from(phase: &str) -> Self {
        match phase {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

/// Immutable snapshot of the pod fields the sweep decision depends on.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PodRef {
    pub namespace: String,
    pub name: String,
    pub phase: PodPhase,
}

impl PodRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, phase: PodPhase) -> Self {
        Self { namespace: namespace.into(), name: name.into(), phase }
    }
}

impl fmt::Display for PodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

pub trait PodExt {
    fn phase(&self) -> PodPhase;

    fn to_pod_ref(&self) -> PodRef;
}

impl PodExt for Pod {
    fn phase(&self) -> PodPhase {
        self.status
            .as_ref()
            .and_then(|status| status.phase.as_deref())
            .map_or(PodPhase::Unknown, PodPhase::from)
    }

    fn to_pod_ref(&self) -> PodRef {
        let metadata = self.metadata();
        PodRef::new(
            metadata.namespace.clone().unwrap_or_default(),
            metadata.name.clone().unwrap_or_default(),
            self.phase(),
        )
    }
}
