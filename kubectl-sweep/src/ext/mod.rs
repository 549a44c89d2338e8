//! This module provides extensions to Kubernetes API types.
//!
//! It introduces the pod snapshot types the sweep logic works with and the
//! traits that derive them from `k8s_openapi` objects.

mod pod;

pub use self::pod::{PodExt, PodPhase, PodRef};
