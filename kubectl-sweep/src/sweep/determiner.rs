//! Predicates deciding which pods get swept.

use std::collections::BTreeSet;

use crate::ext::{PodPhase, PodRef};

/// Decides, for a single pod snapshot, whether it should be deleted.
pub trait Determiner {
    fn should_delete(&self, pod: &PodRef) -> bool;
}

/// Selects pods whose phase is one of the configured terminal phases.
#[derive(Clone, Debug)]
pub struct PhaseDeterminer {
    phases: BTreeSet<PodPhase>,
}

impl Default for PhaseDeterminer {
    fn default() -> Self { Self { phases: BTreeSet::from([PodPhase::Failed]) } }
}

impl PhaseDeterminer {
    /// Builds a determiner for `phases`, falling back to `Failed` alone when
    /// the list is empty.
    pub fn new<I>(phases: I) -> Self
    where
        I: IntoIterator<Item = PodPhase>,
    {
        let phases = phases.into_iter().collect::<BTreeSet<_>>();
        if phases.is_empty() { Self::default() } else { Self { phases } }
    }

    pub fn phases(&self) -> impl Iterator<Item = PodPhase> + '_ { self.phases.iter().copied() }
}

impl Determiner for PhaseDeterminer {
    fn should_delete(&self, pod: &PodRef) -> bool { self.phases.contains(&pod.phase) }
}

/// Treats a precomputed list of pods as the eligible set, so `run` can be
/// exercised without evaluating phases.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub struct FixedDeterminer {
    pub pods: Vec<PodRef>,
}

#[cfg(test)]
impl Determiner for FixedDeterminer {
    fn should_delete(&self, pod: &PodRef) -> bool {
        self.pods.iter().any(|eligible| {
            eligible.namespace == pod.namespace && eligible.name == pod.name
        })
    }
}
