//! Per-run state shared by every module processed in one alignment.

use crate::tracker::{PropertyTracker, PropertyWrite};
use realign_core::project::ProjectTree;

/// Property rewrites scheduled across the run. Rewrites requested by
/// explicit overrides are kept apart so they can be written after, and
/// therefore win over, the computed ones.
#[derive(Debug, Clone, Default)]
pub struct AlignmentContext {
    pub standard: PropertyTracker,
    pub explicit: PropertyTracker,
}

impl AlignmentContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every scheduled property: computed rewrites first, explicit
    /// ones last.
    pub fn write_back(&self, tree: &mut ProjectTree) -> Vec<PropertyWrite> {
        tracing::info!("Updating properties for standard overrides");
        let mut writes = self.standard.write_back(tree);
        tracing::info!("Updating properties for explicit overrides");
        writes.extend(self.explicit.write_back(tree));
        writes
    }
}
