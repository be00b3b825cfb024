//! Stripping repository and reporting declarations from every descriptor.

use std::collections::BTreeSet;

use tracing::info;

use realign_core::model::{Model, Profile};
use realign_core::project::ProjectTree;

/// Clear repositories, plugin repositories and reporting from each model
/// and its profiles. Returns the indices of projects that had any.
pub fn remove_repositories_and_reporting(tree: &mut ProjectTree) -> BTreeSet<usize> {
    let mut changed = BTreeSet::new();
    for (index, project) in tree.projects.iter_mut().enumerate() {
        let mut touched = clear_model(&mut project.model);
        for profile in &mut project.model.profiles {
            touched |= clear_profile(profile);
        }
        if touched {
            info!("Removed repositories and reporting from {project}");
            changed.insert(index);
        }
    }
    changed
}

fn clear_model(model: &mut Model) -> bool {
    let touched = !model.repositories.is_empty()
        || !model.plugin_repositories.is_empty()
        || model.has_reporting;
    model.repositories.clear();
    model.plugin_repositories.clear();
    model.has_reporting = false;
    touched
}

fn clear_profile(profile: &mut Profile) -> bool {
    let touched = !profile.repositories.is_empty()
        || !profile.plugin_repositories.is_empty()
        || profile.has_reporting;
    profile.repositories.clear();
    profile.plugin_repositories.clear();
    profile.has_reporting = false;
    touched
}
