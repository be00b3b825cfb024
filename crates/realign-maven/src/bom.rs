//! Bill-of-materials sources: a POM whose dependency management pins the
//! versions to align to.

use std::path::Path;

use tracing::{debug, warn};

use realign_core::coordinate::{ProjectVersionMap, VersionOverrideMap};
use realign_core::model::Model;
use realign_core::project::{DependencySection, Project, ProjectTree};

use crate::pom::read_pom;

/// Version overrides published by the BOM at `path`, in declaration order.
pub fn load_bom(path: &Path) -> miette::Result<VersionOverrideMap> {
    let model = read_pom(path)?;
    Ok(bom_overrides(path, model))
}

/// Like [`load_bom`] but keyed by `group:artifact` only, as needed to
/// dereference extra-BOM names in module-scoping rules.
pub fn load_bom_by_project(path: &Path) -> miette::Result<ProjectVersionMap> {
    Ok(load_bom(path)?
        .into_iter()
        .map(|(artifact, version)| (artifact.as_project_ref(), version))
        .collect())
}

/// Interpolate the BOM's dependency management against its own properties
/// and turn every versioned entry into an override. BOM imports and
/// unresolvable versions are skipped.
pub fn bom_overrides(path: &Path, model: Model) -> VersionOverrideMap {
    let bom_ref = model.project_ref();
    let tree = ProjectTree {
        projects: vec![Project {
            inherited: vec![0],
            ..Project::new(path, model)
        }],
    };
    let resolved = tree.resolved_versions(0, DependencySection::Managed);

    let mut overrides = VersionOverrideMap::new();
    for (dep, version) in tree.projects[0]
        .section(DependencySection::Managed)
        .iter()
        .zip(resolved)
    {
        if dep.scope.as_deref() == Some("import") {
            debug!("Skipping nested BOM import {} in {bom_ref}", dep.project_ref());
            continue;
        }
        if version.is_empty() || version.contains("${") {
            warn!(
                "BOM {bom_ref} declares {} without a resolvable version ({}); ignoring",
                dep.project_ref(),
                dep.version_str()
            );
            continue;
        }
        let group = tree.interpolate(0, &dep.group_id);
        let artifact = tree.interpolate(0, &dep.artifact_id);
        let mut key = dep.management_key(&version);
        key.group_id = group;
        key.artifact_id = artifact;
        overrides.insert(key, version);
    }

    debug!("BOM {bom_ref} provides {} overrides", overrides.len());
    overrides
}
