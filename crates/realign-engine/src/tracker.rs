//! Property rewrites scheduled during alignment and applied afterwards.
//!
//! A dependency whose version is exactly `${name}` is not rewritten in
//! place. Instead the new value is recorded against `name` for the owning
//! module and written to the property declaration once every module has
//! been processed.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info, warn};

use realign_core::config::AlignmentConfig;
use realign_core::coordinate::{ArtifactRef, ProjectRef};
use realign_core::project::ProjectTree;
use realign_core::properties::{extract_property_name, single_reference, PROJECT_VERSION};
use realign_util::errors::AlignError;

/// Maximum `${a}` → `${b}` hops followed when locating a declaration.
const MAX_CHAIN_DEPTH: usize = 10;

/// A scheduled rewrite of one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMapper {
    pub property: String,
    pub old_version: String,
    pub new_version: String,
    /// The override that first scheduled this rewrite.
    pub trigger: ArtifactRef,
    /// Every coordinate whose alignment agreed with this rewrite.
    pub dependencies: IndexSet<ProjectRef>,
}

/// Where a property rewrite landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteLocation {
    /// Overwrote an existing declaration in the project at this index.
    Declared(usize),
    /// Nothing declared the property; it was added to this tree root.
    InjectedAtRoot(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyWrite {
    /// Project whose dependencies scheduled the rewrite.
    pub project: usize,
    pub property: String,
    pub value: String,
    pub location: WriteLocation,
}

/// Scheduled property rewrites keyed by project index, then property name.
#[derive(Debug, Clone, Default)]
pub struct PropertyTracker {
    entries: IndexMap<usize, IndexMap<String, PropertyMapper>>,
}

impl PropertyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(IndexMap::is_empty)
    }

    pub fn get(&self, project: usize, property: &str) -> Option<&PropertyMapper> {
        self.entries.get(&project)?.get(property)
    }

    /// Every scheduled rewrite, grouped by project in scheduling order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &PropertyMapper)> {
        self.entries
            .iter()
            .flat_map(|(&project, mappers)| mappers.values().map(move |m| (project, m)))
    }

    /// Try to schedule `old_version` (which must be exactly `${name}`) to
    /// become `new_version`. Returns `false` when the version is not a
    /// plain property reference, names `project.version`, or clashes with a
    /// different value already scheduled (unless `forced`).
    pub fn cache_property(
        &mut self,
        project: usize,
        old_version: &str,
        new_version: &str,
        trigger: &ArtifactRef,
        forced: bool,
        config: &AlignmentConfig,
    ) -> Result<bool, AlignError> {
        let Some(name) = single_reference(old_version) else {
            return Ok(false);
        };
        if name == PROJECT_VERSION {
            return Ok(false);
        }
        let coordinate = trigger.as_project_ref();
        let mappers = self.entries.entry(project).or_default();

        if let Some(existing) = mappers.get_mut(name) {
            if existing.new_version == new_version {
                existing.dependencies.insert(coordinate);
                return Ok(true);
            }
            if !forced {
                let clash = AlignError::PropertyClash {
                    property: name.to_string(),
                    existing: existing.new_version.clone(),
                    requested: new_version.to_string(),
                    coordinate: trigger.to_string(),
                };
                if config.strict && config.fail_on_strict_violation {
                    return Err(clash);
                }
                warn!("{clash}");
                return Ok(false);
            }
            debug!(
                "Forcing property {name} from {} to {new_version} for {trigger}",
                existing.new_version
            );
            existing.new_version = new_version.to_string();
            existing.trigger = trigger.clone();
            existing.dependencies.insert(coordinate);
            return Ok(true);
        }

        debug!("Scheduling property {name} to become {new_version} for {trigger}");
        mappers.insert(
            name.to_string(),
            PropertyMapper {
                property: name.to_string(),
                old_version: old_version.to_string(),
                new_version: new_version.to_string(),
                trigger: trigger.clone(),
                dependencies: IndexSet::from([coordinate]),
            },
        );
        Ok(true)
    }

    /// Write every scheduled value to its declaration: the nearest project
    /// in the inheritance chain declaring it (in its own or profile
    /// properties), else the tree root.
    pub fn write_back(&self, tree: &mut ProjectTree) -> Vec<PropertyWrite> {
        let mut writes = Vec::new();
        for (project, mapper) in self.iter() {
            let location = update_property(tree, project, &mapper.property, &mapper.new_version, 0)
                .unwrap_or_else(|| {
                    let root = tree
                        .get(project)
                        .and_then(|p| p.root_index())
                        .unwrap_or(project);
                    if let Some(p) = tree.projects.get_mut(root) {
                        p.model
                            .properties
                            .insert(mapper.property.clone(), mapper.new_version.clone());
                    }
                    WriteLocation::InjectedAtRoot(root)
                });
            info!(
                "Property {} set to {} ({location:?})",
                mapper.property, mapper.new_version
            );
            writes.push(PropertyWrite {
                project,
                property: mapper.property.clone(),
                value: mapper.new_version.clone(),
                location,
            });
        }
        writes
    }

    /// Flag dependencies that reference a rewritten property without having
    /// agreed to the rewrite themselves. Depth 1 warns, 2 and above fail.
    pub fn validate(&self, tree: &ProjectTree, depth: u8) -> Result<(), AlignError> {
        if depth == 0 {
            return Ok(());
        }
        let mut orphans = Vec::new();
        for (&index, mappers) in &self.entries {
            let Some(project) = tree.get(index) else {
                continue;
            };
            for section in project.sections() {
                for dep in project.section(section) {
                    let Some(name) = dep.version.as_deref().and_then(extract_property_name) else {
                        continue;
                    };
                    let Some(mapper) = mappers.get(name) else {
                        continue;
                    };
                    let coordinate = dep.project_ref();
                    if !mapper.dependencies.contains(&coordinate) {
                        orphans.push(format!(
                            "{coordinate} in {project} uses ${{{name}}} which is being changed to {} but was not itself aligned",
                            mapper.new_version
                        ));
                    }
                }
            }
        }

        if orphans.is_empty() {
            return Ok(());
        }
        if depth >= 2 {
            return Err(AlignError::PropertyValidation {
                message: orphans.join("; "),
            });
        }
        for orphan in &orphans {
            warn!("Property validation: {orphan}");
        }
        Ok(())
    }
}

/// Overwrite `name` where it is declared for `index`, following chained
/// `${other}` declarations. `None` when nothing in the chain declares it.
fn update_property(
    tree: &mut ProjectTree,
    index: usize,
    name: &str,
    value: &str,
    depth: usize,
) -> Option<WriteLocation> {
    let chain: Vec<usize> = tree.get(index)?.inherited.iter().rev().copied().collect();
    let owner = chain.into_iter().find(|&i| {
        tree.get(i).is_some_and(|p| {
            p.model.properties.contains_key(name)
                || p.model.profiles.iter().any(|pr| pr.properties.contains_key(name))
        })
    })?;

    let declared: Vec<String> = {
        let model = &tree.projects[owner].model;
        model
            .properties
            .get(name)
            .into_iter()
            .chain(model.profiles.iter().filter_map(|p| p.properties.get(name)))
            .cloned()
            .collect()
    };

    // A declaration that just points at another property moves the
    // rewrite to that property instead.
    if depth < MAX_CHAIN_DEPTH {
        if let Some(other) = declared.iter().find_map(|v| single_reference(v)) {
            if other != name && !other.starts_with("project.") {
                debug!("Property {name} refers to {other}; updating {other} instead");
                if let Some(location) = update_property(tree, index, other, value, depth + 1) {
                    return Some(location);
                }
            }
        }
    }

    let model = &mut tree.projects[owner].model;
    if let Some(v) = model.properties.get_mut(name) {
        *v = value.to_string();
    }
    for profile in &mut model.profiles {
        if let Some(v) = profile.properties.get_mut(name) {
            *v = value.to_string();
        }
    }
    Some(WriteLocation::Declared(owner))
}
