//! Driving alignment over a whole module tree.

use std::collections::BTreeSet;

use tracing::{debug, info};

use realign_core::config::AlignmentConfig;
use realign_core::coordinate::VersionOverrideMap;
use realign_core::model::Dependency;
use realign_core::project::{DependencySection, ProjectTree};
use realign_core::version::check_strict_value;
use realign_util::errors::AlignError;

use crate::apply::{apply_explicit_overrides, apply_overrides, strict_violation, Unit};
use crate::context::AlignmentContext;
use crate::rules::{parse_rules, ScopingRule};
use crate::scope::{remove_reactor_refs, scope_overrides, ExtraBoms, ScopedOverrides};
use crate::tracker::PropertyWrite;

/// Result of one alignment run.
#[derive(Debug, Default)]
pub struct AlignmentOutcome {
    /// Indices of the projects alignment was applied to.
    pub changed: BTreeSet<usize>,
    pub property_writes: Vec<PropertyWrite>,
}

/// Aligns dependency versions across a module tree to a set of overrides.
pub struct DependencyAligner<'a> {
    config: &'a AlignmentConfig,
    rules: Vec<ScopingRule>,
    extra_boms: &'a ExtraBoms,
    context: AlignmentContext,
}

impl<'a> DependencyAligner<'a> {
    /// Parse the configured scoping rules up front so a malformed key
    /// fails before anything is modified.
    pub fn new(config: &'a AlignmentConfig, extra_boms: &'a ExtraBoms) -> Result<Self, AlignError> {
        let rules = parse_rules(&config.dependency_exclusions, |name| {
            extra_boms.contains_key(name)
        })?;
        Ok(Self {
            config,
            rules,
            extra_boms,
            context: AlignmentContext::new(),
        })
    }

    pub fn context(&self) -> &AlignmentContext {
        &self.context
    }

    /// Align every project of `tree` to `overrides`, then write scheduled
    /// property rewrites back.
    pub fn apply_changes(
        &mut self,
        tree: &mut ProjectTree,
        overrides: &VersionOverrideMap,
    ) -> Result<AlignmentOutcome, AlignError> {
        let mut outcome = AlignmentOutcome::default();
        if !self.config.enabled {
            debug!("Dependency alignment disabled; nothing to do");
            return Ok(outcome);
        }

        if overrides.is_empty() && self.config.dependency_exclusions.is_empty() {
            debug!("No overrides or scoping rules; nothing to do");
            return Ok(outcome);
        }

        let module_overrides = remove_reactor_refs(overrides, tree);
        for index in 0..tree.len() {
            self.apply_project(tree, index, overrides, &module_overrides)?;
            outcome.changed.insert(index);
        }

        if self.config.strict_validation_depth > 0 {
            info!("Validating property-based dependency updates");
            self.context
                .standard
                .validate(tree, self.config.strict_validation_depth)?;
        }
        outcome.property_writes = self.context.write_back(tree);
        Ok(outcome)
    }

    fn apply_project(
        &mut self,
        tree: &mut ProjectTree,
        index: usize,
        overrides: &VersionOverrideMap,
        module_overrides: &VersionOverrideMap,
    ) -> Result<(), AlignError> {
        let Some(project) = tree.get(index) else {
            return Ok(());
        };
        let key = project.key();
        let inheritance_root = project.inheritance_root;
        debug!("Processing project {key}");

        let scoped = scope_overrides(&key, &self.rules, module_overrides, self.extra_boms)?;

        if inheritance_root {
            self.align_parent(tree, index, &scoped)?;
        }

        if !self.config.override_dependencies {
            debug!("Not applying overrides to dependencies of {key}");
            return Ok(());
        }

        let sections = tree.projects[index].sections();
        for section in sections {
            debug!("Applying overrides to {section} of {key}");
            let unmatched = self.apply_section(tree, index, section, &scoped)?;
            if section == DependencySection::Managed
                && inheritance_root
                && self.config.override_transitive
            {
                inject_unmatched(tree, index, overrides, &unmatched);
            }
        }
        Ok(())
    }

    fn apply_section(
        &mut self,
        tree: &mut ProjectTree,
        index: usize,
        section: DependencySection,
        scoped: &ScopedOverrides,
    ) -> Result<VersionOverrideMap, AlignError> {
        let resolved = tree.resolved_versions(index, section);
        let unit = Unit::of(tree, index);
        let Some(deps) = tree.projects[index].section_mut(section) else {
            return Ok(scoped.overrides.clone());
        };

        let unmatched = apply_overrides(
            &unit,
            deps,
            &resolved,
            &scoped.explicit,
            &scoped.overrides,
            self.config,
            &mut self.context.standard,
        )?;
        apply_explicit_overrides(
            &unit,
            deps,
            &scoped.explicit,
            self.config,
            &mut self.context.explicit,
        )?;
        Ok(unmatched)
    }

    /// A tree root whose parent lives outside the tree may need that parent
    /// reference aligned too.
    fn align_parent(
        &mut self,
        tree: &mut ProjectTree,
        index: usize,
        scoped: &ScopedOverrides,
    ) -> Result<(), AlignError> {
        let unit = Unit::of(tree, index);
        let Some(parent) = tree.projects[index].model.parent.as_mut() else {
            return Ok(());
        };
        let parent_ref = parent.project_ref();
        let opts = self.config.strict_options();

        for (key, new_version) in scoped.overrides.iter().filter(|(k, _)| k.is(&parent_ref)) {
            if self.config.strict
                && !check_strict_value(self.config.strict_matching, &parent.version, new_version, &opts)
            {
                strict_violation(
                    self.config,
                    format!(
                        "Parent reference {parent_ref} replacement: {new_version} of original version: {} violates the strict version-alignment rule!",
                        parent.version
                    ),
                )?;
                continue;
            }
            debug!("Modifying parent reference {parent_ref} from {} to {new_version} ({key})", parent.version);
            parent.version = new_version.clone();
            break;
        }

        // Reuse the dependency path for explicit overrides on the parent.
        let mut simulated = [Dependency::new(
            &parent.group_id,
            &parent.artifact_id,
            Some(parent.version.as_str()),
        )];
        apply_explicit_overrides(
            &unit,
            &mut simulated,
            &scoped.explicit,
            self.config,
            &mut self.context.explicit,
        )?;
        if let Some(version) = simulated[0].version.take() {
            parent.version = version;
        }
        Ok(())
    }
}

/// Add overrides nothing in the root's dependency management matched to the
/// front of that list, in override order.
fn inject_unmatched(
    tree: &mut ProjectTree,
    index: usize,
    overrides: &VersionOverrideMap,
    unmatched: &VersionOverrideMap,
) {
    let extra: Vec<Dependency> = overrides
        .keys()
        .filter_map(|key| unmatched.get(key).map(|version| (key, version)))
        .map(|(key, version)| {
            debug!("New entry added to dependency management: {key} -> {version}");
            Dependency {
                type_: Some(key.type_.clone()),
                classifier: key.classifier.clone(),
                ..Dependency::new(&key.group_id, &key.artifact_id, Some(version.as_str()))
            }
        })
        .collect();
    if extra.is_empty() {
        return;
    }
    let managed = &mut tree.projects[index].model.dependency_management;
    managed.splice(0..0, extra);
}

#[cfg(test)]
mod tests {
    use super::*;
    use realign_core::coordinate::ArtifactRef;
    use realign_core::model::{Model, ParentRef};
    use realign_core::project::Project;

    fn overrides(entries: &[(&str, &str)]) -> VersionOverrideMap {
        entries
            .iter()
            .map(|(k, v)| (ArtifactRef::parse(k).unwrap(), v.to_string()))
            .collect()
    }

    fn rooted_project(parent_version: &str) -> ProjectTree {
        let model = Model {
            group_id: Some("org.foo".into()),
            artifact_id: Some("app".into()),
            version: Some("1.0".into()),
            parent: Some(ParentRef {
                group_id: "org.corp".into(),
                artifact_id: "corp-parent".into(),
                version: parent_version.into(),
                relative_path: None,
            }),
            dependency_management: vec![Dependency::new("g", "a", Some("1.0"))],
            ..Default::default()
        };
        ProjectTree::build(vec![Project::new("pom.xml", model)]).unwrap()
    }

    #[test]
    fn external_parent_is_aligned() {
        let config = AlignmentConfig::default();
        let boms = ExtraBoms::new();
        let mut tree = rooted_project("5");
        let mut aligner = DependencyAligner::new(&config, &boms).unwrap();
        aligner
            .apply_changes(&mut tree, &overrides(&[("org.corp:corp-parent:pom:5", "5.redhat-1")]))
            .unwrap();
        let parent = tree.projects[0].model.parent.as_ref().unwrap();
        assert_eq!(parent.version, "5.redhat-1");
    }

    #[test]
    fn strict_parent_mismatch_keeps_version() {
        let config = AlignmentConfig {
            strict: true,
            ..Default::default()
        };
        let boms = ExtraBoms::new();
        let mut tree = rooted_project("5");
        let mut aligner = DependencyAligner::new(&config, &boms).unwrap();
        aligner
            .apply_changes(&mut tree, &overrides(&[("org.corp:corp-parent:pom:6", "6.redhat-1")]))
            .unwrap();
        assert_eq!(tree.projects[0].model.parent.as_ref().unwrap().version, "5");
    }

    #[test]
    fn explicit_override_applies_to_parent() {
        let mut config = AlignmentConfig::default();
        config
            .dependency_exclusions
            .insert("org.corp:corp-parent@*".into(), "7.redhat-2".into());
        let boms = ExtraBoms::new();
        let mut tree = rooted_project("5");
        let mut aligner = DependencyAligner::new(&config, &boms).unwrap();
        aligner.apply_changes(&mut tree, &VersionOverrideMap::new()).unwrap();
        assert_eq!(tree.projects[0].model.parent.as_ref().unwrap().version, "7.redhat-2");
    }

    #[test]
    fn override_transitive_injects_unmatched_at_front() {
        let config = AlignmentConfig {
            override_transitive: true,
            ..Default::default()
        };
        let boms = ExtraBoms::new();
        let mut tree = rooted_project("5");
        let mut aligner = DependencyAligner::new(&config, &boms).unwrap();
        aligner
            .apply_changes(
                &mut tree,
                &overrides(&[
                    ("g:a:1.0", "1.0.redhat-1"),
                    ("g:b:pom:2.0", "2.0.redhat-1"),
                    ("g:c:1.0", "1.0.redhat-3"),
                ]),
            )
            .unwrap();
        let managed: Vec<(String, Option<String>, Option<String>)> = tree.projects[0]
            .model
            .dependency_management
            .iter()
            .map(|d| (d.artifact_id.clone(), d.version.clone(), d.type_.clone()))
            .collect();
        assert_eq!(
            managed,
            vec![
                ("b".into(), Some("2.0.redhat-1".into()), Some("pom".into())),
                ("c".into(), Some("1.0.redhat-3".into()), Some("jar".into())),
                ("a".into(), Some("1.0.redhat-1".into()), None),
            ]
        );
    }

    #[test]
    fn disabled_alignment_changes_nothing() {
        let config = AlignmentConfig {
            enabled: false,
            ..Default::default()
        };
        let boms = ExtraBoms::new();
        let mut tree = rooted_project("5");
        let before = tree.clone();
        let mut aligner = DependencyAligner::new(&config, &boms).unwrap();
        let outcome = aligner
            .apply_changes(&mut tree, &overrides(&[("g:a:1.0", "1.0.redhat-1")]))
            .unwrap();
        assert!(outcome.changed.is_empty());
        assert_eq!(tree, before);
    }

    #[test]
    fn malformed_rule_fails_before_alignment() {
        let mut config = AlignmentConfig::default();
        config.dependency_exclusions.insert("g:a@x@y".into(), "1".into());
        let boms = ExtraBoms::new();
        assert!(matches!(
            DependencyAligner::new(&config, &boms),
            Err(AlignError::Config { .. })
        ));
    }
}
