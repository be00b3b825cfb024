//! Per-module view of the overrides: reactor self-references removed and
//! module-scoping rules applied.

use indexmap::IndexMap;
use tracing::debug;

use realign_core::coordinate::{ArtifactRef, ProjectRef, ProjectVersionMap, VersionOverrideMap};
use realign_core::project::ProjectTree;
use realign_core::wildcard::WildcardMap;
use realign_util::errors::AlignError;

use crate::rules::{Directive, RuleAction, ScopingRule};

/// Explicit per-module overrides: artifact (possibly wildcarded) to the
/// directives forced on it.
pub type ExplicitOverrides = WildcardMap<Vec<Directive>>;

/// Extra BOMs addressable by name from rule values.
pub type ExtraBoms = IndexMap<String, ProjectVersionMap>;

/// The overrides one module sees after scoping.
#[derive(Debug, Clone, Default)]
pub struct ScopedOverrides {
    pub overrides: VersionOverrideMap,
    pub explicit: ExplicitOverrides,
}

/// Drop BOM-typed overrides that point back at a module of the tree with
/// that module's own version.
pub fn remove_reactor_refs(overrides: &VersionOverrideMap, tree: &ProjectTree) -> VersionOverrideMap {
    let mut filtered = overrides.clone();
    for project in &tree.projects {
        let key = project.key();
        let own = ArtifactRef::new(&key.group_id, &key.artifact_id, project.version()).with_type("pom");
        if filtered.shift_remove(&own).is_some() {
            debug!("Removed reactor self-reference {own} from overrides");
        }
    }
    filtered
}

/// Drop every override whose coordinate is covered by `target`, which may
/// contain wildcards.
pub fn remove_ga(overrides: &mut VersionOverrideMap, target: &ProjectRef) {
    overrides.retain(|key, _| !target.matches(&key.as_project_ref()));
}

/// Apply the scoping rules for `module`. Module-specific rules run first;
/// `@*` rules only act on targets no module-specific rule claimed.
pub fn scope_overrides(
    module: &ProjectRef,
    rules: &[ScopingRule],
    overrides: &VersionOverrideMap,
    extra_boms: &ExtraBoms,
) -> Result<ScopedOverrides, AlignError> {
    let mut scoped = ScopedOverrides {
        overrides: overrides.clone(),
        explicit: ExplicitOverrides::new(),
    };

    for rule in rules.iter().filter(|r| r.selector.matches(module)) {
        apply_rule(module, rule, &mut scoped, extra_boms)?;
    }

    for rule in rules.iter().filter(|r| r.selector.is_all()) {
        if scoped.explicit.contains_key(&rule.target) {
            debug!(
                "{module}: module-specific override for {} takes precedence over {}",
                rule.target, rule.key
            );
            continue;
        }
        apply_rule(module, rule, &mut scoped, extra_boms)?;
    }

    debug!(
        "{module}: {} overrides and {} explicit overrides after scoping",
        scoped.overrides.len(),
        scoped.explicit.len()
    );
    Ok(scoped)
}

fn apply_rule(
    module: &ProjectRef,
    rule: &ScopingRule,
    scoped: &mut ScopedOverrides,
    extra_boms: &ExtraBoms,
) -> Result<(), AlignError> {
    match rule.action {
        RuleAction::Suppress => {
            debug!("{module}: ignoring overrides for {} ({})", rule.target, rule.key);
            remove_ga(&mut scoped.overrides, &rule.target);
        }
        RuleAction::BomReference(ref name) => {
            let version = extra_boms
                .get(name)
                .and_then(|bom| bom.get(&rule.target))
                .ok_or_else(|| AlignError::Config {
                    message: format!(
                        "Extra BOM '{name}' does not define a version for {} (rule {})",
                        rule.target, rule.key
                    ),
                })?;
            debug!("{module}: forcing {} to {version} from extra BOM {name}", rule.target);
            scoped
                .explicit
                .insert(rule.target.clone(), vec![Directive::Version(version.clone())]);
        }
        RuleAction::Directives(ref directives) => {
            debug!("{module}: explicit override for {} ({})", rule.target, rule.key);
            scoped.explicit.insert(rule.target.clone(), directives.clone());
        }
    }
    Ok(())
}
