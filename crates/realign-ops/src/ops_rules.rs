//! Operation: show how the module-scoping rules resolve for each module.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use realign_core::config::AlignmentConfig;
use realign_core::coordinate::VersionOverrideMap;
use realign_core::project::ProjectTree;
use realign_engine::rules::{parse_rules, RuleAction};
use realign_engine::scope::{scope_overrides, ExtraBoms};
use realign_maven::reactor::load_reactor;
use realign_util::errors::AlignError;
use realign_util::progress;

use crate::ops_align::{load_config, load_extra_boms};

/// Options for `realign rules`.
#[derive(Debug, Default)]
pub struct RulesOptions {
    pub config: Option<PathBuf>,
    pub extra_boms: Vec<(String, PathBuf)>,
    pub user_properties: BTreeMap<String, String>,
}

/// The rules in effect for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRules {
    pub module: String,
    /// Target and the comma-joined directives forced on it.
    pub explicit: Vec<(String, String)>,
    /// Targets whose overrides are suppressed.
    pub suppressed: Vec<String>,
}

/// Resolve the configured rules for every module of `tree`.
pub fn describe_rules(
    tree: &ProjectTree,
    config: &AlignmentConfig,
    extra_boms: &ExtraBoms,
) -> Result<Vec<ModuleRules>, AlignError> {
    let rules = parse_rules(&config.dependency_exclusions, |name| {
        extra_boms.contains_key(name)
    })?;

    let mut modules = Vec::with_capacity(tree.len());
    for project in &tree.projects {
        let key = project.key();
        let scoped = scope_overrides(&key, &rules, &VersionOverrideMap::new(), extra_boms)?;

        let explicit = scoped
            .explicit
            .iter()
            .map(|(target, directives)| {
                let joined: Vec<String> = directives.iter().map(ToString::to_string).collect();
                (target.to_string(), joined.join(","))
            })
            .collect();

        let suppressed = rules
            .iter()
            .filter(|r| r.action == RuleAction::Suppress)
            .filter(|r| {
                r.selector.matches(&key)
                    || (r.selector.is_all() && !scoped.explicit.contains_key(&r.target))
            })
            .map(|r| r.target.to_string())
            .collect();

        modules.push(ModuleRules {
            module: key.to_string(),
            explicit,
            suppressed,
        });
    }
    Ok(modules)
}

/// `realign rules`: print the resolved rules per module.
pub fn rules(root: &Path, opts: &RulesOptions) -> miette::Result<()> {
    let config = load_config(root, opts.config.as_deref(), &opts.user_properties)?;
    let tree = load_reactor(root)?;
    let extra_boms = load_extra_boms(&opts.extra_boms)?;

    if config.dependency_exclusions.is_empty() {
        progress::status_info("Rules", "no module-scoping rules configured");
        return Ok(());
    }

    for module in describe_rules(&tree, &config, &extra_boms)? {
        println!("{}", module.module);
        if module.explicit.is_empty() && module.suppressed.is_empty() {
            println!("  (no rules apply)");
        }
        for (target, value) in &module.explicit {
            println!("  force    {target} = {value}");
        }
        for target in &module.suppressed {
            println!("  suppress {target}");
        }
    }
    Ok(())
}
