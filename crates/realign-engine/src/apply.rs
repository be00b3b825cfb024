//! Rewriting the versions of one dependency list.

use tracing::{debug, info, warn};

use realign_core::config::AlignmentConfig;
use realign_core::coordinate::VersionOverrideMap;
use realign_core::model::{Dependency, Exclusion};
use realign_core::project::ProjectTree;
use realign_core::properties::{contains_reference, PROJECT_VERSION_REF};
use realign_core::version::check_strict_value;
use realign_util::errors::AlignError;

use crate::rules::Directive;
use crate::scope::ExplicitOverrides;
use crate::tracker::PropertyTracker;

/// The module a dependency list belongs to.
#[derive(Debug, Clone)]
pub struct Unit {
    pub index: usize,
    pub version: String,
}

impl Unit {
    pub fn of(tree: &ProjectTree, index: usize) -> Self {
        Self {
            index,
            version: tree
                .get(index)
                .map(|p| p.version().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Apply the computed overrides to `deps`. `resolved[i]` is the fully
/// interpolated version of `deps[i]`. Returns the overrides that matched
/// nothing.
///
/// When several overrides share a coordinate they are applied in map
/// order, so outside strict mode the last one wins.
pub fn apply_overrides(
    unit: &Unit,
    deps: &mut [Dependency],
    resolved: &[String],
    explicit: &ExplicitOverrides,
    overrides: &VersionOverrideMap,
    config: &AlignmentConfig,
    tracker: &mut PropertyTracker,
) -> Result<VersionOverrideMap, AlignError> {
    let mut unmatched = overrides.clone();
    let opts = config.strict_options();

    for (dep, resolved) in deps.iter_mut().zip(resolved) {
        let coordinate = dep.project_ref();
        for (key, new_version) in overrides.iter().filter(|(k, _)| k.is(&coordinate)) {
            let old_version = dep.version_str().to_string();

            if new_version.is_empty() {
                warn!("Unable to align with an empty override version for {coordinate}; ignoring");
            } else if old_version.is_empty() {
                debug!("Dependency {coordinate} has a managed version; ignoring");
            } else if old_version == PROJECT_VERSION_REF
                || (old_version.contains('$') && unit.version == *resolved)
            {
                debug!("Dependency {coordinate} ({old_version}) references the project version; skipping");
            } else if explicit.contains_key(&coordinate) {
                debug!("Dependency {coordinate} has an explicit override; skipping the computed one");
                unmatched.shift_remove(key);
            } else if config.strict
                && old_version.contains('$')
                && !check_strict_value(config.strict_matching, resolved, new_version, &opts)
            {
                debug!(
                    "Resolved version {resolved} of {coordinate} does not match override {key} -> {new_version}; ignoring"
                );
                strict_violation(
                    config,
                    format!(
                        "For {coordinate} replacing original property version {old_version} (fully resolved: {resolved}) with new version {new_version} violates the strict version-alignment rule!"
                    ),
                )?;
            } else {
                let cached = tracker.cache_property(
                    unit.index,
                    &old_version,
                    new_version,
                    key,
                    false,
                    config,
                )?;
                if !cached {
                    if config.strict
                        && !check_strict_value(config.strict_matching, resolved, new_version, &opts)
                    {
                        strict_violation(
                            config,
                            format!(
                                "Replacing original version {old_version} in dependency {coordinate} with new version {new_version} violates the strict version-alignment rule!"
                            ),
                        )?;
                    } else {
                        let replacement = if contains_reference(&old_version) {
                            splice_version(&old_version, resolved, new_version, config)
                        } else {
                            new_version.clone()
                        };
                        debug!("Altered dependency {coordinate}: {old_version} -> {replacement}");
                        dep.version = Some(replacement);
                    }
                }
                unmatched.shift_remove(key);
            }
        }
    }

    Ok(unmatched)
}

/// Apply explicit overrides to `deps`: `+group:artifact` tokens add an
/// exclusion, anything else forces the version.
pub fn apply_explicit_overrides(
    unit: &Unit,
    deps: &mut [Dependency],
    explicit: &ExplicitOverrides,
    config: &AlignmentConfig,
    tracker: &mut PropertyTracker,
) -> Result<(), AlignError> {
    if explicit.is_empty() {
        return Ok(());
    }
    for dep in deps.iter_mut() {
        let coordinate = dep.project_ref();
        let Some(directives) = explicit.get(&coordinate) else {
            continue;
        };
        let old_version = dep.version_str().to_string();

        if directives.is_empty() {
            warn!("Unable to force align as override version is empty for {coordinate}; ignoring");
            continue;
        }
        if old_version.is_empty() {
            debug!("Unable to force align as no existing version field for {coordinate}; ignoring");
            continue;
        }

        for directive in directives {
            match directive {
                Directive::Exclude(excluded) => {
                    info!("Adding dependency exclusion {excluded} to dependency {coordinate}");
                    dep.add_exclusion(Exclusion::from(excluded));
                }
                Directive::Version(version) => {
                    info!("Explicit overrides: force aligning {coordinate} to {version}");
                    let trigger = dep.management_key(&old_version);
                    if !tracker.cache_property(unit.index, &old_version, version, &trigger, true, config)? {
                        if contains_reference(&old_version) {
                            warn!(
                                "Overriding version with {version} when old version contained a property {old_version}"
                            );
                        }
                        dep.version = Some(version.clone());
                    }
                }
            }
        }
    }
    Ok(())
}

/// Report a strict-alignment violation: fatal when configured so, a
/// warning otherwise.
pub(crate) fn strict_violation(config: &AlignmentConfig, message: String) -> Result<(), AlignError> {
    if config.fail_on_strict_violation {
        return Err(AlignError::StrictViolation { message });
    }
    warn!("{message}");
    Ok(())
}

/// New version for a declaration mixing a property and literal text, such
/// as `${v}.Final`. With the suffix in the old version, the old text before
/// the suffix is kept and the override's tail after the suffix appended.
/// Otherwise whatever the override adds beyond the resolved value is
/// appended.
fn splice_version(old: &str, resolved: &str, new: &str, config: &AlignmentConfig) -> String {
    let suffix = config.version_suffix.as_str();
    if config.strict_ignore_suffix && !suffix.is_empty() {
        if let Some(pos) = old.find(suffix) {
            let after = new
                .find(suffix)
                .map(|p| &new[p + suffix.len()..])
                .unwrap_or_default();
            return format!("{}{suffix}{after}", &old[..pos]);
        }
    }
    format!("{old}{}", new.strip_prefix(resolved).unwrap_or(new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use realign_core::coordinate::{ArtifactRef, ProjectRef};

    fn unit() -> Unit {
        Unit {
            index: 0,
            version: "1.0".into(),
        }
    }

    fn overrides(entries: &[(&str, &str)]) -> VersionOverrideMap {
        entries
            .iter()
            .map(|(k, v)| (ArtifactRef::parse(k).unwrap(), v.to_string()))
            .collect()
    }

    fn run(
        deps: &mut [Dependency],
        resolved: &[&str],
        ov: &VersionOverrideMap,
        config: &AlignmentConfig,
        tracker: &mut PropertyTracker,
    ) -> Result<VersionOverrideMap, AlignError> {
        let resolved: Vec<String> = resolved.iter().map(|s| s.to_string()).collect();
        apply_overrides(&unit(), deps, &resolved, &ExplicitOverrides::new(), ov, config, tracker)
    }

    #[test]
    fn literal_version_is_replaced() {
        let mut deps = vec![Dependency::new("g", "a", Some("1.0"))];
        let ov = overrides(&[("g:a:1.0", "1.0.redhat-1"), ("g:b:1.0", "1.0.redhat-1")]);
        let unmatched = run(
            &mut deps,
            &["1.0"],
            &ov,
            &AlignmentConfig::default(),
            &mut PropertyTracker::new(),
        )
        .unwrap();
        assert_eq!(deps[0].version.as_deref(), Some("1.0.redhat-1"));
        assert_eq!(unmatched.len(), 1);
        assert_eq!(unmatched.first().unwrap().0.artifact_id, "b");
    }

    #[test]
    fn property_version_is_deferred_to_tracker() {
        let mut deps = vec![Dependency::new("g", "a", Some("${a.version}"))];
        let ov = overrides(&[("g:a:1.0", "1.0.redhat-1")]);
        let mut tracker = PropertyTracker::new();
        run(&mut deps, &["1.0"], &ov, &AlignmentConfig::default(), &mut tracker).unwrap();
        assert_eq!(deps[0].version.as_deref(), Some("${a.version}"));
        assert_eq!(tracker.get(0, "a.version").unwrap().new_version, "1.0.redhat-1");
    }

    #[test]
    fn project_version_references_are_left_alone() {
        let mut deps = vec![
            Dependency::new("g", "a", Some("${project.version}")),
            Dependency::new("g", "b", Some("${own.version}")),
            Dependency::new("g", "c", None),
        ];
        let ov = overrides(&[
            ("g:a:1.0", "1.0.redhat-1"),
            ("g:b:1.0", "1.0.redhat-1"),
            ("g:c:1.0", "1.0.redhat-1"),
        ]);
        let mut tracker = PropertyTracker::new();
        let unmatched =
            run(&mut deps, &["1.0", "1.0", ""], &ov, &AlignmentConfig::default(), &mut tracker)
                .unwrap();
        assert_eq!(deps[0].version.as_deref(), Some("${project.version}"));
        assert_eq!(deps[1].version.as_deref(), Some("${own.version}"));
        assert_eq!(deps[2].version, None);
        assert!(tracker.is_empty());
        assert_eq!(unmatched.len(), 3);
    }

    #[test]
    fn strict_mismatch_warns_or_fails() {
        let ov = overrides(&[("g:a:1.0", "1.3.redhat-1")]);
        let warn_only = AlignmentConfig {
            strict: true,
            ..Default::default()
        };
        let mut deps = vec![Dependency::new("g", "a", Some("1.2"))];
        run(&mut deps, &["1.2"], &ov, &warn_only, &mut PropertyTracker::new()).unwrap();
        assert_eq!(deps[0].version.as_deref(), Some("1.2"));

        let failing = AlignmentConfig {
            strict: true,
            fail_on_strict_violation: true,
            ..Default::default()
        };
        let err = run(&mut deps, &["1.2"], &ov, &failing, &mut PropertyTracker::new()).unwrap_err();
        assert!(matches!(err, AlignError::StrictViolation { .. }));
    }

    #[test]
    fn strict_mismatch_on_property_is_not_cached() {
        let ov = overrides(&[("g:a:1.0", "1.3.redhat-1")]);
        let config = AlignmentConfig {
            strict: true,
            ..Default::default()
        };
        let mut deps = vec![Dependency::new("g", "a", Some("${a.version}"))];
        let mut tracker = PropertyTracker::new();
        let unmatched = run(&mut deps, &["1.2"], &ov, &config, &mut tracker).unwrap();
        assert!(tracker.is_empty());
        assert_eq!(unmatched.len(), 1);
    }

    #[test]
    fn mixed_property_versions_are_spliced() {
        let ov = overrides(&[("g:a:1.0", "1.0.Final-redhat-1")]);
        let mut deps = vec![Dependency::new("g", "a", Some("${v}.Final"))];
        run(
            &mut deps,
            &["1.0.Final"],
            &ov,
            &AlignmentConfig::default(),
            &mut PropertyTracker::new(),
        )
        .unwrap();
        assert_eq!(deps[0].version.as_deref(), Some("${v}.Final-redhat-1"));

        let ov = overrides(&[("g:a:1.0", "1.0.redhat-4")]);
        let mut deps = vec![Dependency::new("g", "a", Some("${v}.redhat-1"))];
        run(
            &mut deps,
            &["1.0.redhat-1"],
            &ov,
            &AlignmentConfig::default(),
            &mut PropertyTracker::new(),
        )
        .unwrap();
        assert_eq!(deps[0].version.as_deref(), Some("${v}.redhat-4"));
    }

    #[test]
    fn suffix_splice_needs_ignore_suffix() {
        // Without suffix handling the tail is appended verbatim, since the
        // resolved version is not a prefix of the override.
        let config = AlignmentConfig {
            strict_ignore_suffix: false,
            ..Default::default()
        };
        let ov = overrides(&[("g:a:1.0", "1.0.redhat-4")]);
        let mut deps = vec![Dependency::new("g", "a", Some("${v}.redhat-1"))];
        run(
            &mut deps,
            &["1.0.redhat-1"],
            &ov,
            &config,
            &mut PropertyTracker::new(),
        )
        .unwrap();
        assert_eq!(deps[0].version.as_deref(), Some("${v}.redhat-11.0.redhat-4"));

        let ov = overrides(&[("g:a:1.0", "1.0.Final-redhat-1")]);
        let mut deps = vec![Dependency::new("g", "a", Some("${v}.Final"))];
        run(&mut deps, &["1.0.Final"], &ov, &config, &mut PropertyTracker::new()).unwrap();
        assert_eq!(deps[0].version.as_deref(), Some("${v}.Final-redhat-1"));
    }

    #[test]
    fn explicit_override_defers_computed_one() {
        let ov = overrides(&[("g:a:1.0", "1.0.redhat-1")]);
        let mut explicit = ExplicitOverrides::new();
        explicit.insert(ProjectRef::new("g", "a"), vec![Directive::Version("2.0".into())]);
        let mut deps = vec![Dependency::new("g", "a", Some("1.0"))];
        let config = AlignmentConfig::default();
        let mut tracker = PropertyTracker::new();

        let unmatched = apply_overrides(
            &unit(),
            &mut deps,
            &["1.0".to_string()],
            &explicit,
            &ov,
            &config,
            &mut tracker,
        )
        .unwrap();
        assert!(unmatched.is_empty());
        assert_eq!(deps[0].version.as_deref(), Some("1.0"));

        apply_explicit_overrides(&unit(), &mut deps, &explicit, &config, &mut tracker).unwrap();
        assert_eq!(deps[0].version.as_deref(), Some("2.0"));
    }

    #[test]
    fn explicit_directives_apply_in_order() {
        let mut explicit = ExplicitOverrides::new();
        explicit.insert(
            ProjectRef::new("g", "*"),
            vec![
                Directive::Exclude(ProjectRef::new("x", "y")),
                Directive::Version("1.5".into()),
            ],
        );
        let mut deps = vec![
            Dependency::new("g", "a", Some("1.0")),
            Dependency::new("g", "b", Some("${b.version}")),
            Dependency::new("g", "c", None),
        ];
        let mut tracker = PropertyTracker::new();
        apply_explicit_overrides(
            &unit(),
            &mut deps,
            &explicit,
            &AlignmentConfig::default(),
            &mut tracker,
        )
        .unwrap();

        assert_eq!(deps[0].version.as_deref(), Some("1.5"));
        assert_eq!(deps[0].exclusions.len(), 1);
        assert_eq!(deps[0].exclusions[0].artifact_id, "y");
        assert_eq!(deps[1].version.as_deref(), Some("${b.version}"));
        assert_eq!(tracker.get(0, "b.version").unwrap().new_version, "1.5");
        assert_eq!(deps[2].version, None);
        assert!(deps[2].exclusions.is_empty());
    }
}
