//! Before/after comparison of an aligned tree, for reporting.

use std::fmt;

use serde::Serialize;
use tracing::info;

use indexmap::IndexMap;

use realign_core::model::Dependency;
use realign_core::project::{Project, ProjectTree};

/// Everything alignment changed, grouped by project.
#[derive(Debug, Default, Serialize)]
pub struct AlignmentReport {
    pub projects: Vec<ProjectReport>,
}

#[derive(Debug, Default, Serialize)]
pub struct ProjectReport {
    /// `group:artifact` of the project.
    pub project: String,
    pub version: Option<ValueChange>,
    pub parent: Option<ValueChange>,
    pub properties: Vec<PropertyChange>,
    pub sections: Vec<SectionReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueChange {
    pub old: Option<String>,
    pub new: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyChange {
    pub name: String,
    /// Id of the declaring profile; `None` for the model's own properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(flatten)]
    pub change: ValueChange,
}

#[derive(Debug, Default, Serialize)]
pub struct SectionReport {
    pub section: String,
    pub changed: Vec<DependencyChange>,
    /// Dependencies that kept their version; only filled when reporting
    /// non-aligned dependencies.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unchanged: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyChange {
    /// `group:artifact:type[:classifier]`.
    pub dependency: String,
    #[serde(flatten)]
    pub change: ValueChange,
}

impl AlignmentReport {
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Number of dependency versions that changed across all projects.
    pub fn dependency_changes(&self) -> usize {
        self.projects
            .iter()
            .flat_map(|p| &p.sections)
            .map(|s| s.changed.len())
            .sum()
    }

    /// Number of dependencies reported as not aligned.
    pub fn non_aligned(&self) -> usize {
        self.projects
            .iter()
            .flat_map(|p| &p.sections)
            .map(|s| s.unchanged.len())
            .sum()
    }
}

impl ProjectReport {
    fn is_empty(&self) -> bool {
        self.version.is_none()
            && self.parent.is_none()
            && self.properties.is_empty()
            && self.sections.is_empty()
    }
}

/// Compare `original` and `aligned` project by project. Projects are paired
/// by `group:artifact`; dependencies by group, artifact, type and
/// classifier within the same section.
pub fn compare(
    original: &ProjectTree,
    aligned: &ProjectTree,
    report_non_aligned: bool,
) -> AlignmentReport {
    let mut report = AlignmentReport::default();
    for after in &aligned.projects {
        let key = after.key();
        let Some(before) = original.projects.iter().find(|p| p.key() == key) else {
            continue;
        };
        let project = compare_project(before, after, report_non_aligned);
        if !project.is_empty() {
            report.projects.push(project);
        }
    }
    report
}

fn compare_project(before: &Project, after: &Project, report_non_aligned: bool) -> ProjectReport {
    let name = after.key().to_string();
    let mut report = ProjectReport {
        project: name.clone(),
        ..Default::default()
    };

    if before.model.version != after.model.version {
        info!(
            "{name}: project version {:?} -> {:?}",
            before.model.version, after.model.version
        );
        report.version = Some(ValueChange {
            old: before.model.version.clone(),
            new: after.model.version.clone(),
        });
    }

    let old_parent = before.model.parent.as_ref().map(|p| p.version.clone());
    let new_parent = after.model.parent.as_ref().map(|p| p.version.clone());
    if old_parent != new_parent {
        info!("{name}: parent version {old_parent:?} -> {new_parent:?}");
        report.parent = Some(ValueChange {
            old: old_parent,
            new: new_parent,
        });
    }

    report.properties = compare_properties(
        &name,
        None,
        &before.model.properties,
        &after.model.properties,
    );
    for profile in &after.model.profiles {
        let Some(old) = before.model.profiles.iter().find(|p| p.id == profile.id) else {
            continue;
        };
        report.properties.extend(compare_properties(
            &name,
            Some(&profile.id),
            &old.properties,
            &profile.properties,
        ));
    }

    for section in after.sections() {
        let label = section.to_string();
        let s = compare_section(
            &name,
            &label,
            before.section(section),
            after.section(section),
            report_non_aligned,
        );
        if !s.changed.is_empty() || !s.unchanged.is_empty() {
            report.sections.push(s);
        }
    }
    report
}

fn compare_properties(
    name: &str,
    profile: Option<&str>,
    before: &IndexMap<String, String>,
    after: &IndexMap<String, String>,
) -> Vec<PropertyChange> {
    after
        .iter()
        .filter_map(|(key, value)| {
            let old = before.get(key);
            if old == Some(value) {
                return None;
            }
            match profile {
                Some(id) => info!("{name}: profile {id}: property {key} {old:?} -> {value}"),
                None => info!("{name}: property {key} {old:?} -> {value}"),
            }
            Some(PropertyChange {
                name: key.clone(),
                profile: profile.map(str::to_string),
                change: ValueChange {
                    old: old.cloned(),
                    new: Some(value.clone()),
                },
            })
        })
        .collect()
}

fn compare_section(
    name: &str,
    label: &str,
    before: &[Dependency],
    after: &[Dependency],
    report_non_aligned: bool,
) -> SectionReport {
    let mut report = SectionReport {
        section: label.to_string(),
        ..Default::default()
    };
    let mut used = vec![false; before.len()];

    for dep in after {
        let id = identity(dep);
        let matched = before
            .iter()
            .enumerate()
            .find(|(i, d)| !used[*i] && id == identity(d));
        let old = match matched {
            Some((i, d)) => {
                used[i] = true;
                d.version.clone()
            }
            None => None,
        };
        if old != dep.version {
            info!("{name}: {label}: {id} {old:?} -> {:?}", dep.version);
            report.changed.push(DependencyChange {
                dependency: id,
                change: ValueChange {
                    old,
                    new: dep.version.clone(),
                },
            });
        } else if report_non_aligned {
            info!("{name}: {label}: {id} not aligned ({})", dep.version_str());
            report.unchanged.push(id);
        }
    }
    report
}

fn identity(dep: &Dependency) -> String {
    let mut s = format!("{}:{}:{}", dep.group_id, dep.artifact_id, dep.type_or_default());
    if let Some(ref c) = dep.classifier {
        s.push(':');
        s.push_str(c);
    }
    s
}

fn show(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("<none>")
}

impl fmt::Display for AlignmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.projects.is_empty() {
            return writeln!(f, "No changes.");
        }
        for p in &self.projects {
            writeln!(f, "{}", p.project)?;
            if let Some(ref v) = p.version {
                writeln!(f, "  version {} -> {}", show(&v.old), show(&v.new))?;
            }
            if let Some(ref v) = p.parent {
                writeln!(f, "  parent {} -> {}", show(&v.old), show(&v.new))?;
            }
            for prop in &p.properties {
                let scope = match prop.profile {
                    Some(ref id) => format!(" (profile {id})"),
                    None => String::new(),
                };
                writeln!(
                    f,
                    "  property {}{scope} {} -> {}",
                    prop.name,
                    show(&prop.change.old),
                    show(&prop.change.new)
                )?;
            }
            for s in &p.sections {
                writeln!(f, "  {}:", s.section)?;
                for c in &s.changed {
                    writeln!(
                        f,
                        "    {} {} -> {}",
                        c.dependency,
                        show(&c.change.old),
                        show(&c.change.new)
                    )?;
                }
                for u in &s.unchanged {
                    writeln!(f, "    {u} (not aligned)")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use realign_core::model::{Model, Profile};

    fn tree(deps: Vec<Dependency>, version: &str) -> ProjectTree {
        let model = Model {
            group_id: Some("org.foo".into()),
            artifact_id: Some("app".into()),
            version: Some("1.0".into()),
            properties: [("v".to_string(), version.to_string())].into_iter().collect(),
            dependencies: deps,
            ..Default::default()
        };
        ProjectTree::build(vec![Project::new("pom.xml", model)]).unwrap()
    }

    #[test]
    fn identical_trees_report_nothing() {
        let t = tree(vec![Dependency::new("g", "a", Some("1.0"))], "1.0");
        let report = compare(&t, &t, false);
        assert!(report.is_empty());
        assert_eq!(report.to_string(), "No changes.\n");
    }

    #[test]
    fn reports_dependency_and_property_changes() {
        let before = tree(
            vec![
                Dependency::new("g", "a", Some("1.0")),
                Dependency::new("g", "b", Some("2.0")),
            ],
            "1.0",
        );
        let after = tree(
            vec![
                Dependency::new("g", "a", Some("1.0.redhat-1")),
                Dependency::new("g", "b", Some("2.0")),
            ],
            "1.0.redhat-1",
        );

        let report = compare(&before, &after, false);
        assert_eq!(report.dependency_changes(), 1);
        let p = &report.projects[0];
        assert_eq!(p.properties[0].name, "v");
        assert_eq!(p.sections[0].section, "Dependencies");
        assert_eq!(p.sections[0].changed[0].dependency, "g:a:jar");
        assert!(p.sections[0].unchanged.is_empty());

        let report = compare(&before, &after, true);
        assert_eq!(report.projects[0].sections[0].unchanged, vec!["g:b:jar"]);
        assert_eq!(report.non_aligned(), 1);
        assert!(report.to_string().contains("g:a:jar 1.0 -> 1.0.redhat-1"));
    }

    #[test]
    fn reports_profile_property_changes() {
        let with_profile = |value: &str| {
            let model = Model {
                group_id: Some("org.foo".into()),
                artifact_id: Some("app".into()),
                version: Some("1.0".into()),
                profiles: vec![Profile {
                    id: "p".into(),
                    properties: [("v".to_string(), value.to_string())].into_iter().collect(),
                    ..Default::default()
                }],
                ..Default::default()
            };
            ProjectTree::build(vec![Project::new("pom.xml", model)]).unwrap()
        };

        let report = compare(&with_profile("1.0"), &with_profile("1.0.redhat-1"), false);
        assert!(!report.is_empty());
        let change = &report.projects[0].properties[0];
        assert_eq!(change.name, "v");
        assert_eq!(change.profile.as_deref(), Some("p"));
        assert_eq!(change.change.new.as_deref(), Some("1.0.redhat-1"));
        assert!(report
            .to_string()
            .contains("property v (profile p) 1.0 -> 1.0.redhat-1"));
    }
}
