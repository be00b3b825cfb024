//! POM file parsing into the core [`Model`]: coordinates, parent reference,
//! properties, dependencies, dependency management, profiles, repositories
//! and the presence of a reporting section.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use realign_core::model::{Dependency, Exclusion, Model, ParentRef, Profile, Repository};
use realign_util::errors::AlignError;

/// Read and parse a POM file from disk.
pub fn read_pom(path: &Path) -> miette::Result<Model> {
    let xml = std::fs::read_to_string(path).map_err(|e| AlignError::Descriptor {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;
    parse_pom(&xml).map_err(|e| {
        AlignError::Descriptor {
            message: format!("{}: {e}", path.display()),
        }
        .into()
    })
}

/// Which list a dependency being parsed will land in.
#[derive(Clone, Copy, PartialEq)]
enum DepTarget {
    Direct,
    Managed,
}

/// Which list a repository being parsed will land in.
#[derive(Clone, Copy, PartialEq)]
enum RepoTarget {
    Repository,
    PluginRepository,
}

const PROFILE_PREFIX: &str = "project>profiles>profile";

/// Split an element path into "inside a profile?" and the path relative to
/// the owning `<project>` or `<profile>`.
fn scope_of(ctx: &str) -> (bool, &str) {
    if let Some(rest) = ctx.strip_prefix(PROFILE_PREFIX) {
        (true, rest.strip_prefix('>').unwrap_or(rest))
    } else {
        (false, ctx.strip_prefix("project>").unwrap_or(""))
    }
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

/// Parse a POM XML string into a [`Model`].
pub fn parse_pom(xml: &str) -> Result<Model, AlignError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut model = Model::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    let mut current_dep: Option<(DepTarget, Dependency)> = None;
    let mut current_exclusion: Option<Exclusion> = None;
    let mut current_parent: Option<ParentRef> = None;
    let mut current_repo: Option<(RepoTarget, Repository)> = None;
    let mut current_profile: Option<Profile> = None;

    loop {
        let event = reader.read_event().map_err(|e| AlignError::Descriptor {
            message: format!("Failed to parse POM XML: {e}"),
        })?;
        // Self-closing elements are handled as an open immediately followed
        // by a close with empty text.
        let (start, end, tag) = match event {
            Event::Start(ref e) => (true, false, Some(tag_name(e))),
            Event::Empty(ref e) => (true, true, Some(tag_name(e))),
            Event::End(_) => (false, true, None),
            Event::Text(ref e) => {
                text_buf = e.unescape().map(|t| t.to_string()).unwrap_or_default();
                continue;
            }
            Event::CData(ref e) => {
                text_buf = String::from_utf8_lossy(e).to_string();
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        if start {
            if let Some(tag) = tag {
                path.push(tag);
            }
            text_buf.clear();
            let ctx = path.join(">");
            let (in_profile, rel) = scope_of(&ctx);

            match rel {
                "dependencies>dependency" => {
                    current_dep = Some((DepTarget::Direct, Dependency::default()));
                }
                "dependencyManagement>dependencies>dependency" => {
                    current_dep = Some((DepTarget::Managed, Dependency::default()));
                }
                "repositories>repository" => {
                    current_repo = Some((RepoTarget::Repository, empty_repo()));
                }
                "pluginRepositories>pluginRepository" => {
                    current_repo = Some((RepoTarget::PluginRepository, empty_repo()));
                }
                "reporting" => match current_profile {
                    Some(ref mut profile) if in_profile => profile.has_reporting = true,
                    _ => model.has_reporting = true,
                },
                _ if rel.ends_with(">exclusions>exclusion") && current_dep.is_some() => {
                    current_exclusion = Some(Exclusion {
                        group_id: String::new(),
                        artifact_id: String::new(),
                    });
                }
                _ if ctx == "project>parent" => {
                    current_parent = Some(ParentRef {
                        group_id: String::new(),
                        artifact_id: String::new(),
                        version: String::new(),
                        relative_path: None,
                    });
                }
                _ if ctx == PROFILE_PREFIX => {
                    current_profile = Some(Profile::default());
                }
                _ => {}
            }
        }

        if !end {
            continue;
        }

        let ctx = path.join(">");
        let (in_profile, rel) = scope_of(&ctx);
        let leaf = path.last().map(String::as_str).unwrap_or_default();
        let text = std::mem::take(&mut text_buf);

        if let Some(name) = rel.strip_prefix("properties>") {
            if !name.contains('>') {
                match current_profile {
                    Some(ref mut profile) if in_profile => {
                        profile.properties.insert(name.to_string(), text.clone());
                    }
                    _ => {
                        model.properties.insert(name.to_string(), text.clone());
                    }
                }
            }
        }

        if let Some(ref mut excl) = current_exclusion {
            match leaf {
                "groupId" => excl.group_id = text.clone(),
                "artifactId" => excl.artifact_id = text.clone(),
                _ => {}
            }
            if rel.ends_with(">exclusions>exclusion") {
                if let (Some(excl), Some((_, dep))) = (current_exclusion.take(), current_dep.as_mut())
                {
                    dep.exclusions.push(excl);
                }
            }
        } else if let Some((target, ref mut dep)) = current_dep {
            if rel.ends_with(&format!(">dependency>{leaf}")) {
                match leaf {
                    "groupId" => dep.group_id = text.clone(),
                    "artifactId" => dep.artifact_id = text.clone(),
                    "version" => dep.version = Some(text.clone()),
                    "type" => dep.type_ = Some(text.clone()),
                    "classifier" => dep.classifier = Some(text.clone()).filter(|c| !c.is_empty()),
                    "scope" => dep.scope = Some(text.clone()),
                    "optional" => dep.optional = text.trim() == "true",
                    _ => {}
                }
            }
            if rel == "dependencies>dependency"
                || rel == "dependencyManagement>dependencies>dependency"
            {
                if let Some((_, dep)) = current_dep.take() {
                    let list = match (current_profile.as_mut(), in_profile, target) {
                        (Some(p), true, DepTarget::Direct) => &mut p.dependencies,
                        (Some(p), true, DepTarget::Managed) => &mut p.dependency_management,
                        (_, _, DepTarget::Direct) => &mut model.dependencies,
                        (_, _, DepTarget::Managed) => &mut model.dependency_management,
                    };
                    list.push(dep);
                }
            }
        }

        if let Some((target, ref mut repo)) = current_repo {
            match leaf {
                "id" => repo.id = text.clone(),
                "url" => repo.url = text.clone(),
                _ => {}
            }
            if rel == "repositories>repository" || rel == "pluginRepositories>pluginRepository" {
                if let Some((_, repo)) = current_repo.take() {
                    let list = match (current_profile.as_mut(), in_profile, target) {
                        (Some(p), true, RepoTarget::Repository) => &mut p.repositories,
                        (Some(p), true, RepoTarget::PluginRepository) => {
                            &mut p.plugin_repositories
                        }
                        (_, _, RepoTarget::Repository) => &mut model.repositories,
                        (_, _, RepoTarget::PluginRepository) => &mut model.plugin_repositories,
                    };
                    list.push(repo);
                }
            }
        }

        if let Some(ref mut parent) = current_parent {
            match ctx.as_str() {
                "project>parent>groupId" => parent.group_id = text.clone(),
                "project>parent>artifactId" => parent.artifact_id = text.clone(),
                "project>parent>version" => parent.version = text.clone(),
                "project>parent>relativePath" => parent.relative_path = Some(text.clone()),
                _ => {}
            }
        }
        if ctx == "project>parent" {
            model.parent = current_parent.take();
        }

        if in_profile && rel == "id" {
            if let Some(ref mut profile) = current_profile {
                profile.id = text.clone();
            }
        }
        if ctx == PROFILE_PREFIX {
            if let Some(profile) = current_profile.take() {
                model.profiles.push(profile);
            }
        }

        if path.len() == 2 {
            match leaf {
                "groupId" => model.group_id = Some(text.clone()),
                "artifactId" => model.artifact_id = Some(text.clone()),
                "version" => model.version = Some(text.clone()),
                "packaging" => model.packaging = Some(text.clone()),
                _ => {}
            }
        }

        if ctx == "project>modules>module" {
            model.modules.push(text);
        }

        path.pop();
    }

    Ok(model)
}

fn empty_repo() -> Repository {
    Repository {
        id: String::new(),
        url: String::new(),
    }
}
