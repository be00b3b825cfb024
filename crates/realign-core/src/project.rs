//! Projects (build units) and the ordered module tree they live in.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use realign_util::errors::AlignError;

use crate::coordinate::ProjectRef;
use crate::model::{Dependency, Model};

/// Maximum number of nested `${...}` expansions before giving up.
const MAX_INTERPOLATION_DEPTH: usize = 20;

/// One module of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    /// Location of the descriptor this project was loaded from.
    pub path: PathBuf,
    pub model: Model,
    /// Indices into the owning [`ProjectTree`] from the tree root (index 0)
    /// down to this project (last).
    pub inherited: Vec<usize>,
    /// True when the parent of this project (if any) is outside the tree.
    pub inheritance_root: bool,
}

impl Project {
    pub fn new(path: impl Into<PathBuf>, model: Model) -> Self {
        Self {
            path: path.into(),
            model,
            inherited: Vec::new(),
            inheritance_root: true,
        }
    }

    pub fn key(&self) -> ProjectRef {
        self.model.project_ref()
    }

    pub fn version(&self) -> &str {
        self.model.effective_version().unwrap_or_default()
    }

    /// Index of the tree root this project inherits from.
    pub fn root_index(&self) -> Option<usize> {
        self.inherited.first().copied()
    }

    /// Every dependency list of this project, in processing order: managed,
    /// direct, then each profile's direct and each profile's managed list.
    pub fn sections(&self) -> Vec<DependencySection> {
        let mut sections = vec![DependencySection::Managed, DependencySection::Direct];
        sections.extend((0..self.model.profiles.len()).map(DependencySection::Profile));
        sections.extend((0..self.model.profiles.len()).map(DependencySection::ProfileManaged));
        sections
    }

    pub fn section(&self, section: DependencySection) -> &[Dependency] {
        match section {
            DependencySection::Managed => &self.model.dependency_management,
            DependencySection::Direct => &self.model.dependencies,
            DependencySection::Profile(i) => self
                .model
                .profiles
                .get(i)
                .map(|p| p.dependencies.as_slice())
                .unwrap_or_default(),
            DependencySection::ProfileManaged(i) => self
                .model
                .profiles
                .get(i)
                .map(|p| p.dependency_management.as_slice())
                .unwrap_or_default(),
        }
    }

    pub fn section_mut(&mut self, section: DependencySection) -> Option<&mut Vec<Dependency>> {
        match section {
            DependencySection::Managed => Some(&mut self.model.dependency_management),
            DependencySection::Direct => Some(&mut self.model.dependencies),
            DependencySection::Profile(i) => {
                self.model.profiles.get_mut(i).map(|p| &mut p.dependencies)
            }
            DependencySection::ProfileManaged(i) => self
                .model
                .profiles
                .get_mut(i)
                .map(|p| &mut p.dependency_management),
        }
    }

    fn builtin_property(&self, key: &str) -> Option<String> {
        match key {
            "project.groupId" | "pom.groupId" => {
                self.model.effective_group_id().map(str::to_string)
            }
            "project.artifactId" | "pom.artifactId" => self.model.artifact_id.clone(),
            "project.version" | "pom.version" => {
                self.model.effective_version().map(str::to_string)
            }
            "project.parent.groupId" => self.model.parent.as_ref().map(|p| p.group_id.clone()),
            "project.parent.version" => self.model.parent.as_ref().map(|p| p.version.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key(), self.version())
    }
}

/// Which dependency list of a project a pass operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencySection {
    Managed,
    Direct,
    /// Direct dependencies of the profile at this index.
    Profile(usize),
    /// Managed dependencies of the profile at this index.
    ProfileManaged(usize),
}

impl fmt::Display for DependencySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencySection::Managed => write!(f, "Managed dependencies"),
            DependencySection::Direct => write!(f, "Dependencies"),
            DependencySection::Profile(i) => write!(f, "Profile dependencies [{i}]"),
            DependencySection::ProfileManaged(i) => {
                write!(f, "Profile managed dependencies [{i}]")
            }
        }
    }
}

/// The module tree, ordered so every parent comes before its children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectTree {
    pub projects: Vec<Project>,
}

impl ProjectTree {
    /// Link projects through their parent references and order them
    /// root-first. Parents outside the given set are ignored.
    pub fn build(projects: Vec<Project>) -> Result<Self, AlignError> {
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..projects.len()).map(|i| graph.add_node(i)).collect();

        let by_key: HashMap<ProjectRef, usize> = projects
            .iter()
            .enumerate()
            .map(|(i, p)| (p.key(), i))
            .collect();

        let mut parent_of: Vec<Option<usize>> = vec![None; projects.len()];
        for (i, project) in projects.iter().enumerate() {
            let Some(ref parent) = project.model.parent else {
                continue;
            };
            if let Some(&p) = by_key.get(&parent.project_ref()) {
                if p != i {
                    graph.add_edge(nodes[p], nodes[i], ());
                    parent_of[i] = Some(p);
                }
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| AlignError::Descriptor {
            message: format!(
                "Parent cycle detected involving {}",
                projects[graph[cycle.node_id()]].key()
            ),
        })?;

        // Original index -> sorted position.
        let mut position = vec![0usize; projects.len()];
        for (pos, node) in order.iter().enumerate() {
            position[graph[*node]] = pos;
        }

        let mut slots: Vec<Option<Project>> = projects.into_iter().map(Some).collect();
        let mut sorted = Vec::with_capacity(slots.len());
        for node in &order {
            let original = graph[*node];
            let Some(mut project) = slots[original].take() else {
                continue;
            };

            let mut chain = vec![position[original]];
            let mut cursor = parent_of[original];
            while let Some(p) = cursor {
                chain.push(position[p]);
                cursor = parent_of[p];
            }
            chain.reverse();

            project.inheritance_root = parent_of[original].is_none();
            project.inherited = chain;
            sorted.push(project);
        }

        Ok(Self { projects: sorted })
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Project> {
        self.projects.get(index)
    }

    pub fn find(&self, key: &ProjectRef) -> Option<usize> {
        self.projects.iter().position(|p| &p.key() == key)
    }

    /// Look up a property for the project at `index`: built-in `project.*`
    /// names first, then the declared properties of the project and its
    /// ancestors, nearest first.
    pub fn property(&self, index: usize, key: &str) -> Option<String> {
        let project = self.projects.get(index)?;
        if let Some(v) = project.builtin_property(key) {
            return Some(v);
        }
        project
            .inherited
            .iter()
            .rev()
            .filter_map(|&i| self.projects.get(i))
            .find_map(|p| p.model.properties.get(key).cloned())
    }

    /// Resolve `${property}` references in `input` in the context of the
    /// project at `index`. Unknown references are left in place.
    pub fn interpolate(&self, index: usize, input: &str) -> String {
        let mut result = input.to_string();
        for _ in 0..MAX_INTERPOLATION_DEPTH {
            if !result.contains("${") {
                break;
            }
            let mut next = String::with_capacity(result.len());
            let mut rest = result.as_str();
            while let Some(start) = rest.find("${") {
                let Some(end) = rest[start..].find('}') else {
                    break;
                };
                let key = &rest[start + 2..start + end];
                next.push_str(&rest[..start]);
                match self.property(index, key) {
                    Some(value) => next.push_str(&value),
                    None => next.push_str(&rest[start..=start + end]),
                }
                rest = &rest[start + end + 1..];
            }
            next.push_str(rest);
            if next == result {
                break;
            }
            result = next;
        }
        result
    }

    /// Fully resolved version of every dependency in one section, empty
    /// where no version is declared.
    pub fn resolved_versions(&self, index: usize, section: DependencySection) -> Vec<String> {
        let Some(project) = self.projects.get(index) else {
            return Vec::new();
        };
        project
            .section(section)
            .iter()
            .map(|d| match d.version {
                Some(ref v) => self.interpolate(index, v),
                None => String::new(),
            })
            .collect()
    }
}
