//! The build descriptor model the alignment engine mutates.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::coordinate::{ArtifactRef, ProjectRef, DEFAULT_TYPE};

/// A declared dependency. Owned by exactly one list of one model; the engine
/// rewrites `version` and appends to `exclusions` in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    /// Literal, `${property}`, or a mix of both. `None` when the version is
    /// inherited from dependency management.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
}

impl Dependency {
    pub fn new(group_id: &str, artifact_id: &str, version: Option<&str>) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn project_ref(&self) -> ProjectRef {
        ProjectRef::new(&self.group_id, &self.artifact_id)
    }

    pub fn type_or_default(&self) -> &str {
        self.type_.as_deref().unwrap_or(DEFAULT_TYPE)
    }

    /// Key identifying this dependency, carrying the given resolved version.
    pub fn management_key(&self, resolved_version: &str) -> ArtifactRef {
        ArtifactRef::new(&self.group_id, &self.artifact_id, resolved_version)
            .with_type(self.type_or_default())
            .with_classifier(self.classifier.clone())
    }

    /// Version string, empty when none is declared.
    pub fn version_str(&self) -> &str {
        self.version.as_deref().unwrap_or("")
    }

    pub fn add_exclusion(&mut self, exclusion: Exclusion) {
        if !self.exclusions.contains(&exclusion) {
            self.exclusions.push(exclusion);
        }
    }
}

/// A transitive dependency excluded from a declared dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

impl From<&ProjectRef> for Exclusion {
    fn from(pr: &ProjectRef) -> Self {
        Self {
            group_id: pr.group_id.clone(),
            artifact_id: pr.artifact_id.clone(),
        }
    }
}

/// Reference to a parent descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default)]
    pub relative_path: Option<String>,
}

impl ParentRef {
    pub fn project_ref(&self) -> ProjectRef {
        ProjectRef::new(&self.group_id, &self.artifact_id)
    }
}

/// A remote repository declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub url: String,
}

/// A conditionally activated block of declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub properties: IndexMap<String, String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub dependency_management: Vec<Dependency>,
    #[serde(default)]
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub plugin_repositories: Vec<Repository>,
    #[serde(default)]
    pub has_reporting: bool,
}

/// A parsed build descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ParentRef>,
    #[serde(default)]
    pub properties: IndexMap<String, String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub dependency_management: Vec<Dependency>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub plugin_repositories: Vec<Repository>,
    #[serde(default)]
    pub has_reporting: bool,
}

impl Model {
    /// Effective group ID (falls back to parent).
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Effective version (falls back to parent).
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    pub fn project_ref(&self) -> ProjectRef {
        ProjectRef::new(
            self.effective_group_id().unwrap_or_default(),
            self.artifact_id.as_deref().unwrap_or_default(),
        )
    }
}
