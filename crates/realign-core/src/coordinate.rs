use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use realign_util::errors::AlignError;

use crate::WILDCARD;

/// Default artifact type when a dependency does not declare one.
pub const DEFAULT_TYPE: &str = "jar";

/// A `group:artifact` pair: the version-independent identity used for
/// alignment matching. Either segment may be the wildcard `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectRef {
    pub group_id: String,
    pub artifact_id: String,
}

impl ProjectRef {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    /// Parse `"group:artifact"`. Anything other than exactly two non-empty
    /// segments is rejected.
    pub fn parse(s: &str) -> Result<Self, AlignError> {
        let mut parts = s.trim().split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(g), Some(a), None) if !g.is_empty() && !a.is_empty() => Ok(Self::new(g, a)),
            _ => Err(AlignError::InvalidRef {
                value: s.to_string(),
            }),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.group_id == WILDCARD || self.artifact_id == WILDCARD
    }

    /// Whether `other` is covered by this reference, treating `*` in either
    /// of this reference's segments as matching anything.
    pub fn matches(&self, other: &ProjectRef) -> bool {
        let group = self.group_id == WILDCARD || self.group_id == other.group_id;
        let artifact = self.artifact_id == WILDCARD || self.artifact_id == other.artifact_id;
        group && artifact
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// One concrete artifact: coordinate plus type, optional classifier and
/// version. Used as the key of a [`VersionOverrideMap`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(rename = "type", default = "default_type")]
    pub type_: String,
    #[serde(default)]
    pub classifier: Option<String>,
}

fn default_type() -> String {
    DEFAULT_TYPE.to_string()
}

impl ArtifactRef {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            type_: default_type(),
            classifier: None,
        }
    }

    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = type_.into();
        self
    }

    pub fn with_classifier(mut self, classifier: Option<String>) -> Self {
        self.classifier = classifier.filter(|c| !c.is_empty());
        self
    }

    /// Parse `group:artifact[:type[:classifier]]:version`.
    pub fn parse(s: &str) -> Result<Self, AlignError> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(AlignError::InvalidRef {
                value: s.to_string(),
            });
        }
        match parts.as_slice() {
            [g, a, v] => Ok(Self::new(*g, *a, *v)),
            [g, a, t, v] => Ok(Self::new(*g, *a, *v).with_type(*t)),
            [g, a, t, c, v] => {
                Ok(Self::new(*g, *a, *v).with_type(*t).with_classifier(Some(c.to_string())))
            }
            _ => Err(AlignError::InvalidRef {
                value: s.to_string(),
            }),
        }
    }

    pub fn as_project_ref(&self) -> ProjectRef {
        ProjectRef::new(&self.group_id, &self.artifact_id)
    }

    /// Whether this artifact has the given `group:artifact`.
    pub fn is(&self, pr: &ProjectRef) -> bool {
        self.group_id == pr.group_id && self.artifact_id == pr.artifact_id
    }

    /// Identity of the artifact ignoring its version.
    pub fn same_artifact(&self, other: &ArtifactRef) -> bool {
        self.group_id == other.group_id
            && self.artifact_id == other.artifact_id
            && self.type_ == other.type_
            && self.classifier == other.classifier
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.type_)?;
        if let Some(ref c) = self.classifier {
            write!(f, ":{c}")?;
        }
        write!(f, ":{}", self.version)
    }
}

/// Ordered mapping from artifact to desired version. Insertion order is
/// significant: it decides tie-breaks during merging.
pub type VersionOverrideMap = IndexMap<ArtifactRef, String>;

/// Versions keyed by coordinate only, as published by an extra BOM.
pub type ProjectVersionMap = IndexMap<ProjectRef, String>;
