//! Service sources: version recommendations produced by an external
//! service and handed over as a JSON document.
//!
//! Two shapes are accepted:
//!
//! ```json
//! { "org.foo:baz:1.0": "1.0.redhat-1" }
//! ```
//!
//! ```json
//! [ { "groupId": "org.foo", "artifactId": "baz", "version": "1.0",
//!     "newVersion": "1.0.redhat-1" } ]
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use realign_core::coordinate::{ArtifactRef, VersionOverrideMap, DEFAULT_TYPE};
use realign_util::errors::AlignError;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServiceDocument {
    Map(IndexMap<String, String>),
    List(Vec<Recommendation>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Recommendation {
    group_id: String,
    artifact_id: String,
    version: String,
    #[serde(rename = "type", default)]
    type_: Option<String>,
    #[serde(default)]
    classifier: Option<String>,
    new_version: String,
}

/// Read a service document from disk.
pub fn load_service(path: &Path) -> miette::Result<VersionOverrideMap> {
    let content = std::fs::read_to_string(path).map_err(|e| AlignError::Source {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;
    Ok(parse_service(&content)?)
}

/// Parse a service document into overrides, preserving document order.
pub fn parse_service(json: &str) -> Result<VersionOverrideMap, AlignError> {
    let doc: ServiceDocument = serde_json::from_str(json).map_err(|e| AlignError::Source {
        message: format!("Failed to parse service document: {e}"),
    })?;

    let mut overrides = VersionOverrideMap::new();
    match doc {
        ServiceDocument::Map(entries) => {
            for (key, new_version) in entries {
                overrides.insert(ArtifactRef::parse(&key)?, new_version);
            }
        }
        ServiceDocument::List(entries) => {
            for r in entries {
                let key = ArtifactRef::new(r.group_id, r.artifact_id, r.version)
                    .with_type(r.type_.unwrap_or_else(|| DEFAULT_TYPE.to_string()))
                    .with_classifier(r.classifier);
                overrides.insert(key, r.new_version);
            }
        }
    }
    Ok(overrides)
}
