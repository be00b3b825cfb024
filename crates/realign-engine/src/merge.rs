//! Combining override sources into the single map the aligner consumes.

use tracing::{debug, warn};

use realign_core::config::DependencyPrecedence;
use realign_core::coordinate::{ArtifactRef, VersionOverrideMap};

/// Fold several BOMs into one map. When two BOMs define the same artifact
/// the one listed first wins. Several versions of one artifact inside a
/// single BOM are kept as-is.
pub fn merge_boms(boms: &[VersionOverrideMap]) -> VersionOverrideMap {
    let mut merged = VersionOverrideMap::new();
    for bom in boms.iter().rev() {
        merged.retain(|key, _| !bom.keys().any(|k| k.same_artifact(key)));
        merged.extend(bom.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

/// Combine the BOM and service sources according to `precedence`.
pub fn merge_sources(
    bom: VersionOverrideMap,
    service: VersionOverrideMap,
    precedence: DependencyPrecedence,
) -> VersionOverrideMap {
    let merged = match precedence {
        DependencyPrecedence::Bom => {
            if bom.is_empty() {
                warn!("No dependency overrides found in the BOM source. Has a BOM been configured?");
            }
            bom
        }
        DependencyPrecedence::Service => {
            if service.is_empty() {
                warn!(
                    "No dependency overrides found in the service source. Has a service document been configured?"
                );
            }
            service
        }
        DependencyPrecedence::ServiceThenBom => overlay(service, bom),
        DependencyPrecedence::BomThenService => overlay(bom, service),
    };
    debug!("Merged {} overrides using {precedence} precedence", merged.len());
    merged
}

/// Start from `base`, drop every artifact `winner` also defines (whatever
/// the version), then add all of `winner`.
fn overlay(mut base: VersionOverrideMap, winner: VersionOverrideMap) -> VersionOverrideMap {
    remove_duplicate_artifacts(&mut base, &winner);
    base.extend(winner);
    base
}

fn remove_duplicate_artifacts(base: &mut VersionOverrideMap, winner: &VersionOverrideMap) {
    base.retain(|key: &ArtifactRef, _| {
        let pr = key.as_project_ref();
        !winner.keys().any(|k| k.is(&pr))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> VersionOverrideMap {
        entries
            .iter()
            .map(|(k, v)| (ArtifactRef::parse(k).unwrap(), v.to_string()))
            .collect()
    }

    fn version_of<'a>(m: &'a VersionOverrideMap, ga: &str) -> Vec<&'a str> {
        m.iter()
            .filter(|(k, _)| k.as_project_ref().to_string() == ga)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[test]
    fn first_bom_wins() {
        let a = map(&[("g:a:1.0", "1.0.redhat-1")]);
        let b = map(&[("g:a:1.0", "1.0.redhat-2"), ("g:b:2.0", "2.0.redhat-1")]);
        let merged = merge_boms(&[a, b]);
        assert_eq!(version_of(&merged, "g:a"), vec!["1.0.redhat-1"]);
        assert_eq!(version_of(&merged, "g:b"), vec!["2.0.redhat-1"]);
    }

    #[test]
    fn first_bom_wins_across_differing_source_versions() {
        let a = map(&[("g:a:1.1", "1.1.redhat-1")]);
        let b = map(&[("g:a:1.0", "1.0.redhat-2")]);
        let merged = merge_boms(&[a, b]);
        assert_eq!(version_of(&merged, "g:a"), vec!["1.1.redhat-1"]);
    }

    #[test]
    fn multiple_versions_inside_one_bom_survive() {
        let a = map(&[("g:a:1.0", "1.0.redhat-1"), ("g:a:2.0", "2.0.redhat-1")]);
        let merged = merge_boms(&[a]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn precedence_selects_winner() {
        let bom = map(&[("g:a:1.0", "1.0.redhat-1"), ("g:b:1.0", "1.0.redhat-1")]);
        let service = map(&[("g:a:1.0", "1.0.redhat-5"), ("g:c:1.0", "1.0.redhat-5")]);

        let only_bom = merge_sources(bom.clone(), service.clone(), DependencyPrecedence::Bom);
        assert_eq!(only_bom, bom);

        let only_service =
            merge_sources(bom.clone(), service.clone(), DependencyPrecedence::Service);
        assert_eq!(only_service, service);

        let bom_wins =
            merge_sources(bom.clone(), service.clone(), DependencyPrecedence::ServiceThenBom);
        assert_eq!(version_of(&bom_wins, "g:a"), vec!["1.0.redhat-1"]);
        assert_eq!(version_of(&bom_wins, "g:c"), vec!["1.0.redhat-5"]);
        assert_eq!(bom_wins.len(), 3);

        let service_wins = merge_sources(bom, service, DependencyPrecedence::BomThenService);
        assert_eq!(version_of(&service_wins, "g:a"), vec!["1.0.redhat-5"]);
        assert_eq!(version_of(&service_wins, "g:b"), vec!["1.0.redhat-1"]);
        assert_eq!(service_wins.len(), 3);
    }

    #[test]
    fn empty_source_yields_empty_map() {
        let merged = merge_sources(
            VersionOverrideMap::new(),
            map(&[("g:a:1.0", "1.0.redhat-1")]),
            DependencyPrecedence::Bom,
        );
        assert!(merged.is_empty());
    }
}
