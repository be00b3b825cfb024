//! A coordinate-keyed map where stored keys may use `*` for the group, the
//! artifact, or both.

use indexmap::IndexMap;

use crate::coordinate::ProjectRef;
use crate::WILDCARD;

/// Map from [`ProjectRef`] to `V` with wildcard-aware lookup.
///
/// Lookup tries, in order: the exact key, `group:*`, `*:artifact`, `*:*`,
/// returning the first hit.
#[derive(Debug, Clone)]
pub struct WildcardMap<V> {
    entries: IndexMap<ProjectRef, V>,
}

impl<V> Default for WildcardMap<V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<V> WildcardMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value for `key` (which may contain wildcards).
    pub fn insert(&mut self, key: ProjectRef, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &ProjectRef) -> Option<&V> {
        self.candidates(key)
            .into_iter()
            .find_map(|candidate| self.entries.get(&candidate))
    }

    pub fn contains_key(&self, key: &ProjectRef) -> bool {
        self.get(key).is_some()
    }

    /// Remove an entry by its literal stored key (no wildcard expansion).
    pub fn remove(&mut self, key: &ProjectRef) -> Option<V> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored entries in insertion order, wildcards unexpanded.
    pub fn iter(&self) -> impl Iterator<Item = (&ProjectRef, &V)> {
        self.entries.iter()
    }

    fn candidates(&self, key: &ProjectRef) -> [ProjectRef; 4] {
        [
            key.clone(),
            ProjectRef::new(&key.group_id, WILDCARD),
            ProjectRef::new(WILDCARD, &key.artifact_id),
            ProjectRef::new(WILDCARD, WILDCARD),
        ]
    }
}
