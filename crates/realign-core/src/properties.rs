//! Helpers for `${name}` property references inside version strings.

/// The built-in reference to a module's own version.
pub const PROJECT_VERSION_REF: &str = "${project.version}";

/// Name of the built-in project version property.
pub const PROJECT_VERSION: &str = "project.version";

/// Whether `value` contains at least one `${...}` reference.
pub fn contains_reference(value: &str) -> bool {
    value.contains("${")
}

/// If `value` is exactly one reference `${name}` with nothing around it,
/// return `name`.
pub fn single_reference(value: &str) -> Option<&str> {
    let inner = value.strip_prefix("${")?.strip_suffix('}')?;
    if inner.is_empty() || inner.contains("${") || inner.contains('}') {
        return None;
    }
    Some(inner)
}

/// Name of the first reference in `value`, if any.
pub fn extract_property_name(value: &str) -> Option<&str> {
    let start = value.find("${")?;
    let rest = &value[start + 2..];
    let end = rest.find('}')?;
    Some(&rest[..end])
}
