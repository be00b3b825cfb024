//! Module-scoping rules: `group:artifact@module` keys whose values suppress,
//! pin, or add exclusions for an artifact in selected modules.

use std::collections::BTreeMap;
use std::fmt;

use realign_core::coordinate::ProjectRef;
use realign_core::WILDCARD;
use realign_util::errors::AlignError;

/// Which modules a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSelector {
    /// One module, by `group:artifact`.
    Module(ProjectRef),
    /// Every module of a group (`group:*`).
    Group(String),
    /// Every module (`*`).
    All,
}

impl ModuleSelector {
    fn parse(key: &str, selector: &str) -> Result<Self, AlignError> {
        if selector == WILDCARD {
            return Ok(Self::All);
        }
        let module = ProjectRef::parse(selector).map_err(|_| AlignError::Config {
            message: format!("Invalid module selector '{selector}' in rule key {key}"),
        })?;
        if module.artifact_id == WILDCARD {
            Ok(Self::Group(module.group_id))
        } else {
            Ok(Self::Module(module))
        }
    }

    /// Whether a module-specific selector covers `module`. [`Self::All`]
    /// is handled by the second scoping pass and never matches here.
    pub fn matches(&self, module: &ProjectRef) -> bool {
        match self {
            Self::Module(m) => m == module,
            Self::Group(g) => *g == module.group_id,
            Self::All => false,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl fmt::Display for ModuleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(m) => write!(f, "{m}"),
            Self::Group(g) => write!(f, "{g}:*"),
            Self::All => f.write_str(WILDCARD),
        }
    }
}

/// One comma-separated token of an explicit override value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Force the dependency to this version.
    Version(String),
    /// Add an exclusion (`+group:artifact`).
    Exclude(ProjectRef),
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version(v) => f.write_str(v),
            Self::Exclude(pr) => write!(f, "+{pr}"),
        }
    }
}

/// What a matching rule does to its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAction {
    /// Empty value: drop the target from the module's overrides.
    Suppress,
    /// Value names an extra BOM; the version is looked up there.
    BomReference(String),
    Directives(Vec<Directive>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopingRule {
    /// The configuration key the rule was parsed from.
    pub key: String,
    /// Artifact the rule acts on; may contain wildcards.
    pub target: ProjectRef,
    pub selector: ModuleSelector,
    pub action: RuleAction,
}

impl ScopingRule {
    /// Parse one `target@selector = value` entry. `extra_boms` is the set
    /// of extra-BOM names a bare value may refer to.
    pub fn parse(
        key: &str,
        value: &str,
        is_extra_bom: impl Fn(&str) -> bool,
    ) -> Result<Self, AlignError> {
        let mut parts = key.split('@');
        let (Some(target), Some(selector), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(AlignError::Config {
                message: format!(
                    "Invalid format for rule key {key}: expected group:artifact@module"
                ),
            });
        };
        let target = ProjectRef::parse(target).map_err(|_| AlignError::Config {
            message: format!("Invalid artifact '{target}' in rule key {key}"),
        })?;
        let selector = ModuleSelector::parse(key, selector.trim())?;

        let value = value.trim();
        let action = if value.is_empty() {
            RuleAction::Suppress
        } else if is_extra_bom(value) {
            RuleAction::BomReference(value.to_string())
        } else {
            RuleAction::Directives(parse_directives(key, value)?)
        };

        Ok(Self {
            key: key.to_string(),
            target,
            selector,
            action,
        })
    }
}

fn parse_directives(key: &str, value: &str) -> Result<Vec<Directive>, AlignError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match token.strip_prefix('+') {
            Some(excluded) => ProjectRef::parse(excluded)
                .map(Directive::Exclude)
                .map_err(|_| AlignError::Config {
                    message: format!("Invalid exclusion '{token}' in rule {key}"),
                }),
            None => Ok(Directive::Version(token.to_string())),
        })
        .collect()
}

/// Parse every configured rule. Keys without `@` are not scoping rules and
/// are skipped.
pub fn parse_rules(
    entries: &BTreeMap<String, String>,
    is_extra_bom: impl Fn(&str) -> bool,
) -> Result<Vec<ScopingRule>, AlignError> {
    entries
        .iter()
        .filter(|(key, _)| {
            let scoped = key.contains('@');
            if !scoped {
                tracing::debug!("Ignoring unscoped rule key {key}");
            }
            scoped
        })
        .map(|(key, value)| ScopingRule::parse(key, value, &is_extra_bom))
        .collect()
}
