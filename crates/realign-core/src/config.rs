use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use realign_util::errors::AlignError;

use crate::version::{StrictMatching, StrictOptions};

/// Default file name of the alignment configuration.
pub const CONFIG_FILE: &str = "realign.toml";

/// User property prefixes that introduce module-scoping rules.
const RULE_PREFIXES: [&str; 2] = ["dependencyOverride.", "dependencyExclusion."];

/// Which external override source wins when both define a coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyPrecedence {
    /// BOM source only.
    #[default]
    Bom,
    /// Service source only.
    Service,
    /// Service fills gaps, BOM wins conflicts.
    ServiceThenBom,
    /// BOM fills gaps, service wins conflicts.
    BomThenService,
}

impl FromStr for DependencyPrecedence {
    type Err = AlignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "BOM" | "NONE" => Ok(Self::Bom),
            "REST" | "SERVICE" => Ok(Self::Service),
            // Legacy names list the winning source first.
            "BOMREST" | "SERVICE_THEN_BOM" => Ok(Self::ServiceThenBom),
            "RESTBOM" | "BOM_THEN_SERVICE" => Ok(Self::BomThenService),
            _ => Err(AlignError::Config {
                message: format!("Unknown dependency source '{s}'"),
            }),
        }
    }
}

impl fmt::Display for DependencyPrecedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bom => "BOM",
            Self::Service => "SERVICE",
            Self::ServiceThenBom => "SERVICE_THEN_BOM",
            Self::BomThenService => "BOM_THEN_SERVICE",
        };
        f.write_str(name)
    }
}

/// Every knob the alignment run reads, loaded from `realign.toml` and then
/// overlaid with `-D` user properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AlignmentConfig {
    /// Master switch for dependency alignment.
    pub enabled: bool,
    /// Apply overrides to dependencies and dependency management at all.
    pub override_dependencies: bool,
    pub precedence: DependencyPrecedence,
    pub strict: bool,
    pub fail_on_strict_violation: bool,
    /// Inject unmatched overrides into the root's dependency management.
    pub override_transitive: bool,
    pub strict_ignore_suffix: bool,
    /// Build-qualifier suffix, e.g. `redhat`.
    pub version_suffix: String,
    pub strict_matching: StrictMatching,
    /// 0 disables the property validation pre-pass, 1 warns, 2+ fails.
    pub strict_validation_depth: u8,
    pub report_non_aligned: bool,
    pub remove_repositories_and_reporting: bool,
    /// `group:artifact[@module|@*]` → version, extra-BOM name,
    /// `+group:artifact` exclusions, or empty to suppress.
    pub dependency_exclusions: BTreeMap<String, String>,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            override_dependencies: true,
            precedence: DependencyPrecedence::default(),
            strict: false,
            fail_on_strict_violation: false,
            override_transitive: false,
            strict_ignore_suffix: true,
            version_suffix: "redhat".to_string(),
            strict_matching: StrictMatching::default(),
            strict_validation_depth: 0,
            report_non_aligned: false,
            remove_repositories_and_reporting: false,
            dependency_exclusions: BTreeMap::new(),
        }
    }
}

impl AlignmentConfig {
    /// Load from a TOML file, or return defaults if the file doesn't exist.
    pub fn load(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| AlignError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            AlignError::Config {
                message: format!("Failed to parse alignment config: {e}"),
            }
            .into()
        })
    }

    /// Layer `-D` style user properties over this configuration.
    pub fn apply_user_properties(
        &mut self,
        props: &BTreeMap<String, String>,
    ) -> Result<(), AlignError> {
        for (key, value) in props {
            if let Some(rule) = RULE_PREFIXES.iter().find_map(|p| key.strip_prefix(p)) {
                self.dependency_exclusions
                    .insert(rule.to_string(), value.trim().to_string());
                continue;
            }
            match key.as_str() {
                "dependencyManipulation" => self.enabled = parse_bool(key, value)?,
                "overrideDependencies" => self.override_dependencies = parse_bool(key, value)?,
                "dependencySource" => self.precedence = value.parse()?,
                "strictAlignment" => self.strict = parse_bool(key, value)?,
                "strictViolationFails" => self.fail_on_strict_violation = parse_bool(key, value)?,
                "overrideTransitive" => self.override_transitive = parse_bool(key, value)?,
                "strictAlignmentIgnoreSuffix" => {
                    self.strict_ignore_suffix = parse_bool(key, value)?
                }
                "versionSuffix" | "versionIncrementalSuffix" => {
                    self.version_suffix = value.trim().to_string()
                }
                "strictMatching" => self.strict_matching = value.parse()?,
                "strictPropertyValidation" => {
                    self.strict_validation_depth = parse_depth(key, value)?
                }
                "reportNonAligned" => self.report_non_aligned = parse_bool(key, value)?,
                "repoReportingRemoval" => {
                    self.remove_repositories_and_reporting = parse_bool(key, value)?
                }
                _ => tracing::debug!("Ignoring unrelated user property {key}"),
            }
        }
        Ok(())
    }

    pub fn strict_options(&self) -> StrictOptions<'_> {
        StrictOptions {
            suffix: &self.version_suffix,
            ignore_suffix: self.strict_ignore_suffix,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AlignError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "true" => Ok(true),
        "false" => Ok(false),
        other => Err(AlignError::Config {
            message: format!("Property {key} expects true or false, got '{other}'"),
        }),
    }
}

/// `true` is accepted as depth 1 for compatibility with boolean spelling.
fn parse_depth(key: &str, value: &str) -> Result<u8, AlignError> {
    let v = value.trim();
    match v.to_ascii_lowercase().as_str() {
        "true" => Ok(1),
        "false" => Ok(0),
        _ => v.parse::<u8>().map_err(|_| AlignError::Config {
            message: format!("Property {key} expects a depth, got '{v}'"),
        }),
    }
}
