//! Strict version compatibility.
//!
//! Under strict alignment a replacement is only accepted when, once the
//! build-qualifier suffix (e.g. `redhat-1`) is stripped, it still denotes
//! the same release as the original. How "the same" is decided is a
//! [`StrictPolicy`].

use serde::{Deserialize, Serialize};

use realign_util::errors::AlignError;

/// Inputs shared by every policy.
#[derive(Debug, Clone, Copy)]
pub struct StrictOptions<'a> {
    /// Build-qualifier suffix, e.g. `redhat`.
    pub suffix: &'a str,
    /// Also strip the suffix from the original version, so rebuilding an
    /// already-rebuilt version stays compatible.
    pub ignore_suffix: bool,
}

/// Decides whether `new` may replace `old` under strict alignment.
pub trait StrictPolicy {
    fn is_compatible(&self, old: &str, new: &str, opts: &StrictOptions<'_>) -> bool;
}

/// Same numeric release and same qualifier; trailing `.0` segments are
/// insignificant (`1.2` ≡ `1.2.0`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

/// The numeric segments of the original are a prefix of the numeric
/// segments of the replacement (`1.2` accepts `1.2.3.redhat-1`).
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericPrefix;

/// Configurable choice of [`StrictPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrictMatching {
    #[default]
    Exact,
    NumericPrefix,
}

impl StrictMatching {
    pub fn policy(self) -> &'static dyn StrictPolicy {
        match self {
            StrictMatching::Exact => &ExactMatch,
            StrictMatching::NumericPrefix => &NumericPrefix,
        }
    }
}

impl std::str::FromStr for StrictMatching {
    type Err = AlignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "exact" => Ok(StrictMatching::Exact),
            "numeric-prefix" | "numeric" => Ok(StrictMatching::NumericPrefix),
            other => Err(AlignError::Config {
                message: format!("Unknown strict matching policy '{other}'"),
            }),
        }
    }
}

/// Run the configured policy. Identical strings are always compatible and
/// an empty side never is.
pub fn check_strict_value(
    matching: StrictMatching,
    old: &str,
    new: &str,
    opts: &StrictOptions<'_>,
) -> bool {
    if old.is_empty() || new.is_empty() {
        return false;
    }
    if old == new {
        return true;
    }
    matching.policy().is_compatible(old, new, opts)
}

/// Remove the build-qualifier suffix and the separator in front of it.
/// `1.1.redhat-1` with suffix `redhat` becomes `1.1`.
pub fn strip_suffix<'a>(version: &'a str, suffix: &str) -> &'a str {
    if suffix.is_empty() {
        return version;
    }
    match version.find(suffix) {
        Some(0) => version,
        Some(pos) => version[..pos].trim_end_matches(['.', '-', '_']),
        None => version,
    }
}

impl StrictPolicy for ExactMatch {
    fn is_compatible(&self, old: &str, new: &str, opts: &StrictOptions<'_>) -> bool {
        let original = if opts.ignore_suffix {
            strip_suffix(old, opts.suffix)
        } else {
            old
        };
        let candidate = strip_suffix(new, opts.suffix);
        if original == candidate {
            return true;
        }
        ReleaseShape::parse(original).normalized() == ReleaseShape::parse(candidate).normalized()
    }
}

impl StrictPolicy for NumericPrefix {
    fn is_compatible(&self, old: &str, new: &str, opts: &StrictOptions<'_>) -> bool {
        let original = ReleaseShape::parse(if opts.ignore_suffix {
            strip_suffix(old, opts.suffix)
        } else {
            old
        });
        let candidate = ReleaseShape::parse(strip_suffix(new, opts.suffix));
        !original.numbers.is_empty() && candidate.numbers.starts_with(&original.numbers)
    }
}

/// Numeric release segments plus the lowercased remainder.
#[derive(Debug, PartialEq, Eq)]
struct ReleaseShape {
    numbers: Vec<u64>,
    qualifier: String,
}

impl ReleaseShape {
    fn parse(version: &str) -> Self {
        let mut numbers = Vec::new();
        let mut rest: Vec<String> = Vec::new();
        for token in version.split(['.', '-', '_']).filter(|t| !t.is_empty()) {
            match token.parse::<u64>() {
                Ok(n) if rest.is_empty() => numbers.push(n),
                _ => rest.push(token.to_lowercase()),
            }
        }
        Self {
            numbers,
            qualifier: rest.join("."),
        }
    }

    /// Drop trailing zero segments, so `1.2` and `1.2.0` compare equal.
    fn normalized(mut self) -> Self {
        while self.numbers.len() > 1 && self.numbers.last() == Some(&0) {
            self.numbers.pop();
        }
        self
    }
}
