use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all realign operations.
#[derive(Debug, Error, Diagnostic)]
pub enum AlignError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A build descriptor (pom.xml) could not be read or parsed.
    #[error("Descriptor error: {message}")]
    #[diagnostic(help("Check the pom.xml for malformed XML"))]
    Descriptor { message: String },

    /// Invalid configuration: bad rule keys, unknown option values,
    /// dangling extra-BOM references.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check realign.toml and the -D properties passed on the command line"))]
    Config { message: String },

    /// A `group:artifact` reference could not be parsed.
    #[error("Invalid coordinate '{value}': expected group:artifact")]
    InvalidRef { value: String },

    /// A version replacement diverged from the original and
    /// fail-on-strict-violation is set.
    #[error("{message}")]
    #[diagnostic(help("Disable fail-on-strict-violation to downgrade this to a warning"))]
    StrictViolation { message: String },

    /// Two dependencies sharing a property disagree on its new value.
    #[error(
        "Property replacement clash: '{property}' already scheduled as '{existing}' but {coordinate} requires '{requested}'"
    )]
    PropertyClash {
        property: String,
        existing: String,
        requested: String,
        coordinate: String,
    },

    /// A dependency references a property that was rewritten on behalf of
    /// other dependencies only.
    #[error("Property validation failed: {message}")]
    PropertyValidation { message: String },

    /// An override source (BOM, service document) could not be loaded.
    #[error("Override source error: {message}")]
    Source { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type AlignResult<T> = miette::Result<T>;
