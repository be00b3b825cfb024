//! CLI argument definitions for realign.
//!
//! Uses `clap` derive macros. Each command corresponds to a handler in the
//! [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "realign",
    version,
    about = "Align Maven dependency versions to a BOM or version service",
    long_about = "realign rewrites the dependency versions of a multi-module Maven build so \
                  they match the versions published by one or more BOMs or a version \
                  recommendation service, honouring per-module scoping rules."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Align the reactor rooted at DIR and print what changed
    Align {
        /// Directory containing the root pom.xml
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Configuration file (defaults to DIR/realign.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// BOM to align to; repeat for several, the first listed wins
        #[arg(long = "bom", value_name = "FILE")]
        boms: Vec<PathBuf>,
        /// Extra BOM addressable by NAME from scoping rules
        #[arg(long = "extra-bom", value_name = "NAME=FILE", value_parser = parse_named_path)]
        extra_boms: Vec<(String, PathBuf)>,
        /// Version recommendation document (JSON)
        #[arg(long, value_name = "FILE")]
        service: Option<PathBuf>,
        /// User property, e.g. -DstrictAlignment=true
        #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_property)]
        properties: Vec<(String, String)>,
        /// Print the aligned models and report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how the module-scoping rules resolve for every module
    Rules {
        /// Directory containing the root pom.xml
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Configuration file (defaults to DIR/realign.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Extra BOM addressable by NAME from scoping rules
        #[arg(long = "extra-bom", value_name = "NAME=FILE", value_parser = parse_named_path)]
        extra_boms: Vec<(String, PathBuf)>,
        /// User property, e.g. -DdependencyOverride.g:a@*=1.0
        #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_property)]
        properties: Vec<(String, String)>,
    },
}

/// `key=value`; a bare `key` means `key=` (empty value).
fn parse_property(s: &str) -> Result<(String, String), String> {
    let (key, value) = s.split_once('=').unwrap_or((s, ""));
    if key.is_empty() {
        return Err(format!("invalid property '{s}': expected KEY=VALUE"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_named_path(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("invalid extra BOM '{s}': expected NAME=FILE")),
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_parsing() {
        assert_eq!(
            parse_property("strictAlignment=true").unwrap(),
            ("strictAlignment".to_string(), "true".to_string())
        );
        assert_eq!(
            parse_property("dependencyOverride.g:a@*=").unwrap(),
            ("dependencyOverride.g:a@*".to_string(), String::new())
        );
        assert_eq!(
            parse_property("reportNonAligned").unwrap(),
            ("reportNonAligned".to_string(), String::new())
        );
        assert!(parse_property("=x").is_err());
    }

    #[test]
    fn extra_bom_parsing() {
        let (name, path) = parse_named_path("product=boms/product.xml").unwrap();
        assert_eq!(name, "product");
        assert_eq!(path, PathBuf::from("boms/product.xml"));
        assert!(parse_named_path("product").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_repeated_flags() {
        let cli = Cli::try_parse_from([
            "realign", "align", "proj", "--bom", "a.xml", "--bom", "b.xml", "-DstrictAlignment=true",
            "-D", "reportNonAligned=false",
        ])
        .unwrap();
        match cli.command {
            Command::Align { boms, properties, .. } => {
                assert_eq!(boms.len(), 2);
                assert_eq!(properties.len(), 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
