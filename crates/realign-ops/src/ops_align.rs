//! Operation: align a reactor's dependency versions to the configured
//! override sources.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use realign_core::config::{AlignmentConfig, CONFIG_FILE};
use realign_core::coordinate::VersionOverrideMap;
use realign_core::model::Model;
use realign_core::project::ProjectTree;
use realign_engine::merge::{merge_boms, merge_sources};
use realign_engine::scope::ExtraBoms;
use realign_engine::DependencyAligner;
use realign_maven::bom::{load_bom, load_bom_by_project};
use realign_maven::reactor::load_reactor;
use realign_maven::service::load_service;
use realign_util::errors::AlignError;
use realign_util::progress;

use crate::compare::{compare, AlignmentReport};
use crate::removal::remove_repositories_and_reporting;

/// Options for `realign align`.
#[derive(Debug, Default)]
pub struct AlignOptions {
    /// Configuration file; `<root>/realign.toml` when unset.
    pub config: Option<PathBuf>,
    /// BOMs in precedence order, first wins.
    pub boms: Vec<PathBuf>,
    /// Extra BOMs addressable by name from scoping rules.
    pub extra_boms: Vec<(String, PathBuf)>,
    /// Service recommendation document.
    pub service: Option<PathBuf>,
    /// `-D` user properties layered over the configuration.
    pub user_properties: BTreeMap<String, String>,
    /// Print the aligned models and report as JSON.
    pub json: bool,
}

/// Everything one alignment run produced.
#[derive(Debug)]
pub struct AlignmentRun {
    pub config: AlignmentConfig,
    pub original: ProjectTree,
    pub aligned: ProjectTree,
    /// Indices of projects changed by alignment or repository removal.
    pub changed: BTreeSet<usize>,
    pub report: AlignmentReport,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    changed: Vec<String>,
    report: &'a AlignmentReport,
    projects: Vec<&'a Model>,
}

/// Load the configuration for `root`, with user properties applied.
pub fn load_config(
    root: &Path,
    config: Option<&Path>,
    user_properties: &BTreeMap<String, String>,
) -> miette::Result<AlignmentConfig> {
    let path = config
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(CONFIG_FILE));
    let mut cfg = AlignmentConfig::load(&path)?;
    cfg.apply_user_properties(user_properties)?;
    debug!("Alignment configuration: {cfg:?}");
    Ok(cfg)
}

/// Load every extra BOM, keyed by its name.
pub fn load_extra_boms(extra: &[(String, PathBuf)]) -> miette::Result<ExtraBoms> {
    let mut boms = ExtraBoms::new();
    for (name, path) in extra {
        boms.insert(name.clone(), load_bom_by_project(path)?);
    }
    Ok(boms)
}

/// Load the BOM and service sources and merge them per the configured
/// precedence.
pub fn load_overrides(
    config: &AlignmentConfig,
    boms: &[PathBuf],
    service: Option<&Path>,
) -> miette::Result<VersionOverrideMap> {
    let loaded = boms
        .iter()
        .map(|path| load_bom(path))
        .collect::<miette::Result<Vec<_>>>()?;
    let service = match service {
        Some(path) => load_service(path)?,
        None => VersionOverrideMap::new(),
    };
    Ok(merge_sources(merge_boms(&loaded), service, config.precedence))
}

/// Run alignment without printing anything.
pub fn run_alignment(root: &Path, opts: &AlignOptions) -> miette::Result<AlignmentRun> {
    let config = load_config(root, opts.config.as_deref(), &opts.user_properties)?;
    let original = load_reactor(root)?;
    info!("Loaded {} projects from {}", original.len(), root.display());

    let extra_boms = load_extra_boms(&opts.extra_boms)?;
    let overrides = load_overrides(&config, &opts.boms, opts.service.as_deref())?;

    let mut aligned = original.clone();
    let mut changed = {
        let mut aligner = DependencyAligner::new(&config, &extra_boms)?;
        aligner.apply_changes(&mut aligned, &overrides)?.changed
    };

    if config.remove_repositories_and_reporting {
        changed.extend(remove_repositories_and_reporting(&mut aligned));
    }

    let report = compare(&original, &aligned, config.report_non_aligned);
    Ok(AlignmentRun {
        config,
        original,
        aligned,
        changed,
        report,
    })
}

/// `realign align`: run alignment and print the report.
pub fn align(root: &Path, opts: &AlignOptions) -> miette::Result<()> {
    let run = run_alignment(root, opts)?;
    let changed: Vec<String> = run
        .changed
        .iter()
        .filter_map(|&i| run.aligned.get(i))
        .map(|p| p.key().to_string())
        .collect();

    if opts.json {
        let output = JsonOutput {
            changed,
            report: &run.report,
            projects: run.aligned.projects.iter().map(|p| &p.model).collect(),
        };
        let json = serde_json::to_string_pretty(&output).map_err(|e| AlignError::Generic {
            message: format!("Failed to serialise report: {e}"),
        })?;
        println!("{json}");
        return Ok(());
    }

    print!("{}", run.report);
    if run.report.is_empty() {
        progress::status_info("Aligned", "no dependency versions changed");
    } else {
        progress::status(
            "Aligned",
            &format!(
                "{} dependency versions across {} projects",
                run.report.dependency_changes(),
                run.report.projects.len()
            ),
        );
    }
    let non_aligned = run.report.non_aligned();
    if non_aligned > 0 {
        progress::status_warn(
            "Unaligned",
            &format!("{non_aligned} dependencies kept their original version"),
        );
    }
    for name in &changed {
        progress::status_info("Processed", name);
    }
    Ok(())
}
