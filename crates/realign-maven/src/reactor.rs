//! Discovery of the module tree: the root `pom.xml` plus every module it
//! (transitively) lists under `<modules>`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use realign_core::project::{Project, ProjectTree};
use realign_util::errors::AlignError;

use crate::pom::read_pom;

/// Descriptor file name looked up inside module directories.
pub const POM_FILE: &str = "pom.xml";

/// Load the tree rooted at `root`, which may be a directory containing
/// `pom.xml` or the descriptor itself.
pub fn load_reactor(root: &Path) -> miette::Result<ProjectTree> {
    let root_pom = descriptor_path(root);
    if !root_pom.is_file() {
        return Err(AlignError::Descriptor {
            message: format!("No {POM_FILE} found at {}", root.display()),
        }
        .into());
    }

    let mut projects = Vec::new();
    let mut seen = HashSet::new();
    let mut pending = vec![root_pom];

    while let Some(pom_path) = pending.pop() {
        let canonical = pom_path.canonicalize().map_err(AlignError::Io)?;
        if !seen.insert(canonical) {
            continue;
        }
        let model = read_pom(&pom_path)?;
        let dir = pom_path.parent().map(Path::to_path_buf).unwrap_or_default();

        // Reverse so modules are visited in declaration order.
        for module in model.modules.iter().rev() {
            let child = descriptor_path(&dir.join(module));
            if !child.is_file() {
                return Err(AlignError::Descriptor {
                    message: format!(
                        "Module '{module}' declared in {} has no {POM_FILE}",
                        pom_path.display()
                    ),
                }
                .into());
            }
            pending.push(child);
        }

        debug!("Loaded {} from {}", model.project_ref(), pom_path.display());
        projects.push(Project::new(pom_path, model));
    }

    Ok(ProjectTree::build(projects)?)
}

fn descriptor_path(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == "xml") {
        path.to_path_buf()
    } else {
        path.join(POM_FILE)
    }
}
