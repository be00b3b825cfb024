//! Handler for `realign rules`.

use std::path::{Path, PathBuf};

use miette::Result;

use realign_ops::ops_rules::{self, RulesOptions};

pub fn exec(
    dir: &Path,
    config: Option<PathBuf>,
    extra_boms: Vec<(String, PathBuf)>,
    properties: Vec<(String, String)>,
) -> Result<()> {
    let opts = RulesOptions {
        config,
        extra_boms,
        user_properties: properties.into_iter().collect(),
    };
    ops_rules::rules(dir, &opts)
}
