//! Handler for `realign align`.

use std::path::{Path, PathBuf};

use miette::Result;

use realign_ops::ops_align::{self, AlignOptions};

pub fn exec(
    dir: &Path,
    config: Option<PathBuf>,
    boms: Vec<PathBuf>,
    extra_boms: Vec<(String, PathBuf)>,
    service: Option<PathBuf>,
    properties: Vec<(String, String)>,
    json: bool,
) -> Result<()> {
    let opts = AlignOptions {
        config,
        boms,
        extra_boms,
        service,
        user_properties: properties.into_iter().collect(),
        json,
    };
    ops_align::align(dir, &opts)
}
