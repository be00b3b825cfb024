//! Command dispatch and handler modules.

mod align;
mod rules;

use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Align {
            dir,
            config,
            boms,
            extra_boms,
            service,
            properties,
            json,
        } => align::exec(&dir, config, boms, extra_boms, service, properties, json),
        Command::Rules {
            dir,
            config,
            extra_boms,
            properties,
        } => rules::exec(&dir, config, extra_boms, properties),
    }
}
