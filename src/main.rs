mod commands;
mod config;
mod flags;

use std::io::{self, Write};

use anyhow::Result;
use tracing::debug;

use crate::flags::{Lugh, LughCmd};

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let flags = Lugh::from_env_or_exit();
    debug!(target: "lifecycle", ?flags, "started");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match &flags.subcommand {
        LughCmd::Query(cmd) => commands::query(cmd, &mut out)?,
        LughCmd::Dump(cmd) => commands::dump(cmd, &mut out)?,
        LughCmd::Export(cmd) => commands::export(cmd, &mut out)?,
    }
    out.flush()?;

    Ok(())
}
