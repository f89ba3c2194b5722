//! `fxt init` — initialize a fixtrack project.

use crate::cmd;
use crate::output::{OutputMode, render_success};
use anyhow::Context as _;
use clap::Args;
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Reinitialize even if `.fixtrack/` already exists.
    #[arg(long)]
    pub force: bool,
}

/// Execute `fxt init`. Creates the project skeleton:
///
/// ```text
/// .fixtrack/
///   tickets.db    (SQLite store, schema migrated to latest)
///   config.toml   (default project config)
/// ```
///
/// # Errors
///
/// Returns an error if `.fixtrack/` already exists and `--force` is not
/// set, or if the store cannot be created.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let dir = project_root.join(".fixtrack");
    if dir.exists() && !args.force {
        anyhow::bail!(".fixtrack/ already exists. Use `fxt init --force` to reinitialize.");
    }

    fixtrack_core::config::write_default_config(project_root)?;

    let path = cmd::store_path(project_root);
    fixtrack_core::store::open_store(&path)
        .with_context(|| format!("create store at {}", path.display()))?;

    render_success(output, &format!("Initialized fixtrack in {}", dir.display()))?;
    Ok(())
}
