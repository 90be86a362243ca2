//! Commands for the locally persisted product collection.

use clap::Subcommand;

use crate::App;

/// Sub-commands available under `local`.
#[derive(Debug, Subcommand)]
pub enum LocalCommands {
    /// Show how much of the store the local products use
    Usage,
    /// Delete every locally stored product
    Clear {
        /// Required; this cannot be undone
        #[arg(long)]
        yes: bool,
    },
}

pub(crate) fn run(app: &App, command: &LocalCommands) -> anyhow::Result<()> {
    let local = app.catalog.local();
    match command {
        LocalCommands::Usage => {
            let usage = local.usage();
            let quota = app
                .config
                .storage_quota_bytes
                .map_or_else(|| "unlimited".to_string(), |q| format!("{q} bytes"));
            println!(
                "{} products, {} bytes (quota {quota}, data dir {})",
                usage.count,
                usage.bytes,
                app.config.data_dir.display()
            );
        }
        LocalCommands::Clear { yes } => {
            if !yes {
                anyhow::bail!("refusing to clear local products without --yes");
            }
            local.clear()?;
            println!("local products cleared");
        }
    }
    Ok(())
}
