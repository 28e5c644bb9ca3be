use anyhow::{Result, anyhow};
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "rewrite")]
#[command(about = "Rewrite barrel imports into direct imports of the declaring files")]
pub struct Config {
    /// Barrel package whose imports are rewritten (repeatable)
    #[arg(long = "package", short = 'p', required = true)]
    pub packages: Vec<String>,

    /// Root directory of the project (defaults to git root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Directory where node_modules lookup starts (defaults to root)
    #[arg(long)]
    pub modules_root: Option<PathBuf>,

    /// Only rewrite files whose path relative to root contains this pattern
    #[arg(long)]
    pub entry_glob: Option<String>,

    /// Write rewritten files back to disk instead of a dry run
    #[arg(long)]
    pub write: bool,
}

impl Config {
    /// Initialize the config by resolving the root and modules directories
    pub fn initialize(&mut self) -> Result<()> {
        let root = if let Some(r) = self.root.take() {
            debug!("Using provided root directory: {:?}", r);
            r.canonicalize().unwrap_or(r)
        } else {
            debug!("No root provided, searching for git root");
            debarrel_core::find_git_root()?
        };
        info!("Using root directory: {}", root.display());

        let modules_root = match self.modules_root.take() {
            Some(m) => m.canonicalize().unwrap_or(m),
            None => root.clone(),
        };
        debug!("Resolving packages from: {}", modules_root.display());

        self.root = Some(root);
        self.modules_root = Some(modules_root);
        Ok(())
    }

    /// Get the root directory, returning an error if not initialized
    pub fn root(&self) -> Result<&PathBuf> {
        self.root
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }

    pub fn modules_root(&self) -> Result<&PathBuf> {
        self.modules_root
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }
}
