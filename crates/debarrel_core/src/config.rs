use anyhow::{Result, anyhow};
use log::{debug, trace};
use std::{
    env,
    path::{Path, PathBuf},
};

/// The nearest directory at or above the working directory that holds `.git`.
pub fn find_git_root() -> Result<PathBuf> {
    debug!("Searching for git root");
    let current_dir = env::current_dir()?;
    git_root_from(&current_dir)
}

pub fn git_root_from(start: &Path) -> Result<PathBuf> {
    trace!("Starting search from: {:?}", start);
    for dir in start.ancestors() {
        let git_dir = dir.join(".git");
        trace!("Checking for .git at: {:?}", git_dir);
        if git_dir.exists() {
            debug!("Found git root at: {:?}", dir);
            return Ok(dir.to_path_buf());
        }
    }
    debug!("Could not find .git directory in any parent folder");
    Err(anyhow!("Could not find .git directory in any parent folder of {}", start.display()))
}
