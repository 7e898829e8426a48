// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Allowlist pruning.
//!
//! Some targets ship far more files than should survive a deployment, e.g.,
//! hundreds of printer definitions when only a handful of printers exist.
//! Pruning removes every file of a directory that matches none of a set of
//! __keep patterns__. Keep patterns use glob syntax, and match against the
//! file name only.
//!
//! Only regular files directly inside the pruned directory are candidates
//! for removal. Subdirectories are never touched.

use glob::Pattern;
use std::{
    fs::{read_dir, remove_file},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Prune directory down to files matching keep patterns.
///
/// Shorthand for [`Pruner::prune`] without dry run.
///
/// # Errors
///
/// - Return [`PruneError`] if pruning fails.
pub fn prune_directory(
    dir: impl AsRef<Path>,
    keep: impl IntoIterator<Item = impl AsRef<str>>,
) -> Result<Vec<PathBuf>> {
    Pruner::new(keep)?.prune(dir)
}

/// Remove files that match none of a set of keep patterns.
#[derive(Debug, Clone)]
pub struct Pruner {
    keep: Vec<Pattern>,
    dry_run: bool,
}

impl Pruner {
    /// Construct new pruner.
    ///
    /// # Errors
    ///
    /// - Return [`PruneError::InvalidPattern`] if a keep pattern is not valid
    ///   glob syntax.
    pub fn new(keep: impl IntoIterator<Item = impl AsRef<str>>) -> Result<Self> {
        let keep = keep
            .into_iter()
            .map(|pattern| {
                Pattern::new(pattern.as_ref()).map_err(|err| PruneError::InvalidPattern {
                    source: err,
                    pattern: pattern.as_ref().to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            keep,
            dry_run: false,
        })
    }

    /// Only report files that would be removed.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Determine if file name matches any keep pattern.
    pub fn keeps(&self, file_name: &str) -> bool {
        self.keep.iter().any(|pattern| pattern.matches(file_name))
    }

    /// Prune directory.
    ///
    /// Returns sorted listing of removed files, or files that would have been
    /// removed in a dry run.
    ///
    /// # Errors
    ///
    /// - Return [`PruneError::ReadDir`] if directory cannot be listed.
    /// - Return [`PruneError::RemoveFile`] if a file cannot be removed.
    pub fn prune(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut doomed = Vec::new();
        let entries = read_dir(dir).map_err(|err| PruneError::ReadDir {
            source: err,
            path: dir.to_path_buf(),
        })?;

        for entry in entries {
            let entry = entry.map_err(|err| PruneError::ReadDir {
                source: err,
                path: dir.to_path_buf(),
            })?;
            let path = entry.path();
            if !path.is_file() || self.keeps(entry.file_name().to_string_lossy().as_ref()) {
                continue;
            }

            doomed.push(path);
        }
        doomed.sort();

        if !self.dry_run {
            for path in &doomed {
                debug!("remove {:?}", path.display());
                remove_file(path).map_err(|err| PruneError::RemoveFile {
                    source: err,
                    path: path.clone(),
                })?;
            }
        }

        info!("pruned {} file(s) from {:?}", doomed.len(), dir.display());
        Ok(doomed)
    }
}

/// Pruning error types.
#[derive(Debug, thiserror::Error)]
pub enum PruneError {
    /// Keep pattern is not valid glob syntax.
    #[error("invalid keep pattern {pattern:?}")]
    InvalidPattern {
        #[source]
        source: glob::PatternError,
        pattern: String,
    },

    /// Directory cannot be listed.
    #[error("failed to read directory {:?}", path.display())]
    ReadDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be removed.
    #[error("failed to remove {:?}", path.display())]
    RemoveFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = PruneError> = std::result::Result<T, E>;
