// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Tree merging.
//!
//! Walk a __source tree__ of overrides in lock-step with a __target tree__,
//! and make the target tree reflect every override.
//!
//! # Source Entries
//!
//! Every entry of the source tree maps onto the identically named entry of
//! the target tree:
//!
//! - Directories are recursed into. The matching target directory is created
//!   if it does not exist yet.
//! - Patch files, i.e., files ending in `.patch` regardless of case, are
//!   parsed and applied to their target file. See [`patch`](crate::patch) for
//!   how the target file name is derived. The target file must already exist.
//! - Any other file replaces the target file of the same name outright. The
//!   existing target file is removed first, then the source file is copied
//!   over byte for byte.
//!
//! # Failure
//!
//! Merging stops at the first error. Patch files are fully validated before
//! their target file is written, so a rejected patch never leaves its target
//! half-patched. However, files merged before the error stay merged. There is
//! no rollback.

use crate::patch::{is_patch_file, PatchFile};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{copy, read_dir, read_to_string, remove_file, write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Merge source tree onto target tree.
///
/// Shorthand for [`TreeMerger::merge`] in [`MergeMode::Apply`].
///
/// # Errors
///
/// - Return [`MergeError`] on the first entry that cannot be merged.
pub fn merge_tree(target: impl AsRef<Path>, source: impl AsRef<Path>) -> Result<MergeReport> {
    TreeMerger::new(MergeMode::Apply).merge(target, source)
}

/// How a merge treats the target tree.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Write every override into the target tree.
    #[default]
    Apply,

    /// Validate every override without touching the target tree.
    ///
    /// Patch files are still parsed, checked for recursion, and matched to
    /// their target files.
    Check,
}

/// Walks source tree onto target tree.
#[derive(Default, Debug, Clone)]
pub struct TreeMerger {
    mode: MergeMode,
}

impl TreeMerger {
    /// Construct new tree merger.
    pub fn new(mode: MergeMode) -> Self {
        Self { mode }
    }

    /// Merge source tree onto target tree.
    ///
    /// Entries of each source directory are visited in name order.
    ///
    /// # Errors
    ///
    /// - Return [`MergeError::SourceNotDirectory`] if source root is not a
    ///   directory.
    /// - Return [`MergeError::Patch`] if a patch file is malformed or
    ///   recursive.
    /// - Return [`MergeError::TargetNotFound`] if a patch file's target file
    ///   does not exist.
    /// - Return any of the I/O variants of [`MergeError`] if the file system
    ///   refuses an operation.
    pub fn merge(&self, target: impl AsRef<Path>, source: impl AsRef<Path>) -> Result<MergeReport> {
        let (target, source) = (target.as_ref(), source.as_ref());
        if !source.is_dir() {
            return Err(MergeError::SourceNotDirectory {
                path: source.to_path_buf(),
            });
        }

        info!(
            "merge {:?} onto {:?} ({:?})",
            source.display(),
            target.display(),
            self.mode
        );
        let mut report = MergeReport::default();
        self.merge_dir(target, source, &mut report)?;
        info!("{report}");

        Ok(report)
    }

    #[instrument(skip_all, level = "debug", fields(dir = ?source))]
    fn merge_dir(&self, target: &Path, source: &Path, report: &mut MergeReport) -> Result<()> {
        if target.exists() && !target.is_dir() {
            return Err(MergeError::CreateDir {
                source: std::io::Error::other("target exists and is not a directory"),
                path: target.to_path_buf(),
            });
        }

        // INVARIANT: Target directory exists before any child is merged into it.
        if self.mode == MergeMode::Apply && !target.is_dir() {
            debug!("create directory {:?}", target.display());
            mkdirp::mkdirp(target).map_err(|err| MergeError::CreateDir {
                source: err,
                path: target.to_path_buf(),
            })?;
        }

        let read_dir_error = |err| MergeError::ReadDir {
            source: err,
            path: source.to_path_buf(),
        };
        let mut entries = read_dir(source)
            .map_err(read_dir_error)?
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(read_dir_error)?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let name = entry.file_name();

            if path.is_dir() {
                self.merge_dir(&target.join(&name), &path, report)?;
            } else if path.is_file() && is_patch_file(&path) {
                self.patch_file(target, &path, report)?;
            } else if path.is_file() {
                self.copy_file(&target.join(&name), &path, report)?;
            } else {
                warn!("skip {:?}, neither file nor directory", path.display());
            }
        }

        Ok(())
    }

    fn patch_file(&self, target_dir: &Path, source: &Path, report: &mut MergeReport) -> Result<()> {
        let patch = PatchFile::open(source)?;

        let target = match patch.target_name() {
            Some(name) => target_dir.join(name),
            None => target_dir.to_path_buf(),
        };
        if !target.is_file() {
            return Err(MergeError::TargetNotFound {
                patch: source.to_path_buf(),
                target,
            });
        }

        // INVARIANT: Read target in full before writing anything back to it.
        let text = read_to_string(&target).map_err(|err| MergeError::ReadTarget {
            source: err,
            path: target.clone(),
        })?;
        let patched = patch.apply(text)?;

        if self.mode == MergeMode::Apply {
            write(&target, patched).map_err(|err| MergeError::WriteTarget {
                source: err,
                path: target.clone(),
            })?;
        }

        debug!("patched {:?} with {:?}", target.display(), source.display());
        report.patched.push(target);

        Ok(())
    }

    fn copy_file(&self, target: &Path, source: &Path, report: &mut MergeReport) -> Result<()> {
        if target.is_dir() {
            return Err(MergeError::RemoveTarget {
                source: std::io::Error::other("target is a directory"),
                path: target.to_path_buf(),
            });
        }

        if self.mode == MergeMode::Apply {
            if target.exists() {
                remove_file(target).map_err(|err| MergeError::RemoveTarget {
                    source: err,
                    path: target.to_path_buf(),
                })?;
            }

            copy(source, target).map_err(|err| MergeError::CopyFile {
                source: err,
                from: source.to_path_buf(),
                to: target.to_path_buf(),
            })?;
        }

        debug!("copied {:?} to {:?}", source.display(), target.display());
        report.copied.push(target.to_path_buf());

        Ok(())
    }
}

/// Outcome of a successful merge.
///
/// Lists target paths in the order they were merged. In
/// [`MergeMode::Check`] the paths are the ones that would have been merged.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct MergeReport {
    /// Target files replaced by a literal copy.
    pub copied: Vec<PathBuf>,

    /// Target files rewritten by a patch file.
    pub patched: Vec<PathBuf>,
}

impl MergeReport {
    /// Determine if merge touched nothing at all.
    pub fn is_empty(&self) -> bool {
        self.copied.is_empty() && self.patched.is_empty()
    }
}

impl Display for MergeReport {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(
            fmt,
            "copied {} file(s), patched {} file(s)",
            self.copied.len(),
            self.patched.len()
        )
    }
}

/// Tree merge error types.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Patch file is malformed, recursive, or unreadable.
    #[error(transparent)]
    Patch(#[from] crate::patch::Error),

    /// Source root is missing or not a directory.
    #[error("source {:?} is not a directory", path.display())]
    SourceNotDirectory { path: PathBuf },

    /// Patch file targets a file that does not exist.
    #[error("patch file {:?} targets missing file {:?}", patch.display(), target.display())]
    TargetNotFound { patch: PathBuf, target: PathBuf },

    /// Source directory cannot be listed.
    #[error("failed to read directory {:?}", path.display())]
    ReadDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Target directory cannot be created.
    #[error("failed to create directory {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Target file of a patch cannot be read.
    #[error("failed to read target file {:?}", path.display())]
    ReadTarget {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Patched text cannot be written back to target file.
    #[error("failed to write target file {:?}", path.display())]
    WriteTarget {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Existing target file cannot be removed before copying over it.
    #[error("failed to remove target file {:?}", path.display())]
    RemoveTarget {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Source file cannot be copied to target.
    #[error("failed to copy {:?} to {:?}", from.display(), to.display())]
    CopyFile {
        #[source]
        source: std::io::Error,
        from: PathBuf,
        to: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = MergeError> = std::result::Result<T, E>;
