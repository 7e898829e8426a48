// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Patch tree deployment.
//!
//! Treepatch merges a __source tree__ of overrides onto a __target tree__.
//! Plain files in the source tree replace their counterpart in the target
//! tree outright. Patch files, i.e., files ending in `.patch`, instead apply
//! an ordered list of literal find/replace substitutions to their target
//! file. Patch files that could keep matching their own output are rejected
//! before their target is touched.
//!
//! # See Also
//!
//! 1. [`patch`] for the patch file format.
//! 2. [`merge`] for the tree merge algorithm.
//! 3. [`config`] for the deployment manifest layout.

pub mod config;
pub mod deploy;
pub mod discover;
pub mod merge;
pub mod patch;
pub mod path;
pub mod prune;

pub use merge::{merge_tree, MergeError, MergeMode, MergeReport, TreeMerger};
pub use patch::{PatchFile, PatchPair};
