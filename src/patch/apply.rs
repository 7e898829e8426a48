// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Patch application.
//!
//! Applying a patch file is pure text transformation. Reading the target
//! file, and writing the result back, is left to the caller.
//!
//! # Recursion Safety
//!
//! Before any text is touched, every pair of the patch file is checked with
//! [`PatchPair::is_recursive`]. A single recursive pair rejects the whole
//! patch file, so a target file is either patched by every pair or by none.
//!
//! # Ordering
//!
//! Pairs are applied in file order. Each pair searches the text produced by
//! the pairs before it, not the original text. Every match is replaced
//! literally, no pattern syntax is involved.

use crate::patch::{Error, PatchFile, PatchPair, Result};

use tracing::{debug, warn};

impl PatchFile {
    /// Reject patch file if any of its pairs is recursive.
    ///
    /// # Errors
    ///
    /// - Return [`Error::RecursivePatch`] naming the first recursive pair.
    pub fn check_recursion(&self) -> Result<()> {
        match self.pairs().iter().position(PatchPair::is_recursive) {
            Some(index) => Err(Error::RecursivePatch {
                path: self.path().to_path_buf(),
                index,
            }),
            None => Ok(()),
        }
    }

    /// Apply all pairs to text.
    ///
    /// # Errors
    ///
    /// - Return [`Error::RecursivePatch`] if any pair is recursive. No pair
    ///   is applied in that case.
    pub fn apply(&self, text: impl Into<String>) -> Result<String> {
        self.check_recursion()?;

        let mut patched = text.into();
        for (index, pair) in self.pairs().iter().enumerate() {
            let matches = patched.matches(pair.find.as_str()).count();
            if matches == 0 {
                warn!(
                    "patch {index} of {:?} matched nothing",
                    self.path().display()
                );
                continue;
            }

            debug!(
                "patch {index} of {:?} replaced {matches} matches",
                self.path().display()
            );
            patched = patched.replace(pair.find.as_str(), pair.replace.as_str());
        }

        Ok(patched)
    }
}
