// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Patch file parsing.
//!
//! Split raw patch file text into sections, then group those sections into
//! ordered find/replace pairs.

use crate::patch::{Error, PatchFile, PatchPair, Result};

use std::path::PathBuf;
use tracing::debug;

/// Prefix that marks a line as a section delimiter.
pub const DELIMITER: &str = "=====";

impl PatchFile {
    /// Parse raw patch file text.
    ///
    /// The path is only used to identify the patch file in errors and for
    /// target name derivation. Nothing is read from disk.
    ///
    /// # Errors
    ///
    /// - Return [`Error::MalformedPatchFile`] if text splits into an odd
    ///   number of sections.
    pub fn parse(path: impl Into<PathBuf>, text: impl AsRef<str>) -> Result<Self> {
        let path = path.into();
        let sections = split_sections(text.as_ref());
        debug!("{:?} has {} sections", path.display(), sections.len());

        if sections.len() % 2 != 0 {
            return Err(Error::MalformedPatchFile {
                path,
                sections: sections.len(),
            });
        }

        let mut pairs = Vec::with_capacity(sections.len() / 2);
        let mut sections = sections.into_iter();
        while let (Some(find), Some(replace)) = (sections.next(), sections.next()) {
            pairs.push(PatchPair { find, replace });
        }

        Ok(Self { path, pairs })
    }
}

/// Split patch text into sections.
///
/// Carriage returns are dropped before splitting into lines. Every delimiter
/// line closes the current section, even an empty one. Blank lines at the
/// start of a section are dropped, blank lines inside it are kept. Whatever
/// follows the final delimiter only counts as a section if it holds any text.
pub fn split_sections(text: &str) -> Vec<String> {
    let text = text.replace('\r', "");
    let mut sections = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if is_delimiter(line) {
            sections.push(std::mem::take(&mut current));
        } else if current.is_empty() {
            current.push_str(line);
        } else {
            current.push('\n');
            current.push_str(line);
        }
    }

    if !current.is_empty() {
        sections.push(current);
    }

    sections
}

/// Determine if line is a section delimiter.
pub fn is_delimiter(line: &str) -> bool {
    line.starts_with(DELIMITER)
}
