// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Patch file representation.
//!
//! A __patch file__ describes an ordered list of literal find/replace
//! substitutions to perform on exactly one target file.
//!
//! # Patch File Layout
//!
//! A patch file is plain text split into __sections__ by delimiter lines. A
//! delimiter line is any line that starts with at least five `=` characters.
//! Sections alternate between find text and replace text, so a valid patch
//! file always holds an even number of sections:
//!
//! ```text
//! <find text 1>
//! =====
//! <replace text 1>
//! =====
//! <find text 2>
//! =====
//! <replace text 2>
//! ```
//!
//! Sections may span several lines, and may be empty. An empty replace
//! section deletes its find text from the target.
//!
//! # Target Naming
//!
//! A patch file named `Settings.CFG.patch` targets a sibling file named
//! `settings.cfg` in the corresponding target directory. The base name is
//! lower-cased, and the `.patch` suffix is stripped.
//!
//! # See Also
//!
//! 1. [`parse`]
//! 2. [`apply`]

pub mod apply;
pub mod parse;

use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

/// Extension that marks a file as a patch file.
pub const PATCH_EXTENSION: &str = ".patch";

/// Single find/replace substitution.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct PatchPair {
    /// Literal text to search for.
    pub find: String,

    /// Literal text to substitute in place of every match.
    pub replace: String,
}

impl PatchPair {
    /// Construct new patch pair.
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }

    /// Determine if pair can keep matching its own output.
    ///
    /// A pair is recursive if substituting its find text inside its own
    /// replace text changes the replace text. Empty find text and pairs whose
    /// find and replace text are identical are always treated as recursive.
    pub fn is_recursive(&self) -> bool {
        if self.find.is_empty() || self.find == self.replace {
            return true;
        }

        self.replace.replace(&self.find, &self.replace) != self.replace
    }
}

/// Parsed patch file.
///
/// # Invariant
///
/// - Pairs are kept in file order.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct PatchFile {
    path: PathBuf,
    pairs: Vec<PatchPair>,
}

impl PatchFile {
    /// Read and parse patch file from disk.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ReadPatchFile`] if patch file cannot be read.
    /// - Return [`Error::MalformedPatchFile`] if patch file holds an odd
    ///   number of sections.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = read_to_string(&path).map_err(|err| Error::ReadPatchFile {
            source: err,
            path: path.clone(),
        })?;

        Self::parse(path, text)
    }

    /// Path of patch file.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Ordered find/replace pairs of patch file.
    pub fn pairs(&self) -> &[PatchPair] {
        self.pairs.as_slice()
    }

    /// Name of file this patch targets.
    ///
    /// Returns `None` if the patch file path has no usable base name.
    pub fn target_name(&self) -> Option<String> {
        self.path
            .file_name()
            .and_then(|name| target_name(name.to_string_lossy().as_ref()))
    }
}

/// Determine if path names a patch file.
///
/// Extension check is case-insensitive.
pub fn is_patch_file(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .file_name()
        .map(|name| {
            name.to_string_lossy()
                .to_lowercase()
                .ends_with(PATCH_EXTENSION)
        })
        .unwrap_or(false)
}

/// Derive target file name from patch file name.
///
/// Lower-cases the name and strips the trailing `.patch` extension. Returns
/// `None` if the name does not carry the extension, or nothing remains after
/// stripping it.
pub fn target_name(file_name: &str) -> Option<String> {
    file_name
        .to_lowercase()
        .strip_suffix(PATCH_EXTENSION)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
}

/// Patch file error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Patch file cannot be read.
    #[error("failed to read patch file {:?}", path.display())]
    ReadPatchFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Patch file does not pair every find section with a replace section.
    #[error("patch file {:?} has an odd amount of sections ({sections})", path.display())]
    MalformedPatchFile { path: PathBuf, sections: usize },

    /// Patch file contains a pair that can be applied repeatedly.
    #[error("patch {index} in patch file {:?} is recursive (able to be patched repeatedly)", path.display())]
    RecursivePatch { path: PathBuf, index: usize },
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case("settings.cfg.patch", Some("settings.cfg"); "plain")]
    #[test_case("Settings.CFG.patch", Some("settings.cfg"); "mixed case name")]
    #[test_case("fdmprinter.def.json.PATCH", Some("fdmprinter.def.json"); "upper case extension")]
    #[test_case("my.patch.notes.patch", Some("my.patch.notes"); "only trailing extension")]
    #[test_case(".patch", None; "nothing left")]
    #[test_case("readme.txt", None; "not a patch")]
    #[test]
    fn derive_target_name(file_name: &str, expect: Option<&str>) {
        pretty_assertions::assert_eq!(target_name(file_name), expect.map(ToString::to_string));
    }

    #[test_case("dir/settings.cfg.patch", true; "lower case")]
    #[test_case("dir/SETTINGS.CFG.PATCH", true; "upper case")]
    #[test_case("dir/settings.patched", false; "longer extension")]
    #[test_case("dir/patch", false; "bare word")]
    #[test]
    fn detect_patch_file(path: &str, expect: bool) {
        pretty_assertions::assert_eq!(is_patch_file(path), expect);
    }

    #[test_case("foo", "foofoo", true; "replace repeats find")]
    #[test_case("x", "xyx", true; "replace wraps find")]
    #[test_case("", "anything", true; "empty find")]
    #[test_case("", "", true; "empty pair")]
    #[test_case("same", "same", true; "no-op pair")]
    #[test_case("old", "new", false; "plain swap")]
    #[test_case("value=1", "", false; "deletion")]
    #[test_case("foofoo", "foo", false; "shrinking")]
    #[test]
    fn detect_recursive_pair(find: &str, replace: &str, expect: bool) {
        pretty_assertions::assert_eq!(PatchPair::new(find, replace).is_recursive(), expect);
    }
}
