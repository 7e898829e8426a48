// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Install discovery.
//!
//! Locate installed copies of an application by scanning a set of known
//! parent directories. Any child directory whose name contains a given
//! needle, ignoring case, counts as an install. Thus, a needle of
//! `"ultimaker cura"` finds both `Ultimaker Cura 4.13.1` and
//! `UltiMaker Cura 5.7.0` under `C:/Program Files`.

use std::{
    fs::read_dir,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Find install directories under known locations.
///
/// Locations that do not exist, or are not directories, are skipped. Returns
/// a sorted listing of install directories without duplicates.
///
/// # Errors
///
/// - Return [`DiscoverError::ReadLocation`] if an existing location cannot
///   be listed.
pub fn discover_installs(
    locations: impl IntoIterator<Item = impl AsRef<Path>>,
    needle: impl AsRef<str>,
) -> Result<Vec<PathBuf>> {
    let needle = needle.as_ref().to_lowercase();
    let mut installs = Vec::new();

    for location in locations {
        let location = location.as_ref();
        if !location.is_dir() {
            debug!("skip missing location {:?}", location.display());
            continue;
        }

        let read_location_error = |err| DiscoverError::ReadLocation {
            source: err,
            path: location.to_path_buf(),
        };
        for entry in read_dir(location).map_err(read_location_error)? {
            let entry = entry.map_err(read_location_error)?;
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if name.contains(&needle) && entry.path().is_dir() {
                info!("found install {:?}", entry.path().display());
                installs.push(entry.path());
            }
        }
    }

    installs.sort();
    installs.dedup();

    Ok(installs)
}

/// Install discovery error types.
#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    /// Known location exists but cannot be listed.
    #[error("failed to read location {:?}", path.display())]
    ReadLocation {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = DiscoverError> = std::result::Result<T, E>;
