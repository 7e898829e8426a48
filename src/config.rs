// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout for the deployment manifest to simplify the process of
//! serialization and deserialization. File I/O is left to the caller to
//! figure out.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Deployment manifest layout.
///
/// A manifest lists every __target__ that a patch tree should be deployed
/// to. Each target describes where to look for installs of an application,
/// which patch tree to merge onto every install found, and which directories
/// of an install should be pruned first.
///
/// # General Layout
///
/// ```toml
/// [[target]]
/// name = "cura"
/// locations = ["C:/Program Files", "~/apps"]
/// directory_contains = "ultimaker cura"
/// patches = "patches"
///
/// [[target.prune]]
/// directory = "resources/definitions"
/// keep = ["fdmprinter.def.json", "prusa_*.def.json"]
/// ```
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Manifest {
    /// Deployment targets.
    #[serde(rename = "target", default)]
    pub targets: Vec<TargetDefinition>,
}

impl Manifest {
    /// Anchor relative patch tree paths at a base directory.
    ///
    /// Manifests name their patch trees relative to the manifest file itself,
    /// so callers pass the directory the manifest was read from.
    pub fn resolve_relative_to(mut self, base: impl AsRef<Path>) -> Self {
        for target in &mut self.targets {
            if target.patches.is_relative() {
                target.patches = base.as_ref().join(&target.patches);
            }
        }

        self
    }

    /// Find target by name.
    pub fn target(&self, name: impl AsRef<str>) -> Option<&TargetDefinition> {
        self.targets
            .iter()
            .find(|target| target.name == name.as_ref())
    }
}

impl FromStr for Manifest {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut manifest: Manifest = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every path field.
        for target in &mut manifest.targets {
            target.locations = target
                .locations
                .iter()
                .map(expand_path)
                .collect::<Result<Vec<_>>>()?;
            target.patches = expand_path(&target.patches)?;
        }

        Ok(manifest)
    }
}

impl Display for Manifest {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Single deployment target.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct TargetDefinition {
    /// Name to refer to target by.
    pub name: String,

    /// Parent directories that may contain installs.
    pub locations: Vec<PathBuf>,

    /// Case-insensitive text an install's directory name must contain.
    pub directory_contains: String,

    /// Patch tree to merge onto each install.
    pub patches: PathBuf,

    /// Directories of an install to prune before merging.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prune: Vec<PruneRule>,
}

/// Prune rule of a deployment target.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct PruneRule {
    /// Directory to prune, relative to the install.
    pub directory: PathBuf,

    /// Glob patterns of file names to keep.
    pub keep: Vec<String>,
}

fn expand_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref().to_string_lossy();
    Ok(PathBuf::from(
        shellexpand::full(path.as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("APPS", "/opt/apps"), ("PATCHES", "/srv/patches")])]
    fn deserialize_manifest() -> anyhow::Result<()> {
        let result: Manifest = r#"
            [[target]]
            name = "cura"
            locations = ["/usr/share", "$APPS"]
            directory_contains = "ultimaker cura"
            patches = "$PATCHES/cura"

            [[target.prune]]
            directory = "resources/definitions"
            keep = ["fdmprinter.def.json", "prusa_*.def.json"]

            [[target]]
            name = "slicer"
            locations = ["/usr/share"]
            directory_contains = "slicer"
            patches = "slicer"
        "#
        .parse()?;

        let expect = Manifest {
            targets: vec![
                TargetDefinition {
                    name: "cura".into(),
                    locations: vec!["/usr/share".into(), "/opt/apps".into()],
                    directory_contains: "ultimaker cura".into(),
                    patches: "/srv/patches/cura".into(),
                    prune: vec![PruneRule {
                        directory: "resources/definitions".into(),
                        keep: vec!["fdmprinter.def.json".into(), "prusa_*.def.json".into()],
                    }],
                },
                TargetDefinition {
                    name: "slicer".into(),
                    locations: vec!["/usr/share".into()],
                    directory_contains: "slicer".into(),
                    patches: "slicer".into(),
                    prune: Vec::new(),
                },
            ],
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn deserialize_manifest_unknown_variable() {
        let result = r#"
            [[target]]
            name = "cura"
            locations = ["$TREEPATCH_SURELY_UNSET_VARIABLE"]
            directory_contains = "cura"
            patches = "patches"
        "#
        .parse::<Manifest>();

        assert!(matches!(result, Err(ConfigError::ShellExpansion(_))));
    }

    #[test]
    fn serialize_manifest() -> anyhow::Result<()> {
        let manifest = Manifest {
            targets: vec![TargetDefinition {
                name: "cura".into(),
                locations: vec!["/usr/share".into(), "/opt/apps".into()],
                directory_contains: "ultimaker cura".into(),
                patches: "/srv/patches".into(),
                prune: vec![PruneRule {
                    directory: "resources/definitions".into(),
                    keep: vec!["fdmprinter.def.json".into()],
                }],
            }],
        };
        let result = manifest.to_string();

        assert!(result.starts_with("[[target]]\n"));
        assert!(result.contains("[[target.prune]]\n"));
        assert!(result.contains("directory_contains = \"ultimaker cura\"\n"));
        assert_eq!(result.parse::<Manifest>()?, manifest);

        Ok(())
    }

    #[test]
    fn resolve_relative_patch_trees() {
        let manifest = Manifest {
            targets: vec![
                TargetDefinition {
                    name: "relative".into(),
                    patches: "patches".into(),
                    ..Default::default()
                },
                TargetDefinition {
                    name: "absolute".into(),
                    patches: "/srv/patches".into(),
                    ..Default::default()
                },
            ],
        }
        .resolve_relative_to("/etc/treepatch");

        assert_eq!(
            manifest.target("relative").map(|target| target.patches.clone()),
            Some(PathBuf::from("/etc/treepatch/patches"))
        );
        assert_eq!(
            manifest.target("absolute").map(|target| target.patches.clone()),
            Some(PathBuf::from("/srv/patches"))
        );
        assert!(manifest.target("missing").is_none());
    }
}
