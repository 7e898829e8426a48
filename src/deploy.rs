// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Target deployment.
//!
//! Deploying a [`TargetDefinition`] is a three step process for every
//! install discovered under the target's known locations:
//!
//! 1. Prune each directory named by the target's prune rules.
//! 2. Merge the target's patch tree onto the install.
//! 3. Record what happened.
//!
//! The first failing step aborts the whole deployment. Installs deployed
//! before the failure stay deployed.

use crate::{
    config::TargetDefinition,
    discover::discover_installs,
    merge::{MergeMode, MergeReport, TreeMerger},
    prune::Pruner,
};

use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Outcome of deploying onto one install.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Deployment {
    /// Install directory deployed onto.
    pub install: PathBuf,

    /// Files removed by prune rules.
    pub pruned: Vec<PathBuf>,

    /// Outcome of merging the patch tree.
    pub report: MergeReport,
}

/// Deploy target onto every install found.
///
/// In [`MergeMode::Check`] nothing is pruned or merged, but every step is
/// still validated.
///
/// # Errors
///
/// - Return [`DeployError::NoInstalls`] if no install can be found.
/// - Return [`DeployError`] if discovery, pruning, or merging fails.
#[instrument(skip_all, level = "debug", fields(name = %target.name))]
pub fn deploy_target(target: &TargetDefinition, mode: MergeMode) -> Result<Vec<Deployment>> {
    let installs = discover_installs(&target.locations, &target.directory_contains)?;
    if installs.is_empty() {
        return Err(DeployError::NoInstalls {
            name: target.name.clone(),
        });
    }

    let merger = TreeMerger::new(mode);
    let mut deployments = Vec::with_capacity(installs.len());
    for install in installs {
        info!("deploy {:?} onto {:?}", target.name, install.display());
        let pruned = prune_install(target, &install, mode)?;
        let report = merger.merge(&install, &target.patches)?;
        deployments.push(Deployment {
            install,
            pruned,
            report,
        });
    }

    Ok(deployments)
}

fn prune_install(target: &TargetDefinition, install: &Path, mode: MergeMode) -> Result<Vec<PathBuf>> {
    let mut pruned = Vec::new();
    for rule in &target.prune {
        let removed = Pruner::new(&rule.keep)?
            .dry_run(mode == MergeMode::Check)
            .prune(install.join(&rule.directory))?;
        pruned.extend(removed);
    }

    Ok(pruned)
}

/// Deployment error types.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Known locations hold no install of target.
    #[error("no install found for target {name:?}")]
    NoInstalls { name: String },

    #[error(transparent)]
    Discover(#[from] crate::discover::DiscoverError),

    #[error(transparent)]
    Prune(#[from] crate::prune::PruneError),

    #[error(transparent)]
    Merge(#[from] crate::merge::MergeError),
}

/// Friendly result alias :3
pub type Result<T, E = DeployError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PruneRule;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::fs::{create_dir_all, read_to_string, write};

    fn fixture() -> anyhow::Result<TargetDefinition> {
        create_dir_all("programs/Slicer 4.13/resources/definitions")?;
        write("programs/Slicer 4.13/resources/definitions/keep.def.json", "{}")?;
        write("programs/Slicer 4.13/resources/definitions/drop.def.json", "{}")?;
        write("programs/Slicer 4.13/slicer.cfg", "mode=basic")?;
        create_dir_all("patches")?;
        write("patches/slicer.cfg.patch", "basic\n=====\nexpert\n")?;

        Ok(TargetDefinition {
            name: "slicer".into(),
            locations: vec!["programs".into()],
            directory_contains: "slicer".into(),
            patches: "patches".into(),
            prune: vec![PruneRule {
                directory: "resources/definitions".into(),
                keep: vec!["keep.*".into()],
            }],
        })
    }

    #[sealed_test]
    fn deploy_prunes_then_merges() -> anyhow::Result<()> {
        let target = fixture()?;
        let result = deploy_target(&target, MergeMode::Apply)?;

        let install = PathBuf::from("programs/Slicer 4.13");
        let expect = vec![Deployment {
            install: install.clone(),
            pruned: vec![install.join("resources/definitions/drop.def.json")],
            report: MergeReport {
                copied: Vec::new(),
                patched: vec![install.join("slicer.cfg")],
            },
        }];
        assert_eq!(result, expect);
        assert_eq!(read_to_string(install.join("slicer.cfg"))?, "mode=expert");
        assert!(!install.join("resources/definitions/drop.def.json").exists());

        Ok(())
    }

    #[sealed_test]
    fn deploy_check_touches_nothing() -> anyhow::Result<()> {
        let target = fixture()?;
        let result = deploy_target(&target, MergeMode::Check)?;

        let install = PathBuf::from("programs/Slicer 4.13");
        assert_eq!(result.len(), 1);
        assert_eq!(read_to_string(install.join("slicer.cfg"))?, "mode=basic");
        assert!(install.join("resources/definitions/drop.def.json").exists());

        Ok(())
    }

    #[sealed_test]
    fn deploy_without_installs() -> anyhow::Result<()> {
        let mut target = fixture()?;
        target.directory_contains = "blender".into();
        let result = deploy_target(&target, MergeMode::Apply);
        assert!(matches!(result, Err(DeployError::NoInstalls { .. })));

        Ok(())
    }
}
