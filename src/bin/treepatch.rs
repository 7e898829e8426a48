// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use treepatch::{
    config::Manifest,
    deploy::deploy_target,
    merge::{MergeMode, TreeMerger},
    path::default_manifest_path,
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::{fs::read_to_string, path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  treepatch [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::Apply(opts) => run_merge(opts, MergeMode::Apply),
            Command::Check(opts) => run_merge(opts, MergeMode::Check),
            Command::Deploy(opts) => run_deploy(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Merge patch tree onto target tree.
    #[command(override_usage = "treepatch apply [options] <target> <source>")]
    Apply(MergeOptions),

    /// Validate patch tree against target tree without writing anything.
    #[command(override_usage = "treepatch check [options] <target> <source>")]
    Check(MergeOptions),

    /// Deploy patch trees onto installs listed in manifest.
    #[command(override_usage = "treepatch deploy [options]")]
    Deploy(DeployOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct MergeOptions {
    /// Directory tree to merge into.
    #[arg(required = true, value_name = "target")]
    pub target: PathBuf,

    /// Directory tree of patch files and overrides.
    #[arg(required = true, value_name = "source")]
    pub source: PathBuf,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DeployOptions {
    /// Path to manifest instead of the default manifest.
    #[arg(short, long, value_name = "path")]
    pub manifest: Option<PathBuf>,

    /// Only deploy target of given name.
    #[arg(short, long, value_name = "name")]
    pub target: Option<String>,

    /// Validate deployment without pruning or merging anything.
    #[arg(short, long)]
    pub dry_run: bool,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_merge(opts: MergeOptions, mode: MergeMode) -> Result<()> {
    let report = TreeMerger::new(mode).merge(&opts.target, &opts.source)?;
    if mode == MergeMode::Check {
        for path in &report.patched {
            info!("would patch {:?}", path.display());
        }
        for path in &report.copied {
            info!("would copy {:?}", path.display());
        }
    }

    Ok(())
}

fn run_deploy(opts: DeployOptions) -> Result<()> {
    let path = match opts.manifest {
        Some(path) => path,
        None => default_manifest_path()?,
    };
    let data = read_to_string(&path)
        .with_context(|| format!("failed to read manifest {:?}", path.display()))?;
    let base = path.parent().map(PathBuf::from).unwrap_or_default();
    let manifest = data.parse::<Manifest>()?.resolve_relative_to(base);

    let targets = match &opts.target {
        Some(name) => vec![manifest
            .target(name)
            .ok_or_else(|| anyhow!("manifest {:?} has no target {name:?}", path.display()))?],
        None => manifest.targets.iter().collect(),
    };

    let mode = if opts.dry_run {
        MergeMode::Check
    } else {
        MergeMode::Apply
    };
    for target in targets {
        for deployment in deploy_target(target, mode)? {
            info!(
                "{:?}: pruned {} file(s), {}",
                deployment.install.display(),
                deployment.pruned.len(),
                deployment.report
            );
        }
    }

    Ok(())
}
