//! Implementation of the staging command.
//!
//! Reads the service descriptor, settles the target Go version, selects a
//! staging strategy and writes the staged tree.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use appstager_lib::config::version::{VersionError, fetch_catalog_minor_version, minor_version};
use appstager_lib::config::{AppConfig, ModuleMode};
use appstager_lib::package::GoProvider;
use appstager_lib::platform::paths;
use appstager_lib::stage::{StagingStrategy, stage};

use crate::output::{OutputFormat, print_json, print_report};

/// Arguments of a staging run.
pub struct StageArgs {
  pub service_yaml: PathBuf,
  pub app_dir: PathBuf,
  pub staged_dir: PathBuf,
  pub go_version: Option<String>,
  pub flex_runtimes_url: String,
}

pub fn cmd_stage(args: &StageArgs, output: OutputFormat) -> Result<()> {
  let start = Instant::now();

  let config = AppConfig::load(&args.service_yaml)?;
  let kind = config.runtime_kind()?;

  let minor = minor_version(&config, kind, args.go_version.as_deref(), || {
    let rt = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .map_err(|e| VersionError::CatalogFetch {
        url: args.flex_runtimes_url.clone(),
        reason: format!("failed to create async runtime: {e}"),
      })?;
    rt.block_on(fetch_catalog_minor_version(&args.flex_runtimes_url))
  })?;
  info!("staging for go1.{minor}");

  let strategy = StagingStrategy::select(kind, minor, paths::workspace_roots(), ModuleMode::from_env());
  let report = stage(&strategy, &GoProvider::new(), &args.app_dir, &args.staged_dir)
    .with_context(|| format!("Staging {kind} app"))?;

  if output.is_json() {
    print_json(&report)?;
  } else {
    print_report(&report, minor, start.elapsed());
  }

  Ok(())
}
