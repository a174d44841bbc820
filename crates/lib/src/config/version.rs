//! Target runtime minor version determination.
//!
//! The minor version `N` of `go1.N` decides which release tags the build
//! context enables. It comes from, in order of preference:
//!
//! 1. An explicit `1.N` override
//! 2. The descriptor (`api_version` for legacy standard, `runtime` otherwise)
//! 3. The remote runtime catalog, for flexible apps declaring the unpinned `go` runtime

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use super::{AppConfig, RuntimeKind};
use crate::consts::STANDARD_DEFAULT_MINOR_VERSION;

/// Appended to catalog failures, which usually point at a publishing problem rather than user error.
pub const BUG_REPORT_HINT: &str =
  "This may be a bug, please file a report at https://issuetracker.google.com/issues/new?component=322870.";

/// Errors determining the target minor version.
#[derive(Debug, Error)]
pub enum VersionError {
  #[error("invalid --go-version value: {value}")]
  InvalidOverride { value: String },

  #[error("invalid api_version value {value}")]
  InvalidApiVersion { value: String },

  #[error("invalid runtime value {runtime}")]
  InvalidRuntime { runtime: String },

  #[error("unable to stage for runtime {runtime:?}")]
  UnsupportedFlexRuntime { runtime: String },

  #[error("failed to download runtimes.yaml from {url}: {reason}\n{hint}", hint = BUG_REPORT_HINT)]
  CatalogFetch { url: String, reason: String },

  #[error("{reason}\n{hint}", hint = BUG_REPORT_HINT)]
  CatalogFormat { reason: String },
}

/// Determine the minor version to stage for.
///
/// `catalog` is only invoked for flexible apps declaring the unpinned `go`
/// runtime, so callers can defer network access until it is needed.
pub fn minor_version<F>(
  config: &AppConfig,
  kind: RuntimeKind,
  override_version: Option<&str>,
  catalog: F,
) -> Result<u32, VersionError>
where
  F: FnOnce() -> Result<u32, VersionError>,
{
  if let Some(value) = override_version.filter(|v| !v.is_empty()) {
    return parse_minor(value, "1.").ok_or_else(|| VersionError::InvalidOverride {
      value: value.to_string(),
    });
  }

  match kind {
    RuntimeKind::LegacyStandard => {
      if config.api_version == "go1" {
        return Ok(STANDARD_DEFAULT_MINOR_VERSION);
      }
      parse_go1_minor(&config.api_version).ok_or_else(|| VersionError::InvalidApiVersion {
        value: config.api_version.clone(),
      })
    }
    RuntimeKind::StandardSecondGen => {
      let dotted = config.runtime.replacen("go1", "go1.", 1);
      parse_go1_minor(&dotted).ok_or_else(|| VersionError::InvalidRuntime {
        runtime: config.runtime.clone(),
      })
    }
    RuntimeKind::Flex => {
      if config.runtime == "go" {
        debug!("unpinned flexible runtime, consulting runtime catalog");
        return catalog();
      }
      parse_go1_minor(&config.runtime).ok_or_else(|| VersionError::UnsupportedFlexRuntime {
        runtime: config.runtime.clone(),
      })
    }
  }
}

/// Parse `go1.N`, treating a release-candidate `go1.NRC` as `go1.N`.
pub fn parse_go1_minor(value: &str) -> Option<u32> {
  parse_minor(value.strip_suffix("RC").unwrap_or(value), "go1.")
}

/// Parse the decimal minor version following `prefix`.
pub fn parse_minor(value: &str, prefix: &str) -> Option<u32> {
  let digits = value.strip_prefix(prefix)?;
  if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  digits.parse().ok()
}

#[derive(Debug, Deserialize)]
struct RuntimeCatalog {
  #[serde(default)]
  runtimes: HashMap<String, CatalogEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogEntry {
  #[serde(default)]
  target: CatalogTarget,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogTarget {
  #[serde(default)]
  runtime: String,
}

/// Extract the default Go minor version from `runtimes.yaml` content.
pub fn parse_catalog(content: &str) -> Result<u32, VersionError> {
  let catalog: RuntimeCatalog = serde_yaml::from_str(content).map_err(|e| VersionError::CatalogFormat {
    reason: format!("failed to parse runtimes.yaml: {e}"),
  })?;
  let Some(entry) = catalog.runtimes.get("go") else {
    return Err(VersionError::CatalogFormat {
      reason: "missing go runtime config in runtimes.yaml".to_string(),
    });
  };
  let target = &entry.target.runtime;
  parse_minor(target, "go1.").ok_or_else(|| VersionError::CatalogFormat {
    reason: format!("invalid go runtime version in runtimes.yaml: {target}"),
  })
}

/// Download the runtime catalog at `url` and return its default Go minor version.
pub async fn fetch_catalog_minor_version(url: &str) -> Result<u32, VersionError> {
  info!(url = %url, "fetching runtime catalog");

  let response = reqwest::get(url).await.map_err(|e| VersionError::CatalogFetch {
    url: url.to_string(),
    reason: e.to_string(),
  })?;

  if !response.status().is_success() {
    return Err(VersionError::CatalogFetch {
      url: url.to_string(),
      reason: format!("HTTP {}", response.status()),
    });
  }

  let body = response.text().await.map_err(|e| VersionError::CatalogFetch {
    url: url.to_string(),
    reason: e.to_string(),
  })?;

  let minor = parse_catalog(&body)?;
  debug!(minor, "runtime catalog default");
  Ok(minor)
}
