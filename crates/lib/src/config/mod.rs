//! Deployment descriptor parsing and runtime classification.
//!
//! Only the handful of `app.yaml` fields that decide how an application is
//! staged are read; everything else in the descriptor is ignored.
//!
//! # Modules
//!
//! - [`version`] - Target runtime minor version determination

pub mod version;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors loading or interpreting a deployment descriptor.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_yaml::Error },

  #[error("unrecognized runtime {runtime:?}: expected \"go\" or \"go1\" followed by a version")]
  UnrecognizedRuntime { runtime: String },
}

/// The subset of `app.yaml` that affects staging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
  #[serde(default, deserialize_with = "scalar_string")]
  pub runtime: String,
  #[serde(default)]
  pub vm: bool,
  #[serde(default, deserialize_with = "scalar_string")]
  pub env: String,
  #[serde(default, deserialize_with = "scalar_string")]
  pub api_version: String,
}

/// Accept any YAML scalar as a string (`env: 2` is a number).
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  use serde_yaml::Value;

  match Value::deserialize(deserializer)? {
    Value::Null => Ok(String::new()),
    Value::String(s) => Ok(s),
    Value::Number(n) => Ok(n.to_string()),
    Value::Bool(b) => Ok(b.to_string()),
    other => Err(serde::de::Error::custom(format!("expected a scalar, found {other:?}"))),
  }
}

impl AppConfig {
  /// Read and parse the descriptor at `path`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = %path.display(), runtime = %config.runtime, env = %config.env, "loaded app config");
    Ok(config)
  }

  /// Parse descriptor text. An empty document yields the default configuration.
  pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
    if content.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(content)
  }

  /// Whether the descriptor targets the flexible environment.
  pub fn is_flex(&self) -> bool {
    self.vm || matches!(self.env.as_str(), "flex" | "flexible" | "2")
  }

  /// Decide which runtime family the application targets.
  pub fn runtime_kind(&self) -> Result<RuntimeKind, ConfigError> {
    if self.is_flex() {
      return Ok(RuntimeKind::Flex);
    }
    if self.runtime == "go" {
      return Ok(RuntimeKind::LegacyStandard);
    }
    if self.runtime.starts_with("go1") {
      return Ok(RuntimeKind::StandardSecondGen);
    }
    Err(ConfigError::UnrecognizedRuntime {
      runtime: self.runtime.clone(),
    })
  }
}

/// Runtime family an application is deployed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeKind {
  LegacyStandard,
  Flex,
  StandardSecondGen,
}

impl fmt::Display for RuntimeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      RuntimeKind::LegacyStandard => "standard",
      RuntimeKind::Flex => "flexible",
      RuntimeKind::StandardSecondGen => "standard (second generation)",
    };
    write!(f, "{name}")
  }
}

/// Module support setting taken from `GO111MODULE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleMode {
  #[default]
  Auto,
  On,
  Off,
}

impl ModuleMode {
  /// Interpret a `GO111MODULE` value. Unknown values mean [`ModuleMode::Auto`].
  pub fn parse(value: &str) -> Self {
    match value.trim().to_ascii_lowercase().as_str() {
      "on" => ModuleMode::On,
      "off" => ModuleMode::Off,
      _ => ModuleMode::Auto,
    }
  }

  /// Read the setting from the process environment.
  pub fn from_env() -> Self {
    std::env::var("GO111MODULE")
      .map(|v| Self::parse(&v))
      .unwrap_or_default()
  }
}
