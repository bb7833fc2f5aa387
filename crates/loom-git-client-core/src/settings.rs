// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistent client settings.
//!
//! Layered as defaults, then a TOML file, then `LOOM_GIT_*` environment
//! variables. [`GitSettings::install`] pushes the process-wide values
//! (default timeout, host-key strategy) into effect.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::host_key::{set_host_key_verification, HostKeyVerification};
use crate::timeout::{set_default_timeout_secs, DEFAULT_TIMEOUT_SECS};
use crate::types::BackendKind;

pub const ENV_TIMEOUT: &str = "LOOM_GIT_TIMEOUT";
pub const ENV_EXECUTABLE: &str = "LOOM_GIT_EXECUTABLE";
pub const ENV_BACKEND: &str = "LOOM_GIT_BACKEND";

/// Errors that can occur loading or saving settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	/// I/O error reading or writing the settings file
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("TOML serialize error: {0}")]
	TomlSerialize(#[from] toml::ser::Error),

	#[error("Invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },

	#[error("Could not determine config directory")]
	ConfigDirNotFound,
}

impl SettingsError {
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSettings {
	pub default_timeout_secs: u64,
	pub git_executable: String,
	pub backend: BackendKind,
	pub host_key_verification: HostKeyVerification,
}

impl Default for GitSettings {
	fn default() -> Self {
		Self {
			default_timeout_secs: DEFAULT_TIMEOUT_SECS,
			git_executable: "git".to_string(),
			backend: BackendKind::Cli,
			host_key_verification: HostKeyVerification::Disabled,
		}
	}
}

impl GitSettings {
	/// `$XDG_CONFIG_HOME/loom/git.toml`
	pub fn default_path() -> Result<PathBuf, SettingsError> {
		dirs::config_dir()
			.map(|dir| dir.join("loom").join("git.toml"))
			.ok_or(SettingsError::ConfigDirNotFound)
	}

	pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, SettingsError> {
		let settings: Self = toml::from_str(text).map_err(|source| SettingsError::TomlParse {
			path: origin.to_path_buf(),
			source,
		})?;
		settings.validate()?;
		Ok(settings)
	}

	/// Read `path`; a missing file yields the defaults.
	pub fn load_file(path: &Path) -> Result<Self, SettingsError> {
		match std::fs::read_to_string(path) {
			Ok(text) => Self::from_toml_str(&text, path),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				debug!(path = %path.display(), "no git settings file, using defaults");
				Ok(Self::default())
			}
			Err(e) => Err(e.into()),
		}
	}

	/// Defaults, then `path`, then the process environment.
	pub fn load(path: &Path) -> Result<Self, SettingsError> {
		let mut settings = Self::load_file(path)?;
		settings.apply_env(|key| std::env::var(key).ok())?;
		Ok(settings)
	}

	/// Apply `LOOM_GIT_*` overrides looked up through `var`.
	pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), SettingsError> {
		if let Some(raw) = var(ENV_TIMEOUT) {
			self.default_timeout_secs = raw
				.trim()
				.parse()
				.map_err(|_| SettingsError::invalid_value(ENV_TIMEOUT, format!("'{raw}' is not a number of seconds")))?;
		}
		if let Some(exe) = var(ENV_EXECUTABLE).filter(|v| !v.trim().is_empty()) {
			self.git_executable = exe;
		}
		if let Some(raw) = var(ENV_BACKEND) {
			self.backend = raw
				.parse()
				.map_err(|e: crate::error::GitError| SettingsError::invalid_value(ENV_BACKEND, e.to_string()))?;
		}
		self.validate()
	}

	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.default_timeout_secs == 0 {
			return Err(SettingsError::invalid_value(
				"default_timeout_secs",
				"must be at least one second",
			));
		}
		if self.git_executable.trim().is_empty() {
			return Err(SettingsError::invalid_value("git_executable", "must not be empty"));
		}
		Ok(())
	}

	pub fn to_toml_string(&self) -> Result<String, SettingsError> {
		Ok(toml::to_string_pretty(self)?)
	}

	pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, self.to_toml_string()?)?;
		debug!(path = %path.display(), "saved git settings");
		Ok(())
	}

	/// Make these settings the process-wide defaults.
	pub fn install(&self) {
		set_default_timeout_secs(self.default_timeout_secs);
		set_host_key_verification(self.host_key_verification.clone());
		info!(
			timeout_secs = self.default_timeout_secs,
			backend = %self.backend,
			host_key_verification = self.host_key_verification.name(),
			"installed git client settings"
		);
	}
}
