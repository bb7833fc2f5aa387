// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! SSH host-key verification policy.
//!
//! One strategy is active per process. Each network command reads it once
//! and turns it into OpenSSH `-o` options. The CLI backend exports them
//! through `GIT_SSH_COMMAND`; the embedded backend installs them as the
//! `core.sshCommand` its transport spawns.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GitError, Result};

#[cfg(windows)]
const NULL_DEVICE: &str = "NUL";
#[cfg(not(windows))]
const NULL_DEVICE: &str = "/dev/null";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum HostKeyVerification {
	/// Trust every host key and record nothing.
	#[default]
	Disabled,
	/// Trust on first use; later mismatches are rejected.
	AcceptFirstConnection {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		known_hosts: Option<PathBuf>,
	},
	/// Only hosts already present in the known-hosts file are accepted.
	KnownHostsFile {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		known_hosts: Option<PathBuf>,
	},
	/// Only the operator-supplied keys are accepted; known-hosts files are ignored.
	ManuallyProvided { approved_host_keys: String },
}

impl HostKeyVerification {
	pub fn name(&self) -> &'static str {
		match self {
			Self::Disabled => "disabled",
			Self::AcceptFirstConnection { .. } => "accept_first_connection",
			Self::KnownHostsFile { .. } => "known_hosts_file",
			Self::ManuallyProvided { .. } => "manually_provided",
		}
	}

	/// Known-hosts lines that must be written to a scoped file before
	/// [`HostKeyVerification::ssh_options`] can be rendered.
	pub fn inline_known_hosts(&self) -> Option<&str> {
		match self {
			Self::ManuallyProvided { approved_host_keys } => Some(approved_host_keys.as_str()),
			_ => None,
		}
	}

	/// OpenSSH `-o` option values for this strategy.
	///
	/// `materialized` is the path the caller wrote [`Self::inline_known_hosts`]
	/// to; it is required for [`HostKeyVerification::ManuallyProvided`].
	pub fn ssh_options(&self, materialized: Option<&Path>) -> Result<Vec<String>> {
		let mut options = Vec::with_capacity(3);
		match self {
			Self::Disabled => {
				options.push("StrictHostKeyChecking=no".to_string());
				options.push(format!("UserKnownHostsFile={NULL_DEVICE}"));
			}
			Self::AcceptFirstConnection { known_hosts } => {
				options.push("StrictHostKeyChecking=accept-new".to_string());
				if let Some(path) = known_hosts {
					options.push(format!("UserKnownHostsFile={}", path.display()));
				}
			}
			Self::KnownHostsFile { known_hosts } => {
				options.push("StrictHostKeyChecking=yes".to_string());
				if let Some(path) = known_hosts {
					options.push(format!("UserKnownHostsFile={}", path.display()));
				}
			}
			Self::ManuallyProvided { .. } => {
				let path = materialized.ok_or_else(|| {
					GitError::credentials("approved host keys were not written to a known-hosts file")
				})?;
				options.push("StrictHostKeyChecking=yes".to_string());
				options.push(format!("UserKnownHostsFile={}", path.display()));
				options.push(format!("GlobalKnownHostsFile={NULL_DEVICE}"));
			}
		}
		Ok(options)
	}
}

static ACTIVE: LazyLock<RwLock<HostKeyVerification>> =
	LazyLock::new(|| RwLock::new(HostKeyVerification::default()));

/// The strategy network commands consult. Defaults to
/// [`HostKeyVerification::Disabled`].
pub fn active_host_key_verification() -> HostKeyVerification {
	ACTIVE.read().clone()
}

pub fn set_host_key_verification(strategy: HostKeyVerification) {
	info!(strategy = strategy.name(), "host key verification strategy changed");
	*ACTIVE.write() = strategy;
}

/// Render an `ssh` invocation suitable for `GIT_SSH_COMMAND` or
/// `core.sshCommand`, which git hands to a shell.
///
/// `program` is a shell fragment such as `ssh` or `ssh -F /etc/ci/ssh_config`
/// and is inserted as-is; everything appended is quoted.
pub fn ssh_command_line(program: &str, identity: Option<&Path>, options: &[String]) -> String {
	let mut parts = vec![program.to_string()];
	if let Some(identity) = identity {
		parts.push("-i".to_string());
		parts.push(shell_quote(&identity.display().to_string()));
		parts.push("-o".to_string());
		parts.push("IdentitiesOnly=yes".to_string());
	}
	for option in options {
		parts.push("-o".to_string());
		parts.push(shell_quote(option));
	}
	parts.join(" ")
}

fn shell_quote(value: &str) -> String {
	let plain = !value.is_empty()
		&& value
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '=' | ':' | '\\' | '@'));
	if plain {
		value.to_string()
	} else {
		format!("'{}'", value.replace('\'', "'\\''"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_is_disabled() {
		assert_eq!(HostKeyVerification::default(), HostKeyVerification::Disabled);
	}

	#[test]
	fn disabled_trusts_everything() {
		let options = HostKeyVerification::Disabled.ssh_options(None).unwrap();
		assert_eq!(options[0], "StrictHostKeyChecking=no");
		assert!(options[1].starts_with("UserKnownHostsFile="));
	}

	#[test]
	fn accept_first_connection_uses_accept_new() {
		let strategy = HostKeyVerification::AcceptFirstConnection {
			known_hosts: Some(PathBuf::from("/home/ci/.ssh/known_hosts")),
		};
		assert_eq!(
			strategy.ssh_options(None).unwrap(),
			vec![
				"StrictHostKeyChecking=accept-new".to_string(),
				"UserKnownHostsFile=/home/ci/.ssh/known_hosts".to_string(),
			]
		);
	}

	#[test]
	fn known_hosts_file_is_strict() {
		let strategy = HostKeyVerification::KnownHostsFile { known_hosts: None };
		assert_eq!(
			strategy.ssh_options(None).unwrap(),
			vec!["StrictHostKeyChecking=yes".to_string()]
		);
	}

	/// Test: a manually provided key must be materialized before use.
	///
	/// Why this test is important: rendering strict options without the
	/// scoped known-hosts file would make ssh fall back to the user's global
	/// store, which this strategy promises to ignore.
	#[test]
	fn manually_provided_requires_materialized_file() {
		let strategy = HostKeyVerification::ManuallyProvided {
			approved_host_keys: "github.com ssh-ed25519 AAAA".to_string(),
		};
		assert!(matches!(strategy.ssh_options(None), Err(GitError::Credentials(_))));

		let options = strategy.ssh_options(Some(Path::new("/tmp/ws@tmp/kh"))).unwrap();
		assert!(options.contains(&"UserKnownHostsFile=/tmp/ws@tmp/kh".to_string()));
		assert!(options.iter().any(|o| o.starts_with("GlobalKnownHostsFile=")));
		assert_eq!(strategy.inline_known_hosts(), Some("github.com ssh-ed25519 AAAA"));
	}

	#[test]
	fn command_line_quotes_unsafe_values() {
		let line = ssh_command_line(
			"ssh",
			Some(Path::new("/tmp/my keys/id")),
			&["UserKnownHostsFile=/tmp/a b".to_string()],
		);
		assert_eq!(
			line,
			"ssh -i '/tmp/my keys/id' -o IdentitiesOnly=yes -o 'UserKnownHostsFile=/tmp/a b'"
		);
	}

	#[test]
	fn serializes_with_strategy_tag() {
		let json = serde_json::to_string(&HostKeyVerification::KnownHostsFile {
			known_hosts: Some(PathBuf::from("/k")),
		})
		.unwrap();
		assert_eq!(json, r#"{"strategy":"known_hosts_file","known_hosts":"/k"}"#);

		let back: HostKeyVerification =
			serde_json::from_str(r#"{"strategy":"accept_first_connection"}"#).unwrap();
		assert_eq!(back, HostKeyVerification::AcceptFirstConnection { known_hosts: None });
	}

	#[test]
	fn active_strategy_round_trips() {
		let previous = active_host_key_verification();
		let strategy = HostKeyVerification::KnownHostsFile { known_hosts: None };
		set_host_key_verification(strategy.clone());
		assert_eq!(active_host_key_verification(), strategy);
		set_host_key_verification(previous);
	}
}
