// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::io;
use thiserror::Error;

use crate::version::GitVersion;

pub type Result<T> = std::result::Result<T, GitError>;

#[derive(Debug, Error)]
pub enum GitError {
	/// A command was configured with missing or contradictory options.
	#[error("invalid git command configuration: {0}")]
	Config(String),

	#[error("git command failed: {command} {args:?} (exit code {code:?}): {stderr}")]
	CommandFailed {
		command: String,
		args: Vec<String>,
		code: Option<i32>,
		stderr: String,
	},

	/// The child process was killed after running past its deadline.
	#[error("{command} timed out after {timeout_secs} seconds")]
	Timeout { command: String, timeout_secs: u64 },

	#[error("unsupported protocol in URL {0}")]
	UnsupportedProtocol(String),

	#[error("{feature} requires git {required} or later, found {found}")]
	VersionTooOld {
		feature: &'static str,
		required: GitVersion,
		found: GitVersion,
	},

	/// Temporary credential material could not be written, permissioned or removed.
	#[error("credential materialization failed: {0}")]
	Credentials(String),

	#[error("{operation} is not supported by the {backend} backend")]
	Unsupported {
		backend: &'static str,
		operation: &'static str,
	},

	#[error("merge of {revision} produced conflicts")]
	MergeConflict { revision: String },

	#[error("invalid URL: {0}")]
	InvalidUrl(String),

	#[error("git is not installed or not in PATH")]
	GitNotInstalled,

	#[error("not a git repository: {0}")]
	NotAGitRepo(String),

	#[error("git backend error: {0}")]
	Backend(String),

	#[error("I/O error: {0}")]
	Io(#[from] io::Error),
}

impl GitError {
	/// Create a configuration error
	pub fn config(msg: impl Into<String>) -> Self {
		Self::Config(msg.into())
	}

	/// Create a credential materialization error
	pub fn credentials(msg: impl Into<String>) -> Self {
		Self::Credentials(msg.into())
	}

	pub fn backend(err: impl std::fmt::Display) -> Self {
		Self::Backend(err.to_string())
	}

	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unsupported_protocol_message_is_exact() {
		let err = GitError::UnsupportedProtocol("s3://bucket/repo.git".to_string());
		assert_eq!(err.to_string(), "unsupported protocol in URL s3://bucket/repo.git");
	}

	#[test]
	fn command_failure_includes_args_and_stderr() {
		let err = GitError::CommandFailed {
			command: "git".to_string(),
			args: vec!["fetch".to_string(), "origin".to_string()],
			code: Some(128),
			stderr: "fatal: couldn't find remote ref".to_string(),
		};
		let msg = err.to_string();
		assert!(msg.contains("\"fetch\""));
		assert!(msg.contains("128"));
		assert!(msg.contains("couldn't find remote ref"));
	}

	#[test]
	fn version_too_old_renders_both_versions() {
		let err = GitError::VersionTooOld {
			feature: "submodule update --depth",
			required: GitVersion::new(2, 10, 0, 0),
			found: GitVersion::new(2, 9, 5, 0),
		};
		assert_eq!(
			err.to_string(),
			"submodule update --depth requires git 2.10.0 or later, found 2.9.5"
		);
	}
}
