// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GitError;

/// Which implementation executes commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
	/// The `git` executable, run as a subprocess.
	#[default]
	Cli,
	/// The in-process gitoxide library.
	Embedded,
}

impl BackendKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Cli => "cli",
			Self::Embedded => "embedded",
		}
	}
}

impl fmt::Display for BackendKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for BackendKind {
	type Err = GitError;

	/// Accepts the names hosts use to pick a tool: `git`/`cli` for the
	/// subprocess backend, `embedded`/`gix`/`jgit` for the in-process one.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"git" | "cli" => Ok(Self::Cli),
			"embedded" | "gix" | "jgit" => Ok(Self::Embedded),
			other => Err(GitError::config(format!("unknown git backend '{other}'"))),
		}
	}
}

/// Commit information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
	/// Full 40-character SHA
	pub sha: String,
	pub author_name: String,
	pub author_email: String,
	/// Commit timestamp (unix epoch seconds)
	pub timestamp: i64,
	/// First line of the message
	pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
	AlreadyUpToDate,
	FastForward { head: String },
	Merged { head: String },
	/// Changes were applied to the index and work tree but not committed.
	Uncommitted,
}

/// A submodule as configured in `.git/config` or `.gitmodules`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmoduleEntry {
	pub name: String,
	pub url: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn backend_names() {
		assert_eq!("git".parse::<BackendKind>().unwrap(), BackendKind::Cli);
		assert_eq!("CLI".parse::<BackendKind>().unwrap(), BackendKind::Cli);
		assert_eq!("jgit".parse::<BackendKind>().unwrap(), BackendKind::Embedded);
		assert_eq!("gix".parse::<BackendKind>().unwrap(), BackendKind::Embedded);
		assert!(matches!("svn".parse::<BackendKind>(), Err(GitError::Config(_))));
	}
}
