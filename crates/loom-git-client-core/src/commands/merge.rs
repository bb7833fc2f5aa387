// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use tracing::instrument;

use super::required;
use crate::backend::GitBackend;
use crate::error::{GitError, Result};
use crate::types::MergeOutcome;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeStrategy {
	/// Let the backend choose.
	#[default]
	Default,
	Resolve,
	Recursive,
	Octopus,
	Ours,
	Subtree,
	/// Recursive, preferring the incoming side on conflict.
	RecursiveTheirs,
}

impl MergeStrategy {
	/// `git merge` arguments selecting this strategy.
	pub fn git_args(&self) -> &'static [&'static str] {
		match self {
			Self::Default => &[],
			Self::Resolve => &["-s", "resolve"],
			Self::Recursive => &["-s", "recursive"],
			Self::Octopus => &["-s", "octopus"],
			Self::Ours => &["-s", "ours"],
			Self::Subtree => &["-s", "subtree"],
			Self::RecursiveTheirs => &["-s", "recursive", "-X", "theirs"],
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FastForwardMode {
	/// Fast-forward when possible, otherwise create a merge commit.
	#[default]
	Ff,
	/// Fail unless the merge is a fast-forward.
	FfOnly,
	/// Always create a merge commit.
	NoFf,
}

impl FastForwardMode {
	pub fn git_arg(&self) -> &'static str {
		match self {
			Self::Ff => "--ff",
			Self::FfOnly => "--ff-only",
			Self::NoFf => "--no-ff",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
	pub revision: Option<String>,
	pub strategy: MergeStrategy,
	pub fast_forward: FastForwardMode,
	pub squash: bool,
	/// Create the merge commit; when false the result is left staged.
	pub commit: bool,
	pub message: Option<String>,
}

impl Default for MergeOptions {
	fn default() -> Self {
		Self {
			revision: None,
			strategy: MergeStrategy::Default,
			fast_forward: FastForwardMode::Ff,
			squash: false,
			commit: true,
			message: None,
		}
	}
}

impl MergeOptions {
	pub fn validate(&self) -> Result<()> {
		self.revision()?;
		if self.squash && self.fast_forward == FastForwardMode::NoFf {
			return Err(GitError::config("squash cannot be combined with no-ff"));
		}
		Ok(())
	}

	pub fn revision(&self) -> Result<&str> {
		required(&self.revision, "merge revision")
	}

	pub fn message_or_default(&self) -> String {
		self.message
			.clone()
			.unwrap_or_else(|| format!("Merge {}", self.revision.as_deref().unwrap_or("revision")))
	}
}

/// Merge a revision into the current branch.
#[must_use = "commands do nothing until executed"]
pub struct MergeCommand<'a> {
	backend: &'a dyn GitBackend,
	options: MergeOptions,
}

impl<'a> MergeCommand<'a> {
	pub(crate) fn new(backend: &'a dyn GitBackend) -> Self {
		Self {
			backend,
			options: MergeOptions::default(),
		}
	}

	pub fn revision(mut self, revision: impl Into<String>) -> Self {
		self.options.revision = Some(revision.into());
		self
	}

	pub fn strategy(mut self, strategy: MergeStrategy) -> Self {
		self.options.strategy = strategy;
		self
	}

	pub fn fast_forward(mut self, mode: FastForwardMode) -> Self {
		self.options.fast_forward = mode;
		self
	}

	pub fn squash(mut self, squash: bool) -> Self {
		self.options.squash = squash;
		self
	}

	pub fn commit(mut self, commit: bool) -> Self {
		self.options.commit = commit;
		self
	}

	pub fn message(mut self, message: impl Into<String>) -> Self {
		self.options.message = Some(message.into());
		self
	}

	pub fn options(&self) -> &MergeOptions {
		&self.options
	}

	#[instrument(skip_all, fields(backend = %self.backend.kind()))]
	pub async fn execute(self) -> Result<MergeOutcome> {
		self.options.validate()?;
		self.backend.merge(&self.options).await
	}
}
