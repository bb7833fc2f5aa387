// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use tracing::instrument;

use super::{validate_depth, validate_timeout};
use crate::backend::GitBackend;
use crate::error::{GitError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmoduleUpdateOptions {
	pub recursive: bool,
	/// Update to the submodule's remote-tracking branch instead of the
	/// recorded commit.
	pub remote_tracking: bool,
	/// Local repository to borrow objects from.
	pub reference: Option<PathBuf>,
	/// Use the parent repository's credentials for submodules that have none.
	pub parent_credentials: bool,
	pub shallow: bool,
	pub depth: Option<u32>,
	/// Number of submodules fetched in parallel.
	pub threads: Option<u32>,
	pub timeout: Option<u64>,
}

impl SubmoduleUpdateOptions {
	pub fn validate(&self) -> Result<()> {
		validate_depth(self.shallow, self.depth)?;
		if self.threads == Some(0) {
			return Err(GitError::config("threads must be at least 1"));
		}
		validate_timeout(self.timeout)
	}

	pub fn effective_depth(&self) -> Option<u32> {
		if self.shallow {
			Some(self.depth.unwrap_or(1))
		} else {
			None
		}
	}
}

/// Initialize and update every submodule of the work tree.
#[must_use = "commands do nothing until executed"]
pub struct SubmoduleUpdateCommand<'a> {
	backend: &'a dyn GitBackend,
	options: SubmoduleUpdateOptions,
}

impl<'a> SubmoduleUpdateCommand<'a> {
	pub(crate) fn new(backend: &'a dyn GitBackend) -> Self {
		Self {
			backend,
			options: SubmoduleUpdateOptions::default(),
		}
	}

	pub fn recursive(mut self, recursive: bool) -> Self {
		self.options.recursive = recursive;
		self
	}

	pub fn remote_tracking(mut self, remote_tracking: bool) -> Self {
		self.options.remote_tracking = remote_tracking;
		self
	}

	pub fn reference(mut self, path: impl Into<PathBuf>) -> Self {
		self.options.reference = Some(path.into());
		self
	}

	pub fn use_parent_credentials(mut self, parent: bool) -> Self {
		self.options.parent_credentials = parent;
		self
	}

	pub fn shallow(mut self, shallow: bool) -> Self {
		self.options.shallow = shallow;
		self
	}

	pub fn depth(mut self, depth: u32) -> Self {
		self.options.depth = Some(depth);
		self
	}

	pub fn threads(mut self, threads: u32) -> Self {
		self.options.threads = Some(threads);
		self
	}

	/// Timeout in seconds, applied to each submodule.
	pub fn timeout(mut self, secs: u64) -> Self {
		self.options.timeout = Some(secs);
		self
	}

	pub fn options(&self) -> &SubmoduleUpdateOptions {
		&self.options
	}

	#[instrument(skip_all, fields(backend = %self.backend.kind()))]
	pub async fn execute(self) -> Result<()> {
		self.options.validate()?;
		self.backend.submodule_update(&self.options).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zero_threads_is_invalid() {
		let options = SubmoduleUpdateOptions {
			threads: Some(0),
			..Default::default()
		};
		assert!(matches!(options.validate(), Err(GitError::Config(_))));
	}

	#[test]
	fn defaults_are_valid() {
		assert!(SubmoduleUpdateOptions::default().validate().is_ok());
	}
}
