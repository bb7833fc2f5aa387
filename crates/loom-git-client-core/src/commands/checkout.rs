// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use tracing::instrument;

use super::{required, validate_timeout};
use crate::backend::GitBackend;
use crate::error::{GitError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutOptions {
	/// Commit, branch or tag to check out.
	pub reference: Option<String>,
	/// Create (or reset) this local branch at `reference`.
	pub branch: Option<String>,
	/// Delete an existing `branch` first instead of failing.
	pub delete_branch_if_exists: bool,
	/// Discard local modifications.
	pub force: bool,
	pub timeout: Option<u64>,
}

impl CheckoutOptions {
	pub fn validate(&self) -> Result<()> {
		self.reference()?;
		if self.delete_branch_if_exists && self.branch.is_none() {
			return Err(GitError::config("delete_branch_if_exists requires a branch name"));
		}
		if let Some(branch) = &self.branch {
			if branch.trim().is_empty() || branch.contains(char::is_whitespace) {
				return Err(GitError::config(format!("invalid branch name '{branch}'")));
			}
		}
		validate_timeout(self.timeout)
	}

	pub fn reference(&self) -> Result<&str> {
		required(&self.reference, "checkout reference")
	}
}

/// Check out a revision, optionally onto a named branch.
#[must_use = "commands do nothing until executed"]
pub struct CheckoutCommand<'a> {
	backend: &'a dyn GitBackend,
	options: CheckoutOptions,
}

impl<'a> CheckoutCommand<'a> {
	pub(crate) fn new(backend: &'a dyn GitBackend) -> Self {
		Self {
			backend,
			options: CheckoutOptions::default(),
		}
	}

	pub fn reference(mut self, reference: impl Into<String>) -> Self {
		self.options.reference = Some(reference.into());
		self
	}

	pub fn branch(mut self, branch: impl Into<String>) -> Self {
		self.options.branch = Some(branch.into());
		self
	}

	pub fn delete_branch_if_exists(mut self, delete: bool) -> Self {
		self.options.delete_branch_if_exists = delete;
		self
	}

	pub fn force(mut self, force: bool) -> Self {
		self.options.force = force;
		self
	}

	/// Timeout in seconds.
	pub fn timeout(mut self, secs: u64) -> Self {
		self.options.timeout = Some(secs);
		self
	}

	pub fn options(&self) -> &CheckoutOptions {
		&self.options
	}

	#[instrument(skip_all, fields(backend = %self.backend.kind()))]
	pub async fn execute(self) -> Result<()> {
		self.options.validate()?;
		self.backend.checkout(&self.options).await
	}
}
