// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use tracing::instrument;

use super::{required, validate_timeout};
use crate::backend::GitBackend;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOptions {
	/// A URL or the name of a configured remote.
	pub remote: Option<String>,
	/// Refspec to push, e.g. `HEAD:refs/heads/main`.
	pub refspec: Option<String>,
	pub force: bool,
	pub tags: bool,
	pub timeout: Option<u64>,
}

impl PushOptions {
	pub fn validate(&self) -> Result<()> {
		self.remote()?;
		self.refspec()?;
		validate_timeout(self.timeout)
	}

	pub fn remote(&self) -> Result<&str> {
		required(&self.remote, "push remote")
	}

	pub fn refspec(&self) -> Result<&str> {
		required(&self.refspec, "push refspec")
	}
}

/// Push a refspec to a URL or named remote.
#[must_use = "commands do nothing until executed"]
pub struct PushCommand<'a> {
	backend: &'a dyn GitBackend,
	options: PushOptions,
}

impl<'a> PushCommand<'a> {
	pub(crate) fn new(backend: &'a dyn GitBackend) -> Self {
		Self {
			backend,
			options: PushOptions::default(),
		}
	}

	pub fn to(mut self, remote: impl Into<String>) -> Self {
		self.options.remote = Some(remote.into());
		self
	}

	pub fn refspec(mut self, refspec: impl Into<String>) -> Self {
		self.options.refspec = Some(refspec.into());
		self
	}

	pub fn force(mut self, force: bool) -> Self {
		self.options.force = force;
		self
	}

	pub fn tags(mut self, tags: bool) -> Self {
		self.options.tags = tags;
		self
	}

	/// Timeout in seconds.
	pub fn timeout(mut self, secs: u64) -> Self {
		self.options.timeout = Some(secs);
		self
	}

	pub fn options(&self) -> &PushOptions {
		&self.options
	}

	#[instrument(skip_all, fields(backend = %self.backend.kind()))]
	pub async fn execute(self) -> Result<()> {
		self.options.validate()?;
		self.backend.push(&self.options).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::GitError;

	#[test]
	fn remote_and_refspec_are_required() {
		let only_remote = PushOptions {
			remote: Some("origin".to_string()),
			..Default::default()
		};
		assert!(matches!(only_remote.validate(), Err(GitError::Config(_))));

		let complete = PushOptions {
			refspec: Some("HEAD:refs/heads/main".to_string()),
			..only_remote
		};
		assert!(complete.validate().is_ok());
	}
}
