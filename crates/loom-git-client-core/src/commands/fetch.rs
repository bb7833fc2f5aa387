// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use tracing::instrument;

use super::{required, validate_depth, validate_timeout};
use crate::backend::GitBackend;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
	/// A URL or the name of a configured remote.
	pub remote: Option<String>,
	pub refspecs: Vec<String>,
	pub prune: bool,
	pub shallow: bool,
	pub depth: Option<u32>,
	pub no_tags: bool,
	pub timeout: Option<u64>,
}

impl FetchOptions {
	pub fn validate(&self) -> Result<()> {
		self.remote()?;
		validate_depth(self.shallow, self.depth)?;
		validate_timeout(self.timeout)
	}

	pub fn remote(&self) -> Result<&str> {
		required(&self.remote, "fetch remote")
	}

	pub fn effective_depth(&self) -> Option<u32> {
		if self.shallow {
			Some(self.depth.unwrap_or(1))
		} else {
			None
		}
	}
}

/// Fetch from a URL or named remote into the client's repository.
#[must_use = "commands do nothing until executed"]
pub struct FetchCommand<'a> {
	backend: &'a dyn GitBackend,
	options: FetchOptions,
}

impl<'a> FetchCommand<'a> {
	pub(crate) fn new(backend: &'a dyn GitBackend) -> Self {
		Self {
			backend,
			options: FetchOptions::default(),
		}
	}

	/// Fetch from `remote` (URL or remote name) with the given refspecs.
	pub fn from<I, S>(mut self, remote: impl Into<String>, refspecs: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.options.remote = Some(remote.into());
		self.options.refspecs = refspecs.into_iter().map(Into::into).collect();
		self
	}

	pub fn prune(mut self, prune: bool) -> Self {
		self.options.prune = prune;
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

	pub fn tags(mut self, tags: bool) -> Self {
		self.options.no_tags = !tags;
		self
	}

	/// Timeout in seconds.
	pub fn timeout(mut self, secs: u64) -> Self {
		self.options.timeout = Some(secs);
		self
	}

	pub fn options(&self) -> &FetchOptions {
		&self.options
	}

	#[instrument(skip_all, fields(backend = %self.backend.kind()))]
	pub async fn execute(self) -> Result<()> {
		self.options.validate()?;
		self.backend.fetch(&self.options).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::GitError;

	#[test]
	fn remote_is_required() {
		assert!(matches!(FetchOptions::default().validate(), Err(GitError::Config(_))));
	}

	#[test]
	fn zero_depth_is_rejected() {
		let options = FetchOptions {
			remote: Some("origin".to_string()),
			shallow: true,
			depth: Some(0),
			..Default::default()
		};
		assert!(options.validate().is_err());
	}
}
