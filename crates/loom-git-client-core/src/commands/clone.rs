// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use tracing::instrument;

use super::{required, validate_depth, validate_timeout};
use crate::backend::GitBackend;
use crate::error::{GitError, Result};

pub const DEFAULT_REMOTE: &str = "origin";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneOptions {
	pub url: Option<String>,
	/// Name given to the cloned remote; `origin` when unset.
	pub remote_name: Option<String>,
	/// Local repository to borrow objects from.
	pub reference: Option<PathBuf>,
	/// Fetch refspecs stored on the remote after cloning.
	pub refspecs: Vec<String>,
	pub shallow: bool,
	pub depth: Option<u32>,
	pub no_checkout: bool,
	pub no_tags: bool,
	pub timeout: Option<u64>,
}

impl CloneOptions {
	pub fn validate(&self) -> Result<()> {
		self.url()?;
		validate_depth(self.shallow, self.depth)?;
		validate_timeout(self.timeout)?;
		if self.remote_name().contains(char::is_whitespace) {
			return Err(GitError::config("remote name must not contain whitespace"));
		}
		Ok(())
	}

	pub fn url(&self) -> Result<&str> {
		required(&self.url, "clone URL")
	}

	pub fn remote_name(&self) -> &str {
		self.remote_name.as_deref().unwrap_or(DEFAULT_REMOTE)
	}

	/// Depth to request, if any; a shallow clone without depth fetches one commit.
	pub fn effective_depth(&self) -> Option<u32> {
		if self.shallow {
			Some(self.depth.unwrap_or(1))
		} else {
			None
		}
	}
}

/// Clone a remote repository into the client's work tree.
#[must_use = "commands do nothing until executed"]
pub struct CloneCommand<'a> {
	backend: &'a dyn GitBackend,
	options: CloneOptions,
}

impl<'a> CloneCommand<'a> {
	pub(crate) fn new(backend: &'a dyn GitBackend) -> Self {
		Self {
			backend,
			options: CloneOptions::default(),
		}
	}

	pub fn url(mut self, url: impl Into<String>) -> Self {
		self.options.url = Some(url.into());
		self
	}

	pub fn remote_name(mut self, name: impl Into<String>) -> Self {
		self.options.remote_name = Some(name.into());
		self
	}

	pub fn reference(mut self, path: impl Into<PathBuf>) -> Self {
		self.options.reference = Some(path.into());
		self
	}

	pub fn refspecs<I, S>(mut self, refspecs: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.options.refspecs = refspecs.into_iter().map(Into::into).collect();
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

	pub fn no_checkout(mut self, no_checkout: bool) -> Self {
		self.options.no_checkout = no_checkout;
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

	pub fn options(&self) -> &CloneOptions {
		&self.options
	}

	#[instrument(skip_all, fields(backend = %self.backend.kind()))]
	pub async fn execute(self) -> Result<()> {
		self.options.validate()?;
		self.backend.clone_repository(&self.options).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn url_is_required() {
		assert!(matches!(CloneOptions::default().validate(), Err(GitError::Config(_))));
		let blank = CloneOptions {
			url: Some("  ".to_string()),
			..Default::default()
		};
		assert!(blank.validate().is_err());
	}

	#[test]
	fn depth_requires_shallow() {
		let options = CloneOptions {
			url: Some("https://example.com/r.git".to_string()),
			depth: Some(3),
			..Default::default()
		};
		assert!(matches!(options.validate(), Err(GitError::Config(_))));

		let shallow = CloneOptions {
			shallow: true,
			..options
		};
		assert!(shallow.validate().is_ok());
		assert_eq!(shallow.effective_depth(), Some(3));
	}

	#[test]
	fn shallow_defaults_to_depth_one() {
		let options = CloneOptions {
			url: Some("u".to_string()),
			shallow: true,
			..Default::default()
		};
		assert_eq!(options.effective_depth(), Some(1));
		assert_eq!(options.remote_name(), "origin");
	}

	#[test]
	fn zero_timeout_is_rejected() {
		let options = CloneOptions {
			url: Some("u".to_string()),
			timeout: Some(0),
			..Default::default()
		};
		assert!(options.validate().is_err());
	}
}
