// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use tracing::instrument;

use crate::backend::GitBackend;
use crate::error::{GitError, Result};
use crate::types::CommitInfo;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
	/// `<rev>` or `<exclude>..<include>`; `HEAD` when unset.
	pub range: Option<String>,
	pub max_count: Option<usize>,
}

impl LogOptions {
	pub fn validate(&self) -> Result<()> {
		if let Some(range) = &self.range {
			if range.trim().is_empty() {
				return Err(GitError::config("log range must not be empty"));
			}
			if let Some((_, include)) = range.split_once("..") {
				if include.starts_with('.') {
					return Err(GitError::config("symmetric difference ranges are not supported"));
				}
			}
		}
		if self.max_count == Some(0) {
			return Err(GitError::config("max count must be at least 1"));
		}
		Ok(())
	}

	/// Split the range into (excluded, included) revisions.
	pub fn bounds(&self) -> (Option<&str>, &str) {
		match self.range.as_deref() {
			Some(range) => match range.split_once("..") {
				Some((exclude, include)) => (
					Some(exclude).filter(|e| !e.is_empty()),
					if include.is_empty() { "HEAD" } else { include },
				),
				None => (None, range),
			},
			None => (None, "HEAD"),
		}
	}
}

/// List commits reachable from a revision.
#[must_use = "commands do nothing until executed"]
pub struct LogCommand<'a> {
	backend: &'a dyn GitBackend,
	options: LogOptions,
}

impl<'a> LogCommand<'a> {
	pub(crate) fn new(backend: &'a dyn GitBackend) -> Self {
		Self {
			backend,
			options: LogOptions::default(),
		}
	}

	pub fn range(mut self, range: impl Into<String>) -> Self {
		self.options.range = Some(range.into());
		self
	}

	/// Commits reachable from `include` but not from `exclude`.
	pub fn between(mut self, exclude: &str, include: &str) -> Self {
		self.options.range = Some(format!("{exclude}..{include}"));
		self
	}

	pub fn max_count(mut self, count: usize) -> Self {
		self.options.max_count = Some(count);
		self
	}

	pub fn options(&self) -> &LogOptions {
		&self.options
	}

	#[instrument(skip_all, fields(backend = %self.backend.kind()))]
	pub async fn execute(self) -> Result<Vec<CommitInfo>> {
		self.options.validate()?;
		self.backend.log(&self.options).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bounds_split_ranges() {
		let open = LogOptions::default();
		assert_eq!(open.bounds(), (None, "HEAD"));

		let range = LogOptions {
			range: Some("v1.0..main".to_string()),
			..Default::default()
		};
		assert_eq!(range.bounds(), (Some("v1.0"), "main"));

		let trailing = LogOptions {
			range: Some("origin/main..".to_string()),
			..Default::default()
		};
		assert_eq!(trailing.bounds(), (Some("origin/main"), "HEAD"));
	}

	#[test]
	fn symmetric_difference_is_rejected() {
		let options = LogOptions {
			range: Some("a...b".to_string()),
			..Default::default()
		};
		assert!(matches!(options.validate(), Err(GitError::Config(_))));
	}
}
