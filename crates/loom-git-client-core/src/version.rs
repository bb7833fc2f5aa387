// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Parsing of `git --version` output.
//!
//! Parsing is pure; feature gating on the parsed value lives with the
//! backend that shells out to git.

use std::fmt;

/// A git release number as (major, minor, revision, build).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GitVersion {
	pub major: u32,
	pub minor: u32,
	pub revision: u32,
	pub build: u32,
}

impl GitVersion {
	pub const fn new(major: u32, minor: u32, revision: u32, build: u32) -> Self {
		Self {
			major,
			minor,
			revision,
			build,
		}
	}

	/// Parse the text printed by `git --version`.
	///
	/// Accepts vendor builds such as `2.30.1.windows.1` (read as 2.30.1.1) and
	/// trailing annotations such as `(Apple Git-146)`. Returns `None` when no
	/// major version can be found.
	pub fn parse(output: &str) -> Option<Self> {
		let text = output.trim();
		let text = text.strip_prefix("git version").unwrap_or(text).trim_start();
		let token = text.split_whitespace().next()?;

		let mut numbers = token
			.split('.')
			.filter(|part| *part != "windows" && *part != "msysgit")
			.map_while(|part| part.parse::<u32>().ok());

		let major = numbers.next()?;
		Some(Self {
			major,
			minor: numbers.next().unwrap_or(0),
			revision: numbers.next().unwrap_or(0),
			build: numbers.next().unwrap_or(0),
		})
	}

	pub fn is_at_least(&self, major: u32, minor: u32, revision: u32, build: u32) -> bool {
		*self >= Self::new(major, minor, revision, build)
	}
}

impl fmt::Display for GitVersion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}.{}", self.major, self.minor, self.revision)?;
		if self.build != 0 {
			write!(f, ".{}", self.build)?;
		}
		Ok(())
	}
}
