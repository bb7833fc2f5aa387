// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Fluent, single-shot commands.
//!
//! A command collects options through chainable setters and does no I/O
//! until `execute`, which validates the options, hands them to the backend
//! and consumes the command.

mod checkout;
mod clone;
mod fetch;
mod log;
mod merge;
mod push;
mod submodule;

pub use checkout::{CheckoutCommand, CheckoutOptions};
pub use clone::{CloneCommand, CloneOptions};
pub use fetch::{FetchCommand, FetchOptions};
pub use log::{LogCommand, LogOptions};
pub use merge::{FastForwardMode, MergeCommand, MergeOptions, MergeStrategy};
pub use push::{PushCommand, PushOptions};
pub use submodule::{SubmoduleUpdateCommand, SubmoduleUpdateOptions};

use crate::error::{GitError, Result};

pub(crate) fn validate_timeout(timeout: Option<u64>) -> Result<()> {
	match timeout {
		Some(0) => Err(GitError::config("timeout must be at least one second")),
		_ => Ok(()),
	}
}

pub(crate) fn validate_depth(shallow: bool, depth: Option<u32>) -> Result<()> {
	match depth {
		Some(0) => Err(GitError::config("depth must be at least 1")),
		Some(_) if !shallow => Err(GitError::config("depth requires a shallow operation")),
		_ => Ok(()),
	}
}

pub(crate) fn required<'a>(value: &'a Option<String>, what: &str) -> Result<&'a str> {
	match value.as_deref().map(str::trim) {
		Some(v) if !v.is_empty() => Ok(v),
		_ => Err(GitError::config(format!("{what} is required"))),
	}
}
