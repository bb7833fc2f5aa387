// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Process-wide default for command timeouts, in seconds.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Timeout applied to network commands that do not set one: ten minutes.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

static DEFAULT_TIMEOUT: AtomicU64 = AtomicU64::new(DEFAULT_TIMEOUT_SECS);

pub fn default_timeout_secs() -> u64 {
	DEFAULT_TIMEOUT.load(Ordering::Relaxed)
}

/// Replace the process-wide default. Zero is ignored.
pub fn set_default_timeout_secs(secs: u64) {
	if secs > 0 {
		DEFAULT_TIMEOUT.store(secs, Ordering::Relaxed);
	}
}

/// The timeout a command will run with: its own, or the process default.
pub fn effective_timeout_secs(explicit: Option<u64>) -> u64 {
	explicit.unwrap_or_else(default_timeout_secs)
}

pub fn as_duration(secs: u64) -> Duration {
	Duration::from_secs(secs)
}

/// Render the log line operators grep for: `<description> # timeout=<secs>`.
pub fn describe_with_timeout(description: &str, secs: u64) -> String {
	format!("{description} # timeout={secs}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn explicit_timeout_wins() {
		assert_eq!(effective_timeout_secs(Some(7)), 7);
	}

	#[test]
	fn log_suffix_format() {
		assert_eq!(
			describe_with_timeout(" > git fetch origin", 42),
			" > git fetch origin # timeout=42"
		);
	}

	#[test]
	fn zero_default_is_ignored() {
		let before = default_timeout_secs();
		set_default_timeout_secs(0);
		assert_eq!(default_timeout_secs(), before);
	}
}
