// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use loom_git_client_core::timeout::{as_duration, describe_with_timeout, effective_timeout_secs};
use loom_git_client_core::{GitError, LogSink};
use tokio::task::JoinHandle;
use tracing::debug;

/// Interrupt flag that a timer raises once the operation's timeout elapses.
///
/// gitoxide checks the flag between protocol and checkout steps. Work that
/// does not poll it, such as establishing a connection, runs past the
/// deadline until it next checks.
pub struct Deadline {
	description: String,
	timeout_secs: u64,
	flag: Arc<AtomicBool>,
	timer: JoinHandle<()>,
}

impl Deadline {
	/// Log `description # timeout=<secs>` and start the timer.
	pub fn arm(description: impl Into<String>, timeout: Option<u64>, sink: &dyn LogSink) -> Self {
		let description = description.into();
		let timeout_secs = effective_timeout_secs(timeout);
		let line = describe_with_timeout(&description, timeout_secs);
		sink.line(&line);
		debug!(command = %line, "interrupt armed; not every step observes it");

		let flag = Arc::new(AtomicBool::new(false));
		let timer = tokio::spawn({
			let flag = Arc::clone(&flag);
			async move {
				tokio::time::sleep(as_duration(timeout_secs)).await;
				flag.store(true, Ordering::SeqCst);
			}
		});
		Self {
			description,
			timeout_secs,
			flag,
			timer,
		}
	}

	pub fn flag(&self) -> Arc<AtomicBool> {
		Arc::clone(&self.flag)
	}

	pub fn expired(&self) -> bool {
		self.flag.load(Ordering::SeqCst)
	}

	/// Map a failure to [`GitError::Timeout`] when the deadline caused it.
	pub fn classify(&self, err: GitError) -> GitError {
		if self.expired() {
			GitError::Timeout {
				command: self.description.clone(),
				timeout_secs: self.timeout_secs,
			}
		} else {
			err
		}
	}
}

impl Drop for Deadline {
	fn drop(&mut self) {
		self.timer.abort();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use loom_git_client_core::BufferSink;

	#[tokio::test]
	async fn logs_the_timeout_when_armed() {
		let sink = BufferSink::new();
		let deadline = Deadline::arm(" > fetch https://example.com/r.git", Some(9), &sink);
		assert_eq!(sink.lines(), vec![" > fetch https://example.com/r.git # timeout=9"]);
		assert!(!deadline.expired());
	}

	/// Test: the flag is raised at the deadline and errors become timeouts.
	///
	/// Why this test is important: callers distinguish a stuck transfer from
	/// a failed one by the error variant.
	#[tokio::test]
	async fn expiry_raises_flag_and_classifies() {
		let sink = BufferSink::new();
		let deadline = Deadline::arm("clone", Some(1), &sink);
		tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
		assert!(deadline.expired());
		let err = deadline.classify(GitError::backend("interrupted"));
		assert!(matches!(err, GitError::Timeout { timeout_secs: 1, .. }));
	}

	#[tokio::test]
	async fn errors_before_expiry_are_kept() {
		let sink = BufferSink::new();
		let deadline = Deadline::arm("clone", None, &sink);
		assert!(sink.lines()[0].starts_with("clone # timeout="));
		let err = deadline.classify(GitError::backend("boom"));
		assert!(matches!(err, GitError::Backend(_)));
	}
}
