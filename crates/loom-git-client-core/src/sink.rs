// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use parking_lot::Mutex;

/// Line-oriented destination for the command lines a client runs.
pub trait LogSink: Send + Sync {
	fn line(&self, line: &str);
}

/// Forwards lines to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
	fn line(&self, line: &str) {
		tracing::info!(target: "loom_git_client", "{line}");
	}
}

/// Keeps every line in memory; used by hosts that attach output to a build
/// log after the fact.
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
	lines: Arc<Mutex<Vec<String>>>,
}

impl BufferSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn lines(&self) -> Vec<String> {
		self.lines.lock().clone()
	}

	pub fn contains(&self, needle: &str) -> bool {
		self.lines.lock().iter().any(|l| l.contains(needle))
	}
}

impl LogSink for BufferSink {
	fn line(&self, line: &str) {
		self.lines.lock().push(line.to_string());
	}
}
