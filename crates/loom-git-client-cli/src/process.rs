// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Timeout-bounded child process execution.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use loom_git_client_core::timeout::{describe_with_timeout, effective_timeout_secs};
use loom_git_client_core::urls::{redact_url, MASK};
use loom_git_client_core::{GitError, LogSink, Result};
use tokio::process::Command;
use tracing::{debug, trace, warn};

/// One command-line argument. Masked arguments are replaced by `****`
/// wherever the command line is logged or reported.
#[derive(Clone, PartialEq, Eq)]
pub enum Arg {
	Plain(String),
	Masked(String),
}

impl Arg {
	fn value(&self) -> &str {
		match self {
			Self::Plain(v) | Self::Masked(v) => v,
		}
	}

	fn display(&self) -> String {
		match self {
			Self::Plain(v) => redact_url(v),
			Self::Masked(_) => MASK.to_string(),
		}
	}
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
	pub stdout: String,
	pub stderr: String,
}

/// A fully described child process: program, arguments, directory,
/// environment overlay and timeout.
#[derive(Clone)]
pub struct Invocation {
	program: String,
	args: Vec<Arg>,
	cwd: Option<PathBuf>,
	env: Vec<(String, String)>,
	timeout_secs: Option<u64>,
}

impl Invocation {
	pub fn new(program: impl Into<String>) -> Self {
		Self {
			program: program.into(),
			args: Vec::new(),
			cwd: None,
			env: Vec::new(),
			timeout_secs: None,
		}
	}

	pub fn arg(mut self, arg: impl Into<String>) -> Self {
		self.args.push(Arg::Plain(arg.into()));
		self
	}

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(|a| Arg::Plain(a.into())));
		self
	}

	pub fn masked_arg(mut self, arg: impl Into<String>) -> Self {
		self.args.push(Arg::Masked(arg.into()));
		self
	}

	pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
		self.cwd = Some(dir.as_ref().to_path_buf());
		self
	}

	pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.env.push((key.into(), value.into()));
		self
	}

	pub fn envs<I>(mut self, vars: I) -> Self
	where
		I: IntoIterator<Item = (String, String)>,
	{
		self.env.extend(vars);
		self
	}

	/// Timeout in seconds; the process-wide default applies when unset.
	pub fn timeout(mut self, secs: Option<u64>) -> Self {
		self.timeout_secs = secs;
		self
	}

	/// Arguments as they may appear in logs and errors.
	pub fn display_args(&self) -> Vec<String> {
		self.args.iter().map(Arg::display).collect()
	}

	/// ` > <program> <args...>` with credentials redacted.
	pub fn command_line(&self) -> String {
		let mut line = format!(" > {}", self.program);
		for arg in self.display_args() {
			line.push(' ');
			line.push_str(&arg);
		}
		line
	}

	/// Run to completion or until the timeout, whichever comes first.
	///
	/// The command line and its timeout are written to `sink` before the
	/// child starts. A child still running at the deadline is killed and the
	/// call fails with [`GitError::Timeout`]. No retries are attempted.
	pub async fn run(&self, sink: &dyn LogSink) -> Result<ProcessOutput> {
		let timeout_secs = effective_timeout_secs(self.timeout_secs);
		let line = describe_with_timeout(&self.command_line(), timeout_secs);
		sink.line(&line);
		debug!(command = %line, cwd = ?self.cwd, "running git command");

		let mut cmd = Command::new(&self.program);
		cmd.args(self.args.iter().map(Arg::value))
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.env("GIT_TERMINAL_PROMPT", "0");
		if let Some(cwd) = &self.cwd {
			cmd.current_dir(cwd);
		}
		for (key, value) in &self.env {
			cmd.env(key, value);
		}

		let child = cmd.spawn().map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				warn!(program = %self.program, "git not found in PATH");
				GitError::GitNotInstalled
			} else {
				GitError::Io(e)
			}
		})?;

		// Dropping the wait future on timeout drops the child, which kills it.
		let output = match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
			Ok(result) => result?,
			Err(_) => {
				warn!(command = %line, "git command timed out, killed");
				return Err(GitError::Timeout {
					command: self.command_line().trim_start_matches(" > ").to_string(),
					timeout_secs,
				});
			}
		};

		let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
		let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

		if output.status.success() {
			trace!(stdout_len = stdout.len(), "git command succeeded");
			Ok(ProcessOutput { stdout, stderr })
		} else {
			Err(GitError::CommandFailed {
				command: self.program.clone(),
				args: self.display_args(),
				code: output.status.code(),
				stderr,
			})
		}
	}
}
