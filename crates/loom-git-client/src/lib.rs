// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Loom's git client.
//!
//! Pick a backend by name, point it at a working directory and drive it
//! through [`GitClient`]:
//!
//! ```no_run
//! # async fn run() -> loom_git_client::Result<()> {
//! let client = loom_git_client::Git::named("git")?.in_dir("/tmp/ws").client();
//! client
//! 	.clone_command()
//! 	.url("https://github.com/ghuntley/loom.git")
//! 	.shallow(true)
//! 	.execute()
//! 	.await?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

pub use loom_git_client_cli::CliGitBackend;
pub use loom_git_client_core::*;
pub use loom_git_client_embedded::EmbeddedGitBackend;

/// Builder for a [`GitClient`] bound to one working directory.
#[derive(Clone)]
pub struct Git {
	kind: BackendKind,
	work_tree: PathBuf,
	executable: String,
	sink: Option<Arc<dyn LogSink>>,
	proxy: Option<ProxyConfig>,
	credentials: CredentialSet,
	env: BTreeMap<String, String>,
}

impl Git {
	pub fn new(kind: BackendKind) -> Self {
		Self {
			kind,
			work_tree: PathBuf::from("."),
			executable: "git".to_string(),
			sink: None,
			proxy: None,
			credentials: CredentialSet::new(),
			env: BTreeMap::new(),
		}
	}

	/// Select the backend by tool name: `git`/`cli` or
	/// `embedded`/`gix`/`jgit`.
	pub fn named(name: &str) -> Result<Self> {
		Ok(Self::new(name.parse()?))
	}

	/// Backend and executable from loaded settings. Call
	/// [`GitSettings::install`] separately to apply the process-wide
	/// defaults.
	pub fn from_settings(settings: &GitSettings) -> Self {
		Self::new(settings.backend).executable(settings.git_executable.clone())
	}

	pub fn kind(&self) -> BackendKind {
		self.kind
	}

	pub fn in_dir(mut self, work_tree: impl Into<PathBuf>) -> Self {
		self.work_tree = work_tree.into();
		self
	}

	/// The `git` executable. Ignored by the embedded backend.
	pub fn executable(mut self, executable: impl Into<String>) -> Self {
		self.executable = executable.into();
		self
	}

	pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
		self.sink = Some(sink);
		self
	}

	pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
		self.proxy = Some(proxy);
		self
	}

	/// Use the proxy described by the process environment, if any.
	pub fn proxy_from_environment(mut self) -> Self {
		self.proxy = ProxyConfig::from_environment(|key| std::env::var(key).ok());
		self
	}

	/// Share `credentials` with the client; later inserts are seen by both.
	pub fn credentials(mut self, credentials: CredentialSet) -> Self {
		self.credentials = credentials;
		self
	}

	pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.env.insert(key.into(), value.into());
		self
	}

	pub fn client(self) -> GitClient {
		let mut context = BackendContext::new(self.work_tree).with_credentials(self.credentials);
		if let Some(sink) = self.sink {
			context = context.with_sink(sink);
		}
		if let Some(proxy) = self.proxy {
			context = context.with_proxy(proxy);
		}
		for (key, value) in self.env {
			context = context.with_env(key, value);
		}

		debug!(backend = %self.kind, work_tree = %context.work_tree().display(), "creating git client");
		let backend: Box<dyn GitBackend> = match self.kind {
			BackendKind::Cli => Box::new(CliGitBackend::new(context).with_executable(self.executable)),
			BackendKind::Embedded => Box::new(EmbeddedGitBackend::new(context)),
		};
		GitClient::new(backend)
	}
}

impl std::fmt::Debug for Git {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Git")
			.field("kind", &self.kind)
			.field("work_tree", &self.work_tree)
			.field("executable", &self.executable)
			.field("proxy", &self.proxy)
			.finish_non_exhaustive()
	}
}
