// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::credentials::CredentialSet;
use crate::proxy::ProxyConfig;
use crate::sink::{LogSink, TracingSink};

/// Everything a backend is bound to for its lifetime: one work tree, one
/// credential set, one proxy and one log sink.
#[derive(Clone)]
pub struct BackendContext {
	pub work_tree: PathBuf,
	pub credentials: CredentialSet,
	pub proxy: Option<ProxyConfig>,
	/// Extra variables for child processes, applied over the inherited
	/// environment.
	pub env: BTreeMap<String, String>,
	pub sink: Arc<dyn LogSink>,
}

impl BackendContext {
	pub fn new(work_tree: impl Into<PathBuf>) -> Self {
		Self {
			work_tree: work_tree.into(),
			credentials: CredentialSet::new(),
			proxy: None,
			env: BTreeMap::new(),
			sink: Arc::new(TracingSink),
		}
	}

	pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
		self.proxy = Some(proxy);
		self
	}

	pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
		self.sink = sink;
		self
	}

	pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.env.insert(key.into(), value.into());
		self
	}

	pub fn with_credentials(mut self, credentials: CredentialSet) -> Self {
		self.credentials = credentials;
		self
	}

	pub fn work_tree(&self) -> &Path {
		&self.work_tree
	}

	/// Look up a variable in the overlay, then the process environment.
	pub fn var(&self, key: &str) -> Option<String> {
		self.env
			.get(key)
			.cloned()
			.or_else(|| std::env::var(key).ok())
	}
}

impl fmt::Debug for BackendContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BackendContext")
			.field("work_tree", &self.work_tree)
			.field("proxy", &self.proxy)
			.field("env_keys", &self.env.keys().collect::<Vec<_>>())
			.finish_non_exhaustive()
	}
}
