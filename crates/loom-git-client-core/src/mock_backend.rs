// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::backend::GitBackend;
use crate::commands::{
	CheckoutOptions, CloneOptions, FetchOptions, LogOptions, MergeOptions, PushOptions,
	SubmoduleUpdateOptions,
};
use crate::context::BackendContext;
use crate::error::{GitError, Result};
use crate::refs::matches_pattern;
use crate::types::{BackendKind, CommitInfo, MergeOutcome, SubmoduleEntry};

/// Recorded call to the mock backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockCall {
	Init,
	Clone(CloneOptions),
	Fetch(FetchOptions),
	Checkout(CheckoutOptions),
	Merge(MergeOptions),
	Push(PushOptions),
	SubmoduleUpdate(SubmoduleUpdateOptions),
	Log(LogOptions),
	RevParse(String),
	Tag(String, Option<String>),
	SetRemoteUrl(String, String),
	AddRemote(String, String),
	Prune(String),
	AddSubmodule(String, String),
	SetSubmoduleUrl(String, String),
}

/// In-memory backend for exercising the command model without git.
#[derive(Clone)]
pub struct MockGitBackend {
	context: BackendContext,
	/// Revision → commit id answers for `rev_parse`.
	pub revisions: HashMap<String, String>,
	pub remotes: Arc<Mutex<BTreeMap<String, String>>>,
	pub tags: Arc<Mutex<Vec<String>>>,
	pub commits: Vec<CommitInfo>,
	/// If set, network operations fail with this message.
	pub network_error: Option<String>,
	/// Track calls for verification.
	pub calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockGitBackend {
	pub fn new(context: BackendContext) -> Self {
		Self {
			context,
			revisions: HashMap::new(),
			remotes: Arc::new(Mutex::new(BTreeMap::new())),
			tags: Arc::new(Mutex::new(Vec::new())),
			commits: Vec::new(),
			network_error: None,
			calls: Arc::new(Mutex::new(Vec::new())),
		}
	}

	pub fn with_revision(mut self, revision: impl Into<String>, sha: impl Into<String>) -> Self {
		self.revisions.insert(revision.into(), sha.into());
		self
	}

	pub fn with_remote(self, name: impl Into<String>, url: impl Into<String>) -> Self {
		self.remotes.lock().insert(name.into(), url.into());
		self
	}

	pub fn with_commits(mut self, commits: Vec<CommitInfo>) -> Self {
		self.commits = commits;
		self
	}

	pub fn with_network_error(mut self, error: impl Into<String>) -> Self {
		self.network_error = Some(error.into());
		self
	}

	/// Returns the recorded calls.
	pub fn get_calls(&self) -> Vec<MockCall> {
		self.calls.lock().clone()
	}

	fn record(&self, call: MockCall) {
		self.calls.lock().push(call);
	}

	fn network(&self) -> Result<()> {
		match &self.network_error {
			Some(message) => Err(GitError::Backend(message.clone())),
			None => Ok(()),
		}
	}
}

#[async_trait]
impl GitBackend for MockGitBackend {
	fn kind(&self) -> BackendKind {
		BackendKind::Cli
	}

	fn context(&self) -> &BackendContext {
		&self.context
	}

	async fn init(&self) -> Result<()> {
		self.record(MockCall::Init);
		Ok(())
	}

	async fn has_repository(&self) -> bool {
		true
	}

	async fn clone_repository(&self, options: &CloneOptions) -> Result<()> {
		self.record(MockCall::Clone(options.clone()));
		self.network()
	}

	async fn fetch(&self, options: &FetchOptions) -> Result<()> {
		self.record(MockCall::Fetch(options.clone()));
		self.network()
	}

	async fn checkout(&self, options: &CheckoutOptions) -> Result<()> {
		self.record(MockCall::Checkout(options.clone()));
		Ok(())
	}

	async fn merge(&self, options: &MergeOptions) -> Result<MergeOutcome> {
		self.record(MockCall::Merge(options.clone()));
		Ok(MergeOutcome::AlreadyUpToDate)
	}

	async fn push(&self, options: &PushOptions) -> Result<()> {
		self.record(MockCall::Push(options.clone()));
		self.network()
	}

	async fn submodule_update(&self, options: &SubmoduleUpdateOptions) -> Result<()> {
		self.record(MockCall::SubmoduleUpdate(options.clone()));
		self.network()
	}

	async fn log(&self, options: &LogOptions) -> Result<Vec<CommitInfo>> {
		self.record(MockCall::Log(options.clone()));
		let limit = options.max_count.unwrap_or(usize::MAX);
		Ok(self.commits.iter().take(limit).cloned().collect())
	}

	async fn rev_parse(&self, revision: &str) -> Result<Option<String>> {
		self.record(MockCall::RevParse(revision.to_string()));
		Ok(self.revisions.get(revision).cloned())
	}

	async fn tag(&self, name: &str, message: Option<&str>) -> Result<()> {
		self.record(MockCall::Tag(name.to_string(), message.map(str::to_string)));
		self.tags.lock().push(name.to_string());
		Ok(())
	}

	async fn tag_names(&self, pattern: Option<&str>) -> Result<Vec<String>> {
		Ok(self
			.tags
			.lock()
			.iter()
			.filter(|t| pattern.map_or(true, |p| matches_pattern(t, p)))
			.cloned()
			.collect())
	}

	async fn remote_names(&self) -> Result<Vec<String>> {
		Ok(self.remotes.lock().keys().cloned().collect())
	}

	async fn remote_url(&self, remote: &str) -> Result<Option<String>> {
		Ok(self.remotes.lock().get(remote).cloned())
	}

	async fn set_remote_url(&self, remote: &str, url: &str) -> Result<()> {
		self.record(MockCall::SetRemoteUrl(remote.to_string(), url.to_string()));
		self.remotes.lock().insert(remote.to_string(), url.to_string());
		Ok(())
	}

	async fn add_remote(&self, remote: &str, url: &str) -> Result<()> {
		self.record(MockCall::AddRemote(remote.to_string(), url.to_string()));
		self.remotes.lock().insert(remote.to_string(), url.to_string());
		Ok(())
	}

	async fn remote_references(
		&self,
		_url: &str,
		pattern: Option<&str>,
		_heads: bool,
		_tags: bool,
	) -> Result<BTreeMap<String, String>> {
		self.network()?;
		Ok(self
			.revisions
			.iter()
			.filter(|(name, _)| name.starts_with("refs/"))
			.filter(|(name, _)| pattern.map_or(true, |p| matches_pattern(name, p)))
			.map(|(name, sha)| (name.clone(), sha.clone()))
			.collect())
	}

	async fn prune(&self, remote: &str) -> Result<()> {
		self.record(MockCall::Prune(remote.to_string()));
		self.network()
	}

	async fn add_submodule(&self, url: &str, path: &str) -> Result<()> {
		self.record(MockCall::AddSubmodule(url.to_string(), path.to_string()));
		Ok(())
	}

	async fn submodule_urls(&self) -> Result<Vec<SubmoduleEntry>> {
		Ok(Vec::new())
	}

	async fn set_submodule_url(&self, name: &str, url: &str) -> Result<()> {
		self.record(MockCall::SetSubmoduleUrl(name.to_string(), url.to_string()));
		Ok(())
	}
}
