// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, instrument};

use crate::backend::GitBackend;
use crate::commands::{
	CheckoutCommand, CloneCommand, FetchCommand, LogCommand, MergeCommand, PushCommand,
	SubmoduleUpdateCommand,
};
use crate::credentials::{CredentialLookup, Credentials};
use crate::error::{GitError, Result};
use crate::refs::normalize_branch_spec;
use crate::types::{BackendKind, SubmoduleEntry};

/// A git client bound to one work tree and one backend for its lifetime.
///
/// Commands are built with the `*_command` constructors and run with
/// `execute`. Callers serialize use; nothing here coordinates concurrent
/// commands against the same work tree.
pub struct GitClient {
	backend: Box<dyn GitBackend>,
}

impl GitClient {
	pub fn new(backend: Box<dyn GitBackend>) -> Self {
		Self { backend }
	}

	pub fn kind(&self) -> BackendKind {
		self.backend.kind()
	}

	pub fn work_tree(&self) -> &Path {
		self.backend.context().work_tree()
	}

	pub fn backend(&self) -> &dyn GitBackend {
		self.backend.as_ref()
	}

	pub fn clone_command(&self) -> CloneCommand<'_> {
		CloneCommand::new(self.backend.as_ref())
	}

	pub fn fetch_command(&self) -> FetchCommand<'_> {
		FetchCommand::new(self.backend.as_ref())
	}

	pub fn checkout_command(&self) -> CheckoutCommand<'_> {
		CheckoutCommand::new(self.backend.as_ref())
	}

	pub fn merge_command(&self) -> MergeCommand<'_> {
		MergeCommand::new(self.backend.as_ref())
	}

	pub fn push_command(&self) -> PushCommand<'_> {
		PushCommand::new(self.backend.as_ref())
	}

	pub fn submodule_update_command(&self) -> SubmoduleUpdateCommand<'_> {
		SubmoduleUpdateCommand::new(self.backend.as_ref())
	}

	pub fn log_command(&self) -> LogCommand<'_> {
		LogCommand::new(self.backend.as_ref())
	}

	pub fn add_credentials(&self, url: &str, credentials: Credentials) {
		self.backend.context().credentials.insert(url, credentials);
	}

	pub fn add_default_credentials(&self, credentials: Credentials) {
		self.backend.context().credentials.set_default(credentials);
	}

	pub fn clear_credentials(&self) {
		self.backend.context().credentials.clear();
	}

	/// Fetch credentials `id` from the host's store and use them for `url`.
	pub async fn add_credentials_from_lookup(
		&self,
		url: &str,
		id: &str,
		lookup: &dyn CredentialLookup,
	) -> Result<()> {
		self.backend
			.context()
			.credentials
			.insert_from_lookup(url, id, lookup)
			.await
	}

	pub async fn init(&self) -> Result<()> {
		self.backend.init().await
	}

	pub async fn has_repository(&self) -> bool {
		self.backend.has_repository().await
	}

	pub async fn rev_parse(&self, revision: &str) -> Result<Option<String>> {
		self.backend.rev_parse(revision).await
	}

	/// Resolve a user-supplied branch or tag name to a commit id, trying the
	/// normalized candidates in order.
	#[instrument(skip(self), fields(backend = %self.kind()))]
	pub async fn resolve_branch(&self, spec: &str) -> Result<String> {
		let remotes = self.backend.remote_names().await?;
		for candidate in normalize_branch_spec(spec, &remotes) {
			if let Some(sha) = self.backend.rev_parse(&candidate).await? {
				debug!(candidate = %candidate, sha = %sha, "resolved branch spec");
				return Ok(sha);
			}
		}
		Err(GitError::config(format!("no revision matches '{spec}'")))
	}

	pub async fn tag(&self, name: &str, message: Option<&str>) -> Result<()> {
		self.backend.tag(name, message).await
	}

	pub async fn tag_names(&self, pattern: Option<&str>) -> Result<Vec<String>> {
		self.backend.tag_names(pattern).await
	}

	pub async fn remote_names(&self) -> Result<Vec<String>> {
		self.backend.remote_names().await
	}

	pub async fn remote_url(&self, remote: &str) -> Result<Option<String>> {
		self.backend.remote_url(remote).await
	}

	pub async fn set_remote_url(&self, remote: &str, url: &str) -> Result<()> {
		self.backend.set_remote_url(remote, url).await
	}

	pub async fn add_remote(&self, remote: &str, url: &str) -> Result<()> {
		self.backend.add_remote(remote, url).await
	}

	pub async fn remote_references(
		&self,
		url: &str,
		pattern: Option<&str>,
		heads: bool,
		tags: bool,
	) -> Result<BTreeMap<String, String>> {
		self.backend.remote_references(url, pattern, heads, tags).await
	}

	pub async fn prune(&self, remote: &str) -> Result<()> {
		self.backend.prune(remote).await
	}

	pub async fn add_submodule(&self, url: &str, path: &str) -> Result<()> {
		self.backend.add_submodule(url, path).await
	}

	pub async fn submodule_urls(&self) -> Result<Vec<SubmoduleEntry>> {
		self.backend.submodule_urls().await
	}

	pub async fn set_submodule_url(&self, name: &str, url: &str) -> Result<()> {
		self.backend.set_submodule_url(name, url).await
	}
}
