// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::commands::{
	CheckoutOptions, CloneOptions, FetchOptions, LogOptions, MergeOptions, PushOptions,
	SubmoduleUpdateOptions,
};
use crate::context::BackendContext;
use crate::error::Result;
use crate::types::{BackendKind, CommitInfo, MergeOutcome, SubmoduleEntry};

/// One way of executing git operations against a single work tree.
///
/// Options reaching a backend have already been validated by their command.
/// Implementations must release any credential material they create before
/// returning, on success and on error alike.
#[async_trait]
pub trait GitBackend: Send + Sync {
	fn kind(&self) -> BackendKind;

	fn context(&self) -> &BackendContext;

	/// Create an empty repository in the work tree.
	async fn init(&self) -> Result<()>;

	async fn has_repository(&self) -> bool;

	async fn clone_repository(&self, options: &CloneOptions) -> Result<()>;

	async fn fetch(&self, options: &FetchOptions) -> Result<()>;

	async fn checkout(&self, options: &CheckoutOptions) -> Result<()>;

	async fn merge(&self, options: &MergeOptions) -> Result<MergeOutcome>;

	async fn push(&self, options: &PushOptions) -> Result<()>;

	async fn submodule_update(&self, options: &SubmoduleUpdateOptions) -> Result<()>;

	async fn log(&self, options: &LogOptions) -> Result<Vec<CommitInfo>>;

	/// Resolve a revision to a commit id, or `None` if it does not exist.
	async fn rev_parse(&self, revision: &str) -> Result<Option<String>>;

	/// Tag `HEAD`. A message makes the tag annotated.
	async fn tag(&self, name: &str, message: Option<&str>) -> Result<()>;

	/// Tag names, optionally filtered by a `*` glob.
	async fn tag_names(&self, pattern: Option<&str>) -> Result<Vec<String>>;

	async fn remote_names(&self) -> Result<Vec<String>>;

	async fn remote_url(&self, remote: &str) -> Result<Option<String>>;

	async fn set_remote_url(&self, remote: &str, url: &str) -> Result<()>;

	async fn add_remote(&self, remote: &str, url: &str) -> Result<()>;

	/// References advertised by `url` (a URL or remote name), keyed by full
	/// reference name. `pattern` is a `*` glob over the full name.
	async fn remote_references(
		&self,
		url: &str,
		pattern: Option<&str>,
		heads: bool,
		tags: bool,
	) -> Result<BTreeMap<String, String>>;

	/// Delete remote-tracking references the remote no longer has.
	async fn prune(&self, remote: &str) -> Result<()>;

	async fn add_submodule(&self, url: &str, path: &str) -> Result<()>;

	async fn submodule_urls(&self) -> Result<Vec<SubmoduleEntry>>;

	async fn set_submodule_url(&self, name: &str, url: &str) -> Result<()>;
}
