// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Blocking repository operations. Each runs inside `spawn_blocking`.

pub mod checkout;
pub mod clone;
pub mod fetch;
pub mod log;
pub mod merge;
pub mod refs;
pub mod submodule;

use std::path::Path;

use gix::ObjectId;
use loom_git_client_core::{GitError, Result};

/// Open the repository at `work_tree` with `overrides` applied in memory.
pub fn open(work_tree: &Path, overrides: &[String]) -> Result<gix::Repository> {
	let options = gix::open::Options::default().config_overrides(overrides.iter().cloned());
	gix::open_opts(work_tree, options).map_err(|_| GitError::NotAGitRepo(work_tree.display().to_string()))
}

/// The commit `revision` points at, peeling tags.
pub fn resolve_commit(repo: &gix::Repository, revision: &str) -> Option<ObjectId> {
	let spec = format!("{revision}^{{commit}}");
	repo.rev_parse_single(spec.as_str()).ok().map(|id| id.detach())
}

pub fn require_commit(repo: &gix::Repository, revision: &str) -> Result<ObjectId> {
	resolve_commit(repo, revision).ok_or_else(|| GitError::config(format!("unknown revision '{revision}'")))
}
