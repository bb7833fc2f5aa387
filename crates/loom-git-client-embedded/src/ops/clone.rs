// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::num::NonZeroU32;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use gix::progress::Discard;
use gix::remote::fetch::{Shallow, Tags};
use gix::remote::Direction;
use loom_git_client_core::{CloneOptions, GitError, Result};
use tracing::{debug, warn};

use crate::credentials::helper;
use crate::transport::Transport;

/// Clone `url` into `work_tree`, which must be empty or absent.
pub fn clone(
	work_tree: &Path,
	url: gix::Url,
	options: &CloneOptions,
	transport: &Transport,
	interrupt: &AtomicBool,
) -> Result<gix::Repository> {
	if let Some(reference) = &options.reference {
		warn!(reference = %reference.display(), "reference repositories are not used by the embedded backend");
	}
	std::fs::create_dir_all(work_tree)?;

	let mut prepare = gix::prepare_clone(url, work_tree)
		.map_err(GitError::backend)?
		.with_in_memory_config_overrides(transport.overrides().iter().cloned())
		.with_remote_name(options.remote_name())
		.map_err(GitError::backend)?;

	if let Some(depth) = options.effective_depth().and_then(NonZeroU32::new) {
		prepare = prepare.with_shallow(Shallow::DepthAtRemote(depth));
	}

	let refspecs = options.refspecs.clone();
	let no_tags = options.no_tags;
	if no_tags || !refspecs.is_empty() {
		prepare = prepare.configure_remote(move |mut remote| {
			if no_tags {
				remote = remote.with_fetch_tags(Tags::None);
			}
			if !refspecs.is_empty() {
				remote = remote.with_refspecs(refspecs.iter().map(String::as_str), Direction::Fetch)?;
			}
			Ok(remote)
		});
	}

	if let Some((username, password)) = transport.account() {
		prepare = prepare.configure_connection(move |connection| {
			connection.set_credentials(helper(username.clone(), password.clone()));
			Ok(())
		});
	}

	let repo = if options.no_checkout {
		let (repo, _) = prepare.fetch_only(Discard, interrupt).map_err(GitError::backend)?;
		repo
	} else {
		let (mut checkout, _) = prepare
			.fetch_then_checkout(Discard, interrupt)
			.map_err(GitError::backend)?;
		let (repo, _) = checkout
			.main_worktree(Discard, interrupt)
			.map_err(GitError::backend)?;
		repo
	};
	debug!(path = %work_tree.display(), "clone finished");
	Ok(repo)
}
