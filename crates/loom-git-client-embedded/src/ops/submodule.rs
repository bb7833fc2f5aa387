// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::Path;
use std::sync::atomic::AtomicBool;

use gix::ObjectId;
use loom_git_client_core::{
	BackendContext, CloneOptions, FetchOptions, GitError, Result, SubmoduleUpdateOptions,
};
use tracing::{debug, info};

use super::checkout::{detach_head, write_tree};
use super::fetch::{fetch, Source};
use super::{clone::clone, open};
use crate::config;
use crate::credentials::register_url_credentials;
use crate::protocol::check_url;
use crate::transport::Transport;

/// Clone or fetch each submodule of `work_tree` and check out the commit its
/// parent records. Submodules keep their own `.git` directory in place.
pub fn update(
	context: &BackendContext,
	work_tree: &Path,
	parent_url: Option<&str>,
	options: &SubmoduleUpdateOptions,
	interrupt: &AtomicBool,
) -> Result<()> {
	let repo = open(work_tree, &[])?;
	let base = parent_url
		.map(str::to_string)
		.unwrap_or_else(|| work_tree.display().to_string());

	for module in config::gitmodules(work_tree)? {
		let url = match config::get(&repo, "submodule", &module.name, "url")? {
			Some(url) => resolve_relative_url(&url, &base),
			None => {
				let url = resolve_relative_url(&module.url, &base);
				config::set(&repo, "submodule", &module.name, "url", &url)?;
				url
			}
		};
		let parsed = check_url(&url)?;
		register_url_credentials(&context.credentials, &url);
		let credentials_url = match parent_url {
			Some(parent) if options.parent_credentials => parent,
			_ => url.as_str(),
		};
		let transport = Transport::prepare(context, &parsed, credentials_url)?;

		let Some(recorded) = recorded_commit(&repo, &module.path)? else {
			debug!(submodule = %module.name, "no commit recorded for submodule, skipping");
			continue;
		};

		let destination = work_tree.join(&module.path);
		let sub_repo = match open(&destination, transport.overrides()) {
			Ok(sub_repo) => {
				let fetch_options = FetchOptions {
					remote: Some("origin".to_string()),
					shallow: options.shallow,
					depth: options.depth,
					..Default::default()
				};
				fetch(&sub_repo, &Source::Named("origin".to_string()), &fetch_options, &transport, interrupt)?;
				sub_repo
			}
			Err(_) => {
				let clone_options = CloneOptions {
					url: Some(url.clone()),
					shallow: options.shallow,
					depth: options.depth,
					no_checkout: true,
					..Default::default()
				};
				clone(&destination, parsed, &clone_options, &transport, interrupt)?
			}
		};

		write_tree(&sub_repo, recorded)?;
		detach_head(&sub_repo, recorded, format!("submodule update: checkout {recorded}"))
			.map_err(|e| GitError::backend(format!("submodule '{}': {e}", module.name)))?;
		info!(submodule = %module.name, commit = %recorded, "submodule updated");

		if options.recursive {
			update(context, &destination, Some(&url), options, interrupt)?;
		}
	}
	Ok(())
}

/// Resolve a `./` or `../` submodule URL against the superproject's remote
/// URL, or its work tree when it has no remote. Each `../` drops one path
/// component of `base`; scp-like bases keep their `host:` separator. Other
/// URLs are returned unchanged.
pub fn resolve_relative_url(url: &str, base: &str) -> String {
	if !url.starts_with("./") && !url.starts_with("../") {
		return url.to_string();
	}

	let mut base = base.trim_end_matches('/').to_string();
	let mut separator = '/';
	let mut rest = url;
	loop {
		if let Some(tail) = rest.strip_prefix("./") {
			rest = tail;
		} else if let Some(tail) = rest.strip_prefix("../") {
			rest = tail;
			if let Some(cut) = base.rfind(['/', ':']) {
				separator = if base[cut..].starts_with(':') { ':' } else { '/' };
				base.truncate(cut);
			}
		} else {
			break;
		}
	}
	if rest.is_empty() {
		return base;
	}
	format!("{base}{separator}{rest}")
}

/// The gitlink commit stored at `path` in `HEAD`'s tree.
fn recorded_commit(repo: &gix::Repository, path: &str) -> Result<Option<ObjectId>> {
	let tree = repo
		.head_commit()
		.map_err(GitError::backend)?
		.tree()
		.map_err(GitError::backend)?;
	let entry = tree.lookup_entry_by_path(path).map_err(GitError::backend)?;
	Ok(entry
		.filter(|e| e.mode().is_commit())
		.map(|e| e.oid().to_owned()))
}
