// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Tags and remote reference listings.

use std::collections::BTreeMap;

use gix::progress::Discard;
use gix::protocol::handshake::Ref;
use gix::refs::transaction::PreviousValue;
use gix::remote::{ref_map, Direction};
use loom_git_client_core::refs::matches_pattern;
use loom_git_client_core::{GitError, Result};

use super::fetch::{advertised_name, parse_refspecs};
use crate::credentials::helper;
use crate::transport::Transport;

/// Create a tag at `HEAD`; annotated when `message` is given.
pub fn tag(repo: &gix::Repository, name: &str, message: Option<&str>) -> Result<()> {
	let head = repo.head_id().map_err(GitError::backend)?.detach();
	match message {
		Some(message) => {
			let tagger = repo.committer().transpose().map_err(GitError::backend)?;
			repo.tag(
				name,
				head,
				gix::objs::Kind::Commit,
				tagger,
				message,
				PreviousValue::MustNotExist,
			)
			.map_err(GitError::backend)?;
		}
		None => {
			repo.reference(
				format!("refs/tags/{name}").as_str(),
				head,
				PreviousValue::MustNotExist,
				format!("tag: {name}"),
			)
			.map_err(GitError::backend)?;
		}
	}
	Ok(())
}

pub fn tag_names(repo: &gix::Repository, pattern: Option<&str>) -> Result<Vec<String>> {
	let references = repo.references().map_err(GitError::backend)?;
	let mut names = Vec::new();
	for reference in references.tags().map_err(GitError::backend)? {
		let reference = reference.map_err(GitError::backend)?;
		let name = reference.name().shorten().to_string();
		if pattern.map_or(true, |p| matches_pattern(&name, p)) {
			names.push(name);
		}
	}
	names.sort();
	Ok(names)
}

/// References advertised by `url`, keyed by full name.
///
/// Tag entries map to the tag object, as `ls-remote` prints them; peeled
/// `^{}` entries are not reported.
pub fn remote_references(
	repo: &gix::Repository,
	url: gix::Url,
	pattern: Option<&str>,
	heads: bool,
	tags: bool,
	transport: &Transport,
) -> Result<BTreeMap<String, String>> {
	let mut wanted = Vec::new();
	if heads {
		wanted.push("refs/heads/*".to_string());
	}
	if tags {
		wanted.push("refs/tags/*".to_string());
	}
	if wanted.is_empty() {
		wanted.push("refs/*".to_string());
	}

	let remote = repo.remote_at(url).map_err(GitError::backend)?;
	let mut connection = remote.connect(Direction::Fetch).map_err(GitError::backend)?;
	if let Some((username, password)) = transport.account() {
		connection = connection.with_credentials(helper(username, password));
	}
	let prepare = connection
		.prepare_fetch(
			Discard,
			ref_map::Options {
				extra_refspecs: parse_refspecs(&wanted)?,
				prefix_from_spec_as_filter_on_remote: false,
				..Default::default()
			},
		)
		.map_err(GitError::backend)?;

	Ok(prepare
		.ref_map()
		.remote_refs
		.iter()
		.filter_map(|r| {
			let id = match r {
				Ref::Direct { object, .. } => object,
				Ref::Peeled { tag, .. } => tag,
				Ref::Symbolic { object, .. } => object,
				Ref::Unborn { .. } => return None,
			};
			Some((advertised_name(r).to_string(), id.to_string()))
		})
		.filter(|(name, _)| kind_wanted(name, heads, tags))
		.filter(|(name, _)| pattern.map_or(true, |p| matches_pattern(name, p)))
		.collect())
}

fn kind_wanted(name: &str, heads: bool, tags: bool) -> bool {
	if !heads && !tags {
		return true;
	}
	(heads && name.starts_with("refs/heads/")) || (tags && name.starts_with("refs/tags/"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kind_filter_matches_ls_remote_flags() {
		assert!(kind_wanted("HEAD", false, false));
		assert!(kind_wanted("refs/heads/main", true, false));
		assert!(!kind_wanted("refs/tags/v1", true, false));
		assert!(kind_wanted("refs/tags/v1", false, true));
		assert!(kind_wanted("refs/tags/v1", true, true));
		assert!(!kind_wanted("refs/pull/1/head", true, true));
	}
}
