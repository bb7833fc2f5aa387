// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::HashSet;
use std::num::NonZeroU32;
use std::sync::atomic::AtomicBool;

use gix::bstr::ByteSlice;
use gix::progress::Discard;
use gix::protocol::handshake::Ref;
use gix::remote::fetch::{RefMap, Shallow, Tags};
use gix::remote::{ref_map, Direction};
use loom_git_client_core::{FetchOptions, GitError, Result};
use tracing::debug;

use crate::credentials::helper;
use crate::transport::Transport;

/// Where a fetch reads from: a configured remote, or a URL used once.
pub enum Source {
	Named(String),
	Url(gix::Url),
}

pub fn parse_refspecs(refspecs: &[String]) -> Result<Vec<gix::refspec::RefSpec>> {
	refspecs
		.iter()
		.map(|spec| {
			gix::refspec::parse(spec.as_bytes().as_bstr(), gix::refspec::parse::Operation::Fetch)
				.map(|r| r.to_owned())
				.map_err(|e| GitError::config(format!("invalid refspec '{spec}': {e}")))
		})
		.collect()
}

fn remote<'repo>(repo: &'repo gix::Repository, source: &Source) -> Result<gix::Remote<'repo>> {
	match source {
		Source::Named(name) => repo
			.find_remote(name.as_str())
			.map_err(|e| GitError::config(format!("remote '{name}' not found: {e}"))),
		Source::Url(url) => repo.remote_at(url.clone()).map_err(GitError::backend),
	}
}

pub fn fetch(
	repo: &gix::Repository,
	source: &Source,
	options: &FetchOptions,
	transport: &Transport,
	interrupt: &AtomicBool,
) -> Result<()> {
	let mut remote = remote(repo, source)?;
	if options.no_tags {
		remote = remote.with_fetch_tags(Tags::None);
	}

	let mut refspecs = options.refspecs.clone();
	if refspecs.is_empty() && matches!(source, Source::Url(_)) {
		refspecs.push("HEAD".to_string());
	}

	let mut connection = remote.connect(Direction::Fetch).map_err(GitError::backend)?;
	if let Some((username, password)) = transport.account() {
		connection = connection.with_credentials(helper(username, password));
	}

	let mut prepare = connection
		.prepare_fetch(
			Discard,
			ref_map::Options {
				extra_refspecs: parse_refspecs(&refspecs)?,
				..Default::default()
			},
		)
		.map_err(GitError::backend)?;
	if let Some(depth) = options.effective_depth().and_then(NonZeroU32::new) {
		prepare = prepare.with_shallow(Shallow::DepthAtRemote(depth));
	}

	let outcome = prepare.receive(Discard, interrupt).map_err(GitError::backend)?;

	if options.prune {
		match source {
			Source::Named(name) => prune_stale(repo, name, &outcome.ref_map)?,
			Source::Url(_) => debug!("prune skipped for a fetch without a configured remote"),
		}
	}
	Ok(())
}

/// Connect to `name` and delete its remote-tracking branches that the
/// remote no longer advertises.
pub fn prune(repo: &gix::Repository, name: &str, transport: &Transport) -> Result<()> {
	let remote = remote(repo, &Source::Named(name.to_string()))?;
	let mut connection = remote.connect(Direction::Fetch).map_err(GitError::backend)?;
	if let Some((username, password)) = transport.account() {
		connection = connection.with_credentials(helper(username, password));
	}
	let prepare = connection
		.prepare_fetch(Discard, ref_map::Options::default())
		.map_err(GitError::backend)?;
	prune_stale(repo, name, prepare.ref_map())
}

pub fn advertised_name(remote_ref: &Ref) -> &gix::bstr::BStr {
	match remote_ref {
		Ref::Peeled { full_ref_name, .. }
		| Ref::Direct { full_ref_name, .. }
		| Ref::Symbolic { full_ref_name, .. }
		| Ref::Unborn { full_ref_name, .. } => full_ref_name.as_ref(),
	}
}

fn prune_stale(repo: &gix::Repository, remote_name: &str, ref_map: &RefMap) -> Result<()> {
	let live: HashSet<String> = ref_map
		.remote_refs
		.iter()
		.filter_map(|r| {
			advertised_name(r)
				.strip_prefix(b"refs/heads/")
				.map(|b| b.to_str_lossy().into_owned())
		})
		.collect();

	let prefix = format!("refs/remotes/{remote_name}/");
	let mut stale = Vec::new();
	let references = repo.references().map_err(GitError::backend)?;
	for reference in references.all().map_err(GitError::backend)? {
		let reference = reference.map_err(GitError::backend)?;
		let name = reference.name().as_bstr().to_str_lossy().into_owned();
		if let Some(branch) = name.strip_prefix(&prefix) {
			if branch != "HEAD" && !live.contains(branch) {
				stale.push(reference);
			}
		}
	}

	for reference in stale {
		debug!(reference = %reference.name().as_bstr(), "pruning stale remote-tracking branch");
		reference.delete().map_err(GitError::backend)?;
	}
	Ok(())
}
