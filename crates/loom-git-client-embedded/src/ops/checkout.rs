// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;

use gix::bstr::ByteSlice;
use gix::refs::transaction::{Change, LogChange, PreviousValue, RefEdit, RefLog};
use gix::refs::Target;
use gix::ObjectId;
use loom_git_client_core::{CheckoutOptions, GitError, Result};
use tracing::debug;

use super::require_commit;

pub fn checkout(repo: &gix::Repository, options: &CheckoutOptions) -> Result<()> {
	let reference = options.reference()?;
	let target = require_commit(repo, reference)?;

	if !options.force && repo.index_path().exists() && repo.is_dirty().map_err(GitError::backend)? {
		return Err(GitError::backend(
			"local changes would be overwritten by checkout; retry with force",
		));
	}

	let message = format!("checkout: moving from HEAD to {reference}");
	match &options.branch {
		Some(branch) => {
			let full_name = format!("refs/heads/{branch}");
			if options.delete_branch_if_exists && current_branch(repo)?.as_deref() != Some(branch.as_str()) {
				if let Some(existing) = repo.try_find_reference(full_name.as_str()).map_err(GitError::backend)? {
					debug!(branch = %branch, "deleting existing branch before checkout");
					existing.delete().map_err(GitError::backend)?;
				}
			}
			write_tree(repo, target)?;
			repo.reference(full_name.as_str(), target, PreviousValue::Any, format!("branch: reset to {reference}"))
				.map_err(GitError::backend)?;
			attach_head(repo, &full_name, message)
		}
		None => {
			write_tree(repo, target)?;
			match local_branch(repo, reference)? {
				Some(full_name) => attach_head(repo, &full_name, message),
				None => detach_head(repo, target, message),
			}
		}
	}
}

/// Short name of the branch `HEAD` points at, if attached.
pub fn current_branch(repo: &gix::Repository) -> Result<Option<String>> {
	Ok(repo
		.head_name()
		.map_err(GitError::backend)?
		.map(|name| name.shorten().to_string()))
}

/// `refs/heads/<name>` when `reference` names an existing local branch.
fn local_branch(repo: &gix::Repository, reference: &str) -> Result<Option<String>> {
	let candidate = if reference.starts_with("refs/heads/") {
		reference.to_string()
	} else if !reference.starts_with("refs/") {
		format!("refs/heads/{reference}")
	} else {
		return Ok(None);
	};
	let found = repo
		.try_find_reference(candidate.as_str())
		.map_err(GitError::backend)?
		.is_some();
	Ok(found.then_some(candidate))
}

/// Make the index and work tree match `commit`.
pub fn write_tree(repo: &gix::Repository, commit: ObjectId) -> Result<()> {
	let tree_id = repo
		.find_commit(commit)
		.map_err(GitError::backend)?
		.tree_id()
		.map_err(GitError::backend)?
		.detach();
	write_tree_id(repo, tree_id)
}

/// Make the index and work tree match `tree_id`, removing files that are
/// tracked now but absent from the tree.
pub fn write_tree_id(repo: &gix::Repository, tree_id: ObjectId) -> Result<()> {
	let workdir = repo
		.workdir()
		.ok_or_else(|| GitError::backend("cannot check out into a bare repository"))?
		.to_owned();

	let previous = repo.open_index().ok();
	let mut index = repo.index_from_tree(&tree_id).map_err(GitError::backend)?;

	let mut options = repo
		.checkout_options(gix::worktree::stack::state::attributes::Source::WorktreeThenIdMapping)
		.map_err(GitError::backend)?;
	options.overwrite_existing = true;
	options.destination_is_initially_empty = false;

	let outcome = gix::worktree::state::checkout(
		&mut index,
		workdir.clone(),
		repo.objects.clone().into_arc().map_err(GitError::backend)?,
		&gix::progress::Discard,
		&gix::progress::Discard,
		&AtomicBool::new(false),
		options,
	)
	.map_err(GitError::backend)?;

	if let Some(first) = outcome.errors.first() {
		return Err(GitError::backend(format!(
			"checkout failed for {} path(s), first {}: {}",
			outcome.errors.len(),
			first.path,
			first.error
		)));
	}

	if let Some(previous) = previous {
		let kept: HashSet<&[u8]> = index.entries().iter().map(|e| e.path(&index).as_bytes()).collect();
		for entry in previous.entries() {
			let path = entry.path(&previous);
			if kept.contains(path.as_bytes()) {
				continue;
			}
			if let Ok(relative) = path.to_str() {
				let stale = workdir.join(relative);
				if stale.is_file() {
					let _ = std::fs::remove_file(&stale);
				}
			}
		}
	}

	index
		.write(gix::index::write::Options::default())
		.map_err(GitError::backend)?;
	Ok(())
}

/// Point `HEAD` at the branch `full_name`.
pub fn attach_head(repo: &gix::Repository, full_name: &str, message: String) -> Result<()> {
	let target: gix::refs::FullName = full_name
		.try_into()
		.map_err(|e| GitError::config(format!("invalid branch name '{full_name}': {e}")))?;
	repo.edit_reference(RefEdit {
		change: Change::Update {
			log: LogChange {
				mode: RefLog::AndReference,
				force_create_reflog: false,
				message: message.into(),
			},
			expected: PreviousValue::Any,
			new: Target::Symbolic(target),
		},
		name: "HEAD".try_into().map_err(GitError::backend)?,
		deref: false,
	})
	.map_err(GitError::backend)?;
	Ok(())
}

pub fn detach_head(repo: &gix::Repository, commit: ObjectId, message: String) -> Result<()> {
	repo.reference("HEAD", commit, PreviousValue::Any, message)
		.map_err(GitError::backend)?;
	Ok(())
}

/// Move whatever `HEAD` resolves to, the current branch when attached, to
/// `commit`.
pub fn advance_head(repo: &gix::Repository, commit: ObjectId, message: String) -> Result<()> {
	repo.edit_reference(RefEdit {
		change: Change::Update {
			log: LogChange {
				mode: RefLog::AndReference,
				force_create_reflog: false,
				message: message.into(),
			},
			expected: PreviousValue::Any,
			new: Target::Object(commit),
		},
		name: "HEAD".try_into().map_err(GitError::backend)?,
		deref: true,
	})
	.map_err(GitError::backend)?;
	Ok(())
}
