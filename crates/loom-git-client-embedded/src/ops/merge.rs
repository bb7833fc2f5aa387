// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use gix::merge::blob::builtin_driver::text::Labels;
use gix::merge::tree::TreatAsUnresolved;
use gix::ObjectId;
use loom_git_client_core::{FastForwardMode, GitError, MergeOptions, MergeOutcome, MergeStrategy, Result};
use tracing::debug;

use super::checkout::{advance_head, write_tree, write_tree_id};
use super::require_commit;

pub fn merge(repo: &gix::Repository, options: &MergeOptions) -> Result<MergeOutcome> {
	if options.strategy != MergeStrategy::Default {
		return Err(GitError::Unsupported {
			backend: "embedded",
			operation: "merge strategies other than the default",
		});
	}

	let revision = options.revision()?;
	let theirs = require_commit(repo, revision)?;
	let ours = repo.head_commit().map_err(GitError::backend)?.id;

	if ours == theirs {
		return Ok(MergeOutcome::AlreadyUpToDate);
	}
	let base = repo.merge_base(ours, theirs).map_err(GitError::backend)?.detach();
	if base == theirs {
		return Ok(MergeOutcome::AlreadyUpToDate);
	}

	let can_fast_forward = base == ours;
	if options.fast_forward == FastForwardMode::FfOnly && !can_fast_forward {
		return Err(GitError::backend(format!("not possible to fast-forward to {revision}")));
	}
	if can_fast_forward && options.fast_forward != FastForwardMode::NoFf && !options.squash && options.commit {
		write_tree(repo, theirs)?;
		advance_head(repo, theirs, format!("merge {revision}: Fast-forward"))?;
		debug!(head = %theirs, "fast-forwarded");
		return Ok(MergeOutcome::FastForward {
			head: theirs.to_string(),
		});
	}

	let tree = merged_tree(repo, ours, theirs, revision)?;
	if options.squash || !options.commit {
		write_tree_id(repo, tree)?;
		if !options.squash {
			std::fs::write(repo.path().join("MERGE_HEAD"), format!("{theirs}\n"))?;
			std::fs::write(repo.path().join("MERGE_MSG"), format!("{}\n", options.message_or_default()))?;
		}
		return Ok(MergeOutcome::Uncommitted);
	}

	let head = repo
		.commit("HEAD", options.message_or_default(), tree, [ours, theirs])
		.map_err(GitError::backend)?
		.detach();
	write_tree(repo, head)?;
	Ok(MergeOutcome::Merged {
		head: head.to_string(),
	})
}

/// Three-way merge of two commits into a written tree.
fn merged_tree(repo: &gix::Repository, ours: ObjectId, theirs: ObjectId, revision: &str) -> Result<ObjectId> {
	let options: gix::merge::commit::Options = repo.tree_merge_options().map_err(GitError::backend)?.into();
	let labels = Labels {
		ancestor: None,
		current: Some("HEAD".into()),
		other: Some(revision.into()),
	};
	let mut outcome = repo
		.merge_commits(ours, theirs, labels, options)
		.map_err(GitError::backend)?;
	if outcome
		.tree_merge
		.has_unresolved_conflicts(TreatAsUnresolved::default())
	{
		return Err(GitError::MergeConflict {
			revision: revision.to_string(),
		});
	}
	Ok(outcome.tree_merge.tree.write().map_err(GitError::backend)?.detach())
}
