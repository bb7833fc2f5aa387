// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use gix::bstr::ByteSlice;
use gix::revision::walk::Sorting;
use loom_git_client_core::{CommitInfo, GitError, LogOptions, Result};

use super::require_commit;

/// Commits reachable from the range's upper bound and not from its lower
/// bound, newest first.
pub fn log(repo: &gix::Repository, options: &LogOptions) -> Result<Vec<CommitInfo>> {
	let (exclude, include) = options.bounds();
	let tip = require_commit(repo, include)?;
	let hidden = exclude.map(|rev| require_commit(repo, rev)).transpose()?;

	let walk = repo
		.rev_walk([tip])
		.with_hidden(hidden)
		.sorting(Sorting::ByCommitTime(Default::default()))
		.all()
		.map_err(GitError::backend)?;

	let limit = options.max_count.unwrap_or(usize::MAX);
	let mut commits = Vec::new();
	for info in walk.take(limit) {
		let info = info.map_err(GitError::backend)?;
		let commit = info.object().map_err(GitError::backend)?;
		let author = commit.author().map_err(GitError::backend)?;
		let timestamp = commit.time().map_err(GitError::backend)?.seconds;
		let summary = commit
			.message()
			.map_err(GitError::backend)?
			.summary()
			.to_str_lossy()
			.into_owned();
		commits.push(CommitInfo {
			sha: info.id.to_string(),
			author_name: author.name.to_str_lossy().into_owned(),
			author_email: author.email.to_str_lossy().into_owned(),
			timestamp,
			summary,
		});
	}
	Ok(commits)
}
