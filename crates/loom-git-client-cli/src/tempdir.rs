// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Where credential helper files are written.
//!
//! Files live next to the work tree in `<work_tree>@tmp` so they are cleaned
//! up with the workspace. That directory is only usable when git can pass
//! its path through the platform's argument parsing unchanged.

use std::path::{Path, PathBuf};

use loom_git_client_core::BackendContext;
use tracing::debug;

/// Characters `cmd.exe` mangles in helper paths.
pub const WINDOWS_UNSAFE: &[char] = &['%', ' ', '(', ')', '`', '\''];

/// Characters `/bin/sh` mangles in `GIT_ASKPASS`/`GIT_SSH_COMMAND` values.
pub const UNIX_UNSAFE: &[char] = &['%', '`', '\'', '"', '$', ' '];

#[cfg(windows)]
const PLATFORM_UNSAFE: &[char] = WINDOWS_UNSAFE;
#[cfg(not(windows))]
const PLATFORM_UNSAFE: &[char] = UNIX_UNSAFE;

pub fn is_safe_path(path: &Path, unsafe_chars: &[char]) -> bool {
	!path.to_string_lossy().contains(unsafe_chars)
}

pub fn workspace_tmp_dir(work_tree: &Path) -> PathBuf {
	let mut name = work_tree.as_os_str().to_os_string();
	name.push("@tmp");
	PathBuf::from(name)
}

/// Directory for this context's credential files.
pub fn credential_dir(context: &BackendContext) -> PathBuf {
	select_dir(context, PLATFORM_UNSAFE)
}

fn select_dir(context: &BackendContext, unsafe_chars: &[char]) -> PathBuf {
	let preferred = workspace_tmp_dir(context.work_tree());
	if is_safe_path(&preferred, unsafe_chars) {
		return preferred;
	}

	let fallback = ["TMPDIR", "TEMP", "TMP"]
		.iter()
		.find_map(|key| context.env.get(*key).filter(|v| !v.is_empty()).map(PathBuf::from))
		.unwrap_or_else(std::env::temp_dir);
	debug!(
		preferred = %preferred.display(),
		fallback = %fallback.display(),
		"work tree path unsafe for credential files, using system temp dir"
	);
	fallback
}
