// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::LazyLock;

use loom_git_client_core::SubmoduleEntry;
use regex::Regex;

/// `submodule.<name>.url <value>` as printed by `git config --get-regexp`.
/// The name is matched lazily so names containing dots, slashes or spaces
/// stop at the last `.url` followed by whitespace.
static SUBMODULE_URL: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^submodule\.(?P<remote>.+?)\.url\s+(?P<url>.+)$").unwrap());

/// Parse one config line.
pub fn parse_submodule_url_line(line: &str) -> Option<SubmoduleEntry> {
	let captures = SUBMODULE_URL.captures(line.trim_end_matches(['\r', '\n']))?;
	Some(SubmoduleEntry {
		name: captures["remote"].to_string(),
		url: captures["url"].trim().to_string(),
	})
}

pub fn parse_submodule_urls(output: &str) -> Vec<SubmoduleEntry> {
	output.lines().filter_map(parse_submodule_url_line).collect()
}
