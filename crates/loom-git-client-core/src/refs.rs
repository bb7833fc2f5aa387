// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Expansion of user-supplied branch and tag names into candidate references.

const HEADS: &str = "refs/heads";
const TAGS_PREFIX: &str = "refs/tags/";
const REMOTES_PREFIX: &str = "refs/remotes/";
const HEADS_PREFIX: &str = "refs/heads/";

/// Expand `spec` into the ordered list of references to try, most specific
/// first.
///
/// A leading segment naming a configured remote yields the local branch
/// (`refs/heads/<rest>`) ahead of a branch literally named `<remote>/<rest>`.
/// Fully-qualified names are kept as given, with tags tried peeled first.
/// Globs are not expanded. The result is never empty, always contains `spec`
/// itself and holds no duplicates.
pub fn normalize_branch_spec<S: AsRef<str>>(spec: &str, remote_names: &[S]) -> Vec<String> {
	let mut candidates = Vec::with_capacity(5);

	if spec.starts_with(TAGS_PREFIX) {
		candidates.push(format!("{spec}^{{}}"));
		candidates.push(spec.to_string());
		candidates.push(format!("{HEADS_PREFIX}{spec}"));
	} else if spec.starts_with(REMOTES_PREFIX) || spec.starts_with(HEADS_PREFIX) {
		candidates.push(spec.to_string());
		candidates.push(format!("{HEADS_PREFIX}{spec}"));
	} else {
		if let Some((first, rest)) = spec.split_once('/') {
			if !rest.is_empty() && remote_names.iter().any(|r| r.as_ref() == first) {
				candidates.push(format!("{HEADS_PREFIX}{rest}"));
			}
		}
		candidates.push(format!("{HEADS_PREFIX}{spec}"));
	}

	candidates.push(format!("{HEADS}{spec}"));
	candidates.push(spec.to_string());

	dedup_preserving_order(candidates)
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
	let mut out: Vec<String> = Vec::with_capacity(items.len());
	for item in items {
		if !out.contains(&item) {
			out.push(item);
		}
	}
	out
}

/// Match `name` against a glob where `*` spans any run of characters
/// (including `/`) and `?` matches exactly one.
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
	let name: Vec<char> = name.chars().collect();
	let pattern: Vec<char> = pattern.chars().collect();

	let (mut n, mut p) = (0, 0);
	let mut backtrack: Option<(usize, usize)> = None;

	while n < name.len() {
		if p < pattern.len() && (pattern[p] == '?' || pattern[p] == name[n]) {
			n += 1;
			p += 1;
		} else if p < pattern.len() && pattern[p] == '*' {
			backtrack = Some((p, n));
			p += 1;
		} else if let Some((star, matched)) = backtrack {
			p = star + 1;
			n = matched + 1;
			backtrack = Some((star, n));
		} else {
			return false;
		}
	}

	pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	const ORIGIN: &[&str] = &["origin"];

	#[test]
	fn plain_branch() {
		assert_eq!(
			normalize_branch_spec("master", ORIGIN),
			vec!["refs/heads/master", "refs/headsmaster", "master"]
		);
	}

	/// Test: a remote-qualified branch resolves to the local branch first.
	///
	/// Why this test is important: `origin/master` must check out the local
	/// `master` tip rather than a branch literally named `origin/master`.
	#[test]
	fn remote_qualified_branch_prefers_stripped_name() {
		assert_eq!(
			normalize_branch_spec("origin/master", ORIGIN),
			vec![
				"refs/heads/master",
				"refs/heads/origin/master",
				"refs/headsorigin/master",
				"origin/master",
			]
		);
	}

	#[test]
	fn unknown_remote_is_not_stripped() {
		assert_eq!(
			normalize_branch_spec("remotes/rem2/master", ORIGIN),
			vec![
				"refs/heads/remotes/rem2/master",
				"refs/headsremotes/rem2/master",
				"remotes/rem2/master",
			]
		);
	}

	#[test]
	fn qualified_tag_tries_peeled_first() {
		assert_eq!(
			normalize_branch_spec("refs/tags/v1.0", ORIGIN),
			vec![
				"refs/tags/v1.0^{}",
				"refs/tags/v1.0",
				"refs/heads/refs/tags/v1.0",
				"refs/headsrefs/tags/v1.0",
			]
		);
	}

	#[test]
	fn qualified_remote_ref_is_kept() {
		let candidates = normalize_branch_spec("refs/remotes/origin/main", ORIGIN);
		assert_eq!(candidates[0], "refs/remotes/origin/main");
		assert_eq!(candidates[1], "refs/heads/refs/remotes/origin/main");
	}

	#[test]
	fn globs_pass_through() {
		let candidates = normalize_branch_spec("origin/feature-*", ORIGIN);
		assert_eq!(candidates[0], "refs/heads/feature-*");
		assert!(candidates.contains(&"origin/feature-*".to_string()));
	}

	#[test]
	fn bare_remote_name_has_no_stripped_candidate() {
		assert_eq!(
			normalize_branch_spec("origin/", ORIGIN),
			vec!["refs/heads/origin/", "refs/headsorigin/", "origin/"]
		);
	}

	#[test]
	fn glob_matching() {
		assert!(matches_pattern("refs/heads/main", "refs/heads/*"));
		assert!(matches_pattern("refs/tags/v1.2.3", "refs/tags/v1.*"));
		assert!(matches_pattern("v1.0", "v?.?"));
		assert!(matches_pattern("anything", "*"));
		assert!(!matches_pattern("refs/tags/v1", "refs/heads/*"));
		assert!(!matches_pattern("main", "mai"));
		assert!(matches_pattern("", "*"));
		assert!(!matches_pattern("", "?"));
	}

	proptest! {
		#[test]
		fn never_empty_never_duplicated(spec in "[a-z/._*-]{0,24}", remote in "[a-z]{1,8}") {
			let candidates = normalize_branch_spec(&spec, &[remote.as_str()]);
			prop_assert!(!candidates.is_empty());
			prop_assert!(candidates.contains(&spec));
			let mut sorted = candidates.clone();
			sorted.sort();
			sorted.dedup();
			prop_assert_eq!(sorted.len(), candidates.len());
		}

		#[test]
		fn literal_spec_matches_itself(spec in "[a-z/._-]{0,24}") {
			prop_assert!(matches_pattern(&spec, &spec));
		}
	}
}
