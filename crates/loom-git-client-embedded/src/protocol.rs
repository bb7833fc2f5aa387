// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! URL scheme checks for the transports gitoxide can negotiate.

use gix::url::Scheme;
use loom_git_client_core::urls::redact_url;
use loom_git_client_core::{GitError, Result};

/// Parse `url` and reject any scheme other than local paths, `file`, `ssh`,
/// `git`, `http` and `https`.
///
/// The error message is the same for every operation that takes a URL so
/// callers can match on it regardless of which command produced it.
pub fn check_url(url: &str) -> Result<gix::Url> {
	let parsed = match gix::url::parse(url.into()) {
		Ok(parsed) => parsed,
		Err(_) if has_foreign_scheme(url) => return Err(unsupported(url)),
		Err(e) => return Err(GitError::InvalidUrl(format!("{}: {e}", redact_url(url)))),
	};
	if is_supported(&parsed.scheme) {
		Ok(parsed)
	} else {
		Err(unsupported(url))
	}
}

pub fn is_supported(scheme: &Scheme) -> bool {
	matches!(
		scheme,
		Scheme::File | Scheme::Ssh | Scheme::Git | Scheme::Http | Scheme::Https
	)
}

pub fn is_ssh(url: &gix::Url) -> bool {
	url.scheme == Scheme::Ssh
}

/// The URL is carried exactly as the caller passed it. Log lines redact it
/// separately.
fn unsupported(url: &str) -> GitError {
	GitError::UnsupportedProtocol(url.to_string())
}

/// `scheme://` with a scheme gitoxide has no transport for.
fn has_foreign_scheme(url: &str) -> bool {
	match url.split_once("://") {
		Some((scheme, _)) => !matches!(
			scheme.to_ascii_lowercase().as_str(),
			"file" | "ssh" | "git" | "http" | "https" | "git+ssh" | "ssh+git"
		),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn accepts_supported_transports() {
		for url in [
			"https://example.com/org/repo.git",
			"http://example.com/repo",
			"ssh://git@example.com/org/repo.git",
			"git@example.com:org/repo.git",
			"git://example.com/repo.git",
			"file:///srv/git/repo.git",
			"/srv/git/repo.git",
		] {
			assert!(check_url(url).is_ok(), "{url} should be accepted");
		}
	}

	#[test]
	fn rejects_object_storage_with_exact_message() {
		let err = check_url("s3://bucket/repo.git").unwrap_err();
		assert_eq!(err.to_string(), "unsupported protocol in URL s3://bucket/repo.git");
	}

	#[test]
	fn rejection_names_the_url_as_given() {
		let url = "s3://key:secret@bucket/repo.git";
		let err = check_url(url).unwrap_err();
		assert!(matches!(err, GitError::UnsupportedProtocol(_)));
		assert_eq!(err.to_string(), format!("unsupported protocol in URL {url}"));
	}

	proptest! {
		#[test]
		fn unknown_schemes_are_always_unsupported(scheme in "[a-z][a-z0-9]{1,6}", path in "[a-z]{1,8}/[a-z]{1,8}") {
			prop_assume!(!["file", "ssh", "git", "http", "https"].contains(&scheme.as_str()));
			let url = format!("{scheme}://{path}");
			let err = check_url(&url).unwrap_err();
			prop_assert_eq!(err.to_string(), format!("unsupported protocol in URL {url}"));
		}
	}
}
