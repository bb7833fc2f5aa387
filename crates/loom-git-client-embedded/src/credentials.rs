// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Adapts registered credentials to gitoxide's credential helper protocol.

use gix::credentials::helper::Action;
use gix::credentials::protocol;
use gix::sec::identity::Account;
use loom_git_client_core::urls::{extract_userinfo, redact_url};
use loom_git_client_core::{CredentialSet, Credentials};
use tracing::debug;

/// Register `user:password@` found in `url` for that URL.
///
/// Stored remotes go through here whenever their URL is read, so a later
/// command that names the remote still authenticates.
pub fn register_url_credentials(credentials: &CredentialSet, url: &str) -> bool {
	match extract_userinfo(url) {
		Some(info) => {
			debug!(url = %redact_url(url), "registering credentials embedded in url");
			credentials.insert(url, Credentials::UsernamePassword {
				username: info.username,
				password: info.password,
			});
			true
		}
		None => false,
	}
}

/// A credential helper answering every `get` with the given account.
///
/// Store and erase requests are acknowledged without doing anything; the
/// account belongs to the caller's credential set, not to gitoxide.
pub fn helper(
	username: String,
	password: String,
) -> impl FnMut(Action) -> protocol::Result + Send + 'static {
	move |action| match action {
		Action::Get(ctx) => Ok(Some(protocol::Outcome {
			identity: Account {
				username: username.clone(),
				password: password.clone(),
				oauth_refresh_token: None,
			},
			next: ctx.into(),
		})),
		Action::Store(_) | Action::Erase(_) => Ok(None),
	}
}

/// Username and password to answer http prompts with, if any.
pub fn http_account(credentials: Option<&Credentials>) -> Option<(String, String)> {
	match credentials {
		Some(Credentials::UsernamePassword { username, password }) => {
			Some((username.clone(), password.expose().to_string()))
		}
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn url_userinfo_is_registered_under_the_bare_url() {
		let set = CredentialSet::new();
		assert!(register_url_credentials(&set, "https://bob:pw@example.com/org/repo.git"));
		let found = set.for_url("https://example.com/org/repo").unwrap();
		assert_eq!(found.username(), "bob");
	}

	#[test]
	fn urls_without_password_register_nothing() {
		let set = CredentialSet::new();
		assert!(!register_url_credentials(&set, "https://example.com/org/repo.git"));
		assert!(!register_url_credentials(&set, "git@example.com:org/repo.git"));
		assert!(set.is_empty());
	}

	#[test]
	fn helper_answers_get_requests() {
		let mut helper = helper("bob".to_string(), "pw".to_string());
		let outcome = helper(Action::get_for_url("https://example.com/r.git"))
			.unwrap()
			.unwrap();
		assert_eq!(outcome.identity.username, "bob");
		assert_eq!(outcome.identity.password, "pw");
	}

	#[test]
	fn only_password_credentials_answer_http() {
		assert!(http_account(Some(&Credentials::ssh_key("git", "KEY"))).is_none());
		let account = http_account(Some(&Credentials::username_password("bob", "pw"))).unwrap();
		assert_eq!(account, ("bob".to_string(), "pw".to_string()));
	}
}
