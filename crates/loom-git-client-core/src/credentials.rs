// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Credentials a client may present to remotes.
//!
//! Storage belongs to the host platform; a client only keeps the set it was
//! handed and materializes entries for the duration of one command.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{GitError, Result};
use crate::secret::SecretString;
use crate::urls::lookup_key;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
	UsernamePassword {
		username: String,
		password: SecretString,
	},
	SshKey {
		username: String,
		private_key: SecretString,
		passphrase: Option<SecretString>,
	},
}

impl Credentials {
	pub fn username_password(username: impl Into<String>, password: impl Into<SecretString>) -> Self {
		Self::UsernamePassword {
			username: username.into(),
			password: password.into(),
		}
	}

	pub fn ssh_key(username: impl Into<String>, private_key: impl Into<SecretString>) -> Self {
		Self::SshKey {
			username: username.into(),
			private_key: private_key.into(),
			passphrase: None,
		}
	}

	pub fn with_passphrase(self, passphrase: impl Into<SecretString>) -> Self {
		match self {
			Self::SshKey {
				username,
				private_key,
				..
			} => Self::SshKey {
				username,
				private_key,
				passphrase: Some(passphrase.into()),
			},
			other => other,
		}
	}

	pub fn username(&self) -> &str {
		match self {
			Self::UsernamePassword { username, .. } | Self::SshKey { username, .. } => username,
		}
	}
}

/// Resolves credential identifiers to credentials. Implemented by the host
/// platform's credential store.
#[async_trait]
pub trait CredentialLookup: Send + Sync {
	async fn lookup(&self, id: &str) -> Result<Option<Credentials>>;
}

/// In-memory [`CredentialLookup`], for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCredentialLookup {
	entries: RwLock<HashMap<String, Credentials>>,
}

impl MemoryCredentialLookup {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, id: impl Into<String>, credentials: Credentials) {
		self.entries.write().insert(id.into(), credentials);
	}
}

#[async_trait]
impl CredentialLookup for MemoryCredentialLookup {
	async fn lookup(&self, id: &str) -> Result<Option<Credentials>> {
		Ok(self.entries.read().get(id).cloned())
	}
}

#[derive(Debug, Default)]
struct Entries {
	by_url: HashMap<String, Credentials>,
	default: Option<Credentials>,
}

/// Credentials keyed by remote URL, plus an optional default. Clones share
/// state so a client and its backend see the same set.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
	inner: Arc<RwLock<Entries>>,
}

impl CredentialSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, url: &str, credentials: Credentials) {
		debug!(url = %crate::urls::redact_url(url), "registered credentials for url");
		self.inner.write().by_url.insert(lookup_key(url), credentials);
	}

	pub fn set_default(&self, credentials: Credentials) {
		self.inner.write().default = Some(credentials);
	}

	pub fn clear(&self) {
		let mut entries = self.inner.write();
		entries.by_url.clear();
		entries.default = None;
	}

	/// Credentials registered for `url`, falling back to the default.
	pub fn for_url(&self, url: &str) -> Option<Credentials> {
		let entries = self.inner.read();
		entries
			.by_url
			.get(&lookup_key(url))
			.or(entries.default.as_ref())
			.cloned()
	}

	pub fn is_empty(&self) -> bool {
		let entries = self.inner.read();
		entries.by_url.is_empty() && entries.default.is_none()
	}

	/// Resolve `id` through `lookup` and register the result for `url`.
	pub async fn insert_from_lookup(&self, url: &str, id: &str, lookup: &dyn CredentialLookup) -> Result<()> {
		let credentials = lookup
			.lookup(id)
			.await?
			.ok_or_else(|| GitError::credentials(format!("no credentials found for id {id}")))?;
		self.insert(url, credentials);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lookup_ignores_userinfo_and_suffix() {
		let set = CredentialSet::new();
		set.insert(
			"https://example.com/org/repo.git",
			Credentials::username_password("bob", "pw"),
		);
		let found = set.for_url("https://alice:x@example.com/org/repo/").unwrap();
		assert_eq!(found.username(), "bob");
	}

	#[test]
	fn default_is_used_as_fallback() {
		let set = CredentialSet::new();
		assert!(set.for_url("https://example.com/r.git").is_none());
		set.set_default(Credentials::ssh_key("git", "-----BEGIN KEY-----"));
		assert_eq!(set.for_url("https://example.com/r.git").unwrap().username(), "git");
	}

	#[test]
	fn clones_share_entries() {
		let set = CredentialSet::new();
		let other = set.clone();
		other.set_default(Credentials::username_password("u", "p"));
		assert!(!set.is_empty());
		set.clear();
		assert!(other.is_empty());
	}

	#[test]
	fn passphrase_only_applies_to_keys() {
		let key = Credentials::ssh_key("git", "k").with_passphrase("pp");
		assert!(matches!(key, Credentials::SshKey { passphrase: Some(_), .. }));
		let pw = Credentials::username_password("u", "p").with_passphrase("pp");
		assert!(matches!(pw, Credentials::UsernamePassword { .. }));
	}

	#[tokio::test]
	async fn insert_from_lookup_resolves_id() {
		let lookup = MemoryCredentialLookup::new();
		lookup.insert("github-bot", Credentials::username_password("bot", "token"));
		let set = CredentialSet::new();
		set.insert_from_lookup("https://github.com/o/r.git", "github-bot", &lookup)
			.await
			.unwrap();
		assert_eq!(set.for_url("https://github.com/o/r").unwrap().username(), "bot");

		let missing = set.insert_from_lookup("https://x", "nope", &lookup).await;
		assert!(matches!(missing, Err(GitError::Credentials(_))));
	}
}
