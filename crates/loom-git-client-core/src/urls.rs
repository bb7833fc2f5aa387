// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Helpers for remote URLs: credential extraction, redaction and lookup keys.

use url::Url;

use crate::secret::SecretString;

/// Placeholder written over URL passwords in logs and errors.
pub const MASK: &str = "****";

/// True for `scheme://...` URLs and scp-like `user@host:path` locations.
pub fn is_url(value: &str) -> bool {
	if let Some((scheme, _)) = value.split_once("://") {
		return !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.');
	}
	is_scp_like(value)
}

fn is_scp_like(value: &str) -> bool {
	match (value.find('@'), value.find(':')) {
		(Some(at), Some(colon)) => at < colon && !value[..colon].contains('/'),
		_ => false,
	}
}

/// Username and password embedded in a URL's authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
	pub username: String,
	pub password: SecretString,
	/// The URL with the password and username removed.
	pub stripped_url: String,
}

/// Extract `user:password@` from a `scheme://` URL.
///
/// Percent-encoded values are decoded. Returns `None` when either part is
/// missing or the URL cannot be parsed.
pub fn extract_userinfo(value: &str) -> Option<UserInfo> {
	let mut parsed = Url::parse(value).ok()?;
	if parsed.username().is_empty() {
		return None;
	}
	let username = urlencoding::decode(parsed.username()).ok()?.into_owned();
	let password = urlencoding::decode(parsed.password()?).ok()?.into_owned();

	parsed.set_password(None).ok()?;
	parsed.set_username("").ok()?;
	Some(UserInfo {
		username,
		password: SecretString::new(password),
		stripped_url: parsed.to_string(),
	})
}

/// Replace any URL password with [`MASK`]. Non-URLs are returned unchanged.
pub fn redact_url(value: &str) -> String {
	match Url::parse(value) {
		Ok(mut parsed) if parsed.password().is_some() => {
			if parsed.set_password(Some(MASK)).is_ok() {
				parsed.to_string()
			} else {
				value.to_string()
			}
		}
		_ => value.to_string(),
	}
}

/// Key used to match credentials to a URL: userinfo, a trailing slash and a
/// trailing `.git` are ignored.
pub fn lookup_key(value: &str) -> String {
	let base = match Url::parse(value) {
		Ok(mut parsed) if parsed.has_host() => {
			let _ = parsed.set_password(None);
			let _ = parsed.set_username("");
			parsed.to_string()
		}
		_ => value.to_string(),
	};
	let trimmed = base.trim_end_matches('/');
	trimmed.strip_suffix(".git").unwrap_or(trimmed).to_string()
}
