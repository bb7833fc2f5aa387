// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for passwords, passphrases and private keys.

use std::fmt;
use zeroize::Zeroize;

/// The redaction placeholder used in all output.
pub const REDACTED: &str = "[REDACTED]";

/// A credential string that never appears in `Debug` or `Display` output and
/// is zeroed when dropped. Call [`SecretString::expose`] to read it.
#[derive(Clone, Zeroize, PartialEq, Eq)]
#[zeroize(drop)]
pub struct SecretString {
	inner: String,
}

impl SecretString {
	pub fn new(inner: impl Into<String>) -> Self {
		Self {
			inner: inner.into(),
		}
	}

	pub fn expose(&self) -> &str {
		&self.inner
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("SecretString").field(&REDACTED).finish()
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn formatting_is_redacted() {
		let secret = SecretString::new("hunter2");
		assert_eq!(format!("{secret:?}"), "SecretString(\"[REDACTED]\")");
		assert_eq!(format!("{secret}"), "[REDACTED]");
		assert_eq!(secret.expose(), "hunter2");
	}

	proptest! {
		#[test]
		fn never_leaks_through_formatting(value in "[a-zA-Z0-9]{8,32}") {
			let secret = SecretString::new(value.clone());
			let debug = format!("{secret:?}");
			let display = format!("{secret}");
			prop_assert!(!debug.contains(&value));
			prop_assert!(!display.contains(&value));
		}
	}
}
