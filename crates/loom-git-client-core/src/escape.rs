// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Escaping for values written into `cmd.exe` batch helpers.

/// Characters `cmd.exe` treats specially in an unquoted argument; each is
/// escaped with a leading caret.
const CARET_ESCAPED: [char; 9] = ['^', '&', '\\', '<', '>', '|', ' ', '"', '\t'];

/// Escape `value` so `cmd.exe` reads it back verbatim as one unquoted argument.
///
/// Caret-class characters gain a `^` prefix and `%` is doubled. The mapping is
/// applied one character at a time, so the two classes never interfere.
/// Escaping already-escaped text adds another layer.
pub fn escape_windows_chars_for_unquoted_string(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len() + value.len() / 4);
	for c in value.chars() {
		if c == '%' {
			escaped.push_str("%%");
		} else {
			if CARET_ESCAPED.contains(&c) {
				escaped.push('^');
			}
			escaped.push(c);
		}
	}
	escaped
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	/// Walks escaped text and checks every special character is consumed by a
	/// preceding escape.
	fn all_specials_escaped(escaped: &str) -> bool {
		let mut chars = escaped.chars();
		while let Some(c) = chars.next() {
			match c {
				'^' => {
					if !matches!(chars.next(), Some(n) if CARET_ESCAPED.contains(&n)) {
						return false;
					}
				}
				'%' => {
					if chars.next() != Some('%') {
						return false;
					}
				}
				c if CARET_ESCAPED.contains(&c) => return false,
				_ => {}
			}
		}
		true
	}

	#[test]
	fn empty_input_stays_empty() {
		assert_eq!(escape_windows_chars_for_unquoted_string(""), "");
	}

	#[test]
	fn plain_text_is_unchanged() {
		assert_eq!(escape_windows_chars_for_unquoted_string("hunter2"), "hunter2");
	}

	#[test]
	fn each_special_character_is_escaped() {
		assert_eq!(escape_windows_chars_for_unquoted_string("^"), "^^");
		assert_eq!(escape_windows_chars_for_unquoted_string("&"), "^&");
		assert_eq!(escape_windows_chars_for_unquoted_string("\\"), "^\\");
		assert_eq!(escape_windows_chars_for_unquoted_string("<>"), "^<^>");
		assert_eq!(escape_windows_chars_for_unquoted_string("|"), "^|");
		assert_eq!(escape_windows_chars_for_unquoted_string("a b"), "a^ b");
		assert_eq!(escape_windows_chars_for_unquoted_string("\""), "^\"");
		assert_eq!(escape_windows_chars_for_unquoted_string("\t"), "^\t");
		assert_eq!(escape_windows_chars_for_unquoted_string("%PATH%"), "%%PATH%%");
	}

	#[test]
	fn mixed_password() {
		assert_eq!(
			escape_windows_chars_for_unquoted_string("p@ss%w0rd^&"),
			"p@ss%%w0rd^^^&"
		);
	}

	/// Test: escaping twice adds a second layer.
	///
	/// Why this test is important: callers that escape a value once must not
	/// assume they can safely run it through again; the second pass produces
	/// a different string that cmd.exe would unescape only once.
	#[test]
	fn escaping_is_not_idempotent() {
		let once = escape_windows_chars_for_unquoted_string("a&b%c");
		let twice = escape_windows_chars_for_unquoted_string(&once);
		assert_eq!(once, "a^&b%%c");
		assert_eq!(twice, "a^^^&b%%%%c");
		assert_ne!(once, twice);
	}

	#[test]
	fn doubled_special_input_escapes_to_doubled_output() {
		let special = "^&\\<>| \"\t%";
		let single = escape_windows_chars_for_unquoted_string(special);
		let doubled = escape_windows_chars_for_unquoted_string(&format!("{special}{special}"));
		assert_eq!(doubled, format!("{single}{single}"));
	}

	proptest! {
		#[test]
		fn output_has_no_unescaped_specials(s in "[^\u{0}]{0,64}") {
			prop_assert!(all_specials_escaped(&escape_windows_chars_for_unquoted_string(&s)));
		}

		#[test]
		fn escaping_distributes_over_concatenation(s in "[^\u{0}]{0,32}") {
			let single = escape_windows_chars_for_unquoted_string(&s);
			let doubled = escape_windows_chars_for_unquoted_string(&format!("{s}{s}"));
			prop_assert_eq!(doubled, format!("{single}{single}"));
		}

		#[test]
		fn non_special_text_passes_through(s in "[A-Za-z0-9@._-]{0,32}") {
			prop_assert_eq!(escape_windows_chars_for_unquoted_string(&s), s);
		}
	}
}
