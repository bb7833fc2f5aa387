// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Askpass helper scripts.
//!
//! git and ssh run the helper with one argument, the prompt text
//! (`Username for 'https://host': `, `Password for ...`, `Enter passphrase
//! for key ...`). The helper prints the answer on stdout and exits 0.

use loom_git_client_core::escape_windows_chars_for_unquoted_string;

fn sh_single_quote(value: &str) -> String {
	format!("'{}'", value.replace('\'', "'\\''"))
}

/// `/bin/sh` helper answering username and password prompts.
pub fn unix_credentials_script(username: &str, password: &str) -> String {
	format!(
		"#!/bin/sh\ncase \"$1\" in\nUsername*) printf '%s\\n' {} ;;\nPassword*) printf '%s\\n' {} ;;\nesac\n",
		sh_single_quote(username),
		sh_single_quote(password)
	)
}

/// `cmd.exe` helper answering username and password prompts.
pub fn windows_credentials_script(username: &str, password: &str) -> String {
	format!(
		"@set arg=%~1\r\n@if (%arg:~0,8%)==(Username) echo {}\r\n@if (%arg:~0,8%)==(Password) echo {}\r\n",
		escape_windows_chars_for_unquoted_string(username),
		escape_windows_chars_for_unquoted_string(password)
	)
}

/// `/bin/sh` helper answering any prompt with the key passphrase.
pub fn unix_passphrase_script(passphrase: &str) -> String {
	format!("#!/bin/sh\nprintf '%s\\n' {}\n", sh_single_quote(passphrase))
}

pub fn windows_passphrase_script(passphrase: &str) -> String {
	format!("@echo {}\r\n", escape_windows_chars_for_unquoted_string(passphrase))
}

/// Helper script for the current platform, with the file suffix it needs.
pub fn credentials_script(username: &str, password: &str) -> (String, &'static str) {
	if cfg!(windows) {
		(windows_credentials_script(username, password), ".bat")
	} else {
		(unix_credentials_script(username, password), ".sh")
	}
}

pub fn passphrase_script(passphrase: &str) -> (String, &'static str) {
	if cfg!(windows) {
		(windows_passphrase_script(passphrase), ".bat")
	} else {
		(unix_passphrase_script(passphrase), ".sh")
	}
}
