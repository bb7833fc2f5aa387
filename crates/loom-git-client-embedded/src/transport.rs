// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Per-operation transport settings: in-memory config overrides for ssh and
//! proxies, the credential account, and the temporary files they point at.

use std::io::Write;
use std::path::Path;

use loom_git_client_core::host_key::ssh_command_line;
use loom_git_client_core::{
	active_host_key_verification, BackendContext, Credentials, GitError, HostKeyVerification, Result,
};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::credentials::http_account;
use crate::protocol::is_ssh;

/// Settings for one network operation. Temporary files are removed when
/// the value is dropped.
pub struct Transport {
	overrides: Vec<String>,
	account: Option<(String, String)>,
	files: Vec<NamedTempFile>,
}

impl Transport {
	/// Build the settings for talking to `url`, authenticating with whatever
	/// is registered for `credentials_url`.
	pub fn prepare(context: &BackendContext, url: &gix::Url, credentials_url: &str) -> Result<Self> {
		let credentials = context.credentials.for_url(credentials_url);
		let mut transport = Self {
			overrides: Vec::new(),
			account: http_account(credentials.as_ref()),
			files: Vec::new(),
		};

		if let Some(proxy) = &context.proxy {
			transport.overrides.push(format!("http.proxy={}", proxy.proxy_url()));
			let no_proxy = proxy.no_proxy_value();
			if !no_proxy.is_empty() {
				transport.overrides.push(format!("gitoxide.http.noProxy={no_proxy}"));
			}
		}

		if is_ssh(url) {
			let base = context.var("GIT_SSH_COMMAND").unwrap_or_else(|| "ssh".to_string());
			let command = transport.ssh_command(&base, &active_host_key_verification(), credentials.as_ref())?;
			transport.overrides.push(format!("core.sshCommand={command}"));
		}
		Ok(transport)
	}

	fn ssh_command(
		&mut self,
		base: &str,
		strategy: &HostKeyVerification,
		credentials: Option<&Credentials>,
	) -> Result<String> {
		let known_hosts = match strategy.inline_known_hosts() {
			Some(keys) => Some(self.write_secret("loom-known-hosts-", keys)?),
			None => None,
		};
		let options = strategy.ssh_options(known_hosts.as_deref().map(Path::new))?;

		let identity = match credentials {
			Some(Credentials::SshKey { passphrase: Some(_), .. }) => {
				return Err(GitError::Unsupported {
					backend: "embedded",
					operation: "passphrase-protected ssh keys",
				});
			}
			Some(Credentials::SshKey { private_key, .. }) => {
				Some(self.write_secret("loom-ssh-key-", private_key.expose())?)
			}
			_ => None,
		};

		debug!(strategy = strategy.name(), with_key = identity.is_some(), "configured ssh transport");
		Ok(ssh_command_line(base, identity.as_deref().map(Path::new), &options))
	}

	/// Write `contents` to a new private temporary file and return its path.
	fn write_secret(&mut self, prefix: &str, contents: &str) -> Result<String> {
		let mut file = tempfile::Builder::new()
			.prefix(prefix)
			.tempfile()
			.map_err(|e| GitError::credentials(format!("could not create {prefix} file: {e}")))?;
		let mut contents = contents.to_string();
		if !contents.ends_with('\n') {
			contents.push('\n');
		}
		file.write_all(contents.as_bytes())
			.map_err(|e| GitError::credentials(format!("could not write {prefix} file: {e}")))?;
		let path = file.path().display().to_string();
		self.files.push(file);
		Ok(path)
	}

	pub fn overrides(&self) -> &[String] {
		&self.overrides
	}

	/// Username and password for the credential helper, if any.
	pub fn account(&self) -> Option<(String, String)> {
		self.account.clone()
	}

	pub fn temp_files(&self) -> Vec<&Path> {
		self.files.iter().map(|f| f.path()).collect()
	}
}
