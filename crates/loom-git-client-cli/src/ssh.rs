// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! `GIT_SSH_COMMAND` construction from the host-key strategy and SSH keys.

use loom_git_client_core::host_key::ssh_command_line;
use loom_git_client_core::{Credentials, HostKeyVerification, Result};
use tracing::debug;

use crate::askpass::passphrase_script;
use crate::scoped::ScopedFiles;

/// Environment variables that make git's ssh transport honour `strategy`
/// and authenticate with `credentials` when they carry a key.
///
/// `base_command` is the ssh invocation to extend, normally `ssh`.
pub async fn ssh_environment(
	scope: &mut ScopedFiles,
	base_command: &str,
	strategy: &HostKeyVerification,
	credentials: Option<&Credentials>,
) -> Result<Vec<(String, String)>> {
	let mut env = Vec::new();

	let known_hosts = match strategy.inline_known_hosts() {
		Some(keys) => {
			let mut contents = keys.to_string();
			if !contents.ends_with('\n') {
				contents.push('\n');
			}
			Some(scope.write_secret("known_hosts-", "", &contents).await?)
		}
		None => None,
	};
	let options = strategy.ssh_options(known_hosts.as_deref())?;

	let mut identity = None;
	if let Some(Credentials::SshKey {
		private_key,
		passphrase,
		..
	}) = credentials
	{
		let mut key = private_key.expose().to_string();
		if !key.ends_with('\n') {
			key.push('\n');
		}
		identity = Some(scope.write_secret("ssh-key-", ".key", &key).await?);

		if let Some(passphrase) = passphrase {
			let (script, suffix) = passphrase_script(passphrase.expose());
			let askpass = scope.write_script("pass-", suffix, &script).await?;
			env.push(("SSH_ASKPASS".to_string(), askpass.display().to_string()));
			env.push(("SSH_ASKPASS_REQUIRE".to_string(), "force".to_string()));
			env.push(("DISPLAY".to_string(), ":0".to_string()));
		}
	}

	let command = ssh_command_line(base_command, identity.as_deref(), &options);
	debug!(strategy = strategy.name(), with_key = identity.is_some(), "configured ssh transport");
	env.push(("GIT_SSH_COMMAND".to_string(), command));
	env.push(("GIT_SSH_VARIANT".to_string(), "ssh".to_string()));
	Ok(env)
}

/// True for URLs git fetches over ssh.
pub fn is_ssh_url(url: &str) -> bool {
	let lower = url.to_ascii_lowercase();
	if lower.starts_with("ssh://") || lower.starts_with("git+ssh://") || lower.starts_with("ssh+git://") {
		return true;
	}
	!url.contains("://") && loom_git_client_core::urls::is_url(url)
}
