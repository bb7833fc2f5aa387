// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Git backend running in-process on gitoxide.
//!
//! Protocols are limited to `file`, `git`, `ssh`, `http` and `https`; any
//! other scheme is rejected before it reaches the network.

mod backend;
pub mod config;
pub mod credentials;
pub mod deadline;
pub mod ops;
pub mod protocol;
pub mod transport;

pub use backend::EmbeddedGitBackend;
