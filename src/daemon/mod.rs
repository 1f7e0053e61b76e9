//! Daemon mode: persistent server holding a warm engine and loaded lists.
//!
//! CHANGELOG:
//! - 20/10/2026 - Process control module
//! - 02/02/2026 - Initial module structure

pub mod control;
pub mod protocol;
pub mod server;
pub mod service;

/// Socket path used when none is given.
pub const DEFAULT_SOCKET: &str = "~/.namematch/daemon.sock";
