// ABOUTME: Library root for gvm-shell - exposes the session building blocks for testing.
// ABOUTME: The main binary is in main.rs.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod gmp;
pub mod logging;
pub mod shell;
pub mod transport;
