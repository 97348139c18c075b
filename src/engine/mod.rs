// src/engine/mod.rs

//! The build-trigger loop.
//!
//! This ties together:
//! - the builder (compile the tree on startup and on every change)
//! - the process supervisor (kill the stale child before a rebuild, start
//!   the fresh binary in immediate mode)
//! - the kill-on-error policy (recoverable failures are recorded and logged;
//!   fatal ones bubble up and terminate the process with a non-zero status)

pub mod build_loop;

pub use build_loop::BuildLoop;
