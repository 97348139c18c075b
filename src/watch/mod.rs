// src/watch/mod.rs

//! Change detection by polling.
//!
//! The scanner walks the watched tree at a fixed interval and reports the
//! first tracked source file modified since the last detection pass.
//! Polling (rather than OS change notification) is deliberate: it behaves
//! the same on every filesystem and platform, at the cost of detection
//! latency bounded by the poll interval.
//!
//! The module does **not** know about builds or processes; it only turns
//! filesystem changes into path events for the build loop.

pub mod scanner;

pub use scanner::{Scanner, spawn_scanner};
