//! Filesystem helpers for lottery-agents.
//!
//! Batch files are rewritten through a temp-file-and-rename so an interrupted
//! run leaves either the previous batch or the new one, never a torn file.

pub mod atomic;

pub use atomic::atomic_write_file;
