//! Helpers the binary reaches for directly.

pub use crate::core::error::is_broken_pipe;
