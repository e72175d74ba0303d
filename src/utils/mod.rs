//! Utility functions shared across the editor core

pub mod utf16;

pub use utf16::{byte_offset, char_at, split_at, utf16_len};
