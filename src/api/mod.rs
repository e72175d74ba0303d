//! Rich Text Editor WASM API
//!
//! JavaScript-facing surface of the editor. One editor instance lives in
//! WASM-owned storage; the host creates it, then drives it with selection
//! changes, typing and toolbar actions, and reads back HTML and toolbar state.
//!
//! # Module Structure
//!
//! - `helpers`: serialization, error conversion and access to the editor instance
//! - `core`: the exported functions

pub mod helpers;
pub mod core;

pub use core::*;
