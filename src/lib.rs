//! Rich Text Editor WASM Module
//!
//! Core of a rich text editor: a styled-run document model with attachments,
//! a formatting engine, an HTML bridge and pluggable attachment renderers.
//! The `api` module exposes it to JavaScript.

pub mod api;
pub mod editor;
pub mod error;
pub mod formatting;
pub mod html;
pub mod models;
pub mod renderers;
pub mod text;
pub mod utils;

// Re-export commonly used types
pub use editor::{ActionOutcome, EditingMode, EditorConfig, RichTextEditor, Snapshot};
pub use error::{EditorError, FetchError, MalformedMarkup};
pub use html::{from_html, to_html};
pub use models::{Attachment, AttachmentId, FormattingIdentifier};
pub use text::{Document, SelectionRange};

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    // Fails only when a logger is already installed
    #[cfg(feature = "console_log")]
    let _ = console_log::init_with_level(log::Level::Debug);

    log::info!("Rich Text Editor WASM module initialized");
}
