//! Text Editor Core
//!
//! The attributed document model. This layer has no knowledge of HTML or
//! rendering; the formatting engine, the HTML bridge and the renderers are
//! all built on top of it.
//!
//! ## Modules
//!
//! - `runs`: Styled runs and run-list normalization
//! - `cursor`: Selection ranges (UTF-16 positions)
//! - `attachments`: Attachment side-table keyed by placeholder position
//! - `document`: The document itself

pub mod attachments;
pub mod cursor;
pub mod document;
pub mod runs;

// Re-exports for convenience
pub use attachments::{AttachmentEntry, AttachmentTable, Liveness};
pub use cursor::SelectionRange;
pub use document::{Document, ParagraphView, Piece};
pub use runs::StyledRun;
