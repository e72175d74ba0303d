//! Models module for the rich text editor
//!
//! Plain data shared by the document, the formatting engine, the HTML bridge
//! and the renderers.

pub mod attachment;
pub mod identifiers;
pub mod style;

// Re-export commonly used types
pub use attachment::*;
pub use identifiers::FormattingIdentifier;
pub use style::*;
