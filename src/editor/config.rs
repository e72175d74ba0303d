//! Editor configuration
//!
//! Everything the editor would otherwise look up from ambient assets (fonts,
//! icons, the missing-image picture) is injected here. Hosts pass it as JSON;
//! any field left out takes its default.

use crate::error::EditorError;
use crate::models::{Font, FormattingIdentifier};
use crate::renderers::StockImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Body text font; also sizes the default attachment glyph
    pub content_font: Font,
    /// Font of embedded HTML labels
    pub html_font: Font,
    /// Font of comment labels
    pub comment_font: Font,
    /// Font of media captions
    pub caption_font: Font,
    /// Maximum title length in characters
    pub title_character_limit: usize,
    /// Shown by the host while the body is empty
    pub placeholder: Option<String>,
    pub read_only: bool,
    /// Box reserved for images of unknown size, in points
    pub media_placeholder_size: (f64, f64),
    /// Picture shown when an image cannot be loaded
    pub missing_image: StockImage,
    /// Toolbar buttons, left to right
    pub toolbar_items: Vec<FormattingIdentifier>,
    pub icons: IconSet,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            content_font: system_font(14),
            html_font: system_font(24),
            comment_font: system_font(12),
            caption_font: system_font(14),
            title_character_limit: 100,
            placeholder: None,
            read_only: false,
            media_placeholder_size: (300.0, 200.0),
            missing_image: StockImage::BrokenImage,
            toolbar_items: vec![
                FormattingIdentifier::Bold,
                FormattingIdentifier::Italic,
                FormattingIdentifier::Underline,
                FormattingIdentifier::Strikethrough,
                FormattingIdentifier::UnorderedList,
                FormattingIdentifier::OrderedList,
                FormattingIdentifier::Done,
            ],
            icons: IconSet::default(),
        }
    }
}

fn system_font(size: u16) -> Font {
    Font {
        family: "system-ui".to_string(),
        size,
    }
}

impl EditorConfig {
    /// Parse a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        let config: EditorConfig =
            serde_json::from_str(json).map_err(|e| EditorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, EditorError> {
        serde_json::to_string(self).map_err(|e| EditorError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<(), EditorError> {
        for font in [&self.content_font, &self.html_font, &self.comment_font, &self.caption_font] {
            if font.size == 0 {
                return Err(EditorError::Config(format!("font {} has size 0", font.family)));
            }
        }
        let (width, height) = self.media_placeholder_size;
        if !(width > 0.0 && height > 0.0) {
            return Err(EditorError::Config(format!(
                "media placeholder size must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(())
    }
}

/// Icon names for toolbar buttons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconSet {
    pub icons: BTreeMap<FormattingIdentifier, String>,
    /// Icon for identifiers without an entry
    pub fallback: String,
}

impl Default for IconSet {
    fn default() -> Self {
        let icons = [
            (FormattingIdentifier::Media, "gridicons-image"),
            (FormattingIdentifier::Bold, "gridicons-bold"),
            (FormattingIdentifier::Italic, "gridicons-italic"),
            (FormattingIdentifier::Underline, "gridicons-underline"),
            (FormattingIdentifier::Strikethrough, "gridicons-strikethrough"),
            (FormattingIdentifier::OrderedList, "gridicons-list-ordered"),
            (FormattingIdentifier::UnorderedList, "gridicons-list-unordered"),
            (FormattingIdentifier::Done, "gridicons-checkmark"),
        ]
        .into_iter()
        .map(|(id, name)| (id, name.to_string()))
        .collect();

        Self {
            icons,
            fallback: "gridicons-help".to_string(),
        }
    }
}

impl IconSet {
    pub fn icon_for(&self, identifier: FormattingIdentifier) -> &str {
        self.icons
            .get(&identifier)
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }
}
