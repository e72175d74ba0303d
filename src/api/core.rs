//! WASM API for the editor
//!
//! Positions are UTF-16 offsets, matching JavaScript string indexing.

use super::helpers::{deserialize, install_editor, serialize, validation_error, with_editor};
use crate::editor::{EditorConfig, RichTextEditor};
use crate::models::{AttachmentId, MediaAttachment, MediaSource};
use crate::text::SelectionRange;
use kurbo::Rect;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Attachment layout box as returned to JavaScript
#[derive(Serialize, Clone, Debug)]
pub struct AttachmentBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<Rect> for AttachmentBounds {
    fn from(rect: Rect) -> Self {
        Self {
            x: rect.x0,
            y: rect.y0,
            width: rect.width(),
            height: rect.height(),
        }
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Create the editor, optionally from a JSON configuration
#[wasm_bindgen(js_name = createEditor)]
pub fn create_editor(config_json: Option<String>) -> Result<(), JsValue> {
    log::info!("createEditor called");

    let config = match config_json {
        Some(json) => EditorConfig::from_json(&json).map_err(|e| validation_error(e.to_string()))?,
        None => EditorConfig::default(),
    };
    install_editor(RichTextEditor::new(config))
}

/// Configuration in effect, as a JSON string
#[wasm_bindgen(js_name = getConfig)]
pub fn get_config() -> Result<String, JsValue> {
    with_editor(|editor| editor.config().to_json())
}

#[wasm_bindgen(js_name = setReadOnly)]
pub fn set_read_only(read_only: bool) -> Result<(), JsValue> {
    with_editor(|editor| {
        editor.set_read_only(read_only);
        Ok(())
    })
}

// ============================================================================
// Content
// ============================================================================

#[wasm_bindgen(js_name = setHtml)]
pub fn set_html(html: &str) -> Result<(), JsValue> {
    log::debug!("setHtml called ({} bytes)", html.len());
    with_editor(|editor| editor.set_html(html))
}

#[wasm_bindgen(js_name = getHtml)]
pub fn get_html() -> Result<String, JsValue> {
    with_editor(|editor| Ok(editor.html()))
}

/// Plain text of the rich document
#[wasm_bindgen(js_name = getText)]
pub fn get_text() -> Result<String, JsValue> {
    with_editor(|editor| Ok(editor.document().text()))
}

#[wasm_bindgen(js_name = getPlaceholder)]
pub fn get_placeholder() -> Result<Option<String>, JsValue> {
    with_editor(|editor| Ok(editor.placeholder().map(str::to_string)))
}

// ============================================================================
// Selection and typing
// ============================================================================

/// Report the host's selection
#[wasm_bindgen(js_name = setSelection)]
pub fn set_selection(start: usize, length: usize) -> Result<(), JsValue> {
    with_editor(|editor| editor.set_selection(SelectionRange::new(start, length)))
}

/// Current selection as `{ start, length }`
#[wasm_bindgen(js_name = getSelection)]
pub fn get_selection() -> Result<JsValue, JsValue> {
    let selection = with_editor(|editor| Ok(editor.selection()))?;
    serialize(&selection, "Selection serialization error")
}

#[wasm_bindgen(js_name = insertText)]
pub fn insert_text(text: &str) -> Result<(), JsValue> {
    with_editor(|editor| editor.insert_text(text))
}

#[wasm_bindgen(js_name = deleteRange)]
pub fn delete_range(start: usize, length: usize) -> Result<(), JsValue> {
    with_editor(|editor| editor.delete(SelectionRange::new(start, length)))
}

#[wasm_bindgen(js_name = deleteBackward)]
pub fn delete_backward() -> Result<(), JsValue> {
    with_editor(|editor| editor.delete_backward())
}

// ============================================================================
// Toolbar
// ============================================================================

/// Run a toolbar action by identifier; returns the outcome object
#[wasm_bindgen(js_name = handleAction)]
pub fn handle_action(identifier: &str) -> Result<JsValue, JsValue> {
    log::debug!("handleAction called: {}", identifier);
    let outcome = with_editor(|editor| editor.handle_action(identifier))?;
    serialize(&outcome, "Action outcome serialization error")
}

/// Identifiers active for the current selection, as strings
#[wasm_bindgen(js_name = getActiveIdentifiers)]
pub fn get_active_identifiers() -> Result<JsValue, JsValue> {
    let active = with_editor(|editor| editor.active_identifiers())?;
    let names: Vec<&str> = active.iter().map(|id| id.as_str()).collect();
    serialize(&names, "Identifier serialization error")
}

#[wasm_bindgen(js_name = getToolbarItems)]
pub fn get_toolbar_items() -> Result<JsValue, JsValue> {
    let items = with_editor(|editor| editor.toolbar_items())?;
    serialize(&items, "Toolbar serialization error")
}

#[wasm_bindgen(js_name = getEditingMode)]
pub fn get_editing_mode() -> Result<JsValue, JsValue> {
    let mode = with_editor(|editor| Ok(editor.mode()))?;
    serialize(&mode, "Editing mode serialization error")
}

/// `{ title, html }` for the host to persist
#[wasm_bindgen(js_name = getSnapshot)]
pub fn get_snapshot() -> Result<JsValue, JsValue> {
    let snapshot = with_editor(|editor| Ok(editor.snapshot()))?;
    serialize(&snapshot, "Snapshot serialization error")
}

// ============================================================================
// Title
// ============================================================================

#[wasm_bindgen(js_name = getTitle)]
pub fn get_title() -> Result<String, JsValue> {
    with_editor(|editor| Ok(editor.title().to_string()))
}

/// Replace the title; false when the limit would be exceeded
#[wasm_bindgen(js_name = setTitle)]
pub fn set_title(title: &str) -> Result<bool, JsValue> {
    with_editor(|editor| editor.set_title(title))
}

#[wasm_bindgen(js_name = replaceTitle)]
pub fn replace_title(start: usize, length: usize, replacement: &str) -> Result<bool, JsValue> {
    with_editor(|editor| editor.replace_title(SelectionRange::new(start, length), replacement))
}

// ============================================================================
// Attachments
// ============================================================================

/// Insert an image by URL at the selection; returns the attachment id
#[wasm_bindgen(js_name = insertImage)]
pub fn insert_image(url: &str, caption: Option<String>) -> Result<f64, JsValue> {
    let mut media = MediaAttachment::new(MediaSource::Url(url.to_string()));
    if let Some(caption) = caption {
        media = media.with_caption(caption);
    }
    let id = with_editor(|editor| editor.insert_media(media))?;
    Ok(id.0 as f64)
}

/// Id of the attachment under a one-unit selection
#[wasm_bindgen(js_name = getSelectedAttachment)]
pub fn get_selected_attachment() -> Result<JsValue, JsValue> {
    let selected = with_editor(|editor| {
        Ok(editor
            .selected_attachment()
            .map(|entry| (entry.id, entry.attachment.clone())))
    })?;
    serialize(&selected, "Attachment serialization error")
}

/// Layout box for an attachment inside a line fragment
#[wasm_bindgen(js_name = getAttachmentBounds)]
pub fn get_attachment_bounds(
    id: f64,
    fragment_x: f64,
    fragment_y: f64,
    fragment_width: f64,
    fragment_height: f64,
) -> Result<JsValue, JsValue> {
    let fragment = Rect::new(
        fragment_x,
        fragment_y,
        fragment_x + fragment_width,
        fragment_y + fragment_height,
    );
    let bounds = with_editor(|editor| editor.attachment_bounds(AttachmentId(id as u64), fragment))?;
    serialize(&AttachmentBounds::from(bounds), "Bounds serialization error")
}

/// Attachments whose image arrived since the last call
#[wasm_bindgen(js_name = processImageDeliveries)]
pub fn process_image_deliveries() -> Result<js_sys::Array, JsValue> {
    let invalidated = with_editor(|editor| Ok(editor.process_image_deliveries()))?;
    Ok(invalidated
        .into_iter()
        .map(|id| JsValue::from_f64(id.0 as f64))
        .collect())
}

/// Parse a JavaScript selection object `{ start, length }`
#[wasm_bindgen(js_name = setSelectionRange)]
pub fn set_selection_range(range_js: JsValue) -> Result<(), JsValue> {
    let range: SelectionRange = deserialize(range_js, "Selection deserialization error")?;
    with_editor(|editor| editor.set_selection(range))
}
