//! Shared helpers for WASM API operations
//!
//! Serialization, error conversion and locked access to the editor instance.

use crate::editor::RichTextEditor;
use crate::error::EditorError;
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Mutex;
use wasm_bindgen::prelude::*;

// WASM-owned editor storage
lazy_static! {
    static ref EDITOR: Mutex<Option<RichTextEditor>> = Mutex::new(None);
}

// ============================================================================
// Editor Access
// ============================================================================

/// Store `editor` as the current instance, dropping any previous one
pub fn install_editor(editor: RichTextEditor) -> Result<(), JsValue> {
    let mut guard = EDITOR.lock().map_err(|_| lock_error())?;
    *guard = Some(editor);
    Ok(())
}

/// Run `f` against the current editor
pub fn with_editor<T>(
    f: impl FnOnce(&mut RichTextEditor) -> Result<T, EditorError>,
) -> Result<T, JsValue> {
    let mut guard = EDITOR.lock().map_err(|_| lock_error())?;
    let editor = guard
        .as_mut()
        .ok_or_else(|| validation_error("No editor created; call createEditor first"))?;
    f(editor).map_err(editor_error)
}

fn lock_error() -> JsValue {
    validation_error("Editor storage is poisoned")
}

// ============================================================================
// Serialization/Deserialization Helpers
// ============================================================================

/// Deserialize a value from JavaScript with automatic error handling
pub fn deserialize<T: DeserializeOwned>(
    value: JsValue,
    error_context: &str,
) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| {
        let msg = format!("{}: {}", error_context, e);
        log::error!("{}", msg);
        JsValue::from_str(&msg)
    })
}

/// Serialize a value to JavaScript with automatic error handling
pub fn serialize<T: Serialize>(value: &T, error_context: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| {
        let msg = format!("{}: {}", error_context, e);
        log::error!("{}", msg);
        JsValue::from_str(&msg)
    })
}

// ============================================================================
// Result Conversion Helpers
// ============================================================================

/// Convert an editor error to a JsValue
pub fn editor_error(error: EditorError) -> JsValue {
    log::warn!("Editor error: {}", error);
    JsValue::from_str(&error.to_string())
}

/// Convert a validation error to a JsValue
pub fn validation_error(msg: impl Into<String>) -> JsValue {
    let msg = msg.into();
    log::error!("{}", msg);
    JsValue::from_str(&msg)
}
