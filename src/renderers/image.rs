//! Images produced by attachment renderers

use crate::error::FetchError;
use image::RgbaImage;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Built-in images that need no decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StockImage {
    /// Shown while a fetch is in flight
    Placeholder,
    /// Shown after a fetch or decode failure
    BrokenImage,
    /// Glyph of the default renderer
    Generic,
}

/// Text drawn as an image, e.g. a comment marker
#[derive(Debug, Clone, PartialEq)]
pub struct LabelImage {
    pub text: String,
    pub size: Size,
    pub font_size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Image {
    Bitmap(Arc<RgbaImage>),
    Label(LabelImage),
    Stock(StockImage),
}

impl Image {
    /// Decode PNG or JPEG bytes into an RGBA bitmap
    pub fn decode(bytes: &[u8]) -> Result<Image, FetchError> {
        let decoded = image::load_from_memory(bytes).map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(Image::Bitmap(Arc::new(decoded.into_rgba8())))
    }

    /// Pixel size of a bitmap
    pub fn pixel_size(&self) -> Option<(u32, u32)> {
        match self {
            Image::Bitmap(bitmap) => Some(bitmap.dimensions()),
            _ => None,
        }
    }

    pub fn is_stock(&self, stock: StockImage) -> bool {
        matches!(self, Image::Stock(s) if *s == stock)
    }
}
