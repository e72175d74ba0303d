//! Deterministic text metrics
//!
//! Attachment bounds must be reproducible without a platform font stack, so
//! glyph geometry is approximated from the point size alone:
//!
//! - advance: 0.46 em per character, total width rounded up
//! - line height: 1.2 em, rounded up
//! - descent: 0.25 em, rounded

use crate::models::Font;
use serde::{Deserialize, Serialize};

const ADVANCE_EM: f64 = 0.46;
const LINE_HEIGHT_EM: f64 = 1.2;
const DESCENT_EM: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontMetrics {
    /// Point size
    pub size: f64,
}

impl FontMetrics {
    pub fn new(size: f64) -> Self {
        Self { size }
    }

    /// Width of `text` set on one line
    pub fn text_width(&self, text: &str) -> f64 {
        (text.chars().count() as f64 * self.size * ADVANCE_EM).ceil()
    }

    pub fn line_height(&self) -> f64 {
        (self.size * LINE_HEIGHT_EM).ceil()
    }

    pub fn descent(&self) -> f64 {
        (self.size * DESCENT_EM).round()
    }
}

impl From<&Font> for FontMetrics {
    fn from(font: &Font) -> Self {
        Self::new(f64::from(font.size))
    }
}
