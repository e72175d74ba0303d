//! Style attribute vocabulary
//!
//! A run of text carries an [`Attributes`] map from [`StyleKey`] to
//! [`StyleValue`]. Keys are either character-level (apply to individual
//! characters) or paragraph-level (apply to a whole paragraph, including its
//! trailing separator).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute keys
///
/// Declaration order doubles as the HTML inline nesting order (outermost
/// first), so iterating an [`Attributes`] map yields tags in nesting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleKey {
    Font,
    ForegroundColor,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    ListStyle,
    HeadingLevel,
}

impl StyleKey {
    pub fn is_paragraph_level(&self) -> bool {
        matches!(self, StyleKey::ListStyle | StyleKey::HeadingLevel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    Ordered,
    Unordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse `#rrggbb` or `#rgb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().strip_prefix('#')?;
        if !digits.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            6 => Some(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let expand = |s: &str| channel(s).map(|v| v * 17);
                Some(Self::new(
                    expand(&digits[0..1])?,
                    expand(&digits[1..2])?,
                    expand(&digits[2..3])?,
                ))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Font {
    pub family: String,
    /// Point size
    pub size: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleValue {
    /// Boolean styles: present means on
    Flag,
    List(ListStyle),
    Heading(u8),
    Color(Color),
    Font(Font),
}

/// Attribute set of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes(BTreeMap<StyleKey, StyleValue>);

impl Attributes {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, key: StyleKey, value: StyleValue) -> Self {
        self.0.insert(key, value);
        self
    }

    pub fn with_flag(self, key: StyleKey) -> Self {
        self.with(key, StyleValue::Flag)
    }

    pub fn get(&self, key: StyleKey) -> Option<&StyleValue> {
        self.0.get(&key)
    }

    pub fn contains(&self, key: StyleKey, value: &StyleValue) -> bool {
        self.0.get(&key) == Some(value)
    }

    pub fn has(&self, key: StyleKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn insert(&mut self, key: StyleKey, value: StyleValue) {
        self.0.insert(key, value);
    }

    pub fn remove(&mut self, key: StyleKey) -> Option<StyleValue> {
        self.0.remove(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StyleKey, &StyleValue)> {
        self.0.iter().map(|(key, value)| (*key, value))
    }

    pub fn list_style(&self) -> Option<ListStyle> {
        match self.get(StyleKey::ListStyle) {
            Some(StyleValue::List(style)) => Some(*style),
            _ => None,
        }
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self.get(StyleKey::HeadingLevel) {
            Some(StyleValue::Heading(level)) => Some(*level),
            _ => None,
        }
    }

    pub fn character_only(&self) -> Self {
        self.filtered(|key| !key.is_paragraph_level())
    }

    pub fn paragraph_only(&self) -> Self {
        self.filtered(StyleKey::is_paragraph_level)
    }

    fn filtered(&self, keep: impl Fn(&StyleKey) -> bool) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(key, _)| keep(key))
                .map(|(key, value)| (*key, value.clone()))
                .collect(),
        )
    }

    /// Keep only the pairs also present (with the same value) in `other`
    pub fn intersect(&mut self, other: &Attributes) {
        self.0.retain(|key, value| other.0.get(key) == Some(value));
    }

    /// Overlay `other` on top of this set
    pub fn merge(&mut self, other: &Attributes) {
        for (key, value) in other.iter() {
            self.insert(key, value.clone());
        }
    }
}

impl FromIterator<(StyleKey, StyleValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (StyleKey, StyleValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::from_hex("#ff8000"), Some(Color::new(255, 128, 0)));
        assert_eq!(Color::from_hex("#f80"), Some(Color::new(255, 136, 0)));
        assert_eq!(Color::from_hex("ff8000"), None);
        assert_eq!(Color::new(1, 2, 255).to_hex(), "#0102ff");
    }

    #[test]
    fn test_intersect_requires_equal_values() {
        let mut a = Attributes::new()
            .with_flag(StyleKey::Bold)
            .with(StyleKey::ListStyle, StyleValue::List(ListStyle::Ordered));
        let b = Attributes::new()
            .with_flag(StyleKey::Bold)
            .with(StyleKey::ListStyle, StyleValue::List(ListStyle::Unordered));
        a.intersect(&b);
        assert_eq!(a, Attributes::new().with_flag(StyleKey::Bold));
    }

    #[test]
    fn test_level_split() {
        let attrs = Attributes::new()
            .with_flag(StyleKey::Italic)
            .with(StyleKey::HeadingLevel, StyleValue::Heading(2));
        assert_eq!(attrs.character_only(), Attributes::new().with_flag(StyleKey::Italic));
        assert_eq!(attrs.paragraph_only().heading_level(), Some(2));
    }
}
