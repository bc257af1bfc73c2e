//! Styling value objects for map rendering.

use crate::Color;
use serde::{Deserialize, Serialize};

/// Horizontal text/content alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
}

impl HorizontalAlignment {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Vertical text/content alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlignment {
    Top,
    Middle,
    Bottom,
}

impl VerticalAlignment {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Some(Self::Top),
            "middle" => Some(Self::Middle),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Font selection: family name plus point size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSpec {
    pub name: String,
    pub size: u32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            name: "Arial".to_string(),
            size: 12,
        }
    }
}

/// Mutable styling value for drawn map features.
///
/// Setters are best-effort: values outside a field's domain are silently
/// ignored and the previous value kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapStyle {
    color: Color,
    border_color: Color,
    border_width: u32,
    font: FontSpec,
    horizontal_alignment: HorizontalAlignment,
    vertical_alignment: VerticalAlignment,
    wrap_width: Option<u32>,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            border_color: Color::BLACK,
            border_width: 0,
            font: FontSpec::default(),
            horizontal_alignment: HorizontalAlignment::Center,
            vertical_alignment: VerticalAlignment::Middle,
            wrap_width: None,
        }
    }
}

impl MapStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn border_color(&self) -> Color {
        self.border_color
    }

    pub fn set_border_color(&mut self, color: Color) {
        self.border_color = color;
    }

    pub fn border_width(&self) -> u32 {
        self.border_width
    }

    pub fn set_border_width(&mut self, width: u32) {
        self.border_width = width;
    }

    pub fn font(&self) -> &FontSpec {
        &self.font
    }

    pub fn set_font(&mut self, name: &str, size: u32) {
        if name.is_empty() || size == 0 {
            return;
        }
        self.font = FontSpec {
            name: name.to_string(),
            size,
        };
    }

    pub fn horizontal_alignment(&self) -> HorizontalAlignment {
        self.horizontal_alignment
    }

    /// Accepts "left", "center" or "right" (case-insensitive); anything
    /// else is ignored.
    pub fn set_horizontal_alignment(&mut self, value: &str) {
        if let Some(a) = HorizontalAlignment::parse(value) {
            self.horizontal_alignment = a;
        }
    }

    pub fn vertical_alignment(&self) -> VerticalAlignment {
        self.vertical_alignment
    }

    /// Accepts "top", "middle" or "bottom" (case-insensitive); anything
    /// else is ignored.
    pub fn set_vertical_alignment(&mut self, value: &str) {
        if let Some(a) = VerticalAlignment::parse(value) {
            self.vertical_alignment = a;
        }
    }

    pub fn wrap_width(&self) -> Option<u32> {
        self.wrap_width
    }

    /// Wrap width must be at least 1 px; 0 is ignored.
    pub fn set_wrap_width(&mut self, width: u32) {
        if width >= 1 {
            self.wrap_width = Some(width);
        }
    }

    pub fn clear_wrap_width(&mut self) {
        self.wrap_width = None;
    }
}
