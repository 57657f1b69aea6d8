use serde::{Deserialize, Serialize};

/// Axis-aligned box in top-origin page space.
///
/// `top` grows downwards: the first line on a page has the smallest `top`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        BoundingBox {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// A positioned run of text produced by the decoder.
///
/// Fragments arrive page-ascending and, within a page, in the order the
/// content stream shows them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub font_size: f32,
    pub font_name: String,
    pub bbox: BoundingBox,
    /// 1-based page number.
    pub page: usize,
    /// Same as `bbox.top`.
    pub y: f32,
}

impl Fragment {
    pub fn new(
        text: impl Into<String>,
        font_size: f32,
        font_name: impl Into<String>,
        bbox: BoundingBox,
        page: usize,
    ) -> Self {
        Fragment {
            text: text.into(),
            font_size,
            font_name: font_name.into(),
            y: bbox.top,
            bbox,
            page,
        }
    }
}
