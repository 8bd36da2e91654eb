//! View tree – the composed visual structure produced by the composition
//! engine and section renderers, and consumed by layout and rasterization.

use crate::style::{Color, ComputedStyle};

/// Shape of a rating glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphShape {
    Dot,
    Star,
}

/// A node in the view tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewNode {
    Element {
        style: ComputedStyle,
        children: Vec<ViewNode>,
        /// Stable marker used to locate a subtree (e.g. the export root).
        marker: Option<String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
    /// Raster image from a `data:` URI, drawn at the style's fixed size.
    Image {
        src: String,
        style: ComputedStyle,
    },
    /// A single rating glyph.
    Glyph {
        shape: GlyphShape,
        filled: bool,
        color: Color,
        size: f32,
    },
}

impl ViewNode {
    pub fn element(style: ComputedStyle, children: Vec<ViewNode>) -> Self {
        ViewNode::Element {
            style,
            children,
            marker: None,
        }
    }

    pub fn text(text: impl Into<String>, style: ComputedStyle) -> Self {
        ViewNode::Text {
            text: text.into(),
            style,
        }
    }

    /// Attach a marker to an element; other node kinds are returned as-is.
    pub fn with_marker(self, marker: impl Into<String>) -> Self {
        match self {
            ViewNode::Element {
                style, children, ..
            } => ViewNode::Element {
                style,
                children,
                marker: Some(marker.into()),
            },
            other => other,
        }
    }

    pub fn marker(&self) -> Option<&str> {
        match self {
            ViewNode::Element { marker, .. } => marker.as_deref(),
            _ => None,
        }
    }

    pub fn children(&self) -> &[ViewNode] {
        match self {
            ViewNode::Element { children, .. } => children,
            _ => &[],
        }
    }

    /// Depth-first search for the subtree carrying `marker`.
    pub fn find_marker(&self, marker: &str) -> Option<&ViewNode> {
        if self.marker() == Some(marker) {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find_marker(marker))
    }

    /// Visit every node depth-first.
    pub fn walk(&self, f: &mut dyn FnMut(&ViewNode)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Concatenated text of the subtree, one node per line.
    pub fn text_content(&self) -> String {
        let mut out = Vec::new();
        self.walk(&mut |n| {
            if let ViewNode::Text { text, .. } = n {
                out.push(text.clone());
            }
        });
        out.join("\n")
    }

    /// Count `(filled, unfilled)` rating glyphs in the subtree.
    pub fn glyph_counts(&self) -> (usize, usize) {
        let mut counts = (0, 0);
        self.walk(&mut |n| {
            if let ViewNode::Glyph { filled, .. } = n {
                if *filled {
                    counts.0 += 1;
                } else {
                    counts.1 += 1;
                }
            }
        });
        counts
    }
}
