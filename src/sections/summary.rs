//! Professional summary paragraph.

use crate::style::{ComputedStyle, TextAlign};
use crate::view::ViewNode;

/// One justified paragraph, or nothing for blank text.
///
/// `lead` renders the centered italic band used above the columns of the
/// header-highlight layout.
pub fn render(text: &str, base: &ComputedStyle, lead: bool) -> Vec<ViewNode> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    let mut style = ComputedStyle::text_from(base);
    style = if lead {
        style.text_align(TextAlign::Center).italic()
    } else if base.text_align == TextAlign::Right {
        style
    } else {
        style.text_align(TextAlign::Justify)
    };
    vec![ViewNode::text(text, style)]
}
