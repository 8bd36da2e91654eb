//! Layout engine – uses Taffy to compute flexbox layout for a view tree,
//! then converts the result into a tree of positioned boxes.
//!
//! Text is wrapped while the Taffy tree is built, so every text leaf has a
//! definite size. Wrap widths for children of flex rows are estimated from
//! their natural widths before Taffy runs.

use std::collections::HashMap;
use taffy::prelude::*;

use crate::error::{Error, Result};
use crate::fonts::{wrap_text, FontManager};
use crate::style::{self, Color, ComputedStyle, FontStyle as CssFontStyle, FontWeight};
use crate::view::{GlyphShape, ViewNode};

/// A positioned box in document coordinates (px, origin top-left).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    Text {
        lines: Vec<String>,
        /// Measured width of each line, for alignment at paint time.
        line_widths: Vec<f32>,
    },
    Image {
        src: String,
    },
    Glyph {
        shape: GlyphShape,
        filled: bool,
        color: Color,
    },
}

fn taffy_error(e: taffy::TaffyError) -> Error {
    Error::Rasterization(format!("layout failed: {e}"))
}

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
}

/// How the parent will place a child along the cross axis.
#[derive(Clone, Copy, PartialEq)]
enum Slot {
    /// Child of a flex row: sized by its own content.
    Row,
    /// Child of a column that stretches children to full width.
    Stretch,
    /// Child of a column that aligns children (start/center/end).
    Aligned,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
        }
    }

    fn build_node(&mut self, node: &ViewNode, parent_width: f32, slot: Slot) -> Result<NodeId> {
        match node {
            ViewNode::Text { text, style } => self.build_text_node(text, style, parent_width, slot),
            ViewNode::Element { style, children, .. } => {
                self.build_element_node(style, children, parent_width)
            }
            ViewNode::Image { src, style } => self.build_image_node(src, style, parent_width),
            ViewNode::Glyph {
                shape,
                filled,
                color,
                size,
            } => {
                let node = self
                    .taffy
                    .new_leaf(Style {
                        size: Size {
                            width: Dimension::Length(*size),
                            height: Dimension::Length(*size),
                        },
                        flex_shrink: 0.0,
                        ..Default::default()
                    })
                    .map_err(taffy_error)?;
                self.node_styles.insert(node, ComputedStyle::default());
                self.node_content.insert(
                    node,
                    BoxContent::Glyph {
                        shape: *shape,
                        filled: *filled,
                        color: *color,
                    },
                );
                Ok(node)
            }
        }
    }

    fn measure_line(&self, line: &str, style: &ComputedStyle) -> f32 {
        self.fonts.measure_text_width(
            line,
            style.font_size,
            style.font_weight == FontWeight::Bold,
            style.font_style == CssFontStyle::Italic,
            &style.font_family,
        )
    }

    fn build_text_node(
        &mut self,
        text: &str,
        style: &ComputedStyle,
        max_width: f32,
        slot: Slot,
    ) -> Result<NodeId> {
        let bold = style.font_weight == FontWeight::Bold;
        let italic = style.font_style == CssFontStyle::Italic;
        let line_height_px = self.fonts.line_height_px(style.font_size, style.line_height);

        let lines = wrap_text(
            text.trim(),
            style.font_size,
            bold,
            italic,
            &style.font_family,
            max_width,
            self.fonts,
        );
        let line_widths: Vec<f32> = lines.iter().map(|l| self.measure_line(l, style)).collect();
        let text_width = line_widths.iter().copied().fold(0.0f32, f32::max);
        let text_height = lines.len() as f32 * line_height_px;

        // Stretched leaves take the column width so alignment has room to act.
        let width = match slot {
            Slot::Stretch => Dimension::Auto,
            Slot::Row | Slot::Aligned => Dimension::Length(text_width.ceil()),
        };
        let node = self
            .taffy
            .new_leaf(Style {
                size: Size {
                    width,
                    height: Dimension::Length(text_height),
                },
                flex_shrink: 0.0,
                ..Default::default()
            })
            .map_err(taffy_error)?;
        self.node_styles.insert(node, style.clone());
        self.node_content
            .insert(node, BoxContent::Text { lines, line_widths });
        Ok(node)
    }

    fn build_image_node(&mut self, src: &str, style: &ComputedStyle, parent_width: f32) -> Result<NodeId> {
        let resolved = resolve_img_auto_dimensions(src, style, parent_width);
        let effective = resolved.as_ref().unwrap_or(style);
        let mut ts = self.computed_to_taffy(effective);
        ts.flex_shrink = 0.0;
        let node = self.taffy.new_leaf(ts).map_err(taffy_error)?;
        self.node_styles.insert(node, effective.clone());
        self.node_content.insert(
            node,
            BoxContent::Image {
                src: src.to_string(),
            },
        );
        Ok(node)
    }

    fn build_element_node(
        &mut self,
        style: &ComputedStyle,
        children: &[ViewNode],
        parent_width: f32,
    ) -> Result<NodeId> {
        let my_width = match style.width {
            style::Dimension::Px(w) => w,
            style::Dimension::Percent(p) => parent_width * p / 100.0,
            style::Dimension::Auto => parent_width,
        };
        let inner_width = (my_width
            - style.padding_left
            - style.padding_right
            - 2.0 * style.border_width
            - style.border_left_width)
            .max(1.0);

        let is_row = style.display == style::Display::Flex
            && matches!(
                style.flex_direction,
                style::FlexDirection::Row | style::FlexDirection::RowReverse
            );

        let mut child_nodes = Vec::with_capacity(children.len());
        if is_row {
            let widths = self.row_child_widths(children, inner_width, style.gap);
            for (child, w) in children.iter().zip(widths) {
                child_nodes.push(self.build_node(child, w, Slot::Row)?);
            }
        } else {
            let slot = if style.align_items == style::AlignItems::Stretch {
                Slot::Stretch
            } else {
                Slot::Aligned
            };
            for child in children {
                child_nodes.push(self.build_node(child, inner_width, slot)?);
            }
        }

        let node = self
            .taffy
            .new_with_children(self.computed_to_taffy(style), &child_nodes)
            .map_err(taffy_error)?;
        self.node_styles.insert(node, style.clone());
        Ok(node)
    }

    /// Estimate the wrap width of each child of a flex row.
    ///
    /// Fixed widths are honoured; children with a natural width keep it when
    /// everything fits, leftover space goes to growing children. When the
    /// naturals overflow, the free space is split evenly.
    fn row_child_widths(&self, children: &[ViewNode], inner: f32, gap: f32) -> Vec<f32> {
        let gaps = gap * children.len().saturating_sub(1) as f32;
        let mut widths: Vec<Option<f32>> = vec![None; children.len()];
        let mut naturals: Vec<Option<f32>> = vec![None; children.len()];
        let mut fixed_total = 0.0;

        for (i, child) in children.iter().enumerate() {
            match fixed_width(child, inner) {
                Some(w) => {
                    widths[i] = Some(w);
                    fixed_total += w;
                }
                None => naturals[i] = self.natural_width(child),
            }
        }

        let free = (inner - gaps - fixed_total).max(1.0);
        let flexible = widths.iter().filter(|w| w.is_none()).count().max(1);
        let natural_total: f32 = naturals.iter().flatten().sum();
        let growers = naturals
            .iter()
            .zip(&widths)
            .filter(|(n, w)| n.is_none() && w.is_none())
            .count();

        widths
            .iter()
            .zip(&naturals)
            .map(|(w, n)| match (w, n) {
                (Some(w), _) => *w,
                (None, Some(n)) if natural_total <= free => *n,
                (None, None) if natural_total <= free && growers > 0 => {
                    ((free - natural_total) / growers as f32).max(1.0)
                }
                _ => (free / flexible as f32).max(1.0),
            })
            .collect()
    }

    /// Single-line width of a subtree, or `None` when it should flex.
    fn natural_width(&self, node: &ViewNode) -> Option<f32> {
        match node {
            ViewNode::Text { text, style } => Some(self.measure_line(text.trim(), style).ceil()),
            ViewNode::Glyph { size, .. } => Some(*size),
            ViewNode::Image { style, .. } => match style.width {
                style::Dimension::Px(w) => Some(w),
                _ => None,
            },
            ViewNode::Element { style, children, .. } => {
                if style.flex_grow > 0.0 {
                    return None;
                }
                let chrome = style.padding_left
                    + style.padding_right
                    + 2.0 * style.border_width
                    + style.border_left_width
                    + style.margin_left
                    + style.margin_right;
                if let style::Dimension::Px(w) = style.width {
                    return Some(w + style.margin_left + style.margin_right);
                }
                if !matches!(style.width, style::Dimension::Auto) {
                    return None;
                }
                let inner: Option<Vec<f32>> =
                    children.iter().map(|c| self.natural_width(c)).collect();
                let inner = inner?;
                let content = match style.flex_direction {
                    style::FlexDirection::Row | style::FlexDirection::RowReverse => {
                        inner.iter().sum::<f32>()
                            + style.gap * inner.len().saturating_sub(1) as f32
                    }
                    style::FlexDirection::Column => inner.iter().copied().fold(0.0, f32::max),
                };
                Some(content + chrome)
            }
        }
    }

    fn computed_to_taffy(&self, s: &ComputedStyle) -> Style {
        let mut ts = Style::default();

        match s.display {
            style::Display::Flex | style::Display::Block => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = match (s.display, s.flex_direction) {
                    (style::Display::Block, _) => taffy::FlexDirection::Column,
                    (_, style::FlexDirection::Row) => taffy::FlexDirection::Row,
                    (_, style::FlexDirection::RowReverse) => taffy::FlexDirection::RowReverse,
                    (_, style::FlexDirection::Column) => taffy::FlexDirection::Column,
                };
                ts.flex_wrap = match s.flex_wrap {
                    style::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                    style::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
                };
                ts.justify_content = Some(match s.justify_content {
                    style::JustifyContent::Start => taffy::JustifyContent::Start,
                    style::JustifyContent::End => taffy::JustifyContent::End,
                    style::JustifyContent::Center => taffy::JustifyContent::Center,
                    style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                });
                ts.align_items = Some(match s.align_items {
                    style::AlignItems::Start => taffy::AlignItems::Start,
                    style::AlignItems::End => taffy::AlignItems::End,
                    style::AlignItems::Center => taffy::AlignItems::Center,
                    style::AlignItems::Stretch => taffy::AlignItems::Stretch,
                });
            }
            style::Display::None => {
                ts.display = taffy::Display::None;
            }
        }

        ts.size = Size {
            width: dim_to_taffy(s.width),
            height: dim_to_taffy(s.height),
        };
        // Allow flex/shrink items to compress below their natural content size
        if s.flex_shrink > 0.0 || s.flex_grow > 0.0 {
            ts.min_size.width = taffy::Dimension::Length(0.0);
        }

        ts.flex_grow = s.flex_grow;
        ts.flex_shrink = s.flex_shrink;

        ts.margin = Rect {
            top: LengthPercentageAuto::Length(s.margin_top),
            right: LengthPercentageAuto::Length(s.margin_right),
            bottom: LengthPercentageAuto::Length(s.margin_bottom),
            left: LengthPercentageAuto::Length(s.margin_left),
        };
        ts.padding = Rect {
            top: LengthPercentage::Length(s.padding_top),
            right: LengthPercentage::Length(s.padding_right),
            bottom: LengthPercentage::Length(s.padding_bottom),
            left: LengthPercentage::Length(s.padding_left),
        };
        ts.border = Rect {
            top: LengthPercentage::Length(s.border_width),
            right: LengthPercentage::Length(s.border_width),
            bottom: LengthPercentage::Length(s.border_width),
            left: LengthPercentage::Length(s.border_width + s.border_left_width),
        };
        ts.gap = Size {
            width: LengthPercentage::Length(s.gap),
            height: LengthPercentage::Length(s.gap),
        };

        ts
    }

    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<PositionedBox> {
        let layout = self.taffy.layout(node).map_err(taffy_error)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)
            .map_err(taffy_error)?
            .into_iter()
            .map(|child| self.extract(child, x, y))
            .collect::<Result<Vec<_>>>()?;

        Ok(PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            style,
            content,
            children,
        })
    }
}

fn fixed_width(node: &ViewNode, inner: f32) -> Option<f32> {
    let style = match node {
        ViewNode::Element { style, .. } | ViewNode::Image { style, .. } => style,
        ViewNode::Glyph { size, .. } => return Some(*size),
        ViewNode::Text { .. } => return None,
    };
    let margins = style.margin_left + style.margin_right;
    match style.width {
        style::Dimension::Px(w) => Some(w + margins),
        style::Dimension::Percent(p) => Some(inner * p / 100.0 + margins),
        style::Dimension::Auto => None,
    }
}

fn dim_to_taffy(d: style::Dimension) -> taffy::Dimension {
    match d {
        style::Dimension::Auto => taffy::Dimension::Auto,
        style::Dimension::Px(v) => taffy::Dimension::Length(v),
        style::Dimension::Percent(v) => taffy::Dimension::Percent(v / 100.0),
    }
}

/// Replace `Auto` image dimensions with values derived from the decoded
/// image's intrinsic size. `None` when nothing needs fixing or the source
/// cannot be decoded.
fn resolve_img_auto_dimensions(src: &str, style: &ComputedStyle, parent_width: f32) -> Option<ComputedStyle> {
    let known_w: Option<f32> = match style.width {
        style::Dimension::Px(v) => Some(v),
        style::Dimension::Percent(p) => Some(parent_width * p / 100.0),
        style::Dimension::Auto => None,
    };
    let known_h: Option<f32> = match style.height {
        style::Dimension::Px(v) => Some(v),
        _ => None,
    };
    if known_w.is_some() && known_h.is_some() {
        return None;
    }

    let img = crate::raster::decode_data_uri(src).ok()?;
    let (px_w, px_h) = (img.width() as f32, img.height() as f32);
    if px_w == 0.0 || px_h == 0.0 {
        return None;
    }
    let aspect = px_w / px_h;

    let mut s = style.clone();
    match (known_w, known_h) {
        (Some(w), None) => s.height = style::Dimension::Px((w / aspect).max(1.0)),
        (None, Some(h)) => s.width = style::Dimension::Px((h * aspect).max(1.0)),
        (None, None) => {
            s.width = style::Dimension::Px(px_w.min(parent_width));
            s.height = style::Dimension::Px(px_w.min(parent_width) / aspect);
        }
        (Some(_), Some(_)) => return None,
    }
    Some(s)
}

/// Lay out `root` at a fixed `width`, returning its positioned box at the
/// origin. The height is whatever the content needs.
pub fn compute_layout(root: &ViewNode, width: f32, fonts: &FontManager) -> Result<PositionedBox> {
    let mut builder = LayoutBuilder::new(fonts);
    let child = builder.build_node(root, width, Slot::Stretch)?;

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: taffy::Dimension::Length(width),
            height: taffy::Dimension::Auto,
        },
        ..Default::default()
    };
    let container = builder
        .taffy
        .new_with_children(root_style, &[child])
        .map_err(taffy_error)?;

    builder
        .taffy
        .compute_layout(
            container,
            Size {
                width: AvailableSpace::Definite(width),
                height: AvailableSpace::MaxContent,
            },
        )
        .map_err(taffy_error)?;

    let mut boxed = builder.extract(container, 0.0, 0.0)?;
    boxed
        .children
        .pop()
        .ok_or_else(|| Error::Rasterization("layout produced no root box".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{AlignItems, Dimension as Dim, JustifyContent};

    fn text(s: &str) -> ViewNode {
        ViewNode::text(s, ComputedStyle::default())
    }

    #[test]
    fn layout_simple_text() {
        let fonts = FontManager::default();
        let tree = ViewNode::element(ComputedStyle::default().column(), vec![text("Hello world")]);
        let root = compute_layout(&tree, 500.0, &fonts).unwrap();
        assert_eq!(root.width, 500.0);
        assert!(root.height > 0.0);
        let leaf = &root.children[0];
        assert!(matches!(leaf.content, BoxContent::Text { .. }));
        // Stretched to the column width.
        assert_eq!(leaf.width, 500.0);
    }

    #[test]
    fn long_text_wraps_and_grows() {
        let fonts = FontManager::default();
        let words = "lorem ipsum dolor sit amet ".repeat(20);
        let tree = ViewNode::element(ComputedStyle::default().column(), vec![text(&words)]);
        let root = compute_layout(&tree, 200.0, &fonts).unwrap();
        match &root.children[0].content {
            BoxContent::Text { lines, line_widths } => {
                assert!(lines.len() > 5);
                assert!(line_widths.iter().all(|w| *w <= 200.0));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(root.height > 5.0 * 14.0);
    }

    #[test]
    fn percent_columns_split_width() {
        let fonts = FontManager::default();
        let col = |p: f32| {
            ViewNode::element(
                ComputedStyle::default().column().width(Dim::Percent(p)),
                vec![text("x")],
            )
        };
        let tree = ViewNode::element(ComputedStyle::default().row(), vec![col(35.0), col(65.0)]);
        let root = compute_layout(&tree, 600.0, &fonts).unwrap();
        assert!((root.children[0].width - 210.0).abs() < 0.5);
        assert!((root.children[1].x - 210.0).abs() < 0.5);
    }

    #[test]
    fn space_between_pushes_to_edges() {
        let fonts = FontManager::default();
        let tree = ViewNode::element(
            ComputedStyle::default()
                .row()
                .justify(JustifyContent::SpaceBetween)
                .align(AlignItems::Center),
            vec![text("left"), text("right")],
        );
        let root = compute_layout(&tree, 400.0, &fonts).unwrap();
        let right = &root.children[1];
        assert!((right.x + right.width - 400.0).abs() < 1.0);
    }

    #[test]
    fn glyphs_keep_their_size() {
        let fonts = FontManager::default();
        let glyph = ViewNode::Glyph {
            shape: GlyphShape::Dot,
            filled: true,
            color: Color::BLACK,
            size: 10.0,
        };
        let tree = ViewNode::element(ComputedStyle::default().row().gap(3.0), vec![glyph.clone(), glyph]);
        let root = compute_layout(&tree, 300.0, &fonts).unwrap();
        assert_eq!(root.children[1].x, 13.0);
        assert_eq!(root.children[1].height, 10.0);
    }
}
