//! Style primitives – a flat [`ComputedStyle`] per view node, consumed by
//! the layout engine and the rasterizer.
//!
//! Renderers build styles with the chainable setters at the bottom of this
//! file instead of parsing CSS.

/// Fully resolved style for a single view node.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f32,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,

    // Spacing (px)
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,

    // Border
    pub border_width: f32,
    pub border_color: Color,
    /// Accent bar on the leading edge (timeline entries).
    pub border_left_width: f32,
    pub border_left_color: Color,
    pub corner_radius: f32,

    // Typography
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_family: String,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub text_decoration: TextDecoration,
    pub font_style: FontStyle,

    // Background
    pub background_color: Color,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Column,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap: 0.0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_width: 0.0,
            border_color: Color::BLACK,
            border_left_width: 0.0,
            border_left_color: Color::BLACK,
            corner_radius: 0.0,
            font_size: 14.0,
            font_weight: FontWeight::Normal,
            font_family: "Helvetica".to_string(),
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.4,
            text_decoration: TextDecoration::None,
            font_style: FontStyle::Normal,
            background_color: Color::TRANSPARENT,
        }
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    RowReverse,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

/// `Justify` wraps like `Left`; the painter spreads every line but the
/// last of a paragraph across the box width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };
    /// Neutral gray for unfilled rating glyphs and empty tracks.
    pub const NEUTRAL: Self = Self {
        r: 0.820,
        g: 0.835,
        b: 0.859,
        a: 1.0,
    };

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;
            Some(Self { r, g, b, a: 1.0 })
        } else if hex.len() == 3 {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()? as f32 / 255.0;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()? as f32 / 255.0;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()? as f32 / 255.0;
            Some(Self { r, g, b, a: 1.0 })
        } else {
            None
        }
    }

    /// Parse a hex colour, logging and falling back when it is malformed.
    pub fn from_hex_or(hex: &str, fallback: Color) -> Self {
        Self::from_hex(hex).unwrap_or_else(|| {
            log::warn!("ignoring malformed colour {hex:?}");
            fallback
        })
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Mix toward white by `amount` (0 = unchanged, 1 = white).
    pub fn lighten(self, amount: f32) -> Self {
        let t = amount.clamp(0.0, 1.0);
        Self {
            r: self.r + (1.0 - self.r) * t,
            g: self.g + (1.0 - self.g) * t,
            b: self.b + (1.0 - self.b) * t,
            a: self.a,
        }
    }
}

// ---------------------------------------------------------------------------
// Chainable setters used by the section renderers
// ---------------------------------------------------------------------------

impl ComputedStyle {
    /// Text style inheriting typography from `parent` with box-model
    /// properties reset.
    pub fn text_from(parent: &ComputedStyle) -> Self {
        Self {
            font_size: parent.font_size,
            font_weight: parent.font_weight,
            font_family: parent.font_family.clone(),
            color: parent.color,
            text_align: parent.text_align,
            line_height: parent.line_height,
            font_style: parent.font_style,
            ..Self::default()
        }
    }

    pub fn row(mut self) -> Self {
        self.display = Display::Flex;
        self.flex_direction = FlexDirection::Row;
        self
    }

    pub fn column(mut self) -> Self {
        self.display = Display::Flex;
        self.flex_direction = FlexDirection::Column;
        self
    }

    pub fn direction(mut self, dir: FlexDirection) -> Self {
        self.display = Display::Flex;
        self.flex_direction = dir;
        self
    }

    pub fn wrap(mut self) -> Self {
        self.flex_wrap = FlexWrap::Wrap;
        self
    }

    pub fn grow(mut self) -> Self {
        self.flex_grow = 1.0;
        self
    }

    pub fn justify(mut self, j: JustifyContent) -> Self {
        self.justify_content = j;
        self
    }

    pub fn align(mut self, a: AlignItems) -> Self {
        self.align_items = a;
        self
    }

    pub fn gap(mut self, px: f32) -> Self {
        self.gap = px;
        self
    }

    pub fn width(mut self, d: Dimension) -> Self {
        self.width = d;
        self
    }

    pub fn size(mut self, w: f32, h: f32) -> Self {
        self.width = Dimension::Px(w);
        self.height = Dimension::Px(h);
        self
    }

    /// Fixed height, width untouched.
    pub fn height_px(mut self, h: f32) -> Self {
        self.height = Dimension::Px(h);
        self
    }

    pub fn padding(mut self, px: f32) -> Self {
        self.padding_top = px;
        self.padding_right = px;
        self.padding_bottom = px;
        self.padding_left = px;
        self
    }

    pub fn padding_xy(mut self, x: f32, y: f32) -> Self {
        self.padding_left = x;
        self.padding_right = x;
        self.padding_top = y;
        self.padding_bottom = y;
        self
    }

    pub fn padding_left(mut self, px: f32) -> Self {
        self.padding_left = px;
        self
    }

    pub fn margin_bottom(mut self, px: f32) -> Self {
        self.margin_bottom = px;
        self
    }

    pub fn margin_top(mut self, px: f32) -> Self {
        self.margin_top = px;
        self
    }

    pub fn background(mut self, c: Color) -> Self {
        self.background_color = c;
        self
    }

    pub fn border(mut self, width: f32, c: Color) -> Self {
        self.border_width = width;
        self.border_color = c;
        self
    }

    pub fn accent_bar(mut self, width: f32, c: Color) -> Self {
        self.border_left_width = width;
        self.border_left_color = c;
        self
    }

    pub fn radius(mut self, px: f32) -> Self {
        self.corner_radius = px;
        self
    }

    pub fn font_size(mut self, px: f32) -> Self {
        self.font_size = px;
        self
    }

    pub fn bold(mut self) -> Self {
        self.font_weight = FontWeight::Bold;
        self
    }

    pub fn italic(mut self) -> Self {
        self.font_style = FontStyle::Italic;
        self
    }

    pub fn underline(mut self) -> Self {
        self.text_decoration = TextDecoration::Underline;
        self
    }

    pub fn color(mut self, c: Color) -> Self {
        self.color = c;
        self
    }

    pub fn text_align(mut self, a: TextAlign) -> Self {
        self.text_align = a;
        self
    }

    pub fn font_family(mut self, family: &str) -> Self {
        self.font_family = family.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_from_hex() {
        let c = Color::from_hex("#ff8800").unwrap();
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.533).abs() < 0.01);
        assert_eq!(Color::from_hex("#fff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("blue"), None);
    }

    #[test]
    fn rgba8_round_trips_primaries() {
        assert_eq!(Color::WHITE.to_rgba8(), [255, 255, 255, 255]);
        assert_eq!(Color::from_hex("#2563eb").unwrap().to_rgba8(), [0x25, 0x63, 0xeb, 255]);
    }

    #[test]
    fn text_style_drops_box_model() {
        let parent = ComputedStyle::default()
            .padding(12.0)
            .background(Color::WHITE)
            .font_size(20.0)
            .bold();
        let t = ComputedStyle::text_from(&parent);
        assert_eq!(t.font_size, 20.0);
        assert_eq!(t.font_weight, FontWeight::Bold);
        assert_eq!(t.padding_left, 0.0);
        assert!(t.background_color.is_transparent());
    }
}
