//! Name + proficiency rows for the skills and languages sections.

use super::RenderContext;
use crate::cv_data::{Language, Level, Skill};
use crate::document::RatingStyle;
use crate::style::{AlignItems, Color, ComputedStyle, JustifyContent};
use crate::view::{GlyphShape, ViewNode};

/// Track width of the `bars` style, in px.
pub const BAR_TRACK_WIDTH: f32 = 80.0;
const BAR_HEIGHT: f32 = 6.0;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rated {
    pub name: String,
    pub level: Level,
}

impl From<&Skill> for Rated {
    fn from(s: &Skill) -> Self {
        Self {
            name: s.name.clone(),
            level: s.level,
        }
    }
}

impl From<&Language> for Rated {
    fn from(l: &Language) -> Self {
        Self {
            name: l.name.clone(),
            level: l.level,
        }
    }
}

/// `(filled, unfilled)` glyphs for a level; always sums to 5.
pub fn rating_glyph_counts(level: Level) -> (u8, u8) {
    let filled = level.clamped();
    (filled, Level::MAX - filled)
}

pub fn render(
    rows: &[Rated],
    style: RatingStyle,
    ctx: &RenderContext<'_>,
    base: &ComputedStyle,
) -> Vec<ViewNode> {
    rows.iter().map(|r| render_row(r, style, ctx, base)).collect()
}

fn render_row(
    row: &Rated,
    style: RatingStyle,
    ctx: &RenderContext<'_>,
    base: &ComputedStyle,
) -> ViewNode {
    let text = ComputedStyle::text_from(base);
    let rating = if ctx.ats() {
        let label = ctx.t("advanced_level", "Advanced level");
        ViewNode::text(
            format!("{label}: {}/{}", row.level.clamped(), Level::MAX),
            text.clone(),
        )
    } else {
        match style {
            RatingStyle::Dots => glyphs(row.level, GlyphShape::Dot, ctx, base),
            RatingStyle::Stars => glyphs(row.level, GlyphShape::Star, ctx, base),
            RatingStyle::Bars => bar(row.level, ctx),
            RatingStyle::Numbers => ViewNode::text(
                format!("{}/{}", row.level.clamped(), Level::MAX),
                text.clone().bold().color(ctx.primary()),
            ),
        }
    };

    ViewNode::element(
        ComputedStyle::default()
            .row()
            .justify(JustifyContent::SpaceBetween)
            .align(AlignItems::Center)
            .gap(8.0)
            .margin_bottom(4.0),
        vec![ViewNode::text(&row.name, text), rating],
    )
}

fn glyphs(level: Level, shape: GlyphShape, ctx: &RenderContext<'_>, base: &ComputedStyle) -> ViewNode {
    let (filled, unfilled) = rating_glyph_counts(level);
    let size = (base.font_size * 0.8).max(6.0);
    let children = (0..filled)
        .map(|_| (true, ctx.primary()))
        .chain((0..unfilled).map(|_| (false, Color::NEUTRAL)))
        .map(|(filled, color)| ViewNode::Glyph {
            shape,
            filled,
            color,
            size,
        })
        .collect();
    ViewNode::element(ComputedStyle::default().row().gap(3.0), children)
}

fn bar(level: Level, ctx: &RenderContext<'_>) -> ViewNode {
    let fill = BAR_TRACK_WIDTH * f32::from(level.clamped()) / f32::from(Level::MAX);
    let mut children = Vec::new();
    if fill > 0.0 {
        children.push(ViewNode::element(
            ComputedStyle::default()
                .size(fill, BAR_HEIGHT)
                .background(ctx.primary())
                .radius(BAR_HEIGHT / 2.0),
            Vec::new(),
        ));
    }
    ViewNode::element(
        ComputedStyle::default()
            .row()
            .size(BAR_TRACK_WIDTH, BAR_HEIGHT)
            .background(Color::NEUTRAL)
            .radius(BAR_HEIGHT / 2.0),
        children,
    )
}
