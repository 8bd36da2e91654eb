//! Section content renderers – one pure function per section kind turning a
//! slice of [`CvData`] into a [`ViewNode`] block.
//!
//! Every renderer branches on [`RenderContext::ats`]: in ATS mode blocks
//! drop fills, rounded corners and colored glyphs, and headings become
//! uppercase with a plain underline.

pub mod certificates;
pub mod entries;
pub mod header;
pub mod ratings;
pub mod summary;

use crate::composition::TextDirection;
use crate::cv_data::{CvData, Translations};
use crate::document::{GlobalSettings, LayoutVariant, Section, SectionContent};
use crate::style::{Color, ComputedStyle, Dimension, TextAlign};
use crate::view::ViewNode;

/// Everything a renderer needs besides its own data slice.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub settings: &'a GlobalSettings,
    pub translations: &'a Translations,
    pub layout: LayoutVariant,
    pub direction: TextDirection,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        settings: &'a GlobalSettings,
        translations: &'a Translations,
        direction: TextDirection,
    ) -> Self {
        Self {
            settings,
            translations,
            layout: settings.layout,
            direction,
        }
    }

    pub fn ats(&self) -> bool {
        self.settings.is_ats_optimized
    }

    pub fn primary(&self) -> Color {
        Color::from_hex_or(&self.settings.primary_color, Color::BLACK)
    }

    pub fn secondary(&self) -> Color {
        Color::from_hex_or(&self.settings.secondary_color, Color::BLACK)
    }

    pub fn text_color(&self) -> Color {
        Color::from_hex_or(&self.settings.text_color, Color::BLACK)
    }

    /// Localized string with an English fallback.
    pub fn t(&self, key: &str, fallback: &'a str) -> &'a str {
        self.translations.get_or(key, fallback)
    }

    /// Base style of a section: global typography with the section's
    /// overrides applied. Background fills are dropped in ATS mode.
    pub fn section_style(&self, section: &Section) -> ComputedStyle {
        let s = self.settings;
        let mut style = ComputedStyle::default()
            .column()
            .font_family(section.style.font_family.as_deref().unwrap_or(&s.font_family))
            .font_size(section.style.font_size.unwrap_or(s.font_size))
            .color(match &section.style.text_color {
                Some(c) if !self.ats() => Color::from_hex_or(c, self.text_color()),
                _ => self.text_color(),
            });
        if let (Some(bg), false) = (&section.style.background_color, self.ats()) {
            style = style.background(Color::from_hex_or(bg, Color::TRANSPARENT));
        }
        if self.direction == TextDirection::Rtl {
            style = style.text_align(TextAlign::Right);
        }
        style
    }

    /// Display title: the section's own title, or the localized kind label.
    pub fn title_for(&self, section: &Section) -> String {
        if section.title.trim().is_empty() {
            let (key, fallback) = section.kind().label();
            self.t(key, fallback).to_string()
        } else {
            section.title.clone()
        }
    }

    /// Section heading: primary-colored with a rule, or uppercase and
    /// underlined in ATS mode.
    pub fn heading(&self, title: &str, base: &ComputedStyle) -> ViewNode {
        let size = base.font_size * 1.25;
        if self.ats() {
            let style = ComputedStyle::text_from(base)
                .font_size(size)
                .bold()
                .underline();
            return ViewNode::element(
                ComputedStyle::default().column().margin_bottom(6.0),
                vec![ViewNode::text(title.to_uppercase(), style)],
            );
        }
        let text = ComputedStyle::text_from(base)
            .font_size(size)
            .bold()
            .color(self.primary());
        let rule = ComputedStyle::default()
            .width(Dimension::Percent(100.0))
            .height_px(2.0)
            .background(self.primary())
            .margin_top(3.0);
        ViewNode::element(
            ComputedStyle::default().column().margin_bottom(8.0),
            vec![
                ViewNode::text(title, text),
                ViewNode::element(rule, Vec::new()),
            ],
        )
    }
}

/// Render one body section. Returns `None` when the CV has nothing for it,
/// so empty sections do not leave a dangling heading.
///
/// Header sections are composed separately by
/// [`crate::composition::compose`] and yield `None` here.
pub fn render_section(section: &Section, ctx: &RenderContext<'_>, cv: &CvData) -> Option<ViewNode> {
    let base = ctx.section_style(section);
    let body: Vec<ViewNode> = match section.content {
        SectionContent::Header => return None,
        SectionContent::Summary => summary::render(&cv.personal_info.summary, &base, false),
        SectionContent::Experience { display_style } => {
            let items: Vec<entries::Entry> = cv.experience.iter().map(entries::Entry::from).collect();
            entries::render(&items, display_style, ctx, &base)
        }
        SectionContent::Education { display_style } => {
            let items: Vec<entries::Entry> = cv.education.iter().map(entries::Entry::from).collect();
            entries::render(&items, display_style, ctx, &base)
        }
        SectionContent::Skills { rating_style } => {
            let rows: Vec<ratings::Rated> = cv.skills.iter().map(ratings::Rated::from).collect();
            ratings::render(&rows, rating_style, ctx, &base)
        }
        SectionContent::Languages { rating_style } => {
            let rows: Vec<ratings::Rated> = cv.languages.iter().map(ratings::Rated::from).collect();
            ratings::render(&rows, rating_style, ctx, &base)
        }
        SectionContent::Certificates => certificates::render(&cv.certificates, ctx, &base),
    };
    if body.is_empty() {
        log::debug!("section {} ({:?}) has no content", section.id, section.kind());
        return None;
    }

    let mut children = Vec::with_capacity(body.len() + 1);
    children.push(ctx.heading(&ctx.title_for(section), &base));
    children.extend(body);

    let padding = if base.background_color.is_transparent() { 0.0 } else { 10.0 };
    let style = base.padding(padding).margin_bottom(14.0);
    Some(ViewNode::element(style, children))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::cv_data::Translations;
    use crate::document::GlobalSettings;

    pub fn ctx<'a>(settings: &'a GlobalSettings, t: &'a Translations) -> RenderContext<'a> {
        RenderContext::new(settings, t, TextDirection::Ltr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{SectionKind, SectionStyle, SequentialIds, TemplateDocument};
    use crate::samples;

    #[test]
    fn empty_sections_render_nothing() {
        let doc = TemplateDocument::new("t", &mut SequentialIds::default());
        let cv = CvData::default();
        let t = Translations::default();
        let ctx = test_support::ctx(&doc.settings, &t);
        for s in &doc.sections {
            assert!(render_section(s, &ctx, &cv).is_none(), "{:?}", s.kind());
        }
    }

    #[test]
    fn blank_title_uses_translation() {
        let mut doc = TemplateDocument::new("t", &mut SequentialIds::default());
        let cv = samples::sample_cv();
        let t: Translations = [("skills", "Compétences")].into_iter().collect();
        let ctx = test_support::ctx(&doc.settings, &t);
        let skills = doc
            .sections
            .iter_mut()
            .find(|s| s.kind() == SectionKind::Skills)
            .unwrap();
        skills.title = String::new();
        let node = render_section(skills, &ctx, &cv).unwrap();
        assert!(node.text_content().starts_with("Compétences"));
    }

    #[test]
    fn ats_headings_are_uppercase_and_unfilled() {
        let mut doc = TemplateDocument::new("t", &mut SequentialIds::default());
        doc.settings.is_ats_optimized = true;
        let cv = samples::sample_cv();
        let t = Translations::default();
        let ctx = test_support::ctx(&doc.settings, &t);
        let mut summary = doc
            .sections
            .iter()
            .find(|s| s.kind() == SectionKind::Summary)
            .unwrap()
            .clone();
        summary.style = SectionStyle {
            background_color: Some("#fef3c7".into()),
            ..Default::default()
        };
        let node = render_section(&summary, &ctx, &cv).unwrap();
        assert!(node.text_content().starts_with("SUMMARY"));
        let mut fills = 0;
        node.walk(&mut |n| {
            if let ViewNode::Element { style, .. } = n {
                if !style.background_color.is_transparent() {
                    fills += 1;
                }
            }
        });
        assert_eq!(fills, 0);
    }
}
