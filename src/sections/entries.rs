//! Dated entries shared by the experience and education sections.

use super::RenderContext;
use crate::cv_data::{Education, Experience};
use crate::document::DisplayStyle;
use crate::style::{Color, ComputedStyle, JustifyContent};
use crate::view::ViewNode;

/// A dated record normalised from either experience or education data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entry {
    pub title: String,
    pub subtitle: String,
    pub start: String,
    pub end: Option<String>,
    pub description: String,
}

impl From<&Experience> for Entry {
    fn from(e: &Experience) -> Self {
        Self {
            title: e.position.clone(),
            subtitle: join_nonempty(&e.company, &e.location),
            start: e.start_date.clone(),
            end: e.end_date.clone(),
            description: e.description.clone(),
        }
    }
}

impl From<&Education> for Entry {
    fn from(e: &Education) -> Self {
        Self {
            title: join_nonempty(&e.degree, &e.field_of_study),
            subtitle: e.institution.clone(),
            start: e.start_date.clone(),
            end: e.end_date.clone(),
            description: e.description.clone(),
        }
    }
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.trim(), b.trim()) {
        ("", b) => b.to_string(),
        (a, "") => a.to_string(),
        (a, b) => format!("{a}, {b}"),
    }
}

impl Entry {
    /// `start - end`, with a missing or blank end rendered as `present`.
    pub fn date_range(&self, present: &str) -> String {
        let end = match self.end.as_deref().map(str::trim) {
            Some(e) if !e.is_empty() => e,
            _ => present,
        };
        if self.start.trim().is_empty() {
            end.to_string()
        } else {
            format!("{} - {}", self.start.trim(), end)
        }
    }
}

pub fn render(
    items: &[Entry],
    display: DisplayStyle,
    ctx: &RenderContext<'_>,
    base: &ComputedStyle,
) -> Vec<ViewNode> {
    let present = ctx.t("present", "Present");
    items
        .iter()
        .map(|entry| render_entry(entry, display, ctx, base, present))
        .collect()
}

fn render_entry(
    entry: &Entry,
    display: DisplayStyle,
    ctx: &RenderContext<'_>,
    base: &ComputedStyle,
    present: &str,
) -> ViewNode {
    let text = ComputedStyle::text_from(base);
    let muted = if ctx.ats() { text.color } else { ctx.secondary() };

    let title_row = ViewNode::element(
        ComputedStyle::default()
            .row()
            .wrap()
            .justify(JustifyContent::SpaceBetween)
            .gap(8.0),
        vec![
            ViewNode::text(&entry.title, text.clone().bold()),
            ViewNode::text(
                entry.date_range(present),
                text.clone().font_size(base.font_size * 0.85).color(muted),
            ),
        ],
    );

    let mut children = vec![title_row];
    if !entry.subtitle.trim().is_empty() {
        children.push(ViewNode::text(
            &entry.subtitle,
            text.clone().italic().color(muted),
        ));
    }
    if !entry.description.trim().is_empty() {
        children.push(ViewNode::text(
            entry.description.trim(),
            text.clone().font_size(base.font_size * 0.92),
        ));
    }

    let mut style = ComputedStyle::default().column().gap(2.0).margin_bottom(10.0);
    if !ctx.ats() {
        style = match display {
            DisplayStyle::Timeline => style.accent_bar(3.0, ctx.primary()).padding_left(12.0),
            DisplayStyle::List => style.border(1.0, Color::NEUTRAL).radius(6.0).padding(10.0),
        };
    }
    ViewNode::element(style, children)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::ctx;
    use super::*;
    use crate::cv_data::Translations;
    use crate::document::GlobalSettings;

    fn experience(end: Option<&str>) -> Experience {
        Experience {
            position: "Engineer".into(),
            company: "Acme".into(),
            location: "Berlin".into(),
            start_date: "2020".into(),
            end_date: end.map(str::to_string),
            description: "Shipped the thing.".into(),
        }
    }

    #[test]
    fn missing_end_uses_localized_present() {
        let settings = GlobalSettings::default();
        let t: Translations = [("present", "Heute")].into_iter().collect();
        let nodes = render(
            &[Entry::from(&experience(None))],
            DisplayStyle::List,
            &ctx(&settings, &t),
            &ComputedStyle::default(),
        );
        let text = nodes[0].text_content();
        assert!(text.contains("2020 - Heute"), "{text}");
        assert!(text.contains("Acme, Berlin"));
    }

    #[test]
    fn timeline_has_accent_bar_and_list_has_border() {
        let settings = GlobalSettings::default();
        let t = Translations::default();
        let c = ctx(&settings, &t);
        let item = [Entry::from(&experience(Some("2022")))];
        let timeline = render(&item, DisplayStyle::Timeline, &c, &ComputedStyle::default());
        let list = render(&item, DisplayStyle::List, &c, &ComputedStyle::default());
        match (&timeline[0], &list[0]) {
            (ViewNode::Element { style: a, .. }, ViewNode::Element { style: b, .. }) => {
                assert_eq!(a.border_left_width, 3.0);
                assert_eq!(a.border_width, 0.0);
                assert_eq!(b.border_width, 1.0);
                assert_eq!(b.corner_radius, 6.0);
            }
            _ => panic!("entries render as elements"),
        }
    }

    #[test]
    fn ats_entries_are_plain() {
        let settings = GlobalSettings {
            is_ats_optimized: true,
            ..Default::default()
        };
        let t = Translations::default();
        let nodes = render(
            &[Entry::from(&experience(None))],
            DisplayStyle::Timeline,
            &ctx(&settings, &t),
            &ComputedStyle::default(),
        );
        if let ViewNode::Element { style, .. } = &nodes[0] {
            assert_eq!(style.border_left_width, 0.0);
            assert_eq!(style.corner_radius, 0.0);
        }
    }

    #[test]
    fn education_title_joins_field() {
        let e = Education {
            degree: "BSc".into(),
            field_of_study: "Physics".into(),
            institution: "ETH".into(),
            ..Default::default()
        };
        let entry = Entry::from(&e);
        assert_eq!(entry.title, "BSc, Physics");
        assert_eq!(entry.date_range("Present"), "Present");
    }
}
