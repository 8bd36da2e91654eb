//! Personal header: avatar, name, title and contact line.

use super::RenderContext;
use crate::composition::{HeaderDirection, HeaderPlacement};
use crate::cv_data::PersonalInfo;
use crate::document::{PhotoStyle, Section};
use crate::style::{AlignItems, ComputedStyle, FlexDirection, JustifyContent, TextAlign};
use crate::view::ViewNode;

const NAME_SCALE: f32 = 1.8;
const EMPHASIS_SCALE: f32 = 1.6;

pub fn render(
    section: &Section,
    ctx: &RenderContext<'_>,
    info: &PersonalInfo,
    placement: &HeaderPlacement,
) -> ViewNode {
    let base = ctx.section_style(section);
    let align = match (placement.direction, placement.mirrored) {
        (HeaderDirection::Column, _) => TextAlign::Center,
        (HeaderDirection::Row, true) => TextAlign::Right,
        (HeaderDirection::Row, false) => TextAlign::Left,
    };
    let text = ComputedStyle::text_from(&base).text_align(align);
    let muted = if ctx.ats() || section.style.text_color.is_some() {
        base.color
    } else {
        ctx.secondary()
    };

    let mut name_size = base.font_size * NAME_SCALE;
    if placement.emphasized {
        name_size *= EMPHASIS_SCALE;
    }
    let mut name_style = text.clone().font_size(name_size).bold();
    if !ctx.ats() && section.style.text_color.is_none() {
        name_style = name_style.color(ctx.primary());
    }

    let mut lines = Vec::new();
    if !info.full_name.trim().is_empty() {
        lines.push(ViewNode::text(info.full_name.trim(), name_style));
    }
    if !info.title.trim().is_empty() {
        lines.push(ViewNode::text(
            info.title.trim(),
            text.clone().font_size(base.font_size * 1.15).color(muted),
        ));
    }
    let contacts: Vec<ViewNode> = [&info.email, &info.phone, &info.location]
        .into_iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| ViewNode::text(c, text.clone().font_size(base.font_size * 0.9).color(muted)))
        .collect();
    if !contacts.is_empty() {
        let style = match placement.direction {
            HeaderDirection::Column => ComputedStyle::default()
                .row()
                .wrap()
                .gap(12.0)
                .justify(JustifyContent::Center),
            HeaderDirection::Row => ComputedStyle::default().column().gap(2.0),
        };
        lines.push(ViewNode::element(style.margin_top(6.0), contacts));
    }

    let mut text_block = ComputedStyle::default().column().gap(2.0);
    if placement.direction == HeaderDirection::Row {
        text_block = text_block.grow();
    } else {
        text_block = text_block.align(AlignItems::Center);
    }
    let mut children = Vec::new();
    if ctx.settings.show_photo && !ctx.ats() {
        children.push(avatar(ctx, info));
    }
    children.push(ViewNode::element(text_block, lines));

    let direction = match (placement.direction, placement.mirrored) {
        (HeaderDirection::Column, _) => FlexDirection::Column,
        (HeaderDirection::Row, false) => FlexDirection::Row,
        (HeaderDirection::Row, true) => FlexDirection::RowReverse,
    };
    let style = base
        .direction(direction)
        .align(AlignItems::Center)
        .gap(16.0)
        .padding(16.0)
        .margin_bottom(16.0);
    ViewNode::element(style, children)
}

/// Photo from the data URI, or an initials disc when there is none.
fn avatar(ctx: &RenderContext<'_>, info: &PersonalInfo) -> ViewNode {
    let px = ctx.settings.photo_size.px();
    let radius = match ctx.settings.photo_style {
        PhotoStyle::Circle => px / 2.0,
        PhotoStyle::Rounded => 12.0,
        PhotoStyle::Square => 0.0,
    };
    let frame = ComputedStyle::default().size(px, px).radius(radius);

    match info.photo.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(src) => ViewNode::Image {
            src: src.to_string(),
            style: frame,
        },
        None => {
            let label = ComputedStyle::default()
                .font_size(px * 0.35)
                .bold()
                .color(ctx.primary())
                .text_align(TextAlign::Center);
            ViewNode::element(
                frame
                    .row()
                    .justify(JustifyContent::Center)
                    .align(AlignItems::Center)
                    .background(ctx.primary().lighten(0.7)),
                vec![ViewNode::text(info.initials(), label)],
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::ctx;
    use super::*;
    use crate::cv_data::Translations;
    use crate::document::{GlobalSettings, SectionKind, SequentialIds, TemplateDocument};

    fn info(photo: Option<&str>) -> PersonalInfo {
        PersonalInfo {
            full_name: "Grace Hopper".into(),
            title: "Rear Admiral".into(),
            email: "grace@navy.mil".into(),
            phone: String::new(),
            location: "Arlington".into(),
            summary: String::new(),
            photo: photo.map(str::to_string),
        }
    }

    fn placement(direction: HeaderDirection, mirrored: bool) -> HeaderPlacement {
        let doc = TemplateDocument::new("t", &mut SequentialIds::default());
        HeaderPlacement {
            section: doc.section_of_kind(SectionKind::Header).unwrap().id,
            direction,
            emphasized: false,
            mirrored,
        }
    }

    fn header_section() -> Section {
        let doc = TemplateDocument::new("t", &mut SequentialIds::default());
        doc.header().unwrap().clone()
    }

    #[test]
    fn placeholder_shows_initials() {
        let settings = GlobalSettings::default();
        let t = Translations::default();
        let node = render(
            &header_section(),
            &ctx(&settings, &t),
            &info(None),
            &placement(HeaderDirection::Column, false),
        );
        let text = node.text_content();
        assert!(text.starts_with("GH\nGrace Hopper"), "{text}");
        assert!(text.contains("Arlington"));
    }

    #[test]
    fn photo_becomes_image_and_can_be_hidden() {
        let mut settings = GlobalSettings::default();
        let t = Translations::default();
        let p = info(Some("data:image/png;base64,AAAA"));
        let section = header_section();
        let pl = placement(HeaderDirection::Column, false);

        let node = render(&section, &ctx(&settings, &t), &p, &pl);
        assert!(matches!(node.children()[0], ViewNode::Image { .. }));

        settings.show_photo = false;
        let node = render(&section, &ctx(&settings, &t), &p, &pl);
        assert!(!matches!(node.children()[0], ViewNode::Image { .. }));
        assert_eq!(node.children().len(), 1);
    }

    #[test]
    fn mirrored_row_reverses() {
        let settings = GlobalSettings::default();
        let t = Translations::default();
        let node = render(
            &header_section(),
            &ctx(&settings, &t),
            &info(None),
            &placement(HeaderDirection::Row, true),
        );
        match node {
            ViewNode::Element { style, .. } => {
                assert_eq!(style.flex_direction, FlexDirection::RowReverse)
            }
            _ => panic!("header is an element"),
        }
    }
}
