//! Layout composition – partitions a document's visible sections into the
//! named regions of its layout variant and assembles the full view tree.
//!
//! Region membership is by section kind, never by position: `order` only
//! decides the sequence inside a region. The header is always placed on its
//! own, above every region.

use serde::{Deserialize, Serialize};

use crate::cv_data::CvData;
use crate::document::{LayoutVariant, SectionId, SectionKind, TemplateDocument};
use crate::error::Result;
use crate::sections::{self, header, summary, RenderContext};
use crate::style::{Color, ComputedStyle, Dimension, FlexDirection};
use crate::view::ViewNode;

/// Marker carried by the root of every composed tree.
pub const DEFAULT_ROOT_MARKER: &str = "cv-root";

const PAGE_PADDING: f32 = 24.0;
const REGION_GUTTER: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    /// Direction implied by a BCP-47 language tag (`ar`, `he-IL`, …).
    pub fn for_language(language: &str) -> Self {
        let primary = language
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "ar" | "he" | "iw" | "fa" | "ur" | "yi" | "ps" | "ckb" => TextDirection::Rtl,
            _ => TextDirection::Ltr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionName {
    Main,
    Narrow,
    Wide,
    Sidebar,
    Col1,
    Col2,
    Col3,
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub name: RegionName,
    /// Share of the content width, `0.0..=1.0`.
    pub fraction: f32,
    pub sections: Vec<SectionId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderDirection {
    /// Centered stack, contacts flowed horizontally.
    Column,
    /// Photo beside the text, contacts stacked.
    Row,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderPlacement {
    pub section: SectionId,
    pub direction: HeaderDirection,
    pub emphasized: bool,
    /// Photo/text order reversed for right-to-left text.
    pub mirrored: bool,
}

/// Which sections go where, in what order. Derived on every render and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPlan {
    pub layout: LayoutVariant,
    pub direction: TextDirection,
    pub header: Option<HeaderPlacement>,
    /// Full-width band between header and regions (header-highlight summary).
    pub lead: Option<SectionId>,
    pub regions: Vec<Region>,
}

impl RenderPlan {
    /// Body sections in render order: the lead band, then each region.
    pub fn entries(&self) -> Vec<SectionId> {
        self.lead
            .into_iter()
            .chain(self.regions.iter().flat_map(|r| r.sections.iter().copied()))
            .collect()
    }

    pub fn region(&self, name: RegionName) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

type RegionSpec = (RegionName, f32, &'static [SectionKind]);

const ALL_BODY: &[SectionKind] = &[
    SectionKind::Summary,
    SectionKind::Experience,
    SectionKind::Education,
    SectionKind::Skills,
    SectionKind::Languages,
    SectionKind::Certificates,
];
const SIDEBAR: &[SectionKind] = &[SectionKind::Skills, SectionKind::Languages, SectionKind::Certificates];
const SIDEBAR_MAIN: &[SectionKind] = &[SectionKind::Summary, SectionKind::Experience, SectionKind::Education];
const NARROW: &[SectionKind] = &[SectionKind::Summary, SectionKind::Skills, SectionKind::Languages];
const WIDE: &[SectionKind] = &[SectionKind::Experience, SectionKind::Education, SectionKind::Certificates];
const COL1: &[SectionKind] = &[SectionKind::Skills];
const COL2: &[SectionKind] = &[SectionKind::Summary, SectionKind::Experience];
const COL3: &[SectionKind] = &[SectionKind::Education, SectionKind::Languages, SectionKind::Certificates];
const HIGHLIGHT_PRIMARY: &[SectionKind] = &[SectionKind::Experience, SectionKind::Education];

/// Region table for a layout: `(name, fraction, member kinds)`.
fn region_table(layout: LayoutVariant) -> Vec<RegionSpec> {
    match layout {
        LayoutVariant::Single => vec![(RegionName::Main, 1.0, ALL_BODY)],
        LayoutVariant::Double => vec![(RegionName::Narrow, 0.35, NARROW), (RegionName::Wide, 0.65, WIDE)],
        LayoutVariant::SidebarLeft => vec![
            (RegionName::Sidebar, 0.32, SIDEBAR),
            (RegionName::Main, 0.68, SIDEBAR_MAIN),
        ],
        LayoutVariant::SidebarRight => vec![
            (RegionName::Main, 0.68, SIDEBAR_MAIN),
            (RegionName::Sidebar, 0.32, SIDEBAR),
        ],
        LayoutVariant::ThreeColumn => vec![
            (RegionName::Col1, 0.25, COL1),
            (RegionName::Col2, 0.42, COL2),
            (RegionName::Col3, 0.33, COL3),
        ],
        LayoutVariant::HeaderHighlight => vec![
            (RegionName::Primary, 0.6, HIGHLIGHT_PRIMARY),
            (RegionName::Secondary, 0.4, SIDEBAR),
        ],
    }
}

/// Partition the visible sections of `doc` for its current layout.
pub fn plan(doc: &TemplateDocument, direction: TextDirection) -> RenderPlan {
    let layout = doc.settings.layout;
    let visible: Vec<_> = doc.sorted_sections().into_iter().filter(|s| s.visible).collect();

    let header = visible
        .iter()
        .find(|s| s.kind() == SectionKind::Header)
        .map(|s| HeaderPlacement {
            section: s.id,
            direction: if layout.is_single_column_like() {
                HeaderDirection::Column
            } else {
                HeaderDirection::Row
            },
            emphasized: layout == LayoutVariant::HeaderHighlight,
            mirrored: direction == TextDirection::Rtl,
        });

    let lead = match layout {
        LayoutVariant::HeaderHighlight => visible
            .iter()
            .find(|s| s.kind() == SectionKind::Summary)
            .map(|s| s.id),
        _ => None,
    };

    let regions = region_table(layout)
        .into_iter()
        .map(|(name, fraction, kinds)| Region {
            name,
            fraction,
            sections: visible
                .iter()
                .filter(|s| kinds.contains(&s.kind()))
                .map(|s| s.id)
                .collect(),
        })
        .collect();

    RenderPlan {
        layout,
        direction,
        header,
        lead,
        regions,
    }
}

/// Options for [`compose`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub language: String,
    pub direction: TextDirection,
    /// Marker placed on the root element, used by the exporter to find it.
    pub marker: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::for_language("en")
    }
}

impl RenderOptions {
    pub fn for_language(language: &str) -> Self {
        Self {
            language: language.to_string(),
            direction: TextDirection::for_language(language),
            marker: DEFAULT_ROOT_MARKER.to_string(),
        }
    }
}

/// Build the complete view tree for `doc` filled with `cv`.
pub fn compose(doc: &TemplateDocument, cv: &CvData, options: &RenderOptions) -> ViewNode {
    let plan = plan(doc, options.direction);
    let ctx = RenderContext::new(&doc.settings, &cv.translations, options.direction);
    log::debug!(
        "composing {} layout with {} body sections",
        plan.layout,
        plan.entries().len()
    );

    let mut children = Vec::new();

    if let Some(placement) = &plan.header {
        if let Ok(section) = doc.section(placement.section) {
            children.push(header::render(section, &ctx, &cv.personal_info, placement));
        }
    }

    if let Some(section) = plan.lead.and_then(|id| doc.section(id).ok()) {
        let base = ctx.section_style(section);
        let body = summary::render(&cv.personal_info.summary, &base, true);
        if !body.is_empty() {
            let padding = if base.background_color.is_transparent() { 0.0 } else { 12.0 };
            children.push(ViewNode::element(
                base.padding(padding).margin_bottom(16.0),
                body,
            ));
        }
    }

    let columns: Vec<ViewNode> = plan
        .regions
        .iter()
        .map(|region| compose_region(doc, cv, &ctx, region, plan.regions.len()))
        .collect();
    let row_direction = match options.direction {
        TextDirection::Ltr => FlexDirection::Row,
        TextDirection::Rtl => FlexDirection::RowReverse,
    };
    children.push(ViewNode::element(
        ComputedStyle::default()
            .direction(row_direction)
            .width(Dimension::Percent(100.0)),
        columns,
    ));

    let background = if ctx.ats() {
        Color::WHITE
    } else {
        Color::from_hex_or(&doc.settings.background_color, Color::WHITE)
    };
    let root = ComputedStyle::default()
        .column()
        .width(Dimension::Percent(100.0))
        .padding(PAGE_PADDING)
        .background(background)
        .font_family(&doc.settings.font_family)
        .font_size(doc.settings.font_size)
        .color(ctx.text_color());
    ViewNode::element(root, children).with_marker(options.marker.clone())
}

fn compose_region(
    doc: &TemplateDocument,
    cv: &CvData,
    ctx: &RenderContext<'_>,
    region: &Region,
    region_count: usize,
) -> ViewNode {
    let blocks: Vec<ViewNode> = region
        .sections
        .iter()
        .filter_map(|id| doc.section(*id).ok())
        .filter_map(|s| sections::render_section(s, ctx, cv))
        .collect();

    let mut style = ComputedStyle::default()
        .column()
        .width(Dimension::Percent(region.fraction * 100.0));
    if region_count > 1 {
        style = style.padding_xy(REGION_GUTTER, 0.0);
    }
    if region.name == RegionName::Sidebar && !ctx.ats() {
        if let Some(fill) = &doc.settings.sidebar_color {
            style = style
                .background(Color::from_hex_or(fill, Color::TRANSPARENT))
                .padding(12.0);
        }
    }
    ViewNode::element(style, blocks)
}
