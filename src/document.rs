//! Template document model – global style settings plus an arena of
//! sections addressed by stable [`SectionId`]s.
//!
//! The model is pure data plus mutation operations. Rendering lives in
//! [`crate::composition`] and [`crate::sections`]; reordering lives in
//! [`crate::ordering`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Header background/text tone applied when a layout needs a filled band.
pub const HEADER_BAND_TEXT_COLOR: &str = "#ffffff";
/// Sidebar fill seeded when switching into a sidebar layout.
pub const DEFAULT_SIDEBAR_COLOR: &str = "#f3f4f6";

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable identity of a section within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub u64);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Allocates template ids. Injected so tests stay deterministic.
pub trait IdGenerator {
    fn template_id(&mut self) -> String;
}

/// Counter-based ids: `tpl-1`, `tpl-2`, …
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("tpl")
    }
}

impl IdGenerator for SequentialIds {
    fn template_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn template_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

// ---------------------------------------------------------------------------
// Global settings
// ---------------------------------------------------------------------------

/// The six supported page layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutVariant {
    #[default]
    Single,
    Double,
    SidebarLeft,
    SidebarRight,
    ThreeColumn,
    HeaderHighlight,
}

impl LayoutVariant {
    pub const ALL: [LayoutVariant; 6] = [
        LayoutVariant::Single,
        LayoutVariant::Double,
        LayoutVariant::SidebarLeft,
        LayoutVariant::SidebarRight,
        LayoutVariant::ThreeColumn,
        LayoutVariant::HeaderHighlight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutVariant::Single => "single",
            LayoutVariant::Double => "double",
            LayoutVariant::SidebarLeft => "sidebar-left",
            LayoutVariant::SidebarRight => "sidebar-right",
            LayoutVariant::ThreeColumn => "three-column",
            LayoutVariant::HeaderHighlight => "header-highlight",
        }
    }

    pub fn is_sidebar(self) -> bool {
        matches!(self, LayoutVariant::SidebarLeft | LayoutVariant::SidebarRight)
    }

    /// Layouts that visually require a filled header band.
    pub fn wants_header_band(self) -> bool {
        matches!(
            self,
            LayoutVariant::HeaderHighlight | LayoutVariant::SidebarLeft | LayoutVariant::SidebarRight
        )
    }

    /// Layouts whose body is a single flow (the header stacks vertically).
    pub fn is_single_column_like(self) -> bool {
        matches!(self, LayoutVariant::Single | LayoutVariant::HeaderHighlight)
    }
}

impl fmt::Display for LayoutVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        LayoutVariant::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| Error::Validation {
                field: "layout",
                message: format!("unknown layout `{s}`"),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoStyle {
    #[default]
    Circle,
    Square,
    Rounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl PhotoSize {
    /// Edge length of the avatar in layout units.
    pub fn px(self) -> f32 {
        match self {
            PhotoSize::Small => 64.0,
            PhotoSize::Medium => 96.0,
            PhotoSize::Large => 128.0,
        }
    }
}

/// Document-wide style settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    pub primary_color: String,
    pub secondary_color: String,
    pub text_color: String,
    pub background_color: String,
    pub font_family: String,
    pub font_size: f32,
    pub show_photo: bool,
    pub photo_style: PhotoStyle,
    pub photo_size: PhotoSize,
    pub layout: LayoutVariant,
    /// Strips decorative styling for plain-text résumé scanners.
    pub is_ats_optimized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar_color: Option<String>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            primary_color: "#2563eb".to_string(),
            secondary_color: "#64748b".to_string(),
            text_color: "#1f2937".to_string(),
            background_color: "#ffffff".to_string(),
            font_family: "Helvetica".to_string(),
            font_size: 14.0,
            show_photo: true,
            photo_style: PhotoStyle::Circle,
            photo_size: PhotoSize::Medium,
            layout: LayoutVariant::Single,
            is_ats_optimized: false,
            sidebar_color: None,
        }
    }
}

/// Partial update for [`GlobalSettings`]; `None` fields are left alone.
///
/// `layout` is deliberately absent: layout switches go through
/// [`TemplateDocument::change_layout`] because they recolor the header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalSettingsPatch {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub text_color: Option<String>,
    pub background_color: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub show_photo: Option<bool>,
    pub photo_style: Option<PhotoStyle>,
    pub photo_size: Option<PhotoSize>,
    pub is_ats_optimized: Option<bool>,
    pub sidebar_color: Option<String>,
}

impl GlobalSettings {
    fn apply(&mut self, patch: GlobalSettingsPatch) {
        macro_rules! merge {
            ($($field:ident),*) => {
                $(if let Some(v) = patch.$field { self.$field = v; })*
            };
        }
        merge!(
            primary_color,
            secondary_color,
            text_color,
            background_color,
            font_family,
            font_size,
            show_photo,
            photo_style,
            photo_size,
            is_ats_optimized
        );
        if let Some(c) = patch.sidebar_color {
            self.sidebar_color = Some(c);
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStyle {
    List,
    #[default]
    Timeline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingStyle {
    #[default]
    Dots,
    Stars,
    Bars,
    Numbers,
}

/// Discriminant of [`SectionContent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Header,
    Summary,
    Experience,
    Education,
    Skills,
    Languages,
    Certificates,
}

impl SectionKind {
    /// Translation key and default English title.
    pub fn label(self) -> (&'static str, &'static str) {
        match self {
            SectionKind::Header => ("header", ""),
            SectionKind::Summary => ("summary", "Summary"),
            SectionKind::Experience => ("experience", "Experience"),
            SectionKind::Education => ("education", "Education"),
            SectionKind::Skills => ("skills", "Skills"),
            SectionKind::Languages => ("languages", "Languages"),
            SectionKind::Certificates => ("certificates", "Certificates"),
        }
    }
}

/// Kind-specific section settings. Only the kinds that use a field carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SectionContent {
    Header,
    Summary,
    Experience {
        #[serde(rename = "displayStyle", default)]
        display_style: DisplayStyle,
    },
    Education {
        #[serde(rename = "displayStyle", default)]
        display_style: DisplayStyle,
    },
    Skills {
        #[serde(rename = "ratingStyle", default)]
        rating_style: RatingStyle,
    },
    Languages {
        #[serde(rename = "ratingStyle", default)]
        rating_style: RatingStyle,
    },
    Certificates,
}

impl SectionContent {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionContent::Header => SectionKind::Header,
            SectionContent::Summary => SectionKind::Summary,
            SectionContent::Experience { .. } => SectionKind::Experience,
            SectionContent::Education { .. } => SectionKind::Education,
            SectionContent::Skills { .. } => SectionKind::Skills,
            SectionContent::Languages { .. } => SectionKind::Languages,
            SectionContent::Certificates => SectionKind::Certificates,
        }
    }

    fn display_style_mut(&mut self) -> Option<&mut DisplayStyle> {
        match self {
            SectionContent::Experience { display_style }
            | SectionContent::Education { display_style } => Some(display_style),
            _ => None,
        }
    }

    fn rating_style_mut(&mut self) -> Option<&mut RatingStyle> {
        match self {
            SectionContent::Skills { rating_style } | SectionContent::Languages { rating_style } => {
                Some(rating_style)
            }
            _ => None,
        }
    }
}

/// Per-section style overrides; `None` inherits from [`GlobalSettings`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    pub visible: bool,
    pub order: usize,
    #[serde(default)]
    pub style: SectionStyle,
    #[serde(flatten)]
    pub content: SectionContent,
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        self.content.kind()
    }
}

/// Partial update for one section. Kind-specific fields are rejected for
/// kinds that do not carry them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionPatch {
    pub title: Option<String>,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub display_style: Option<DisplayStyle>,
    pub rating_style: Option<RatingStyle>,
}

// ---------------------------------------------------------------------------
// Template document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDocument {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub settings: GlobalSettings,
    pub sections: Vec<Section>,
    /// Next value handed out by the section id allocator.
    #[serde(default)]
    pub next_section_id: u64,
}

impl TemplateDocument {
    /// Create a document seeded with the header and the six default
    /// sections in their default order.
    pub fn new(name: impl Into<String>, ids: &mut dyn IdGenerator) -> Self {
        let now = Utc::now();
        let mut doc = Self {
            id: ids.template_id(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            settings: GlobalSettings::default(),
            sections: Vec::new(),
            next_section_id: 1,
        };

        let seeds = [
            SectionContent::Header,
            SectionContent::Summary,
            SectionContent::Experience {
                display_style: DisplayStyle::Timeline,
            },
            SectionContent::Education {
                display_style: DisplayStyle::List,
            },
            SectionContent::Skills {
                rating_style: RatingStyle::Dots,
            },
            SectionContent::Languages {
                rating_style: RatingStyle::Bars,
            },
            SectionContent::Certificates,
        ];
        for (order, content) in seeds.into_iter().enumerate() {
            let id = doc.allocate_section_id();
            let style = if content.kind() == SectionKind::Header {
                SectionStyle {
                    background_color: Some("#ffffff".to_string()),
                    ..SectionStyle::default()
                }
            } else {
                SectionStyle::default()
            };
            doc.sections.push(Section {
                id,
                title: content.kind().label().1.to_string(),
                visible: true,
                order,
                style,
                content,
            });
        }
        doc
    }

    fn allocate_section_id(&mut self) -> SectionId {
        // Documents deserialized without the counter resume after the max id.
        let floor = self.sections.iter().map(|s| s.id.0 + 1).max().unwrap_or(1);
        let id = self.next_section_id.max(floor);
        self.next_section_id = id + 1;
        SectionId(id)
    }

    /// Stamp `updated_at`. Never moves backwards.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    pub fn section(&self, id: SectionId) -> Result<&Section> {
        self.sections
            .iter()
            .find(|s| s.id == id)
            .ok_or(Error::SectionNotFound(id))
    }

    pub fn section_mut(&mut self, id: SectionId) -> Result<&mut Section> {
        self.sections
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(Error::SectionNotFound(id))
    }

    /// The first section of the given kind.
    pub fn section_of_kind(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind() == kind)
    }

    pub fn header(&self) -> Option<&Section> {
        self.section_of_kind(SectionKind::Header)
    }

    /// All sections sorted by `order`.
    pub fn sorted_sections(&self) -> Vec<&Section> {
        let mut sorted: Vec<&Section> = self.sections.iter().collect();
        sorted.sort_by_key(|s| (s.order, s.id));
        sorted
    }

    /// Shallow-merge a patch into the global settings.
    pub fn update_global_settings(&mut self, patch: GlobalSettingsPatch) {
        self.settings.apply(patch);
        self.touch();
    }

    /// Shallow-merge a patch into one section's settings.
    ///
    /// Fails without touching the section if the patch names a kind-specific
    /// field the section does not carry.
    pub fn update_section_settings(&mut self, id: SectionId, patch: SectionPatch) -> Result<()> {
        let section = self.section_mut(id)?;
        let kind = section.kind();
        let mut content = section.content;
        if let Some(display) = patch.display_style {
            let slot = content
                .display_style_mut()
                .ok_or(Error::SettingNotApplicable {
                    field: "displayStyle",
                    kind,
                })?;
            *slot = display;
        }
        if let Some(rating) = patch.rating_style {
            let slot = content
                .rating_style_mut()
                .ok_or(Error::SettingNotApplicable {
                    field: "ratingStyle",
                    kind,
                })?;
            *slot = rating;
        }

        section.content = content;
        if let Some(title) = patch.title {
            section.title = title;
        }
        if let Some(c) = patch.background_color {
            section.style.background_color = Some(c);
        }
        if let Some(c) = patch.text_color {
            section.style.text_color = Some(c);
        }
        if let Some(f) = patch.font_family {
            section.style.font_family = Some(f);
        }
        if let Some(size) = patch.font_size {
            section.style.font_size = Some(size);
        }
        self.touch();
        Ok(())
    }

    /// Switch the layout variant.
    ///
    /// Layouts that need a filled header band recolor the header section to
    /// the primary color with white text; switching into a sidebar layout
    /// seeds a sidebar color when none is set. Other layouts leave the
    /// header colors as they are.
    pub fn change_layout(&mut self, layout: LayoutVariant) {
        let previous = self.settings.layout;
        self.settings.layout = layout;

        if layout.wants_header_band() {
            let primary = self.settings.primary_color.clone();
            if let Some(header) = self
                .sections
                .iter_mut()
                .find(|s| s.kind() == SectionKind::Header)
            {
                header.style.background_color = Some(primary);
                header.style.text_color = Some(HEADER_BAND_TEXT_COLOR.to_string());
            }
        }
        if layout.is_sidebar() && self.settings.sidebar_color.is_none() {
            self.settings.sidebar_color = Some(DEFAULT_SIDEBAR_COLOR.to_string());
        }

        log::debug!("layout changed: {previous} -> {layout}");
        self.touch();
    }

    /// Parse a template from JSON. Gaps and duplicates in `order` are
    /// repaired; a document without exactly one header is rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: Self = serde_json::from_str(json)?;
        doc.admit()
    }

    /// Check the document may be persisted.
    pub fn validate_for_save(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation {
                field: "name",
                message: "Template name is required".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> TemplateDocument {
        TemplateDocument::new("Classic", &mut SequentialIds::default())
    }

    #[test]
    fn seeded_with_header_and_six_sections() {
        let d = doc();
        assert_eq!(d.id, "tpl-1");
        assert_eq!(d.sections.len(), 7);
        let kinds: Vec<SectionKind> = d.sorted_sections().iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Header,
                SectionKind::Summary,
                SectionKind::Experience,
                SectionKind::Education,
                SectionKind::Skills,
                SectionKind::Languages,
                SectionKind::Certificates,
            ]
        );
    }

    #[test]
    fn sidebar_layout_recolors_header() {
        let mut d = doc();
        assert_eq!(
            d.header().unwrap().style.background_color.as_deref(),
            Some("#ffffff")
        );
        d.change_layout(LayoutVariant::SidebarLeft);
        let header = d.header().unwrap();
        assert_eq!(header.style.background_color.as_deref(), Some("#2563eb"));
        assert_eq!(header.style.text_color.as_deref(), Some("#ffffff"));
        assert_eq!(d.settings.sidebar_color.as_deref(), Some(DEFAULT_SIDEBAR_COLOR));
    }

    #[test]
    fn plain_layouts_leave_header_alone() {
        let mut d = doc();
        let id = d.header().unwrap().id;
        d.update_section_settings(
            id,
            SectionPatch {
                background_color: Some("#fafafa".into()),
                ..Default::default()
            },
        )
        .unwrap();
        d.change_layout(LayoutVariant::ThreeColumn);
        assert_eq!(
            d.header().unwrap().style.background_color.as_deref(),
            Some("#fafafa")
        );
        assert_eq!(d.settings.sidebar_color, None);
    }

    #[test]
    fn existing_sidebar_color_is_kept() {
        let mut d = doc();
        d.update_global_settings(GlobalSettingsPatch {
            sidebar_color: Some("#112233".into()),
            ..Default::default()
        });
        d.change_layout(LayoutVariant::SidebarRight);
        assert_eq!(d.settings.sidebar_color.as_deref(), Some("#112233"));
    }

    #[test]
    fn global_patch_is_shallow() {
        let mut d = doc();
        d.update_global_settings(GlobalSettingsPatch {
            font_size: Some(12.0),
            ..Default::default()
        });
        assert_eq!(d.settings.font_size, 12.0);
        assert_eq!(d.settings.primary_color, "#2563eb");
        assert!(d.settings.show_photo);
    }

    #[test]
    fn rating_style_rejected_on_experience() {
        let mut d = doc();
        let id = d.section_of_kind(SectionKind::Experience).unwrap().id;
        let before = d.clone();
        let err = d
            .update_section_settings(
                id,
                SectionPatch {
                    title: Some("Work".into()),
                    rating_style: Some(RatingStyle::Stars),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::SettingNotApplicable { field: "ratingStyle", .. }));
        assert_eq!(d, before);
    }

    #[test]
    fn rating_style_applies_to_languages() {
        let mut d = doc();
        let id = d.section_of_kind(SectionKind::Languages).unwrap().id;
        d.update_section_settings(
            id,
            SectionPatch {
                rating_style: Some(RatingStyle::Numbers),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            d.section(id).unwrap().content,
            SectionContent::Languages {
                rating_style: RatingStyle::Numbers
            }
        );
    }

    #[test]
    fn blank_name_fails_validation() {
        let mut d = doc();
        d.name = "   ".into();
        assert!(matches!(
            d.validate_for_save(),
            Err(Error::Validation { field: "name", .. })
        ));
    }

    #[test]
    fn section_json_is_flat_and_tagged() {
        let d = doc();
        let exp = d.section_of_kind(SectionKind::Experience).unwrap();
        let json = serde_json::to_value(exp).unwrap();
        assert_eq!(json["type"], "experience");
        assert_eq!(json["displayStyle"], "timeline");
        let back: Section = serde_json::from_value(json).unwrap();
        assert_eq!(&back, exp);
    }

    #[test]
    fn layout_parses_from_kebab_case() {
        assert_eq!(
            "header-highlight".parse::<LayoutVariant>().unwrap(),
            LayoutVariant::HeaderHighlight
        );
        assert!("grid".parse::<LayoutVariant>().is_err());
    }
}
