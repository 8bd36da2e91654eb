//! Pipeline – ties together composition, mounting, and export into a single
//! function call.

use crate::composition::{compose, plan, RenderOptions, RenderPlan, TextDirection};
use crate::cv_data::CvData;
use crate::document::TemplateDocument;
use crate::error::Result;
use crate::export::{ExportArtifact, ExportOptions, Exporter, Stage};
use crate::fonts::FontManager;
use crate::pagination::{A4_HEIGHT_PT, A4_WIDTH_PT, LETTER_HEIGHT_PT, LETTER_WIDTH_PT};
use crate::store::TemplateStore;
use crate::trigger::ExportRequest;

/// Page orientation for the generated PDF.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageOrientation {
    /// Portrait mode: height > width (default).
    #[default]
    Portrait,
    /// Landscape mode: width > height.
    Landscape,
}

/// Configuration for the export pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    /// Suggested download name (default: "cv.pdf").
    pub filename: String,
    /// Page width in points (default: A4 = 595.28).
    pub page_width: f32,
    /// Page height in points (default: A4 = 841.89).
    pub page_height: f32,
    /// Page orientation; swaps effective width/height when `Landscape`.
    pub orientation: PageOrientation,
    /// Device pixels per CSS px when rasterizing (default: 2.0).
    pub scale: f32,
    /// Squeeze everything onto one page instead of splitting.
    pub single_page: bool,
    /// Language of the CV data; also picks the text direction.
    pub language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: "Curriculum Vitae".to_string(),
            filename: "cv.pdf".to_string(),
            page_width: A4_WIDTH_PT,
            page_height: A4_HEIGHT_PT,
            orientation: PageOrientation::Portrait,
            scale: 2.0,
            single_page: false,
            language: "en".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Effective page width after applying orientation.
    pub fn effective_width(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_width,
            PageOrientation::Landscape => self.page_height,
        }
    }

    /// Effective page height after applying orientation.
    pub fn effective_height(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_height,
            PageOrientation::Landscape => self.page_width,
        }
    }

    /// Create an A4 landscape config.
    pub fn a4_landscape() -> Self {
        Self {
            orientation: PageOrientation::Landscape,
            ..Self::default()
        }
    }

    /// US Letter portrait.
    pub fn letter() -> Self {
        Self {
            page_width: LETTER_WIDTH_PT,
            page_height: LETTER_HEIGHT_PT,
            ..Self::default()
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::for_language(&self.language)
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            marker: self.render_options().marker,
            filename: self.filename.clone(),
            title: self.title.clone(),
            page_width_pt: self.effective_width(),
            page_height_pt: self.effective_height(),
            scale: self.scale,
            single_page: self.single_page,
        }
    }
}

/// Full pipeline: template + CV data → PDF artifact, with heuristic fonts.
pub fn generate_cv_pdf(doc: &TemplateDocument, cv: &CvData, config: &PipelineConfig) -> Result<ExportArtifact> {
    generate_cv_pdf_with_fonts(doc, cv, config, FontManager::default())
}

/// Same as [`generate_cv_pdf`] with caller-supplied fonts.
pub fn generate_cv_pdf_with_fonts(
    doc: &TemplateDocument,
    cv: &CvData,
    config: &PipelineConfig,
    fonts: FontManager,
) -> Result<ExportArtifact> {
    let mut stage = Stage::new();
    stage.mount(compose(doc, cv, &config.render_options()));
    Exporter::new(fonts).export(&stage, &config.export_options())
}

/// Generate only the render plan (no layout or PDF) – useful for previews
/// and testing.
pub fn compute_plan(doc: &TemplateDocument, config: &PipelineConfig) -> RenderPlan {
    plan(doc, TextDirection::for_language(&config.language))
}

/// Service one trigger request: load its template from `store` and export.
///
/// Request translations override the ones carried by the CV data.
pub fn handle_request(
    store: &dyn TemplateStore,
    request: ExportRequest,
    config: &PipelineConfig,
) -> Result<ExportArtifact> {
    let doc = store.load(&request.template_id)?;
    let mut cv = request.data;
    cv.translations.0.extend(request.translations.0);
    let config = PipelineConfig {
        language: request.language,
        ..config.clone()
    };
    log::info!("exporting template {} ({})", doc.id, config.language);
    generate_cv_pdf(&doc, &cv, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv_data::Translations;
    use crate::document::SequentialIds;
    use crate::error::Error;
    use crate::samples;
    use crate::store::MemoryStore;

    #[test]
    fn pipeline_basic() {
        let doc = samples::classic(&mut SequentialIds::default());
        let config = PipelineConfig {
            scale: 1.0,
            ..PipelineConfig::default()
        };
        let artifact = generate_cv_pdf(&doc, &samples::sample_cv(), &config).unwrap();
        assert!(!artifact.bytes.is_empty());
        assert!(artifact.page_count() >= 1);
        assert_eq!(&artifact.bytes[0..5], b"%PDF-");
        assert_eq!(artifact.filename, "cv.pdf");
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let c = PipelineConfig::a4_landscape();
        assert_eq!(c.effective_width(), A4_HEIGHT_PT);
        assert_eq!(c.effective_height(), A4_WIDTH_PT);
        let o = PipelineConfig::letter().export_options();
        assert_eq!((o.page_width_pt, o.page_height_pt), (612.0, 792.0));
    }

    #[test]
    fn plan_direction_follows_language() {
        let doc = samples::classic(&mut SequentialIds::default());
        let config = PipelineConfig {
            language: "ar".into(),
            ..Default::default()
        };
        assert_eq!(compute_plan(&doc, &config).direction, TextDirection::Rtl);
    }

    #[test]
    fn handle_request_loads_from_store() {
        let mut store = MemoryStore::new();
        let doc = samples::ats_plain(&mut SequentialIds::default());
        store.save(&doc).unwrap();
        let request = ExportRequest {
            data: samples::sample_cv(),
            language: "de".into(),
            translations: [("present", "heute")].into_iter().collect::<Translations>(),
            template_id: doc.id.clone(),
        };
        let config = PipelineConfig {
            scale: 1.0,
            ..Default::default()
        };
        let artifact = handle_request(&store, request.clone(), &config).unwrap();
        assert_eq!(&artifact.bytes[0..5], b"%PDF-");

        let missing = ExportRequest {
            template_id: "nope".into(),
            ..request
        };
        assert!(matches!(
            handle_request(&store, missing, &config),
            Err(Error::TemplateNotFound(_))
        ));
    }
}
