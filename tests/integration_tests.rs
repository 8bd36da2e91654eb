//! Integration tests for the cv-forge pipeline.
//!
//! These tests validate:
//! - Document editing keeps section order contiguous
//! - Render plans place the right sections in the right regions
//! - PDF output exists and has valid format
//! - Pagination and single-page fitting work end to end
//! - Stores, trigger and exporter cooperate

use cv_forge::composition::{compose, plan, RegionName, RenderOptions, TextDirection};
use cv_forge::cv_data::{CvData, Level, Skill};
use cv_forge::document::{LayoutVariant, SectionKind, SequentialIds, TemplateDocument};
use cv_forge::error::Error;
use cv_forge::export::{ExportOptions, ExportState, Exporter, Stage};
use cv_forge::fonts::FontManager;
use cv_forge::layout::compute_layout;
use cv_forge::pipeline::{generate_cv_pdf, generate_cv_pdf_with_fonts, handle_request, PipelineConfig};
use cv_forge::raster::rasterize;
use cv_forge::samples;
use cv_forge::store::{JsonDirStore, TemplateStore};
use cv_forge::trigger::{self, ExportRequest};
use cv_forge::view::ViewNode;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

// =====================================================================
// Helper
// =====================================================================

fn fast_config() -> PipelineConfig {
    PipelineConfig {
        scale: 1.0,
        ..PipelineConfig::default()
    }
}

fn new_doc() -> TemplateDocument {
    TemplateDocument::new("Integration", &mut SequentialIds::default())
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

/// A TTF from `CVFORGE_TEST_FONT`, the system, or printpdf's package sources.
fn test_font() -> Option<PathBuf> {
    if let Some(p) = std::env::var_os("CVFORGE_TEST_FONT") {
        return Some(PathBuf::from(p));
    }
    let system = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
    ];
    if let Some(p) = system.iter().map(PathBuf::from).find(|p| p.is_file()) {
        return Some(p);
    }
    let cargo_home = std::env::var_os("CARGO_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cargo")))?;
    std::fs::read_dir(cargo_home.join("registry").join("src"))
        .ok()?
        .flatten()
        .filter_map(|index| std::fs::read_dir(index.path()).ok())
        .flat_map(|packages| packages.flatten())
        .filter(|pkg| pkg.file_name().to_string_lossy().starts_with("printpdf-"))
        .map(|pkg| pkg.path().join("examples/assets/fonts/RobotoMedium.ttf"))
        .find(|p| p.is_file())
}

fn id_of(doc: &TemplateDocument, kind: SectionKind) -> cv_forge::document::SectionId {
    doc.section_of_kind(kind).unwrap().id
}

// =====================================================================
// Document editing
// =====================================================================

#[test]
fn edits_keep_order_contiguous() {
    let mut doc = new_doc();
    let ids: Vec<_> = doc.sections.iter().map(|s| s.id).collect();
    // Small LCG so the sequence is fixed but not hand-picked.
    let mut seed: u64 = 0x2545_f491;
    for _ in 0..300 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let id = ids[(seed >> 33) as usize % ids.len()];
        match (seed >> 20) % 4 {
            0 => {
                doc.move_section_up(id).unwrap();
            }
            1 => {
                doc.move_section_down(id).unwrap();
            }
            2 => {
                doc.reorder(id, (seed >> 40) as usize % (ids.len() + 2)).unwrap();
            }
            _ => {
                doc.toggle_visibility(id).unwrap();
            }
        }
        doc.check_invariants().unwrap();
        let headers = doc.sections.iter().filter(|s| s.kind() == SectionKind::Header).count();
        assert_eq!(headers, 1);
    }
}

#[test]
fn template_json_round_trips() {
    let doc = samples::modern_sidebar(&mut SequentialIds::default());
    let json = serde_json::to_string_pretty(&doc).unwrap();
    let back: TemplateDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn template_json_is_admitted_or_rejected() {
    let mut doc = new_doc();
    for s in &mut doc.sections {
        s.order = 3;
    }
    let repaired = TemplateDocument::from_json(&serde_json::to_string(&doc).unwrap()).unwrap();
    repaired.check_invariants().unwrap();

    let mut doubled = new_doc();
    let mut extra = doubled.header().unwrap().clone();
    extra.id = cv_forge::document::SectionId(77);
    doubled.sections.push(extra);
    let err = TemplateDocument::from_json(&serde_json::to_string(&doubled).unwrap()).unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

// =====================================================================
// Composition scenarios
// =====================================================================

#[test]
fn single_layout_plans_only_visible_sections() {
    let mut doc = new_doc();
    for kind in [
        SectionKind::Experience,
        SectionKind::Education,
        SectionKind::Languages,
        SectionKind::Certificates,
    ] {
        let id = id_of(&doc, kind);
        doc.toggle_visibility(id).unwrap();
    }
    let p = plan(&doc, TextDirection::Ltr);
    assert_eq!(
        p.entries(),
        vec![id_of(&doc, SectionKind::Summary), id_of(&doc, SectionKind::Skills)]
    );
}

#[test]
fn sidebar_layout_recolors_white_header() {
    let mut doc = new_doc();
    assert_eq!(doc.header().unwrap().style.background_color.as_deref(), Some("#ffffff"));
    doc.change_layout(LayoutVariant::SidebarLeft);
    let header = doc.header().unwrap();
    assert_eq!(
        header.style.background_color.as_deref(),
        Some(doc.settings.primary_color.as_str())
    );
    assert_eq!(header.style.text_color.as_deref(), Some("#ffffff"));
}

#[test]
fn out_of_range_skill_level_is_clamped() {
    let doc = new_doc();
    let cv = CvData {
        skills: vec![Skill {
            name: "Juggling".into(),
            level: Level(7),
        }],
        ..CvData::default()
    };
    let tree = compose(&doc, &cv, &RenderOptions::default());
    assert_eq!(tree.glyph_counts(), (5, 0));
}

#[test]
fn rtl_mirrors_sidebar_and_header() {
    let mut doc = new_doc();
    doc.change_layout(LayoutVariant::SidebarLeft);
    let p = plan(&doc, TextDirection::for_language("ar-EG"));
    assert!(p.header.unwrap().mirrored);
    assert_eq!(p.regions[0].name, RegionName::Sidebar);
    let tree = compose(&doc, &samples::sample_cv(), &RenderOptions::for_language("ar"));
    assert!(tree.text_content().contains("Jane Doe"));
}

#[test]
fn photo_is_composed_as_image() {
    let doc = new_doc();
    let mut cv = samples::sample_cv();
    cv.personal_info.photo = Some(samples::avatar_data_uri(16).unwrap());
    let tree = compose(&doc, &cv, &RenderOptions::default());
    let mut images = 0;
    tree.walk(&mut |n| {
        if matches!(n, ViewNode::Image { .. }) {
            images += 1;
        }
    });
    assert_eq!(images, 1);
    let artifact = generate_cv_pdf(&doc, &cv, &fast_config()).unwrap();
    assert_valid_pdf(&artifact.bytes);
}

// =====================================================================
// Export
// =====================================================================

#[test]
fn every_preset_exports() {
    for doc in samples::presets(&mut SequentialIds::default()) {
        let artifact = generate_cv_pdf(&doc, &samples::sample_cv(), &fast_config())
            .unwrap_or_else(|e| panic!("{}: {e}", doc.name));
        assert_valid_pdf(&artifact.bytes);
        assert!(artifact.page_count() >= 1, "{}", doc.name);
    }
}

#[test]
fn long_cv_splits_unless_single_page() {
    let doc = new_doc();
    let cv = samples::long_cv(40);
    let multi = generate_cv_pdf(&doc, &cv, &fast_config()).unwrap();
    assert!(multi.page_count() >= 2, "got {} page(s)", multi.page_count());
    let rows: u32 = multi.pages.iter().map(|p| p.slice.src_height).sum();
    assert_eq!(rows, multi.bitmap_height);

    let single = generate_cv_pdf(
        &doc,
        &cv,
        &PipelineConfig {
            single_page: true,
            ..fast_config()
        },
    )
    .unwrap();
    assert_eq!(single.page_count(), 1);
    assert!(single.pages[0].width < PipelineConfig::default().page_width);
    assert_valid_pdf(&single.bytes);
}

#[test]
fn export_before_mount_emits_nothing() {
    let mut stage = Stage::new();
    let mut exporter = Exporter::default();
    let err = exporter.export(&stage, &ExportOptions::default()).unwrap_err();
    assert!(matches!(err, Error::ElementNotFound(_)));
    assert!(matches!(exporter.state(), ExportState::Failed(_)));
    assert_eq!(stage.offscreen_count(), 0);

    // Mounting afterwards recovers.
    stage.mount(compose(&new_doc(), &samples::sample_cv(), &RenderOptions::default()));
    let options = ExportOptions {
        scale: 1.0,
        ..Default::default()
    };
    let artifact = exporter.export(&stage, &options).unwrap();
    assert_eq!(exporter.state(), &ExportState::Idle);
    assert_valid_pdf(&artifact.bytes);
}

#[test]
fn loaded_font_exports_with_shaped_metrics() {
    let Some(path) = test_font() else {
        eprintln!("no TTF available, skipping");
        return;
    };
    let doc = new_doc();
    let cv = samples::sample_cv();
    let fonts = FontManager::with_font_file(&path).unwrap();
    let artifact = generate_cv_pdf_with_fonts(&doc, &cv, &fast_config(), fonts).unwrap();
    assert_valid_pdf(&artifact.bytes);

    // The template's default family now resolves to the loaded face.
    let fonts = FontManager::with_font_file(&path).unwrap();
    let family = &doc.settings.font_family;
    let shaped = fonts.measure_text_width("Experience", 14.0, true, false, family);
    let heuristic = FontManager::default().measure_text_width("Experience", 14.0, true, false, family);
    assert_ne!(shaped, heuristic);
}

#[test]
fn rasterization_is_deterministic() {
    let doc = samples::modern_sidebar(&mut SequentialIds::default());
    let tree = compose(&doc, &samples::sample_cv(), &RenderOptions::default());
    let fonts = FontManager::default();
    let digest = || {
        let laid_out = compute_layout(&tree, 793.7, &fonts).unwrap();
        let bitmap = rasterize(&laid_out, &fonts, 1.0).unwrap();
        Sha256::digest(bitmap.as_raw())
    };
    assert_eq!(digest(), digest());
}

// =====================================================================
// Store + trigger
// =====================================================================

#[test]
fn triggered_request_exports_stored_template() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonDirStore::new(dir.path().join("templates"));
    let saved = store
        .save(&samples::executive(&mut SequentialIds::default()))
        .unwrap();

    let (trigger, requests) = trigger::channel();
    assert!(trigger.fire(ExportRequest {
        data: samples::sample_cv(),
        language: "en".into(),
        translations: Default::default(),
        template_id: saved.id.clone(),
    }));

    let pending = requests.drain();
    assert_eq!(pending.len(), 1);
    for request in pending {
        let artifact = handle_request(&store, request, &fast_config()).unwrap();
        let path = artifact.write_to(dir.path()).unwrap();
        let bytes = std::fs::read(path).unwrap();
        assert_valid_pdf(&bytes);
    }
}
