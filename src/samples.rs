//! Sample CV data and preset templates for testing and demonstration.
//!
//! Each preset exercises a different layout and rating style.

use std::io::Cursor;

use base64::Engine;
use image::{ImageFormat, Rgb, RgbImage};

use crate::cv_data::{Certificate, CvData, Education, Experience, Language, Level, PersonalInfo, Skill};
use crate::document::{
    DisplayStyle, GlobalSettingsPatch, IdGenerator, LayoutVariant, PhotoStyle, RatingStyle, SectionKind,
    SectionPatch, TemplateDocument,
};
use crate::error::{Error, Result};

/// A complete one-page résumé.
pub fn sample_cv() -> CvData {
    CvData {
        personal_info: PersonalInfo {
            full_name: "Jane Doe".into(),
            title: "Senior Backend Engineer".into(),
            email: "jane.doe@example.com".into(),
            phone: "+1 555 0100".into(),
            location: "Berlin, Germany".into(),
            summary: "Backend engineer with ten years of experience building payment \
                      and logistics platforms. Comfortable across the stack, happiest \
                      untangling slow queries and flaky deploys."
                .into(),
            photo: None,
        },
        experience: vec![
            Experience {
                position: "Senior Backend Engineer".into(),
                company: "Acme Payments".into(),
                location: "Berlin".into(),
                start_date: "2020-03".into(),
                end_date: None,
                description: "Led the ledger rewrite; cut settlement latency from hours to minutes.".into(),
            },
            Experience {
                position: "Software Engineer".into(),
                company: "Parcelly".into(),
                location: "Hamburg".into(),
                start_date: "2015-01".into(),
                end_date: Some("2020-02".into()),
                description: "Built the routing service and its on-call tooling.".into(),
            },
        ],
        education: vec![Education {
            degree: "M.Sc.".into(),
            field_of_study: "Computer Science".into(),
            institution: "TU Munich".into(),
            start_date: "2012".into(),
            end_date: Some("2014".into()),
            description: String::new(),
        }],
        skills: vec![
            Skill {
                name: "Rust".into(),
                level: Level(5),
            },
            Skill {
                name: "PostgreSQL".into(),
                level: Level(4),
            },
            Skill {
                name: "Kubernetes".into(),
                level: Level(3),
            },
        ],
        languages: vec![
            Language {
                name: "English".into(),
                level: Level(5),
            },
            Language {
                name: "German".into(),
                level: Level(4),
            },
        ],
        certificates: vec![Certificate {
            name: "Certified Kubernetes Administrator".into(),
            issuer: "CNCF".into(),
            date: "2021-06".into(),
            description: None,
        }],
        translations: Default::default(),
    }
}

/// [`sample_cv`] padded with `jobs` extra positions, for multi-page output.
pub fn long_cv(jobs: usize) -> CvData {
    let mut cv = sample_cv();
    for i in 0..jobs {
        cv.experience.push(Experience {
            position: format!("Engineer {}", i + 1),
            company: format!("Company {}", i + 1),
            location: "Remote".into(),
            start_date: format!("{}", 2000 + i % 20),
            end_date: Some(format!("{}", 2001 + i % 20)),
            description: "Maintained services, reviewed code and mentored new hires. \
                          Wrote the runbooks that the team still uses today."
                .into(),
        });
    }
    cv
}

/// A `side`×`side` PNG avatar as a `data:` URI.
pub fn avatar_data_uri(side: u32) -> Result<String> {
    let img = RgbImage::from_fn(side, side, |x, y| {
        if (x + y) % 2 == 0 {
            Rgb([37, 99, 235])
        } else {
            Rgb([243, 244, 246])
        }
    });
    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, ImageFormat::Png)
        .map_err(|e| Error::Rasterization(format!("encoding avatar: {e}")))?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(png.into_inner());
    Ok(format!("data:image/png;base64,{b64}"))
}

/// Default sections, single column.
pub fn classic(ids: &mut dyn IdGenerator) -> TemplateDocument {
    TemplateDocument::new("Classic", ids)
}

/// Sidebar on the left, star ratings, rounded photo.
pub fn modern_sidebar(ids: &mut dyn IdGenerator) -> TemplateDocument {
    let mut doc = TemplateDocument::new("Modern Sidebar", ids);
    doc.update_global_settings(GlobalSettingsPatch {
        primary_color: Some("#0f766e".into()),
        photo_style: Some(PhotoStyle::Rounded),
        ..Default::default()
    });
    doc.change_layout(LayoutVariant::SidebarLeft);
    patch_kind(&mut doc, SectionKind::Skills, rating(RatingStyle::Stars));
    doc
}

/// Header band with the summary as a lead paragraph.
pub fn executive(ids: &mut dyn IdGenerator) -> TemplateDocument {
    let mut doc = TemplateDocument::new("Executive", ids);
    doc.update_global_settings(GlobalSettingsPatch {
        primary_color: Some("#1e293b".into()),
        font_family: Some("Georgia".into()),
        ..Default::default()
    });
    doc.change_layout(LayoutVariant::HeaderHighlight);
    patch_kind(
        &mut doc,
        SectionKind::Experience,
        SectionPatch {
            display_style: Some(DisplayStyle::List),
            ..Default::default()
        },
    );
    doc
}

/// Plain output for résumé scanners.
pub fn ats_plain(ids: &mut dyn IdGenerator) -> TemplateDocument {
    let mut doc = TemplateDocument::new("ATS Plain", ids);
    doc.update_global_settings(GlobalSettingsPatch {
        is_ats_optimized: Some(true),
        show_photo: Some(false),
        ..Default::default()
    });
    patch_kind(&mut doc, SectionKind::Languages, rating(RatingStyle::Numbers));
    doc
}

/// Every preset, in gallery order.
pub fn presets(ids: &mut dyn IdGenerator) -> Vec<TemplateDocument> {
    vec![classic(ids), modern_sidebar(ids), executive(ids), ats_plain(ids)]
}

fn rating(style: RatingStyle) -> SectionPatch {
    SectionPatch {
        rating_style: Some(style),
        ..Default::default()
    }
}

fn patch_kind(doc: &mut TemplateDocument, kind: SectionKind, patch: SectionPatch) {
    if let Some(id) = doc.section_of_kind(kind).map(|s| s.id) {
        if let Err(e) = doc.update_section_settings(id, patch) {
            log::warn!("preset {}: {e}", doc.name);
        }
    }
}
