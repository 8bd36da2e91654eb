//! # cv-forge – template-driven résumé composition and PDF export
//!
//! A CV is described by a [`TemplateDocument`] (global styling plus an
//! ordered list of typed sections) and filled with [`CvData`]. The export
//! pipeline stages are:
//!
//! 1. **Plan** – assign visible sections to layout regions ([`composition`])
//! 2. **Compose** – build the styled view tree with the section renderers
//!    ([`sections`], [`view`], [`style`])
//! 3. **Layout** – compute flexbox layout at page width with Taffy ([`layout`])
//! 4. **Rasterize** – paint the laid-out tree to a bitmap ([`raster`])
//! 5. **Fit** – scale or split the bitmap onto pages ([`pagination`])
//! 6. **Emit** – embed page bands as PDF images via printpdf ([`emit`])
//!
//! [`export::Exporter`] drives stages 3–6 as a state machine over a
//! mounted [`export::Stage`]. A C-compatible FFI surface is exposed via the
//! [`ffi`] module.

pub mod composition;
pub mod cv_data;
pub mod document;
pub mod emit;
pub mod error;
pub mod export;
pub mod ffi;
pub mod fonts;
pub mod layout;
pub mod ordering;
pub mod pagination;
pub mod pipeline;
pub mod raster;
pub mod samples;
pub mod sections;
pub mod store;
pub mod style;
pub mod trigger;
pub mod view;

// Re-exports for convenience
pub use cv_data::CvData;
pub use document::TemplateDocument;
pub use error::{Error, Result};
pub use export::{ExportArtifact, ExportOptions, Exporter, Stage};
pub use pipeline::{generate_cv_pdf, PageOrientation, PipelineConfig};
