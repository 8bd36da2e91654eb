//! Exporter – captures a mounted view tree, rasterizes an off-screen clone
//! at page width, fits the bitmap onto pages and emits the PDF.
//!
//! ```text
//! Idle → Capturing → Rasterizing → Fitting → Emitting → Idle
//!            └────────────┴───────────┴──────────┴──→ Failed
//! ```
//!
//! The off-screen clone is an RAII guard registered on the [`Stage`], so it
//! is torn down on every path, including failures.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::composition::DEFAULT_ROOT_MARKER;
use crate::emit;
use crate::error::{Error, Result};
use crate::fonts::FontManager;
use crate::layout;
use crate::pagination::{self, PagePlacement, A4_HEIGHT_PT, A4_WIDTH_PT};
use crate::raster;
use crate::view::ViewNode;

/// CSS px per PDF point.
pub const PX_PER_PT: f32 = 96.0 / 72.0;

/// Where composed trees are mounted for preview and capture.
#[derive(Debug, Default)]
pub struct Stage {
    mounted: Vec<ViewNode>,
    offscreen: Cell<usize>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a tree, replacing any tree whose root carries the same marker.
    pub fn mount(&mut self, tree: ViewNode) {
        if let Some(marker) = tree.marker() {
            let marker = marker.to_string();
            self.mounted.retain(|t| t.marker() != Some(marker.as_str()));
        }
        self.mounted.push(tree);
    }

    /// Remove the tree rooted at `marker`. Returns whether one was mounted.
    pub fn unmount(&mut self, marker: &str) -> bool {
        let before = self.mounted.len();
        self.mounted.retain(|t| t.marker() != Some(marker));
        before != self.mounted.len()
    }

    pub fn find(&self, marker: &str) -> Option<&ViewNode> {
        self.mounted.iter().find_map(|t| t.find_marker(marker))
    }

    /// Off-screen containers currently alive on this stage.
    pub fn offscreen_count(&self) -> usize {
        self.offscreen.get()
    }
}

/// A detached clone of a captured tree, sized to the page width. Removed
/// from the stage when dropped.
pub struct OffscreenContainer<'s> {
    stage: &'s Stage,
    tree: ViewNode,
    width: f32,
}

impl<'s> OffscreenContainer<'s> {
    pub fn mount(stage: &'s Stage, tree: ViewNode, width: f32) -> Self {
        stage.offscreen.set(stage.offscreen.get() + 1);
        Self { stage, tree, width }
    }

    pub fn tree(&self) -> &ViewNode {
        &self.tree
    }

    pub fn width(&self) -> f32 {
        self.width
    }
}

impl Drop for OffscreenContainer<'_> {
    fn drop(&mut self) {
        self.stage.offscreen.set(self.stage.offscreen.get().saturating_sub(1));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportState {
    #[default]
    Idle,
    Capturing,
    Rasterizing,
    Fitting,
    Emitting,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub marker: String,
    pub filename: String,
    pub title: String,
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    /// Device pixels per CSS px.
    pub scale: f32,
    pub single_page: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            marker: DEFAULT_ROOT_MARKER.to_string(),
            filename: "cv.pdf".to_string(),
            title: "Curriculum Vitae".to_string(),
            page_width_pt: A4_WIDTH_PT,
            page_height_pt: A4_HEIGHT_PT,
            scale: 2.0,
            single_page: false,
        }
    }
}

/// A finished export, ready to be offered for download.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub pages: Vec<PagePlacement>,
    pub bitmap_width: u32,
    pub bitmap_height: u32,
}

impl ExportArtifact {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Write the PDF into `dir` under its filename.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let name = Path::new(&self.filename);
        if name.file_name() != Some(name.as_os_str()) {
            return Err(Error::Validation {
                field: "filename",
                message: format!("`{}` is not a plain file name", self.filename),
            });
        }
        let path = dir.as_ref().join(name);
        fs::write(&path, &self.bytes)?;
        log::info!("wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

pub struct Exporter {
    fonts: FontManager,
    state: ExportState,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(FontManager::default())
    }
}

impl Exporter {
    pub fn new(fonts: FontManager) -> Self {
        Self {
            fonts,
            state: ExportState::Idle,
        }
    }

    pub fn state(&self) -> &ExportState {
        &self.state
    }

    pub fn fonts(&self) -> &FontManager {
        &self.fonts
    }

    /// Run one export against whatever is mounted on `stage`.
    ///
    /// On failure the state becomes [`ExportState::Failed`] and nothing is
    /// emitted; the stage is left as it was.
    pub fn export(&mut self, stage: &Stage, options: &ExportOptions) -> Result<ExportArtifact> {
        match self.run(stage, options) {
            Ok(artifact) => {
                self.state = ExportState::Idle;
                Ok(artifact)
            }
            Err(e) => {
                log::warn!("export failed: {e}");
                self.state = ExportState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    fn enter(&mut self, state: ExportState) {
        log::debug!("export: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn run(&mut self, stage: &Stage, options: &ExportOptions) -> Result<ExportArtifact> {
        self.enter(ExportState::Capturing);
        let captured = stage
            .find(&options.marker)
            .ok_or_else(|| Error::ElementNotFound(options.marker.clone()))?;

        self.enter(ExportState::Rasterizing);
        let bitmap = self.rasterize(stage, captured, options)?;

        self.enter(ExportState::Fitting);
        let plan = pagination::fit(
            bitmap.width(),
            bitmap.height(),
            options.page_width_pt,
            options.page_height_pt,
            options.single_page,
        )?;

        self.enter(ExportState::Emitting);
        let bytes = emit::emit_pdf(&bitmap, &plan, &options.title)?;

        Ok(ExportArtifact {
            filename: options.filename.clone(),
            bytes,
            pages: plan.pages,
            bitmap_width: bitmap.width(),
            bitmap_height: bitmap.height(),
        })
    }

    fn rasterize(&self, stage: &Stage, captured: &ViewNode, options: &ExportOptions) -> Result<RgbaImage> {
        let container = OffscreenContainer::mount(stage, captured.clone(), options.page_width_pt * PX_PER_PT);
        let laid_out = layout::compute_layout(container.tree(), container.width(), &self.fonts)?;
        raster::rasterize(&laid_out, &self.fonts, options.scale)
    }
}
