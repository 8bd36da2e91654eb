//! Font registry and text measurement.
//!
//! Without a loaded TTF the manager answers with Helvetica-like heuristic
//! metrics so layout stays deterministic. Once real font bytes are loaded
//! (`ttf-parser` for metrics) widths come from `rustybuzz` shaping and the
//! rasterizer draws actual outlines.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes; empty for the synthetic fallback.
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    pub line_gap: f32,
}

static HEURISTIC: FontData = FontData {
    bytes: Vec::new(),
    units_per_em: 1000.0,
    ascender: 750.0,
    descender: -250.0,
    line_gap: 0.0,
};

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            bold,
            italic,
        }
    }
}

/// Manages loaded fonts.
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    /// Used for any family/weight that was never loaded.
    default_key: FontKey,
}

impl FontManager {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            default_key: FontKey::new("Helvetica", false, false),
        }
    }

    /// Manager whose default face is the TTF/OTF at `path`.
    pub fn with_font_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let family = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("custom")
            .to_string();
        let mut mgr = Self::default();
        mgr.load_font(&family, false, false, bytes)?;
        log::info!("loaded font {} from {}", family, path.display());
        Ok(mgr)
    }

    /// Load a TTF/OTF font from bytes. The first real font loaded becomes
    /// the default face and replaces the heuristic entries, so every
    /// family that was never loaded resolves to it.
    pub fn load_font(&mut self, family: &str, bold: bool, italic: bool, bytes: Vec<u8>) -> Result<()> {
        let face = ttf_parser::Face::parse(&bytes, 0).map_err(|e| Error::Validation {
            field: "font",
            message: format!("failed to parse font: {e}"),
        })?;

        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            line_gap: face.line_gap() as f32,
            bytes,
        };

        let key = FontKey::new(family, bold, italic);
        if !self.has_real_fonts() {
            self.fonts.retain(|_, d| !d.bytes.is_empty());
            self.default_key = key.clone();
        }
        self.fonts.insert(key, data);
        Ok(())
    }

    /// Register synthetic Helvetica metrics when nothing is loaded yet.
    pub fn ensure_default(&mut self) {
        if self.fonts.is_empty() {
            for bold in [false, true] {
                self.fonts
                    .insert(FontKey::new("Helvetica", bold, false), HEURISTIC.clone());
            }
            self.default_key = FontKey::new("Helvetica", false, false);
        }
    }

    /// Font data for a key, falling back to the default face.
    pub fn get(&self, key: &FontKey) -> &FontData {
        self.fonts
            .get(key)
            .or_else(|| self.fonts.get(&self.default_key))
            .unwrap_or(&HEURISTIC)
    }

    /// Width of `text` at `font_size` px.
    ///
    /// Real fonts are shaped with rustybuzz so kerning and ligatures count.
    /// The heuristic uses 0.5 × font_size per char (0.55 when bold).
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        let data = self.get(&FontKey::new(family, bold, italic));

        if data.bytes.is_empty() {
            let avg = if bold { 0.55 } else { 0.5 };
            return text.chars().count() as f32 * font_size * avg;
        }

        match rustybuzz::Face::from_slice(&data.bytes, 0) {
            Some(face) => {
                let mut buffer = rustybuzz::UnicodeBuffer::new();
                buffer.push_str(text);
                let shaped = rustybuzz::shape(&face, &[], buffer);
                let units: i32 = shaped.glyph_positions().iter().map(|p| p.x_advance).sum();
                units as f32 * font_size / data.units_per_em
            }
            None => text.chars().count() as f32 * font_size * 0.5,
        }
    }

    pub fn line_height_px(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    /// Whether the default face has real outlines.
    pub fn has_real_fonts(&self) -> bool {
        self.fonts
            .get(&self.default_key)
            .map(|d| !d.bytes.is_empty())
            .unwrap_or(false)
    }

    /// Outline bytes for a face, resolved like [`FontManager::get`].
    pub fn font_bytes(&self, key: &FontKey) -> Option<&[u8]> {
        let data = self.get(key);
        if data.bytes.is_empty() {
            None
        } else {
            Some(data.bytes.as_slice())
        }
    }
}

impl Default for FontManager {
    fn default() -> Self {
        let mut mgr = Self::new();
        mgr.ensure_default();
        mgr
    }
}

/// A TTF usable in tests: `CVFORGE_TEST_FONT`, a common system font, or
/// the fonts printpdf ships in its package sources.
#[cfg(test)]
pub(crate) fn find_test_font() -> Option<std::path::PathBuf> {
    use std::path::PathBuf;

    if let Some(p) = std::env::var_os("CVFORGE_TEST_FONT") {
        return Some(PathBuf::from(p));
    }
    const SYSTEM: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];
    if let Some(p) = SYSTEM.iter().map(PathBuf::from).find(|p| p.is_file()) {
        return Some(p);
    }
    let cargo_home = std::env::var_os("CARGO_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cargo")))?;
    let registries = fs::read_dir(cargo_home.join("registry").join("src")).ok()?;
    registries
        .flatten()
        .filter_map(|index| fs::read_dir(index.path()).ok())
        .flat_map(|packages| packages.flatten())
        .filter(|pkg| pkg.file_name().to_string_lossy().starts_with("printpdf-"))
        .map(|pkg| pkg.path().join("examples/assets/fonts/RobotoMedium.ttf"))
        .find(|p| p.is_file())
}

/// Word-wrap text to fit within `max_width` pixels.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    italic: bool,
    family: &str,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in &words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current_line, word)
            };
            let w = fonts.measure_text_width(&candidate, font_size, bold, italic, family);
            if w > max_width && !current_line.is_empty() {
                lines.push(current_line);
                current_line = word.to_string();
            } else {
                current_line = candidate;
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::default();
        let w = mgr.measure_text_width("Hello", 16.0, false, false, "Helvetica");
        // 5 chars × 16 × 0.5 = 40
        assert!((w - 40.0).abs() < 0.1);
        let bold = mgr.measure_text_width("Hello", 16.0, true, false, "Helvetica");
        assert!(bold > w);
    }

    #[test]
    fn unknown_family_falls_back() {
        let mgr = FontManager::default();
        let a = mgr.measure_text_width("abc", 10.0, false, false, "Georgia");
        let b = mgr.measure_text_width("abc", 10.0, false, false, "Helvetica");
        assert_eq!(a, b);
        assert!(!mgr.has_real_fonts());
        assert!(mgr.font_bytes(&FontKey::new("Georgia", false, false)).is_none());
    }

    #[test]
    fn empty_manager_still_measures() {
        let mgr = FontManager::new();
        assert_eq!(mgr.measure_text_width("ab", 10.0, false, false, "x"), 10.0);
    }

    #[test]
    fn garbage_font_is_rejected() {
        let mut mgr = FontManager::default();
        assert!(mgr.load_font("Bad", false, false, vec![0, 1, 2, 3]).is_err());
        assert!(!mgr.has_real_fonts());
    }

    #[test]
    fn loaded_font_replaces_heuristic_faces() {
        let Some(path) = find_test_font() else {
            eprintln!("no TTF available, skipping");
            return;
        };
        let mgr = FontManager::with_font_file(&path).unwrap();
        assert!(mgr.has_real_fonts());
        for bold in [false, true] {
            for italic in [false, true] {
                let key = FontKey::new("Helvetica", bold, italic);
                assert!(mgr.font_bytes(&key).is_some(), "{key:?} has no outlines");
            }
        }
        // Measured by shaping, not by the 0.5 × size heuristic.
        let w = mgr.measure_text_width("iiii", 20.0, false, false, "Helvetica");
        assert_ne!(w, 40.0);
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = FontManager::default();
        let lines = wrap_text("Hello world foo bar", 16.0, false, false, "Helvetica", 60.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
    }
}
