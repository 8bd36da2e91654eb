//! Rasterizer – paints a laid-out box tree into an RGBA bitmap.
//!
//! Coordinates are CSS px multiplied by the export `scale`. Text uses
//! ab_glyph outlines when the font manager holds real font bytes, and
//! flat ink bars of the measured line width otherwise, so bitmaps stay
//! deterministic on machines without fonts.

use ab_glyph::{FontRef, PxScale};
use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use image::{imageops, DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut,
    draw_polygon_mut, draw_text_mut,
};
use imageproc::point::Point;
use imageproc::rect::Rect;

use crate::error::{Error, Result};
use crate::fonts::{FontKey, FontManager};
use crate::layout::{BoxContent, PositionedBox};
use crate::style::{Color, ComputedStyle, FontStyle, FontWeight, TextAlign, TextDecoration};
use crate::view::GlyphShape;

/// Largest accepted bitmap edge, in pixels.
pub const MAX_BITMAP_EDGE: u32 = 20_000;
/// Largest accepted bitmap area, in pixels.
pub const MAX_BITMAP_PIXELS: u64 = 120_000_000;

/// Decode a `data:<mime>;base64,<data>` URI into an image.
pub fn decode_data_uri(src: &str) -> Result<DynamicImage> {
    let invalid = |message: String| Error::Validation {
        field: "photo",
        message,
    };
    let rest = src
        .strip_prefix("data:")
        .ok_or_else(|| invalid("image source must be a base64 data URI".into()))?;
    let comma = rest
        .find(',')
        .ok_or_else(|| invalid("data URI is missing the `,` separator".into()))?;
    if !rest[..comma].contains(";base64") {
        return Err(invalid("only base64 data URIs are supported".into()));
    }
    let bytes = BASE64_STD
        .decode(rest[comma + 1..].trim())
        .map_err(|e| invalid(format!("base64 decode error: {e}")))?;
    image::load_from_memory(&bytes).map_err(|e| invalid(format!("image decode error: {e}")))
}

/// Paint `root` into a new bitmap at `scale` device pixels per CSS px.
pub fn rasterize(root: &PositionedBox, fonts: &FontManager, scale: f32) -> Result<RgbaImage> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::Rasterization(format!("invalid scale {scale}")));
    }
    let w = (root.width * scale).ceil();
    let h = (root.height * scale).ceil();
    if !(w >= 1.0 && h >= 1.0) {
        return Err(Error::Rasterization(format!(
            "nothing to draw: content is {}x{} px",
            root.width, root.height
        )));
    }
    if w > MAX_BITMAP_EDGE as f32 || h > MAX_BITMAP_EDGE as f32 || (w as u64) * (h as u64) > MAX_BITMAP_PIXELS {
        return Err(Error::Rasterization(format!(
            "bitmap of {w}x{h} px exceeds the canvas limit"
        )));
    }

    if !fonts.has_real_fonts() {
        log::warn!("no TTF loaded; text is drawn as placeholder bars");
    }
    let mut canvas = RgbaImage::from_pixel(w as u32, h as u32, Rgba([255, 255, 255, 255]));
    let mut painter = Painter {
        canvas: &mut canvas,
        fonts,
        scale,
    };
    painter.paint(root);
    log::debug!("rasterized {}x{} px at scale {scale}", w as u32, h as u32);
    Ok(canvas)
}

struct Painter<'a> {
    canvas: &'a mut RgbaImage,
    fonts: &'a FontManager,
    scale: f32,
}

fn rgba(c: Color) -> Rgba<u8> {
    Rgba(c.to_rgba8())
}

impl Painter<'_> {
    fn px(&self, v: f32) -> i32 {
        (v * self.scale).round() as i32
    }

    fn len(&self, v: f32) -> u32 {
        (v * self.scale).round().max(0.0) as u32
    }

    fn paint(&mut self, b: &PositionedBox) {
        let s = &b.style;
        let (x, y, w, h) = (self.px(b.x), self.px(b.y), self.len(b.width), self.len(b.height));

        if !s.background_color.is_transparent() {
            fill_rounded(self.canvas, x, y, w, h, self.len(s.corner_radius), rgba(s.background_color));
        }
        if s.border_width > 0.0 && !s.border_color.is_transparent() {
            let t = self.len(s.border_width).max(1);
            for i in 0..t {
                let inset = i as i32;
                let (iw, ih) = (w.saturating_sub(2 * i), h.saturating_sub(2 * i));
                if iw > 0 && ih > 0 {
                    draw_hollow_rect_mut(
                        self.canvas,
                        Rect::at(x + inset, y + inset).of_size(iw, ih),
                        rgba(s.border_color),
                    );
                }
            }
        }
        if s.border_left_width > 0.0 && !s.border_left_color.is_transparent() {
            let bx = x + self.px(s.border_width);
            fill_rect(self.canvas, bx, y, self.len(s.border_left_width).max(1), h, rgba(s.border_left_color));
        }

        match &b.content {
            BoxContent::None => {}
            BoxContent::Text { lines, line_widths } => self.paint_text(b, lines, line_widths),
            BoxContent::Image { src } => self.paint_image(b, src),
            BoxContent::Glyph { shape, color, .. } => self.paint_glyph(x, y, w.min(h), *shape, *color),
        }

        for child in &b.children {
            self.paint(child);
        }
    }

    fn paint_text(&mut self, b: &PositionedBox, lines: &[String], widths: &[f32]) {
        let s = &b.style;
        let line_h = self.fonts.line_height_px(s.font_size, s.line_height);
        let key = FontKey::new(
            &s.font_family,
            s.font_weight == FontWeight::Bold,
            s.font_style == FontStyle::Italic,
        );
        let outline = self
            .fonts
            .font_bytes(&key)
            .and_then(|bytes| FontRef::try_from_slice(bytes).ok());
        let color = rgba(s.color);

        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let lw = widths.get(i).copied().unwrap_or(0.0);
            // The last line of a paragraph stays ragged.
            let ragged = lines.get(i + 1).map_or(true, |next| next.is_empty());
            let runs = if s.text_align == TextAlign::Justify && !ragged {
                self.justified_runs(line, b.width, s)
            } else {
                let dx = match s.text_align {
                    TextAlign::Center => ((b.width - lw) / 2.0).max(0.0),
                    TextAlign::Right => (b.width - lw).max(0.0),
                    TextAlign::Left | TextAlign::Justify => 0.0,
                };
                vec![(dx, line.as_str(), lw)]
            };
            let top = b.y + i as f32 * line_h;
            let glyph_top = self.px(top + (line_h - s.font_size) / 2.0);

            for (dx, run, run_w) in &runs {
                let rx = self.px(b.x + dx);
                match &outline {
                    Some(font) => draw_text_mut(
                        self.canvas,
                        color,
                        rx,
                        glyph_top,
                        PxScale::from(s.font_size * self.scale),
                        font,
                        run,
                    ),
                    None => {
                        let bar_h = self.len(s.font_size * 0.45).max(1);
                        let bar_top = self.px(top + (line_h - s.font_size * 0.45) / 2.0);
                        fill_rect(self.canvas, rx, bar_top, self.len(*run_w).max(1), bar_h, color);
                    }
                }
            }
            if s.text_decoration == TextDecoration::Underline {
                let (start, end) = match (runs.first(), runs.last()) {
                    (Some(first), Some(last)) => (first.0, last.0 + last.2),
                    _ => continue,
                };
                let uy = self.px(top + (line_h + s.font_size) / 2.0) as f32;
                draw_line_segment_mut(
                    self.canvas,
                    (self.px(b.x + start) as f32, uy),
                    (self.px(b.x + end) as f32, uy),
                    color,
                );
            }
        }
    }

    /// Split `line` into words spaced so the last one ends at `width`.
    /// Returns `(offset, word, word_width)` per word.
    fn justified_runs<'l>(&self, line: &'l str, width: f32, s: &ComputedStyle) -> Vec<(f32, &'l str, f32)> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let word_widths: Vec<f32> = words
            .iter()
            .map(|w| {
                self.fonts.measure_text_width(
                    w,
                    s.font_size,
                    s.font_weight == FontWeight::Bold,
                    s.font_style == FontStyle::Italic,
                    &s.font_family,
                )
            })
            .collect();
        let gaps = words.len().saturating_sub(1).max(1) as f32;
        let gap = ((width - word_widths.iter().sum::<f32>()) / gaps).max(0.0);

        let mut x = 0.0;
        words
            .into_iter()
            .zip(word_widths)
            .map(|(word, w)| {
                let run = (x, word, w);
                x += w + gap;
                run
            })
            .collect()
    }

    fn paint_image(&mut self, b: &PositionedBox, src: &str) {
        let (x, y, w, h) = (self.px(b.x), self.px(b.y), self.len(b.width), self.len(b.height));
        if w == 0 || h == 0 {
            return;
        }
        let radius = self.len(b.style.corner_radius);
        match decode_data_uri(src) {
            Ok(img) => {
                let mut scaled = imageops::resize(&img.to_rgba8(), w, h, imageops::FilterType::Triangle);
                if radius > 0 {
                    for (px, py, pixel) in scaled.enumerate_pixels_mut() {
                        if !rounded_contains(px, py, w, h, radius) {
                            pixel.0[3] = 0;
                        }
                    }
                }
                imageops::overlay(self.canvas, &scaled, i64::from(x), i64::from(y));
            }
            Err(e) => {
                log::warn!("photo could not be drawn, using placeholder: {e}");
                fill_rounded(self.canvas, x, y, w, h, radius, rgba(Color::NEUTRAL));
            }
        }
    }

    /// Filled and unfilled glyphs share a shape; the renderer already chose
    /// the neutral color for unfilled ones.
    fn paint_glyph(&mut self, x: i32, y: i32, size: u32, shape: GlyphShape, color: Color) {
        if size == 0 {
            return;
        }
        let r = size as f32 / 2.0;
        let (cx, cy) = (x as f32 + r, y as f32 + r);
        let ink = rgba(color);
        // Tiny stars degenerate; draw them as dots.
        if shape == GlyphShape::Dot || size < 4 {
            draw_filled_circle_mut(self.canvas, (cx as i32, cy as i32), r.floor() as i32, ink);
        } else {
            draw_polygon_mut(self.canvas, &star_points(cx, cy, r, r * 0.45), ink);
        }
    }
}

fn fill_rect(canvas: &mut RgbaImage, x: i32, y: i32, w: u32, h: u32, color: Rgba<u8>) {
    if w > 0 && h > 0 {
        draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(w, h), color);
    }
}

fn fill_rounded(canvas: &mut RgbaImage, x: i32, y: i32, w: u32, h: u32, radius: u32, color: Rgba<u8>) {
    if w == 0 || h == 0 {
        return;
    }
    let r = radius.min(w / 2).min(h / 2);
    if r == 0 {
        fill_rect(canvas, x, y, w, h, color);
        return;
    }
    let ri = r as i32;
    fill_rect(canvas, x + ri, y, w - 2 * r, h, color);
    fill_rect(canvas, x, y + ri, r, h - 2 * r, color);
    fill_rect(canvas, x + w as i32 - ri, y + ri, r, h - 2 * r, color);
    let (right, bottom) = (x + w as i32 - ri - 1, y + h as i32 - ri - 1);
    for (cx, cy) in [(x + ri, y + ri), (right, y + ri), (x + ri, bottom), (right, bottom)] {
        draw_filled_circle_mut(canvas, (cx, cy), ri, color);
    }
}

/// Whether pixel `(px, py)` lies inside a `w`×`h` rectangle with corner radius `r`.
fn rounded_contains(px: u32, py: u32, w: u32, h: u32, r: u32) -> bool {
    let r = r.min(w / 2).min(h / 2) as f32;
    let (fx, fy) = (px as f32 + 0.5, py as f32 + 0.5);
    let cx = fx.clamp(r, w as f32 - r);
    let cy = fy.clamp(r, h as f32 - r);
    let (dx, dy) = (fx - cx, fy - cy);
    dx * dx + dy * dy <= r * r
}

/// Five-pointed star, first point at the top, alternating outer/inner radius.
fn star_points(cx: f32, cy: f32, outer: f32, inner: f32) -> Vec<Point<i32>> {
    (0..10)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = -std::f32::consts::FRAC_PI_2 + i as f32 * std::f32::consts::PI / 5.0;
            Point::new(
                (cx + radius * angle.cos()).round() as i32,
                (cy + radius * angle.sin()).round() as i32,
            )
        })
        .collect()
}

/// Rough share of non-white pixels; used to check that something was drawn.
pub fn ink_coverage(img: &RgbaImage) -> f32 {
    let total = (img.width() as u64 * img.height() as u64).max(1);
    let inked = img.pixels().filter(|p| p.0 != [255, 255, 255, 255]).count() as u64;
    inked as f32 / total as f32
}
