//! Pagination – fits a rendered bitmap onto fixed-size pages.
//!
//! The bitmap is always scaled to the page width first. Then either:
//! - single-page mode shrinks it uniformly until it fits, centered
//!   horizontally and never cropped, or
//! - multi-page mode cuts it into page-height bands that tile the image
//!   exactly, the last band possibly shorter.
//!
//! All page-space values are in points with the origin at the top-left.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A4 portrait, in points.
pub const A4_WIDTH_PT: f32 = 595.28;
pub const A4_HEIGHT_PT: f32 = 841.89;
/// US Letter portrait, in points.
pub const LETTER_WIDTH_PT: f32 = 612.0;
pub const LETTER_HEIGHT_PT: f32 = 792.0;

/// Slack for float noise when counting pages.
const PAGE_EPSILON: f64 = 1e-6;

/// Rows of the source bitmap shown on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSlice {
    pub src_y: u32,
    pub src_height: u32,
}

/// Where a slice lands on its page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePlacement {
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub slice: PageSlice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitPlan {
    pub page_width: f32,
    pub page_height: f32,
    /// Height of the bitmap once scaled to the page width.
    pub scaled_height: f32,
    pub single_page: bool,
    pub pages: Vec<PagePlacement>,
}

impl FitPlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Compute page placements for a `bitmap_w`×`bitmap_h` image.
pub fn fit(bitmap_w: u32, bitmap_h: u32, page_w: f32, page_h: f32, single_page: bool) -> Result<FitPlan> {
    if bitmap_w == 0 || bitmap_h == 0 {
        return Err(Error::Rasterization(format!(
            "cannot fit an empty {bitmap_w}x{bitmap_h} bitmap"
        )));
    }
    if !(page_w > 0.0 && page_h > 0.0) || !page_w.is_finite() || !page_h.is_finite() {
        return Err(Error::Validation {
            field: "page",
            message: format!("invalid page size {page_w}x{page_h}"),
        });
    }

    let (pw, ph) = (page_w as f64, page_h as f64);
    let height = pw * bitmap_h as f64 / bitmap_w as f64;
    let whole = PageSlice {
        src_y: 0,
        src_height: bitmap_h,
    };

    let pages = if height <= ph + PAGE_EPSILON {
        vec![PagePlacement {
            index: 0,
            x: 0.0,
            y: 0.0,
            width: page_w,
            height: height as f32,
            slice: whole,
        }]
    } else if single_page {
        let k = ph / height;
        let width = pw * k;
        vec![PagePlacement {
            index: 0,
            x: ((pw - width) / 2.0) as f32,
            y: 0.0,
            width: width as f32,
            height: page_h,
            slice: whole,
        }]
    } else {
        bands(bitmap_h, pw, ph, height)
    };

    log::debug!(
        "fit {bitmap_w}x{bitmap_h} px onto {} page(s) of {page_w}x{page_h} pt",
        pages.len()
    );
    Ok(FitPlan {
        page_width: page_w,
        page_height: page_h,
        scaled_height: height as f32,
        single_page,
        pages,
    })
}

/// Page-height bands tiling `height`; pixel rows are rounded band
/// boundaries so the slices sum to the bitmap height exactly.
fn bands(bitmap_h: u32, pw: f64, ph: f64, height: f64) -> Vec<PagePlacement> {
    let count = ((height / ph) - PAGE_EPSILON).ceil().max(1.0) as usize;
    let row_of = |pt: f64| ((pt / height) * bitmap_h as f64).round() as u32;

    let mut pages: Vec<PagePlacement> = Vec::with_capacity(count);
    for i in 0..count {
        let start = i as f64 * ph;
        let end = ((i + 1) as f64 * ph).min(height);
        let r0 = row_of(start);
        let r1 = if i + 1 == count { bitmap_h } else { row_of(end) };
        if r1 <= r0 {
            // Sub-row sliver: its rows already end the previous band.
            continue;
        }
        pages.push(PagePlacement {
            index: pages.len(),
            x: 0.0,
            y: 0.0,
            width: pw as f32,
            height: (end - start) as f32,
            slice: PageSlice {
                src_y: r0,
                src_height: r1 - r0,
            },
        });
    }
    pages
}
