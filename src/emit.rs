//! PDF assembly – one image XObject per page, cut from the rendered bitmap
//! according to a [`FitPlan`], using `printpdf` (v0.8 ops-based API).

use image::{imageops, RgbaImage};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData, RawImageFormat,
    XObjectTransform,
};

use crate::error::{Error, Result};
use crate::pagination::{FitPlan, PagePlacement};

const PT_TO_MM: f32 = 0.352778;

/// Render the pages of `plan` into PDF bytes.
pub fn emit_pdf(bitmap: &RgbaImage, plan: &FitPlan, title: &str) -> Result<Vec<u8>> {
    if plan.pages.is_empty() {
        return Err(Error::Rasterization("fit plan has no pages".into()));
    }
    let page_w = Mm(plan.page_width * PT_TO_MM);
    let page_h = Mm(plan.page_height * PT_TO_MM);

    let mut doc = PdfDocument::new(title);
    let mut pages = Vec::with_capacity(plan.pages.len());

    for placement in &plan.pages {
        let raw = slice_to_raw(bitmap, placement)?;
        let (px_w, px_h) = (raw.width as f32, raw.height as f32);
        let xobj_id = doc.add_image(&raw);

        // PDF origin is bottom-left; placements are top-left.
        let bottom = plan.page_height - placement.y - placement.height;
        // At dpi=72 printpdf renders 1 px = 1 pt, so scale = desired_pt / px.
        let ops = vec![Op::UseXobject {
            id: xobj_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(placement.x)),
                translate_y: Some(Pt(bottom)),
                dpi: Some(72.0),
                scale_x: Some(placement.width / px_w),
                scale_y: Some(placement.height / px_h),
                rotate: None,
            },
        }];
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    doc.with_pages(pages);
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        log::debug!("printpdf reported {} warning(s)", warnings.len());
    }
    log::info!("emitted {} page(s), {} bytes", plan.pages.len(), bytes.len());
    Ok(bytes)
}

/// Crop the rows of one page and flatten them onto white RGB.
fn slice_to_raw(bitmap: &RgbaImage, placement: &PagePlacement) -> Result<RawImage> {
    let slice = placement.slice;
    if slice.src_height == 0 || slice.src_y + slice.src_height > bitmap.height() {
        return Err(Error::Rasterization(format!(
            "page {} slice {}+{} is outside the {}px bitmap",
            placement.index,
            slice.src_y,
            slice.src_height,
            bitmap.height()
        )));
    }
    let band = imageops::crop_imm(bitmap, 0, slice.src_y, bitmap.width(), slice.src_height).to_image();

    let mut rgb = Vec::with_capacity(band.len() / 4 * 3);
    for p in band.pixels() {
        let [r, g, b, a] = p.0;
        let over_white = |c: u8| ((c as u16 * a as u16 + 255 * (255 - a as u16)) / 255) as u8;
        rgb.extend_from_slice(&[over_white(r), over_white(g), over_white(b)]);
    }

    Ok(RawImage {
        pixels: RawImageData::U8(rgb),
        width: band.width() as usize,
        height: band.height() as usize,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{fit, A4_HEIGHT_PT, A4_WIDTH_PT};
    use image::Rgba;

    #[test]
    fn one_pdf_page_per_placement() {
        let bitmap = RgbaImage::from_pixel(100, 300, Rgba([10, 20, 30, 255]));
        let plan = fit(100, 300, A4_WIDTH_PT, A4_HEIGHT_PT, false).unwrap();
        assert_eq!(plan.page_count(), 3);
        let bytes = emit_pdf(&bitmap, &plan, "cv").unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn out_of_range_slice_is_an_error() {
        let bitmap = RgbaImage::new(10, 10);
        let mut plan = fit(10, 10, A4_WIDTH_PT, A4_HEIGHT_PT, false).unwrap();
        plan.pages[0].slice.src_height = 20;
        assert!(emit_pdf(&bitmap, &plan, "cv").is_err());
    }
}
