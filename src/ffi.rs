//! C-compatible FFI API for cross-language bindings.
//!
//! # ABI Contract
//!
//! All exported functions use `extern "C"` calling convention and `#[no_mangle]`
//! to ensure stable symbol names.
//!
//! ## Memory management
//! - Buffers returned by `cvf_*` functions are allocated on the Rust heap.
//! - Callers **must** free them with `cvf_free_buffer` / `cvf_free_string`.
//! - Passing a null pointer to a free function is a no-op.
//!
//! ## Error handling
//! - Functions that can fail return a `c_int`:
//!   `0` success, `1` null pointer, `2` invalid UTF-8, `3` invalid JSON,
//!   `4` export failure.
//! - Error details can be retrieved via `cvf_last_error`.
//!
//! ## Thread safety
//! - `cvf_last_error` uses a thread-local, so it is safe to call from
//!   multiple threads.
//!
//! ## Usage from Go (cgo)
//! ```go
//! // #cgo LDFLAGS: -lcv_forge
//! // #include "cvforge.h"
//! import "C"
//! ```

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::slice;

use crate::cv_data::CvData;
use crate::document::TemplateDocument;
use crate::pipeline::{compute_plan, generate_cv_pdf, PageOrientation, PipelineConfig};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

const RC_NULL: c_int = 1;
const RC_UTF8: c_int = 2;
const RC_JSON: c_int = 3;
const RC_EXPORT: c_int = 4;

// ---------------------------------------------------------------------------
// C-compatible configuration types
// ---------------------------------------------------------------------------

/// Page orientation for use in [`CvfExportConfig`].
#[repr(C)]
pub enum CvfPageOrientation {
    /// Portrait mode: height > width (default).
    Portrait = 0,
    /// Landscape mode: width > height.
    Landscape = 1,
}

/// Optional export configuration.
///
/// Fields set to `0` (or `NULL`) fall back to their defaults:
/// - `page_width`  → 595.28 pt (A4)
/// - `page_height` → 841.89 pt (A4)
/// - `scale`       → 2.0
/// - `title`       → "Curriculum Vitae"
/// - `language`    → "en"
#[repr(C)]
pub struct CvfExportConfig {
    /// Null-terminated UTF-8 document title embedded in PDF metadata.
    pub title: *const c_char,
    /// Null-terminated language tag of the CV data (`"en"`, `"ar"`, …).
    pub language: *const c_char,
    /// Page width in points.
    pub page_width: f32,
    /// Page height in points.
    pub page_height: f32,
    /// Device pixels per CSS px.
    pub scale: f32,
    /// Non-zero squeezes the CV onto one page.
    pub single_page: c_int,
    pub orientation: CvfPageOrientation,
}

/// # Safety
/// String fields of `cfg`, if non-null, must be valid null-terminated strings.
unsafe fn pipeline_config_from_c(cfg: &CvfExportConfig) -> PipelineConfig {
    let defaults = PipelineConfig::default();
    let string_or = |p: *const c_char, fallback: &str| {
        if p.is_null() {
            fallback.to_string()
        } else {
            CStr::from_ptr(p).to_str().unwrap_or(fallback).to_string()
        }
    };
    let or_default = |v: f32, d: f32| if v > 0.0 { v } else { d };

    PipelineConfig {
        title: string_or(cfg.title, &defaults.title),
        language: string_or(cfg.language, &defaults.language),
        page_width: or_default(cfg.page_width, defaults.page_width),
        page_height: or_default(cfg.page_height, defaults.page_height),
        scale: or_default(cfg.scale, defaults.scale),
        single_page: cfg.single_page != 0,
        orientation: match cfg.orientation {
            CvfPageOrientation::Portrait => PageOrientation::Portrait,
            CvfPageOrientation::Landscape => PageOrientation::Landscape,
        },
        ..defaults
    }
}

/// # Safety
/// `cfg`, if non-null, must point to a valid [`CvfExportConfig`].
unsafe fn config_or_default(cfg: *const CvfExportConfig) -> PipelineConfig {
    if cfg.is_null() {
        PipelineConfig::default()
    } else {
        pipeline_config_from_c(&*cfg)
    }
}

/// # Safety
/// `ptr` must point to `len` readable bytes.
unsafe fn utf8_arg<'a>(ptr: *const u8, len: u32, what: &str) -> Result<&'a str, c_int> {
    let bytes = slice::from_raw_parts(ptr, len as usize);
    std::str::from_utf8(bytes).map_err(|e| {
        set_last_error(&format!("Invalid UTF-8 in {what}: {e}"));
        RC_UTF8
    })
}

fn template_arg(json: &str) -> Result<TemplateDocument, c_int> {
    TemplateDocument::from_json(json).map_err(|e| {
        set_last_error(&format!("Invalid template JSON: {e}"));
        RC_JSON
    })
}

fn into_c_string(s: String, out: *mut *mut c_char) -> c_int {
    match CString::new(s) {
        Ok(cs) => {
            // SAFETY: callers checked `out` for null.
            unsafe { *out = cs.into_raw() };
            0
        }
        Err(_) => {
            set_last_error("JSON contained null byte");
            RC_JSON
        }
    }
}

// ---------------------------------------------------------------------------
// Core API
// ---------------------------------------------------------------------------

/// Export a CV to PDF.
///
/// # Parameters
/// - `template_ptr`, `template_len`: template document JSON (UTF-8)
/// - `cv_ptr`, `cv_len`: CV data JSON (UTF-8)
/// - `cfg`: optional [`CvfExportConfig`]; pass `NULL` for defaults
/// - `out_buf`, `out_len`: on success, the heap-allocated PDF bytes
///
/// # Returns
/// `0` on success, non-zero on error. On error, call `cvf_last_error`.
///
/// # Safety
/// - `template_ptr` / `cv_ptr` must point to the given number of bytes.
/// - `cfg`, if non-null, must be a valid [`CvfExportConfig`].
/// - The caller must free `*out_buf` by calling `cvf_free_buffer`.
#[no_mangle]
pub unsafe extern "C" fn cvf_export_pdf(
    template_ptr: *const u8,
    template_len: u32,
    cv_ptr: *const u8,
    cv_len: u32,
    cfg: *const CvfExportConfig,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
) -> c_int {
    if template_ptr.is_null() || cv_ptr.is_null() || out_buf.is_null() || out_len.is_null() {
        set_last_error("Null pointer argument");
        return RC_NULL;
    }

    let template = match utf8_arg(template_ptr, template_len, "template").and_then(template_arg) {
        Ok(t) => t,
        Err(rc) => return rc,
    };
    let cv = match utf8_arg(cv_ptr, cv_len, "CV data") {
        Ok(s) => match CvData::from_json(s) {
            Ok(cv) => cv,
            Err(e) => {
                set_last_error(&format!("Invalid CV JSON: {e}"));
                return RC_JSON;
            }
        },
        Err(rc) => return rc,
    };

    match generate_cv_pdf(&template, &cv, &config_or_default(cfg)) {
        Ok(artifact) => {
            let len = artifact.bytes.len() as u32;
            let buf = artifact.bytes.into_boxed_slice();
            *out_buf = Box::into_raw(buf) as *mut u8;
            *out_len = len;
            0
        }
        Err(e) => {
            set_last_error(&e.user_message());
            RC_EXPORT
        }
    }
}

/// Compute only the render plan (regions and header placement). Returns JSON.
///
/// # Safety
/// Same as `cvf_export_pdf`. `*out_json_ptr` must be freed with
/// `cvf_free_string`.
#[no_mangle]
pub unsafe extern "C" fn cvf_compute_plan(
    template_ptr: *const u8,
    template_len: u32,
    cfg: *const CvfExportConfig,
    out_json_ptr: *mut *mut c_char,
) -> c_int {
    if template_ptr.is_null() || out_json_ptr.is_null() {
        set_last_error("Null pointer argument");
        return RC_NULL;
    }

    let template = match utf8_arg(template_ptr, template_len, "template").and_then(template_arg) {
        Ok(t) => t,
        Err(rc) => return rc,
    };

    match compute_plan(&template, &config_or_default(cfg)).to_json() {
        Ok(json) => into_c_string(json, out_json_ptr),
        Err(e) => {
            set_last_error(&e.to_string());
            RC_JSON
        }
    }
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a PDF buffer returned by `cvf_export_pdf`.
///
/// # Safety
/// `buf` must have been returned by `cvf_export_pdf`, and `len` must be the
/// corresponding length.
#[no_mangle]
pub unsafe extern "C" fn cvf_free_buffer(buf: *mut u8, len: u32) {
    if !buf.is_null() {
        let _ = Box::from_raw(slice::from_raw_parts_mut(buf, len as usize));
    }
}

/// Free a string returned by `cvf_compute_plan`.
///
/// # Safety
/// `s` must have been returned by Rust's `CString::into_raw`.
#[no_mangle]
pub unsafe extern "C" fn cvf_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

/// Retrieve the last error message. Returns a null-terminated string.
///
/// The returned pointer is valid until the next `cvf_*` call on the same
/// thread. The caller should **not** free this pointer.
///
/// Returns null if no error has occurred.
#[no_mangle]
pub extern "C" fn cvf_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        let borrow = e.borrow();
        match borrow.as_ref() {
            Some(cs) => cs.as_ptr(),
            None => ptr::null(),
        }
    })
}

/// Return the library version as a null-terminated string.
/// The caller must **not** free this pointer.
#[no_mangle]
pub extern "C" fn cvf_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SequentialIds;
    use crate::samples;

    fn template_json() -> String {
        serde_json::to_string(&samples::classic(&mut SequentialIds::default())).unwrap()
    }

    fn cv_json() -> String {
        serde_json::to_string(&samples::sample_cv()).unwrap()
    }

    #[test]
    fn ffi_export_pdf() {
        let (tpl, cv) = (template_json(), cv_json());
        let cfg = CvfExportConfig {
            title: ptr::null(),
            language: ptr::null(),
            page_width: 0.0,
            page_height: 0.0,
            scale: 1.0,
            single_page: 0,
            orientation: CvfPageOrientation::Portrait,
        };
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;

        let rc = unsafe {
            cvf_export_pdf(
                tpl.as_ptr(),
                tpl.len() as u32,
                cv.as_ptr(),
                cv.len() as u32,
                &cfg,
                &mut out_buf,
                &mut out_len,
            )
        };

        assert_eq!(rc, 0, "Expected success");
        assert!(!out_buf.is_null());
        let bytes = unsafe { slice::from_raw_parts(out_buf, out_len as usize) };
        assert_eq!(&bytes[0..5], b"%PDF-");
        unsafe { cvf_free_buffer(out_buf, out_len) };
    }

    #[test]
    fn ffi_compute_plan_rtl() {
        let tpl = template_json();
        let lang = CString::new("he").unwrap();
        let cfg = CvfExportConfig {
            title: ptr::null(),
            language: lang.as_ptr(),
            page_width: 0.0,
            page_height: 0.0,
            scale: 0.0,
            single_page: 0,
            orientation: CvfPageOrientation::Portrait,
        };
        let mut json_ptr: *mut c_char = ptr::null_mut();

        let rc = unsafe { cvf_compute_plan(tpl.as_ptr(), tpl.len() as u32, &cfg, &mut json_ptr) };

        assert_eq!(rc, 0);
        let json = unsafe { CStr::from_ptr(json_ptr) }.to_str().unwrap();
        assert!(json.contains("\"rtl\""));
        assert!(json.contains("\"main\""));
        unsafe { cvf_free_string(json_ptr) };
    }

    #[test]
    fn ffi_null_input() {
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;
        let rc = unsafe { cvf_export_pdf(ptr::null(), 0, ptr::null(), 0, ptr::null(), &mut out_buf, &mut out_len) };
        assert_eq!(rc, RC_NULL);
        assert!(!cvf_last_error().is_null());
    }

    #[test]
    fn ffi_bad_template_json() {
        let tpl = b"{ nope";
        let mut json_ptr: *mut c_char = ptr::null_mut();
        let rc = unsafe { cvf_compute_plan(tpl.as_ptr(), tpl.len() as u32, ptr::null(), &mut json_ptr) };
        assert_eq!(rc, RC_JSON);
        let msg = unsafe { CStr::from_ptr(cvf_last_error()) }.to_str().unwrap();
        assert!(msg.starts_with("Invalid template JSON"));
    }

    #[test]
    fn ffi_rejects_template_without_one_header() {
        let mut doc = samples::classic(&mut SequentialIds::default());
        doc.sections.retain(|s| s.kind() != crate::document::SectionKind::Header);
        let tpl = serde_json::to_string(&doc).unwrap();
        let mut json_ptr: *mut c_char = ptr::null_mut();
        let rc = unsafe { cvf_compute_plan(tpl.as_ptr(), tpl.len() as u32, ptr::null(), &mut json_ptr) };
        assert_eq!(rc, RC_JSON);
        assert!(json_ptr.is_null());
        let msg = unsafe { CStr::from_ptr(cvf_last_error()) }.to_str().unwrap();
        assert!(msg.contains("header"), "{msg}");
    }

    #[test]
    fn ffi_version() {
        let v = cvf_version();
        let version = unsafe { CStr::from_ptr(v) }.to_str().unwrap();
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }
}
