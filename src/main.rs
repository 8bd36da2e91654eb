//! cvforge – command-line CV → PDF exporter.
//!
//! Usage:
//!   cvforge <template.json> <cv.json> [output.pdf] [--single-page] [--scale N]
//!           [--letter] [--landscape] [--font path.ttf] [--language xx] [--plan]
//!
//! If `output.pdf` is omitted the PDF is written next to the CV file with
//! the same stem (e.g. `jane.json` → `jane.pdf`).

use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
};

use cv_forge::cv_data::CvData;
use cv_forge::document::TemplateDocument;
use cv_forge::fonts::FontManager;
use cv_forge::pipeline::{compute_plan, generate_cv_pdf_with_fonts, PageOrientation, PipelineConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut positional: Vec<PathBuf> = Vec::new();
    let mut config = PipelineConfig::default();
    let mut landscape = false;
    let mut font: Option<PathBuf> = None;
    let mut plan_only = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--single-page" | "-s" => config.single_page = true,
            "--landscape" | "-l" => landscape = true,
            "--letter" => {
                let letter = PipelineConfig::letter();
                config.page_width = letter.page_width;
                config.page_height = letter.page_height;
            }
            "--plan" => plan_only = true,
            "--scale" => match iter.next().and_then(|v| v.parse::<f32>().ok()) {
                Some(v) if v > 0.0 => config.scale = v,
                _ => fail(&args[0], "--scale needs a positive number"),
            },
            "--font" => match iter.next() {
                Some(v) => font = Some(PathBuf::from(v)),
                None => fail(&args[0], "--font needs a path"),
            },
            "--language" => match iter.next() {
                Some(v) => config.language = v.clone(),
                None => fail(&args[0], "--language needs a tag"),
            },
            "--title" | "-t" => match iter.next() {
                Some(v) => config.title = v.clone(),
                None => fail(&args[0], "--title needs a value"),
            },
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => fail(&args[0], &format!("Unknown flag: {other}")),
            path => positional.push(PathBuf::from(path)),
        }
    }
    if landscape {
        config.orientation = PageOrientation::Landscape;
    }

    let template_path = match positional.first() {
        Some(p) => p.clone(),
        None => fail(&args[0], "Error: no template file specified."),
    };
    let template: TemplateDocument = match read(&template_path).and_then(|s| {
        TemplateDocument::from_json(&s).map_err(|e| format!("Error parsing '{}': {e}", template_path.display()))
    }) {
        Ok(t) => t,
        Err(e) => exit_with(&e),
    };

    if plan_only {
        match compute_plan(&template, &config).to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => exit_with(&format!("Error serializing plan: {e}")),
        }
        return;
    }

    let cv_path = match positional.get(1) {
        Some(p) => p.clone(),
        None => fail(&args[0], "Error: no CV data file specified."),
    };
    if positional.len() > 3 {
        fail(&args[0], &format!("Unexpected argument: {}", positional[3].display()));
    }
    let cv = match read(&cv_path).and_then(|s| {
        CvData::from_json(&s).map_err(|e| format!("Error parsing '{}': {e}", cv_path.display()))
    }) {
        Ok(cv) => cv,
        Err(e) => exit_with(&e),
    };

    // Default output: same directory + same stem as the CV, but with .pdf
    let output = positional.get(2).cloned().unwrap_or_else(|| {
        let mut o = cv_path.clone();
        o.set_extension("pdf");
        o
    });

    let fonts = match font {
        Some(path) => match FontManager::with_font_file(&path) {
            Ok(f) => f,
            Err(e) => exit_with(&format!("Error loading font '{}': {e}", path.display())),
        },
        None => FontManager::default(),
    };

    match generate_cv_pdf_with_fonts(&template, &cv, &config, fonts) {
        Ok(artifact) => {
            // Create output directory if necessary.
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        exit_with(&format!("Error creating output directory: {e}"));
                    }
                }
            }
            if let Err(e) = fs::write(&output, &artifact.bytes) {
                exit_with(&format!("Error writing '{}': {e}", output.display()));
            }
            let pages = artifact.page_count();
            eprintln!(
                "Wrote '{}' ({} bytes, {} page{})",
                output.display(),
                artifact.bytes.len(),
                pages,
                if pages == 1 { "" } else { "s" }
            );
        }
        Err(e) => exit_with(&format!("Error generating PDF: {}", e.user_message())),
    }
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Error reading '{}': {e}", path.display()))
}

fn exit_with(msg: &str) -> ! {
    eprintln!("{msg}");
    process::exit(1);
}

fn fail(prog: &str, msg: &str) -> ! {
    eprintln!("{msg}");
    print_usage(prog);
    process::exit(1);
}

fn print_usage(prog: &str) {
    eprintln!("cvforge – CV to PDF exporter (cv-forge)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <template.json> <cv.json> [output.pdf] [flags]");
    eprintln!("  {prog} <template.json> --plan");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <template.json>  Saved template document");
    eprintln!("  <cv.json>        CV data (photos must be base64 data URIs)");
    eprintln!("  [output.pdf]     Output path  (default: same stem as the CV with .pdf)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --single-page    Shrink the CV onto one page instead of splitting");
    eprintln!("  --scale N        Raster scale in device px per CSS px (default: 2)");
    eprintln!("  --letter         US Letter instead of A4");
    eprintln!("  --landscape      Landscape page orientation");
    eprintln!("  --font PATH      TTF/OTF used for text (default: placeholder metrics)");
    eprintln!("  --language TAG   Language of the CV data; ar/he/fa/ur render right-to-left");
    eprintln!("  --title, -t      Document title in PDF metadata");
    eprintln!("  --plan           Print the render plan as JSON and exit");
    eprintln!("  --help           Print this message");
}
