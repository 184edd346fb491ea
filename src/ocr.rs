use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::util::write_json;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "tif", "tiff"];
const MAX_DIMENSION: u32 = 2400;
const DENOISE_WINDOW: u32 = 9;
const DENOISE_SIGMA: f32 = 75.0;
const THRESHOLD_BLOCK_RADIUS: u32 = 5;

/// Raw OCR output for one source image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPage {
    pub file: String,
    pub path: String,
    pub raw_text: String,
    pub lines: Vec<String>,
}

/// Combined output for a whole input folder, consumed by the parse step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBatch {
    pub source_dir: String,
    pub count: usize,
    pub results: Vec<RawPage>,
}

#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Tesseract language spec, e.g. "jpn+vie+eng". None uses the engine default.
    pub lang: Option<String>,
    /// Tesseract page segmentation mode.
    pub psm: u32,
}

/// Batch stats returned after completion.
#[derive(Debug, Default)]
pub struct OcrStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// OCR every image in `input_dir`, writing one JSON per image plus the
/// combined `grammar_extracted_raw.json` to `output_dir`.
///
/// A single unreadable or failed image is logged and skipped; it never
/// aborts the batch.
pub fn run_batch(input_dir: &Path, output_dir: &Path, opts: &OcrOptions) -> Result<OcrStats> {
    let files = list_images(input_dir)?;
    if files.is_empty() {
        println!(
            "No images found in {}. Please add your grammar photos there.",
            input_dir.display()
        );
        return Ok(OcrStats::default());
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create output dir {}", output_dir.display()))?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Each worker decodes, preprocesses, and OCRs one image with its own
    // engine instance; collect keeps input order.
    let results: Vec<Option<RawPage>> = files
        .par_iter()
        .map(|path| {
            let page = ocr_file(path, opts);
            pb.inc(1);
            match page {
                Ok(page) => Some(page),
                Err(e) => {
                    warn!("Skipping {}: {:#}", path.display(), e);
                    None
                }
            }
        })
        .collect();
    pb.finish_and_clear();

    let total = files.len();
    let pages: Vec<RawPage> = results.into_iter().flatten().collect();
    let errors = total - pages.len();

    for page in &pages {
        let stem = Path::new(&page.file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&page.file);
        write_json(&output_dir.join(format!("{}.json", stem)), page)?;
    }

    let combined = RawBatch {
        source_dir: display_absolute(input_dir),
        count: pages.len(),
        results: pages,
    };
    write_json(&output_dir.join("grammar_extracted_raw.json"), &combined)?;

    info!(
        "OCR finished: {} images ({} ok, {} errors)",
        total, combined.count, errors
    );
    Ok(OcrStats {
        total,
        ok: combined.count,
        errors,
    })
}

/// Image files in `dir` with a recognized extension, sorted by name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("cannot read input dir {}", dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn ocr_file(path: &Path, opts: &OcrOptions) -> Result<RawPage> {
    let img = image::open(path)
        .with_context(|| format!("cannot read image: {}", path.display()))?;
    let pre = preprocess(&img);
    let raw_text = recognize(&pre, opts)?;
    let lines = split_lines(&raw_text);

    Ok(RawPage {
        file: path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string(),
        path: display_absolute(path),
        raw_text,
        lines,
    })
}

/// Grayscale, downscale to at most 2400px on the long edge, edge-preserving
/// denoise, adaptive threshold, and invert when the page is mostly dark.
fn preprocess(img: &DynamicImage) -> GrayImage {
    let mut gray = img.to_luma8();

    let (w, h) = gray.dimensions();
    let max_dim = w.max(h);
    if max_dim > MAX_DIMENSION {
        let scale = MAX_DIMENSION as f32 / max_dim as f32;
        gray = image::imageops::resize(
            &gray,
            ((w as f32 * scale) as u32).max(1),
            ((h as f32 * scale) as u32).max(1),
            image::imageops::FilterType::Triangle,
        );
    }

    let gray = denoise(&gray);

    let mut th = imageproc::contrast::adaptive_threshold(&gray, THRESHOLD_BLOCK_RADIUS);

    let white = th.pixels().filter(|p| p.0[0] == 255).count();
    let total = th.pixels().count();
    if white < total - white {
        image::imageops::invert(&mut th);
    }
    th
}

/// Bilateral filter: flattens scanner grain while keeping stroke edges
/// sharp, so thin kana strokes survive the threshold that follows.
fn denoise(gray: &GrayImage) -> GrayImage {
    imageproc::filter::bilateral_filter(gray, DENOISE_WINDOW, DENOISE_SIGMA, DENOISE_SIGMA)
}

#[cfg(feature = "tesseract")]
fn recognize(img: &GrayImage, opts: &OcrOptions) -> Result<String> {
    use leptess::{LepTess, Variable};

    let lang = opts.lang.as_deref().unwrap_or("eng");
    let mut tess = LepTess::new(None, lang).with_context(|| {
        format!("failed to initialize Tesseract for '{}'; is it installed?", lang)
    })?;
    tess.set_variable(Variable::TesseditPagesegMode, &opts.psm.to_string())
        .context("failed to set page segmentation mode")?;

    // leptess wants an encoded image, not raw pixels.
    let mut png = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut png),
        image::ImageFormat::Png,
    )
    .context("failed to encode preprocessed image")?;
    tess.set_image_from_mem(&png)
        .context("failed to load image into Tesseract")?;

    tess.get_utf8_text().context("text recognition failed")
}

#[cfg(not(feature = "tesseract"))]
fn recognize(_img: &GrayImage, _opts: &OcrOptions) -> Result<String> {
    anyhow::bail!("built without the `tesseract` feature; rebuild with --features tesseract")
}

/// Trimmed, non-empty lines of the raw engine output.
pub fn split_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect()
}

fn display_absolute(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
