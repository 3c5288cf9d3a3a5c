use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::debug;

/// One recognized word with its bounding box, in image pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrToken {
    pub text: String,
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl OcrToken {
    pub fn right(&self) -> i64 {
        self.left + self.width
    }
}

/// 3x3 sharpening kernel applied before the driver-name OCR pass.
const SHARPEN_KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

/// Condition a rasterized page for OCR: grayscale, sharpen, then contrast
/// enhancement. The contrast factor follows the enhancement convention where
/// 1.0 leaves the image unchanged. The image is rewritten in place.
pub fn preprocess_for_ocr(image_path: &Path, contrast: f32) -> Result<()> {
    let image = image::open(image_path)
        .with_context(|| format!("failed to open raster image: {}", image_path.display()))?;

    let conditioned = image
        .grayscale()
        .filter3x3(&SHARPEN_KERNEL)
        .adjust_contrast((contrast - 1.0) * 100.0);

    conditioned
        .save(image_path)
        .with_context(|| format!("failed to rewrite raster image: {}", image_path.display()))?;

    Ok(())
}

/// Run word-level OCR over an image, returning one token per recognized word.
///
/// Page segmentation mode 6 suits uniform single-column text blocks (the
/// driver table region); mode 4 assumes column-based layout (the manifest
/// header). Bounding boxes come from tesseract's TSV output.
pub fn ocr_tokens(image_path: &Path, psm: u32, lang: &str) -> Result<Vec<OcrToken>> {
    let output = Command::new("tesseract")
        .arg(image_path)
        .arg("stdout")
        .arg("-l")
        .arg(lang)
        .arg("--oem")
        .arg("3")
        .arg("--psm")
        .arg(psm.to_string())
        .arg("tsv")
        .output()
        .with_context(|| format!("failed to execute tesseract for {}", image_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "tesseract returned non-zero exit status for {}: {}",
            image_path.display(),
            stderr.trim()
        );
    }

    let tokens = parse_tsv(&String::from_utf8_lossy(&output.stdout));
    debug!(
        path = %image_path.display(),
        tokens = tokens.len(),
        psm,
        "ocr pass complete"
    );
    Ok(tokens)
}

/// Parse tesseract TSV output, keeping word-level rows only.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num, left,
/// top, width, height, conf, text. Word rows carry level 5.
pub fn parse_tsv(raw: &str) -> Vec<OcrToken> {
    raw.lines()
        .skip(1)
        .filter_map(|line| {
            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < 12 || columns[0] != "5" {
                return None;
            }

            Some(OcrToken {
                text: columns[11].to_string(),
                left: columns[6].parse().ok()?,
                top: columns[7].parse().ok()?,
                width: columns[8].parse().ok()?,
                height: columns[9].parse().ok()?,
            })
        })
        .collect()
}
