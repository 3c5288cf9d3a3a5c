use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing::debug;

use super::ExtractOptions;
use super::ocr::{self, OcrToken};
use super::raster;

pub const ENTITY_NOT_LOCATED: &str = "Could not locate 'Originating Entity'";
pub const COMPANY_NOT_FOUND: &str = "No company name found";

/// The manifest header renders at a lower zoom than the driver OCR path;
/// 2x of the 72dpi page grid groups the header text well.
const ENTITY_RENDER_DPI: u32 = 144;

/// Vertical tolerance of the company-name reading band.
const BAND_TOP_TOLERANCE: i64 = 15;

/// Maximum token-position gap between the "originating" and "entity" anchor
/// words.
const ANCHOR_WINDOW: usize = 2;

/// Read the company name printed to the right of the "Originating Entity"
/// label on the first page. Failures are reported as explanatory strings,
/// never as errors: a missing file, an unlocatable anchor, and an empty
/// reading band each produce their documented sentinel.
pub fn locate_originating_entity(pdf_path: &Path, options: &ExtractOptions) -> (String, String) {
    let filename = pdf_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("pdf")
        .to_string();

    if !pdf_path.exists() {
        return (filename, format!("PDF file not found: {}", pdf_path.display()));
    }

    match entity_scan(pdf_path, options) {
        Ok(company) => (filename, company),
        Err(error) => {
            debug!(
                path = %pdf_path.display(),
                error = %error,
                "entity locator failed"
            );
            (filename, ENTITY_NOT_LOCATED.to_string())
        }
    }
}

fn entity_scan(pdf_path: &Path, options: &ExtractOptions) -> Result<String> {
    let image_path = raster::rasterize_page(pdf_path, 1, ENTITY_RENDER_DPI, options.quiet)?;
    // Column-aware segmentation; no preprocessing pass on this path.
    let tokens = ocr::ocr_tokens(&image_path, 4, &options.ocr_lang);
    let _ = fs::remove_file(&image_path);

    Ok(company_from_tokens(&tokens?))
}

/// Anchor on the "originating" / "entity" word pair and read the band to its
/// right. Every "originating" hit overwrites the candidate index (scan-order
/// semantics); the first qualifying "entity" within the window wins.
pub fn company_from_tokens(tokens: &[OcrToken]) -> String {
    let mut originating_index: Option<usize> = None;
    let mut entity_index: Option<usize> = None;

    for (index, token) in tokens.iter().enumerate() {
        let text = token.text.trim().to_ascii_lowercase();
        if text.contains("originating") {
            originating_index = Some(index);
        } else if text.contains("entity") {
            if let Some(origin) = originating_index {
                if index - origin <= ANCHOR_WINDOW {
                    entity_index = Some(index);
                    break;
                }
            }
        }
    }

    let (Some(origin), Some(entity)) = (originating_index, entity_index) else {
        return ENTITY_NOT_LOCATED.to_string();
    };

    let anchor_top = tokens[origin].top;
    let anchor_right = tokens[entity].right();

    let band: Vec<&str> = tokens
        .iter()
        .filter(|token| {
            token.left > anchor_right && (token.top - anchor_top).abs() < BAND_TOP_TOLERANCE
        })
        .map(|token| token.text.as_str())
        .collect();

    if band.is_empty() {
        return COMPANY_NOT_FOUND.to_string();
    }

    let cleaned = clean_company_name(&band.join(" "));
    if cleaned.is_empty() {
        COMPANY_NOT_FOUND.to_string()
    } else {
        cleaned
    }
}

/// Strip known boilerplate the band tends to pick up alongside the name.
pub fn clean_company_name(raw: &str) -> String {
    raw.replace("LLC", "")
        .replace("For Agency Use Only", "")
        .replace(", ", "")
        .replace('[', "")
        .replace(']', "")
        .trim()
        .to_string()
}
