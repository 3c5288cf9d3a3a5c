use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing::debug;

use super::ExtractOptions;
use super::ocr::{self, OcrToken};
use super::raster;
use super::tables;

type DriverStrategy = fn(&Path, &ExtractOptions) -> Vec<String>;

/// Fixed priority order for the driver-name strategies. The merge preserves
/// first-seen order across this list, so priority is defined here and
/// nowhere else.
const DRIVER_STRATEGIES: [(&str, DriverStrategy); 4] = [
    ("table_stream", strategy_table_stream),
    ("table_lines", strategy_table_lines),
    ("ocr_page_0", strategy_ocr_page_0),
    ("ocr_page_1", strategy_ocr_page_1),
];

/// Vertical tolerance of the reading band to the right of the anchor phrase.
const BAND_TOP_TOLERANCE: i64 = 30;

/// Run every driver-name strategy in priority order and merge their output,
/// dropping exact duplicates while preserving first-seen order. A failing
/// strategy contributes nothing; it is never retried.
pub fn collect_driver_names(pdf_path: &Path, options: &ExtractOptions) -> Vec<String> {
    merge_strategy_results(DRIVER_STRATEGIES.iter().map(|&(label, strategy)| {
        let names = strategy(pdf_path, options);
        debug!(strategy = label, candidates = names.len(), "driver strategy complete");
        names
    }))
}

/// Fold per-strategy candidate lists, in priority order, into one
/// deduplicated list. A failed strategy's empty list contributes nothing;
/// first-seen order defines the result.
pub fn merge_strategy_results(results: impl IntoIterator<Item = Vec<String>>) -> Vec<String> {
    let mut merged = Vec::new();
    for names in results {
        merged.extend(names);
    }

    dedup_preserving_order(merged)
}

pub fn dedup_preserving_order(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

fn strategy_table_stream(pdf_path: &Path, options: &ExtractOptions) -> Vec<String> {
    tables::stream_table_driver_names(pdf_path, options.quiet)
}

fn strategy_table_lines(pdf_path: &Path, options: &ExtractOptions) -> Vec<String> {
    tables::lines_table_driver_names(pdf_path, options.quiet)
}

fn strategy_ocr_page_0(pdf_path: &Path, options: &ExtractOptions) -> Vec<String> {
    ocr_driver_names(pdf_path, 0, options)
}

fn strategy_ocr_page_1(pdf_path: &Path, options: &ExtractOptions) -> Vec<String> {
    ocr_driver_names(pdf_path, 1, options)
}

/// OCR driver-name strategy for one page (0-based). An out-of-range page,
/// a failed render, or a failed recognition all yield an empty list.
pub fn ocr_driver_names(pdf_path: &Path, page_index: usize, options: &ExtractOptions) -> Vec<String> {
    match ocr_driver_scan(pdf_path, page_index, options) {
        Ok(names) => names,
        Err(error) => {
            debug!(
                path = %pdf_path.display(),
                page = page_index,
                error = %error,
                "ocr driver strategy failed"
            );
            Vec::new()
        }
    }
}

fn ocr_driver_scan(
    pdf_path: &Path,
    page_index: usize,
    options: &ExtractOptions,
) -> Result<Vec<String>> {
    let image_path = raster::rasterize_page(pdf_path, page_index + 1, options.ocr_dpi, options.quiet)?;

    let tokens = preprocess_and_recognize(&image_path, options);
    let _ = fs::remove_file(&image_path);
    let tokens = tokens?;

    Ok(names_in_reading_band(&tokens))
}

fn preprocess_and_recognize(image_path: &Path, options: &ExtractOptions) -> Result<Vec<OcrToken>> {
    ocr::preprocess_for_ocr(image_path, options.contrast)?;
    ocr::ocr_tokens(image_path, 6, &options.ocr_lang)
}

/// Locate every occurrence of the anchor phrase and collect the tokens in
/// its reading band: left edge past the anchor's right edge, vertical
/// position within the band tolerance of the anchor's top. Each qualifying
/// token is one candidate name; tokens are not joined.
///
/// The anchor matches as a contiguous run of word tokens reconstructing the
/// phrase; a single token carrying the whole phrase is the run of length 1.
pub fn names_in_reading_band(tokens: &[OcrToken]) -> Vec<String> {
    let mut names = Vec::new();

    let mut index = 0;
    while index < tokens.len() {
        let Some(run_end) = anchor_run_end(tokens, index) else {
            index += 1;
            continue;
        };

        let anchor_top = tokens[index].top;
        let anchor_right = tokens[run_end].right();

        for token in &tokens[run_end + 1..] {
            if token.left > anchor_right && (token.top - anchor_top).abs() < BAND_TOP_TOLERANCE {
                names.push(token.text.trim().to_string());
            }
        }

        index = run_end + 1;
    }

    names
}

/// If the anchor phrase starts at `start`, return the index of its last
/// token.
fn anchor_run_end(tokens: &[OcrToken], start: usize) -> Option<usize> {
    if tokens[start].text.trim() == tables::DRIVER_ANCHOR {
        return Some(start);
    }

    let words: Vec<&str> = tables::DRIVER_ANCHOR.split_whitespace().collect();
    if start + words.len() > tokens.len() {
        return None;
    }

    for (offset, word) in words.iter().enumerate() {
        if tokens[start + offset].text.trim() != *word {
            return None;
        }
    }

    Some(start + words.len() - 1)
}
