use std::collections::HashSet;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::model::PackageRecord;

use super::classify::{self, ItemFields};

static TABLE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)PACKAGE\s*[|]?\s*SHIPPED").expect("valid table header pattern")
});
static BLOCK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+\.\s*Package\s*[|]?\s*Shipped").expect("valid block header pattern")
});
static BLOCK_HEADER_AFTER_NEWLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\n\d+\.\s*Package\s*[|]?\s*Shipped").expect("valid block header pattern")
});
static PACKAGE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"1A[A-Za-z0-9]{19,30}").expect("valid package id pattern"));
static M_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"M\d{11}").expect("valid tracking number pattern"));
static ITEM_DETAILS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Item Details").expect("valid item details pattern"));
static SOURCE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\nSource\s*(Harvest|Package)").expect("valid source label pattern")
});

/// Parse the package table of a manifest into typed records. A whole-file
/// failure yields an empty list, never an error; per-block problems are
/// logged and skipped.
pub fn extract_package_records(pdf_path: &Path, quiet: bool) -> (String, Vec<PackageRecord>) {
    let filename = pdf_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("pdf")
        .to_string();

    match package_scan(pdf_path, quiet) {
        Ok(records) => (filename, records),
        Err(error) => {
            warn!(
                path = %pdf_path.display(),
                error = %error,
                "package extraction failed"
            );
            (filename, Vec::new())
        }
    }
}

fn package_scan(pdf_path: &Path, quiet: bool) -> Result<Vec<PackageRecord>> {
    let pages = page_texts(pdf_path, quiet)?;
    let records = records_from_pages(&pages);

    info!(records = records.len(), "package extraction complete");
    Ok(records)
}

/// Locate the start of the package table across pages, concatenate the text
/// from there to the last page, and parse it into records. A document with
/// no header page still parses from page 1.
pub fn records_from_pages(pages: &[String]) -> Vec<PackageRecord> {
    let start_page = match pages.iter().position(|page| TABLE_HEADER.is_match(page)) {
        Some(index) => {
            info!(page = index + 1, "found package table header");
            index + 1
        }
        None => {
            // Fail open: some manifests omit the header entirely.
            warn!("package table header not found; starting from page 1");
            1
        }
    };

    let mut full_text = String::new();
    for page in pages.iter().skip(start_page - 1) {
        full_text.push_str(page);
        full_text.push('\n');
    }

    let mut seen_m_numbers = HashSet::new();
    let mut records = Vec::new();

    for block in split_package_blocks(&full_text) {
        if block.trim().is_empty() {
            continue;
        }

        if let Some(record) = parse_package_block(block, &mut seen_m_numbers, records.len() + 1) {
            records.push(record);
        }
    }

    records
}

/// Extract per-page text via pdftotext, splitting on form feeds and
/// dropping trailing empty pages.
fn page_texts(pdf_path: &Path, quiet: bool) -> Result<Vec<String>> {
    let mut command = Command::new("pdftotext");
    command.arg("-enc").arg("UTF-8");
    if quiet {
        command.arg("-q");
    }
    command.arg(pdf_path).arg("-");

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !quiet {
        for line in stderr.lines().filter(|line| !line.trim().is_empty()) {
            warn!(tool = "pdftotext", message = line.trim(), "render tool warning");
        }
    }

    if !output.status.success() {
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    Ok(pages)
}

/// Split the concatenated manifest text into per-package blocks, slicing at
/// every block-header match start so the header itself begins the next
/// block. Text before the first header forms the leading block.
pub fn split_package_blocks(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = BLOCK_HEADER.find_iter(text).map(|found| found.start()).collect();
    if starts.is_empty() {
        return vec![text];
    }

    let mut blocks = Vec::with_capacity(starts.len() + 1);
    if starts[0] > 0 {
        blocks.push(&text[..starts[0]]);
    }
    for (index, &start) in starts.iter().enumerate() {
        let end = starts.get(index + 1).copied().unwrap_or(text.len());
        blocks.push(&text[start..end]);
    }

    blocks
}

/// Parse one package block. A block without a tracking number is not a
/// record; a tracking number already seen in this document is skipped,
/// first occurrence wins.
pub fn parse_package_block(
    block: &str,
    seen_m_numbers: &mut HashSet<String>,
    index: usize,
) -> Option<PackageRecord> {
    let package_id = PACKAGE_ID
        .find(block)
        .map(|found| found.as_str().to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let Some(m_number) = M_NUMBER.find(block).map(|found| found.as_str().to_string()) else {
        warn!("no tracking number found in package block");
        return None;
    };

    if !seen_m_numbers.insert(m_number.clone()) {
        warn!(m_number = %m_number, "duplicate tracking number skipped");
        return None;
    }

    let item_details = item_details_in(block).unwrap_or_else(|| "Not Found".to_string());
    let fields = if item_details == "Not Found" {
        ItemFields::default()
    } else {
        classify::parse_item_details(&item_details)
    };

    debug!(
        m_number = %m_number,
        package_id = %package_id,
        name = %fields.name,
        strain = fields.strain.as_str(),
        category = fields.category.as_str(),
        "parsed package block"
    );

    Some(PackageRecord {
        index,
        package_id,
        m_number,
        item_details,
        name: fields.name,
        strain: fields.strain,
        supply_days: fields.supply_days,
        weight: fields.weight,
        category: fields.category,
    })
}

/// The item-details window runs from the "Item Details" label to the
/// earliest of: the Source Harvest/Package label, the next block header, or
/// end of stream.
pub fn item_details_in(block: &str) -> Option<String> {
    let label = ITEM_DETAILS_LABEL.find(block)?;
    let tail = &block[label.end()..];

    let mut end = tail.len();
    if let Some(found) = SOURCE_LABEL.find(tail) {
        end = end.min(found.start());
    }
    if let Some(found) = BLOCK_HEADER_AFTER_NEWLINE.find(tail) {
        end = end.min(found.start());
    }

    Some(tail[..end].trim().to_string())
}
