use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{debug, warn};

/// Literal label that precedes a driver name cell in the manifest tables.
pub const DRIVER_ANCHOR: &str = "Name of Person Transporting";

/// The manifest header/table always sits near the top of the document, so
/// both table strategies scan pages 1-2 only.
const TABLE_PAGE_LIMIT: usize = 2;

static CELL_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid cell split pattern"));
static CELL_BOILERPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Employee ID of Driver|CCE\d+").expect("valid boilerplate pattern"));
static XML_TEXT_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<text top="(-?\d+)" left="(-?\d+)" width="(-?\d+)" height="(-?\d+)"[^>]*>(.*?)</text>"#)
        .expect("valid xml fragment pattern")
});
static INNER_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

/// Vertical tolerance when grouping positioned fragments into table rows.
const ROW_TOP_TOLERANCE: i64 = 5;

/// Whitespace-column table strategy: recover cell structure from
/// layout-preserving text extraction, where runs of two or more spaces mark
/// column boundaries. Returns an empty list on any failure.
pub fn stream_table_driver_names(pdf_path: &Path, quiet: bool) -> Vec<String> {
    match stream_table_scan(pdf_path, quiet) {
        Ok(names) => names,
        Err(error) => {
            debug!(
                path = %pdf_path.display(),
                error = %error,
                "stream table strategy failed"
            );
            Vec::new()
        }
    }
}

fn stream_table_scan(pdf_path: &Path, quiet: bool) -> Result<Vec<String>> {
    let mut command = Command::new("pdftotext");
    command
        .arg("-layout")
        .arg("-enc")
        .arg("UTF-8")
        .arg("-f")
        .arg("1")
        .arg("-l")
        .arg(TABLE_PAGE_LIMIT.to_string());
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

    let text = String::from_utf8_lossy(&output.stdout).replace('\u{0000}', "");
    let rows = text
        .lines()
        .map(|line| {
            CELL_SPLIT
                .split(line.trim())
                .map(str::to_string)
                .collect::<Vec<String>>()
        })
        .collect::<Vec<Vec<String>>>();

    Ok(driver_names_in_rows(&rows))
}

/// Ruled-table strategy: recover rows and cells from positioned text
/// fragments of the XML page dump, grouping fragments into rows by vertical
/// position. Documents that defeat whitespace inference often succeed here.
/// Returns an empty list on any failure.
pub fn lines_table_driver_names(pdf_path: &Path, quiet: bool) -> Vec<String> {
    match lines_table_scan(pdf_path, quiet) {
        Ok(names) => names,
        Err(error) => {
            debug!(
                path = %pdf_path.display(),
                error = %error,
                "lines table strategy failed"
            );
            Vec::new()
        }
    }
}

fn lines_table_scan(pdf_path: &Path, quiet: bool) -> Result<Vec<String>> {
    let mut command = Command::new("pdftohtml");
    command
        .arg("-xml")
        .arg("-i")
        .arg("-f")
        .arg("1")
        .arg("-l")
        .arg(TABLE_PAGE_LIMIT.to_string());
    if quiet {
        command.arg("-q");
    }
    command.arg(pdf_path).arg("-stdout");

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftohtml for {}", pdf_path.display()))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !quiet {
        for line in stderr.lines().filter(|line| !line.trim().is_empty()) {
            warn!(tool = "pdftohtml", message = line.trim(), "render tool warning");
        }
    }

    if !output.status.success() {
        bail!(
            "pdftohtml returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let xml = String::from_utf8_lossy(&output.stdout);
    let rows = reconstruct_rows_from_fragments(&xml);
    Ok(driver_names_in_rows(&rows))
}

struct Fragment {
    top: i64,
    left: i64,
    text: String,
}

/// Group positioned `<text>` fragments into rows: fragments whose top edges
/// sit within the row tolerance belong to the same ruled row, ordered
/// left-to-right.
pub fn reconstruct_rows_from_fragments(xml: &str) -> Vec<Vec<String>> {
    let mut fragments = XML_TEXT_FRAGMENT
        .captures_iter(xml)
        .filter_map(|captures| {
            Some(Fragment {
                top: captures.get(1)?.as_str().parse().ok()?,
                left: captures.get(2)?.as_str().parse().ok()?,
                text: decode_fragment_text(captures.get(5)?.as_str()),
            })
        })
        .collect::<Vec<Fragment>>();

    fragments.sort_by(|a, b| a.top.cmp(&b.top).then(a.left.cmp(&b.left)));

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut current_top: Option<i64> = None;
    for fragment in fragments {
        match current_top {
            Some(top) if (fragment.top - top).abs() <= ROW_TOP_TOLERANCE => {
                if let Some(row) = rows.last_mut() {
                    row.push(fragment.text);
                }
            }
            _ => {
                current_top = Some(fragment.top);
                rows.push(vec![fragment.text]);
            }
        }
    }

    rows
}

fn decode_fragment_text(raw: &str) -> String {
    let stripped = INNER_TAG.replace_all(raw, "");
    stripped
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

/// Scan every cell of every row for the driver anchor; the cell to its right
/// is the candidate name.
pub fn driver_names_in_rows(rows: &[Vec<String>]) -> Vec<String> {
    let mut names = Vec::new();

    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if !cell.contains(DRIVER_ANCHOR) {
                continue;
            }
            if let Some(candidate) = row.get(index + 1) {
                if let Some(name) = clean_driver_cell(candidate) {
                    names.push(name);
                }
            }
        }
    }

    names
}

/// Trim, require a plausible length, then strip known boilerplate (the
/// employee-id label and CCE badge numbers) from a candidate name cell.
pub fn clean_driver_cell(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    if trimmed.chars().count() <= 3 {
        return None;
    }

    Some(CELL_BOILERPLATE.replace_all(trimmed, "").trim().to_string())
}
