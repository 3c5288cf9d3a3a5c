use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{debug, warn};

/// Pixel width for the last-resort render, equivalent to a fixed 4x zoom of
/// a US-letter page.
const FALLBACK_SCALE_TO: u32 = 2448;

/// Render one page (1-based) of a PDF to a PNG at the requested resolution.
///
/// Rendering backends differ in capability, so three attempts are made in
/// order: pdftoppm at the requested DPI, pdftocairo at the same DPI, and
/// finally pdftoppm with an explicit fixed-zoom scale. Any one succeeding is
/// sufficient. The returned path is unique per invocation so concurrent
/// documents cannot clobber each other's raster output.
pub fn rasterize_page(
    pdf_path: &Path,
    page_number: usize,
    dpi: u32,
    quiet: bool,
) -> Result<PathBuf> {
    let output_root = unique_output_root(pdf_path, page_number);
    let png_path = PathBuf::from(format!("{}.png", output_root.display()));

    let attempts: [(&str, Vec<String>); 3] = [
        (
            "pdftoppm",
            vec!["-r".to_string(), dpi.to_string()],
        ),
        (
            "pdftocairo",
            vec!["-r".to_string(), dpi.to_string()],
        ),
        (
            "pdftoppm",
            vec!["-scale-to".to_string(), FALLBACK_SCALE_TO.to_string()],
        ),
    ];

    let mut last_error = None;
    for (tool, resolution_args) in attempts {
        match render_once(tool, &resolution_args, pdf_path, page_number, &output_root, quiet) {
            Ok(()) if png_path.exists() => return Ok(png_path),
            Ok(()) => {
                debug!(
                    tool,
                    page = page_number,
                    path = %pdf_path.display(),
                    "render produced no image"
                );
                last_error = Some(anyhow::anyhow!(
                    "{} did not produce expected image for {} page {}",
                    tool,
                    pdf_path.display(),
                    page_number
                ));
            }
            Err(error) => {
                debug!(
                    tool,
                    page = page_number,
                    path = %pdf_path.display(),
                    error = %error,
                    "render attempt failed"
                );
                last_error = Some(error);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        anyhow::anyhow!(
            "no render backend available for {} page {}",
            pdf_path.display(),
            page_number
        )
    }))
}

fn render_once(
    tool: &str,
    resolution_args: &[String],
    pdf_path: &Path,
    page_number: usize,
    output_root: &Path,
    quiet: bool,
) -> Result<()> {
    let mut command = Command::new(tool);
    command
        .arg("-f")
        .arg(page_number.to_string())
        .arg("-l")
        .arg(page_number.to_string())
        .arg("-singlefile")
        .arg("-png")
        .args(resolution_args);
    if quiet {
        command.arg("-q");
    }
    command.arg(pdf_path).arg(output_root);

    let output = command
        .output()
        .with_context(|| format!("failed to execute {} for {}", tool, pdf_path.display()))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !quiet {
        for line in stderr.lines().filter(|line| !line.trim().is_empty()) {
            warn!(tool, message = line.trim(), "render tool warning");
        }
    }

    if !output.status.success() {
        bail!(
            "{} returned non-zero exit status for {} page {}: {}",
            tool,
            pdf_path.display(),
            page_number,
            stderr.trim()
        );
    }

    Ok(())
}

fn unique_output_root(pdf_path: &Path, page_number: usize) -> PathBuf {
    let pdf_stem = pdf_path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("pdf");
    let safe_stem = pdf_stem
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() {
                character
            } else {
                '_'
            }
        })
        .collect::<String>();

    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    std::env::temp_dir().join(format!(
        "metrc_raster_{}_{}_{}_{}",
        safe_stem,
        std::process::id(),
        page_number,
        stamp
    ))
}
