use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::inventory;
use crate::model::ToolVersions;

/// Report the external tool chain the pipeline depends on and the state of
/// the drop directory. Missing optional tools disable strategies without
/// failing the command; missing required tools fail it.
pub fn run(args: StatusArgs) -> Result<()> {
    let versions = collect_tool_versions()?;

    info!(version = %versions.pdftotext, "pdftotext available");
    info!(version = %versions.pdftoppm, "pdftoppm available");

    match &versions.pdftocairo {
        Some(version) => info!(version = %version, "pdftocairo available"),
        None => warn!("pdftocairo missing; raster fallback reduced to pdftoppm"),
    }
    match &versions.pdftohtml {
        Some(version) => info!(version = %version, "pdftohtml available"),
        None => warn!("pdftohtml missing; lines table strategy disabled"),
    }
    match &versions.tesseract {
        Some(version) => info!(version = %version, "tesseract available"),
        None => warn!("tesseract missing; OCR strategies disabled"),
    }

    match inventory::discover_pdfs(&args.drop_dir) {
        Ok(pdfs) => info!(
            drop_dir = %args.drop_dir.display(),
            pdf_count = pdfs.len(),
            "drop directory status"
        ),
        Err(error) => warn!(
            drop_dir = %args.drop_dir.display(),
            error = %error,
            "drop directory unreadable"
        ),
    }

    Ok(())
}

pub fn collect_tool_versions() -> Result<ToolVersions> {
    Ok(ToolVersions {
        pdftotext: command_version("pdftotext", &["-v"])?,
        pdftoppm: command_version("pdftoppm", &["-v"])?,
        pdftocairo: command_version_optional("pdftocairo", &["-v"]),
        pdftohtml: command_version_optional("pdftohtml", &["-v"]),
        tesseract: command_version_optional("tesseract", &["--version"]),
    })
}

fn command_version_optional(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}

fn command_version(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to run {} {}", program, args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{} {} failed: {}", program, args.join(" "), stderr.trim());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    let version_line = source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .unwrap_or("unknown");

    Ok(version_line.to_string())
}
