use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::InventoryArgs;
use crate::model::{PdfEntry, PdfInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.drop_dir)?;

    if args.dry_run {
        info!(
            pdf_count = manifest.pdf_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.drop_dir.join("manifests").join("pdf_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(pdf_count = manifest.pdf_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(drop_dir: &Path) -> Result<PdfInventoryManifest> {
    let mut pdf_paths = discover_pdfs(drop_dir)?;
    pdf_paths.sort();

    if pdf_paths.is_empty() {
        bail!("no PDFs found in {}", drop_dir.display());
    }

    let mut pdfs = Vec::with_capacity(pdf_paths.len());
    for path in pdf_paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let size_bytes = fs::metadata(&path)
            .with_context(|| format!("failed to inspect {}", path.display()))?
            .len();
        let sha256 = sha256_file(&path)?;

        pdfs.push(PdfEntry {
            filename,
            size_bytes,
            sha256,
        });
    }

    pdfs.sort_by(|a, b| a.filename.cmp(&b.filename));

    Ok(PdfInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: drop_dir.display().to_string(),
        pdf_count: pdfs.len(),
        pdfs,
    })
}

pub fn discover_pdfs(drop_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();

    let entries = fs::read_dir(drop_dir)
        .with_context(|| format!("failed to read {}", drop_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", drop_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if is_pdf {
            pdfs.push(path);
        }
    }

    Ok(pdfs)
}
