use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::ExtractArgs;
use crate::util::write_json_pretty;

use super::ExtractOptions;
use super::pipeline;

pub fn run(args: ExtractArgs) -> Result<()> {
    let options = ExtractOptions {
        ocr_dpi: args.ocr_dpi,
        ocr_lang: args.ocr_lang.clone(),
        contrast: args.contrast,
        quiet: args.quiet,
    };

    info!(path = %args.pdf_path.display(), "starting manifest extraction");
    let response = pipeline::extract_document(&args.pdf_path, &options);

    match &args.output_path {
        Some(output_path) => {
            write_json_pretty(output_path, &response)?;
            info!(path = %output_path.display(), "wrote extraction response");
        }
        None => {
            let rendered = serde_json::to_string_pretty(&response)
                .context("failed to serialize extraction response")?;
            println!("{rendered}");
        }
    }

    if let Some(message) = response.error {
        bail!("{message}");
    }

    Ok(())
}
