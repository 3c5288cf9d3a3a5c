use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "metrc",
    version,
    about = "Local METRC transport-manifest extraction tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Extract(ExtractArgs),
    Inventory(InventoryArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long)]
    pub pdf_path: PathBuf,

    #[arg(long)]
    pub output_path: Option<PathBuf>,

    #[arg(long, default_value_t = 600)]
    pub ocr_dpi: u32,

    #[arg(long, default_value = "eng")]
    pub ocr_lang: String,

    /// Contrast enhancement factor for the driver OCR pass; 1.0 is neutral.
    #[arg(long, default_value_t = 1.0)]
    pub contrast: f32,

    /// Suppress render-tool warnings (CropBox noise and the like) instead
    /// of forwarding them as diagnostics.
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "uploads")]
    pub drop_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "uploads")]
    pub drop_dir: PathBuf,
}
