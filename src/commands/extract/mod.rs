mod classify;
mod drivers;
mod entity;
mod ocr;
mod packages;
mod pipeline;
mod raster;
mod run;
mod tables;
#[cfg(test)]
mod tests;

pub use run::run;

/// Per-call configuration for the extraction pipeline. There is no
/// process-global state; render-warning suppression travels with the call.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub ocr_dpi: u32,
    pub ocr_lang: String,
    /// Contrast enhancement factor for the driver OCR pass; 1.0 is neutral.
    pub contrast: f32,
    pub quiet: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            ocr_dpi: 600,
            ocr_lang: "eng".to_string(),
            contrast: 1.0,
            quiet: false,
        }
    }
}
