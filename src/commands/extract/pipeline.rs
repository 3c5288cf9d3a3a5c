use std::path::Path;

use tracing::info;

use crate::model::{ExtractResponse, ManifestResult};

use super::ExtractOptions;
use super::drivers;
use super::entity;
use super::packages;

/// Run the full extraction pipeline over one manifest document and compose
/// the response. Sub-extractor failures degrade to sentinel values; only a
/// missing input file is a document-level error.
pub fn extract_document(pdf_path: &Path, options: &ExtractOptions) -> ExtractResponse {
    if !pdf_path.exists() {
        return ExtractResponse::from_error(format!(
            "PDF file not found: {}",
            pdf_path.display()
        ));
    }

    let (_, company_raw) = entity::locate_originating_entity(pdf_path, options);
    let company = if company_raw == entity::ENTITY_NOT_LOCATED {
        "Not Found".to_string()
    } else {
        company_raw
    };

    let driver_names = drivers::collect_driver_names(pdf_path, options);
    let (_, items) = packages::extract_package_records(pdf_path, options.quiet);

    info!(
        path = %pdf_path.display(),
        company = %company,
        drivers = driver_names.len(),
        items = items.len(),
        "manifest extraction complete"
    );

    ExtractResponse::from_result(ManifestResult {
        company,
        drivers: driver_names,
        items,
    })
}
