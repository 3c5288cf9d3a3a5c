use serde::{Deserialize, Serialize};

/// Strain classification of one package, as printed on the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strain {
    Indica,
    Sativa,
    Hybrid,
    #[serde(rename = "Not Specified")]
    NotSpecified,
}

impl Strain {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Indica => "Indica",
            Self::Sativa => "Sativa",
            Self::Hybrid => "Hybrid",
            Self::NotSpecified => "Not Specified",
        }
    }
}

/// Product category bucket assigned by the classification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Flower,
    Tincture,
    Topical,
    Edible,
    Vape,
    Unspecified,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flower => "Flower",
            Self::Tincture => "Tincture",
            Self::Topical => "Topical",
            Self::Edible => "Edible",
            Self::Vape => "Vape",
            Self::Unspecified => "Unspecified",
        }
    }
}

/// One parsed package line from the shipment table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRecord {
    /// 1-based position among successfully parsed records, not the raw
    /// numbering printed in the document.
    pub index: usize,
    pub package_id: String,
    /// Unique tracking number; natural key of the record within a document.
    pub m_number: String,
    /// Raw free-text segment the sub-fields below were parsed from.
    pub item_details: String,
    pub name: String,
    pub strain: Strain,
    pub supply_days: String,
    pub weight: String,
    pub category: Category,
}

/// Full extraction result for one manifest document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestResult {
    pub company: String,
    /// Deduplicated driver names in first-seen strategy-priority order.
    pub drivers: Vec<String>,
    pub items: Vec<PackageRecord>,
}

/// Wire shape handed to callers of the extract command.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractResponse {
    pub company: String,
    pub drivers: String,
    pub items: Vec<ResponseItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseItem {
    pub item_number: usize,
    pub package_id: String,
    pub m_number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub strain: Strain,
    pub days: String,
    pub weight: String,
    pub item_details: String,
}

impl ExtractResponse {
    pub fn from_result(result: ManifestResult) -> Self {
        let drivers = if result.drivers.is_empty() {
            "Not Found".to_string()
        } else {
            result.drivers.join(" / ")
        };

        let items = result
            .items
            .into_iter()
            .map(|record| ResponseItem {
                item_number: record.index,
                package_id: record.package_id,
                m_number: record.m_number,
                name: record.name,
                category: record.category,
                strain: record.strain,
                days: record.supply_days,
                weight: record.weight,
                item_details: record.item_details,
            })
            .collect();

        Self {
            company: result.company,
            drivers,
            items,
            error: None,
        }
    }

    pub fn from_error(message: String) -> Self {
        Self {
            company: String::new(),
            drivers: String::new(),
            items: Vec::new(),
            error: Some(message),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfEntry {
    pub filename: String,
    pub size_bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub pdf_count: usize,
    pub pdfs: Vec<PdfEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolVersions {
    pub pdftotext: String,
    pub pdftoppm: String,
    pub pdftocairo: Option<String>,
    pub pdftohtml: Option<String>,
    pub tesseract: Option<String>,
}
