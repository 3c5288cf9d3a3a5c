use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Category, Strain};

/// Gram values corresponding to standard flower-sale increments. An item
/// whose leading Wgt: value equals one of these exactly is flower.
pub const FLOWER_WEIGHTS: [&str; 6] = ["2.83", "5.66", "14.13", "8.49", "11.32", "14.15"];

/// Strain keywords in priority order; first match wins.
const STRAIN_RULES: [(&str, Strain); 3] = [
    ("indica", Strain::Indica),
    ("sativa", Strain::Sativa),
    ("hybrid", Strain::Hybrid),
];

/// Keyword fallback rules for category, in priority order; first match wins.
/// "vap " keeps its trailing space so unrelated substrings do not match.
const CATEGORY_RULES: [(&str, Category); 8] = [
    ("oil for oral", Category::Tincture),
    ("balm", Category::Topical),
    ("lotion", Category::Topical),
    ("cream", Category::Topical),
    ("topical", Category::Topical),
    ("gel", Category::Topical),
    ("edb oral", Category::Edible),
    ("vap ", Category::Vape),
];

static NAME_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:Brand|Strain):\s*([^|]+)").expect("valid name pattern"));
static SUPPLY_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Supply:\s*(\d+)\s*day\(s\)").expect("valid supply pattern")
});
static WGT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Wgt:\s*([^|]+)").expect("valid wgt pattern"));
static QTY_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Qty:\s*([^|]+)").expect("valid qty pattern"));
static LEADING_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\d+)").expect("valid decimal pattern"));

/// Parsed sub-fields of one item-details segment. Absent fields carry their
/// sentinel values rather than being omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFields {
    pub name: String,
    pub strain: Strain,
    pub supply_days: String,
    pub weight: String,
    pub category: Category,
}

impl Default for ItemFields {
    fn default() -> Self {
        Self {
            name: "Not Found".to_string(),
            strain: Strain::NotSpecified,
            supply_days: "Not Specified".to_string(),
            weight: "Not Specified".to_string(),
            category: Category::Unspecified,
        }
    }
}

/// Parse every sub-field of an item-details segment. Pure: identical text
/// always yields identical fields.
pub fn parse_item_details(item_details: &str) -> ItemFields {
    let (weight, category) = resolve_weight_and_category(item_details);

    ItemFields {
        name: parse_name(item_details).unwrap_or_else(|| "Not Found".to_string()),
        strain: classify_strain(item_details),
        supply_days: parse_supply_days(item_details).unwrap_or_else(|| "Not Specified".to_string()),
        weight,
        category,
    }
}

/// Product/brand name: the text after a leading "Brand:" or "Strain:" label,
/// up to the next field separator.
pub fn parse_name(item_details: &str) -> Option<String> {
    NAME_FIELD
        .captures(item_details)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().trim().to_string())
}

/// Days of supply: the numeric value between a "Supply:" label and its
/// "day(s)" unit marker.
pub fn parse_supply_days(item_details: &str) -> Option<String> {
    SUPPLY_FIELD
        .captures(item_details)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().to_string())
}

pub fn classify_strain(item_details: &str) -> Strain {
    let lower = item_details.to_ascii_lowercase();
    STRAIN_RULES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, strain)| *strain)
        .unwrap_or(Strain::NotSpecified)
}

pub fn classify_category_keywords(item_details: &str) -> Category {
    let lower = item_details.to_ascii_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Unspecified)
}

/// Weight/category decision policy:
///
/// 1. A "Wgt:" value whose leading decimal equals a flower increment makes
///    the item flower, and the full Wgt: text is the weight.
/// 2. Otherwise the "Qty:" value (or its sentinel) is the weight and the
///    keyword rules decide the category.
pub fn resolve_weight_and_category(item_details: &str) -> (String, Category) {
    if let Some(weight_value) = field_value(&WGT_FIELD, item_details) {
        if let Some(numeric) = LEADING_DECIMAL
            .captures(&weight_value)
            .and_then(|captures| captures.get(1))
        {
            if FLOWER_WEIGHTS.contains(&numeric.as_str()) {
                return (weight_value, Category::Flower);
            }
        }
    }

    let weight =
        field_value(&QTY_FIELD, item_details).unwrap_or_else(|| "Not Specified".to_string());
    (weight, classify_category_keywords(item_details))
}

fn field_value(pattern: &Regex, item_details: &str) -> Option<String> {
    pattern
        .captures(item_details)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().trim().to_string())
}
