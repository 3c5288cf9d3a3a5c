use std::collections::HashSet;

use crate::model::{Category, ExtractResponse, ManifestResult, Strain};

use super::classify::{
    classify_category_keywords, classify_strain, parse_item_details, parse_name,
    parse_supply_days, resolve_weight_and_category,
};
use super::drivers::{dedup_preserving_order, merge_strategy_results, names_in_reading_band};
use super::entity::{COMPANY_NOT_FOUND, ENTITY_NOT_LOCATED, company_from_tokens};
use super::ocr::{OcrToken, parse_tsv};
use super::packages::{
    item_details_in, parse_package_block, records_from_pages, split_package_blocks,
};
use super::tables::{clean_driver_cell, driver_names_in_rows, reconstruct_rows_from_fragments};

fn token(text: &str, left: i64, top: i64, width: i64, height: i64) -> OcrToken {
    OcrToken {
        text: text.to_string(),
        left,
        top,
        width,
        height,
    }
}

#[test]
fn split_package_blocks_slices_at_header_starts() {
    let text = "MANIFEST PREAMBLE\n1. Package | Shipped\nM00000000001\n2. Package | Shipped\nM00000000002\n";

    let blocks = split_package_blocks(text);
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0], "MANIFEST PREAMBLE\n");
    assert!(blocks[1].starts_with("1. Package | Shipped"));
    assert!(blocks[2].starts_with("2. Package | Shipped"));
}

#[test]
fn split_package_blocks_tolerates_missing_separator_and_case() {
    let text = "3. package Shipped\nM00000000003\n";

    let blocks = split_package_blocks(text);
    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].starts_with("3. package Shipped"));
}

#[test]
fn split_package_blocks_without_headers_keeps_whole_text() {
    let blocks = split_package_blocks("no packages here");
    assert_eq!(blocks, vec!["no packages here"]);
}

#[test]
fn item_details_window_ends_at_source_label() {
    let block = "1. Package | Shipped\nItem Details\nBrand: Blue Dream | Wgt: 2.83 g\nSource Harvest ABC\n";

    let details = item_details_in(block).unwrap();
    assert_eq!(details, "Brand: Blue Dream | Wgt: 2.83 g");
}

#[test]
fn item_details_window_ends_at_next_block_header() {
    let block = "Item Details\nQty: 1 each\n2. Package | Shipped trailing";

    let details = item_details_in(block).unwrap();
    assert_eq!(details, "Qty: 1 each");
}

#[test]
fn item_details_window_runs_to_end_of_stream() {
    let block = "Item Details\nQty: 2 each";
    assert_eq!(item_details_in(block).unwrap(), "Qty: 2 each");
    assert!(item_details_in("no label here").is_none());
}

#[test]
fn flower_weight_sets_category_and_full_weight_text() {
    let fields = parse_item_details("Brand: OG Kush | Wgt: 2.83 g | Supply: 30 day(s)");

    assert_eq!(fields.category, Category::Flower);
    assert_eq!(fields.weight, "2.83 g");
    assert_eq!(fields.name, "OG Kush");
    assert_eq!(fields.supply_days, "30");
}

#[test]
fn non_reference_weight_falls_back_to_qty_and_keywords() {
    let (weight, category) =
        resolve_weight_and_category("Wgt: 3.50 g | Qty: 1 each | oil for oral use");

    assert_eq!(weight, "1 each");
    assert_eq!(category, Category::Tincture);
}

#[test]
fn qty_fallback_with_tincture_keyword() {
    let fields = parse_item_details("Strain: Relief | Qty: 1 each | oil for oral");

    assert_eq!(fields.category, Category::Tincture);
    assert_eq!(fields.weight, "1 each");
}

#[test]
fn vape_keyword_requires_trailing_space() {
    assert_eq!(classify_category_keywords("vap cartridge"), Category::Vape);
    assert_eq!(classify_category_keywords("vapor"), Category::Unspecified);
}

#[test]
fn topical_and_edible_keywords_classify() {
    assert_eq!(classify_category_keywords("soothing balm 50mg"), Category::Topical);
    assert_eq!(classify_category_keywords("hand lotion"), Category::Topical);
    assert_eq!(classify_category_keywords("edb oral 10mg"), Category::Edible);
    assert_eq!(classify_category_keywords("plain flower"), Category::Unspecified);
}

#[test]
fn tincture_rule_outranks_topical_keywords() {
    // "oil for oral" is checked before the topical group.
    assert_eq!(
        classify_category_keywords("gel capsules oil for oral"),
        Category::Tincture
    );
}

#[test]
fn strain_rules_apply_in_priority_order() {
    assert_eq!(classify_strain("Sativa-dominant Indica cross"), Strain::Indica);
    assert_eq!(classify_strain("SATIVA"), Strain::Sativa);
    assert_eq!(classify_strain("hybrid blend"), Strain::Hybrid);
    assert_eq!(classify_strain("no markers"), Strain::NotSpecified);
}

#[test]
fn name_label_must_lead_the_details() {
    assert_eq!(parse_name("Brand: Blue Dream | rest").unwrap(), "Blue Dream");
    assert_eq!(parse_name("Strain: Gelato | rest").unwrap(), "Gelato");
    assert!(parse_name("prefix Brand: Blue Dream").is_none());
}

#[test]
fn supply_days_requires_unit_marker() {
    assert_eq!(parse_supply_days("Supply: 15 day(s)").unwrap(), "15");
    assert!(parse_supply_days("Supply: 15 grams").is_none());
}

#[test]
fn classification_is_idempotent() {
    let details = "Brand: OG Kush | Wgt: 2.83 g | Supply: 30 day(s) | Indica";
    assert_eq!(parse_item_details(details), parse_item_details(details));
}

#[test]
fn block_without_tracking_number_emits_no_record() {
    let mut seen = HashSet::new();
    let block = "1. Package | Shipped\n1A4000000000000000000123\nItem Details\nQty: 1 each";

    assert!(parse_package_block(block, &mut seen, 1).is_none());
    assert!(seen.is_empty());
}

#[test]
fn duplicate_tracking_numbers_are_document_scoped() {
    let mut seen = HashSet::new();
    let first = "1. Package | Shipped M00000000001\nItem Details\nQty: 1 each";
    let second = "2. Package | Shipped M00000000001\nItem Details\nQty: 2 each";

    let record = parse_package_block(first, &mut seen, 1).unwrap();
    assert_eq!(record.m_number, "M00000000001");
    assert_eq!(record.weight, "1 each");

    // First occurrence wins; the duplicate is discarded, not overwritten.
    assert!(parse_package_block(second, &mut seen, 2).is_none());
}

#[test]
fn unmatched_package_id_defaults_to_unknown() {
    let mut seen = HashSet::new();
    let block = "1. Package | Shipped M00000000009\nItem Details\nQty: 1 each";

    let record = parse_package_block(block, &mut seen, 1).unwrap();
    assert_eq!(record.package_id, "Unknown");
}

#[test]
fn package_id_shape_is_matched_inside_block() {
    let mut seen = HashSet::new();
    let block =
        "1. Package | Shipped\n1ABCD000000000000000000X M00000000010\nItem Details\nQty: 1 each";

    let record = parse_package_block(block, &mut seen, 1).unwrap();
    assert_eq!(record.package_id, "1ABCD000000000000000000X");
}

#[test]
fn missing_item_details_keeps_sentinel_fields() {
    let mut seen = HashSet::new();
    let block = "1. Package | Shipped M00000000011";

    let record = parse_package_block(block, &mut seen, 1).unwrap();
    assert_eq!(record.item_details, "Not Found");
    assert_eq!(record.name, "Not Found");
    assert_eq!(record.strain, Strain::NotSpecified);
    assert_eq!(record.supply_days, "Not Specified");
    assert_eq!(record.weight, "Not Specified");
    assert_eq!(record.category, Category::Unspecified);
}

#[test]
fn table_start_on_later_page_skips_earlier_pages() {
    // The cover page carries a tracking number but no table header; it must
    // not contribute a record once the header is found on page 2.
    let pages = vec![
        "Transport summary\nReference M00000000021".to_string(),
        "PACKAGE | SHIPPED\n1. Package | Shipped M00000000022\nItem Details\nQty: 1 each"
            .to_string(),
    ];

    let records = records_from_pages(&pages);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].m_number, "M00000000022");
    assert_eq!(records[0].index, 1);
}

#[test]
fn missing_table_header_fails_open_to_page_one() {
    // No page matches the table-header pattern at all; parsing still starts
    // from page 1 instead of returning no items.
    let pages = vec![
        "Manifest without a table\nM00000000031\nItem Details\nQty: 1 each".to_string(),
        "Source Harvest Lot 7".to_string(),
    ];

    let records = records_from_pages(&pages);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].m_number, "M00000000031");
    assert_eq!(records[0].weight, "1 each");
}

#[test]
fn strategy_merge_skips_failed_strategies_and_keeps_priority_order() {
    let results = vec![
        Vec::new(),
        vec!["A".to_string()],
        Vec::new(),
        vec!["B".to_string(), "A".to_string()],
    ];

    assert_eq!(
        merge_strategy_results(results),
        vec!["A".to_string(), "B".to_string()]
    );
}

#[test]
fn reading_band_collects_tokens_right_of_anchor() {
    let tokens = vec![
        token("Name", 10, 100, 40, 12),
        token("of", 55, 100, 15, 12),
        token("Person", 75, 100, 50, 12),
        token("Transporting", 130, 100, 90, 12),
        token("Jane", 240, 110, 40, 12),
        token("Doe", 290, 95, 35, 12),
        token("Below", 240, 200, 40, 12),
        token("Left", 5, 100, 30, 12),
    ];

    let names = names_in_reading_band(&tokens);
    assert_eq!(names, vec!["Jane".to_string(), "Doe".to_string()]);
}

#[test]
fn reading_band_accepts_single_token_anchor() {
    let tokens = vec![
        token("Name of Person Transporting", 10, 50, 200, 12),
        token("John", 230, 60, 40, 12),
    ];

    assert_eq!(names_in_reading_band(&tokens), vec!["John".to_string()]);
}

#[test]
fn reading_band_without_anchor_is_empty() {
    let tokens = vec![token("Person", 10, 10, 40, 12), token("Jane", 60, 12, 40, 12)];
    assert!(names_in_reading_band(&tokens).is_empty());
}

#[test]
fn dedup_preserves_first_seen_order() {
    let names = vec![
        "Jane Doe".to_string(),
        "John Roe".to_string(),
        "Jane Doe".to_string(),
        "John Roe".to_string(),
    ];

    assert_eq!(
        dedup_preserving_order(names),
        vec!["Jane Doe".to_string(), "John Roe".to_string()]
    );
}

#[test]
fn clean_driver_cell_strips_boilerplate() {
    assert_eq!(
        clean_driver_cell("Jane Doe Employee ID of Driver CCE12345").unwrap(),
        "Jane Doe"
    );
    assert!(clean_driver_cell("  ").is_none());
    assert!(clean_driver_cell("abc").is_none());
}

#[test]
fn driver_names_read_from_cell_after_anchor() {
    let rows = vec![
        vec![
            "Name of Person Transporting".to_string(),
            "Jane Doe CCE99".to_string(),
            "other".to_string(),
        ],
        vec!["Name of Person Transporting".to_string()],
        vec!["unrelated".to_string(), "row".to_string()],
    ];

    assert_eq!(driver_names_in_rows(&rows), vec!["Jane Doe".to_string()]);
}

#[test]
fn xml_fragments_group_into_rows_by_top() {
    let xml = concat!(
        r#"<text top="100" left="10" width="120" height="12" font="0">Name of Person Transporting</text>"#,
        r#"<text top="102" left="200" width="80" height="12" font="0"><b>Jane Doe</b></text>"#,
        r#"<text top="140" left="10" width="60" height="12" font="0">Vehicle</text>"#,
    );

    let rows = reconstruct_rows_from_fragments(xml);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], vec!["Name of Person Transporting", "Jane Doe"]);
    assert_eq!(rows[1], vec!["Vehicle"]);

    assert_eq!(driver_names_in_rows(&rows), vec!["Jane Doe".to_string()]);
}

#[test]
fn tsv_parse_keeps_word_level_rows() {
    let raw = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
               1\t1\t0\t0\t0\t0\t0\t0\t2448\t3168\t-1\t\n\
               5\t1\t1\t1\t1\t1\t10\t100\t40\t12\t96.5\tName\n\
               5\t1\t1\t1\t1\t2\t55\t100\t15\t12\t95.0\tof\n";

    let tokens = parse_tsv(raw);
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].text, "Name");
    assert_eq!(tokens[0].left, 10);
    assert_eq!(tokens[0].top, 100);
    assert_eq!(tokens[1].right(), 70);
}

#[test]
fn company_read_from_band_right_of_entity() {
    let tokens = vec![
        token("Originating", 10, 50, 80, 12),
        token("Entity", 95, 50, 50, 12),
        token("Green", 160, 55, 50, 12),
        token("Fields", 215, 48, 50, 12),
        token("LLC", 270, 52, 30, 12),
        token("Footer", 160, 300, 50, 12),
    ];

    assert_eq!(company_from_tokens(&tokens), "Green Fields");
}

#[test]
fn later_originating_anchor_overwrites_earlier() {
    let tokens = vec![
        token("Originating", 10, 50, 80, 12),
        token("filler", 95, 50, 30, 12),
        token("padding", 130, 50, 30, 12),
        token("more", 165, 50, 30, 12),
        token("Originating", 10, 200, 80, 12),
        token("Entity", 95, 200, 50, 12),
        token("Harvest", 160, 205, 60, 12),
        token("Co", 225, 198, 20, 12),
    ];

    assert_eq!(company_from_tokens(&tokens), "Harvest Co");
}

#[test]
fn entity_beyond_window_reports_not_located() {
    let tokens = vec![
        token("Originating", 10, 50, 80, 12),
        token("a", 95, 50, 10, 12),
        token("b", 110, 50, 10, 12),
        token("c", 125, 50, 10, 12),
        token("Entity", 140, 50, 50, 12),
    ];

    assert_eq!(company_from_tokens(&tokens), ENTITY_NOT_LOCATED);
}

#[test]
fn empty_reading_band_reports_no_company() {
    let tokens = vec![
        token("Originating", 10, 50, 80, 12),
        token("Entity", 95, 50, 50, 12),
    ];

    assert_eq!(company_from_tokens(&tokens), COMPANY_NOT_FOUND);
}

#[test]
fn boilerplate_only_band_reports_no_company() {
    let tokens = vec![
        token("Originating", 10, 50, 80, 12),
        token("Entity", 95, 50, 50, 12),
        token("LLC", 160, 50, 30, 12),
    ];

    assert_eq!(company_from_tokens(&tokens), COMPANY_NOT_FOUND);
}

#[test]
fn response_joins_drivers_and_renames_fields() {
    let result = ManifestResult {
        company: "Green Fields".to_string(),
        drivers: vec!["Jane Doe".to_string(), "John Roe".to_string()],
        items: Vec::new(),
    };

    let response = ExtractResponse::from_result(result);
    assert_eq!(response.drivers, "Jane Doe / John Roe");
    assert!(response.error.is_none());
}

#[test]
fn response_without_drivers_reports_not_found() {
    let result = ManifestResult {
        company: "Not Found".to_string(),
        drivers: Vec::new(),
        items: Vec::new(),
    };

    assert_eq!(ExtractResponse::from_result(result).drivers, "Not Found");
}

#[test]
fn error_response_serializes_error_field() {
    let response = ExtractResponse::from_error("PDF file not found: missing.pdf".to_string());
    let rendered = serde_json::to_string(&response).unwrap();

    assert!(rendered.contains("\"error\""));
    assert!(rendered.contains("missing.pdf"));
}
