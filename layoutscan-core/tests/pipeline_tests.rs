//! End-to-end pipeline tests over the TETML fixtures in `test_fixtures/`.
//!
//! Each test runs the full processor (read, build, classify, write) and
//! asserts on the JSON written to disk, the same files a caller consumes.

use layoutscan_core::{DocumentProcessor, Granularity, LineType, ParsingConfig};
use serde_json::Value;
use std::path::PathBuf;

// ============================================================================
// Fixture helpers
// ============================================================================

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

fn read_json(path: &std::path::Path) -> Value {
    let contents = std::fs::read_to_string(path)
        .unwrap_or_else(|_| panic!("Missing output: {}", path.display()));
    serde_json::from_str(&contents).expect("Invalid JSON output")
}

/// Process the handbook fixture and write its outputs into a fresh directory.
fn run_handbook(config: ParsingConfig) -> (tempfile::TempDir, Vec<PathBuf>) {
    let processor = DocumentProcessor::new(config).unwrap();
    let processed = processor
        .process_file(&fixture("handbook.tetml"), "handbook-1")
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let written = processor
        .write_outputs(&processed, dir.path(), "handbook")
        .unwrap();
    (dir, written)
}

fn line_types(page: &Value) -> Vec<String> {
    page["lines"]
        .as_array()
        .unwrap()
        .iter()
        .map(|line| line["lineType"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Line view
// ============================================================================

#[test]
fn test_line_view_document_counts() {
    let (dir, written) = run_handbook(ParsingConfig::default());
    assert_eq!(written, vec![dir.path().join("handbook.line.json")]);

    let view = read_json(&written[0]);
    assert_eq!(view["documentId"], "handbook-1");
    assert_eq!(view["documentFileName"], "handbook.tetml");
    assert_eq!(view["noPagesInDoc"], 3);
    assert_eq!(view["noLinesInDoc"], 17);
    assert_eq!(view["noHeadingsInDoc"], 4);
    assert_eq!(view["noListsBulletInDoc"], 1);
    assert_eq!(view["noListsNumberInDoc"], 0);
    assert_eq!(view["noTablesInDoc"], 1);
    assert_eq!(view["noLinesHeader"], 3);
    assert_eq!(view["noLinesFooter"], 3);
    assert_eq!(view["noLinesToc"], 0);
}

#[test]
fn test_line_view_classifies_every_page() {
    let (_dir, written) = run_handbook(ParsingConfig::default());
    let view = read_json(&written[0]);
    let pages = view["pages"].as_array().unwrap();

    assert_eq!(
        line_types(&pages[0]),
        vec!["header", "heading:1", "heading:2", "body", "footer"]
    );
    assert_eq!(
        line_types(&pages[1]),
        vec!["header", "heading:1", "list-bullet", "list-bullet", "footer"]
    );
    assert_eq!(
        line_types(&pages[2]),
        vec!["header", "heading:1", "table", "table", "table", "table", "footer"]
    );
}

#[test]
fn test_line_view_table_positions_and_placeholder() {
    let (_dir, written) = run_handbook(ParsingConfig::default());
    let view = read_json(&written[0]);
    let lines = view["pages"][2]["lines"].as_array().unwrap();

    // Row 2 starts with an empty cell
    let placeholder = &lines[4];
    assert_eq!(placeholder["text"], "");
    assert_eq!(placeholder["rowNo"], 2);
    assert_eq!(placeholder["columnNo"], 1);

    let monthly = &lines[5];
    assert_eq!(monthly["text"], "Monthly");
    assert_eq!(monthly["rowNo"], 2);
    assert_eq!(monthly["columnNo"], 2);
    assert_eq!(monthly["coordLLX"], 250.0);

    // Non-table lines carry no table position
    assert!(lines[1].get("rowNo").is_none());
}

#[test]
fn test_line_numbers_restart_per_page_and_paragraph() {
    let (_dir, written) = run_handbook(ParsingConfig::default());
    let view = read_json(&written[0]);
    let page2 = view["pages"][1]["lines"].as_array().unwrap();

    assert_eq!(page2[0]["lineNoPage"], 1);
    assert_eq!(page2[0]["lineNo"], 1);
    // Both bullets share one paragraph
    assert_eq!(page2[2]["paragraphNo"], 3);
    assert_eq!(page2[3]["paragraphNo"], 3);
    assert_eq!(page2[3]["lineNo"], 2);
    assert_eq!(page2[3]["lineNoPage"], 4);
}

#[test]
fn test_bookmarks_in_line_view() {
    let (_dir, written) = run_handbook(ParsingConfig::default());
    let view = read_json(&written[0]);
    let bookmarks = view["bookmarks"].as_array().unwrap();

    assert_eq!(bookmarks.len(), 4);
    assert_eq!(bookmarks[1]["title"], "Background");
    assert_eq!(bookmarks[1]["level"], 2);
}

// ============================================================================
// Heading TOC
// ============================================================================

#[test]
fn test_heading_toc_written_with_context() {
    let mut config = ParsingConfig::default();
    config.output.heading_toc = true;
    let (dir, written) = run_handbook(config);
    assert_eq!(written.len(), 2);
    assert_eq!(written[1], dir.path().join("handbook.line_heading.json"));

    let toc = read_json(&written[1]);
    assert_eq!(toc["documentId"], "handbook-1");
    let entries = toc["toc"].as_array().unwrap();
    let titles: Vec<&str> = entries
        .iter()
        .map(|entry| entry["headingText"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        vec!["1. Introduction", "1.1 Background", "2. Method", "3. Care"]
    );
    assert_eq!(entries[1]["headingLevel"], 2);
    assert_eq!(entries[2]["pageNo"], 2);

    // Context lines are the following body lines, padded to the configured count
    assert_eq!(entries[2]["headingCtxLine1"], "• Switch the unit on");
    assert_eq!(entries[2]["headingCtxLine2"], "• Wait for the green lamp");
    assert_eq!(entries[3]["headingCtxLine1"], "");
    assert_eq!(entries[3]["headingCtxLine3"], "");
    assert!(entries[3].get("headingCtxLine4").is_none());
}

#[test]
fn test_disabled_heading_detection_writes_no_toc() {
    let mut config = ParsingConfig::default();
    config.output.heading_toc = true;
    for rule in &mut config.pipeline.rules {
        if rule.name == "HeadingDetection" {
            rule.enabled = false;
        }
    }
    let (_dir, written) = run_handbook(config);
    assert_eq!(written.len(), 1);

    let view = read_json(&written[0]);
    assert_eq!(view["noHeadingsInDoc"], 0);
    assert_eq!(view["noTablesInDoc"], 1);
}

// ============================================================================
// Page and word views
// ============================================================================

#[test]
fn test_page_view_joins_paragraph_lines() {
    let mut config = ParsingConfig::default();
    config.output.granularity = Granularity::Page;
    let (dir, written) = run_handbook(config);
    assert_eq!(written, vec![dir.path().join("handbook.page.json")]);

    let view = read_json(&written[0]);
    assert_eq!(view["noPagesInDoc"], 3);
    let paragraphs = view["pages"][1]["paragraphs"].as_array().unwrap();
    assert_eq!(paragraphs.len(), 4);
    assert_eq!(
        paragraphs[2]["text"],
        "• Switch the unit on • Wait for the green lamp"
    );
    assert!(view["pages"][0].get("lines").is_none());
}

#[test]
fn test_word_view_splits_lines() {
    let mut config = ParsingConfig::default();
    config.output.granularity = Granularity::Word;
    let (dir, written) = run_handbook(config);
    assert_eq!(written, vec![dir.path().join("handbook.word.json")]);

    let view = read_json(&written[0]);
    assert_eq!(view["noWordsInDoc"], 37);
    let first_line = &view["pages"][0]["paragraphs"][0]["lines"][0];
    let words: Vec<&str> = first_line["words"]
        .as_array()
        .unwrap()
        .iter()
        .map(|word| word["text"].as_str().unwrap())
        .collect();
    assert_eq!(words, vec!["Operator", "Handbook"]);
}

// ============================================================================
// Processor API
// ============================================================================

#[test]
fn test_classification_only_runs_for_line_granularity() {
    let mut config = ParsingConfig::default();
    config.output.granularity = Granularity::Page;
    let processor = DocumentProcessor::new(config).unwrap();
    let processed = processor
        .process_file(&fixture("handbook.tetml"), "handbook-1")
        .unwrap();

    assert!(processed.heading_toc.is_none());
    assert_eq!(processed.document.count_line_type(LineType::Body), 17);
}

#[test]
fn test_missing_input_reports_path() {
    let processor = DocumentProcessor::new(ParsingConfig::default()).unwrap();
    let err = processor
        .process_file(&fixture("does_not_exist.tetml"), "x")
        .unwrap_err();
    assert!(err.to_string().contains("does_not_exist.tetml"));
}

#[test]
fn test_rule_override_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let rules_path = dir.path().join("heading_rules.json");
    DocumentProcessor::new(ParsingConfig::default())
        .unwrap()
        .export_heading_rules(&rules_path)
        .unwrap();

    let mut config = ParsingConfig::default();
    config.heading.rule_file = Some(rules_path);
    let (_dir, written) = run_handbook(config);
    let view = read_json(&written[0]);
    assert_eq!(view["noHeadingsInDoc"], 4);
}

// ============================================================================
// Config errors
// ============================================================================

#[test]
fn test_config_with_missing_rule_file_fails_processor() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("layoutscan.yaml");
    std::fs::write(
        &config_path,
        "heading:\n  rule_file: /nonexistent/heading_rules.json\n",
    )
    .unwrap();

    let config = ParsingConfig::load_or_default(Some(&config_path)).unwrap();
    let err = DocumentProcessor::new(config).err().unwrap();
    assert!(format!("{err:#}").contains("heading_rules.json"));
}

#[test]
fn test_malformed_config_is_not_replaced_by_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("layoutscan.yaml");
    std::fs::write(&config_path, "output:\n  granularity: [line\n").unwrap();

    assert!(ParsingConfig::load_or_default(Some(&config_path)).is_err());
}
