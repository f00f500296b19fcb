//! End-to-end behavior of the text-redaction pipeline against in-memory
//! documents: matching, placeholder substitution, kerning upgrades,
//! multi-segment matches, and the degradation paths.

mod common;

use blackout::content::{parse_content, serialize_content, Token};
use blackout::{RedactionEngine, RedactionSettings};
use common::*;

fn engine(terms: &[&str]) -> RedactionEngine {
    RedactionEngine::new(RedactionSettings::with_terms(terms.iter().copied()))
}

#[test]
fn literal_term_is_replaced_by_same_length_placeholder() {
    init_tracing();
    let mut doc =
        document_with_page("BT /F1 12 Tf 72 720 Td (Invoice for John Smith, total $500) Tj ET");
    let before = flattened_page_text(&doc, 1);

    let summary = engine(&["John Smith"]).redact_text(&mut doc).unwrap();

    assert_eq!(summary.total_matches, 1);
    assert_eq!(summary.pages.len(), 1);
    assert!(summary.is_clean());

    let after = flattened_page_text(&doc, 1);
    assert_eq!(after.chars().count(), before.chars().count());
    assert!(after.starts_with("Invoice for "));
    assert!(after.ends_with(", total $500"));
    assert!(!after.to_lowercase().contains("john smith"));
    assert_eq!(&after[12..22], "          ");
}

#[test]
fn case_variants_are_covered() {
    let mut doc = document_with_pages(&[
        "BT /F1 10 Tf (Top Secret alpha notes) Tj ET",
        "BT /F1 10 Tf (ALPHA again) Tj ET",
    ]);
    let summary = engine(&["alpha"]).redact_text(&mut doc).unwrap();

    assert_eq!(summary.total_matches, 2);
    for page in 1..=2 {
        assert!(!flattened_page_text(&doc, page).to_lowercase().contains("alpha"));
    }
}

#[test]
fn regex_mode_matches_ssn_shape() {
    let mut doc = document_with_page("BT /F1 12 Tf (SSN: 123-45-6789 filed) Tj ET");
    let mut settings = RedactionSettings::with_terms([r"\d{3}-\d{2}-\d{4}"]);
    settings.use_regex = true;
    let summary = RedactionEngine::new(settings).redact_text(&mut doc).unwrap();

    assert_eq!(summary.total_matches, 1);
    let after = flattened_page_text(&doc, 1);
    assert!(after.starts_with("SSN: "));
    assert!(after.ends_with(" filed"));
    assert!(!after.contains("123-45-6789"));
    assert_eq!(after.chars().count(), "SSN: 123-45-6789 filed".len());
}

#[test]
fn empty_term_list_leaves_content_bytes_untouched() {
    let mut doc = document_with_page("BT /F1 12 Tf (nothing to hide) Tj ET");
    let before = page_content(&doc, 1);

    let summary = engine(&[]).redact_text(&mut doc).unwrap();

    assert_eq!(summary.total_matches, 0);
    assert!(summary.pages.is_empty());
    assert_eq!(page_content(&doc, 1), before);
}

#[test]
fn unmatched_terms_leave_content_bytes_untouched() {
    let mut doc = document_with_page("BT /F1 12 Tf (nothing to hide) Tj ET");
    let before = page_content(&doc, 1);

    let summary = engine(&["zebra"]).redact_text(&mut doc).unwrap();

    assert_eq!(summary.total_matches, 0);
    assert_eq!(summary.total_rewrites, 0);
    assert_eq!(page_content(&doc, 1), before);
}

#[test]
fn width_compensated_rewrite_upgrades_to_array_show() {
    let mut doc = document_with_page("BT /F1 12 Tf (Smith) Tj ET");
    let summary = engine(&["Smith"]).redact_text(&mut doc).unwrap();
    assert_eq!(summary.total_rewrites, 1);

    let tokens = parse_content(&page_content(&doc, 1)).unwrap();
    let array = tokens
        .iter()
        .find_map(|t| match t {
            Token::Array(items) => Some(items),
            _ => None,
        })
        .expect("operand should have been upgraded to an array");
    assert_eq!(array.len(), 2);
    let Token::Str(placeholder) = &array[0] else {
        panic!("first element should be the placeholder string");
    };
    assert_eq!(placeholder.bytes, b"     ".to_vec());
    let Token::Real(kerning) = array[1] else {
        panic!("second element should be the kerning number");
    };
    // Five glyphs go from 500 to 250 units at size 12: -1250 thousandths.
    assert!((kerning + 1250.0).abs() < 1e-6);
    assert!(tokens.contains(&Token::Operator("TJ".into())));
    assert!(!tokens.contains(&Token::Operator("Tj".into())));
}

#[test]
fn match_spanning_three_operators_is_fully_redacted() {
    init_tracing();
    let mut doc = document_with_page("BT /F1 12 Tf (Jo) Tj (hn Sm) Tj (ith) Tj ET");
    assert_eq!(flattened_page_text(&doc, 1), "John Smith");

    let summary = engine(&["John Smith"]).redact_text(&mut doc).unwrap();

    assert_eq!(summary.total_matches, 1);
    assert_eq!(summary.total_rewrites, 3);
    assert!(summary.is_clean());
    assert_eq!(flattened_page_text(&doc, 1), "          ");
}

#[test]
fn whole_word_search_skips_substrings() {
    let mut doc = document_with_page("BT /F1 12 Tf (concatenate) Tj ET");
    let before = page_content(&doc, 1);

    let mut settings = RedactionSettings::with_terms(["cat"]);
    settings.whole_word_search = true;
    let summary = RedactionEngine::new(settings).redact_text(&mut doc).unwrap();

    assert_eq!(summary.total_matches, 0);
    assert_eq!(page_content(&doc, 1), before);
}

#[test]
fn overlapping_terms_are_absorbed_without_double_length() {
    let mut doc = document_with_page("BT /F1 12 Tf (call John Smith today) Tj ET");
    let before_len = flattened_page_text(&doc, 1).chars().count();

    let summary = engine(&["John Smith", "Smith"]).redact_text(&mut doc).unwrap();

    assert_eq!(summary.total_matches, 2);
    let after = flattened_page_text(&doc, 1);
    assert_eq!(after.chars().count(), before_len);
    assert!(!after.to_lowercase().contains("smith"));
    assert!(after.starts_with("call "));
    assert!(after.ends_with(" today"));
}

#[test]
fn array_show_segment_is_redacted_in_place() {
    let mut doc = document_with_page("BT /F1 12 Tf [(Dear ) -120 (John) 5 (,)] TJ ET");
    let summary = engine(&["John"]).redact_text(&mut doc).unwrap();

    assert_eq!(summary.total_matches, 1);
    let after = flattened_page_text(&doc, 1);
    assert_eq!(after, "Dear     ,");

    // The untouched elements and spacing numbers survive.
    let tokens = parse_content(&page_content(&doc, 1)).unwrap();
    let array = tokens
        .iter()
        .find_map(|t| match t {
            Token::Array(items) => Some(items),
            _ => None,
        })
        .unwrap();
    assert!(array.contains(&Token::Integer(-120)));
}

#[test]
fn hex_string_operands_keep_their_form() {
    // "John" written as a hex string.
    let mut doc = document_with_page("BT /F1 12 Tf <4A6F686E> Tj ET");
    let summary = engine(&["John"]).redact_text(&mut doc).unwrap();

    assert_eq!(summary.total_matches, 1);
    assert_eq!(flattened_page_text(&doc, 1), "    ");
    let content = page_content(&doc, 1);
    let text = String::from_utf8_lossy(&content);
    assert!(
        text.contains("<20202020>"),
        "placeholder should serialize as hex: {text}"
    );
}

#[test]
fn malformed_page_falls_back_while_others_proceed() {
    init_tracing();
    let mut doc = document_with_pages(&[
        "BT /F1 12 Tf (secret", // unterminated string
        "BT /F1 12 Tf (secret) Tj ET",
    ]);
    let broken_before = page_content(&doc, 1);

    let summary = engine(&["secret"]).redact_text(&mut doc).unwrap();

    assert!(!summary.is_clean());
    assert!(!summary.warnings.is_empty());
    assert_eq!(summary.pages.len(), 2);
    assert!(summary.pages[0].skipped.is_some());
    assert_eq!(page_content(&doc, 1), broken_before);
    assert!(summary.pages[1].skipped.is_none());
    assert!(!flattened_page_text(&doc, 2).to_lowercase().contains("secret"));
}

#[test]
fn rewritten_page_reparses_and_round_trips() {
    let mut doc = document_with_page(
        "q 0.5 0 0 0.5 0 0 cm BT /F1 12 Tf (confidential payload) Tj ET Q 0 0 10 10 re f",
    );
    engine(&["payload"]).redact_text(&mut doc).unwrap();

    let content = page_content(&doc, 1);
    let tokens = parse_content(&content).unwrap();
    let reparsed = parse_content(&serialize_content(&tokens)).unwrap();
    assert_eq!(tokens, reparsed);

    // Non-text drawing instructions survive the rewrite.
    assert!(tokens.contains(&Token::Operator("cm".into())));
    assert!(tokens.contains(&Token::Operator("re".into())));
    assert!(tokens.contains(&Token::Operator("f".into())));
}

#[test]
fn quote_show_operator_is_redacted_without_upgrade() {
    let mut doc = document_with_page("BT /F1 12 Tf (classified) ' ET");
    let summary = engine(&["classified"]).redact_text(&mut doc).unwrap();

    assert_eq!(summary.total_rewrites, 1);
    assert!(summary.is_clean());
    let tokens = parse_content(&page_content(&doc, 1)).unwrap();
    assert!(tokens.contains(&Token::Operator("'".into())));
    assert_eq!(flattened_page_text(&doc, 1), "          ");
}

#[test]
fn summary_echoes_convert_to_image_flag() {
    let mut doc = document_with_page("BT /F1 12 Tf (x) Tj ET");
    let mut settings = RedactionSettings::with_terms(["x"]);
    settings.convert_to_image = true;
    let summary = RedactionEngine::new(settings).redact_text(&mut doc).unwrap();
    assert!(summary.convert_to_image);
}
