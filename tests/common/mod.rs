//! Shared fixtures: minimal in-memory PDF documents built with lopdf.

#![allow(dead_code)]

use blackout::content::parse_content;
use blackout::extract::extract_segments;
use blackout::fonts::build_font_table;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// Install a test subscriber so `RUST_LOG` works inside tests.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A Type1 font with a widths table that distinguishes spaces (250) from
/// every other glyph (500), so placeholder substitution produces a
/// measurable width delta.
fn varying_width_font() -> lopdf::Dictionary {
    let widths: Vec<Object> = (32..=126)
        .map(|code| if code == 32 { 250.into() } else { 500.into() })
        .collect();
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "FirstChar" => 32,
        "LastChar" => 126,
        "Widths" => widths,
    }
}

/// One document, one page per content string, letter-sized, with the
/// varying-width font available as /F1.
pub fn document_with_pages(contents: &[&str]) -> Document {
    document_with_pages_sized(contents, 612, 792)
}

pub fn document_with_page(content: &str) -> Document {
    document_with_pages(&[content])
}

pub fn document_with_page_sized(content: &str, width: i64, height: i64) -> Document {
    document_with_pages_sized(&[content], width, height)
}

pub fn document_with_pages_sized(contents: &[&str], width: i64, height: i64) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(varying_width_font());

    let mut kids: Vec<Object> = Vec::new();
    for content in contents {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

pub fn page_id(doc: &Document, number: u32) -> ObjectId {
    doc.get_pages()[&number]
}

pub fn page_content(doc: &Document, number: u32) -> Vec<u8> {
    doc.get_page_content(page_id(doc, number)).unwrap()
}

/// Reconstruct the flattened logical text of a page from its current
/// content stream.
pub fn flattened_page_text(doc: &Document, number: u32) -> String {
    let id = page_id(doc, number);
    let content = doc.get_page_content(id).unwrap();
    let tokens = parse_content(&content).unwrap();
    extract_segments(&tokens, &build_font_table(doc, id)).flattened
}
