//! Shared helpers for integration tests.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Build a PDF at `path` with one page per entry in `pages`. Each page
/// carries its text in a real Helvetica text layer so the text-layer
/// extractor sees it.
pub fn build_pdf(path: &Path, pages: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        // One text block per line so multi-line bodies extract as lines
        let mut operations = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let y = 700 - 20 * i as i64;
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), y.into()]),
                Operation::new("Tj", vec![Object::string_literal(line)]),
                Operation::new("ET", vec![]),
            ]);
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("save test pdf");
}

/// Build a single-page payslip whose body names a payment date.
pub fn build_payslip(path: &Path, date_line: &str) {
    let body = format!("ACME Corp Payslip\n{}\nNet pay: 1234.56", date_line);
    build_pdf(path, &[&body]);
}

/// Extract the merged output's full text for order assertions.
pub fn output_text(path: &Path) -> String {
    let bytes = std::fs::read(path).expect("read merged output");
    pdf_extract::extract_text_from_mem(&bytes).expect("extract merged text")
}
