//! In-memory PDF fixtures for tests.
//!
//! Not part of the public API. Fixtures are built with lopdf rather than
//! checked in as binary files so each test states exactly which structural
//! defect it exercises.

use lopdf::{dictionary, Document, Object, Stream};

fn media_box() -> Object {
    Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()])
}

/// A well-formed document with `page_count` blank pages.
pub fn minimal_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(page_count);
    for _ in 0..page_count {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box(),
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    save(doc)
}

/// A document whose trailer names a catalog object that does not exist.
///
/// The one page inside is an orphan: reachable only by scanning the raw
/// object table, never through the (broken) page tree.
pub fn pdf_with_dangling_root() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => media_box(),
        "Contents" => content_id,
    });
    doc.trailer.set("Root", Object::Reference((9999, 0)));
    save(doc)
}

/// Structurally coherent, but its page tree is genuinely empty.
pub fn pdf_without_pages() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => Object::Array(Vec::new()),
        "Count" => 0,
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    save(doc)
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut out = Vec::new();
    doc.save_to(&mut out).expect("in-memory save cannot fail");
    out
}
