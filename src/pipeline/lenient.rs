//! Stage 2: lenient reconstruction — keep the pages, rebuild everything else.
//!
//! Runs when the document parses but its top-level structure is too broken
//! for a straight re-save: a dangling catalog, a mangled page tree, stale
//! trailer entries. Instead of trusting the document's own skeleton, this
//! stage collects every page it can discover and grafts them onto a fresh
//! `Pages`/`Catalog` pair. Page discovery is two-tier: the ordinary page-tree
//! walk first, then a raw scan of all parsed objects for `/Type /Page`
//! dictionaries when the tree is unreachable.
//!
//! The fidelity trade is deliberate: annotations, forms and any other
//! document-level feature hanging off the old catalog are dropped. A PDF
//! that opens with its content intact beats a faithful wreck.

use crate::config::RepairConfig;
use crate::document::InputDocument;
use crate::error::StageError;
use crate::pipeline::RepairStrategy;
use async_trait::async_trait;
use lopdf::{dictionary, Document, Object, ObjectId};
use tracing::debug;

pub struct LenientReconstruction;

#[async_trait]
impl RepairStrategy for LenientReconstruction {
    fn label(&self) -> &'static str {
        "lenient reconstruction"
    }

    async fn attempt(
        &self,
        doc: &InputDocument,
        _config: &RepairConfig,
    ) -> Result<Vec<u8>, StageError> {
        let bytes = doc.share();
        tokio::task::spawn_blocking(move || reconstruct(&bytes))
            .await
            .map_err(|e| StageError::Resource {
                detail: format!("lenient reconstruction task panicked: {e}"),
            })?
    }
}

fn reconstruct(bytes: &[u8]) -> Result<Vec<u8>, StageError> {
    let parsed = Document::load_mem(bytes).map_err(|e| StageError::Structural {
        detail: format!("parse failed: {e}"),
    })?;

    if parsed.is_encrypted() {
        return Err(StageError::Structural {
            detail: "document is encrypted".into(),
        });
    }

    let page_ids = discover_pages(&parsed);
    if page_ids.is_empty() {
        return Err(StageError::EmptyResult {
            detail: "no discoverable pages".into(),
        });
    }
    debug!("lenient reconstruction found {} page(s)", page_ids.len());

    let mut rebuilt = parsed;

    // Fresh top-level structure: new page-tree node, new catalog, clean
    // trailer. Every discovered page is reparented onto the new node;
    // annotation references are dropped rather than risking dangling ones.
    let pages_id = rebuilt.new_object_id();
    for &page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = rebuilt.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
            dict.remove(b"Annots");
        }
    }
    rebuilt.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids
                .iter()
                .map(|&id| Object::Reference(id))
                .collect::<Vec<_>>(),
            "Count" => page_ids.len() as i64,
        }),
    );
    let catalog_id = rebuilt.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    rebuilt.trailer = lopdf::Dictionary::new();
    rebuilt.trailer.set("Root", catalog_id);

    rebuilt.prune_objects();
    rebuilt.renumber_objects();

    let mut out = Vec::new();
    rebuilt.save_to(&mut out).map_err(|e| StageError::Structural {
        detail: format!("re-serialise failed: {e}"),
    })?;
    Ok(out)
}

/// Pages from the page tree, falling back to a raw object scan when the
/// tree is unreachable (broken catalog, missing intermediate nodes).
fn discover_pages(doc: &Document) -> Vec<ObjectId> {
    let from_tree: Vec<ObjectId> = doc.get_pages().into_values().collect();
    if !from_tree.is_empty() {
        return from_tree;
    }
    doc.objects
        .iter()
        .filter(|(_, object)| is_page_dict(object))
        .map(|(&id, _)| id)
        .collect()
}

fn is_page_dict(object: &Object) -> bool {
    object
        .as_dict()
        .and_then(|dict| dict.get(b"Type"))
        .and_then(Object::as_name)
        .map(|name| name == b"Page")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pdf;

    #[test]
    fn rebuilds_when_the_catalog_is_dangling() {
        let input = test_pdf::pdf_with_dangling_root();
        let out = reconstruct(&input).expect("lenient reconstruction should succeed");
        let reparsed = Document::load_mem(&out).expect("output must parse");
        assert_eq!(reparsed.get_pages().len(), 1, "the orphaned page came back");
    }

    #[test]
    fn keeps_page_order_from_an_intact_tree() {
        let input = test_pdf::minimal_pdf(3);
        let out = reconstruct(&input).expect("reconstruction of a valid file");
        let reparsed = Document::load_mem(&out).expect("output must parse");
        assert_eq!(reparsed.get_pages().len(), 3);
    }

    #[test]
    fn fails_with_empty_result_when_no_pages_exist() {
        let input = test_pdf::pdf_without_pages();
        let err = reconstruct(&input).unwrap_err();
        assert!(matches!(err, StageError::EmptyResult { .. }), "got: {err}");
    }

    #[test]
    fn garbage_is_a_structural_failure() {
        let err = reconstruct(&[0u8; 64]).unwrap_err();
        assert!(matches!(err, StageError::Structural { .. }));
    }
}
