//! Stage 1: standard repair — tolerant parse, immediate re-serialise.
//!
//! lopdf reads the document the way the PDF standard intends it to be read
//! and rebuilds the cross-reference table and stream lengths on save. That fixes
//! the most common corruption (truncated or stale xref, wrong `/Length`
//! entries) at full fidelity and minimal cost, which is why this stage runs
//! first. It deliberately refuses anything it cannot parse into a coherent
//! structure: aggressive reconstruction belongs to the later stages.

use crate::config::RepairConfig;
use crate::document::InputDocument;
use crate::error::StageError;
use crate::pipeline::RepairStrategy;
use async_trait::async_trait;
use lopdf::{Document, Object};

pub struct StandardRepair;

#[async_trait]
impl RepairStrategy for StandardRepair {
    fn label(&self) -> &'static str {
        "standard"
    }

    async fn attempt(
        &self,
        doc: &InputDocument,
        _config: &RepairConfig,
    ) -> Result<Vec<u8>, StageError> {
        let bytes = doc.share();
        tokio::task::spawn_blocking(move || resave(&bytes))
            .await
            .map_err(|e| StageError::Resource {
                detail: format!("standard repair task panicked: {e}"),
            })?
    }
}

fn resave(bytes: &[u8]) -> Result<Vec<u8>, StageError> {
    let mut parsed = Document::load_mem(bytes).map_err(|e| StageError::Structural {
        detail: format!("parse failed: {e}"),
    })?;

    if parsed.is_encrypted() {
        return Err(StageError::Structural {
            detail: "document is encrypted".into(),
        });
    }

    // Coherence check: the trailer must name a catalog that actually leads
    // to at least one page. A parse that yields no usable structure is a
    // failure here, not a document we should re-emit.
    let catalog_ok = parsed
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .and_then(|id| parsed.get_object(id))
        .and_then(Object::as_dict)
        .is_ok();
    if !catalog_ok {
        return Err(StageError::Structural {
            detail: "trailer has no resolvable document catalog".into(),
        });
    }
    if parsed.get_pages().is_empty() {
        return Err(StageError::Structural {
            detail: "page tree yields no pages".into(),
        });
    }

    let mut out = Vec::new();
    parsed.save_to(&mut out).map_err(|e| StageError::Structural {
        detail: format!("re-serialise failed: {e}"),
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pdf;

    #[test]
    fn resaves_a_well_formed_document() {
        let input = test_pdf::minimal_pdf(2);
        let out = resave(&input).expect("standard repair should succeed");
        assert!(out.starts_with(b"%PDF"));
        let reparsed = Document::load_mem(&out).expect("output must parse");
        assert_eq!(reparsed.get_pages().len(), 2);
    }

    #[test]
    fn rejects_garbage() {
        let err = resave(b"this is not a pdf at all").unwrap_err();
        assert!(matches!(err, StageError::Structural { .. }));
    }

    #[test]
    fn rejects_a_dangling_catalog() {
        let input = test_pdf::pdf_with_dangling_root();
        let err = resave(&input).unwrap_err();
        assert!(matches!(err, StageError::Structural { .. }), "got: {err}");
    }
}
