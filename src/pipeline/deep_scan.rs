//! Stage 3: deep scan — hand the bytes to a rendering-grade engine.
//!
//! pdfium parses PDFs the way a viewer does: it ignores the cross-reference
//! table entirely when it has to and re-scans the raw byte stream for object
//! markers. Files that both lopdf stages reject often still open here. A
//! successful open followed by a full re-serialise through the engine yields
//! a clean document.
//!
//! pdfium is a native library and is not safe to call from async context, so
//! all engine work runs on the blocking pool. Binding failures (the shared
//! library is simply not installed) are reported as resource failures, which
//! keeps the pipeline moving instead of aborting the whole call.

use crate::config::RepairConfig;
use crate::document::InputDocument;
use crate::error::StageError;
use crate::pipeline::RepairStrategy;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use tracing::debug;

pub struct DeepRescan;

#[async_trait]
impl RepairStrategy for DeepRescan {
    fn label(&self) -> &'static str {
        "deep scan"
    }

    async fn attempt(
        &self,
        doc: &InputDocument,
        _config: &RepairConfig,
    ) -> Result<Vec<u8>, StageError> {
        let bytes = doc.share();
        tokio::task::spawn_blocking(move || rescan(&bytes))
            .await
            .map_err(|e| StageError::Resource {
                detail: format!("deep scan task panicked: {e}"),
            })?
    }
}

/// Bind the pdfium shared library, preferring a copy next to the executable
/// and falling back to the system-wide install. Shared with the salvage
/// stage, which runs on the same engine.
pub(crate) fn bind_engine() -> Result<Pdfium, StageError> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| StageError::Resource {
            detail: format!("pdfium library unavailable: {e:?}"),
        })
}

fn rescan(bytes: &[u8]) -> Result<Vec<u8>, StageError> {
    let pdfium = bind_engine()?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| StageError::Structural {
            detail: format!("engine rejected document: {e:?}"),
        })?;

    let pages = document.pages().len();
    if pages == 0 {
        return Err(StageError::EmptyResult {
            detail: "engine opened the document but found no pages".into(),
        });
    }
    debug!("deep scan opened {pages} page(s)");

    document.save_to_bytes().map_err(|e| StageError::Structural {
        detail: format!("engine re-serialise failed: {e:?}"),
    })
}
