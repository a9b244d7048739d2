//! Last resort: content salvage.
//!
//! Not a repair. When no stage can produce a valid document, this stage
//! gives up on structure entirely and pulls raw content out of the wreck:
//! every string of text the engine can decode and every raster image it can
//! recover, packed into a zip archive. The user loses the document but keeps
//! their content.
//!
//! Whether the salvage found anything is decided by counters maintained
//! while the archive is written — a finished archive is never re-opened to
//! ask whether it is empty.

use crate::config::RepairConfig;
use crate::document::InputDocument;
use crate::error::StageError;
use crate::outcome::SalvageArchive;
use crate::pipeline::{deep_scan, SalvageStrategy};
use async_trait::async_trait;
use pdfium_render::prelude::PdfPageObjectsCommon;
use std::io::{Cursor, Write};
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub struct ContentSalvage;

#[async_trait]
impl SalvageStrategy for ContentSalvage {
    fn label(&self) -> &'static str {
        "content salvage"
    }

    async fn salvage(
        &self,
        doc: &InputDocument,
        _config: &RepairConfig,
    ) -> Result<SalvageArchive, StageError> {
        let bytes = doc.share();
        tokio::task::spawn_blocking(move || extract(&bytes))
            .await
            .map_err(|e| StageError::Resource {
                detail: format!("content salvage task panicked: {e}"),
            })?
    }
}

fn extract(bytes: &[u8]) -> Result<SalvageArchive, StageError> {
    let pdfium = deep_scan::bind_engine()?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| StageError::Structural {
            detail: format!("engine rejected document: {e:?}"),
        })?;

    let mut text = String::new();
    let mut pages_with_text = 0usize;
    let mut images: Vec<(String, Vec<u8>)> = Vec::new();

    for (index, page) in document.pages().iter().enumerate() {
        let page_no = index + 1;

        let page_text = page
            .text()
            .map(|t| t.all())
            .unwrap_or_default();
        if !page_text.trim().is_empty() {
            text.push_str(&format!("--- PAGE {page_no} ---\n"));
            text.push_str(page_text.trim_end());
            text.push_str("\n\n");
            pages_with_text += 1;
        }

        // Images are numbered by their ordinal among the page's images, not
        // by their position among all page objects, so a page whose first
        // image follows a run of text objects still yields image_pN_0.
        let mut image_ordinal = 0usize;
        for object in page.objects().iter() {
            let Some(image_object) = object.as_image_object() else {
                continue;
            };
            let ordinal = image_ordinal;
            image_ordinal += 1;
            match image_object.get_raw_image() {
                Ok(raw) => {
                    let mut png = Vec::new();
                    if let Err(e) = raw.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
                    {
                        warn!("page {page_no}: dropping unencodable image: {e}");
                        continue;
                    }
                    images.push((image_entry_name(page_no, ordinal), png));
                }
                Err(e) => {
                    // A single undecodable image must not sink the salvage.
                    warn!("page {page_no}: could not decode image object: {e:?}");
                }
            }
        }
    }

    if pages_with_text == 0 && images.is_empty() {
        return Err(StageError::EmptyResult {
            detail: "no text or images could be extracted".into(),
        });
    }
    debug!(
        "salvage extracted text from {pages_with_text} page(s) and {} image(s)",
        images.len()
    );

    let image_count = images.len();
    let archive = write_archive(&text, pages_with_text, images)?;
    Ok(SalvageArchive {
        bytes: archive,
        page_count: pages_with_text,
        image_count,
    })
}

fn image_entry_name(page_no: usize, image_ordinal: usize) -> String {
    format!("image_p{page_no}_{image_ordinal}.png")
}

fn write_archive(
    text: &str,
    pages_with_text: usize,
    images: Vec<(String, Vec<u8>)>,
) -> Result<Vec<u8>, StageError> {
    let zip_failure = |e: &dyn std::fmt::Display| StageError::Resource {
        detail: format!("archive write failed: {e}"),
    };
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    if pages_with_text > 0 {
        writer
            .start_file("extracted_text.txt", options)
            .map_err(|e| zip_failure(&e))?;
        writer
            .write_all(text.as_bytes())
            .map_err(|e| zip_failure(&e))?;
    }
    for (name, png) in images {
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| zip_failure(&e))?;
        writer.write_all(&png).map_err(|e| zip_failure(&e))?;
    }

    let cursor = writer.finish().map_err(|e| zip_failure(&e))?;
    Ok(cursor.into_inner())
}
