//! # pdf-revive
//!
//! Staged repair for corrupt PDF documents.
//!
//! A damaged PDF goes through up to five stages, ordered cheapest and most
//! faithful first. The first structural stage that produces a valid document
//! wins and no later stage runs; if all four fail, a distinct salvage stage
//! extracts raw text and images into a zip archive so the content survives
//! even when the document cannot.
//!
//! ```text
//! ┌──────────┐  ┌─────────┐  ┌───────────┐  ┌───────────────┐  ┌─────────┐
//! │ standard │─▶│ lenient │─▶│ deep scan │─▶│ external tool │─▶│ salvage │
//! └──────────┘  └─────────┘  └───────────┘  └───────────────┘  └─────────┘
//!   lopdf         lopdf        pdfium         qpdf --recover     text+images
//!   re-save       rebuild      re-scan        (subprocess)       → zip
//! ```
//!
//! The pipeline never throws past its boundary: every stage failure is
//! recorded and the call always ends in exactly one [`RepairOutcome`]
//! variant — `Repaired`, `Salvaged`, or `Unrecoverable` with the full
//! attempt history.
//!
//! ## Quick start
//!
//! ```no_run
//! use pdf_revive::{repair, RepairConfig, RepairOutcome};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RepairConfig::builder()
//!     .external_timeout_secs(60)
//!     .build()?;
//!
//! let bytes = std::fs::read("broken.pdf")?;
//! match repair(bytes, &config).await {
//!     RepairOutcome::Repaired { bytes, method } => {
//!         println!("repaired via {method}, {} bytes", bytes.len());
//!     }
//!     RepairOutcome::Salvaged { archive } => {
//!         println!(
//!             "unrepairable; salvaged {} page(s) of text, {} image(s)",
//!             archive.page_count, archive.image_count
//!         );
//!     }
//!     RepairOutcome::Unrecoverable { attempts } => {
//!         for a in attempts {
//!             eprintln!("{}: {}", a.method, a.reason);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! File-based callers can use [`repair_file`], which also picks an output
//! name (`repaired_<original>` or `salvaged_content_<stem>.zip`) and writes
//! it atomically. Non-async callers get [`repair_sync`].
//!
//! ## Runtime requirements
//!
//! The deep-scan and salvage stages need the pdfium shared library; the
//! external-tool stage needs a `qpdf` binary. Both are optional at runtime:
//! when one is missing its stages fail as ordinary resource errors and the
//! pipeline simply moves on.

pub mod config;
pub mod document;
pub mod error;
pub mod identity;
pub mod outcome;
pub mod pipeline;
pub mod repair;

#[doc(hidden)]
pub mod test_pdf;

pub use config::{RepairConfig, RepairConfigBuilder};
pub use document::InputDocument;
pub use error::{RepairError, StageError};
pub use identity::ContentId;
pub use outcome::{AttemptRecord, RepairOutcome, RepairReport, ReportKind, SalvageArchive};
pub use pipeline::{RepairStrategy, SalvageStrategy};
pub use repair::{repair, repair_file, repair_sync, FileRepairReport, RepairPipeline};
