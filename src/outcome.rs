//! Outcome types for a repair call.
//!
//! A repair call always terminates in exactly one of three states, modelled
//! as the tagged union [`RepairOutcome`]: a structurally repaired document,
//! a salvage archive of whatever content survived, or a structured failure
//! listing every method that was tried and why it failed. The caller — an
//! HTTP handler, a CLI, a batch job — maps the variant to its own response
//! shape; this crate only guarantees that exactly one variant is populated
//! and that the failure variant carries the full attempt history.

use crate::error::StageError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One structural stage's failure, recorded in the order stages ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Human-readable method label, e.g. `"standard"`.
    pub method: String,
    /// Why the stage failed.
    pub reason: String,
}

impl AttemptRecord {
    pub fn new(method: impl Into<String>, error: &StageError) -> Self {
        Self {
            method: method.into(),
            reason: error.to_string(),
        }
    }
}

/// The product of a successful content salvage.
///
/// Not a valid PDF — a zip archive of whatever the deep-scan engine could
/// pull out of the wreck. Emptiness was decided by the counters below while
/// the archive was being written, never by re-opening the finished archive.
#[derive(Debug, Clone)]
pub struct SalvageArchive {
    /// The complete zip archive.
    pub bytes: Vec<u8>,
    /// Pages that contributed at least some text.
    pub page_count: usize,
    /// Raster images written as individual archive entries.
    pub image_count: usize,
}

/// Terminal result of one repair call. Exactly one variant per call.
#[derive(Debug, Clone)]
pub enum RepairOutcome {
    /// A structural stage produced a valid document again.
    Repaired {
        /// The re-serialised document.
        bytes: Vec<u8>,
        /// Label of the stage that succeeded, e.g. `"lenient reconstruction"`.
        method: String,
    },
    /// Structural repair was impossible; raw content was extracted instead.
    Salvaged { archive: SalvageArchive },
    /// Every structural stage and the salvage stage failed.
    Unrecoverable {
        /// One record per structural stage, in the order they were tried.
        attempts: Vec<AttemptRecord>,
    },
}

impl RepairOutcome {
    /// Suggested download filename for this outcome, derived from the
    /// caller's original filename (used for naming only, never parsed).
    ///
    /// `None` for [`RepairOutcome::Unrecoverable`] — there is nothing to
    /// name.
    pub fn suggested_filename(&self, original: &str) -> Option<String> {
        match self {
            RepairOutcome::Repaired { .. } => Some(format!("repaired_{original}")),
            RepairOutcome::Salvaged { .. } => {
                let stem = Path::new(original)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| original.to_string());
                Some(format!("salvaged_content_{stem}.zip"))
            }
            RepairOutcome::Unrecoverable { .. } => None,
        }
    }

    /// MIME type matching [`Self::suggested_filename`].
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            RepairOutcome::Repaired { .. } => Some("application/pdf"),
            RepairOutcome::Salvaged { .. } => Some("application/zip"),
            RepairOutcome::Unrecoverable { .. } => None,
        }
    }

    /// The output payload, if any.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            RepairOutcome::Repaired { bytes, .. } => Some(bytes),
            RepairOutcome::Salvaged { archive } => Some(&archive.bytes),
            RepairOutcome::Unrecoverable { .. } => None,
        }
    }

    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, RepairOutcome::Unrecoverable { .. })
    }

    /// Build the serialisable report for this outcome.
    pub fn report(&self, content_id: &crate::identity::ContentId) -> RepairReport {
        match self {
            RepairOutcome::Repaired { bytes, method } => RepairReport {
                content_id: content_id.to_string(),
                result: ReportKind::Repaired,
                method: Some(method.clone()),
                output_bytes: bytes.len(),
                page_count: None,
                image_count: None,
                attempts: Vec::new(),
            },
            RepairOutcome::Salvaged { archive } => RepairReport {
                content_id: content_id.to_string(),
                result: ReportKind::Salvaged,
                method: None,
                output_bytes: archive.bytes.len(),
                page_count: Some(archive.page_count),
                image_count: Some(archive.image_count),
                attempts: Vec::new(),
            },
            RepairOutcome::Unrecoverable { attempts } => RepairReport {
                content_id: content_id.to_string(),
                result: ReportKind::Unrecoverable,
                method: None,
                output_bytes: 0,
                page_count: None,
                image_count: None,
                attempts: attempts.clone(),
            },
        }
    }
}

/// Outcome discriminant in serialised reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Repaired,
    Salvaged,
    Unrecoverable,
}

/// JSON-friendly summary of one repair call (payload bytes excluded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairReport {
    /// Correlation key — matches every log line of this call.
    pub content_id: String,
    pub result: ReportKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub output_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_count: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attempts: Vec<AttemptRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ContentId;

    fn repaired() -> RepairOutcome {
        RepairOutcome::Repaired {
            bytes: vec![1, 2, 3],
            method: "standard".into(),
        }
    }

    fn salvaged() -> RepairOutcome {
        RepairOutcome::Salvaged {
            archive: SalvageArchive {
                bytes: vec![0x50, 0x4b],
                page_count: 2,
                image_count: 0,
            },
        }
    }

    #[test]
    fn repaired_filename_prefixes_original() {
        assert_eq!(
            repaired().suggested_filename("report.pdf").as_deref(),
            Some("repaired_report.pdf")
        );
        assert_eq!(repaired().content_type(), Some("application/pdf"));
    }

    #[test]
    fn salvaged_filename_uses_stem() {
        assert_eq!(
            salvaged().suggested_filename("quarterly report.pdf").as_deref(),
            Some("salvaged_content_quarterly report.zip")
        );
        assert_eq!(salvaged().content_type(), Some("application/zip"));
    }

    #[test]
    fn unrecoverable_has_no_filename_or_payload() {
        let outcome = RepairOutcome::Unrecoverable { attempts: vec![] };
        assert!(outcome.suggested_filename("x.pdf").is_none());
        assert!(outcome.content_type().is_none());
        assert!(outcome.payload().is_none());
        assert!(outcome.is_unrecoverable());
    }

    #[test]
    fn report_serialises_attempts_in_order() {
        let outcome = RepairOutcome::Unrecoverable {
            attempts: vec![
                AttemptRecord {
                    method: "standard".into(),
                    reason: "bad xref".into(),
                },
                AttemptRecord {
                    method: "lenient reconstruction".into(),
                    reason: "no pages".into(),
                },
            ],
        };
        let id = ContentId::of_bytes(b"x");
        let json = serde_json::to_string(&outcome.report(&id)).expect("serialise");
        let standard = json.find("standard").unwrap();
        let lenient = json.find("lenient").unwrap();
        assert!(standard < lenient, "attempt order must survive serialisation");
        assert!(json.contains(&id.to_string()));
    }
}
