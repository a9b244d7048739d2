//! Recovery stages, ordered cheapest-first.
//!
//! Each submodule implements exactly one recovery technique behind the same
//! capability interface, so the orchestrator can walk a fixed list instead
//! of knowing any stage by name. Keeping stages separate makes each
//! independently testable and lets us swap an engine without touching the
//! others.
//!
//! ## Stage order (a load-bearing contract)
//!
//! ```text
//! standard ──▶ lenient ──▶ deep scan ──▶ external tool ──▶ salvage
//! (lopdf      (lopdf       (pdfium       (qpdf            (pdfium text
//!  re-save)    page walk)   rebuild)      --recover)       + images → zip)
//! ```
//!
//! 1. [`standard`]  — tolerant parse and immediate re-serialise; fast, keeps
//!    full fidelity, only works on mildly inconsistent files
//! 2. [`lenient`]   — rebuild a fresh top-level structure from whatever pages
//!    are discoverable; trades annotations/forms for resilience
//! 3. [`deep_scan`] — low-level re-scan of the raw object stream, independent
//!    of the cross-reference table; most expensive in-process stage
//! 4. [`external`]  — hand the file to the external qpdf binary through a
//!    scoped scratch directory
//! 5. [`salvage`]   — no longer a repair: extract raw text and images into an
//!    archive so the user at least gets their content back

pub mod deep_scan;
pub mod external;
pub mod lenient;
pub mod salvage;
pub mod standard;

use crate::config::RepairConfig;
use crate::document::InputDocument;
use crate::error::StageError;
use crate::outcome::SalvageArchive;
use async_trait::async_trait;

/// One self-contained structural-repair technique.
///
/// A stage never lets an error escape: every engine failure is translated
/// into `Err(StageError)`, and the input document is never mutated. The
/// orchestrator holds stages as trait objects in a fixed ordered list.
#[async_trait]
pub trait RepairStrategy: Send + Sync {
    /// Stable human-readable label, used in logs and attempt records.
    fn label(&self) -> &'static str;

    /// Try to produce a valid document from the original bytes.
    async fn attempt(
        &self,
        doc: &InputDocument,
        config: &RepairConfig,
    ) -> Result<Vec<u8>, StageError>;
}

/// The last-resort stage. Distinct-shaped on purpose: success carries an
/// archive of extracted content, not a repaired document.
#[async_trait]
pub trait SalvageStrategy: Send + Sync {
    fn label(&self) -> &'static str;

    /// Extract whatever text and images survive into a zip archive.
    async fn salvage(
        &self,
        doc: &InputDocument,
        config: &RepairConfig,
    ) -> Result<SalvageArchive, StageError>;
}

/// The four structural stages in their contractual order.
pub fn default_strategies() -> Vec<Box<dyn RepairStrategy>> {
    vec![
        Box::new(standard::StandardRepair),
        Box::new(lenient::LenientReconstruction),
        Box::new(deep_scan::DeepRescan),
        Box::new(external::ExternalToolRepair),
    ]
}

/// The default salvage stage.
pub fn default_salvage() -> Box<dyn SalvageStrategy> {
    Box::new(salvage::ContentSalvage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order_is_the_contract() {
        let labels: Vec<&str> = default_strategies().iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            vec!["standard", "lenient reconstruction", "deep scan", "external tool"]
        );
    }

    #[test]
    fn salvage_is_not_a_structural_stage() {
        assert_eq!(default_salvage().label(), "content salvage");
    }
}
