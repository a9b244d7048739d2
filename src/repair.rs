//! The repair orchestrator and the crate's public entry points.
//!
//! [`RepairPipeline`] walks the ordered structural stages, short-circuiting
//! on the first success; only when every one of them has failed does it run
//! the salvage stage, and only when that fails too does it report the call
//! unrecoverable. The orchestrator itself never returns an error: every
//! stage failure is absorbed into the attempt history and every outcome is a
//! plain [`RepairOutcome`] value.
//!
//! All log lines of one call are prefixed with the input's content
//! identifier, so concurrent repairs interleave without ambiguity and a
//! specific upload can be traced end to end.

use crate::config::RepairConfig;
use crate::document::InputDocument;
use crate::error::RepairError;
use crate::identity::ContentId;
use crate::outcome::{AttemptRecord, RepairOutcome};
use crate::pipeline::{default_salvage, default_strategies, RepairStrategy, SalvageStrategy};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// The staged repair pipeline.
pub struct RepairPipeline {
    config: RepairConfig,
    strategies: Vec<Box<dyn RepairStrategy>>,
    salvage: Box<dyn SalvageStrategy>,
}

impl RepairPipeline {
    /// Pipeline with the default stage set in its contractual order.
    pub fn new(config: RepairConfig) -> Self {
        Self {
            config,
            strategies: default_strategies(),
            salvage: default_salvage(),
        }
    }

    /// Pipeline with a caller-supplied stage list. The list is walked in the
    /// order given.
    pub fn with_strategies(
        config: RepairConfig,
        strategies: Vec<Box<dyn RepairStrategy>>,
        salvage: Box<dyn SalvageStrategy>,
    ) -> Self {
        Self {
            config,
            strategies,
            salvage,
        }
    }

    /// Run the full pipeline over one document.
    ///
    /// Infallible by design: stage failures become attempt records, and the
    /// three possible endings are the three [`RepairOutcome`] variants.
    pub async fn run(&self, doc: &InputDocument) -> RepairOutcome {
        let id = doc.id();
        info!("[{id}] repair started ({} bytes)", doc.len());

        let mut attempts = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let label = strategy.label();
            info!("[{id}] trying {label}");
            match strategy.attempt(doc, &self.config).await {
                Ok(bytes) => {
                    info!("[{id}] {label} succeeded ({} bytes)", bytes.len());
                    return RepairOutcome::Repaired {
                        bytes,
                        method: label.to_string(),
                    };
                }
                Err(e) => {
                    warn!("[{id}] {label} failed: {e}");
                    attempts.push(AttemptRecord::new(label, &e));
                }
            }
        }

        let label = self.salvage.label();
        info!("[{id}] structural repair exhausted, trying {label}");
        match self.salvage.salvage(doc, &self.config).await {
            Ok(archive) => {
                info!(
                    "[{id}] {label} recovered text from {} page(s) and {} image(s)",
                    archive.page_count, archive.image_count
                );
                RepairOutcome::Salvaged { archive }
            }
            Err(e) => {
                error!("[{id}] {label} failed: {e}; document is unrecoverable");
                RepairOutcome::Unrecoverable { attempts }
            }
        }
    }
}

/// Repair a document held in memory.
pub async fn repair(bytes: impl Into<Vec<u8>>, config: &RepairConfig) -> RepairOutcome {
    let doc = InputDocument::new(bytes);
    RepairPipeline::new(config.clone()).run(&doc).await
}

/// Blocking wrapper around [`repair`] for non-async callers.
pub fn repair_sync(
    bytes: impl Into<Vec<u8>>,
    config: &RepairConfig,
) -> Result<RepairOutcome, RepairError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| RepairError::Internal(format!("failed to start async runtime: {e}")))?;
    Ok(runtime.block_on(repair(bytes, config)))
}

/// Result of a file-level repair: the outcome plus where the output landed.
#[derive(Debug)]
pub struct FileRepairReport {
    pub outcome: RepairOutcome,
    /// Correlation key of the input — matches every log line of this call.
    pub content_id: ContentId,
    /// `None` when the outcome was unrecoverable — nothing was written.
    pub written_to: Option<PathBuf>,
}

/// Repair a file on disk, writing the result next to it (or to `output`).
///
/// The destination defaults to the outcome's suggested filename in the
/// input's directory. The write is atomic: bytes land in a sibling temp file
/// which is renamed into place, so a crash never leaves a half-written
/// output behind. Nothing is written for an unrecoverable outcome.
pub async fn repair_file(
    input: &Path,
    output: Option<&Path>,
    config: &RepairConfig,
) -> Result<FileRepairReport, RepairError> {
    let data = tokio::fs::read(input).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => RepairError::FileNotFound {
            path: input.to_path_buf(),
        },
        ErrorKind::PermissionDenied => RepairError::PermissionDenied {
            path: input.to_path_buf(),
        },
        _ => RepairError::ReadFailed {
            path: input.to_path_buf(),
            source: e,
        },
    })?;

    let doc = InputDocument::new(data);
    let outcome = RepairPipeline::new(config.clone()).run(&doc).await;

    let content_id = *doc.id();

    let payload = match outcome.payload() {
        Some(payload) => payload,
        None => {
            return Ok(FileRepairReport {
                outcome,
                content_id,
                written_to: None,
            })
        }
    };

    let destination = match output {
        Some(path) => path.to_path_buf(),
        None => {
            let original = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document.pdf".to_string());
            // suggested_filename is Some for every payload-bearing outcome
            let name = outcome
                .suggested_filename(&original)
                .ok_or_else(|| RepairError::Internal("outcome has payload but no name".into()))?;
            input.parent().unwrap_or_else(|| Path::new(".")).join(name)
        }
    };

    write_atomic(&destination, payload).await?;
    info!("[{content_id}] output written to {}", destination.display());

    Ok(FileRepairReport {
        outcome,
        content_id,
        written_to: Some(destination),
    })
}

async fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), RepairError> {
    let staging = dest.with_extension("part");
    tokio::fs::write(&staging, bytes)
        .await
        .map_err(|e| RepairError::OutputWriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;
    tokio::fs::rename(&staging, dest)
        .await
        .map_err(|e| RepairError::OutputWriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StageError;
    use crate::outcome::SalvageArchive;
    use crate::pipeline::{RepairStrategy, SalvageStrategy};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        name: &'static str,
        result: Result<Vec<u8>, StageError>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RepairStrategy for Scripted {
        fn label(&self) -> &'static str {
            self.name
        }

        async fn attempt(
            &self,
            _doc: &InputDocument,
            _config: &RepairConfig,
        ) -> Result<Vec<u8>, StageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    struct ScriptedSalvage {
        result: Result<SalvageArchive, StageError>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SalvageStrategy for ScriptedSalvage {
        fn label(&self) -> &'static str {
            "content salvage"
        }

        async fn salvage(
            &self,
            _doc: &InputDocument,
            _config: &RepairConfig,
        ) -> Result<SalvageArchive, StageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn structural(detail: &str) -> StageError {
        StageError::Structural {
            detail: detail.into(),
        }
    }

    fn counters(n: usize) -> Vec<Arc<AtomicUsize>> {
        (0..n).map(|_| Arc::new(AtomicUsize::new(0))).collect()
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let c = counters(3);
        let pipeline = RepairPipeline::with_strategies(
            RepairConfig::default(),
            vec![
                Box::new(Scripted {
                    name: "a",
                    result: Ok(vec![1]),
                    calls: c[0].clone(),
                }),
                Box::new(Scripted {
                    name: "b",
                    result: Ok(vec![2]),
                    calls: c[1].clone(),
                }),
            ],
            Box::new(ScriptedSalvage {
                result: Err(structural("unused")),
                calls: c[2].clone(),
            }),
        );

        let outcome = pipeline.run(&InputDocument::new(b"x".to_vec())).await;
        match outcome {
            RepairOutcome::Repaired { bytes, method } => {
                assert_eq!(bytes, vec![1]);
                assert_eq!(method, "a");
            }
            other => panic!("expected Repaired, got {other:?}"),
        }
        assert_eq!(c[0].load(Ordering::SeqCst), 1);
        assert_eq!(c[1].load(Ordering::SeqCst), 0, "later stage must not run");
        assert_eq!(c[2].load(Ordering::SeqCst), 0, "salvage must not run");
    }

    #[tokio::test]
    async fn salvage_runs_once_after_all_stages_fail() {
        let c = counters(3);
        let pipeline = RepairPipeline::with_strategies(
            RepairConfig::default(),
            vec![
                Box::new(Scripted {
                    name: "a",
                    result: Err(structural("nope")),
                    calls: c[0].clone(),
                }),
                Box::new(Scripted {
                    name: "b",
                    result: Err(structural("still no")),
                    calls: c[1].clone(),
                }),
            ],
            Box::new(ScriptedSalvage {
                result: Ok(SalvageArchive {
                    bytes: vec![0x50, 0x4b],
                    page_count: 1,
                    image_count: 0,
                }),
                calls: c[2].clone(),
            }),
        );

        let outcome = pipeline.run(&InputDocument::new(b"x".to_vec())).await;
        assert!(matches!(outcome, RepairOutcome::Salvaged { .. }));
        assert_eq!(c[0].load(Ordering::SeqCst), 1);
        assert_eq!(c[1].load(Ordering::SeqCst), 1);
        assert_eq!(c[2].load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unrecoverable_keeps_the_full_ordered_history() {
        let c = counters(3);
        let pipeline = RepairPipeline::with_strategies(
            RepairConfig::default(),
            vec![
                Box::new(Scripted {
                    name: "a",
                    result: Err(structural("first reason")),
                    calls: c[0].clone(),
                }),
                Box::new(Scripted {
                    name: "b",
                    result: Err(StageError::Timeout { secs: 7 }),
                    calls: c[1].clone(),
                }),
            ],
            Box::new(ScriptedSalvage {
                result: Err(StageError::EmptyResult {
                    detail: "nothing".into(),
                }),
                calls: c[2].clone(),
            }),
        );

        let outcome = pipeline.run(&InputDocument::new(b"x".to_vec())).await;
        match outcome {
            RepairOutcome::Unrecoverable { attempts } => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].method, "a");
                assert!(attempts[0].reason.contains("first reason"));
                assert_eq!(attempts[1].method, "b");
                assert!(attempts[1].reason.contains('7'));
            }
            other => panic!("expected Unrecoverable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn repair_file_rejects_a_missing_input() {
        let err = repair_file(
            Path::new("/no/such/file.pdf"),
            None,
            &RepairConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepairError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn repair_file_writes_next_to_the_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.pdf");
        tokio::fs::write(&input, crate::test_pdf::minimal_pdf(1))
            .await
            .unwrap();

        let config = RepairConfig::builder()
            .scratch_dir(dir.path())
            .build()
            .unwrap();
        let report = repair_file(&input, None, &config).await.unwrap();

        match &report.outcome {
            RepairOutcome::Repaired { method, .. } => {
                assert_eq!(method, "standard");
                let written = report.written_to.as_deref().expect("output path");
                assert_eq!(written, dir.path().join("repaired_broken.pdf"));
                let on_disk = tokio::fs::read(written).await.unwrap();
                assert!(on_disk.starts_with(b"%PDF"));
            }
            other => panic!("a valid file must repair on the first stage: {other:?}"),
        }
    }
}
