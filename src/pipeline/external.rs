//! Stage 4: external tool — shell out to qpdf's recovery mode.
//!
//! qpdf carries its own battle-tested reconstruction logic; the pipeline
//! reaches for it only after every in-process engine has failed. Crossing the
//! process boundary brings two hazards the in-process stages never face, and
//! this module exists to contain both:
//!
//! * **Scratch files.** The tool speaks filesystem, not memory, so the input
//!   bytes must touch disk. [`ScratchPair`] scopes that exposure: one unique
//!   directory per invocation, named after the content identifier, removed on
//!   every exit path — success, tool failure, timeout, panic.
//! * **A wedged child.** The child process is the only thing in the pipeline
//!   we do not control. Its wait is raced against the configured wall-clock
//!   budget; on expiry the child is killed and the stage reports an ordinary
//!   timeout failure, so a hung tool can never hang a repair call.

use crate::config::RepairConfig;
use crate::document::InputDocument;
use crate::error::StageError;
use crate::pipeline::RepairStrategy;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, error, warn};

pub struct ExternalToolRepair;

/// A scratch directory holding the tool's input and output files.
///
/// Dropping the pair removes the directory and everything in it. Cleanup
/// failures are logged at error level, never silently swallowed — a scratch
/// directory that survives is an operational problem someone should see.
struct ScratchPair {
    dir: Option<TempDir>,
    input: PathBuf,
    output: PathBuf,
}

impl ScratchPair {
    fn create(tag: &str, config: &RepairConfig) -> Result<Self, StageError> {
        let builder_prefix = format!("pdf-revive-{tag}-");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&builder_prefix);
        let dir = match &config.scratch_dir {
            Some(base) => builder.tempdir_in(base),
            None => builder.tempdir(),
        }
        .map_err(|e| StageError::Resource {
            detail: format!("could not create scratch directory: {e}"),
        })?;
        let input = dir.path().join("input.pdf");
        let output = dir.path().join("repaired.pdf");
        Ok(Self {
            dir: Some(dir),
            input,
            output,
        })
    }
}

impl Drop for ScratchPair {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                error!("failed to remove scratch directory {}: {e}", path.display());
            }
        }
    }
}

#[async_trait]
impl RepairStrategy for ExternalToolRepair {
    fn label(&self) -> &'static str {
        "external tool"
    }

    async fn attempt(
        &self,
        doc: &InputDocument,
        config: &RepairConfig,
    ) -> Result<Vec<u8>, StageError> {
        let scratch = ScratchPair::create(&doc.id().short(), config)?;

        tokio::fs::write(&scratch.input, doc.bytes())
            .await
            .map_err(|e| StageError::Resource {
                detail: format!("could not write scratch input: {e}"),
            })?;

        run_tool(&config.qpdf_path, &scratch, config.external_timeout_secs).await?;

        let repaired =
            tokio::fs::read(&scratch.output)
                .await
                .map_err(|e| StageError::ExternalTool {
                    detail: format!("tool exited without producing an output file: {e}"),
                })?;
        if repaired.is_empty() {
            return Err(StageError::EmptyResult {
                detail: "tool produced an empty output file".into(),
            });
        }
        Ok(repaired)
    }
}

async fn run_tool(
    tool: &Path,
    scratch: &ScratchPair,
    timeout_secs: u64,
) -> Result<(), StageError> {
    // kill_on_drop reaps the child when the timeout wins the race.
    let child = Command::new(tool)
        .arg("--recover")
        .arg(&scratch.input)
        .arg(&scratch.output)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| StageError::ExternalTool {
            detail: format!("failed to launch {}: {e}", tool.display()),
        })?;

    let waited = tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        child.wait_with_output(),
    )
    .await;

    let output = match waited {
        Err(_) => {
            warn!("external tool exceeded its {timeout_secs}s budget, killing it");
            return Err(StageError::Timeout { secs: timeout_secs });
        }
        Ok(Err(e)) => {
            return Err(StageError::ExternalTool {
                detail: format!("failed to collect tool output: {e}"),
            })
        }
        Ok(Ok(output)) => output,
    };

    if !output.stdout.is_empty() {
        debug!("tool stdout: {}", String::from_utf8_lossy(&output.stdout).trim());
    }
    if !output.stderr.is_empty() {
        warn!("tool stderr: {}", String::from_utf8_lossy(&output.stderr).trim());
    }

    // qpdf exits 3 when it repaired the file but had warnings; that still
    // counts as success as long as the output file materialised.
    match output.status.code() {
        Some(0) | Some(3) => Ok(()),
        code => Err(StageError::ExternalTool {
            detail: format!(
                "tool exited with {}: {}",
                code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::InputDocument;
    use crate::pipeline::RepairStrategy;

    fn config_with(tool: &str, timeout: u64, scratch: &Path) -> RepairConfig {
        RepairConfig::builder()
            .qpdf_path(tool)
            .external_timeout_secs(timeout)
            .scratch_dir(scratch)
            .build()
            .expect("valid config")
    }

    #[tokio::test]
    async fn missing_binary_is_an_external_tool_failure() {
        let base = tempfile::tempdir().unwrap();
        let config = config_with("/definitely/not/a/real/binary", 5, base.path());
        let doc = InputDocument::new(b"%PDF-1.4 garbage".to_vec());
        let err = ExternalToolRepair.attempt(&doc, &config).await.unwrap_err();
        assert!(matches!(err, StageError::ExternalTool { .. }), "got: {err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_binary_is_an_external_tool_failure() {
        let base = tempfile::tempdir().unwrap();
        let config = config_with("/bin/false", 5, base.path());
        let doc = InputDocument::new(b"%PDF-1.4 garbage".to_vec());
        let err = ExternalToolRepair.attempt(&doc, &config).await.unwrap_err();
        assert!(matches!(err, StageError::ExternalTool { .. }), "got: {err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hung_binary_times_out() {
        use std::os::unix::fs::PermissionsExt;

        let base = tempfile::tempdir().unwrap();
        let script = base.path().join("sleepy.sh");
        std::fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = config_with(script.to_str().unwrap(), 1, base.path());
        let doc = InputDocument::new(b"%PDF-1.4 garbage".to_vec());
        let err = ExternalToolRepair.attempt(&doc, &config).await.unwrap_err();
        assert!(matches!(err, StageError::Timeout { secs: 1 }), "got: {err}");

        // The kill-and-bail path must clean up like any other: nothing may
        // survive in the scratch base except our helper script.
        let leftovers: Vec<_> = std::fs::read_dir(base.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(leftovers, vec![script], "scratch survived the timeout");
    }

    #[tokio::test]
    async fn scratch_directory_is_removed_on_failure() {
        let base = tempfile::tempdir().unwrap();
        let config = config_with("/definitely/not/a/real/binary", 5, base.path());
        let doc = InputDocument::new(b"%PDF-1.4 garbage".to_vec());
        let _ = ExternalToolRepair.attempt(&doc, &config).await;
        let leftovers: Vec<_> = std::fs::read_dir(base.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "scratch survived: {leftovers:?}");
    }
}
