//! Configuration for the repair pipeline.
//!
//! All behaviour is controlled through [`RepairConfig`], built via its
//! [`RepairConfigBuilder`] and constructed once at process start. The config
//! is threaded into the pipeline constructor explicitly — no stage consults
//! ambient global state, which keeps concurrent repair calls isolated and
//! makes two runs diffable from their configs alone.

use crate::error::RepairError;
use std::path::PathBuf;

/// Configuration for a repair pipeline.
///
/// Built via [`RepairConfig::builder()`] or [`RepairConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_revive::RepairConfig;
///
/// let config = RepairConfig::builder()
///     .qpdf_path("/usr/local/bin/qpdf")
///     .external_timeout_secs(60)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct RepairConfig {
    /// Path to the external repair binary. Default: `qpdf`.
    ///
    /// A bare name is resolved through `PATH`; give an absolute path when the
    /// tool lives outside it. The binary is invoked as
    /// `<qpdf> --recover <input> <output>`.
    pub qpdf_path: PathBuf,

    /// Wall-clock budget for one external-tool invocation, in seconds.
    /// Default: 30.
    ///
    /// The external stage is the only point where the pipeline blocks on
    /// something it does not control. On expiry the child process is killed
    /// and the stage reports an ordinary timeout failure, so a wedged tool
    /// can never hang a repair call — the pipeline just moves on to salvage.
    pub external_timeout_secs: u64,

    /// Directory for per-call scratch files. Default: the system temp dir.
    ///
    /// Each external-tool invocation gets its own uniquely named
    /// subdirectory here, removed on every exit path. Pointing this at a
    /// dedicated filesystem keeps repair scratch I/O off the root volume.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            qpdf_path: PathBuf::from("qpdf"),
            external_timeout_secs: 30,
            scratch_dir: None,
        }
    }
}

impl RepairConfig {
    /// Create a new builder for `RepairConfig`.
    pub fn builder() -> RepairConfigBuilder {
        RepairConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RepairConfig`].
#[derive(Debug)]
pub struct RepairConfigBuilder {
    config: RepairConfig,
}

impl RepairConfigBuilder {
    pub fn qpdf_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.qpdf_path = path.into();
        self
    }

    pub fn external_timeout_secs(mut self, secs: u64) -> Self {
        self.config.external_timeout_secs = secs;
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RepairConfig, RepairError> {
        let c = &self.config;
        if c.external_timeout_secs == 0 {
            return Err(RepairError::InvalidConfig(
                "external timeout must be ≥ 1 second".into(),
            ));
        }
        if c.qpdf_path.as_os_str().is_empty() {
            return Err(RepairError::InvalidConfig(
                "qpdf path must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let c = RepairConfig::default();
        assert_eq!(c.qpdf_path, PathBuf::from("qpdf"));
        assert_eq!(c.external_timeout_secs, 30);
        assert!(c.scratch_dir.is_none());
    }

    #[test]
    fn builder_sets_every_field() {
        let c = RepairConfig::builder()
            .qpdf_path("/opt/qpdf")
            .external_timeout_secs(5)
            .scratch_dir("/var/tmp/revive")
            .build()
            .expect("valid config");
        assert_eq!(c.qpdf_path, PathBuf::from("/opt/qpdf"));
        assert_eq!(c.external_timeout_secs, 5);
        assert_eq!(c.scratch_dir.as_deref(), Some(std::path::Path::new("/var/tmp/revive")));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = RepairConfig::builder()
            .external_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn empty_tool_path_is_rejected() {
        let err = RepairConfig::builder().qpdf_path("").build().unwrap_err();
        assert!(err.to_string().contains("qpdf"));
    }
}
