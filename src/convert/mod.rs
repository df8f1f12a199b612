//! Reader-compatibility transform for staged EPUBs.
//!
//! Books whose stylesheets hardcode typography are run through the external
//! converter with those properties filtered out, and the converted file
//! replaces the original under the original name. Books without such styles
//! are left byte-for-byte untouched.
//!
//! A failed transform never stops the pipeline: the original file stays in
//! staging and is imported as-is.

mod error;
mod styles;

pub use error::TransformError;
pub use styles::{FILTERED_STYLE_PROPERTIES, find_hardcoded_styles};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::process::{ProcessRunner, args};

/// Suffix the converter output carries before it is renamed into place.
pub const CONVERTED_SUFFIX: &str = ".kepub.epub";

/// Default converter output profile.
pub const DEFAULT_OUTPUT_PROFILE: &str = "kobo";

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    /// No hardcoded styles; the file was not modified.
    Untouched,
    /// The file was converted and replaced in place.
    Converted,
    /// The transform failed; the original is left as it was.
    Skipped(String),
}

/// Runs the external converter over EPUBs that need it.
#[derive(Clone)]
pub struct CompatibilityTransformer {
    runner: Arc<dyn ProcessRunner>,
    convert_bin: String,
    output_profile: String,
}

impl std::fmt::Debug for CompatibilityTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompatibilityTransformer")
            .field("convert_bin", &self.convert_bin)
            .field("output_profile", &self.output_profile)
            .finish_non_exhaustive()
    }
}

impl CompatibilityTransformer {
    /// Creates a transformer invoking `convert_bin` with `output_profile`.
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        convert_bin: impl Into<String>,
        output_profile: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            convert_bin: convert_bin.into(),
            output_profile: output_profile.into(),
        }
    }

    /// Sibling path the converter writes to: `{stem}.kepub.epub`.
    #[must_use]
    pub fn converted_path(path: &Path) -> PathBuf {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!("{stem}{CONVERTED_SUFFIX}"))
    }

    /// Inspects `path` and converts it in place when it hardcodes typography.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn transform(&self, path: &Path) -> TransformOutcome {
        match self.try_transform(path).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(error = %error, "compatibility transform failed, keeping original");
                TransformOutcome::Skipped(error.to_string())
            }
        }
    }

    async fn try_transform(&self, path: &Path) -> Result<TransformOutcome, TransformError> {
        let found = find_hardcoded_styles(path)?;
        if found.is_empty() {
            debug!("no hardcoded styles");
            return Ok(TransformOutcome::Untouched);
        }
        info!(properties = ?found, "hardcoded styles found, converting");

        let converted = Self::converted_path(path);
        let source = path.to_string_lossy();
        let target = converted.to_string_lossy();
        let filtered = FILTERED_STYLE_PROPERTIES.join(",");
        let command = args([
            &*source,
            &*target,
            "--filter-css",
            filtered.as_str(),
            "--output-profile",
            self.output_profile.as_str(),
        ]);

        if let Err(error) = self.runner.run(&self.convert_bin, &command, true).await {
            discard_partial_output(&converted).await;
            return Err(TransformError::tool(error));
        }

        tokio::fs::remove_file(path)
            .await
            .map_err(|e| TransformError::io(path, e))?;
        tokio::fs::rename(&converted, path)
            .await
            .map_err(|e| TransformError::io(&converted, e))?;

        info!("converted for reader compatibility");
        Ok(TransformOutcome::Converted)
    }
}

/// Removes a half-written converter output so it is not imported alongside the original.
async fn discard_partial_output(converted: &Path) {
    match tokio::fs::remove_file(converted).await {
        Ok(()) => debug!(path = %converted.display(), "removed partial converter output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %converted.display(), error = %e, "could not remove partial converter output"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converted_path_is_kepub_sibling() {
        let path = Path::new("/staging/Frank Herbert - Dune.epub");
        assert_eq!(
            CompatibilityTransformer::converted_path(path),
            PathBuf::from("/staging/Frank Herbert - Dune.kepub.epub")
        );
    }
}
