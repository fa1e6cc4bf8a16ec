use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{tool_message, MkvsubError, Result};

use super::TrackTool;

/// Track reporter and extractor backed by `mkvinfo` and `mkvextract`.
#[derive(Debug, Clone)]
pub struct MkvToolNix {
    mkvinfo: PathBuf,
    mkvextract: PathBuf,
}

impl MkvToolNix {
    pub fn new(mkvinfo: impl Into<PathBuf>, mkvextract: impl Into<PathBuf>) -> Self {
        Self {
            mkvinfo: mkvinfo.into(),
            mkvextract: mkvextract.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.mkvinfo_path(), config.mkvextract_path())
    }

    /// Check that both tools can be started.
    pub fn check(&self) -> Result<()> {
        for tool in [&self.mkvinfo, &self.mkvextract] {
            let output = Command::new(tool).arg("--version").output().map_err(|e| {
                MkvsubError::ToolNotFound(format!(
                    "{} could not be started. Install mkvtoolnix or set mkvtoolnix_dir. Error: {e}",
                    tool.display()
                ))
            })?;

            if !output.status.success() {
                return Err(MkvsubError::ToolNotFound(format!(
                    "{} --version failed",
                    tool.display()
                )));
            }
        }

        debug!("mkvtoolnix is available");
        Ok(())
    }
}

impl TrackTool for MkvToolNix {
    fn report(&self, input: &Path) -> Result<Option<String>> {
        if !input.exists() {
            return Err(MkvsubError::FileNotFound(input.display().to_string()));
        }

        let output = Command::new(&self.mkvinfo)
            .arg(input)
            .output()
            .map_err(|e| {
                MkvsubError::ToolNotFound(format!("Failed to run {}: {e}", self.mkvinfo.display()))
            })?;

        if !output.status.success() {
            debug!(
                "mkvinfo exited with {} for {}",
                output.status,
                input.display()
            );
            return Ok(None);
        }

        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }

    fn extract(&self, input: &Path, track_id: u32, output: &Path) -> Result<()> {
        info!("Extracting track {} to {}", track_id, output.display());

        let mut target = std::ffi::OsString::from(format!("{track_id}:"));
        target.push(output.as_os_str());

        let result = Command::new(&self.mkvextract)
            .arg("tracks")
            .arg(input)
            .arg(target)
            .output()
            .map_err(|e| {
                MkvsubError::ToolNotFound(format!(
                    "Failed to run {}: {e}",
                    self.mkvextract.display()
                ))
            })?;

        if !result.status.success() {
            return Err(MkvsubError::ExtractionFailure(format!(
                "track {}: {}",
                track_id,
                tool_message(&result.stdout, &result.stderr)
            )));
        }

        if !output.exists() {
            return Err(MkvsubError::ExtractionFailure(format!(
                "track {}: output file was not created",
                track_id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_missing_file() {
        let tool = MkvToolNix::new("mkvinfo", "mkvextract");
        let result = tool.report(Path::new("/nonexistent/file.mkv"));
        match result {
            Err(MkvsubError::FileNotFound(path)) => assert!(path.contains("nonexistent")),
            other => panic!("Expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_binary_is_tool_not_found() {
        let tool = MkvToolNix::new("/nonexistent/mkvinfo", "/nonexistent/mkvextract");
        assert!(matches!(tool.check(), Err(MkvsubError::ToolNotFound(_))));

        let input = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            tool.report(input.path()),
            Err(MkvsubError::ToolNotFound(_))
        ));
    }
}
