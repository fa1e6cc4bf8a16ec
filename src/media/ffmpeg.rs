use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{tool_message, MkvsubError, Result};

use super::{TranscodeJob, Transcoder};

/// Transcoder that shells out to FFmpeg.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ffmpeg_path.clone())
    }

    /// Check if FFmpeg is installed and accessible.
    pub fn check(&self) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("-version")
            .output()
            .map_err(|e| {
                MkvsubError::ToolNotFound(format!(
                    "FFmpeg not found at {}. Please install FFmpeg or set ffmpeg_path. Error: {e}",
                    self.program.display()
                ))
            })?;

        if !output.status.success() {
            return Err(MkvsubError::ToolNotFound("FFmpeg check failed".to_string()));
        }

        debug!("FFmpeg is available");
        Ok(())
    }

    fn args(job: &TranscodeJob<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error", "-i"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(job.input.as_os_str().to_owned());

        if let Some((width, height)) = job.scale {
            args.push("-vf".into());
            args.push(format!("scale={}:{}", width, height).into());
        }

        args.extend(job.codec_args.iter().map(OsString::from));
        args.push(job.output.as_os_str().to_owned());
        args
    }
}

impl Transcoder for Ffmpeg {
    fn transcode(&self, job: &TranscodeJob<'_>) -> Result<()> {
        if !job.input.exists() {
            return Err(MkvsubError::FileNotFound(job.input.display().to_string()));
        }

        info!(
            "Transcoding {} -> {}",
            job.input.display(),
            job.output.display()
        );

        let output = Command::new(&self.program)
            .args(Self::args(job))
            .output()
            .map_err(|e| MkvsubError::ToolNotFound(format!("Failed to run FFmpeg: {e}")))?;

        if !output.status.success() {
            return Err(MkvsubError::TranscodeFailure(tool_message(
                &output.stdout,
                &output.stderr,
            )));
        }

        if !job.output.exists() {
            return Err(MkvsubError::TranscodeFailure(
                "Output file was not created".to_string(),
            ));
        }

        Ok(())
    }
}
