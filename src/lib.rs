pub mod config;
pub mod error;
pub mod interactive;
pub mod media;
pub mod pipeline;
pub mod subtitle;
pub mod tracks;
pub mod translate;

pub use config::{AudioFormat, Config, VideoFormat};
pub use error::{MkvsubError, Result};
pub use pipeline::{
    print_summary, write_artifacts, Diagnostic, Operations, Orchestrator, OutputArtifact,
    ProcessOptions, ProcessOutcome, StepFailure,
};
