use crate::config::{AudioFormat, Config, VideoFormat};
use crate::media::resolution_names;
use crate::pipeline::{Operations, ProcessOptions};
use console::style;
use dialoguer::{Confirm, FuzzySelect, Input, MultiSelect, Select};
use std::fs;
use std::path::{Path, PathBuf};

const SUPPORTED_EXTENSIONS: &[&str] = &["mkv", "mka", "mks", "webm"];

const AUDIO_FORMATS: &[AudioFormat] = &[
    AudioFormat::Mp3,
    AudioFormat::Aac,
    AudioFormat::Flac,
    AudioFormat::Opus,
    AudioFormat::Wav,
];

const VIDEO_FORMATS: &[VideoFormat] = &[VideoFormat::Mp4, VideoFormat::Mkv, VideoFormat::Webm];

const ORIGINAL_RESOLUTION: &str = "original";

pub struct InteractiveResult {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub operations: Operations,
    pub options: ProcessOptions,
    pub config: Config,
}

/// Ask for the input file, operations and their parameters.
///
/// `input` skips the file prompt when it was given on the command line.
pub fn run_interactive_wizard(
    mut config: Config,
    input: Option<PathBuf>,
) -> anyhow::Result<InteractiveResult> {
    print_header();

    let input = match input {
        Some(path) => path,
        None => select_source_file()?,
    };

    let operations = select_operations()?;
    if operations.is_empty() {
        anyhow::bail!("No operation selected");
    }

    let mut options = ProcessOptions::from_config(&config);

    if operations.extract_subtitles {
        options.translate_to = setup_translation(&config)?;
    }
    if operations.extract_audio {
        options.audio_format = select_from(
            "Select audio format",
            AUDIO_FORMATS,
            config.audio_format,
        )?;
    }
    if operations.convert_video {
        options.video_format = select_from(
            "Select video format",
            VIDEO_FORMATS,
            config.video_format,
        )?;
        options.resolution = select_resolution()?;
    }

    let output_dir = default_output_dir(&input);

    print_summary(&input, &output_dir, &operations, &options);

    if !Confirm::new()
        .with_prompt("Proceed with these settings?")
        .default(true)
        .interact()?
    {
        anyhow::bail!("Cancelled by user");
    }

    let formats_changed =
        options.audio_format != config.audio_format || options.video_format != config.video_format;
    if formats_changed
        && Confirm::new()
            .with_prompt("Save chosen formats as defaults?")
            .default(false)
            .interact()?
    {
        config.audio_format = options.audio_format;
        config.video_format = options.video_format;
        save_config(&config)?;
        println!("{} Defaults saved to config\n", style("✓").green());
    }

    println!();

    Ok(InteractiveResult {
        input,
        output_dir,
        operations,
        options,
        config,
    })
}

fn print_header() {
    println!();
    println!(
        "{}",
        style("╔═══════════════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║       mkvsub - MKV Subtitle & Audio Extractor     ║").cyan()
    );
    println!(
        "{}",
        style("╚═══════════════════════════════════════════════════╝").cyan()
    );
    println!();
}

fn save_config(config: &Config) -> anyhow::Result<()> {
    if let Some(config_path) = Config::config_file_path() {
        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let toml_content = toml::to_string_pretty(config)?;
        fs::write(config_path, toml_content)?;
    }
    Ok(())
}

/// Output goes next to the input file.
pub fn default_output_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn select_source_file() -> anyhow::Result<PathBuf> {
    println!("\n{}", style("Select source file:").bold());

    let files = scan_media_files(Path::new("."))?;

    if files.is_empty() {
        println!("  No Matroska files found in current directory.\n");
        return prompt_path();
    }

    let mut items: Vec<String> = files
        .iter()
        .map(|f| {
            let size = fs::metadata(f)
                .map(|m| format_size(m.len()))
                .unwrap_or_else(|_| "?".to_string());
            format!("{} ({})", f.display(), size)
        })
        .collect();
    items.push("Enter custom path...".to_string());

    let selection = Select::new()
        .with_prompt("Choose a file")
        .items(&items)
        .default(0)
        .interact()?;

    if selection == files.len() {
        prompt_path()
    } else {
        Ok(files[selection].clone())
    }
}

fn prompt_path() -> anyhow::Result<PathBuf> {
    let path: String = Input::new()
        .with_prompt("Enter file path")
        .interact_text()?;
    let path = PathBuf::from(path.trim());
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    Ok(path)
}

fn scan_media_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_file() {
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                if SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                    files.push(path);
                }
            }
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn select_operations() -> anyhow::Result<Operations> {
    let items = [
        "Extract subtitles (ASS + SRT)",
        "Extract audio tracks",
        "Convert video",
    ];

    let chosen = MultiSelect::new()
        .with_prompt("What should be produced? (space to toggle)")
        .items(&items)
        .defaults(&[true, false, false])
        .interact()?;

    Ok(operations_from_selection(&chosen))
}

fn operations_from_selection(chosen: &[usize]) -> Operations {
    Operations {
        extract_subtitles: chosen.contains(&0),
        extract_audio: chosen.contains(&1),
        convert_video: chosen.contains(&2),
    }
}

fn setup_translation(config: &Config) -> anyhow::Result<Option<String>> {
    if !Confirm::new()
        .with_prompt("Translate subtitles to another language?")
        .default(false)
        .interact()?
    {
        return Ok(None);
    }

    let names: Vec<&str> = config.languages.names().collect();
    let default = names.iter().position(|n| *n == "English").unwrap_or(0);

    let selection = FuzzySelect::new()
        .with_prompt("Select target language")
        .items(&names)
        .default(default)
        .interact()?;

    Ok(Some(names[selection].to_string()))
}

fn select_from<T>(prompt: &str, choices: &[T], current: T) -> anyhow::Result<T>
where
    T: Copy + PartialEq + std::fmt::Display,
{
    let items: Vec<String> = choices.iter().map(ToString::to_string).collect();

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(default_index(choices, &current))
        .interact()?;

    Ok(choices[selection])
}

fn default_index<T: PartialEq>(choices: &[T], current: &T) -> usize {
    choices.iter().position(|c| c == current).unwrap_or(0)
}

fn resolution_choices() -> Vec<&'static str> {
    std::iter::once(ORIGINAL_RESOLUTION)
        .chain(resolution_names())
        .collect()
}

fn select_resolution() -> anyhow::Result<String> {
    let choices = resolution_choices();

    let selection = Select::new()
        .with_prompt("Select resolution")
        .items(&choices)
        .default(0)
        .interact()?;

    Ok(choices[selection].to_string())
}

fn print_summary(input: &Path, output_dir: &Path, operations: &Operations, options: &ProcessOptions) {
    println!("\n{}", style("═══ Summary ═══").bold());
    println!("  Input:      {}", style(input.display()).cyan());
    println!("  Output dir: {}", style(output_dir.display()).cyan());
    if operations.extract_subtitles {
        match &options.translate_to {
            Some(language) => println!("  Subtitles:  yes, translated to {}", language),
            None => println!("  Subtitles:  yes"),
        }
    }
    if operations.extract_audio {
        println!("  Audio:      {}", options.audio_format);
    }
    if operations.convert_video {
        println!(
            "  Video:      {} ({})",
            options.video_format, options.resolution
        );
    }
    println!();
}
