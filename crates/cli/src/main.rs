use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde::Serialize;

use objrec_core::detection::detection_engine::DetectionEngine;
use objrec_core::output::annotated_image_writer::AnnotatedImageWriter;
use objrec_core::pipeline::infrastructure::threaded_batch_executor::{
    BatchOutcome, ThreadedBatchExecutor,
};
use objrec_core::pipeline::recognize_use_case::{RecognizeImageUseCase, RecognizeOptions};
use objrec_core::shared::constants::JPEG_EXTENSIONS;
use objrec_core::shared::rectangle::Rectangle;

/// Sliding-window object detection for JPEG images.
#[derive(Parser)]
#[command(name = "objrec")]
struct Cli {
    /// Serialized detector model.
    model: PathBuf,

    /// JPEG files or directories of JPEG files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Convert images to grayscale before detection.
    #[arg(long)]
    gray: bool,

    /// Rotate images upright per their EXIF orientation before detection.
    #[arg(long)]
    auto_orient: bool,

    /// Worker threads (0 = one per CPU).
    #[arg(long, default_value = "0")]
    jobs: usize,

    /// Write copies of the images with detections outlined to this directory.
    #[arg(long)]
    annotate: Option<PathBuf>,

    /// Output format: text or json.
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Serialize)]
struct ImageReport {
    path: String,
    objects: Vec<Rectangle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

type Outcome = BatchOutcome<Vec<Rectangle>, String>;

fn main() {
    env_logger::init();

    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Returns whether every image was processed.
fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let engine = DetectionEngine::from_model_file(&cli.model)?;
    let options = RecognizeOptions {
        grayscale: cli.gray,
        auto_orient: cli.auto_orient,
    };
    let use_case = RecognizeImageUseCase::new(engine, options);
    let inputs = expand_inputs(&cli.inputs)?;
    if inputs.is_empty() {
        return Err("No JPEG images found in the given inputs".into());
    }

    let executor = if cli.jobs == 0 {
        ThreadedBatchExecutor::default()
    } else {
        ThreadedBatchExecutor::new(cli.jobs)
    };
    log::info!(
        "Processing {} images on {} workers",
        inputs.len(),
        executor.workers()
    );

    let writer = AnnotatedImageWriter::new();
    let outcomes = executor.execute(&inputs, |path| {
        process_image(&use_case, &writer, cli.annotate.as_deref(), path)
    });

    let reports: Vec<ImageReport> = outcomes.into_iter().map(to_report).collect();
    let ok = reports.iter().all(|r| r.error.is_none());
    if cli.format == "json" {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print!("{}", render_text(&reports));
    }
    Ok(ok)
}

fn process_image(
    use_case: &RecognizeImageUseCase,
    writer: &AnnotatedImageWriter,
    annotate_dir: Option<&Path>,
    path: &Path,
) -> Result<Vec<Rectangle>, String> {
    let recognition = use_case.recognize_file(path).map_err(|e| e.to_string())?;
    if let Some(dir) = annotate_dir {
        let file_name = path.file_name().unwrap_or_default();
        writer
            .write(&dir.join(file_name), &recognition.image, &recognition.rects)
            .map_err(|e| format!("failed to write annotated image: {e}"))?;
    }
    Ok(recognition.rects)
}

fn to_report(outcome: Outcome) -> ImageReport {
    let path = outcome.path.display().to_string();
    match outcome.result {
        Ok(objects) => ImageReport {
            path,
            objects,
            error: None,
        },
        Err(e) => {
            log::warn!("{path}: {e}");
            ImageReport {
                path,
                objects: Vec::new(),
                error: Some(e),
            }
        }
    }
}

fn render_text(reports: &[ImageReport]) -> String {
    let mut out = String::new();
    for report in reports {
        match &report.error {
            Some(e) => out.push_str(&format!("{}: error: {e}\n", report.path)),
            None => {
                out.push_str(&format!("{}: {} objects\n", report.path, report.objects.len()));
                for r in &report.objects {
                    out.push_str(&format!(
                        "  {} {} {} {}\n",
                        r.left, r.top, r.right, r.bottom
                    ));
                }
            }
        }
    }
    out
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.model.exists() {
        return Err(format!("Model file not found: {}", cli.model.display()).into());
    }
    if cli.format != "text" && cli.format != "json" {
        return Err(format!("Format must be 'text' or 'json', got '{}'", cli.format).into());
    }
    for input in &cli.inputs {
        if !input.exists() {
            return Err(format!("Input not found: {}", input.display()).into());
        }
    }
    Ok(())
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| JPEG_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Files are kept as given; directories contribute their JPEG files in
/// name order (not recursive).
fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_jpeg(p))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}
