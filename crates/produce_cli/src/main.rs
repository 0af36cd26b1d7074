use anyhow::{Context, Result};
use clap::Parser;
use produce_core::{
    ClassifierConfig, ImageInfo, Recognizer, ScanOptions, export_csv, scan_folder_with,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// Classify produce images against a labeled reference dataset.
#[derive(Debug, Parser)]
#[command(name = "produce-classify", version = env!("PRODUCE_VERSION"))]
struct Args {
    /// TOML config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Dataset root with one subdirectory per label.
    #[arg(long)]
    dataset: Option<PathBuf>,
    /// Number of neighbors consulted per query.
    #[arg(short)]
    k: Option<usize>,
    /// Recurse into subdirectories of folder inputs.
    #[arg(long)]
    recursive: bool,
    /// Write results to this CSV file.
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Print results as JSON instead of plain text.
    #[arg(long)]
    json: bool,
    /// Image files or folders to classify.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Serialize)]
struct Row<'a> {
    file: &'a str,
    label: Option<String>,
    confidence: Option<f32>,
}

fn main() {
    // stdout carries the results; keep logs out of it
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let cfg = resolve_config(&args)?;

    let start = Instant::now();
    let mut recognizer = Recognizer::from_config(&cfg)?;
    recognizer
        .train_from_directory(&cfg.dataset_root)
        .with_context(|| format!("training from {}", cfg.dataset_root.display()))?;
    tracing::info!("Model ready in {:.1?}", start.elapsed());

    let mut rows = collect_inputs(&args.inputs, ScanOptions { recursive: cfg.recursive })?;
    recognizer.classify_rows(&mut rows, |done, total| {
        tracing::debug!("Classified {done}/{total}");
    })?;

    if args.json {
        print_json(&rows)?;
    } else {
        print_plain(&rows);
    }

    if let Some(path) = &args.csv {
        export_csv(&rows, path)?;
        tracing::info!("CSV written: {}", path.display());
    }
    Ok(())
}

fn resolve_config(args: &Args) -> Result<ClassifierConfig> {
    let mut cfg = match &args.config {
        Some(path) => ClassifierConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ClassifierConfig::default(),
    };
    if let Some(dataset) = &args.dataset {
        cfg.dataset_root = dataset.clone();
    }
    if let Some(k) = args.k {
        cfg.k = k;
    }
    if args.recursive {
        cfg.recursive = true;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn collect_inputs(inputs: &[PathBuf], opts: ScanOptions) -> Result<Vec<ImageInfo>> {
    let mut rows = Vec::new();
    for input in inputs {
        if input.is_dir() {
            rows.extend(scan_folder_with(input, opts)?);
        } else {
            rows.push(ImageInfo {
                file: input.clone(),
                classification: None,
            });
        }
    }
    Ok(rows)
}

fn print_plain(rows: &[ImageInfo]) {
    for info in rows {
        match &info.classification {
            Some(c) => println!(
                "{}: {} ({:.0}%)",
                info.file.display(),
                c.decision,
                c.confidence * 100.0
            ),
            None => println!("{}: <error>", info.file.display()),
        }
    }
}

fn print_json(rows: &[ImageInfo]) -> Result<()> {
    let files: Vec<String> = rows
        .iter()
        .map(|i| i.file.to_string_lossy().into_owned())
        .collect();
    let out: Vec<Row<'_>> = rows
        .iter()
        .zip(&files)
        .map(|(info, file)| Row {
            file,
            label: info.classification.as_ref().map(|c| c.decision.to_string()),
            confidence: info.classification.as_ref().map(|c| c.confidence),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
