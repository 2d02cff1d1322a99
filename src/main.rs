use anyhow::Context;
use clap::{Parser, Subcommand};
use image::ImageReader;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use platecheck::audit::{WriteMode, write_report_table};
use platecheck::config::{ModelArgs, ServeArgs};
use platecheck::detection::annotate::draw_detections;
use platecheck::report::ScanReport;
use platecheck::web::{self, AppState};

#[derive(Parser)]
#[command(name = "platecheck")]
#[command(about = "Detect license plates, read them and check the printed tax period")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a single image file
    Scan {
        /// Path to input image file
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        #[command(flatten)]
        models: ModelArgs,

        /// Write the plate table (image_path,box,text) to this CSV file
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,

        /// Save a copy of the image with the detected plates outlined
        #[arg(long, value_name = "FILE")]
        annotated: Option<PathBuf>,

        /// Save debug outputs to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the web UI
    Serve {
        #[command(flatten)]
        models: ModelArgs,

        #[command(flatten)]
        server: ServeArgs,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn print_report(report: &ScanReport) {
    println!("\n=== Number Plate Results: {} ===", report.source);
    println!("Total detections: {}", report.plates.len());

    if let Some(notice) = report.notice() {
        println!("{}", notice.message);
        return;
    }

    for plate in &report.plates {
        println!(
            "\n  #{} {} - confidence: {:.2}",
            plate.index, plate.detection.bbox, plate.detection.confidence
        );
        println!("    Hasil Scan OCR : {}", plate.text);
        if let (Some(code), Some(validation)) = (&plate.tax_code, &plate.validation) {
            println!(
                "    Bulan Pajak: {}  Tahun Pajak: {}  Masa Berlaku: {}",
                code.month, code.year, validation.validity
            );
        }
        println!("    {}", plate.notice.message);
    }
}

fn run_scan(
    image_path: PathBuf,
    models: ModelArgs,
    csv: Option<PathBuf>,
    annotated: Option<PathBuf>,
    debug_out: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let img = ImageReader::open(&image_path)
        .with_context(|| format!("Failed to open {}", image_path.display()))?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    tracing::debug!("Image loaded: {}x{}", img.width(), img.height());

    let scanner = models.load_pipeline()?.with_debug(debug_out);
    let source = image_path.display().to_string();
    let report = scanner.scan(&img, &source)?;

    if let Some(path) = &csv {
        if write_report_table(path, &report, WriteMode::Truncate)? {
            tracing::info!("Wrote plate table to {}", path.display());
        } else {
            tracing::info!("No plates recognized, {} not written", path.display());
        }
    }

    if let Some(path) = &annotated {
        draw_detections(&img, &report.detections())
            .save(path)
            .with_context(|| format!("Failed to save annotated image {}", path.display()))?;
        tracing::info!("Saved annotated image to {}", path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Scan {
            image_path,
            models,
            csv,
            annotated,
            debug_out,
            json,
        } => run_scan(image_path, models, csv, annotated, debug_out, json),
        Command::Serve { models, server } => {
            let scanner = models.load_pipeline()?;
            let mut state = AppState::new(scanner);
            if let Some(path) = server.csv {
                state = state.with_csv(path);
            }
            if let Some(dir) = server.upload_dir {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;
                state = state.with_upload_dir(dir);
            }
            web::start_server(state, server.addr).await
        }
    }
}
