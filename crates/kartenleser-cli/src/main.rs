// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Kartenleser — read a payment card's account number from a photo.
//
// Entry point. Initialises logging, loads the photo, the font sheet and the
// optional configuration, runs the pipeline and prints the result.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use kartenleser_core::error::Result;
use kartenleser_core::human_errors::humanize_error;
use kartenleser_core::{AccountNumber, PipelineConfig};
use kartenleser_vision::{CardReader, CardScan, InputImage, ReferenceGlyphs};
use tracing::{error, info, warn};

/// Exit status when the card was found but fewer than sixteen digits were read.
const EXIT_SHORT_READ: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "kartenleser", version)]
#[command(about = "Read the account number off a photo of a payment card")]
struct Args {
    /// Photo of the card front.
    image: PathBuf,

    /// Font sheet with the digits 0-9 left to right.
    #[arg(long, default_value = "font.png")]
    font: PathBuf,

    /// JSON pipeline configuration. Compiled-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the working width the photo is scaled to.
    #[arg(long)]
    working_width: Option<u32>,

    /// Print the scan summary as JSON instead of a single line.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!(image = %args.image.display(), "Kartenleser starting");

    let outcome = run(&args).and_then(|scan| Ok((render(&scan, args.json)?, scan.is_complete())));
    match outcome {
        Ok((text, complete)) => {
            println!("{text}");
            if complete {
                ExitCode::SUCCESS
            } else {
                warn!("Fewer than {} digits were read", AccountNumber::LENGTH);
                ExitCode::from(EXIT_SHORT_READ)
            }
        }
        Err(err) => {
            error!(error = %err, kind = ?err.kind(), "Card could not be read");
            let human = humanize_error(&err);
            eprintln!("{}", human.message);
            eprintln!("{}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(width) = args.working_width {
        config.working_width = width;
        config.validate()?;
    }
    Ok(config)
}

fn run(args: &Args) -> Result<CardScan> {
    let config = load_config(args)?;
    let references = Arc::new(ReferenceGlyphs::open(&args.font, &config.classify)?);
    let gray = InputImage::open(&args.image)?.to_working_gray(config.working_width)?;
    let reader = CardReader::new(config, references)?;
    reader.read(&gray)
}

/// Format a scan for stdout.
fn render(scan: &CardScan, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(&scan.summary())?);
    }
    let number = scan.account_number();
    if scan.is_complete() {
        Ok(format!("Account Number: {number}"))
    } else {
        Ok(format!(
            "Account Number (incomplete, {} of {} digits): {number}",
            scan.digits_read(),
            AccountNumber::LENGTH
        ))
    }
}
