use clap::Parser;
use scrollstitch::io::{save_raster, validate_inputs};
use scrollstitch::ocr::{self, tesseract::TesseractCli};
use scrollstitch::{ChatDetector, OcrOptions, SearchRegion, StitchConfig, StitchError, Stitcher};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

const PREVIEW_CHARS: usize = 500;
const RULE_WIDTH: usize = 60;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Stitch overlapping screenshots and extract text with OCR",
    after_help = "Examples:\n  scrollstitch image1.png image2.png image3.png\n  \
                  scrollstitch *.png -o output.png --chat\n  \
                  scrollstitch screenshots/*.png --text-only"
)]
struct Cli {
    /// Screenshot image files to stitch, top to bottom.
    #[arg(value_name = "IMAGE", required_unless_present_any = ["print_schema", "print_example"])]
    images: Vec<PathBuf>,
    /// Output image file path.
    #[arg(short, long, value_name = "FILE", default_value = "stitched_output.png")]
    output: PathBuf,
    /// Text output file path.
    #[arg(short = 't', long, value_name = "FILE", default_value = "extracted_text.txt")]
    text_output: PathBuf,
    /// Detect and format chat conversations.
    #[arg(long)]
    chat: bool,
    /// Only extract text; do not save the stitched image.
    #[arg(long)]
    text_only: bool,
    /// Minimum overlap confidence, 0 to 1 (default: 0.80).
    #[arg(long, value_name = "SCORE")]
    overlap_threshold: Option<f64>,
    /// Disable image preprocessing for OCR.
    #[arg(long)]
    no_preprocess: bool,
    /// Tesseract language code (default: eng).
    #[arg(long, value_name = "LANG")]
    lang: Option<String>,
    /// Optional JSON configuration file; flags override its values.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
    /// Only match overlaps within this bottom fraction of each upper image.
    #[arg(long, value_name = "FRACTION")]
    search_region: Option<f64>,
    /// Row step between candidate overlap sizes.
    #[arg(long, value_name = "ROWS")]
    sweep_step: Option<usize>,
    /// Path to the tesseract executable.
    #[arg(long, value_name = "PATH")]
    tesseract: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StitchConfigJson {
    overlap_threshold: f64,
    min_overlap_ratio: f64,
    max_overlap_ratio: f64,
    sweep_step: usize,
    search_margin: usize,
    search_region: Option<f64>,
    min_var_i: f64,
    parallel: bool,
}

impl Default for StitchConfigJson {
    fn default() -> Self {
        let cfg = StitchConfig::default();
        Self {
            overlap_threshold: cfg.overlap_threshold,
            min_overlap_ratio: cfg.min_overlap_ratio,
            max_overlap_ratio: cfg.max_overlap_ratio,
            sweep_step: cfg.sweep_step,
            search_margin: cfg.search_margin,
            search_region: None,
            min_var_i: cfg.min_var_i,
            parallel: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct OcrConfigJson {
    lang: String,
    preprocess: bool,
    oem: u8,
    psm: u8,
    tesseract: PathBuf,
}

impl Default for OcrConfigJson {
    fn default() -> Self {
        let opts = OcrOptions::default();
        Self {
            lang: opts.lang,
            preprocess: opts.preprocess,
            oem: opts.oem,
            psm: opts.psm,
            tesseract: PathBuf::from("tesseract"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Config {
    stitch: StitchConfigJson,
    ocr: OcrConfigJson,
    chat: bool,
}

impl Config {
    fn load(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = match &cli.config {
            Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            None => Config::default(),
        };
        if let Some(threshold) = cli.overlap_threshold {
            config.stitch.overlap_threshold = threshold;
        }
        if let Some(fraction) = cli.search_region {
            config.stitch.search_region = Some(fraction);
        }
        if let Some(step) = cli.sweep_step {
            config.stitch.sweep_step = step;
        }
        if let Some(lang) = &cli.lang {
            config.ocr.lang = lang.clone();
        }
        if let Some(program) = &cli.tesseract {
            config.ocr.tesseract = program.clone();
        }
        config.ocr.preprocess &= !cli.no_preprocess;
        config.chat |= cli.chat;
        Ok(config)
    }

    fn stitch_config(&self) -> StitchConfig {
        let s = &self.stitch;
        StitchConfig {
            overlap_threshold: s.overlap_threshold,
            min_overlap_ratio: s.min_overlap_ratio,
            max_overlap_ratio: s.max_overlap_ratio,
            sweep_step: s.sweep_step,
            search_margin: s.search_margin,
            search_region: s
                .search_region
                .map_or(SearchRegion::Unbounded, SearchRegion::BottomFraction),
            min_var_i: s.min_var_i,
            parallel: s.parallel,
        }
    }

    fn ocr_options(&self) -> OcrOptions {
        OcrOptions {
            lang: self.ocr.lang.clone(),
            preprocess: self.ocr.preprocess,
            oem: self.ocr.oem,
            psm: self.ocr.psm,
        }
    }
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(cli)?;
    let stitcher = Stitcher::new(config.stitch_config())?;

    println!("Screenshot OCR Stitcher");
    println!("{}", rule());

    let paths = validate_inputs(&cli.images)?;
    println!("Input images: {}", paths.len());

    println!("\n[1/3] Stitching images...");
    let composite = stitcher.stitch_all(&paths)?;
    for skipped in &composite.report.skipped {
        println!(
            "Skipping {}: {}",
            paths[skipped.index].display(),
            skipped.error
        );
    }
    if !cli.text_only {
        save_raster(&composite.image, &cli.output)?;
        println!("Stitched image saved to: {}", cli.output.display());
    }

    println!("\n[2/3] Extracting text with OCR...");
    let extractor = TesseractCli::new(&config.ocr.tesseract);
    let text = ocr::extract_text(&extractor, &composite.image, &config.ocr_options())?;
    if text.trim().is_empty() {
        return Err(StitchError::NoTextExtracted.into());
    }
    let char_count = text.chars().count();
    println!("Extracted {char_count} characters");

    println!("\n[3/3] Processing extracted text...");
    let mut chat_detected = None;
    let final_text = if config.chat {
        let outcome = ChatDetector::default().process_text(&text);
        if outcome.is_chat {
            println!("Chat conversation detected!");
        } else {
            println!("No chat pattern detected, using raw text");
        }
        chat_detected = Some(outcome.is_chat);
        outcome.text
    } else {
        text
    };

    fs::write(&cli.text_output, &final_text).map_err(|err| StitchError::Write {
        path: cli.text_output.clone(),
        reason: err.to_string(),
    })?;
    println!("Text saved to: {}", cli.text_output.display());

    println!("\n{}", rule());
    println!("TEXT PREVIEW (first {PREVIEW_CHARS} characters):");
    println!("{}", rule());
    let preview: String = final_text.chars().take(PREVIEW_CHARS).collect();
    println!("{preview}");
    if final_text.chars().count() > PREVIEW_CHARS {
        println!("... (truncated)");
    }
    println!("{}", rule());

    println!("\nProcessing complete!");
    println!("\nSummary:");
    println!("  Images stitched: {}", composite.report.merges.len() + 1);
    if !composite.report.skipped.is_empty() {
        println!("  Images skipped: {}", composite.report.skipped.len());
    }
    if cli.text_only {
        println!("  Output image: N/A (text-only mode)");
    } else {
        println!("  Output image: {}", cli.output.display());
    }
    println!("  Output text: {}", cli.text_output.display());
    println!("  Characters extracted: {char_count}");
    if let Some(detected) = chat_detected {
        println!("  Chat detected: {}", if detected { "Yes" } else { "No" });
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.trace { "info" } else { "warn" };
    let filter = match format!("scrollstitch={level}").parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return ExitCode::SUCCESS;
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
