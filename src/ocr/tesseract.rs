//! [`TextExtractor`] backed by the `tesseract` executable.
//!
//! The raster is PNG-encoded and piped to `tesseract stdin stdout`; words come
//! from its TSV output.

use crate::image::io::dynamic_image_from_raster;
use crate::image::RasterBuffer;
use crate::ocr::{OcrOptions, TextExtractor, WordBox};
use crate::util::{StitchError, StitchResult};
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// TSV row level for individual words.
const WORD_LEVEL: u32 = 5;

/// Runs the `tesseract` command-line tool.
#[derive(Clone, Debug)]
pub struct TesseractCli {
    program: PathBuf,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

fn ocr_error(reason: impl ToString) -> StitchError {
    StitchError::Ocr {
        reason: reason.to_string(),
    }
}

impl TesseractCli {
    /// Uses `program` as the tesseract executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, image: &RasterBuffer, args: &[String]) -> StitchResult<String> {
        let mut png = Vec::new();
        dynamic_image_from_raster(image)?
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(ocr_error)?;

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| ocr_error(format!("{}: {err}", self.program.display())))?;

        // Tesseract reads the whole image before writing, so a single
        // write-then-wait cannot deadlock on full pipes. A process that exits
        // early closes its stdin, so its exit status and stderr take
        // precedence over the broken pipe.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&png),
            None => Ok(()),
        };
        let output = child.wait_with_output().map_err(ocr_error)?;
        if !output.status.success() {
            return Err(ocr_error(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        written.map_err(ocr_error)?;
        String::from_utf8(output.stdout).map_err(ocr_error)
    }
}

/// Command-line arguments for one tesseract run.
///
/// Plain text uses the configured engine and segmentation modes. Word boxes
/// use tesseract's default automatic segmentation with TSV output.
fn command_args(options: &OcrOptions, words: bool) -> Vec<String> {
    let mut args: Vec<String> = ["stdin", "stdout", "-l", options.lang.as_str()]
        .iter()
        .map(|arg| arg.to_string())
        .collect();
    if words {
        args.push("tsv".to_string());
    } else {
        args.extend([
            "--oem".to_string(),
            options.oem.to_string(),
            "--psm".to_string(),
            options.psm.to_string(),
        ]);
    }
    args
}

impl TextExtractor for TesseractCli {
    fn extract_text(&self, image: &RasterBuffer, options: &OcrOptions) -> StitchResult<String> {
        self.run(image, &command_args(options, false))
    }

    fn extract_words(
        &self,
        image: &RasterBuffer,
        options: &OcrOptions,
    ) -> StitchResult<Vec<WordBox>> {
        let tsv = self.run(image, &command_args(options, true))?;
        parse_tsv(&tsv)
    }
}

/// Parses tesseract TSV output into word boxes.
///
/// Only word-level rows with non-empty text and positive confidence are kept.
pub fn parse_tsv(tsv: &str) -> StitchResult<Vec<WordBox>> {
    let mut words = Vec::new();
    for line in tsv.lines() {
        if line.is_empty() || line.starts_with("level") {
            continue;
        }
        let fields: Vec<&str> = line.splitn(12, '\t').collect();
        if fields.len() < 11 {
            return Err(ocr_error(format!("malformed tsv row: {line}")));
        }
        let num = |idx: usize| -> StitchResult<u32> {
            fields[idx]
                .trim()
                .parse::<u32>()
                .map_err(|_| ocr_error(format!("bad tsv field {idx}: {}", fields[idx])))
        };

        if num(0)? != WORD_LEVEL {
            continue;
        }
        let text = fields.get(11).map_or("", |t| t.trim());
        let confidence: f32 = fields[10]
            .trim()
            .parse()
            .map_err(|_| ocr_error(format!("bad tsv confidence: {}", fields[10])))?;
        if text.is_empty() || confidence <= 0.0 {
            continue;
        }

        words.push(WordBox {
            text: text.to_string(),
            x: num(6)?,
            y: num(7)?,
            width: num(8)?,
            height: num(9)?,
            confidence,
            block: num(2)?,
            paragraph: num(3)?,
            line: num(4)?,
        });
    }
    Ok(words)
}
