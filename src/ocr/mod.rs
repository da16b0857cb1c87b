//! Text extraction from stitched composites.
//!
//! Recognition itself sits behind [`TextExtractor`]. This module owns what
//! happens around it: optional binarization, trimming, and grouping word boxes
//! into blocks, paragraphs, and lines.

pub mod preprocess;
#[cfg(feature = "image-io")]
pub mod tesseract;

use crate::image::RasterBuffer;
use crate::trace::{trace_event, trace_span};
use crate::util::StitchResult;

/// Options forwarded to the recognizer.
#[derive(Clone, Debug, PartialEq)]
pub struct OcrOptions {
    /// Recognizer language code, e.g. `eng`.
    pub lang: String,
    /// Binarize the image before recognition.
    pub preprocess: bool,
    /// Engine mode passed to engines that support one.
    pub oem: u8,
    /// Page segmentation mode passed to engines that support one. Word box
    /// extraction keeps the engine's automatic segmentation.
    pub psm: u8,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            lang: "eng".to_string(),
            preprocess: true,
            oem: 3,
            psm: 6,
        }
    }
}

/// One recognized word with its bounding box.
#[derive(Clone, Debug, PartialEq)]
pub struct WordBox {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Recognizer confidence, 0–100.
    pub confidence: f32,
    /// Block number reported by the recognizer.
    pub block: u32,
    /// Paragraph number within the block.
    pub paragraph: u32,
    /// Line number within the paragraph.
    pub line: u32,
}

/// A recognizer that turns a raster into text.
pub trait TextExtractor {
    /// Returns the plain text of `image`.
    fn extract_text(&self, image: &RasterBuffer, options: &OcrOptions) -> StitchResult<String>;

    /// Returns words in scan order (top to bottom, left to right per line).
    fn extract_words(
        &self,
        image: &RasterBuffer,
        options: &OcrOptions,
    ) -> StitchResult<Vec<WordBox>>;
}

fn prepare(image: &RasterBuffer, options: &OcrOptions) -> StitchResult<RasterBuffer> {
    if options.preprocess {
        preprocess::binarize(image)
    } else {
        Ok(image.clone())
    }
}

/// Runs `extractor` on `image`, binarizing first when enabled, and trims the
/// result.
pub fn extract_text<E: TextExtractor + ?Sized>(
    extractor: &E,
    image: &RasterBuffer,
    options: &OcrOptions,
) -> StitchResult<String> {
    let _span = trace_span!("ocr_extract", lang = options.lang.as_str()).entered();
    let prepared = prepare(image, options)?;
    let text = extractor.extract_text(&prepared, options)?;
    let text = text.trim().to_string();
    trace_event!("ocr_text", chars = text.chars().count());
    Ok(text)
}

/// Runs `extractor` for word boxes, dropping empty words and non-positive
/// confidences.
pub fn extract_words<E: TextExtractor + ?Sized>(
    extractor: &E,
    image: &RasterBuffer,
    options: &OcrOptions,
) -> StitchResult<Vec<WordBox>> {
    let _span = trace_span!("ocr_words", lang = options.lang.as_str()).entered();
    let prepared = prepare(image, options)?;
    let words: Vec<WordBox> = extractor
        .extract_words(&prepared, options)?
        .into_iter()
        .filter(|w| !w.text.trim().is_empty() && w.confidence > 0.0)
        .collect();
    trace_event!("ocr_words", count = words.len());
    Ok(words)
}

/// Words sharing a line number.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextLine {
    pub line: u32,
    pub words: Vec<WordBox>,
}

impl TextLine {
    /// Joins the words with single spaces.
    pub fn text(&self) -> String {
        let words: Vec<&str> = self.words.iter().map(|w| w.text.as_str()).collect();
        words.join(" ")
    }
}

/// Lines sharing a paragraph number.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Paragraph {
    pub paragraph: u32,
    pub lines: Vec<TextLine>,
}

/// Paragraphs sharing a block number.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextBlock {
    pub block: u32,
    pub paragraphs: Vec<Paragraph>,
}

/// Hierarchical view of recognized words.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextLayout {
    pub blocks: Vec<TextBlock>,
}

impl TextLayout {
    /// Groups words by block, paragraph, and line, starting a new group
    /// whenever the corresponding number changes in scan order.
    pub fn from_words(words: &[WordBox]) -> Self {
        let mut blocks: Vec<TextBlock> = Vec::new();
        for word in words {
            if blocks.last().map_or(true, |b| b.block != word.block) {
                blocks.push(TextBlock {
                    block: word.block,
                    paragraphs: Vec::new(),
                });
            }
            let block = blocks.last_mut().expect("block pushed above");

            if block
                .paragraphs
                .last()
                .map_or(true, |p| p.paragraph != word.paragraph)
            {
                block.paragraphs.push(Paragraph {
                    paragraph: word.paragraph,
                    lines: Vec::new(),
                });
            }
            let paragraph = block.paragraphs.last_mut().expect("paragraph pushed above");

            if paragraph.lines.last().map_or(true, |l| l.line != word.line) {
                paragraph.lines.push(TextLine {
                    line: word.line,
                    words: Vec::new(),
                });
            }
            let line = paragraph.lines.last_mut().expect("line pushed above");
            line.words.push(word.clone());
        }
        Self { blocks }
    }

    /// Iterates over every line in document order.
    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.blocks
            .iter()
            .flat_map(|b| b.paragraphs.iter())
            .flat_map(|p| p.lines.iter())
    }

    /// Renders the layout as text: one line per line, blank line between
    /// paragraphs.
    pub fn full_text(&self) -> String {
        let mut paragraphs = Vec::new();
        for block in &self.blocks {
            for paragraph in &block.paragraphs {
                let lines: Vec<String> = paragraph.lines.iter().map(TextLine::text).collect();
                paragraphs.push(lines.join("\n"));
            }
        }
        paragraphs.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_text, extract_words, OcrOptions, TextExtractor, TextLayout, WordBox};
    use crate::image::{Channels, RasterBuffer};
    use crate::util::StitchResult;
    use std::cell::Cell;

    fn word(text: &str, block: u32, paragraph: u32, line: u32, confidence: f32) -> WordBox {
        WordBox {
            text: text.to_string(),
            x: 0,
            y: 0,
            width: 10,
            height: 10,
            confidence,
            block,
            paragraph,
            line,
        }
    }

    struct Canned {
        saw_binary: Cell<bool>,
    }

    impl TextExtractor for Canned {
        fn extract_text(&self, image: &RasterBuffer, _: &OcrOptions) -> StitchResult<String> {
            let binary = image.data().iter().all(|&v| v == 0 || v == 255);
            self.saw_binary.set(binary);
            Ok("  hello world \n".to_string())
        }

        fn extract_words(&self, _: &RasterBuffer, _: &OcrOptions) -> StitchResult<Vec<WordBox>> {
            Ok(vec![
                word("hello", 1, 1, 1, 96.0),
                word(" ", 1, 1, 1, 95.0),
                word("ghost", 1, 1, 1, -1.0),
                word("world", 1, 1, 1, 91.5),
            ])
        }
    }

    #[test]
    fn extract_text_trims_and_preprocesses() {
        let image = RasterBuffer::filled(8, 8, Channels::Rgb, 128).unwrap();
        let extractor = Canned {
            saw_binary: Cell::new(false),
        };
        let text = extract_text(&extractor, &image, &OcrOptions::default()).unwrap();
        assert_eq!(text, "hello world");
        assert!(extractor.saw_binary.get());

        let raw = OcrOptions {
            preprocess: false,
            ..OcrOptions::default()
        };
        extract_text(&extractor, &image, &raw).unwrap();
        assert!(!extractor.saw_binary.get());
    }

    #[test]
    fn extract_words_filters_empty_and_unconfident() {
        let image = RasterBuffer::filled(8, 8, Channels::Gray, 0).unwrap();
        let extractor = Canned {
            saw_binary: Cell::new(false),
        };
        let words = extract_words(&extractor, &image, &OcrOptions::default()).unwrap();
        let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, ["hello", "world"]);
    }

    #[test]
    fn layout_groups_by_block_paragraph_and_line() {
        let words = [
            word("Title", 1, 1, 1, 90.0),
            word("one", 2, 1, 1, 90.0),
            word("two", 2, 1, 1, 90.0),
            word("three", 2, 1, 2, 90.0),
            word("four", 2, 2, 1, 90.0),
        ];
        let layout = TextLayout::from_words(&words);
        assert_eq!(layout.blocks.len(), 2);
        assert_eq!(layout.blocks[1].paragraphs.len(), 2);
        assert_eq!(layout.lines().count(), 4);
        assert_eq!(layout.full_text(), "Title\n\none two\nthree\n\nfour");
    }
}
