//! PDF text extraction using lopdf and pdf-extract.

use lopdf::content::Content;
use lopdf::{Document, Object};
use tracing::{debug, trace, warn};

use super::lines::{reconstruct, Lines};
use super::{PdfProcessor, Result, TextRun};
use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// Glyph advance guess as a fraction of the font size. Only used to order
/// consecutive show operators that carry no explicit repositioning.
const AVERAGE_GLYPH_WIDTH: f32 = 0.5;

/// PDF content extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

/// Reconstructed lines of a PDF plus how they were obtained.
#[derive(Debug, Clone)]
pub struct PdfLines {
    /// Reading-order lines.
    pub lines: Lines,
    /// Lines came from flat text extraction, not glyph positions.
    pub approximated: bool,
    /// Pages decoded.
    pub pages: u32,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Decode every page and rebuild reading-order lines.
    ///
    /// Falls back to flat text extraction when the positioned walk produces
    /// less than `min_text_length` characters but the flat extractor finds
    /// more.
    pub fn extract_lines(&self, config: &PdfConfig) -> Result<PdfLines> {
        let mut pages = self.page_count();
        if pages == 0 {
            return Err(PdfError::NoPages);
        }
        if config.max_pages > 0 {
            pages = pages.min(config.max_pages as u32);
        }

        let mut page_runs = Vec::with_capacity(pages as usize);
        for page in 1..=pages {
            match self.extract_runs(page) {
                Ok(runs) => page_runs.push(runs),
                Err(e) => {
                    warn!("Skipping page {}: {}", page, e);
                    page_runs.push(Vec::new());
                }
            }
        }

        let lines = reconstruct(&page_runs, config.y_tolerance);
        let positioned_len: usize = lines.iter().map(|l| l.len()).sum();
        debug!(
            "Reconstructed {} lines ({} chars) from {} pages",
            lines.len(),
            positioned_len,
            pages
        );

        if positioned_len >= config.min_text_length {
            return Ok(PdfLines {
                lines,
                approximated: false,
                pages,
            });
        }

        let flat = match self.extract_text() {
            Ok(text) => Lines::from_text(&text),
            Err(e) => {
                debug!("Flat text extraction failed: {}", e);
                Lines::default()
            }
        };
        let flat_len: usize = flat.iter().map(|l| l.len()).sum();

        if flat_len > positioned_len {
            debug!("Using flat text extraction ({} chars)", flat_len);
            Ok(PdfLines {
                lines: flat,
                approximated: true,
                pages,
            })
        } else {
            Ok(PdfLines {
                lines,
                approximated: false,
                pages,
            })
        }
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // Save decrypted document to raw_data for pdf_extract
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_runs(&self, page: u32) -> Result<Vec<TextRun>> {
        let doc = self
            .document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))?;

        let page_id = *doc
            .get_pages()
            .get(&page)
            .ok_or_else(|| PdfError::TextExtraction(format!("page {} not found", page)))?;

        let raw = doc
            .get_page_content(page_id)
            .map_err(|e| PdfError::TextExtraction(format!("page {}: {}", page, e)))?;
        let content = Content::decode(&raw)
            .map_err(|e| PdfError::TextExtraction(format!("page {}: {}", page, e)))?;

        let runs = walk_content(&content);
        trace!("Page {}: {} text runs", page, runs.len());
        Ok(runs)
    }

    fn extract_text(&self) -> Result<String> {
        // pdf-extract panics on some malformed font dictionaries
        let extracted = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&self.raw_data)
        }))
        .map_err(|_| PdfError::TextExtraction("flat text extractor panicked".to_string()))?;

        extracted.map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

/// 2D affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other`.
    fn then(&self, other: &Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    fn origin(&self) -> (f32, f32) {
        (self.0[4], self.0[5])
    }
}

/// Text state tracked while walking a content stream.
struct TextState {
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    leading: f32,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horiz_scale: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            ctm_stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            leading: 0.0,
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horiz_scale: 1.0,
        }
    }
}

impl TextState {
    fn translate_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn position(&self) -> (f32, f32) {
        self.text_matrix.then(&self.ctm).origin()
    }

    fn advance(&mut self, tx: f32) {
        self.text_matrix = Matrix::translation(tx, 0.0).then(&self.text_matrix);
    }

    fn show(&mut self, bytes: &[u8], runs: &mut Vec<TextRun>) {
        let (x, y) = self.position();
        let glyphs = bytes.len() as f32;
        let spaces = bytes.iter().filter(|b| **b == b' ').count() as f32;

        if let Some(text) = decode_pdf_string(bytes) {
            runs.push(TextRun::new(x, y, text));
        }

        let width = glyphs * (self.font_size * AVERAGE_GLYPH_WIDTH + self.char_spacing)
            + spaces * self.word_spacing;
        self.advance(width * self.horiz_scale);
    }
}

/// Walk a page's content stream and collect positioned text runs.
fn walk_content(content: &Content) -> Vec<TextRun> {
    let mut state = TextState::default();
    let mut runs = Vec::new();

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => state.ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(ctm) = state.ctm_stack.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operand(operands) {
                    state.ctm = m.then(&state.ctm);
                }
            }
            "BT" => {
                state.text_matrix = Matrix::IDENTITY;
                state.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(size) = operands.get(1).and_then(number) {
                    state.font_size = size.abs();
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operand(operands) {
                    state.text_matrix = m;
                    state.line_matrix = m;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (operands.first().and_then(number), operands.get(1).and_then(number)) {
                    state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (operands.first().and_then(number), operands.get(1).and_then(number)) {
                    state.leading = -ty;
                    state.translate_line(tx, ty);
                }
            }
            "T*" => state.translate_line(0.0, -state.leading),
            "TL" => {
                if let Some(v) = operands.first().and_then(number) {
                    state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = operands.first().and_then(number) {
                    state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = operands.first().and_then(number) {
                    state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = operands.first().and_then(number) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    state.show(bytes, &mut runs);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    show_array(items, &mut state, &mut runs);
                }
            }
            "'" => {
                state.translate_line(0.0, -state.leading);
                if let Some(Object::String(bytes, _)) = operands.first() {
                    state.show(bytes, &mut runs);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (operands.first().and_then(number), operands.get(1).and_then(number)) {
                    state.word_spacing = aw;
                    state.char_spacing = ac;
                }
                state.translate_line(0.0, -state.leading);
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    state.show(bytes, &mut runs);
                }
            }
            _ => {}
        }
    }

    runs
}

/// `TJ` arrays mix strings with kerning adjustments in thousandths of an em.
/// Strings separated by small adjustments form one run; a large negative
/// adjustment is a visual gap and starts a new run.
fn show_array(items: &[Object], state: &mut TextState, runs: &mut Vec<TextRun>) {
    let mut pending: Vec<u8> = Vec::new();

    for item in items {
        match item {
            Object::String(bytes, _) => pending.extend_from_slice(bytes),
            other => {
                if let Some(adjust) = number(other) {
                    if adjust < -200.0 && !pending.is_empty() {
                        state.show(&pending, runs);
                        pending.clear();
                    }
                    state.advance(-adjust / 1000.0 * state.font_size * state.horiz_scale);
                }
            }
        }
    }

    if !pending.is_empty() {
        state.show(&pending, runs);
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0f32; 6];
    for (slot, obj) in m.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    Some(Matrix(m))
}

/// Decode a string operand. UTF-16BE with BOM is honoured; anything else is
/// read as single-byte text. Runs that decode mostly to control characters
/// (two-byte CID fonts without a readable encoding) are dropped so the flat
/// extractor can take over.
fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    let text: String = if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    };

    let total = text.chars().count();
    if total == 0 {
        return None;
    }

    let unreadable = text
        .chars()
        .filter(|c| c.is_control() || *c == char::REPLACEMENT_CHARACTER)
        .count();
    if unreadable * 2 > total {
        trace!("Dropping unreadable run ({} of {} chars)", unreadable, total);
        return None;
    }

    Some(text.chars().filter(|c| !c.is_control()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        assert!(extractor.load(b"definitely not a pdf").is_err());
    }

    #[test]
    fn test_walk_tracks_positions() {
        let content = Content {
            operations: vec![
                op("BT", vec![]),
                op("Tf", vec![Object::Name(b"F1".to_vec()), 10.into()]),
                op("Td", vec![72.into(), 700.into()]),
                op("Tj", vec![Object::string_literal("Visa")]),
                op("Td", vec![0.into(), (-14).into()]),
                op("Tj", vec![Object::string_literal("Mastercard")]),
                op("ET", vec![]),
            ],
        };

        let runs = walk_content(&content);
        assert_eq!(runs.len(), 2);
        assert_eq!((runs[0].x, runs[0].y), (72.0, 700.0));
        assert_eq!(runs[1].text, "Mastercard");
        assert_eq!((runs[1].x, runs[1].y), (72.0, 686.0));
    }

    #[test]
    fn test_walk_applies_ctm() {
        let content = Content {
            operations: vec![
                op("q", vec![]),
                op("cm", vec![1.into(), 0.into(), 0.into(), 1.into(), 0.into(), 100.into()]),
                op("BT", vec![]),
                op("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 50.into(), 500.into()]),
                op("Tj", vec![Object::string_literal("Total")]),
                op("ET", vec![]),
                op("Q", vec![]),
                op("BT", vec![]),
                op("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 50.into(), 500.into()]),
                op("Tj", vec![Object::string_literal("After")]),
                op("ET", vec![]),
            ],
        };

        let runs = walk_content(&content);
        assert_eq!(runs[0].y, 600.0);
        assert_eq!(runs[1].y, 500.0);
    }

    #[test]
    fn test_tj_array_splits_on_wide_gap() {
        let content = Content {
            operations: vec![
                op("BT", vec![]),
                op("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 10.into(), 10.into()]),
                op(
                    "TJ",
                    vec![Object::Array(vec![
                        Object::string_literal("Gr"),
                        (-20).into(),
                        Object::string_literal("oss"),
                        (-3000).into(),
                        Object::string_literal("1,000.00"),
                    ])],
                ),
                op("ET", vec![]),
            ],
        };

        let runs = walk_content(&content);
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Gross", "1,000.00"]);
        assert!(runs[1].x > runs[0].x);
    }

    #[test]
    fn test_decode_utf16() {
        let bytes = [0xFE, 0xFF, 0x00, 0x56, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&bytes).as_deref(), Some("Vi"));
    }

    #[test]
    fn test_decode_drops_cid_bytes() {
        let bytes = [0x00, 0x25, 0x00, 0x11, 0x00, 0x03];
        assert_eq!(decode_pdf_string(&bytes), None);
    }
}
