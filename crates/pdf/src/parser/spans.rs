//! Text-span extraction and conversion into layout fragments.
//!
//! A simplified PDF text-rendering state machine walks each page's content
//! operations and records every shown string as a [`TextSpan`] in PDF user
//! space. [`merge_runs`] joins neighbouring spans that continue one font run,
//! and [`spans_to_fragments`] flips the runs into top-origin page coordinates
//! and normalises their text.
//!
//! ```text
//! content ops  ->  TextSpan[]  ->  font runs  ->  Fragment[]
//!   extract_page_spans   merge_runs     spans_to_fragments
//! ```

use pdfoutline_core::fragment::{BoundingBox, Fragment};
use unicode_normalization::UnicodeNormalization;

use super::backend::{decode_pdf_string, ContentOp, Operand, PageBounds, PageFont, PageId, PdfBackend};
use crate::PdfError;

/// A run of text shown by one operator, in PDF user space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    /// Baseline, measured upwards from the bottom of the page.
    pub y: f32,
    /// Estimated from the character count; glyph widths are not consulted.
    pub width: f32,
    pub font_size: f32,
    pub font_name: String,
}

/// Approximate glyph advance as a fraction of the font size.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// A `TJ` adjustment wider than this fraction of a glyph reads as a word gap.
const TJ_SPACE_FRACTION: f32 = 0.3;

/// Spans whose baselines differ by no more than this share a line.
const Y_TOLERANCE: f32 = 1.0;

/// Font sizes closer than this belong to the same run.
const SIZE_TOLERANCE: f32 = 0.5;

/// Widest horizontal gap a run bridges, in multiples of the font size.
const MAX_RUN_GAP: f32 = 2.0;

/// The identity 2x3 text matrix: [a, b, c, d, tx, ty].
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Graphics-independent subset of the PDF text state.
struct TextState<'f> {
    font: Option<&'f PageFont>,
    /// Fallback name when `Tf` references a font missing from the resources.
    font_label: String,
    font_size: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl<'f> TextState<'f> {
    fn new() -> Self {
        TextState {
            font: None,
            font_label: String::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }

    fn font_name(&self) -> &str {
        self.font
            .map(|f| f.base_font.as_str())
            .unwrap_or(&self.font_label)
    }

    fn decode(&self, operand: &Operand) -> String {
        match operand {
            Operand::Str(bytes) => {
                decode_pdf_string(bytes, self.font.and_then(|f| f.encoding.as_deref()))
            }
            _ => String::new(),
        }
    }

    /// Rendered size: `font_size * sqrt(b^2 + d^2)` of the text matrix.
    fn effective_font_size(&self) -> f32 {
        let [_, b, _, d, _, _] = self.text_matrix;
        (self.font_size * (b * b + d * d).sqrt()).abs()
    }

    fn glyph_advance(&self) -> f32 {
        self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale
    }

    fn origin(&self) -> (f32, f32) {
        (self.text_matrix[4], self.text_matrix[5] + self.text_rise)
    }

    fn advance(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    fn advance_past(&mut self, text: &str) {
        let dx: f32 = text
            .chars()
            .map(|c| {
                let spacing = if c == ' ' { self.word_spacing } else { 0.0 };
                self.glyph_advance() + self.char_spacing + spacing
            })
            .sum();
        self.advance(dx);
    }

    /// `Td`: translate the line matrix and restart the text matrix there.
    fn move_line(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.line_matrix;
        self.line_matrix[4] = a * tx + c * ty + e;
        self.line_matrix[5] = b * tx + d * ty + f;
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn span(&self, text: String, x: f32, y: f32) -> TextSpan {
        TextSpan {
            width: text.chars().count() as f32 * self.glyph_advance(),
            font_size: self.effective_font_size(),
            font_name: self.font_name().to_string(),
            text,
            x,
            y,
        }
    }

    fn show(&mut self, operand: &Operand, spans: &mut Vec<TextSpan>) {
        let text = self.decode(operand);
        if text.is_empty() {
            return;
        }
        let (x, y) = self.origin();
        self.advance_past(&text);
        spans.push(self.span(text, x, y));
    }

    /// `TJ`: strings interleaved with kerning adjustments in thousandths of
    /// text space. The whole array becomes one span; large negative
    /// adjustments insert a space.
    fn show_array(&mut self, items: &[Operand], spans: &mut Vec<TextSpan>) {
        let (x, y) = self.origin();
        let mut buf = String::new();

        for item in items {
            match item {
                Operand::Str(_) => {
                    let piece = self.decode(item);
                    self.advance_past(&piece);
                    buf.push_str(&piece);
                }
                other => {
                    let Some(adjustment) = other.as_number() else {
                        continue;
                    };
                    let dx = -adjustment / 1000.0 * self.font_size * self.horiz_scale;
                    if dx > self.glyph_advance() * TJ_SPACE_FRACTION && !buf.is_empty() {
                        buf.push(' ');
                    }
                    self.advance(dx);
                }
            }
        }

        let text = buf.trim_end();
        if !text.is_empty() {
            spans.push(self.span(text.to_string(), x, y));
        }
    }
}

fn set_font<'f>(op: &ContentOp, fonts: &'f [PageFont], state: &mut TextState<'f>) {
    let key = match op.operands.first() {
        Some(Operand::Name(n)) | Some(Operand::Str(n)) => n,
        _ => return,
    };
    state.font = fonts.iter().find(|f| &f.key == key);
    state.font_label = String::from_utf8_lossy(key).into_owned();
    state.font_size = op.number(1).unwrap_or(0.0);
}

fn set_text_matrix(op: &ContentOp, state: &mut TextState<'_>) {
    let values: Vec<f32> = op.operands.iter().filter_map(Operand::as_number).collect();
    if let [a, b, c, d, e, f] = values[..] {
        state.text_matrix = [a, b, c, d, e, f];
        state.line_matrix = state.text_matrix;
    }
}

/// Walk a page's content stream and collect its [`TextSpan`]s in the order
/// they are shown.
///
/// | Operator | Action |
/// |----------|--------|
/// | `BT`     | Reset text and line matrices |
/// | `Tf`     | Set font and size |
/// | `Tm`     | Set text matrix |
/// | `Td` `TD` `T*` | Move to a new line (`TD` also sets leading) |
/// | `TL` `Tc` `Tw` `Tz` `Ts` | Leading, spacing, scaling, rise |
/// | `Tj` `'` `"` | Show a string (`'` and `"` move to the next line first) |
/// | `TJ`     | Show strings with kerning adjustments |
pub fn extract_page_spans(
    backend: &dyn PdfBackend,
    page: PageId,
) -> Result<Vec<TextSpan>, PdfError> {
    let ops = backend.page_operations(page)?;
    let fonts = backend.page_fonts(page).unwrap_or_default();

    let mut state = TextState::new();
    let mut spans = Vec::new();

    for op in &ops {
        match op.operator.as_str() {
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            "Tf" => set_font(op, &fonts, &mut state),
            "Tm" => set_text_matrix(op, &mut state),
            "Td" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    state.move_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    state.leading = -ty;
                    state.move_line(tx, ty);
                }
            }
            "T*" => state.next_line(),
            "TL" => state.leading = op.number(0).unwrap_or(state.leading),
            "Tc" => state.char_spacing = op.number(0).unwrap_or(state.char_spacing),
            "Tw" => state.word_spacing = op.number(0).unwrap_or(state.word_spacing),
            "Tz" => {
                if let Some(scale) = op.number(0) {
                    state.horiz_scale = scale / 100.0;
                }
            }
            "Ts" => state.text_rise = op.number(0).unwrap_or(state.text_rise),
            "Tj" => {
                if let Some(operand) = op.operands.first() {
                    state.show(operand, &mut spans);
                }
            }
            "TJ" => {
                if let Some(Operand::Array(items)) = op.operands.first() {
                    state.show_array(items, &mut spans);
                }
            }
            "'" => {
                state.next_line();
                if let Some(operand) = op.operands.first() {
                    state.show(operand, &mut spans);
                }
            }
            "\"" => {
                if let [aw, ac, operand] = &op.operands[..] {
                    state.word_spacing = aw.as_number().unwrap_or(state.word_spacing);
                    state.char_spacing = ac.as_number().unwrap_or(state.char_spacing);
                    state.next_line();
                    state.show(operand, &mut spans);
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn continues_run(prev: &TextSpan, next: &TextSpan) -> bool {
    let gap = next.x - (prev.x + prev.width);
    prev.font_name == next.font_name
        && (prev.font_size - next.font_size).abs() < SIZE_TOLERANCE
        && (prev.y - next.y).abs() <= Y_TOLERANCE
        && gap > -prev.font_size
        && gap < prev.font_size * MAX_RUN_GAP
}

/// Join consecutive spans into font runs.
///
/// A span continues the previous run when it sits on the same baseline in
/// the same font and size, close enough horizontally. Separately shown
/// pieces are joined with a single space unless the boundary already has
/// whitespace, so producers that show one word per operator still yield
/// whole lines.
pub fn merge_runs(spans: Vec<TextSpan>) -> Vec<TextSpan> {
    let mut runs: Vec<TextSpan> = Vec::with_capacity(spans.len());

    for span in spans {
        if let Some(prev) = runs.last_mut() {
            if continues_run(prev, &span) {
                if !prev.text.ends_with(char::is_whitespace)
                    && !span.text.starts_with(char::is_whitespace)
                {
                    prev.text.push(' ');
                }
                prev.text.push_str(&span.text);
                prev.width = (span.x + span.width - prev.x).max(prev.width);
                continue;
            }
        }
        runs.push(span);
    }

    runs
}

/// Normalise span text: NFKC (which also unfolds ligatures), drop
/// replacement characters, trim.
fn normalize_text(text: &str) -> String {
    text.nfkc()
        .filter(|&c| c != '\u{FFFD}')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Convert a page's spans into [`Fragment`]s in top-origin coordinates.
///
/// Spans with no visible text or a non-positive size are dropped.
pub fn spans_to_fragments(spans: Vec<TextSpan>, page: usize, bounds: PageBounds) -> Vec<Fragment> {
    spans
        .into_iter()
        .filter(|span| span.font_size > 0.0)
        .filter_map(|span| {
            let text = normalize_text(&span.text);
            if text.is_empty() {
                return None;
            }
            let bbox = BoundingBox::new(
                span.x,
                bounds.ury - (span.y + span.font_size),
                span.x + span.width,
                bounds.ury - span.y,
            );
            Some(Fragment::new(text, span.font_size, span.font_name, bbox, page))
        })
        .collect()
}
