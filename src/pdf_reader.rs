use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::model::{PageContent, Word};
use crate::options::PageSelection;
use crate::table_detect::{Edge, detect_tables};

/// Horizontal gap that still joins two glyphs into one word.
const X_TOLERANCE: f32 = 3.0;
/// Vertical drift allowed within a word and within a text line.
const Y_TOLERANCE: f32 = 3.0;
/// Share of the font size above the baseline.
const ASCENT: f64 = 0.8;

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `a × b` in PDF row-vector convention.
fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

fn apply(matrix: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (
        x * matrix[0] + y * matrix[2] + matrix[4],
        x * matrix[1] + y * matrix[3] + matrix[5],
    )
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

fn number(object: &Object) -> Option<f32> {
    object.as_float().ok()
}

#[derive(Debug, Clone, PartialEq)]
struct Glyph {
    text: String,
    x0: f32,
    x1: f32,
    top: f32,
}

/// Collects every character `pdf-extract` shows on a page, already mapped
/// through the font's encoding or `ToUnicode` CMap, in top-left page space.
#[derive(Debug, Default)]
struct GlyphCollector {
    left: f64,
    upper: f64,
    glyphs: Vec<Glyph>,
}

impl OutputDev for GlyphCollector {
    fn begin_page(
        &mut self,
        _page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.left = media_box.llx.min(media_box.urx);
        self.upper = media_box.lly.max(media_box.ury);
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        text: &str,
    ) -> Result<(), OutputError> {
        let size = font_size * (trm.m11 * trm.m22 - trm.m12 * trm.m21).abs().sqrt();
        if !size.is_finite() {
            return Ok(());
        }

        let x0 = trm.m31 - self.left;
        let baseline = self.upper - trm.m32;
        self.glyphs.push(Glyph {
            text: text.to_string(),
            x0: x0 as f32,
            x1: (x0 + width * size) as f32,
            top: (baseline - size * ASCENT) as f32,
        });
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Font handling in `pdf-extract` panics on some malformed fonts; such a page
/// keeps whatever glyphs were shown before the failure.
fn page_glyphs(document: &Document, page_no: u32) -> Vec<Glyph> {
    let mut collector = GlyphCollector::default();
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::output_doc_page(document, &mut collector, page_no)
    }));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(error)) => warn!(page = page_no, "text extraction failed: {error}"),
        Err(_) => warn!(page = page_no, "text extraction aborted on an unsupported font"),
    }
    collector.glyphs
}

/// Page coordinates: MediaBox left and upper bound, used to flip y so that
/// `top` grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PageFrame {
    left: f32,
    upper: f32,
}

impl PageFrame {
    fn to_page(self, x: f32, y: f32) -> (f32, f32) {
        (x - self.left, self.upper - y)
    }
}

fn page_frame(document: &Document, page_id: ObjectId) -> PageFrame {
    let mut current = document.get_dictionary(page_id).ok();
    while let Some(dictionary) = current {
        if let Some(values) = dictionary
            .get(b"MediaBox")
            .map(|object| resolve(document, object))
            .and_then(Object::as_array)
            .ok()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| number(resolve(document, item)))
                    .collect::<Vec<_>>()
            })
            .filter(|values| values.len() == 4)
        {
            return PageFrame {
                left: values[0].min(values[2]),
                upper: values[1].max(values[3]),
            };
        }
        current = dictionary
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|parent| document.get_dictionary(parent))
            .ok();
    }

    PageFrame {
        left: 0.0,
        upper: 842.0,
    }
}

#[derive(Debug, Default)]
struct PathBuilder {
    start: Option<(f32, f32)>,
    current: Option<(f32, f32)>,
    segments: Vec<((f32, f32), (f32, f32))>,
}

impl PathBuilder {
    fn move_to(&mut self, point: (f32, f32)) {
        self.start = Some(point);
        self.current = Some(point);
    }

    fn line_to(&mut self, point: (f32, f32)) {
        if let Some(from) = self.current {
            self.segments.push((from, point));
        }
        self.current = Some(point);
    }

    fn close(&mut self) {
        if let Some(start) = self.start {
            self.line_to(start);
        }
    }

    fn take(&mut self) -> Vec<((f32, f32), (f32, f32))> {
        self.start = None;
        self.current = None;
        std::mem::take(&mut self.segments)
    }
}

/// Follows the graphics state and path operators of a content stream and
/// keeps every painted straight segment as a ruling edge.
struct RulingCollector {
    frame: PageFrame,
    ctm: Matrix,
    stack: Vec<Matrix>,
    path: PathBuilder,
    edges: Vec<Edge>,
}

impl RulingCollector {
    fn new(frame: PageFrame) -> Self {
        Self {
            frame,
            ctm: IDENTITY,
            stack: Vec::new(),
            path: PathBuilder::default(),
            edges: Vec::new(),
        }
    }

    fn user_point(&self, x: f32, y: f32) -> (f32, f32) {
        let (x, y) = apply(&self.ctm, x, y);
        self.frame.to_page(x, y)
    }

    fn paint_path(&mut self) {
        for (from, to) in self.path.take() {
            if let Some(edge) = Edge::from_segment(from, to) {
                self.edges.push(edge);
            }
        }
    }

    fn operate(&mut self, operator: &str, operands: &[Object]) {
        let value = |index: usize| operands.get(index).and_then(number).unwrap_or(0.0);
        match operator {
            "q" => self.stack.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.stack.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" if operands.len() >= 6 => {
                let matrix = [value(0), value(1), value(2), value(3), value(4), value(5)];
                self.ctm = multiply(&matrix, &self.ctm);
            }
            "m" => {
                let point = self.user_point(value(0), value(1));
                self.path.move_to(point);
            }
            "l" => {
                let point = self.user_point(value(0), value(1));
                self.path.line_to(point);
            }
            "h" => self.path.close(),
            "re" => {
                let (x, y, width, height) = (value(0), value(1), value(2), value(3));
                let corners = [
                    self.user_point(x, y),
                    self.user_point(x + width, y),
                    self.user_point(x + width, y + height),
                    self.user_point(x, y + height),
                ];
                self.path.move_to(corners[0]);
                for corner in &corners[1..] {
                    self.path.line_to(*corner);
                }
                self.path.close();
            }
            "s" | "b" | "b*" => {
                self.path.close();
                self.paint_path();
            }
            "S" | "f" | "F" | "f*" | "B" | "B*" => self.paint_path(),
            "n" => {
                self.path.take();
            }
            _ => {}
        }
    }
}

fn page_edges(document: &Document, page_id: ObjectId) -> Vec<Edge> {
    let Some(content) = document
        .get_page_content(page_id)
        .ok()
        .and_then(|raw| Content::decode(&raw).ok())
    else {
        return Vec::new();
    };

    let mut collector = RulingCollector::new(page_frame(document, page_id));
    for operation in &content.operations {
        collector.operate(&operation.operator, &operation.operands);
    }
    collector.edges
}

/// Joins glyphs into words. Whitespace, a horizontal gap wider than
/// [`X_TOLERANCE`], a backwards jump or a baseline change starts a new word.
fn glyphs_to_words(glyphs: &[Glyph]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Option<(Word, f32, f32)> = None;

    for glyph in glyphs {
        if glyph.text.trim().is_empty() {
            if let Some((word, _, _)) = current.take() {
                words.push(word);
            }
            continue;
        }

        if let Some((word, last_x0, x1)) = current.as_mut() {
            let continues = (glyph.top - word.top).abs() <= Y_TOLERANCE
                && glyph.x0 >= *last_x0
                && glyph.x0 - *x1 <= X_TOLERANCE;
            if continues {
                word.text.push_str(&glyph.text);
                word.top = word.top.min(glyph.top);
                *last_x0 = glyph.x0;
                *x1 = glyph.x1;
                continue;
            }
        }

        if let Some((word, _, _)) = current.take() {
            words.push(word);
        }
        current = Some((
            Word::new(glyph.text.clone(), glyph.x0, glyph.top),
            glyph.x0,
            glyph.x1,
        ));
    }

    if let Some((word, _, _)) = current {
        words.push(word);
    }
    words
}

/// Groups words into reading-order lines: words whose `top` lies within
/// [`Y_TOLERANCE`] of a line's first word share that line, lines run top to
/// bottom and words within a line left to right. The drawing order of the
/// content stream plays no part.
fn reading_lines(mut words: Vec<Word>) -> Vec<Vec<Word>> {
    words.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

    let mut lines: Vec<Vec<Word>> = Vec::new();
    for word in words {
        match lines.last_mut() {
            Some(line) if (word.top - line[0].top).abs() <= Y_TOLERANCE => line.push(word),
            _ => lines.push(vec![word]),
        }
    }
    for line in &mut lines {
        line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    }
    lines
}

fn lines_to_text(lines: &[Vec<Word>]) -> String {
    lines
        .iter()
        .map(|line| {
            line.iter()
                .map(|word| word.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn read_document(
    document: &Document,
    page_selection: Option<&PageSelection>,
) -> Result<Vec<PageContent>, ExtractError> {
    let mut pages = Vec::new();
    for (page_no, page_id) in document.get_pages() {
        if let Some(selection) = page_selection
            && !selection.contains(page_no)
        {
            continue;
        }

        let glyphs = page_glyphs(document, page_no);
        let edges = page_edges(document, page_id);
        let lines = reading_lines(glyphs_to_words(&glyphs));
        let text = lines_to_text(&lines);
        let words = lines.into_iter().flatten().collect::<Vec<_>>();
        let tables = detect_tables(&edges, &words);

        debug!(
            page = page_no,
            glyphs = glyphs.len(),
            words = words.len(),
            edges = edges.len(),
            tables = tables.len(),
            "page read"
        );
        pages.push(PageContent {
            page_number: page_no,
            text,
            words,
            tables,
        });
    }

    if pages.is_empty() {
        return Err(ExtractError::NoPagesSelected);
    }

    Ok(pages)
}

/// Loads every selected page with its words in reading order, the page text
/// and ruled tables. Failing to open the document is the only hard error.
pub fn read_pdf_pages(
    input_pdf: &Path,
    page_selection: Option<&PageSelection>,
) -> Result<Vec<PageContent>, ExtractError> {
    let document = Document::load(input_pdf)?;
    read_document(&document, page_selection)
}

pub fn read_pdf_pages_from_bytes(
    input_pdf: &[u8],
    page_selection: Option<&PageSelection>,
) -> Result<Vec<PageContent>, ExtractError> {
    let document = Document::load_mem(input_pdf)?;
    read_document(&document, page_selection)
}
