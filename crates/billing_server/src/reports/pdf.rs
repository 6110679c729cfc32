//! Minimal text-only page layout on top of `printpdf`: headings, paragraphs
//! and fixed-width tables, with a new Letter page whenever the cursor reaches
//! the bottom margin.

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use super::ReportError;

const PAGE_WIDTH: Mm = Mm(215.9);
const PAGE_HEIGHT: Mm = Mm(279.4);
const MARGIN: f32 = 20.0;
const LAYER: &str = "content";

const BODY_SIZE: f32 = 10.0;
const PT_TO_MM: f32 = 0.3528;
const LINE_SPACING: f32 = 1.4;

pub struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Baseline of the next line, in mm from the bottom of the page.
    cursor: f32,
}

/// One table column: header text and width in mm. Right-aligned columns are
/// for amounts.
pub struct Column<'a> {
    pub header: &'a str,
    pub width: f32,
    pub right_aligned: bool,
}

impl<'a> Column<'a> {
    pub fn text(header: &'a str, width: f32) -> Self {
        Self {
            header,
            width,
            right_aligned: false,
        }
    }

    pub fn amount(header: &'a str, width: f32) -> Self {
        Self {
            header,
            width,
            right_aligned: true,
        }
    }
}

impl PdfWriter {
    pub fn new(title: &str) -> Result<Self, ReportError> {
        let (doc, page, layer) = PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, LAYER);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            cursor: PAGE_HEIGHT.0 - MARGIN,
        })
    }

    fn line_height(size: f32) -> f32 {
        size * PT_TO_MM * LINE_SPACING
    }

    fn ensure_space(&mut self, height: f32) {
        if self.cursor - height >= MARGIN {
            return;
        }
        let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, LAYER);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = PAGE_HEIGHT.0 - MARGIN;
    }

    fn write_line(&mut self, text: &str, size: f32, bold: bool) {
        let height = Self::line_height(size);
        self.ensure_space(height);
        self.cursor -= height;
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(text, size, Mm(MARGIN), Mm(self.cursor), font);
    }

    pub fn title(&mut self, text: &str) {
        self.write_line(text, 18.0, true);
        self.spacer(4.0);
    }

    pub fn heading(&mut self, text: &str) {
        self.write_line(text, 13.0, true);
        self.spacer(1.5);
    }

    pub fn paragraph(&mut self, text: &str) {
        self.write_line(text, BODY_SIZE, false);
    }

    pub fn strong(&mut self, text: &str) {
        self.write_line(text, BODY_SIZE, true);
    }

    pub fn spacer(&mut self, height: f32) {
        if self.cursor - height < MARGIN {
            self.cursor = MARGIN;
        } else {
            self.cursor -= height;
        }
    }

    /// Header row in bold, then `rows`. Rows listed in `totals` are bold too.
    pub fn table(&mut self, columns: &[Column<'_>], rows: &[Vec<String>], totals: &[Vec<String>]) {
        let headers: Vec<String> = columns.iter().map(|c| c.header.to_string()).collect();
        self.table_row(columns, &headers, true);
        for row in rows {
            self.table_row(columns, row, false);
        }
        for row in totals {
            self.table_row(columns, row, true);
        }
        self.spacer(3.0);
    }

    fn table_row(&mut self, columns: &[Column<'_>], cells: &[String], bold: bool) {
        let height = Self::line_height(BODY_SIZE);
        self.ensure_space(height);
        self.cursor -= height;

        let font = if bold { &self.bold } else { &self.regular };
        let mut x = MARGIN;
        for (column, cell) in columns.iter().zip(cells) {
            let text = fit(cell, column.width);
            let offset = if column.right_aligned {
                (column.width - text_width(&text)).max(0.0)
            } else {
                0.0
            };
            self.layer
                .use_text(text, BODY_SIZE, Mm(x + offset), Mm(self.cursor), font);
            x += column.width;
        }
    }

    pub fn finish(self) -> Result<Vec<u8>, ReportError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| ReportError::Pdf(e.to_string()))
    }
}

// Helvetica averages roughly half an em per glyph.
fn text_width(text: &str) -> f32 {
    text.chars().count() as f32 * BODY_SIZE * PT_TO_MM * 0.5
}

/// Truncate `text` with an ellipsis so it fits a column, leaving a small gap.
fn fit(text: &str, width: f32) -> String {
    let max_chars = ((width - 2.0) / (BODY_SIZE * PT_TO_MM * 0.5)).floor().max(1.0) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}
