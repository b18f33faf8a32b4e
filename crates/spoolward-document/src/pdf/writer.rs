// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: typeset plain text into a PDF using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use tracing::{debug, info, instrument};

use spoolward_core::error::{Result, SpoolError};

/// Page sizes the built-in writer can lay out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::Letter => (215.9, 279.4),
        }
    }
}

/// Creates PDF documents from text content.
///
/// Text is set in Courier so column layouts from text jobs survive.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    page_size: PageSize,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfWriter {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            title: None,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.page_size.dimensions_mm();
        (Mm(w_mm), Mm(h_mm))
    }

    /// Create a PDF from plain text content.
    ///
    /// Lines are wrapped at the page width and pages break automatically.
    /// Empty input produces a single blank page.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn create_from_text(&self, text: &str) -> Result<Vec<u8>> {
        let (page_w, page_h) = self.page_dimensions();
        let title = self.title.as_deref().unwrap_or("Spoolward Document");

        info!(page = ?self.page_size, title, "Creating text PDF");

        let font_size_pt: f32 = 10.0;
        let line_height_pt: f32 = 12.5;
        let margin_mm: f32 = 15.0;
        let margin_pt: f32 = Mm(margin_mm).into_pt().0;
        let usable_width_mm = page_w.0 - 2.0 * margin_mm;

        // Courier advances 0.6em per glyph; 1pt = 0.3528mm.
        let char_width_mm: f32 = 0.6 * font_size_pt * 0.3528;
        let max_chars_per_line = ((usable_width_mm / char_width_mm) as usize).max(1);

        let wrapped_lines = wrap_text(text, max_chars_per_line);
        let page_h_pt = page_h.into_pt().0;
        let usable_height_pt = page_h_pt - 2.0 * margin_pt;
        let lines_per_page = ((usable_height_pt / line_height_pt) as usize).max(1);

        let mut doc = PdfDocument::new(title);
        let mut pages: Vec<PdfPage> = Vec::new();

        for chunk in wrapped_lines.chunks(lines_per_page) {
            let mut ops: Vec<Op> = Vec::new();

            for (line_idx, line) in chunk.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                // Baseline of the first line sits one line below the top margin.
                let y_pt = page_h_pt - margin_pt - ((line_idx + 1) as f32 * line_height_pt);

                ops.push(Op::StartTextSection);
                ops.push(Op::SetTextCursor {
                    pos: Point {
                        x: Pt(margin_pt),
                        y: Pt(y_pt),
                    },
                });
                ops.push(Op::SetFontSizeBuiltinFont {
                    size: Pt(font_size_pt),
                    font: BuiltinFont::Courier,
                });
                ops.push(Op::WriteTextBuiltinFont {
                    items: vec![TextItem::Text(line.clone())],
                    font: BuiltinFont::Courier,
                });
                ops.push(Op::EndTextSection);
            }

            pages.push(PdfPage::new(page_w, page_h, ops));
        }

        if pages.is_empty() {
            pages.push(PdfPage::new(page_w, page_h, Vec::new()));
        }

        doc.with_pages(pages);

        debug!(
            total_lines = wrapped_lines.len(),
            pages = doc.pages.len(),
            "Text layout complete"
        );

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if output.is_empty() {
            return Err(SpoolError::Conversion("PDF writer produced no output".into()));
        }

        Ok(output)
    }

    /// Create a text PDF and write it directly to a file.
    pub fn write_text_to_file(&self, text: &str, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.create_from_text(text)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote text PDF to {}", path.as_ref().display());
        Ok(())
    }
}

// -- Text wrapping helper -----------------------------------------------------

/// Wrap a multi-line string so that no line exceeds `max_width` characters.
///
/// Existing newlines are kept and tabs expand to four spaces.  Lines are
/// broken at the last space that fits; a run without spaces is cut hard.
/// Leading indentation is preserved.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for raw_line in text.split('\n') {
        let line = raw_line.trim_end_matches('\r').replace('\t', "    ");
        let mut chars: Vec<char> = line.trim_end().chars().collect();

        if chars.is_empty() {
            result.push(String::new());
            continue;
        }

        while chars.len() > max_width {
            let break_at = chars[..=max_width]
                .iter()
                .rposition(|c| *c == ' ')
                .filter(|&pos| pos > 0)
                .unwrap_or(max_width);

            let head: String = chars[..break_at].iter().collect();
            result.push(head.trim_end().to_string());

            let mut rest = chars.split_off(break_at);
            if rest.first() == Some(&' ') {
                rest.remove(0);
            }
            chars = rest;
        }

        result.push(chars.into_iter().collect());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_pdf_has_pdf_header() {
        let bytes = PdfWriter::default()
            .create_from_text("Hello\nKiosk")
            .expect("create");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_text_still_produces_a_page() {
        let bytes = PdfWriter::new(PageSize::Letter)
            .create_from_text("")
            .expect("create");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn wrap_breaks_at_spaces() {
        let lines = wrap_text("the quick brown fox", 10);
        assert_eq!(lines, vec!["the quick", "brown fox"]);
    }

    #[test]
    fn wrap_cuts_long_words() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wrap_keeps_blank_lines_and_indentation() {
        let lines = wrap_text("a\n\n  b", 10);
        assert_eq!(lines, vec!["a", "", "  b"]);
    }

    #[test]
    fn wrap_is_char_based() {
        let lines = wrap_text("ééééé", 2);
        assert_eq!(lines, vec!["éé", "éé", "é"]);
    }

    #[test]
    fn write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        PdfWriter::default().write_text_to_file("x", &path).unwrap();
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
    }
}
