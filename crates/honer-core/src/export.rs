//! Document export: turns generated text into downloadable file bytes.

use std::fs;
use std::path::{Path, PathBuf};

use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::StorageError;

pub const DEFAULT_EXPORT_NAME: &str = "generated-content";

const UTF8_BOM: &str = "\u{feff}";

const WORD_PREAMBLE: &str = "<html xmlns:o='urn:schemas-microsoft-com:office:office' \
xmlns:w='urn:schemas-microsoft-com:office:word' xmlns='http://www.w3.org/TR/REC-html40'>\
<head><meta charset='utf-8'><title>Export HTML To Doc</title></head>\
<body style='font-family: Arial; direction: rtl;'>";

const WORD_CLOSING: &str = "</body></html>";

const A4_WIDTH_MM: f32 = 210.0;
const A4_HEIGHT_MM: f32 = 297.0;
const PDF_MARGIN_MM: f32 = 20.0;
const PDF_FONT_SIZE_PT: f32 = 12.0;
const PT_TO_MM: f32 = 25.4 / 72.0;
/// Mean Helvetica advance width, in ems. The builtin fonts carry no metrics.
const AVG_GLYPH_EM: f32 = 0.5;
const LINE_HEIGHT_FACTOR: f32 = 1.15;
const PDF_LAYER: &str = "text";

/// A format converter from raw text to file bytes. Performs no validation.
pub trait DocumentExporter {
    fn extension(&self) -> &'static str;
    fn mime_type(&self) -> &'static str;
    fn render(&self, text: &str) -> Result<Vec<u8>, StorageError>;
}

/// Look up an exporter by format name (`doc`/`word` or `pdf`). Blank means `doc`.
pub fn exporter_for(format: &str) -> Option<&'static dyn DocumentExporter> {
    match format.trim().to_ascii_lowercase().as_str() {
        "" | "doc" | "word" => Some(&WordExporter as &dyn DocumentExporter),
        "pdf" => Some(&PdfExporter as &dyn DocumentExporter),
        _ => None,
    }
}

/// Word-compatible `.doc`: a BOM followed by an HTML envelope Word opens natively.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordExporter;

impl DocumentExporter for WordExporter {
    fn extension(&self) -> &'static str {
        "doc"
    }

    fn mime_type(&self) -> &'static str {
        "application/msword"
    }

    fn render(&self, text: &str) -> Result<Vec<u8>, StorageError> {
        let body = text.replace('\n', "<br>");
        let mut out = String::with_capacity(
            UTF8_BOM.len() + WORD_PREAMBLE.len() + body.len() + WORD_CLOSING.len(),
        );
        out.push_str(UTF8_BOM);
        out.push_str(WORD_PREAMBLE);
        out.push_str(&body);
        out.push_str(WORD_CLOSING);
        Ok(out.into_bytes())
    }
}

/// A4 portrait PDF, 12pt Helvetica, wrapped and right-aligned inside 20mm
/// margins, paginated.
///
/// Glyphs outside the builtin font's WinAnsi range are not drawn.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExporter;

impl PdfExporter {
    fn glyph_width_mm() -> f32 {
        PDF_FONT_SIZE_PT * PT_TO_MM * AVG_GLYPH_EM
    }

    fn line_height_mm() -> f32 {
        PDF_FONT_SIZE_PT * PT_TO_MM * LINE_HEIGHT_FACTOR
    }

    /// Characters that fit between the margins (80 at 12pt).
    pub fn max_line_chars() -> usize {
        ((A4_WIDTH_MM - 2.0 * PDF_MARGIN_MM) / Self::glyph_width_mm()).floor() as usize
    }

    /// Lines that fit between the top and bottom margins (52 at 12pt).
    pub fn lines_per_page() -> usize {
        ((A4_HEIGHT_MM - 2.0 * PDF_MARGIN_MM) / Self::line_height_mm()).floor() as usize
    }
}

impl DocumentExporter for PdfExporter {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn mime_type(&self) -> &'static str {
        "application/pdf"
    }

    fn render(&self, text: &str) -> Result<Vec<u8>, StorageError> {
        let (doc, page, layer) = PdfDocument::new(
            DEFAULT_EXPORT_NAME,
            Mm(A4_WIDTH_MM),
            Mm(A4_HEIGHT_MM),
            PDF_LAYER,
        );
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;

        let per_page = Self::lines_per_page().max(1);
        let glyph = Self::glyph_width_mm();
        let line_height = Self::line_height_mm();
        let right_edge = A4_WIDTH_MM - PDF_MARGIN_MM;

        let mut current = doc.get_page(page).get_layer(layer);
        for (i, line) in wrap_text(text, Self::max_line_chars()).iter().enumerate() {
            let row = i % per_page;
            if i > 0 && row == 0 {
                let (page, layer) = doc.add_page(Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), PDF_LAYER);
                current = doc.get_page(page).get_layer(layer);
            }
            if line.is_empty() {
                continue;
            }
            let width = line.chars().count() as f32 * glyph;
            let x = (right_edge - width).max(PDF_MARGIN_MM);
            let y = A4_HEIGHT_MM - PDF_MARGIN_MM - row as f32 * line_height;
            current.use_text(line.as_str(), PDF_FONT_SIZE_PT, Mm(x), Mm(y), &font);
        }

        doc.save_to_bytes().map_err(pdf_error)
    }
}

fn pdf_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Render {
        format: "pdf",
        message: e.to_string(),
    }
}

/// Word-wrap each line of `text` to at most `max_chars` characters.
/// Words longer than a line are split; blank lines are kept.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut rest = word;
            let mut rest_len = word.chars().count();

            while rest_len > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let split = rest
                    .char_indices()
                    .nth(max_chars)
                    .map(|(i, _)| i)
                    .unwrap_or(rest.len());
                lines.push(rest[..split].to_string());
                rest = &rest[split..];
                rest_len -= max_chars;
            }
            if rest_len == 0 {
                continue;
            }

            if current_len > 0 && current_len + 1 + rest_len > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(rest);
            current_len += rest_len;
        }

        lines.push(current);
    }

    lines
}

/// `<filename>.<ext>`, using [`DEFAULT_EXPORT_NAME`] for a blank filename.
pub fn export_file_name(exporter: &dyn DocumentExporter, filename: &str) -> String {
    let stem = filename.trim();
    let stem = if stem.is_empty() { DEFAULT_EXPORT_NAME } else { stem };
    format!("{}.{}", stem, exporter.extension())
}

/// Render `text` and write it into `dir`. Returns the written path.
pub fn export_to_dir(
    exporter: &dyn DocumentExporter,
    dir: &Path,
    text: &str,
    filename: &str,
) -> Result<PathBuf, StorageError> {
    let bytes = exporter.render(text)?;
    fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
    let path = dir.join(export_file_name(exporter, filename));
    fs::write(&path, bytes).map_err(|e| StorageError::io(&path, e))?;
    tracing::info!(path = %path.display(), mime = exporter.mime_type(), "exported document");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_export_wraps_text_in_html_envelope() {
        let bytes = WordExporter.render("שורה ראשונה\nsecond line").unwrap();
        let doc = String::from_utf8(bytes).unwrap();
        assert!(doc.starts_with('\u{feff}'));
        assert!(doc.contains("<meta charset='utf-8'>"));
        assert!(doc.contains("direction: rtl;"));
        assert!(doc.contains("שורה ראשונה<br>second line"));
        assert!(doc.ends_with("</body></html>"));
    }

    #[test]
    fn word_export_passes_markup_through_unchanged() {
        let doc = String::from_utf8(WordExporter.render("<b>bold</b> & more").unwrap()).unwrap();
        assert!(doc.contains("<b>bold</b> & more"));
    }

    #[test]
    fn blank_filename_uses_default_name() {
        assert_eq!(export_file_name(&WordExporter, "  "), "generated-content.doc");
        assert_eq!(export_file_name(&WordExporter, "launch-post"), "launch-post.doc");
        assert_eq!(export_file_name(&PdfExporter, ""), "generated-content.pdf");
    }

    #[test]
    fn export_writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_to_dir(&WordExporter, dir.path(), "hello", "").unwrap();
        assert_eq!(path, dir.path().join("generated-content.doc"));
        let written = fs::read(&path).unwrap();
        assert_eq!(written, WordExporter.render("hello").unwrap());
    }

    #[test]
    fn pdf_export_writes_a_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_to_dir(&PdfExporter, dir.path(), "Launch notes\n\nBody text", "notes")
            .unwrap();
        assert_eq!(path, dir.path().join("notes.pdf"));
        let written = fs::read(&path).unwrap();
        assert!(written.starts_with(b"%PDF-"));
        assert_eq!(PdfExporter.mime_type(), "application/pdf");
    }

    #[test]
    fn pdf_export_spans_pages_for_long_text() {
        let long = "word ".repeat(4000);
        let short = PdfExporter.render("word").unwrap();
        let multi = PdfExporter.render(&long).unwrap();
        assert!(multi.starts_with(b"%PDF-"));
        assert!(multi.len() > short.len());
    }

    #[test]
    fn pdf_layout_matches_a4_with_margins() {
        assert_eq!(PdfExporter::max_line_chars(), 80);
        assert_eq!(PdfExporter::lines_per_page(), 52);
    }

    #[test]
    fn wrap_keeps_words_within_width() {
        let lines = wrap_text("the quick brown fox jumps over", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps over"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
    }

    #[test]
    fn wrap_splits_overlong_words_and_keeps_blank_lines() {
        let lines = wrap_text("abcdefghij\n\nxy", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij", "", "xy"]);
    }

    #[test]
    fn wrap_counts_characters_not_bytes() {
        let lines = wrap_text("שלום עולם", 4);
        assert_eq!(lines, vec!["שלום", "עולם"]);
    }

    #[test]
    fn exporter_lookup_by_format() {
        assert_eq!(exporter_for("").map(|e| e.extension()), Some("doc"));
        assert_eq!(exporter_for("Word").map(|e| e.extension()), Some("doc"));
        assert_eq!(exporter_for(" PDF ").map(|e| e.extension()), Some("pdf"));
        assert!(exporter_for("odt").is_none());
    }
}
