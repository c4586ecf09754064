//! In-process fallback: the HTML page itself, flagged as not a rendered binary.

use crate::document::Document;

/// Meta tag carried by every fallback page.
pub const FALLBACK_MARKER: &str = r#"<meta name="lifedeck-render" content="html-fallback">"#;

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlFallback;

impl HtmlFallback {
    /// Wrap the document in a printable page. Cannot fail.
    pub fn render(&self, document: &Document) -> Vec<u8> {
        let head = format!(
            "{FALLBACK_MARKER}\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<style>\n{}\n@media print {{ .print-notice {{ display: none; }} }}\n</style>\n</head>",
            document.stylesheet
        );
        let notice = "<body>\n<p class=\"print-notice\">This report is an HTML version. Use your browser's print dialog to save it as a PDF.</p>";
        document
            .markup
            .replacen("</head>", &head, 1)
            .replacen("<body>", notice, 1)
            .into_bytes()
    }
}

/// True for bytes produced by a fallback, or any HTML page.
pub fn is_html(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]);
    let head = head.trim_start().to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_page_is_flagged_and_styled() {
        let doc = Document::from_markdown("Report", "## Sun\nBody");
        let bytes = HtmlFallback.render(&doc);
        let page = String::from_utf8(bytes.clone()).unwrap();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains(FALLBACK_MARKER));
        assert!(page.contains("@page"));
        assert!(page.contains("print-notice"));
        assert!(page.contains("<h2>Sun</h2>"));
        assert!(is_html(&bytes));
    }

    #[test]
    fn pdf_bytes_are_not_html() {
        assert!(!is_html(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3"));
        assert!(is_html(b"  <html><body></body></html>"));
    }
}
