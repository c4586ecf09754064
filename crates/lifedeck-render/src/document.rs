//! Report markup: generated markdown rendered to a printable HTML page.

use pulldown_cmark::{Options, Parser};
use serde::Serialize;

pub const DEFAULT_STYLESHEET: &str = r#"@page { size: A4; margin: 2cm; }
body { font-family: Georgia, "Times New Roman", serif; font-size: 11pt; line-height: 1.5; color: #222; }
h1 { font-size: 22pt; border-bottom: 2px solid #7a1f2b; padding-bottom: 4pt; page-break-before: always; }
h1:first-of-type { page-break-before: avoid; }
h2 { font-size: 16pt; color: #7a1f2b; margin-top: 18pt; }
h3 { font-size: 13pt; margin-top: 12pt; }
ul, ol { margin: 6pt 0 6pt 18pt; }
.report-title { text-align: center; font-size: 28pt; margin: 4cm 0 2cm; }
"#;

/// A finished report ready for a rendering backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub title: String,
    /// Complete HTML page without the stylesheet.
    pub markup: String,
    pub stylesheet: String,
}

impl Document {
    pub fn from_markdown(title: &str, markdown: &str) -> Self {
        let markup = format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n<div class=\"report-title\">{}</div>\n{}</body>\n</html>\n",
            escape(title),
            escape(title),
            markdown_to_html(markdown)
        );
        Self {
            title: title.to_string(),
            markup,
            stylesheet: DEFAULT_STYLESHEET.to_string(),
        }
    }

    /// Markup with the stylesheet embedded in `<head>`, for renderers that
    /// take a single file.
    pub fn standalone_html(&self) -> String {
        let style = format!("<style>\n{}</style>\n</head>", self.stylesheet);
        self.markup.replacen("</head>", &style, 1)
    }
}

/// Title text only; body markup is escaped by the markdown renderer.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// CommonMark plus tables and strikethrough. Raw HTML passes through.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, parser);
    html
}
