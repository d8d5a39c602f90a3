//! Terminal presentation of a [`Document`].
//!
//! Block-level elements start a new line, list items get a bullet, and a
//! handful of inline elements and inline styles map onto terminal styles.
//! Comments, elements with a `hidden` attribute and elements styled
//! `display: none` are skipped.

use crate::dom::{Document, DomNodeKind, NodeHandle};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};
use std::str::FromStr;

const BLOCK_ELEMENTS: &[&str] = &[
    "article", "blockquote", "body", "div", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

struct LineBuilder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
}

impl LineBuilder {
    fn break_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn push(&mut self, text: &str, style: Style) {
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                self.break_line();
            }
            if !part.is_empty() {
                self.current.push(Span::styled(part.to_string(), style));
            }
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.break_line();
        self.lines
    }
}

/// Lay the document out as styled terminal lines.
pub fn document_lines(document: &Document) -> Vec<Line<'static>> {
    let mut builder = LineBuilder {
        lines: Vec::new(),
        current: Vec::new(),
    };
    walk(document, document.root(), Style::default(), &mut builder);
    builder.finish()
}

/// Unstyled form of [`document_lines`], one string per line.
pub fn document_text(document: &Document) -> Vec<String> {
    document_lines(document)
        .iter()
        .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
        .collect()
}

fn walk(document: &Document, node: NodeHandle, style: Style, out: &mut LineBuilder) {
    match document.kind(node) {
        Some(DomNodeKind::Text(text)) => out.push(text, style),
        Some(DomNodeKind::Element { name, .. }) => {
            if document.attribute(node, "hidden").is_some()
                || document.style(node, "display") == Some("none")
            {
                return;
            }
            let style = element_style(document, node, name, style);
            let block = BLOCK_ELEMENTS.contains(&name.as_str());
            if block {
                out.break_line();
            }
            match name.as_str() {
                "br" => out.break_line(),
                "hr" => out.push("────────", style),
                "li" => out.push("• ", style),
                _ => {}
            }
            for child in document.children(node) {
                walk(document, *child, style, out);
            }
            if block {
                out.break_line();
            }
        }
        Some(DomNodeKind::Comment(_)) | None => {}
    }
}

fn element_style(document: &Document, node: NodeHandle, name: &str, base: Style) -> Style {
    let mut style = match name {
        "b" | "strong" | "h1" | "h2" | "h3" | "th" => base.add_modifier(Modifier::BOLD),
        "i" | "em" => base.add_modifier(Modifier::ITALIC),
        "u" => base.add_modifier(Modifier::UNDERLINED),
        "s" | "del" => base.add_modifier(Modifier::CROSSED_OUT),
        _ => base,
    };
    if let Some(color) = document.style(node, "color").and_then(|c| Color::from_str(c).ok()) {
        style = style.fg(color);
    }
    if let Some(color) = document
        .style(node, "background-color")
        .and_then(|c| Color::from_str(c).ok())
    {
        style = style.bg(color);
    }
    if document.has_class(node, "dim") {
        style = style.add_modifier(Modifier::DIM);
    }
    style
}

/// A ratatui widget that draws a [`Document`].
///
/// # Example
///
/// ```ignore
/// use sprig_core::present::DocumentView;
///
/// frame.render_widget(DocumentView::new(document).scroll(2), frame.area());
/// ```
pub struct DocumentView<'a> {
    document: &'a Document,
    block: Option<Block<'a>>,
    scroll: u16,
    wrap: bool,
}

impl<'a> DocumentView<'a> {
    /// Widget over a document.
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            block: None,
            scroll: 0,
            wrap: true,
        }
    }

    /// Surround the content with a block.
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Skip the first `rows` lines.
    pub fn scroll(mut self, rows: u16) -> Self {
        self.scroll = rows;
        self
    }

    /// Wrap long lines (on by default).
    pub fn wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }
}

impl Widget for DocumentView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut paragraph = Paragraph::new(Text::from(document_lines(self.document))).scroll((self.scroll, 0));
        if self.wrap {
            paragraph = paragraph.wrap(Wrap { trim: false });
        }
        if let Some(block) = self.block {
            paragraph = paragraph.block(block);
        }
        paragraph.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new();
        let root = doc.root();
        let h1 = doc.create_element("h1");
        let title = doc.create_text("Todo");
        doc.append_child(h1, title);
        doc.append_child(root, h1);
        let ul = doc.create_element("ul");
        doc.append_child(root, ul);
        for item in ["milk", "eggs"] {
            let li = doc.create_element("li");
            let text = doc.create_text(item);
            doc.append_child(li, text);
            doc.append_child(ul, li);
        }
        let hidden = doc.create_element("p");
        doc.set_attribute(hidden, "hidden", "");
        let secret = doc.create_text("secret");
        doc.append_child(hidden, secret);
        doc.append_child(root, hidden);
        let comment = doc.create_comment("");
        doc.append_child(root, comment);
        let span = doc.create_element("span");
        let a = doc.create_text("a");
        doc.append_child(span, a);
        doc.append_child(root, span);
        let b = doc.create_text("b");
        doc.append_child(root, b);
        doc
    }

    #[test]
    fn block_elements_break_lines() {
        assert_eq!(document_text(&sample()), vec!["Todo", "• milk", "• eggs", "ab"]);
    }

    #[test]
    fn headings_are_bold() {
        let lines = document_lines(&sample());
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn widget_renders_into_buffer() {
        let doc = sample();
        let area = Rect::new(0, 0, 10, 4);
        let mut buf = Buffer::empty(area);
        DocumentView::new(&doc).render(area, &mut buf);
        let first: String = (0..4).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert_eq!(first, "Todo");
    }
}
