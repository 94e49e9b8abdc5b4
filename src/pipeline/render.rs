//! Cheatsheet rendering: markdown-like model text → typeset blocks → PDF.
//!
//! Mapping text to [`Block`]s never fails; anything unrecognised becomes a
//! paragraph. Typesetting sits behind [`DocumentLayout`] so the mapping can
//! be tested without producing a document.
//!
//! ## Fonts and encoding
//!
//! [`PdfLayout`] uses the four standard Type1 fonts every PDF reader ships
//! with, so nothing is embedded. Text is written as WinAnsi bytes; characters
//! outside that code page (emoji, CJK) are replaced with `?`.

use crate::error::PostcraftError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

// ── Blocks ───────────────────────────────────────────────────────────────

/// Inline style of a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStyle {
    Regular,
    Bold,
    Italic,
    Code,
}

/// A run of text sharing one inline style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

impl Span {
    pub fn new(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn regular(text: impl Into<String>) -> Self {
        Self::new(text, SpanStyle::Regular)
    }
}

/// One typeset unit of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `# ` line.
    Title(Vec<Span>),
    /// `## ` to `#### ` lines; `level` is the number of `#`.
    Heading { level: u8, spans: Vec<Span> },
    /// `- `, `* ` or `• ` line, marker removed.
    Bullet(Vec<Span>),
    /// Line starting with `N.`, kept whole.
    Numbered(Vec<Span>),
    /// One line inside a fenced block, untouched.
    Code(String),
    Paragraph(Vec<Span>),
    /// Vertical gap in points.
    Spacer(u16),
}

/// Gap for a blank line.
pub const SMALL_SPACER: u16 = 6;
/// Gap for a `---` rule.
pub const LARGE_SPACER: u16 = 12;

static RE_NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.").unwrap());

// Bold is tried before italic at the same position, so `**x**` never
// parses as two italics.
static RE_INLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*|`([^`]+)`|\*([^*]+)\*").unwrap());

/// Map markdown-like text to blocks, one line at a time.
pub fn to_blocks(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut in_code = false;

    for raw in markdown.lines() {
        let line = raw.trim();

        if line.starts_with("```") {
            in_code = !in_code;
            continue;
        }
        if in_code {
            blocks.push(Block::Code(raw.trim_end().to_string()));
            continue;
        }

        let block = if line.is_empty() {
            Block::Spacer(SMALL_SPACER)
        } else if line.starts_with("---") {
            Block::Spacer(LARGE_SPACER)
        } else if let Some(rest) = line.strip_prefix("# ") {
            Block::Title(inline_spans(rest))
        } else if let Some(rest) = line.strip_prefix("## ") {
            heading(2, rest)
        } else if let Some(rest) = line.strip_prefix("### ") {
            heading(3, rest)
        } else if let Some(rest) = line.strip_prefix("#### ") {
            heading(4, rest)
        } else if let Some(rest) = ["• ", "- ", "* "]
            .iter()
            .find_map(|marker| line.strip_prefix(marker))
        {
            Block::Bullet(inline_spans(rest))
        } else if RE_NUMBERED.is_match(line) {
            Block::Numbered(inline_spans(line))
        } else {
            Block::Paragraph(inline_spans(line))
        };
        blocks.push(block);
    }

    blocks
}

fn heading(level: u8, text: &str) -> Block {
    Block::Heading {
        level,
        spans: inline_spans(text),
    }
}

/// Split one line into styled spans: `**bold**`, `*italic*`, `` `code` ``.
///
/// Stray triple backticks are dropped; unmatched markers stay as text.
pub fn inline_spans(line: &str) -> Vec<Span> {
    let line = line.replace("```", "");
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in RE_INLINE.captures_iter(&line) {
        let Some(whole) = caps.get(0) else { continue };
        let (inner, style) = if let Some(m) = caps.get(1) {
            (m, SpanStyle::Bold)
        } else if let Some(m) = caps.get(2) {
            (m, SpanStyle::Code)
        } else if let Some(m) = caps.get(3) {
            (m, SpanStyle::Italic)
        } else {
            continue;
        };
        if whole.start() > last {
            spans.push(Span::regular(&line[last..whole.start()]));
        }
        spans.push(Span::new(inner.as_str(), style));
        last = whole.end();
    }
    if last < line.len() {
        spans.push(Span::regular(&line[last..]));
    }
    spans
}

// ── Layout ───────────────────────────────────────────────────────────────

/// Typesetting collaborator: blocks in, document bytes out.
pub trait DocumentLayout {
    fn layout(&self, blocks: &[Block]) -> Result<Vec<u8>, PostcraftError>;
}

/// Map `markdown` to blocks and lay them out.
pub fn render_document(markdown: &str, layout: &dyn DocumentLayout) -> Result<Vec<u8>, PostcraftError> {
    let blocks = to_blocks(markdown);
    debug!("Rendering {} blocks", blocks.len());
    layout.layout(&blocks)
}

/// A4 portrait PDF with 72pt margins.
#[derive(Debug, Clone)]
pub struct PdfLayout {
    pub page_width: i64,
    pub page_height: i64,
    pub margin: i64,
    pub body_size: i64,
    pub code_size: i64,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self {
            page_width: 595,
            page_height: 842,
            margin: 72,
            body_size: 11,
            code_size: 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
    Italic,
    Mono,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Italic => "F3",
            Font::Mono => "F4",
        }
    }

    /// Approximate advance width in thousandths of an em.
    fn char_width(self, c: char) -> i64 {
        if self == Font::Mono {
            return 600;
        }
        let w = match c {
            ' ' | 'i' | 'j' | 'l' | 'I' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 278,
            'f' | 't' | 'r' | '(' | ')' | '-' => 333,
            'm' | 'M' | 'W' => 833,
            'w' => 722,
            c if c.is_ascii_uppercase() => 667,
            _ => 556,
        };
        if self == Font::Bold {
            w * 105 / 100
        } else {
            w
        }
    }

    /// Width in thousandths of a point.
    fn text_width(self, text: &str, size: i64) -> i64 {
        text.chars().map(|c| self.char_width(c)).sum::<i64>() * size
    }
}

fn font_for(style: SpanStyle, strong: bool) -> Font {
    match style {
        SpanStyle::Code => Font::Mono,
        SpanStyle::Italic => Font::Italic,
        SpanStyle::Bold => Font::Bold,
        SpanStyle::Regular if strong => Font::Bold,
        SpanStyle::Regular => Font::Regular,
    }
}

/// Text in one font on one output line.
#[derive(Debug, Clone, PartialEq)]
struct Run {
    font: Font,
    text: String,
}

struct Word {
    font: Font,
    text: String,
    space_before: bool,
}

/// Greedy word wrap of `spans` into lines no wider than `max_width`.
fn wrap(spans: &[Span], strong: bool, size: i64, max_width: i64) -> Vec<Vec<Run>> {
    let mut words = Vec::new();
    let mut gap = false;
    for span in spans {
        let font = font_for(span.style, strong);
        let leading_ws = span.text.starts_with(char::is_whitespace);
        for (i, w) in span.text.split_whitespace().enumerate() {
            words.push(Word {
                font,
                text: w.to_string(),
                space_before: if i == 0 { gap || leading_ws } else { true },
            });
        }
        if !span.text.is_empty() {
            gap = span.text.ends_with(char::is_whitespace);
        }
    }

    let mut lines: Vec<Vec<Run>> = Vec::new();
    let mut line: Vec<Run> = Vec::new();
    let mut width = 0;

    for word in words {
        let space = word.space_before && !line.is_empty();
        let mut piece_width = word.font.text_width(&word.text, size);
        if space {
            piece_width += word.font.text_width(" ", size);
        }
        if !line.is_empty() && width + piece_width > max_width * 1000 {
            lines.push(std::mem::take(&mut line));
            width = 0;
            piece_width = word.font.text_width(&word.text, size);
        }
        let text = if space && !line.is_empty() {
            format!(" {}", word.text)
        } else {
            word.text
        };
        match line.last_mut() {
            Some(run) if run.font == word.font => run.text.push_str(&text),
            _ => line.push(Run {
                font: word.font,
                text,
            }),
        }
        width += piece_width;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Encode text for a WinAnsiEncoding font.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}

/// Accumulates content-stream operations and breaks pages.
struct PageWriter<'a> {
    layout: &'a PdfLayout,
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: i64,
}

impl<'a> PageWriter<'a> {
    fn new(layout: &'a PdfLayout) -> Self {
        Self {
            layout,
            pages: Vec::new(),
            current: Vec::new(),
            y: layout.page_height - layout.margin,
        }
    }

    fn top(&self) -> i64 {
        self.layout.page_height - self.layout.margin
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = self.top();
    }

    fn space(&mut self, points: i64) {
        if self.current.is_empty() {
            return;
        }
        self.y -= points;
        if self.y < self.layout.margin {
            self.new_page();
        }
    }

    fn line(&mut self, x: i64, size: i64, runs: &[Run]) {
        let leading = size * 14 / 10;
        if self.y - leading < self.layout.margin {
            self.new_page();
        }
        self.y -= leading;

        self.current.push(Operation::new("BT", vec![]));
        for (i, run) in runs.iter().enumerate() {
            self.current.push(Operation::new(
                "Tf",
                vec![Object::Name(run.font.resource().into()), Object::Integer(size)],
            ));
            if i == 0 {
                self.current.push(Operation::new(
                    "Td",
                    vec![Object::Integer(x), Object::Integer(self.y)],
                ));
            }
            self.current.push(Operation::new(
                "Tj",
                vec![Object::String(win_ansi(&run.text), StringFormat::Literal)],
            ));
        }
        self.current.push(Operation::new("ET", vec![]));
    }

    fn paragraph(&mut self, x: i64, size: i64, spans: &[Span], strong: bool) {
        let max = self.layout.page_width - self.layout.margin - x;
        for runs in wrap(spans, strong, size, max) {
            self.line(x, size, &runs);
        }
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

impl PdfLayout {
    fn typeset(&self, blocks: &[Block]) -> Vec<Vec<Operation>> {
        let left = self.margin;
        let body = self.body_size;
        let mut w = PageWriter::new(self);

        for block in blocks {
            match block {
                Block::Title(spans) => {
                    w.paragraph(left, 20, spans, true);
                    w.space(8);
                }
                Block::Heading { level, spans } => {
                    let size = match level {
                        2 => 16,
                        3 => 14,
                        _ => 12,
                    };
                    w.space(6);
                    w.paragraph(left, size, spans, true);
                    w.space(2);
                }
                Block::Bullet(spans) => {
                    let lines = wrap(spans, false, body, self.page_width - self.margin - left - 14);
                    for (i, runs) in lines.into_iter().enumerate() {
                        if i == 0 {
                            let mut first = vec![Run {
                                font: Font::Regular,
                                text: "• ".into(),
                            }];
                            first.extend(runs);
                            w.line(left + 4, body, &first);
                        } else {
                            w.line(left + 14, body, &runs);
                        }
                    }
                }
                Block::Numbered(spans) | Block::Paragraph(spans) => {
                    w.paragraph(left, body, spans, false);
                }
                Block::Code(text) => {
                    let size = self.code_size;
                    let per_line = ((self.page_width - 2 * self.margin - 12) * 1000 / (600 * size)).max(1) as usize;
                    let expanded = text.replace('\t', "    ");
                    let chars: Vec<char> = expanded.chars().collect();
                    if chars.is_empty() {
                        w.space(size * 14 / 10);
                    }
                    for chunk in chars.chunks(per_line) {
                        let run = Run {
                            font: Font::Mono,
                            text: chunk.iter().collect(),
                        };
                        w.line(left + 12, size, &[run]);
                    }
                }
                Block::Spacer(points) => w.space(i64::from(*points)),
            }
        }

        w.finish()
    }
}

impl DocumentLayout for PdfLayout {
    fn layout(&self, blocks: &[Block]) -> Result<Vec<u8>, PostcraftError> {
        let pages = self.typeset(blocks);
        let page_count = pages.len();

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font = |base: &str| {
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => Object::Name(base.as_bytes().to_vec()),
                "Encoding" => "WinAnsiEncoding",
            }
        };
        let f1 = doc.add_object(font("Helvetica"));
        let f2 = doc.add_object(font("Helvetica-Bold"));
        let f3 = doc.add_object(font("Helvetica-Oblique"));
        let f4 = doc.add_object(font("Courier"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => f1,
                "F2" => f2,
                "F3" => f3,
                "F4" => f4,
            },
        });

        let mut kids = Vec::with_capacity(page_count);
        for operations in pages {
            let content = Content { operations };
            let encoded = content.encode().map_err(|e| PostcraftError::LayoutFailed {
                detail: e.to_string(),
            })?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count as i64),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(self.page_width),
                Object::Integer(self.page_height),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(|e| PostcraftError::LayoutFailed {
            detail: e.to_string(),
        })?;
        debug!("Laid out {} pages, {} bytes", page_count, bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular(text: &str) -> Vec<Span> {
        vec![Span::regular(text)]
    }

    #[test]
    fn line_rules() {
        let md = "# Rust\n\n## Ownership\n### Moves\n#### Copy\n- one\n* two\n• three\n1. first\n---\nplain";
        assert_eq!(
            to_blocks(md),
            vec![
                Block::Title(regular("Rust")),
                Block::Spacer(SMALL_SPACER),
                Block::Heading { level: 2, spans: regular("Ownership") },
                Block::Heading { level: 3, spans: regular("Moves") },
                Block::Heading { level: 4, spans: regular("Copy") },
                Block::Bullet(regular("one")),
                Block::Bullet(regular("two")),
                Block::Bullet(regular("three")),
                Block::Numbered(regular("1. first")),
                Block::Spacer(LARGE_SPACER),
                Block::Paragraph(regular("plain")),
            ]
        );
    }

    #[test]
    fn code_fence_keeps_lines_verbatim() {
        let md = "```rust\nfn main() {\n    # not a title\n}\n```\nafter";
        assert_eq!(
            to_blocks(md),
            vec![
                Block::Code("fn main() {".into()),
                Block::Code("    # not a title".into()),
                Block::Code("}".into()),
                Block::Paragraph(regular("after")),
            ]
        );
    }

    #[test]
    fn unterminated_fence_is_not_an_error() {
        let blocks = to_blocks("```\nlet x = 1;");
        assert_eq!(blocks, vec![Block::Code("let x = 1;".into())]);
    }

    #[test]
    fn longer_rules_are_spacers() {
        assert_eq!(
            to_blocks("----\n-----"),
            vec![Block::Spacer(LARGE_SPACER), Block::Spacer(LARGE_SPACER)]
        );
    }

    #[test]
    fn malformed_headers_fall_back_to_paragraph() {
        assert_eq!(to_blocks("#NoSpace"), vec![Block::Paragraph(regular("#NoSpace"))]);
        assert_eq!(to_blocks("##### Deep"), vec![Block::Paragraph(regular("##### Deep"))]);
    }

    #[test]
    fn inline_markup() {
        assert_eq!(
            inline_spans("Use **cargo** and *care* with `x`"),
            vec![
                Span::regular("Use "),
                Span::new("cargo", SpanStyle::Bold),
                Span::regular(" and "),
                Span::new("care", SpanStyle::Italic),
                Span::regular(" with "),
                Span::new("x", SpanStyle::Code),
            ]
        );
    }

    #[test]
    fn stray_fence_removed_and_unmatched_marker_kept() {
        assert_eq!(inline_spans("a ``` b"), regular("a  b"));
        assert_eq!(inline_spans("2 * 3"), regular("2 * 3"));
    }

    #[test]
    fn win_ansi_mapping() {
        assert_eq!(win_ansi("a•é😀"), vec![b'a', 0x95, 0xE9, b'?']);
    }

    #[test]
    fn wrap_respects_width() {
        let spans = regular(&"word ".repeat(200));
        let lines = wrap(&spans, false, 11, 451);
        assert!(lines.len() > 1);
        for runs in &lines {
            let text: String = runs.iter().map(|r| r.text.as_str()).collect();
            assert!(Font::Regular.text_width(&text, 11) <= 451 * 1000, "{text}");
        }
    }

    #[test]
    fn wrap_keeps_spacing_between_styles() {
        let lines = wrap(&inline_spans("Use **cargo** now"), false, 11, 451);
        assert_eq!(lines.len(), 1);
        let text: String = lines[0].iter().map(|r| r.text.as_str()).collect();
        assert_eq!(text, "Use cargo now");
        assert_eq!(lines[0].len(), 3);
    }

    #[test]
    fn pdf_starts_with_magic() {
        let bytes = render_document("# Title\n\nBody text", &PdfLayout::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_document_paginates() {
        let md = "- item\n".repeat(200);
        let bytes = render_document(&md, &PdfLayout::default()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn empty_document_has_one_page() {
        let bytes = render_document("", &PdfLayout::default()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}
