//! Tag-driven layout and styling state machine.
//!
//! [`HtmlFormatter`] consumes balanced events (see
//! [`TagReconciler`](crate::reconcile::TagReconciler)) in a single forward
//! pass. Block, list and emphasis nesting are tracked with counters; no tree is
//! built. Plain and styled output share every layout decision, only the span
//! sink differs.

extern crate alloc;

use alloc::vec::Vec;
use core::ops::Range;

use smallvec::SmallVec;

use crate::color::{background_from_style, color_from_style, Color};
use crate::handler::{AttributeLookup, HtmlHandler};
use crate::style::{
    BaselineShift, FontFamily, FontStyle, FontWeight, HtmlStyle, LinkAnnotation, LinkListener,
    LinkStyles, ParagraphStyle, SpanStyle, TextDecoration, TextIndent,
};
use crate::styled_text::{CharSink, PlainText, SpanSink, StyledText, StyledTextBuilder};
use crate::text_writer::{TextWriter, WriterOutput};

/// Font size multipliers for `h1` to `h6`.
const HEADING_SIZES: [f32; 6] = [1.5, 1.4, 1.3, 1.2, 1.1, 1.0];

const LIST_ITEM_BULLET: &str = "• ";

/// Per-level list item counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ListCounter {
    Unordered,
    /// Number of the next item.
    Ordered(u32),
}

/// Range opened by an inline tag, committed on first content.
#[derive(Clone, Debug)]
enum PendingSpan {
    Style(SpanStyle),
    Link(LinkAnnotation),
}

/// Tracks the content span of the current top-level block.
#[derive(Clone, Copy, Debug, Default)]
struct ParagraphMarker {
    /// Indentation is expressed with paragraph styles.
    enabled: bool,
    /// Offset where the current block's content started.
    start: Option<usize>,
    /// End offset of the last block that received a paragraph style.
    end: Option<usize>,
    /// Offset at which a boundary newline was already dropped.
    consumed_new_line: Option<usize>,
}

impl ParagraphMarker {
    /// A paragraph style contributes its own line break at both ends, so one
    /// requested newline is dropped when content starts exactly there.
    fn new_lines_at(&mut self, offset: usize, count: usize) -> usize {
        if !self.enabled || self.consumed_new_line == Some(offset) {
            return count;
        }
        let at_boundary = match self.start {
            Some(start) => start == offset,
            None => self.end == Some(offset),
        };
        if at_boundary {
            self.consumed_new_line = Some(offset);
            count.saturating_sub(1)
        } else {
            count
        }
    }
}

/// Writer output wired to the formatter's span state.
struct FormatterOutput<'a, S: SpanSink> {
    sink: &'a mut S,
    pending: &'a mut Vec<PendingSpan>,
    paragraph: &'a mut ParagraphMarker,
}

impl<S: SpanSink> CharSink for FormatterOutput<'_, S> {
    fn push_str(&mut self, text: &str) {
        self.sink.push_str(text);
    }

    fn push_char(&mut self, ch: char) {
        self.sink.push_char(ch);
    }

    fn offset(&self) -> usize {
        self.sink.offset()
    }
}

impl<S: SpanSink> WriterOutput for FormatterOutput<'_, S> {
    fn on_write_new_lines(&mut self, count: usize) -> usize {
        let offset = self.sink.offset();
        self.paragraph.new_lines_at(offset, count)
    }

    fn on_write_content_start(&mut self) {
        for span in self.pending.drain(..) {
            match span {
                PendingSpan::Style(style) => self.sink.push_style(style),
                PendingSpan::Link(link) => self.sink.push_link(link),
            }
        }
    }
}

/// Event handler turning markup into text plus ranges on a [`SpanSink`].
pub struct HtmlFormatter<S: SpanSink> {
    sink: S,
    writer: TextWriter,
    compact_mode: bool,
    style: HtmlStyle,
    link_listener: Option<LinkListener>,
    pending: Vec<PendingSpan>,
    paragraph: ParagraphMarker,
    block_level: usize,
    block_indent_level: usize,
    lists: SmallVec<[ListCounter; 8]>,
    bold_level: usize,
    preformatted_level: usize,
    skipped_level: usize,
}

impl HtmlFormatter<StyledTextBuilder> {
    /// Styled conversion into a fresh [`StyledTextBuilder`].
    pub fn styled(compact_mode: bool, style: &HtmlStyle, link_listener: Option<LinkListener>) -> Self {
        Self::with_sink(StyledTextBuilder::new(), compact_mode, style, link_listener)
    }

    /// Close any range left open and return the styled text.
    pub fn into_styled_text(self) -> StyledText {
        self.sink.build()
    }
}

impl HtmlFormatter<PlainText> {
    /// Plain text conversion. Indentation is written as text.
    pub fn plain(compact_mode: bool) -> Self {
        let style = HtmlStyle {
            link_styles: None,
            indent_unit: 0.0,
            text_color_enabled: false,
        };
        Self::with_sink(PlainText::new(), compact_mode, &style, None)
    }

    pub fn into_string(self) -> alloc::string::String {
        self.sink.into_string()
    }
}

impl<S: SpanSink> HtmlFormatter<S> {
    /// Formatter writing into a caller-provided sink.
    pub fn with_sink(
        sink: S,
        compact_mode: bool,
        style: &HtmlStyle,
        link_listener: Option<LinkListener>,
    ) -> Self {
        Self {
            sink,
            writer: TextWriter::new(),
            compact_mode,
            paragraph: ParagraphMarker {
                enabled: style.paragraph_styles_enabled(),
                ..ParagraphMarker::default()
            },
            style: style.clone(),
            link_listener,
            pending: Vec::new(),
            block_level: 0,
            block_indent_level: 0,
            lists: SmallVec::new(),
            bold_level: 0,
            preformatted_level: 0,
            skipped_level: 0,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn split(&mut self) -> (&mut TextWriter, FormatterOutput<'_, S>) {
        (
            &mut self.writer,
            FormatterOutput {
                sink: &mut self.sink,
                pending: &mut self.pending,
                paragraph: &mut self.paragraph,
            },
        )
    }

    fn write(&mut self, text: &str) {
        let (writer, mut out) = self.split();
        writer.write(&mut out, text);
    }

    fn gap(&self, new_lines: usize) -> usize {
        if self.compact_mode {
            1
        } else {
            new_lines
        }
    }

    /// Indentation handed to the writer. Zero when paragraph styles indent.
    fn text_indent(&self) -> usize {
        if self.paragraph.enabled {
            0
        } else {
            self.block_indent_level
        }
    }

    fn mark_block_boundary(&mut self, new_lines: usize) {
        let new_lines = self.gap(new_lines);
        let indent = self.text_indent();
        self.writer.mark_block_boundary(new_lines, indent);
    }

    /// Attach the paragraph style of the block ending at `end`, if it has
    /// content. Returns whether a style was attached.
    fn add_pending_paragraph(&mut self, end: usize) -> bool {
        match self.paragraph.start {
            Some(start) if start < end => {
                let indent = self.style.indent_unit * self.block_indent_level as f32;
                self.sink.add_paragraph_style(
                    ParagraphStyle {
                        text_indent: TextIndent {
                            first_line: indent,
                            rest_line: indent,
                        },
                    },
                    Range { start, end },
                );
                true
            }
            _ => false,
        }
    }

    fn block_start(&mut self, new_lines: usize, indent: bool) {
        if self.paragraph.enabled {
            let offset = self.sink.offset();
            self.add_pending_paragraph(offset);
            self.paragraph.start = Some(offset);
        }
        self.block_level += 1;
        if indent {
            self.block_indent_level += 1;
        }
        self.mark_block_boundary(new_lines);
    }

    fn block_end(&mut self, new_lines: usize, indent: bool) {
        let offset = self.sink.offset();
        if self.paragraph.enabled && self.add_pending_paragraph(offset) {
            self.paragraph.end = Some(offset);
        }
        self.block_level = self.block_level.saturating_sub(1);
        if indent {
            self.block_indent_level = self.block_indent_level.saturating_sub(1);
        }
        if self.paragraph.enabled {
            // A sibling block may follow inside the parent.
            self.paragraph.start = (self.block_level > 0).then_some(offset);
        }
        self.mark_block_boundary(new_lines);
    }

    fn horizontal_rule(&mut self) {
        let new_lines = self.gap(2);
        self.writer.mark_block_boundary(new_lines, 0);
    }

    fn line_break(&mut self) {
        if self.skipped_level > 0 {
            return;
        }
        let (writer, mut out) = self.split();
        writer.write_line_break(&mut out);
    }

    fn list_start(&mut self, counter: ListCounter) {
        let new_lines = if self.lists.is_empty() { 2 } else { 1 };
        self.block_start(new_lines, false);
        self.lists.push(counter);
    }

    fn list_end(&mut self) {
        self.lists.pop();
        let new_lines = if self.lists.is_empty() { 2 } else { 1 };
        self.block_end(new_lines, false);
    }

    fn list_item_start(&mut self) {
        self.block_start(1, self.lists.len() > 1);
        if self.skipped_level > 0 {
            return;
        }
        let number = match self.lists.last_mut() {
            Some(ListCounter::Ordered(next)) => {
                let number = *next;
                *next = number.saturating_add(1);
                Some(number)
            }
            Some(ListCounter::Unordered) | None => None,
        };
        match number {
            Some(number) => {
                self.write(&alloc::format!("{number}"));
                self.write(". ");
            }
            None => self.write(LIST_ITEM_BULLET),
        }
    }

    fn list_item_end(&mut self) {
        self.block_end(1, self.lists.len() > 1);
    }

    fn bold_weight(&mut self) -> FontWeight {
        self.bold_level += 1;
        if self.bold_level == 1 {
            FontWeight::BOLD
        } else {
            FontWeight::BLACK
        }
    }

    fn span_start(&mut self, style: SpanStyle) {
        self.pending.push(PendingSpan::Style(style));
    }

    /// Drop the innermost range if it never received content, else close it.
    fn span_end(&mut self) {
        if self.pending.pop().is_none() {
            self.sink.pop();
        }
    }

    fn element_colors(&self, attributes: &dyn AttributeLookup) -> (Option<Color>, Option<Color>) {
        if !self.style.text_color_enabled {
            return (None, None);
        }
        match attributes.attribute("style") {
            Some(style) => (color_from_style(&style), background_from_style(&style)),
            None => (None, None),
        }
    }

    fn colored_span_start(&mut self, attributes: &dyn AttributeLookup, style: SpanStyle) {
        let (color, background) = self.element_colors(attributes);
        self.span_start(SpanStyle {
            color,
            background,
            ..style
        });
    }

    fn anchor_start(&mut self, attributes: &dyn AttributeLookup) {
        let url = attributes.attribute("href").unwrap_or_default();
        let (color, background) = self.element_colors(attributes);
        let styles = LinkStyles::with_colors(self.style.link_styles.as_ref(), color, background);
        self.pending.push(PendingSpan::Link(LinkAnnotation {
            url,
            styles,
            listener: self.link_listener.clone(),
        }));
    }

    fn heading_start(&mut self, level: usize) {
        self.block_start(2, false);
        let font_weight = self.bold_weight();
        self.span_start(SpanStyle {
            font_size_em: HEADING_SIZES.get(level.saturating_sub(1)).copied(),
            font_weight: Some(font_weight),
            ..SpanStyle::default()
        });
    }

    fn heading_end(&mut self) {
        self.span_end();
        self.bold_level = self.bold_level.saturating_sub(1);
        self.block_end(1, false);
    }

    fn preformatted_start(&mut self) {
        self.block_start(2, false);
        self.span_start(SpanStyle {
            font_family: Some(FontFamily::Monospace),
            ..SpanStyle::default()
        });
        self.preformatted_level += 1;
    }

    fn preformatted_end(&mut self) {
        self.preformatted_level = self.preformatted_level.saturating_sub(1);
        self.span_end();
        self.block_end(2, false);
    }
}

fn heading_level(name: &str) -> Option<usize> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

impl<S: SpanSink> HtmlHandler for HtmlFormatter<S> {
    fn on_open_tag(&mut self, name: &str, attributes: &dyn AttributeLookup) {
        match name {
            "br" => self.line_break(),
            "hr" => self.horizontal_rule(),
            "p" => self.block_start(2, false),
            "blockquote" => self.block_start(2, true),
            "div" | "header" | "footer" | "main" | "nav" | "aside" | "section" | "article"
            | "address" | "figure" | "figcaption" | "video" | "audio" => {
                self.block_start(1, false)
            }
            "ul" | "dl" => self.list_start(ListCounter::Unordered),
            "ol" => self.list_start(ListCounter::Ordered(1)),
            "li" => self.list_item_start(),
            "dt" => self.block_start(1, false),
            "dd" => self.block_start(1, true),
            "pre" => self.preformatted_start(),
            "strong" | "b" => {
                let font_weight = self.bold_weight();
                self.colored_span_start(
                    attributes,
                    SpanStyle {
                        font_weight: Some(font_weight),
                        ..SpanStyle::default()
                    },
                );
            }
            "em" | "cite" | "dfn" | "i" => self.colored_span_start(
                attributes,
                SpanStyle {
                    font_style: Some(FontStyle::Italic),
                    ..SpanStyle::default()
                },
            ),
            "big" => self.colored_span_start(
                attributes,
                SpanStyle {
                    font_size_em: Some(1.25),
                    ..SpanStyle::default()
                },
            ),
            "small" => self.colored_span_start(
                attributes,
                SpanStyle {
                    font_size_em: Some(0.8),
                    ..SpanStyle::default()
                },
            ),
            "tt" | "code" => self.colored_span_start(
                attributes,
                SpanStyle {
                    font_family: Some(FontFamily::Monospace),
                    ..SpanStyle::default()
                },
            ),
            "u" => self.colored_span_start(
                attributes,
                SpanStyle {
                    text_decoration: Some(TextDecoration::Underline),
                    ..SpanStyle::default()
                },
            ),
            "del" | "s" | "strike" => self.colored_span_start(
                attributes,
                SpanStyle {
                    text_decoration: Some(TextDecoration::LineThrough),
                    ..SpanStyle::default()
                },
            ),
            "sup" => self.colored_span_start(
                attributes,
                SpanStyle {
                    baseline_shift: Some(BaselineShift::Superscript),
                    ..SpanStyle::default()
                },
            ),
            "sub" => self.colored_span_start(
                attributes,
                SpanStyle {
                    baseline_shift: Some(BaselineShift::Subscript),
                    ..SpanStyle::default()
                },
            ),
            "span" if self.style.text_color_enabled => {
                self.colored_span_start(attributes, SpanStyle::default())
            }
            "a" => self.anchor_start(attributes),
            "script" | "head" | "table" | "form" | "fieldset" => self.skipped_level += 1,
            _ => {
                if let Some(level) = heading_level(name) {
                    self.heading_start(level);
                }
            }
        }
    }

    fn on_close_tag(&mut self, name: &str) {
        match name {
            "p" => self.block_end(2, false),
            "blockquote" => self.block_end(2, true),
            "div" | "header" | "footer" | "main" | "nav" | "aside" | "section" | "article"
            | "address" | "figure" | "figcaption" | "video" | "audio" => self.block_end(1, false),
            "ul" | "dl" | "ol" => self.list_end(),
            "li" => self.list_item_end(),
            "dt" => self.block_end(1, false),
            "dd" => self.block_end(1, true),
            "pre" => self.preformatted_end(),
            "strong" | "b" => {
                self.span_end();
                self.bold_level = self.bold_level.saturating_sub(1);
            }
            "em" | "cite" | "dfn" | "i" | "big" | "small" | "tt" | "code" | "u" | "del" | "s"
            | "strike" | "sup" | "sub" | "a" => self.span_end(),
            "span" if self.style.text_color_enabled => self.span_end(),
            "script" | "head" | "table" | "form" | "fieldset" => {
                self.skipped_level = self.skipped_level.saturating_sub(1)
            }
            _ => {
                if heading_level(name).is_some() {
                    self.heading_end();
                }
            }
        }
    }

    fn on_text(&mut self, text: &str) {
        if self.skipped_level > 0 {
            return;
        }
        let preformatted = self.preformatted_level > 0;
        let (writer, mut out) = self.split();
        if !preformatted {
            writer.write(&mut out, text);
        } else {
            writer.write_preformatted(&mut out, text);
        }
    }
}
