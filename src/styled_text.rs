//! Output sinks: the character buffer and the styled range model.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;

use smallvec::SmallVec;

use crate::style::{LinkAnnotation, ParagraphStyle, SpanStyle};

/// Append-only text accumulator.
///
/// Offsets are UTF-8 byte offsets into the accumulated text.
pub trait CharSink {
    fn push_str(&mut self, text: &str);

    fn push_char(&mut self, ch: char);

    /// Current length, used as the start/end offset of ranges.
    fn offset(&self) -> usize;
}

/// Range-producing sink for styled output.
///
/// `push_style` and `push_link` open a range at the current offset; `pop`
/// closes the most recently opened one.
pub trait SpanSink: CharSink {
    fn push_style(&mut self, style: SpanStyle);

    fn push_link(&mut self, link: LinkAnnotation);

    fn pop(&mut self);

    /// Attach a paragraph style over already written text.
    fn add_paragraph_style(&mut self, style: ParagraphStyle, range: Range<usize>);
}

impl CharSink for String {
    fn push_str(&mut self, text: &str) {
        String::push_str(self, text);
    }

    fn push_char(&mut self, ch: char) {
        self.push(ch);
    }

    fn offset(&self) -> usize {
        self.len()
    }
}

/// Text-only sink: range operations are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlainText {
    text: String,
}

impl PlainText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl CharSink for PlainText {
    fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn push_char(&mut self, ch: char) {
        self.text.push(ch);
    }

    fn offset(&self) -> usize {
        self.text.len()
    }
}

impl SpanSink for PlainText {
    fn push_style(&mut self, _style: SpanStyle) {}

    fn push_link(&mut self, _link: LinkAnnotation) {}

    fn pop(&mut self) {}

    fn add_paragraph_style(&mut self, _style: ParagraphStyle, _range: Range<usize>) {}
}

/// An item applied over `[start, end)` of the text.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StyleRange<T> {
    pub item: T,
    pub start: usize,
    pub end: usize,
}

impl<T> StyleRange<T> {
    pub fn new(item: T, start: usize, end: usize) -> Self {
        Self { item, start, end }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Text annotated with possibly overlapping style, link and paragraph ranges.
///
/// Ranges are listed in the order they were opened.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StyledText {
    pub text: String,
    pub span_styles: Vec<StyleRange<SpanStyle>>,
    pub links: Vec<StyleRange<LinkAnnotation>>,
    pub paragraph_styles: Vec<StyleRange<ParagraphStyle>>,
}

impl StyledText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Text covered by a range.
    pub fn slice<T>(&self, range: &StyleRange<T>) -> &str {
        self.text.get(range.range()).unwrap_or_default()
    }

    /// Span styles covering `offset`.
    pub fn styles_at(&self, offset: usize) -> impl Iterator<Item = &SpanStyle> {
        self.span_styles
            .iter()
            .filter(move |range| range.range().contains(&offset))
            .map(|range| &range.item)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OpenRange {
    Style(usize),
    Link(usize),
}

/// Builder with a LIFO stack of open ranges.
#[derive(Debug, Default)]
pub struct StyledTextBuilder {
    output: StyledText,
    open: SmallVec<[OpenRange; 8]>,
}

impl StyledTextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ranges opened and not yet popped.
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Close any range still open at the end of the text and return the result.
    pub fn build(mut self) -> StyledText {
        while !self.open.is_empty() {
            self.pop();
        }
        self.output
    }
}

impl CharSink for StyledTextBuilder {
    fn push_str(&mut self, text: &str) {
        self.output.text.push_str(text);
    }

    fn push_char(&mut self, ch: char) {
        self.output.text.push(ch);
    }

    fn offset(&self) -> usize {
        self.output.text.len()
    }
}

impl SpanSink for StyledTextBuilder {
    fn push_style(&mut self, style: SpanStyle) {
        let start = self.offset();
        self.open.push(OpenRange::Style(self.output.span_styles.len()));
        self.output
            .span_styles
            .push(StyleRange::new(style, start, start));
    }

    fn push_link(&mut self, link: LinkAnnotation) {
        let start = self.offset();
        self.open.push(OpenRange::Link(self.output.links.len()));
        self.output.links.push(StyleRange::new(link, start, start));
    }

    fn pop(&mut self) {
        let end = self.offset();
        match self.open.pop() {
            Some(OpenRange::Style(index)) => {
                if let Some(range) = self.output.span_styles.get_mut(index) {
                    range.end = end;
                }
            }
            Some(OpenRange::Link(index)) => {
                if let Some(range) = self.output.links.get_mut(index) {
                    range.end = end;
                }
            }
            None => {}
        }
    }

    fn add_paragraph_style(&mut self, style: ParagraphStyle, range: Range<usize>) {
        self.output
            .paragraph_styles
            .push(StyleRange::new(style, range.start, range.end));
    }
}
