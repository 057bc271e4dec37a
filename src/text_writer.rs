//! Whitespace-collapsing writer with deferred block boundaries.

extern crate alloc;

use alloc::string::String;

use crate::styled_text::{CharSink, PlainText};

/// Text emitted per indentation level when indentation is written as text.
pub const INDENT_UNIT: &str = "    ";

/// Character sink with the two writer hooks.
///
/// Both hooks default to pass-through behavior.
pub trait WriterOutput: CharSink {
    /// Called with the number of newlines about to be flushed before content.
    /// Returns the number actually written.
    fn on_write_new_lines(&mut self, count: usize) -> usize {
        count
    }

    /// Called right before the first character of a content run is written.
    fn on_write_content_start(&mut self) {}
}

impl WriterOutput for String {}

impl WriterOutput for PlainText {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WriterState {
    /// Leading whitespace is dropped.
    BeginText,
    /// Whitespace already collapsed into a written separator.
    SpaceInProgress,
    /// Leading whitespace of the next chunk becomes one separator space.
    ContentInProgress,
}

/// Browser-style whitespace collapsing over chunked text.
///
/// The writer never owns its output. Every call takes the sink so the caller
/// can hand in an adaptor implementing the [`WriterOutput`] hooks.
#[derive(Clone, Debug)]
pub struct TextWriter {
    state: WriterState,
    /// `None` until the first content is written: a document never starts
    /// with blank lines.
    pending_new_lines: Option<usize>,
    pending_indent: usize,
}

impl Default for TextWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextWriter {
    pub fn new() -> Self {
        Self {
            state: WriterState::BeginText,
            pending_new_lines: None,
            pending_indent: 0,
        }
    }

    /// Request a gap of `new_lines` newlines and `indent` indentation units
    /// before the next content.
    ///
    /// Pending requests coalesce: the largest newline count wins and the
    /// indentation is replaced.
    pub fn mark_block_boundary(&mut self, new_lines: usize, indent: usize) {
        let new_lines = new_lines.max(1);
        if let Some(pending) = self.pending_new_lines {
            self.pending_new_lines = Some(pending.max(new_lines));
        }
        self.pending_indent = indent;
        self.state = WriterState::BeginText;
    }

    /// Write collapsed text. Leading whitespace after a boundary is dropped and
    /// interior whitespace runs become a single space.
    pub fn write<O: WriterOutput + ?Sized>(&mut self, out: &mut O, text: &str) {
        if text.is_empty() {
            return;
        }

        let mut state = self.state;
        let mut content_start = true;
        let mut index = 0;
        loop {
            let content = find_from(text, index, |ch| !ch.is_whitespace());
            if state == WriterState::ContentInProgress
                && content.map(|(start, _)| start) != Some(index)
            {
                content_start = false;
                out.on_write_content_start();
                out.push_char(' ');
            }
            let Some((content_index, _)) = content else {
                self.state = WriterState::SpaceInProgress;
                break;
            };
            if content_start {
                self.write_pending_new_lines(out, 0);
                content_start = false;
                out.on_write_content_start();
            }

            match find_from(text, content_index, char::is_whitespace) {
                Some((space_index, space)) => {
                    out.push_str(&text[content_index..space_index]);
                    out.push_char(' ');
                    state = WriterState::SpaceInProgress;
                    index = space_index + space.len_utf8();
                }
                None => {
                    out.push_str(&text[content_index..]);
                    self.state = WriterState::ContentInProgress;
                    break;
                }
            }
        }
    }

    /// Write text verbatim after any pending boundary.
    pub fn write_preformatted<O: WriterOutput + ?Sized>(&mut self, out: &mut O, text: &str) {
        if text.is_empty() {
            return;
        }
        self.write_pending_new_lines(out, 0);
        out.on_write_content_start();
        out.push_str(text);
        self.state = WriterState::BeginText;
    }

    /// Force one newline that block-boundary coalescing cannot absorb.
    pub fn write_line_break<O: WriterOutput + ?Sized>(&mut self, out: &mut O) {
        self.write_pending_new_lines(out, 1);
        self.state = WriterState::BeginText;
    }

    fn write_pending_new_lines<O: WriterOutput + ?Sized>(&mut self, out: &mut O, reset: usize) {
        if let Some(count) = self.pending_new_lines.replace(reset) {
            if count > 0 {
                for _ in 0..out.on_write_new_lines(count) {
                    out.push_char('\n');
                }
            }
        }
        for _ in 0..core::mem::take(&mut self.pending_indent) {
            out.push_str(INDENT_UNIT);
        }
    }
}

fn find_from(text: &str, start: usize, predicate: impl Fn(char) -> bool) -> Option<(usize, char)> {
    text.get(start..)?
        .char_indices()
        .find(|(_, ch)| predicate(*ch))
        .map(|(offset, ch)| (start + offset, ch))
}
