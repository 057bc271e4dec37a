//! Conversion entry points.
//!
//! Every path runs the event source through a [`TagReconciler`] so external
//! tokenizers need not balance their tags.

extern crate alloc;

use alloc::string::String;

use crate::formatter::HtmlFormatter;
use crate::handler::HtmlParser;
use crate::reconcile::TagReconciler;
use crate::style::{HtmlStyle, LinkListener};
use crate::styled_text::{SpanSink, StyledText};

#[cfg(feature = "std")]
use crate::error::ConvertError;
#[cfg(feature = "std")]
use crate::parser::QuickXmlParser;

fn run<P, S>(parser: &mut P, formatter: HtmlFormatter<S>) -> HtmlFormatter<S>
where
    P: HtmlParser + ?Sized,
    S: SpanSink,
{
    let mut reconciler = TagReconciler::new(formatter);
    parser.parse(&mut reconciler);
    reconciler.into_inner()
}

/// Convert events from `parser` to styled text.
pub fn html_to_styled_with<P: HtmlParser + ?Sized>(
    parser: &mut P,
    compact_mode: bool,
    style: &HtmlStyle,
    link_listener: Option<LinkListener>,
) -> StyledText {
    run(parser, HtmlFormatter::styled(compact_mode, style, link_listener)).into_styled_text()
}

/// Convert events from `parser` to plain text.
pub fn html_to_string_with<P: HtmlParser + ?Sized>(parser: &mut P, compact_mode: bool) -> String {
    run(parser, HtmlFormatter::plain(compact_mode)).into_string()
}

/// Convert HTML to styled text.
///
/// `compact_mode` limits every gap between blocks to a single newline.
/// Malformed markup never fails: conversion stops at the first syntax error
/// the tokenizer cannot recover from and keeps what was produced.
#[cfg(feature = "std")]
pub fn html_to_styled(
    html: &str,
    compact_mode: bool,
    style: &HtmlStyle,
    link_listener: Option<LinkListener>,
) -> StyledText {
    html_to_styled_with(&mut QuickXmlParser::new(html), compact_mode, style, link_listener)
}

/// Convert HTML to plain text.
#[cfg(feature = "std")]
pub fn html_to_string(html: &str, compact_mode: bool) -> String {
    html_to_string_with(&mut QuickXmlParser::new(html), compact_mode)
}

/// Like [`html_to_styled`], but reports tokenizer errors.
#[cfg(feature = "std")]
pub fn try_html_to_styled(
    html: &str,
    compact_mode: bool,
    style: &HtmlStyle,
    link_listener: Option<LinkListener>,
) -> Result<StyledText, ConvertError> {
    let formatter = HtmlFormatter::styled(compact_mode, style, link_listener);
    let mut reconciler = TagReconciler::new(formatter);
    QuickXmlParser::new(html).try_parse(&mut reconciler)?;
    Ok(reconciler.into_inner().into_styled_text())
}

/// Like [`html_to_string`], but reports tokenizer errors.
#[cfg(feature = "std")]
pub fn try_html_to_string(html: &str, compact_mode: bool) -> Result<String, ConvertError> {
    let mut reconciler = TagReconciler::new(HtmlFormatter::plain(compact_mode));
    QuickXmlParser::new(html).try_parse(&mut reconciler)?;
    Ok(reconciler.into_inner().into_string())
}
