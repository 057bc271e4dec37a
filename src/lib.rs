//! Single-pass HTML to plain text and styled rich text conversion.
//!
//! Markup events flow through a tag reconciler into a formatting state machine
//! that drives a whitespace-collapsing text writer. The result is either a
//! plain `String` or a [`StyledText`] carrying span, link and paragraph
//! ranges for a rich-text renderer.
//!
//! ```
//! # #[cfg(feature = "std")]
//! # {
//! use html_richtext::{html_to_string, html_to_styled, HtmlStyle};
//!
//! let text = html_to_string("<p>Hello <b>world</b></p><ul><li>one</li></ul>", false);
//! assert_eq!(text, "Hello world\n\n• one");
//!
//! let styled = html_to_styled("<a href=\"https://example.com\">link</a>", false, &HtmlStyle::default(), None);
//! assert_eq!(styled.links[0].item.url, "https://example.com");
//! # }
//! ```
//!
//! Without the `std` feature the crate is `no_std + alloc`; bring a tokenizer
//! through [`HtmlParser`] and use the `*_with` entry points.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

extern crate alloc;

pub mod color;
pub mod convert;
pub mod error;
pub mod formatter;
pub mod handler;
#[cfg(feature = "std")]
pub mod parser;
pub mod reconcile;
pub mod style;
pub mod styled_text;
pub mod text_writer;

pub use color::{background_from_style, color_from_style, parse_html_color, Color};
pub use convert::{html_to_string_with, html_to_styled_with};
#[cfg(feature = "std")]
pub use convert::{html_to_string, html_to_styled, try_html_to_string, try_html_to_styled};
pub use error::{ConvertError, ErrorPhase};
pub use formatter::HtmlFormatter;
pub use handler::{
    AttributeList, AttributeLookup, EventRecorder, HtmlEvent, HtmlHandler, HtmlParser,
    NoAttributes,
};
#[cfg(feature = "std")]
pub use parser::QuickXmlParser;
pub use reconcile::{is_void_element, TagReconciler};
pub use style::{
    BaselineShift, FontFamily, FontStyle, FontWeight, HtmlStyle, LinkAnnotation, LinkListener,
    LinkStyles, ParagraphStyle, SpanStyle, TextDecoration, TextIndent,
};
pub use styled_text::{CharSink, PlainText, SpanSink, StyleRange, StyledText, StyledTextBuilder};
pub use text_writer::{TextWriter, WriterOutput, INDENT_UNIT};
