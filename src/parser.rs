//! Built-in markup tokenizer over `quick-xml`.
//!
//! The reader runs in its most forgiving configuration: end tag names are not
//! checked, unmatched end tags and bare `&` are accepted, and attributes use
//! HTML syntax (unquoted and valueless). Tag nesting is left for the
//! [`TagReconciler`](crate::reconcile::TagReconciler) to repair.
//!
//! Two HTML rules the XML reader lacks are handled by re-seating the reader:
//! `script` and `style` bodies are raw text up to their end tag, and a `<`
//! not followed by a letter is literal text.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::Decoder;

use crate::error::ConvertError;
use crate::handler::{HtmlHandler, HtmlParser};
use crate::reconcile::is_void_element;

/// Event source for an HTML string.
///
/// [`HtmlParser::parse`] is best-effort: on malformed markup it logs a warning
/// and stops, keeping every event delivered so far. Use
/// [`QuickXmlParser::try_parse`] to observe the error instead.
#[derive(Clone, Copy, Debug)]
pub struct QuickXmlParser<'a> {
    input: &'a str,
}

impl<'a> QuickXmlParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Push every event of the input into `handler`, failing on the first
    /// syntax error.
    pub fn try_parse(&mut self, handler: &mut dyn HtmlHandler) -> Result<(), ConvertError> {
        let mut base = 0;
        while let Some(resume) = self.parse_from(base, handler)? {
            base = resume;
        }
        Ok(())
    }

    /// Tokenize from byte offset `base`. Returns the offset to restart at when
    /// the reader has to be re-seated (raw text bodies, stray `<`).
    fn parse_from(
        &self,
        base: usize,
        handler: &mut dyn HtmlHandler,
    ) -> Result<Option<usize>, ConvertError> {
        let Some(input) = self.input.get(base..) else {
            return Ok(None);
        };
        let mut reader = lenient_reader(input);

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let tag_end = base + reader_token_offset(&reader);
                    if !starts_with_tag_name(e.name().as_ref()) {
                        // `<` + `content` + `>`
                        match self.stray_lt_resume(tag_end, e.len() + 2) {
                            Some(resume) => {
                                handler.on_text("<");
                                return Ok(Some(resume));
                            }
                            None => continue,
                        }
                    }
                    let name = decode_tag_name(&reader, base, e.name().as_ref())?;
                    let decoder = reader.decoder();
                    let lookup = |key: &str| attribute_value(&e, decoder, key);
                    handler.on_open_tag(&name, &lookup);
                    if is_raw_text_element(&name) {
                        let body_end = raw_text_end(self.input, tag_end, &name);
                        if let Some(body) = self.input.get(tag_end..body_end) {
                            if !body.is_empty() {
                                handler.on_text(body);
                            }
                        }
                        // The end tag itself is read by the restarted reader.
                        return Ok((body_end < self.input.len()).then_some(body_end));
                    }
                }
                Ok(Event::Empty(e)) => {
                    if !starts_with_tag_name(e.name().as_ref()) {
                        let tag_end = base + reader_token_offset(&reader);
                        // `<` + `content` + `/>`
                        match self.stray_lt_resume(tag_end, e.len() + 3) {
                            Some(resume) => {
                                handler.on_text("<");
                                return Ok(Some(resume));
                            }
                            None => continue,
                        }
                    }
                    let name = decode_tag_name(&reader, base, e.name().as_ref())?;
                    let decoder = reader.decoder();
                    let lookup = |key: &str| attribute_value(&e, decoder, key);
                    handler.on_open_tag(&name, &lookup);
                    // Void elements are closed downstream.
                    if !is_void_element(&name) {
                        handler.on_close_tag(&name);
                    }
                }
                Ok(Event::End(e)) => {
                    let name = decode_tag_name(&reader, base, e.name().as_ref())?;
                    handler.on_close_tag(&name);
                }
                Ok(Event::Text(e)) => {
                    let text = e.decode().map_err(|err| {
                        ConvertError::decode(format!("Decode error: {:?}", err))
                            .with_source("text node decode")
                            .with_token_offset(base + reader_token_offset(&reader))
                    })?;
                    handler.on_text(&text);
                }
                Ok(Event::CData(e)) => {
                    let text = reader.decoder().decode(&e).map_err(|err| {
                        ConvertError::decode(format!("Decode error: {:?}", err))
                            .with_source("cdata decode")
                            .with_token_offset(base + reader_token_offset(&reader))
                    })?;
                    handler.on_text(&text);
                }
                Ok(Event::GeneralRef(e)) => {
                    let name = e.decode().map_err(|err| {
                        ConvertError::decode(format!("Decode error: {:?}", err))
                            .with_source("entity decode")
                            .with_token_offset(base + reader_token_offset(&reader))
                    })?;
                    handler.on_text(&resolve_reference(&name));
                }
                Ok(Event::Eof) => return Ok(None),
                Ok(_) => {}
                Err(err) => {
                    return Err(ConvertError::syntax(format!("XML error: {:?}", err))
                        .with_source("xml tokenizer")
                        .with_token_offset(base + reader_token_offset(&reader)));
                }
            }
        }
    }

    /// Offset just past the `<` of a `tag_len`-byte tag ending at `tag_end`,
    /// if that byte really is a `<`.
    fn stray_lt_resume(&self, tag_end: usize, tag_len: usize) -> Option<usize> {
        let tag_start = tag_end.checked_sub(tag_len)?;
        (self.input.as_bytes().get(tag_start) == Some(&b'<')).then_some(tag_start + 1)
    }
}

impl HtmlParser for QuickXmlParser<'_> {
    fn parse(&mut self, handler: &mut dyn HtmlHandler) {
        if let Err(err) = self.try_parse(handler) {
            log::warn!("stopping at malformed markup: {}", err);
        }
    }
}

fn lenient_reader(input: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(input);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;
    reader
}

fn reader_token_offset(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

/// HTML tag names start with an ASCII letter; anything else after `<` is text.
fn starts_with_tag_name(raw: &[u8]) -> bool {
    raw.first().is_some_and(u8::is_ascii_alphabetic)
}

/// Elements whose body is raw text up to the matching end tag.
fn is_raw_text_element(name: &str) -> bool {
    matches!(name, "script" | "style")
}

/// Offset of the `</name` end tag closing a raw text body starting at `from`,
/// or the input length when the body runs to the end.
fn raw_text_end(input: &str, from: usize, name: &str) -> usize {
    let bytes = input.as_bytes();
    let mut index = from;
    while let Some(found) = bytes
        .get(index..)
        .and_then(|rest| rest.windows(2).position(|pair| pair == b"</"))
    {
        let tag = index + found;
        let name_end = tag + 2 + name.len();
        let name_matches = bytes
            .get(tag + 2..name_end)
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name.as_bytes()));
        let terminated = matches!(
            bytes.get(name_end),
            None | Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r' | b'\x0C')
        );
        if name_matches && terminated {
            return tag;
        }
        index = tag + 2;
    }
    input.len()
}

/// Lower-case local name: namespace prefixes are dropped.
fn decode_tag_name(
    reader: &Reader<&[u8]>,
    base: usize,
    raw: &[u8],
) -> Result<String, ConvertError> {
    let decoded = reader.decoder().decode(raw).map_err(|err| {
        ConvertError::decode(format!("Decode error: {:?}", err))
            .with_source("tag name decode")
            .with_token_offset(base + reader_token_offset(reader))
    })?;
    let local_name = decoded.rsplit(':').next().unwrap_or(decoded.as_ref());
    Ok(local_name.to_ascii_lowercase())
}

fn attribute_value(e: &BytesStart<'_>, decoder: Decoder, name: &str) -> Option<String> {
    for attr in e.html_attributes().flatten() {
        let Ok(key) = decoder.decode(attr.key.as_ref()) else {
            continue;
        };
        if !key.eq_ignore_ascii_case(name) {
            continue;
        }
        let raw = decoder.decode(&attr.value).ok()?;
        let value = quick_xml::escape::unescape_with(&raw, resolve_entity)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| raw.to_string());
        return Some(value);
    }
    None
}

#[cfg(feature = "html-entities")]
fn resolve_entity(name: &str) -> Option<&'static str> {
    quick_xml::escape::resolve_html5_entity(name)
}

#[cfg(not(feature = "html-entities"))]
fn resolve_entity(name: &str) -> Option<&'static str> {
    quick_xml::escape::resolve_predefined_entity(name)
}

/// Text for `&name;`. Unknown names are kept as written.
fn resolve_reference(name: &str) -> Cow<'static, str> {
    if let Some(code) = name.strip_prefix('#') {
        let ch = decode_char_ref(code).unwrap_or(char::REPLACEMENT_CHARACTER);
        return Cow::Owned(ch.to_string());
    }
    match resolve_entity(name) {
        Some(value) => Cow::Borrowed(value),
        None => {
            log::trace!("unknown entity &{};", name);
            Cow::Owned(format!("&{};", name))
        }
    }
}

fn decode_char_ref(code: &str) -> Option<char> {
    let value = match code.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => code.parse::<u32>().ok()?,
    };
    match value {
        0 => None,
        value => char::from_u32(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{EventRecorder, HtmlEvent};

    fn record(html: &str) -> Vec<HtmlEvent> {
        let mut recorder = EventRecorder::capturing(["href", "style", "target", "checked"]);
        QuickXmlParser::new(html)
            .try_parse(&mut recorder)
            .expect("markup should tokenize");
        recorder.into_events()
    }

    fn text_of(events: &[HtmlEvent]) -> String {
        events
            .iter()
            .filter_map(|event| match event {
                HtmlEvent::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn tags_of(events: &[HtmlEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                HtmlEvent::OpenTag { name, .. } => Some(name.clone()),
                HtmlEvent::CloseTag(name) => Some(format!("/{}", name)),
                HtmlEvent::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn tag_names_are_lower_case_local_names() {
        let events = record("<P>x</P><svg:Text>y</svg:Text>");
        assert_eq!(tags_of(&events), ["p", "/p", "text", "/text"]);
    }

    #[test]
    fn entities_are_decoded() {
        let events = record("a &amp; b &lt;&#65;&#x42;&copy; &nosuchentity;");
        assert_eq!(text_of(&events), "a & b <AB© &nosuchentity;");
    }

    #[test]
    fn dangling_ampersand_is_text() {
        let events = record("AT&T rocks");
        assert_eq!(text_of(&events), "AT&T rocks");
    }

    #[test]
    fn html_attributes_are_read() {
        let events = record(
            r#"<a HREF="https://example.com/?a=1&amp;b=2" style='color: red' target=_blank>x</a><input checked>"#,
        );
        match &events[0] {
            HtmlEvent::OpenTag { attributes, .. } => {
                assert_eq!(
                    attributes[0],
                    ("href".to_string(), "https://example.com/?a=1&b=2".to_string())
                );
                assert_eq!(attributes[1], ("style".to_string(), "color: red".to_string()));
                assert_eq!(attributes[2], ("target".to_string(), "_blank".to_string()));
            }
            other => panic!("unexpected event {:?}", other),
        }
        match &events[3] {
            HtmlEvent::OpenTag { name, attributes } => {
                assert_eq!(name, "input");
                assert_eq!(attributes[0].0, "checked");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn self_closed_elements_close_unless_void() {
        let events = record("<br/><p/>");
        assert_eq!(tags_of(&events), ["br", "p", "/p"]);
    }

    #[test]
    fn mismatched_and_stray_end_tags_pass_through() {
        let events = record("<b><i>x</b></i></p>");
        assert_eq!(tags_of(&events), ["b", "i", "/b", "/i", "/p"]);
    }

    #[test]
    fn comments_and_doctype_are_ignored() {
        let events = record("<!DOCTYPE html><!-- note --><p>x<![CDATA[<y>]]></p>");
        assert_eq!(tags_of(&events), ["p", "/p"]);
        assert_eq!(text_of(&events), "x<y>");
    }

    #[test]
    fn script_and_style_bodies_are_raw_text() {
        let events = record("<script>if (a<b) { x(); }</script><p>after</p>");
        assert_eq!(tags_of(&events), ["script", "/script", "p", "/p"]);
        assert_eq!(text_of(&events), "if (a<b) { x(); }after");

        let events = record("<STYLE>a > b { }</Style ><i>x</i>");
        assert_eq!(tags_of(&events), ["style", "/style", "i", "/i"]);
        assert_eq!(text_of(&events), "a > b { }x");

        let events = record("<script></script><script>for(i=0;i<n;i++){}</scripts></script>");
        assert_eq!(tags_of(&events), ["script", "/script", "script", "/script"]);
        assert_eq!(text_of(&events), "for(i=0;i<n;i++){}</scripts>");
    }

    #[test]
    fn unterminated_raw_text_runs_to_end_of_input() {
        let events = record("<p>x</p><script>let y = a < b;");
        assert_eq!(tags_of(&events), ["p", "/p", "script"]);
        assert_eq!(text_of(&events), "xlet y = a < b;");
    }

    #[test]
    fn less_than_without_tag_name_is_text() {
        let events = record("<p>1 < 2 holds</p><p>I <3 it</p>");
        assert_eq!(tags_of(&events), ["p", "/p", "p", "/p"]);
        assert_eq!(text_of(&events), "1 < 2 holdsI <3 it");
    }

    #[test]
    fn strict_parse_reports_offset() {
        let mut recorder = EventRecorder::new();
        let err = QuickXmlParser::new("<p>ok</p><!-- never closed")
            .try_parse(&mut recorder)
            .expect_err("unclosed comment should fail");
        assert_eq!(err.code, ConvertError::TOKENIZE_SYNTAX_ERROR);
        assert!(err.token_offset.is_some());
        assert_eq!(text_of(recorder.events()), "ok");
    }

    #[test]
    fn lenient_parse_keeps_events_before_error() {
        let mut recorder = EventRecorder::new();
        QuickXmlParser::new("<p>ok</p><!-- never closed").parse(&mut recorder);
        assert_eq!(text_of(recorder.events()), "ok");
    }
}
