//! Event source contract between a markup tokenizer and the converter.
//!
//! A tokenizer implements [`HtmlParser`] and pushes events into an
//! [`HtmlHandler`]. Tag names are lower case and entities are already
//! decoded. Nesting does not need to be well formed: the converter repairs it.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Attribute access for the duration of one open-tag event.
pub trait AttributeLookup {
    /// Value of the named attribute, if present.
    fn attribute(&self, name: &str) -> Option<String>;
}

impl<F> AttributeLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn attribute(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Attribute lookup for tags without attributes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAttributes;

impl AttributeLookup for NoAttributes {
    fn attribute(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Borrowed name/value pairs, matched case-insensitively.
#[derive(Clone, Copy, Debug, Default)]
pub struct AttributeList<'a>(pub &'a [(&'a str, &'a str)]);

impl AttributeLookup for AttributeList<'_> {
    fn attribute(&self, name: &str) -> Option<String> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| (*value).to_string())
    }
}

/// Receiver of markup events.
pub trait HtmlHandler {
    fn on_open_tag(&mut self, name: &str, attributes: &dyn AttributeLookup);

    fn on_close_tag(&mut self, name: &str);

    /// May be called several times for one contiguous run of text.
    fn on_text(&mut self, text: &str);
}

impl<H: HtmlHandler + ?Sized> HtmlHandler for &mut H {
    fn on_open_tag(&mut self, name: &str, attributes: &dyn AttributeLookup) {
        (**self).on_open_tag(name, attributes)
    }

    fn on_close_tag(&mut self, name: &str) {
        (**self).on_close_tag(name)
    }

    fn on_text(&mut self, text: &str) {
        (**self).on_text(text)
    }
}

/// Push-style event source.
pub trait HtmlParser {
    /// Push every event of the input into `handler`.
    fn parse(&mut self, handler: &mut dyn HtmlHandler);
}

impl<F> HtmlParser for F
where
    F: FnMut(&mut dyn HtmlHandler),
{
    fn parse(&mut self, handler: &mut dyn HtmlHandler) {
        self(handler)
    }
}

/// Owned copy of one event, with the attributes the recorder was asked to keep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HtmlEvent {
    OpenTag {
        name: String,
        attributes: Vec<(String, String)>,
    },
    CloseTag(String),
    Text(String),
}

/// Handler that stores every event it receives.
#[derive(Clone, Debug, Default)]
pub struct EventRecorder {
    events: Vec<HtmlEvent>,
    captured_attributes: Vec<String>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also record the values of these attribute names on open tags.
    pub fn capturing<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: Vec::new(),
            captured_attributes: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn events(&self) -> &[HtmlEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<HtmlEvent> {
        self.events
    }

    /// Replay the recorded events into another handler.
    pub fn replay(&self, handler: &mut dyn HtmlHandler) {
        for event in &self.events {
            match event {
                HtmlEvent::OpenTag { name, attributes } => {
                    let lookup = |key: &str| {
                        attributes
                            .iter()
                            .find(|(recorded, _)| recorded.eq_ignore_ascii_case(key))
                            .map(|(_, value)| value.clone())
                    };
                    handler.on_open_tag(name, &lookup);
                }
                HtmlEvent::CloseTag(name) => handler.on_close_tag(name),
                HtmlEvent::Text(text) => handler.on_text(text),
            }
        }
    }
}

impl HtmlHandler for EventRecorder {
    fn on_open_tag(&mut self, name: &str, attributes: &dyn AttributeLookup) {
        let attributes = self
            .captured_attributes
            .iter()
            .filter_map(|key| {
                attributes
                    .attribute(key)
                    .map(|value| (key.clone(), value))
            })
            .collect();
        self.events.push(HtmlEvent::OpenTag {
            name: name.to_string(),
            attributes,
        });
    }

    fn on_close_tag(&mut self, name: &str) {
        self.events.push(HtmlEvent::CloseTag(name.to_string()));
    }

    fn on_text(&mut self, text: &str) {
        self.events.push(HtmlEvent::Text(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn closure_parsers_push_into_handler() {
        let mut parser = |handler: &mut dyn HtmlHandler| {
            handler.on_open_tag("p", &NoAttributes);
            handler.on_text("hi");
            handler.on_close_tag("p");
        };
        let mut recorder = EventRecorder::new();
        parser.parse(&mut recorder);
        assert_eq!(
            recorder.events(),
            &[
                HtmlEvent::OpenTag {
                    name: "p".to_string(),
                    attributes: Vec::new()
                },
                HtmlEvent::Text("hi".to_string()),
                HtmlEvent::CloseTag("p".to_string()),
            ]
        );
    }

    #[test]
    fn recorder_captures_requested_attributes_only() {
        let mut recorder = EventRecorder::capturing(["href"]);
        recorder.on_open_tag(
            "a",
            &AttributeList(&[("HREF", "https://example.com"), ("target", "_blank")]),
        );
        assert_eq!(
            recorder.events()[0],
            HtmlEvent::OpenTag {
                name: "a".to_string(),
                attributes: vec![("href".to_string(), "https://example.com".to_string())],
            }
        );
    }

    #[test]
    fn replay_reproduces_events() {
        let mut recorder = EventRecorder::capturing(["style"]);
        recorder.on_open_tag("span", &AttributeList(&[("style", "color: red")]));
        recorder.on_text("x");
        recorder.on_close_tag("span");

        let mut copy = EventRecorder::capturing(["style"]);
        recorder.replay(&mut copy);
        assert_eq!(copy.events(), recorder.events());
    }
}
