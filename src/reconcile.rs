//! Tag stack repair between an event source and a handler.
//!
//! Tokenizers report tags as written. [`TagReconciler`] makes sure every open
//! tag it forwards is closed exactly once, innermost first, whatever the input
//! nesting looks like.

extern crate alloc;

use alloc::string::{String, ToString};

use smallvec::SmallVec;

use crate::handler::{AttributeLookup, HtmlHandler, NoAttributes};

/// Elements without content. Their open event is closed immediately.
pub fn is_void_element(name: &str) -> bool {
    ["br", "hr", "img"]
        .iter()
        .any(|void| name.eq_ignore_ascii_case(void))
}

/// Handler adaptor that balances tags before forwarding them.
///
/// Call [`TagReconciler::finish`] (or [`TagReconciler::into_inner`]) once the
/// source is exhausted to close the tags still open.
#[derive(Debug)]
pub struct TagReconciler<H: HtmlHandler> {
    inner: H,
    stack: SmallVec<[String; 16]>,
}

impl<H: HtmlHandler> TagReconciler<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            stack: SmallVec::new(),
        }
    }

    /// Number of tags currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn get_ref(&self) -> &H {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut H {
        &mut self.inner
    }

    /// Close every open tag, innermost first.
    pub fn finish(&mut self) {
        #[cfg(feature = "std")]
        if !self.stack.is_empty() {
            log::debug!("closing {} unterminated tag(s) at end of input", self.stack.len());
        }
        self.close_down_to(0);
    }

    /// Finish and return the wrapped handler.
    pub fn into_inner(mut self) -> H {
        self.finish();
        self.inner
    }

    fn close_down_to(&mut self, position: usize) {
        while self.stack.len() > position {
            if let Some(name) = self.stack.pop() {
                self.inner.on_close_tag(&name);
            }
        }
    }
}

impl<H: HtmlHandler> HtmlHandler for TagReconciler<H> {
    fn on_open_tag(&mut self, name: &str, attributes: &dyn AttributeLookup) {
        self.inner.on_open_tag(name, attributes);
        if is_void_element(name) {
            self.inner.on_close_tag(name);
        } else {
            self.stack.push(name.to_string());
        }
    }

    fn on_close_tag(&mut self, name: &str) {
        // `</br>` on its own is read as `<br/>`.
        if name.eq_ignore_ascii_case("br") {
            self.inner.on_open_tag("br", &NoAttributes);
            self.inner.on_close_tag("br");
            return;
        }

        match self
            .stack
            .iter()
            .rposition(|open| open.eq_ignore_ascii_case(name))
        {
            Some(position) => {
                #[cfg(feature = "std")]
                if position + 1 < self.stack.len() {
                    log::debug!(
                        "</{}> closes {} unterminated child tag(s)",
                        name,
                        self.stack.len() - position - 1
                    );
                }
                self.close_down_to(position);
            }
            None => {
                #[cfg(feature = "std")]
                log::debug!("discarding stray </{}>", name);
            }
        }
    }

    fn on_text(&mut self, text: &str) {
        self.inner.on_text(text);
    }
}
