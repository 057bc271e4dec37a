mod common;

use common::fixtures::all_fixtures;
use html_richtext::{
    AttributeLookup, EventRecorder, HtmlHandler, HtmlParser, NoAttributes, QuickXmlParser,
    TagReconciler,
};

/// Fails on any close that does not match the innermost open element.
#[derive(Default)]
struct BalanceChecker {
    stack: Vec<String>,
    opens: usize,
    max_depth: usize,
}

impl HtmlHandler for BalanceChecker {
    fn on_open_tag(&mut self, name: &str, _attributes: &dyn AttributeLookup) {
        self.stack.push(name.to_string());
        self.opens += 1;
        self.max_depth = self.max_depth.max(self.stack.len());
    }

    fn on_close_tag(&mut self, name: &str) {
        let top = self
            .stack
            .pop()
            .unwrap_or_else(|| panic!("close </{}> with nothing open", name));
        assert_eq!(top, name, "close </{}> does not match open <{}>", name, top);
    }

    fn on_text(&mut self, _text: &str) {}
}

fn check(events: &EventRecorder) -> BalanceChecker {
    let mut reconciler = TagReconciler::new(BalanceChecker::default());
    events.replay(&mut reconciler);
    let checker = reconciler.into_inner();
    assert!(
        checker.stack.is_empty(),
        "left open after finish: {:?}",
        checker.stack
    );
    checker
}

/// Small LCG so sequences are reproducible without extra dependencies.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next() % items.len() as u64) as usize]
    }
}

const TAGS: &[&str] = &["p", "b", "i", "ul", "li", "a", "BR", "hr", "img", "div", "Span"];

#[test]
fn fixtures_reconcile_to_balanced_trees() {
    for (name, html) in all_fixtures() {
        let mut recorder = EventRecorder::new();
        QuickXmlParser::new(&html).parse(&mut recorder);
        let checker = check(&recorder);
        assert!(checker.opens > 0, "fixture {} produced no elements", name);
    }
}

#[test]
fn stray_and_void_end_tags() {
    let mut recorder = EventRecorder::new();
    recorder.on_close_tag("p");
    recorder.on_open_tag("div", &NoAttributes);
    recorder.on_close_tag("br");
    recorder.on_open_tag("img", &NoAttributes);
    recorder.on_close_tag("img");
    recorder.on_close_tag("span");
    recorder.on_open_tag("b", &NoAttributes);
    recorder.on_close_tag("DIV");

    let checker = check(&recorder);
    // div, synthesized br, img, b
    assert_eq!(checker.opens, 4);
    assert_eq!(checker.max_depth, 2);
}

#[test]
fn random_event_sequences_stay_balanced() {
    let mut rng = Lcg(0x5eed_1234);
    for _ in 0..200 {
        let mut recorder = EventRecorder::new();
        let len = 1 + rng.next() % 64;
        for _ in 0..len {
            match rng.next() % 3 {
                0 => recorder.on_open_tag(rng.pick(TAGS), &NoAttributes),
                1 => recorder.on_close_tag(rng.pick(TAGS)),
                _ => recorder.on_text("x"),
            }
        }
        check(&recorder);
    }
}
