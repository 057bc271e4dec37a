mod common;

use common::fixtures::{load, FEED_FIXTURE, MALFORMED_FIXTURE, SAMPLE_FIXTURE};
use html_richtext::{
    html_to_string, html_to_styled, Color, FontFamily, FontStyle, FontWeight, HtmlStyle,
    LinkListener, StyledText, TextDecoration,
};

const SAMPLE_PLAIN: &str = "Hello HTML Converter for Rust\n\
\n\
This the first paragraph of the sample running on Desktop!\n\
\n\
• Bold\n\
• Italic\n\
• Underline\n\
• Strikethrough\n\
• Code\n\
• Hyperlink with custom styling (non-clickable in this sample)\n\
• Bigger and smaller text\n\
• Supertext and subtext\n\
• A nested list: \n    • Item 1\n    • Item 2\n\
\n\
Term\n    Description.\n\
\n\
A few HTML entities: » © « ✓ \n\
\n    A blockquote, indented relatively to the main text.\n\
\n\
Preformatted text, preserving\nline breaks...    and spaces.\n\
\n\
You reached the end of the document.\nThank you for reading!";

fn colored() -> HtmlStyle {
    HtmlStyle {
        text_color_enabled: true,
        ..HtmlStyle::default()
    }
}

fn find_style<'a>(
    styled: &'a StyledText,
    covered: &str,
    matches: impl Fn(&html_richtext::SpanStyle) -> bool,
) -> &'a html_richtext::StyleRange<html_richtext::SpanStyle> {
    styled
        .span_styles
        .iter()
        .find(|range| styled.slice(range) == covered && matches(&range.item))
        .unwrap_or_else(|| panic!("no matching style over {:?} in {:?}", covered, styled))
}

#[test]
fn links_between_inline_text() {
    let html = r#"<a href="https://openfreemap.org" target="_blank">OpenFreeMap</a>
<a href="https://www.openmaptiles.org/" target="_blank">&copy; OpenMapTiles</a>
Data from <a href="https://www.openstreetmap.org/copyright" target="_blank">OpenStreetMap</a>"#;

    let styled = html_to_styled(html, false, &HtmlStyle::default(), None);
    assert_eq!(styled.text, "OpenFreeMap © OpenMapTiles Data from OpenStreetMap");
    assert!(styled.span_styles.is_empty());

    let links: Vec<(&str, &str)> = styled
        .links
        .iter()
        .map(|range| (styled.slice(range), range.item.url.as_str()))
        .collect();
    assert_eq!(
        links,
        [
            ("OpenFreeMap", "https://openfreemap.org"),
            ("© OpenMapTiles", "https://www.openmaptiles.org/"),
            ("OpenStreetMap", "https://www.openstreetmap.org/copyright"),
        ]
    );
    for range in &styled.links {
        let decoration = range
            .item
            .styles
            .as_ref()
            .and_then(|styles| styles.style.as_ref())
            .and_then(|style| style.text_decoration);
        assert_eq!(decoration, Some(TextDecoration::Underline));
        assert!(range.item.listener.is_none());
    }

    assert_eq!(
        html_to_string(html, false),
        "OpenFreeMap © OpenMapTiles Data from OpenStreetMap"
    );
}

#[test]
fn inline_colors_nest_with_formatting() {
    let html = r#"<span style="color:red;">Open<b>Fr<i style="color:#001F00   ;">e</i>e</b>Map</span>"#;
    let styled = html_to_styled(html, false, &colored(), None);
    assert_eq!(styled.text, "OpenFreeMap");
    assert_eq!(styled.span_styles.len(), 3);

    let red = find_style(&styled, "OpenFreeMap", |s| {
        s.color == Some(Color::rgb(255, 0, 0))
    });
    assert_eq!(red.range(), 0..11);
    let bold = find_style(&styled, "Free", |s| s.font_weight == Some(FontWeight::BOLD));
    assert_eq!(bold.range(), 4..8);
    let italic = find_style(&styled, "e", |s| s.font_style == Some(FontStyle::Italic));
    assert_eq!(italic.range(), 6..7);
    assert_eq!(italic.item.color, Some(Color::rgb(0, 31, 0)));

    // Without colors only the formatting survives.
    let uncolored = html_to_styled(html, false, &HtmlStyle::default(), None);
    assert_eq!(uncolored.span_styles.len(), 2);
    assert!(uncolored.span_styles.iter().all(|range| range.item.color.is_none()));
}

#[test]
fn sample_document_plain_layout() {
    let html = load(SAMPLE_FIXTURE);
    assert_eq!(html_to_string(&html, false), SAMPLE_PLAIN);
    assert_eq!(html_to_string(&html, true), SAMPLE_PLAIN.replace("\n\n", "\n"));
}

#[test]
fn sample_document_styles() {
    let html = load(SAMPLE_FIXTURE);
    let listener = LinkListener::new(|_url| {});
    let styled = html_to_styled(&html, false, &HtmlStyle::default(), Some(listener.clone()));

    let heading = find_style(&styled, "Hello HTML Converter for Rust", |s| {
        s.font_size_em == Some(1.5)
    });
    assert_eq!(heading.item.font_weight, Some(FontWeight::BOLD));
    find_style(&styled, "HTML Converter", |s| {
        s.font_weight == Some(FontWeight::BLACK)
    });
    find_style(&styled, "Italic", |s| s.font_style == Some(FontStyle::Italic));
    find_style(&styled, "Underline", |s| {
        s.text_decoration == Some(TextDecoration::Underline)
    });
    find_style(&styled, "Strikethrough", |s| {
        s.text_decoration == Some(TextDecoration::LineThrough)
    });
    find_style(&styled, "Code", |s| s.font_family == Some(FontFamily::Monospace));
    find_style(&styled, "Preformatted text, preserving\nline breaks...    and spaces.", |s| {
        s.font_family == Some(FontFamily::Monospace)
    });

    assert_eq!(styled.links.len(), 1);
    let link = &styled.links[0];
    assert_eq!(styled.slice(link), "Hyperlink with custom styling");
    assert_eq!(link.item.url, "#");
    assert_eq!(link.item.listener.as_ref(), Some(&listener));

    assert!(!styled.paragraph_styles.is_empty());
    for range in &styled.paragraph_styles {
        assert!(range.start <= range.end && range.end <= styled.text.len());
    }
    let quote = styled
        .paragraph_styles
        .iter()
        .find(|range| styled.slice(range).contains("A blockquote"))
        .expect("blockquote paragraph");
    assert_eq!(quote.item.text_indent.first_line, 24.0);
    assert_eq!(quote.item.text_indent.rest_line, 24.0);
    assert!(!styled.text.contains("    A blockquote"));
}

#[test]
fn feed_description_skips_tables_and_scripts() {
    let html = load(FEED_FIXTURE);
    assert_eq!(
        html_to_string(&html, false),
        "Release 2.4 is out. Highlights:\n\
\n\
1. Faster startup\n\
2. New documentation\n\
3. Bug fixes\n\
\n\
Read the full notes online."
    );

    let styled = html_to_styled(&html, false, &colored(), None);
    assert!(!styled.text.contains("hidden cell"));
    assert!(!styled.text.contains("track"));

    let link = &styled.links[0];
    assert_eq!(styled.slice(link), "documentation");
    assert_eq!(link.item.url, "https://example.org/docs");
    let link_style = link
        .item
        .styles
        .as_ref()
        .and_then(|styles| styles.style.as_ref())
        .expect("link style");
    assert_eq!(link_style.color, Some(Color::rgb(0x00, 0x66, 0xCC)));
    assert_eq!(link_style.text_decoration, Some(TextDecoration::Underline));

    let notes = find_style(&styled, "full notes", |s| {
        s.color == Some(Color::rgb(0, 128, 0))
    });
    assert_eq!(notes.item.background, Some(Color::rgb(255, 255, 0)));
    // Paragraph tags do not carry colors.
    assert!(styled
        .span_styles
        .iter()
        .all(|range| range.item.color != Some(Color::rgb(255, 0, 0))));
}

#[test]
fn malformed_markup_still_converts() {
    let html = load(MALFORMED_FIXTURE);
    assert_eq!(
        html_to_string(&html, false),
        "Unclosed bold and italic\n\
\n\
• one\n\
• two\n\
\n\
Trailing text\nafter break \n\
\n\
Stray end tags"
    );

    let styled = html_to_styled(&html, false, &HtmlStyle::default(), None);
    // Formatting opened in the first paragraph ends with it.
    let bold = find_style(&styled, "bold and italic", |s| {
        s.font_weight == Some(FontWeight::BOLD)
    });
    assert!(bold.end <= styled.text.find('•').unwrap_or(usize::MAX));
    find_style(&styled, "and italic", |s| s.font_style == Some(FontStyle::Italic));
}
