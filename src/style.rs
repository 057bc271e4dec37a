//! Span, paragraph and link descriptors plus converter configuration.

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

use crate::color::Color;

/// Numeric font weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const BOLD: FontWeight = FontWeight(700);
    /// Heaviest weight, used for nested bold.
    pub const BLACK: FontWeight = FontWeight(900);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FontStyle {
    Normal,
    Italic,
}

/// Generic font family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FontFamily {
    Default,
    Monospace,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TextDecoration {
    Underline,
    LineThrough,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BaselineShift {
    Superscript,
    Subscript,
}

/// Character-level style. `None` fields leave the inherited value untouched.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpanStyle {
    /// Foreground color.
    pub color: Option<Color>,
    /// Background color.
    pub background: Option<Color>,
    /// Font size as a multiplier of the surrounding text size (em).
    pub font_size_em: Option<f32>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    pub font_family: Option<FontFamily>,
    pub text_decoration: Option<TextDecoration>,
    pub baseline_shift: Option<BaselineShift>,
}

impl SpanStyle {
    /// Style carrying only colors.
    pub fn with_colors(color: Option<Color>, background: Option<Color>) -> Self {
        Self {
            color,
            background,
            ..Self::default()
        }
    }

    /// Return a copy where every field specified by `other` replaces ours.
    pub fn merge(&self, other: &SpanStyle) -> SpanStyle {
        SpanStyle {
            color: other.color.or(self.color),
            background: other.background.or(self.background),
            font_size_em: other.font_size_em.or(self.font_size_em),
            font_weight: other.font_weight.or(self.font_weight),
            font_style: other.font_style.or(self.font_style),
            font_family: other.font_family.or(self.font_family),
            text_decoration: other.text_decoration.or(self.text_decoration),
            baseline_shift: other.baseline_shift.or(self.baseline_shift),
        }
    }

    /// True when no field is specified.
    pub fn is_empty(&self) -> bool {
        *self == SpanStyle::default()
    }
}

/// Paragraph indentation, in the same unit as [`HtmlStyle::indent_unit`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextIndent {
    pub first_line: f32,
    pub rest_line: f32,
}

/// Paragraph-level style attached over a whole block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParagraphStyle {
    pub text_indent: TextIndent,
}

/// Appearance of a hyperlink in its interaction states.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LinkStyles {
    pub style: Option<SpanStyle>,
    pub focused_style: Option<SpanStyle>,
    pub hovered_style: Option<SpanStyle>,
    pub pressed_style: Option<SpanStyle>,
}

impl LinkStyles {
    /// Link styles with only a resting appearance.
    pub fn new(style: SpanStyle) -> Self {
        Self {
            style: Some(style),
            ..Self::default()
        }
    }

    /// Apply element-level colors on top of the configured appearance.
    ///
    /// Only the channels that are specified override; interaction-state
    /// styles are kept as configured.
    pub fn with_colors(
        base: Option<&LinkStyles>,
        color: Option<Color>,
        background: Option<Color>,
    ) -> Option<LinkStyles> {
        if color.is_none() && background.is_none() {
            return base.cloned();
        }
        let overrides = SpanStyle::with_colors(color, background);
        let mut merged = base.cloned().unwrap_or_default();
        merged.style = Some(match merged.style.take() {
            Some(style) => style.merge(&overrides),
            None => overrides,
        });
        Some(merged)
    }
}

/// Caller-supplied handle attached to every link annotation.
///
/// The converter never invokes it; it is carried so the rendering layer can
/// dispatch link activations. Two listeners are equal when they share the same
/// allocation.
#[derive(Clone)]
pub struct LinkListener(Arc<dyn Fn(&str) + Send + Sync>);

impl LinkListener {
    pub fn new<F>(on_link: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self(Arc::new(on_link))
    }

    /// Invoke the listener with a link target.
    pub fn on_link(&self, url: &str) {
        (self.0)(url)
    }
}

impl PartialEq for LinkListener {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for LinkListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LinkListener(..)")
    }
}

/// Hyperlink range payload.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LinkAnnotation {
    pub url: String,
    pub styles: Option<LinkStyles>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub listener: Option<LinkListener>,
}

/// Converter options for styled output.
#[derive(Clone, Debug, PartialEq)]
pub struct HtmlStyle {
    /// Appearance of `<a>` ranges. `None` leaves links unstyled.
    pub link_styles: Option<LinkStyles>,
    /// Indentation unit for block quotations, definitions and nested lists.
    ///
    /// `0` or NaN disables paragraph styles; indentation is then written as
    /// text instead.
    pub indent_unit: f32,
    /// Honor `color` and `background-color` from inline `style` attributes.
    pub text_color_enabled: bool,
}

impl HtmlStyle {
    /// Whether indentation is expressed through paragraph styles.
    pub fn paragraph_styles_enabled(&self) -> bool {
        !self.indent_unit.is_nan() && self.indent_unit != 0.0
    }
}

impl Default for HtmlStyle {
    fn default() -> Self {
        Self {
            link_styles: Some(LinkStyles::new(SpanStyle {
                text_decoration: Some(TextDecoration::Underline),
                ..SpanStyle::default()
            })),
            indent_unit: 24.0,
            text_color_enabled: false,
        }
    }
}
