//! Terminal-agnostic rendering of transcript entries.

use serde::{Deserialize, Serialize};

use crate::types::{ActionStyle, PhaseId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ElementKind {
    BotBubble { emphasized: bool },
    UserEcho,
    OptionList,
    ActionButton { style: ActionStyle },
    ImageCarousel,
    TestimonialCarousel,
    ValueBreakdown,
    PricingOffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStyle {
    Body,
    Strong,
    Emphasis,
    Heading,
    Muted,
    Accent,
    Price,
    Struck,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledRun {
    pub text: String,
    pub style: RunStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedLine {
    pub runs: Vec<StyledRun>,
}

impl RenderedLine {
    pub fn styled(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            runs: vec![StyledRun {
                text: text.into(),
                style,
            }],
        }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn width(&self) -> usize {
        self.runs.iter().map(|run| run.text.chars().count()).sum()
    }
}

/// What activating a control asks the player to do. Renderers copy these
/// verbatim from the bindings they are given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Binding {
    #[serde(rename_all = "camelCase")]
    Choose { option_id: String },
    Action { target: Option<PhaseId> },
    OpenLink { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub label: String,
    pub sublabel: Option<String>,
    pub icon: Option<String>,
    pub binding: Binding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedElement {
    pub kind: ElementKind,
    pub lines: Vec<RenderedLine>,
    /// Carousel pages; empty for non-paged elements.
    pub pages: Vec<Vec<RenderedLine>>,
    pub controls: Vec<Control>,
}

impl RenderedElement {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            lines: Vec::new(),
            pages: Vec::new(),
            controls: Vec::new(),
        }
    }

    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(RenderedLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn page(&self, index: usize) -> &[RenderedLine] {
        self.pages.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows the element occupies when wrapped to `width` columns with the
    /// given carousel page showing.
    pub fn row_count(&self, width: usize, page: usize) -> usize {
        let width = width.max(1);
        let wrapped = |line: &RenderedLine| line.width().max(1).div_ceil(width);
        let body = self.lines.iter().map(wrapped).sum::<usize>();
        let paged = self.page(page).iter().map(wrapped).sum::<usize>();
        let controls = self
            .controls
            .iter()
            .map(|control| 1 + usize::from(control.sublabel.is_some()))
            .sum::<usize>();
        body + paged + controls
    }
}

#[cfg(test)]
mod element_tests {
    use super::*;

    #[test]
    fn row_count_wraps_lines_and_counts_controls() {
        let mut element = RenderedElement::new(ElementKind::OptionList);
        element
            .lines
            .push(RenderedLine::styled("0123456789", RunStyle::Body));
        element.controls.push(Control {
            label: "A".to_string(),
            sublabel: Some("more".to_string()),
            icon: None,
            binding: Binding::Choose {
                option_id: "a".to_string(),
            },
        });
        assert_eq!(element.row_count(4, 0), 3 + 2);
        assert_eq!(element.row_count(80, 0), 1 + 2);
    }

    #[test]
    fn missing_page_renders_nothing() {
        let mut element = RenderedElement::new(ElementKind::ImageCarousel);
        element
            .pages
            .push(vec![RenderedLine::styled("slide", RunStyle::Body)]);
        assert_eq!(element.page(0).len(), 1);
        assert!(element.page(3).is_empty());
        assert_eq!(element.row_count(10, 0), 1);
    }
}
