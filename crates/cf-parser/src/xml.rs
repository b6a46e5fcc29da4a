use std::collections::BTreeMap;
use std::sync::OnceLock;

use cf_core::{FunnelError, SourceLocation, SourceSpan};
use regex::Regex;
use roxmltree::{Document, Node, NodeType};

#[derive(Debug, Clone, PartialEq)]
pub struct MarkupDocument {
    pub root: MarkupElement,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Element(MarkupElement),
    Text(MarkupText),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkupElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<MarkupNode>,
    pub location: SourceSpan,
}

/// Raw text run; whitespace is kept so inline markup can be re-joined.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupText {
    pub value: String,
    pub location: SourceSpan,
}

impl MarkupElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attribute value with surrounding whitespace removed; blank counts as absent.
    pub fn attr_trimmed(&self, name: &str) -> Option<&str> {
        self.attr(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn elements(&self) -> impl Iterator<Item = &MarkupElement> {
        self.children.iter().filter_map(|child| match child {
            MarkupNode::Element(element) => Some(element),
            MarkupNode::Text(_) => None,
        })
    }

    /// Concatenated descendant text, whitespace collapsed.
    pub fn text_content(&self) -> String {
        let mut raw = String::new();
        collect_text(self, &mut raw);
        collapse_whitespace(&raw).trim().to_string()
    }

    pub fn has_non_blank_text(&self) -> bool {
        self.children.iter().any(|child| match child {
            MarkupNode::Text(text) => !text.value.trim().is_empty(),
            MarkupNode::Element(_) => false,
        })
    }
}

fn collect_text(element: &MarkupElement, out: &mut String) {
    for child in &element.children {
        match child {
            MarkupNode::Text(text) => out.push_str(&text.value),
            MarkupNode::Element(nested) => collect_text(nested, out),
        }
    }
}

/// Folds every whitespace run (including newlines from indentation) into a
/// single space. Leading and trailing space is preserved as one space.
pub fn collapse_whitespace(raw: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let regex = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex must compile"));
    regex.replace_all(raw, " ").into_owned()
}

pub fn parse_markup_document(source: &str) -> Result<MarkupDocument, FunnelError> {
    let document = Document::parse(source)
        .map_err(|error| FunnelError::new("XML_PARSE_ERROR", error.to_string()))?;

    let Some(root) = document.root().children().find(|node| node.is_element()) else {
        return Err(FunnelError::new(
            "XML_PARSE_ERROR",
            "XML document must contain a root element.",
        ));
    };

    Ok(MarkupDocument {
        root: convert_element(&document, root),
    })
}

fn convert_element(document: &Document<'_>, node: Node<'_, '_>) -> MarkupElement {
    let attributes = node
        .attributes()
        .map(|attribute| (attribute.name().to_string(), attribute.value().to_string()))
        .collect::<BTreeMap<_, _>>();

    let mut children = Vec::new();
    for child in node.children() {
        match child.node_type() {
            NodeType::Element => {
                children.push(MarkupNode::Element(convert_element(document, child)))
            }
            NodeType::Text => {
                let value = child.text().unwrap_or_default();
                if value.is_empty() {
                    continue;
                }
                // Adjacent runs (text split by a comment) are merged.
                if let Some(MarkupNode::Text(previous)) = children.last_mut() {
                    previous.value.push_str(value);
                    previous.location.end = span_at(document, child.range().end).end;
                    continue;
                }
                children.push(MarkupNode::Text(MarkupText {
                    value: value.to_string(),
                    location: span_between(document, child.range().start, child.range().end),
                }));
            }
            _ => {}
        }
    }

    MarkupElement {
        name: node.tag_name().name().to_string(),
        attributes,
        children,
        location: span_between(document, node.range().start, node.range().end),
    }
}

fn location_at(document: &Document<'_>, offset: usize) -> SourceLocation {
    let pos = document.text_pos_at(offset);
    SourceLocation {
        line: pos.row as usize,
        column: pos.col as usize,
    }
}

fn span_at(document: &Document<'_>, offset: usize) -> SourceSpan {
    let location = location_at(document, offset);
    SourceSpan {
        start: location.clone(),
        end: location,
    }
}

fn span_between(document: &Document<'_>, start: usize, end: usize) -> SourceSpan {
    SourceSpan {
        start: location_at(document, start),
        end: location_at(document, end),
    }
}
