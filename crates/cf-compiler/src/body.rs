use cf_core::{BodySpan, FunnelError, MessageBody};
use cf_parser::{collapse_whitespace, MarkupElement, MarkupNode};

/// Inline markup of a `<message>`: text, `<b>`/`<strong>`, `<em>`/`<i>`,
/// `<h>` and `<br/>`.
pub(crate) fn compile_message_body(node: &MarkupElement) -> Result<MessageBody, FunnelError> {
    let mut spans = Vec::new();

    for child in &node.children {
        match child {
            MarkupNode::Text(text) => spans.push(BodySpan::Plain {
                text: collapse_whitespace(&text.value),
            }),
            MarkupNode::Element(element) => {
                let text = element.text_content();
                let span = match element.name.as_str() {
                    "b" | "strong" => BodySpan::Strong { text },
                    "em" | "i" => BodySpan::Emphasis { text },
                    "h" => BodySpan::Heading { text },
                    "br" => BodySpan::Break,
                    other => {
                        return Err(FunnelError::with_span(
                            "FUNNEL_UNKNOWN_ELEMENT",
                            format!(
                                "<{}> is not allowed inside <{}>. Use b, strong, em, i, h or br.",
                                other, node.name
                            ),
                            element.location.clone(),
                        ))
                    }
                };
                spans.push(span);
            }
        }
    }

    let body = MessageBody {
        spans: trim_line_edges(spans),
    };
    if body.is_empty() {
        return Err(FunnelError::with_span(
            "FUNNEL_EMPTY_CONTENT",
            format!("<{}> requires non-empty content.", node.name),
            node.location.clone(),
        ));
    }
    Ok(body)
}

/// Strips indentation whitespace where a plain run touches a line edge
/// (start, end, `<br/>` or heading) and drops runs left empty.
fn trim_line_edges(spans: Vec<BodySpan>) -> Vec<BodySpan> {
    let is_edge = |span: Option<&BodySpan>| {
        matches!(
            span,
            None | Some(BodySpan::Break) | Some(BodySpan::Heading { .. })
        )
    };

    let mut out = Vec::with_capacity(spans.len());
    for (index, span) in spans.iter().enumerate() {
        let BodySpan::Plain { text } = span else {
            out.push(span.clone());
            continue;
        };
        let previous = index.checked_sub(1).and_then(|i| spans.get(i));
        let next = spans.get(index + 1);

        let mut trimmed = text.as_str();
        if is_edge(previous) {
            trimmed = trimmed.trim_start();
        }
        if is_edge(next) {
            trimmed = trimmed.trim_end();
        }
        if trimmed.is_empty() {
            continue;
        }
        out.push(BodySpan::Plain {
            text: trimmed.to_string(),
        });
    }
    out
}

#[cfg(test)]
mod body_tests {
    use super::*;
    use cf_parser::parse_markup_document;

    fn body(source: &str) -> Result<MessageBody, FunnelError> {
        let document = parse_markup_document(source).expect("xml should parse");
        compile_message_body(&document.root)
    }

    #[test]
    fn inline_markup_becomes_spans() {
        let compiled = body(
            r#"<message>
                Gue <b>Luthfi</b>. Mahasiswa <em>Teknik</em>
            </message>"#,
        )
        .expect("body should compile");
        assert_eq!(
            compiled.spans,
            vec![
                BodySpan::Plain {
                    text: "Gue ".to_string()
                },
                BodySpan::Strong {
                    text: "Luthfi".to_string()
                },
                BodySpan::Plain {
                    text: ". Mahasiswa ".to_string()
                },
                BodySpan::Emphasis {
                    text: "Teknik".to_string()
                },
            ]
        );
    }

    #[test]
    fn heading_lines_are_trimmed_around() {
        let compiled = body(
            r#"<message>
                <h>1. Hidden Gold Mining</h>
                Kita gali <strong>skill unik</strong>.
            </message>"#,
        )
        .expect("body should compile");
        assert_eq!(
            compiled.plain_text(),
            "1. Hidden Gold Mining\nKita gali skill unik."
        );
    }

    #[test]
    fn unknown_inline_element_is_rejected() {
        let error = body(r#"<message>Hi <span>x</span></message>"#).expect_err("span");
        assert_eq!(error.code, "FUNNEL_UNKNOWN_ELEMENT");
    }

    #[test]
    fn blank_message_is_rejected() {
        let error = body("<message>   </message>").expect_err("blank");
        assert_eq!(error.code, "FUNNEL_EMPTY_CONTENT");
    }
}
