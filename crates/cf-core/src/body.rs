use serde::{Deserialize, Serialize};

/// One run of inline message markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BodySpan {
    Plain { text: String },
    Strong { text: String },
    Emphasis { text: String },
    Heading { text: String },
    Break,
}

impl BodySpan {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain { text }
            | Self::Strong { text }
            | Self::Emphasis { text }
            | Self::Heading { text } => text.as_str(),
            Self::Break => "",
        }
    }
}

/// Renderable content of a bot message. Opaque to the sequencer; only the
/// step renderer looks inside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub spans: Vec<BodySpan>,
}

impl MessageBody {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            spans: vec![BodySpan::Plain { text: text.into() }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|span| span.text().trim().is_empty())
    }

    pub fn plain_text(&self) -> String {
        self.lines()
            .iter()
            .map(|line| line.iter().map(BodySpan::text).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Splits the body into visual lines. Headings always sit on a line of
    /// their own; `Break` ends the current line.
    pub fn lines(&self) -> Vec<Vec<BodySpan>> {
        let mut lines = Vec::new();
        let mut current: Vec<BodySpan> = Vec::new();

        for span in &self.spans {
            match span {
                BodySpan::Break => {
                    lines.push(std::mem::take(&mut current));
                }
                BodySpan::Heading { .. } => {
                    if !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                    }
                    lines.push(vec![span.clone()]);
                }
                _ => current.push(span.clone()),
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}
