mod xml;

pub use xml::{
    collapse_whitespace, parse_markup_document, MarkupDocument, MarkupElement, MarkupNode,
    MarkupText,
};
