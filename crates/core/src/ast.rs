//! Generic MDX syntax tree produced by [`crate::parse`].
//!
//! The tree is deliberately thin: it keeps what the markdown engine reported
//! and nothing the editor layer invents. Link and image references are
//! already resolved and unsupported constructs already degraded to text by
//! the time a [`SourceNode`] exists.

use crate::SourceLocation;
use serde::Serialize;

/// A JSX attribute as written in the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsxAttribute {
    /// Attribute name.
    pub name: String,
    /// Raw attribute value.
    pub value: JsxAttributeValue,
}

/// The three ways an attribute value can be written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum JsxAttributeValue {
    /// `name="value"` or `name='value'`
    Literal(String),
    /// `name={expression}`, holding the text between the braces
    Expression(String),
    /// `name` with no value
    Shorthand,
}

/// Node kinds of the source tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SourceKind {
    /// Document root.
    Root,
    /// YAML frontmatter body.
    Frontmatter {
        /// Raw YAML between the fences
        value: String,
    },
    /// Top-level `import`/`export` block.
    Esm {
        /// Raw block text
        value: String,
    },
    /// ATX or setext heading.
    Heading {
        /// 1 to 6
        depth: u8,
    },
    /// Paragraph.
    Paragraph,
    /// Block quote.
    Blockquote,
    /// Bullet or ordered list.
    List {
        /// Whether the list is numbered
        ordered: bool,
        /// Start number of an ordered list
        start: Option<u32>,
    },
    /// List item; `checked` is set for GFM task items.
    ListItem {
        /// Task state, when the item has a `[ ]`/`[x]` marker
        checked: Option<bool>,
    },
    /// Fenced code.
    Code {
        /// Code body
        value: String,
        /// Info string language
        lang: Option<String>,
        /// Rest of the info string
        meta: Option<String>,
    },
    /// Image, inline or resolved from a reference.
    Image {
        /// Image URL
        url: String,
        /// Alternative text
        alt: String,
        /// Optional title
        title: Option<String>,
    },
    /// Thematic break.
    ThematicBreak,
    /// GFM table.
    Table,
    /// GFM table row.
    TableRow,
    /// GFM table cell.
    TableCell,
    /// JSX element; `name` is `None` for fragments.
    JsxElement {
        /// Tag name
        name: Option<String>,
        /// Attributes in source order
        attributes: Vec<JsxAttribute>,
        /// Whether the element appeared inside a line of text
        inline: bool,
    },
    /// Text.
    Text {
        /// Text content
        value: String,
    },
    /// Strong emphasis.
    Strong,
    /// Emphasis.
    Emphasis,
    /// GFM strikethrough.
    Delete,
    /// Code span.
    InlineCode {
        /// Code content
        value: String,
    },
    /// Link, inline or resolved from a reference.
    Link {
        /// Destination
        url: String,
        /// Optional title
        title: Option<String>,
    },
    /// Hard line break.
    Break,
    /// Raw HTML that the engine passed through.
    Html {
        /// Raw text
        value: String,
    },
    /// `{expression}` at flow or text level.
    Expression {
        /// Text between the braces
        value: String,
        /// Whether it appeared inside a line of text
        inline: bool,
    },
}

impl SourceKind {
    /// Leaf kinds never carry children.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            SourceKind::Text { .. }
                | SourceKind::InlineCode { .. }
                | SourceKind::ThematicBreak
                | SourceKind::Break
                | SourceKind::Code { .. }
                | SourceKind::Image { .. }
                | SourceKind::Html { .. }
                | SourceKind::Expression { .. }
                | SourceKind::Frontmatter { .. }
                | SourceKind::Esm { .. }
        )
    }

    /// Phrasing-level kinds, the ones that live inside a line of text.
    pub fn is_inline(&self) -> bool {
        match self {
            SourceKind::Text { .. }
            | SourceKind::Strong
            | SourceKind::Emphasis
            | SourceKind::Delete
            | SourceKind::InlineCode { .. }
            | SourceKind::Link { .. }
            | SourceKind::Break
            | SourceKind::Image { .. }
            | SourceKind::Html { .. } => true,
            SourceKind::JsxElement { inline, .. } | SourceKind::Expression { inline, .. } => {
                *inline
            }
            _ => false,
        }
    }
}

/// A node of the source tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceNode {
    /// What the node is.
    #[serde(flatten)]
    pub kind: SourceKind,
    /// Children in document order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SourceNode>,
    /// Start of the node in the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl SourceNode {
    /// Create a childless node.
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            location: None,
        }
    }

    /// Create a node with children.
    pub fn with_children(kind: SourceKind, children: Vec<SourceNode>) -> Self {
        Self {
            kind,
            children,
            location: None,
        }
    }

    /// Create a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(SourceKind::Text {
            value: value.into(),
        })
    }

    /// Attach a source location.
    pub fn at(mut self, location: Option<SourceLocation>) -> Self {
        self.location = location;
        self
    }

    /// Tag name when this node is a named JSX element.
    pub fn jsx_name(&self) -> Option<&str> {
        match &self.kind {
            SourceKind::JsxElement { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    /// Whether this node is a JSX fragment (`<>…</>`).
    pub fn is_fragment(&self) -> bool {
        matches!(self.kind, SourceKind::JsxElement { name: None, .. })
    }

    /// Whether this node is text made only of whitespace.
    pub fn is_whitespace_text(&self) -> bool {
        matches!(&self.kind, SourceKind::Text { value } if value.trim().is_empty())
    }

    /// Whether every child is phrasing content.
    pub fn has_inline_children(&self) -> bool {
        self.children.iter().all(|child| child.kind.is_inline())
    }

    /// Flattened text content. Block children are joined with a blank line,
    /// hard breaks become a newline.
    ///
    /// ```
    /// use mdxblocks_core::parse_mdx;
    ///
    /// let root = parse_mdx("Hello *there*\n\nsecond").unwrap();
    /// assert_eq!(root.plain_text(), "Hello there\n\nsecond");
    /// ```
    pub fn plain_text(&self) -> String {
        match &self.kind {
            SourceKind::Text { value }
            | SourceKind::InlineCode { value }
            | SourceKind::Html { value }
            | SourceKind::Code { value, .. } => value.clone(),
            SourceKind::Image { alt, .. } => alt.clone(),
            SourceKind::Break => "\n".to_string(),
            SourceKind::Expression { value, .. } => format!("{{{value}}}"),
            SourceKind::Frontmatter { .. } | SourceKind::Esm { .. } | SourceKind::ThematicBreak => {
                String::new()
            }
            _ if self.has_inline_children() => {
                self.children.iter().map(SourceNode::plain_text).collect()
            }
            _ => self
                .children
                .iter()
                .map(SourceNode::plain_text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_mixes_inline_and_block() {
        let node = SourceNode::with_children(
            SourceKind::JsxElement {
                name: Some("Label".into()),
                attributes: vec![],
                inline: false,
            },
            vec![
                SourceNode::with_children(SourceKind::Paragraph, vec![SourceNode::text("One")]),
                SourceNode::with_children(
                    SourceKind::Paragraph,
                    vec![
                        SourceNode::text("Two"),
                        SourceNode::new(SourceKind::Break),
                        SourceNode::text("Three"),
                    ],
                ),
            ],
        );
        assert_eq!(node.plain_text(), "One\n\nTwo\nThree");
    }

    #[test]
    fn test_inline_classification() {
        let inline_jsx = SourceKind::JsxElement {
            name: Some("u".into()),
            attributes: vec![],
            inline: true,
        };
        let flow_jsx = SourceKind::JsxElement {
            name: Some("Card".into()),
            attributes: vec![],
            inline: false,
        };
        assert!(inline_jsx.is_inline());
        assert!(!flow_jsx.is_inline());
        assert!(SourceKind::Break.is_leaf());
        assert!(!SourceKind::Paragraph.is_leaf());
    }

    #[test]
    fn test_whitespace_text() {
        assert!(SourceNode::text(" \n ").is_whitespace_text());
        assert!(!SourceNode::text(" a ").is_whitespace_text());
        assert!(!SourceNode::new(SourceKind::Break).is_whitespace_text());
    }
}
