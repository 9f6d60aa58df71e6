//! MDX front-end: markdown-rs parsing and lowering into [`SourceNode`].

use crate::ast::{JsxAttribute, JsxAttributeValue, SourceKind, SourceNode};
use crate::{MdxError, SourceLocation};
use markdown::MdxSignal;
use markdown::mdast::{AttributeContent, AttributeValue, Node};
use markdown::message::{Message, Place};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parser options for building markdown-rs parse options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    /// Enable MDX constructs (JSX, ESM, expressions).
    pub mdx: bool,
    /// Enable GitHub Flavored Markdown constructs.
    pub gfm: bool,
    /// Enable YAML frontmatter parsing.
    pub frontmatter: bool,
    /// Enable indented code blocks.
    pub code_indented: bool,
    /// Allow raw HTML nodes in the AST.
    pub raw_html: bool,
}

impl ParseOptions {
    /// Markdown-friendly defaults (no MDX).
    pub const fn markdown() -> Self {
        Self {
            mdx: false,
            gfm: true,
            frontmatter: true,
            code_indented: true,
            raw_html: false,
        }
    }

    /// MDX-friendly defaults (JSX/ESM/expression enabled).
    pub const fn mdx() -> Self {
        Self {
            mdx: true,
            gfm: true,
            frontmatter: true,
            code_indented: false,
            raw_html: false,
        }
    }

    /// Convert to markdown-rs `ParseOptions`.
    pub fn to_markdown(self) -> markdown::ParseOptions {
        let mut constructs = markdown::Constructs {
            frontmatter: self.frontmatter,
            code_indented: self.code_indented,
            html_flow: self.raw_html,
            html_text: self.raw_html,
            // `<https://…>` autolinks collide with JSX tags.
            autolink: !self.mdx,
            ..Default::default()
        };

        if self.gfm {
            constructs.gfm_autolink_literal = true;
            constructs.gfm_footnote_definition = true;
            constructs.gfm_label_start_footnote = true;
            constructs.gfm_strikethrough = true;
            constructs.gfm_table = true;
            constructs.gfm_task_list_item = true;
        }

        if self.mdx {
            constructs.mdx_esm = true;
            constructs.mdx_expression_flow = true;
            constructs.mdx_expression_text = true;
            constructs.mdx_jsx_flow = true;
            constructs.mdx_jsx_text = true;
        }

        markdown::ParseOptions {
            constructs,
            // ESM is only recognized when a parser is installed. Blocks are
            // kept verbatim, so accept everything the tokenizer hands over.
            mdx_esm_parse: if self.mdx {
                Some(Box::new(|_: &str| MdxSignal::Ok))
            } else {
                None
            },
            ..markdown::ParseOptions::default()
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::mdx()
    }
}

/// Parse markdown into an MDAST tree using core options.
pub fn parse_mdast(input: &str, options: &ParseOptions) -> Result<Node, MdxError> {
    parse_mdast_with_options(input, &options.to_markdown())
}

/// Parse markdown into an MDAST tree using markdown-rs `ParseOptions`.
pub fn parse_mdast_with_options(
    input: &str,
    options: &markdown::ParseOptions,
) -> Result<Node, MdxError> {
    markdown::to_mdast(input, options).map_err(|err| MdxError::Parse {
        message: err.to_string(),
        location: Some(message_location(&err)),
    })
}

/// Parse MDX text into a [`SourceNode`] tree.
///
/// The tree is rooted at [`SourceKind::Root`]. Reference-style links and
/// images are resolved against the document's definitions, and constructs
/// the editor has no node for (footnotes, definitions) are degraded to text
/// or dropped here.
pub fn parse_source(input: &str, options: &ParseOptions) -> Result<SourceNode, MdxError> {
    let mdast = parse_mdast(input, options)?;
    let mut definitions = HashMap::new();
    collect_definitions(&mdast, &mut definitions);
    let lowerer = Lowerer { definitions };

    let mut lowered = Vec::with_capacity(1);
    lowerer.lower_into(&mdast, &mut lowered);
    match lowered.pop() {
        Some(root) if root.kind == SourceKind::Root => Ok(root),
        _ => Err(MdxError::InternalError(
            "markdown engine did not return a root node".to_string(),
        )),
    }
}

/// Parse MDX text with [`ParseOptions::mdx`].
///
/// ```
/// use mdxblocks_core::{SourceKind, parse_mdx};
///
/// let root = parse_mdx("# Title\n\n<Card title=\"Hi\" />").unwrap();
/// assert!(matches!(root.children[0].kind, SourceKind::Heading { depth: 1 }));
/// assert_eq!(root.children[1].jsx_name(), Some("Card"));
/// ```
pub fn parse_mdx(input: &str) -> Result<SourceNode, MdxError> {
    parse_source(input, &ParseOptions::mdx())
}

fn message_location(message: &Message) -> SourceLocation {
    match &message.place {
        Some(place) => match place.as_ref() {
            Place::Point(point) => SourceLocation::new(point.line, point.column),
            Place::Position(position) => {
                SourceLocation::new(position.start.line, position.start.column)
            }
        },
        None => SourceLocation::new(1, 1),
    }
}

struct Definition {
    url: String,
    title: Option<String>,
}

fn collect_definitions(node: &Node, definitions: &mut HashMap<String, Definition>) {
    if let Node::Definition(definition) = node {
        // First definition wins, as in CommonMark.
        definitions
            .entry(definition.identifier.clone())
            .or_insert_with(|| Definition {
                url: definition.url.clone(),
                title: definition.title.clone(),
            });
    }
    if let Some(children) = node.children() {
        for child in children {
            collect_definitions(child, definitions);
        }
    }
}

struct Lowerer {
    definitions: HashMap<String, Definition>,
}

impl Lowerer {
    fn lower_children(&self, node: &Node) -> Vec<SourceNode> {
        let mut out = Vec::new();
        if let Some(children) = node.children() {
            for child in children {
                self.lower_into(child, &mut out);
            }
        }
        out
    }

    fn lower_into(&self, node: &Node, out: &mut Vec<SourceNode>) {
        let location = node
            .position()
            .map(|position| SourceLocation::new(position.start.line, position.start.column));
        let branch = |kind: SourceKind| {
            SourceNode::with_children(kind, self.lower_children(node)).at(location.clone())
        };
        let leaf = |kind: SourceKind| SourceNode::new(kind).at(location.clone());

        let lowered = match node {
            Node::Root(_) => branch(SourceKind::Root),
            Node::Yaml(yaml) => leaf(SourceKind::Frontmatter {
                value: yaml.value.clone(),
            }),
            Node::MdxjsEsm(esm) => leaf(SourceKind::Esm {
                value: esm.value.clone(),
            }),
            Node::Heading(heading) => branch(SourceKind::Heading {
                depth: heading.depth,
            }),
            Node::Paragraph(_) => branch(SourceKind::Paragraph),
            Node::Blockquote(_) => branch(SourceKind::Blockquote),
            Node::List(list) => branch(SourceKind::List {
                ordered: list.ordered,
                start: list.start,
            }),
            Node::ListItem(item) => branch(SourceKind::ListItem {
                checked: item.checked,
            }),
            Node::Code(code) => leaf(SourceKind::Code {
                value: code.value.clone(),
                lang: code.lang.clone(),
                meta: code.meta.clone(),
            }),
            Node::Math(math) => leaf(SourceKind::Code {
                value: math.value.clone(),
                lang: Some("math".to_string()),
                meta: math.meta.clone(),
            }),
            Node::Image(image) => leaf(SourceKind::Image {
                url: image.url.clone(),
                alt: image.alt.clone(),
                title: image.title.clone(),
            }),
            Node::ImageReference(reference) => match self.definitions.get(&reference.identifier) {
                Some(definition) => leaf(SourceKind::Image {
                    url: definition.url.clone(),
                    alt: reference.alt.clone(),
                    title: definition.title.clone(),
                }),
                None => leaf(SourceKind::Text {
                    value: reference.alt.clone(),
                }),
            },
            Node::ThematicBreak(_) => leaf(SourceKind::ThematicBreak),
            Node::Table(_) => branch(SourceKind::Table),
            Node::TableRow(_) => branch(SourceKind::TableRow),
            Node::TableCell(_) => branch(SourceKind::TableCell),
            Node::MdxJsxFlowElement(element) => branch(SourceKind::JsxElement {
                name: element.name.clone(),
                attributes: lower_attributes(&element.attributes),
                inline: false,
            }),
            Node::MdxJsxTextElement(element) => branch(SourceKind::JsxElement {
                name: element.name.clone(),
                attributes: lower_attributes(&element.attributes),
                inline: true,
            }),
            Node::Text(text) => leaf(SourceKind::Text {
                value: text.value.clone(),
            }),
            Node::Strong(_) => branch(SourceKind::Strong),
            Node::Emphasis(_) => branch(SourceKind::Emphasis),
            Node::Delete(_) => branch(SourceKind::Delete),
            Node::InlineCode(code) => leaf(SourceKind::InlineCode {
                value: code.value.clone(),
            }),
            Node::InlineMath(math) => leaf(SourceKind::InlineCode {
                value: math.value.clone(),
            }),
            Node::Link(link) => branch(SourceKind::Link {
                url: link.url.clone(),
                title: link.title.clone(),
            }),
            Node::LinkReference(reference) => match self.definitions.get(&reference.identifier) {
                Some(definition) => branch(SourceKind::Link {
                    url: definition.url.clone(),
                    title: definition.title.clone(),
                }),
                None => {
                    // Unresolved: keep the bracketed text as written.
                    out.push(leaf(SourceKind::Text {
                        value: "[".to_string(),
                    }));
                    out.extend(self.lower_children(node));
                    out.push(leaf(SourceKind::Text {
                        value: "]".to_string(),
                    }));
                    return;
                }
            },
            Node::Break(_) => leaf(SourceKind::Break),
            Node::Html(html) => leaf(SourceKind::Html {
                value: html.value.clone(),
            }),
            Node::MdxFlowExpression(expression) => leaf(SourceKind::Expression {
                value: expression.value.clone(),
                inline: false,
            }),
            Node::MdxTextExpression(expression) => leaf(SourceKind::Expression {
                value: expression.value.clone(),
                inline: true,
            }),
            Node::FootnoteReference(reference) => leaf(SourceKind::Text {
                value: format!(
                    "[^{}]",
                    reference.label.as_deref().unwrap_or(&reference.identifier)
                ),
            }),
            Node::FootnoteDefinition(definition) => {
                let marker = format!(
                    "[^{}]: ",
                    definition.label.as_deref().unwrap_or(&definition.identifier)
                );
                let mut children = self.lower_children(node);
                match children.first_mut() {
                    Some(first) if first.kind == SourceKind::Paragraph => {
                        first.children.insert(0, SourceNode::text(marker));
                    }
                    _ => children.insert(
                        0,
                        SourceNode::with_children(
                            SourceKind::Paragraph,
                            vec![SourceNode::text(marker.trim_end())],
                        )
                        .at(location.clone()),
                    ),
                }
                out.extend(children);
                return;
            }
            Node::Definition(_) => return,
            other => {
                log::debug!("dropping unsupported markdown node: {other:?}");
                return;
            }
        };
        out.push(lowered);
    }
}

fn lower_attributes(attributes: &[AttributeContent]) -> Vec<JsxAttribute> {
    attributes
        .iter()
        .filter_map(|attribute| match attribute {
            AttributeContent::Property(property) => Some(JsxAttribute {
                name: property.name.clone(),
                value: match &property.value {
                    Some(AttributeValue::Literal(value)) => {
                        JsxAttributeValue::Literal(value.clone())
                    }
                    Some(AttributeValue::Expression(expression)) => {
                        JsxAttributeValue::Expression(expression.value.clone())
                    }
                    None => JsxAttributeValue::Shorthand,
                },
            }),
            AttributeContent::Expression(spread) => {
                log::debug!("skipping spread attribute {{{}}}", spread.value);
                None
            }
        })
        .collect()
}
