//! Editor document → MDX text.
//!
//! The output is canonical rather than a copy of whatever source the
//! document came from: `**` for bold, `*` for italic, `-` bullets, fenced
//! code, `***` rules, one blank line between blocks and a single trailing
//! newline. Text is escaped so that parsing the output gives the same
//! document back.

mod components;
mod inline;
mod table;

use crate::model::{DocumentNode, NodeKind, SchemaViolation};
use crate::registry::{Catalogue, ComponentRule, catalogue};
use inline::{Inline, destination, escape_text, fence_for, write_inline};
use mdxblocks_core::{FrontmatterError, render_frontmatter};
use serde_json::Value;
use thiserror::Error;

/// Why a document could not be written.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// The root is not a `doc` node.
    #[error("expected a `doc` node at the root, found `{0}`")]
    NotADocument(NodeKind),
    /// The tree breaks a content rule.
    #[error("invalid document: {0}")]
    Schema(#[from] SchemaViolation),
    /// `attrs.frontmatter` cannot be written as YAML.
    #[error("invalid frontmatter: {0}")]
    Frontmatter(#[from] FrontmatterError),
}

/// Writes a document as MDX with the built-in catalogue.
///
/// ```
/// use mdxblocks_editor::model::{DocumentNode, NodeKind};
/// use mdxblocks_editor::serialize::serialize;
///
/// let doc = DocumentNode::with_content(
///     NodeKind::Doc,
///     vec![DocumentNode::paragraph(vec![DocumentNode::text("Hello")])],
/// );
/// assert_eq!(serialize(&doc).unwrap(), "Hello\n");
/// ```
pub fn serialize(doc: &DocumentNode) -> Result<String, SerializeError> {
    serialize_with(doc, catalogue())
}

/// Writes a document as MDX using `catalogue` for component blocks.
pub fn serialize_with(doc: &DocumentNode, catalogue: &Catalogue) -> Result<String, SerializeError> {
    if doc.kind != NodeKind::Doc {
        return Err(SerializeError::NotADocument(doc.kind));
    }
    doc.check_schema()?;

    let serializer = Serializer { catalogue };
    let mut parts = Vec::new();
    if let Some(frontmatter) = doc.attrs.get("frontmatter")
        && let Some(yaml) = render_frontmatter(frontmatter)?
    {
        parts.push(format!("---\n{yaml}---"));
    }
    if let Some(Value::Array(blocks)) = doc.attrs.get("esm") {
        parts.extend(
            blocks
                .iter()
                .filter_map(Value::as_str)
                .map(|block| block.trim_end().to_string())
                .filter(|block| !block.is_empty()),
        );
    }
    let body = serializer.blocks(&doc.content);
    if !body.is_empty() {
        parts.push(body);
    }

    if parts.is_empty() {
        return Ok(String::new());
    }
    let mut out = parts.join("\n\n");
    out.push('\n');
    Ok(out)
}

/// Lists that would merge with a preceding list of the same group when
/// only a blank line separates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListGroup {
    Bullet,
    Ordered,
}

fn list_group(kind: NodeKind) -> Option<ListGroup> {
    match kind {
        NodeKind::BulletList | NodeKind::TaskList => Some(ListGroup::Bullet),
        NodeKind::OrderedList => Some(ListGroup::Ordered),
        _ => None,
    }
}

/// Prefixes the first line with `first` and the others with `rest`.
/// Blank lines stay blank.
fn prefix_lines(text: &str, first: &str, rest: &str) -> String {
    if text.is_empty() {
        return first.trim_end().to_string();
    }
    text.split('\n')
        .enumerate()
        .map(|(index, line)| match (index, line.is_empty()) {
            (0, _) => format!("{first}{line}"),
            (_, true) => String::new(),
            _ => format!("{rest}{line}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `import`/`export` opening a paragraph would be read as ESM.
fn guard_esm_keyword(text: String) -> String {
    for (keyword, reference) in [("import", "&#105;"), ("export", "&#101;")] {
        if let Some(rest) = text.strip_prefix(keyword)
            && rest.chars().next().is_none_or(char::is_whitespace)
        {
            return format!("{reference}{}", &text[1..]);
        }
    }
    text
}

struct Serializer<'a> {
    catalogue: &'a Catalogue,
}

impl Serializer<'_> {
    /// Blocks separated by a blank line. Adjacent lists of the same group
    /// alternate markers so they stay separate lists.
    fn blocks(&self, nodes: &[DocumentNode]) -> String {
        let mut parts = Vec::new();
        let mut previous_list: Option<(ListGroup, bool)> = None;
        for node in nodes {
            let group = list_group(node.kind);
            let text = match group {
                Some(group) => {
                    let alternate = matches!(previous_list, Some((previous, alternate)) if previous == group && !alternate);
                    let text = self.list(node, alternate);
                    previous_list = Some((group, alternate));
                    text
                }
                None => {
                    let text = self.block(node);
                    if !text.is_empty() {
                        previous_list = None;
                    }
                    text
                }
            };
            if !text.is_empty() {
                parts.push(text);
            }
        }
        parts.join("\n\n")
    }

    fn block(&self, node: &DocumentNode) -> String {
        match node.kind {
            NodeKind::Paragraph => {
                guard_esm_keyword(write_inline(&node.content, Inline::Paragraph))
            }
            NodeKind::Heading => heading(node),
            NodeKind::Blockquote => prefix_lines(&self.blocks(&node.content), "> ", "> ")
                .split('\n')
                .map(|line| if line.is_empty() { ">" } else { line })
                .collect::<Vec<_>>()
                .join("\n"),
            NodeKind::BulletList | NodeKind::OrderedList | NodeKind::TaskList => {
                self.list(node, false)
            }
            NodeKind::ListItem | NodeKind::TaskItem => self.blocks(&node.content),
            NodeKind::CodeBlock => code_block(node),
            NodeKind::ImageBlock => self.image(node),
            NodeKind::HorizontalRule => "***".to_string(),
            NodeKind::TableBlock => self.table(node),
            NodeKind::Doc | NodeKind::Text | NodeKind::HardBreak => {
                log::debug!("`{}` is not a block, skipped", node.kind);
                String::new()
            }
            kind => match self.rule_for(node) {
                Some(rule) => self.component(node, rule),
                None => {
                    log::warn!("no component writes `{kind}`, skipped");
                    String::new()
                }
            },
        }
    }

    /// Rule whose presets match the node, otherwise a fallback for the kind.
    fn rule_for(&self, node: &DocumentNode) -> Option<&ComponentRule> {
        self.catalogue.rule_for_node(node).or_else(|| match node.kind {
            NodeKind::InfoBlock => {
                log::debug!("callout type {:?} is unknown, written as <Info>", node.attrs.get("type"));
                self.catalogue.rule("Info")
            }
            kind => self.catalogue.rule_for_kind(kind),
        })
    }

    fn list(&self, node: &DocumentNode, alternate: bool) -> String {
        let bullet = if alternate { "*" } else { "-" };
        let delimiter = if alternate { ')' } else { '.' };
        let start = node.attr_u64("start").unwrap_or(1);

        node.content
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let body = self.blocks(&item.content);
                match node.kind {
                    NodeKind::OrderedList => {
                        let marker = format!("{}{delimiter}", start.saturating_add(index as u64));
                        prefix_lines(&body, &format!("{marker} "), &" ".repeat(marker.len() + 1))
                    }
                    NodeKind::TaskList => {
                        let check = if item.attr_bool("checked") == Some(true) { 'x' } else { ' ' };
                        // An item marker needs text after it to count as a task.
                        let body = if body.is_empty() { "&#32;".to_string() } else { body };
                        prefix_lines(&body, &format!("{bullet} [{check}] "), "  ")
                    }
                    _ => prefix_lines(&body, &format!("{bullet} "), "  "),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn image(&self, node: &DocumentNode) -> String {
        let markdown = node.attrs.contains_key("src")
            && node
                .attrs
                .iter()
                .all(|(key, value)| matches!(key.as_str(), "src" | "alt" | "title") && value.is_string());
        if !markdown && let Some(rule) = self.catalogue.rule("img") {
            return self.component(node, rule);
        }
        let alt = escape_text(node.attr_str("alt").unwrap_or_default(), false, false, false);
        let src = destination(node.attr_str("src").unwrap_or_default());
        match node.attr_str("title") {
            Some(title) => format!(
                "![{alt}]({src} \"{}\")",
                title.replace('\\', "\\\\").replace('"', "\\\"")
            ),
            None => format!("![{alt}]({src})"),
        }
    }
}

fn heading(node: &DocumentNode) -> String {
    let level = node.attr_u64("level").unwrap_or(1).clamp(1, 6) as usize;
    let hashes = "#".repeat(level);
    let mut text = write_inline(&node.content, Inline::Heading);
    if text.is_empty() {
        return hashes;
    }
    if text.contains('\n') {
        match level {
            1 => return format!("{text}\n==="),
            2 => return format!("{text}\n---"),
            _ => text = text.replace('\n', " "),
        }
    }
    if let Some(stem) = text.strip_suffix('#') {
        let slashes = stem.len() - stem.trim_end_matches('\\').len();
        if slashes % 2 == 0 {
            text = format!("{stem}\\#");
        }
    }
    format!("{hashes} {text}")
}

fn code_block(node: &DocumentNode) -> String {
    let code = node.text_content();
    let fence = fence_for(&code, '`', 3);
    let mut info = node.attr_str("language").unwrap_or_default().to_string();
    if let Some(meta) = node.attr_str("meta")
        && !info.is_empty()
        && !meta.is_empty()
    {
        info.push(' ');
        info.push_str(meta);
    }
    if code.is_empty() {
        format!("{fence}{info}\n{fence}")
    } else {
        format!("{fence}{info}\n{code}\n{fence}")
    }
}
