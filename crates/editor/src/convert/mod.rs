//! Source tree → editor document conversion.
//!
//! The walk is depth-first and keeps source order. Block structure is decided
//! here: paragraphs are split around images and inline-written components,
//! blockquotes become callouts when they open with a `[!TYPE]` marker, and
//! lists with task items become task lists. Components are dispatched through
//! the catalogue in [`components`], inline content is handled in [`inline`].

mod components;
mod context;
mod inline;
mod table;

pub use context::{Context, Scope};
pub use table::parse_header_label;

use crate::model::{DocumentNode, NodeKind};
use crate::registry::{Catalogue, catalogue};
use mdxblocks_core::{
    FrontmatterError, MdxError, ParseDiagnostics, SourceKind, SourceLocation, SourceNode,
    parse_frontmatter,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static CALLOUT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\[!(tip|info|warning|note|danger)\]\s*").unwrap());

/// A converted document and what was noticed on the way.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The `doc` node.
    pub document: DocumentNode,
    /// Non-fatal findings.
    pub diagnostics: ParseDiagnostics,
}

/// Converts a source tree with the built-in catalogue.
pub fn convert(root: &SourceNode) -> Result<Conversion, MdxError> {
    convert_with(root, catalogue())
}

/// Converts a source tree with a given catalogue.
///
/// Fails only when the frontmatter block is not a valid YAML mapping; every
/// other problem is recorded as a warning.
pub fn convert_with(root: &SourceNode, catalogue: &Catalogue) -> Result<Conversion, MdxError> {
    let mut ctx = Context::new(catalogue);
    let mut document = DocumentNode::new(NodeKind::Doc);
    let mut esm = Vec::new();

    for child in &root.children {
        match &child.kind {
            SourceKind::Frontmatter { value } => {
                let frontmatter = parse_frontmatter(value).map_err(|source| {
                    MdxError::Frontmatter {
                        location: frontmatter_location(child.location.as_ref(), &source),
                        source,
                    }
                })?;
                if frontmatter.as_object().is_some_and(|map| !map.is_empty()) {
                    document
                        .attrs
                        .insert("frontmatter".to_string(), frontmatter);
                }
            }
            SourceKind::Esm { value } => esm.push(Value::String(value.clone())),
            _ => document.content.extend(convert_block(child, &mut ctx)),
        }
    }

    if !esm.is_empty() {
        document.attrs.insert("esm".to_string(), Value::Array(esm));
    }
    if document.content.is_empty() {
        document.content.push(DocumentNode::paragraph(Vec::new()));
    }
    Ok(Conversion {
        document,
        diagnostics: ctx.finish(),
    })
}

fn frontmatter_location(
    block: Option<&SourceLocation>,
    error: &FrontmatterError,
) -> Option<SourceLocation> {
    let block = block?;
    // The YAML body starts on the line after the opening fence.
    Some(match error.line() {
        Some(line) => SourceLocation::new(block.line + line, 1),
        None => SourceLocation::new(block.line + 1, 1),
    })
}

pub(crate) fn convert_block(node: &SourceNode, ctx: &mut Context<'_>) -> Vec<DocumentNode> {
    match &node.kind {
        SourceKind::Root => convert_blocks(&node.children, ctx),
        SourceKind::Heading { depth } => vec![
            DocumentNode::with_content(
                NodeKind::Heading,
                inline::convert_inline(node.children.iter(), ctx),
            )
            .attr("level", *depth),
        ],
        SourceKind::Paragraph => convert_run(&node.children.iter().collect::<Vec<_>>(), ctx),
        SourceKind::Blockquote => vec![convert_blockquote(node, ctx)],
        SourceKind::List { ordered, start } => vec![convert_list(node, *ordered, *start, ctx)],
        SourceKind::ListItem { .. } => convert_blocks(&node.children, ctx),
        SourceKind::Code { value, lang, meta } => vec![code_block(value, lang, meta)],
        SourceKind::Image { url, alt, title } => vec![image_block(url, alt, title.as_deref())],
        SourceKind::ThematicBreak => vec![DocumentNode::new(NodeKind::HorizontalRule)],
        SourceKind::Table => vec![table::from_markdown(node)],
        SourceKind::JsxElement { .. } => components::convert_jsx(node, ctx),
        SourceKind::Expression { value, .. } if inline::is_comment_only(value) => Vec::new(),
        SourceKind::Frontmatter { .. } | SourceKind::Esm { .. } => {
            log::debug!("ignoring nested {:?}", node.kind);
            Vec::new()
        }
        SourceKind::TableRow | SourceKind::TableCell => {
            ctx.warn_dropped("a stray table row", node.location.as_ref());
            Vec::new()
        }
        _ => convert_run(&[node], ctx),
    }
}

pub(crate) fn convert_blocks(nodes: &[SourceNode], ctx: &mut Context<'_>) -> Vec<DocumentNode> {
    convert_mixed(&nodes.iter().collect::<Vec<_>>(), ctx)
}

/// Converts a sequence where inline and block nodes may be interleaved, as
/// in the body of a component written on one line. Consecutive inline nodes
/// form a paragraph.
pub(crate) fn convert_mixed(nodes: &[&SourceNode], ctx: &mut Context<'_>) -> Vec<DocumentNode> {
    let mut out = Vec::new();
    let mut run: Vec<&SourceNode> = Vec::new();
    for node in nodes {
        if node.kind.is_inline() {
            run.push(node);
        } else {
            out.extend(convert_run(&run, ctx));
            run.clear();
            out.extend(convert_block(node, ctx));
        }
    }
    out.extend(convert_run(&run, ctx));
    out
}

/// Body of a component: its children as blocks.
pub(crate) fn convert_body(node: &SourceNode, ctx: &mut Context<'_>) -> Vec<DocumentNode> {
    convert_blocks(&node.children, ctx)
}

/// A container that would be empty gets an empty paragraph.
pub(crate) fn ensure_content(mut content: Vec<DocumentNode>) -> Vec<DocumentNode> {
    if content.is_empty() {
        content.push(DocumentNode::paragraph(Vec::new()));
    }
    content
}

/// Whether an inline node is lifted out of its paragraph into a block.
fn is_hoisted(node: &SourceNode, ctx: &Context<'_>) -> bool {
    match &node.kind {
        SourceKind::Image { .. } => true,
        SourceKind::JsxElement {
            name: Some(name), ..
        } => ctx.catalogue().is_block_component(name),
        _ => false,
    }
}

/// Converts a run of inline nodes into paragraphs, splitting around images
/// and inline-written block components.
fn convert_run(run: &[&SourceNode], ctx: &mut Context<'_>) -> Vec<DocumentNode> {
    if run.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut pending: Vec<&SourceNode> = Vec::new();
    let mut after_hoisted = false;

    for node in run {
        if is_hoisted(node, ctx) {
            push_paragraph(&pending, after_hoisted, true, &mut out, ctx);
            pending.clear();
            match &node.kind {
                SourceKind::Image { url, alt, title } => {
                    out.push(image_block(url, alt, title.as_deref()))
                }
                _ => out.extend(components::convert_jsx(node, ctx)),
            }
            after_hoisted = true;
        } else {
            pending.push(node);
        }
    }
    push_paragraph(&pending, after_hoisted, false, &mut out, ctx);
    out
}

fn push_paragraph(
    nodes: &[&SourceNode],
    trim_start: bool,
    trim_end: bool,
    out: &mut Vec<DocumentNode>,
    ctx: &mut Context<'_>,
) {
    if nodes.iter().all(|node| node.is_whitespace_text()) {
        return;
    }
    let mut content = inline::convert_inline(nodes.iter().copied(), ctx);
    inline::trim_edges(&mut content, trim_start, trim_end);
    if !content.is_empty() {
        out.push(DocumentNode::paragraph(content));
    }
}

fn convert_blockquote(node: &SourceNode, ctx: &mut Context<'_>) -> DocumentNode {
    let mut content = convert_blocks(&node.children, ctx);
    match strip_callout_marker(&mut content) {
        Some(kind) => DocumentNode::with_content(NodeKind::InfoBlock, ensure_content(content))
            .attr("type", kind),
        None => DocumentNode::with_content(NodeKind::Blockquote, ensure_content(content)),
    }
}

/// Removes a leading `[!TYPE]` marker from the first paragraph and returns
/// the lowercased type.
fn strip_callout_marker(content: &mut Vec<DocumentNode>) -> Option<String> {
    let paragraph = content.first_mut()?;
    if paragraph.kind != NodeKind::Paragraph {
        return None;
    }
    let first = paragraph.content.first_mut()?;
    let text = first.text.as_deref()?;
    let captures = CALLOUT_MARKER.captures(text)?;
    let kind = captures.get(1)?.as_str().to_ascii_lowercase();
    let marker_len = captures.get(0)?.end();

    let rest = text[marker_len..].to_string();
    if rest.is_empty() {
        paragraph.content.remove(0);
        if paragraph
            .content
            .first()
            .is_some_and(|node| node.kind == NodeKind::HardBreak)
        {
            paragraph.content.remove(0);
        }
    } else {
        first.text = Some(rest);
    }
    if paragraph.content.is_empty() {
        content.remove(0);
    }
    Some(kind)
}

fn convert_list(
    node: &SourceNode,
    ordered: bool,
    start: Option<u32>,
    ctx: &mut Context<'_>,
) -> DocumentNode {
    let items: Vec<&SourceNode> = node
        .children
        .iter()
        .filter(|child| matches!(child.kind, SourceKind::ListItem { .. }))
        .collect();
    let is_task_list = items
        .iter()
        .any(|item| matches!(item.kind, SourceKind::ListItem { checked: Some(_) }));

    if is_task_list {
        let content = items
            .into_iter()
            .map(|item| {
                let checked = matches!(item.kind, SourceKind::ListItem { checked: Some(true) });
                DocumentNode::with_content(
                    NodeKind::TaskItem,
                    ensure_content(convert_blocks(&item.children, ctx)),
                )
                .attr("checked", checked)
            })
            .collect();
        return DocumentNode::with_content(NodeKind::TaskList, content);
    }

    let content = items
        .into_iter()
        .map(|item| {
            DocumentNode::with_content(
                NodeKind::ListItem,
                ensure_content(convert_blocks(&item.children, ctx)),
            )
        })
        .collect();
    if ordered {
        let list = DocumentNode::with_content(NodeKind::OrderedList, content);
        match start {
            Some(start) if start != 1 => list.attr("start", start),
            _ => list,
        }
    } else {
        DocumentNode::with_content(NodeKind::BulletList, content)
    }
}

fn code_block(value: &str, lang: &Option<String>, meta: &Option<String>) -> DocumentNode {
    let mut node = DocumentNode::new(NodeKind::CodeBlock);
    if let Some(lang) = lang {
        node = node.attr("language", lang.as_str());
    }
    if let Some(meta) = meta {
        node = node.attr("meta", meta.as_str());
    }
    if !value.is_empty() {
        node.content.push(DocumentNode::text(value));
    }
    node
}

pub(crate) fn image_block(src: &str, alt: &str, title: Option<&str>) -> DocumentNode {
    let node = DocumentNode::new(NodeKind::ImageBlock)
        .attr("src", src)
        .attr("alt", alt);
    match title {
        Some(title) => node.attr("title", title),
        None => node,
    }
}
