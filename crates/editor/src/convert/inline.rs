//! Inline content: text runs, mark stacking, and inline JSX.

use super::context::Context;
use crate::model::{DocumentNode, Mark, MarkSet, NodeKind};
use mdxblocks_core::{ParseWarning, SourceKind, SourceNode, extract_attributes};

/// Converts inline nodes into text and hard-break nodes. Adjacent text with
/// equal marks is merged and empty text is dropped.
pub(super) fn convert_inline<'n>(
    nodes: impl IntoIterator<Item = &'n SourceNode>,
    ctx: &mut Context<'_>,
) -> Vec<DocumentNode> {
    let mut out = Vec::new();
    let marks = MarkSet::new();
    for node in nodes {
        push_inline(node, &marks, ctx, &mut out);
    }
    merge_adjacent_text(out)
}

fn push_children(node: &SourceNode, marks: &MarkSet, ctx: &mut Context<'_>, out: &mut Vec<DocumentNode>) {
    for child in &node.children {
        push_inline(child, marks, ctx, out);
    }
}

fn push_text(out: &mut Vec<DocumentNode>, text: &str, marks: &MarkSet) {
    if !text.is_empty() {
        out.push(DocumentNode::marked_text(text, marks.clone()));
    }
}

fn push_inline(node: &SourceNode, marks: &MarkSet, ctx: &mut Context<'_>, out: &mut Vec<DocumentNode>) {
    match &node.kind {
        SourceKind::Text { value } | SourceKind::Html { value } => push_text(out, value, marks),
        SourceKind::Strong => push_children(node, &marks.with(Mark::Bold), ctx, out),
        SourceKind::Emphasis => push_children(node, &marks.with(Mark::Italic), ctx, out),
        SourceKind::Delete => push_children(node, &marks.with(Mark::Strike), ctx, out),
        SourceKind::InlineCode { value } => push_text(out, value, &marks.with(Mark::Code)),
        SourceKind::Link { url, .. } => {
            let link = Mark::Link {
                href: url.clone(),
                target: None,
            };
            push_children(node, &marks.with(link), ctx, out)
        }
        SourceKind::Break => out.push(DocumentNode::hard_break()),
        SourceKind::Image { alt, .. } => {
            log::debug!("image inside inline-only content kept as its alt text");
            push_text(out, alt, marks)
        }
        SourceKind::Expression { value, .. } => {
            if !is_comment_only(value) {
                ctx.warn(ParseWarning::ExpressionAsText {
                    expression: value.clone(),
                    location: node.location.clone(),
                });
                push_text(out, &format!("{{{value}}}"), marks)
            }
        }
        SourceKind::JsxElement { name, .. } => push_jsx(node, name.as_deref(), marks, ctx, out),
        _ => push_text(out, &node.plain_text(), marks),
    }
}

/// Mark implied by an HTML-style inline tag.
pub(super) fn tag_mark(name: &str) -> Option<Mark> {
    match name {
        "u" | "ins" => Some(Mark::Underline),
        "b" | "strong" => Some(Mark::Bold),
        "i" | "em" => Some(Mark::Italic),
        "s" | "del" | "strike" => Some(Mark::Strike),
        "code" => Some(Mark::Code),
        _ => None,
    }
}

fn push_jsx(
    node: &SourceNode,
    name: Option<&str>,
    marks: &MarkSet,
    ctx: &mut Context<'_>,
    out: &mut Vec<DocumentNode>,
) {
    let Some(name) = name else {
        return push_children(node, marks, ctx, out);
    };
    if name == "br" {
        out.push(DocumentNode::hard_break());
        return;
    }
    if name == "a" {
        let attributes = extract_attributes(node);
        let href = attributes.get("href").and_then(|value| value.as_str());
        return match href {
            Some(href) => {
                let link = Mark::Link {
                    href: href.to_string(),
                    target: attributes
                        .get("target")
                        .and_then(|value| value.as_str())
                        .map(str::to_string),
                };
                push_children(node, &marks.with(link), ctx, out)
            }
            None => push_children(node, marks, ctx, out),
        };
    }
    if let Some(mark) = tag_mark(name) {
        return push_children(node, &marks.with(mark), ctx, out);
    }
    if ctx.catalogue().is_block_component(name) {
        // Only reached where blocks cannot go, e.g. inside a heading.
        ctx.warn_dropped(
            format!("<{name}> inside inline content"),
            node.location.as_ref(),
        );
        return push_children(node, marks, ctx, out);
    }
    ctx.warn_unknown(name, node.location.as_ref());
    push_text(out, &format!("Unknown component: {name}"), marks);
}

fn merge_adjacent_text(nodes: Vec<DocumentNode>) -> Vec<DocumentNode> {
    let mut out: Vec<DocumentNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if node.kind == NodeKind::Text && node.text.as_deref().is_none_or(str::is_empty) {
            continue;
        }
        if let Some(last) = out.last_mut()
            && last.kind == NodeKind::Text
            && node.kind == NodeKind::Text
            && last.marks == node.marks
            && let (Some(text), Some(more)) = (last.text.as_mut(), node.text.as_deref())
        {
            text.push_str(more);
            continue;
        }
        out.push(node);
    }
    out
}

/// Drops the line break (and the indentation around it) left at the start
/// and/or end of inline content by a split. Plain spaces at a split point
/// are content and stay.
pub(super) fn trim_edges(content: &mut Vec<DocumentNode>, start: bool, end: bool) {
    if start {
        while let Some(first) = content.first_mut() {
            let Some(text) = first.text.as_mut() else { break };
            let rest = text.trim_start();
            if !text[..text.len() - rest.len()].contains('\n') {
                break;
            }
            if rest.is_empty() {
                content.remove(0);
            } else {
                *text = rest.to_string();
                break;
            }
        }
    }
    if end {
        while let Some(last) = content.last_mut() {
            let Some(text) = last.text.as_mut() else { break };
            let rest = text.trim_end();
            if !text[rest.len()..].contains('\n') {
                break;
            }
            if rest.is_empty() {
                content.pop();
            } else {
                *text = rest.to_string();
                break;
            }
        }
    }
}

/// Whether an expression holds nothing but comments and whitespace.
pub(super) fn is_comment_only(expression: &str) -> bool {
    let mut rest = expression.trim_start();
    loop {
        if rest.is_empty() {
            return true;
        }
        if let Some(after) = rest.strip_prefix("/*") {
            match after.find("*/") {
                Some(end) => rest = after[end + 2..].trim_start(),
                None => return false,
            }
        } else if let Some(after) = rest.strip_prefix("//") {
            rest = after.find('\n').map_or("", |end| &after[end..]).trim_start();
        } else {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::catalogue;
    use mdxblocks_core::parse_mdx;

    fn inline(input: &str) -> Vec<DocumentNode> {
        let root = parse_mdx(input).unwrap();
        let mut ctx = Context::new(catalogue());
        convert_inline(root.children[0].children.iter(), &mut ctx)
    }

    #[test]
    fn test_html_style_marks() {
        let content = inline("<u>under</u> <b>bold <i>both</i></b> <a href=\"/x\" target=\"_blank\">go</a>");
        assert_eq!(
            content,
            vec![
                DocumentNode::marked_text("under", MarkSet::from(vec![Mark::Underline])),
                DocumentNode::text(" "),
                DocumentNode::marked_text("bold ", MarkSet::from(vec![Mark::Bold])),
                DocumentNode::marked_text("both", MarkSet::from(vec![Mark::Bold, Mark::Italic])),
                DocumentNode::text(" "),
                DocumentNode::marked_text(
                    "go",
                    MarkSet::from(vec![Mark::Link {
                        href: "/x".into(),
                        target: Some("_blank".into()),
                    }])
                ),
            ]
        );
    }

    #[test]
    fn test_breaks() {
        let content = inline("one\\\ntwo<br />three");
        let kinds: Vec<_> = content.iter().map(|node| node.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Text,
                NodeKind::HardBreak,
                NodeKind::Text,
                NodeKind::HardBreak,
                NodeKind::Text
            ]
        );
    }

    #[test]
    fn test_link_marks_stack_with_emphasis() {
        let content = inline("[**strong link**](https://example.com)");
        assert_eq!(
            content[0].marks.as_slice(),
            &[
                Mark::Link {
                    href: "https://example.com".into(),
                    target: None
                },
                Mark::Bold
            ]
        );
    }

    #[test]
    fn test_comment_detection() {
        assert!(is_comment_only("/* a */"));
        assert!(is_comment_only(" // line\n /* b */ "));
        assert!(is_comment_only(""));
        assert!(!is_comment_only("/* a */ value"));
        assert!(!is_comment_only("/* unterminated"));
    }

    #[test]
    fn test_trim_edges() {
        let mut content = vec![
            DocumentNode::text("\n  "),
            DocumentNode::text(" a "),
            DocumentNode::hard_break(),
        ];
        trim_edges(&mut content, true, true);
        assert_eq!(
            content,
            vec![DocumentNode::text(" a "), DocumentNode::hard_break()]
        );

        let mut content = vec![DocumentNode::text("tail\n")];
        trim_edges(&mut content, false, true);
        assert_eq!(content, vec![DocumentNode::text("tail")]);

        let mut content = vec![DocumentNode::text("A ")];
        trim_edges(&mut content, true, true);
        assert_eq!(content, vec![DocumentNode::text("A ")]);
    }
}
