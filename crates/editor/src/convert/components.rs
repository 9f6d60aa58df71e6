//! Catalogue-driven conversion of JSX elements.

use super::context::Context;
use super::{convert_body, convert_mixed, ensure_content, inline, table};
use crate::model::{Attrs, DocumentNode, NodeKind};
use crate::registry::{ChildPolicy, ComponentRule, StrayPolicy};
use mdxblocks_core::{Attributes, ParseWarning, SourceKind, SourceNode, extract_attributes};
use serde_json::Value;

/// Converts a JSX element found at block level.
///
/// Unknown names become a placeholder paragraph, child-only names outside
/// their parent produce nothing, and fragments are transparent.
pub(super) fn convert_jsx(node: &SourceNode, ctx: &mut Context<'_>) -> Vec<DocumentNode> {
    let Some(name) = node.jsx_name() else {
        return convert_body(node, ctx);
    };
    if name == "br" {
        return vec![DocumentNode::paragraph(vec![DocumentNode::hard_break()])];
    }
    let Some(rule) = ctx.catalogue().rule(name) else {
        if inline::tag_mark(name).is_some() {
            log::debug!("<{name}> written as a block, keeping its content");
            return convert_body(node, ctx);
        }
        ctx.warn_unknown(name, node.location.as_ref());
        return vec![placeholder(name)];
    };
    if let Some(parent) = rule.parent {
        ctx.warn(ParseWarning::OrphanComponent {
            name: name.to_string(),
            parent: parent.to_string(),
            location: node.location.clone(),
        });
        return Vec::new();
    }
    apply_rule(rule, node, ctx).into_iter().collect()
}

fn placeholder(name: &str) -> DocumentNode {
    DocumentNode::paragraph(vec![DocumentNode::text(format!(
        "Unknown component: {name}"
    ))])
}

fn apply_rule(rule: &ComponentRule, node: &SourceNode, ctx: &mut Context<'_>) -> Option<DocumentNode> {
    let attributes = extract_attributes(node);
    if rule.children == ChildPolicy::FlattenTable {
        return Some(table::from_component(rule, &attributes, node, ctx));
    }

    let mut attrs = build_attrs(rule, &attributes, node, ctx);
    ctx.enter(rule.name);
    let content = match rule.children {
        ChildPolicy::PassThrough => ensure_content(convert_body(node, ctx)),
        ChildPolicy::ExtractNamed { child, stray } => extract_named(child, stray, node, ctx),
        ChildPolicy::OnlyKind(kind) => only_kind(kind, node, ctx),
        ChildPolicy::Atomic { text_into } => {
            let text = node.plain_text();
            match text_into {
                Some(target) if !text.trim().is_empty() => {
                    attrs.insert(target.to_string(), Value::String(text));
                }
                Some(_) => {}
                None if !text.trim().is_empty() => {
                    ctx.warn_dropped("child content", node.location.as_ref())
                }
                None => {}
            }
            Vec::new()
        }
        ChildPolicy::FlattenTable => Vec::new(),
    };
    ctx.leave();

    Some(DocumentNode {
        attrs,
        content,
        ..DocumentNode::new(rule.target)
    })
}

/// Node attributes from source attributes: defaults and presets first, then
/// coerced mapped attributes, then literal pass-through of unmapped ones.
fn build_attrs(
    rule: &ComponentRule,
    attributes: &Attributes,
    node: &SourceNode,
    ctx: &mut Context<'_>,
) -> Attrs {
    let mut attrs = rule.default_attrs();
    for (name, value) in attributes.iter() {
        let rejected = |reason: String| ParseWarning::RejectedAttribute {
            component: rule.name.to_string(),
            attribute: name.to_string(),
            reason,
            location: node.location.clone(),
        };
        if let Some(attribute) = rule.attribute(name) {
            match attribute.coerce(value) {
                Ok(json) => {
                    attrs.insert(attribute.target.to_string(), json);
                }
                Err(reason) => ctx.warn(rejected(reason.to_string())),
            }
        } else if rule.is_preset(name) || rule.attribute_for_target(name).is_some() {
            log::debug!("<{}> ignores `{name}`, it is set by the component", rule.name);
        } else {
            match value.to_json() {
                Some(json) => {
                    attrs.insert(name.to_string(), json);
                }
                None => ctx.warn(rejected(format!("`{}` is not a literal value", value.to_source()))),
            }
        }
    }
    attrs
}

/// Paragraphs made only of inline elements (and whitespace) are flattened
/// so `<Tabs><Tab>…</Tab></Tabs>` written inline reads like the block form.
fn component_children(node: &SourceNode) -> Vec<&SourceNode> {
    let mut out = Vec::new();
    for child in &node.children {
        let only_elements = child.kind == SourceKind::Paragraph
            && child.children.iter().any(|inner| inner.jsx_name().is_some())
            && child
                .children
                .iter()
                .all(|inner| inner.jsx_name().is_some() || inner.is_whitespace_text());
        if only_elements {
            out.extend(child.children.iter());
        } else {
            out.push(child);
        }
    }
    out
}

fn extract_named(
    child_name: &'static str,
    stray: StrayPolicy,
    node: &SourceNode,
    ctx: &mut Context<'_>,
) -> Vec<DocumentNode> {
    let Some(child_rule) = ctx.catalogue().rule(child_name) else {
        return ensure_content(convert_body(node, ctx));
    };

    let mut out = Vec::new();
    let mut strays: Vec<&SourceNode> = Vec::new();
    for child in component_children(node) {
        if child.jsx_name() == Some(child_name) {
            flush_strays(child_rule, stray, &mut strays, &mut out, ctx);
            out.extend(apply_rule(child_rule, child, ctx));
        } else if !child.is_whitespace_text() {
            strays.push(child);
        }
    }
    flush_strays(child_rule, stray, &mut strays, &mut out, ctx);

    if out.is_empty() {
        out.push(DocumentNode {
            attrs: child_rule.default_attrs(),
            content: vec![DocumentNode::paragraph(Vec::new())],
            ..DocumentNode::new(child_rule.target)
        });
    }
    out
}

fn flush_strays(
    child_rule: &ComponentRule,
    stray: StrayPolicy,
    strays: &mut Vec<&SourceNode>,
    out: &mut Vec<DocumentNode>,
    ctx: &mut Context<'_>,
) {
    if strays.is_empty() {
        return;
    }
    match stray {
        StrayPolicy::Wrap => {
            let content = convert_mixed(strays, ctx);
            if !content.is_empty() {
                out.push(DocumentNode {
                    attrs: child_rule.default_attrs(),
                    content,
                    ..DocumentNode::new(child_rule.target)
                });
            }
        }
        StrayPolicy::Drop => {
            for node in strays.iter() {
                let what = match node.jsx_name() {
                    Some(name) => format!("<{name}>"),
                    None => "content outside its items".to_string(),
                };
                ctx.warn_dropped(what, node.location.as_ref());
            }
        }
    }
    strays.clear();
}

fn only_kind(kind: NodeKind, node: &SourceNode, ctx: &mut Context<'_>) -> Vec<DocumentNode> {
    let mut kept = Vec::new();
    for block in convert_body(node, ctx) {
        if block.kind == kind {
            kept.push(block);
        } else {
            ctx.warn_dropped(format!("a {} block", block.kind), node.location.as_ref());
        }
    }
    if kept.is_empty() {
        kept.push(DocumentNode::new(kind));
    }
    kept
}

#[cfg(test)]
mod tests {
    use crate::convert::convert;
    use crate::model::{DocumentNode, NodeKind};
    use mdxblocks_core::{ParseWarning, parse_mdx};
    use serde_json::json;

    fn convert_str(input: &str) -> (Vec<DocumentNode>, Vec<ParseWarning>) {
        let root = parse_mdx(input).expect("fixture should parse");
        let conversion = convert(&root).expect("fixture should convert");
        conversion.document.check_schema().expect("schema-valid");
        (conversion.document.content, conversion.diagnostics.warnings)
    }

    #[test]
    fn test_card_attributes_and_defaults() {
        let (content, warnings) =
            convert_str("<Card title=\"Setup\" icon=\"rocket\" data-track=\"a\">\n\nBody text\n\n</Card>");
        assert!(warnings.is_empty());
        let card = &content[0];
        assert_eq!(card.kind, NodeKind::CardBlock);
        assert_eq!(
            serde_json::Value::Object(card.attrs.clone()),
            json!({"title": "Setup", "icon": "rocket", "horizontal": false, "data-track": "a"})
        );
        assert_eq!(card.text_content(), "Body text");
    }

    #[test]
    fn test_empty_card_gets_paragraph() {
        let (content, _) = convert_str("<Card title=\"x\" />");
        assert_eq!(content[0].content, vec![DocumentNode::paragraph(vec![])]);
    }

    #[test]
    fn test_callout_components_set_type() {
        let (content, _) = convert_str("<Warning title=\"Heads up\">\n\nCareful\n\n</Warning>");
        assert_eq!(content[0].kind, NodeKind::InfoBlock);
        assert_eq!(content[0].attr_str("type"), Some("warning"));
        assert_eq!(content[0].attr_str("title"), Some("Heads up"));
    }

    #[test]
    fn test_steps_extract_and_wrap_strays() {
        let input = "<Steps>\n\nIntro\n\n<Step title=\"One\">\n\nFirst\n\n</Step>\n<Step title=\"Two\" icon=\"check\">\n\nSecond\n\n</Step>\n\n</Steps>";
        let (content, warnings) = convert_str(input);
        assert!(warnings.is_empty(), "{warnings:?}");
        let steps = &content[0];
        assert_eq!(steps.kind, NodeKind::StepsBlock);
        let titles: Vec<_> = steps.content.iter().map(|step| step.attr_str("title")).collect();
        assert_eq!(titles, vec![Some(""), Some("One"), Some("Two")]);
        assert_eq!(steps.content[0].text_content(), "Intro");
        assert_eq!(steps.content[2].attr_str("icon"), Some("check"));
    }

    #[test]
    fn test_inline_tabs() {
        let (content, _) = convert_str("<Tabs><Tab title=\"A\">alpha</Tab><Tab title=\"B\">beta</Tab></Tabs>");
        let tabs = &content[0];
        assert_eq!(tabs.kind, NodeKind::TabsBlock);
        assert_eq!(tabs.content.len(), 2);
        assert_eq!(tabs.content[1].text_content(), "beta");
    }

    #[test]
    fn test_orphan_child_is_dropped_with_warning() {
        let (content, warnings) = convert_str("<Tab title=\"x\">\n\nalone\n\n</Tab>\n\nafter");
        assert_eq!(content.len(), 1);
        assert!(matches!(
            warnings.as_slice(),
            [ParseWarning::OrphanComponent { name, parent, .. }] if name == "Tab" && parent == "Tabs"
        ));
    }

    #[test]
    fn test_code_group_keeps_only_code() {
        let input = "<CodeGroup>\n\n```js\na\n```\n\nnot code\n\n```py\nb\n```\n\n</CodeGroup>";
        let (content, warnings) = convert_str(input);
        let kinds: Vec<_> = content[0].content.iter().map(|node| node.kind).collect();
        assert_eq!(kinds, vec![NodeKind::CodeBlock, NodeKind::CodeBlock]);
        assert!(matches!(warnings.as_slice(), [ParseWarning::DroppedChild { parent, .. }] if parent == "CodeGroup"));
    }

    #[test]
    fn test_check_list_drops_strays() {
        let input = "<CheckList>\n\n<CheckItem checked>\n\nShip it\n\n</CheckItem>\n\nloose text\n\n</CheckList>";
        let (content, warnings) = convert_str(input);
        assert_eq!(content[0].kind, NodeKind::TaskList);
        assert_eq!(content[0].content.len(), 1);
        assert_eq!(content[0].content[0].attr_bool("checked"), Some(true));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_atomic_components() {
        let (content, _) = convert_str(
            "<Endpoint method=\"POST\" path=\"/users\" />\n\n<Label color=\"green\">Beta</Label>\n\n<ParamField path=\"id\" required>\n\nThe user id.\n\n</ParamField>",
        );
        assert_eq!(content[0].kind, NodeKind::EndpointBlock);
        assert_eq!(content[0].attr_str("method"), Some("POST"));
        assert_eq!(content[1].kind, NodeKind::LabelBlock);
        assert_eq!(content[1].attr_str("text"), Some("Beta"));
        assert_eq!(content[1].attr_str("color"), Some("green"));
        assert_eq!(content[2].attr_str("name"), Some("id"));
        assert_eq!(content[2].attr_bool("required"), Some(true));
        assert_eq!(content[2].attr_str("type"), Some("string"));
        assert_eq!(content[2].attr_str("description"), Some("The user id."));
    }

    #[test]
    fn test_coercion_and_rejection() {
        let (content, warnings) = convert_str("<Columns cols=\"3\" onClick={() => go()}>\n\n<Column>\n\nA\n\n</Column>\n\n</Columns>\n\n<Columns cols={props.n} />");
        assert_eq!(content[0].attrs["cols"], json!(3));
        assert!(!content[0].attrs.contains_key("onClick"));
        assert_eq!(content[1].attrs["cols"], json!(2));
        assert_eq!(content[1].content.len(), 1);
        assert_eq!(content[1].content[0].kind, NodeKind::Column);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|warning| matches!(warning, ParseWarning::RejectedAttribute { .. })));
    }

    #[test]
    fn test_fragment_is_transparent() {
        let (content, _) = convert_str("<>\n\nInside\n\n</>");
        assert_eq!(content, vec![DocumentNode::paragraph(vec![DocumentNode::text("Inside")])]);
    }

    #[test]
    fn test_inline_label_is_hoisted() {
        let (content, _) = convert_str("Status: <Label>Beta</Label> today");
        let kinds: Vec<_> = content.iter().map(|node| node.kind).collect();
        assert_eq!(kinds, vec![NodeKind::Paragraph, NodeKind::LabelBlock, NodeKind::Paragraph]);
        assert_eq!(content[0].text_content(), "Status: ");
        assert_eq!(content[2].text_content(), " today");
    }

    #[test]
    fn test_block_break_is_a_break_paragraph() {
        let (content, warnings) = convert_str("A\n\n<br />\n\nB");
        assert!(warnings.is_empty());
        assert_eq!(content[1], DocumentNode::paragraph(vec![DocumentNode::hard_break()]));
    }
}
