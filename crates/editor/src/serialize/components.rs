//! Catalogue blocks written back as JSX elements.

use super::Serializer;
use super::inline::{escape_text, starts_with_entity};
use crate::model::DocumentNode;
use crate::registry::ComponentRule;
use mdxblocks_core::LiteralValue;
use serde_json::Value;

/// One JSX attribute. `true` is written as a bare name, plain strings are
/// quoted, everything else goes in braces as a literal.
pub(super) fn jsx_attribute(name: &str, value: &Value) -> String {
    match value {
        Value::Bool(true) => name.to_string(),
        Value::String(text) if !needs_expression(text) => {
            if text.contains('"') {
                format!("{name}='{text}'")
            } else {
                format!("{name}=\"{text}\"")
            }
        }
        other => format!("{name}={{{}}}", LiteralValue::from_json(other).to_source()),
    }
}

fn needs_expression(text: &str) -> bool {
    text.contains('\n')
        || (text.contains('"') && text.contains('\''))
        || text
            .match_indices('&')
            .any(|(index, _)| starts_with_entity(&text[index..]))
}

fn is_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(ch) if ch.is_ascii_alphabetic() || ch == '_' || ch == '$')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '$' | '-' | ':'))
}

/// Attributes in rule order, then attributes the rule does not know about.
/// Defaults, presets and the text-carrying attribute are left out.
fn attributes(node: &DocumentNode, rule: &ComponentRule) -> Vec<String> {
    let text_attribute = rule.text_attribute();
    let mut out = Vec::new();
    for attribute in rule.attributes {
        if Some(attribute.target) == text_attribute {
            continue;
        }
        match node.attrs.get(attribute.target) {
            None | Some(Value::Null) => {}
            Some(value) if attribute.is_default(value) => {}
            Some(value) => out.push(jsx_attribute(attribute.source, value)),
        }
    }
    for (name, value) in &node.attrs {
        if value.is_null() || rule.is_preset(name) || rule.attribute_for_target(name).is_some() {
            continue;
        }
        if is_attribute_name(name) {
            out.push(jsx_attribute(name, value));
        } else {
            log::debug!("`{name}` on {} cannot be written as a JSX attribute", node.kind);
        }
    }
    out
}

impl Serializer<'_> {
    /// Writes a node through its catalogue rule.
    pub(super) fn component(&self, node: &DocumentNode, rule: &ComponentRule) -> String {
        let mut open = format!("<{}", rule.name);
        for attribute in attributes(node, rule) {
            open.push(' ');
            open.push_str(&attribute);
        }

        let (body, inline) = match rule.text_attribute() {
            Some(target) => {
                let text = node.attr_str(target).unwrap_or_default();
                (escape_text(text, true, true, false), !text.contains('\n'))
            }
            None => (self.blocks(&node.content), false),
        };

        if body.is_empty() {
            format!("{open} />")
        } else if inline {
            format!("{open}>{body}</{}>", rule.name)
        } else {
            format!("{open}>\n\n{body}\n\n</{}>", rule.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_forms() {
        assert_eq!(jsx_attribute("open", &json!(true)), "open");
        assert_eq!(jsx_attribute("open", &json!(false)), "open={false}");
        assert_eq!(jsx_attribute("cols", &json!(3)), "cols={3}");
        assert_eq!(jsx_attribute("title", &json!("Hi")), "title=\"Hi\"");
        assert_eq!(jsx_attribute("title", &json!("say \"hi\"")), "title='say \"hi\"'");
        assert_eq!(
            jsx_attribute("title", &json!("it's \"both\"")),
            "title={\"it's \\\"both\\\"\"}"
        );
        assert_eq!(jsx_attribute("title", &json!("a\nb")), "title={\"a\\nb\"}");
        assert_eq!(jsx_attribute("title", &json!("&amp;")), "title={\"&amp;\"}");
        assert_eq!(jsx_attribute("title", &json!("R&D")), "title=\"R&D\"");
        assert_eq!(
            jsx_attribute("default", &json!({"a": [1, "x"]})),
            "default={{ a: [1, \"x\"] }}"
        );
    }

    #[test]
    fn test_attribute_names() {
        assert!(is_attribute_name("data-track"));
        assert!(is_attribute_name("xlink:href"));
        assert!(!is_attribute_name("1st"));
        assert!(!is_attribute_name("has space"));
    }
}
