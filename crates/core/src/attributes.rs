use crate::ast::{JsxAttribute, JsxAttributeValue, SourceKind, SourceNode};
use crate::expression::{LiteralValue, evaluate};

/// Attributes of a JSX element, read as literal values, in source order.
///
/// A repeated name keeps its first position and its last value, matching how
/// JSX props behave.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(String, LiteralValue)>,
}

impl Attributes {
    /// Look up an attribute by name.
    pub fn get(&self, name: &str) -> Option<&LiteralValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Whether an attribute was written.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate over `(name, value)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LiteralValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of distinct attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no attributes were written.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: &str, value: LiteralValue) {
        match self.entries.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }
}

/// Reads the attributes of a JSX element. Any other node has none.
///
/// Quoted values are strings, `{…}` values go through
/// [`evaluate`](crate::expression::evaluate) and a bare name is `true`.
///
/// ```
/// use mdxblocks_core::expression::LiteralValue;
/// use mdxblocks_core::{extract_attributes, parse_mdx};
///
/// let root = parse_mdx("<Columns cols={3} wide />").unwrap();
/// let attributes = extract_attributes(&root.children[0]);
/// assert_eq!(attributes.get("cols"), Some(&LiteralValue::Number(3.0)));
/// assert_eq!(attributes.get("wide"), Some(&LiteralValue::Bool(true)));
/// ```
pub fn extract_attributes(node: &SourceNode) -> Attributes {
    match &node.kind {
        SourceKind::JsxElement { attributes, .. } => read_attributes(attributes),
        _ => Attributes::default(),
    }
}

/// Reads a list of raw JSX attributes.
pub fn read_attributes(attributes: &[JsxAttribute]) -> Attributes {
    let mut out = Attributes::default();
    for attribute in attributes {
        let value = match &attribute.value {
            JsxAttributeValue::Literal(value) => LiteralValue::String(value.clone()),
            JsxAttributeValue::Expression(expression) => evaluate(expression),
            JsxAttributeValue::Shorthand => LiteralValue::Bool(true),
        };
        out.insert(&attribute.name, value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(name: &str, value: JsxAttributeValue) -> JsxAttribute {
        JsxAttribute {
            name: name.to_string(),
            value,
        }
    }

    #[test]
    fn test_reads_each_value_form() {
        let attributes = read_attributes(&[
            attribute("title", JsxAttributeValue::Literal("Hello".into())),
            attribute("data", JsxAttributeValue::Expression("[[1, 2]]".into())),
            attribute("open", JsxAttributeValue::Shorthand),
            attribute("onClick", JsxAttributeValue::Expression("() => go()".into())),
        ]);
        assert_eq!(attributes.len(), 4);
        assert_eq!(
            attributes.get("title"),
            Some(&LiteralValue::String("Hello".into()))
        );
        assert_eq!(
            attributes.get("data"),
            Some(&LiteralValue::Array(vec![LiteralValue::Array(vec![
                LiteralValue::Number(1.0),
                LiteralValue::Number(2.0),
            ])]))
        );
        assert_eq!(attributes.get("open"), Some(&LiteralValue::Bool(true)));
        assert_eq!(
            attributes.get("onClick"),
            Some(&LiteralValue::Opaque("() => go()".into()))
        );
    }

    #[test]
    fn test_last_duplicate_wins_in_first_position() {
        let attributes = read_attributes(&[
            attribute("a", JsxAttributeValue::Literal("1".into())),
            attribute("b", JsxAttributeValue::Shorthand),
            attribute("a", JsxAttributeValue::Literal("2".into())),
        ]);
        let names: Vec<_> = attributes.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(attributes.get("a"), Some(&LiteralValue::String("2".into())));
    }

    #[test]
    fn test_non_jsx_node_has_no_attributes() {
        assert!(extract_attributes(&SourceNode::text("x")).is_empty());
    }
}
