//! Registry type definitions for the component catalogue.

use crate::model::{Attrs, DocumentNode, NodeKind};
use mdxblocks_core::expression::{LiteralValue, format_number};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Value type an attribute is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    /// Text.
    String,
    /// Number.
    Number,
    /// `true`/`false`.
    Bool,
    /// Any literal, kept as JSON.
    Any,
}

/// Default value of an attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttrDefault {
    /// Text default.
    Str(&'static str),
    /// Numeric default.
    Number(i64),
    /// Boolean default.
    Bool(bool),
}

impl AttrDefault {
    /// JSON form of the default.
    pub fn to_value(self) -> Value {
        match self {
            AttrDefault::Str(value) => Value::String(value.to_string()),
            AttrDefault::Number(value) => Value::from(value),
            AttrDefault::Bool(value) => Value::Bool(value),
        }
    }
}

/// How one source attribute maps onto a node attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeRule {
    /// Name in MDX.
    pub source: &'static str,
    /// Name in the node's `attrs`.
    pub target: &'static str,
    /// Coercion applied to the value.
    pub kind: AttrType,
    /// Filled in when absent, omitted on output when equal.
    pub default: Option<AttrDefault>,
}

impl AttributeRule {
    const fn new(name: &'static str, kind: AttrType) -> Self {
        Self {
            source: name,
            target: name,
            kind,
            default: None,
        }
    }

    /// String attribute stored under the same name.
    pub const fn string(name: &'static str) -> Self {
        Self::new(name, AttrType::String)
    }

    /// Numeric attribute stored under the same name.
    pub const fn number(name: &'static str) -> Self {
        Self::new(name, AttrType::Number)
    }

    /// Boolean attribute stored under the same name.
    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, AttrType::Bool)
    }

    /// Attribute kept as any literal value.
    pub const fn any(name: &'static str) -> Self {
        Self::new(name, AttrType::Any)
    }

    /// Store under a different node attribute name.
    pub const fn renamed(self, target: &'static str) -> Self {
        Self { target, ..self }
    }

    /// Attach a default.
    pub const fn or(self, default: AttrDefault) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    /// Whether `value` equals this attribute's default.
    pub fn is_default(&self, value: &Value) -> bool {
        self.default.is_some_and(|default| default.to_value() == *value)
    }

    /// Coerce a literal to the declared type.
    pub fn coerce(&self, value: &LiteralValue) -> Result<Value, AttrRejection> {
        if let LiteralValue::Opaque(raw) = value {
            return Err(AttrRejection::NotLiteral(raw.clone()));
        }
        let mismatch = || AttrRejection::WrongType {
            expected: match self.kind {
                AttrType::String => "a string",
                AttrType::Number => "a number",
                AttrType::Bool => "a boolean",
                AttrType::Any => "a literal",
            },
            found: value.type_name(),
        };
        match (self.kind, value) {
            (AttrType::String, LiteralValue::String(text)) => Ok(Value::String(text.clone())),
            (AttrType::String, LiteralValue::Number(number)) => {
                Ok(Value::String(format_number(*number)))
            }
            (AttrType::String, LiteralValue::Bool(flag)) => Ok(Value::String(flag.to_string())),
            (AttrType::Number, LiteralValue::Number(_)) => value.to_json().ok_or_else(mismatch),
            (AttrType::Number, LiteralValue::String(text)) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .and_then(|number| LiteralValue::Number(number).to_json())
                .ok_or_else(mismatch),
            (AttrType::Bool, LiteralValue::Bool(flag)) => Ok(Value::Bool(*flag)),
            (AttrType::Bool, LiteralValue::String(text)) => match text.trim() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(mismatch()),
            },
            (AttrType::Any, _) => match value.to_json() {
                Some(json) => Ok(json),
                None => Err(AttrRejection::NotLiteral(value.to_source())),
            },
            _ => Err(mismatch()),
        }
    }
}

/// Why an attribute value was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttrRejection {
    /// The value is (or contains) a non-literal expression.
    #[error("`{0}` is not a literal value")]
    NotLiteral(String),
    /// The value has the wrong type.
    #[error("expected {expected}, found {found}")]
    WrongType {
        /// Expected type
        expected: &'static str,
        /// Actual type
        found: &'static str,
    },
}

/// What to do with content that is not the expected named child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrayPolicy {
    /// Wrap consecutive strays in a fresh child.
    Wrap,
    /// Discard them with a warning.
    Drop,
}

/// How a component's children become node content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildPolicy {
    /// Children are converted as ordinary blocks.
    PassThrough,
    /// Children must be the named component.
    ExtractNamed {
        /// Component name of the expected children
        child: &'static str,
        /// Handling of other content
        stray: StrayPolicy,
    },
    /// Only converted blocks of this kind are kept.
    OnlyKind(NodeKind),
    /// Children and attributes form a table.
    FlattenTable,
    /// No content; text children may fill an attribute.
    Atomic {
        /// Attribute receiving the children's plain text
        text_into: Option<&'static str>,
    },
}

/// How one component name maps onto a document node.
#[derive(Debug, Clone)]
pub struct ComponentRule {
    /// Component name in MDX.
    pub name: &'static str,
    /// Node kind produced.
    pub target: NodeKind,
    /// Attribute mappings, in output order.
    pub attributes: &'static [AttributeRule],
    /// Fixed attributes set on the node, which also select this rule on output.
    pub presets: &'static [(&'static str, &'static str)],
    /// Children handling.
    pub children: ChildPolicy,
    /// Required parent component for child-only names.
    pub parent: Option<&'static str>,
}

impl ComponentRule {
    /// Attribute rule for a source attribute name.
    pub fn attribute(&self, source: &str) -> Option<&AttributeRule> {
        self.attributes.iter().find(|rule| rule.source == source)
    }

    /// Attribute rule for a node attribute name.
    pub fn attribute_for_target(&self, target: &str) -> Option<&AttributeRule> {
        self.attributes.iter().find(|rule| rule.target == target)
    }

    /// Whether `name` is one of the preset node attributes.
    pub fn is_preset(&self, name: &str) -> bool {
        self.presets.iter().any(|(key, _)| *key == name)
    }

    /// Whether the node's attributes carry this rule's presets.
    pub fn matches_presets(&self, attrs: &Attrs) -> bool {
        self.presets
            .iter()
            .all(|(key, value)| attrs.get(*key).and_then(Value::as_str) == Some(*value))
    }

    /// Child-only components are only meaningful inside their parent.
    pub fn is_child_only(&self) -> bool {
        self.parent.is_some()
    }

    /// Node attribute filled from text children, for atomic components.
    pub fn text_attribute(&self) -> Option<&'static str> {
        match self.children {
            ChildPolicy::Atomic { text_into } => text_into,
            _ => None,
        }
    }

    /// Attributes with defaults and presets, as a fresh node would have them.
    pub fn default_attrs(&self) -> Attrs {
        let mut attrs = Attrs::new();
        for (key, value) in self.presets {
            attrs.insert(key.to_string(), Value::String(value.to_string()));
        }
        for rule in self.attributes {
            if let Some(default) = rule.default {
                attrs.insert(rule.target.to_string(), default.to_value());
            }
        }
        attrs
    }
}

/// Read-only name → rule table.
#[derive(Debug, Clone)]
pub struct Catalogue {
    rules: Vec<ComponentRule>,
    by_name: HashMap<&'static str, usize>,
}

impl Catalogue {
    /// Build from rules. A later rule with the same name replaces the
    /// earlier one for name lookups.
    pub fn from_rules(rules: Vec<ComponentRule>) -> Self {
        let by_name = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| (rule.name, index))
            .collect();
        Self { rules, by_name }
    }

    /// Rule for a component name.
    pub fn rule(&self, name: &str) -> Option<&ComponentRule> {
        self.by_name.get(name).map(|index| &self.rules[*index])
    }

    /// First rule producing the node's kind whose presets match.
    pub fn rule_for_node(&self, node: &DocumentNode) -> Option<&ComponentRule> {
        self.rules
            .iter()
            .find(|rule| rule.target == node.kind && rule.matches_presets(&node.attrs))
    }

    /// First rule producing `kind`, ignoring presets.
    pub fn rule_for_kind(&self, kind: NodeKind) -> Option<&ComponentRule> {
        self.rules.iter().find(|rule| rule.target == kind)
    }

    /// Whether `name` is a catalogue component (all of them are blocks).
    pub fn is_block_component(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All rules in declaration order.
    pub fn rules(&self) -> &[ComponentRule] {
        &self.rules
    }
}
