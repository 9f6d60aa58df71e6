//! The built-in component catalogue.
//!
//! One rule per MDX component the editor has a block for. The table is built
//! once on first use and shared by every conversion.

use super::types::{
    AttrDefault, AttributeRule, Catalogue, ChildPolicy, ComponentRule, StrayPolicy,
};
use crate::model::NodeKind;
use once_cell::sync::Lazy;

const CARD: &[AttributeRule] = &[
    AttributeRule::string("title"),
    AttributeRule::string("icon"),
    AttributeRule::string("href"),
    AttributeRule::boolean("horizontal").or(AttrDefault::Bool(false)),
];

const CALLOUT: &[AttributeRule] = &[AttributeRule::string("title")];

const COLUMNS: &[AttributeRule] = &[AttributeRule::number("cols").or(AttrDefault::Number(2))];

const ACCORDION_TAB: &[AttributeRule] = &[
    AttributeRule::string("title").or(AttrDefault::Str("")),
    AttributeRule::boolean("defaultOpen").or(AttrDefault::Bool(false)),
];

const TAB: &[AttributeRule] = &[AttributeRule::string("title").or(AttrDefault::Str(""))];

const STEP: &[AttributeRule] = &[
    AttributeRule::string("title").or(AttrDefault::Str("")),
    AttributeRule::string("icon"),
];

const TABLE: &[AttributeRule] = &[
    AttributeRule::any("data"),
    AttributeRule::any("columns"),
    AttributeRule::any("sortable"),
    AttributeRule::any("filterable"),
];

const ENDPOINT: &[AttributeRule] = &[
    AttributeRule::string("method").or(AttrDefault::Str("GET")),
    AttributeRule::string("path").or(AttrDefault::Str("")),
    AttributeRule::string("baseUrl"),
];

const LABEL: &[AttributeRule] = &[
    AttributeRule::string("text").or(AttrDefault::Str("")),
    AttributeRule::string("color").or(AttrDefault::Str("gray")),
];

const PARAM_FIELD: &[AttributeRule] = &[
    AttributeRule::string("path")
        .renamed("name")
        .or(AttrDefault::Str("")),
    AttributeRule::string("type").or(AttrDefault::Str("string")),
    AttributeRule::boolean("required").or(AttrDefault::Bool(false)),
    AttributeRule::any("default"),
    AttributeRule::string("description"),
];

const CHECK_ITEM: &[AttributeRule] = &[AttributeRule::boolean("checked").or(AttrDefault::Bool(false))];

const IMG: &[AttributeRule] = &[
    AttributeRule::string("src"),
    AttributeRule::string("alt").or(AttrDefault::Str("")),
    AttributeRule::string("title"),
    AttributeRule::any("width"),
    AttributeRule::any("height"),
];

/// Callout types, in the order `<Tip>`…`<Danger>` are listed.
pub const CALLOUT_TYPES: &[(&str, &str)] = &[
    ("tip", "Tip"),
    ("info", "Info"),
    ("note", "Note"),
    ("warning", "Warning"),
    ("danger", "Danger"),
];

fn rule(
    name: &'static str,
    target: NodeKind,
    attributes: &'static [AttributeRule],
    children: ChildPolicy,
) -> ComponentRule {
    ComponentRule {
        name,
        target,
        attributes,
        presets: &[],
        children,
        parent: None,
    }
}

fn child_rule(
    name: &'static str,
    target: NodeKind,
    attributes: &'static [AttributeRule],
    parent: &'static str,
) -> ComponentRule {
    ComponentRule {
        parent: Some(parent),
        ..rule(name, target, attributes, ChildPolicy::PassThrough)
    }
}

fn named(child: &'static str, stray: StrayPolicy) -> ChildPolicy {
    ChildPolicy::ExtractNamed { child, stray }
}

fn callout(name: &'static str, preset: &'static [(&'static str, &'static str)]) -> ComponentRule {
    ComponentRule {
        presets: preset,
        ..rule(name, NodeKind::InfoBlock, CALLOUT, ChildPolicy::PassThrough)
    }
}

/// Builds the catalogue.
///
/// # Example
///
/// ```
/// use mdxblocks_editor::model::NodeKind;
/// use mdxblocks_editor::registry::defaults::default_catalogue;
///
/// let catalogue = default_catalogue();
/// assert_eq!(catalogue.rule("Card").map(|rule| rule.target), Some(NodeKind::CardBlock));
/// assert!(catalogue.rule("Tab").is_some_and(|rule| rule.is_child_only()));
/// ```
pub fn default_catalogue() -> Catalogue {
    Catalogue::from_rules(vec![
        rule("Card", NodeKind::CardBlock, CARD, ChildPolicy::PassThrough),
        rule(
            "CodeGroup",
            NodeKind::CodeGroup,
            &[],
            ChildPolicy::OnlyKind(NodeKind::CodeBlock),
        ),
        callout("Tip", &[("type", "tip")]),
        callout("Info", &[("type", "info")]),
        callout("Note", &[("type", "note")]),
        callout("Warning", &[("type", "warning")]),
        callout("Danger", &[("type", "danger")]),
        rule(
            "Columns",
            NodeKind::ColumnGroup,
            COLUMNS,
            named("Column", StrayPolicy::Wrap),
        ),
        child_rule("Column", NodeKind::Column, &[], "Columns"),
        rule(
            "RightPanel",
            NodeKind::RightPanel,
            &[],
            ChildPolicy::PassThrough,
        ),
        rule(
            "Accordion",
            NodeKind::AccordionBlock,
            &[],
            named("AccordionTab", StrayPolicy::Wrap),
        ),
        child_rule(
            "AccordionTab",
            NodeKind::AccordionTab,
            ACCORDION_TAB,
            "Accordion",
        ),
        rule(
            "Tabs",
            NodeKind::TabsBlock,
            &[],
            named("Tab", StrayPolicy::Wrap),
        ),
        child_rule("Tab", NodeKind::TabBlock, TAB, "Tabs"),
        rule(
            "Steps",
            NodeKind::StepsBlock,
            &[],
            named("Step", StrayPolicy::Wrap),
        ),
        child_rule("Step", NodeKind::StepBlock, STEP, "Steps"),
        rule("Table", NodeKind::TableBlock, TABLE, ChildPolicy::FlattenTable),
        rule(
            "Endpoint",
            NodeKind::EndpointBlock,
            ENDPOINT,
            ChildPolicy::Atomic { text_into: None },
        ),
        rule(
            "Label",
            NodeKind::LabelBlock,
            LABEL,
            ChildPolicy::Atomic {
                text_into: Some("text"),
            },
        ),
        rule(
            "ParamField",
            NodeKind::ParamBlock,
            PARAM_FIELD,
            ChildPolicy::Atomic {
                text_into: Some("description"),
            },
        ),
        rule(
            "CheckList",
            NodeKind::TaskList,
            &[],
            named("CheckItem", StrayPolicy::Drop),
        ),
        child_rule("CheckItem", NodeKind::TaskItem, CHECK_ITEM, "CheckList"),
        rule(
            "img",
            NodeKind::ImageBlock,
            IMG,
            ChildPolicy::Atomic { text_into: None },
        ),
    ])
}

static CATALOGUE: Lazy<Catalogue> = Lazy::new(default_catalogue);

/// The process-wide catalogue.
pub fn catalogue() -> &'static Catalogue {
    &CATALOGUE
}
