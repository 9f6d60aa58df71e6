//! Tables: pipe tables and the `<Table>` component both become `tableBlock`.

use super::context::Context;
use crate::model::{DocumentNode, NodeKind, TableColumn, TableData};
use crate::registry::ComponentRule;
use mdxblocks_core::expression::{LiteralValue, format_number};
use mdxblocks_core::{Attributes, ParseWarning, SourceKind, SourceNode};
use once_cell::sync::Lazy;
use regex::Regex;

static HEADER_FLAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<\s*/?\s*(sortable|filterable)\s*/?\s*>").unwrap());

/// Splits a header label into its text and the `<sortable />` /
/// `<filterable />` flags written in it.
///
/// ```
/// use mdxblocks_editor::convert::parse_header_label;
///
/// assert_eq!(
///     parse_header_label("Price <sortable /> <filterable />"),
///     ("Price".to_string(), true, true)
/// );
/// assert_eq!(parse_header_label(" Name "), ("Name".to_string(), false, false));
/// ```
pub fn parse_header_label(raw: &str) -> (String, bool, bool) {
    let mut sortable = false;
    let mut filterable = false;
    for captures in HEADER_FLAG.captures_iter(raw) {
        match captures[1].to_ascii_lowercase().as_str() {
            "sortable" => sortable = true,
            _ => filterable = true,
        }
    }
    let label = HEADER_FLAG.replace_all(raw, "");
    (label.trim().to_string(), sortable, filterable)
}

fn apply_header_flags(table: &mut TableData) {
    for column in &mut table.columns {
        let (label, sortable, filterable) = parse_header_label(&column.label);
        column.label = label;
        column.sortable |= sortable;
        column.filterable |= filterable;
    }
}

fn table_node(table: TableData) -> DocumentNode {
    DocumentNode {
        attrs: table.into_attrs(),
        ..DocumentNode::new(NodeKind::TableBlock)
    }
}

/// Converts a GFM table. The first row is the header.
pub(super) fn from_markdown(node: &SourceNode) -> DocumentNode {
    let mut rows = node
        .children
        .iter()
        .filter(|row| row.kind == SourceKind::TableRow);
    let header: Vec<(String, bool, bool)> = rows
        .next()
        .map(|row| row.children.iter().map(header_cell).collect())
        .unwrap_or_default();
    let body = rows
        .map(|row| {
            row.children
                .iter()
                .map(|cell| {
                    let mut text = String::new();
                    cell_text(cell, &mut text);
                    text.trim().to_string()
                })
                .collect::<Vec<_>>()
        })
        .collect();
    let labels = header.iter().map(|(label, _, _)| label.clone()).collect();
    let mut table = TableData::from_grid(labels, body);
    for (column, (_, sortable, filterable)) in table.columns.iter_mut().zip(&header) {
        column.sortable = *sortable;
        column.filterable = *filterable;
    }
    table_node(table)
}

/// Label and flags of a header cell. Only `<sortable />`/`<filterable />`
/// elements set flags; the same words written as escaped text stay in the
/// label.
fn header_cell(cell: &SourceNode) -> (String, bool, bool) {
    let mut label = String::new();
    let mut sortable = false;
    let mut filterable = false;
    for child in &cell.children {
        match child.jsx_name() {
            Some(name) if name.eq_ignore_ascii_case("sortable") => sortable = true,
            Some(name) if name.eq_ignore_ascii_case("filterable") => filterable = true,
            _ => cell_text(child, &mut label),
        }
    }
    (label.trim().to_string(), sortable, filterable)
}

/// Plain text of a cell. Breaks become newlines so multi-line cells survive.
fn cell_text(node: &SourceNode, out: &mut String) {
    match &node.kind {
        SourceKind::Text { value }
        | SourceKind::InlineCode { value }
        | SourceKind::Html { value } => out.push_str(value),
        SourceKind::Break => out.push('\n'),
        SourceKind::Image { alt, .. } => out.push_str(alt),
        SourceKind::Expression { value, .. } => {
            out.push('{');
            out.push_str(value);
            out.push('}');
        }
        SourceKind::JsxElement {
            name: Some(name), ..
        } => match name.as_str() {
            "br" => out.push('\n'),
            flag if flag.eq_ignore_ascii_case("sortable")
                || flag.eq_ignore_ascii_case("filterable") =>
            {
                out.push_str(&format!("<{flag} />"))
            }
            _ => node.children.iter().for_each(|child| cell_text(child, out)),
        },
        _ => node.children.iter().for_each(|child| cell_text(child, out)),
    }
}

/// Text for one cell literal of a `data` array.
fn literal_cell(value: &LiteralValue, ctx: &mut Context<'_>, node: &SourceNode) -> String {
    match value {
        LiteralValue::String(text) => text.clone(),
        LiteralValue::Number(number) => format_number(*number),
        LiteralValue::Bool(flag) => flag.to_string(),
        LiteralValue::Null => String::new(),
        LiteralValue::Opaque(raw) => {
            ctx.warn(ParseWarning::RejectedAttribute {
                component: "Table".to_string(),
                attribute: "data".to_string(),
                reason: format!("cell `{raw}` is not a literal, kept as written"),
                location: node.location.clone(),
            });
            raw.clone()
        }
        LiteralValue::Array(_) | LiteralValue::Object(_) => value.to_source(),
    }
}

fn grid_from_data(
    data: &LiteralValue,
    ctx: &mut Context<'_>,
    node: &SourceNode,
) -> Option<Vec<Vec<String>>> {
    let LiteralValue::Array(rows) = data else {
        ctx.warn(ParseWarning::RejectedAttribute {
            component: "Table".to_string(),
            attribute: "data".to_string(),
            reason: format!("expected an array of rows, found {}", data.type_name()),
            location: node.location.clone(),
        });
        return None;
    };
    let grid = rows
        .iter()
        .map(|row| match row {
            LiteralValue::Array(cells) => cells
                .iter()
                .map(|cell| literal_cell(cell, ctx, node))
                .collect(),
            single => vec![literal_cell(single, ctx, node)],
        })
        .collect();
    Some(grid)
}

/// Converts a `<Table>` element. Rows come from the `data` attribute when
/// present, otherwise from a pipe table among the children; `columns`,
/// `sortable` and `filterable` then override column metadata.
pub(super) fn from_component(
    rule: &ComponentRule,
    attributes: &Attributes,
    node: &SourceNode,
    ctx: &mut Context<'_>,
) -> DocumentNode {
    ctx.enter(rule.name);
    let mut table = attributes
        .get("data")
        .and_then(|data| grid_from_data(data, ctx, node))
        .map(|mut grid| {
            let body = if grid.is_empty() {
                Vec::new()
            } else {
                grid.split_off(1)
            };
            let header = grid.pop().unwrap_or_default();
            let mut table = TableData::from_grid(header, body);
            apply_header_flags(&mut table);
            table
        })
        .or_else(|| table_from_children(node, ctx))
        .unwrap_or_default();

    if let Some(columns) = attributes.get("columns") {
        apply_columns(&mut table, columns);
    }
    if let Some(flag) = attributes.get("sortable") {
        apply_flag(&mut table, flag, |column, on| column.sortable = on);
    }
    if let Some(flag) = attributes.get("filterable") {
        apply_flag(&mut table, flag, |column, on| column.filterable = on);
    }
    for (name, _) in attributes.iter() {
        if rule.attribute(name).is_none() {
            ctx.warn(ParseWarning::RejectedAttribute {
                component: rule.name.to_string(),
                attribute: name.to_string(),
                reason: "not a table attribute".to_string(),
                location: node.location.clone(),
            });
        }
    }
    ctx.leave();
    table_node(table)
}

fn table_from_children(node: &SourceNode, ctx: &mut Context<'_>) -> Option<TableData> {
    let mut found = None;
    for child in &node.children {
        if child.kind == SourceKind::Table && found.is_none() {
            found = Some(TableData::from_attrs(&from_markdown(child).attrs).unwrap_or_default());
        } else if !child.is_whitespace_text() {
            ctx.warn_dropped(format!("a {} inside the table", describe(child)), child.location.as_ref());
        }
    }
    found
}

fn describe(node: &SourceNode) -> String {
    match node.jsx_name() {
        Some(name) => format!("<{name}>"),
        None => match node.kind {
            SourceKind::Paragraph => "paragraph".to_string(),
            SourceKind::Table => "second table".to_string(),
            _ => "block".to_string(),
        },
    }
}

/// `columns` holds labels or `{label, sortable, filterable}` objects, in
/// column order. Extra entries add columns.
fn apply_columns(table: &mut TableData, columns: &LiteralValue) {
    let LiteralValue::Array(entries) = columns else {
        return;
    };
    for (index, entry) in entries.iter().enumerate() {
        if table.columns.len() <= index {
            table.columns.push(TableColumn::at(index, ""));
        }
        let column = &mut table.columns[index];
        match entry {
            LiteralValue::String(raw) => {
                let (label, sortable, filterable) = parse_header_label(raw);
                column.label = label;
                column.sortable |= sortable;
                column.filterable |= filterable;
            }
            LiteralValue::Object(fields) => {
                for (key, value) in fields {
                    match (key.as_str(), value) {
                        ("label" | "title" | "name", LiteralValue::String(label)) => {
                            column.label = label.clone()
                        }
                        ("sortable", LiteralValue::Bool(on)) => column.sortable = *on,
                        ("filterable", LiteralValue::Bool(on)) => column.filterable = *on,
                        _ => log::debug!("ignoring column field `{key}`"),
                    }
                }
            }
            _ => {}
        }
    }
    fill_missing_cells(table);
}

fn fill_missing_cells(table: &mut TableData) {
    for row in &mut table.rows {
        for column in &table.columns {
            row.cells
                .entry(column.id.clone())
                .or_insert_with(|| serde_json::Value::String(String::new()));
        }
    }
}

/// `true`/`false` sets the flag on every column; an array names the
/// columns (by label or id) that get it.
fn apply_flag(table: &mut TableData, flag: &LiteralValue, set: impl Fn(&mut TableColumn, bool)) {
    match flag {
        LiteralValue::Bool(on) => table.columns.iter_mut().for_each(|column| set(column, *on)),
        LiteralValue::Array(names) => {
            for column in &mut table.columns {
                let named = names.iter().any(|name| {
                    name.as_str()
                        .is_some_and(|name| name == column.label || name == column.id)
                });
                if named {
                    set(column, true);
                }
            }
        }
        _ => {}
    }
}
