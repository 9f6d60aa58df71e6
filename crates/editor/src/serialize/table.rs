//! `tableBlock` → pipe table, or `<Table data={…} />` when a pipe table
//! cannot hold the content.

use super::Serializer;
use super::inline::escape_text;
use crate::model::{DocumentNode, TableColumn, TableData};
use mdxblocks_core::LiteralValue;

fn header_label(column: &TableColumn) -> String {
    let mut label = column.label.clone();
    if column.sortable {
        label.push_str(" <sortable />");
    }
    if column.filterable {
        label.push_str(" <filterable />");
    }
    label.trim_start().to_string()
}

fn pipe_row(cells: impl IntoIterator<Item = String>) -> String {
    let cells: Vec<String> = cells.into_iter().collect();
    format!("| {} |", cells.join(" | "))
}

fn pipe_table(table: &TableData) -> String {
    let header = pipe_row(table.columns.iter().map(|column| {
        let mut cell = escape_text(&column.label, true, true, true);
        if column.sortable {
            cell.push_str(" <sortable />");
        }
        if column.filterable {
            cell.push_str(" <filterable />");
        }
        cell
    }));
    let delimiter = pipe_row(table.columns.iter().map(|_| "---".to_string()));
    let mut lines = vec![header, delimiter];
    for row in &table.rows {
        lines.push(pipe_row(
            table
                .columns
                .iter()
                .map(|column| escape_text(&row.cell(&column.id), true, true, true)),
        ));
    }
    lines.join("\n")
}

fn jsx_table(table: &TableData) -> String {
    let header = LiteralValue::Array(
        table
            .columns
            .iter()
            .map(|column| LiteralValue::String(header_label(column)))
            .collect(),
    );
    let rows = table.rows.iter().map(|row| {
        LiteralValue::Array(
            table
                .columns
                .iter()
                .map(|column| LiteralValue::String(row.cell(&column.id)))
                .collect(),
        )
    });
    let data = LiteralValue::Array(std::iter::once(header).chain(rows).collect());
    format!("<Table data={{{}}} />", data.to_source())
}

impl Serializer<'_> {
    pub(super) fn table(&self, node: &DocumentNode) -> String {
        let table = TableData::from_attrs(&node.attrs).unwrap_or_default();
        if table.columns.is_empty() {
            "<Table />".to_string()
        } else if table.has_multiline_text() {
            jsx_table(&table)
        } else {
            pipe_table(&table)
        }
    }
}
