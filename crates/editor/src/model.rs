//! Editor document model: the typed node tree exchanged with the editor as
//! TipTap-shaped JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Node attributes, kept as JSON so the editor can round-trip them untouched.
pub type Attrs = Map<String, Value>;

/// Every node type the editor knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    /// Document root.
    Doc,
    /// Heading with `attrs.level`.
    Heading,
    /// Paragraph.
    Paragraph,
    /// Block quote.
    Blockquote,
    /// Bullet list.
    BulletList,
    /// Numbered list, `attrs.start` when not 1.
    OrderedList,
    /// Item of a bullet or numbered list.
    ListItem,
    /// Checklist.
    TaskList,
    /// Checklist item with `attrs.checked`.
    TaskItem,
    /// Code block with `attrs.language`.
    CodeBlock,
    /// Image with `attrs.src`.
    ImageBlock,
    /// Horizontal rule.
    HorizontalRule,
    /// Data table, content held in `attrs.columns` and `attrs.rows`.
    TableBlock,
    /// `<Card>`
    CardBlock,
    /// Callout, `attrs.type` is one of tip/info/note/warning/danger.
    InfoBlock,
    /// `<Columns>`
    ColumnGroup,
    /// `<Column>`
    Column,
    /// `<RightPanel>`
    RightPanel,
    /// `<Accordion>`
    AccordionBlock,
    /// `<AccordionTab>`
    AccordionTab,
    /// `<Tabs>`
    TabsBlock,
    /// `<Tab>`
    TabBlock,
    /// `<Endpoint>`
    EndpointBlock,
    /// `<Label>`
    LabelBlock,
    /// `<ParamField>`
    ParamBlock,
    /// `<Steps>`
    StepsBlock,
    /// `<Step>`
    StepBlock,
    /// `<CodeGroup>`
    CodeGroup,
    /// Text run.
    Text,
    /// Hard line break.
    HardBreak,
}

/// What a node may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRule {
    /// Nothing: inline leaves and atomic blocks.
    Empty,
    /// Inline nodes only.
    Inline,
    /// At most one unmarked text node.
    Code,
    /// Any block node.
    Blocks,
    /// Only the listed kinds.
    Only(&'static [NodeKind]),
}

impl NodeKind {
    /// Name used in the JSON form.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Doc => "doc",
            NodeKind::Heading => "heading",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Blockquote => "blockquote",
            NodeKind::BulletList => "bulletList",
            NodeKind::OrderedList => "orderedList",
            NodeKind::ListItem => "listItem",
            NodeKind::TaskList => "taskList",
            NodeKind::TaskItem => "taskItem",
            NodeKind::CodeBlock => "codeBlock",
            NodeKind::ImageBlock => "imageBlock",
            NodeKind::HorizontalRule => "horizontalRule",
            NodeKind::TableBlock => "tableBlock",
            NodeKind::CardBlock => "cardBlock",
            NodeKind::InfoBlock => "infoBlock",
            NodeKind::ColumnGroup => "columnGroup",
            NodeKind::Column => "column",
            NodeKind::RightPanel => "rightPanel",
            NodeKind::AccordionBlock => "accordionBlock",
            NodeKind::AccordionTab => "accordionTab",
            NodeKind::TabsBlock => "tabsBlock",
            NodeKind::TabBlock => "tabBlock",
            NodeKind::EndpointBlock => "endpointBlock",
            NodeKind::LabelBlock => "labelBlock",
            NodeKind::ParamBlock => "paramBlock",
            NodeKind::StepsBlock => "stepsBlock",
            NodeKind::StepBlock => "stepBlock",
            NodeKind::CodeGroup => "codeGroup",
            NodeKind::Text => "text",
            NodeKind::HardBreak => "hardBreak",
        }
    }

    /// Inline kinds live inside textblocks.
    pub fn is_inline(self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::HardBreak)
    }

    /// Blocks whose content is inline.
    pub fn is_textblock(self) -> bool {
        matches!(self, NodeKind::Paragraph | NodeKind::Heading)
    }

    /// Leaf blocks with all their data in attributes.
    pub fn is_atomic(self) -> bool {
        matches!(
            self,
            NodeKind::HorizontalRule
                | NodeKind::ImageBlock
                | NodeKind::EndpointBlock
                | NodeKind::LabelBlock
                | NodeKind::ParamBlock
                | NodeKind::TableBlock
        )
    }

    /// Whether the node may have no content at all.
    pub fn may_be_empty(self) -> bool {
        self.is_inline() || self.is_atomic() || self.is_textblock() || self == NodeKind::CodeBlock
    }

    /// Content rule of the kind.
    pub fn content_rule(self) -> ContentRule {
        match self {
            NodeKind::Text | NodeKind::HardBreak => ContentRule::Empty,
            _ if self.is_atomic() => ContentRule::Empty,
            NodeKind::Paragraph | NodeKind::Heading => ContentRule::Inline,
            NodeKind::CodeBlock => ContentRule::Code,
            NodeKind::StepsBlock => ContentRule::Only(&[NodeKind::StepBlock]),
            NodeKind::AccordionBlock => ContentRule::Only(&[NodeKind::AccordionTab]),
            NodeKind::TabsBlock => ContentRule::Only(&[NodeKind::TabBlock]),
            NodeKind::ColumnGroup => ContentRule::Only(&[NodeKind::Column]),
            NodeKind::CodeGroup => ContentRule::Only(&[NodeKind::CodeBlock]),
            NodeKind::BulletList | NodeKind::OrderedList => {
                ContentRule::Only(&[NodeKind::ListItem])
            }
            NodeKind::TaskList => ContentRule::Only(&[NodeKind::TaskItem]),
            _ => ContentRule::Blocks,
        }
    }

    /// Child kinds a constrained container accepts, `None` when unconstrained.
    pub fn allowed_children(self) -> Option<&'static [NodeKind]> {
        match self.content_rule() {
            ContentRule::Only(kinds) => Some(kinds),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inline formatting applied to a text node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "attrs", rename_all = "camelCase")]
pub enum Mark {
    /// Hyperlink.
    Link {
        /// Destination
        href: String,
        /// Browsing context, such as `_blank`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },
    /// Strong emphasis.
    Bold,
    /// Emphasis.
    Italic,
    /// Strikethrough.
    Strike,
    /// Underline.
    Underline,
    /// Inline code.
    Code,
}

impl Mark {
    /// Position in the canonical order.
    pub fn rank(&self) -> u8 {
        match self {
            Mark::Link { .. } => 0,
            Mark::Bold => 1,
            Mark::Italic => 2,
            Mark::Strike => 3,
            Mark::Underline => 4,
            Mark::Code => 5,
        }
    }
}

/// A canonical set of marks: ordered by [`Mark::rank`], one of each type.
///
/// ```
/// use mdxblocks_editor::model::{Mark, MarkSet};
///
/// let marks = MarkSet::from(vec![Mark::Code, Mark::Bold, Mark::Bold]);
/// assert_eq!(marks.as_slice(), &[Mark::Bold, Mark::Code]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Mark>", into = "Vec<Mark>")]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mark, replacing one of the same type.
    pub fn insert(&mut self, mark: Mark) {
        match self.0.binary_search_by_key(&mark.rank(), Mark::rank) {
            Ok(index) => self.0[index] = mark,
            Err(index) => self.0.insert(index, mark),
        }
    }

    /// Copy of the set with `mark` added.
    pub fn with(&self, mark: Mark) -> Self {
        let mut next = self.clone();
        next.insert(mark);
        next
    }

    /// Copy of the set without marks of the same type as `mark`.
    pub fn without(&self, mark: &Mark) -> Self {
        Self(
            self.0
                .iter()
                .filter(|existing| existing.rank() != mark.rank())
                .cloned()
                .collect(),
        )
    }

    /// Whether a mark of the same type as `mark` is present.
    pub fn has(&self, mark: &Mark) -> bool {
        self.0.iter().any(|existing| existing.rank() == mark.rank())
    }

    /// Marks in canonical order.
    pub fn as_slice(&self) -> &[Mark] {
        &self.0
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Mark>> for MarkSet {
    fn from(marks: Vec<Mark>) -> Self {
        let mut set = MarkSet::new();
        for mark in marks {
            if !set.has(&mark) {
                set.insert(mark);
            }
        }
        set
    }
}

impl From<MarkSet> for Vec<Mark> {
    fn from(set: MarkSet) -> Self {
        set.0
    }
}

/// A node of the editor document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    /// Node type.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Node attributes.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Attrs,
    /// Child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<DocumentNode>,
    /// Text of a `text` node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Marks of a `text` node.
    #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
    pub marks: MarkSet,
}

impl DocumentNode {
    /// Empty node of the given kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: Attrs::new(),
            content: Vec::new(),
            text: None,
            marks: MarkSet::new(),
        }
    }

    /// Node with children.
    pub fn with_content(kind: NodeKind, content: Vec<DocumentNode>) -> Self {
        Self {
            content,
            ..Self::new(kind)
        }
    }

    /// Unmarked text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::marked_text(text, MarkSet::new())
    }

    /// Text node with marks.
    pub fn marked_text(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: Some(text.into()),
            marks,
            ..Self::new(NodeKind::Text)
        }
    }

    /// Hard break.
    pub fn hard_break() -> Self {
        Self::new(NodeKind::HardBreak)
    }

    /// Paragraph holding `content`.
    pub fn paragraph(content: Vec<DocumentNode>) -> Self {
        Self::with_content(NodeKind::Paragraph, content)
    }

    /// Builder: set an attribute.
    pub fn attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    /// String attribute.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(Value::as_str)
    }

    /// Boolean attribute.
    pub fn attr_bool(&self, name: &str) -> Option<bool> {
        self.attrs.get(name).and_then(Value::as_bool)
    }

    /// Unsigned integer attribute.
    pub fn attr_u64(&self, name: &str) -> Option<u64> {
        self.attrs.get(name).and_then(Value::as_u64)
    }

    /// Concatenated text of the subtree. Hard breaks read as newlines.
    pub fn text_content(&self) -> String {
        match self.kind {
            NodeKind::Text => self.text.clone().unwrap_or_default(),
            NodeKind::HardBreak => "\n".to_string(),
            _ => self.content.iter().map(DocumentNode::text_content).collect(),
        }
    }

    /// Validate the subtree against the content rules.
    pub fn check_schema(&self) -> Result<(), SchemaViolation> {
        if self.kind == NodeKind::Text {
            return match &self.text {
                Some(text) if !text.is_empty() && self.content.is_empty() => Ok(()),
                _ => Err(SchemaViolation::EmptyText),
            };
        }
        if self.text.is_some() || !self.marks.is_empty() {
            return Err(SchemaViolation::TextOnNonText(self.kind));
        }

        let rule = self.kind.content_rule();
        for child in &self.content {
            let accepted = match rule {
                ContentRule::Empty => false,
                ContentRule::Inline => child.kind.is_inline(),
                ContentRule::Code => {
                    child.kind == NodeKind::Text
                        && child.marks.is_empty()
                        && self.content.len() == 1
                }
                ContentRule::Blocks => !child.kind.is_inline() && child.kind != NodeKind::Doc,
                ContentRule::Only(kinds) => kinds.contains(&child.kind),
            };
            if !accepted {
                return Err(SchemaViolation::InvalidChild {
                    parent: self.kind,
                    child: child.kind,
                });
            }
            child.check_schema()?;
        }

        if self.content.is_empty() && !self.kind.may_be_empty() {
            return Err(SchemaViolation::EmptyContainer(self.kind));
        }
        if self.kind == NodeKind::TableBlock {
            TableData::from_attrs(&self.attrs)?;
        }
        Ok(())
    }
}

/// A broken content rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    /// A child the parent does not accept.
    #[error("`{parent}` cannot contain `{child}`")]
    InvalidChild {
        /// Parent kind
        parent: NodeKind,
        /// Offending child kind
        child: NodeKind,
    },
    /// A container with no children.
    #[error("`{0}` must have content")]
    EmptyContainer(NodeKind),
    /// A text node with no text.
    #[error("text nodes must hold non-empty text")]
    EmptyText,
    /// `text` or `marks` set on a non-text node.
    #[error("`{0}` cannot carry text or marks")]
    TextOnNonText(NodeKind),
    /// Table attributes in the wrong shape.
    #[error("invalid table data: {0}")]
    InvalidTable(String),
}

/// Column metadata of a `tableBlock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    /// Column id, `col1`, `col2`, …
    pub id: String,
    /// Header text.
    pub label: String,
    /// Whether the column can be sorted.
    #[serde(default)]
    pub sortable: bool,
    /// Whether the column can be filtered.
    #[serde(default)]
    pub filterable: bool,
}

impl TableColumn {
    /// Column with the generated id for position `index` (0-based).
    pub fn at(index: usize, label: impl Into<String>) -> Self {
        Self {
            id: format!("col{}", index + 1),
            label: label.into(),
            sortable: false,
            filterable: false,
        }
    }
}

/// One row of a `tableBlock`; cells are keyed by column id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Row id, `row1`, `row2`, …
    pub id: String,
    /// Cell text by column id.
    pub cells: Map<String, Value>,
}

impl TableRow {
    /// Text of the cell in column `column_id`. Missing cells are empty.
    pub fn cell(&self, column_id: &str) -> String {
        match self.cells.get(column_id) {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

/// Typed view over the `columns`/`rows` attributes of a `tableBlock`.
///
/// Rows are stored flat so the editor can bind them directly:
/// `{"id": "row1", "col1": "Ann", "col2": "30"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    /// Columns in display order.
    pub columns: Vec<TableColumn>,
    /// Body rows.
    pub rows: Vec<TableRow>,
}

impl TableData {
    /// Build from a header row and body rows of cell text. Missing cells
    /// are filled with empty text.
    pub fn from_grid(header: Vec<String>, body: Vec<Vec<String>>) -> Self {
        let width = body
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);
        let mut labels = header;
        labels.resize(width, String::new());
        let columns: Vec<TableColumn> = labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| TableColumn::at(index, label))
            .collect();
        let rows = body
            .into_iter()
            .enumerate()
            .map(|(index, cells)| {
                let mut map = Map::new();
                let mut cells = cells.into_iter();
                for column in &columns {
                    map.insert(
                        column.id.clone(),
                        Value::String(cells.next().unwrap_or_default()),
                    );
                }
                TableRow {
                    id: format!("row{}", index + 1),
                    cells: map,
                }
            })
            .collect();
        Self { columns, rows }
    }

    /// Read from node attributes. Missing attributes mean an empty table.
    pub fn from_attrs(attrs: &Attrs) -> Result<Self, SchemaViolation> {
        let columns = match attrs.get("columns") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value::<Vec<TableColumn>>(value.clone())
                .map_err(|err| SchemaViolation::InvalidTable(format!("columns: {err}")))?,
        };
        let rows = match attrs.get("rows") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(rows)) => rows
                .iter()
                .enumerate()
                .map(|(index, row)| match row {
                    Value::Object(map) => {
                        let id = map
                            .get("id")
                            .and_then(Value::as_str)
                            .map_or_else(|| format!("row{}", index + 1), str::to_string);
                        let mut cells = map.clone();
                        cells.remove("id");
                        Ok(TableRow { id, cells })
                    }
                    _ => Err(SchemaViolation::InvalidTable(format!(
                        "row {} is not an object",
                        index + 1
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(SchemaViolation::InvalidTable(
                    "rows must be an array".to_string(),
                ));
            }
        };
        Ok(Self { columns, rows })
    }

    /// Write into node attributes.
    pub fn into_attrs(self) -> Attrs {
        let mut attrs = Attrs::new();
        let columns = self
            .columns
            .into_iter()
            .map(|column| {
                serde_json::json!({
                    "id": column.id,
                    "label": column.label,
                    "sortable": column.sortable,
                    "filterable": column.filterable,
                })
            })
            .collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                let mut map = Map::new();
                map.insert("id".to_string(), Value::String(row.id));
                map.extend(row.cells);
                Value::Object(map)
            })
            .collect();
        attrs.insert("columns".to_string(), Value::Array(columns));
        attrs.insert("rows".to_string(), Value::Array(rows));
        attrs
    }

    /// Whether any header or cell spans lines.
    pub fn has_multiline_text(&self) -> bool {
        self.columns.iter().any(|column| column.label.contains('\n'))
            || self.rows.iter().any(|row| {
                self.columns
                    .iter()
                    .any(|column| row.cell(&column.id).contains('\n'))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_shape() {
        let node = DocumentNode::with_content(
            NodeKind::Paragraph,
            vec![
                DocumentNode::text("plain "),
                DocumentNode::marked_text(
                    "link",
                    MarkSet::from(vec![
                        Mark::Bold,
                        Mark::Link {
                            href: "https://example.com".into(),
                            target: None,
                        },
                    ]),
                ),
            ],
        );
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "type": "paragraph",
                "content": [
                    {"type": "text", "text": "plain "},
                    {"type": "text", "text": "link", "marks": [
                        {"type": "link", "attrs": {"href": "https://example.com"}},
                        {"type": "bold"}
                    ]}
                ]
            })
        );
    }

    #[test]
    fn test_deserialize_normalizes_marks() {
        let node: DocumentNode = serde_json::from_value(json!({
            "type": "text",
            "text": "x",
            "marks": [{"type": "code"}, {"type": "italic"}, {"type": "italic"}]
        }))
        .unwrap();
        assert_eq!(node.marks.as_slice(), &[Mark::Italic, Mark::Code]);
    }

    #[test]
    fn test_schema_rejects_wrong_children() {
        let steps = DocumentNode::with_content(
            NodeKind::StepsBlock,
            vec![DocumentNode::paragraph(vec![DocumentNode::text("x")])],
        );
        assert_eq!(
            steps.check_schema(),
            Err(SchemaViolation::InvalidChild {
                parent: NodeKind::StepsBlock,
                child: NodeKind::Paragraph,
            })
        );

        let card = DocumentNode::new(NodeKind::CardBlock);
        assert_eq!(
            card.check_schema(),
            Err(SchemaViolation::EmptyContainer(NodeKind::CardBlock))
        );

        let empty_text = DocumentNode::paragraph(vec![DocumentNode::text("")]);
        assert_eq!(empty_text.check_schema(), Err(SchemaViolation::EmptyText));
    }

    #[test]
    fn test_schema_accepts_empty_textblocks_and_atoms() {
        let doc = DocumentNode::with_content(
            NodeKind::Doc,
            vec![
                DocumentNode::paragraph(vec![]),
                DocumentNode::new(NodeKind::CodeBlock),
                DocumentNode::new(NodeKind::HorizontalRule),
                DocumentNode::new(NodeKind::TableBlock),
            ],
        );
        assert_eq!(doc.check_schema(), Ok(()));
    }

    #[test]
    fn test_table_attrs_round_trip() {
        let table = TableData::from_grid(
            vec!["Name".into(), "Age".into()],
            vec![vec!["Ann".into(), "30".into()], vec!["Bob".into()]],
        );
        assert_eq!(table.rows[1].cell("col2"), "");
        let attrs = table.clone().into_attrs();
        assert_eq!(
            attrs["rows"],
            json!([
                {"id": "row1", "col1": "Ann", "col2": "30"},
                {"id": "row2", "col1": "Bob", "col2": ""}
            ])
        );
        assert_eq!(TableData::from_attrs(&attrs).unwrap(), table);
    }
}
