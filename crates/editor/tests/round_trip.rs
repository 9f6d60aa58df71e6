use mdxblocks_editor::model::{DocumentNode, Mark, MarkSet, NodeKind};
use mdxblocks_editor::{Options, parse_document, serialize_document};

fn parse(source: &str) -> DocumentNode {
    let result = parse_document(source, &Options::default());
    assert!(result.warnings().is_empty(), "{:?}", result.warnings());
    result
        .into_result()
        .unwrap_or_else(|message| panic!("fixture failed to parse: {message}\n---\n{source}"))
}

/// parse(serialize(d)) == d, and serializing again changes nothing.
fn assert_round_trip(doc: &DocumentNode) -> String {
    doc.check_schema().expect("input must be schema-valid");
    let first = serialize_document(doc).expect("serializable");
    let reparsed = parse(&first);
    assert_eq!(&reparsed, doc, "document changed after a round trip through:\n{first}");
    let second = serialize_document(&reparsed).expect("serializable");
    assert_eq!(second, first);
    first
}

const GUIDE: &str = r#"---
title: Guide
tags:
  - mdx
---

import { Chart } from './chart'

# Getting started

Install the **CLI** with `npm i -g tool` and read [the docs](https://example.com/docs).

> [!TIP]
> Keep it *short*.

- [x] write
- [ ] ship

1. one
2. two

```ts title="a.ts"
const a = 1;
```

<Card title="Deploy" icon="rocket">

Push to **main**.

</Card>

<Tabs>
  <Tab title="npm">

Run it.

  </Tab>
</Tabs>

| Plan <sortable /> | Price |
| --- | --- |
| Pro | 12 |

![Logo](/logo.png)

***
"#;

#[test]
fn test_guide_round_trips() {
    let doc = parse(GUIDE);
    let kinds: Vec<NodeKind> = doc.content.iter().map(|node| node.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Heading,
            NodeKind::Paragraph,
            NodeKind::InfoBlock,
            NodeKind::TaskList,
            NodeKind::OrderedList,
            NodeKind::CodeBlock,
            NodeKind::CardBlock,
            NodeKind::TabsBlock,
            NodeKind::TableBlock,
            NodeKind::ImageBlock,
            NodeKind::HorizontalRule,
        ]
    );
    assert_round_trip(&doc);
}

#[test]
fn test_guide_canonical_output() {
    let output = serialize_document(&parse(GUIDE)).unwrap();
    insta::assert_snapshot!(output.trim_end(), @r#"
    ---
    tags:
    - mdx
    title: Guide
    ---

    import { Chart } from './chart'

    # Getting started

    Install the **CLI** with `npm i -g tool` and read [the docs](https://example.com/docs).

    <Tip>

    Keep it *short*.

    </Tip>

    - [x] write
    - [ ] ship

    1. one
    2. two

    ```ts title="a.ts"
    const a = 1;
    ```

    <Card title="Deploy" icon="rocket">

    Push to **main**.

    </Card>

    <Tabs>

    <Tab title="npm">

    Run it.

    </Tab>

    </Tabs>

    | Plan <sortable /> | Price |
    | --- | --- |
    | Pro | 12 |

    ![Logo](/logo.png)

    ***
    "#);
}

fn paragraph(text: &str) -> DocumentNode {
    DocumentNode::paragraph(vec![DocumentNode::text(text)])
}

fn doc(content: Vec<DocumentNode>) -> DocumentNode {
    DocumentNode::with_content(NodeKind::Doc, content)
}

#[test]
fn test_text_that_looks_like_syntax_survives() {
    let tricky = [
        "* not a list",
        "1. not ordered",
        "a_b*c",
        "{curly} <tag>",
        "`tick`",
        "[x] maybe",
        "# hash",
        "> quote",
        "| pipe |",
        "&amp; stays literal",
        "~~ tildes ~~",
        "  leading spaces",
        "trailing spaces  ",
        "import x from 'y'",
        "export default 1",
        "back\\slash",
        "Visit https://example.com",
        "see www.example.com",
        "mail me@example.com",
    ];
    let document = doc(tricky.iter().map(|text| paragraph(text)).collect());
    assert_round_trip(&document);
}

#[test]
fn test_marks_round_trip() {
    let marks = |list: Vec<Mark>| MarkSet::from(list);
    let link = Mark::Link {
        href: "https://example.com".into(),
        target: None,
    };
    let blank = Mark::Link {
        href: "/new".into(),
        target: Some("_blank".into()),
    };
    let document = doc(vec![
        DocumentNode::paragraph(vec![
            DocumentNode::marked_text("bold", marks(vec![Mark::Bold])),
            DocumentNode::text(" and "),
            DocumentNode::marked_text("italic", marks(vec![Mark::Italic])),
            DocumentNode::text(" and "),
            DocumentNode::marked_text("struck", marks(vec![Mark::Strike])),
            DocumentNode::text(" and "),
            DocumentNode::marked_text("under", marks(vec![Mark::Underline])),
        ]),
        DocumentNode::paragraph(vec![
            DocumentNode::marked_text("a link", marks(vec![link.clone()])),
            DocumentNode::text(", "),
            DocumentNode::marked_text("bold link", marks(vec![link, Mark::Bold])),
            DocumentNode::text(", "),
            DocumentNode::marked_text("new tab", marks(vec![blank])),
        ]),
        DocumentNode::paragraph(vec![
            DocumentNode::text("code "),
            DocumentNode::marked_text("x `y` z", marks(vec![Mark::Code])),
            DocumentNode::hard_break(),
            DocumentNode::text("next line"),
        ]),
    ]);
    assert_round_trip(&document);
}

#[test]
fn test_marks_against_punctuation_round_trip() {
    for source in ["a<b>(b)</b>", "<i>b.</i>c", "x<del>(y)</del>z", "**(b)** c"] {
        let document = parse(source);
        assert_round_trip(&document);
    }
    let output = assert_round_trip(&parse("a<b>(b)</b>"));
    assert_eq!(output, "a<strong>(b)</strong>\n");
}

#[test]
fn test_heading_hashes_round_trip() {
    for source in ["## \\#", "## C\\#", "# Trailing \\#"] {
        assert_round_trip(&parse(source));
    }
}

#[test]
fn test_components_round_trip() {
    let source = r#"<Steps>

<Step title="Install" icon="download">

Run `npm i`.

</Step>

<Step title="Configure">

Edit the file.

</Step>

</Steps>

<Columns cols={3}>

<Column>

Left

</Column>

<Column>

Right

</Column>

</Columns>

<Accordion>

<AccordionTab title="FAQ" defaultOpen>

Answer.

</AccordionTab>

</Accordion>

<CodeGroup>

```js
a()
```

```py
a()
```

</CodeGroup>

<Endpoint method="POST" path="/users" />

<ParamField path="id" type="number" required>The user id.</ParamField>

<Label color="green">Beta</Label>

<RightPanel>

Aside.

</RightPanel>

<img src="/a.png" alt="A" width={300} />
"#;
    let document = parse(source);
    assert_eq!(document.content.len(), 9);
    let output = assert_round_trip(&document);
    assert_eq!(output, source);
}

#[test]
fn test_multiline_table_uses_component_form() {
    let source = "<Table data={[[\"Name\", \"Notes <filterable />\"], [\"Ann\", \"line one\\nline two\"]]} />\n";
    let document = parse(source);
    let output = assert_round_trip(&document);
    assert_eq!(output, source);
}

#[test]
fn test_adjacent_lists_stay_separate() {
    let source = "- a\n\n* b\n\n- c\n";
    let document = parse(source);
    assert_eq!(document.content.len(), 3);
    assert_eq!(assert_round_trip(&document), source);
}

#[test]
fn test_nested_blocks_round_trip() {
    let source = "> quoted\n>\n> - inside\n>   - deeper\n\n3. three\n\n   ```\n   code\n   ```\n4. four\n";
    let document = parse(source);
    assert_round_trip(&document);
}
