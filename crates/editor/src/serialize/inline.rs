//! Inline content and text escaping.

use super::components::jsx_attribute;
use crate::model::{DocumentNode, Mark, NodeKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static ENTITY_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{0,31});").unwrap()
});

/// Characters that turn plain text into a GFM autolink literal: the `:` of
/// `http(s)://`, the `.` after `www` and the `@` of an email address.
static AUTOLINK_TRIGGER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bhttps?(:)//|\bwww(\.)|[\w.+-](@)[\w-]").unwrap()
});

/// Where inline content is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Inline {
    /// Paragraphs: hard breaks are `\` + newline.
    Paragraph,
    /// Headings: hard breaks are `<br />`.
    Heading,
}

/// Whether `text` starts with something a parser would read as a
/// character reference.
pub(super) fn starts_with_entity(text: &str) -> bool {
    ENTITY_LIKE.is_match(text)
}

/// Escapes plain text so it reads back unchanged.
///
/// `line_start`/`line_end` say whether the text begins or ends a line of
/// output; whitespace there would be stripped and block markers would be
/// recognised, so both are encoded. `cell` additionally escapes `|`.
pub(super) fn escape_text(text: &str, line_start: bool, line_end: bool, cell: bool) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    for (index, line) in lines.into_iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        escape_line(line, index > 0 || line_start, index < last || line_end, cell, &mut out);
    }
    out
}

fn escape_line(line: &str, at_start: bool, at_end: bool, cell: bool, out: &mut String) {
    let mut body = line;
    let mut tail = "";
    if at_end {
        let trimmed = body.trim_end_matches([' ', '\t']);
        tail = &body[trimmed.len()..];
        body = trimmed;
    }
    if at_start {
        let trimmed = body.trim_start_matches([' ', '\t']);
        push_whitespace_refs(&body[..body.len() - trimmed.len()], out);
        body = trimmed;

        let digits = body.len() - body.trim_start_matches(|ch: char| ch.is_ascii_digit()).len();
        if let Some(first) = body.chars().next()
            && matches!(first, '#' | '>' | '-' | '+' | '=')
        {
            out.push('\\');
            out.push(first);
            body = &body[1..];
        } else if digits > 0 && matches!(body[digits..].chars().next(), Some('.' | ')')) {
            out.push_str(&body[..digits]);
            out.push('\\');
            out.push_str(&body[digits..=digits]);
            body = &body[digits + 1..];
        }
    }
    escape_chars(body, cell, out);
    push_whitespace_refs(tail, out);
}

fn escape_chars(text: &str, cell: bool, out: &mut String) {
    let triggers: Vec<usize> = AUTOLINK_TRIGGER
        .captures_iter(text)
        .filter_map(|captures| captures.iter().skip(1).flatten().next())
        .map(|trigger| trigger.start())
        .collect();
    for (index, ch) in text.char_indices() {
        match ch {
            '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '{' | '}' | '~' => {
                out.push('\\');
                out.push(ch);
            }
            _ if triggers.contains(&index) => {
                out.push('\\');
                out.push(ch);
            }
            '|' if cell => out.push_str("\\|"),
            '&' if starts_with_entity(&text[index..]) => out.push_str("\\&"),
            _ => out.push(ch),
        }
    }
}

fn push_whitespace_refs(whitespace: &str, out: &mut String) {
    for ch in whitespace.chars() {
        out.push_str(if ch == '\t' { "&#9;" } else { "&#32;" });
    }
}

/// Link destination, in angle brackets when it would not survive bare.
pub(super) fn destination(url: &str) -> String {
    if url
        .chars()
        .any(|ch| ch.is_whitespace() || matches!(ch, '(' | ')' | '<' | '>'))
    {
        format!("<{}>", url.replace('<', "\\<").replace('>', "\\>"))
    } else {
        url.to_string()
    }
}

fn longest_run(text: &str, needle: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == needle {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Fence long enough for `text`, never shorter than `min`.
pub(super) fn fence_for(text: &str, needle: char, min: usize) -> String {
    needle.to_string().repeat((longest_run(text, needle) + 1).max(min))
}

fn code_span(text: &str) -> String {
    let text = text.replace('\n', " ");
    let fence = fence_for(&text, '`', 1);
    let pad = text.starts_with('`')
        || text.ends_with('`')
        || (text.starts_with(' ') && text.ends_with(' ') && !text.trim().is_empty());
    if pad {
        format!("{fence} {text} {fence}")
    } else {
        format!("{fence}{text}{fence}")
    }
}

/// Marks written as delimiters around text, outermost first. Code is a
/// span of its own and never on the stack.
fn stack_marks(node: Option<&DocumentNode>) -> Vec<Mark> {
    match node {
        Some(node) if node.kind == NodeKind::Text => node
            .marks
            .as_slice()
            .iter()
            .filter(|mark| **mark != Mark::Code)
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}

/// How a character next to a delimiter run reads under the flanking rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Space,
    Punct,
    Word,
}

fn side(ch: Option<char>) -> Side {
    match ch {
        None => Side::Space,
        Some(ch) if ch.is_whitespace() => Side::Space,
        Some(ch) if ch.is_alphanumeric() => Side::Word,
        Some(_) => Side::Punct,
    }
}

/// Whether a `*` or `~` run flanks its content: the inner character is not
/// whitespace, and punctuation inside needs space or punctuation outside.
fn flanks(outer: Side, inner: Side) -> bool {
    inner != Side::Space && (inner == Side::Word || outer != Side::Word)
}

/// Tag used when a delimiter would not parse where it stands.
fn tag_name(mark: &Mark) -> Option<&'static str> {
    match mark {
        Mark::Bold => Some("strong"),
        Mark::Italic => Some("em"),
        Mark::Strike => Some("del"),
        _ => None,
    }
}

struct OpenMark {
    mark: Mark,
    /// Offset of the opening delimiter in the output.
    at: usize,
}

struct InlineWriter {
    out: String,
    open: Vec<OpenMark>,
    context: Inline,
}

impl InlineWriter {
    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn push_text(&mut self, text: &str, line_end: bool) {
        let line_start = self.at_line_start();
        self.out.push_str(&escape_text(text, line_start, line_end, false));
    }

    fn common_prefix(&self, wanted: &[Mark]) -> usize {
        self.open
            .iter()
            .zip(wanted)
            .take_while(|(open, wanted)| open.mark == **wanted)
            .count()
    }

    /// Closes marks down to `keep`. `after` is the side of whatever is
    /// written once they are closed.
    fn close_to(&mut self, keep: usize, after: Side) {
        while self.open.len() > keep {
            let Some(open) = self.open.pop() else { break };
            let after = if self.open.len() > keep {
                Side::Punct
            } else {
                after
            };
            self.close_mark(open, after);
        }
    }

    /// Writes the closing delimiter, or rewrites the pair as tags when
    /// either delimiter would read as literal text.
    fn close_mark(&mut self, open: OpenMark, after: Side) {
        if let Some(tag) = tag_name(&open.mark) {
            let inner = open.at + opening(&open.mark).len();
            let before = side(self.out[..open.at].chars().next_back());
            let first = side(self.out[inner..].chars().next());
            let last = side(self.out.chars().next_back());
            if !flanks(before, first) || !flanks(after, last) {
                self.out.replace_range(open.at..inner, &format!("<{tag}>"));
                self.out.push_str(&format!("</{tag}>"));
                return;
            }
        }
        self.out.push_str(&closing(&open.mark));
    }

    fn open_from(&mut self, wanted: &[Mark], keep: usize) {
        for mark in &wanted[keep..] {
            let at = self.out.len();
            self.out.push_str(&opening(mark));
            self.open.push(OpenMark {
                mark: mark.clone(),
                at,
            });
        }
    }

    /// Side of the first character written for `next`.
    fn next_side(&self, next: Option<&DocumentNode>) -> Side {
        let Some(next) = next else {
            return Side::Space;
        };
        if next.kind != NodeKind::Text || next.marks.has(&Mark::Code) {
            return Side::Punct;
        }
        let first = next.text.as_deref().and_then(|text| text.chars().next());
        if first.is_none_or(char::is_whitespace) {
            return Side::Space;
        }
        let wanted = stack_marks(Some(next));
        if wanted.len() > self.common_prefix(&wanted) {
            Side::Punct
        } else {
            side(first)
        }
    }

    /// Closes whatever the next node does not share. `spaced` means
    /// whitespace is written before the next node.
    fn close_for(&mut self, next: Option<&DocumentNode>, spaced: bool) {
        let after = if spaced {
            Side::Space
        } else {
            self.next_side(next)
        };
        let keep = self.common_prefix(&stack_marks(next));
        self.close_to(keep, after);
    }

    fn hard_break(&mut self, at_edge: bool) {
        self.close_to(0, Side::Punct);
        match self.context {
            Inline::Paragraph if !at_edge => self.out.push_str("\\\n"),
            _ => self.out.push_str("<br />"),
        }
    }

    fn text(&mut self, node: &DocumentNode, next: Option<&DocumentNode>) {
        let text = node.text.as_deref().unwrap_or_default();
        let wanted = stack_marks(Some(node));
        let line_end = next.is_none_or(|next| next.kind == NodeKind::HardBreak);
        let keep = self.common_prefix(&wanted);

        if node.marks.has(&Mark::Code) {
            self.close_to(keep, Side::Punct);
            self.open_from(&wanted, keep);
            self.out.push_str(&code_span(text));
            self.close_for(next, false);
            return;
        }

        let core = text.trim_matches([' ', '\t']);
        if core.is_empty() {
            // Whitespace keeps whatever marks are already open; opening a
            // delimiter on it would not parse.
            self.close_for(next, !text.is_empty());
            self.push_text(text, line_end);
            return;
        }

        let lead = &text[..text.len() - text.trim_start_matches([' ', '\t']).len()];
        let trail = &text[text.trim_end_matches([' ', '\t']).len()..];
        let after = if !lead.is_empty() {
            Side::Space
        } else if wanted.len() > keep {
            Side::Punct
        } else {
            side(core.chars().next())
        };
        self.close_to(keep, after);
        self.push_text(lead, false);
        self.open_from(&wanted, keep);
        self.push_text(core, false);
        self.close_for(next, !trail.is_empty());
        self.push_text(trail, line_end);
    }
}

fn opening(mark: &Mark) -> String {
    match mark {
        Mark::Link { target: None, .. } => "[".to_string(),
        Mark::Link {
            href,
            target: Some(target),
        } => format!(
            "<a {} {}>",
            jsx_attribute("href", &Value::from(href.as_str())),
            jsx_attribute("target", &Value::from(target.as_str()))
        ),
        Mark::Bold => "**".to_string(),
        Mark::Italic => "*".to_string(),
        Mark::Strike => "~~".to_string(),
        Mark::Underline => "<u>".to_string(),
        Mark::Code => String::new(),
    }
}

fn closing(mark: &Mark) -> String {
    match mark {
        Mark::Link { href, target: None } => format!("]({})", destination(href)),
        Mark::Link { .. } => "</a>".to_string(),
        Mark::Bold => "**".to_string(),
        Mark::Italic => "*".to_string(),
        Mark::Strike => "~~".to_string(),
        Mark::Underline => "</u>".to_string(),
        Mark::Code => String::new(),
    }
}

/// Writes inline content. Marks shared by neighbouring text stay open
/// across them, so `**a *b***` is written rather than `**a*****b***`.
pub(super) fn write_inline(content: &[DocumentNode], context: Inline) -> String {
    let mut writer = InlineWriter {
        out: String::new(),
        open: Vec::new(),
        context,
    };
    for (index, node) in content.iter().enumerate() {
        let next = content.get(index + 1);
        match node.kind {
            NodeKind::HardBreak => writer.hard_break(index == 0 || next.is_none()),
            NodeKind::Text => writer.text(node, next),
            other => log::debug!("skipping `{other}` in inline content"),
        }
    }
    writer.close_to(0, Side::Space);
    writer.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MarkSet;

    fn marked(text: &str, marks: Vec<Mark>) -> DocumentNode {
        DocumentNode::marked_text(text, MarkSet::from(marks))
    }

    #[test]
    fn test_escape_specials() {
        assert_eq!(escape_text("a*b_c`d", false, false, false), "a\\*b\\_c\\`d");
        assert_eq!(escape_text("{x} <y>", false, false, false), "\\{x\\} \\<y>");
        assert_eq!(escape_text("a|b", false, false, true), "a\\|b");
        assert_eq!(escape_text("a|b", false, false, false), "a|b");
        assert_eq!(escape_text("&amp; & co", false, false, false), "\\&amp; & co");
    }

    #[test]
    fn test_escape_autolink_literals() {
        assert_eq!(
            escape_text("Visit https://example.com", false, false, false),
            "Visit https\\://example.com"
        );
        assert_eq!(escape_text("see www.example.com", false, false, false), "see www\\.example.com");
        assert_eq!(escape_text("me@example.com", false, false, false), "me\\@example.com");
        assert_eq!(escape_text("at @home, ratio 3:1", false, false, false), "at @home, ratio 3:1");
    }

    #[test]
    fn test_escape_line_starts() {
        assert_eq!(escape_text("# not a heading", true, true, false), "\\# not a heading");
        assert_eq!(escape_text("1. one\n2) two", true, true, false), "1\\. one\n2\\) two");
        assert_eq!(escape_text("- a\n> b", true, true, false), "\\- a\n\\> b");
        assert_eq!(escape_text("- a", false, false, false), "- a");
    }

    #[test]
    fn test_escape_edge_whitespace() {
        assert_eq!(escape_text("  indented ", true, true, false), "&#32;&#32;indented&#32;");
        assert_eq!(escape_text("a \n\tb", false, false, false), "a&#32;\n&#9;b");
        assert_eq!(escape_text(" mid ", false, false, false), " mid ");
    }

    #[test]
    fn test_nested_marks_share_delimiters() {
        let content = vec![
            marked("bold ", vec![Mark::Bold]),
            marked("both", vec![Mark::Bold, Mark::Italic]),
            DocumentNode::text(" plain"),
        ];
        assert_eq!(write_inline(&content, Inline::Paragraph), "**bold *both*** plain");
    }

    #[test]
    fn test_whitespace_moves_outside_delimiters() {
        let content = vec![
            DocumentNode::text("a"),
            marked(" b ", vec![Mark::Italic]),
            DocumentNode::text("c"),
        ];
        assert_eq!(write_inline(&content, Inline::Paragraph), "a *b* c");
    }

    #[test]
    fn test_unflanked_delimiters_become_tags() {
        let content = vec![DocumentNode::text("a"), marked("(b)", vec![Mark::Bold])];
        assert_eq!(write_inline(&content, Inline::Paragraph), "a<strong>(b)</strong>");

        let content = vec![marked("b.", vec![Mark::Italic]), DocumentNode::text("c")];
        assert_eq!(write_inline(&content, Inline::Paragraph), "<em>b.</em>c");

        let content = vec![marked("(x)", vec![Mark::Strike]), DocumentNode::text("y")];
        assert_eq!(write_inline(&content, Inline::Paragraph), "<del>(x)</del>y");

        let content = vec![marked("(b)", vec![Mark::Bold]), DocumentNode::text(" c")];
        assert_eq!(write_inline(&content, Inline::Paragraph), "**(b)** c");
    }

    #[test]
    fn test_links() {
        let link = Mark::Link {
            href: "https://example.com/a b".into(),
            target: None,
        };
        let content = vec![marked("go", vec![link])];
        assert_eq!(
            write_inline(&content, Inline::Paragraph),
            "[go](<https://example.com/a b>)"
        );

        let blank = Mark::Link {
            href: "/x".into(),
            target: Some("_blank".into()),
        };
        let content = vec![marked("new tab", vec![blank, Mark::Bold])];
        assert_eq!(
            write_inline(&content, Inline::Paragraph),
            "<a href=\"/x\" target=\"_blank\">**new tab**</a>"
        );
    }

    #[test]
    fn test_code_spans() {
        let content = vec![
            DocumentNode::text("use "),
            marked("a`b", vec![Mark::Code]),
            DocumentNode::text(" or "),
            marked("`x`", vec![Mark::Code, Mark::Bold]),
        ];
        assert_eq!(
            write_inline(&content, Inline::Paragraph),
            "use ``a`b`` or **`` `x` ``**"
        );
    }

    #[test]
    fn test_hard_breaks() {
        let content = vec![
            marked("a", vec![Mark::Bold]),
            DocumentNode::hard_break(),
            marked("b", vec![Mark::Bold]),
        ];
        assert_eq!(write_inline(&content, Inline::Paragraph), "**a**\\\n**b**");
        assert_eq!(write_inline(&content, Inline::Heading), "**a**<br />**b**");

        let trailing = vec![DocumentNode::text("end"), DocumentNode::hard_break()];
        assert_eq!(write_inline(&trailing, Inline::Paragraph), "end<br />");
    }

    #[test]
    fn test_fence_for() {
        assert_eq!(fence_for("no ticks", '`', 3), "```");
        assert_eq!(fence_for("````", '`', 3), "`````");
    }
}
