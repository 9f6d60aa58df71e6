//! Recovering a source line from an engine error message.
//!
//! Messages from the markdown engine and from the YAML parser place the
//! location differently. These helpers try the known phrasings in a fixed
//! order and report the first hit. The result is advisory: callers always
//! surface the raw message as well.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Line (and column, when the message has one) an error points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorLocation {
    /// 1-indexed line
    pub line: usize,
    /// 1-indexed column
    pub column: Option<usize>,
}

#[derive(Clone, Copy)]
enum Phrasing {
    /// `(3:5)`
    Point,
    /// `(3:5-3:10)`
    Range,
    /// `3:5:` or `3:5-3:10:` leading a line
    Prefix,
    /// `at line 3` / `at line 3, column 5`
    AtLine,
    /// `position 42`, a byte offset
    Offset,
}

static PHRASINGS: Lazy<Vec<(Phrasing, Regex)>> = Lazy::new(|| {
    vec![
        (Phrasing::Point, Regex::new(r"\((\d+):(\d+)\)").unwrap()),
        (
            Phrasing::Range,
            Regex::new(r"\((\d+):(\d+)-\d+:\d+\)").unwrap(),
        ),
        (
            Phrasing::Prefix,
            Regex::new(r"(?m)(?:^|[\s:])(\d+):(\d+)(?:-\d+:\d+)?:(?:\s|$)").unwrap(),
        ),
        (
            Phrasing::AtLine,
            Regex::new(r"(?i)\bat line (\d+)(?:,? column (\d+))?").unwrap(),
        ),
        (Phrasing::Offset, Regex::new(r"(?i)\bposition (\d+)").unwrap()),
    ]
});

/// Finds the line an error message points at.
///
/// Offsets (`position N`) need the source text and are skipped here; use
/// [`locate_error_in`] when the source is at hand.
///
/// ```
/// use mdxblocks_core::locate_error;
///
/// let location = locate_error("Unexpected closing tag (3:1-3:10)").unwrap();
/// assert_eq!(location.line, 3);
/// assert_eq!(locate_error("something went wrong"), None);
/// ```
pub fn locate_error(message: &str) -> Option<ErrorLocation> {
    locate(message, None)
}

/// Like [`locate_error`], also mapping `position N` offsets into `source`.
pub fn locate_error_in(message: &str, source: &str) -> Option<ErrorLocation> {
    locate(message, Some(source))
}

fn locate(message: &str, source: Option<&str>) -> Option<ErrorLocation> {
    PHRASINGS.iter().find_map(|(phrasing, regex)| {
        let captures = regex.captures(message)?;
        let number = |index: usize| -> Option<usize> { captures.get(index)?.as_str().parse().ok() };
        match phrasing {
            Phrasing::Point | Phrasing::Range | Phrasing::Prefix | Phrasing::AtLine => {
                Some(ErrorLocation {
                    line: number(1)?,
                    column: number(2),
                })
            }
            Phrasing::Offset => {
                let offset = number(1)?;
                Some(ErrorLocation {
                    line: line_at_offset(source?, offset),
                    column: None,
                })
            }
        }
    })
}

fn line_at_offset(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|byte| **byte == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(message: &str) -> Option<usize> {
        locate_error(message).map(|location| location.line)
    }

    #[test]
    fn test_point_and_range() {
        assert_eq!(
            locate_error("Unexpected character (4:12)"),
            Some(ErrorLocation {
                line: 4,
                column: Some(12)
            })
        );
        assert_eq!(line("Expected a closing tag for `<Card>` (3:1-3:7)"), Some(3));
    }

    #[test]
    fn test_prefixed_messages() {
        assert_eq!(line("7:2: Unexpected end of file in expression"), Some(7));
        assert_eq!(line("2:1-2:8: Unexpected lazy line"), Some(2));
        assert_eq!(line("page.mdx:12:4: Could not parse"), Some(12));
    }

    #[test]
    fn test_at_line() {
        assert_eq!(
            locate_error("mapping values are not allowed at line 5, column 9"),
            Some(ErrorLocation {
                line: 5,
                column: Some(9)
            })
        );
    }

    #[test]
    fn test_order_prefers_parenthesized() {
        assert_eq!(line("1:1: see (6:2) at line 9"), Some(6));
    }

    #[test]
    fn test_offset_needs_source() {
        let message = "Unexpected token at position 8";
        assert_eq!(locate_error(message), None);
        let location = locate_error_in(message, "one\ntwo\nthree").unwrap();
        assert_eq!(location.line, 3);
        assert_eq!(locate_error_in("position 999", "a\nb").unwrap().line, 2);
    }

    #[test]
    fn test_no_location() {
        assert_eq!(line("Could not parse expression with acorn"), None);
    }
}
