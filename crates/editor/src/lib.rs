#![deny(missing_docs)]
//! mdxblocks editor layer: the block document model, the component
//! catalogue, and conversion between MDX source and editor documents.

/// Source tree → editor document conversion.
pub mod convert;
/// Async debounced conversion driver.
#[cfg(feature = "driver")]
pub mod driver;
/// Editor document model.
pub mod model;
/// Component catalogue.
pub mod registry;
/// Editor document → MDX text.
pub mod serialize;

pub use convert::{Conversion, convert, convert_with};
pub use model::{Attrs, DocumentNode, Mark, MarkSet, NodeKind, SchemaViolation, TableData};
pub use registry::{Catalogue, ComponentRule, catalogue};
pub use serialize::{SerializeError, serialize, serialize_with};

use mdxblocks_core::{MdxError, ParseOptions, locate_error_in, parse_source};
use serde::{Deserialize, Serialize};

/// Parser switches exposed to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Tables, task lists, strikethrough and autolink literals.
    pub gfm: bool,
    /// A leading `---` YAML block is frontmatter.
    pub frontmatter: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            gfm: true,
            frontmatter: true,
        }
    }
}

impl Options {
    /// Front-end options: MDX defaults with these switches applied.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            gfm: self.gfm,
            frontmatter: self.frontmatter,
            ..ParseOptions::mdx()
        }
    }
}

/// Outcome of [`parse_document`]: a document, or an error message with the
/// line it points at when one could be found.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    document: Option<DocumentNode>,
    parse_error: Option<String>,
    error_line: Option<usize>,
    warnings: Vec<String>,
}

impl ParseResult {
    /// A converted document with its warnings.
    pub fn success(document: DocumentNode, warnings: Vec<String>) -> Self {
        Self {
            document: Some(document),
            parse_error: None,
            error_line: None,
            warnings,
        }
    }

    /// A failed parse.
    pub fn failure(message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            document: None,
            parse_error: Some(message.into()),
            error_line: line,
            warnings: Vec::new(),
        }
    }

    /// The document, when parsing succeeded.
    pub fn document(&self) -> Option<&DocumentNode> {
        self.document.as_ref()
    }

    /// The engine's error message, when parsing failed.
    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    /// 1-based line of the error, when known.
    pub fn error_line(&self) -> Option<usize> {
        self.error_line
    }

    /// Non-fatal findings, rendered for display.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Whether a document is present.
    pub fn is_success(&self) -> bool {
        self.document.is_some()
    }

    /// The document, or the error message.
    pub fn into_result(self) -> Result<DocumentNode, String> {
        match (self.document, self.parse_error) {
            (Some(document), _) => Ok(document),
            (None, message) => Err(message.unwrap_or_default()),
        }
    }
}

fn failure(error: MdxError, source: &str) -> ParseResult {
    let message = error.to_string();
    let line = error
        .location()
        .map(|location| location.line)
        .or_else(|| locate_error_in(&message, source).map(|location| location.line));
    log::debug!("parse failed at line {line:?}: {message}");
    ParseResult::failure(message, line)
}

/// Parses MDX source into an editor document.
///
/// Never panics and never returns a partial document: syntax errors and
/// invalid frontmatter come back as a failed [`ParseResult`].
///
/// ```
/// use mdxblocks_editor::{Options, parse_document};
///
/// let result = parse_document("# Hello\n\n<Tip>Nice</Tip>", &Options::default());
/// let doc = result.document().unwrap();
/// assert_eq!(doc.content.len(), 2);
///
/// let broken = parse_document("a\n\n<Card>\n\nb", &Options::default());
/// assert!(broken.document().is_none());
/// assert!(broken.parse_error().is_some());
/// ```
pub fn parse_document(source: &str, options: &Options) -> ParseResult {
    let root = match parse_source(source, &options.parse_options()) {
        Ok(root) => root,
        Err(error) => return failure(error, source),
    };
    match convert(&root) {
        Ok(conversion) => {
            ParseResult::success(conversion.document, conversion.diagnostics.messages())
        }
        Err(error) => failure(error, source),
    }
}

/// Writes an editor document back to MDX.
pub fn serialize_document(doc: &DocumentNode) -> Result<String, SerializeError> {
    serialize(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let result = parse_document("Hello", &Options::default());
        assert!(result.is_success());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "document": {
                    "type": "doc",
                    "content": [{"type": "paragraph", "content": [{"type": "text", "text": "Hello"}]}]
                },
                "parseError": null,
                "errorLine": null,
                "warnings": []
            })
        );
    }

    #[test]
    fn test_failure_has_line() {
        let result = parse_document("# Title\n\nText\n\n<Card>\n\nunclosed", &Options::default());
        assert!(!result.is_success());
        assert!(result.parse_error().is_some());
        assert!(result.error_line().is_some_and(|line| line >= 5));
        assert!(result.into_result().is_err());
    }

    #[test]
    fn test_frontmatter_error_is_failure() {
        let result = parse_document("---\na: [\n---\n\nBody", &Options::default());
        assert!(!result.is_success());
        assert!(result.error_line().is_some());
    }

    #[test]
    fn test_warnings_are_rendered() {
        let result = parse_document("<Mystery />", &Options::default());
        assert!(result.is_success());
        assert_eq!(result.warnings().len(), 1);
        assert!(result.warnings()[0].contains("Mystery"));
    }

    #[test]
    fn test_options_from_json() {
        let options: Options = serde_json::from_value(json!({"gfm": false})).unwrap();
        assert!(!options.gfm && options.frontmatter);
        let parse = options.parse_options();
        assert!(parse.mdx && !parse.gfm);
    }

    #[test]
    fn test_gfm_off_keeps_pipes_as_text() {
        let options = Options {
            gfm: false,
            ..Options::default()
        };
        let result = parse_document("| a |\n| - |", &options);
        let doc = result.document().unwrap();
        assert_eq!(doc.content[0].kind, NodeKind::Paragraph);
    }
}
