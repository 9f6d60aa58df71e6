#![deny(missing_docs)]
//! mdxblocks core: the MDX front-end, literal expression evaluation, and
//! error diagnostics shared by the editor conversion layer.

/// Generic MDX syntax tree.
pub mod ast;
/// JSX attribute extraction.
pub mod attributes;
/// Error line recovery from engine messages.
pub mod diagnostics;
/// Core error and diagnostic types.
pub mod error;
/// Literal-only evaluation of attribute expressions.
pub mod expression;
/// YAML frontmatter helpers.
pub mod frontmatter;
/// Markdown/MDX parsing front-end.
pub mod parse;

pub use ast::{JsxAttribute, JsxAttributeValue, SourceKind, SourceNode};
pub use attributes::{Attributes, extract_attributes, read_attributes};
pub use diagnostics::{ErrorLocation, locate_error, locate_error_in};
pub use error::{MdxError, ParseDiagnostics, ParseWarning, SourceLocation};
pub use expression::{LiteralValue, evaluate};
pub use frontmatter::{FrontmatterError, parse_frontmatter, render_frontmatter};
pub use parse::{ParseOptions, parse_mdast, parse_mdast_with_options, parse_mdx, parse_source};
