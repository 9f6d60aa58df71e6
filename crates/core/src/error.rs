use crate::frontmatter::FrontmatterError;
use serde::Serialize;
use thiserror::Error;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Shift a location found inside an embedded block (such as frontmatter)
    /// so that it is relative to the enclosing document.
    pub fn offset_lines(&self, lines: usize) -> Self {
        Self {
            line: self.line + lines,
            column: self.column,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors that abort an MDX conversion.
#[derive(Debug, Error)]
pub enum MdxError {
    /// markdown-rs rejected the source. `message` is the engine's own text.
    #[error("{message}")]
    Parse {
        /// Error message, verbatim from the engine
        message: String,
        /// Source location
        location: Option<SourceLocation>,
    },
    /// The YAML frontmatter block could not be read.
    #[error("{source}")]
    Frontmatter {
        /// Underlying frontmatter failure
        #[source]
        source: FrontmatterError,
        /// Location of the failure inside the document
        location: Option<SourceLocation>,
    },
    /// Internal logic error (unexpected state).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl MdxError {
    /// Create a parse error with location
    pub fn parse_error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::Parse {
            message: message.into(),
            location: Some(SourceLocation::new(line, column)),
        }
    }

    /// Location attached to the error, if the failing stage reported one.
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            MdxError::Parse { location, .. } | MdxError::Frontmatter { location, .. } => {
                location.as_ref()
            }
            MdxError::InternalError(_) => None,
        }
    }
}

/// Non-fatal findings recorded while converting a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// A JSX element whose name is not in the component catalogue.
    UnknownComponent {
        /// Component name as written
        name: String,
        /// Source location of the element
        location: Option<SourceLocation>,
    },
    /// A child-only component (for example `Tab`) outside its parent.
    OrphanComponent {
        /// Component name as written
        name: String,
        /// Name of the component it must be nested in
        parent: String,
        /// Source location of the element
        location: Option<SourceLocation>,
    },
    /// Content a component does not accept and discarded.
    DroppedChild {
        /// Component that dropped the child
        parent: String,
        /// Short description of what was dropped
        child: String,
        /// Source location of the dropped node
        location: Option<SourceLocation>,
    },
    /// An attribute whose value could not be used.
    RejectedAttribute {
        /// Component the attribute was written on
        component: String,
        /// Attribute name
        attribute: String,
        /// Why it was rejected
        reason: String,
        /// Source location of the element
        location: Option<SourceLocation>,
    },
    /// A `{…}` expression kept as literal text. Saving writes it escaped,
    /// so it no longer runs.
    ExpressionAsText {
        /// Expression source between the braces
        expression: String,
        /// Source location of the expression
        location: Option<SourceLocation>,
    },
}

impl ParseWarning {
    /// Get the location of this warning
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            ParseWarning::UnknownComponent { location, .. }
            | ParseWarning::OrphanComponent { location, .. }
            | ParseWarning::DroppedChild { location, .. }
            | ParseWarning::RejectedAttribute { location, .. }
            | ParseWarning::ExpressionAsText { location, .. } => location.as_ref(),
        }
    }
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(location) = self.location() {
            write!(f, "{location}: ")?;
        }
        match self {
            ParseWarning::UnknownComponent { name, .. } => {
                write!(f, "Unknown component <{name}>, rendered as a placeholder")
            }
            ParseWarning::OrphanComponent { name, parent, .. } => {
                write!(f, "<{name}> is only valid inside <{parent}>, ignored")
            }
            ParseWarning::DroppedChild { parent, child, .. } => {
                write!(f, "<{parent}> does not accept {child}, dropped")
            }
            ParseWarning::RejectedAttribute {
                component,
                attribute,
                reason,
                ..
            } => {
                write!(f, "Ignored attribute `{attribute}` on <{component}>: {reason}")
            }
            ParseWarning::ExpressionAsText { expression, .. } => {
                write!(f, "Expression {{{expression}}} is kept as plain text")
            }
        }
    }
}

/// Collection of parse diagnostics
#[derive(Debug, Clone, Default)]
pub struct ParseDiagnostics {
    /// List of non-fatal warnings
    pub warnings: Vec<ParseWarning>,
}

impl ParseDiagnostics {
    /// Create a new empty diagnostics collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warning to the diagnostics collection
    pub fn add_warning(&mut self, warning: ParseWarning) {
        log::debug!("conversion warning: {warning}");
        self.warnings.push(warning);
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Get total count of all diagnostics
    pub fn count(&self) -> usize {
        self.warnings.len()
    }

    /// Render every warning as a display string, in the order recorded.
    pub fn messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_displays_engine_message_only() {
        let err = MdxError::parse_error("3:1: Unexpected end of file", 3, 1);
        assert_eq!(err.to_string(), "3:1: Unexpected end of file");
        assert_eq!(err.location(), Some(&SourceLocation::new(3, 1)));
    }

    #[test]
    fn test_warning_display_includes_location() {
        let warning = ParseWarning::UnknownComponent {
            name: "FooBar".into(),
            location: Some(SourceLocation::new(4, 1)),
        };
        assert_eq!(
            warning.to_string(),
            "4:1: Unknown component <FooBar>, rendered as a placeholder"
        );

        let warning = ParseWarning::ExpressionAsText {
            expression: "props.name".into(),
            location: Some(SourceLocation::new(2, 7)),
        };
        assert_eq!(warning.to_string(), "2:7: Expression {props.name} is kept as plain text");
    }

    #[test]
    fn test_diagnostics_collects_in_order() {
        let mut diagnostics = ParseDiagnostics::new();
        assert!(!diagnostics.has_warnings());
        diagnostics.add_warning(ParseWarning::OrphanComponent {
            name: "Tab".into(),
            parent: "Tabs".into(),
            location: None,
        });
        diagnostics.add_warning(ParseWarning::DroppedChild {
            parent: "CodeGroup".into(),
            child: "a paragraph".into(),
            location: None,
        });
        assert_eq!(diagnostics.count(), 2);
        assert_eq!(
            diagnostics.messages(),
            vec![
                "<Tab> is only valid inside <Tabs>, ignored".to_string(),
                "<CodeGroup> does not accept a paragraph, dropped".to_string(),
            ]
        );
    }
}
