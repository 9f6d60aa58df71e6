//! Conversion context shared by the converter passes.

use crate::registry::Catalogue;
use mdxblocks_core::{ParseDiagnostics, ParseWarning, SourceLocation};

/// Component scope the converter is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Top level of the document.
    Root,
    /// Inside the named catalogue component.
    Component(&'static str),
}

/// Tracks warnings and the component nesting while a tree is converted.
pub struct Context<'a> {
    catalogue: &'a Catalogue,
    diagnostics: ParseDiagnostics,
    stack: Vec<Scope>,
}

impl<'a> Context<'a> {
    /// Creates a context over a catalogue.
    pub fn new(catalogue: &'a Catalogue) -> Self {
        Self {
            catalogue,
            diagnostics: ParseDiagnostics::new(),
            stack: vec![Scope::Root],
        }
    }

    /// Returns the component catalogue.
    pub fn catalogue(&self) -> &'a Catalogue {
        self.catalogue
    }

    /// Returns a reference to the current scope at the top of the stack.
    pub fn current_scope(&self) -> Scope {
        self.stack.last().copied().unwrap_or(Scope::Root)
    }

    /// Enters a component scope.
    pub fn enter(&mut self, name: &'static str) {
        self.stack.push(Scope::Component(name));
    }

    /// Leaves the current component scope.
    pub fn leave(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Records a warning.
    pub fn warn(&mut self, warning: ParseWarning) {
        self.diagnostics.add_warning(warning);
    }

    /// Records an element that is not in the catalogue.
    pub fn warn_unknown(&mut self, name: &str, location: Option<&SourceLocation>) {
        self.warn(ParseWarning::UnknownComponent {
            name: name.to_string(),
            location: location.cloned(),
        });
    }

    /// Records content dropped by the component currently being converted.
    pub fn warn_dropped(&mut self, child: impl Into<String>, location: Option<&SourceLocation>) {
        let parent = match self.current_scope() {
            Scope::Component(name) => name,
            Scope::Root => "document",
        };
        self.warn(ParseWarning::DroppedChild {
            parent: parent.to_string(),
            child: child.into(),
            location: location.cloned(),
        });
    }

    /// Consumes the context, returning the collected diagnostics.
    pub fn finish(self) -> ParseDiagnostics {
        self.diagnostics
    }
}
