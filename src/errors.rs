//! Error types with rich diagnostics using miette
//!
//! These errors carry source spans so a bad document points at the
//! offending element instead of just naming a file.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Source context for error reporting
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Name of the source (filename or "<input>")
    pub name: String,
    /// The full source text
    pub source: String,
}

impl SourceContext {
    /// Create a new source context
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Create a NamedSource for miette
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.source.clone())
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Errors raised while building the typed document tree from the low-level
/// XML and attribute grammars.
#[derive(Error, Diagnostic, Debug)]
pub enum ParseError {
    #[error("malformed XML: {message}")]
    #[diagnostic(code(vgpack::parse::xml))]
    Xml {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("XML error near here")]
        span: SourceSpan,
    },

    #[error("root element is not <svg>")]
    #[diagnostic(code(vgpack::parse::not_svg))]
    NotSvg {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected an <svg> document")]
        span: SourceSpan,
    },

    #[error("missing or invalid viewBox")]
    #[diagnostic(
        code(vgpack::parse::bad_view_box),
        help("expected `viewBox=\"minX minY width height\"`, or unit-less/px `width` and `height` attributes")
    )]
    BadViewBox {
        #[source_code]
        src: NamedSource<String>,
        #[label("cannot establish a coordinate frame for this document")]
        span: SourceSpan,
    },

    #[error("invalid `{attr}` attribute: {message}")]
    #[diagnostic(code(vgpack::parse::invalid_attribute))]
    InvalidAttribute {
        attr: String,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("on this element")]
        span: SourceSpan,
    },

    #[error("unsupported path command")]
    #[diagnostic(
        code(vgpack::parse::unsupported_path_command),
        help("only move, line, cubic-curve and close segments are supported")
    )]
    UnsupportedPathCommand {
        #[source_code]
        src: NamedSource<String>,
        #[label("in this path")]
        span: SourceSpan,
    },
}

// ============================================================================
// Compile Errors
// ============================================================================

/// Errors raised while flattening the document tree into the command stream.
#[derive(Error, Diagnostic, Debug)]
pub enum CompileError {
    #[error("unsupported element: <{tag}>")]
    #[diagnostic(
        code(vgpack::compile::unsupported_element),
        help("supported elements are g, rect, circle, ellipse, polygon, path and line")
    )]
    UnsupportedElement {
        tag: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("no flattening rule for this element")]
        span: SourceSpan,
    },

    #[error("percentage length without a reference length")]
    #[diagnostic(code(vgpack::compile::percent_without_reference))]
    PercentWithoutReference {
        #[source_code]
        src: NamedSource<String>,
        #[label("this element uses a percentage where none is resolvable")]
        span: SourceSpan,
    },

    #[error("unsupported length unit")]
    #[diagnostic(
        code(vgpack::compile::unsupported_unit),
        help("lengths must be unit-less, px or %")
    )]
    UnsupportedUnit {
        #[source_code]
        src: NamedSource<String>,
        #[label("on this element")]
        span: SourceSpan,
    },

    #[error("invalid number of vertices in path")]
    #[diagnostic(code(vgpack::compile::path_vertices))]
    PathVertices {
        #[source_code]
        src: NamedSource<String>,
        #[label("a command in this path runs out of vertices")]
        span: SourceSpan,
    },
}
