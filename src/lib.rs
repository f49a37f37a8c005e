//! Compiles a constrained SVG subset into compact binary blobs suitable
//! for embedding as constant byte arrays.
//!
//! The supported subset covers `g`, `rect`, `circle`, `ellipse`,
//! `polygon`, `path` and `line` with solid fills, fill/group opacity and
//! affine transforms. Curved outlines are flattened into cubic Béziers,
//! colors are deduplicated into a palette, and the result is serialized
//! as a little-endian, block-tagged command stream that a tiny runtime
//! can replay. Gradients, clipping, masks and text are out of scope.
//!
//! Low-level SVG grammars (XML, numbers, transforms, path data) are
//! handled by `roxmltree` and `svgtypes`; this crate builds the typed
//! tree on top, flattens it and packs it.
//!
//! ```
//! let svg = r##"<svg viewBox="0 0 100 100">
//!     <rect width="100" height="100" fill="#ff0000"/>
//! </svg>"##;
//!
//! let blob = vgpack::compile_str(svg, "red-square")?;
//! assert_eq!(blob.name, "red_square");
//! assert!(!blob.bytes.is_empty());
//! # Ok::<(), miette::Report>(())
//! ```

pub mod ast;
pub mod compile;
pub mod errors;
pub mod ident;
pub mod log;
pub mod parse;
pub mod transform;

pub use ast::{Document, ViewBox};
pub use compile::{InvariantError, Rgba, VgBuilder};
pub use errors::{CompileError, ParseError, SourceContext};

use std::path::Path;

/// One compiled document: the derived constant name plus the packed bytes.
#[derive(Debug, Clone)]
pub struct VgBlob {
    /// Identifier for the emitted constant, mangled per [`ident::const_ident`].
    pub name: String,
    /// The packed binary stream.
    pub bytes: Vec<u8>,
}

impl VgBlob {
    /// Byte length of the packed stream (the emitted array's extent).
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Compile one SVG document from source text.
///
/// `name` identifies the document in diagnostics and, after mangling,
/// becomes the emitted constant's name.
pub fn compile_str(source: &str, name: &str) -> Result<VgBlob, miette::Report> {
    let ctx = SourceContext::new(name, source);
    let doc = parse::parse_document(&ctx)?;
    let vg = compile::compile_document(&doc, &ctx)?;

    Ok(VgBlob {
        name: ident::const_ident(name),
        bytes: compile::pack(&vg),
    })
}

/// Compile one SVG file; the constant name derives from the file stem.
///
/// The file is read once up front; failures carry the offending path.
pub fn compile_file(path: impl AsRef<Path>) -> Result<VgBlob, miette::Report> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("failed to read {}: {e}", path.display()))?;
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();

    compile_str(&source, stem)
        .map_err(|report| report.wrap_err(format!("while compiling {}", path.display())))
}
