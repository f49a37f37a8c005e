//! Typed document tree for the supported SVG subset.
//!
//! Produced by [`crate::parse`] on top of the low-level XML and attribute
//! grammars, consumed by [`crate::compile`]. The tree is deliberately
//! closed: every element kind the traversal can meet is a variant of
//! [`Element`], including [`Element::Unsupported`], so "no flattening
//! rule" is an explicit case rather than a fallthrough.

use glam::{DAffine2, DVec2};
use svgtypes::Length;

/// Byte range of an element in the source text, kept for diagnostics.
pub type Span = (usize, usize);

/// Coordinate frame of one document: (min-x, min-y, width, height) in
/// document units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

/// One parsed document: the coordinate frame plus the root group.
#[derive(Debug)]
pub struct Document {
    pub view_box: ViewBox,
    pub root: Group,
}

/// Fill-related presentation attributes shared by every drawable element.
#[derive(Debug, Clone, Copy, Default)]
pub struct Style {
    /// Explicit solid fill color, when one was given. Non-solid paints
    /// (`none`, `currentColor`, references) leave this unset and the
    /// default fill applies.
    pub fill: Option<(u8, u8, u8)>,
    pub fill_opacity: Option<f64>,
    pub opacity: Option<f64>,
}

/// A group node. The document root is one of these too.
#[derive(Debug)]
pub struct Group {
    pub id: Option<String>,
    /// Local transform, composed with ancestors during traversal.
    pub transform: Option<DAffine2>,
    /// Group opacity; values strictly below 1.0 open an opacity layer.
    pub opacity: Option<f64>,
    pub children: Vec<Element>,
    pub span: Span,
}

/// Closed set of element kinds the compiler understands.
#[derive(Debug)]
pub enum Element {
    Group(Group),
    Rect(Rect),
    Circle(Circle),
    Ellipse(Ellipse),
    Polygon(Polygon),
    Path(Path),
    Line(Line),
    /// Recognized by the tokenizer but with no flattening rule. Parsing
    /// keeps it so the traversal can fail with the offending tag and span.
    Unsupported { tag: String, span: Span },
}

#[derive(Debug)]
pub struct Rect {
    pub id: Option<String>,
    pub x: Length,
    pub y: Length,
    pub width: Length,
    pub height: Length,
    pub rx: Option<Length>,
    pub ry: Option<Length>,
    pub style: Style,
    pub span: Span,
}

#[derive(Debug)]
pub struct Circle {
    pub id: Option<String>,
    pub cx: Length,
    pub cy: Length,
    pub r: Option<Length>,
    pub style: Style,
    pub span: Span,
}

#[derive(Debug)]
pub struct Ellipse {
    pub id: Option<String>,
    pub cx: Length,
    pub cy: Length,
    pub rx: Option<Length>,
    pub ry: Option<Length>,
    pub style: Style,
    pub span: Span,
}

#[derive(Debug)]
pub struct Polygon {
    pub id: Option<String>,
    pub points: Vec<DVec2>,
    pub style: Style,
    pub span: Span,
}

#[derive(Debug)]
pub struct Path {
    pub id: Option<String>,
    pub data: PathData,
    pub style: Style,
    pub span: Span,
}

/// Stroke-only primitive. Parsed so documents containing it stay valid,
/// but it has no fillable area and compiles to nothing.
#[derive(Debug)]
pub struct Line {
    pub id: Option<String>,
    pub span: Span,
}

/// Pre-parsed path data with absolute coordinates.
///
/// Verbs and vertices are parallel sequences: replaying the verbs in order
/// consumes vertices from the front, [`PathVerb::vertex_count`] at a time.
#[derive(Debug, Default)]
pub struct PathData {
    pub verbs: Vec<PathVerb>,
    pub vertices: Vec<DVec2>,
}

/// Path command vocabulary after the low-level grammar has absolutized
/// coordinates and lowered axis-aligned segments to line-to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathVerb {
    MoveTo,
    LineTo,
    CurveTo,
    Close,
}

impl PathVerb {
    /// Number of vertices this verb consumes when replayed.
    pub fn vertex_count(self) -> usize {
        match self {
            PathVerb::MoveTo | PathVerb::LineTo => 1,
            PathVerb::CurveTo => 3,
            PathVerb::Close => 0,
        }
    }
}
