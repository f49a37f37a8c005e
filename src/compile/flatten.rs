//! Shape flattening: primitive shapes and pre-parsed path data become
//! move/line/curve/close commands in the shape's local coordinate system.
//!
//! Curved outlines are approximated with cubic Béziers using the standard
//! kappa ratio; the composed transform is only applied when vertices are
//! appended, never during flattening itself.

use glam::{DAffine2, dvec2};
use svgtypes::{Length, LengthUnit};

use crate::ast::{Circle, Ellipse, Path, PathVerb, Polygon, Rect, Span, ViewBox};
use crate::errors::{CompileError, SourceContext};

use super::builder::VgBuilder;
use super::defaults::KAPPA;
use super::paint::resolve_fill;

/// Resolve a length to document units.
///
/// Unit-less and `px` values pass through. Percentages resolve against
/// `reference`; a percentage with no reference length is fatal, as is any
/// other unit.
fn resolve_length(
    length: Length,
    reference: Option<f64>,
    ctx: &SourceContext,
    span: Span,
) -> Result<f64, CompileError> {
    match length.unit {
        LengthUnit::None | LengthUnit::Px => Ok(length.number),
        LengthUnit::Percent => match reference {
            Some(reference) => Ok(reference * length.number / 100.0),
            None => Err(CompileError::PercentWithoutReference {
                src: ctx.named_source(),
                span: span.into(),
            }),
        },
        _ => Err(CompileError::UnsupportedUnit {
            src: ctx.named_source(),
            span: span.into(),
        }),
    }
}

/// Rectangle, optionally with rounded corners.
///
/// Sharp rectangles emit a four-point closed polygon in corner order.
/// Rounded ones clamp the radii to the half extents and join four straight
/// edges with four cubic quarter arcs whose control points sit
/// `(1 - kappa) * radius` from the corner along each axis.
pub fn flatten_rect(
    vg: &mut VgBuilder,
    xf: DAffine2,
    rect: &Rect,
    vb: &ViewBox,
    ctx: &SourceContext,
) -> Result<(), CompileError> {
    let x = resolve_length(rect.x, Some(vb.width), ctx, rect.span)?;
    let y = resolve_length(rect.y, Some(vb.height), ctx, rect.span)?;
    let width = resolve_length(rect.width, Some(vb.width), ctx, rect.span)?;
    let height = resolve_length(rect.height, Some(vb.height), ctx, rect.span)?;

    // A lone rx or ry mirrors onto the other axis.
    let mut rx = 0.0;
    let mut ry = 0.0;
    if let Some(length) = rect.rx {
        rx = resolve_length(length, Some(width), ctx, rect.span)?;
        if rect.ry.is_none() {
            ry = rx;
        }
    }
    if let Some(length) = rect.ry {
        ry = resolve_length(length, Some(height), ctx, rect.span)?;
        if rect.rx.is_none() {
            rx = ry;
        }
    }

    if rx <= 0.0 || ry <= 0.0 {
        vg.move_to(xf, dvec2(x, y));
        vg.line_to(xf, dvec2(x + width, y));
        vg.line_to(xf, dvec2(x + width, y + height));
        vg.line_to(xf, dvec2(x, y + height));
        vg.close();
    } else {
        let rx = rx.min(width * 0.5);
        let ry = ry.min(height * 0.5);
        let kx = (1.0 - KAPPA) * rx;
        let ky = (1.0 - KAPPA) * ry;

        vg.move_to(xf, dvec2(x + rx, y));
        vg.line_to(xf, dvec2(x + width - rx, y));
        vg.curve_to(
            xf,
            dvec2(x + width - kx, y),
            dvec2(x + width, y + ky),
            dvec2(x + width, y + ry),
        );
        vg.line_to(xf, dvec2(x + width, y + height - ry));
        vg.curve_to(
            xf,
            dvec2(x + width, y + height - ky),
            dvec2(x + width - kx, y + height),
            dvec2(x + width - rx, y + height),
        );
        vg.line_to(xf, dvec2(x + rx, y + height));
        vg.curve_to(
            xf,
            dvec2(x + kx, y + height),
            dvec2(x, y + height - ky),
            dvec2(x, y + height - ry),
        );
        vg.line_to(xf, dvec2(x, y + ry));
        vg.curve_to(xf, dvec2(x, y + ky), dvec2(x + kx, y), dvec2(x + rx, y));
        vg.close();
    }

    vg.fill(resolve_fill(&rect.style));
    Ok(())
}

/// Circle as four cubic quarter arcs, control offset `kappa * r`.
/// A missing radius defaults to 1.
pub fn flatten_circle(
    vg: &mut VgBuilder,
    xf: DAffine2,
    circle: &Circle,
    vb: &ViewBox,
    ctx: &SourceContext,
) -> Result<(), CompileError> {
    let cx = resolve_length(circle.cx, Some(vb.width), ctx, circle.span)?;
    let cy = resolve_length(circle.cy, Some(vb.height), ctx, circle.span)?;
    let r = match circle.r {
        Some(length) => resolve_length(length, Some(vb.width), ctx, circle.span)?,
        None => 1.0,
    };

    quarter_arcs(vg, xf, cx, cy, r, r);
    vg.fill(resolve_fill(&circle.style));
    Ok(())
}

/// Ellipse: same as circle with independent per-axis control offsets.
/// A lone rx or ry mirrors onto the other axis; both missing degenerate
/// to zero radii.
pub fn flatten_ellipse(
    vg: &mut VgBuilder,
    xf: DAffine2,
    ellipse: &Ellipse,
    vb: &ViewBox,
    ctx: &SourceContext,
) -> Result<(), CompileError> {
    let cx = resolve_length(ellipse.cx, Some(vb.width), ctx, ellipse.span)?;
    let cy = resolve_length(ellipse.cy, Some(vb.height), ctx, ellipse.span)?;

    let mut rx = 0.0;
    let mut ry = 0.0;
    if let Some(length) = ellipse.rx {
        rx = resolve_length(length, Some(vb.width), ctx, ellipse.span)?;
        if ellipse.ry.is_none() {
            ry = rx;
        }
    }
    if let Some(length) = ellipse.ry {
        ry = resolve_length(length, Some(vb.height), ctx, ellipse.span)?;
        if ellipse.rx.is_none() {
            rx = ry;
        }
    }

    quarter_arcs(vg, xf, cx, cy, rx, ry);
    vg.fill(resolve_fill(&ellipse.style));
    Ok(())
}

/// Closed outline of four 90° cubic arcs, starting at the west point and
/// winding through north, east and south.
fn quarter_arcs(vg: &mut VgBuilder, xf: DAffine2, cx: f64, cy: f64, rx: f64, ry: f64) {
    let kx = KAPPA * rx;
    let ky = KAPPA * ry;

    vg.move_to(xf, dvec2(cx - rx, cy));
    vg.curve_to(
        xf,
        dvec2(cx - rx, cy - ky),
        dvec2(cx - kx, cy - ry),
        dvec2(cx, cy - ry),
    );
    vg.curve_to(
        xf,
        dvec2(cx + kx, cy - ry),
        dvec2(cx + rx, cy - ky),
        dvec2(cx + rx, cy),
    );
    vg.curve_to(
        xf,
        dvec2(cx + rx, cy + ky),
        dvec2(cx + kx, cy + ry),
        dvec2(cx, cy + ry),
    );
    vg.curve_to(
        xf,
        dvec2(cx - kx, cy + ry),
        dvec2(cx - rx, cy + ky),
        dvec2(cx - rx, cy),
    );
    vg.close();
}

/// Polygon: move to the first point, line to the rest, close. Point lists
/// with fewer than two entries produce no geometry at all.
pub fn flatten_polygon(vg: &mut VgBuilder, xf: DAffine2, polygon: &Polygon) {
    let [first, rest @ ..] = polygon.points.as_slice() else {
        return;
    };
    if rest.is_empty() {
        return;
    }

    vg.move_to(xf, *first);
    for p in rest {
        vg.line_to(xf, *p);
    }
    vg.close();
    vg.fill(resolve_fill(&polygon.style));
}

/// Replay pre-parsed path data into the builder.
///
/// The low-level grammar already produced absolute vertices; this checks
/// that every verb finds the vertices it consumes (1 for move/line, 3 for
/// curve) and fails the document otherwise.
pub fn flatten_path(
    vg: &mut VgBuilder,
    xf: DAffine2,
    path: &Path,
    ctx: &SourceContext,
) -> Result<(), CompileError> {
    let underflow = || CompileError::PathVertices {
        src: ctx.named_source(),
        span: path.span.into(),
    };

    let mut vertices = path.data.vertices.as_slice();
    for &verb in &path.data.verbs {
        match verb {
            PathVerb::Close => vg.close(),
            PathVerb::MoveTo | PathVerb::LineTo => {
                let [v, rest @ ..] = vertices else {
                    return Err(underflow());
                };
                if verb == PathVerb::MoveTo {
                    vg.move_to(xf, *v);
                } else {
                    vg.line_to(xf, *v);
                }
                vertices = rest;
            }
            PathVerb::CurveTo => {
                let [c1, c2, v, rest @ ..] = vertices else {
                    return Err(underflow());
                };
                vg.curve_to(xf, *c1, *c2, *v);
                vertices = rest;
            }
        }
    }

    vg.fill(resolve_fill(&path.style));
    Ok(())
}
