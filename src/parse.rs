//! Builds the typed document tree from the low-level XML and attribute
//! grammars.
//!
//! XML structure comes from `roxmltree`; attribute micro-grammars
//! (lengths, paints, transforms, point lists, path data) come from
//! `svgtypes`. Everything above that lives here: which elements exist,
//! which attributes matter, viewBox synthesis, path absolutization.

use glam::{DAffine2, DVec2, dvec2};
use roxmltree::Node;
use svgtypes::{Length, LengthUnit, Paint, PathParser, PathSegment, PointsParser, Transform};

use crate::ast::{
    Circle, Document, Element, Ellipse, Group, Line, Path, PathData, PathVerb, Polygon, Rect,
    Span, Style, ViewBox,
};
use crate::errors::{ParseError, SourceContext};

/// Parse one SVG document into the typed tree.
pub fn parse_document(ctx: &SourceContext) -> Result<Document, ParseError> {
    let doc = roxmltree::Document::parse(&ctx.source).map_err(|e| {
        let pos = e.pos();
        ParseError::Xml {
            message: e.to_string(),
            src: ctx.named_source(),
            span: (byte_offset(&ctx.source, pos.row, pos.col), 0).into(),
        }
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(ParseError::NotSvg {
            src: ctx.named_source(),
            span: span_of(root).into(),
        });
    }

    let view_box = parse_view_box(root, ctx)?;
    crate::log::debug!(
        min_x = view_box.min_x,
        min_y = view_box.min_y,
        width = view_box.width,
        height = view_box.height,
        "parsed viewBox"
    );

    Ok(Document {
        view_box,
        root: parse_group(root, ctx)?,
    })
}

/// viewBox attribute, or a frame synthesized from `width`/`height` when
/// both are unit-less or pixel-valued.
fn parse_view_box(root: Node, ctx: &SourceContext) -> Result<ViewBox, ParseError> {
    if let Some(text) = root.attribute("viewBox") {
        if let Ok(vb) = text.parse::<svgtypes::ViewBox>() {
            return Ok(ViewBox {
                min_x: vb.x,
                min_y: vb.y,
                width: vb.w,
                height: vb.h,
            });
        }
    }

    let plain_px = |name| {
        root.attribute(name)
            .and_then(|t| t.parse::<Length>().ok())
            .filter(|l| matches!(l.unit, LengthUnit::None | LengthUnit::Px))
            .map(|l| l.number)
    };
    match (plain_px("width"), plain_px("height")) {
        (Some(width), Some(height)) => Ok(ViewBox {
            min_x: 0.0,
            min_y: 0.0,
            width,
            height,
        }),
        _ => Err(ParseError::BadViewBox {
            src: ctx.named_source(),
            span: span_of(root).into(),
        }),
    }
}

fn parse_group(node: Node, ctx: &SourceContext) -> Result<Group, ParseError> {
    let mut children = Vec::new();
    for child in node.children().filter(Node::is_element) {
        children.push(parse_element(child, ctx)?);
    }

    Ok(Group {
        id: id_attr(node),
        transform: transform_attr(node, ctx)?,
        opacity: number_attr(node, "opacity", ctx)?,
        children,
        span: span_of(node),
    })
}

fn parse_element(node: Node, ctx: &SourceContext) -> Result<Element, ParseError> {
    let element = match node.tag_name().name() {
        "g" => Element::Group(parse_group(node, ctx)?),

        "rect" => Element::Rect(Rect {
            id: id_attr(node),
            x: length_attr(node, "x", ctx)?.unwrap_or(ZERO),
            y: length_attr(node, "y", ctx)?.unwrap_or(ZERO),
            width: length_attr(node, "width", ctx)?.unwrap_or(ZERO),
            height: length_attr(node, "height", ctx)?.unwrap_or(ZERO),
            rx: length_attr(node, "rx", ctx)?,
            ry: length_attr(node, "ry", ctx)?,
            style: style_attrs(node, ctx)?,
            span: span_of(node),
        }),

        "circle" => Element::Circle(Circle {
            id: id_attr(node),
            cx: length_attr(node, "cx", ctx)?.unwrap_or(ZERO),
            cy: length_attr(node, "cy", ctx)?.unwrap_or(ZERO),
            r: length_attr(node, "r", ctx)?,
            style: style_attrs(node, ctx)?,
            span: span_of(node),
        }),

        "ellipse" => Element::Ellipse(Ellipse {
            id: id_attr(node),
            cx: length_attr(node, "cx", ctx)?.unwrap_or(ZERO),
            cy: length_attr(node, "cy", ctx)?.unwrap_or(ZERO),
            rx: length_attr(node, "rx", ctx)?,
            ry: length_attr(node, "ry", ctx)?,
            style: style_attrs(node, ctx)?,
            span: span_of(node),
        }),

        "polygon" => Element::Polygon(Polygon {
            id: id_attr(node),
            points: parse_points(node.attribute("points").unwrap_or("")),
            style: style_attrs(node, ctx)?,
            span: span_of(node),
        }),

        "path" => Element::Path(Path {
            id: id_attr(node),
            data: parse_path_data(node.attribute("d").unwrap_or(""), span_of(node), ctx)?,
            style: style_attrs(node, ctx)?,
            span: span_of(node),
        }),

        "line" => Element::Line(Line {
            id: id_attr(node),
            span: span_of(node),
        }),

        tag => Element::Unsupported {
            tag: tag.to_string(),
            span: span_of(node),
        },
    };
    Ok(element)
}

const ZERO: Length = Length {
    number: 0.0,
    unit: LengthUnit::None,
};

fn span_of(node: Node) -> Span {
    let range = node.range();
    (range.start, range.end - range.start)
}

/// Non-empty id attribute.
fn id_attr(node: Node) -> Option<String> {
    node.attribute("id")
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn length_attr(
    node: Node,
    name: &str,
    ctx: &SourceContext,
) -> Result<Option<Length>, ParseError> {
    match node.attribute(name) {
        None => Ok(None),
        Some(text) => text.parse::<Length>().map(Some).map_err(|e| {
            ParseError::InvalidAttribute {
                attr: name.to_string(),
                message: e.to_string(),
                src: ctx.named_source(),
                span: span_of(node).into(),
            }
        }),
    }
}

fn number_attr(node: Node, name: &str, ctx: &SourceContext) -> Result<Option<f64>, ParseError> {
    match node.attribute(name) {
        None => Ok(None),
        Some(text) => text.trim().parse::<f64>().map(Some).map_err(|e| {
            ParseError::InvalidAttribute {
                attr: name.to_string(),
                message: e.to_string(),
                src: ctx.named_source(),
                span: span_of(node).into(),
            }
        }),
    }
}

fn style_attrs(node: Node, ctx: &SourceContext) -> Result<Style, ParseError> {
    let fill = match node.attribute("fill") {
        None => None,
        Some(text) => match Paint::from_str(text) {
            // Only solid colors contribute; everything else falls back to
            // the default fill during resolution.
            Ok(Paint::Color(c)) => Some((c.red, c.green, c.blue)),
            Ok(_) => None,
            Err(e) => {
                return Err(ParseError::InvalidAttribute {
                    attr: "fill".to_string(),
                    message: e.to_string(),
                    src: ctx.named_source(),
                    span: span_of(node).into(),
                });
            }
        },
    };

    Ok(Style {
        fill,
        fill_opacity: number_attr(node, "fill-opacity", ctx)?,
        opacity: number_attr(node, "opacity", ctx)?,
    })
}

fn transform_attr(node: Node, ctx: &SourceContext) -> Result<Option<DAffine2>, ParseError> {
    match node.attribute("transform") {
        None => Ok(None),
        Some(text) => {
            let t = text.parse::<Transform>().map_err(|e| {
                ParseError::InvalidAttribute {
                    attr: "transform".to_string(),
                    message: e.to_string(),
                    src: ctx.named_source(),
                    span: span_of(node).into(),
                }
            })?;
            // SVG matrix(a b c d e f): columns (a,b), (c,d), translation (e,f).
            Ok(Some(DAffine2::from_cols(
                dvec2(t.a, t.b),
                dvec2(t.c, t.d),
                dvec2(t.e, t.f),
            )))
        }
    }
}

fn parse_points(text: &str) -> Vec<DVec2> {
    PointsParser::from(text).map(|(x, y)| dvec2(x, y)).collect()
}

/// Lower path data to the shared verb vocabulary with absolute vertices.
///
/// `M/L/C/Z` map directly, `H/V` become line-to, relative forms are
/// absolutized against the current point. Smooth, quadratic and arc
/// segments have no flattening rule here and are fatal.
fn parse_path_data(text: &str, span: Span, ctx: &SourceContext) -> Result<PathData, ParseError> {
    let mut data = PathData::default();
    // Current point and subpath start; close resets the current point.
    let mut cur = DVec2::ZERO;
    let mut start = DVec2::ZERO;

    for segment in PathParser::from(text) {
        let segment = segment.map_err(|e| ParseError::InvalidAttribute {
            attr: "d".to_string(),
            message: e.to_string(),
            src: ctx.named_source(),
            span: span.into(),
        })?;

        match segment {
            PathSegment::MoveTo { abs, x, y } => {
                cur = absolutize(cur, abs, x, y);
                start = cur;
                data.verbs.push(PathVerb::MoveTo);
                data.vertices.push(cur);
            }
            PathSegment::LineTo { abs, x, y } => {
                cur = absolutize(cur, abs, x, y);
                data.verbs.push(PathVerb::LineTo);
                data.vertices.push(cur);
            }
            PathSegment::HorizontalLineTo { abs, x } => {
                cur.x = if abs { x } else { cur.x + x };
                data.verbs.push(PathVerb::LineTo);
                data.vertices.push(cur);
            }
            PathSegment::VerticalLineTo { abs, y } => {
                cur.y = if abs { y } else { cur.y + y };
                data.verbs.push(PathVerb::LineTo);
                data.vertices.push(cur);
            }
            PathSegment::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let c1 = absolutize(cur, abs, x1, y1);
                let c2 = absolutize(cur, abs, x2, y2);
                cur = absolutize(cur, abs, x, y);
                data.verbs.push(PathVerb::CurveTo);
                data.vertices.extend([c1, c2, cur]);
            }
            PathSegment::ClosePath { .. } => {
                data.verbs.push(PathVerb::Close);
                cur = start;
            }
            _ => {
                return Err(ParseError::UnsupportedPathCommand {
                    src: ctx.named_source(),
                    span: span.into(),
                });
            }
        }
    }

    Ok(data)
}

fn absolutize(cur: DVec2, abs: bool, x: f64, y: f64) -> DVec2 {
    if abs { dvec2(x, y) } else { cur + dvec2(x, y) }
}

/// Byte offset of a 1-based row/column text position.
fn byte_offset(source: &str, row: u32, col: u32) -> usize {
    let mut offset = 0;
    for (i, line) in source.split_inclusive('\n').enumerate() {
        if i + 1 == row as usize {
            return offset + line.len().min(col.saturating_sub(1) as usize);
        }
        offset += line.len();
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(source: &str) -> SourceContext {
        SourceContext::new("<test>", source)
    }

    #[test]
    fn view_box_attribute_wins() {
        let ctx = ctx(r#"<svg viewBox="-5 -5 20 30" width="640px"></svg>"#);
        let doc = parse_document(&ctx).unwrap();
        assert_eq!(doc.view_box.min_x, -5.0);
        assert_eq!(doc.view_box.min_y, -5.0);
        assert_eq!(doc.view_box.width, 20.0);
        assert_eq!(doc.view_box.height, 30.0);
    }

    #[test]
    fn view_box_synthesized_from_plain_size() {
        let ctx = ctx(r#"<svg width="24" height="16px"></svg>"#);
        let doc = parse_document(&ctx).unwrap();
        assert_eq!(doc.view_box.min_x, 0.0);
        assert_eq!(doc.view_box.width, 24.0);
        assert_eq!(doc.view_box.height, 16.0);
    }

    #[test]
    fn view_box_synthesis_rejects_physical_units() {
        let ctx = ctx(r#"<svg width="24mm" height="16mm"></svg>"#);
        assert!(matches!(
            parse_document(&ctx),
            Err(ParseError::BadViewBox { .. })
        ));
    }

    #[test]
    fn missing_view_box_and_size_is_fatal() {
        let ctx = ctx("<svg></svg>");
        assert!(matches!(
            parse_document(&ctx),
            Err(ParseError::BadViewBox { .. })
        ));
    }

    #[test]
    fn non_svg_root_is_fatal() {
        let ctx = ctx("<html></html>");
        assert!(matches!(parse_document(&ctx), Err(ParseError::NotSvg { .. })));
    }

    #[test]
    fn unknown_elements_parse_as_unsupported() {
        let ctx = ctx(r#"<svg viewBox="0 0 10 10"><text>hi</text></svg>"#);
        let doc = parse_document(&ctx).unwrap();
        assert!(matches!(
            &doc.root.children[0],
            Element::Unsupported { tag, .. } if tag == "text"
        ));
    }

    #[test]
    fn rect_attributes_default_to_zero() {
        let ctx = ctx(r#"<svg viewBox="0 0 10 10"><rect width="4" height="3"/></svg>"#);
        let doc = parse_document(&ctx).unwrap();
        let Element::Rect(rect) = &doc.root.children[0] else {
            panic!("expected a rect");
        };
        assert_eq!(rect.x.number, 0.0);
        assert_eq!(rect.width.number, 4.0);
        assert!(rect.rx.is_none());
    }

    #[test]
    fn solid_fill_parses_and_non_solid_is_ignored() {
        let ctx = ctx(
            r##"<svg viewBox="0 0 10 10">
                 <rect width="1" height="1" fill="#102030"/>
                 <rect width="1" height="1" fill="none"/>
               </svg>"##,
        );
        let doc = parse_document(&ctx).unwrap();
        let Element::Rect(first) = &doc.root.children[0] else {
            panic!("expected a rect");
        };
        let Element::Rect(second) = &doc.root.children[1] else {
            panic!("expected a rect");
        };
        assert_eq!(first.style.fill, Some((0x10, 0x20, 0x30)));
        assert_eq!(second.style.fill, None);
    }

    #[test]
    fn group_transform_parses_to_affine() {
        let ctx = ctx(r#"<svg viewBox="0 0 10 10"><g transform="translate(3 4)"/></svg>"#);
        let doc = parse_document(&ctx).unwrap();
        let Element::Group(g) = &doc.root.children[0] else {
            panic!("expected a group");
        };
        let t = g.transform.unwrap();
        assert_eq!(t.transform_point2(dvec2(1.0, 1.0)), dvec2(4.0, 5.0));
    }

    #[test]
    fn path_data_absolutizes_relative_segments() {
        let ctx = ctx(r#"<svg viewBox="0 0 10 10"><path d="M 1 1 l 2 0 h 3 v -1 z"/></svg>"#);
        let doc = parse_document(&ctx).unwrap();
        let Element::Path(path) = &doc.root.children[0] else {
            panic!("expected a path");
        };
        assert_eq!(
            path.data.verbs,
            vec![
                PathVerb::MoveTo,
                PathVerb::LineTo,
                PathVerb::LineTo,
                PathVerb::LineTo,
                PathVerb::Close
            ]
        );
        assert_eq!(
            path.data.vertices,
            vec![
                dvec2(1.0, 1.0),
                dvec2(3.0, 1.0),
                dvec2(6.0, 1.0),
                dvec2(6.0, 0.0)
            ]
        );
    }

    #[test]
    fn arc_segments_are_unsupported() {
        let ctx = ctx(r#"<svg viewBox="0 0 10 10"><path d="M 0 0 A 5 5 0 0 1 10 10"/></svg>"#);
        assert!(matches!(
            parse_document(&ctx),
            Err(ParseError::UnsupportedPathCommand { .. })
        ));
    }

    #[test]
    fn invalid_opacity_is_fatal() {
        let ctx = ctx(r#"<svg viewBox="0 0 10 10"><g opacity="bogus"/></svg>"#);
        assert!(matches!(
            parse_document(&ctx),
            Err(ParseError::InvalidAttribute { attr, .. }) if attr == "opacity"
        ));
    }
}
