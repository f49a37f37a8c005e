//! Document compilation: tree traversal driving shape flattening,
//! transform composition and the opacity/identifier scopes, all
//! accumulating into a [`VgBuilder`].

pub mod builder;
pub mod defaults;
pub mod flatten;
pub mod paint;
pub mod pack;

pub use builder::{InvariantError, Rgba, VgBuilder};
pub use pack::pack;

use crate::ast::{Document, Element, Group};
use crate::errors::{CompileError, SourceContext};
use crate::transform::Compositor;

/// Compile a parsed document into a populated builder with one
/// depth-first traversal.
pub fn compile_document(doc: &Document, ctx: &SourceContext) -> Result<VgBuilder, CompileError> {
    let mut vg = VgBuilder::new(doc.view_box);
    let mut comp = Compositor::new();
    compile_group(&mut vg, &mut comp, &doc.root, doc, ctx)?;

    debug_assert_eq!(vg.validate(), Ok(()), "traversal broke a builder invariant");
    crate::log::debug!(
        commands = vg.ops().len(),
        vertices = vg.vertices().len(),
        colors = vg.colors().len(),
        "compiled document"
    );
    Ok(vg)
}

fn compile_group(
    vg: &mut VgBuilder,
    comp: &mut Compositor,
    group: &Group,
    doc: &Document,
    ctx: &SourceContext,
) -> Result<(), CompileError> {
    comp.enter(group.transform);
    let result = with_id_scope(vg, group.id.as_deref(), |vg| {
        // Only opacities strictly below 1.0 open a layer.
        let layer = group.opacity.filter(|opacity| *opacity < 1.0);
        if let Some(opacity) = layer {
            vg.start_layer(opacity);
        }
        for child in &group.children {
            compile_element(vg, comp, child, doc, ctx)?;
        }
        if layer.is_some() {
            vg.stop_layer();
        }
        Ok(())
    });
    comp.leave();
    result
}

fn compile_element(
    vg: &mut VgBuilder,
    comp: &mut Compositor,
    element: &Element,
    doc: &Document,
    ctx: &SourceContext,
) -> Result<(), CompileError> {
    match element {
        Element::Group(group) => compile_group(vg, comp, group, doc, ctx),

        Element::Rect(rect) => with_id_scope(vg, rect.id.as_deref(), |vg| {
            flatten::flatten_rect(vg, comp.current(), rect, &doc.view_box, ctx)
        }),

        Element::Circle(circle) => with_id_scope(vg, circle.id.as_deref(), |vg| {
            flatten::flatten_circle(vg, comp.current(), circle, &doc.view_box, ctx)
        }),

        Element::Ellipse(ellipse) => with_id_scope(vg, ellipse.id.as_deref(), |vg| {
            flatten::flatten_ellipse(vg, comp.current(), ellipse, &doc.view_box, ctx)
        }),

        Element::Polygon(polygon) => with_id_scope(vg, polygon.id.as_deref(), |vg| {
            flatten::flatten_polygon(vg, comp.current(), polygon);
            Ok(())
        }),

        Element::Path(path) => with_id_scope(vg, path.id.as_deref(), |vg| {
            flatten::flatten_path(vg, comp.current(), path, ctx)
        }),

        // Stroke-only primitive with nothing to fill; its id scope, if
        // any, is still recorded.
        Element::Line(line) => with_id_scope(vg, line.id.as_deref(), |_| Ok(())),

        Element::Unsupported { tag, span } => Err(CompileError::UnsupportedElement {
            tag: tag.clone(),
            src: ctx.named_source(),
            span: (*span).into(),
        }),
    }
}

/// Run `f` inside an identifier scope when `id` is present.
///
/// The scope closes even when `f` fails; the error still aborts the whole
/// document compile, so already-executed pops are never undone.
fn with_id_scope<F>(vg: &mut VgBuilder, id: Option<&str>, f: F) -> Result<(), CompileError>
where
    F: FnOnce(&mut VgBuilder) -> Result<(), CompileError>,
{
    match id {
        Some(id) => {
            vg.push_id(id);
            let result = f(vg);
            vg.pop_id();
            result
        }
        None => f(vg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Rect, Style, ViewBox};
    use glam::DAffine2;
    use svgtypes::{Length, LengthUnit};

    fn ctx() -> SourceContext {
        SourceContext::new("<test>", "")
    }

    fn len(number: f64) -> Length {
        Length {
            number,
            unit: LengthUnit::None,
        }
    }

    fn unit_rect(id: Option<&str>) -> Element {
        Element::Rect(Rect {
            id: id.map(str::to_string),
            x: len(0.0),
            y: len(0.0),
            width: len(1.0),
            height: len(1.0),
            rx: None,
            ry: None,
            style: Style::default(),
            span: (0, 0),
        })
    }

    fn doc_with(root: Group) -> Document {
        Document {
            view_box: ViewBox {
                min_x: 0.0,
                min_y: 0.0,
                width: 10.0,
                height: 10.0,
            },
            root,
        }
    }

    fn group(children: Vec<Element>) -> Group {
        Group {
            id: None,
            transform: None,
            opacity: None,
            children,
            span: (0, 0),
        }
    }

    #[test]
    fn translucent_group_opens_a_layer() {
        let mut inner = group(vec![unit_rect(None)]);
        inner.opacity = Some(0.5);
        let doc = doc_with(group(vec![Element::Group(inner)]));

        let vg = compile_document(&doc, &ctx()).unwrap();
        insta::assert_snapshot!(vg.ops(), @"{mlllzf}");
        assert_eq!(vg.opacities(), &[0.5]);
    }

    #[test]
    fn opaque_group_opens_no_layer() {
        let mut inner = group(vec![unit_rect(None)]);
        inner.opacity = Some(1.0);
        let doc = doc_with(group(vec![Element::Group(inner)]));

        let vg = compile_document(&doc, &ctx()).unwrap();
        insta::assert_snapshot!(vg.ops(), @"mlllzf");
        assert!(vg.opacities().is_empty());
    }

    #[test]
    fn id_scopes_wrap_shapes_and_groups() {
        let mut inner = group(vec![unit_rect(Some("leaf"))]);
        inner.id = Some("branch".to_string());
        let doc = doc_with(group(vec![Element::Group(inner)]));

        let vg = compile_document(&doc, &ctx()).unwrap();
        insta::assert_snapshot!(vg.ops(), @"[[mlllzf]]");
        assert_eq!(vg.ids(), &["branch".to_string(), "leaf".to_string()]);
    }

    #[test]
    fn group_transforms_compose_onto_children() {
        let mut inner = group(vec![unit_rect(None)]);
        inner.transform = Some(DAffine2::from_scale(glam::dvec2(2.0, 2.0)));
        let mut outer = group(vec![Element::Group(inner)]);
        outer.transform = Some(DAffine2::from_translation(glam::dvec2(3.0, 0.0)));
        let doc = doc_with(group(vec![Element::Group(outer)]));

        let vg = compile_document(&doc, &ctx()).unwrap();
        // Unit rect corner (1,1) scaled then translated.
        assert_eq!(vg.vertices()[2], glam::dvec2(5.0, 2.0));
    }

    #[test]
    fn unsupported_element_aborts_the_document() {
        let doc = doc_with(group(vec![Element::Unsupported {
            tag: "text".to_string(),
            span: (0, 0),
        }]));

        let err = compile_document(&doc, &ctx()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnsupportedElement { tag, .. } if tag == "text"
        ));
    }

    #[test]
    fn id_scope_closes_even_when_a_child_fails() {
        let mut root = group(vec![Element::Unsupported {
            tag: "text".to_string(),
            span: (0, 0),
        }]);
        root.id = Some("doomed".to_string());

        let mut vg = VgBuilder::new(ViewBox {
            min_x: 0.0,
            min_y: 0.0,
            width: 10.0,
            height: 10.0,
        });
        let mut comp = Compositor::new();
        let doc = doc_with(group(Vec::new()));
        let result = compile_group(&mut vg, &mut comp, &root, &doc, &ctx());

        assert!(result.is_err());
        // The pop already executed and stays in the stream.
        assert_eq!(vg.ops(), "[]");
    }
}
