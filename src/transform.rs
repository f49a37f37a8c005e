//! Affine transform composition during the document walk.

use glam::{DAffine2, DVec2};

/// Stack of composed affine transforms.
///
/// The traversal pushes on group entry and pops on exit; the top of the
/// stack maps local coordinates to absolute document coordinates.
/// Flattening always happens in local space, then the absolute mapping is
/// applied per vertex at builder-append time.
#[derive(Debug)]
pub struct Compositor {
    stack: Vec<DAffine2>,
}

impl Compositor {
    pub fn new() -> Self {
        Self {
            stack: vec![DAffine2::IDENTITY],
        }
    }

    /// Composed local-to-absolute transform at the current tree depth.
    pub fn current(&self) -> DAffine2 {
        *self.stack.last().expect("stack always holds the identity root")
    }

    /// Enter a scope, composing `local` (if any) onto the current transform.
    pub fn enter(&mut self, local: Option<DAffine2>) {
        let top = self.current();
        self.stack.push(match local {
            Some(t) => top * t,
            None => top,
        });
    }

    /// Leave the scope opened by the matching [`Compositor::enter`].
    pub fn leave(&mut self) {
        debug_assert!(self.stack.len() > 1, "leave without matching enter");
        self.stack.pop();
    }

    /// Map a local vertex to absolute document coordinates.
    pub fn to_absolute(&self, p: DVec2) -> DVec2 {
        self.current().transform_point2(p)
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}
