//! Growable in-memory representation of one compiled document.

use glam::{DAffine2, DVec2};
use thiserror::Error;

use crate::ast::ViewBox;

/// One RGBA palette entry. Equality is exact; palette deduplication
/// relies on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Accumulates the command stream, vertex list, color palette, opacity
/// layers and identifier scopes of one document.
///
/// Created per document, populated during a single top-to-bottom tree
/// traversal, then consumed once by [`super::pack`]. Geometry arrives in
/// local coordinates together with the composed transform; the absolute
/// mapping is applied here, per vertex, at append time.
#[derive(Debug)]
pub struct VgBuilder {
    view_box: ViewBox,
    ops: String,
    vertices: Vec<DVec2>,
    color_indices: Vec<usize>,
    colors: Vec<Rgba>,
    opacities: Vec<f64>,
    ids: Vec<String>,
}

impl VgBuilder {
    pub fn new(view_box: ViewBox) -> Self {
        Self {
            view_box,
            ops: String::new(),
            vertices: Vec::new(),
            color_indices: Vec::new(),
            colors: Vec::new(),
            opacities: Vec::new(),
            ids: Vec::new(),
        }
    }

    pub fn view_box(&self) -> &ViewBox {
        &self.view_box
    }

    /// Command stream: one ASCII opcode per command.
    pub fn ops(&self) -> &str {
        &self.ops
    }

    /// Absolute vertices, in command-stream consumption order.
    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    /// Palette index used by each `f` command, in stream order.
    pub fn color_indices(&self) -> &[usize] {
        &self.color_indices
    }

    /// Deduplicated palette, in first-use order.
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    /// Opacity recorded by each `{` command, in stream order.
    pub fn opacities(&self) -> &[f64] {
        &self.opacities
    }

    /// Identifier recorded by each `[` command, in stream order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    fn push_vertex(&mut self, xf: DAffine2, v: DVec2) {
        self.vertices.push(xf.transform_point2(v));
    }

    pub fn move_to(&mut self, xf: DAffine2, v: DVec2) {
        self.ops.push('m');
        self.push_vertex(xf, v);
    }

    pub fn line_to(&mut self, xf: DAffine2, v: DVec2) {
        self.ops.push('l');
        self.push_vertex(xf, v);
    }

    pub fn curve_to(&mut self, xf: DAffine2, c1: DVec2, c2: DVec2, v: DVec2) {
        self.ops.push('c');
        self.push_vertex(xf, c1);
        self.push_vertex(xf, c2);
        self.push_vertex(xf, v);
    }

    /// Close the current subpath.
    pub fn close(&mut self) {
        self.ops.push('z');
    }

    /// Fill the current subpath, interning `color` into the palette.
    pub fn fill(&mut self, color: Rgba) {
        self.ops.push('f');
        let index = self.intern_color(color);
        self.color_indices.push(index);
    }

    /// Open an opacity layer scaling every fill until the matching
    /// [`VgBuilder::stop_layer`].
    pub fn start_layer(&mut self, opacity: f64) {
        self.ops.push('{');
        self.opacities.push(opacity);
    }

    pub fn stop_layer(&mut self) {
        self.ops.push('}');
    }

    /// Open an identifier scope naming the subtree, for tooling only.
    pub fn push_id(&mut self, id: &str) {
        self.ops.push('[');
        self.ids.push(id.to_string());
    }

    pub fn pop_id(&mut self) {
        self.ops.push(']');
    }

    /// Append a raw opcode, bypassing the side lists. Lets tests
    /// hand-craft builders that break the invariants.
    #[cfg(test)]
    pub(crate) fn push_raw_op(&mut self, op: char) {
        self.ops.push(op);
    }

    /// Palette lookup-or-insert; identical RGBA values share one entry.
    fn intern_color(&mut self, color: Rgba) -> usize {
        match self.colors.iter().position(|&c| c == color) {
            Some(index) => index,
            None => {
                self.colors.push(color);
                self.colors.len() - 1
            }
        }
    }

    /// Check the structural invariants the packer relies on: replaying the
    /// command stream consumes exactly the held vertices, every `f` has a
    /// color index, layer/id scopes nest and balance, and their side lists
    /// line up with the stream.
    ///
    /// A traversal-produced builder satisfies these by construction; the
    /// packer itself stays a total function and does not re-check. This is
    /// the acceptance boundary for hand-assembled builders.
    pub fn validate(&self) -> Result<(), InvariantError> {
        let mut consumed = 0usize;
        let mut fills = 0usize;
        let mut layer_depth = 0usize;
        let mut id_depth = 0usize;
        let mut layers_opened = 0usize;
        let mut ids_opened = 0usize;

        for op in self.ops.bytes() {
            match op {
                b'm' | b'l' => consumed += 1,
                b'c' => consumed += 3,
                b'z' => {}
                b'f' => fills += 1,
                b'{' => {
                    layers_opened += 1;
                    layer_depth += 1;
                }
                b'}' => {
                    if layer_depth == 0 {
                        return Err(InvariantError::UnbalancedLayers);
                    }
                    layer_depth -= 1;
                }
                b'[' => {
                    ids_opened += 1;
                    id_depth += 1;
                }
                b']' => {
                    if id_depth == 0 {
                        return Err(InvariantError::UnbalancedIds);
                    }
                    id_depth -= 1;
                }
                _ => unreachable!("builder methods only emit known opcodes"),
            }
        }

        if layer_depth != 0 {
            return Err(InvariantError::UnbalancedLayers);
        }
        if id_depth != 0 {
            return Err(InvariantError::UnbalancedIds);
        }
        if consumed != self.vertices.len() {
            return Err(InvariantError::VertexCount {
                consumed,
                held: self.vertices.len(),
            });
        }
        if fills != self.color_indices.len() {
            return Err(InvariantError::FillCount {
                fills,
                indices: self.color_indices.len(),
            });
        }
        if layers_opened != self.opacities.len() {
            return Err(InvariantError::LayerCount {
                opened: layers_opened,
                entries: self.opacities.len(),
            });
        }
        if ids_opened != self.ids.len() {
            return Err(InvariantError::IdCount {
                opened: ids_opened,
                entries: self.ids.len(),
            });
        }
        if let Some(&index) = self
            .color_indices
            .iter()
            .find(|&&index| index >= self.colors.len())
        {
            return Err(InvariantError::ColorIndexRange {
                index,
                palette: self.colors.len(),
            });
        }

        Ok(())
    }
}

/// Structural invariant violations detected by [`VgBuilder::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvariantError {
    #[error("command stream consumes {consumed} vertices, builder holds {held}")]
    VertexCount { consumed: usize, held: usize },
    #[error("{fills} fill commands but {indices} color indices")]
    FillCount { fills: usize, indices: usize },
    #[error("opacity layers do not nest and balance")]
    UnbalancedLayers,
    #[error("identifier scopes do not nest and balance")]
    UnbalancedIds,
    #[error("{opened} opacity layers opened but {entries} opacity entries")]
    LayerCount { opened: usize, entries: usize },
    #[error("{opened} identifier scopes opened but {entries} identifier entries")]
    IdCount { opened: usize, entries: usize },
    #[error("color index {index} out of range for palette of {palette}")]
    ColorIndexRange { index: usize, palette: usize },
}
