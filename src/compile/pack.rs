//! Binary serialization of a completed builder.
//!
//! Layout, little-endian throughout: magic/version word, the viewBox size
//! scaled onto the 16-bit fixed-point grid, then one tagged block per
//! non-empty list, then a bare end tag. Block headers are
//! `BLOCK_TAG | id` followed by a 32-bit element count.

use super::builder::VgBuilder;
use super::defaults::{
    BLOCK_COLOR_INDICES, BLOCK_COMMANDS, BLOCK_ID_BLOB, BLOCK_ID_OFFSETS, BLOCK_OPACITIES,
    BLOCK_PALETTE, BLOCK_TAG, BLOCK_VERTICES, MAGIC_VERSION, VERTEX_SCALE,
};
use super::paint::quantize_unit;

/// Serialize `vg` into the block-tagged byte layout.
///
/// A pure function of the builder's final state: every numeric conversion
/// clamps or truncates, so packing cannot fail. Structural invariants are
/// not re-checked here; see [`VgBuilder::validate`].
pub fn pack(vg: &VgBuilder) -> Vec<u8> {
    let vb = vg.view_box();
    let mut buf = Vec::new();

    buf.extend_from_slice(&MAGIC_VERSION.to_le_bytes());
    // The header size truncates onto the grid; vertices round below.
    buf.extend_from_slice(&((vb.width * VERTEX_SCALE) as u16).to_le_bytes());
    buf.extend_from_slice(&((vb.height * VERTEX_SCALE) as u16).to_le_bytes());

    if !vg.ops().is_empty() {
        block_header(&mut buf, BLOCK_COMMANDS, vg.ops().len());
        buf.extend_from_slice(vg.ops().as_bytes());
    }

    if !vg.vertices().is_empty() {
        block_header(&mut buf, BLOCK_VERTICES, vg.vertices().len());
        for v in vg.vertices() {
            let x = ((v.x - vb.min_x) * VERTEX_SCALE).round() as i16;
            let y = ((v.y - vb.min_y) * VERTEX_SCALE).round() as i16;
            buf.extend_from_slice(&x.to_le_bytes());
            buf.extend_from_slice(&y.to_le_bytes());
        }
    }

    if !vg.color_indices().is_empty() {
        block_header(&mut buf, BLOCK_COLOR_INDICES, vg.color_indices().len());
        for &index in vg.color_indices() {
            buf.extend_from_slice(&(index as u16).to_le_bytes());
        }
    }

    if !vg.colors().is_empty() {
        block_header(&mut buf, BLOCK_PALETTE, vg.colors().len());
        for c in vg.colors() {
            buf.extend_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    }

    if !vg.opacities().is_empty() {
        block_header(&mut buf, BLOCK_OPACITIES, vg.opacities().len());
        for &opacity in vg.opacities() {
            buf.push(quantize_unit(opacity));
        }
    }

    if !vg.ids().is_empty() {
        // Offsets are a running total of UTF-8 byte lengths: entry i is
        // the end of id i within the blob that follows.
        block_header(&mut buf, BLOCK_ID_OFFSETS, vg.ids().len());
        let mut total = 0usize;
        for id in vg.ids() {
            total += id.len();
            buf.extend_from_slice(&(total as u16).to_le_bytes());
        }

        let blob = vg.ids().concat();
        block_header(&mut buf, BLOCK_ID_BLOB, blob.len());
        buf.extend_from_slice(blob.as_bytes());
    }

    buf.extend_from_slice(&BLOCK_TAG.to_le_bytes());
    buf
}

fn block_header(buf: &mut Vec<u8>, id: u32, count: usize) {
    buf.extend_from_slice(&(BLOCK_TAG | id).to_le_bytes());
    buf.extend_from_slice(&(count as u32).to_le_bytes());
}
