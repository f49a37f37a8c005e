//! Fill color and opacity resolution.

use crate::ast::Style;

use super::builder::Rgba;
use super::defaults::DEFAULT_FILL;

/// Resolve a shape's effective fill.
///
/// The RGB part defaults to [`DEFAULT_FILL`] (opaque black) and an
/// explicit solid fill overrides it. Effective alpha is
/// `fill-opacity * opacity` when both are present, else whichever is
/// present, else fully opaque; clamped to [0, 1] and quantized to 8 bits.
pub fn resolve_fill(style: &Style) -> Rgba {
    let (r, g, b) = style
        .fill
        .unwrap_or((DEFAULT_FILL.r, DEFAULT_FILL.g, DEFAULT_FILL.b));

    let alpha = match (style.fill_opacity, style.opacity) {
        (Some(fill), Some(shape)) => Some(fill * shape),
        (Some(fill), None) => Some(fill),
        (None, Some(shape)) => Some(shape),
        (None, None) => None,
    };

    Rgba {
        r,
        g,
        b,
        a: alpha.map_or(255, quantize_unit),
    }
}

/// Clamp a unit-interval value and quantize it to a byte, rounding.
/// Values computed as exactly 1.0 keep full opacity.
pub(crate) fn quantize_unit(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
