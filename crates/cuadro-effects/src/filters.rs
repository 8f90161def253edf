//! Single-input color filters.
//!
//! Each filter maps input slot 0 to output slot 0 and passes the null frame
//! through untouched. All are stateless per-pixel maps; geometry and pts are
//! preserved.

use cuadro_core::{FrameEffect, VideoFrame};

/// Applies a per-pixel RGBA map to input 0, writing output 0.
fn map_pixels(
    inputs: &[VideoFrame],
    outputs: &mut [VideoFrame],
    f: impl Fn(&mut [u8]),
) {
    let (Some(input), Some(out)) = (inputs.first(), outputs.first_mut()) else {
        return;
    };
    if input.is_empty() {
        *out = VideoFrame::default();
        return;
    }
    let mut plane = input.plane().to_vec();
    for px in plane.chunks_exact_mut(4) {
        f(px);
    }
    // Geometry was valid on the way in, so this cannot fail.
    *out = VideoFrame::new(input.width(), input.height(), plane, input.pts())
        .unwrap_or_default();
}

/// Filter-stage plugin of the default chain: keeps only the green channel.
pub struct GreenFilter;

impl FrameEffect for GreenFilter {
    fn process(&mut self, inputs: &[VideoFrame], outputs: &mut [VideoFrame]) {
        map_pixels(inputs, outputs, |px| {
            px[0] = 0;
            px[2] = 0;
        });
    }
}

/// Rec. 601 luma-weighted grayscale conversion.
pub struct Grayscale;

impl FrameEffect for Grayscale {
    fn process(&mut self, inputs: &[VideoFrame], outputs: &mut [VideoFrame]) {
        map_pixels(inputs, outputs, |px| {
            let luma = (0.299 * f32::from(px[0])
                + 0.587 * f32::from(px[1])
                + 0.114 * f32::from(px[2]))
            .round() as u8;
            px[0] = luma;
            px[1] = luma;
            px[2] = luma;
        });
    }
}

/// Inverts the color channels, leaving alpha untouched.
pub struct Invert;

impl FrameEffect for Invert {
    fn process(&mut self, inputs: &[VideoFrame], outputs: &mut [VideoFrame]) {
        map_pixels(inputs, outputs, |px| {
            px[0] = 255 - px[0];
            px[1] = 255 - px[1];
            px[2] = 255 - px[2];
        });
    }
}
