//! Video frame value type carried through the routing graph.
//!
//! A [`VideoFrame`] is one RGBA8 frame plus presentation metadata. The pixel
//! plane is behind an `Arc`, so cloning a frame shares pixels instead of
//! copying them — a frame travels through the graph by value while the heavy
//! payload stays in one place. Processing nodes that change pixels allocate a
//! new plane; frames themselves are immutable.

use std::sync::Arc;

use crate::error::RoutingError;

/// Bytes per RGBA8 pixel.
const BYTES_PER_PIXEL: usize = 4;

/// One video frame: RGBA8 pixel plane plus metadata.
///
/// `Default` yields the *null frame* (0x0, empty plane), which is what an
/// unconnected sink slot reads and what output tracks hold before the first
/// render.
#[derive(Clone, Debug)]
pub struct VideoFrame {
    width: u32,
    height: u32,
    plane: Arc<[u8]>,
    /// Presentation timestamp in ticks. Carried through untouched.
    pts: i64,
}

impl Default for VideoFrame {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            plane: Arc::from([] as [u8; 0]),
            pts: 0,
        }
    }
}

impl VideoFrame {
    /// Creates a frame from a raw RGBA8 plane.
    ///
    /// The plane length must equal `width * height * 4`.
    pub fn new(width: u32, height: u32, plane: Vec<u8>, pts: i64) -> Result<Self, RoutingError> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if plane.len() != expected {
            return Err(RoutingError::FrameGeometry {
                width,
                height,
                got: plane.len(),
            });
        }
        Ok(Self {
            width,
            height,
            plane: Arc::from(plane),
            pts,
        })
    }

    /// Creates a frame filled with a single RGBA color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        let mut plane = Vec::with_capacity(pixels * BYTES_PER_PIXEL);
        for _ in 0..pixels {
            plane.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            plane: Arc::from(plane),
            pts: 0,
        }
    }

    /// Returns the same frame with a different presentation timestamp.
    ///
    /// Shares the pixel plane with `self`.
    pub fn with_pts(&self, pts: i64) -> Self {
        Self {
            width: self.width,
            height: self.height,
            plane: Arc::clone(&self.plane),
            pts,
        }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Presentation timestamp in ticks.
    pub fn pts(&self) -> i64 {
        self.pts
    }

    /// The RGBA8 pixel plane.
    pub fn plane(&self) -> &[u8] {
        &self.plane
    }

    /// Returns true for the null frame (no pixels).
    pub fn is_empty(&self) -> bool {
        self.plane.is_empty()
    }

    /// Returns true if both frames share the same pixel plane allocation.
    ///
    /// This is identity, not content equality: two separately-decoded but
    /// bit-identical frames are *not* the same plane. Connection bookkeeping
    /// compares frames by reference, never by pixels.
    pub fn same_plane(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.plane, &other.plane)
    }

    /// Linearly interpolates between `self` (alpha = 0.0) and `other`
    /// (alpha = 1.0), per channel.
    ///
    /// Used by the engine's crossfade switch policy. If the geometries differ
    /// or either frame is null, returns a clone of whichever endpoint the
    /// clamped alpha is closer to — blending mismatched planes is undefined,
    /// a cut is not.
    pub fn blend(&self, other: &Self, alpha: f32) -> Self {
        let alpha = alpha.clamp(0.0, 1.0);
        if self.is_empty()
            || other.is_empty()
            || self.width != other.width
            || self.height != other.height
        {
            return if alpha < 0.5 {
                self.clone()
            } else {
                other.clone()
            };
        }

        let mut plane = Vec::with_capacity(self.plane.len());
        for (&a, &b) in self.plane.iter().zip(other.plane.iter()) {
            let mixed = f32::from(a) + (f32::from(b) - f32::from(a)) * alpha;
            plane.push(mixed.round() as u8);
        }
        Self {
            width: self.width,
            height: self.height,
            plane: Arc::from(plane),
            pts: self.pts,
        }
    }
}
