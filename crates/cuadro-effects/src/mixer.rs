//! Track mixing stage: composes one output frame from up to 64 input tracks.
//!
//! The compositing policy is topmost-track-wins: the lowest input index
//! holding a non-null frame becomes the output, lower-priority tracks are
//! ignored for that tick. Track 0 is the topmost layer.

use cuadro_core::{FrameEffect, VideoFrame};

/// Mixing-stage plugin for the default engine chain.
///
/// One output slot; expects one input slot per track (the registry template
/// declares [`MAX_TRACKS`](cuadro_core::MAX_TRACKS) of them). Stateless.
pub struct TrackMixer;

impl FrameEffect for TrackMixer {
    fn process(&mut self, inputs: &[VideoFrame], outputs: &mut [VideoFrame]) {
        let Some(out) = outputs.first_mut() else {
            return;
        };
        *out = inputs
            .iter()
            .find(|frame| !frame.is_empty())
            .cloned()
            .unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_null_inputs_yield_null_output() {
        let inputs = vec![VideoFrame::default(); 64];
        let mut outputs = vec![VideoFrame::default()];
        TrackMixer.process(&inputs, &mut outputs);
        assert!(outputs[0].is_empty());
    }

    #[test]
    fn topmost_track_wins() {
        let mut inputs = vec![VideoFrame::default(); 64];
        inputs[5] = VideoFrame::solid(2, 2, [5, 5, 5, 255]);
        inputs[2] = VideoFrame::solid(2, 2, [2, 2, 2, 255]);
        inputs[40] = VideoFrame::solid(2, 2, [40, 40, 40, 255]);

        let mut outputs = vec![VideoFrame::default()];
        TrackMixer.process(&inputs, &mut outputs);
        assert!(outputs[0].same_plane(&inputs[2]));
    }

    #[test]
    fn track_zero_beats_everything() {
        let mut inputs = vec![VideoFrame::default(); 64];
        inputs[0] = VideoFrame::solid(1, 1, [9, 9, 9, 255]);
        inputs[1] = VideoFrame::solid(1, 1, [1, 1, 1, 255]);

        let mut outputs = vec![VideoFrame::default()];
        TrackMixer.process(&inputs, &mut outputs);
        assert!(outputs[0].same_plane(&inputs[0]));
    }

    #[test]
    fn output_shares_the_winning_plane() {
        let inputs = vec![VideoFrame::solid(4, 4, [7, 7, 7, 255])];
        let mut outputs = vec![VideoFrame::default()];
        TrackMixer.process(&inputs, &mut outputs);
        // The mix is a handle copy, not a pixel copy.
        assert!(outputs[0].same_plane(&inputs[0]));
    }
}
