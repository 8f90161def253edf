//! Cuadro Effects - frame effect implementations
//!
//! This crate provides the built-in [`FrameEffect`](cuadro_core::FrameEffect)
//! plugins for the cuadro routing core:
//!
//! - [`TrackMixer`] - the mixing stage: 64 tracks in, one frame out
//! - [`GreenFilter`] - the default filter stage: keeps only the green channel
//! - [`Grayscale`] - luma-weighted grayscale conversion
//! - [`Invert`] - per-channel color inversion
//!
//! Pixel processing here is deliberately simple; the routing core treats every
//! effect as an opaque behavior behind slots, and these exist so the registry
//! and the default chain have real plugins to load.
//!
//! ## Example
//!
//! ```rust
//! use cuadro_core::{FrameEffect, VideoFrame};
//! use cuadro_effects::Invert;
//!
//! let input = vec![VideoFrame::solid(2, 2, [255, 0, 0, 255])];
//! let mut output = vec![VideoFrame::default()];
//! Invert.process(&input, &mut output);
//! assert_eq!(&output[0].plane()[..3], &[0, 255, 255]);
//! ```

pub mod filters;
pub mod mixer;

pub use filters::{Grayscale, GreenFilter, Invert};
pub use mixer::TrackMixer;
