//! Cuadro Core - frame routing for video effect graphs
//!
//! This crate is the effects-routing core: a directed graph of processing
//! nodes exchanging video frames through typed, single-connection slots, under
//! a render cycle that produces one output frame per tick from up to
//! [`MAX_TRACKS`] input tracks.
//!
//! # Core Abstractions
//!
//! ## Frames & Slots
//!
//! - [`VideoFrame`] - one RGBA8 frame with a shared pixel plane
//! - [`SourceSlot`] / [`SinkSlot`] - unidirectional, single-connection
//!   endpoints; a source owns a writable cell, a connected sink reads it
//!
//! ## Nodes & Factory
//!
//! - [`FrameEffect`] - object-safe processing behavior
//! - [`EffectNode`] - addressable unit with ordered slots and child nodes
//! - [`NodeFactory`] - plugin type catalog, live-instance arena
//!   (`"{type}_{seq}"` naming), and root-graph table
//!
//! ## Engine
//!
//! - [`RoutingEngine`] - owns the primary and bypass root graphs, the
//!   64-track input feeds, and the output array; sequences
//!   load → patch → render → unload behind one reader/writer lock
//!
//! # Example
//!
//! ```rust,ignore
//! use cuadro_core::{RoutingEngine, VideoFrame};
//! use cuadro_registry::builtin_factory;
//!
//! let engine = RoutingEngine::new(builtin_factory())?;
//! engine.set_input_frame(VideoFrame::solid(1920, 1080, [255, 0, 0, 255]), 0)?;
//! engine.render();
//! let out = engine.output_frame(0)?;
//! ```

pub mod engine;
pub mod error;
pub mod factory;
pub mod frame;
pub mod node;
pub mod slot;

pub use engine::{BYPASS_ROOT, EngineConfig, PRIMARY_ROOT, Patch, RoutingEngine, SwitchPolicy};
pub use error::RoutingError;
pub use factory::{NodeFactory, NodeTemplate};
pub use frame::VideoFrame;
pub use node::{EffectNode, FrameEffect, MAX_TRACKS, NodeId, Passthrough};
pub use slot::{SinkSlot, SlotEndpoint, SourceSlot, connect, disconnect};
