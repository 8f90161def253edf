//! Routing engine: the render-cycle orchestrator.
//!
//! [`RoutingEngine`] owns a [`NodeFactory`], two root graphs (primary and
//! bypass), a 64-track input feed per graph, and the output frame array. The
//! startup sequence builds both graphs, instantiates the default processing
//! chain (a mixing stage feeding a filter stage), and patches everything in a
//! fixed order; `render()` then produces one output frame per tick.
//!
//! The whole engine sits behind one reader/writer lock: `set_input_frame` and
//! `render` take it exclusively, `output_frame` takes it shared. Writes to an
//! input track are visible to the next render that acquires the lock after the
//! write completes. Within a tick, nodes render sequentially in the dependency
//! order fixed by the patch — the mixing stage first, then the filter stage.
//!
//! # Patch switching
//!
//! Both graphs are fully patched and structurally symmetric: each has its own
//! feed array, and `set_input_frame` writes to both. `enable()` selects the
//! primary (filtered) patch, `disable()` the bypass (unfiltered mix). The
//! transition is a configuration choice: [`SwitchPolicy::Cut`] flips on the
//! next render; [`SwitchPolicy::Crossfade`] renders both graphs and blends
//! output track 0 across the configured number of ticks.

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::RoutingError;
use crate::factory::NodeFactory;
use crate::frame::VideoFrame;
use crate::node::{MAX_TRACKS, NodeId};
use crate::slot::{SinkSlot, SlotEndpoint, SourceSlot};

/// Root key of the primary (filtered) graph.
pub const PRIMARY_ROOT: &str = "primary";
/// Root key of the bypass (unfiltered) graph.
pub const BYPASS_ROOT: &str = "bypass";

/// Which patch the engine routes to the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Patch {
    /// The full default chain: mixing stage then filter stage.
    Primary,
    /// The mixing stage alone.
    Bypass,
}

/// How `enable()`/`disable()` transition between patches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchPolicy {
    /// The new patch takes effect on the next render.
    Cut,
    /// Output track 0 blends from the old patch to the new one over this many
    /// renders.
    Crossfade {
        /// Ramp length in ticks; 0 behaves like `Cut`.
        ticks: u32,
    },
}

/// Engine construction parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Registered type name of the mixing-stage plugin.
    pub mixer_type: String,
    /// Registered type name of the filter-stage plugin.
    pub filter_type: String,
    /// Patch transition policy.
    pub switch_policy: SwitchPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mixer_type: "mixer".to_string(),
            filter_type: "greenfilter".to_string(),
            switch_policy: SwitchPolicy::Cut,
        }
    }
}

/// An in-flight crossfade between patches.
struct Fade {
    from: Patch,
    remaining: u32,
    total: u32,
}

/// Engine state guarded by the structural lock.
struct EngineCore {
    factory: NodeFactory,
    config: EngineConfig,
    /// Per-track feeds into the primary graph's mixing stage.
    primary_feeds: Vec<SourceSlot<VideoFrame>>,
    /// Per-track feeds into the bypass graph's mixing stage.
    bypass_feeds: Vec<SourceSlot<VideoFrame>>,
    /// Engine-side sink wired to the primary chain's tail output.
    primary_sink: SinkSlot<VideoFrame>,
    /// Engine-side sink wired to the bypass chain's tail output.
    bypass_sink: SinkSlot<VideoFrame>,
    /// Output frame per track; only track 0 is populated by the default chain.
    outputs: Vec<VideoFrame>,
    /// Node ids of the primary chain, in render order.
    primary_chain: Vec<NodeId>,
    /// Node ids of the bypass chain, in render order.
    bypass_chain: Vec<NodeId>,
    /// Instance names of the default chain, for unloading at shutdown.
    chain_instances: Vec<String>,
    active: Patch,
    fade: Option<Fade>,
    stopped: bool,
}

/// The effects-routing orchestrator.
///
/// All methods take `&self`; producers on other threads may call
/// [`set_input_frame`](Self::set_input_frame) concurrently with the render
/// driver. Calls serialize on the engine's reader/writer lock.
pub struct RoutingEngine {
    core: RwLock<EngineCore>,
}

impl std::fmt::Debug for RoutingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingEngine").finish_non_exhaustive()
    }
}

impl RoutingEngine {
    /// Builds an engine with the default configuration.
    ///
    /// The factory must already have the default chain's plugin types
    /// registered (see `cuadro-registry`).
    pub fn new(factory: NodeFactory) -> Result<Self, RoutingError> {
        Self::with_config(factory, EngineConfig::default())
    }

    /// Builds an engine, running the fixed startup sequence: create both root
    /// graphs, populate their slots, instantiate the default chain, patch.
    ///
    /// Any failure here leaves no usable engine; root-graph failures in
    /// particular are logged as errors before returning.
    pub fn with_config(
        mut factory: NodeFactory,
        config: EngineConfig,
    ) -> Result<Self, RoutingError> {
        // 1. Root graphs. The engine is unusable without them.
        let primary_root = factory.create_root(PRIMARY_ROOT).map_err(|err| {
            tracing::error!("root graph '{PRIMARY_ROOT}' creation failed: {err}");
            RoutingError::RootCreation(PRIMARY_ROOT.to_string())
        })?;
        let bypass_root = factory.create_root(BYPASS_ROOT).map_err(|err| {
            tracing::error!("root graph '{BYPASS_ROOT}' creation failed: {err}");
            RoutingError::RootCreation(BYPASS_ROOT.to_string())
        })?;

        // 2. + 3. Both roots get the full slot complement, keeping primary and
        // bypass structurally symmetric.
        for root in [primary_root, bypass_root] {
            let node = factory
                .node_mut(root)
                .ok_or(RoutingError::NodeNotFound(root))?;
            for _ in 0..MAX_TRACKS {
                node.add_video_input()?;
            }
            node.add_video_output()?;
        }

        // 4. Default chain: mixing stage + filter stage under the primary
        // root, the mixing stage alone under the bypass root.
        let p_mixer_name = factory.create_child(primary_root, &config.mixer_type)?;
        let p_filter_name = factory.create_child(primary_root, &config.filter_type)?;
        let b_mixer_name = factory.create_child(bypass_root, &config.mixer_type)?;

        let p_mixer = factory
            .instance(&p_mixer_name)
            .ok_or_else(|| RoutingError::UnknownInstance(p_mixer_name.clone()))?;
        let p_filter = factory
            .instance(&p_filter_name)
            .ok_or_else(|| RoutingError::UnknownInstance(p_filter_name.clone()))?;
        let b_mixer = factory
            .instance(&b_mixer_name)
            .ok_or_else(|| RoutingError::UnknownInstance(b_mixer_name.clone()))?;

        // 5. Patch phase.
        let mut primary_feeds = Vec::with_capacity(MAX_TRACKS);
        let mut bypass_feeds = Vec::with_capacity(MAX_TRACKS);
        for track in 0..MAX_TRACKS {
            let mut p_feed =
                SourceSlot::new(track as u32, format!("track{track}"), SlotEndpoint::external(track));
            let mut b_feed = SourceSlot::new(
                track as u32,
                format!("bypass_track{track}"),
                SlotEndpoint::external(track),
            );
            factory
                .node_mut(p_mixer)
                .ok_or(RoutingError::NodeNotFound(p_mixer))?
                .connect_input_from(&mut p_feed, track)?;
            factory
                .node_mut(b_mixer)
                .ok_or(RoutingError::NodeNotFound(b_mixer))?
                .connect_input_from(&mut b_feed, track)?;
            primary_feeds.push(p_feed);
            bypass_feeds.push(b_feed);
        }

        factory.connect(
            SlotEndpoint {
                node: p_mixer,
                slot: 0,
            },
            SlotEndpoint {
                node: p_filter,
                slot: 0,
            },
        )?;

        let mut primary_sink = SinkSlot::new(0, "engine_out0", SlotEndpoint::external(0));
        let mut bypass_sink = SinkSlot::new(0, "bypass_out0", SlotEndpoint::external(0));
        factory
            .node_mut(p_filter)
            .ok_or(RoutingError::NodeNotFound(p_filter))?
            .connect_output_to_sink(0, &mut primary_sink)?;
        factory
            .node_mut(b_mixer)
            .ok_or(RoutingError::NodeNotFound(b_mixer))?
            .connect_output_to_sink(0, &mut bypass_sink)?;

        tracing::debug!(
            "engine_start: patched '{p_mixer_name}' → '{p_filter_name}', bypass '{b_mixer_name}'"
        );

        Ok(Self {
            core: RwLock::new(EngineCore {
                factory,
                config,
                primary_feeds,
                bypass_feeds,
                primary_sink,
                bypass_sink,
                outputs: std::iter::repeat_with(VideoFrame::default)
                    .take(MAX_TRACKS)
                    .collect(),
                primary_chain: vec![p_mixer, p_filter],
                bypass_chain: vec![b_mixer],
                chain_instances: vec![p_mixer_name, p_filter_name, b_mixer_name],
                active: Patch::Primary,
                fade: None,
                stopped: false,
            }),
        })
    }

    // --- Per-tick operations ---

    /// Overwrites the input frame for `track` on both patches.
    ///
    /// Serialized against `render()` and other producers by the exclusive
    /// lock; the write is visible to the next render.
    pub fn set_input_frame(&self, frame: VideoFrame, track: usize) -> Result<(), RoutingError> {
        let core = self.write_core();
        if track >= MAX_TRACKS {
            return Err(RoutingError::TrackOutOfRange {
                track,
                capacity: MAX_TRACKS,
            });
        }
        core.bypass_feeds[track].write(frame.clone());
        core.primary_feeds[track].write(frame);
        Ok(())
    }

    /// Runs one render tick, producing output track 0 from the current input
    /// frames. Total: never fails on a started engine; a no-op after
    /// [`shutdown`](Self::shutdown).
    pub fn render(&self) {
        let mut core = self.write_core();
        let core = &mut *core;
        if core.stopped {
            return;
        }

        let fading = core.fade.is_some();
        if core.active == Patch::Primary || fading {
            render_chain(&mut core.factory, &core.primary_chain);
        }
        if core.active == Patch::Bypass || fading {
            render_chain(&mut core.factory, &core.bypass_chain);
        }

        let frame = match core.fade.take() {
            None => core.sink_frame(core.active),
            Some(mut fade) => {
                let alpha = (fade.total - fade.remaining + 1) as f32 / fade.total as f32;
                let blended = core
                    .sink_frame(fade.from)
                    .blend(&core.sink_frame(core.active), alpha);
                fade.remaining -= 1;
                if fade.remaining > 0 {
                    core.fade = Some(fade);
                }
                blended
            }
        };
        core.outputs[0] = frame;
    }

    /// Reads the output frame currently held for `track`.
    ///
    /// Takes the shared lock, so reads never tear against a concurrent
    /// render. Tracks never written by a render hold the default frame.
    pub fn output_frame(&self, track: usize) -> Result<VideoFrame, RoutingError> {
        let core = self
            .core
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        core.outputs
            .get(track)
            .cloned()
            .ok_or(RoutingError::TrackOutOfRange {
                track,
                capacity: MAX_TRACKS,
            })
    }

    // --- Patch switching ---

    /// Routes the primary (filtered) patch to the output.
    pub fn enable(&self) {
        self.switch_to(Patch::Primary);
    }

    /// Routes the bypass (unfiltered) patch to the output.
    pub fn disable(&self) {
        self.switch_to(Patch::Bypass);
    }

    /// The patch currently routed to the output.
    pub fn active_patch(&self) -> Patch {
        self.core
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .active
    }

    fn switch_to(&self, target: Patch) {
        let mut core = self.write_core();
        if core.stopped || core.active == target {
            return;
        }
        let from = core.active;
        core.active = target;
        core.fade = match core.config.switch_policy {
            SwitchPolicy::Cut | SwitchPolicy::Crossfade { ticks: 0 } => None,
            SwitchPolicy::Crossfade { ticks } => Some(Fade {
                from,
                remaining: ticks,
                total: ticks,
            }),
        };
        tracing::debug!("engine_switch: {from:?} → {target:?}");
    }

    // --- Shutdown ---

    /// Tears the engine down: unloads the default chain instances, deletes
    /// both root graphs, clears the input and output arrays. Idempotent;
    /// subsequent renders are no-ops.
    pub fn shutdown(&self) {
        let mut core = self.write_core();
        let core = &mut *core;
        if core.stopped {
            return;
        }
        core.stopped = true;

        // Engine-owned endpoints first; the factory only fixes arena peers.
        for feed in core
            .primary_feeds
            .iter_mut()
            .chain(core.bypass_feeds.iter_mut())
        {
            feed.sever();
        }
        core.primary_sink.sever();
        core.bypass_sink.sever();

        let instances = std::mem::take(&mut core.chain_instances);
        for name in &instances {
            if let Err(err) = core.factory.delete_instance(name) {
                tracing::warn!("engine_stop: unload '{name}': {err}");
            }
        }
        for key in [PRIMARY_ROOT, BYPASS_ROOT] {
            if let Err(err) = core.factory.delete_root(key) {
                tracing::warn!("engine_stop: delete root '{key}': {err}");
            }
        }

        core.primary_chain.clear();
        core.bypass_chain.clear();
        for frame in &mut core.outputs {
            *frame = VideoFrame::default();
        }
        tracing::debug!("engine_stop: done");
    }

    /// Returns true until [`shutdown`](Self::shutdown) runs.
    pub fn is_running(&self) -> bool {
        !self
            .core
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .stopped
    }

    /// Live instance names in the engine's factory.
    pub fn instance_names(&self) -> Vec<String> {
        self.core
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .factory
            .instance_names()
    }

    fn write_core(&self) -> std::sync::RwLockWriteGuard<'_, EngineCore> {
        self.core.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EngineCore {
    fn sink_frame(&self, patch: Patch) -> VideoFrame {
        match patch {
            Patch::Primary => self.primary_sink.read(),
            Patch::Bypass => self.bypass_sink.read(),
        }
    }
}

/// Renders a chain's nodes in their fixed dependency order.
fn render_chain(factory: &mut NodeFactory, chain: &[NodeId]) {
    for &id in chain {
        if let Some(node) = factory.node_mut(id) {
            node.render();
        }
    }
}
