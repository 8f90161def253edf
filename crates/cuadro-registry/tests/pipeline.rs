//! End-to-end pipeline tests over the built-in effect catalog.
//!
//! These drive the routing engine with the real registry plugins — the track
//! mixer feeding the green filter — instead of the test doubles used inside
//! cuadro-core.

use cuadro_core::{
    EngineConfig, MAX_TRACKS, NodeFactory, Patch, RoutingEngine, SlotEndpoint, SwitchPolicy,
    VideoFrame,
};
use cuadro_registry::{builtin_factory, register_builtin_effects};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn default_chain_mixes_then_filters() {
    init_tracing();
    let engine = RoutingEngine::new(builtin_factory()).unwrap();
    assert_eq!(
        engine.instance_names(),
        vec!["greenfilter_1", "mixer_1", "mixer_2"]
    );

    // Three producers on different tracks; track 2 is topmost.
    engine
        .set_input_frame(VideoFrame::solid(4, 4, [10, 20, 30, 255]), 40)
        .unwrap();
    engine
        .set_input_frame(VideoFrame::solid(4, 4, [50, 60, 70, 255]), 2)
        .unwrap();
    engine
        .set_input_frame(VideoFrame::solid(4, 4, [80, 90, 99, 255]), 17)
        .unwrap();
    engine.render();

    // Track 2 won the mix, then lost its red and blue channels.
    let out = engine.output_frame(0).unwrap();
    assert_eq!(&out.plane()[..4], &[0, 60, 0, 255]);
}

#[test]
fn bypass_patch_skips_the_filter_stage() {
    init_tracing();
    let engine = RoutingEngine::new(builtin_factory()).unwrap();
    engine
        .set_input_frame(VideoFrame::solid(2, 2, [100, 110, 120, 255]), 0)
        .unwrap();

    engine.disable();
    assert_eq!(engine.active_patch(), Patch::Bypass);
    engine.render();
    // The raw mix comes through untouched.
    let raw = engine.output_frame(0).unwrap();
    assert_eq!(&raw.plane()[..4], &[100, 110, 120, 255]);

    engine.enable();
    engine.render();
    let filtered = engine.output_frame(0).unwrap();
    assert_eq!(&filtered.plane()[..4], &[0, 110, 0, 255]);
}

#[test]
fn crossfade_blends_filtered_and_raw_output() {
    init_tracing();
    let engine = RoutingEngine::with_config(
        builtin_factory(),
        EngineConfig {
            switch_policy: SwitchPolicy::Crossfade { ticks: 2 },
            ..EngineConfig::default()
        },
    )
    .unwrap();

    engine
        .set_input_frame(VideoFrame::solid(1, 1, [200, 40, 0, 255]), 0)
        .unwrap();
    engine.render();
    assert_eq!(&engine.output_frame(0).unwrap().plane()[..4], &[0, 40, 0, 255]);

    engine.disable();
    // Halfway: red ramps from 0 (filtered) toward 200 (raw).
    engine.render();
    assert_eq!(engine.output_frame(0).unwrap().plane()[0], 100);
    engine.render();
    assert_eq!(engine.output_frame(0).unwrap().plane()[0], 200);
}

#[test]
fn alternate_filter_types_drive_the_chain() {
    init_tracing();
    let engine = RoutingEngine::with_config(
        builtin_factory(),
        EngineConfig {
            filter_type: "invert".to_string(),
            ..EngineConfig::default()
        },
    )
    .unwrap();
    assert_eq!(
        engine.instance_names(),
        vec!["invert_1", "mixer_1", "mixer_2"]
    );

    engine
        .set_input_frame(VideoFrame::solid(1, 1, [0, 128, 255, 9]), 5)
        .unwrap();
    engine.render();
    assert_eq!(engine.output_frame(0).unwrap().plane(), &[255, 127, 0, 9]);
}

// Assembles the two-stage graph by hand through the factory, without the
// engine, and checks the exact composition at each stage boundary.
#[test]
fn manual_graph_assembly_and_teardown() {
    init_tracing();
    let mut factory = NodeFactory::new();
    register_builtin_effects(&mut factory);

    let root = factory.create_root("scratch").unwrap();
    let mixer = factory.create_child(root, "mixer").unwrap();
    let filter = factory.create_child(root, "greenfilter").unwrap();
    assert_eq!(mixer, "mixer_1");
    assert_eq!(filter, "greenfilter_1");
    assert_eq!(factory.child_type_names(root), vec!["mixer", "greenfilter"]);

    let mixer_id = factory.instance(&mixer).unwrap();
    let filter_id = factory.instance(&filter).unwrap();
    assert_eq!(factory.node(mixer_id).unwrap().input_count(), MAX_TRACKS);

    factory
        .connect(
            SlotEndpoint { node: mixer_id, slot: 0 },
            SlotEndpoint { node: filter_id, slot: 0 },
        )
        .unwrap();

    // Literal frames into two mixer inputs; the lower index wins the mix.
    let mixer_node = factory.node_mut(mixer_id).unwrap();
    mixer_node
        .feed(VideoFrame::solid(2, 2, [30, 40, 50, 255]), 3)
        .unwrap();
    mixer_node
        .feed(VideoFrame::solid(2, 2, [60, 70, 80, 255]), 48)
        .unwrap();
    mixer_node.render();

    // Stage boundary: the mixer's output is the unfiltered winner.
    let mixed = factory.node(mixer_id).unwrap().output(0).unwrap().value();
    assert_eq!(&mixed.plane()[..4], &[30, 40, 50, 255]);

    factory.node_mut(filter_id).unwrap().render();
    let filtered = factory.node(filter_id).unwrap().output(0).unwrap().value();
    assert_eq!(&filtered.plane()[..4], &[0, 40, 0, 255]);

    // Deleting the mixer while connected severs the filter's input cleanly.
    factory.delete_instance(&mixer).unwrap();
    let filter_in = factory.node(filter_id).unwrap().input(0).unwrap();
    assert!(!filter_in.is_connected());
    assert!(filter_in.read().is_empty());

    factory.delete_root("scratch").unwrap();
    assert!(factory.instance_names().is_empty());
}

#[test]
fn shutdown_after_real_traffic() {
    init_tracing();
    let engine = RoutingEngine::new(builtin_factory()).unwrap();
    engine
        .set_input_frame(VideoFrame::solid(8, 8, [1, 2, 3, 255]), 0)
        .unwrap();
    engine.render();
    assert!(!engine.output_frame(0).unwrap().is_empty());

    engine.shutdown();
    assert!(!engine.is_running());
    assert!(engine.instance_names().is_empty());
    assert!(engine.output_frame(0).unwrap().is_empty());
}
