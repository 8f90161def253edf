//! Plugin catalog and factory registration for cuadro frame effects.
//!
//! This crate is the discovery layer between the routing core and the
//! built-in effect plugins: it describes every effect (id, name, category,
//! slot counts) and knows how to register all of them with a
//! [`NodeFactory`]. The engine's default chain is instantiated from this
//! catalog by type name.
//!
//! # Example
//!
//! ```rust
//! use cuadro_registry::{EffectCategory, builtin_factory, catalog};
//!
//! // List all built-in effects.
//! for effect in catalog() {
//!     println!("{}: {}", effect.id, effect.description);
//! }
//!
//! // A factory with every built-in type registered, ready for the engine.
//! let factory = builtin_factory();
//! assert!(factory.type_names().contains(&"mixer".to_string()));
//! ```

use cuadro_core::{MAX_TRACKS, NodeFactory, NodeTemplate};
use cuadro_effects::{Grayscale, GreenFilter, Invert, TrackMixer};

/// Category of frame effect for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectCategory {
    /// Multi-track compositing stages.
    Mixing,
    /// Single-input color filters.
    ColorFilter,
}

impl EffectCategory {
    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            EffectCategory::Mixing => "Mixing",
            EffectCategory::ColorFilter => "Color Filter",
        }
    }
}

/// Describes one effect in the catalog.
#[derive(Debug, Clone)]
pub struct EffectDescriptor {
    /// Unique type id, as registered with the factory (lowercase, no spaces).
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description of the effect.
    pub description: &'static str,
    /// Category for organization.
    pub category: EffectCategory,
    /// Number of video input slots per instance.
    pub inputs: usize,
    /// Number of video output slots per instance.
    pub outputs: usize,
}

/// One catalog entry: descriptor plus its factory template.
struct CatalogEntry {
    descriptor: EffectDescriptor,
    template: fn() -> NodeTemplate,
}

const BUILTIN: &[CatalogEntry] = &[
    CatalogEntry {
        descriptor: EffectDescriptor {
            id: "mixer",
            name: "Track Mixer",
            description: "Composes one frame from 64 tracks, topmost track wins",
            category: EffectCategory::Mixing,
            inputs: MAX_TRACKS,
            outputs: 1,
        },
        template: || NodeTemplate {
            inputs: MAX_TRACKS,
            outputs: 1,
            build: || Box::new(TrackMixer),
        },
    },
    CatalogEntry {
        descriptor: EffectDescriptor {
            id: "greenfilter",
            name: "Green Filter",
            description: "Keeps only the green channel",
            category: EffectCategory::ColorFilter,
            inputs: 1,
            outputs: 1,
        },
        template: || NodeTemplate {
            inputs: 1,
            outputs: 1,
            build: || Box::new(GreenFilter),
        },
    },
    CatalogEntry {
        descriptor: EffectDescriptor {
            id: "grayscale",
            name: "Grayscale",
            description: "Luma-weighted grayscale conversion",
            category: EffectCategory::ColorFilter,
            inputs: 1,
            outputs: 1,
        },
        template: || NodeTemplate {
            inputs: 1,
            outputs: 1,
            build: || Box::new(Grayscale),
        },
    },
    CatalogEntry {
        descriptor: EffectDescriptor {
            id: "invert",
            name: "Invert",
            description: "Inverts color channels, preserving alpha",
            category: EffectCategory::ColorFilter,
            inputs: 1,
            outputs: 1,
        },
        template: || NodeTemplate {
            inputs: 1,
            outputs: 1,
            build: || Box::new(Invert),
        },
    },
];

/// Descriptors for every built-in effect.
pub fn catalog() -> Vec<&'static EffectDescriptor> {
    BUILTIN.iter().map(|entry| &entry.descriptor).collect()
}

/// Descriptors for the built-in effects in one category.
pub fn catalog_in_category(category: EffectCategory) -> Vec<&'static EffectDescriptor> {
    BUILTIN
        .iter()
        .filter(|entry| entry.descriptor.category == category)
        .map(|entry| &entry.descriptor)
        .collect()
}

/// Looks up a descriptor by effect id.
pub fn descriptor(id: &str) -> Option<&'static EffectDescriptor> {
    BUILTIN
        .iter()
        .find(|entry| entry.descriptor.id == id)
        .map(|entry| &entry.descriptor)
}

/// Registers every built-in effect with an existing factory.
///
/// Registration is last-wins, so calling this on a factory that already has
/// some of the ids refreshes them.
pub fn register_builtin_effects(factory: &mut NodeFactory) {
    for entry in BUILTIN {
        factory.register_node_type(entry.descriptor.id, (entry.template)());
    }
}

/// Returns a fresh [`NodeFactory`] with every built-in effect registered.
///
/// This is what the routing engine expects to be constructed with.
pub fn builtin_factory() -> NodeFactory {
    let mut factory = NodeFactory::new();
    register_builtin_effects(&mut factory);
    factory
}
