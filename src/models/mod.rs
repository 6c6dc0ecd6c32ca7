//! Data models for foesmm-core.
//!
//! - [`GameDescriptor`]: Immutable per-game description (titles, executable, channel keys)
//! - [`Catalog`]: The list of supported games loaded from `Games.yaml`
//! - [`Settings`]: User preferences and path overrides loaded from `Settings.yaml`
//! - [`Plugin`] / [`Archive`]: Content units and the containers that back them

pub mod content;
pub mod descriptor;
pub mod settings;

pub use content::{Archive, Plugin};
pub use descriptor::{Catalog, GameDescriptor, ReleaseState};
pub use settings::Settings;
