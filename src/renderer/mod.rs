//! Render-side (consumer) state
//!
//! - settings: skinning configuration
//! - skinning: skinned instances, snapshot application, bounds updaters

pub mod settings;
pub mod skinning;

pub use settings::SkinSettings;
pub use skinning::{SkinnedInstances, SkinnedMeshInstance};
