//! # Tilewalk - headless runner
//!
//! Streams an infinite tile world (or builds an authored tile map) against
//! counting stand-ins for the renderer, physics and spawners.

pub mod config;
pub mod headless;
pub mod scenes;

// Re-export core modules for convenience
pub use tilewalk_core::animation;
pub use tilewalk_core::levels;
pub use tilewalk_core::world;

pub use config::GameConfig;
pub use scenes::{RunSummary, SceneSource, WorldScene};
