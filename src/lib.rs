//! meshview
//!
//! Draws a procedurally generated sphere, torus and heightfield with wgpu and
//! winit, each through its own vertex/fragment shader program, under a
//! keyboard-driven orbit camera.

pub mod app;
pub mod config;
pub mod gfx;

pub use app::ViewerApp;
pub use config::ViewerConfig;
