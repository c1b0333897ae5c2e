//! # Graphics Module
//!
//! All graphics functionality of the viewer.
//!
//! - **Geometry** ([`geometry`]) - Procedural sphere, torus and heightfield vertex data
//! - **Shader Programs** ([`shader`]) - Compile/link lifecycle and named uniforms
//! - **Rendering** ([`rendering`]) - Surface, frames, meshes and the wgpu backend
//! - **Camera System** ([`camera`]) - Keyboard-driven orbit camera
//! - **Scene** ([`scene`]) - The objects drawn each frame
//!
//! Geometry and shader programs do not need a GPU; everything under
//! [`rendering`] does.

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod shader;

pub use camera::OrbitCamera;
pub use rendering::RenderEngine;
pub use scene::Scene;
