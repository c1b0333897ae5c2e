//! Core rendering functionality
//!
//! Surface and frame management, uploaded meshes, and the wgpu implementation
//! of the shader program backend.

pub mod mesh;
pub mod render_engine;
pub mod wgpu_backend;
pub mod wgsl;

pub use mesh::GpuMesh;
pub use render_engine::RenderEngine;
pub use wgpu_backend::{DrawMode, WgpuBackend};
