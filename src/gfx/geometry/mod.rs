//! # Procedural Geometry Generation
//!
//! This module generates the vertex data for the three shapes the viewer draws,
//! so no model files are needed.
//!
//! ## Supported Primitives
//!
//! - **Sphere**: UV sphere of radius 0.5, emitted as a triangle list
//! - **Torus**: parametric torus, emitted as a triangle strip
//! - **Heightfield**: the surface `z = sqrt(|x * y|)` over `[-1, 1]²`, emitted as a triangle list
//!
//! All generators are pure: the output depends only on the parameters. Geometry is
//! non-indexed, three floats per vertex.
//!
//! ## Usage
//!
//! ```rust
//! use meshview::gfx::geometry::{generate_heightfield, generate_sphere, generate_torus};
//!
//! let sphere = generate_sphere(30, 30).unwrap();
//! let torus = generate_torus(40, 40, 0.7, 0.3).unwrap();
//! let plane = generate_heightfield(20).unwrap();
//!
//! assert_eq!(sphere.float_count(), 31 * 31 * 6 * 3);
//! assert_eq!(torus.vertex_count(), 40 * 41 * 2);
//! assert_eq!(plane.vertex_count(), 19 * 19 * 6);
//! ```

pub mod primitives;

pub use primitives::*;

use thiserror::Error;

/// Floats per vertex (x, y, z)
pub const FLOATS_PER_VERTEX: usize = 3;

/// How consecutive vertices of a [`VertexBuffer`] form triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Every three vertices form an independent triangle
    TriangleList,
    /// Each vertex after the first two forms a triangle with the previous two
    TriangleStrip,
}

/// Errors raised by the generators before any vertex is produced
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("invalid {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },

    #[error("vertex data needs {required} floats but the destination holds only {capacity}")]
    Capacity { required: usize, capacity: usize },
}

impl GeometryError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Generated vertex positions ready for GPU upload
///
/// The data is a flat `x, y, z` sequence with no index buffer. It is produced once
/// and never mutated; callers upload it and may drop the host copy afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBuffer {
    data: Vec<f32>,
    topology: Topology,
}

impl VertexBuffer {
    pub(crate) fn new(data: Vec<f32>, topology: Topology) -> Self {
        debug_assert_eq!(data.len() % FLOATS_PER_VERTEX, 0);
        Self { data, topology }
    }

    /// The raw floats, three per vertex
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Number of floats in the buffer
    pub fn float_count(&self) -> usize {
        self.data.len()
    }

    /// Number of vertices in the buffer
    pub fn vertex_count(&self) -> usize {
        self.data.len() / FLOATS_PER_VERTEX
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Iterates over the vertex positions
    pub fn positions(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.data
            .chunks_exact(FLOATS_PER_VERTEX)
            .map(|v| [v[0], v[1], v[2]])
    }
}
