//! Uploaded vertex data

use wgpu::util::DeviceExt;

use crate::gfx::geometry::{Topology, VertexBuffer, FLOATS_PER_VERTEX};

/// A static GPU vertex buffer built from a [`VertexBuffer`]
///
/// Each vertex is a single `Float32x3` position at shader location 0.
pub struct GpuMesh {
    buffer: wgpu::Buffer,
    vertex_count: u32,
    topology: Topology,
}

impl GpuMesh {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    /// Vertex buffer layout every program pipeline is built with
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: (FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Uploads `vertices`; the host copy can be dropped afterwards
    pub fn upload(device: &wgpu::Device, label: &str, vertices: &VertexBuffer) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices.as_slice()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        log::debug!(
            "uploaded mesh '{}': {} vertices ({:?})",
            label,
            vertices.vertex_count(),
            vertices.topology()
        );

        Self {
            buffer,
            vertex_count: vertices.vertex_count() as u32,
            topology: vertices.topology(),
        }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }
}
