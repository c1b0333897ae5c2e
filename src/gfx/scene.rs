//! The objects the viewer draws

use std::rc::Rc;

use anyhow::Context;
use cgmath::{Matrix4, Vector3};

use super::{
    geometry::{self, VertexBuffer},
    rendering::{GpuMesh, WgpuBackend},
    shader::ShaderProgram,
};
use crate::config::{ObjectConfig, ViewerConfig};

/// One mesh drawn with its own shader program
pub struct SceneObject {
    pub name: &'static str,
    pub mesh: GpuMesh,
    pub program: ShaderProgram<WgpuBackend>,
    pub translation: Vector3<f32>,
    pub scale: f32,
    pub wireframe: bool,
}

impl SceneObject {
    fn new(
        device: &wgpu::Device,
        backend: &Rc<WgpuBackend>,
        vertex_shader: &std::path::Path,
        object: &ObjectConfig,
        vertices: VertexBuffer,
    ) -> Self {
        let mesh = GpuMesh::upload(device, object.name, &vertices);
        let program = ShaderProgram::new(backend.clone(), vertex_shader, &object.fragment_shader);
        if !program.is_linked() {
            log::error!(
                "'{}' will not be drawn: program '{}' failed to build",
                object.name,
                program.label()
            );
        }

        Self {
            name: object.name,
            mesh,
            program,
            translation: object.translation.into(),
            scale: object.scale,
            wireframe: object.wireframe,
        }
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation) * Matrix4::from_scale(self.scale)
    }
}

pub struct Scene {
    pub objects: Vec<SceneObject>,
}

impl Scene {
    /// Generates the three meshes, uploads them and builds their programs
    ///
    /// Invalid geometry settings are an error. A shader that fails to build only
    /// keeps its object from being drawn.
    pub fn build(
        device: &wgpu::Device,
        backend: &Rc<WgpuBackend>,
        config: &ViewerConfig,
    ) -> anyhow::Result<Self> {
        let plane = geometry::generate_heightfield(config.plane_steps)
            .context("failed to generate heightfield")?;
        let sphere = geometry::generate_sphere(
            config.sphere_latitude_segments,
            config.sphere_longitude_segments,
        )
        .context("failed to generate sphere")?;
        let torus = geometry::generate_torus(
            config.torus_major_segments,
            config.torus_minor_segments,
            config.torus_major_radius,
            config.torus_minor_radius,
        )
        .context("failed to generate torus")?;

        let vs = &config.vertex_shader;
        let objects = vec![
            SceneObject::new(device, backend, vs, &config.plane, plane),
            SceneObject::new(device, backend, vs, &config.sphere, sphere),
            SceneObject::new(device, backend, vs, &config.torus, torus),
        ];

        let drawable: Vec<_> = objects
            .iter()
            .filter(|o| o.program.is_linked())
            .map(|o| o.name)
            .collect();
        log::info!(
            "scene built: {} of {} objects drawable {:?}",
            drawable.len(),
            objects.len(),
            drawable
        );
        Ok(Self { objects })
    }

    /// Records every drawable object into `pass`
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        backend: &WgpuBackend,
        view: Matrix4<f32>,
        projection: Matrix4<f32>,
        time: f32,
    ) {
        for object in self.objects.iter().filter(|o| o.program.is_linked()) {
            let program = &object.program;
            program.activate();
            program.set_mat4("model", object.model_matrix());
            program.set_mat4("view", view);
            program.set_mat4("projection", projection);
            program.set_float("time", time);

            backend.draw(pass, &object.mesh, object.wireframe);
        }
    }

    /// Releases every shader program
    pub fn release(&mut self) {
        for object in &mut self.objects {
            object.program.release();
        }
    }
}
