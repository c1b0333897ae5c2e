//! Viewer settings
//!
//! Everything the viewer needs to build its window, camera and scene. There is
//! no config file; [`ViewerConfig::default`] is the configuration the binary runs.

use std::path::PathBuf;

/// Geometry and shader selection for one scene object
#[derive(Debug, Clone)]
pub struct ObjectConfig {
    pub name: &'static str,
    pub fragment_shader: PathBuf,
    pub translation: [f32; 3],
    pub scale: f32,
    pub wireframe: bool,
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: wgpu::Color,

    /// Vertex shader shared by every object
    pub vertex_shader: PathBuf,
    pub sphere: ObjectConfig,
    pub torus: ObjectConfig,
    pub plane: ObjectConfig,

    pub sphere_latitude_segments: u32,
    pub sphere_longitude_segments: u32,
    pub torus_major_segments: u32,
    pub torus_minor_segments: u32,
    pub torus_major_radius: f32,
    pub torus_minor_radius: f32,
    pub plane_steps: u32,

    pub camera_distance: f32,
    /// Degrees per second while an orbit key is held
    pub orbit_speed: f32,
}

impl ViewerConfig {
    /// Directory holding the WGSL sources shipped with the crate
    pub fn shader_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("shaders")
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let shaders = Self::shader_dir();

        Self {
            title: "meshview".to_owned(),
            width: 900,
            height: 600,
            clear_color: wgpu::Color {
                r: 1.0,
                g: 0.85,
                b: 0.7,
                a: 1.0,
            },

            vertex_shader: shaders.join("vertex.wgsl"),
            sphere: ObjectConfig {
                name: "sphere",
                fragment_shader: shaders.join("sphere.wgsl"),
                translation: [-2.6, 0.0, 0.0],
                scale: 1.5,
                wireframe: false,
            },
            torus: ObjectConfig {
                name: "torus",
                fragment_shader: shaders.join("torus.wgsl"),
                translation: [2.4, 0.0, 0.0],
                scale: 1.0,
                wireframe: true,
            },
            plane: ObjectConfig {
                name: "plane",
                fragment_shader: shaders.join("plane.wgsl"),
                translation: [-0.15, 0.0, 0.0],
                scale: 1.0,
                wireframe: false,
            },

            sphere_latitude_segments: 30,
            sphere_longitude_segments: 30,
            torus_major_segments: 40,
            torus_minor_segments: 40,
            torus_major_radius: 0.7,
            torus_minor_radius: 0.3,
            plane_steps: 20,

            camera_distance: 6.0,
            orbit_speed: 30.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{rendering::wgsl, shader::ShaderStage};

    #[test]
    fn test_default_shaders_link() {
        let config = ViewerConfig::default();
        let vertex_source = std::fs::read_to_string(&config.vertex_shader).unwrap();
        let vertex = wgsl::compile(ShaderStage::Vertex, &vertex_source).unwrap();

        for object in [&config.sphere, &config.torus, &config.plane] {
            let source = std::fs::read_to_string(&object.fragment_shader).unwrap();
            let fragment = wgsl::compile(ShaderStage::Fragment, &source)
                .unwrap_or_else(|log| panic!("{}: {log}", object.name));
            wgsl::check_interface(&vertex, &fragment).unwrap();

            let uniforms = wgsl::reflect_uniforms(&vertex, &fragment).unwrap();
            let names: Vec<_> = uniforms.iter().map(|u| u.name.as_str()).collect();
            for required in ["model", "view", "projection"] {
                assert!(names.contains(&required), "{} lacks {required}", object.name);
            }
        }
    }

    #[test]
    fn test_plane_shader_reads_time() {
        let config = ViewerConfig::default();
        let vertex_source = std::fs::read_to_string(&config.vertex_shader).unwrap();
        let plane_source = std::fs::read_to_string(&config.plane.fragment_shader).unwrap();
        let vertex = wgsl::compile(ShaderStage::Vertex, &vertex_source).unwrap();
        let plane = wgsl::compile(ShaderStage::Fragment, &plane_source).unwrap();

        let uniforms = wgsl::reflect_uniforms(&vertex, &plane).unwrap();
        let time = uniforms.iter().find(|u| u.name == "time").unwrap();
        assert!(time.in_fragment && !time.in_vertex);
    }

    #[test]
    fn test_only_torus_is_wireframe() {
        let config = ViewerConfig::default();
        assert!(config.torus.wireframe);
        assert!(!config.sphere.wireframe && !config.plane.wireframe);
    }
}
