pub mod camera_controller;
pub mod orbit_camera;

pub use camera_controller::CameraController;
pub use orbit_camera::{OrbitCamera, Projection};
