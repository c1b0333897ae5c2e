use winit::{
    event::{ElementState, KeyEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::orbit_camera::{OrbitCamera, Projection};

/// Keyboard orbit controls
///
/// W/S raise and lower the camera, A/D turn it around the target while the
/// keys are held. P and O switch between perspective and orthographic.
pub struct CameraController {
    /// Degrees per second while a key is held
    pub orbit_speed: f32,
    is_up_pressed: bool,
    is_down_pressed: bool,
    is_left_pressed: bool,
    is_right_pressed: bool,
}

impl CameraController {
    pub fn new(orbit_speed: f32) -> Self {
        Self {
            orbit_speed,
            is_up_pressed: false,
            is_down_pressed: false,
            is_left_pressed: false,
            is_right_pressed: false,
        }
    }

    /// Returns true if the key was a camera control
    pub fn process_keyed_events(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) -> bool {
        match event.physical_key {
            PhysicalKey::Code(code) => self.process_key(code, event.state, camera),
            PhysicalKey::Unidentified(_) => false,
        }
    }

    pub fn process_key(
        &mut self,
        code: KeyCode,
        state: ElementState,
        camera: &mut OrbitCamera,
    ) -> bool {
        let pressed = state == ElementState::Pressed;
        match code {
            KeyCode::KeyW => self.is_up_pressed = pressed,
            KeyCode::KeyS => self.is_down_pressed = pressed,
            KeyCode::KeyA => self.is_left_pressed = pressed,
            KeyCode::KeyD => self.is_right_pressed = pressed,
            KeyCode::KeyP if pressed => {
                log::info!("perspective projection");
                camera.projection = Projection::Perspective;
            }
            KeyCode::KeyO if pressed => {
                log::info!("orthographic projection");
                camera.projection = Projection::Orthographic;
            }
            KeyCode::KeyP | KeyCode::KeyO => {}
            _ => return false,
        }
        true
    }

    /// Advances the orbit by `dt` seconds of held keys
    pub fn update(&self, dt: f32, camera: &mut OrbitCamera) {
        let step = self.orbit_speed * dt;
        if self.is_up_pressed {
            camera.add_elevation(step);
        }
        if self.is_down_pressed {
            camera.add_elevation(-step);
        }
        if self.is_left_pressed {
            camera.add_azimuth(-step);
        }
        if self.is_right_pressed {
            camera.add_azimuth(step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_keys_orbit_over_time() {
        let mut camera = OrbitCamera::new(6.0, 1.0);
        let mut controller = CameraController::new(90.0);

        controller.process_key(KeyCode::KeyW, ElementState::Pressed, &mut camera);
        controller.process_key(KeyCode::KeyD, ElementState::Pressed, &mut camera);
        controller.update(0.5, &mut camera);
        assert!((camera.elevation - 45.0).abs() < 1e-4);
        assert!((camera.azimuth - 45.0).abs() < 1e-4);

        controller.process_key(KeyCode::KeyW, ElementState::Released, &mut camera);
        controller.process_key(KeyCode::KeyD, ElementState::Released, &mut camera);
        controller.update(1.0, &mut camera);
        assert!((camera.elevation - 45.0).abs() < 1e-4);
        assert!((camera.azimuth - 45.0).abs() < 1e-4);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut camera = OrbitCamera::new(6.0, 1.0);
        let mut controller = CameraController::new(90.0);
        controller.process_key(KeyCode::KeyA, ElementState::Pressed, &mut camera);
        controller.process_key(KeyCode::KeyD, ElementState::Pressed, &mut camera);
        controller.update(1.0, &mut camera);
        assert!(camera.azimuth.abs() < 1e-4);
    }

    #[test]
    fn test_projection_keys() {
        let mut camera = OrbitCamera::new(6.0, 1.0);
        let mut controller = CameraController::new(90.0);

        assert!(controller.process_key(KeyCode::KeyO, ElementState::Pressed, &mut camera));
        assert_eq!(camera.projection, Projection::Orthographic);
        controller.process_key(KeyCode::KeyO, ElementState::Released, &mut camera);
        assert_eq!(camera.projection, Projection::Orthographic);
        controller.process_key(KeyCode::KeyP, ElementState::Pressed, &mut camera);
        assert_eq!(camera.projection, Projection::Perspective);
    }

    #[test]
    fn test_other_keys_are_not_consumed() {
        let mut camera = OrbitCamera::new(6.0, 1.0);
        let mut controller = CameraController::new(90.0);
        assert!(!controller.process_key(KeyCode::Escape, ElementState::Pressed, &mut camera));
        controller.update(1.0, &mut camera);
        assert_eq!((camera.azimuth, camera.elevation), (0.0, 0.0));
    }
}
