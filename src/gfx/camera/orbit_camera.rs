use cgmath::*;

/// Maps OpenGL clip depth `[-w, w]` onto wgpu's `[0, w]`
///
/// Arguments are column by column: `z' = 0.5 z + 0.5 w`, `w' = w`.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Which projection the camera renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// 45° vertical field of view
    Perspective,
    /// Fixed `[-3, 3]²` view volume
    Orthographic,
}

/// Camera orbiting `target` at a fixed distance
///
/// Angles are in degrees. `azimuth` turns around the Y axis starting from +Z;
/// `elevation` lifts the camera towards +Y. Elevation is unbounded: past the
/// poles the camera keeps going over the top and the up vector follows.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub azimuth: f32,
    pub elevation: f32,
    pub distance: f32,
    pub target: Point3<f32>,
    pub projection: Projection,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl OrbitCamera {
    pub fn new(distance: f32, aspect: f32) -> Self {
        Self {
            azimuth: 0.0,
            elevation: 0.0,
            distance,
            target: Point3::origin(),
            projection: Projection::Perspective,
            aspect,
            znear: 0.1,
            zfar: 100.0,
        }
    }

    pub fn eye(&self) -> Point3<f32> {
        let (sin_az, cos_az) = Deg(self.azimuth).sin_cos();
        let (sin_el, cos_el) = Deg(self.elevation).sin_cos();
        self.target
            + Vector3::new(sin_az * cos_el, sin_el, cos_az * cos_el) * self.distance
    }

    /// Direction of increasing elevation, which is never parallel to the view
    /// direction and points down once the camera has passed over a pole
    pub fn up(&self) -> Vector3<f32> {
        let (sin_az, cos_az) = Deg(self.azimuth).sin_cos();
        let (sin_el, cos_el) = Deg(self.elevation).sin_cos();
        Vector3::new(-sin_az * sin_el, cos_el, -cos_az * sin_el)
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye(), self.target, self.up())
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let projection = match self.projection {
            Projection::Perspective => perspective(Deg(45.0), self.aspect, self.znear, self.zfar),
            Projection::Orthographic => ortho(-3.0, 3.0, -3.0, 3.0, self.znear, self.zfar),
        };
        OPENGL_TO_WGPU_MATRIX * projection
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn add_azimuth(&mut self, degrees: f32) {
        self.azimuth = (self.azimuth + degrees) % 360.0;
    }

    pub fn add_elevation(&mut self, degrees: f32) {
        self.elevation = (self.elevation + degrees) % 360.0;
    }
}
