#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PerspectiveProjection {
    pub aspect_ratio: f32,
    pub fovy: cgmath::Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl PerspectiveProjection {
    pub fn with_aspect_ratio(self, aspect_ratio: f32) -> Self {
        Self {
            aspect_ratio,
            ..self
        }
    }
}

impl Default for PerspectiveProjection {
    fn default() -> Self {
        Self {
            aspect_ratio: 720.0 / 480.0,
            fovy: cgmath::Deg(45.0).into(),
            znear: 0.001,
            zfar: 1000.0,
        }
    }
}

impl From<PerspectiveProjection> for cgmath::Matrix4<f32> {
    fn from(value: PerspectiveProjection) -> Self {
        OPENGL_TO_WGPU_MATRIX
            * cgmath::perspective(value.fovy, value.aspect_ratio, value.znear, value.zfar)
    }
}

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);
