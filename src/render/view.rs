use std::rc::Rc;

use cgmath::Rotation;

use crate::data::projection::PerspectiveProjection;
use crate::data::transform::Transform;
use crate::render::backend::RenderBackend;
use crate::render::buffer::{BufferCategory, GpuBuffer, GpuBufferDescriptor};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UniformData {
    pub view_matrix: [[f32; 4]; 4],
    pub projection_matrix: [[f32; 4]; 4],
    pub camera_world_position: [f32; 3],
    pub time: f32,
}

pub fn create_view_matrix_from_transform(transform: Transform) -> cgmath::Matrix4<f32> {
    cgmath::Matrix4::look_to_rh(
        transform.position(),
        transform.rotation.rotate_vector(-cgmath::Vector3::unit_z()),
        cgmath::Vector3::unit_y(),
    )
}

/// Per-frame uniform block shared by every pass.
///
/// The CPU copy mirrors the GPU buffer; each setter rewrites only the fields it changes.
pub struct ViewEnvironment<B: RenderBackend> {
    backend: Rc<B>,
    uniform_buffer: GpuBuffer<B>,
    uniform_data: UniformData,
    projection: PerspectiveProjection,
}

impl<B: RenderBackend> ViewEnvironment<B> {
    pub fn from_backend(backend: Rc<B>, projection: PerspectiveProjection) -> Self {
        let uniform_buffer = GpuBuffer::from_backend(
            &*backend,
            GpuBufferDescriptor::for_category(
                BufferCategory::Uniform,
                1,
                std::mem::size_of::<UniformData>() as u64,
            ),
        );

        let camera_transform = Transform::default();
        let uniform_data = UniformData {
            view_matrix: create_view_matrix_from_transform(camera_transform).into(),
            projection_matrix: cgmath::Matrix4::from(projection).into(),
            camera_world_position: camera_transform.position().into(),
            time: 0.0,
        };

        backend.write_buffer(
            &uniform_buffer.gpu_buffer,
            0,
            bytemuck::bytes_of(&uniform_data),
        );

        Self {
            backend,
            uniform_buffer,
            uniform_data,
            projection,
        }
    }

    pub fn uniform_buffer(&self) -> &GpuBuffer<B> {
        &self.uniform_buffer
    }

    pub fn uniform_data(&self) -> &UniformData {
        &self.uniform_data
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.projection.aspect_ratio
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        if self.projection.aspect_ratio == aspect_ratio {
            return;
        }

        self.projection = self.projection.with_aspect_ratio(aspect_ratio);
        self.uniform_data.projection_matrix = cgmath::Matrix4::from(self.projection).into();

        self.write_field(
            std::mem::offset_of!(UniformData, projection_matrix),
            bytemuck::bytes_of(&self.uniform_data.projection_matrix),
        );
    }

    pub fn set_camera_transform(&mut self, transform: Transform) {
        self.uniform_data.view_matrix = create_view_matrix_from_transform(transform).into();
        self.uniform_data.camera_world_position = transform.position().into();

        self.write_field(
            std::mem::offset_of!(UniformData, view_matrix),
            bytemuck::bytes_of(&self.uniform_data.view_matrix),
        );
        self.write_field(
            std::mem::offset_of!(UniformData, camera_world_position),
            bytemuck::bytes_of(&self.uniform_data.camera_world_position),
        );
    }

    pub fn set_time(&mut self, time: f32) {
        self.uniform_data.time = time;

        self.write_field(
            std::mem::offset_of!(UniformData, time),
            bytemuck::bytes_of(&self.uniform_data.time),
        );
    }

    fn write_field(&self, offset: usize, bytes: &[u8]) {
        self.backend
            .write_buffer(&self.uniform_buffer.gpu_buffer, offset as u64, bytes);
    }
}
