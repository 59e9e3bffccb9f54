use cgmath::{ElementWise, One, Rotation, Zero};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    pub translation: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: cgmath::Vector3::new(x, y, z),
            ..Default::default()
        }
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = cgmath::Vector3::new(scale, scale, scale);
        self
    }

    pub fn position(&self) -> cgmath::Point3<f32> {
        cgmath::Point3::new(self.translation.x, self.translation.y, self.translation.z)
    }

    /// Places `child` in the space of `self`. Exact unless a non-uniform
    /// parent scale meets a rotated child.
    pub fn compose(&self, child: &Transform) -> Transform {
        Transform {
            translation: self.translation
                + self
                    .rotation
                    .rotate_vector(self.scale.mul_element_wise(child.translation)),
            rotation: self.rotation * child.rotation,
            scale: self.scale.mul_element_wise(child.scale),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: cgmath::Vector3::zero(),
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl From<Transform> for cgmath::Matrix4<f32> {
    fn from(value: Transform) -> Self {
        cgmath::Matrix4::from_translation(value.translation)
            * cgmath::Matrix4::from(value.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(value.scale.x, value.scale.y, value.scale.z)
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Rotation3;

    use super::*;

    #[test]
    fn matrix_applies_scale_before_translation() {
        let transform = Transform::from_translation(1.0, 2.0, 3.0).with_uniform_scale(2.0);
        let matrix = cgmath::Matrix4::from(transform);

        let point = matrix * cgmath::Vector4::new(1.0, 1.0, 1.0, 1.0);

        assert_eq!(point, cgmath::Vector4::new(3.0, 4.0, 5.0, 1.0));
    }

    #[test]
    fn composed_transform_matches_the_matrix_product() {
        let parent = Transform {
            rotation: cgmath::Quaternion::from_angle_y(cgmath::Deg(90.0)),
            ..Transform::from_translation(0.0, 1.0, 0.0).with_uniform_scale(2.0)
        };
        let child = Transform::from_translation(1.0, 0.0, 0.0);

        let composed = cgmath::Matrix4::from(parent.compose(&child));
        let expected = cgmath::Matrix4::from(parent) * cgmath::Matrix4::from(child);

        for column in 0..4 {
            for row in 0..4 {
                assert!((composed[column][row] - expected[column][row]).abs() < 1e-5);
            }
        }
    }
}
