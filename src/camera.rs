use cgmath::Angle;
use cgmath::InnerSpace;
use cgmath::Rotation;

use crate::data::transform::Transform;

const SAFE_FRAC_PI_2: f32 = std::f32::consts::FRAC_PI_2 - 0.0001;

const MIN_DISTANCE: f32 = 1.0;
const MAX_DISTANCE: f32 = 500.0;

/// Orbits a target point. Left-drag rotates, the wheel zooms.
pub struct OrbitalCameraController {
    target: cgmath::Point3<f32>,
    distance: f32,
    yaw: cgmath::Rad<f32>,
    pitch: cgmath::Rad<f32>,
    sensitivity: f32,
    zoom_speed: f32,
    is_left_mouse_pressed: bool,
    rotation_horizontal: f32,
    rotation_vertical: f32,
    zoom: f32,
}

impl OrbitalCameraController {
    pub fn new(
        target: cgmath::Point3<f32>,
        distance: f32,
        yaw: cgmath::Rad<f32>,
        pitch: cgmath::Rad<f32>,
        sensitivity: f32,
    ) -> Self {
        Self {
            target,
            distance: distance.clamp(MIN_DISTANCE, MAX_DISTANCE),
            yaw,
            pitch,
            sensitivity,
            zoom_speed: 0.1,
            is_left_mouse_pressed: false,
            rotation_horizontal: 0.0,
            rotation_vertical: 0.0,
            zoom: 0.0,
        }
    }

    pub fn handle_mouse_input(
        &mut self,
        button: winit::event::MouseButton,
        state: winit::event::ElementState,
    ) {
        if button == winit::event::MouseButton::Left {
            self.is_left_mouse_pressed = state == winit::event::ElementState::Pressed;
        }
    }

    pub fn handle_mouse_movement(&mut self, delta_x: f32, delta_y: f32) {
        if !self.is_left_mouse_pressed {
            return;
        }

        self.rotation_horizontal += delta_x;
        self.rotation_vertical += delta_y;
    }

    pub fn handle_mouse_wheel(&mut self, delta: winit::event::MouseScrollDelta) {
        self.zoom += match delta {
            winit::event::MouseScrollDelta::LineDelta(_, lines) => lines,
            winit::event::MouseScrollDelta::PixelDelta(position) => position.y as f32 / 40.0,
        };
    }

    /// Applies the input gathered since the last call. Returns `None` when nothing moved.
    pub fn generate_updated_camera_transform(
        &mut self,
        delta_time: std::time::Duration,
    ) -> Option<Transform> {
        let has_rotation = self.rotation_vertical != 0.0 || self.rotation_horizontal != 0.0;
        let has_zoom = self.zoom != 0.0;

        if !has_rotation && !has_zoom {
            return None;
        }

        if has_rotation {
            self.apply_scaled_rotation(delta_time);
            self.rotation_horizontal = 0.0;
            self.rotation_vertical = 0.0;
        }

        if has_zoom {
            self.distance = (self.distance * (1.0 - self.zoom * self.zoom_speed))
                .clamp(MIN_DISTANCE, MAX_DISTANCE);
            self.zoom = 0.0;
        }

        Some(self.calculate_camera_transform())
    }

    fn apply_scaled_rotation(&mut self, delta_time: std::time::Duration) {
        let delta_time = delta_time.as_secs_f32();

        self.yaw += cgmath::Rad(self.rotation_horizontal) * self.sensitivity * delta_time;
        self.pitch += cgmath::Rad(self.rotation_vertical) * self.sensitivity * delta_time;

        self.pitch = cgmath::Rad(self.pitch.0.clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2));
    }

    pub fn calculate_camera_transform(&self) -> Transform {
        let view_direction = cgmath::Vector3::<f32>::new(
            self.yaw.sin() * self.pitch.cos(),
            -self.pitch.sin(),
            -(self.yaw.cos() * self.pitch.cos()),
        )
        .normalize();

        let translation = self.target + (self.distance * -view_direction);

        let rotation = cgmath::Quaternion::<f32>::between_vectors(
            -(cgmath::Vector3::unit_z()),
            view_direction,
        );

        Transform {
            translation: cgmath::Vector3::new(translation.x, translation.y, translation.z),
            rotation,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cgmath::Zero;

    use super::*;

    fn controller() -> OrbitalCameraController {
        OrbitalCameraController::new(
            (0.0, 0.0, 0.0).into(),
            10.0,
            cgmath::Rad::zero(),
            cgmath::Rad::zero(),
            2.0,
        )
    }

    #[test]
    fn default_orbit_looks_down_negative_z_from_positive_z() {
        let transform = controller().calculate_camera_transform();

        assert!((transform.translation - cgmath::Vector3::new(0.0, 0.0, 10.0)).magnitude() < 1e-5);
    }

    #[test]
    fn nothing_changes_without_input() {
        assert!(controller()
            .generate_updated_camera_transform(Duration::from_millis(16))
            .is_none());
    }

    #[test]
    fn mouse_movement_requires_a_held_button() {
        let mut controller = controller();

        controller.handle_mouse_movement(10.0, 0.0);
        assert!(controller
            .generate_updated_camera_transform(Duration::from_millis(16))
            .is_none());

        controller.handle_mouse_input(
            winit::event::MouseButton::Left,
            winit::event::ElementState::Pressed,
        );
        controller.handle_mouse_movement(10.0, 0.0);
        assert!(controller
            .generate_updated_camera_transform(Duration::from_millis(16))
            .is_some());
    }

    #[test]
    fn zoom_moves_closer_and_stays_clamped() {
        let mut controller = controller();

        controller.handle_mouse_wheel(winit::event::MouseScrollDelta::LineDelta(0.0, 1.0));
        let transform = controller
            .generate_updated_camera_transform(Duration::from_millis(16))
            .unwrap();
        assert!((transform.translation.z - 9.0).abs() < 1e-5);

        controller.handle_mouse_wheel(winit::event::MouseScrollDelta::LineDelta(0.0, 100.0));
        let transform = controller
            .generate_updated_camera_transform(Duration::from_millis(16))
            .unwrap();
        assert!((transform.translation.z - MIN_DISTANCE).abs() < 1e-5);
    }
}
