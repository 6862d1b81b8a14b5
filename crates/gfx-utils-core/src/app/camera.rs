// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use glam::{Mat4, Vec3};

use super::{InputState, Key};

/// A first-person camera steered by yaw and pitch.
///
/// Angles are in degrees. Yaw -90 looks down -Z.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyCamera {
    /// Eye position in world space.
    pub position: Vec3,
    /// Rotation around +Y, in degrees.
    pub yaw: f32,
    /// Rotation above the horizon, in degrees. Kept within ±89.
    pub pitch: f32,
    /// Movement speed in units per second.
    pub speed: f32,
    /// Degrees of rotation per unit of cursor movement.
    pub sensitivity: f32,
    /// Vertical field of view, in radians.
    pub fovy: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl FlyCamera {
    const PITCH_LIMIT: f32 = 89.0;

    /// A camera at `position` looking down -Z.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: -90.0,
            pitch: 0.0,
            speed: 2.5,
            sensitivity: 0.1,
            fovy: 45f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }

    /// Unit view direction.
    pub fn front(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    /// Unit vector to the camera's right, parallel to the ground.
    pub fn right(&self) -> Vec3 {
        self.front().cross(Vec3::Y).normalize()
    }

    /// Moves the camera for `dt` seconds according to held keys.
    ///
    /// WASD moves along the view direction and strafes; Space and LeftShift
    /// move along world +Y and -Y.
    pub fn update(&mut self, dt: f32, input: &(impl InputState + ?Sized)) {
        let (front, right) = (self.front(), self.right());
        let mut direction = Vec3::ZERO;
        for (key, axis) in [
            (Key::W, front),
            (Key::S, -front),
            (Key::D, right),
            (Key::A, -right),
            (Key::Space, Vec3::Y),
            (Key::LeftShift, -Vec3::Y),
        ] {
            if input.is_key_pressed(key) {
                direction += axis;
            }
        }
        self.position += direction * self.speed * dt;
    }

    /// Rotates the camera by a cursor movement in pixels.
    ///
    /// Screen y grows downwards, so a positive `dy` looks down.
    pub fn on_cursor_delta(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity)
            .clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    /// World-to-view transform.
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), Vec3::Y)
    }

    /// OpenGL clip-space projection for the given aspect ratio.
    pub fn projection(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fovy, aspect_ratio, self.near, self.far)
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    struct Held(&'static [Key]);

    impl InputState for Held {
        fn is_key_pressed(&self, key: Key) -> bool {
            self.0.contains(&key)
        }
    }

    #[test]
    fn test_default_looks_down_negative_z() {
        let front = FlyCamera::default().front();
        assert_abs_diff_eq!(front.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(front.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(front.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_forward_and_strafe() {
        let mut camera = FlyCamera::new(Vec3::ZERO);
        camera.update(1.0, &Held(&[Key::W]));
        assert_abs_diff_eq!(camera.position.z, -2.5, epsilon = 1e-5);

        let mut camera = FlyCamera::new(Vec3::ZERO);
        camera.update(2.0, &Held(&[Key::D]));
        assert_abs_diff_eq!(camera.position.x, 5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(camera.position.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut camera = FlyCamera::new(Vec3::ONE);
        camera.update(1.0, &Held(&[Key::Space, Key::LeftShift]));
        assert_eq!(camera.position, Vec3::ONE);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = FlyCamera::default();
        camera.on_cursor_delta(0.0, -10_000.0);
        assert_eq!(camera.pitch, 89.0);
        camera.on_cursor_delta(0.0, 10_000.0);
        assert_eq!(camera.pitch, -89.0);
    }

    #[test]
    fn test_view_maps_eye_to_origin() {
        let camera = FlyCamera::new(Vec3::new(1.0, 2.0, 3.0));
        let eye = camera.view().transform_point3(camera.position);
        assert_abs_diff_eq!(eye.length(), 0.0, epsilon = 1e-5);
    }
}
