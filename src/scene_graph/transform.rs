use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};
use std::cell::{Cell, Ref, RefCell};

#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    rotation: Quat,
    scale: f32,

    local_matrix: RefCell<Mat4>,
    world_matrix: RefCell<Mat4>,
    inverse_transpose_world_matrix: RefCell<Mat4>,
    local_dirty: Cell<bool>,
    world_dirty: Cell<bool>,
    has_changed_since_last_update: Cell<bool>,
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            scale: 1.0,
            local_matrix: RefCell::new(Mat4::IDENTITY),
            world_matrix: RefCell::new(Mat4::IDENTITY),
            inverse_transpose_world_matrix: RefCell::new(Mat4::IDENTITY),
            local_dirty: Cell::new(true),
            world_dirty: Cell::new(true),
            has_changed_since_last_update: Cell::new(true),
        }
    }

    pub fn get_local_matrix(&self) -> Ref<Mat4> {
        if self.local_dirty.get() {
            let matrix = Mat4::from_scale_rotation_translation(
                Vec3::splat(self.scale),
                self.rotation,
                self.translation,
            );

            self.local_matrix.replace(matrix);
            self.local_dirty.set(false);
            self.invalidate_world();
        }

        self.local_matrix.borrow()
    }

    pub fn get_world_matrix(&self) -> Ref<Mat4> {
        self.world_matrix.borrow()
    }

    pub fn get_inverse_transpose_world_matrix(&self) -> Ref<Mat4> {
        self.inverse_transpose_world_matrix.borrow()
    }

    pub fn set_world_matrix(&self, world_matrix: Mat4) {
        self.world_matrix.replace(world_matrix);
        self.world_dirty.set(false);
        self.has_changed_since_last_update.set(true);
        self.inverse_transpose_world_matrix
            .replace(world_matrix.inverse().transpose());
    }

    pub fn world_position(&self) -> Vec3 {
        self.world_matrix.borrow().w_axis.truncate()
    }

    pub fn invalidate_local(&self) {
        self.local_dirty.set(true);
        self.world_dirty.set(true);
        self.has_changed_since_last_update.set(true);
    }

    pub fn invalidate_world(&self) {
        self.world_dirty.set(true);
    }

    pub fn is_world_dirty(&self) -> bool {
        self.world_dirty.get()
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.invalidate_local();
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.invalidate_local();
    }

    /// Euler angles in radians, applied in X, Y, Z order.
    pub fn set_rotation_euler(&mut self, x: f32, y: f32, z: f32) {
        self.set_rotation(Quat::from_euler(EulerRot::XYZ, x, y, z));
    }

    pub fn rotation_euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    /// Turns the local -Z axis towards `target`, the way cameras and lights are aimed.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.translation).normalize_or_zero();
        if forward == Vec3::ZERO {
            return;
        }

        let z = -forward;
        let mut x = up.cross(z);
        if x.length_squared() < 1e-8 {
            // `up` is parallel to the view direction, nudge it.
            x = (up + Vec3::new(0.0, 0.0, 1e-4)).cross(z);
        }
        let x = x.normalize();
        let y = z.cross(x);

        self.set_rotation(Quat::from_mat3(&Mat3::from_cols(x, y, z)));
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn reset_flags(&self) {
        self.has_changed_since_last_update.set(false);
    }

    pub fn has_changed(&self) -> bool {
        self.has_changed_since_last_update.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_matrix_follows_translation_and_rotation() {
        let mut transform = Transform::from_translation(Vec3::new(0.0, -0.65, 0.0));
        transform.set_rotation_euler(-std::f32::consts::FRAC_PI_2, 0.0, 0.0);

        let matrix = *transform.get_local_matrix();
        let up = matrix.transform_vector3(Vec3::Z);

        assert!(up.abs_diff_eq(Vec3::Y, 1e-6));
        assert!(matrix
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(0.0, -0.65, 0.0), 1e-6));
    }

    #[test]
    fn euler_angles_round_trip() {
        let mut transform = Transform::from_translation(Vec3::ZERO);
        transform.set_rotation_euler(0.3, 0.2, 0.0);

        assert!(transform
            .rotation_euler()
            .abs_diff_eq(Vec3::new(0.3, 0.2, 0.0), 1e-5));
    }

    #[test]
    fn look_at_points_negative_z_at_target() {
        let mut transform = Transform::from_translation(Vec3::new(-1.5, 0.0, 1.5));
        transform.look_at(Vec3::ZERO, Vec3::Y);

        let forward = transform.rotation() * Vec3::NEG_Z;
        let expected = Vec3::new(1.5, 0.0, -1.5).normalize();

        assert!(forward.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn look_at_straight_down_does_not_produce_nan() {
        let mut transform = Transform::from_translation(Vec3::new(0.0, 3.0, 0.0));
        transform.look_at(Vec3::ZERO, Vec3::Y);

        let forward = transform.rotation() * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(Vec3::NEG_Y, 1e-3));
    }

    #[test]
    fn world_matrix_clears_dirty_flag() {
        let transform = Transform::from_translation(Vec3::X);
        assert!(transform.is_world_dirty());

        transform.set_world_matrix(*transform.get_local_matrix());

        assert!(!transform.is_world_dirty());
        assert_eq!(transform.world_position(), Vec3::X);
    }
}
