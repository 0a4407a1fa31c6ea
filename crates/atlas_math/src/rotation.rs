//! Euler rotation for editor transforms
//!
//! The editor stores rotations as three Euler angles in degrees and
//! applies them intrinsically about X, then Y, then Z, right-handed.

use crate::vector::Vec3;

/// Rotate a point about the X, then Y, then Z axes (angles in radians)
pub fn rotate_euler_xyz(point: Vec3, radians: Vec3) -> Vec3 {
    let (sx, cx) = radians.x.sin_cos();
    let (sy, cy) = radians.y.sin_cos();
    let (sz, cz) = radians.z.sin_cos();

    // X axis
    let p = Vec3::new(
        point.x,
        point.y * cx - point.z * sx,
        point.y * sx + point.z * cx,
    );
    // Y axis
    let p = Vec3::new(
        p.x * cy + p.z * sy,
        p.y,
        -p.x * sy + p.z * cy,
    );
    // Z axis
    Vec3::new(
        p.x * cz - p.y * sz,
        p.x * sz + p.y * cz,
        p.z,
    )
}

/// Degree-denominated variant of [`rotate_euler_xyz`]
#[inline]
pub fn rotate_euler_xyz_degrees(point: Vec3, degrees: Vec3) -> Vec3 {
    rotate_euler_xyz(point, degrees * crate::consts::DEG_TO_RAD)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn test_rotate_z_quarter_turn() {
        let p = rotate_euler_xyz_degrees(Vec3::X, Vec3::new(0.0, 0.0, 90.0));
        assert_close(p, Vec3::Y);
    }

    #[test]
    fn test_rotate_x_quarter_turn() {
        let p = rotate_euler_xyz_degrees(Vec3::Y, Vec3::new(90.0, 0.0, 0.0));
        assert_close(p, Vec3::Z);
    }

    #[test]
    fn test_rotate_y_quarter_turn() {
        let p = rotate_euler_xyz_degrees(Vec3::Z, Vec3::new(0.0, 90.0, 0.0));
        assert_close(p, Vec3::X);
    }

    #[test]
    fn test_rotation_order_is_x_then_y_then_z() {
        // X by 90 takes Y to Z, then Y by 90 takes Z to X
        let p = rotate_euler_xyz_degrees(Vec3::Y, Vec3::new(90.0, 90.0, 0.0));
        assert_close(p, Vec3::X);
    }

    #[test]
    fn test_identity_rotation() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_close(rotate_euler_xyz(p, Vec3::ZERO), p);
    }
}
