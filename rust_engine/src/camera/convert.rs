//! MMD 坐标系 → 宿主坐标系
//!
//! 位置: MMD (x, y, z) → 宿主 (z, x, y)
//! 旋转: 同样的轴置换，宿主 Z 轴取反，弧度转为度

use glam::{DVec3, Vec3};

/// 视角（度） → 焦距（毫米）
///
/// focal = (sensor_width / 2) / tan(fov / 2)
pub fn compute_focal_length(field_of_view: f32, sensor_width: f32) -> f32 {
    (sensor_width / 2.0) / (field_of_view / 2.0).to_radians().tan()
}

/// `compute_focal_length` 的反函数
pub fn compute_field_of_view(focal_length: f32, sensor_width: f32) -> f32 {
    2.0 * ((sensor_width / 2.0) / focal_length).atan().to_degrees()
}

/// 宿主焦距通道使用的值（为 `compute_focal_length` 的一半）
pub fn camera_focal_length(view_angle: f64, sensor_width: f32) -> f64 {
    compute_focal_length(view_angle as f32, sensor_width) as f64 / 2.0
}

pub fn to_host_location(position: Vec3, scale: f32) -> DVec3 {
    DVec3::new(position.z as f64, position.x as f64, position.y as f64) * scale as f64
}

/// 返回度，依次为宿主 X/Y/Z 轴
pub fn to_host_rotation(rotation: Vec3) -> DVec3 {
    DVec3::new(
        (rotation.z as f64).to_degrees(),
        (rotation.x as f64).to_degrees(),
        -(rotation.y as f64).to_degrees(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focal_length_inverse() {
        for fov in [1.0f32, 10.0, 30.0, 45.0, 60.0, 90.0, 120.0, 150.0, 170.0] {
            let focal = compute_focal_length(fov, 24.0);
            assert!(focal > 0.0);
            let back = compute_field_of_view(focal, 24.0);
            assert!((back - fov).abs() < 1e-3, "fov {} -> {} -> {}", fov, focal, back);
        }
    }

    #[test]
    fn test_focal_length_known_value() {
        // 36mm 宽、90° 视角 → 18mm
        assert!((compute_focal_length(90.0, 36.0) - 18.0).abs() < 1e-4);
        // 焦距 25mm、传感器 18mm 对应的视角
        let fov = 2.0 * (18.0f32 / (2.0 * 25.0)).atan().to_degrees();
        assert!((compute_focal_length(fov, 18.0) - 25.0).abs() < 1e-3);
        assert!((camera_focal_length(90.0, 36.0) - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_axis_remap() {
        let location = to_host_location(Vec3::new(1.0, 2.0, 3.0), 10.0);
        assert_eq!(location, DVec3::new(30.0, 10.0, 20.0));

        let rotation = to_host_rotation(Vec3::new(
            std::f32::consts::FRAC_PI_2,
            std::f32::consts::PI,
            std::f32::consts::FRAC_PI_4,
        ));
        assert!((rotation.x - 45.0).abs() < 1e-4);
        assert!((rotation.y - 90.0).abs() < 1e-4);
        assert!((rotation.z + 180.0).abs() < 1e-4);
    }
}
