//! VMD 相机导入配置
//!
//! 所有参数扁平化；全局默认实例对应编辑器里的可变默认设置对象。

use once_cell::sync::Lazy;
use std::sync::RwLock;

use crate::{MmdError, Result};

/// 最多同时使用的相机数
pub const MAX_CAMERA_COUNT: u32 = 4;

/// 相机切换（参数突变）的导入方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CameraCutImportType {
    /// 原样导入，全部三次插值
    ImportAsIs,
    /// 切换前的关键帧改为常量插值
    ConstantKey,
    /// 旧值保持到下一帧前一个采样帧，再跳变
    #[default]
    OneFrameInterval,
    /// 同 OneFrameInterval，并强制常量插值
    OneFrameIntervalWithConstantKey,
}

/// 胶片背（传感器尺寸，毫米）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Filmback {
    pub sensor_width: f32,
    pub sensor_height: f32,
}

impl Default for Filmback {
    fn default() -> Self {
        Self {
            sensor_width: 24.0,
            sensor_height: 13.5,
        }
    }
}

/// 导入配置（扁平化，不嵌套）
#[derive(Clone, Debug, PartialEq)]
pub struct ImportVmdSettings {
    /// 是否生成新的相机，默认 true
    pub create_cameras: bool,

    /// 位置/距离的统一缩放，默认 10.0
    /// MMD 的 1 单位约 8cm，宿主按厘米计
    pub import_uniform_scale: f32,

    /// 相机切换导入方式，默认 OneFrameInterval
    pub camera_cut_import_type: CameraCutImportType,

    /// 轮换使用的相机数 1..=4，默认 2
    /// 1 = 单相机，不插入切换
    pub camera_count: u32,

    /// 是否写入动态模糊关键帧，默认 false
    pub add_motion_blur_key: bool,

    /// 动态模糊强度 0..=1，默认 0.5
    pub motion_blur_amount: f32,

    pub filmback: Filmback,
}

impl Default for ImportVmdSettings {
    fn default() -> Self {
        Self {
            create_cameras: true,
            import_uniform_scale: 10.0,
            camera_cut_import_type: CameraCutImportType::OneFrameInterval,
            camera_count: 2,
            add_motion_blur_key: false,
            motion_blur_amount: 0.5,
            filmback: Filmback::default(),
        }
    }
}

impl ImportVmdSettings {
    /// 检查取值范围
    pub fn validate(&self) -> Result<()> {
        if !(self.import_uniform_scale > 0.0) || !self.import_uniform_scale.is_finite() {
            return Err(MmdError::InvalidSettings(format!(
                "import_uniform_scale must be > 0, got {}",
                self.import_uniform_scale
            )));
        }
        if !(1..=MAX_CAMERA_COUNT).contains(&self.camera_count) {
            return Err(MmdError::InvalidSettings(format!(
                "camera_count must be in 1..={}, got {}",
                MAX_CAMERA_COUNT, self.camera_count
            )));
        }
        if !(0.0..=1.0).contains(&self.motion_blur_amount) {
            return Err(MmdError::InvalidSettings(format!(
                "motion_blur_amount must be in 0..=1, got {}",
                self.motion_blur_amount
            )));
        }
        if !(self.filmback.sensor_width > 0.0) || !(self.filmback.sensor_height > 0.0) {
            return Err(MmdError::InvalidSettings(format!(
                "sensor size must be > 0, got {}x{}",
                self.filmback.sensor_width, self.filmback.sensor_height
            )));
        }
        Ok(())
    }
}

/// 全局配置实例
static IMPORT_SETTINGS: Lazy<RwLock<ImportVmdSettings>> =
    Lazy::new(|| RwLock::new(ImportVmdSettings::default()));

/// 获取当前配置（只读）
pub fn get_settings() -> ImportVmdSettings {
    IMPORT_SETTINGS
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// 替换当前配置
pub fn set_settings(settings: ImportVmdSettings) {
    *IMPORT_SETTINGS
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = settings;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ImportVmdSettings::default();
        assert_eq!(settings.import_uniform_scale, 10.0);
        assert_eq!(settings.camera_cut_import_type, CameraCutImportType::OneFrameInterval);
        assert_eq!(settings.camera_count, 2);
        assert!(!settings.add_motion_blur_key);
        assert_eq!(settings.motion_blur_amount, 0.5);
        assert_eq!(settings.filmback.sensor_width, 24.0);
        assert_eq!(settings.filmback.sensor_height, 13.5);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_ranges() {
        let mut settings = ImportVmdSettings::default();
        settings.camera_count = 0;
        assert!(settings.validate().is_err());
        settings.camera_count = 5;
        assert!(settings.validate().is_err());
        settings.camera_count = 4;
        assert!(settings.validate().is_ok());

        settings.motion_blur_amount = 1.5;
        assert!(settings.validate().is_err());
        settings.motion_blur_amount = 1.0;

        settings.import_uniform_scale = 0.0;
        assert!(settings.validate().is_err());
        settings.import_uniform_scale = f32::NAN;
        assert!(settings.validate().is_err());
        settings.import_uniform_scale = 1.0;

        settings.filmback.sensor_width = -1.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_global_settings() {
        let mut custom = ImportVmdSettings::default();
        custom.camera_count = 3;
        set_settings(custom.clone());
        assert_eq!(get_settings(), custom);
        set_settings(ImportVmdSettings::default());
        assert_eq!(get_settings(), ImportVmdSettings::default());
    }
}
