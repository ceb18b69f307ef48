//! 宿主时间轴与场景的抽象
//!
//! 导入逻辑只通过这里的 trait 写入关键帧、生成相机，不依赖任何具体引擎。

use glam::DVec3;
use std::fmt;

use crate::Result;

use super::settings::Filmback;

/// 有理帧率 numerator / denominator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl FrameRate {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self { numerator, denominator }
    }

    pub fn as_decimal(&self) -> f64 {
        if self.denominator == 0 {
            return 0.0;
        }
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

/// 宿主对象绑定句柄
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingId(pub u64);

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// 被动画的属性
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelProperty {
    CurrentFocalLength,
    MotionBlurAmount,
    Location(Axis),
    Rotation(Axis),
}

impl ChannelProperty {
    /// 宿主侧的属性路径
    pub fn path(&self) -> &'static str {
        match self {
            ChannelProperty::CurrentFocalLength => "CurrentFocalLength",
            ChannelProperty::MotionBlurAmount => "PostProcessSettings.MotionBlurAmount",
            ChannelProperty::Location(Axis::X) => "Transform.Location.X",
            ChannelProperty::Location(Axis::Y) => "Transform.Location.Y",
            ChannelProperty::Location(Axis::Z) => "Transform.Location.Z",
            ChannelProperty::Rotation(Axis::X) => "Transform.Rotation.X",
            ChannelProperty::Rotation(Axis::Y) => "Transform.Rotation.Y",
            ChannelProperty::Rotation(Axis::Z) => "Transform.Rotation.Z",
        }
    }
}

/// 一条动画通道 = 绑定 + 属性
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId {
    pub binding: BindingId,
    pub property: ChannelProperty,
}

impl ChannelId {
    pub fn new(binding: BindingId, property: ChannelProperty) -> Self {
        Self { binding, property }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.binding, self.property.path())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InterpMode {
    #[default]
    Cubic,
    Constant,
}

/// 哪一侧的切线权重有效
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TangentWeightMode {
    #[default]
    None,
    Arrive,
    Leave,
    Both,
}

/// 加权贝塞尔切线
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KeyTangent {
    pub arrive_tangent: f32,
    pub leave_tangent: f32,
    pub arrive_tangent_weight: f32,
    pub leave_tangent_weight: f32,
    pub weight_mode: TangentWeightMode,
}

/// 通道中的一个关键帧，时间单位为宿主 tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelKey<T> {
    pub time: i64,
    pub value: T,
    pub interp: InterpMode,
    pub tangent: KeyTangent,
}

impl<T> ChannelKey<T> {
    /// 保持值、零切线
    pub fn hold(time: i64, value: T) -> Self {
        Self {
            time,
            value,
            interp: InterpMode::Cubic,
            tangent: KeyTangent::default(),
        }
    }

    pub fn constant(time: i64, value: T) -> Self {
        Self {
            time,
            value,
            interp: InterpMode::Constant,
            tangent: KeyTangent::default(),
        }
    }
}

/// 宿主通道的两种数值类型（焦距等为 f32，变换为 f64）
pub trait ChannelValue: Copy + PartialEq + fmt::Debug {
    fn from_f64(value: f64) -> Self;

    fn add_key<T: Timeline + ?Sized>(timeline: &mut T, channel: &ChannelId, key: ChannelKey<Self>);
}

impl ChannelValue for f32 {
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn add_key<T: Timeline + ?Sized>(timeline: &mut T, channel: &ChannelId, key: ChannelKey<Self>) {
        timeline.add_float_key(channel, key);
    }
}

impl ChannelValue for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }

    fn add_key<T: Timeline + ?Sized>(timeline: &mut T, channel: &ChannelId, key: ChannelKey<Self>) {
        timeline.add_double_key(channel, key);
    }
}

/// 宿主时间轴（序列）
///
/// 通道不存在时由实现方按需创建；`add_*_key` 需保持通道内按时间排序。
pub trait Timeline {
    /// 内部 tick 分辨率（如 24000/1）
    fn tick_resolution(&self) -> FrameRate;

    /// 显示（采样）帧率（如 30/1）
    fn display_rate(&self) -> FrameRate;

    /// 清空通道中已有的关键帧
    fn reset_channel(&mut self, channel: &ChannelId);

    fn set_float_default(&mut self, channel: &ChannelId, value: f32);

    fn add_float_key(&mut self, channel: &ChannelId, key: ChannelKey<f32>);

    fn add_double_key(&mut self, channel: &ChannelId, key: ChannelKey<f64>);

    /// 清空相机切换轨道
    fn reset_camera_cuts(&mut self);

    /// 在相机切换轨道上追加一段，从 `time` 开始使用 `camera`
    fn add_camera_cut(&mut self, time: i64, camera: BindingId);
}

/// 生成相机时的初始状态（来自第一帧）
#[derive(Clone, Debug, PartialEq)]
pub struct CameraSpawn {
    pub index: usize,
    pub camera_label: String,
    pub pivot_label: String,
    /// 相机相对中心点的位置
    pub camera_location: DVec3,
    pub pivot_location: DVec3,
    /// 度，依次为宿主 X/Y/Z 轴
    pub pivot_rotation: DVec3,
    pub filmback: Filmback,
    pub focal_length: f32,
    pub focus_enabled: bool,
}

/// 一台已绑定的相机：中心点 + 挂在其下的相机
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraRig {
    pub camera: BindingId,
    pub pivot: BindingId,
}

/// 场景对象的生成与绑定
pub trait SceneBinder {
    /// 生成中心点与相机，把相机挂到中心点下，并返回两者的绑定
    fn spawn_camera(&mut self, spawn: &CameraSpawn) -> Result<CameraRig>;

    /// 解析相机组件（焦距等属性的拥有者）的绑定，不存在时创建；
    /// 句柄无效时返回 None
    fn bind(&mut self, camera: BindingId) -> Option<BindingId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rate_decimal() {
        assert_eq!(FrameRate::new(24000, 1).as_decimal(), 24000.0);
        assert!((FrameRate::new(30000, 1001).as_decimal() - 29.97).abs() < 0.001);
        assert_eq!(FrameRate::new(1, 0).as_decimal(), 0.0);
        assert_eq!(FrameRate::new(60, 1).to_string(), "60");
        assert_eq!(FrameRate::new(30000, 1001).to_string(), "30000/1001");
    }

    #[test]
    fn test_property_paths() {
        assert_eq!(ChannelProperty::CurrentFocalLength.path(), "CurrentFocalLength");
        assert_eq!(
            ChannelProperty::MotionBlurAmount.path(),
            "PostProcessSettings.MotionBlurAmount"
        );
        assert_eq!(ChannelProperty::Rotation(Axis::Z).path(), "Transform.Rotation.Z");
        let id = ChannelId::new(BindingId(3), ChannelProperty::Location(Axis::Y));
        assert_eq!(id.to_string(), "#3:Transform.Location.Y");
    }

    #[test]
    fn test_hold_key_is_flat() {
        let key = ChannelKey::hold(100, 2.5f64);
        assert_eq!(key.interp, InterpMode::Cubic);
        assert_eq!(key.tangent, KeyTangent::default());
        assert_eq!(key.tangent.weight_mode, TangentWeightMode::None);
        assert_eq!(ChannelKey::constant(0, 1.0f32).interp, InterpMode::Constant);
    }
}
