//! 相机插值曲线 → 宿主加权切线
//!
//! 相机关键帧的 24 字节插值表是 6 组贝塞尔控制点 [x1, x2, y1, y2]，
//! 每组描述的是「上一帧 → 本帧」这一段，取值 0..=127。
//! 宿主的切线挂在关键帧两侧，所以：
//!   到达切线 (arrive) 用本帧的 (x2, y2)，归一化为 1 - b/127
//!   离开切线 (leave) 用下一帧的 (x1, y1)，归一化为 b/127

use super::timeline::{KeyTangent, TangentWeightMode};

/// 插值表中的曲线，按存储顺序
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterpolationCurve {
    LookAtX,
    LookAtY,
    LookAtZ,
    Rotation,
    Distance,
    FieldOfView,
}

impl InterpolationCurve {
    fn index(self) -> usize {
        match self {
            InterpolationCurve::LookAtX => 0,
            InterpolationCurve::LookAtY => 1,
            InterpolationCurve::LookAtZ => 2,
            InterpolationCurve::Rotation => 3,
            InterpolationCurve::Distance => 4,
            InterpolationCurve::FieldOfView => 5,
        }
    }
}

/// 某条曲线在插值表中的四个字节下标
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TangentAccessIndices {
    pub arrive_x: usize,
    pub arrive_y: usize,
    pub leave_x: usize,
    pub leave_y: usize,
}

impl TangentAccessIndices {
    pub fn for_curve(curve: InterpolationCurve) -> Self {
        let base = curve.index() * 4;
        Self {
            leave_x: base,
            arrive_x: base + 1,
            leave_y: base + 2,
            arrive_y: base + 3,
        }
    }
}

fn normalize(byte: i8) -> f32 {
    f32::from(byte) / 127.0
}

/// 控制柄 (dt, dv) → (斜率, 权重)
///
/// dt 为 0 时斜率按 dv 的符号取 ±1，两者都为 0 时为平切线。
pub fn slope_and_weight(dt: f32, dv: f32) -> (f32, f32) {
    let weight = dt.hypot(dv);
    if dt == 0.0 {
        let slope = if dv > 0.0 {
            1.0
        } else if dv < 0.0 {
            -1.0
        } else {
            0.0
        };
        return (slope, weight);
    }
    (dv / dt, weight)
}

/// 到达切线，`interpolation` 为本帧的插值表，`dt`/`dv` 为上一帧到本帧的变化量
pub fn arrive_tangent(
    interpolation: &[i8; 24],
    indices: &TangentAccessIndices,
    dt: f32,
    dv: f32,
) -> (f32, f32) {
    let nx = 1.0 - normalize(interpolation[indices.arrive_x]);
    let ny = 1.0 - normalize(interpolation[indices.arrive_y]);
    slope_and_weight(nx * dt, ny * dv)
}

/// 离开切线，`interpolation` 为下一帧的插值表，`dt`/`dv` 为本帧到下一帧的变化量
pub fn leave_tangent(
    interpolation: &[i8; 24],
    indices: &TangentAccessIndices,
    dt: f32,
    dv: f32,
) -> (f32, f32) {
    let nx = normalize(interpolation[indices.leave_x]);
    let ny = normalize(interpolation[indices.leave_y]);
    slope_and_weight(nx * dt, ny * dv)
}

/// 按在序列中的位置组装切线：首帧无到达侧，末帧无离开侧
pub fn build_tangent(
    arrive: Option<(f32, f32)>,
    leave: Option<(f32, f32)>,
) -> KeyTangent {
    let (arrive_tangent, arrive_tangent_weight) = arrive.unwrap_or((0.0, 0.0));
    let (leave_tangent, leave_tangent_weight) = leave.unwrap_or((0.0, 0.0));
    let weight_mode = match (arrive.is_some(), leave.is_some()) {
        (true, true) => TangentWeightMode::Both,
        (true, false) => TangentWeightMode::Arrive,
        (false, true) => TangentWeightMode::Leave,
        (false, false) => TangentWeightMode::None,
    };

    KeyTangent {
        arrive_tangent,
        leave_tangent,
        arrive_tangent_weight,
        leave_tangent_weight,
        weight_mode,
    }
}
