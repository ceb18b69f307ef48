//! VMD 原始关键帧记录
//!
//! 字段保持文件中的原始坐标系与单位，不做任何轴向转换。
//! 所有数值均为小端序。

use byteorder::{ByteOrder, LittleEndian};
use glam::{Quat, Vec3};

use super::{
    decode_shift_jis, BONE_KEYFRAME_SIZE, CAMERA_KEYFRAME_SIZE, IK_STATE_SIZE,
    LIGHT_KEYFRAME_SIZE, MAGIC_SIZE, MODEL_NAME_SIZE, MORPH_KEYFRAME_SIZE,
    SELF_SHADOW_KEYFRAME_SIZE,
};

/// 带帧号的记录
pub trait Keyframe {
    fn frame_number(&self) -> u32;
}

/// 按帧号升序稳定排序
pub fn sort_by_frame<T: Keyframe>(keyframes: &mut [T]) {
    keyframes.sort_by_key(|keyframe| keyframe.frame_number());
}

fn read_vec3(bytes: &[u8]) -> Vec3 {
    Vec3::new(
        LittleEndian::read_f32(&bytes[0..4]),
        LittleEndian::read_f32(&bytes[4..8]),
        LittleEndian::read_f32(&bytes[8..12]),
    )
}

fn read_interpolation(bytes: &[u8], out: &mut [i8]) {
    for (dst, &src) in out.iter_mut().zip(bytes) {
        *dst = src as i8;
    }
}

/// 文件头
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawHeader {
    pub magic: [u8; MAGIC_SIZE],
    pub model_name: [u8; MODEL_NAME_SIZE],
}

impl RawHeader {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut magic = [0u8; MAGIC_SIZE];
        let mut model_name = [0u8; MODEL_NAME_SIZE];
        magic.copy_from_slice(&bytes[..MAGIC_SIZE]);
        model_name.copy_from_slice(&bytes[MAGIC_SIZE..MAGIC_SIZE + MODEL_NAME_SIZE]);
        Self { magic, model_name }
    }

    pub fn magic_str(&self) -> String {
        decode_shift_jis(&self.magic)
    }

    /// 相机动作的模型名通常是 "カメラ・照明"
    pub fn model_name_str(&self) -> String {
        decode_shift_jis(&self.model_name)
    }
}

impl Default for RawHeader {
    fn default() -> Self {
        Self {
            magic: [0; MAGIC_SIZE],
            model_name: [0; MODEL_NAME_SIZE],
        }
    }
}

/// 骨骼关键帧（111 字节）
#[derive(Clone, Debug)]
pub struct BoneKeyFrame {
    pub bone_name: String,
    pub frame_number: u32,
    pub position: Vec3,
    /// 四元数 (x, y, z, w)
    pub rotation: Quat,
    pub interpolation: [i8; 64],
}

impl BoneKeyFrame {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len(), BONE_KEYFRAME_SIZE);
        let mut interpolation = [0i8; 64];
        read_interpolation(&bytes[47..111], &mut interpolation);

        Self {
            bone_name: decode_shift_jis(&bytes[0..15]),
            frame_number: LittleEndian::read_u32(&bytes[15..19]),
            position: read_vec3(&bytes[19..31]),
            rotation: Quat::from_xyzw(
                LittleEndian::read_f32(&bytes[31..35]),
                LittleEndian::read_f32(&bytes[35..39]),
                LittleEndian::read_f32(&bytes[39..43]),
                LittleEndian::read_f32(&bytes[43..47]),
            ),
            interpolation,
        }
    }
}

/// Morph 关键帧（23 字节）
#[derive(Clone, Debug)]
pub struct MorphKeyFrame {
    pub morph_name: String,
    pub frame_number: u32,
    pub weight: f32,
}

impl MorphKeyFrame {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len(), MORPH_KEYFRAME_SIZE);
        Self {
            morph_name: decode_shift_jis(&bytes[0..15]),
            frame_number: LittleEndian::read_u32(&bytes[15..19]),
            weight: LittleEndian::read_f32(&bytes[19..23]),
        }
    }
}

/// MMD 默认的线性插值（每组 x1=20, x2=107, y1=20, y2=107）
pub const CAMERA_LINEAR_INTERPOLATION: [i8; 24] = [
    20, 107, 20, 107, 20, 107, 20, 107, 20, 107, 20, 107,
    20, 107, 20, 107, 20, 107, 20, 107, 20, 107, 20, 107,
];

/// 相机关键帧（61 字节）
///   frame_number (u32, 4B)
///   distance (f32, 4B)：相机到中心点的距离，通常为负
///   position (Vec3, 12B)：中心点
///   rotation (Vec3, 12B)：欧拉角，弧度
///   interpolation (24B)：6 组贝塞尔参数，每组 [x1, x2, y1, y2]
///     顺序: 中心 X, 中心 Y, 中心 Z, 旋转, 距离, 视角
///   view_angle (u32, 4B)：视角，度
///   perspective (u8, 1B)
#[derive(Clone, Debug, PartialEq)]
pub struct CameraKeyFrame {
    pub frame_number: u32,
    pub distance: f32,
    pub position: Vec3,
    pub rotation: Vec3,
    pub interpolation: [i8; 24],
    pub view_angle: u32,
    pub perspective: u8,
}

impl CameraKeyFrame {
    pub fn new(frame_number: u32) -> Self {
        Self {
            frame_number,
            distance: -45.0,
            position: Vec3::new(0.0, 10.0, 0.0),
            rotation: Vec3::ZERO,
            interpolation: CAMERA_LINEAR_INTERPOLATION,
            view_angle: 30,
            perspective: 0,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len(), CAMERA_KEYFRAME_SIZE);
        let mut interpolation = [0i8; 24];
        read_interpolation(&bytes[32..56], &mut interpolation);

        Self {
            frame_number: LittleEndian::read_u32(&bytes[0..4]),
            distance: LittleEndian::read_f32(&bytes[4..8]),
            position: read_vec3(&bytes[8..20]),
            rotation: read_vec3(&bytes[20..32]),
            interpolation,
            view_angle: LittleEndian::read_u32(&bytes[56..60]),
            perspective: bytes[60],
        }
    }

    /// MMD 中 0 表示透视开启
    pub fn is_perspective(&self) -> bool {
        self.perspective == 0
    }

    /// 判断相机参数是否不连续（视角、距离、位置、旋转任一不同）
    pub fn differs_from(&self, other: &CameraKeyFrame) -> bool {
        self.view_angle != other.view_angle
            || self.distance != other.distance
            || self.position != other.position
            || self.rotation != other.rotation
    }
}

/// 照明关键帧（28 字节）
#[derive(Clone, Debug)]
pub struct LightKeyFrame {
    pub frame_number: u32,
    pub color: Vec3,
    pub direction: Vec3,
}

impl LightKeyFrame {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len(), LIGHT_KEYFRAME_SIZE);
        Self {
            frame_number: LittleEndian::read_u32(&bytes[0..4]),
            color: read_vec3(&bytes[4..16]),
            direction: read_vec3(&bytes[16..28]),
        }
    }
}

/// 本影（セルフ影）关键帧（9 字节）
#[derive(Clone, Debug)]
pub struct SelfShadowKeyFrame {
    pub frame_number: u32,
    pub mode: u8,
    pub distance: f32,
}

impl SelfShadowKeyFrame {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len(), SELF_SHADOW_KEYFRAME_SIZE);
        Self {
            frame_number: LittleEndian::read_u32(&bytes[0..4]),
            mode: bytes[4],
            distance: LittleEndian::read_f32(&bytes[5..9]),
        }
    }
}

/// IK 启用状态（21 字节）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IkState {
    pub ik_name: String,
    pub enabled: bool,
}

impl IkState {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len(), IK_STATE_SIZE);
        Self {
            ik_name: decode_shift_jis(&bytes[0..20]),
            enabled: bytes[20] != 0,
        }
    }
}

/// 属性关键帧（显示 + IK 状态，变长）
#[derive(Clone, Debug, Default)]
pub struct PropertyKeyFrame {
    pub frame_number: u32,
    pub visible: bool,
    pub ik_states: Vec<IkState>,
}

macro_rules! impl_keyframe {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Keyframe for $ty {
                fn frame_number(&self) -> u32 {
                    self.frame_number
                }
            }
        )*
    };
}

impl_keyframe!(
    BoneKeyFrame,
    MorphKeyFrame,
    CameraKeyFrame,
    LightKeyFrame,
    SelfShadowKeyFrame,
    PropertyKeyFrame,
);

/// 解析结果
///
/// `success` 为 false 时各数组内容不可用（可能只填充了一部分）。
#[derive(Clone, Debug, Default)]
pub struct ParseResult {
    pub success: bool,
    /// 用户取消导致的失败
    pub cancelled: bool,
    pub header: RawHeader,
    pub bone_keyframes: Vec<BoneKeyFrame>,
    pub morph_keyframes: Vec<MorphKeyFrame>,
    pub camera_keyframes: Vec<CameraKeyFrame>,
    pub light_keyframes: Vec<LightKeyFrame>,
    pub self_shadow_keyframes: Vec<SelfShadowKeyFrame>,
    pub property_keyframes: Vec<PropertyKeyFrame>,
}

impl ParseResult {
    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn has_camera_data(&self) -> bool {
        !self.camera_keyframes.is_empty()
    }

    /// 最大帧号
    pub fn max_frame(&self) -> u32 {
        fn last<T: Keyframe>(keyframes: &[T]) -> u32 {
            keyframes.last().map(|keyframe| keyframe.frame_number()).unwrap_or(0)
        }

        last(&self.bone_keyframes)
            .max(last(&self.morph_keyframes))
            .max(last(&self.camera_keyframes))
            .max(last(&self.light_keyframes))
            .max(last(&self.self_shadow_keyframes))
            .max(last(&self.property_keyframes))
    }
}
