//! VMD (Vocaloid Motion Data) 二进制格式
//!
//! 两遍处理：先校验各段声明的长度与流长度一致，再真正反序列化。

mod keyframe;
mod loader;
mod progress;
mod shift_jis;

pub use keyframe::{
    sort_by_frame, BoneKeyFrame, CameraKeyFrame, IkState, Keyframe, LightKeyFrame, MorphKeyFrame,
    ParseResult, PropertyKeyFrame, RawHeader, SelfShadowKeyFrame, CAMERA_LINEAR_INTERPOLATION,
};
pub use loader::{ValidationReport, ValidationWarning, VmdImporter};
pub use progress::{NullProgress, ParsePhase, ParseProgress};
pub use shift_jis::decode_shift_jis;

use std::fmt;

/// VMD 魔数（解码后必须完全一致）
pub const VMD_MAGIC: &str = "Vocaloid Motion Data 0002";

/// 文件头：魔数 30 字节 + 模型名 20 字节
pub const HEADER_SIZE: u64 = 50;
pub const MAGIC_SIZE: usize = 30;
pub const MODEL_NAME_SIZE: usize = 20;

pub const BONE_KEYFRAME_SIZE: usize = 111;
pub const MORPH_KEYFRAME_SIZE: usize = 23;
pub const CAMERA_KEYFRAME_SIZE: usize = 61;
pub const LIGHT_KEYFRAME_SIZE: usize = 28;
pub const SELF_SHADOW_KEYFRAME_SIZE: usize = 9;
/// 属性帧固定部分：帧号 + 显示标志
pub const PROPERTY_KEYFRAME_SIZE: usize = 5;
pub const IK_STATE_SIZE: usize = 21;

/// 段前的 u32 计数
pub const COUNT_SIZE: u64 = 4;

/// 文件中的段（按出现顺序）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VmdSection {
    Header,
    BoneKeyFrames,
    MorphKeyFrames,
    CameraKeyFrames,
    LightKeyFrames,
    SelfShadowKeyFrames,
    PropertyKeyFrames,
    IkStates,
}

impl VmdSection {
    /// 固定长度记录的段，按文件顺序
    pub const FIXED_RECORD_SECTIONS: [VmdSection; 5] = [
        VmdSection::BoneKeyFrames,
        VmdSection::MorphKeyFrames,
        VmdSection::CameraKeyFrames,
        VmdSection::LightKeyFrames,
        VmdSection::SelfShadowKeyFrames,
    ];

    /// 单条记录字节数（属性段只计固定部分）
    pub fn record_size(self) -> usize {
        match self {
            VmdSection::Header => HEADER_SIZE as usize,
            VmdSection::BoneKeyFrames => BONE_KEYFRAME_SIZE,
            VmdSection::MorphKeyFrames => MORPH_KEYFRAME_SIZE,
            VmdSection::CameraKeyFrames => CAMERA_KEYFRAME_SIZE,
            VmdSection::LightKeyFrames => LIGHT_KEYFRAME_SIZE,
            VmdSection::SelfShadowKeyFrames => SELF_SHADOW_KEYFRAME_SIZE,
            VmdSection::PropertyKeyFrames => PROPERTY_KEYFRAME_SIZE,
            VmdSection::IkStates => IK_STATE_SIZE,
        }
    }
}

impl fmt::Display for VmdSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VmdSection::Header => "header",
            VmdSection::BoneKeyFrames => "bone keyframes",
            VmdSection::MorphKeyFrames => "morph keyframes",
            VmdSection::CameraKeyFrames => "camera keyframes",
            VmdSection::LightKeyFrames => "light keyframes",
            VmdSection::SelfShadowKeyFrames => "self shadow keyframes",
            VmdSection::PropertyKeyFrames => "property keyframes",
            VmdSection::IkStates => "IK state keyframes",
        };
        f.write_str(name)
    }
}
