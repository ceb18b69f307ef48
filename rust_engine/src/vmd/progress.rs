//! 解析进度与协作式取消

use std::fmt;

/// 解析的七个阶段（文件头、五个定长段、属性段）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParsePhase {
    Header,
    BoneKeyFrames,
    MorphKeyFrames,
    CameraKeyFrames,
    LightKeyFrames,
    SelfShadowKeyFrames,
    PropertyKeyFrames,
}

impl ParsePhase {
    pub const COUNT: usize = 7;

    pub fn index(self) -> usize {
        match self {
            ParsePhase::Header => 0,
            ParsePhase::BoneKeyFrames => 1,
            ParsePhase::MorphKeyFrames => 2,
            ParsePhase::CameraKeyFrames => 3,
            ParsePhase::LightKeyFrames => 4,
            ParsePhase::SelfShadowKeyFrames => 5,
            ParsePhase::PropertyKeyFrames => 6,
        }
    }

    /// 进入该阶段时的整体进度 [0, 1)
    pub fn start_fraction(self) -> f32 {
        self.index() as f32 / Self::COUNT as f32
    }
}

impl fmt::Display for ParsePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ParsePhase::Header => "Reading Header",
            ParsePhase::BoneKeyFrames => "Reading Bone Key Frames",
            ParsePhase::MorphKeyFrames => "Reading Morph Key Frames",
            ParsePhase::CameraKeyFrames => "Reading Camera Key Frames",
            ParsePhase::LightKeyFrames => "Reading Light Key Frames",
            ParsePhase::SelfShadowKeyFrames => "Reading Self Shadow Key Frames",
            ParsePhase::PropertyKeyFrames => "Reading Property Key Frames",
        };
        f.write_str(text)
    }
}

/// 进度回调接口
///
/// 解析器在每个阶段开始前、以及属性段的每条记录前调用 `should_cancel`，
/// 返回 true 时立即中止，结果视为失败。
pub trait ParseProgress {
    /// `fraction` 为整体进度 [0, 1]
    fn report_progress(&mut self, phase: ParsePhase, fraction: f32);

    fn should_cancel(&self) -> bool;
}

/// 不汇报、不取消
#[derive(Clone, Copy, Debug, Default)]
pub struct NullProgress;

impl ParseProgress for NullProgress {
    fn report_progress(&mut self, _phase: ParsePhase, _fraction: f32) {}

    fn should_cancel(&self) -> bool {
        false
    }
}
