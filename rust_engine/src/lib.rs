//! MMD Camera Importer - VMD 相机动作导入引擎
//!
//! 提供：
//! - VMD 文件校验（截断/损坏检测）与解析
//! - 相机切换（Camera Cut）计算与多相机轮换分配
//! - MMD 贝塞尔插值参数到宿主切线的转换
//! - 30fps 采样到宿主 tick 分辨率的重定时

pub mod camera;
pub mod vmd;

pub use camera::{
    import_camera, import_camera_to_existing, CameraCutImportType, FrameRate, ImportSummary,
    ImportVmdSettings, RecordingScene, RecordingTimeline, SceneBinder, Timeline,
};
pub use vmd::{ParseResult, ValidationReport, VmdImporter, VmdSection};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MmdError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Can't open file({path}): {source}")]
    StreamOpenFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No VMD source has been set")]
    NoSource,

    #[error("File is not vmd format: {0}")]
    FormatMismatch(String),

    #[error("File seems to be corrupt (truncated in {0})")]
    TruncatedSection(VmdSection),

    #[error("VMD import was cancelled")]
    UserCancelled,

    #[error("This VMD file is not camera motion")]
    NoCameraData,

    #[error("Invalid import settings: {0}")]
    InvalidSettings(String),

    #[error("Binding error: {0}")]
    Binding(String),
}

pub type Result<T> = std::result::Result<T, MmdError>;
