//! 相机曲线导入
//!
//! 把解析出的相机关键帧重定时到宿主时间轴：
//! 检测硬切、压缩冗余帧、换算贝塞尔切线、在多台相机间轮换并生成切换轨道。

mod channel;
mod convert;
mod cut;
mod importer;
mod recording;
mod reduce;
mod settings;
mod tangent;
mod timeline;

pub use channel::{
    distribute_keys, import_channel, plan_channel_keys, ChannelSource, RetimeContext,
    MMD_FRAME_RATE,
};
pub use convert::{
    camera_focal_length, compute_field_of_view, compute_focal_length, to_host_location,
    to_host_rotation,
};
pub use cut::{compute_cuts, jump_ranges, single_cut, CameraCut};
pub use importer::{
    camera_spawn, import_camera, import_camera_to_existing, motion_blur_keys, ImportSummary,
    CAMERA_LABEL, PIVOT_LABEL,
};
pub use recording::{RecordedChannel, RecordingScene, RecordingTimeline, SpawnedCamera};
pub use reduce::reduce_keys;
pub use settings::{
    get_settings, set_settings, CameraCutImportType, Filmback, ImportVmdSettings,
    MAX_CAMERA_COUNT,
};
pub use tangent::{
    arrive_tangent, build_tangent, leave_tangent, slope_and_weight, InterpolationCurve,
    TangentAccessIndices,
};
pub use timeline::{
    Axis, BindingId, CameraRig, CameraSpawn, ChannelId, ChannelKey, ChannelProperty,
    ChannelValue, FrameRate, InterpMode, KeyTangent, SceneBinder, TangentWeightMode, Timeline,
};
