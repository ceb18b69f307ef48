//! 单通道导入：压缩 → 重定时 → 切线 → 分配到各相机
//!
//! f32（焦距）与 f64（变换）通道共用同一套逻辑，写入由调用方的闭包完成。

use crate::vmd::CameraKeyFrame;

use super::cut::CameraCut;
use super::reduce::reduce_keys;
use super::settings::CameraCutImportType;
use super::tangent::{arrive_tangent, build_tangent, leave_tangent, TangentAccessIndices};
use super::timeline::{ChannelKey, ChannelValue, FrameRate, InterpMode};

/// MMD 固定 30fps
pub const MMD_FRAME_RATE: f64 = 30.0;

/// 帧号 → 宿主 tick 所需的全部参数
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetimeContext {
    /// 每个 MMD 帧对应的 tick 数
    pub frame_ratio: i64,
    /// 一个显示帧对应的 tick 数
    pub one_sample_frame: i64,
    pub cut_import_type: CameraCutImportType,
    pub camera_count: usize,
}

impl RetimeContext {
    pub fn new(
        tick_resolution: FrameRate,
        display_rate: FrameRate,
        cut_import_type: CameraCutImportType,
        camera_count: usize,
    ) -> Self {
        let frame_ratio = (tick_resolution.as_decimal() / MMD_FRAME_RATE).round() as i64;

        let ticks_per_sample = tick_resolution.numerator as u64 * display_rate.denominator as u64;
        let sample_span = tick_resolution.denominator as u64 * display_rate.numerator as u64;
        let one_sample_frame = ticks_per_sample.checked_div(sample_span).unwrap_or(1) as i64;

        Self {
            frame_ratio,
            one_sample_frame: one_sample_frame.max(1),
            cut_import_type,
            camera_count: camera_count.max(1),
        }
    }

    pub fn frame_to_tick(&self, frame: u32) -> i64 {
        frame as i64 * self.frame_ratio
    }

    pub fn is_single_camera(&self) -> bool {
        self.camera_count == 1
    }
}

/// 一个通道怎么从相机关键帧取值
pub struct ChannelSource<'a, S, C> {
    pub indices: TangentAccessIndices,
    /// 取 MMD 原始值（用于判断冗余与硬切）
    pub select: S,
    /// 原始值 → 宿主单位
    pub convert: C,
    pub keyframes: &'a [CameraKeyFrame],
}

/// 生成一个通道的全部关键帧（尚未分配到相机）
pub fn plan_channel_keys<T, S, C>(
    source: &ChannelSource<'_, S, C>,
    ctx: &RetimeContext,
) -> Vec<ChannelKey<T>>
where
    T: ChannelValue,
    S: Fn(&CameraKeyFrame) -> f64,
    C: Fn(f64) -> f64,
{
    let reduced = reduce_keys(source.keyframes, |keyframe| (source.select)(keyframe));
    let raw: Vec<f64> = reduced.iter().map(|keyframe| (source.select)(*keyframe)).collect();
    let values: Vec<f64> = raw.iter().map(|&value| (source.convert)(value)).collect();
    let last = reduced.len().saturating_sub(1);

    let mut keys = Vec::with_capacity(reduced.len());
    for (i, keyframe) in reduced.iter().enumerate() {
        let frame = keyframe.frame_number;
        let tick = ctx.frame_to_tick(frame);

        let arrive = (i > 0).then(|| {
            let previous = reduced[i - 1];
            let dt = tick - ctx.frame_to_tick(previous.frame_number);
            let dv = values[i] - values[i - 1];
            arrive_tangent(&keyframe.interpolation, &source.indices, dt as f32, dv as f32)
        });

        let next = (i < last).then(|| reduced[i + 1]);
        let leave = next.map(|next| {
            let dt = ctx.frame_to_tick(next.frame_number) - tick;
            let dv = values[i + 1] - values[i];
            leave_tangent(&next.interpolation, &source.indices, dt as f32, dv as f32)
        });

        let jumps = next.is_some_and(|next| {
            next.frame_number.saturating_sub(frame) <= 1 && raw[i + 1] != raw[i]
        });

        let (time, interp) = if jumps {
            let next_tick = next.map(|next| ctx.frame_to_tick(next.frame_number)).unwrap_or(tick);
            match ctx.cut_import_type {
                CameraCutImportType::ImportAsIs => (tick, InterpMode::Cubic),
                CameraCutImportType::ConstantKey => (tick, InterpMode::Constant),
                CameraCutImportType::OneFrameInterval => {
                    let interp = if ctx.is_single_camera() {
                        InterpMode::Constant
                    } else {
                        InterpMode::Cubic
                    };
                    (tick.max(next_tick - ctx.one_sample_frame), interp)
                }
                CameraCutImportType::OneFrameIntervalWithConstantKey => {
                    (tick.max(next_tick - ctx.one_sample_frame), InterpMode::Constant)
                }
            }
        } else {
            (tick, InterpMode::Cubic)
        };

        keys.push(ChannelKey {
            time,
            value: T::from_f64(values[i]),
            interp,
            tangent: build_tangent(arrive, leave),
        });
    }
    keys
}

/// 按切换区间把关键帧轮流分给各相机，`sink(camera_index, key)` 负责写入
///
/// 切换到另一台相机时，在边界处给旧相机补一个保持帧收尾，
/// 并给新相机补一个保持帧起头（真实关键帧恰好落在边界时除外）。
/// 最后，没有以全局末帧结束的相机都补上末帧的值。返回写入的关键帧数。
pub fn distribute_keys<T, F>(
    keys: Vec<ChannelKey<T>>,
    cuts: &[CameraCut],
    ctx: &RetimeContext,
    mut sink: F,
) -> usize
where
    T: ChannelValue,
    F: FnMut(usize, ChannelKey<T>),
{
    let count = ctx.camera_count;
    let mut last_times: Vec<Option<i64>> = vec![None; count];
    let mut previous: Option<ChannelKey<T>> = None;
    let mut cut_index = 0usize;
    let mut written = 0usize;

    let mut emit = |camera: usize, key: ChannelKey<T>, last_times: &mut Vec<Option<i64>>| {
        last_times[camera] = Some(key.time);
        sink(camera, key);
        written += 1;
    };

    for key in keys {
        while cut_index + 1 < cuts.len() && key.time >= ctx.frame_to_tick(cuts[cut_index].end) {
            let boundary = ctx.frame_to_tick(cuts[cut_index].end);
            let from = cut_index % count;
            cut_index += 1;
            let to = cut_index % count;

            if from == to {
                continue;
            }
            if let Some(previous) = previous {
                if last_times[from] != Some(boundary) {
                    emit(from, ChannelKey::hold(boundary, previous.value), &mut last_times);
                }
                if key.time != boundary && last_times[to] != Some(boundary) {
                    emit(to, ChannelKey::hold(boundary, previous.value), &mut last_times);
                }
            }
        }

        emit(cut_index % count, key, &mut last_times);
        previous = Some(key);
    }

    if let Some(last) = previous {
        for camera in 0..count {
            if last_times[camera] != Some(last.time) {
                emit(camera, ChannelKey::hold(last.time, last.value), &mut last_times);
            }
        }
    }

    written
}

/// 完整导入一个通道
pub fn import_channel<T, S, C, F>(
    source: &ChannelSource<'_, S, C>,
    cuts: &[CameraCut],
    ctx: &RetimeContext,
    sink: F,
) -> usize
where
    T: ChannelValue,
    S: Fn(&CameraKeyFrame) -> f64,
    C: Fn(f64) -> f64,
    F: FnMut(usize, ChannelKey<T>),
{
    let keys = plan_channel_keys::<T, S, C>(source, ctx);
    distribute_keys(keys, cuts, ctx, sink)
}
