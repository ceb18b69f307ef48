//! 相机动作导入
//!
//! 流程：检查 → 生成相机（可选） → 清空通道与切换轨道 → 逐通道写入 → 动态模糊 → 切换轨道。
//! 所有致命错误都在写入时间轴之前检查完。

use log::{debug, info, warn};

use crate::vmd::{CameraKeyFrame, ParseResult};
use crate::{MmdError, Result};

use super::channel::{import_channel, ChannelSource, RetimeContext};
use super::convert::{
    camera_focal_length, compute_focal_length, to_host_location, to_host_rotation,
};
use super::cut::{compute_cuts, jump_ranges, single_cut, CameraCut};
use super::settings::{CameraCutImportType, ImportVmdSettings};
use super::tangent::{InterpolationCurve, TangentAccessIndices};
use super::timeline::{
    Axis, BindingId, CameraRig, CameraSpawn, ChannelId, ChannelKey, ChannelProperty, ChannelValue,
    SceneBinder, Timeline,
};

pub const CAMERA_LABEL: &str = "MmdCamera";
pub const PIVOT_LABEL: &str = "MmdCameraCenter";

/// 导入结果
#[derive(Clone, Debug, PartialEq)]
pub struct ImportSummary {
    pub rigs: Vec<CameraRig>,
    pub cuts: Vec<CameraCut>,
    pub frame_ratio: i64,
    pub one_sample_frame: i64,
    /// 写入的关键帧总数（不含切换轨道）
    pub keys_written: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RigPart {
    Camera,
    Pivot,
}

#[derive(Clone, Copy, Debug)]
enum Unit {
    /// 乘以统一缩放
    Scaled,
    Degrees,
    NegatedDegrees,
}

impl Unit {
    fn apply(self, value: f64, scale: f64) -> f64 {
        match self {
            Unit::Scaled => value * scale,
            Unit::Degrees => value.to_degrees(),
            Unit::NegatedDegrees => -value.to_degrees(),
        }
    }
}

/// 变换通道：写到哪、取哪个值、用哪条插值曲线
struct TransformChannel {
    part: RigPart,
    property: ChannelProperty,
    curve: InterpolationCurve,
    select: fn(&CameraKeyFrame) -> f64,
    unit: Unit,
}

const TRANSFORM_CHANNELS: [TransformChannel; 7] = [
    TransformChannel {
        part: RigPart::Camera,
        property: ChannelProperty::Location(Axis::X),
        curve: InterpolationCurve::Distance,
        select: |keyframe: &CameraKeyFrame| keyframe.distance as f64,
        unit: Unit::Scaled,
    },
    TransformChannel {
        part: RigPart::Pivot,
        property: ChannelProperty::Location(Axis::X),
        curve: InterpolationCurve::LookAtX,
        select: |keyframe: &CameraKeyFrame| keyframe.position.z as f64,
        unit: Unit::Scaled,
    },
    TransformChannel {
        part: RigPart::Pivot,
        property: ChannelProperty::Location(Axis::Y),
        curve: InterpolationCurve::LookAtY,
        select: |keyframe: &CameraKeyFrame| keyframe.position.x as f64,
        unit: Unit::Scaled,
    },
    TransformChannel {
        part: RigPart::Pivot,
        property: ChannelProperty::Location(Axis::Z),
        curve: InterpolationCurve::LookAtZ,
        select: |keyframe: &CameraKeyFrame| keyframe.position.y as f64,
        unit: Unit::Scaled,
    },
    TransformChannel {
        part: RigPart::Pivot,
        property: ChannelProperty::Rotation(Axis::X),
        curve: InterpolationCurve::Rotation,
        select: |keyframe: &CameraKeyFrame| keyframe.rotation.z as f64,
        unit: Unit::Degrees,
    },
    TransformChannel {
        part: RigPart::Pivot,
        property: ChannelProperty::Rotation(Axis::Y),
        curve: InterpolationCurve::Rotation,
        select: |keyframe: &CameraKeyFrame| keyframe.rotation.x as f64,
        unit: Unit::Degrees,
    },
    TransformChannel {
        part: RigPart::Pivot,
        property: ChannelProperty::Rotation(Axis::Z),
        curve: InterpolationCurve::Rotation,
        select: |keyframe: &CameraKeyFrame| keyframe.rotation.y as f64,
        unit: Unit::NegatedDegrees,
    },
];

impl TransformChannel {
    fn target(&self, rig: &CameraRig) -> ChannelId {
        let binding = match self.part {
            RigPart::Camera => rig.camera,
            RigPart::Pivot => rig.pivot,
        };
        ChannelId::new(binding, self.property)
    }
}

/// 导入前检查，返回相机关键帧（`parse` 已按帧号排序）
fn importable_keyframes<'a>(
    parse: &'a ParseResult,
    settings: &ImportVmdSettings,
) -> Result<&'a [CameraKeyFrame]> {
    settings.validate()?;

    if parse.cancelled {
        return Err(MmdError::UserCancelled);
    }
    if !parse.is_success() {
        return Err(MmdError::FormatMismatch(
            "motion data was not parsed successfully".to_string(),
        ));
    }
    if !parse.has_camera_data() {
        warn!("This VMD file is not camera motion");
        return Err(MmdError::NoCameraData);
    }

    Ok(&parse.camera_keyframes)
}

/// 第一帧 → 新相机的初始状态
pub fn camera_spawn(
    first: &CameraKeyFrame,
    settings: &ImportVmdSettings,
    index: usize,
) -> CameraSpawn {
    let scale = settings.import_uniform_scale;
    let sensor_width = settings.filmback.sensor_width;
    CameraSpawn {
        index,
        camera_label: CAMERA_LABEL.to_string(),
        pivot_label: PIVOT_LABEL.to_string(),
        camera_location: glam::DVec3::new(first.distance as f64 * scale as f64, 0.0, 0.0),
        pivot_location: to_host_location(first.position, scale),
        pivot_rotation: to_host_rotation(first.rotation),
        filmback: settings.filmback,
        focal_length: compute_focal_length(first.view_angle as f32, sensor_width) / 2.0,
        focus_enabled: false,
    }
}

/// 动态模糊关键帧：在连续硬切期间关闭，结束后一个采样帧恢复
pub fn motion_blur_keys(
    keyframes: &[CameraKeyFrame],
    ctx: &RetimeContext,
    amount: f32,
) -> Vec<ChannelKey<f32>> {
    let runs = jump_ranges(keyframes);
    let mut keys = Vec::with_capacity(runs.len() * 2 + 1);

    if runs.first().is_some_and(|&(lower, _)| lower != 0) {
        keys.push(ChannelKey::constant(0, amount));
    }

    for (lower, upper) in runs {
        let blur_off = match ctx.cut_import_type {
            CameraCutImportType::ImportAsIs => ctx.frame_to_tick(lower),
            _ => ctx.frame_to_tick(lower.saturating_add(1)) - ctx.one_sample_frame,
        };
        keys.push(ChannelKey::constant(blur_off, 0.0));
        keys.push(ChannelKey::constant(
            ctx.frame_to_tick(upper) + ctx.one_sample_frame,
            amount,
        ));
    }
    keys
}

/// 导入一个通道并写入各相机对应的目标，返回实际写入数
fn write_channel<T, TL, S, C>(
    timeline: &mut TL,
    source: &ChannelSource<'_, S, C>,
    cuts: &[CameraCut],
    ctx: &RetimeContext,
    targets: &[Option<ChannelId>],
) -> usize
where
    T: ChannelValue,
    TL: Timeline + ?Sized,
    S: Fn(&CameraKeyFrame) -> f64,
    C: Fn(f64) -> f64,
{
    let mut written = 0;
    import_channel::<T, S, C, _>(source, cuts, ctx, |camera, key| {
        if let Some(channel) = targets.get(camera).copied().flatten() {
            T::add_key(&mut *timeline, &channel, key);
            written += 1;
        }
    });
    written
}

/// 生成 `camera_count` 台相机并导入
pub fn import_camera<TL, B>(
    parse: &ParseResult,
    timeline: &mut TL,
    binder: &mut B,
    settings: &ImportVmdSettings,
) -> Result<ImportSummary>
where
    TL: Timeline + ?Sized,
    B: SceneBinder + ?Sized,
{
    let keyframes = importable_keyframes(parse, settings)?;
    if !settings.create_cameras {
        return Err(MmdError::InvalidSettings(
            "create_cameras is disabled; import onto existing cameras instead".to_string(),
        ));
    }

    let first = &keyframes[0];
    let mut rigs = Vec::with_capacity(settings.camera_count as usize);
    for index in 0..settings.camera_count as usize {
        rigs.push(binder.spawn_camera(&camera_spawn(first, settings, index))?);
    }

    import_onto_rigs(keyframes, timeline, binder, &rigs, settings)
}

/// 导入到已绑定的相机上，相机数由 `rigs` 决定
///
/// 写入的通道与切换轨道都会先清空，重复导入不会留下旧关键帧。
/// 无法解析相机组件的相机会跳过焦距与动态模糊通道。
pub fn import_camera_to_existing<TL, B>(
    parse: &ParseResult,
    timeline: &mut TL,
    binder: &mut B,
    rigs: &[CameraRig],
    settings: &ImportVmdSettings,
) -> Result<ImportSummary>
where
    TL: Timeline + ?Sized,
    B: SceneBinder + ?Sized,
{
    let keyframes = importable_keyframes(parse, settings)?;
    import_onto_rigs(keyframes, timeline, binder, rigs, settings)
}

fn import_onto_rigs<TL, B>(
    keyframes: &[CameraKeyFrame],
    timeline: &mut TL,
    binder: &mut B,
    rigs: &[CameraRig],
    settings: &ImportVmdSettings,
) -> Result<ImportSummary>
where
    TL: Timeline + ?Sized,
    B: SceneBinder + ?Sized,
{
    if rigs.is_empty() {
        return Err(MmdError::Binding("no camera to import onto".to_string()));
    }
    if rigs.len() != settings.camera_count as usize {
        debug!(
            "camera_count is {} but {} cameras are bound; using {}",
            settings.camera_count,
            rigs.len(),
            rigs.len()
        );
    }

    let ctx = RetimeContext::new(
        timeline.tick_resolution(),
        timeline.display_rate(),
        settings.camera_cut_import_type,
        rigs.len(),
    );
    let cuts = if ctx.is_single_camera() {
        single_cut(keyframes)
    } else {
        compute_cuts(keyframes)
    };

    let owners: Vec<Option<BindingId>> = rigs
        .iter()
        .map(|rig| {
            let owner = binder.bind(rig.camera);
            if owner.is_none() {
                warn!("Camera {} could not be bound; skipping lens channels", rig.camera);
            }
            owner
        })
        .collect();

    let focal_targets: Vec<Option<ChannelId>> = owners
        .iter()
        .map(|owner| {
            owner.map(|binding| ChannelId::new(binding, ChannelProperty::CurrentFocalLength))
        })
        .collect();
    let blur_targets: Vec<Option<ChannelId>> = if settings.add_motion_blur_key {
        owners
            .iter()
            .map(|owner| {
                owner.map(|binding| ChannelId::new(binding, ChannelProperty::MotionBlurAmount))
            })
            .collect()
    } else {
        Vec::new()
    };

    for channel in focal_targets.iter().chain(&blur_targets).flatten() {
        timeline.reset_channel(channel);
    }
    for rig in rigs {
        for transform in &TRANSFORM_CHANNELS {
            timeline.reset_channel(&transform.target(rig));
        }
    }
    timeline.reset_camera_cuts();

    let mut keys_written = 0;

    let sensor_width = settings.filmback.sensor_width;
    let focal = ChannelSource {
        indices: TangentAccessIndices::for_curve(InterpolationCurve::FieldOfView),
        select: |keyframe: &CameraKeyFrame| keyframe.view_angle as f64,
        convert: |view_angle: f64| camera_focal_length(view_angle, sensor_width),
        keyframes,
    };
    keys_written += write_channel::<f32, _, _, _>(timeline, &focal, &cuts, &ctx, &focal_targets);

    let scale = settings.import_uniform_scale as f64;
    for transform in &TRANSFORM_CHANNELS {
        let targets: Vec<Option<ChannelId>> =
            rigs.iter().map(|rig| Some(transform.target(rig))).collect();
        let unit = transform.unit;
        let source = ChannelSource {
            indices: TangentAccessIndices::for_curve(transform.curve),
            select: transform.select,
            convert: move |value: f64| unit.apply(value, scale),
            keyframes,
        };
        keys_written += write_channel::<f64, _, _, _>(timeline, &source, &cuts, &ctx, &targets);
    }

    if settings.add_motion_blur_key {
        let amount = settings.motion_blur_amount;
        let blur_keys = motion_blur_keys(keyframes, &ctx, amount);
        for channel in blur_targets.iter().flatten() {
            timeline.set_float_default(channel, amount);
            for key in &blur_keys {
                timeline.add_float_key(channel, *key);
                keys_written += 1;
            }
        }
    }

    for (index, cut) in cuts.iter().enumerate() {
        timeline.add_camera_cut(ctx.frame_to_tick(cut.start), rigs[index % rigs.len()].camera);
    }

    info!(
        "Imported {} camera keyframes onto {} camera(s): {} cut(s), {} keys, frame ratio {}",
        keyframes.len(),
        rigs.len(),
        cuts.len(),
        keys_written,
        ctx.frame_ratio
    );

    Ok(ImportSummary {
        rigs: rigs.to_vec(),
        cuts,
        frame_ratio: ctx.frame_ratio,
        one_sample_frame: ctx.one_sample_frame,
        keys_written,
    })
}
