//! 内存中的宿主实现
//!
//! 记录所有写入的关键帧、默认值、切换与生成的相机，供测试和命令行工具查看结果。

use std::collections::{BTreeMap, HashMap};

use crate::{MmdError, Result};

use super::timeline::{
    BindingId, CameraRig, CameraSpawn, ChannelId, ChannelKey, FrameRate, SceneBinder, Timeline,
};

/// 单条通道的内容
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordedChannel {
    pub default_value: Option<f32>,
    pub float_keys: Vec<ChannelKey<f32>>,
    pub double_keys: Vec<ChannelKey<f64>>,
}

impl RecordedChannel {
    pub fn key_count(&self) -> usize {
        self.float_keys.len() + self.double_keys.len()
    }
}

/// 按时间插入，同一时间的关键帧保持写入顺序
fn insert_sorted<T>(keys: &mut Vec<ChannelKey<T>>, key: ChannelKey<T>) {
    let index = keys.partition_point(|existing| existing.time <= key.time);
    keys.insert(index, key);
}

/// 记录型时间轴
#[derive(Clone, Debug)]
pub struct RecordingTimeline {
    tick_resolution: FrameRate,
    display_rate: FrameRate,
    channels: BTreeMap<ChannelId, RecordedChannel>,
    camera_cuts: Vec<(i64, BindingId)>,
}

impl Default for RecordingTimeline {
    /// 24000 tick/s，30fps 显示
    fn default() -> Self {
        Self::new(FrameRate::new(24000, 1), FrameRate::new(30, 1))
    }
}

impl RecordingTimeline {
    pub fn new(tick_resolution: FrameRate, display_rate: FrameRate) -> Self {
        Self {
            tick_resolution,
            display_rate,
            channels: BTreeMap::new(),
            camera_cuts: Vec::new(),
        }
    }

    pub fn channel(&self, channel: &ChannelId) -> Option<&RecordedChannel> {
        self.channels.get(channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = (&ChannelId, &RecordedChannel)> {
        self.channels.iter()
    }

    pub fn float_keys(&self, channel: &ChannelId) -> &[ChannelKey<f32>] {
        self.channels
            .get(channel)
            .map(|recorded| recorded.float_keys.as_slice())
            .unwrap_or(&[])
    }

    pub fn double_keys(&self, channel: &ChannelId) -> &[ChannelKey<f64>] {
        self.channels
            .get(channel)
            .map(|recorded| recorded.double_keys.as_slice())
            .unwrap_or(&[])
    }

    pub fn default_value(&self, channel: &ChannelId) -> Option<f32> {
        self.channels.get(channel).and_then(|recorded| recorded.default_value)
    }

    /// 按时间排序的切换 (tick, 相机)
    pub fn camera_cuts(&self) -> &[(i64, BindingId)] {
        &self.camera_cuts
    }

    pub fn total_key_count(&self) -> usize {
        self.channels.values().map(RecordedChannel::key_count).sum()
    }
}

impl Timeline for RecordingTimeline {
    fn tick_resolution(&self) -> FrameRate {
        self.tick_resolution
    }

    fn display_rate(&self) -> FrameRate {
        self.display_rate
    }

    fn reset_channel(&mut self, channel: &ChannelId) {
        let recorded = self.channels.entry(*channel).or_default();
        recorded.float_keys.clear();
        recorded.double_keys.clear();
    }

    fn set_float_default(&mut self, channel: &ChannelId, value: f32) {
        self.channels.entry(*channel).or_default().default_value = Some(value);
    }

    fn add_float_key(&mut self, channel: &ChannelId, key: ChannelKey<f32>) {
        insert_sorted(&mut self.channels.entry(*channel).or_default().float_keys, key);
    }

    fn add_double_key(&mut self, channel: &ChannelId, key: ChannelKey<f64>) {
        insert_sorted(&mut self.channels.entry(*channel).or_default().double_keys, key);
    }

    fn reset_camera_cuts(&mut self) {
        self.camera_cuts.clear();
    }

    fn add_camera_cut(&mut self, time: i64, camera: BindingId) {
        let index = self.camera_cuts.partition_point(|&(existing, _)| existing <= time);
        self.camera_cuts.insert(index, (time, camera));
    }
}

/// 已生成的相机
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnedCamera {
    pub rig: CameraRig,
    pub spawn: CameraSpawn,
}

/// 记录型场景：分配绑定句柄并记住生成参数
#[derive(Clone, Debug, Default)]
pub struct RecordingScene {
    next_binding: u64,
    spawned: Vec<SpawnedCamera>,
    /// 相机 → 相机组件
    components: HashMap<BindingId, BindingId>,
    /// 允许生成的相机数上限，None 为不限制
    spawn_limit: Option<usize>,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只允许生成 `limit` 台相机，之后的生成返回错误
    pub fn with_spawn_limit(limit: usize) -> Self {
        Self {
            spawn_limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn spawned(&self) -> &[SpawnedCamera] {
        &self.spawned
    }

    /// 登记一个外部已有的相机（不经过 spawn）
    pub fn register_camera(&mut self) -> CameraRig {
        let pivot = self.allocate();
        let camera = self.allocate();
        CameraRig { camera, pivot }
    }

    /// 相机组件的绑定（未绑定过时为 None）
    pub fn component_of(&self, camera: BindingId) -> Option<BindingId> {
        self.components.get(&camera).copied()
    }

    fn allocate(&mut self) -> BindingId {
        self.next_binding += 1;
        BindingId(self.next_binding)
    }

    fn is_known(&self, binding: BindingId) -> bool {
        binding.0 != 0 && binding.0 <= self.next_binding
    }
}

impl SceneBinder for RecordingScene {
    fn spawn_camera(&mut self, spawn: &CameraSpawn) -> Result<CameraRig> {
        if self.spawn_limit.is_some_and(|limit| self.spawned.len() >= limit) {
            return Err(MmdError::Binding(format!(
                "cannot spawn {} #{}",
                spawn.camera_label, spawn.index
            )));
        }

        let rig = self.register_camera();
        log::debug!(
            "Spawned {} {} attached to {} {}",
            spawn.camera_label,
            rig.camera,
            spawn.pivot_label,
            rig.pivot
        );
        self.spawned.push(SpawnedCamera {
            rig,
            spawn: spawn.clone(),
        });
        Ok(rig)
    }

    fn bind(&mut self, camera: BindingId) -> Option<BindingId> {
        if !self.is_known(camera) {
            return None;
        }
        if let Some(component) = self.components.get(&camera) {
            return Some(*component);
        }
        let component = self.allocate();
        self.components.insert(camera, component);
        Some(component)
    }
}
