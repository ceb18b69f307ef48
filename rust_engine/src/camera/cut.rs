//! 相机切换检测
//!
//! 相邻两帧间隔 ≤ 1 帧且参数不同，即视为作者有意的硬切。

use crate::vmd::CameraKeyFrame;

/// 半开帧区间 [start, end)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraCut {
    pub start: u32,
    pub end: u32,
}

impl CameraCut {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

fn is_cut_pair(previous: &CameraKeyFrame, current: &CameraKeyFrame) -> bool {
    current.frame_number.saturating_sub(previous.frame_number) <= 1
        && current.differs_from(previous)
}

/// 按硬切把关键帧序列切分为若干区间
///
/// 最后一个区间的上界为末帧 + 1。空序列返回空。
pub fn compute_cuts(keyframes: &[CameraKeyFrame]) -> Vec<CameraCut> {
    let (first, last) = match (keyframes.first(), keyframes.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Vec::new(),
    };

    let mut cuts = Vec::new();
    let mut start = first.frame_number;
    for pair in keyframes.windows(2) {
        if is_cut_pair(&pair[0], &pair[1]) && pair[1].frame_number != start {
            cuts.push(CameraCut::new(start, pair[1].frame_number));
            start = pair[1].frame_number;
        }
    }
    cuts.push(CameraCut::new(start, last.frame_number.saturating_add(1)));
    cuts
}

/// 单相机：整段一个区间，不引入切换
pub fn single_cut(keyframes: &[CameraKeyFrame]) -> Vec<CameraCut> {
    match (keyframes.first(), keyframes.last()) {
        (Some(first), Some(last)) => vec![CameraCut::new(
            first.frame_number,
            last.frame_number.saturating_add(1),
        )],
        _ => Vec::new(),
    }
}

/// 连续硬切的区段 [lower, upper]（闭区间，帧号）
///
/// 动态模糊在这些区段内关闭。末尾仍未结束的区段在末帧处闭合。
pub fn jump_ranges(keyframes: &[CameraKeyFrame]) -> Vec<(u32, u32)> {
    let Some(first) = keyframes.first() else {
        return Vec::new();
    };

    let mut ranges = Vec::new();
    let mut range_start = first.frame_number;
    for pair in keyframes.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        if is_cut_pair(previous, current) {
            continue;
        }
        if previous.frame_number != range_start {
            ranges.push((range_start, previous.frame_number));
        }
        range_start = current.frame_number;
    }

    if let Some(last) = keyframes.last() {
        if last.frame_number != range_start {
            ranges.push((range_start, last.frame_number));
        }
    }
    ranges
}
