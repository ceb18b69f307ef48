//! 冗余关键帧压缩

/// 去掉与前后两帧取值都相同的中间帧，首末帧始终保留
///
/// 比较的是原序列中的邻居，所以平台只剩两端。
pub fn reduce_keys<T, V, F>(keyframes: &[T], select: F) -> Vec<&T>
where
    V: PartialEq,
    F: Fn(&T) -> V,
{
    if keyframes.len() <= 2 {
        return keyframes.iter().collect();
    }

    let values: Vec<V> = keyframes.iter().map(&select).collect();
    let last = keyframes.len() - 1;

    keyframes
        .iter()
        .enumerate()
        .filter(|&(i, _)| {
            i == 0 || i == last || values[i] != values[i - 1] || values[i] != values[i + 1]
        })
        .map(|(_, keyframe)| keyframe)
        .collect()
}
