//! Shift-JIS 文本解码
//!
//! VMD 中的骨骼名、表情名、IK 名与模型名都是定长 Shift-JIS 字段，
//! 以 NUL 结尾，NUL 之后可能残留垃圾字节。

/// 解码定长 Shift-JIS 字段（截断到第一个 NUL）
pub fn decode_shift_jis(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(&bytes[..end]);
    decoded.into_owned()
}
