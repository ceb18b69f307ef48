//! VMD 文件校验与解析
//!
//! `inspect`/`validate` 只读取各段的计数，按声明长度推算偏移，
//! 确认整份数据都落在流内；`parse` 重新遍历并真正反序列化。
//! 同一个流在 validate 与 parse 之间复用，不会重新打开。

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use crate::{MmdError, Result};

use super::keyframe::{
    sort_by_frame, BoneKeyFrame, CameraKeyFrame, IkState, LightKeyFrame, MorphKeyFrame,
    ParseResult, PropertyKeyFrame, RawHeader, SelfShadowKeyFrame,
};
use super::progress::{NullProgress, ParsePhase, ParseProgress};
use super::{
    decode_shift_jis, VmdSection, COUNT_SIZE, HEADER_SIZE, IK_STATE_SIZE, MAGIC_SIZE,
    PROPERTY_KEYFRAME_SIZE, VMD_MAGIC,
};

trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// 非致命的校验警告
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationWarning {
    /// 流比声明的内容更长
    TrailingData { bytes: u64 },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::TrailingData { bytes } => {
                write!(f, "{} bytes of additional data after the property keyframes", bytes)
            }
        }
    }
}

/// 校验结果
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub stream_len: u64,
    /// 各段声明的总字节数
    pub declared_len: u64,
    pub bone_keyframe_count: u32,
    pub morph_keyframe_count: u32,
    pub camera_keyframe_count: u32,
    pub light_keyframe_count: u32,
    pub self_shadow_keyframe_count: u32,
    pub property_keyframe_count: u32,
    pub ik_state_count: u64,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn has_trailing_data(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, ValidationWarning::TrailingData { .. }))
    }

    fn set_count(&mut self, section: VmdSection, count: u32) {
        match section {
            VmdSection::BoneKeyFrames => self.bone_keyframe_count = count,
            VmdSection::MorphKeyFrames => self.morph_keyframe_count = count,
            VmdSection::CameraKeyFrames => self.camera_keyframe_count = count,
            VmdSection::LightKeyFrames => self.light_keyframe_count = count,
            VmdSection::SelfShadowKeyFrames => self.self_shadow_keyframe_count = count,
            VmdSection::PropertyKeyFrames => self.property_keyframe_count = count,
            VmdSection::Header | VmdSection::IkStates => {}
        }
    }
}

/// VMD 导入器（持有文件流）
#[derive(Default)]
pub struct VmdImporter {
    source: Option<PathBuf>,
    reader: Option<Box<dyn ReadSeek>>,
}

impl fmt::Debug for VmdImporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VmdImporter")
            .field("source", &self.source)
            .field("is_open", &self.reader.is_some())
            .finish()
    }
}

impl VmdImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以文件路径创建（延迟打开）
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let mut importer = Self::new();
        importer.set_source(path);
        importer
    }

    /// 从任意 Reader 创建
    pub fn from_reader<R: Read + Seek + 'static>(reader: R) -> Self {
        Self {
            source: None,
            reader: Some(Box::new(reader)),
        }
    }

    /// 从内存数据创建
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::from_reader(Cursor::new(bytes))
    }

    /// 设置文件路径，已打开的流会被丢弃
    pub fn set_source<P: AsRef<Path>>(&mut self, path: P) {
        self.source = Some(path.as_ref().to_path_buf());
        self.reader = None;
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn stream(&mut self) -> Result<&mut (dyn ReadSeek + 'static)> {
        if self.reader.is_none() {
            let path = self.source.as_ref().ok_or(MmdError::NoSource)?;
            let file = File::open(path).map_err(|source| MmdError::StreamOpenFailure {
                path: path.clone(),
                source,
            })?;
            self.reader = Some(Box::new(BufReader::new(file)));
        }

        match self.reader.as_deref_mut() {
            Some(reader) => Ok(reader),
            None => Err(MmdError::NoSource),
        }
    }

    /// 是否是完整的 VMD 文件
    ///
    /// 末尾多余数据只产生警告，仍返回 true。
    pub fn validate(&mut self) -> bool {
        match self.inspect() {
            Ok(_) => true,
            Err(e) => {
                log::error!("{}", e);
                false
            }
        }
    }

    /// 校验并返回各段统计
    pub fn inspect(&mut self) -> Result<ValidationReport> {
        let stream = self.stream()?;
        let stream_len = stream.seek(SeekFrom::End(0))?;

        if stream_len < HEADER_SIZE {
            return Err(MmdError::TruncatedSection(VmdSection::Header));
        }

        stream.seek(SeekFrom::Start(0))?;
        let mut magic = [0u8; MAGIC_SIZE];
        stream
            .read_exact(&mut magic)
            .map_err(short_read(VmdSection::Header))?;
        let magic = decode_shift_jis(&magic);
        if magic != VMD_MAGIC {
            return Err(MmdError::FormatMismatch(magic));
        }

        let mut report = ValidationReport {
            stream_len,
            ..Default::default()
        };
        let mut offset = HEADER_SIZE;

        for section in VmdSection::FIXED_RECORD_SECTIONS {
            let count = read_count_at(stream, offset, stream_len, section)?;
            offset = section_end(offset + COUNT_SIZE, count, section.record_size())
                .filter(|&end| end <= stream_len)
                .ok_or(MmdError::TruncatedSection(section))?;
            report.set_count(section, count);
        }

        // 属性段每条记录后跟一个变长 IK 数组，只能逐条推算
        let property_count =
            read_count_at(stream, offset, stream_len, VmdSection::PropertyKeyFrames)?;
        offset += COUNT_SIZE;

        for _ in 0..property_count {
            offset += PROPERTY_KEYFRAME_SIZE as u64;
            let ik_count =
                read_count_at(stream, offset, stream_len, VmdSection::PropertyKeyFrames)?;
            offset = section_end(offset + COUNT_SIZE, ik_count, IK_STATE_SIZE)
                .filter(|&end| end <= stream_len)
                .ok_or(MmdError::TruncatedSection(VmdSection::IkStates))?;
            report.ik_state_count += u64::from(ik_count);
        }
        report.set_count(VmdSection::PropertyKeyFrames, property_count);
        report.declared_len = offset;

        if offset < stream_len {
            let warning = ValidationWarning::TrailingData {
                bytes: stream_len - offset,
            };
            log::warn!("File seems to be corrupt or additional data exists: {}", warning);
            report.warnings.push(warning);
        }

        Ok(report)
    }

    /// 解析 VMD
    ///
    /// 失败或取消时 `success` 为 false，数组可能只填充了一部分。
    pub fn parse(&mut self) -> ParseResult {
        self.parse_with_progress(&mut NullProgress)
    }

    /// 带进度回调解析
    pub fn parse_with_progress<P: ParseProgress + ?Sized>(
        &mut self,
        progress: &mut P,
    ) -> ParseResult {
        let mut result = ParseResult::default();

        match self.read_into(&mut result, progress) {
            Ok(()) => {
                result.success = true;
                log::info!(
                    "VMD 解析完成: 骨骼 {} 帧, 表情 {} 帧, 相机 {} 帧, 照明 {} 帧, 本影 {} 帧, 属性 {} 帧",
                    result.bone_keyframes.len(),
                    result.morph_keyframes.len(),
                    result.camera_keyframes.len(),
                    result.light_keyframes.len(),
                    result.self_shadow_keyframes.len(),
                    result.property_keyframes.len(),
                );
            }
            Err(MmdError::UserCancelled) => {
                result.cancelled = true;
                log::warn!("VMD 解析已取消");
            }
            Err(e) => {
                log::error!("Failed to parse VMD: {}", e);
            }
        }

        result
    }

    /// 解析 VMD，失败时返回原因
    pub fn try_parse<P: ParseProgress + ?Sized>(
        &mut self,
        progress: &mut P,
    ) -> Result<ParseResult> {
        let mut result = ParseResult::default();
        self.read_into(&mut result, progress)?;
        result.success = true;
        Ok(result)
    }

    fn read_into<P: ParseProgress + ?Sized>(
        &mut self,
        result: &mut ParseResult,
        progress: &mut P,
    ) -> Result<()> {
        let stream = self.stream()?;
        let stream_len = stream.seek(SeekFrom::End(0))?;
        stream.seek(SeekFrom::Start(0))?;

        enter_phase(progress, ParsePhase::Header)?;
        let mut header = [0u8; HEADER_SIZE as usize];
        stream
            .read_exact(&mut header)
            .map_err(short_read(VmdSection::Header))?;
        result.header = RawHeader::from_bytes(&header);

        enter_phase(progress, ParsePhase::BoneKeyFrames)?;
        result.bone_keyframes =
            read_records(stream, stream_len, VmdSection::BoneKeyFrames, BoneKeyFrame::from_bytes)?;
        sort_by_frame(&mut result.bone_keyframes);

        enter_phase(progress, ParsePhase::MorphKeyFrames)?;
        result.morph_keyframes = read_records(
            stream,
            stream_len,
            VmdSection::MorphKeyFrames,
            MorphKeyFrame::from_bytes,
        )?;
        sort_by_frame(&mut result.morph_keyframes);

        enter_phase(progress, ParsePhase::CameraKeyFrames)?;
        result.camera_keyframes = read_records(
            stream,
            stream_len,
            VmdSection::CameraKeyFrames,
            CameraKeyFrame::from_bytes,
        )?;
        sort_by_frame(&mut result.camera_keyframes);

        enter_phase(progress, ParsePhase::LightKeyFrames)?;
        result.light_keyframes = read_records(
            stream,
            stream_len,
            VmdSection::LightKeyFrames,
            LightKeyFrame::from_bytes,
        )?;
        sort_by_frame(&mut result.light_keyframes);

        enter_phase(progress, ParsePhase::SelfShadowKeyFrames)?;
        result.self_shadow_keyframes = read_records(
            stream,
            stream_len,
            VmdSection::SelfShadowKeyFrames,
            SelfShadowKeyFrame::from_bytes,
        )?;
        sort_by_frame(&mut result.self_shadow_keyframes);

        enter_phase(progress, ParsePhase::PropertyKeyFrames)?;
        let property_count = read_count(stream, VmdSection::PropertyKeyFrames)?;
        let remaining = stream_len.saturating_sub(stream.stream_position()?);
        let min_record = PROPERTY_KEYFRAME_SIZE as u64 + COUNT_SIZE;
        let capacity = (property_count as u64).min(remaining / min_record);
        result.property_keyframes = Vec::with_capacity(capacity as usize);

        let phase_start = ParsePhase::PropertyKeyFrames.start_fraction();
        let phase_span = 1.0 / ParsePhase::COUNT as f32;

        for i in 0..property_count {
            if progress.should_cancel() {
                return Err(MmdError::UserCancelled);
            }
            let fraction = phase_start + phase_span * (i as f32 / property_count as f32);
            progress.report_progress(ParsePhase::PropertyKeyFrames, fraction);

            let mut fixed = [0u8; PROPERTY_KEYFRAME_SIZE];
            stream
                .read_exact(&mut fixed)
                .map_err(short_read(VmdSection::PropertyKeyFrames))?;
            let ik_states =
                read_records(stream, stream_len, VmdSection::IkStates, IkState::from_bytes)?;

            result.property_keyframes.push(PropertyKeyFrame {
                frame_number: LittleEndian::read_u32(&fixed[0..4]),
                visible: fixed[4] != 0,
                ik_states,
            });
        }
        sort_by_frame(&mut result.property_keyframes);
        progress.report_progress(ParsePhase::PropertyKeyFrames, 1.0);

        Ok(())
    }
}

fn enter_phase<P: ParseProgress + ?Sized>(progress: &mut P, phase: ParsePhase) -> Result<()> {
    if progress.should_cancel() {
        return Err(MmdError::UserCancelled);
    }
    log::debug!("{}", phase);
    progress.report_progress(phase, phase.start_fraction());
    Ok(())
}

/// 读不满视为截断，其它 IO 错误原样返回
fn short_read(section: VmdSection) -> impl Fn(io::Error) -> MmdError {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            MmdError::TruncatedSection(section)
        } else {
            MmdError::Io(e)
        }
    }
}

/// 段结束偏移；溢出返回 None
fn section_end(start: u64, count: u32, record_size: usize) -> Option<u64> {
    u64::from(count)
        .checked_mul(record_size as u64)
        .and_then(|len| start.checked_add(len))
}

fn read_count_at<S: Read + Seek + ?Sized>(
    stream: &mut S,
    offset: u64,
    stream_len: u64,
    section: VmdSection,
) -> Result<u32> {
    if stream_len < offset + COUNT_SIZE {
        return Err(MmdError::TruncatedSection(section));
    }
    stream.seek(SeekFrom::Start(offset))?;
    read_count(stream, section)
}

fn read_count<S: Read + ?Sized>(stream: &mut S, section: VmdSection) -> Result<u32> {
    stream
        .read_u32::<LittleEndian>()
        .map_err(short_read(section))
}

/// 读取 u32 计数后一次性读入整段定长记录
fn read_records<S, T>(
    stream: &mut S,
    stream_len: u64,
    section: VmdSection,
    decode: fn(&[u8]) -> T,
) -> Result<Vec<T>>
where
    S: Read + Seek + ?Sized,
{
    let count = read_count(stream, section)?;
    let record_size = section.record_size();
    let position = stream.stream_position()?;

    let end = section_end(position, count, record_size)
        .filter(|&end| end <= stream_len)
        .ok_or(MmdError::TruncatedSection(section))?;

    let mut buffer = vec![0u8; (end - position) as usize];
    stream.read_exact(&mut buffer).map_err(short_read(section))?;

    Ok(buffer.chunks_exact(record_size).map(decode).collect())
}
