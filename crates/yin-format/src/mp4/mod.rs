//! MP4/M4A (ISO Base Media File Format) 容器解析.
//!
//! 只关心第一个音频 (`soun`) 轨道, 以及 iTunes 风格的元数据.
//!
//! # Box 树结构
//! ```text
//! ftyp                          文件类型
//! moov                          影片元数据
//! ├── trak                      轨道
//! │   ├── mdia
//! │   │   ├── mdhd              媒体头部 (时间刻度)
//! │   │   ├── hdlr              处理器引用 (soun)
//! │   │   └── minf
//! │   │       └── stbl          采样表
//! │   │           ├── stsd      采样描述 (mp4a → esds)
//! │   │           ├── stts      时间→采样映射
//! │   │           ├── stsc      采样→块映射
//! │   │           ├── stsz      采样大小
//! │   │           └── stco/co64 块偏移
//! │   └── udta
//! └── udta
//!     └── meta
//!         └── ilst              元数据条目
//! mdat                          媒体数据
//! ```
//!
//! 解析分两遍: 遍历 box 树时只收集原始表 ([`RawTables`]),
//! 遍历结束后再由 [`build_sample_table`] 一次性计算每个采样的绝对偏移与时长.

pub mod boxes;
pub mod sample_entry;
pub mod sample_table;
pub mod tables;

use std::io::SeekFrom;

use log::debug;
use yin_codec::{AudioSpecificConfig, CodecConfig};
use yin_core::{YinError, YinResult};

use crate::io::IoContext;
use crate::metadata::{Metadata, parse_ilst};

use self::boxes::{BoxType, FtypBox, read_box_header, read_full_box_header};
use self::sample_entry::{AudioSampleEntry, SampleEntry, parse_stsd};

pub use self::sample_table::{
    DEFAULT_SAMPLE_DURATION, SampleDescriptor, SampleTable, build_sample_table,
};
pub use self::tables::{ChunkRun, DurationRun, RawTables};

/// 音频轨道解析结果
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    /// ftyp 主品牌 (缺少 ftyp 时为 None)
    pub major_brand: Option<String>,
    /// 音频轨道时间刻度 (mdhd), 0 表示未知
    pub timescale: u32,
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 声道数
    pub channels: u16,
    /// 解码器配置 (esds DecoderSpecificInfo)
    pub config: CodecConfig,
    /// 采样表
    pub table: SampleTable,
    /// 元数据标签
    pub metadata: Metadata,
}

impl ContainerInfo {
    /// 总时长 (时间刻度单位)
    pub fn total_duration(&self) -> u64 {
        self.table.total_duration()
    }
}

/// 单个轨道遍历期间累积的状态
#[derive(Debug, Default)]
struct TrackState {
    handler: [u8; 4],
    timescale: u32,
    entry: Option<SampleEntry>,
    raw: RawTables,
}

impl TrackState {
    fn is_audio(&self) -> bool {
        &self.handler == b"soun"
    }
}

/// 整个 box 树遍历的状态
#[derive(Debug, Default)]
struct ParseState {
    major_brand: Option<String>,
    current: Option<TrackState>,
    audio: Option<TrackState>,
    metadata: Metadata,
}

/// 解析 MP4/M4A 容器, 提取第一个音频轨道的采样表与解码参数
///
/// `fallback_duration` 用于 stts 未覆盖的采样.
pub fn parse_container(io: &mut IoContext, fallback_duration: u32) -> YinResult<ContainerInfo> {
    let end = io.size().unwrap_or(u64::MAX);
    let mut state = ParseState::default();
    walk_boxes(io, end, &mut state)?;

    let track = state.audio.ok_or(YinError::NoAudioTrack)?;
    let entry = match track.entry {
        Some(SampleEntry::Mp4a(entry)) => entry,
        Some(SampleEntry::Other(format)) => {
            return Err(YinError::UnsupportedCodec(
                String::from_utf8_lossy(&format).into_owned(),
            ));
        }
        None => return Err(YinError::NoAudioTrack),
    };
    if entry.decoder_config.is_empty() {
        return Err(YinError::NoAudioTrack);
    }

    let (sample_rate, channels) = stream_format(&entry);
    let table = build_sample_table(&track.raw, fallback_duration);

    debug!(
        "MP4: 音频轨道 {} Hz, {} 声道, timescale={}, {} 个采样",
        sample_rate,
        channels,
        track.timescale,
        table.len(),
    );

    Ok(ContainerInfo {
        major_brand: state.major_brand,
        timescale: track.timescale,
        sample_rate,
        channels,
        config: CodecConfig::from_bytes(entry.decoder_config),
        table,
        metadata: state.metadata,
    })
}

/// 采样率与声道数以 mp4a 条目为准, 条目中为 0 时从 AudioSpecificConfig 推导
fn stream_format(entry: &AudioSampleEntry) -> (u32, u16) {
    let asc = AudioSpecificConfig::parse(&entry.decoder_config).ok();
    let sample_rate = match entry.sample_rate {
        0 => asc.as_ref().and_then(|a| a.sample_rate).unwrap_or(0),
        rate => rate,
    };
    let channels = match entry.channel_count {
        0 => asc.as_ref().map_or(0, |a| u16::from(a.channel_configuration)),
        count => count,
    };
    (sample_rate, channels)
}

/// 遍历 `[当前位置, end)` 内的 box
fn walk_boxes(io: &mut IoContext, end: u64, state: &mut ParseState) -> YinResult<()> {
    while io.position()?.saturating_add(8) <= end {
        let header = match read_box_header(io) {
            Ok(h) => h,
            Err(e) if e.is_eof() => break,
            Err(e) => return Err(e),
        };
        let content_start = io.position()?;
        let box_end = header.end(content_start, end)?;
        let content_size = box_end - content_start;

        match header.box_type {
            BoxType::Ftyp => {
                let ftyp = FtypBox::parse(io, content_size)?;
                debug!("MP4: 主品牌 {}", ftyp.major_brand_str());
                state.major_brand = Some(ftyp.major_brand_str());
            }
            BoxType::Moov | BoxType::Mdia | BoxType::Minf | BoxType::Stbl | BoxType::Udta => {
                walk_boxes(io, box_end, state)?;
            }
            BoxType::Trak => {
                state.current = Some(TrackState::default());
                walk_boxes(io, box_end, state)?;
                if let Some(track) = state.current.take() {
                    if track.is_audio() && state.audio.is_none() {
                        state.audio = Some(track);
                    }
                }
            }
            BoxType::Meta => parse_meta(io, box_end, &mut state.metadata)?,
            BoxType::Mdat => {
                debug!("MP4: mdat @{} 大小 {}", content_start, content_size);
            }
            _ => {
                if let Some(track) = state.current.as_mut() {
                    parse_track_box(io, &header.box_type, box_end, content_size, track)?;
                }
            }
        }

        if header.size == 0 {
            break;
        }
        io.seek(SeekFrom::Start(box_end))?;
    }
    Ok(())
}

/// 解析轨道内的叶子 box
fn parse_track_box(
    io: &mut IoContext,
    box_type: &BoxType,
    box_end: u64,
    content_size: u64,
    track: &mut TrackState,
) -> YinResult<()> {
    match box_type {
        BoxType::Mdhd => track.timescale = parse_mdhd(io)?,
        BoxType::Hdlr => track.handler = parse_hdlr(io)?,
        BoxType::Stsd => track.entry = parse_stsd(io, box_end)?,
        BoxType::Stts => track.raw.parse_stts(io, content_size)?,
        BoxType::Stsc => track.raw.parse_stsc(io, content_size)?,
        BoxType::Stsz => {
            let source_size = io.size().unwrap_or(u64::MAX);
            track.raw.parse_stsz(io, content_size, source_size)?;
        }
        BoxType::Stco => track.raw.parse_chunk_offsets(io, content_size, false)?,
        BoxType::Co64 => track.raw.parse_chunk_offsets(io, content_size, true)?,
        _ => {}
    }
    Ok(())
}

/// 解析 mdhd (Media Header Box), 返回时间刻度
fn parse_mdhd(io: &mut IoContext) -> YinResult<u32> {
    let (version, _flags) = read_full_box_header(io)?;
    if version == 1 {
        io.skip(16)?; // creation + modification (64-bit)
    } else {
        io.skip(8)?;
    }
    io.read_u32_be()
}

/// 解析 hdlr (Handler Reference Box), 返回处理器类型
fn parse_hdlr(io: &mut IoContext) -> YinResult<[u8; 4]> {
    read_full_box_header(io)?;
    let _pre_defined = io.read_u32_be()?;
    io.read_tag()
}

/// 解析 meta box, 只提取其中的 ilst
///
/// QuickTime 风格的 meta 不是 FullBox, 内容直接以 hdlr 开头.
fn parse_meta(io: &mut IoContext, end: u64, metadata: &mut Metadata) -> YinResult<()> {
    let start = io.position()?;
    if start + 8 > end {
        return Ok(());
    }
    let probe = io.read_bytes(8)?;
    let children_start = if &probe[4..8] == b"hdlr" { start } else { start + 4 };
    io.seek(SeekFrom::Start(children_start))?;

    while io.position()? + 8 <= end {
        let header = read_box_header(io)?;
        let content_start = io.position()?;
        let box_end = header.end(content_start, end)?;
        if header.box_type == BoxType::Ilst {
            parse_ilst(io, box_end, metadata)?;
        }
        io.seek(SeekFrom::Start(box_end))?;
    }
    Ok(())
}
