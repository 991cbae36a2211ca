//! 格式探测.
//!
//! 通过分析文件头部数据和文件扩展名, 识别 ADTS 裸流或 MP4 容器.

use std::io::SeekFrom;

use log::debug;
use yin_core::{YinError, YinResult};

use crate::adts::header::{ADTS_HEADER_SIZE, AdtsHeader, is_sync};
use crate::format_id::FormatId;
use crate::io::IoContext;

/// 探测置信度
///
/// 数值越高, 表示对格式判断越有信心.
pub type ProbeScore = u32;

/// 最低探测分数 (仅根据扩展名)
pub const SCORE_EXTENSION: ProbeScore = 50;

/// 中等探测分数 (结构特征部分匹配)
pub const SCORE_MIME: ProbeScore = 75;

/// 最高探测分数 (魔数完全匹配)
pub const SCORE_MAX: ProbeScore = 100;

/// 探测时读取的头部数据上限
pub const PROBE_SIZE: usize = 8192;

/// 探测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    /// 识别出的格式
    pub format_id: FormatId,
    /// 置信度分数
    pub score: ProbeScore,
}

/// 格式探测器 trait
pub trait FormatProbe {
    /// 根据文件头部数据探测格式
    ///
    /// # 参数
    /// - `data`: 文件开头的若干字节
    /// - `filename`: 文件名 (可选, 用于扩展名匹配)
    ///
    /// # 返回
    /// - `Some(score)`: 探测成功, 返回置信度
    /// - `None`: 不是此格式
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore>;

    /// 获取此探测器对应的格式标识
    fn format_id(&self) -> FormatId;
}

fn extension_score(format: FormatId, filename: Option<&str>) -> Option<ProbeScore> {
    filename
        .and_then(FormatId::from_filename)
        .filter(|id| *id == format)
        .map(|_| SCORE_EXTENSION)
}

/// ADTS 裸流探测器
pub struct AdtsProbe;

impl FormatProbe for AdtsProbe {
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore> {
        // 跳过可能的 ID3v2
        let offset = if data.len() >= 10 && &data[..3] == b"ID3" {
            let size = ((data[6] as usize & 0x7F) << 21)
                | ((data[7] as usize & 0x7F) << 14)
                | ((data[8] as usize & 0x7F) << 7)
                | (data[9] as usize & 0x7F);
            let footer = if data[5] & 0x10 != 0 { 10 } else { 0 };
            10 + size + footer
        } else {
            0
        };

        if offset + ADTS_HEADER_SIZE <= data.len() {
            if let Ok(header) = AdtsHeader::parse(&data[offset..]) {
                if header.sample_rate().is_some() && header.payload_len().is_ok() {
                    // 验证下一帧
                    let next = offset + header.frame_length as usize;
                    if next + 2 <= data.len() && is_sync(data[next], data[next + 1]) {
                        return Some(SCORE_MAX);
                    }
                    // 单帧也给高分
                    return Some(SCORE_MAX - 10);
                }
            }
        }

        extension_score(FormatId::AacAdts, filename)
    }

    fn format_id(&self) -> FormatId {
        FormatId::AacAdts
    }
}

/// MP4/M4A 容器探测器
pub struct Mp4Probe;

impl FormatProbe for Mp4Probe {
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore> {
        if data.len() >= 8 {
            match &data[4..8] {
                b"ftyp" => return Some(SCORE_MAX),
                // 某些文件没有 ftyp
                b"moov" | b"mdat" | b"free" | b"wide" => return Some(SCORE_MIME),
                _ => {}
            }
        }
        extension_score(FormatId::Mp4, filename)
    }

    fn format_id(&self) -> FormatId {
        FormatId::Mp4
    }
}

/// 在所有探测器中选出置信度最高的结果
pub fn probe_data(data: &[u8], filename: Option<&str>) -> Option<ProbeResult> {
    let probes: [&dyn FormatProbe; 2] = [&Mp4Probe, &AdtsProbe];
    let mut best: Option<ProbeResult> = None;
    for probe in probes {
        if let Some(score) = probe.probe(data, filename) {
            let is_better = best.as_ref().is_none_or(|b| score > b.score);
            if is_better {
                best = Some(ProbeResult {
                    format_id: probe.format_id(),
                    score,
                });
            }
        }
    }
    best
}

/// 探测输入格式
///
/// 读取头部数据探测格式, 然后 seek 回起始位置.
pub fn probe_input(io: &mut IoContext, filename: Option<&str>) -> YinResult<ProbeResult> {
    let mut buf = vec![0u8; PROBE_SIZE];
    let mut filled = 0;
    while filled < buf.len() {
        let n = io.read_partial(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);

    let result = probe_data(&buf, filename)
        .ok_or_else(|| YinError::InvalidStream("无法识别输入格式".into()))?;
    debug!("探测结果: {} (score={})", result.format_id, result.score);

    io.seek(SeekFrom::Start(0))?;
    Ok(result)
}
