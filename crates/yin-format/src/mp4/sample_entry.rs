//! 音频采样描述 (stsd → mp4a → esds).
//!
//! esds 结构: version(1) + flags(3) + ES_Descriptor(tag=0x03)
//!   → DecoderConfigDescriptor(tag=0x04)
//!     → DecoderSpecificInfo(tag=0x05) = AudioSpecificConfig

use log::debug;
use yin_core::YinResult;

use super::boxes::{BoxType, read_full_box_header};
use crate::io::IoContext;

/// stsd 第一个条目的解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleEntry {
    /// mp4a 条目
    Mp4a(AudioSampleEntry),
    /// 其他编码格式的条目 (FourCC)
    Other([u8; 4]),
}

/// mp4a 音频采样条目
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioSampleEntry {
    /// 声道数
    pub channel_count: u16,
    /// 采样率 (16.16 定点数的整数部分)
    pub sample_rate: u32,
    /// esds 中的 DecoderSpecificInfo, 缺失时为空
    pub decoder_config: Vec<u8>,
}

/// 解析 stsd (Sample Description Box), 只取第一个条目
pub fn parse_stsd(io: &mut IoContext, box_end: u64) -> YinResult<Option<SampleEntry>> {
    read_full_box_header(io)?;
    let entry_count = io.read_u32_be()?;
    if entry_count == 0 || io.position()? + 8 > box_end {
        return Ok(None);
    }

    let entry_start = io.position()?;
    let entry_size = u64::from(io.read_u32_be()?);
    let format = io.read_tag()?;
    let entry_end = (entry_start + entry_size).min(box_end);

    if &format != b"mp4a" {
        debug!("MP4: 采样描述格式 {}", String::from_utf8_lossy(&format));
        return Ok(Some(SampleEntry::Other(format)));
    }

    // 保留字段 (6 bytes) + data_reference_index (2 bytes)
    io.skip(6)?;
    let _data_ref_idx = io.read_u16_be()?;

    // QuickTime 声音描述版本, 版本 1 额外带 16 字节
    let sound_version = io.read_u16_be()?;
    io.skip(6)?;
    let channel_count = io.read_u16_be()?;
    let _sample_size = io.read_u16_be()?;
    let _pre_defined = io.read_u16_be()?;
    let _reserved = io.read_u16_be()?;
    let sample_rate = io.read_u32_be()? >> 16;
    if sound_version == 1 {
        io.skip(16)?;
    }

    let mut entry = AudioSampleEntry {
        channel_count,
        sample_rate,
        decoder_config: Vec::new(),
    };

    // 子 box (esds 等)
    while io.position()? + 8 <= entry_end {
        let pos = io.position()?;
        let size = u64::from(io.read_u32_be()?);
        let tag = io.read_tag()?;
        if size < 8 || pos + size > entry_end {
            break;
        }
        if BoxType::from_fourcc(&tag) == BoxType::Esds {
            let data = io.read_bytes((size - 8) as usize)?;
            if let Some(config) = extract_decoder_specific_info(&data) {
                entry.decoder_config = config;
            }
        }
        io.seek(std::io::SeekFrom::Start(pos + size))?;
    }

    debug!(
        "MP4: mp4a {} Hz, {} 声道, 配置 {} 字节",
        entry.sample_rate,
        entry.channel_count,
        entry.decoder_config.len(),
    );
    Ok(Some(SampleEntry::Mp4a(entry)))
}

/// 从 esds box 内容中提取 DecoderSpecificInfo (AudioSpecificConfig)
pub fn extract_decoder_specific_info(esds_data: &[u8]) -> Option<Vec<u8>> {
    if esds_data.len() < 4 {
        return None;
    }
    // 跳过 version(1) + flags(3)
    search_descriptor(&esds_data[4..], 0x05).filter(|d| !d.is_empty())
}

/// 在 MPEG-4 描述符数据中递归搜索指定 tag 的 payload
fn search_descriptor(data: &[u8], target_tag: u8) -> Option<Vec<u8>> {
    let mut pos = 0;
    while pos < data.len() {
        let tag = data[pos];
        pos += 1;

        // 可变长度: 每字节高位为续标志, 低 7 位为值
        let mut len = 0usize;
        for _ in 0..4 {
            if pos >= data.len() {
                return None;
            }
            let b = data[pos];
            pos += 1;
            len = (len << 7) | (b & 0x7F) as usize;
            if b & 0x80 == 0 {
                break;
            }
        }

        let desc_end = (pos + len).min(data.len());
        if tag == target_tag {
            return Some(data[pos..desc_end].to_vec());
        }

        let child_start = (pos + descriptor_header_size(tag, &data[pos..desc_end])).min(desc_end);
        if child_start < desc_end {
            if let Some(result) = search_descriptor(&data[child_start..desc_end], target_tag) {
                return Some(result);
            }
        }

        pos = desc_end;
    }
    None
}

/// MPEG-4 描述符固定头部大小
fn descriptor_header_size(tag: u8, payload: &[u8]) -> usize {
    match tag {
        0x03 => {
            // ES_Descriptor: ES_ID(2) + flags(1) + 可选字段
            if payload.len() < 3 {
                return payload.len();
            }
            let flags = payload[2];
            let mut skip = 3;
            if flags & 0x80 != 0 {
                skip += 2; // dependsOn_ES_ID
            }
            if flags & 0x40 != 0 && skip < payload.len() {
                skip += 1 + payload[skip] as usize; // URL
            }
            if flags & 0x20 != 0 {
                skip += 2; // OCR_ES_Id
            }
            skip
        }
        // DecoderConfigDescriptor: objectType(1) + streamType(1) + bufferSize(3)
        // + maxBitrate(4) + avgBitrate(4)
        0x04 => 13,
        _ => 0,
    }
}
