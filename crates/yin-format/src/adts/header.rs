//! ADTS 帧头编解码.
//!
//! # 帧头布局 (大端, MSB first, 7 或 9 字节)
//! ```text
//! 位偏移  宽度  字段
//!      0    12  syncword (= 0xFFF)
//!     12     1  ID: 0=MPEG-4, 1=MPEG-2
//!     13     2  layer (恒为 0)
//!     15     1  protection_absent: 1=无 CRC
//!     16     2  profile (= object_type - 1)
//!     18     4  sampling_frequency_index
//!     22     1  private_bit
//!     23     3  channel_configuration
//!     26     1  original_copy
//!     27     1  home
//!     28     1  copyright_identification_bit
//!     29     1  copyright_identification_start
//!     30    13  frame_length (含帧头)
//!     43    11  adts_buffer_fullness
//!     54     2  number_of_raw_data_blocks_in_frame
//!     56    16  crc_check (仅当 protection_absent = 0)
//! ```
//!
//! 每个字段只通过 [`ADTS_FIELDS`] 中的描述和对应的访问函数读取.

use yin_codec::{CodecConfig, sample_rate_for_index};
use yin_core::{BitWriter, YinError, YinResult};

/// 不含 CRC 的帧头长度
pub const ADTS_HEADER_SIZE: usize = 7;

/// 含 CRC 的帧头长度
pub const ADTS_HEADER_SIZE_CRC: usize = 9;

/// 帧头中的一个位字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    /// 字段名称
    pub name: &'static str,
    /// 从帧头第 0 位起算的位偏移
    pub offset: u32,
    /// 位宽
    pub width: u32,
}

impl BitField {
    const fn new(name: &'static str, offset: u32, width: u32) -> Self {
        Self {
            name,
            offset,
            width,
        }
    }

    /// 从 7 字节固定帧头中取出本字段
    pub fn extract(&self, header: &[u8; ADTS_HEADER_SIZE]) -> u32 {
        let mut word = [0u8; 8];
        word[1..].copy_from_slice(header);
        let word = u64::from_be_bytes(word);
        let shift = 56 - self.offset - self.width;
        ((word >> shift) & ((1u64 << self.width) - 1)) as u32
    }
}

pub const SYNC_WORD: BitField = BitField::new("syncword", 0, 12);
pub const ID: BitField = BitField::new("id", 12, 1);
pub const LAYER: BitField = BitField::new("layer", 13, 2);
pub const PROTECTION_ABSENT: BitField = BitField::new("protection_absent", 15, 1);
pub const PROFILE: BitField = BitField::new("profile", 16, 2);
pub const SAMPLING_FREQUENCY_INDEX: BitField = BitField::new("sampling_frequency_index", 18, 4);
pub const PRIVATE_BIT: BitField = BitField::new("private_bit", 22, 1);
pub const CHANNEL_CONFIGURATION: BitField = BitField::new("channel_configuration", 23, 3);
pub const ORIGINAL_COPY: BitField = BitField::new("original_copy", 26, 1);
pub const HOME: BitField = BitField::new("home", 27, 1);
pub const COPYRIGHT_ID_BIT: BitField = BitField::new("copyright_identification_bit", 28, 1);
pub const COPYRIGHT_ID_START: BitField = BitField::new("copyright_identification_start", 29, 1);
pub const FRAME_LENGTH: BitField = BitField::new("frame_length", 30, 13);
pub const BUFFER_FULLNESS: BitField = BitField::new("adts_buffer_fullness", 43, 11);
pub const RAW_DATA_BLOCKS: BitField = BitField::new("number_of_raw_data_blocks", 54, 2);

/// 固定帧头的全部字段, 按位偏移排列, 恰好覆盖 56 位
pub const ADTS_FIELDS: [BitField; 15] = [
    SYNC_WORD,
    ID,
    LAYER,
    PROTECTION_ABSENT,
    PROFILE,
    SAMPLING_FREQUENCY_INDEX,
    PRIVATE_BIT,
    CHANNEL_CONFIGURATION,
    ORIGINAL_COPY,
    HOME,
    COPYRIGHT_ID_BIT,
    COPYRIGHT_ID_START,
    FRAME_LENGTH,
    BUFFER_FULLNESS,
    RAW_DATA_BLOCKS,
];

// ============================================================
// 字段访问函数
// ============================================================

pub fn sync_word(h: &[u8; ADTS_HEADER_SIZE]) -> u16 {
    SYNC_WORD.extract(h) as u16
}

pub fn id(h: &[u8; ADTS_HEADER_SIZE]) -> u8 {
    ID.extract(h) as u8
}

pub fn layer(h: &[u8; ADTS_HEADER_SIZE]) -> u8 {
    LAYER.extract(h) as u8
}

pub fn protection_absent(h: &[u8; ADTS_HEADER_SIZE]) -> bool {
    PROTECTION_ABSENT.extract(h) == 1
}

pub fn profile(h: &[u8; ADTS_HEADER_SIZE]) -> u8 {
    PROFILE.extract(h) as u8
}

pub fn sampling_frequency_index(h: &[u8; ADTS_HEADER_SIZE]) -> u8 {
    SAMPLING_FREQUENCY_INDEX.extract(h) as u8
}

pub fn private_bit(h: &[u8; ADTS_HEADER_SIZE]) -> bool {
    PRIVATE_BIT.extract(h) == 1
}

pub fn channel_configuration(h: &[u8; ADTS_HEADER_SIZE]) -> u8 {
    CHANNEL_CONFIGURATION.extract(h) as u8
}

pub fn original_copy(h: &[u8; ADTS_HEADER_SIZE]) -> bool {
    ORIGINAL_COPY.extract(h) == 1
}

pub fn home(h: &[u8; ADTS_HEADER_SIZE]) -> bool {
    HOME.extract(h) == 1
}

pub fn frame_length(h: &[u8; ADTS_HEADER_SIZE]) -> u16 {
    FRAME_LENGTH.extract(h) as u16
}

pub fn buffer_fullness(h: &[u8; ADTS_HEADER_SIZE]) -> u16 {
    BUFFER_FULLNESS.extract(h) as u16
}

pub fn raw_data_blocks(h: &[u8; ADTS_HEADER_SIZE]) -> u8 {
    RAW_DATA_BLOCKS.extract(h) as u8
}

/// 前两个字节是否构成同步字
pub fn is_sync(b0: u8, b1: u8) -> bool {
    b0 == 0xFF && (b1 & 0xF0) == 0xF0
}

// ============================================================
// 帧头结构
// ============================================================

/// ADTS 帧头
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdtsHeader {
    /// 0=MPEG-4, 1=MPEG-2
    pub id: u8,
    pub layer: u8,
    /// 为 true 时没有 CRC
    pub protection_absent: bool,
    /// AAC Profile (0=Main, 1=LC, 2=SSR, 3=LTP)
    pub profile: u8,
    /// 采样率索引
    pub sampling_frequency_index: u8,
    pub private_bit: bool,
    /// 声道配置
    pub channel_configuration: u8,
    pub original_copy: bool,
    pub home: bool,
    /// 帧总大小 (含帧头)
    pub frame_length: u16,
    pub buffer_fullness: u16,
    pub number_of_raw_data_blocks: u8,
    /// CRC 校验字 (只记录, 不校验)
    pub crc: Option<u16>,
}

impl AdtsHeader {
    /// 从字节中解析帧头
    ///
    /// 至少需要 7 字节; 前 12 位必须为 0xFFF.
    pub fn parse(data: &[u8]) -> YinResult<Self> {
        if data.len() < ADTS_HEADER_SIZE {
            return Err(YinError::InvalidStream(format!(
                "ADTS 帧头过短: {} 字节",
                data.len(),
            )));
        }
        let mut fixed = [0u8; ADTS_HEADER_SIZE];
        fixed.copy_from_slice(&data[..ADTS_HEADER_SIZE]);

        if sync_word(&fixed) != 0xFFF {
            return Err(YinError::SyncNotFound { searched: 0 });
        }

        let mut header = Self::from_fixed(&fixed);
        if !header.protection_absent && data.len() >= ADTS_HEADER_SIZE_CRC {
            header.crc = Some(u16::from_be_bytes([data[7], data[8]]));
        }
        Ok(header)
    }

    /// 从已确认同步的 7 字节固定帧头构造 (不含 CRC)
    pub(crate) fn from_fixed(h: &[u8; ADTS_HEADER_SIZE]) -> Self {
        Self {
            id: id(h),
            layer: layer(h),
            protection_absent: protection_absent(h),
            profile: profile(h),
            sampling_frequency_index: sampling_frequency_index(h),
            private_bit: private_bit(h),
            channel_configuration: channel_configuration(h),
            original_copy: original_copy(h),
            home: home(h),
            frame_length: frame_length(h),
            buffer_fullness: buffer_fullness(h),
            number_of_raw_data_blocks: raw_data_blocks(h),
            crc: None,
        }
    }

    /// 构造一个 MPEG-4, 无 CRC 的帧头, 帧长按负载大小计算
    pub fn for_payload(
        profile: u8,
        sampling_frequency_index: u8,
        channel_configuration: u8,
        payload_len: usize,
    ) -> Self {
        Self {
            id: 0,
            layer: 0,
            protection_absent: true,
            profile,
            sampling_frequency_index,
            private_bit: false,
            channel_configuration,
            original_copy: false,
            home: false,
            frame_length: (ADTS_HEADER_SIZE + payload_len) as u16,
            buffer_fullness: 0x7FF,
            number_of_raw_data_blocks: 0,
            crc: None,
        }
    }

    /// 帧头长度 (7 或 9)
    pub fn header_size(&self) -> usize {
        if self.protection_absent {
            ADTS_HEADER_SIZE
        } else {
            ADTS_HEADER_SIZE_CRC
        }
    }

    /// 负载长度, 帧长不大于帧头长度时返回 `InvalidStream`
    pub fn payload_len(&self) -> YinResult<usize> {
        let frame_length = self.frame_length as usize;
        let header_size = self.header_size();
        if frame_length <= header_size {
            return Err(YinError::InvalidStream(format!(
                "ADTS 帧长 {} 不大于帧头长度 {}",
                frame_length, header_size,
            )));
        }
        Ok(frame_length - header_size)
    }

    /// 采样率 (Hz), 保留索引返回 `None`
    pub fn sample_rate(&self) -> Option<u32> {
        sample_rate_for_index(self.sampling_frequency_index)
    }

    /// MPEG-4 音频对象类型
    pub fn object_type(&self) -> u8 {
        self.profile + 1
    }

    /// 由帧头合成解码器配置
    pub fn codec_config(&self) -> CodecConfig {
        CodecConfig::from_parts(
            self.object_type(),
            self.sampling_frequency_index,
            self.channel_configuration,
        )
    }

    /// 编码为帧头字节 (7 或 9 字节, 无 CRC 值时写 0)
    pub fn to_bytes(&self) -> Vec<u8> {
        let values = [
            0xFFF,
            u32::from(self.id),
            u32::from(self.layer),
            u32::from(self.protection_absent),
            u32::from(self.profile),
            u32::from(self.sampling_frequency_index),
            u32::from(self.private_bit),
            u32::from(self.channel_configuration),
            u32::from(self.original_copy),
            u32::from(self.home),
            0,
            0,
            u32::from(self.frame_length),
            u32::from(self.buffer_fullness),
            u32::from(self.number_of_raw_data_blocks),
        ];

        let mut bw = BitWriter::new();
        for (field, value) in ADTS_FIELDS.iter().zip(values) {
            bw.write_bits(value & ((1u32 << field.width) - 1), field.width);
        }
        if !self.protection_absent {
            bw.write_bits(u32::from(self.crc.unwrap_or(0)), 16);
        }
        bw.finish()
    }
}

/// 一次性帧头检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderInfo {
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 声道配置
    pub channels: u8,
    /// 帧总大小 (含帧头)
    pub frame_length: u16,
}

/// 不创建读取器, 直接检查一个帧头
pub fn inspect_header(data: &[u8]) -> YinResult<HeaderInfo> {
    let header = AdtsHeader::parse(data)?;
    let sample_rate = header.sample_rate().ok_or_else(|| {
        YinError::InvalidStream(format!(
            "保留的采样率索引: {}",
            header.sampling_frequency_index
        ))
    })?;
    Ok(HeaderInfo {
        sample_rate,
        channels: header.channel_configuration,
        frame_length: header.frame_length,
    })
}
