//! AAC 解码器配置 (AudioSpecificConfig).
//!
//! 引擎初始化只需要 AudioSpecificConfig 字节串. ADTS 裸流每帧帧头都携带足够的信息,
//! 可以据此合成 2 字节的配置; MP4 容器则在 `esds` 中直接给出原始配置.

use yin_core::{BitReader, YinError, YinResult};

/// MPEG-4 采样率索引表 (ISO 14496-3 Table 1.18)
///
/// 索引 13-14 保留, 15 表示采样率以 24 位显式给出.
pub const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// 按采样率索引查表, 保留索引返回 `None`
pub fn sample_rate_for_index(index: u8) -> Option<u32> {
    SAMPLE_RATES.get(index as usize).copied()
}

/// 解码器配置字节串
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    data: Vec<u8>,
}

impl CodecConfig {
    /// 由三个字段合成 2 字节 AudioSpecificConfig
    ///
    /// 布局: object_type(5) | sampling_frequency_index(4) | channel_configuration(4) | 000
    pub fn from_parts(
        object_type: u8,
        sampling_frequency_index: u8,
        channel_configuration: u8,
    ) -> Self {
        let ot = object_type & 0x1F;
        let sfi = sampling_frequency_index & 0x0F;
        let cc = channel_configuration & 0x0F;
        Self {
            data: vec![(ot << 3) | (sfi >> 1), ((sfi & 1) << 7) | (cc << 3)],
        }
    }

    /// 直接使用容器给出的配置字节 (长度可能超过 2)
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// 原始配置字节
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// 配置是否为空
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 解析配置中的基本字段
    pub fn parse(&self) -> YinResult<AudioSpecificConfig> {
        AudioSpecificConfig::parse(&self.data)
    }
}

/// AudioSpecificConfig 的基本字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    /// 音频对象类型 (2 = AAC-LC)
    pub object_type: u8,
    /// 采样率索引
    pub sampling_frequency_index: u8,
    /// 采样率 (Hz), 保留索引时为 `None`
    pub sample_rate: Option<u32>,
    /// 声道配置
    pub channel_configuration: u8,
}

impl AudioSpecificConfig {
    /// 从配置字节中解析
    pub fn parse(data: &[u8]) -> YinResult<Self> {
        if data.len() < 2 {
            return Err(YinError::InvalidStream(format!(
                "AudioSpecificConfig 过短: {} 字节",
                data.len(),
            )));
        }
        let mut br = BitReader::new(data);

        let mut object_type = br.read_bits(5)? as u8;
        if object_type == 31 {
            object_type = 32 + br.read_bits(6)? as u8;
        }

        let sampling_frequency_index = br.read_bits(4)? as u8;
        let sample_rate = if sampling_frequency_index == 0x0F {
            Some(br.read_bits(24)?)
        } else {
            sample_rate_for_index(sampling_frequency_index)
        };
        let channel_configuration = br.read_bits(4)? as u8;

        Ok(Self {
            object_type,
            sampling_frequency_index,
            sample_rate,
            channel_configuration,
        })
    }
}
