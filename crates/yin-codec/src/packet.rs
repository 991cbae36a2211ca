//! 压缩帧数据包.
//!
//! 读取器从 ADTS 裸流或 MP4 样本表取出的一帧 AAC 负载, 随后整体送入解码引擎.

use bytes::Bytes;

/// 压缩帧数据包
#[derive(Debug, Clone)]
pub struct Packet {
    /// 压缩数据 (不含 ADTS 帧头)
    pub data: Bytes,
    /// 帧序号 (从 0 开始), 解码错误以此定位
    pub index: u64,
}

impl Packet {
    /// 从数据创建数据包
    pub fn from_data(data: impl Into<Bytes>, index: u64) -> Self {
        Self {
            data: data.into(),
            index,
        }
    }
}
