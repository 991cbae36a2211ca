//! AAC ADTS 裸流解析.
//!
//! 每帧由 7 字节 (带 CRC 时 9 字节) 的 ADTS 头部和原始数据块组成,
//! 帧与帧之间首尾相接. 读取位置失去同步时在有限窗口内向前搜索同步字.

pub mod header;
pub mod reader;
pub mod resync;

pub use self::header::{
    ADTS_HEADER_SIZE, ADTS_HEADER_SIZE_CRC, AdtsHeader, HeaderInfo, inspect_header,
};
pub use self::reader::AdtsFrameReader;
pub use self::resync::{DEFAULT_RESYNC_WINDOW, find_sync};
