//! 容器元数据标签.
//!
//! iTunes 风格的 `moov/udta/meta/ilst` 结构:
//! ```text
//! ilst
//! └── ©nam / ©ART / ©alb / ©gen ...   元数据条目
//!     └── data                        type(4) + locale(4) + 值
//! ```

use std::io::SeekFrom;

use log::debug;
use yin_core::YinResult;

use crate::io::IoContext;
use crate::mp4::boxes::{BoxType, read_box_header};

/// 音频文件元数据
///
/// 年份与音轨号目前不解析, 始终为 `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// 标题 (©nam)
    pub title: Option<String>,
    /// 艺术家 (©ART)
    pub artist: Option<String>,
    /// 专辑 (©alb)
    pub album: Option<String>,
    /// 流派 (©gen)
    pub genre: Option<String>,
    /// 年份 (©day)
    pub year: Option<u32>,
    /// 音轨号 (trkn)
    pub track_number: Option<u32>,
}

impl Metadata {
    /// 是否没有任何标签
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// 按条目 FourCC 写入文本值, 未识别的条目返回 false
    pub fn set_item(&mut self, item: &[u8; 4], value: String) -> bool {
        let slot = match item {
            b"\xa9nam" => &mut self.title,
            b"\xa9ART" => &mut self.artist,
            b"\xa9alb" => &mut self.album,
            b"\xa9gen" => &mut self.genre,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// 解析 ilst box 内容 (到 `end` 为止), 结果写入 `metadata`
pub fn parse_ilst(io: &mut IoContext, end: u64, metadata: &mut Metadata) -> YinResult<()> {
    while io.position()? + 8 <= end {
        let item = read_box_header(io)?;
        let item_start = io.position()?;
        let item_end = item.end(item_start, end)?;

        while io.position()? + 8 <= item_end {
            let child = read_box_header(io)?;
            let child_start = io.position()?;
            let child_end = child.end(child_start, item_end)?;

            if child.box_type == BoxType::Data && child_end >= child_start + 8 {
                // type indicator(4) + locale(4)
                io.skip(8)?;
                let raw = io.read_bytes((child_end - child_start - 8) as usize)?;
                let value = String::from_utf8_lossy(&raw).into_owned();
                if metadata.set_item(&item.fourcc, value) {
                    debug!(
                        "MP4: 元数据 {}",
                        String::from_utf8_lossy(&item.fourcc[1..]),
                    );
                }
            }
            io.seek(SeekFrom::Start(child_end))?;
        }

        io.seek(SeekFrom::Start(item_end))?;
    }
    Ok(())
}
