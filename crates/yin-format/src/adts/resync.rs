//! ADTS 重同步.
//!
//! 当前读取位置的 7 字节不是合法同步字时, 在一个有界窗口内向前搜索下一个
//! `0xFF 0xFx`. 只搜索一次, 不递归重试.

use log::warn;
use yin_core::{YinError, YinResult};

use super::header::{ADTS_HEADER_SIZE, is_sync};
use super::reader::AdtsFrameReader;

/// 默认重同步窗口 (字节)
pub const DEFAULT_RESYNC_WINDOW: usize = 8192;

/// 在数据中查找第一个同步字的位置
pub fn find_sync(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| is_sync(w[0], w[1]))
}

impl AdtsFrameReader {
    /// 从失败的帧头出发重新同步, 返回新的 7 字节帧头
    ///
    /// 窗口中位于新帧头之后的字节会退回给读取器, 不会丢失.
    pub(super) fn resync(
        &mut self,
        failed: &[u8; ADTS_HEADER_SIZE],
    ) -> YinResult<[u8; ADTS_HEADER_SIZE]> {
        let window = self.resync_window().max(ADTS_HEADER_SIZE);
        let mut buf = vec![0u8; window];
        buf[..ADTS_HEADER_SIZE - 1].copy_from_slice(&failed[1..]);
        let carried = ADTS_HEADER_SIZE - 1;

        let n = self.read_partial(&mut buf[carried..])?;
        if n == 0 {
            return Err(YinError::SyncNotFound { searched: carried });
        }
        let filled = carried + n;

        let Some(pos) = find_sync(&buf[..filled]) else {
            return Err(YinError::SyncNotFound { searched: filled });
        };

        warn!(
            "ADTS 失去同步, 跳过 {} 字节后重新同步 (帧序号 {})",
            pos + 1,
            self.frames_read(),
        );

        let mut header = [0u8; ADTS_HEADER_SIZE];
        if pos + ADTS_HEADER_SIZE <= filled {
            header.copy_from_slice(&buf[pos..pos + ADTS_HEADER_SIZE]);
            self.unread(&buf[pos + ADTS_HEADER_SIZE..filled]);
        } else {
            // 同步字靠近窗口末尾, 帧头剩余部分从数据源补齐
            let have = filled - pos;
            header[..have].copy_from_slice(&buf[pos..filled]);
            self.read_exact(&mut header[have..])?;
        }
        Ok(header)
    }
}
