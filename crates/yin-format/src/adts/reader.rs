//! ADTS 帧读取器.
//!
//! 从顺序数据源中逐帧取出 ADTS 负载. 数据源不要求可 seek: 探测 ID3v2 标签
//! 和重同步时多读的字节都保存在退回缓冲区中, 在后续读取时优先消耗.

use bytes::Bytes;
use log::debug;
use yin_codec::Packet;
use yin_core::{YinError, YinResult};

use super::header::{ADTS_HEADER_SIZE, AdtsHeader, sync_word};
use super::resync::DEFAULT_RESYNC_WINDOW;
use crate::io::IoContext;

/// ADTS 帧读取器
pub struct AdtsFrameReader {
    /// 底层数据源
    io: IoContext,
    /// 退回缓冲区
    pending: Vec<u8>,
    /// 退回缓冲区读取位置
    pending_pos: usize,
    /// 重同步窗口大小
    resync_window: usize,
    /// 已读取的帧数
    frames_read: u64,
}

impl AdtsFrameReader {
    /// 以默认重同步窗口创建
    pub fn new(io: IoContext) -> Self {
        Self::with_resync_window(io, DEFAULT_RESYNC_WINDOW)
    }

    /// 指定重同步窗口大小
    pub fn with_resync_window(io: IoContext, resync_window: usize) -> Self {
        Self {
            io,
            pending: Vec::new(),
            pending_pos: 0,
            resync_window,
            frames_read: 0,
        }
    }

    pub fn resync_window(&self) -> usize {
        self.resync_window
    }

    /// 已成功读取的帧数
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    // ========================
    // 带退回缓冲区的字节读取
    // ========================

    /// 尽量读取, 返回实际字节数 (0 表示数据结束)
    pub(super) fn read_partial(&mut self, buf: &mut [u8]) -> YinResult<usize> {
        let avail = self.pending.len() - self.pending_pos;
        let from_pending = avail.min(buf.len());
        if from_pending > 0 {
            buf[..from_pending]
                .copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + from_pending]);
            self.pending_pos += from_pending;
            if self.pending_pos == self.pending.len() {
                self.pending.clear();
                self.pending_pos = 0;
            }
        }
        if from_pending == buf.len() {
            return Ok(from_pending);
        }
        let n = self.io.read_partial(&mut buf[from_pending..])?;
        Ok(from_pending + n)
    }

    /// 读满缓冲区, 数据不足时返回 [`YinError::Eof`]
    pub(super) fn read_exact(&mut self, buf: &mut [u8]) -> YinResult<()> {
        if self.read_partial(buf)? < buf.len() {
            return Err(YinError::Eof);
        }
        Ok(())
    }

    /// 将字节退回, 下一次读取时优先返回
    pub(super) fn unread(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let mut restored = data.to_vec();
        restored.extend_from_slice(&self.pending[self.pending_pos..]);
        self.pending = restored;
        self.pending_pos = 0;
    }

    fn skip(&mut self, count: usize) -> YinResult<()> {
        let avail = self.pending.len() - self.pending_pos;
        if count <= avail {
            self.pending_pos += count;
            return Ok(());
        }
        self.pending.clear();
        self.pending_pos = 0;
        self.io.skip(count - avail)
    }

    // ========================
    // 帧读取
    // ========================

    /// 跳过流开头的 ID3v2 标签 (若存在)
    pub fn skip_id3v2(&mut self) -> YinResult<()> {
        let mut tag = [0u8; 10];
        let n = self.read_partial(&mut tag)?;
        if n < tag.len() || &tag[..3] != b"ID3" {
            self.unread(&tag[..n]);
            return Ok(());
        }

        // Syncsafe integer (4 bytes)
        let mut size = ((tag[6] as usize & 0x7F) << 21)
            | ((tag[7] as usize & 0x7F) << 14)
            | ((tag[8] as usize & 0x7F) << 7)
            | (tag[9] as usize & 0x7F);
        // 标志位 0x10: 带 10 字节尾部
        if tag[5] & 0x10 != 0 {
            size += 10;
        }

        debug!("ADTS: 跳过 ID3v2 标签, 大小={size}");
        self.skip(size)
    }

    /// 读取下一个帧头, 当前位置不同步时做一次有界重同步
    ///
    /// 数据源在帧头中途结束时返回 [`YinError::Eof`].
    pub fn read_header(&mut self) -> YinResult<AdtsHeader> {
        let mut fixed = [0u8; ADTS_HEADER_SIZE];
        self.read_exact(&mut fixed)?;

        if sync_word(&fixed) != 0xFFF {
            fixed = self.resync(&fixed)?;
        }

        let mut header = AdtsHeader::from_fixed(&fixed);
        if !header.protection_absent {
            let mut crc = [0u8; 2];
            self.read_exact(&mut crc)?;
            header.crc = Some(u16::from_be_bytes(crc));
        }
        Ok(header)
    }

    /// 读取帧头之后的负载
    pub fn read_payload(&mut self, header: &AdtsHeader) -> YinResult<Bytes> {
        let len = header.payload_len()?;
        let mut payload = vec![0u8; len];
        self.read_exact(&mut payload)?;
        Ok(Bytes::from(payload))
    }

    /// 读取下一帧, 数据源耗尽时返回 `None`
    ///
    /// 末尾被截断的帧 (帧头或负载不完整) 视为数据耗尽.
    pub fn next_frame(&mut self) -> YinResult<Option<(AdtsHeader, Packet)>> {
        let header = match self.read_header() {
            Ok(h) => h,
            Err(e) if e.is_eof() => return Ok(None),
            Err(e) => return Err(e),
        };
        let payload = match self.read_payload(&header) {
            Ok(p) => p,
            Err(e) if e.is_eof() => return Ok(None),
            Err(e) => return Err(e),
        };
        let packet = Packet::from_data(payload, self.frames_read);
        self.frames_read += 1;
        Ok(Some((header, packet)))
    }
}
