//! I/O 抽象层.
//!
//! 为 ADTS 帧读取与 MP4 容器解析提供统一的只读接口,
//! 支持文件, 内存缓冲区以及任意不可 seek 的字节流.

use std::io::{self, Read, Seek};
use std::path::Path;

use yin_core::{YinError, YinResult};

/// I/O 上下文
///
/// 封装底层 I/O 操作, 带一个读缓冲区.
pub struct IoContext {
    /// 内部 I/O 实现
    inner: Box<dyn IoBackend>,
    /// 读缓冲区
    buffer: Vec<u8>,
    /// 缓冲区中的有效数据长度
    buf_len: usize,
    /// 缓冲区当前读取位置
    buf_pos: usize,
}

/// I/O 后端 trait
///
/// 实现此 trait 以支持不同的数据来源.
pub trait IoBackend: Send {
    /// 读取数据到缓冲区, 返回 0 表示数据结束
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// 定位 (seek)
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64>;
    /// 获取当前位置
    fn position(&mut self) -> io::Result<u64>;
    /// 获取总大小 (如果可知)
    fn size(&self) -> Option<u64>;
    /// 是否支持 seek
    fn is_seekable(&self) -> bool;
}

/// 默认缓冲区大小 (32 KB)
const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

impl IoContext {
    /// 从 I/O 后端创建上下文
    pub fn new(backend: Box<dyn IoBackend>) -> Self {
        Self {
            inner: backend,
            buffer: vec![0u8; DEFAULT_BUFFER_SIZE],
            buf_len: 0,
            buf_pos: 0,
        }
    }

    /// 从文件路径打开 (只读)
    pub fn open_read(path: impl AsRef<Path>) -> YinResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(Self::new(Box::new(FileBackend::new(file))))
    }

    /// 从内存数据创建
    pub fn from_memory(data: impl Into<Vec<u8>>) -> Self {
        Self::new(Box::new(MemoryBackend::from_data(data.into())))
    }

    /// 从任意字节流创建 (不可 seek)
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::new(Box::new(StreamBackend::new(reader)))
    }

    // ========================
    // 读取方法
    // ========================

    /// 尽量读取数据, 返回实际读取的字节数 (0 表示数据结束)
    ///
    /// 与 `read_exact` 不同, 数据不足时不报错.
    pub fn read_partial(&mut self, buf: &mut [u8]) -> YinResult<usize> {
        let mut total_read = 0;
        while total_read < buf.len() {
            let buffered = self.buf_len - self.buf_pos;
            if buffered > 0 {
                let to_copy = buffered.min(buf.len() - total_read);
                buf[total_read..total_read + to_copy]
                    .copy_from_slice(&self.buffer[self.buf_pos..self.buf_pos + to_copy]);
                self.buf_pos += to_copy;
                total_read += to_copy;
            } else {
                self.buf_pos = 0;
                self.buf_len = self.inner.read(&mut self.buffer)?;
                if self.buf_len == 0 {
                    break;
                }
            }
        }
        Ok(total_read)
    }

    /// 读取指定字节数, 数据不足时返回 [`YinError::Eof`]
    pub fn read_exact(&mut self, buf: &mut [u8]) -> YinResult<()> {
        let n = self.read_partial(buf)?;
        if n < buf.len() {
            return Err(YinError::Eof);
        }
        Ok(())
    }

    /// 读取 1 个字节
    pub fn read_u8(&mut self) -> YinResult<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// 读取 2 字节大端无符号整数
    pub fn read_u16_be(&mut self) -> YinResult<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// 读取 4 字节大端无符号整数
    pub fn read_u32_be(&mut self) -> YinResult<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    /// 读取 8 字节大端无符号整数
    pub fn read_u64_be(&mut self) -> YinResult<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    /// 读取 4 字节标签 (FourCC)
    pub fn read_tag(&mut self) -> YinResult<[u8; 4]> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// 读取指定数量的字节
    pub fn read_bytes(&mut self, count: usize) -> YinResult<Vec<u8>> {
        let mut buf = vec![0u8; count];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// 读取剩余的全部数据
    pub fn read_to_end(&mut self) -> YinResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.size().unwrap_or(0) as usize);
        out.extend_from_slice(&self.buffer[self.buf_pos..self.buf_len]);
        self.buf_pos = self.buf_len;
        loop {
            let n = self.inner.read(&mut self.buffer)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&self.buffer[..n]);
        }
        self.buf_pos = 0;
        self.buf_len = 0;
        Ok(out)
    }

    /// 跳过指定字节数
    pub fn skip(&mut self, count: usize) -> YinResult<()> {
        // 先尝试消耗缓冲区中的数据
        let buffered = self.buf_len - self.buf_pos;
        if count <= buffered {
            self.buf_pos += count;
            return Ok(());
        }

        let remaining = count - buffered;
        self.buf_pos = self.buf_len;

        if self.inner.is_seekable() {
            self.inner.seek(io::SeekFrom::Current(remaining as i64))?;
        } else {
            // 逐块丢弃读取的数据
            let mut left = remaining;
            while left > 0 {
                let to_read = left.min(self.buffer.len());
                let n = self.inner.read(&mut self.buffer[..to_read])?;
                if n == 0 {
                    self.buf_pos = 0;
                    self.buf_len = 0;
                    return Err(YinError::Eof);
                }
                left -= n;
            }
            self.buf_pos = 0;
            self.buf_len = 0;
        }
        Ok(())
    }

    // ========================
    // 定位方法
    // ========================

    /// 定位 (seek), 会清空读缓冲区
    pub fn seek(&mut self, pos: io::SeekFrom) -> YinResult<u64> {
        if !self.inner.is_seekable() {
            return Err(YinError::Io(io::Error::new(
                io::ErrorKind::Unsupported,
                "数据源不支持 seek",
            )));
        }
        self.buf_pos = 0;
        self.buf_len = 0;
        Ok(self.inner.seek(pos)?)
    }

    /// 获取当前位置, 扣除读缓冲区中尚未消耗的数据量
    pub fn position(&mut self) -> YinResult<u64> {
        let raw_pos = self.inner.position()?;
        let buffered = (self.buf_len - self.buf_pos) as u64;
        Ok(raw_pos - buffered)
    }

    /// 是否支持随机访问
    pub fn is_seekable(&self) -> bool {
        self.inner.is_seekable()
    }

    /// 获取总大小
    pub fn size(&self) -> Option<u64> {
        self.inner.size()
    }
}

/// 文件 I/O 后端
struct FileBackend {
    file: std::fs::File,
    size: Option<u64>,
}

impl FileBackend {
    fn new(file: std::fs::File) -> Self {
        let size = file.metadata().ok().map(|m| m.len());
        Self { file, size }
    }
}

impl IoBackend for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }

    fn position(&mut self) -> io::Result<u64> {
        self.file.stream_position()
    }

    fn size(&self) -> Option<u64> {
        self.size
    }

    fn is_seekable(&self) -> bool {
        true
    }
}

/// 内存缓冲区 I/O 后端
///
/// 用于测试和内存中处理.
pub struct MemoryBackend {
    /// 数据缓冲区
    data: Vec<u8>,
    /// 当前位置
    pos: usize,
}

impl MemoryBackend {
    /// 从已有数据创建
    pub fn from_data(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl IoBackend for MemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.data.len().saturating_sub(self.pos);
        let to_read = buf.len().min(available);
        if to_read == 0 {
            return Ok(0);
        }
        buf[..to_read].copy_from_slice(&self.data[self.pos..self.pos + to_read]);
        self.pos += to_read;
        Ok(to_read)
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            io::SeekFrom::Start(offset) => offset as i64,
            io::SeekFrom::End(offset) => self.data.len() as i64 + offset,
            io::SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        if new_pos < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek 位置不能为负",
            ));
        }
        self.pos = new_pos as usize;
        Ok(self.pos as u64)
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.pos as u64)
    }

    fn size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn is_seekable(&self) -> bool {
        true
    }
}

/// 顺序字节流 I/O 后端
///
/// 包装任意 `Read` (管道, 套接字, 标准输入), 只能向前读取.
pub struct StreamBackend<R> {
    reader: R,
    /// 已读取的字节数
    consumed: u64,
}

impl<R: Read + Send> StreamBackend<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            consumed: 0,
        }
    }
}

impl<R: Read + Send> IoBackend for StreamBackend<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.reader.read(buf) {
                Ok(n) => {
                    self.consumed += n as u64;
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn seek(&mut self, _pos: io::SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "顺序字节流不支持 seek",
        ))
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.consumed)
    }

    fn size(&self) -> Option<u64> {
        None
    }

    fn is_seekable(&self) -> bool {
        false
    }
}
