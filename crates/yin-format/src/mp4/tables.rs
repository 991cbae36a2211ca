//! 采样表原始数据 (第一遍).
//!
//! 遍历音频轨道的 stbl 时原样收集各子表, 不做任何跨表推导:
//! - stsz: 每个采样的字节大小 (统一大小时展开为逐样本)
//! - stco/co64: 每个块的文件偏移
//! - stsc: 采样→块映射 (Run-Length 编码)
//! - stts: 解码时间增量 (Run-Length 编码)
//!
//! 由这些表推导最终采样表的工作在 [`build_sample_table`](super::sample_table::build_sample_table) 中完成.

use yin_core::{YinError, YinResult};

use super::boxes::read_full_box_header;
use crate::io::IoContext;

/// 采样→块条目 (stsc)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRun {
    /// 起始块号 (1-based)
    pub first_chunk: u32,
    /// 每块的采样数
    pub samples_per_chunk: u32,
}

/// 时间→采样条目 (stts)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationRun {
    /// 采样计数
    pub count: u32,
    /// 每采样的时间增量
    pub delta: u32,
}

/// 第一遍收集的原始表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTables {
    /// 逐样本大小
    pub sample_sizes: Vec<u32>,
    /// 块偏移
    pub chunk_offsets: Vec<u64>,
    /// 采样→块映射
    pub chunk_runs: Vec<ChunkRun>,
    /// 时间增量
    pub duration_runs: Vec<DurationRun>,
}

/// 表项数的合理性检查: 每个表项至少占 `entry_size` 字节
fn check_entry_count(count: u32, entry_size: u64, remaining: u64, name: &str) -> YinResult<()> {
    if u64::from(count) * entry_size > remaining {
        return Err(YinError::InvalidStream(format!(
            "{name}: 表项数 {count} 超出 box 大小",
        )));
    }
    Ok(())
}

impl RawTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析 stsz (Sample Size Box)
    ///
    /// 统一大小时, 声明的采样总字节数不得超过 `source_size`.
    pub fn parse_stsz(
        &mut self,
        io: &mut IoContext,
        content_size: u64,
        source_size: u64,
    ) -> YinResult<()> {
        read_full_box_header(io)?;
        let sample_size = io.read_u32_be()?;
        let sample_count = io.read_u32_be()?;

        if sample_size != 0 {
            if u64::from(sample_size) * u64::from(sample_count) > source_size {
                return Err(YinError::InvalidStream(format!(
                    "stsz: {sample_count} 个 {sample_size} 字节的采样超出数据源大小 {source_size}",
                )));
            }
            self.sample_sizes = vec![sample_size; sample_count as usize];
        } else {
            check_entry_count(sample_count, 4, content_size.saturating_sub(12), "stsz")?;
            let mut sizes = Vec::with_capacity(sample_count as usize);
            for _ in 0..sample_count {
                sizes.push(io.read_u32_be()?);
            }
            self.sample_sizes = sizes;
        }
        Ok(())
    }

    /// 解析 stco/co64 (Chunk Offset Box)
    pub fn parse_chunk_offsets(
        &mut self,
        io: &mut IoContext,
        content_size: u64,
        is_64bit: bool,
    ) -> YinResult<()> {
        read_full_box_header(io)?;
        let entry_count = io.read_u32_be()?;
        let entry_size = if is_64bit { 8 } else { 4 };
        check_entry_count(entry_count, entry_size, content_size.saturating_sub(8), "stco")?;

        let mut offsets = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            let offset = if is_64bit {
                io.read_u64_be()?
            } else {
                u64::from(io.read_u32_be()?)
            };
            offsets.push(offset);
        }
        self.chunk_offsets = offsets;
        Ok(())
    }

    /// 解析 stsc (Sample-to-Chunk Box)
    pub fn parse_stsc(&mut self, io: &mut IoContext, content_size: u64) -> YinResult<()> {
        read_full_box_header(io)?;
        let entry_count = io.read_u32_be()?;
        check_entry_count(entry_count, 12, content_size.saturating_sub(8), "stsc")?;

        let mut runs = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            let first_chunk = io.read_u32_be()?;
            let samples_per_chunk = io.read_u32_be()?;
            let _sample_desc_idx = io.read_u32_be()?;
            runs.push(ChunkRun {
                first_chunk,
                samples_per_chunk,
            });
        }
        self.chunk_runs = runs;
        Ok(())
    }

    /// 解析 stts (Time-to-Sample Box)
    pub fn parse_stts(&mut self, io: &mut IoContext, content_size: u64) -> YinResult<()> {
        read_full_box_header(io)?;
        let entry_count = io.read_u32_be()?;
        check_entry_count(entry_count, 8, content_size.saturating_sub(8), "stts")?;

        let mut runs = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            let count = io.read_u32_be()?;
            let delta = io.read_u32_be()?;
            runs.push(DurationRun { count, delta });
        }
        self.duration_runs = runs;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_box_content(body: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8, 0, 0, 0];
        data.extend_from_slice(body);
        data
    }

    fn u32s(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    #[test]
    fn test_stts_解析() {
        let data = full_box_content(&u32s(&[2, 100, 1024, 50, 512]));
        let len = data.len() as u64;
        let mut io = IoContext::from_memory(data);
        let mut raw = RawTables::new();
        raw.parse_stts(&mut io, len).unwrap();

        assert_eq!(
            raw.duration_runs,
            vec![
                DurationRun {
                    count: 100,
                    delta: 1024
                },
                DurationRun {
                    count: 50,
                    delta: 512
                },
            ]
        );
    }

    #[test]
    fn test_stsz_解析() {
        let data = full_box_content(&u32s(&[0, 3, 100, 200, 150]));
        let len = data.len() as u64;
        let mut io = IoContext::from_memory(data);
        let mut raw = RawTables::new();
        raw.parse_stsz(&mut io, len, u64::MAX).unwrap();
        assert_eq!(raw.sample_sizes, vec![100, 200, 150]);
    }

    #[test]
    fn test_stsz_统一大小展开() {
        let data = full_box_content(&u32s(&[371, 500]));
        let len = data.len() as u64;
        let mut io = IoContext::from_memory(data);
        let mut raw = RawTables::new();
        raw.parse_stsz(&mut io, len, u64::MAX).unwrap();
        assert_eq!(raw.sample_sizes.len(), 500);
        assert!(raw.sample_sizes.iter().all(|&s| s == 371));
    }

    #[test]
    fn test_stsz_统一大小超出数据源() {
        let data = full_box_content(&u32s(&[1, 50_000_000]));
        let len = data.len() as u64;
        let mut io = IoContext::from_memory(data);
        let mut raw = RawTables::new();
        assert!(matches!(
            raw.parse_stsz(&mut io, len, 4096),
            Err(YinError::InvalidStream(_))
        ));
        assert!(raw.sample_sizes.is_empty());
    }

    #[test]
    fn test_stsc_解析() {
        let data = full_box_content(&u32s(&[2, 1, 2, 1, 3, 1, 1]));
        let len = data.len() as u64;
        let mut io = IoContext::from_memory(data);
        let mut raw = RawTables::new();
        raw.parse_stsc(&mut io, len).unwrap();
        assert_eq!(
            raw.chunk_runs,
            vec![
                ChunkRun {
                    first_chunk: 1,
                    samples_per_chunk: 2
                },
                ChunkRun {
                    first_chunk: 3,
                    samples_per_chunk: 1
                },
            ]
        );
    }

    #[test]
    fn test_co64_解析() {
        let mut body = u32s(&[2]);
        body.extend_from_slice(&0x1_0000_0000u64.to_be_bytes());
        body.extend_from_slice(&48u64.to_be_bytes());
        let data = full_box_content(&body);
        let len = data.len() as u64;
        let mut io = IoContext::from_memory(data);
        let mut raw = RawTables::new();
        raw.parse_chunk_offsets(&mut io, len, true).unwrap();
        assert_eq!(raw.chunk_offsets, vec![0x1_0000_0000, 48]);
    }

    #[test]
    fn test_表项数超出_box() {
        let data = full_box_content(&u32s(&[1_000_000, 1, 2, 1]));
        let len = data.len() as u64;
        let mut io = IoContext::from_memory(data);
        let mut raw = RawTables::new();
        assert!(matches!(
            raw.parse_stsc(&mut io, len),
            Err(YinError::InvalidStream(_))
        ));
    }
}
