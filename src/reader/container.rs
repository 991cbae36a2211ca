//! MP4/M4A 容器读取器.

use std::io::SeekFrom;
use std::time::Duration;

use log::{debug, warn};
use yin_codec::FrameDecodeEngine;
use yin_core::{YinError, YinResult};
use yin_format::mp4::{SampleTable, parse_container};
use yin_format::{IoContext, Metadata};

use super::buffer::{FrameSource, PcmBuffer, ReadOutcome, fill_buffer};
use super::{AudioReader, duration_to_units, units_to_duration};
use crate::options::ReaderOptions;

/// MP4/M4A 容器读取器
///
/// 打开时把整个数据源读入内存并重建采样表, 之后按采样表随机访问.
pub struct ContainerReader {
    io: IoContext,
    /// 关闭后为 None
    engine: Option<Box<dyn FrameDecodeEngine>>,
    table: SampleTable,
    pending: PcmBuffer,
    /// 下一个要解码的采样
    next_sample: usize,
    timescale: u32,
    sample_rate: u32,
    channels: u16,
    metadata: Metadata,
    major_brand: Option<String>,
}

/// 按采样表逐个读取并解码
struct TableFrames<'a> {
    io: &'a mut IoContext,
    engine: &'a mut Box<dyn FrameDecodeEngine>,
    table: &'a SampleTable,
    next_sample: &'a mut usize,
}

impl FrameSource for TableFrames<'_> {
    fn next_frame(&mut self) -> YinResult<Option<Vec<i16>>> {
        let index = *self.next_sample;
        let Some(desc) = self.table.get(index) else {
            return Ok(None);
        };
        *self.next_sample += 1;

        if desc.size == 0 {
            debug!("MP4: 采样 {index} 大小为 0, 跳过");
            return Ok(Some(Vec::new()));
        }

        let sample_end = desc.offset.saturating_add(u64::from(desc.size));
        let in_bounds = self.io.size().is_none_or(|total| sample_end <= total);
        let data = if in_bounds {
            self.io.seek(SeekFrom::Start(desc.offset))?;
            match self.io.read_bytes(desc.size as usize) {
                Ok(d) => Some(d),
                Err(e) if e.is_eof() => None,
                Err(e) => return Err(e),
            }
        } else {
            None
        };
        let Some(data) = data else {
            warn!(
                "MP4: 采样 {index} 超出数据末尾 (offset={}, size={})",
                desc.offset, desc.size,
            );
            *self.next_sample = self.table.len();
            return Ok(None);
        };

        let pcm = self.engine.decode(&data).map_err(|source| YinError::Decode {
            frame: index as u64,
            source,
        })?;
        Ok(Some(pcm))
    }
}

impl ContainerReader {
    /// 打开 MP4/M4A 容器
    ///
    /// 没有音频轨道或缺少解码配置时返回 [`YinError::NoAudioTrack`],
    /// 音频轨道不是 mp4a 时返回 [`YinError::UnsupportedCodec`].
    /// 打开失败时引擎在返回前被销毁.
    pub fn open(
        mut io: IoContext,
        mut engine: Box<dyn FrameDecodeEngine>,
        options: &ReaderOptions,
    ) -> YinResult<Self> {
        let parsed = options.validate().and_then(|()| {
            let data = io.read_to_end()?;
            let mut mem = IoContext::from_memory(data);
            let info = parse_container(&mut mem, options.fallback_sample_duration)?;
            let params = engine.init(info.config.as_bytes())?;
            Ok((mem, info, params))
        });
        let (mem, info, params) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                engine.destroy();
                return Err(e);
            }
        };

        let sample_rate = match info.sample_rate {
            0 => params.sample_rate,
            rate => rate,
        };
        let channels = match info.channels {
            0 => params.channels as u16,
            n => n,
        };
        debug!(
            "MP4: 打开成功, {} Hz, {} 声道, {} 个采样, 时长 {:?}",
            sample_rate,
            channels,
            info.table.len(),
            units_to_duration(info.total_duration(), info.timescale),
        );

        Ok(Self {
            io: mem,
            engine: Some(engine),
            table: info.table,
            pending: PcmBuffer::new(),
            next_sample: 0,
            timescale: info.timescale,
            sample_rate,
            channels,
            metadata: info.metadata,
            major_brand: info.major_brand,
        })
    }

    /// 采样 (帧) 总数
    pub fn sample_count(&self) -> usize {
        self.table.len()
    }

    /// 重建出的采样表
    pub fn sample_table(&self) -> &SampleTable {
        &self.table
    }

    /// 下一个要解码的采样序号
    pub fn current_sample(&self) -> usize {
        self.next_sample
    }

    /// 音频轨道的时间刻度
    pub fn timescale(&self) -> u32 {
        self.timescale
    }

    /// ftyp 主品牌
    pub fn major_brand(&self) -> Option<&str> {
        self.major_brand.as_deref()
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.engine.is_none()
    }
}

impl AudioReader for ContainerReader {
    fn read(&mut self, out: &mut [i16]) -> YinResult<ReadOutcome> {
        let engine = self.engine.as_mut().ok_or(YinError::AlreadyClosed)?;
        let mut source = TableFrames {
            io: &mut self.io,
            engine,
            table: &self.table,
            next_sample: &mut self.next_sample,
        };
        fill_buffer(out, &mut self.pending, &mut source)
    }

    /// 定位到第一个累计时长超过目标时间的采样
    ///
    /// 超出总时长的目标是合法的, 之后的读取直接返回流结束.
    fn seek(&mut self, target: Duration) -> YinResult<()> {
        if self.is_closed() {
            return Err(YinError::AlreadyClosed);
        }
        if self.timescale == 0 {
            return Err(YinError::SeekUnavailable);
        }
        let units = duration_to_units(target, self.timescale);
        self.next_sample = self.table.index_for_time(units);
        self.pending.clear();
        debug!("MP4: seek {:?} -> 采样 {}", target, self.next_sample);
        Ok(())
    }

    fn position(&self) -> Duration {
        units_to_duration(self.table.duration_before(self.next_sample), self.timescale)
    }

    fn duration(&self) -> Option<Duration> {
        if self.timescale == 0 {
            return None;
        }
        Some(units_to_duration(self.table.total_duration(), self.timescale))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    fn close(&mut self) -> YinResult<()> {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
            self.pending.clear();
            debug!("MP4: 读取器关闭, 停在采样 {}", self.next_sample);
        }
        Ok(())
    }
}

impl Drop for ContainerReader {
    fn drop(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }
    }
}
