//! ADTS 裸流读取器.

use std::time::Duration;

use log::debug;
use yin_codec::{FrameDecodeEngine, Packet};
use yin_core::{YinError, YinResult};
use yin_format::{AdtsFrameReader, IoContext, Metadata};

use super::buffer::{FrameSource, PcmBuffer, ReadOutcome, fill_buffer};
use super::{AudioReader, units_to_duration};
use crate::options::ReaderOptions;

/// ADTS 裸流读取器
///
/// 打开时解析第一个帧头得到流参数, 并用第一帧预热解码引擎.
/// 裸流没有索引, 因此不支持 seek, 总时长未知.
pub struct ElementaryStreamReader {
    frames: AdtsFrameReader,
    /// 关闭后为 None
    engine: Option<Box<dyn FrameDecodeEngine>>,
    pending: PcmBuffer,
    sample_rate: u32,
    channels: u16,
    /// 已成功解码的帧数 (含预热帧)
    frames_decoded: u64,
    /// 已交给调用方的采样数 (交织计数)
    samples_delivered: u64,
}

/// 逐帧读取并解码
struct AdtsFrames<'a> {
    frames: &'a mut AdtsFrameReader,
    engine: &'a mut Box<dyn FrameDecodeEngine>,
    frames_decoded: &'a mut u64,
}

fn decode_packet(engine: &mut dyn FrameDecodeEngine, packet: &Packet) -> YinResult<Vec<i16>> {
    engine.decode(&packet.data).map_err(|source| YinError::Decode {
        frame: packet.index,
        source,
    })
}

impl FrameSource for AdtsFrames<'_> {
    fn next_frame(&mut self) -> YinResult<Option<Vec<i16>>> {
        let Some((_, packet)) = self.frames.next_frame()? else {
            return Ok(None);
        };
        let pcm = decode_packet(self.engine.as_mut(), &packet)?;
        *self.frames_decoded += 1;
        Ok(Some(pcm))
    }
}

impl ElementaryStreamReader {
    /// 打开 ADTS 裸流
    ///
    /// 空流返回 [`YinError::Eof`], 保留的采样率索引返回 [`YinError::InvalidStream`].
    /// 打开失败时引擎在返回前被销毁.
    pub fn open(
        io: IoContext,
        engine: Box<dyn FrameDecodeEngine>,
        options: &ReaderOptions,
    ) -> YinResult<Self> {
        let mut reader = Self {
            frames: AdtsFrameReader::with_resync_window(io, options.resync_window),
            engine: Some(engine),
            pending: PcmBuffer::new(),
            sample_rate: 0,
            channels: 0,
            frames_decoded: 0,
            samples_delivered: 0,
        };
        // 出错时 reader 被 drop, 引擎随之销毁
        options.validate().and_then(|()| reader.prime())?;
        Ok(reader)
    }

    /// 解析第一帧, 初始化引擎并解码第一帧
    fn prime(&mut self) -> YinResult<()> {
        let engine = self.engine.as_mut().ok_or(YinError::NotInitialized)?;

        self.frames.skip_id3v2()?;
        let (header, packet) = self.frames.next_frame()?.ok_or(YinError::Eof)?;
        let sample_rate = header.sample_rate().ok_or_else(|| {
            YinError::InvalidStream(format!(
                "保留的采样率索引: {}",
                header.sampling_frequency_index
            ))
        })?;

        let config = header.codec_config();
        let params = engine.init(config.as_bytes())?;

        self.sample_rate = sample_rate;
        self.channels = match header.channel_configuration {
            0 => params.channels as u16,
            7 => 8,
            n => u16::from(n),
        };

        let pcm = decode_packet(engine.as_mut(), &packet)?;
        self.frames_decoded = 1;
        if !pcm.is_empty() {
            self.pending.replace(pcm);
        }

        debug!(
            "ADTS: 打开成功, {} Hz, {} 声道, object_type={}, 预热输出 {} 个采样",
            self.sample_rate,
            self.channels,
            header.object_type(),
            self.pending.pending(),
        );
        Ok(())
    }

    /// 已解码的帧数 (含打开时的预热帧)
    pub fn frames_read(&self) -> u64 {
        self.frames_decoded
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.engine.is_none()
    }
}

impl AudioReader for ElementaryStreamReader {
    fn read(&mut self, out: &mut [i16]) -> YinResult<ReadOutcome> {
        let engine = self.engine.as_mut().ok_or(YinError::AlreadyClosed)?;
        let mut source = AdtsFrames {
            frames: &mut self.frames,
            engine,
            frames_decoded: &mut self.frames_decoded,
        };
        let outcome = fill_buffer(out, &mut self.pending, &mut source)?;
        self.samples_delivered += outcome.samples as u64;
        Ok(outcome)
    }

    fn seek(&mut self, _target: Duration) -> YinResult<()> {
        if self.is_closed() {
            return Err(YinError::AlreadyClosed);
        }
        Err(YinError::SeekUnavailable)
    }

    fn position(&self) -> Duration {
        let per_channel = self.samples_delivered / u64::from(self.channels.max(1));
        units_to_duration(per_channel, self.sample_rate)
    }

    fn duration(&self) -> Option<Duration> {
        None
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn metadata(&self) -> Metadata {
        Metadata::default()
    }

    fn close(&mut self) -> YinResult<()> {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
            self.pending.clear();
            debug!("ADTS: 读取器关闭, 共解码 {} 帧", self.frames_decoded);
        }
        Ok(())
    }
}

impl Drop for ElementaryStreamReader {
    fn drop(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }
    }
}
