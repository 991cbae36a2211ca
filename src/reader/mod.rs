//! 音频读取器.
//!
//! - [`ElementaryStreamReader`]: ADTS 裸流, 只能顺序读取
//! - [`ContainerReader`]: MP4/M4A 容器, 支持按时间 seek
//!
//! 两者都通过 [`AudioReader`] 提供统一的拉取接口.

pub mod buffer;
pub mod container;
pub mod elementary;

use std::time::Duration;

use yin_core::YinResult;
use yin_format::Metadata;

pub use self::buffer::{FrameSource, PcmBuffer, ReadOutcome, fill_buffer};
pub use self::container::ContainerReader;
pub use self::elementary::ElementaryStreamReader;

/// 解码后 PCM 的拉取接口
///
/// 关闭后 `read`/`seek` 返回 [`YinError::AlreadyClosed`](yin_core::YinError::AlreadyClosed),
/// 重复 `close` 为空操作.
pub trait AudioReader: Send {
    /// 读取交织的 16 位 PCM 到 `out`
    ///
    /// 流结束时返回 `samples == 0 && end_of_stream`.
    fn read(&mut self, out: &mut [i16]) -> YinResult<ReadOutcome>;

    /// 定位到指定时间
    fn seek(&mut self, target: Duration) -> YinResult<()>;

    /// 当前播放位置
    fn position(&self) -> Duration;

    /// 总时长, 未知时为 `None`
    fn duration(&self) -> Option<Duration>;

    /// 采样率 (Hz)
    fn sample_rate(&self) -> u32;

    /// 声道数
    fn channels(&self) -> u16;

    /// 元数据标签
    fn metadata(&self) -> Metadata;

    /// 关闭读取器并释放解码引擎
    fn close(&mut self) -> YinResult<()>;
}

/// 将时间刻度单位换算为时长
pub(crate) fn units_to_duration(units: u64, timescale: u32) -> Duration {
    if timescale == 0 {
        return Duration::ZERO;
    }
    let nanos = u128::from(units) * 1_000_000_000 / u128::from(timescale);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// 将时长换算为时间刻度单位 (向下取整)
pub(crate) fn duration_to_units(duration: Duration, timescale: u32) -> u64 {
    let units = duration.as_nanos() * u128::from(timescale) / 1_000_000_000;
    u64::try_from(units).unwrap_or(u64::MAX)
}
