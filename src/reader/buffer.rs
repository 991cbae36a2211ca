//! PCM 缓冲适配.
//!
//! 解码引擎每次输出一整帧的 PCM (长度不定, 可能为 0), 调用方则按任意大小的
//! 缓冲区拉取. [`fill_buffer`] 先消耗上次剩余的采样, 不够时继续从
//! [`FrameSource`] 取帧, 多出的部分留到下一次读取.

use yin_core::YinResult;

/// 逐帧 PCM 来源
pub trait FrameSource {
    /// 取出并解码下一帧, 数据耗尽时返回 `None`
    ///
    /// 返回的 PCM 为交织的 16 位采样, 可以为空 (如解码器起始延迟).
    fn next_frame(&mut self) -> YinResult<Option<Vec<i16>>>;
}

/// 单次读取的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// 写入调用方缓冲区的采样数 (交织计数, 立体声一对算 2 个)
    pub samples: usize,
    /// 流已结束且本次没有读到任何采样
    pub end_of_stream: bool,
}

impl ReadOutcome {
    /// 读到了 `samples` 个采样
    pub const fn data(samples: usize) -> Self {
        Self {
            samples,
            end_of_stream: false,
        }
    }

    /// 流结束
    pub const fn end() -> Self {
        Self {
            samples: 0,
            end_of_stream: true,
        }
    }

    /// 是否为流结束
    pub const fn is_end(&self) -> bool {
        self.samples == 0 && self.end_of_stream
    }
}

/// 上一帧未被取走的 PCM
#[derive(Debug, Default)]
pub struct PcmBuffer {
    leftover: Vec<i16>,
    consumed: usize,
}

impl PcmBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 尚未取走的采样数
    pub fn pending(&self) -> usize {
        self.leftover.len() - self.consumed
    }

    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }

    /// 丢弃剩余采样 (seek 后调用)
    pub fn clear(&mut self) {
        self.leftover.clear();
        self.consumed = 0;
    }

    /// 以一整帧替换缓冲内容
    pub fn replace(&mut self, pcm: Vec<i16>) {
        self.leftover = pcm;
        self.consumed = 0;
    }

    /// 尽量填充 `out`, 返回写入的采样数
    pub fn drain_into(&mut self, out: &mut [i16]) -> usize {
        let n = self.pending().min(out.len());
        out[..n].copy_from_slice(&self.leftover[self.consumed..self.consumed + n]);
        self.consumed += n;
        if self.consumed == self.leftover.len() {
            self.clear();
        }
        n
    }
}

/// 从剩余采样和帧来源填充 `out`
///
/// - `out` 为空时立即返回 0 个采样, 不视为流结束
/// - 来源耗尽时若已写入部分采样则正常返回, 否则返回流结束
pub fn fill_buffer<S>(
    out: &mut [i16],
    pending: &mut PcmBuffer,
    source: &mut S,
) -> YinResult<ReadOutcome>
where
    S: FrameSource + ?Sized,
{
    if out.is_empty() {
        return Ok(ReadOutcome::data(0));
    }

    let mut filled = pending.drain_into(out);
    while filled < out.len() {
        let Some(pcm) = source.next_frame()? else {
            return Ok(if filled == 0 {
                ReadOutcome::end()
            } else {
                ReadOutcome::data(filled)
            });
        };
        if pcm.is_empty() {
            continue;
        }
        pending.replace(pcm);
        filled += pending.drain_into(&mut out[filled..]);
    }
    Ok(ReadOutcome::data(filled))
}
