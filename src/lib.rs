//! # Yin (音)
//!
//! 流式 AAC 读取框架.
//!
//! 支持两种输入:
//! - **ADTS 裸流**: 逐帧自描述, 顺序读取, 失步后在有限窗口内重新同步
//! - **MP4/M4A 容器**: 从 stsz/stco/stsc/stts 重建采样表, 支持按时间 seek
//!
//! 每一帧交给 [`FrameDecodeEngine`](codec::FrameDecodeEngine) 解码,
//! 解码输出再被整理成可按任意缓冲区大小拉取的 PCM 流.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use yin::codec::EngineRuntime;
//! use yin::{AudioReader, ReaderOptions};
//!
//! # fn main() -> yin::core::YinResult<()> {
//! let runtime = EngineRuntime::symphonia();
//! let mut reader = yin::open_file("song.m4a", &runtime, &ReaderOptions::default())?;
//! let mut pcm = vec![0i16; 4096];
//! loop {
//!     let outcome = reader.read(&mut pcm)?;
//!     if outcome.is_end() {
//!         break;
//!     }
//!     // 处理 pcm[..outcome.samples]
//! }
//! reader.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `yin-core` | 错误类型与比特流工具 |
//! | `yin-codec` | 解码引擎抽象与运行时 |
//! | `yin-format` | ADTS 与 MP4 解析 |

pub mod options;
pub mod reader;

use std::path::Path;

use log::debug;
use yin_codec::EngineRuntime;
use yin_core::YinResult;
use yin_format::{FormatId, IoContext, probe_input};

/// 核心类型与工具
pub use yin_core as core;

/// 解码引擎抽象
pub use yin_codec as codec;

/// 码流与容器解析
pub use yin_format as format;

pub use options::ReaderOptions;
pub use reader::{AudioReader, ContainerReader, ElementaryStreamReader, ReadOutcome};

/// 获取 Yin 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 打开 ADTS 裸流文件
pub fn open_elementary_stream(
    path: impl AsRef<Path>,
    runtime: &EngineRuntime,
    options: &ReaderOptions,
) -> YinResult<ElementaryStreamReader> {
    let io = IoContext::open_read(path)?;
    let engine = runtime.create_engine()?;
    ElementaryStreamReader::open(io, engine, options)
}

/// 打开 MP4/M4A 容器文件
pub fn open_container(
    path: impl AsRef<Path>,
    runtime: &EngineRuntime,
    options: &ReaderOptions,
) -> YinResult<ContainerReader> {
    let io = IoContext::open_read(path)?;
    let engine = runtime.create_engine()?;
    ContainerReader::open(io, engine, options)
}

/// 探测文件格式后打开对应的读取器
pub fn open_file(
    path: impl AsRef<Path>,
    runtime: &EngineRuntime,
    options: &ReaderOptions,
) -> YinResult<Box<dyn AudioReader>> {
    let path = path.as_ref();
    let mut io = IoContext::open_read(path)?;
    let filename = path.file_name().and_then(|name| name.to_str());
    let probe = probe_input(&mut io, filename)?;
    debug!("{}: 探测为 {} (score={})", path.display(), probe.format_id, probe.score);

    let engine = runtime.create_engine()?;
    let reader: Box<dyn AudioReader> = match probe.format_id {
        FormatId::AacAdts => Box::new(ElementaryStreamReader::open(io, engine, options)?),
        FormatId::Mp4 => Box::new(ContainerReader::open(io, engine, options)?),
    };
    Ok(reader)
}
