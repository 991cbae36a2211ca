//! # yin-format
//!
//! Yin 音频流框架的码流与容器解析层.
//!
//! 提供两类输入的逐帧访问:
//! - [`adts`]: AAC ADTS 裸流, 顺序读取, 支持失步后的有限重同步
//! - [`mp4`]: MP4/M4A 容器, 先重建采样表再随机访问
//!
//! 以及统一的 I/O 抽象 ([`IoContext`]) 和格式探测 ([`probe`]).

pub mod adts;
pub mod format_id;
pub mod io;
pub mod metadata;
pub mod mp4;
pub mod probe;

// 重导出常用类型
pub use adts::{AdtsFrameReader, AdtsHeader, HeaderInfo, inspect_header};
pub use format_id::FormatId;
pub use io::{IoBackend, IoContext, MemoryBackend, StreamBackend};
pub use metadata::Metadata;
pub use mp4::{ContainerInfo, SampleDescriptor, SampleTable, build_sample_table, parse_container};
pub use probe::{FormatProbe, ProbeResult, ProbeScore, probe_data, probe_input};
