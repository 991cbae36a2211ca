//! # yin-codec
//!
//! Yin 音频流框架解码层, 定义逐帧解码引擎的抽象以及引擎运行时的生命周期管理.
//!
//! 读取器只通过 [`FrameDecodeEngine`] 与解码算法交互: 送入一帧压缩数据,
//! 取回交织的 16 位 PCM. 解码算法本身以及承载它的隔离技术 (进程, 沙箱, 原生库)
//! 都由 [`EngineBackend`] 的实现提供.
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use yin_codec::{CodecConfig, EngineRuntime};
//!
//! # fn main() -> Result<(), yin_core::EngineError> {
//! let runtime = EngineRuntime::symphonia();
//! let mut engine = runtime.create_engine()?;
//! let params = engine.init(CodecConfig::from_parts(2, 4, 2).as_bytes())?;
//! assert_eq!(params.sample_rate, 44100);
//! # Ok(())
//! # }
//! ```

pub mod codec_config;
pub mod decoders;
pub mod engine;
pub mod packet;
pub mod runtime;

// 重导出常用类型
pub use codec_config::{AudioSpecificConfig, CodecConfig, sample_rate_for_index};
pub use engine::{EngineBackend, FrameDecodeEngine, StreamParams};
pub use packet::Packet;
pub use runtime::{EngineRuntime, RuntimeState};
