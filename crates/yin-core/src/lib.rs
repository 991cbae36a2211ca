//! # yin-core
//!
//! Yin 音频流框架核心库, 提供统一错误类型和比特流读写工具.
//!
//! 上层的 `yin-codec` (解码引擎抽象) 与 `yin-format` (ADTS/MP4 解析) 都依赖本 crate.

pub mod bitreader;
pub mod bitwriter;
pub mod error;

// 重导出常用类型
pub use bitreader::BitReader;
pub use bitwriter::BitWriter;
pub use error::{EngineError, YinError, YinResult};
