//! 统一错误类型定义.
//!
//! 所有 Yin crate 共用的错误类型. 解码引擎自身的失败单独用 [`EngineError`] 描述,
//! 读取器在向上传播时原样保留, 只额外附加出错的帧序号.

use thiserror::Error;

/// 解码引擎错误
///
/// 由 `yin-codec` 中各解码引擎实现返回.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// 编解码器配置 (AudioSpecificConfig) 无效
    #[error("无效的编解码器配置: {0}")]
    InvalidConfig(String),

    /// 帧解码失败
    #[error("帧解码失败: {0}")]
    DecodeFailed(String),

    /// 送入了空帧
    #[error("送入的 AAC 帧为空")]
    EmptyFrame,

    /// 引擎内存分配失败
    #[error("引擎内存分配失败: {0}")]
    OutOfMemory(String),

    /// 引擎尚未初始化
    #[error("解码引擎尚未初始化")]
    NotInitialized,

    /// 引擎已销毁
    #[error("解码引擎已销毁")]
    Closed,
}

/// Yin 框架统一错误类型
#[derive(Debug, Error)]
pub enum YinError {
    /// 码流或表结构无效 (头部过短, 帧长非法等)
    #[error("无效码流: {0}")]
    InvalidStream(String),

    /// 在重同步窗口内未找到同步字
    #[error("未找到 ADTS 同步字 (已搜索 {searched} 字节)")]
    SyncNotFound {
        /// 已搜索的字节数
        searched: usize,
    },

    /// 读取器尚未成功打开
    #[error("读取器尚未初始化")]
    NotInitialized,

    /// 读取器已关闭
    #[error("读取器已关闭")]
    AlreadyClosed,

    /// 容器中没有可用的音频轨道
    #[error("容器中未找到音频轨道")]
    NoAudioTrack,

    /// 音频轨道的编码格式不受支持
    #[error("不支持的编码格式: {0}")]
    UnsupportedCodec(String),

    /// 缺少时间信息, 无法 seek
    #[error("当前流不支持 seek")]
    SeekUnavailable,

    /// 引擎初始化/创建阶段的错误
    #[error("解码引擎错误: {0}")]
    Engine(#[from] EngineError),

    /// 解码阶段的引擎错误, 附带帧序号
    #[error("第 {frame} 帧解码出错: {source}")]
    Decode {
        /// 出错帧的序号 (从 0 开始)
        frame: u64,
        /// 引擎返回的原始错误
        #[source]
        source: EngineError,
    },

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 已到达数据末尾
    #[error("已到达流末尾")]
    Eof,

    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),
}

impl YinError {
    /// 是否为数据耗尽 (包括底层 I/O 的 `UnexpectedEof`)
    pub fn is_eof(&self) -> bool {
        match self {
            Self::Eof => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }

    /// 若为引擎错误 (无论是否带帧序号), 返回原始引擎错误
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            Self::Engine(e) | Self::Decode { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

/// Yin 框架统一 Result 类型
pub type YinResult<T> = Result<T, YinError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eof_识别() {
        assert!(YinError::Eof.is_eof());
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short");
        assert!(YinError::from(io).is_eof());
        assert!(!YinError::SeekUnavailable.is_eof());
    }

    #[test]
    fn test_decode_错误保留引擎原因() {
        let err = YinError::Decode {
            frame: 7,
            source: EngineError::DecodeFailed("bad section".into()),
        };
        assert_eq!(
            err.engine_error(),
            Some(&EngineError::DecodeFailed("bad section".into()))
        );
        assert!(err.to_string().contains("第 7 帧"));
    }
}
