//! 逐帧解码引擎抽象.
//!
//! 解码引擎是外部协作者: 读取器只关心 "配置字节 -> 流参数" 与 "一帧 -> PCM" 两个操作.

use yin_core::EngineError;

/// 引擎初始化后报告的流参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 声道数
    pub channels: u32,
}

/// 逐帧解码引擎
///
/// 每个读取器独占一个引擎实例. 使用流程:
/// 1. `init()` 送入 AudioSpecificConfig
/// 2. 对每帧负载调用 `decode()`, 取回交织的 i16 PCM (长度为声道数的整数倍, 可能为空)
/// 3. `destroy()` 释放引擎, 之后的调用均返回 [`EngineError::Closed`]
pub trait FrameDecodeEngine: Send {
    /// 引擎名称
    fn name(&self) -> &str;

    /// 用解码器配置初始化引擎
    ///
    /// 配置为空或无法识别时返回 [`EngineError::InvalidConfig`].
    fn init(&mut self, config: &[u8]) -> Result<StreamParams, EngineError>;

    /// 解码一帧
    ///
    /// # 返回
    /// - `Err(EngineError::EmptyFrame)`: 送入了零长度帧
    /// - `Err(EngineError::NotInitialized)`: 尚未调用 `init()`
    /// - `Err(EngineError::DecodeFailed)`: 引擎内部解码失败
    fn decode(&mut self, frame: &[u8]) -> Result<Vec<i16>, EngineError>;

    /// 销毁引擎, 重复调用无副作用
    fn destroy(&mut self);
}

/// 引擎后端
///
/// 承载解码算法的隔离技术 (模块, 进程, 沙箱). 加载代价可能较高,
/// 由 [`EngineRuntime`](crate::runtime::EngineRuntime) 负责按需加载与卸载.
pub trait EngineBackend: Send {
    /// 后端名称
    fn name(&self) -> &str;

    /// 加载后端
    fn load(&mut self) -> Result<(), EngineError>;

    /// 从已加载的后端创建一个新的引擎实例
    fn create_engine(&self) -> Result<Box<dyn FrameDecodeEngine>, EngineError>;

    /// 卸载后端, 释放全部资源
    fn unload(&mut self);
}
