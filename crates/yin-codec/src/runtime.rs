//! 引擎运行时生命周期.
//!
//! 后端的加载代价较高 (需要实例化隔离环境), 因此进程内共享一份, 首次使用时加载,
//! 显式 `shutdown()` 后回到未初始化状态, 下次使用时重新加载.
//!
//! 状态转换: `Uninitialized -> Ready -> ShuttingDown -> Uninitialized`.
//! 所有转换都在同一把互斥锁内完成, 并发的首次访问只会触发一次加载.

use std::sync::{Mutex, MutexGuard};

use log::debug;
use yin_core::EngineError;

use crate::engine::{EngineBackend, FrameDecodeEngine};

/// 运行时状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    /// 后端尚未加载
    Uninitialized,
    /// 后端已加载, 可以创建引擎
    Ready,
    /// 正在卸载后端
    ShuttingDown,
}

struct Inner {
    state: RuntimeState,
    backend: Box<dyn EngineBackend>,
}

/// 引擎运行时
///
/// 包装一个 [`EngineBackend`], 负责按需加载, 创建引擎实例和卸载.
/// 已创建的引擎实例由各自的读取器持有, 不受 `shutdown()` 影响.
pub struct EngineRuntime {
    inner: Mutex<Inner>,
}

impl EngineRuntime {
    /// 以指定后端创建运行时 (不会立即加载)
    pub fn new(backend: Box<dyn EngineBackend>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: RuntimeState::Uninitialized,
                backend,
            }),
        }
    }

    /// 以 symphonia AAC 后端创建运行时
    #[cfg(feature = "symphonia-backend")]
    pub fn symphonia() -> Self {
        Self::new(Box::new(crate::decoders::SymphoniaBackend::new()))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // 卸载过程中 panic 时锁被污染, 内部状态仍然一致, 继续使用
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 当前状态
    pub fn state(&self) -> RuntimeState {
        self.lock().state
    }

    /// 后端名称
    pub fn backend_name(&self) -> String {
        self.lock().backend.name().to_string()
    }

    /// 确保后端已加载
    ///
    /// 已加载时为空操作. 加载失败时保持 `Uninitialized`, 下次调用会重试.
    pub fn acquire(&self) -> Result<(), EngineError> {
        let mut inner = self.lock();
        Self::ensure_loaded(&mut inner)
    }

    fn ensure_loaded(inner: &mut Inner) -> Result<(), EngineError> {
        if inner.state == RuntimeState::Ready {
            return Ok(());
        }
        debug!("加载解码引擎后端: {}", inner.backend.name());
        inner.backend.load()?;
        inner.state = RuntimeState::Ready;
        Ok(())
    }

    /// 创建一个新的引擎实例, 必要时先加载后端
    pub fn create_engine(&self) -> Result<Box<dyn FrameDecodeEngine>, EngineError> {
        let mut inner = self.lock();
        Self::ensure_loaded(&mut inner)?;
        inner.backend.create_engine()
    }

    /// 卸载后端
    ///
    /// 未加载时为空操作. 之后的 `acquire()`/`create_engine()` 会重新加载.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        if inner.state != RuntimeState::Ready {
            return;
        }
        inner.state = RuntimeState::ShuttingDown;
        debug!("卸载解码引擎后端: {}", inner.backend.name());
        inner.backend.unload();
        inner.state = RuntimeState::Uninitialized;
    }
}

impl std::fmt::Debug for EngineRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("EngineRuntime")
            .field("backend", &inner.backend.name())
            .field("state", &inner.state)
            .finish()
    }
}
