//! 解码引擎实现.

#[cfg(feature = "symphonia-backend")]
pub mod symphonia;

#[cfg(feature = "symphonia-backend")]
pub use self::symphonia::{SymphoniaAacEngine, SymphoniaBackend};
