//! 读取器配置.
//!
//! 所有字段都有默认值, JSON 中缺省的字段取默认值:
//! ```json
//! { "resync_window": 16384 }
//! ```

use serde::{Deserialize, Serialize};
use yin_core::{YinError, YinResult};
use yin_format::adts::{ADTS_HEADER_SIZE, DEFAULT_RESYNC_WINDOW};
use yin_format::mp4::DEFAULT_SAMPLE_DURATION;

/// 读取器选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// ADTS 失步时向前搜索同步字的窗口大小 (字节)
    pub resync_window: usize,
    /// 容器 stts 未覆盖的采样使用的时长 (时间刻度单位)
    pub fallback_sample_duration: u32,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            resync_window: DEFAULT_RESYNC_WINDOW,
            fallback_sample_duration: DEFAULT_SAMPLE_DURATION,
        }
    }
}

impl ReaderOptions {
    /// 从 JSON 文本解析
    pub fn from_json(text: &str) -> YinResult<Self> {
        let options: Self = serde_json::from_str(text)
            .map_err(|e| YinError::InvalidArgument(format!("读取器选项解析失败: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    /// 检查取值范围
    pub fn validate(&self) -> YinResult<()> {
        if self.resync_window <= ADTS_HEADER_SIZE {
            return Err(YinError::InvalidArgument(format!(
                "resync_window 必须大于 {ADTS_HEADER_SIZE}, 实际为 {}",
                self.resync_window,
            )));
        }
        if self.fallback_sample_duration == 0 {
            return Err(YinError::InvalidArgument(
                "fallback_sample_duration 不能为 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_默认值() {
        let options = ReaderOptions::default();
        assert_eq!(options.resync_window, 8192);
        assert_eq!(options.fallback_sample_duration, 1024);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_json_部分字段() {
        let options = ReaderOptions::from_json(r#"{ "resync_window": 16384 }"#).unwrap();
        assert_eq!(options.resync_window, 16384);
        assert_eq!(options.fallback_sample_duration, 1024);
        assert_eq!(ReaderOptions::from_json("{}").unwrap(), ReaderOptions::default());
    }

    #[test]
    fn test_json_非法取值() {
        assert!(matches!(
            ReaderOptions::from_json(r#"{ "resync_window": 4 }"#),
            Err(YinError::InvalidArgument(_))
        ));
        assert!(matches!(
            ReaderOptions::from_json(r#"{ "fallback_sample_duration": 0 }"#),
            Err(YinError::InvalidArgument(_))
        ));
        assert!(matches!(
            ReaderOptions::from_json("not json"),
            Err(YinError::InvalidArgument(_))
        ));
    }
}
