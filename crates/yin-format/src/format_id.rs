//! 输入格式标识符.

use std::fmt;

/// 可读取的输入格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatId {
    /// AAC 裸流 (ADTS)
    AacAdts,
    /// MPEG-4 Part 14 容器 (MP4/M4A)
    Mp4,
}

impl FormatId {
    /// 所有已知格式标识的列表
    pub const ALL: &[FormatId] = &[Self::AacAdts, Self::Mp4];

    /// 获取格式的人类可读名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AacAdts => "aac",
            Self::Mp4 => "mp4",
        }
    }

    /// 获取格式常用的文件扩展名
    pub const fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::AacAdts => &["aac", "adts"],
            Self::Mp4 => &["m4a", "mp4", "m4b"],
        }
    }

    /// 根据文件扩展名猜测格式
    ///
    /// # 参数
    /// - `ext`: 文件扩展名 (不含 `.`, 如 "aac", "m4a")
    pub fn from_extension(ext: &str) -> Option<FormatId> {
        let ext_lower = ext.to_lowercase();
        Self::ALL
            .iter()
            .find(|id| id.extensions().contains(&ext_lower.as_str()))
            .copied()
    }

    /// 从文件路径猜测格式
    pub fn from_filename(filename: &str) -> Option<FormatId> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
