//! MP4 Box (Atom) 头部解析.
//!
//! ISO 14496-12 定义的 Box 结构:
//! ```text
//! Size:       4 bytes (big-endian, 含头部本身)
//! Type:       4 bytes (FourCC)
//! [ExtSize]:  8 bytes (仅当 Size==1 时存在, 64-bit 大小)
//! ```
//!
//! 特殊大小值:
//! - 0: Box 延伸到文件末尾
//! - 1: 使用 64-bit 扩展大小

use log::warn;
use yin_core::{YinError, YinResult};

use crate::io::IoContext;

/// Box 类型枚举 (读取音频轨道用到的 FourCC)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxType {
    /// ftyp - 文件类型
    Ftyp,
    /// moov - 影片元数据
    Moov,
    /// trak - 轨道
    Trak,
    /// mdia - 媒体
    Mdia,
    /// mdhd - 媒体头部
    Mdhd,
    /// hdlr - 处理器引用
    Hdlr,
    /// minf - 媒体信息
    Minf,
    /// stbl - 采样表
    Stbl,
    /// stsd - 采样描述
    Stsd,
    /// stts - 时间→采样映射
    Stts,
    /// stsc - 采样→块映射
    Stsc,
    /// stsz - 采样大小
    Stsz,
    /// stco - 块偏移 (32位)
    Stco,
    /// co64 - 块偏移 (64位)
    Co64,
    /// esds - 基本流描述符
    Esds,
    /// udta - 用户数据
    Udta,
    /// meta - 元数据
    Meta,
    /// ilst - iTunes 元数据列表
    Ilst,
    /// data - 元数据值
    Data,
    /// mdat - 媒体数据
    Mdat,
    /// 未知 box 类型
    Unknown([u8; 4]),
}

impl BoxType {
    /// 从 4 字节 FourCC 创建
    pub fn from_fourcc(fourcc: &[u8; 4]) -> Self {
        match fourcc {
            b"ftyp" => Self::Ftyp,
            b"moov" => Self::Moov,
            b"trak" => Self::Trak,
            b"mdia" => Self::Mdia,
            b"mdhd" => Self::Mdhd,
            b"hdlr" => Self::Hdlr,
            b"minf" => Self::Minf,
            b"stbl" => Self::Stbl,
            b"stsd" => Self::Stsd,
            b"stts" => Self::Stts,
            b"stsc" => Self::Stsc,
            b"stsz" => Self::Stsz,
            b"stco" => Self::Stco,
            b"co64" => Self::Co64,
            b"esds" => Self::Esds,
            b"udta" => Self::Udta,
            b"meta" => Self::Meta,
            b"ilst" => Self::Ilst,
            b"data" => Self::Data,
            b"mdat" => Self::Mdat,
            _ => Self::Unknown(*fourcc),
        }
    }
}

impl std::fmt::Display for BoxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(cc) => write!(f, "{}", String::from_utf8_lossy(cc)),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// 已解析的 Box 头部
#[derive(Debug)]
pub struct BoxHeader {
    /// Box 总大小 (含头部, 0 表示到文件末尾)
    pub size: u64,
    /// Box 类型
    pub box_type: BoxType,
    /// 原始 FourCC
    pub fourcc: [u8; 4],
    /// 头部大小 (8 或 16 字节)
    pub header_size: u64,
}

impl BoxHeader {
    /// 给定内容起始位置与父容器末尾, 计算本 box 的结束位置
    ///
    /// 大小为 0 的 box 延伸到父容器末尾; 超出父容器的部分被截断 (常见于未写完的文件).
    pub fn end(&self, content_start: u64, parent_end: u64) -> YinResult<u64> {
        if self.size == 0 {
            return Ok(parent_end);
        }
        if self.size < self.header_size {
            return Err(YinError::InvalidStream(format!(
                "box {} 大小 {} 小于头部",
                self.box_type, self.size,
            )));
        }
        let end = content_start.saturating_add(self.size - self.header_size);
        if end > parent_end {
            warn!(
                "MP4: box {} 超出父容器范围 ({} > {}), 截断处理",
                self.box_type, end, parent_end,
            );
            return Ok(parent_end);
        }
        Ok(end)
    }
}

/// 读取一个 Box 头部
pub fn read_box_header(io: &mut IoContext) -> YinResult<BoxHeader> {
    let size32 = io.read_u32_be()?;
    let fourcc = io.read_tag()?;
    let box_type = BoxType::from_fourcc(&fourcc);

    let (size, header_size) = if size32 == 1 {
        (io.read_u64_be()?, 16u64)
    } else {
        (u64::from(size32), 8u64)
    };

    Ok(BoxHeader {
        size,
        box_type,
        fourcc,
        header_size,
    })
}

/// 读取 FullBox 的 version 与 flags
pub fn read_full_box_header(io: &mut IoContext) -> YinResult<(u8, u32)> {
    let version = io.read_u8()?;
    let flags = io.read_bytes(3)?;
    let flags = (u32::from(flags[0]) << 16) | (u32::from(flags[1]) << 8) | u32::from(flags[2]);
    Ok((version, flags))
}

/// ftyp Box 数据
pub struct FtypBox {
    /// 主品牌
    pub major_brand: [u8; 4],
    /// 兼容品牌列表
    pub compatible_brands: Vec<[u8; 4]>,
}

impl FtypBox {
    /// 解析 ftyp box 内容
    pub fn parse(io: &mut IoContext, content_size: u64) -> YinResult<Self> {
        let major_brand = io.read_tag()?;
        let _minor_version = io.read_u32_be()?;

        let brand_count = (content_size.saturating_sub(8) / 4) as usize;
        let mut compatible_brands = Vec::with_capacity(brand_count);
        for _ in 0..brand_count {
            compatible_brands.push(io.read_tag()?);
        }

        Ok(Self {
            major_brand,
            compatible_brands,
        })
    }

    /// 获取主品牌字符串
    pub fn major_brand_str(&self) -> String {
        String::from_utf8_lossy(&self.major_brand).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_type_identify() {
        assert_eq!(BoxType::from_fourcc(b"ftyp"), BoxType::Ftyp);
        assert_eq!(BoxType::from_fourcc(b"esds"), BoxType::Esds);
        assert_eq!(BoxType::from_fourcc(b"ilst"), BoxType::Ilst);
        assert!(matches!(BoxType::from_fourcc(b"\xa9nam"), BoxType::Unknown(_)));
    }

    #[test]
    fn test_read_box_header() {
        let mut data = Vec::new();
        data.extend_from_slice(&20u32.to_be_bytes());
        data.extend_from_slice(b"ftyp");
        data.extend_from_slice(&[0u8; 12]);

        let mut io = IoContext::from_memory(data);
        let header = read_box_header(&mut io).unwrap();
        assert_eq!(header.box_type, BoxType::Ftyp);
        assert_eq!(header.size, 20);
        assert_eq!(header.header_size, 8);
        assert_eq!(header.end(8, 20).unwrap(), 20);
    }

    #[test]
    fn test_read_64bit_box_header() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(b"mdat");
        data.extend_from_slice(&1000u64.to_be_bytes());
        data.extend_from_slice(&[0u8; 984]);

        let mut io = IoContext::from_memory(data);
        let header = read_box_header(&mut io).unwrap();
        assert_eq!(header.box_type, BoxType::Mdat);
        assert_eq!(header.size, 1000);
        assert_eq!(header.header_size, 16);
        assert_eq!(header.end(16, 1000).unwrap(), 1000);
    }

    #[test]
    fn test_box_end_边界() {
        let header = BoxHeader {
            size: 0,
            box_type: BoxType::Mdat,
            fourcc: *b"mdat",
            header_size: 8,
        };
        assert_eq!(header.end(8, 500).unwrap(), 500);

        let oversized = BoxHeader {
            size: 100,
            box_type: BoxType::Trak,
            fourcc: *b"trak",
            header_size: 8,
        };
        assert_eq!(oversized.end(8, 50).unwrap(), 50);

        let undersized = BoxHeader {
            size: 4,
            box_type: BoxType::Unknown(*b"free"),
            fourcc: *b"free",
            header_size: 8,
        };
        assert!(matches!(
            undersized.end(8, 50),
            Err(YinError::InvalidStream(_))
        ));
    }

    #[test]
    fn test_ftyp_parse() {
        let mut content = Vec::new();
        content.extend_from_slice(b"M4A ");
        content.extend_from_slice(&0u32.to_be_bytes());
        content.extend_from_slice(b"isom");
        content.extend_from_slice(b"mp42");

        let len = content.len() as u64;
        let mut io = IoContext::from_memory(content);
        let ftyp = FtypBox::parse(&mut io, len).unwrap();
        assert_eq!(ftyp.major_brand_str(), "M4A ");
        assert_eq!(ftyp.compatible_brands, vec![*b"isom", *b"mp42"]);
    }
}
