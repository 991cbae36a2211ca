//! 比特流读取器.
//!
//! 按大端位序 (MSB first) 从字节缓冲区读取任意宽度的位字段.
//! AudioSpecificConfig 就是这种布局.

use crate::{YinError, YinResult};

/// 比特流读取器
///
/// # 示例
/// ```
/// use yin_core::bitreader::BitReader;
///
/// let data = [0x12, 0x10];
/// let mut br = BitReader::new(&data);
/// assert_eq!(br.read_bits(5).unwrap(), 2);
/// assert_eq!(br.read_bits(4).unwrap(), 4);
/// ```
pub struct BitReader<'a> {
    data: &'a [u8],
    /// 已读取的位数
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// 创建新的比特流读取器
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// 已读取的位数
    pub fn bits_read(&self) -> usize {
        self.pos
    }

    /// 剩余可读位数
    pub fn bits_left(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.pos)
    }

    /// 读取 N 个位 (最多 32 位), 返回值的低 N 位有效
    ///
    /// 剩余位数不足时返回 `Eof`, 且不移动读取位置.
    pub fn read_bits(&mut self, n: u32) -> YinResult<u32> {
        if n > 32 {
            return Err(YinError::InvalidArgument(format!(
                "read_bits: n={n} 超过 32 位"
            )));
        }
        if n as usize > self.bits_left() {
            return Err(YinError::Eof);
        }

        let mut value = 0u64;
        for _ in 0..n {
            let byte = self.data[self.pos / 8];
            let bit = (byte >> (7 - self.pos % 8)) & 1;
            value = (value << 1) | u64::from(bit);
            self.pos += 1;
        }
        Ok(value as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits_跨字节() {
        // profile=1, sfi=4, private=0, cc=2 (ADTS 第 3-4 字节)
        let data = [0x50, 0x80];
        let mut br = BitReader::new(&data);

        assert_eq!(br.read_bits(2).unwrap(), 1);
        assert_eq!(br.read_bits(4).unwrap(), 4);
        assert_eq!(br.read_bits(1).unwrap(), 0);
        assert_eq!(br.read_bits(3).unwrap(), 2);
        assert_eq!(br.bits_read(), 10);
        assert_eq!(br.bits_left(), 6);
    }

    #[test]
    fn test_read_bits_32_bit() {
        let data = [0xFF, 0x00, 0xFF, 0x00];
        let mut br = BitReader::new(&data);
        assert!(matches!(br.read_bits(33), Err(YinError::InvalidArgument(_))));
        assert_eq!(br.read_bits(32).unwrap(), 0xFF00FF00);
        assert_eq!(br.read_bits(0).unwrap(), 0);
    }

    #[test]
    fn test_不足时不移动位置() {
        let data = [0xA5];
        let mut br = BitReader::new(&data);
        br.read_bits(5).unwrap();
        assert!(matches!(br.read_bits(4), Err(YinError::Eof)));
        assert_eq!(br.bits_read(), 5);
        assert_eq!(br.read_bits(3).unwrap(), 0b101);
    }
}
