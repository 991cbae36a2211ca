//! 比特流写入器.
//!
//! 与 [`BitReader`](crate::bitreader::BitReader) 对应, 按大端位序写入.
//! 用于重建 ADTS 帧头.

/// 比特流写入器
///
/// # 示例
/// ```
/// use yin_core::bitwriter::BitWriter;
///
/// let mut bw = BitWriter::new();
/// bw.write_bits(0xFFF, 12);
/// bw.write_bits(0b0001, 4);
/// assert_eq!(bw.finish(), vec![0xFF, 0xF1]);
/// ```
#[derive(Default)]
pub struct BitWriter {
    data: Vec<u8>,
    /// 已写入的位数
    len: usize,
}

impl BitWriter {
    /// 创建新的比特流写入器
    pub fn new() -> Self {
        Self::default()
    }

    /// 已写入的位数
    pub fn bits_written(&self) -> usize {
        self.len
    }

    /// 写入 `value` 的低 N 位 (最多 32 位), 高位在前
    pub fn write_bits(&mut self, value: u32, n: u32) {
        debug_assert!(n <= 32, "write_bits: n={n} 超过 32 位");
        for i in (0..n).rev() {
            if self.len % 8 == 0 {
                self.data.push(0);
            }
            if (value >> i) & 1 == 1 {
                let shift = 7 - self.len % 8;
                if let Some(last) = self.data.last_mut() {
                    *last |= 1 << shift;
                }
            }
            self.len += 1;
        }
    }

    /// 结束写入, 不足一字节的部分用 0 补齐
    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}
