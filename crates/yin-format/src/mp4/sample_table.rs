//! 采样表构建 (第二遍).
//!
//! 纯函数: 由 [`RawTables`] 推导出按播放顺序排列的采样描述,
//! 每个采样带绝对文件偏移, 字节大小和时长.

use log::warn;

use super::tables::RawTables;

/// 缺少 stts 信息时的默认采样时长 (AAC 每帧 1024 个采样)
pub const DEFAULT_SAMPLE_DURATION: u32 = 1024;

/// 单个采样的位置与时长
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleDescriptor {
    /// 在文件中的绝对偏移
    pub offset: u64,
    /// 字节大小
    pub size: u32,
    /// 时长 (以轨道时间刻度为单位)
    pub duration: u32,
}

/// 采样表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleTable {
    samples: Vec<SampleDescriptor>,
}

impl SampleTable {
    /// 采样数
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 获取指定采样
    pub fn get(&self, index: usize) -> Option<&SampleDescriptor> {
        self.samples.get(index)
    }

    /// 全部采样
    pub fn samples(&self) -> &[SampleDescriptor] {
        &self.samples
    }

    /// 所有采样时长之和
    pub fn total_duration(&self) -> u64 {
        self.samples.iter().map(|s| u64::from(s.duration)).sum()
    }

    /// 前 `count` 个采样的时长之和
    pub fn duration_before(&self, count: usize) -> u64 {
        self.samples
            .iter()
            .take(count)
            .map(|s| u64::from(s.duration))
            .sum()
    }

    /// 查找播放到 `target` (时间刻度单位) 时应从哪个采样开始
    ///
    /// 返回第一个累计时长 (含自身) 超过 `target` 的采样索引; 超过总时长时返回 `len()`.
    pub fn index_for_time(&self, target: u64) -> usize {
        let mut acc = 0u64;
        for (i, sample) in self.samples.iter().enumerate() {
            let dur = u64::from(sample.duration);
            if acc + dur > target {
                return i;
            }
            acc += dur;
        }
        self.samples.len()
    }
}

/// 由原始表构建采样表
///
/// 规则:
/// 1. 采样大小表或块偏移表为空时返回空表
/// 2. stts 展开为逐样本时长, 缺失部分使用 `fallback_duration`
/// 3. 对第 i 个块 (0-based), 取最后一个满足 `first_chunk <= i + 1` 的 stsc 条目的每块采样数,
///    没有匹配条目时每块 1 个采样
/// 4. 块内采样从块偏移起依次累加大小; 采样大小表用尽即停止
/// 5. 某个采样的结束位置超出 u64 范围时停止构建, 只保留之前的采样
pub fn build_sample_table(raw: &RawTables, fallback_duration: u32) -> SampleTable {
    let sizes = &raw.sample_sizes;
    if sizes.is_empty() || raw.chunk_offsets.is_empty() {
        return SampleTable::default();
    }

    let durations: Vec<u32> = raw
        .duration_runs
        .iter()
        .flat_map(|run| std::iter::repeat_n(run.delta, run.count as usize))
        .take(sizes.len())
        .collect();

    let mut samples = Vec::with_capacity(sizes.len());
    let mut sample_idx = 0usize;

    'chunks: for (chunk_idx, &chunk_offset) in raw.chunk_offsets.iter().enumerate() {
        if sample_idx >= sizes.len() {
            break;
        }
        let chunk_number = chunk_idx as u64 + 1;
        let samples_in_chunk = raw
            .chunk_runs
            .iter()
            .rev()
            .find(|run| u64::from(run.first_chunk) <= chunk_number)
            .map_or(1, |run| run.samples_per_chunk);

        let mut offset = chunk_offset;
        for _ in 0..samples_in_chunk {
            let Some(&size) = sizes.get(sample_idx) else {
                break;
            };
            let Some(end) = offset.checked_add(u64::from(size)) else {
                warn!("MP4: 采样 {sample_idx} 偏移溢出 (块 {chunk_number}), 采样表截断");
                break 'chunks;
            };
            let duration = durations
                .get(sample_idx)
                .copied()
                .unwrap_or(fallback_duration);
            samples.push(SampleDescriptor {
                offset,
                size,
                duration,
            });
            offset = end;
            sample_idx += 1;
        }
    }

    SampleTable { samples }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp4::tables::{ChunkRun, DurationRun};

    fn raw(
        sizes: Vec<u32>,
        offsets: Vec<u64>,
        chunk_runs: &[(u32, u32)],
        duration_runs: &[(u32, u32)],
    ) -> RawTables {
        RawTables {
            sample_sizes: sizes,
            chunk_offsets: offsets,
            chunk_runs: chunk_runs
                .iter()
                .map(|&(first_chunk, samples_per_chunk)| ChunkRun {
                    first_chunk,
                    samples_per_chunk,
                })
                .collect(),
            duration_runs: duration_runs
                .iter()
                .map(|&(count, delta)| DurationRun { count, delta })
                .collect(),
        }
    }

    #[test]
    fn test_单块统一大小() {
        let table = build_sample_table(&raw(vec![200; 5], vec![1000], &[(1, 5)], &[]), 1024);
        assert_eq!(table.len(), 5);
        for (i, s) in table.samples().iter().enumerate() {
            assert_eq!(s.offset, 1000 + 200 * i as u64);
            assert_eq!(s.size, 200);
            assert_eq!(s.duration, DEFAULT_SAMPLE_DURATION);
        }
    }

    #[test]
    fn test_空表() {
        assert!(build_sample_table(&raw(vec![], vec![10], &[], &[]), 1024).is_empty());
        assert!(build_sample_table(&raw(vec![10], vec![], &[], &[]), 1024).is_empty());
    }

    #[test]
    fn test_多段_stsc() {
        // 块 1-2 每块 2 个采样, 块 3 起每块 1 个
        let table = build_sample_table(
            &raw(
                vec![10, 20, 30, 40, 50, 60],
                vec![1000, 2000, 3000, 4000],
                &[(1, 2), (3, 1)],
                &[(6, 1024)],
            ),
            1024,
        );
        let offsets: Vec<u64> = table.samples().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![1000, 1010, 2000, 2030, 3000, 4000]);
    }

    #[test]
    fn test_无_stsc_每块一个采样() {
        let table = build_sample_table(&raw(vec![7, 8, 9], vec![100, 200, 300], &[], &[]), 1024);
        let offsets: Vec<u64> = table.samples().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![100, 200, 300]);
    }

    #[test]
    fn test_首段起始块大于_1() {
        // 块 1 没有匹配条目, 按每块 1 个采样处理
        let table = build_sample_table(&raw(vec![5; 4], vec![0, 100], &[(2, 3)], &[]), 1024);
        let offsets: Vec<u64> = table.samples().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0, 100, 105, 110]);
    }

    #[test]
    fn test_时长展开与默认值() {
        let table = build_sample_table(
            &raw(vec![1; 5], vec![0], &[(1, 5)], &[(2, 1024), (1, 512)]),
            960,
        );
        let durations: Vec<u32> = table.samples().iter().map(|s| s.duration).collect();
        assert_eq!(durations, vec![1024, 1024, 512, 960, 960]);
        assert_eq!(table.total_duration(), 1024 * 2 + 512 + 960 * 2);
    }

    #[test]
    fn test_采样数受限于大小表() {
        // stsc 声明的采样多于 stsz
        let table = build_sample_table(&raw(vec![4; 3], vec![0, 50], &[(1, 2)], &[]), 1024);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(2).map(|s| s.offset), Some(50));
    }

    #[test]
    fn test_块不足时少于声明采样数() {
        let table = build_sample_table(&raw(vec![4; 10], vec![0, 50], &[(1, 2)], &[]), 1024);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_偏移溢出时截断() {
        let table = build_sample_table(
            &raw(vec![2, 16, 16], vec![u64::MAX - 4, 0], &[(1, 2)], &[]),
            1024,
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0).map(|s| s.offset), Some(u64::MAX - 4));

        let table = build_sample_table(
            &raw(vec![16, 16], vec![u64::MAX - 4], &[(1, 2)], &[]),
            1024,
        );
        assert!(table.is_empty());
    }

    #[test]
    fn test_index_for_time() {
        let table = build_sample_table(&raw(vec![1; 4], vec![0], &[(1, 4)], &[(4, 1000)]), 1024);
        assert_eq!(table.index_for_time(0), 0);
        assert_eq!(table.index_for_time(999), 0);
        assert_eq!(table.index_for_time(1000), 1);
        assert_eq!(table.index_for_time(3999), 3);
        assert_eq!(table.index_for_time(4000), 4);
        assert_eq!(table.index_for_time(u64::MAX / 2), 4);
        assert_eq!(table.duration_before(2), 2000);
    }
}
