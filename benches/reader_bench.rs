//! Yin 读取路径性能基准测试.
//!
//! 覆盖 ADTS 帧头解析, ADTS 分帧, 采样表重建与 PCM 缓冲填充.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use yin::core::YinResult;
use yin::format::mp4::{ChunkRun, DurationRun, RawTables};
use yin::format::{AdtsFrameReader, AdtsHeader, IoContext, build_sample_table, inspect_header};
use yin::reader::{FrameSource, PcmBuffer, fill_buffer};

/// 构造 `count` 帧 44.1kHz 立体声 ADTS 流
fn make_adts_stream(count: usize) -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..count {
        let payload = vec![(i % 251) as u8; 200 + i % 150];
        data.extend(AdtsHeader::for_payload(1, 4, 2, payload.len()).to_bytes());
        data.extend_from_slice(&payload);
    }
    data
}

/// 构造一份约 10 分钟音频规模的原始采样表
fn make_raw_tables(samples: usize) -> RawTables {
    let sample_sizes: Vec<u32> = (0..samples).map(|i| 300 + (i % 97) as u32).collect();
    let chunks = samples.div_ceil(22);
    let mut offset = 40u64;
    let chunk_offsets = (0..chunks)
        .map(|_| {
            let start = offset;
            offset += 22 * 350;
            start
        })
        .collect();
    RawTables {
        sample_sizes,
        chunk_offsets,
        chunk_runs: vec![ChunkRun {
            first_chunk: 1,
            samples_per_chunk: 22,
        }],
        duration_runs: vec![DurationRun {
            count: samples as u32,
            delta: 1024,
        }],
    }
}

/// 每次产出固定大小 PCM 帧的数据源
struct ConstantSource {
    remaining: usize,
    frame: Vec<i16>,
}

impl FrameSource for ConstantSource {
    fn next_frame(&mut self) -> YinResult<Option<Vec<i16>>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(self.frame.clone()))
    }
}

fn bench_inspect_header(c: &mut Criterion) {
    let header = AdtsHeader::for_payload(1, 4, 2, 371).to_bytes();
    c.bench_function("adts_inspect_header", |b| {
        b.iter(|| inspect_header(black_box(&header)).unwrap());
    });
}

fn bench_adts_framing(c: &mut Criterion) {
    let data = make_adts_stream(2000);
    c.bench_function("adts_framing_2000", |b| {
        b.iter(|| {
            let mut reader = AdtsFrameReader::new(IoContext::from_memory(data.clone()));
            let mut frames = 0usize;
            while let Some((_, packet)) = reader.next_frame().unwrap() {
                frames += packet.data.len();
            }
            black_box(frames)
        });
    });
}

fn bench_sample_table(c: &mut Criterion) {
    let raw = make_raw_tables(26_000);
    c.bench_function("build_sample_table_26000", |b| {
        b.iter(|| build_sample_table(black_box(&raw), 1024));
    });

    let table = build_sample_table(&raw, 1024);
    c.bench_function("sample_table_index_for_time", |b| {
        b.iter(|| table.index_for_time(black_box(13_000 * 1024 + 17)));
    });
}

fn bench_fill_buffer(c: &mut Criterion) {
    c.bench_function("fill_buffer_odd_chunks", |b| {
        b.iter(|| {
            let mut source = ConstantSource {
                remaining: 500,
                frame: vec![7i16; 2048],
            };
            let mut pending = PcmBuffer::new();
            let mut out = vec![0i16; 3001];
            let mut total = 0usize;
            loop {
                let outcome = fill_buffer(&mut out, &mut pending, &mut source).unwrap();
                if outcome.is_end() {
                    break;
                }
                total += outcome.samples;
            }
            black_box(total)
        });
    });
}

criterion_group!(
    benches,
    bench_inspect_header,
    bench_adts_framing,
    bench_sample_table,
    bench_fill_buffer
);
criterion_main!(benches);
