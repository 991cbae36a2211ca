//! 集成测试共用的辅助工具: 确定性的假解码引擎, ADTS / M4A 码流构造.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use yin::codec::{
    AudioSpecificConfig, EngineBackend, EngineRuntime, FrameDecodeEngine, StreamParams,
};
use yin::core::EngineError;
use yin::format::AdtsHeader;

/// 假引擎每帧输出的每声道采样数
pub const FRAME_SAMPLES: usize = 1024;

/// 负载首字节为该值时假引擎报告解码失败
pub const BAD_FRAME_MARKER: u8 = 0xEE;

// ============================================================
// 假解码引擎
// ============================================================

/// 确定性的假解码引擎
///
/// 第一帧输出 0 个采样 (模拟解码器起始延迟), 之后每帧输出
/// `frame_samples * channels` 个采样, 值为负载首字节.
pub struct FakeEngine {
    frame_samples: usize,
    channels: u32,
    initialized: bool,
    destroyed: bool,
    decoded: u64,
    destroy_count: Arc<AtomicUsize>,
}

impl FakeEngine {
    pub fn new(destroy_count: Arc<AtomicUsize>) -> Self {
        Self::with_frame_samples(FRAME_SAMPLES, destroy_count)
    }

    /// 每帧每声道输出 `frame_samples` 个采样
    pub fn with_frame_samples(frame_samples: usize, destroy_count: Arc<AtomicUsize>) -> Self {
        Self {
            frame_samples,
            channels: 0,
            initialized: false,
            destroyed: false,
            decoded: 0,
            destroy_count,
        }
    }
}

impl FrameDecodeEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn init(&mut self, config: &[u8]) -> Result<StreamParams, EngineError> {
        if self.destroyed {
            return Err(EngineError::Closed);
        }
        let asc = AudioSpecificConfig::parse(config)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        let sample_rate = asc
            .sample_rate
            .ok_or_else(|| EngineError::InvalidConfig("保留的采样率".into()))?;
        self.channels = u32::from(asc.channel_configuration.max(1));
        self.initialized = true;
        Ok(StreamParams {
            sample_rate,
            channels: self.channels,
        })
    }

    fn decode(&mut self, frame: &[u8]) -> Result<Vec<i16>, EngineError> {
        if self.destroyed {
            return Err(EngineError::Closed);
        }
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        let Some(&first) = frame.first() else {
            return Err(EngineError::EmptyFrame);
        };
        if first == BAD_FRAME_MARKER {
            return Err(EngineError::DecodeFailed("坏帧".into()));
        }
        self.decoded += 1;
        if self.decoded == 1 {
            return Ok(Vec::new());
        }
        Ok(vec![i16::from(first); self.frame_samples * self.channels as usize])
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.destroy_count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// 创建一个假引擎以及它的销毁计数
pub fn fake_engine() -> (Box<dyn FrameDecodeEngine>, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    (Box::new(FakeEngine::new(Arc::clone(&count))), count)
}

/// 创建一个每帧每声道输出 `frame_samples` 个采样的假引擎
pub fn fake_engine_with_frame_samples(
    frame_samples: usize,
) -> (Box<dyn FrameDecodeEngine>, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let engine = FakeEngine::with_frame_samples(frame_samples, Arc::clone(&count));
    (Box::new(engine), count)
}

/// 产出假引擎的后端
#[derive(Default)]
pub struct FakeBackend {
    pub destroy_count: Arc<AtomicUsize>,
}

impl EngineBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    fn load(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn create_engine(&self) -> Result<Box<dyn FrameDecodeEngine>, EngineError> {
        Ok(Box::new(FakeEngine::new(Arc::clone(&self.destroy_count))))
    }

    fn unload(&mut self) {}
}

/// 使用假后端的运行时
pub fn fake_runtime() -> (EngineRuntime, Arc<AtomicUsize>) {
    let backend = FakeBackend::default();
    let count = Arc::clone(&backend.destroy_count);
    (EngineRuntime::new(Box::new(backend)), count)
}

// ============================================================
// ADTS 码流构造
// ============================================================

/// 第 `index` 帧的负载: 首字节为帧序号标记, 其余填充
pub fn frame_payload(index: usize, len: usize) -> Vec<u8> {
    let mut payload = vec![0x5A; len];
    payload[0] = (index % 200) as u8;
    payload
}

/// 构造一个 ADTS 帧 (AAC-LC)
pub fn adts_frame(sampling_frequency_index: u8, channels: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame =
        AdtsHeader::for_payload(1, sampling_frequency_index, channels, payload.len()).to_bytes();
    frame.extend_from_slice(payload);
    frame
}

/// 构造 `count` 帧 44.1kHz 立体声 ADTS 流, 负载长度在 60~90 字节间变化
pub fn adts_stream(count: usize) -> Vec<u8> {
    (0..count)
        .flat_map(|i| adts_frame(4, 2, &frame_payload(i, 60 + (i * 7) % 31)))
        .collect()
}

/// 构造 `count` 帧 44.1kHz 单声道 ADTS 流
pub fn adts_mono_stream(count: usize) -> Vec<u8> {
    (0..count)
        .flat_map(|i| adts_frame(4, 1, &frame_payload(i, 40 + (i * 5) % 23)))
        .collect()
}

// ============================================================
// M4A 构造
// ============================================================

pub fn build_box(fourcc: &[u8; 4], content: &[u8]) -> Vec<u8> {
    let mut data = ((8 + content.len()) as u32).to_be_bytes().to_vec();
    data.extend_from_slice(fourcc);
    data.extend_from_slice(content);
    data
}

pub fn build_fullbox(fourcc: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut content = vec![0, 0, 0, 0];
    content.extend_from_slice(body);
    build_box(fourcc, &content)
}

fn u32s(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

/// M4A 文件构造参数
pub struct M4aSpec {
    /// 每个采样的负载
    pub samples: Vec<Vec<u8>>,
    /// 每块采样数
    pub samples_per_chunk: usize,
    /// 每采样时长
    pub sample_delta: u32,
    /// mdhd 时间刻度
    pub timescale: u32,
    /// 采样描述格式
    pub format: [u8; 4],
    /// 处理器类型
    pub handler: [u8; 4],
    /// esds 中的 AudioSpecificConfig
    pub config: Vec<u8>,
    /// 标题标签
    pub title: Option<String>,
    /// 覆盖 stsz 中的采样大小: (采样序号, 声明大小)
    pub size_overrides: Vec<(usize, u32)>,
}

impl M4aSpec {
    /// 44.1kHz 立体声 AAC-LC, 每块 4 个采样
    pub fn aac(sample_count: usize) -> Self {
        Self {
            samples: (0..sample_count)
                .map(|i| frame_payload(i, 50 + i % 7))
                .collect(),
            samples_per_chunk: 4,
            sample_delta: 1024,
            timescale: 44100,
            format: *b"mp4a",
            handler: *b"soun",
            config: vec![0x12, 0x10],
            title: None,
            size_overrides: Vec::new(),
        }
    }
}

fn esds_content(config: &[u8]) -> Vec<u8> {
    let mut dsi = vec![0x05, config.len() as u8];
    dsi.extend_from_slice(config);
    let mut dcd = vec![0x04, (13 + dsi.len()) as u8, 0x40, 0x15];
    dcd.extend_from_slice(&[0; 11]);
    dcd.extend_from_slice(&dsi);
    let mut es = vec![0x03, (3 + dcd.len()) as u8, 0x00, 0x01, 0x00];
    es.extend_from_slice(&dcd);
    es
}

fn sample_entry(spec: &M4aSpec) -> Vec<u8> {
    let mut body = vec![0; 6];
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&[0; 8]);
    body.extend_from_slice(&2u16.to_be_bytes());
    body.extend_from_slice(&16u16.to_be_bytes());
    body.extend_from_slice(&[0; 4]);
    body.extend_from_slice(&(44100u32 << 16).to_be_bytes());
    if !spec.config.is_empty() {
        body.extend(build_fullbox(b"esds", &esds_content(&spec.config)));
    }
    build_box(&spec.format, &body)
}

/// 构造 ftyp + mdat + moov 布局的 M4A 文件
pub fn build_m4a(spec: &M4aSpec) -> Vec<u8> {
    let ftyp = build_box(b"ftyp", b"M4A \0\0\0\0M4A isom");
    let mdat_payload: Vec<u8> = spec.samples.concat();
    let mdat_start = (ftyp.len() + 8) as u32;

    // 块偏移
    let mut offsets = Vec::new();
    let mut pos = mdat_start;
    for chunk in spec.samples.chunks(spec.samples_per_chunk) {
        offsets.push(pos);
        pos += chunk.iter().map(|s| s.len() as u32).sum::<u32>();
    }

    let mut stsd = u32s(&[1]);
    stsd.extend(sample_entry(spec));

    let mut stsz = u32s(&[0, spec.samples.len() as u32]);
    let mut sizes: Vec<u32> = spec.samples.iter().map(|s| s.len() as u32).collect();
    for &(index, size) in &spec.size_overrides {
        sizes[index] = size;
    }
    stsz.extend(u32s(&sizes));

    let mut stco = u32s(&[offsets.len() as u32]);
    stco.extend(u32s(&offsets));

    let mut stbl = build_fullbox(b"stsd", &stsd);
    stbl.extend(build_fullbox(
        b"stts",
        &u32s(&[1, spec.samples.len() as u32, spec.sample_delta]),
    ));
    stbl.extend(build_fullbox(
        b"stsc",
        &u32s(&[1, 1, spec.samples_per_chunk as u32, 1]),
    ));
    stbl.extend(build_fullbox(b"stsz", &stsz));
    stbl.extend(build_fullbox(b"stco", &stco));

    let mut hdlr = u32s(&[0]);
    hdlr.extend_from_slice(&spec.handler);
    hdlr.extend_from_slice(&[0; 12]);

    let total = spec.samples.len() as u32 * spec.sample_delta;
    let mut mdia = build_fullbox(b"mdhd", &u32s(&[0, 0, spec.timescale, total, 0]));
    mdia.extend(build_fullbox(b"hdlr", &hdlr));
    mdia.extend(build_box(b"minf", &build_box(b"stbl", &stbl)));

    let mut moov = build_box(b"trak", &build_box(b"mdia", &mdia));
    if let Some(title) = &spec.title {
        let mut data = vec![0, 0, 0, 1, 0, 0, 0, 0];
        data.extend_from_slice(title.as_bytes());
        let ilst = build_box(b"ilst", &build_box(b"\xa9nam", &build_box(b"data", &data)));
        moov.extend(build_box(b"udta", &build_fullbox(b"meta", &ilst)));
    }

    let mut file = ftyp;
    file.extend(build_box(b"mdat", &mdat_payload));
    file.extend(build_box(b"moov", &moov));
    file
}
