//! 基于 symphonia 的 AAC 解码引擎.

use log::debug;
use symphonia_codec_aac::AacDecoder as SymAacDecoder;
use symphonia_core::audio::SampleBuffer;
use symphonia_core::codecs::{
    CODEC_TYPE_AAC, CodecParameters as SymCodecParameters, Decoder as SymDecoderTrait,
    DecoderOptions as SymDecoderOptions,
};
use symphonia_core::formats::Packet as SymPacket;
use yin_core::EngineError;

use crate::codec_config::AudioSpecificConfig;
use crate::engine::{EngineBackend, FrameDecodeEngine, StreamParams};

/// AAC-LC 每帧采样数
const SAMPLES_PER_FRAME: u64 = 1024;

/// symphonia AAC 解码引擎
pub struct SymphoniaAacEngine {
    /// symphonia 解码器, `init()` 之后可用
    decoder: Option<SymAacDecoder>,
    /// 初始化得到的流参数
    params: Option<StreamParams>,
    /// 已送入的帧数, 用作时间戳
    next_ts: u64,
    /// 是否已销毁
    closed: bool,
}

impl SymphoniaAacEngine {
    pub fn new() -> Self {
        Self {
            decoder: None,
            params: None,
            next_ts: 0,
            closed: false,
        }
    }
}

impl Default for SymphoniaAacEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecodeEngine for SymphoniaAacEngine {
    fn name(&self) -> &str {
        "symphonia-aac"
    }

    fn init(&mut self, config: &[u8]) -> Result<StreamParams, EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        if config.is_empty() {
            return Err(EngineError::InvalidConfig("配置为空".into()));
        }

        let asc = AudioSpecificConfig::parse(config)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        let sample_rate = asc.sample_rate.ok_or_else(|| {
            EngineError::InvalidConfig(format!(
                "保留的采样率索引: {}",
                asc.sampling_frequency_index
            ))
        })?;

        let mut sym_params = SymCodecParameters::new();
        sym_params
            .for_codec(CODEC_TYPE_AAC)
            .with_sample_rate(sample_rate)
            .with_extra_data(config.to_vec().into_boxed_slice());

        let decoder = SymAacDecoder::try_new(&sym_params, &SymDecoderOptions::default())
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;

        // 声道配置 0 表示由 PCE 描述, 先按立体声报告, 首帧解码后以实际值为准
        let channels = match asc.channel_configuration {
            0 => 2,
            7 => 8,
            n => u32::from(n),
        };
        let params = StreamParams {
            sample_rate,
            channels,
        };
        debug!(
            "symphonia AAC 引擎初始化: object_type={}, {} Hz, {} 声道",
            asc.object_type, sample_rate, channels,
        );

        self.decoder = Some(decoder);
        self.params = Some(params);
        self.next_ts = 0;
        Ok(params)
    }

    fn decode(&mut self, frame: &[u8]) -> Result<Vec<i16>, EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        let decoder = self.decoder.as_mut().ok_or(EngineError::NotInitialized)?;
        if frame.is_empty() {
            return Err(EngineError::EmptyFrame);
        }

        let sym_pkt = SymPacket::new_from_slice(0, self.next_ts, SAMPLES_PER_FRAME, frame);
        self.next_ts += SAMPLES_PER_FRAME;

        let decoded = decoder
            .decode(&sym_pkt)
            .map_err(|e| EngineError::DecodeFailed(e.to_string()))?;
        let spec = *decoded.spec();
        if decoded.frames() == 0 {
            return Ok(Vec::new());
        }
        let mut sample_buf = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        Ok(sample_buf.samples().to_vec())
    }

    fn destroy(&mut self) {
        if self.closed {
            return;
        }
        self.decoder = None;
        self.params = None;
        self.closed = true;
    }
}

/// symphonia 后端
///
/// symphonia 是进程内的纯 Rust 实现, 加载与卸载只是状态标记.
pub struct SymphoniaBackend {
    loaded: bool,
}

impl SymphoniaBackend {
    pub fn new() -> Self {
        Self { loaded: false }
    }
}

impl Default for SymphoniaBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBackend for SymphoniaBackend {
    fn name(&self) -> &str {
        "symphonia"
    }

    fn load(&mut self) -> Result<(), EngineError> {
        self.loaded = true;
        Ok(())
    }

    fn create_engine(&self) -> Result<Box<dyn FrameDecodeEngine>, EngineError> {
        if !self.loaded {
            return Err(EngineError::NotInitialized);
        }
        Ok(Box::new(SymphoniaAacEngine::new()))
    }

    fn unload(&mut self) {
        self.loaded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec_config::CodecConfig;

    #[test]
    fn test_init_报告流参数() {
        let mut engine = SymphoniaAacEngine::new();
        let params = engine
            .init(CodecConfig::from_parts(2, 4, 2).as_bytes())
            .unwrap();
        assert_eq!(
            params,
            StreamParams {
                sample_rate: 44100,
                channels: 2
            }
        );
    }

    #[test]
    fn test_空配置() {
        let mut engine = SymphoniaAacEngine::new();
        assert!(matches!(engine.init(&[]), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_调用顺序约束() {
        let mut engine = SymphoniaAacEngine::new();
        assert_eq!(engine.decode(&[0x21]), Err(EngineError::NotInitialized));

        engine.init(CodecConfig::from_parts(2, 3, 1).as_bytes()).unwrap();
        assert_eq!(engine.decode(&[]), Err(EngineError::EmptyFrame));

        engine.destroy();
        engine.destroy();
        assert_eq!(engine.decode(&[0x21]), Err(EngineError::Closed));
        assert!(matches!(engine.init(&[0x12, 0x10]), Err(EngineError::Closed)));
    }

    #[test]
    fn test_后端需先加载() {
        let mut backend = SymphoniaBackend::new();
        assert!(matches!(
            backend.create_engine(),
            Err(EngineError::NotInitialized)
        ));
        backend.load().unwrap();
        assert!(backend.create_engine().is_ok());
    }
}
