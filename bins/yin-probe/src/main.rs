//! yin-probe - 音频信息探测工具
//!
//! 识别 ADTS 裸流或 MP4/M4A 容器, 输出流参数与元数据,
//! 可选解码全部音频并统计采样数.

mod logging;

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::Serialize;

use yin::codec::EngineRuntime;
use yin::format::{FormatId, IoContext, Metadata, probe_input};
use yin::{AudioReader, ReaderOptions};

/// Yin 音频信息探测工具
#[derive(Parser, Debug)]
#[command(name = "yin-probe", version, about = "流式 AAC 信息探测工具")]
struct Cli {
    /// 输入文件路径 (.aac / .m4a / .mp4)
    input: PathBuf,

    /// 解码全部音频并统计采样数
    #[arg(long)]
    decode: bool,

    /// 解码前先 seek 到指定秒数 (仅容器格式)
    #[arg(long, value_name = "SECONDS")]
    seek: Option<f64>,

    /// 每次读取的采样数
    #[arg(long, default_value_t = 4096)]
    buffer: usize,

    /// 读取器选项 JSON 文件
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// 输出 JSON 格式
    #[arg(long)]
    json: bool,

    /// 日志文件目录
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// 日志详细程度 (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ============================================================
// 输出结构体
// ============================================================

/// 完整探测结果
#[derive(Serialize)]
struct ProbeOutput {
    filename: String,
    format_name: String,
    probe_score: u32,
    sample_rate: u32,
    channels: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nb_samples: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    major_brand: Option<String>,
    #[serde(skip_serializing_if = "TagInfo::is_empty")]
    tags: TagInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    decode: Option<DecodeSummary>,
}

/// 元数据标签
#[derive(Serialize, Default)]
struct TagInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    genre: Option<String>,
}

impl TagInfo {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.artist.is_none()
            && self.album.is_none()
            && self.genre.is_none()
    }
}

impl From<Metadata> for TagInfo {
    fn from(meta: Metadata) -> Self {
        Self {
            title: meta.title,
            artist: meta.artist,
            album: meta.album,
            genre: meta.genre,
        }
    }
}

/// 解码统计
#[derive(Serialize)]
struct DecodeSummary {
    /// 交织采样总数
    total_samples: u64,
    /// 每声道采样数
    samples_per_channel: u64,
    /// 读取调用次数
    reads: u64,
    /// 解码的帧数 (仅 ADTS)
    #[serde(skip_serializing_if = "Option::is_none")]
    frames: Option<u64>,
    /// 结束时的播放位置 (秒)
    end_position: f64,
}

// ============================================================
// 主逻辑
// ============================================================

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose, cli.log_dir.as_deref()) {
        eprintln!("警告: {e:#}");
    }

    match run(&cli) {
        Ok(output) => {
            if cli.json {
                match serde_json::to_string_pretty(&output) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("错误: JSON 序列化失败: {e}");
                        process::exit(1);
                    }
                }
            } else {
                print_text(&output);
            }
        }
        Err(e) => {
            eprintln!("错误: {e:#}");
            process::exit(1);
        }
    }
}

fn load_options(path: Option<&Path>) -> Result<ReaderOptions> {
    let Some(path) = path else {
        return Ok(ReaderOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("读取选项文件失败, path={}", path.display()))?;
    ReaderOptions::from_json(&text)
        .with_context(|| format!("解析选项文件失败, path={}", path.display()))
}

fn run(cli: &Cli) -> Result<ProbeOutput> {
    let options = load_options(cli.options.as_deref())?;
    let input = cli.input.as_path();

    let mut io = IoContext::open_read(input)
        .with_context(|| format!("无法打开文件 '{}'", input.display()))?;
    let filename = input.file_name().and_then(|name| name.to_str());
    let probe = probe_input(&mut io, filename).context("无法识别文件格式")?;
    info!("格式: {} (置信度: {})", probe.format_id, probe.score);

    let runtime = EngineRuntime::symphonia();
    let engine = runtime
        .create_engine()
        .with_context(|| format!("无法创建解码引擎 ({})", runtime.backend_name()))?;

    let mut output = ProbeOutput {
        filename: input.display().to_string(),
        format_name: probe.format_id.name().to_string(),
        probe_score: probe.score,
        sample_rate: 0,
        channels: 0,
        duration: None,
        nb_samples: None,
        major_brand: None,
        tags: TagInfo::default(),
        decode: None,
    };

    match probe.format_id {
        FormatId::AacAdts => {
            let mut reader = yin::ElementaryStreamReader::open(io, engine, &options)
                .context("无法打开 ADTS 裸流")?;
            fill_stream_info(&mut output, &reader);
            if cli.seek.is_some() {
                anyhow::bail!("ADTS 裸流不支持 seek");
            }
            if cli.decode {
                let mut summary = decode_all(&mut reader, cli.buffer)?;
                summary.frames = Some(reader.frames_read());
                output.decode = Some(summary);
            }
            reader.close()?;
        }
        FormatId::Mp4 => {
            let mut reader = yin::ContainerReader::open(io, engine, &options)
                .context("无法打开 MP4 容器")?;
            fill_stream_info(&mut output, &reader);
            output.nb_samples = Some(reader.sample_count());
            output.major_brand = reader.major_brand().map(str::to_string);
            if let Some(seconds) = cli.seek {
                let target = Duration::try_from_secs_f64(seconds)
                    .with_context(|| format!("无效的 seek 时间: {seconds}"))?;
                reader.seek(target)?;
                info!("seek 到 {:?}, 下一采样 {}", target, reader.current_sample());
            }
            if cli.decode {
                output.decode = Some(decode_all(&mut reader, cli.buffer)?);
            }
            reader.close()?;
        }
    }

    runtime.shutdown();
    Ok(output)
}

fn fill_stream_info(output: &mut ProbeOutput, reader: &dyn AudioReader) {
    output.sample_rate = reader.sample_rate();
    output.channels = reader.channels();
    output.duration = reader.duration().map(|d| d.as_secs_f64());
    output.tags = reader.metadata().into();
}

/// 读到流结束, 统计采样数
fn decode_all(reader: &mut dyn AudioReader, buffer: usize) -> Result<DecodeSummary> {
    let mut pcm = vec![0i16; buffer.max(1)];
    let mut total_samples = 0u64;
    let mut reads = 0u64;
    loop {
        let outcome = reader.read(&mut pcm)?;
        reads += 1;
        if outcome.is_end() {
            break;
        }
        total_samples += outcome.samples as u64;
    }
    Ok(DecodeSummary {
        total_samples,
        samples_per_channel: total_samples / u64::from(reader.channels().max(1)),
        reads,
        frames: None,
        end_position: reader.position().as_secs_f64(),
    })
}

/// 文本输出
fn print_text(output: &ProbeOutput) {
    println!("[FORMAT]");
    println!("  文件名       : {}", output.filename);
    println!("  格式名称     : {}", output.format_name);
    println!("  探测置信度   : {}", output.probe_score);
    if let Some(ref brand) = output.major_brand {
        println!("  主品牌       : {brand}");
    }
    println!("[/FORMAT]");
    println!();

    println!("[STREAM]");
    println!("  采样率       : {} Hz", output.sample_rate);
    println!("  声道数       : {}", output.channels);
    match output.duration {
        Some(dur) => println!("  时长         : {dur:.3} 秒"),
        None => println!("  时长         : 未知"),
    }
    if let Some(n) = output.nb_samples {
        println!("  帧数         : {n}");
    }
    println!("[/STREAM]");
    println!();

    if !output.tags.is_empty() {
        println!("[TAGS]");
        let tags = [
            ("标题", &output.tags.title),
            ("艺术家", &output.tags.artist),
            ("专辑", &output.tags.album),
            ("流派", &output.tags.genre),
        ];
        for (name, value) in tags {
            if let Some(value) = value {
                println!("  {name}: {value}");
            }
        }
        println!("[/TAGS]");
        println!();
    }

    if let Some(ref decode) = output.decode {
        println!("[DECODE]");
        println!("  采样总数     : {}", decode.total_samples);
        println!("  每声道采样数 : {}", decode.samples_per_channel);
        println!("  读取次数     : {}", decode.reads);
        if let Some(frames) = decode.frames {
            println!("  解码帧数     : {frames}");
        }
        println!("  结束位置     : {:.3} 秒", decode.end_position);
        println!("[/DECODE]");
        println!();
    }
}
