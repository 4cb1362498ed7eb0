use anyhow::Context;
use audioring::audio::{AudioChunker, BYTES_PER_CHUNK, SttPrebuffer, WakeGate};
use audioring::capture::dispatcher::{CaptureDispatcher, CaptureStats};
use audioring::config::Config;
use audioring::storage::{DebugRecorder, RecorderOptions, run_recording_dir};
use clap::Parser;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Streams raw 16 kHz / 16-bit / mono PCM through the capture path.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Raw PCM input file, or `-` for stdin.
    #[arg(short, long, default_value = "-")]
    input: String,

    /// YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "default")]
    pipeline: String,

    #[arg(long)]
    device_id: Option<String>,

    /// Overrides `debug_recording_dir` from the configuration.
    #[arg(long)]
    debug_recording_dir: Option<PathBuf>,

    /// Bytes requested per read from the input.
    #[arg(long, default_value_t = 4096)]
    read_size: usize,

    /// Stream time of the wake word. Earlier audio is only pre-buffered and
    /// is forwarded once this time is reached.
    #[arg(long)]
    wake_at_ms: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::try_from(path.clone()).context("Error parsing config file")?,
        None => Config::default(),
    };
    init_logger(&config.log.directive);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("shutting down");
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let mut chunker = AudioChunker::new(BYTES_PER_CHUNK, config.audio.volume_multiplier)?;
    let prebuffer = SttPrebuffer::new(config.wake_word.audio_seconds_to_buffer)?;
    let mut gate = WakeGate::new(args.wake_at_ms, prebuffer);
    let mut dispatcher = CaptureDispatcher::new();

    if let Some(base) = args.debug_recording_dir.or(config.debug_recording_dir) {
        let run_id = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
            .to_string();
        let dir = run_recording_dir(&base, args.device_id.as_deref(), &args.pipeline, &run_id);
        let mut recorder = DebugRecorder::spawn(dir, RecorderOptions::default())?;
        recorder.start_recording(&format!("01_stt-{}", args.pipeline))?;
        dispatcher.add_consumer(recorder);
    }

    let mut input: Box<dyn Read> = if args.input == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(&args.input).with_context(|| format!("Opening {}", args.input))?)
    };

    info!(
        input = %args.input,
        consumers = ?dispatcher.consumer_names(),
        wake_at_ms = ?args.wake_at_ms,
        prebuffer_bytes = gate.prebuffer().map_or(0, |p| p.capacity()),
        "streaming audio"
    );

    let mut buf = vec![0u8; args.read_size.max(1)];
    let mut stats = CaptureStats::default();
    let mut last_report = Instant::now();

    while running.load(Ordering::SeqCst) {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("Reading audio input"),
        };

        let chunks = gate.pass(chunker.process(&buf[..n])?);
        stats.merge(dispatcher.dispatch_all(&chunks));

        if last_report.elapsed() >= Duration::from_secs(5) {
            info!(
                chunks = stats.chunks_seen,
                stream_ms = chunker.next_timestamp_ms(),
                "[STATUS]"
            );
            last_report = Instant::now();
        }
    }

    if let Some(tail) = chunker.finish() {
        stats.merge(dispatcher.dispatch_all(&gate.pass(vec![tail])));
    }
    if !gate.is_open() {
        warn!(
            stream_ms = chunker.next_timestamp_ms(),
            "input ended before the wake time, nothing was forwarded"
        );
    }
    if stats.chunks_failed > 0 {
        warn!(
            failed = stats.chunks_failed,
            success_rate = stats.success_rate(),
            "some captured chunks were dropped"
        );
    }

    // Stops the debug recorder, if any, and closes its files.
    drop(dispatcher);

    info!(
        chunks = stats.chunks_seen,
        stream_ms = chunker.next_timestamp_ms(),
        "finished"
    );
    Ok(())
}

fn init_logger(directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
