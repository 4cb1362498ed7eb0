use audioring::audio::{BYTES_PER_CHUNK, MS_PER_CHUNK};
use audioring::capture::frame::FrameKind;
use audioring::ring::SpscRingBuffer;
use audioring::storage::MmapWavWriter;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

const OUTPUT: &str = "/tmp/audioring_stress.wav";

fn main() {
    tracing_subscriber::fmt().init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    info!("SPSC capture queue + mmap WAV stress test");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let (mut prod, mut cons) = SpscRingBuffer::new(64 * 1024 * 1024)?.split();

    std::thread::scope(|scope| {
        let writer_running = running.clone();
        let writer = scope.spawn(move || {
            let mut count = 0u64;
            let chunk = [0x11u8; BYTES_PER_CHUNK];

            while writer_running.load(Ordering::Relaxed) {
                if prod
                    .write_frame(FrameKind::Audio, count * MS_PER_CHUNK, &chunk)
                    .is_ok()
                {
                    count += 1;
                }
            }

            count
        });

        let reader_running = running.clone();
        let reader = scope.spawn(move || -> anyhow::Result<(u64, u64)> {
            let mut wav = MmapWavWriter::create(OUTPUT, 1024 * 1024 * 1024)?;
            let mut count = 0u64;
            let mut dropped = 0u64;

            loop {
                while let Some((_, payload)) = cons.read_frame() {
                    if wav.write_frames(&payload) {
                        count += 1;
                    } else {
                        dropped += 1;
                    }
                }

                if !reader_running.load(Ordering::Relaxed) && cons.is_empty() {
                    break;
                }
            }

            wav.sync()?;
            Ok((count, dropped))
        });

        info!("running for 5 seconds");
        std::thread::sleep(Duration::from_secs(5));
        running.store(false, Ordering::SeqCst);

        let written = writer
            .join()
            .map_err(|_| anyhow::anyhow!("writer thread panicked"))?;
        let (persisted, dropped) = reader
            .join()
            .map_err(|_| anyhow::anyhow!("reader thread panicked"))??;

        let file_size = std::fs::metadata(OUTPUT).map(|m| m.len()).unwrap_or(0);

        info!(
            queued = written,
            persisted,
            dropped_file_full = dropped,
            chunks_per_sec = format_args!("{:.2}M", written as f64 / 5.0 / 1_000_000.0),
            audio_secs = persisted as f64 * MS_PER_CHUNK as f64 / 1000.0,
            file_mb = format_args!("{:.2}", file_size as f64 / 1024.0 / 1024.0),
            "results"
        );

        std::fs::remove_file(OUTPUT).ok();
        Ok(())
    })
}
